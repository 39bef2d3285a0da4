//! Registry that ticks every particle system once per frame

use std::rc::Rc;

use log::debug;
use particulier_core::Result;
use particulier_runtime::RuntimeSystem;

use crate::backend::ParticleBackend;
use crate::system::SharedParticleSystem;

/// Called once per system when it is added, e.g. to attach its drawable to a scene
pub type InjectionHook<B> = Box<dyn FnMut(&SharedParticleSystem<B>)>;

/// Flat, insertion-ordered list of particle systems.
///
/// The world shares systems with whoever created them; removing one here does
/// not drop it while other handles exist.
pub struct ParticleWorld<B: ParticleBackend> {
    systems: Vec<SharedParticleSystem<B>>,
    hook: InjectionHook<B>,
}

impl<B: ParticleBackend> ParticleWorld<B> {
    pub fn new() -> Self {
        Self::with_hook(|_| {})
    }

    pub fn with_hook(hook: impl FnMut(&SharedParticleSystem<B>) + 'static) -> Self {
        Self {
            systems: Vec::new(),
            hook: Box::new(hook),
        }
    }

    /// Register a system and run the injection hook on it
    pub fn add(&mut self, system: SharedParticleSystem<B>) {
        (self.hook)(&system);
        self.systems.push(system);
        debug!("particle world: {} system(s)", self.systems.len());
    }

    /// Remove the first entry that is `system`. Returns whether one was found.
    pub fn remove(&mut self, system: &SharedParticleSystem<B>) -> bool {
        let Some(index) = self.systems.iter().position(|s| Rc::ptr_eq(s, system)) else {
            return false;
        };
        self.systems.remove(index);
        true
    }

    /// Tick every system in registration order
    pub fn tick(&mut self, dt: f32) {
        for system in &self.systems {
            system.borrow_mut().tick(dt);
        }
    }

    pub fn systems(&self) -> &[SharedParticleSystem<B>] {
        &self.systems
    }

    pub fn len(&self) -> usize {
        self.systems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }
}

impl<B: ParticleBackend> Default for ParticleWorld<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: ParticleBackend> RuntimeSystem for ParticleWorld<B> {
    fn initialize(&mut self) -> Result<()> {
        debug!("particle world initialized with {} system(s)", self.systems.len());
        Ok(())
    }

    fn update(&mut self, dt: f32) -> Result<()> {
        self.tick(dt);
        Ok(())
    }

    fn shutdown(&mut self) -> Result<()> {
        self.systems.clear();
        Ok(())
    }

    fn name(&self) -> &str {
        "particles"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::HeadlessBackend;
    use crate::record::ParticleInit;
    use crate::system::ParticleSystem;
    use std::cell::RefCell;

    fn shared() -> SharedParticleSystem<HeadlessBackend> {
        ParticleSystem::new(4, HeadlessBackend::new())
            .unwrap()
            .into_shared()
    }

    #[test]
    fn hook_runs_at_add_not_tick() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let seen = calls.clone();
        let mut world = ParticleWorld::with_hook(move |s: &SharedParticleSystem<HeadlessBackend>| {
            seen.borrow_mut().push(s.borrow().capacity());
        });

        let (a, b, c) = (shared(), shared(), shared());
        world.add(a.clone());
        world.add(b.clone());
        world.add(c.clone());
        assert_eq!(calls.borrow().len(), 3);

        world.tick(0.25);
        assert_eq!(calls.borrow().len(), 3);
        for system in [&a, &b, &c] {
            assert_eq!(system.borrow().time(), 0.25);
        }
    }

    #[test]
    fn tick_preserves_registration_order() {
        let mut world = ParticleWorld::new();
        let systems: Vec<_> = (0..3).map(|_| shared()).collect();
        for s in &systems {
            world.add(s.clone());
        }
        for (registered, original) in world.systems().iter().zip(&systems) {
            assert!(Rc::ptr_eq(registered, original));
        }
    }

    #[test]
    fn remove_by_identity() {
        let mut world = ParticleWorld::new();
        let (a, b) = (shared(), shared());
        world.add(a.clone());
        world.add(b.clone());
        world.add(a.clone());

        assert!(world.remove(&a));
        assert_eq!(world.len(), 2);
        assert!(Rc::ptr_eq(&world.systems()[0], &b));
        assert!(Rc::ptr_eq(&world.systems()[1], &a));

        let stranger = shared();
        assert!(!world.remove(&stranger));
        assert_eq!(world.len(), 2);
    }

    #[test]
    fn removed_system_is_not_ticked() {
        let mut world = ParticleWorld::new();
        let (a, b) = (shared(), shared());
        world.add(a.clone());
        world.add(b.clone());
        world.remove(&a);
        world.tick(1.0);
        assert_eq!(a.borrow().time(), 0.0);
        assert_eq!(b.borrow().time(), 1.0);
    }

    #[test]
    fn runtime_update_flushes_spawns() {
        let mut world = ParticleWorld::new();
        let system = shared();
        world.add(system.clone());
        system.borrow_mut().spawn(&ParticleInit::default());

        world.initialize().unwrap();
        world.update(0.016).unwrap();
        assert_eq!(system.borrow().backend().uploads, 1);
        assert_eq!(world.name(), "particles");

        world.shutdown().unwrap();
        assert!(world.is_empty());
    }
}
