//! Fixed-capacity ring of particle records feeding one instanced drawable

use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, trace};
use particulier_core::{ParticulierError, Result};

use crate::backend::{DrawableDesc, ParticleBackend, ParticleKind};
use crate::config::SystemConfig;
use crate::record::{self, ParticleInit, ParticleRecord, RECORD_BYTES, RECORD_STRIDE};

/// Acceleration applied by the shader when none is configured
pub const DEFAULT_FORCE: [f32; 3] = [0.0, -10.0, 0.0];

/// Largest capacity a single instanced draw can address
pub const MAX_CAPACITY: usize = u32::MAX as usize;

/// A system handle shared between a world, its emitters and the host
pub type SharedParticleSystem<B> = Rc<RefCell<ParticleSystem<B>>>;

/// A pool of `capacity` particle slots written round-robin.
///
/// Spawning never allocates: once every slot has been used the oldest one is
/// overwritten, whether or not its particle has expired. Integration happens
/// on the GPU, so the CPU only writes initial values and advances the clock.
pub struct ParticleSystem<B: ParticleBackend> {
    kind: ParticleKind,
    capacity: usize,
    buffer: Vec<f32>,
    /// Next slot to write
    next: usize,
    /// Seconds since construction
    time: f32,
    dirty: bool,
    /// Uploads issued since construction
    uploads: usize,
    force: [f32; 3],
    cross: Option<[f32; 3]>,
    backend: B,
}

impl<B: ParticleBackend> ParticleSystem<B> {
    /// Create a quad system with the default force.
    pub fn new(capacity: usize, backend: B) -> Result<Self> {
        Self::build(ParticleKind::Quad, capacity, DEFAULT_FORCE, backend)
    }

    pub fn with_force(capacity: usize, force: [f32; 3], backend: B) -> Result<Self> {
        Self::build(ParticleKind::Quad, capacity, force, backend)
    }

    pub fn with_config(config: &SystemConfig, backend: B) -> Result<Self> {
        Self::build(config.kind, config.capacity, config.force, backend)
    }

    fn build(kind: ParticleKind, capacity: usize, force: [f32; 3], mut backend: B) -> Result<Self> {
        if capacity == 0 || capacity > MAX_CAPACITY {
            return Err(ParticulierError::InvalidCapacity(capacity));
        }
        let len = capacity
            .checked_mul(RECORD_STRIDE)
            .ok_or(ParticulierError::InvalidCapacity(capacity))?;

        let mut buffer = vec![0.0; len];
        for slot in 0..capacity {
            record::reset(&mut buffer, slot);
        }

        let (vertices, vertex_attributes, indices): (&[f32], _, &[u16]) = match kind {
            ParticleKind::Quad => (
                &record::QUAD_VERTICES,
                &record::VERTEX_ATTRIBUTES[..],
                &record::QUAD_INDICES,
            ),
            ParticleKind::Point => (
                &record::POINT_VERTICES,
                &record::VERTEX_ATTRIBUTES[..],
                &record::POINT_INDICES,
            ),
        };
        backend.build_drawable(&DrawableDesc {
            kind,
            capacity: capacity as u32,
            vertices,
            vertex_stride: record::VERTEX_STRIDE as u32,
            vertex_attributes,
            indices,
            instance_stride: RECORD_STRIDE as u32,
            instance_attributes: &record::INSTANCE_ATTRIBUTES,
            instances: bytemuck::cast_slice(&buffer),
        })?;
        backend.set_force(force);
        backend.set_time(0.0);

        debug!(
            "particle system created: {kind:?}, {capacity} slots, {} bytes",
            capacity * RECORD_BYTES
        );

        Ok(Self {
            kind,
            capacity,
            buffer,
            next: 0,
            time: 0.0,
            dirty: false,
            uploads: 0,
            force,
            cross: None,
            backend,
        })
    }

    /// Wrap for sharing with a world and emitters
    pub fn into_shared(self) -> SharedParticleSystem<B> {
        Rc::new(RefCell::new(self))
    }

    /// Write one particle into the next slot, evicting whatever was there.
    /// Returns the slot written.
    pub fn spawn(&mut self, particle: &ParticleInit) -> usize {
        let slot = self.next;
        self.next = (slot + 1) % self.capacity;
        record::init(&mut self.buffer, slot, self.time, particle);
        self.dirty = true;
        slot
    }

    /// Advance the clock and flush pending spawns to the backend.
    pub fn tick(&mut self, dt: f32) {
        self.time += dt;
        self.backend.set_time(self.time);
        if !self.dirty {
            return;
        }
        trace!("uploading {} particle slots", self.capacity);
        self.backend.upload(bytemuck::cast_slice(&self.buffer));
        self.dirty = false;
        self.uploads += 1;
    }

    pub fn set_force(&mut self, force: [f32; 3]) {
        self.force = force;
        self.backend.set_force(force);
    }

    pub fn set_cross(&mut self, cross: [f32; 3]) {
        self.cross = Some(cross);
        self.backend.set_cross(cross);
    }

    pub fn kind(&self) -> ParticleKind {
        self.kind
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Seconds accumulated by `tick` since construction
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Slot the next spawn will write
    pub fn cursor(&self) -> usize {
        self.next
    }

    /// Whether spawns are waiting for the next upload
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn upload_count(&self) -> usize {
        self.uploads
    }

    pub fn force(&self) -> [f32; 3] {
        self.force
    }

    pub fn cross(&self) -> Option<[f32; 3]> {
        self.cross
    }

    pub fn records(&self) -> &[ParticleRecord] {
        bytemuck::cast_slice(&self.buffer)
    }

    pub fn record(&self, slot: usize) -> Option<ParticleRecord> {
        (slot < self.capacity).then(|| record::read(&self.buffer, slot))
    }

    /// Slots whose particle is still within its lifespan at the current clock
    pub fn live_count(&self) -> usize {
        self.records()
            .iter()
            .filter(|r| !r.is_expired(self.time))
            .count()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}

impl<B: ParticleBackend> Drop for ParticleSystem<B> {
    fn drop(&mut self) {
        self.backend.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::HeadlessBackend;
    use std::cell::Cell;

    fn marker(i: usize) -> ParticleInit {
        ParticleInit {
            position: [i as f32, 0.0, 0.0],
            life: 10.0,
            ..Default::default()
        }
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let err = ParticleSystem::new(0, HeadlessBackend::new()).err();
        assert!(matches!(err, Some(ParticulierError::InvalidCapacity(0))));
    }

    #[test]
    fn construction_builds_one_dead_drawable() {
        let system = ParticleSystem::new(8, HeadlessBackend::new()).unwrap();
        let backend = system.backend();
        assert_eq!(backend.builds, 1);
        assert_eq!(backend.capacity, 8);
        assert_eq!(backend.kind, Some(ParticleKind::Quad));
        assert_eq!(backend.force, DEFAULT_FORCE);
        assert_eq!(backend.last_upload.len(), 8);
        assert!(system.records().iter().all(|r| r.is_dead()));
        assert!(!system.is_dirty());
        assert_eq!(system.live_count(), 0);
    }

    #[test]
    fn ring_wraps_and_overwrites_oldest() {
        let mut system = ParticleSystem::new(4, HeadlessBackend::new()).unwrap();
        let slots: Vec<usize> = (0..6).map(|i| system.spawn(&marker(i))).collect();
        assert_eq!(slots, vec![0, 1, 2, 3, 0, 1]);

        let xs: Vec<f32> = system.records().iter().map(|r| r.position[0]).collect();
        assert_eq!(xs, vec![4.0, 5.0, 2.0, 3.0]);
        assert_eq!(system.cursor(), 2);

        system.tick(0.016);
        assert_eq!(system.backend().uploads, 1);
        assert!(!system.is_dirty());
        assert_eq!(system.backend().last_upload[0].position[0], 4.0);
    }

    #[test]
    fn upload_only_when_dirty() {
        let mut system = ParticleSystem::new(2, HeadlessBackend::new()).unwrap();
        system.tick(0.1);
        assert_eq!(system.backend().uploads, 0);

        system.spawn(&marker(0));
        assert!(system.is_dirty());
        system.tick(0.1);
        system.tick(0.1);
        assert_eq!(system.backend().uploads, 1);
        assert!((system.backend().time - 0.3).abs() < 1e-6);
    }

    #[test]
    fn spawn_stamps_current_clock() {
        let mut system = ParticleSystem::new(2, HeadlessBackend::new()).unwrap();
        system.tick(1.5);
        system.spawn(&marker(0));
        let record = system.record(0).unwrap();
        assert_eq!(record.birth(), 1.5);
        assert_eq!(record.position[3], 1.5);
        assert_eq!(record.lifespan(), 10.0);
        assert_eq!(system.live_count(), 1);
        assert!(system.record(2).is_none());
    }

    #[test]
    fn expired_particles_stop_counting_as_live() {
        let mut system = ParticleSystem::new(2, HeadlessBackend::new()).unwrap();
        system.spawn(&ParticleInit {
            life: 1.0,
            ..Default::default()
        });
        system.tick(0.5);
        assert_eq!(system.live_count(), 1);
        system.tick(0.6);
        assert_eq!(system.live_count(), 0);
    }

    #[test]
    fn uniform_setters_pass_through() {
        let mut system = ParticleSystem::new(1, HeadlessBackend::new()).unwrap();
        system.set_force([1.0, 2.0, 3.0]);
        system.set_cross([0.0, 0.0, 1.0]);
        assert_eq!(system.force(), [1.0, 2.0, 3.0]);
        assert_eq!(system.backend().force, [1.0, 2.0, 3.0]);
        assert_eq!(system.backend().cross, Some([0.0, 0.0, 1.0]));
        assert!(!system.is_dirty());
    }

    struct CountingBackend {
        releases: Rc<Cell<u32>>,
    }

    impl ParticleBackend for CountingBackend {
        fn build_drawable(&mut self, _desc: &DrawableDesc<'_>) -> Result<()> {
            Ok(())
        }
        fn set_time(&mut self, _time: f32) {}
        fn set_force(&mut self, _force: [f32; 3]) {}
        fn upload(&mut self, _instances: &[ParticleRecord]) {}
        fn release(&mut self) {
            self.releases.set(self.releases.get() + 1);
        }
    }

    #[test]
    fn drop_releases_backend_once() {
        let releases = Rc::new(Cell::new(0));
        let system = ParticleSystem::new(
            4,
            CountingBackend {
                releases: releases.clone(),
            },
        )
        .unwrap();
        drop(system);
        assert_eq!(releases.get(), 1);
    }

    struct FailingBackend;

    impl ParticleBackend for FailingBackend {
        fn build_drawable(&mut self, _desc: &DrawableDesc<'_>) -> Result<()> {
            Err(ParticulierError::Backend("no device".into()))
        }
        fn set_time(&mut self, _time: f32) {}
        fn set_force(&mut self, _force: [f32; 3]) {}
        fn upload(&mut self, _instances: &[ParticleRecord]) {}
    }

    #[test]
    fn backend_build_failure_propagates() {
        let err = ParticleSystem::new(4, FailingBackend).err();
        assert!(matches!(err, Some(ParticulierError::Backend(_))));
    }
}
