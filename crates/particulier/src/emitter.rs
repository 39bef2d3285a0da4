//! Random-sampling spawn generator bound to one particle system

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use log::warn;
use particulier_core::Vec3;

use crate::backend::ParticleBackend;
use crate::config::EmitterConfig;
use crate::rand::{ParticleRandom, ParticleRng};
use crate::record::ParticleInit;
use crate::system::{ParticleSystem, SharedParticleSystem};

/// Per-component uniform range. `min > max` is allowed and samples the reversed interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleRange<const N: usize> {
    pub min: [f32; N],
    pub max: [f32; N],
}

impl<const N: usize> SampleRange<N> {
    pub const fn new(min: [f32; N], max: [f32; N]) -> Self {
        Self { min, max }
    }

    /// Draw each component independently into `out`
    pub fn sample_into<R: ParticleRandom>(&self, rng: &mut R, out: &mut [f32]) {
        for (i, o) in out.iter_mut().take(N).enumerate() {
            *o = rng.range(self.min[i], self.max[i]);
        }
    }
}

/// Samples spawn values from configured ranges and forwards them to a system.
///
/// The emitter only holds a weak handle: once the system is dropped spawning
/// turns into a logged no-op.
pub struct ParticleEmitter<B: ParticleBackend, R: ParticleRandom = ParticleRng> {
    system: Weak<RefCell<ParticleSystem<B>>>,
    /// Reused for every spawn
    template: ParticleInit,
    /// Position the host moves the emitter to
    anchor: Vec3,
    /// Anchor as of the last refresh
    position: [f32; 3],
    /// System clock value of the last refresh
    last_update: f32,
    offset_range: SampleRange<3>,
    velocity_range: SampleRange<3>,
    color_range: SampleRange<3>,
    rng: R,
}

impl<B: ParticleBackend> ParticleEmitter<B, ParticleRng> {
    pub fn new(system: &SharedParticleSystem<B>) -> Self {
        Self::with_rng(system, ParticleRng::default())
    }
}

impl<B: ParticleBackend, R: ParticleRandom> ParticleEmitter<B, R> {
    pub fn with_rng(system: &SharedParticleSystem<B>, rng: R) -> Self {
        Self::from_config(&EmitterConfig::default(), system, rng)
    }

    pub fn from_config(config: &EmitterConfig, system: &SharedParticleSystem<B>, rng: R) -> Self {
        let [cr, cg, cb] = config.color_max;
        Self {
            system: Rc::downgrade(system),
            template: ParticleInit {
                position: [0.0; 3],
                velocity: [0.0; 3],
                color: [cr, cg, cb, config.alpha],
                scale: config.scale,
                life: config.life,
            },
            anchor: Vec3::from_array(config.position),
            position: config.position,
            last_update: f32::NEG_INFINITY,
            offset_range: SampleRange::new(config.offset_min, config.offset_max),
            velocity_range: SampleRange::new(config.velocity_min, config.velocity_max),
            color_range: SampleRange::new(config.color_min, config.color_max),
            rng,
        }
    }

    /// Refresh the cached position at most once per system clock value
    fn maybe_update(&mut self, now: f32) {
        if self.last_update >= now {
            return;
        }
        self.last_update = now;
        self.position = self.anchor.to_array();
    }

    /// Sample one particle and spawn it. Returns false if the system is gone.
    pub fn spawn_one(&mut self) -> bool {
        let Some(system) = self.system.upgrade() else {
            warn!("emitter spawn skipped: particle system dropped");
            return false;
        };
        let mut system = system.borrow_mut();
        self.maybe_update(system.time());

        let template = &mut self.template;
        self.offset_range.sample_into(&mut self.rng, &mut template.position);
        for (p, o) in template.position.iter_mut().zip(self.position) {
            *p += o;
        }
        self.velocity_range.sample_into(&mut self.rng, &mut template.velocity);
        self.color_range.sample_into(&mut self.rng, &mut template.color[..3]);

        system.spawn(template);
        true
    }

    /// Spawn `count` particles; returns how many reached the system.
    pub fn spawn_many(&mut self, count: usize) -> usize {
        (0..count).take_while(|_| self.spawn_one()).count()
    }

    pub fn set_offset_range(&mut self, min: [f32; 3], max: [f32; 3]) {
        self.offset_range = SampleRange::new(min, max);
    }

    pub fn set_velocity(&mut self, min: [f32; 3], max: [f32; 3]) {
        self.velocity_range = SampleRange::new(min, max);
    }

    pub fn set_color_range(&mut self, min: [f32; 3], max: [f32; 3]) {
        self.color_range = SampleRange::new(min, max);
    }

    pub fn set_alpha(&mut self, alpha: f32) {
        self.template.color[3] = alpha;
    }

    pub fn set_scale(&mut self, scale: [f32; 2]) {
        self.template.scale = scale;
    }

    pub fn set_life(&mut self, life: f32) {
        self.template.life = life;
    }

    /// Move the emitter. Spawns pick this up once the system clock has advanced.
    pub fn set_position(&mut self, position: Vec3) {
        self.anchor = position;
    }

    pub fn anchor(&self) -> Vec3 {
        self.anchor
    }

    /// Position spawns are currently offset from
    pub fn position(&self) -> [f32; 3] {
        self.position
    }

    pub fn offset_range(&self) -> SampleRange<3> {
        self.offset_range
    }

    pub fn velocity_range(&self) -> SampleRange<3> {
        self.velocity_range
    }

    pub fn color_range(&self) -> SampleRange<3> {
        self.color_range
    }

    pub fn template(&self) -> &ParticleInit {
        &self.template
    }

    pub fn is_bound(&self) -> bool {
        self.system.strong_count() > 0
    }
}
