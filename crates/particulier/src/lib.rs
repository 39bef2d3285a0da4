//! Particulier - GPU-instanced particle systems
//!
//! Provides fixed-capacity particle pools whose simulation runs on the GPU:
//! - Interleaved 64-byte instance records, one per slot
//! - Ring-buffer spawning that overwrites the oldest slot, never allocates
//! - Upload-on-change through a pluggable render backend
//! - Random-range emitters and a world that ticks every system once per frame

pub mod backend;
pub mod config;
pub mod emitter;
pub mod headless;
pub mod rand;
pub mod record;
pub mod system;
pub mod world;

pub use backend::{AttributeDesc, DrawableDesc, ParticleBackend, ParticleKind};
pub use config::{EmitterConfig, SceneConfig, SystemConfig};
pub use emitter::{ParticleEmitter, SampleRange};
pub use headless::HeadlessBackend;
pub use rand::{ParticleRandom, ParticleRng};
pub use record::{ParticleInit, ParticleRecord};
pub use system::{ParticleSystem, SharedParticleSystem, DEFAULT_FORCE};
pub use world::{InjectionHook, ParticleWorld};
