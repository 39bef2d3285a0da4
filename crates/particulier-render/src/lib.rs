//! Particulier Render - wgpu backend for particle systems
//!
//! Each `ParticleSystem<WgpuParticleBackend>` owns one instance buffer on the
//! GPU and draws with a single instanced call. Pipelines, the camera uniform
//! and the shader are shared through one `ParticlePipeline`.

mod backend;
mod context;
mod headless;
pub mod particle_pipeline;

pub use backend::WgpuParticleBackend;
pub use context::{GpuContext, RenderError};
pub use headless::{HeadlessTarget, DEPTH_FORMAT};
pub use particle_pipeline::{CameraUniforms, ParticleCamera, ParticlePipeline, SystemUniforms};
