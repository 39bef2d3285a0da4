//! Render backend contract
//!
//! A `ParticleSystem` never talks to a renderer directly. It builds one
//! drawable through a [`ParticleBackend`] at construction, pushes uniforms,
//! and hands over its instance buffer whenever spawns have changed it.

use particulier_core::Result;

use crate::record::ParticleRecord;

/// Primitive each particle instance is drawn as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParticleKind {
    Point,
    #[default]
    Quad,
}

/// One named attribute inside an interleaved buffer. Sizes and offsets are in floats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeDesc {
    pub name: &'static str,
    pub size: u32,
    pub offset: u32,
}

impl AttributeDesc {
    pub const fn new(name: &'static str, size: u32, offset: u32) -> Self {
        Self { name, size, offset }
    }
}

/// Everything a backend needs to build an instanced drawable
pub struct DrawableDesc<'a> {
    pub kind: ParticleKind,
    /// Number of instances, fixed for the drawable's lifetime
    pub capacity: u32,
    pub vertices: &'a [f32],
    pub vertex_stride: u32,
    pub vertex_attributes: &'a [AttributeDesc],
    pub indices: &'a [u16],
    pub instance_stride: u32,
    pub instance_attributes: &'a [AttributeDesc],
    /// Initial contents of the instance buffer
    pub instances: &'a [ParticleRecord],
}

/// Render integration for one particle system.
///
/// Backends receive borrowed views of the system's buffer and must copy what
/// they keep; they never get write access to it.
pub trait ParticleBackend {
    /// Build the drawable. Called exactly once, from system construction.
    fn build_drawable(&mut self, desc: &DrawableDesc<'_>) -> Result<()>;

    /// Update the clock uniform the shader ages particles against
    fn set_time(&mut self, time: f32);

    /// Update the constant acceleration uniform
    fn set_force(&mut self, force: [f32; 3]);

    /// Update the screen-space cross vector used to orient billboards
    fn set_cross(&mut self, _cross: [f32; 3]) {}

    /// Re-upload the whole instance buffer
    fn upload(&mut self, instances: &[ParticleRecord]);

    /// Release backend resources. Called once when the owning system is dropped.
    fn release(&mut self) {}
}
