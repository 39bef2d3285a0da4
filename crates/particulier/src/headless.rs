//! Backend that renders nothing and remembers what it was asked to do

use particulier_core::Result;

use crate::backend::{DrawableDesc, ParticleBackend, ParticleKind};
use crate::record::ParticleRecord;

/// A [`ParticleBackend`] for servers, tools and tests.
///
/// Keeps the last uniforms and a copy of the last uploaded buffer so callers
/// can inspect what a GPU backend would have received.
#[derive(Debug, Clone, Default)]
pub struct HeadlessBackend {
    pub kind: Option<ParticleKind>,
    pub capacity: u32,
    pub builds: usize,
    pub uploads: usize,
    pub releases: usize,
    pub time: f32,
    pub force: [f32; 3],
    pub cross: Option<[f32; 3]>,
    pub last_upload: Vec<ParticleRecord>,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ParticleBackend for HeadlessBackend {
    fn build_drawable(&mut self, desc: &DrawableDesc<'_>) -> Result<()> {
        self.kind = Some(desc.kind);
        self.capacity = desc.capacity;
        self.builds += 1;
        self.last_upload = desc.instances.to_vec();
        Ok(())
    }

    fn set_time(&mut self, time: f32) {
        self.time = time;
    }

    fn set_force(&mut self, force: [f32; 3]) {
        self.force = force;
    }

    fn set_cross(&mut self, cross: [f32; 3]) {
        self.cross = Some(cross);
    }

    fn upload(&mut self, instances: &[ParticleRecord]) {
        self.uploads += 1;
        self.last_upload.clear();
        self.last_upload.extend_from_slice(instances);
    }

    fn release(&mut self) {
        self.releases += 1;
        self.last_upload = Vec::new();
    }
}
