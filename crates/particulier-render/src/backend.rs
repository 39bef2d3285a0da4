//! wgpu implementation of the particle backend contract

use std::sync::Arc;

use bytemuck::Zeroable;
use log::{debug, warn};
use particulier::record::{RECORD_STRIDE, VERTEX_STRIDE};
use particulier::{DrawableDesc, ParticleBackend, ParticleKind, ParticleRecord};
use particulier_core::{ParticulierError, Result};
use wgpu::util::DeviceExt;

use crate::context::GpuContext;
use crate::particle_pipeline::{ParticlePipeline, SystemUniforms};

/// GPU resources of one particle system's drawable
struct GpuDrawable {
    kind: ParticleKind,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    instance_buffer: wgpu::Buffer,
    instance_count: u32,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
}

/// Renders one particle system with a single instanced draw call
pub struct WgpuParticleBackend {
    gpu: GpuContext,
    pipeline: Arc<ParticlePipeline>,
    uniforms: SystemUniforms,
    drawable: Option<GpuDrawable>,
}

impl WgpuParticleBackend {
    pub fn new(gpu: GpuContext, pipeline: Arc<ParticlePipeline>) -> Self {
        Self {
            gpu,
            pipeline,
            uniforms: SystemUniforms::zeroed(),
            drawable: None,
        }
    }

    pub fn uniforms(&self) -> SystemUniforms {
        self.uniforms
    }

    pub fn is_built(&self) -> bool {
        self.drawable.is_some()
    }

    /// Record the draw call. The caller owns the pass and its targets.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        let Some(d) = &self.drawable else {
            return;
        };
        pass.set_pipeline(self.pipeline.pipeline_for(d.kind));
        pass.set_bind_group(0, &self.pipeline.camera_bind_group, &[]);
        pass.set_bind_group(1, &d.uniform_bind_group, &[]);
        pass.set_vertex_buffer(0, d.vertex_buffer.slice(..));
        pass.set_vertex_buffer(1, d.instance_buffer.slice(..));
        pass.set_index_buffer(d.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
        pass.draw_indexed(0..d.index_count, 0, 0..d.instance_count);
    }

    fn write_uniforms(&self) {
        if let Some(d) = &self.drawable {
            self.gpu
                .queue
                .write_buffer(&d.uniform_buffer, 0, bytemuck::bytes_of(&self.uniforms));
        }
    }
}

impl ParticleBackend for WgpuParticleBackend {
    fn build_drawable(&mut self, desc: &DrawableDesc<'_>) -> Result<()> {
        if desc.instance_stride as usize != RECORD_STRIDE || desc.vertex_stride as usize != VERTEX_STRIDE {
            return Err(ParticulierError::Backend(format!(
                "unsupported layout: instance stride {}, vertex stride {}",
                desc.instance_stride, desc.vertex_stride
            )));
        }
        if self.drawable.is_some() {
            warn!("rebuilding particle drawable; previous buffers are released");
            self.release();
        }

        let device = &self.gpu.device;
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Particle Vertex Buffer"),
            contents: bytemuck::cast_slice(desc.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Particle Index Buffer"),
            contents: bytemuck::cast_slice(desc.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Particle Instance Buffer"),
            contents: bytemuck::cast_slice(desc.instances),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Particle System Uniform Buffer"),
            contents: bytemuck::bytes_of(&self.uniforms),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &self.pipeline.system_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
            label: Some("Particle System Bind Group"),
        });

        debug!(
            "built {:?} drawable: {} instances, {} bytes",
            desc.kind,
            desc.capacity,
            instance_buffer.size()
        );

        self.drawable = Some(GpuDrawable {
            kind: desc.kind,
            vertex_buffer,
            index_buffer,
            index_count: desc.indices.len() as u32,
            instance_buffer,
            instance_count: desc.capacity,
            uniform_buffer,
            uniform_bind_group,
        });
        Ok(())
    }

    fn set_time(&mut self, time: f32) {
        self.uniforms.force_time[3] = time;
        self.write_uniforms();
    }

    fn set_force(&mut self, force: [f32; 3]) {
        self.uniforms.force_time[..3].copy_from_slice(&force);
        self.write_uniforms();
    }

    fn set_cross(&mut self, cross: [f32; 3]) {
        let [x, y, z] = cross;
        self.uniforms.cross = [x, y, z, 1.0];
        self.write_uniforms();
    }

    fn upload(&mut self, instances: &[ParticleRecord]) {
        if let Some(d) = &self.drawable {
            self.gpu
                .queue
                .write_buffer(&d.instance_buffer, 0, bytemuck::cast_slice(instances));
        }
    }

    fn release(&mut self) {
        if let Some(d) = self.drawable.take() {
            d.vertex_buffer.destroy();
            d.index_buffer.destroy();
            d.instance_buffer.destroy();
            d.uniform_buffer.destroy();
        }
    }
}
