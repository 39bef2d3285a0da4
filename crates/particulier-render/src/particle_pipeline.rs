//! GPU-instanced particle render pipeline
//!
//! Draws each particle system with one instanced draw call. The instance
//! buffer is the system's record buffer, bound as a per-instance vertex
//! buffer; the vertex shader integrates position from spawn values, age and
//! the system's force, so nothing is simulated on the CPU.
//! Two pipelines: quads and points, both additive.

use bytemuck::{Pod, Zeroable};
use particulier::record::{INSTANCE_ATTRIBUTES, RECORD_BYTES, VERTEX_ATTRIBUTES, VERTEX_STRIDE};
use particulier::{AttributeDesc, ParticleKind};
use particulier_core::Vec3;
use wgpu::util::DeviceExt;

use crate::headless::DEPTH_FORMAT;

/// Camera uniforms shared across all particle draws in a frame
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct CameraUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub camera_right: [f32; 4], // w unused
    pub camera_up: [f32; 4],    // w unused
}

/// Per-system uniforms
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct SystemUniforms {
    pub force_time: [f32; 4], // xyz = force, w = time
    pub cross: [f32; 4],      // xyz = billboard right vector, w = 1 when set
}

/// Perspective camera looking at a target
#[derive(Debug, Clone, Copy)]
pub struct ParticleCamera {
    pub eye: Vec3,
    pub target: Vec3,
    /// Vertical field of view in degrees
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl ParticleCamera {
    pub fn uniforms(&self) -> CameraUniforms {
        let eye = glam::Vec3::from_array(self.eye.to_array());
        let target = glam::Vec3::from_array(self.target.to_array());
        let view = glam::Mat4::look_at_rh(eye, target, glam::Vec3::Y);
        let proj = glam::Mat4::perspective_rh(self.fov_y.to_radians(), self.aspect, self.near, self.far);

        let forward = (self.target - self.eye).normalized();
        let right = forward.cross(Vec3::UP).normalized();
        let up = right.cross(forward);

        CameraUniforms {
            view_proj: (proj * view).to_cols_array_2d(),
            camera_right: [right.x, right.y, right.z, 0.0],
            camera_up: [up.x, up.y, up.z, 0.0],
        }
    }
}

/// Shared pipelines and camera state for every particle backend
pub struct ParticlePipeline {
    pub quad_pipeline: wgpu::RenderPipeline,
    pub point_pipeline: wgpu::RenderPipeline,
    pub camera_bind_group_layout: wgpu::BindGroupLayout,
    pub system_bind_group_layout: wgpu::BindGroupLayout,
    pub camera_buffer: wgpu::Buffer,
    pub camera_bind_group: wgpu::BindGroup,
}

impl ParticlePipeline {
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Particle Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("particle_shader.wgsl").into()),
        });

        // Group 0: camera
        let camera_bind_group_layout = uniform_layout(device, "Particle Camera Bind Group Layout");
        // Group 1: per-system force/time/cross
        let system_bind_group_layout = uniform_layout(device, "Particle System Bind Group Layout");

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Particle Pipeline Layout"),
            bind_group_layouts: &[&camera_bind_group_layout, &system_bind_group_layout],
            push_constant_ranges: &[],
        });

        let quad_attributes = vertex_attributes(&VERTEX_ATTRIBUTES, 0);
        let instance_attributes = vertex_attributes(&INSTANCE_ATTRIBUTES, VERTEX_ATTRIBUTES.len() as u32);
        let buffers = [
            wgpu::VertexBufferLayout {
                array_stride: (VERTEX_STRIDE * std::mem::size_of::<f32>()) as wgpu::BufferAddress,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &quad_attributes,
            },
            wgpu::VertexBufferLayout {
                array_stride: RECORD_BYTES as wgpu::BufferAddress,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: &instance_attributes,
            },
        ];

        // Additive blend (src_alpha + One)
        let additive_blend = wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::SrcAlpha,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::One,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
        };

        let create = |label: &str, topology: wgpu::PrimitiveTopology| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_particle"),
                    buffers: &buffers,
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_particle"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend: Some(additive_blend),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                // Depth test enabled, depth write DISABLED (translucent)
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: false,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        };

        let quad_pipeline = create("Particle Quad Pipeline", wgpu::PrimitiveTopology::TriangleList);
        let point_pipeline = create("Particle Point Pipeline", wgpu::PrimitiveTopology::PointList);

        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Particle Camera Buffer"),
            contents: bytemuck::cast_slice(&[CameraUniforms {
                view_proj: [[0.0; 4]; 4],
                camera_right: [1.0, 0.0, 0.0, 0.0],
                camera_up: [0.0, 1.0, 0.0, 0.0],
            }]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
            label: Some("Particle Camera Bind Group"),
        });

        Self {
            quad_pipeline,
            point_pipeline,
            camera_bind_group_layout,
            system_bind_group_layout,
            camera_buffer,
            camera_bind_group,
        }
    }

    pub fn update_camera(&self, queue: &wgpu::Queue, camera: &ParticleCamera) {
        queue.write_buffer(&self.camera_buffer, 0, bytemuck::cast_slice(&[camera.uniforms()]));
    }

    pub fn pipeline_for(&self, kind: ParticleKind) -> &wgpu::RenderPipeline {
        match kind {
            ParticleKind::Quad => &self.quad_pipeline,
            ParticleKind::Point => &self.point_pipeline,
        }
    }
}

fn uniform_layout(device: &wgpu::Device, label: &str) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some(label),
    })
}

/// Map an interleaved attribute table to wgpu attributes at consecutive shader locations
pub fn vertex_attributes(attrs: &[AttributeDesc], first_location: u32) -> Vec<wgpu::VertexAttribute> {
    attrs
        .iter()
        .enumerate()
        .map(|(i, attr)| wgpu::VertexAttribute {
            format: match attr.size {
                1 => wgpu::VertexFormat::Float32,
                2 => wgpu::VertexFormat::Float32x2,
                3 => wgpu::VertexFormat::Float32x3,
                _ => wgpu::VertexFormat::Float32x4,
            },
            offset: (attr.offset as usize * std::mem::size_of::<f32>()) as wgpu::BufferAddress,
            shader_location: first_location + i as u32,
        })
        .collect()
}
