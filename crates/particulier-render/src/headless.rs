//! Offscreen render target with pixel readback

use crate::context::{GpuContext, RenderError};

/// Depth format shared by the particle pipeline and offscreen targets
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Color and depth textures to render particles into instead of a window surface
pub struct HeadlessTarget {
    pub format: wgpu::TextureFormat,
    pub width: u32,
    pub height: u32,
    pub color_texture: wgpu::Texture,
    pub color_view: wgpu::TextureView,
    pub depth_texture: wgpu::Texture,
    pub depth_view: wgpu::TextureView,
}

impl HeadlessTarget {
    pub fn new(gpu: &GpuContext, width: u32, height: u32) -> Self {
        let format = wgpu::TextureFormat::Rgba8UnormSrgb;
        let extent = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };

        let color_texture = attachment(
            gpu,
            "Particle Color Target",
            extent,
            format,
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        );
        let depth_texture = attachment(
            gpu,
            "Particle Depth Target",
            extent,
            DEPTH_FORMAT,
            wgpu::TextureUsages::RENDER_ATTACHMENT,
        );

        Self {
            format,
            width,
            height,
            color_view: color_texture.create_view(&Default::default()),
            color_texture,
            depth_view: depth_texture.create_view(&Default::default()),
            depth_texture,
        }
    }

    /// Copy the color target to the CPU as tightly packed RGBA8 rows.
    /// Blocks until the GPU has finished every submitted frame.
    pub fn read_pixels(&self, gpu: &GpuContext) -> Result<Vec<u8>, RenderError> {
        let rows = RowLayout::rgba8(self.width);

        let readback = gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Particle Readback Buffer"),
            size: rows.padded as u64 * self.height as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = gpu.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Particle Readback Encoder"),
        });
        encoder.copy_texture_to_buffer(
            self.color_texture.as_image_copy(),
            wgpu::ImageCopyBuffer {
                buffer: &readback,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(rows.padded),
                    rows_per_image: Some(self.height),
                },
            },
            self.color_texture.size(),
        );
        gpu.queue.submit(std::iter::once(encoder.finish()));

        let slice = readback.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |mapped| {
            let _ = tx.send(mapped);
        });
        gpu.device.poll(wgpu::Maintain::Wait);
        rx.recv()
            .map_err(|e| RenderError::BufferReadFailed(e.to_string()))?
            .map_err(|e| RenderError::BufferReadFailed(e.to_string()))?;

        let pixels = rows.strip(&slice.get_mapped_range(), self.height);
        readback.unmap();
        Ok(pixels)
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

fn attachment(
    gpu: &GpuContext,
    label: &str,
    size: wgpu::Extent3d,
    format: wgpu::TextureFormat,
    usage: wgpu::TextureUsages,
) -> wgpu::Texture {
    gpu.device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage,
        view_formats: &[],
    })
}

/// Row sizes of a texture copy; wgpu pads each row to 256 bytes
#[derive(Debug, Clone, Copy, PartialEq)]
struct RowLayout {
    unpadded: u32,
    padded: u32,
}

impl RowLayout {
    fn rgba8(width: u32) -> Self {
        let unpadded = width * 4;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        Self {
            unpadded,
            padded: unpadded.div_ceil(align) * align,
        }
    }

    fn strip(&self, data: &[u8], height: u32) -> Vec<u8> {
        data.chunks(self.padded as usize)
            .take(height as usize)
            .flat_map(|row| &row[..self.unpadded as usize])
            .copied()
            .collect()
    }
}
