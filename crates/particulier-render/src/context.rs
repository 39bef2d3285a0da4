//! wgpu device setup

use std::sync::Arc;

use particulier_core::ParticulierError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Failed to get adapter")]
    AdapterNotFound,
    #[error("Failed to create device: {0}")]
    DeviceCreation(String),
    #[error("Failed to read render buffer: {0}")]
    BufferReadFailed(String),
}

impl From<RenderError> for ParticulierError {
    fn from(err: RenderError) -> Self {
        ParticulierError::Render(err.to_string())
    }
}

/// Device and queue shared by every particle backend and the pipeline
#[derive(Clone)]
pub struct GpuContext {
    pub device: Arc<wgpu::Device>,
    pub queue: Arc<wgpu::Queue>,
}

impl GpuContext {
    /// Request a device with no surface, for offscreen rendering
    pub async fn new_headless() -> Result<Self, RenderError> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RenderError::AdapterNotFound)?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Particulier Headless Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await
            .map_err(|e| RenderError::DeviceCreation(e.to_string()))?;

        log::info!("using adapter: {}", adapter.get_info().name);

        Ok(Self {
            device: Arc::new(device),
            queue: Arc::new(queue),
        })
    }
}
