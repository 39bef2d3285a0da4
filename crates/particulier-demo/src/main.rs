//! Particulier Demo - run a particle scene for a fixed number of frames
//!
//! Usage:
//!   particulier-demo [--config <scene.toml>] [--frames N] [--dt SECONDS] [--seed N]
//!   particulier-demo --gpu [--screenshot <out.png>] [--width W] [--height H]

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use particulier::{HeadlessBackend, SceneConfig};
use particulier_core::Color;
use particulier_demo::{orbit_camera, DemoReport, FountainDemo};
use particulier_render::{GpuContext, HeadlessTarget, ParticlePipeline, WgpuParticleBackend};
use std::path::PathBuf;
use std::sync::Arc;

/// Background the fountain is drawn over
const CLEAR_COLOR: u32 = 0x222222;

#[derive(Parser)]
#[command(name = "particulier-demo")]
#[command(about = "Particulier demo - simulate and render GPU particle systems")]
struct Args {
    /// Scene file with [[system]] tables (defaults to the built-in fountain)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of frames to simulate
    #[arg(long, default_value = "600")]
    frames: u32,

    /// Fixed frame delta in seconds
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f32,

    /// Seed for the emitters' random ranges
    #[arg(long, default_value = "3735928559")]
    seed: u32,

    /// Render every frame offscreen with wgpu
    #[arg(long)]
    gpu: bool,

    /// Save the last rendered frame as a PNG
    #[arg(long, requires = "gpu")]
    screenshot: Option<PathBuf>,

    /// Offscreen target width
    #[arg(long, default_value = "800")]
    width: u32,

    /// Offscreen target height
    #[arg(long, default_value = "600")]
    height: u32,

    /// Print the final report as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let scene = match &args.config {
        Some(path) => SceneConfig::load(path)
            .with_context(|| format!("Failed to load scene config {}", path.display()))?,
        None => SceneConfig::fountain(),
    };
    info!("scene has {} particle system(s)", scene.systems.len());

    let report = if args.gpu {
        run_gpu(&args, &scene)?
    } else {
        run_headless(&args, &scene)?
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(())
}

fn run_headless(args: &Args, scene: &SceneConfig) -> Result<DemoReport> {
    let mut demo = FountainDemo::build(scene, args.seed, |_| HeadlessBackend::new())
        .context("Failed to build particle scene")?;
    for _ in 0..args.frames {
        demo.step(args.dt)?;
    }
    let report = demo.report();
    demo.shutdown()?;
    Ok(report)
}

fn run_gpu(args: &Args, scene: &SceneConfig) -> Result<DemoReport> {
    let gpu = pollster::block_on(GpuContext::new_headless()).context("Failed to create GPU context")?;
    let target = HeadlessTarget::new(&gpu, args.width, args.height);
    let pipeline = Arc::new(ParticlePipeline::new(&gpu.device, target.format));

    let mut demo = FountainDemo::build(scene, args.seed, |_| {
        WgpuParticleBackend::new(gpu.clone(), Arc::clone(&pipeline))
    })
    .context("Failed to build particle scene")?;

    let [r, g, b, a] = Color::from_hex(CLEAR_COLOR)
        .to_linear()
        .to_wgpu_components();
    let clear = wgpu::Color { r, g, b, a };

    for _ in 0..args.frames {
        demo.step(args.dt)?;
        pipeline.update_camera(
            &gpu.queue,
            &orbit_camera(demo.elapsed() as f32, target.aspect_ratio()),
        );

        let mut encoder = gpu.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Particle Frame Encoder"),
        });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Particle Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target.color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &target.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            for system in demo.world().systems() {
                system.borrow().backend().draw(&mut pass);
            }
        }
        gpu.queue.submit(std::iter::once(encoder.finish()));
    }

    if let Some(path) = &args.screenshot {
        let pixels = target.read_pixels(&gpu).context("Failed to read rendered pixels")?;
        let img = image::RgbaImage::from_raw(target.width, target.height, pixels)
            .context("Failed to create image from pixel data")?;
        img.save(path)
            .with_context(|| format!("Failed to save image to {}", path.display()))?;
        println!("Saved {}x{} frame to {}", target.width, target.height, path.display());
    }

    let report = demo.report();
    demo.shutdown()?;
    Ok(report)
}

fn print_report(report: &DemoReport) {
    println!("Frames: {}", report.frames);
    println!("Elapsed: {:.2}s", report.elapsed);
    for system in &report.systems {
        println!(
            "  {:<16} {:>6}/{:<6} live, next slot {}, {} uploads",
            system.name, system.live, system.capacity, system.cursor, system.uploads
        );
    }
}
