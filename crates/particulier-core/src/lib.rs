//! Particulier Core - Foundational types for the particle engine
//!
//! This crate provides the types that the other particulier crates depend on:
//! - `Vec3`, `Color` - Spatial and color value types
//! - Error types and Result alias

mod error;
mod types;

pub use error::{ParticulierError, Result};
pub use types::{Color, Vec3};
