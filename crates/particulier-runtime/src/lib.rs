//! Particulier Runtime - Frame loop building blocks
//!
//! - `FrameClock` - per-frame delta tracking with a spiral-of-death clamp
//! - `RuntimeSystem` - trait for systems ticked once per rendered frame

mod clock;
mod system;

pub use clock::FrameClock;
pub use system::RuntimeSystem;
