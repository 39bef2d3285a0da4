//! Runtime system trait

use particulier_core::Result;

/// A system that can be ticked by the frame loop
///
/// Systems are updated in registration order, once per rendered frame.
pub trait RuntimeSystem {
    /// Called once before the first update
    fn initialize(&mut self) -> Result<()>;

    /// Called once per frame with the frame delta in seconds
    fn update(&mut self, dt: f32) -> Result<()>;

    /// Called when the system is being shut down
    fn shutdown(&mut self) -> Result<()>;

    /// Human-readable name for this system
    fn name(&self) -> &str;
}
