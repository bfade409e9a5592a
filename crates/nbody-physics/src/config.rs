//! Per-tick step configuration

use bytemuck::{Pod, Zeroable};

/// Softening radius used when none is configured. Interactions closer than
/// this contribute no force, which keeps the inverse-square law finite as
/// the separation approaches zero.
pub const DEFAULT_SOFTENING: f32 = 0.1;

/// Parameters for one integration step, uploaded as the kernel's uniform.
///
/// The layout matches the WGSL `StepConfig` struct; `_pad` keeps the record
/// at the 16-byte uniform granularity.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct StepConfig {
    /// Number of active bodies. Must never exceed the body store capacity;
    /// the host checks this before any dispatch.
    pub num_bodies: u32,
    /// Integration time step, positive
    pub dt: f32,
    /// Minimum interaction distance
    pub softening: f32,
    pub _pad: u32,
}

impl StepConfig {
    pub fn new(num_bodies: u32, dt: f32) -> Self {
        Self {
            num_bodies,
            dt,
            softening: DEFAULT_SOFTENING,
            _pad: 0,
        }
    }

    pub fn with_softening(mut self, softening: f32) -> Self {
        self.softening = softening;
        self
    }
}

impl Default for StepConfig {
    fn default() -> Self {
        Self::new(0, 0.001)
    }
}
