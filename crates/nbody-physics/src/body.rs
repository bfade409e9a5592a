//! Body record shared between host and device

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// GPU-compatible point mass.
///
/// Aligned for WGSL struct compatibility: the `vec3` fields sit on 16-byte
/// boundaries with `mass` and `mu` filling the trailing lanes, so an
/// `array<Body>` on the device has the same 32-byte stride as `[Body]` on
/// the host.
#[repr(C, align(16))]
#[derive(Debug, Default, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Body {
    /// Position in world coordinates
    pub position: [f32; 3],
    /// Ticks this record has been integrated for (see the kernel docs)
    pub mass: f32,
    /// Velocity vector
    pub velocity: [f32; 3],
    /// Gravitational parameter (G times mass): the strength with which this
    /// body attracts others. Zero makes the body a pure test mass.
    pub mu: f32,
}

impl Body {
    /// Create a body at `position` with the given velocity and source
    /// strength. `mu` must be non-negative.
    pub fn new(position: Vec3, velocity: Vec3, mu: f32) -> Self {
        debug_assert!(mu >= 0.0, "mu must be non-negative, got {mu}");
        Self {
            position: position.to_array(),
            mass: 0.0,
            velocity: velocity.to_array(),
            mu,
        }
    }

    /// A stationary attractor.
    pub fn attractor(position: Vec3, mu: f32) -> Self {
        Self::new(position, Vec3::ZERO, mu)
    }
}
