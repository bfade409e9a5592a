//! Reference implementation of the integrator kernel
//!
//! NOTE: This is the CPU statement of the algorithm, kept for documentation
//! and testing. The actual simulation runs the WGSL port in
//! `nbody-simulation`; the two must agree to f32 rounding.

use crate::{Body, StepConfig};
use glam::Vec3;

/// Advance the body at `idx` one step against the previous tick's snapshot.
///
/// This is the per-worker routine: it reads only `bodies` (the snapshot)
/// and returns the one record the worker owns, so mapping it over any
/// subset of indices in any order gives the same result. Position drifts
/// with the *old* velocity before the velocity kick (semi-implicit Euler).
///
/// Pairs closer than `config.softening` and the self-pair contribute
/// nothing; each disqualified pair is skipped individually and the
/// accumulation continues with the next candidate.
///
/// The `mass` lane is not inertial mass (`mu` is the only source strength
/// in the force law); it counts the ticks a record has been through.
pub fn integrate_body(idx: usize, bodies: &[Body], config: &StepConfig) -> Body {
    let mut out = bodies[idx];
    let position = Vec3::from_array(bodies[idx].position);
    let velocity = Vec3::from_array(bodies[idx].velocity);

    out.position = (position + velocity * config.dt).to_array();

    let mut accel = Vec3::ZERO;
    for (j, other) in bodies
        .iter()
        .enumerate()
        .take(config.num_bodies as usize)
    {
        if j == idx {
            continue;
        }
        let separation = Vec3::from_array(other.position) - position;
        let distance = separation.length();
        if distance < config.softening {
            continue;
        }
        accel += other.mu / (distance * distance * distance) * separation;
    }

    out.velocity = (velocity + accel * config.dt).to_array();
    out.mass += 1.0;
    out
}

/// Run one full tick: map [`integrate_body`] over `0..config.num_bodies`,
/// reading `prev` and writing `next`.
///
/// Slots at `config.num_bodies` and beyond are left untouched, so dormant
/// records keep whatever state the caller put there. `prev` and `next` are
/// distinct slices by construction, which is the same no-aliasing guarantee
/// the GPU path gets from its double buffer.
pub fn step(prev: &[Body], next: &mut [Body], config: &StepConfig) {
    let n = config.num_bodies as usize;
    assert!(
        n <= prev.len() && n <= next.len(),
        "{n} active bodies exceed store capacity ({} read / {} write slots)",
        prev.len(),
        next.len()
    );

    for (idx, out) in next.iter_mut().enumerate().take(n) {
        *out = integrate_body(idx, prev, config);
    }
}
