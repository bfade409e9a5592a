//! GPU integration tests.
//!
//! These need a real adapter; on hosts without one each test prints a
//! notice and returns early instead of failing.

use glam::Vec3;
use nbody_physics::{kernel, Body, StepConfig};
use nbody_simulation::GravitySimulation;

fn create_device() -> Option<(wgpu::Device, wgpu::Queue)> {
    pollster::block_on(async {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok()?;
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Test Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults(),
                memory_hints: wgpu::MemoryHints::default(),
                experimental_features: wgpu::ExperimentalFeatures::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .ok()?;
        Some((device, queue))
    })
}

macro_rules! gpu_or_skip {
    () => {
        match create_device() {
            Some(pair) => pair,
            None => {
                eprintln!("no GPU adapter available, skipping");
                return;
            }
        }
    };
}

/// Deterministic scatter so the GPU and CPU sides see identical input.
fn scattered_bodies(count: usize) -> Vec<Body> {
    (0..count)
        .map(|i| {
            let f = i as f32;
            let position = Vec3::new((f * 0.7).sin() * 20.0, (f * 1.3).cos() * 20.0, f * 0.05);
            let velocity = Vec3::new((f * 0.2).cos(), (f * 0.4).sin(), 0.0);
            let mu = if i % 7 == 0 { 0.0 } else { 1.0 + (f * 0.9).sin().abs() };
            Body::new(position, velocity, mu)
        })
        .collect()
}

#[test]
fn gpu_step_matches_cpu_reference() {
    let (device, queue) = gpu_or_skip!();

    // 100 bodies: not a multiple of the workgroup size, so the dispatch
    // overhang exercises the bounds guard.
    // Softening well below the minimum pair distance of the scatter, so
    // both sides take identical guard branches.
    let bodies = scattered_bodies(100);
    let config = StepConfig::new(bodies.len() as u32, 0.01).with_softening(1e-4);

    let mut sim = GravitySimulation::new(device, queue, 128);
    sim.set_time_step(config.dt);
    sim.set_softening(config.softening);
    sim.write_bodies(&bodies);
    sim.step();
    let gpu = sim.read_bodies();

    let mut cpu = bodies.clone();
    kernel::step(&bodies, &mut cpu, &config);

    for (i, (g, c)) in gpu.iter().zip(cpu.iter()).enumerate() {
        for (a, b) in g
            .position
            .iter()
            .chain(g.velocity.iter())
            .zip(c.position.iter().chain(c.velocity.iter()))
        {
            assert!(
                (a - b).abs() < 1e-3,
                "body {i} diverged: gpu {g:?} vs cpu {c:?}"
            );
        }
        assert_eq!(g.mass, c.mass, "tick counter mismatch on body {i}");
        assert_eq!(g.mu, c.mu, "mu must be carried through unchanged");
    }
}

#[test]
fn dormant_slots_survive_a_step() {
    let (device, queue) = gpu_or_skip!();

    let mut sim = GravitySimulation::new(device, queue, 8);
    sim.set_time_step(0.1);
    sim.write_bodies(&scattered_bodies(3));
    sim.step();

    let out = sim.read_bodies();
    assert_eq!(out.len(), 8);
    for (i, body) in out.iter().enumerate().skip(3) {
        assert_eq!(
            *body,
            Body::default(),
            "dormant slot {i} was written by the kernel"
        );
    }
}

#[test]
fn consecutive_steps_ping_pong_the_store() {
    let (device, queue) = gpu_or_skip!();

    let mut sim = GravitySimulation::new(device, queue, 4);
    sim.set_time_step(0.5);

    let initial = sim.read_side();
    sim.write_bodies(&[Body::new(Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0), 0.0)]);

    // Two ticks land back on the starting buffer, and the second tick must
    // have consumed the first tick's output rather than the initial upload.
    sim.step();
    assert_ne!(sim.read_side(), initial);
    sim.step();
    assert_eq!(sim.read_side(), initial);

    let out = sim.read_bodies();
    let body = out[0];
    assert!(
        (body.position[0] - 1.0).abs() < 1e-6,
        "two drifts of v*dt expected, got {:?}",
        body.position
    );
    assert_eq!(body.mass, 2.0, "each tick increments the counter once");
}

#[test]
fn zero_active_bodies_is_a_no_op() {
    let (device, queue) = gpu_or_skip!();

    let mut sim = GravitySimulation::new(device, queue, 4);
    sim.set_time_step(0.5);
    sim.write_bodies(&scattered_bodies(2));
    sim.set_num_bodies(0);

    let side = sim.read_side();
    sim.step();

    // No dispatch, no swap: the uploaded state is still the live state.
    assert_eq!(sim.read_side(), side);
    let out = sim.read_bodies();
    assert_eq!(out[0], scattered_bodies(2)[0]);
}
