//! Headless N-body gravity simulation driver.
//!
//! Seeds a cloud of bodies around a heavy central attractor, runs the GPU
//! integrator for a fixed stretch of simulated time, and reports the final
//! state.

use glam::Vec3;
use nbody_physics::Body;
use nbody_simulation::GravitySimulation;
use rand::Rng;

const BODY_COUNT: usize = 1024;
const CAPACITY: u32 = 2048;
const SPAWN_RADIUS: f32 = 50.0;
const CENTRAL_MU: f32 = 5000.0;
const DT: f32 = 0.001;
const SIM_TIME: f32 = 10.0;

/// Scatter bodies uniformly through a sphere, each on a rough circular
/// orbit around a heavy attractor at the origin.
fn initialize_bodies() -> Vec<Body> {
    let mut rng = rand::rng();
    let mut bodies = Vec::with_capacity(BODY_COUNT);

    bodies.push(Body::attractor(Vec3::ZERO, CENTRAL_MU));

    while bodies.len() < BODY_COUNT {
        let theta = rng.random::<f32>() * std::f32::consts::TAU;
        let cos_phi = rng.random::<f32>() * 2.0 - 1.0;
        let sin_phi = (1.0 - cos_phi * cos_phi).sqrt();
        let r = rng.random::<f32>().powf(1.0 / 3.0) * SPAWN_RADIUS;

        let pos = Vec3::new(
            r * sin_phi * theta.cos(),
            r * sin_phi * theta.sin(),
            r * cos_phi,
        );

        let speed = (CENTRAL_MU / pos.length().max(1.0)).sqrt();
        let vel = pos.cross(Vec3::Y).normalize_or_zero() * speed;

        bodies.push(Body::new(pos, vel, rng.random::<f32>() * 0.5));
    }

    log::info!("✓ Initialized {} bodies", bodies.len());
    log::info!(
        "  Body struct size: {} bytes",
        std::mem::size_of::<Body>()
    );

    bodies
}

async fn run() {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::PRIMARY,
        ..Default::default()
    });

    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        })
        .await
        .expect("no suitable GPU adapter found");

    log::info!("✓ Using GPU: {}", adapter.get_info().name);

    let (device, queue) = adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: Some("Device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            memory_hints: wgpu::MemoryHints::default(),
            experimental_features: wgpu::ExperimentalFeatures::default(),
            trace: wgpu::Trace::Off,
        })
        .await
        .expect("failed to acquire device");

    let bodies = initialize_bodies();

    let mut sim = GravitySimulation::new(device, queue, CAPACITY);
    sim.set_time_step(DT);
    sim.write_bodies(&bodies);
    log::info!("✓ Simulation initialized");

    let steps = (SIM_TIME / DT).ceil() as usize;
    log::info!("Running {steps} steps of dt = {DT}...");

    for step in 0..steps {
        sim.step();
        if (step + 1) % 1000 == 0 {
            log::info!("  step {}/{steps}", step + 1);
        }
    }

    let out = sim.read_bodies();
    let active = &out[..sim.num_bodies() as usize];

    let mean_speed = active
        .iter()
        .map(|b| Vec3::from_array(b.velocity).length())
        .sum::<f32>()
        / active.len() as f32;
    let max_radius = active
        .iter()
        .map(|b| Vec3::from_array(b.position).length())
        .fold(0.0f32, f32::max);

    log::info!("✓ Simulation finished");
    log::info!("  mean speed: {mean_speed:.3}");
    log::info!("  max radius: {max_radius:.3}");
    log::info!("  attractor:  {:?}", active[0]);
    log::info!("  outermost:  {:?}", active.last().unwrap());
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    pollster::block_on(run());
}
