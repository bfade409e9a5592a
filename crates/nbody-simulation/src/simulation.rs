//! GPU-based N-body simulation manager
//!
//! Owns the double-buffered body store: two equal-capacity storage buffers
//! that swap the roles of "previous state" (bound read-only) and "next
//! state" (bound writable) every tick. The swap happens on the host after
//! the tick's dispatch is submitted, so within a tick the kernel never sees
//! aliasing views of the same storage.

use nbody_physics::{Body, StepConfig, DEFAULT_SOFTENING};
use wgpu::util::DeviceExt;

/// Invocations per workgroup. Must match `@workgroup_size` in
/// `shaders/integrate.wgsl`; the host dispatches enough groups to cover
/// every active body and the kernel's bounds guard retires the overhang.
pub const WORKGROUP_SIZE: u32 = 64;

/// Identifies which of the two body buffers holds the latest completed
/// state. That buffer is the read side of the next tick; the other one is
/// the write target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadSide {
    A,
    B,
}

impl ReadSide {
    fn index(self) -> usize {
        match self {
            ReadSide::A => 0,
            ReadSide::B => 1,
        }
    }

    fn flipped(self) -> Self {
        match self {
            ReadSide::A => ReadSide::B,
            ReadSide::B => ReadSide::A,
        }
    }
}

/// GPU gravity simulation over a fixed-capacity body store.
pub struct GravitySimulation {
    device: wgpu::Device,
    queue: wgpu::Queue,

    // Buffers
    body_buffers: [wgpu::Buffer; 2],
    config_buffer: wgpu::Buffer,
    staging_buffer: wgpu::Buffer,

    // Compute pipeline, with one bind group per buffer orientation
    integrate_pipeline: wgpu::ComputePipeline,
    bind_groups: [wgpu::BindGroup; 2],

    read_side: ReadSide,
    capacity: u32,
    num_bodies: u32,
    dt: f32,
    softening: f32,
}

impl GravitySimulation {
    /// Create the simulation with room for `capacity` bodies. The capacity
    /// is fixed for the lifetime of the store; the active count can move
    /// anywhere below it between ticks.
    pub fn new(device: wgpu::Device, queue: wgpu::Queue, capacity: u32) -> Self {
        assert!(capacity > 0, "body store needs a non-zero capacity");
        log::info!("Initializing GravitySimulation for up to {capacity} bodies...");

        let body_bytes = capacity as u64 * std::mem::size_of::<Body>() as u64;

        // Both halves of the double buffer start zeroed; dormant slots stay
        // whatever the host leaves in them because the kernel never writes
        // past the active count.
        let body_buffers = [
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("Body Buffer A"),
                size: body_bytes,
                usage: wgpu::BufferUsages::STORAGE
                    | wgpu::BufferUsages::COPY_DST
                    | wgpu::BufferUsages::COPY_SRC,
                mapped_at_creation: false,
            }),
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("Body Buffer B"),
                size: body_bytes,
                usage: wgpu::BufferUsages::STORAGE
                    | wgpu::BufferUsages::COPY_DST
                    | wgpu::BufferUsages::COPY_SRC,
                mapped_at_creation: false,
            }),
        ];

        let config_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Step Config Buffer"),
            contents: bytemuck::cast_slice(&[StepConfig::default()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let staging_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Body Readback Staging Buffer"),
            size: body_bytes,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        log::info!("Buffers created");

        let integrate_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Integration Compute Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/integrate.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Integration Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: false },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Integration Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let integrate_pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Integration Pipeline"),
            layout: Some(&pipeline_layout),
            module: &integrate_shader,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });

        // One bind group per orientation of the double buffer, so a tick
        // only has to pick the right one instead of rebuilding bindings.
        let bind_group_for = |label, read: &wgpu::Buffer, write: &wgpu::Buffer| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout: &bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: read.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: write.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: config_buffer.as_entire_binding(),
                    },
                ],
            })
        };
        let bind_groups = [
            bind_group_for("Integration Bind Group A->B", &body_buffers[0], &body_buffers[1]),
            bind_group_for("Integration Bind Group B->A", &body_buffers[1], &body_buffers[0]),
        ];

        log::info!("Pipeline and bind groups created");

        Self {
            device,
            queue,
            body_buffers,
            config_buffer,
            staging_buffer,
            integrate_pipeline,
            bind_groups,
            read_side: ReadSide::A,
            capacity,
            num_bodies: 0,
            dt: StepConfig::default().dt,
            softening: DEFAULT_SOFTENING,
        }
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn num_bodies(&self) -> u32 {
        self.num_bodies
    }

    /// Which buffer currently holds the latest completed state.
    pub fn read_side(&self) -> ReadSide {
        self.read_side
    }

    pub fn set_time_step(&mut self, dt: f32) {
        assert!(dt > 0.0, "time step must be positive, got {dt}");
        self.dt = dt;
    }

    pub fn set_softening(&mut self, softening: f32) {
        self.softening = softening;
    }

    /// Change the active body count without touching stored records.
    /// Rejects counts beyond the store capacity before the kernel can ever
    /// see them.
    pub fn set_num_bodies(&mut self, num_bodies: u32) {
        assert!(
            num_bodies <= self.capacity,
            "{num_bodies} active bodies exceed the store capacity of {}",
            self.capacity
        );
        self.num_bodies = num_bodies;
    }

    /// Upload `bodies` into the current read side and make them the active
    /// set. Slots past `bodies.len()` keep their previous contents.
    pub fn write_bodies(&mut self, bodies: &[Body]) {
        assert!(
            bodies.len() as u64 <= self.capacity as u64,
            "{} bodies exceed the store capacity of {}",
            bodies.len(),
            self.capacity
        );
        self.queue.write_buffer(
            &self.body_buffers[self.read_side.index()],
            0,
            bytemuck::cast_slice(bodies),
        );
        self.num_bodies = bodies.len() as u32;
        log::debug!("Uploaded {} bodies", self.num_bodies);
    }

    /// Advance the simulation one tick: upload the step configuration,
    /// dispatch one worker per active body, and swap the buffer roles so
    /// the freshly written state becomes the next tick's input.
    ///
    /// With no active bodies there is nothing to integrate and the roles
    /// keep their assignment, so the stored state survives.
    pub fn step(&mut self) {
        if self.num_bodies == 0 {
            return;
        }

        let config = StepConfig::new(self.num_bodies, self.dt).with_softening(self.softening);
        self.queue
            .write_buffer(&self.config_buffer, 0, bytemuck::cast_slice(&[config]));

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Simulation Encoder"),
            });

        let workgroup_count = (self.num_bodies + WORKGROUP_SIZE - 1) / WORKGROUP_SIZE;
        {
            let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Integration Compute Pass"),
                timestamp_writes: None,
            });
            compute_pass.set_pipeline(&self.integrate_pipeline);
            compute_pass.set_bind_group(0, &self.bind_groups[self.read_side.index()], &[]);
            compute_pass.dispatch_workgroups(workgroup_count, 1, 1);
        }

        self.queue.submit(std::iter::once(encoder.finish()));

        // The write target now holds tick t+1; submission ordering on the
        // queue guarantees the next tick's pass only runs after this one.
        self.read_side = self.read_side.flipped();
    }

    /// Read the full body store (all `capacity` slots of the latest
    /// completed state) back to the host.
    pub fn read_bodies(&self) -> Vec<Body> {
        let body_bytes = self.capacity as u64 * std::mem::size_of::<Body>() as u64;

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Body Readback Encoder"),
            });
        encoder.copy_buffer_to_buffer(
            &self.body_buffers[self.read_side.index()],
            0,
            &self.staging_buffer,
            0,
            body_bytes,
        );
        self.queue.submit(std::iter::once(encoder.finish()));

        let slice = self.staging_buffer.slice(..);
        slice.map_async(wgpu::MapMode::Read, |_| {});
        self.device
            .poll(wgpu::PollType::Wait {
                submission_index: None,
                timeout: None,
            })
            .expect("failed to wait for body readback");

        let bodies = {
            let data = slice.get_mapped_range();
            bytemuck::cast_slice(&data).to_vec()
        };
        self.staging_buffer.unmap();
        bodies
    }
}
