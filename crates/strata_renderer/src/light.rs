use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use wgpu::util::DeviceExt;

use crate::{
    config::{LightConfig, MAX_LIGHTS},
    context::GpuContext,
    error::Result,
    shaders::{ShaderId, ShaderLibrary},
};

/// One point light as the GPU sees it: 8 floats, position then color.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuLight {
    pub position: [f32; 3],
    pub _pad0: f32,
    pub color: [f32; 3],
    pub _pad1: f32,
}

impl GpuLight {
    pub fn new(position: Vec3, color: Vec3) -> Self {
        Self {
            position: position.to_array(),
            _pad0: 0.0,
            color: color.to_array(),
            _pad1: 0.0,
        }
    }
}

/// Hue in [0, 1] to a pastel RGB: the pure hue pulled 80% of the way from white.
pub fn hue_to_rgb(hue: f32) -> Vec3 {
    let f = |n: f32| {
        let k = (n + hue * 6.0).rem_euclid(6.0);
        1.0 - k.min(4.0 - k).clamp(0.0, 1.0)
    };
    Vec3::ONE.lerp(Vec3::new(f(5.0), f(3.0), f(1.0)), 0.8)
}

/// Host copy of the light pool. Always holds [`MAX_LIGHTS`] entries; only the
/// first `active_count` take part in clustering and shading.
#[derive(Clone, Debug)]
pub struct LightSet {
    lights: Vec<GpuLight>,
    active: u32,
}

impl LightSet {
    /// Size of the device buffer: a `u32` active count followed by every light.
    pub const BUFFER_SIZE: u64 = 4 + MAX_LIGHTS as u64 * std::mem::size_of::<GpuLight>() as u64;

    /// Seeded colors and start positions for the whole pool.
    pub fn generate(config: &LightConfig) -> Self {
        let mut rng = Pcg32::seed_from_u64(config.seed);
        let min = Vec3::from(config.bounds_min);
        let max = Vec3::from(config.bounds_max);

        let lights = (0..MAX_LIGHTS)
            .map(|_| {
                let color = hue_to_rgb(rng.random::<f32>()) * config.intensity;
                let t = Vec3::new(rng.random(), rng.random(), rng.random());
                GpuLight::new(min + (max - min) * t, color)
            })
            .collect();

        let mut set = Self { lights, active: 0 };
        set.set_active_count(config.initial_count);
        set
    }

    /// A pool whose first lights are `lights`, all of them active.
    pub fn from_lights(lights: &[GpuLight]) -> Self {
        let count = lights.len().min(MAX_LIGHTS as usize);
        let mut all = vec![GpuLight::default(); MAX_LIGHTS as usize];
        all[..count].copy_from_slice(&lights[..count]);
        let mut set = Self {
            lights: all,
            active: 0,
        };
        set.set_active_count(lights.len() as u32);
        set
    }

    pub fn capacity(&self) -> u32 {
        MAX_LIGHTS
    }

    pub fn active_count(&self) -> u32 {
        self.active
    }

    /// Clamps `requested` to the capacity and returns the count actually applied.
    pub fn set_active_count(&mut self, requested: u32) -> u32 {
        if requested > MAX_LIGHTS {
            log::warn!("Requested {requested} lights, clamping to capacity {MAX_LIGHTS}");
        }
        self.active = requested.min(MAX_LIGHTS);
        self.active
    }

    pub fn lights(&self) -> &[GpuLight] {
        &self.lights
    }

    pub fn active_lights(&self) -> &[GpuLight] {
        &self.lights[..self.active as usize]
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(Self::BUFFER_SIZE as usize);
        bytes.extend_from_slice(&self.active.to_le_bytes());
        bytes.extend_from_slice(bytemuck::cast_slice(&self.lights));
        bytes
    }
}

/// The light storage buffer plus its host copy.
///
/// Positions in the host copy are the start positions; once the animator runs the
/// device copy is the only up-to-date one.
pub struct LightPool {
    set: LightSet,
    buffer: wgpu::Buffer,
}

impl LightPool {
    pub fn new(gpu: &GpuContext, config: &LightConfig) -> Result<Self> {
        config.validate()?;
        let set = LightSet::generate(config);

        let buffer = gpu.create_checked("Light Set Buffer", |device| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Light Set Buffer"),
                contents: &set.to_bytes(),
                usage: wgpu::BufferUsages::STORAGE
                    | wgpu::BufferUsages::COPY_DST
                    | wgpu::BufferUsages::COPY_SRC,
            })
        })?;
        log::info!(
            "Light pool: {} of {} lights active ({} bytes)",
            set.active_count(),
            set.capacity(),
            LightSet::BUFFER_SIZE
        );

        Ok(Self { set, buffer })
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    pub fn set(&self) -> &LightSet {
        &self.set
    }

    pub fn active_count(&self) -> u32 {
        self.set.active_count()
    }

    pub fn capacity(&self) -> u32 {
        self.set.capacity()
    }

    /// Clamps and uploads the active count. Takes effect for the next submission.
    pub fn set_active_count(&mut self, queue: &wgpu::Queue, requested: u32) -> u32 {
        let previous = self.set.active_count();
        let applied = self.set.set_active_count(requested);
        if applied != previous {
            log::info!("Active lights: {previous} -> {applied}");
        }
        queue.write_buffer(&self.buffer, 0, &applied.to_le_bytes());
        applied
    }

    /// Replaces the whole pool, e.g. with a hand-placed test scene.
    pub fn upload(&mut self, queue: &wgpu::Queue, set: LightSet) {
        queue.write_buffer(&self.buffer, 0, &set.to_bytes());
        self.set = set;
    }
}

/// Number of move-lights workgroups for `active` lights.
pub fn move_workgroup_count(active: u32, workgroup_size: u32) -> u32 {
    active.div_ceil(workgroup_size.max(1))
}

/// Advances every active light along its bounce path on the GPU.
///
/// Runs in its own submission so the cost stays out of the frame's timings.
pub struct LightAnimator {
    time_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    pipeline: wgpu::ComputePipeline,
    workgroup_size: u32,
}

impl LightAnimator {
    pub fn new(
        gpu: &GpuContext,
        pool: &LightPool,
        config: &LightConfig,
        shaders: &ShaderLibrary,
    ) -> Result<Self> {
        let device = &gpu.device;

        let time_buffer = gpu.create_checked("Time Uniform Buffer", |device| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("Time Uniform Buffer"),
                // Only the first float is used, the rest pads to 16 bytes
                size: 16,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        })?;

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Move Lights Bind Group Layout"),
            entries: &[
                // --- BINDING 0: Light Set ---
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: false },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // --- BINDING 1: Time ---
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
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

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Move Lights Bind Group"),
            layout: &layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: pool.buffer().as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: time_buffer.as_entire_binding(),
                },
            ],
        });

        let pipeline = gpu.create_checked("Move Lights Pipeline", |device| {
            let module = shaders.create_module(device, ShaderId::MoveLightsCompute);
            let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Move Lights Pipeline Layout"),
                bind_group_layouts: &[&layout],
                push_constant_ranges: &[],
            });
            device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some("Move Lights Pipeline"),
                layout: Some(&pipeline_layout),
                module: &module,
                entry_point: Some(ShaderId::MoveLightsCompute.entry_point()),
                compilation_options: Default::default(),
                cache: None,
            })
        })?;

        Ok(Self {
            time_buffer,
            bind_group,
            pipeline,
            workgroup_size: config.move_workgroup_size,
        })
    }

    /// Writes the elapsed time and submits the move-lights kernel on its own.
    /// Nothing is submitted while no light is active.
    pub fn update(
        &self,
        gpu: &GpuContext,
        pool: &LightPool,
        elapsed_seconds: f32,
    ) -> Option<wgpu::SubmissionIndex> {
        let workgroups = move_workgroup_count(pool.active_count(), self.workgroup_size);
        if workgroups == 0 {
            return None;
        }

        gpu.queue
            .write_buffer(&self.time_buffer, 0, bytemuck::bytes_of(&elapsed_seconds));

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Move Lights Encoder"),
            });
        {
            let mut cpass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Move Lights Pass"),
                timestamp_writes: None,
            });
            cpass.set_pipeline(&self.pipeline);
            cpass.set_bind_group(0, &self.bind_group, &[]);
            cpass.dispatch_workgroups(workgroups, 1, 1);
        }

        Some(gpu.queue.submit(std::iter::once(encoder.finish())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn light_record_is_eight_floats() {
        assert_eq!(std::mem::size_of::<GpuLight>(), 32);
        assert_eq!(std::mem::offset_of!(GpuLight, color), 16);
        assert_eq!(LightSet::BUFFER_SIZE, 4 + 5000 * 32);
    }

    #[test]
    fn hues_are_pastel() {
        let red = hue_to_rgb(0.0);
        assert!((red - Vec3::new(1.0, 0.2, 0.2)).length() < 1e-5);
        let green = hue_to_rgb(1.0 / 3.0);
        assert!((green - Vec3::new(0.2, 1.0, 0.2)).length() < 1e-4);
        for i in 0..=20 {
            let c = hue_to_rgb(i as f32 / 20.0);
            assert!(c.min_element() >= 0.2 - 1e-5 && c.max_element() <= 1.0 + 1e-5);
        }
    }

    #[test]
    fn generation_is_seeded_and_bounded() {
        let config = LightConfig::default();
        let a = LightSet::generate(&config);
        let b = LightSet::generate(&config);
        assert_eq!(a.lights(), b.lights());
        assert_eq!(a.active_count(), 500);

        let min = Vec3::from(config.bounds_min);
        let max = Vec3::from(config.bounds_max);
        for light in a.lights() {
            let p = Vec3::from(light.position);
            assert!(p.cmpge(min).all() && p.cmple(max).all());
            assert!(Vec3::from(light.color).max_element() <= config.intensity + 1e-6);
        }

        let other = LightSet::generate(&LightConfig {
            seed: 7,
            ..config
        });
        assert_ne!(a.lights(), other.lights());
    }

    #[test]
    fn active_count_is_clamped_to_capacity() {
        let mut set = LightSet::generate(&LightConfig::default());
        assert_eq!(set.set_active_count(5000), 5000);
        assert_eq!(set.set_active_count(5001), 5000);
        assert_eq!(set.set_active_count(u32::MAX), 5000);
        assert_eq!(set.active_lights().len(), 5000);
        assert_eq!(set.set_active_count(0), 0);
        assert!(set.active_lights().is_empty());
    }

    #[test]
    fn bytes_start_with_active_count() {
        let set = LightSet::from_lights(&[
            GpuLight::new(Vec3::new(1.0, 2.0, 3.0), Vec3::new(0.5, 0.25, 0.125)),
            GpuLight::new(Vec3::ZERO, Vec3::ONE),
        ]);
        let bytes = set.to_bytes();
        assert_eq!(bytes.len() as u64, LightSet::BUFFER_SIZE);
        assert_eq!(u32::from_le_bytes(bytes[0..4].try_into().unwrap()), 2);

        let first: &[f32] = bytemuck::cast_slice(&bytes[4..36]);
        assert_eq!(first, &[1.0, 2.0, 3.0, 0.0, 0.5, 0.25, 0.125, 0.0]);
    }

    #[test]
    fn workgroups_round_up() {
        assert_eq!(move_workgroup_count(0, 128), 0);
        assert_eq!(move_workgroup_count(1, 128), 1);
        assert_eq!(move_workgroup_count(128, 128), 1);
        assert_eq!(move_workgroup_count(500, 128), 4);
        assert_eq!(move_workgroup_count(5000, 128), 40);
    }
}
