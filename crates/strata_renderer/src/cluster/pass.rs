use super::{ClusterAssignment, ClusterGrid};
use crate::{
    camera::CameraBuffer,
    context::GpuContext,
    error::Result,
    light::LightPool,
    shaders::{ShaderId, ShaderLibrary},
};

/// The clustering compute stage and the two buffers it writes every frame.
///
/// Both render paths read the same buffers; the grid they were sized for is
/// fixed for the lifetime of this value.
pub struct LightClustering {
    grid: ClusterGrid,
    record_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    pipeline: wgpu::ComputePipeline,
}

impl LightClustering {
    pub fn new(
        gpu: &GpuContext,
        grid: ClusterGrid,
        camera: &CameraBuffer,
        lights: &LightPool,
        shaders: &ShaderLibrary,
    ) -> Result<Self> {
        grid.check_limits(&gpu.device.limits())?;

        let usage = wgpu::BufferUsages::STORAGE
            | wgpu::BufferUsages::COPY_DST
            | wgpu::BufferUsages::COPY_SRC;
        let record_buffer = gpu.create_checked("Cluster Record Buffer", |device| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("Cluster Record Buffer"),
                size: grid.record_buffer_size(),
                usage,
                mapped_at_creation: false,
            })
        })?;
        let index_buffer = gpu.create_checked("Cluster Index Buffer", |device| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("Cluster Index Buffer"),
                size: grid.index_buffer_size(),
                usage,
                mapped_at_creation: false,
            })
        })?;
        // The header never changes, the kernel only writes the records after it.
        gpu.queue
            .write_buffer(&record_buffer, 0, &grid.total_cells().to_le_bytes());

        log::info!(
            "Cluster grid {}x{}x{} ({} cells, {} lights/cell): records {} bytes, indices {} bytes",
            grid.tiles_x,
            grid.tiles_y,
            grid.tiles_z,
            grid.total_cells(),
            grid.max_lights_per_tile,
            grid.record_buffer_size(),
            grid.index_buffer_size()
        );

        let storage = |binding, read_only| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };
        let layout = gpu
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Light Clustering Bind Group Layout"),
                entries: &[
                    // --- BINDING 0: Camera ---
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                    // --- BINDING 1: Light Set ---
                    storage(1, true),
                    // --- BINDING 2/3: Cluster output ---
                    storage(2, false),
                    storage(3, false),
                ],
            });

        let bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Light Clustering Bind Group"),
            layout: &layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: camera.buffer().as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: lights.buffer().as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: record_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: index_buffer.as_entire_binding(),
                },
            ],
        });

        let pipeline = gpu.create_checked("Light Clustering Pipeline", |device| {
            let module = shaders.create_module(device, ShaderId::ClusteringCompute);
            let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Light Clustering Pipeline Layout"),
                bind_group_layouts: &[&layout],
                push_constant_ranges: &[],
            });
            device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some("Light Clustering Pipeline"),
                layout: Some(&pipeline_layout),
                module: &module,
                entry_point: Some(ShaderId::ClusteringCompute.entry_point()),
                compilation_options: Default::default(),
                cache: None,
            })
        })?;

        Ok(Self {
            grid,
            record_buffer,
            index_buffer,
            bind_group,
            pipeline,
        })
    }

    pub fn grid(&self) -> &ClusterGrid {
        &self.grid
    }

    pub fn record_buffer(&self) -> &wgpu::Buffer {
        &self.record_buffer
    }

    pub fn index_buffer(&self) -> &wgpu::Buffer {
        &self.index_buffer
    }

    /// Records the clustering dispatch. Passes recorded after it on the same
    /// encoder see its output.
    pub fn record(&self, encoder: &mut wgpu::CommandEncoder) {
        let mut cpass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("Light Clustering Pass"),
            timestamp_writes: None,
        });
        cpass.set_pipeline(&self.pipeline);
        cpass.set_bind_group(0, &self.bind_group, &[]);
        cpass.dispatch_workgroups(self.grid.workgroup_count(), 1, 1);
    }

    /// Runs the stage on its own and returns a copy of its output.
    pub fn run_and_read_back(&self, gpu: &GpuContext) -> Result<ClusterAssignment> {
        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Light Clustering Encoder"),
            });
        self.record(&mut encoder);
        gpu.queue.submit(std::iter::once(encoder.finish()));
        self.read_back(gpu)
    }

    /// Copies both cluster buffers back to the host. Blocks until the queue drains.
    pub fn read_back(&self, gpu: &GpuContext) -> Result<ClusterAssignment> {
        let records = gpu.read_buffer(&self.record_buffer, self.grid.record_buffer_size())?;
        let indices = gpu.read_buffer(&self.index_buffer, self.grid.index_buffer_size())?;
        ClusterAssignment::from_bytes(&self.grid, &records, &indices)
    }
}
