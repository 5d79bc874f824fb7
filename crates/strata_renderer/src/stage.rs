use strata_core::Camera;

use crate::{
    camera::{CameraBuffer, CameraUniforms},
    cluster::{ClusterAssignment, ClusterGrid, LightClustering},
    config::RendererConfig,
    context::GpuContext,
    error::Result,
    light::{LightAnimator, LightPool, LightSet},
    programs::SceneLayouts,
    scene::Scene,
    shaders::ShaderLibrary,
};

/// Everything a frame reads, whichever render path draws it: camera block, light
/// pool, the clustering stage over them, and the meshes.
///
/// Both [`crate::FrameRenderer`] variants borrow the same stage, so switching
/// paths never rebuilds the light or cluster buffers.
pub struct Stage {
    config: RendererConfig,
    grid: ClusterGrid,
    shaders: ShaderLibrary,
    camera: CameraBuffer,
    lights: LightPool,
    animator: LightAnimator,
    clustering: LightClustering,
    scene: Scene,
    scene_layout: wgpu::BindGroupLayout,
    scene_bind_group: wgpu::BindGroup,
}

impl Stage {
    pub fn new(gpu: &GpuContext, config: RendererConfig, scene: Scene) -> Result<Self> {
        config.validate()?;
        let grid = ClusterGrid::new(&config.cluster)?;
        let shaders = ShaderLibrary::new(&config);

        let initial = CameraUniforms::from_camera(&Camera::default(), gpu.width(), gpu.height(), &grid);
        let camera = CameraBuffer::new(gpu, initial)?;
        let lights = LightPool::new(gpu, &config.lights)?;
        let animator = LightAnimator::new(gpu, &lights, &config.lights, &shaders)?;
        let clustering = LightClustering::new(gpu, grid, &camera, &lights, &shaders)?;

        let read_only_storage = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only: true },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };
        let scene_layout = gpu
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Scene Bind Group Layout"),
                entries: &[
                    // --- BINDING 0: Camera Uniforms ---
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: wgpu::BufferSize::new(CameraUniforms::SIZE),
                        },
                        count: None,
                    },
                    // --- BINDING 1: Light Set ---
                    read_only_storage(1),
                    // --- BINDING 2: Cluster Records ---
                    read_only_storage(2),
                    // --- BINDING 3: Cluster Light Indices ---
                    read_only_storage(3),
                ],
            });

        let scene_bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Scene Bind Group"),
            layout: &scene_layout,
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
                    resource: clustering.record_buffer().as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: clustering.index_buffer().as_entire_binding(),
                },
            ],
        });

        log::info!(
            "Stage ready: {} objects, {} / {} lights active",
            scene.object_count(),
            lights.active_count(),
            lights.capacity()
        );

        Ok(Self {
            config,
            grid,
            shaders,
            camera,
            lights,
            animator,
            clustering,
            scene,
            scene_layout,
            scene_bind_group,
        })
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub fn grid(&self) -> &ClusterGrid {
        &self.grid
    }

    pub fn shaders(&self) -> &ShaderLibrary {
        &self.shaders
    }

    pub fn camera(&self) -> &CameraBuffer {
        &self.camera
    }

    pub fn lights(&self) -> &LightPool {
        &self.lights
    }

    pub fn clustering(&self) -> &LightClustering {
        &self.clustering
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Group 0 of every render pipeline.
    pub fn scene_bind_group(&self) -> &wgpu::BindGroup {
        &self.scene_bind_group
    }

    pub fn layouts(&self) -> SceneLayouts {
        SceneLayouts {
            scene: self.scene_layout.clone(),
            model: self.scene.model_layout().clone(),
            material: self.scene.material_layout().clone(),
        }
    }

    /// Rewrites the camera block for the current target size.
    pub fn update_camera(&mut self, gpu: &GpuContext, camera: &Camera) {
        let uniforms = CameraUniforms::from_camera(camera, gpu.width(), gpu.height(), &self.grid);
        self.camera.update(&gpu.queue, uniforms);
    }

    /// Writes a caller-built camera block. The grid dimensions are always the stage's own.
    pub fn set_camera_uniforms(&mut self, queue: &wgpu::Queue, mut uniforms: CameraUniforms) {
        uniforms.tiles_x = self.grid.tiles_x as f32;
        uniforms.tiles_y = self.grid.tiles_y as f32;
        uniforms.tiles_z = self.grid.tiles_z as f32;
        self.camera.update(queue, uniforms);
    }

    /// Submits the light movement on its own, ahead of the frame.
    pub fn animate_lights(&self, gpu: &GpuContext, elapsed_seconds: f32) -> Option<wgpu::SubmissionIndex> {
        self.animator.update(gpu, &self.lights, elapsed_seconds)
    }

    pub fn set_active_lights(&mut self, gpu: &GpuContext, requested: u32) -> u32 {
        self.lights.set_active_count(&gpu.queue, requested)
    }

    /// Replaces the light pool contents, e.g. with hand-placed lights.
    pub fn upload_lights(&mut self, gpu: &GpuContext, set: LightSet) {
        self.lights.upload(&gpu.queue, set);
    }

    /// Host-side clustering of the active lights as the host last wrote them.
    ///
    /// Lights moved by the animator live only on the device, so this matches the
    /// kernel only while the pool has not been animated since its last upload.
    pub fn reference_clusters(&self) -> ClusterAssignment {
        ClusterAssignment::compute(
            &self.grid,
            self.camera.current(),
            self.lights.set().active_lights(),
            self.config.lights.radius,
        )
    }
}
