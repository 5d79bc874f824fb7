use glam::Mat4;
use strata_core::Camera;
use wgpu::util::DeviceExt;

use crate::{cluster::ClusterGrid, context::GpuContext, error::Result};

/// The per-frame camera block. Every stage reads it, nobody but the host writes it.
///
/// Layout is 40 floats: view-projection, view, then the screen and grid scalars.
/// The grid dimensions are stored as floats so the block stays a flat `f32` array.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub screen_width: f32,
    pub screen_height: f32,
    pub near: f32,
    pub far: f32,
    pub tiles_x: f32,
    pub tiles_y: f32,
    pub tiles_z: f32,
    pub _padding: f32,
}

impl CameraUniforms {
    pub const SIZE: u64 = std::mem::size_of::<Self>() as u64;

    pub fn new(
        view_proj: Mat4,
        view: Mat4,
        screen: (u32, u32),
        near: f32,
        far: f32,
        grid: &ClusterGrid,
    ) -> Self {
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            view: view.to_cols_array_2d(),
            screen_width: screen.0 as f32,
            screen_height: screen.1 as f32,
            near,
            far,
            tiles_x: grid.tiles_x as f32,
            tiles_y: grid.tiles_y as f32,
            tiles_z: grid.tiles_z as f32,
            _padding: 0.0,
        }
    }

    /// Builds the block from a fly camera and the current target size.
    pub fn from_camera(camera: &Camera, width: u32, height: u32, grid: &ClusterGrid) -> Self {
        let aspect = width.max(1) as f32 / height.max(1) as f32;
        let view = camera.view_matrix();
        let proj = camera.projection_matrix(aspect);
        Self::new(proj * view, view, (width, height), camera.near, camera.far, grid)
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.view)
    }

    pub fn view_proj_matrix(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.view_proj)
    }

    /// View -> Clip, recovered from the two stored matrices.
    pub fn projection_matrix(&self) -> Mat4 {
        self.view_proj_matrix() * self.view_matrix().inverse()
    }
}

/// Uniform buffer holding one [`CameraUniforms`], rewritten every frame.
pub struct CameraBuffer {
    buffer: wgpu::Buffer,
    current: CameraUniforms,
}

impl CameraBuffer {
    pub fn new(gpu: &GpuContext, initial: CameraUniforms) -> Result<Self> {
        let buffer = gpu.create_checked("Camera Buffer", |device| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Camera Buffer"),
                contents: bytemuck::bytes_of(&initial),
                // COPY_DST so the host can overwrite it each frame
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            })
        })?;

        Ok(Self {
            buffer,
            current: initial,
        })
    }

    pub fn update(&mut self, queue: &wgpu::Queue, uniforms: CameraUniforms) {
        self.current = uniforms;
        queue.write_buffer(&self.buffer, 0, bytemuck::bytes_of(&uniforms));
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    /// Last block written, as seen by the host.
    pub fn current(&self) -> &CameraUniforms {
        &self.current
    }
}
