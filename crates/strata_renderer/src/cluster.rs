//! Spatial light clustering: the frustum is cut into a `tiles_x * tiles_y * tiles_z`
//! grid and every cell gets the list of lights whose influence sphere touches it.
//!
//! Screen tiles split NDC uniformly, depth slices grow exponentially from `near` to
//! `far`. Cell `(x, y, z)` has index `x + y * tiles_x + z * tiles_x * tiles_y`.
//! Lights are tested in ascending index order and a cell keeps the first
//! `max_lights_per_tile` hits.

pub mod assign;
pub mod pass;

pub use assign::ClusterAssignment;
pub use pass::LightClustering;

use crate::{
    config::ClusterConfig,
    error::{RenderError, Result},
};

/// Per-cell record in the cluster buffer, after its `u32` cell-count header.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ClusterRecord {
    pub count: u32,
    pub _reserved: [u32; 3],
}

impl ClusterRecord {
    pub const SIZE: u64 = std::mem::size_of::<Self>() as u64;
}

/// Validated grid dimensions. Every cluster buffer is sized from one of these, and
/// the camera block copies its dimensions from the same value.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ClusterGrid {
    pub tiles_x: u32,
    pub tiles_y: u32,
    pub tiles_z: u32,
    pub max_lights_per_tile: u32,
    pub workgroup_size: u32,
}

impl ClusterGrid {
    pub const HEADER_SIZE: u64 = 4;

    pub fn new(config: &ClusterConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            tiles_x: config.tiles_x,
            tiles_y: config.tiles_y,
            tiles_z: config.tiles_z,
            max_lights_per_tile: config.max_lights_per_tile,
            workgroup_size: config.tile_workgroup_size,
        })
    }

    pub fn total_cells(&self) -> u32 {
        self.tiles_x * self.tiles_y * self.tiles_z
    }

    /// `u32` header plus one [`ClusterRecord`] per cell.
    pub fn record_buffer_size(&self) -> u64 {
        Self::HEADER_SIZE + self.total_cells() as u64 * ClusterRecord::SIZE
    }

    /// `max_lights_per_tile` light indices per cell.
    pub fn index_buffer_size(&self) -> u64 {
        self.total_cells() as u64 * self.max_lights_per_tile as u64 * 4
    }

    pub fn workgroup_count(&self) -> u32 {
        self.total_cells().div_ceil(self.workgroup_size)
    }

    pub fn cell_index(&self, x: u32, y: u32, z: u32) -> u32 {
        x + y * self.tiles_x + z * self.tiles_x * self.tiles_y
    }

    pub fn cell_coords(&self, index: u32) -> (u32, u32, u32) {
        let slice = self.tiles_x * self.tiles_y;
        (index % self.tiles_x, (index / self.tiles_x) % self.tiles_y, index / slice)
    }

    /// Checks the buffers and the dispatch against what the device can do. Runs
    /// once, before anything is allocated.
    pub fn check_limits(&self, limits: &wgpu::Limits) -> Result<()> {
        let storage_limit = limits.max_storage_buffer_binding_size as u64;
        let buffer_limit = limits.max_buffer_size.min(storage_limit);
        for (label, size) in [
            ("cluster record buffer", self.record_buffer_size()),
            ("cluster index buffer", self.index_buffer_size()),
        ] {
            if size > buffer_limit {
                return Err(RenderError::BufferTooLarge {
                    label,
                    size,
                    limit: buffer_limit,
                });
            }
        }

        if self.workgroup_size > limits.max_compute_workgroup_size_x
            || self.workgroup_size > limits.max_compute_invocations_per_workgroup
        {
            return Err(RenderError::InvalidClusterConfig(format!(
                "workgroup size {} exceeds the device limit of {}",
                self.workgroup_size,
                limits
                    .max_compute_workgroup_size_x
                    .min(limits.max_compute_invocations_per_workgroup)
            )));
        }
        if self.workgroup_count() > limits.max_compute_workgroups_per_dimension {
            return Err(RenderError::InvalidClusterConfig(format!(
                "{} workgroups exceed the device limit of {}",
                self.workgroup_count(),
                limits.max_compute_workgroups_per_dimension
            )));
        }
        Ok(())
    }
}
