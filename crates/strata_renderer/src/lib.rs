//! Clustered many-light renderer.
//!
//! A [`Stage`] holds the camera block, the light pool and the clustering stage
//! that partitions the lights over a view-frustum grid every frame. A
//! [`FrameRenderer`] draws the stage either as a single Forward+ pass or as a
//! G-buffer pass followed by a deferred lighting pass.

pub mod camera;
pub mod cluster;
pub mod config;
pub mod context;
pub mod error;
pub mod light;
pub mod material;
pub mod mesh;
pub mod programs;
pub mod renderers;
pub mod scene;
pub mod shaders;
pub mod stage;
pub mod texture;

pub use camera::{CameraBuffer, CameraUniforms};
pub use cluster::{ClusterAssignment, ClusterGrid, ClusterRecord, LightClustering};
pub use config::{ClusterConfig, LightConfig, MAX_LIGHTS, RenderPath, RendererConfig};
pub use context::GpuContext;
pub use error::{RenderError, Result};
pub use light::{GpuLight, LightAnimator, LightPool, LightSet};
pub use material::MaterialData;
pub use mesh::MeshData;
pub use renderers::{FrameContext, FrameRenderer};
pub use scene::Scene;
pub use stage::Stage;
