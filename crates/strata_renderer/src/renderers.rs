//! Frame orchestration for the two many-light strategies.
//!
//! Every frame is one submission: the clustering dispatch first, then the passes
//! that read its buffers. Ordering inside the encoder is all the synchronization
//! there is.

pub mod clustered_deferred;
pub mod forward_plus;

pub use clustered_deferred::ClusteredDeferredRenderer;
pub use forward_plus::ForwardPlusRenderer;

use crate::{
    config::RenderPath, context::GpuContext, error::Result, programs::GpuProgramRenderContext,
    stage::Stage,
};

/// Per-frame input shared by both paths.
pub struct FrameContext<'a> {
    pub gpu: &'a GpuContext,
    pub stage: &'a Stage,
    /// Color target of the frame, usually the acquired surface texture.
    pub target: &'a wgpu::TextureView,
}

/// Final clear color. The deferred lighting pass writes the same value where
/// nothing was drawn, so both paths agree on empty pixels.
pub(crate) const CLEAR_COLOR: wgpu::Color = wgpu::Color::BLACK;

/// Program context for pipelines created inside [`GpuContext::create_checked`].
fn program_context<'a>(
    device: &'a wgpu::Device,
    gpu: &'a GpuContext,
    stage: &'a Stage,
) -> GpuProgramRenderContext<'a> {
    GpuProgramRenderContext {
        device,
        queue: &gpu.queue,
        format: gpu.format(),
        shaders: stage.shaders(),
    }
}

pub enum FrameRenderer {
    ForwardPlus(ForwardPlusRenderer),
    ClusteredDeferred(ClusteredDeferredRenderer),
}

impl FrameRenderer {
    pub fn new(path: RenderPath, gpu: &GpuContext, stage: &Stage) -> Result<Self> {
        let renderer = match path {
            RenderPath::ForwardPlus => Self::ForwardPlus(ForwardPlusRenderer::new(gpu, stage)?),
            RenderPath::ClusteredDeferred => {
                Self::ClusteredDeferred(ClusteredDeferredRenderer::new(gpu, stage)?)
            }
        };
        log::info!("Render path: {path:?}");
        Ok(renderer)
    }

    pub fn path(&self) -> RenderPath {
        match self {
            Self::ForwardPlus(_) => RenderPath::ForwardPlus,
            Self::ClusteredDeferred(_) => RenderPath::ClusteredDeferred,
        }
    }

    /// Records clustering plus the path's passes and submits them together.
    pub fn render(&self, frame: &FrameContext) -> wgpu::SubmissionIndex {
        match self {
            Self::ForwardPlus(renderer) => renderer.render(frame),
            Self::ClusteredDeferred(renderer) => renderer.render(frame),
        }
    }

    /// Rebuilds the size-dependent targets after [`GpuContext::resize`]. A failed
    /// allocation is fatal, like at start-up.
    pub fn resize(&mut self, gpu: &GpuContext) -> Result<()> {
        match self {
            Self::ForwardPlus(renderer) => renderer.resize(gpu),
            Self::ClusteredDeferred(renderer) => renderer.resize(gpu),
        }
    }
}
