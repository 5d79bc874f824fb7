pub mod deferred_lighting_program;
pub mod forward_plus_program;
pub mod gbuffer_program;

pub use deferred_lighting_program::DeferredLightingProgram;
pub use forward_plus_program::ForwardPlusProgram;
pub use gbuffer_program::GBufferProgram;

use crate::{
    mesh::Vertex,
    shaders::{ShaderId, ShaderLibrary},
    texture::TextureHelper,
};

/// Holds common WGPU references to simplify function signatures.
pub struct GpuProgramRenderContext<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub format: wgpu::TextureFormat, // The output format (Swapchain or offscreen)
    pub shaders: &'a ShaderLibrary,
}

/// Bind group layouts every scene pipeline is built against, in slot order.
#[derive(Clone)]
pub struct SceneLayouts {
    pub scene: wgpu::BindGroupLayout,
    pub model: wgpu::BindGroupLayout,
    pub material: wgpu::BindGroupLayout,
}

pub trait GpuProgram {
    /// Data required to initialize the pipeline (e.g., global layouts)
    type InitData;

    /// Data required to draw a frame (e.g., bind groups, the scene)
    type DrawData<'a>
    where
        Self: 'a;

    /// 1. INIT: Compiles shaders, creates pipeline layouts and the pipeline itself.
    fn new(ctx: &GpuProgramRenderContext, init_data: &Self::InitData) -> Self;

    /// 2. RECORD: Encodes commands into the RenderPass.
    fn record<'a>(&'a self, rpass: &mut wgpu::RenderPass<'a>, data: Self::DrawData<'a>);
}

/// Standard depth state of both geometry passes: test less-than, write on.
fn scene_depth_state() -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format: TextureHelper::DEPTH_FORMAT,
        depth_write_enabled: true,                  // Write Z-values
        depth_compare: wgpu::CompareFunction::Less, // Closer pixels win
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    }
}

/// Pipeline drawing scene meshes with the naive vertex shader into `targets`.
fn scene_pipeline(
    ctx: &GpuProgramRenderContext,
    layouts: &SceneLayouts,
    label: &str,
    fragment: ShaderId,
    targets: &[Option<wgpu::ColorTargetState>],
) -> wgpu::RenderPipeline {
    let vertex_module = ctx.shaders.create_module(ctx.device, ShaderId::NaiveVert);
    let fragment_module = ctx.shaders.create_module(ctx.device, fragment);

    let layout = ctx
        .device
        .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(label),
            // [0: Scene, 1: Model, 2: Material]
            bind_group_layouts: &[&layouts.scene, &layouts.model, &layouts.material],
            push_constant_ranges: &[],
        });

    ctx.device
        .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            cache: None,
            label: Some(label),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &vertex_module,
                entry_point: Some(ShaderId::NaiveVert.entry_point()),
                compilation_options: Default::default(),
                buffers: &[Vertex::desc()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &fragment_module,
                entry_point: Some(fragment.entry_point()),
                compilation_options: Default::default(),
                targets,
            }),
            depth_stencil: Some(scene_depth_state()),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        })
}
