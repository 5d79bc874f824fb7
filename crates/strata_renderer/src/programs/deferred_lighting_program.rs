use crate::{
    programs::{GpuProgram, GpuProgramRenderContext, SceneLayouts},
    shaders::{GBUFFER_GROUP, SCENE_GROUP, ShaderId},
    texture::GBuffer,
};

/// Fullscreen lighting pass of the deferred path. Reads the G-buffer texel under
/// each pixel with `textureLoad`, so no sampler is bound.
pub struct DeferredLightingProgram {
    pipeline: wgpu::RenderPipeline,
    pub gbuffer_layout: wgpu::BindGroupLayout,
}

impl DeferredLightingProgram {
    pub fn create_gbuffer_bind_group(&self, device: &wgpu::Device, gbuffer: &GBuffer) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("G-Buffer Bind Group"),
            layout: &self.gbuffer_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&gbuffer.position),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&gbuffer.albedo),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&gbuffer.normal),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(&gbuffer.depth),
                },
            ],
        })
    }
}

impl GpuProgram for DeferredLightingProgram {
    type InitData = SceneLayouts;
    type DrawData<'a> = (
        &'a wgpu::BindGroup, // Scene (Camera/Lights/Clusters) - Group 0
        &'a wgpu::BindGroup, // G-Buffer - Group 1
    );

    fn new(ctx: &GpuProgramRenderContext, layouts: &Self::InitData) -> Self {
        let attribute_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                multisampled: false,
                view_dimension: wgpu::TextureViewDimension::D2,
                sample_type: wgpu::TextureSampleType::Float { filterable: false },
            },
            count: None,
        };
        let gbuffer_layout = ctx
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("G-Buffer Bind Group Layout"),
                entries: &[
                    // --- BINDING 0..2: Position, Albedo, Normal ---
                    attribute_entry(0),
                    attribute_entry(1),
                    attribute_entry(2),
                    // --- BINDING 3: Depth ---
                    // Read as a plain float texture; depth-typed loads don't translate to GLSL.
                    attribute_entry(3),
                ],
            });

        let vertex_module = ctx.shaders.create_module(ctx.device, ShaderId::FullscreenVert);
        let fragment_module = ctx
            .shaders
            .create_module(ctx.device, ShaderId::DeferredLightingFrag);

        let layout = ctx
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Deferred Lighting Pipeline Layout"),
                // [0: Scene, 1: G-Buffer]
                bind_group_layouts: &[&layouts.scene, &gbuffer_layout],
                push_constant_ranges: &[],
            });

        let pipeline = ctx
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                cache: None,
                label: Some("Deferred Lighting Pipeline"),
                layout: Some(&layout),
                vertex: wgpu::VertexState {
                    module: &vertex_module,
                    entry_point: Some(ShaderId::FullscreenVert.entry_point()),
                    compilation_options: Default::default(),
                    buffers: &[], // Positions come from the vertex index
                },
                fragment: Some(wgpu::FragmentState {
                    module: &fragment_module,
                    entry_point: Some(ShaderId::DeferredLightingFrag.entry_point()),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: ctx.format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                depth_stencil: None,
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    cull_mode: None,
                    ..Default::default()
                },
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
            });

        Self {
            pipeline,
            gbuffer_layout,
        }
    }

    fn record<'a>(&'a self, render_pass: &mut wgpu::RenderPass<'a>, data: Self::DrawData<'a>) {
        let (scene_bind_group, gbuffer_bind_group) = data;

        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(SCENE_GROUP, scene_bind_group, &[]);
        render_pass.set_bind_group(GBUFFER_GROUP, gbuffer_bind_group, &[]);
        render_pass.draw(0..3, 0..1);
    }
}
