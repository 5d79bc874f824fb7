use crate::{
    programs::{GpuProgram, GpuProgramRenderContext, SceneLayouts, scene_pipeline},
    scene::Scene,
    shaders::{SCENE_GROUP, ShaderId},
    texture::GBuffer,
};

/// Geometry pass of the deferred path: position, albedo and normal per pixel, no lighting.
pub struct GBufferProgram {
    pipeline: wgpu::RenderPipeline,
}

impl GpuProgram for GBufferProgram {
    type InitData = SceneLayouts;
    type DrawData<'a> = (
        &'a wgpu::BindGroup, // Scene - Group 0 (only the camera is read)
        &'a Scene,
    );

    fn new(ctx: &GpuProgramRenderContext, layouts: &Self::InitData) -> Self {
        let targets = GBuffer::COLOR_FORMATS.map(|format| {
            Some(wgpu::ColorTargetState {
                format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })
        });
        let pipeline = scene_pipeline(ctx, layouts, "G-Buffer Pipeline", ShaderId::GBufferFrag, &targets);

        Self { pipeline }
    }

    fn record<'a>(&'a self, render_pass: &mut wgpu::RenderPass<'a>, data: Self::DrawData<'a>) {
        let (scene_bind_group, scene) = data;

        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(SCENE_GROUP, scene_bind_group, &[]);
        scene.draw(render_pass);
    }
}
