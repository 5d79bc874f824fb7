use crate::{
    programs::{GpuProgram, GpuProgramRenderContext, SceneLayouts, scene_pipeline},
    scene::Scene,
    shaders::{SCENE_GROUP, ShaderId},
};

/// Single geometry + lighting pass. Each fragment walks only its cluster's lights.
pub struct ForwardPlusProgram {
    pipeline: wgpu::RenderPipeline,
}

impl GpuProgram for ForwardPlusProgram {
    type InitData = SceneLayouts;
    type DrawData<'a> = (
        &'a wgpu::BindGroup, // Scene (Camera/Lights/Clusters) - Group 0
        &'a Scene,           // The Meshes - Group 1 & 2
    );

    fn new(ctx: &GpuProgramRenderContext, layouts: &Self::InitData) -> Self {
        let pipeline = scene_pipeline(
            ctx,
            layouts,
            "Forward+ Pipeline",
            ShaderId::ForwardPlusFrag,
            &[Some(wgpu::ColorTargetState {
                format: ctx.format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        );

        Self { pipeline }
    }

    fn record<'a>(&'a self, render_pass: &mut wgpu::RenderPass<'a>, data: Self::DrawData<'a>) {
        let (scene_bind_group, scene) = data;

        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(SCENE_GROUP, scene_bind_group, &[]);
        scene.draw(render_pass);
    }
}
