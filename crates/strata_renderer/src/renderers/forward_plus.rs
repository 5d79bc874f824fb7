use crate::{
    context::GpuContext,
    error::Result,
    programs::{ForwardPlusProgram, GpuProgram},
    renderers::{CLEAR_COLOR, FrameContext, program_context},
    stage::Stage,
    texture::TextureHelper,
};

pub struct ForwardPlusRenderer {
    program: ForwardPlusProgram,
    depth_texture: wgpu::TextureView,
}

impl ForwardPlusRenderer {
    pub fn new(gpu: &GpuContext, stage: &Stage) -> Result<Self> {
        let layouts = stage.layouts();
        let program = gpu.create_checked("Forward+ Pipeline", |device| {
            ForwardPlusProgram::new(&program_context(device, gpu, stage), &layouts)
        })?;

        let depth_texture = create_depth_target(gpu)?;

        Ok(Self {
            program,
            depth_texture,
        })
    }

    pub fn render(&self, frame: &FrameContext) -> wgpu::SubmissionIndex {
        let mut encoder = frame
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Forward+ Encoder"),
            });

        frame.stage.clustering().record(&mut encoder);

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Forward+ Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: frame.target,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0), // Clear to "Far" (1.0)
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            self.program.record(
                &mut render_pass,
                (frame.stage.scene_bind_group(), frame.stage.scene()),
            );
        }

        frame.gpu.queue.submit(std::iter::once(encoder.finish()))
    }

    pub fn resize(&mut self, gpu: &GpuContext) -> Result<()> {
        self.depth_texture = create_depth_target(gpu)?;
        Ok(())
    }
}

fn create_depth_target(gpu: &GpuContext) -> Result<wgpu::TextureView> {
    gpu.create_checked("Forward+ Depth", |device| {
        let (_, view) = TextureHelper::create_depth_texture(device, gpu.width(), gpu.height(), "Forward+ Depth");
        view
    })
}
