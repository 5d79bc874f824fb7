use crate::{
    context::GpuContext,
    error::Result,
    programs::{DeferredLightingProgram, GBufferProgram, GpuProgram},
    renderers::{CLEAR_COLOR, FrameContext, program_context},
    stage::Stage,
    texture::GBuffer,
};

/// G-buffer pass then a fullscreen lighting pass, both after clustering in the
/// same encoder. The G-buffer is written and read exactly once per frame.
pub struct ClusteredDeferredRenderer {
    gbuffer_program: GBufferProgram,
    lighting_program: DeferredLightingProgram,
    gbuffer: GBuffer,
    gbuffer_bind_group: wgpu::BindGroup,
}

impl ClusteredDeferredRenderer {
    pub fn new(gpu: &GpuContext, stage: &Stage) -> Result<Self> {
        let layouts = stage.layouts();
        let gbuffer_program = gpu.create_checked("G-Buffer Pipeline", |device| {
            GBufferProgram::new(&program_context(device, gpu, stage), &layouts)
        })?;
        let lighting_program = gpu.create_checked("Deferred Lighting Pipeline", |device| {
            DeferredLightingProgram::new(&program_context(device, gpu, stage), &layouts)
        })?;

        let gbuffer = create_gbuffer(gpu)?;
        let gbuffer_bind_group = lighting_program.create_gbuffer_bind_group(&gpu.device, &gbuffer);

        Ok(Self {
            gbuffer_program,
            lighting_program,
            gbuffer,
            gbuffer_bind_group,
        })
    }

    pub fn gbuffer(&self) -> &GBuffer {
        &self.gbuffer
    }

    pub fn render(&self, frame: &FrameContext) -> wgpu::SubmissionIndex {
        let mut encoder = frame
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Clustered Deferred Encoder"),
            });

        frame.stage.clustering().record(&mut encoder);

        {
            let attribute_target = |view| {
                Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                })
            };
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("G-Buffer Pass"),
                color_attachments: &[
                    attribute_target(&self.gbuffer.position),
                    attribute_target(&self.gbuffer.albedo),
                    attribute_target(&self.gbuffer.normal),
                ],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.gbuffer.depth,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            self.gbuffer_program.record(
                &mut render_pass,
                (frame.stage.scene_bind_group(), frame.stage.scene()),
            );
        }

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Deferred Lighting Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: frame.target,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                ..Default::default()
            });

            self.lighting_program.record(
                &mut render_pass,
                (frame.stage.scene_bind_group(), &self.gbuffer_bind_group),
            );
        }

        frame.gpu.queue.submit(std::iter::once(encoder.finish()))
    }

    /// The G-buffer follows the surface size; its bind group is rebuilt with it.
    pub fn resize(&mut self, gpu: &GpuContext) -> Result<()> {
        self.gbuffer = create_gbuffer(gpu)?;
        self.gbuffer_bind_group = self
            .lighting_program
            .create_gbuffer_bind_group(&gpu.device, &self.gbuffer);
        log::debug!("G-buffer rebuilt at {:?}", self.gbuffer.size());
        Ok(())
    }
}

fn create_gbuffer(gpu: &GpuContext) -> Result<GBuffer> {
    gpu.create_checked("G-Buffer", |device| GBuffer::new(device, gpu.width(), gpu.height()))
}
