use std::sync::Arc;

use anyhow::Context;
use glam::{Mat4, Vec3};
use strata_core::{Camera, FlyController, KeySet, Time, TrackedKey};
use strata_renderer::{
    FrameContext, FrameRenderer, GpuContext, MaterialData, MeshData, RenderError, RendererConfig, Scene, Stage,
};
use strata_window::{FrameHandler, FrameStatus};
use winit::window::Window;

/// Lights added or removed per key press.
const LIGHT_STEP: u32 = 500;

/// Everything that only exists once the window does.
struct Running {
    window: Arc<Window>,
    gpu: GpuContext,
    stage: Stage,
    renderer: FrameRenderer,
}

struct Viewer {
    config: RendererConfig,
    camera: Camera,
    controller: FlyController,
    keys: KeySet,
    time: Time,
    running: Option<Running>,
}

impl Viewer {
    fn new(config: RendererConfig) -> Self {
        Self {
            config,
            camera: Camera::default(),
            controller: FlyController::default(),
            keys: KeySet::default(),
            time: Time::default(),
            running: None,
        }
    }
}

impl FrameHandler for Viewer {
    type Error = RenderError;

    fn init(&mut self, window: Arc<Window>) -> Result<(), RenderError> {
        let size = window.inner_size();
        let gpu = GpuContext::new(window.clone(), size.width, size.height)?;
        let scene = build_scene(&gpu);
        let stage = Stage::new(&gpu, self.config.clone(), scene)?;
        let renderer = FrameRenderer::new(self.config.render_path, &gpu, &stage)?;

        log::info!("Hold the left mouse button to look around, WASD/QE to move, +/- to change the light count");
        self.running = Some(Running {
            window,
            gpu,
            stage,
            renderer,
        });
        Ok(())
    }

    fn frame(&mut self) -> FrameStatus {
        let Some(running) = &mut self.running else {
            return FrameStatus::Continue;
        };

        self.time.update();
        self.controller
            .update(&mut self.camera, self.keys, self.time.delta_millis());

        // Separate submission, kept out of the frame itself.
        running
            .stage
            .animate_lights(&running.gpu, self.time.elapsed_seconds());
        running.stage.update_camera(&running.gpu, &self.camera);

        let Some(surface) = &running.gpu.surface else {
            return FrameStatus::Exit;
        };
        let frame = match surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("Surface lost or outdated, reconfiguring");
                running.gpu.reconfigure();
                return FrameStatus::Continue;
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("Out of memory acquiring the next frame");
                return FrameStatus::Exit;
            }
            Err(err) => {
                log::warn!("Skipping frame: {err}");
                return FrameStatus::Continue;
            }
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        running.renderer.render(&FrameContext {
            gpu: &running.gpu,
            stage: &running.stage,
            target: &view,
        });

        running.window.pre_present_notify();
        frame.present();
        FrameStatus::Continue
    }

    fn resize(&mut self, width: u32, height: u32) -> FrameStatus {
        let Some(running) = &mut self.running else {
            return FrameStatus::Continue;
        };
        running.gpu.resize(width, height);
        match running.renderer.resize(&running.gpu) {
            Ok(()) => FrameStatus::Continue,
            Err(err) => {
                log::error!("Failed to rebuild render targets: {err}");
                FrameStatus::Exit
            }
        }
    }

    fn key(&mut self, key: TrackedKey, pressed: bool) {
        if !pressed {
            self.keys.release(key);
            return;
        }
        self.keys.press(key);

        let Some(running) = &mut self.running else {
            return;
        };
        let active = running.stage.lights().active_count();
        match key {
            TrackedKey::MoreLights => {
                running
                    .stage
                    .set_active_lights(&running.gpu, active.saturating_add(LIGHT_STEP));
            }
            TrackedKey::FewerLights => {
                running
                    .stage
                    .set_active_lights(&running.gpu, active.saturating_sub(LIGHT_STEP));
            }
            _ => {}
        }
    }

    fn look(&mut self, dx: f32, dy: f32) {
        self.controller.look(&mut self.camera, dx, dy);
    }

    fn focus_lost(&mut self) {
        self.keys.clear();
    }
}

/// Floor plus two rows of pillars for the lights to bounce between.
fn build_scene(gpu: &GpuContext) -> Scene {
    let (device, queue) = (&gpu.device, &gpu.queue);
    let mut scene = Scene::new(device);

    let floor_material = scene.add_material(
        device,
        queue,
        &MaterialData::checker([200, 200, 200, 255], [120, 120, 130, 255], 8),
    );
    let pillar_materials = [[220, 190, 160, 255], [170, 200, 220, 255], [210, 210, 210, 255]]
        .map(|rgba| scene.add_material(device, queue, &MaterialData::solid(rgba)));

    let floor = scene.add_geometry(device, &MeshData::plane(12.0, 8.0));
    scene.add_object(device, floor, floor_material, Mat4::IDENTITY);

    let pillar = scene.add_geometry(device, &MeshData::cuboid(Vec3::new(0.4, 4.0, 0.4)));
    for (i, x) in (-4..=4).map(|i| i as f32 * 2.0).enumerate() {
        for z in [-3.5, 3.5] {
            let material = pillar_materials[i % pillar_materials.len()];
            let model = Mat4::from_translation(Vec3::new(x, 4.0, z));
            scene.add_object(device, pillar, material, model);
        }
    }

    log::info!("Built demo scene with {} objects", scene.object_count());
    scene
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::args().nth(1) {
        Some(path) => {
            RendererConfig::load(&path).with_context(|| format!("loading renderer config {path}"))?
        }
        None => RendererConfig::default(),
    };
    config.validate().context("invalid renderer config")?;

    strata_window::run("Strata: Clustered Lighting", Viewer::new(config)).context("viewer stopped")?;
    Ok(())
}
