// Forward+ and Clustered Deferred must light the same scene the same way.

use glam::{Mat4, Vec3};
use strata_core::Camera;
use strata_renderer::{
    FrameContext, FrameRenderer, GpuContext, GpuLight, LightSet, MaterialData, MeshData, RenderPath,
    RendererConfig, Scene, Stage,
};

const WIDTH: u32 = 256;
const HEIGHT: u32 = 256;
const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Headless device for testing (gracefully fails if no GPU)
fn headless() -> Option<GpuContext> {
    GpuContext::headless(WIDTH, HEIGHT, FORMAT).ok()
}

fn demo_scene(gpu: &GpuContext) -> Scene {
    let mut scene = Scene::new(&gpu.device);
    let white = scene.add_material(&gpu.device, &gpu.queue, &MaterialData::solid([255, 255, 255, 255]));
    let plane = scene.add_geometry(&gpu.device, &MeshData::plane(10.0, 1.0));
    let pillar = scene.add_geometry(&gpu.device, &MeshData::cuboid(Vec3::new(0.5, 1.5, 0.5)));

    scene.add_object(&gpu.device, plane, white, Mat4::IDENTITY);
    scene.add_object(&gpu.device, pillar, white, Mat4::from_translation(Vec3::new(0.0, 1.5, 0.0)));
    scene
}

fn lights() -> LightSet {
    let lights: Vec<GpuLight> = (0..16)
        .map(|i| {
            let angle = i as f32 * std::f32::consts::TAU / 16.0;
            let position = Vec3::new(angle.cos() * 3.0, 1.0, angle.sin() * 3.0);
            GpuLight::new(position, Vec3::new(1.0, 0.6 + 0.025 * i as f32, 0.4))
        })
        .collect();
    LightSet::from_lights(&lights)
}

fn render(gpu: &GpuContext, stage: &Stage, path: RenderPath) -> Vec<u8> {
    let renderer = FrameRenderer::new(path, gpu, stage).unwrap();
    assert_eq!(renderer.path(), path);

    let target = gpu.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Test Target"),
        size: wgpu::Extent3d {
            width: WIDTH,
            height: HEIGHT,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    });
    let view = target.create_view(&wgpu::TextureViewDescriptor::default());

    renderer.render(&FrameContext {
        gpu,
        stage,
        target: &view,
    });
    gpu.read_texture_rgba8(&target).unwrap()
}

#[test]
fn forward_plus_and_deferred_agree() {
    let Some(gpu) = headless() else {
        eprintln!("Skipping forward_plus_and_deferred_agree (no GPU)");
        return;
    };

    let mut stage = Stage::new(&gpu, RendererConfig::default(), demo_scene(&gpu)).unwrap();
    let camera = Camera {
        position: Vec3::new(0.0, 6.0, 8.0),
        yaw: -90.0,
        pitch: -35.0,
        ..Camera::default()
    };
    stage.update_camera(&gpu, &camera);
    stage.upload_lights(&gpu, lights());

    let forward = render(&gpu, &stage, RenderPath::ForwardPlus);
    let deferred = render(&gpu, &stage, RenderPath::ClusteredDeferred);
    assert_eq!(forward.len(), (WIDTH * HEIGHT * 4) as usize);
    assert_eq!(forward.len(), deferred.len());

    let lit = forward.chunks_exact(4).filter(|px| px[0] > 16).count();
    assert!(lit > 100, "scene should be visibly lit, got {lit} pixels");

    // Positions go through a half-float target on the deferred path; that may
    // move a channel by a rounding step or two, never more.
    for (i, (a, b)) in forward.chunks_exact(4).zip(deferred.chunks_exact(4)).enumerate() {
        let worst = a.iter().zip(b.iter()).map(|(x, y)| x.abs_diff(*y)).max().unwrap_or(0);
        assert!(
            worst <= 2,
            "pixel ({}, {}) differs by {worst}: forward {a:?}, deferred {b:?}",
            i as u32 % WIDTH,
            i as u32 / WIDTH
        );
    }
}

#[test]
fn resize_rebuilds_targets() {
    let Some(mut gpu) = headless() else {
        eprintln!("Skipping resize_rebuilds_targets (no GPU)");
        return;
    };

    let stage = Stage::new(&gpu, RendererConfig::default(), demo_scene(&gpu)).unwrap();
    let mut renderer = FrameRenderer::new(RenderPath::ClusteredDeferred, &gpu, &stage).unwrap();

    gpu.resize(320, 200);
    renderer.resize(&gpu).unwrap();

    let FrameRenderer::ClusteredDeferred(deferred) = &renderer else {
        panic!("expected the deferred renderer");
    };
    assert_eq!(deferred.gbuffer().size(), (320, 200));
}

#[test]
fn oversized_resize_is_an_error() {
    let Some(mut gpu) = headless() else {
        eprintln!("Skipping oversized_resize_is_an_error (no GPU)");
        return;
    };

    let stage = Stage::new(&gpu, RendererConfig::default(), demo_scene(&gpu)).unwrap();
    let mut forward = FrameRenderer::new(RenderPath::ForwardPlus, &gpu, &stage).unwrap();
    let mut deferred = FrameRenderer::new(RenderPath::ClusteredDeferred, &gpu, &stage).unwrap();

    let limit = gpu.device.limits().max_texture_dimension_2d;
    gpu.resize(limit + 1, 16);

    assert!(forward.resize(&gpu).is_err());
    assert!(deferred.resize(&gpu).is_err());

    // A valid size afterwards still works.
    gpu.resize(64, 64);
    deferred.resize(&gpu).unwrap();
    let FrameRenderer::ClusteredDeferred(renderer) = &deferred else {
        panic!("expected the deferred renderer");
    };
    assert_eq!(renderer.gbuffer().size(), (64, 64));
}
