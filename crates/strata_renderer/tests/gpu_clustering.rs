// GPU clustering kernel against the host reference assignment.

use glam::{Mat4, Vec3};
use strata_core::Camera;
use strata_renderer::cluster::assign::ClusterFrustum;
use strata_renderer::{
    CameraUniforms, ClusterConfig, ClusterGrid, GpuContext, GpuLight, LightSet, MAX_LIGHTS, RendererConfig,
    Scene, Stage,
};

/// Headless device for testing (gracefully fails if no GPU)
fn headless() -> Option<GpuContext> {
    GpuContext::headless(512, 512, wgpu::TextureFormat::Rgba8Unorm).ok()
}

fn small_grid_config(radius: f32) -> RendererConfig {
    let mut config = RendererConfig::default();
    config.cluster = ClusterConfig {
        tiles_x: 4,
        tiles_y: 4,
        tiles_z: 4,
        max_lights_per_tile: 8,
        tile_workgroup_size: 64,
    };
    config.lights.radius = radius;
    config
}

fn origin_camera() -> CameraUniforms {
    let proj = Mat4::perspective_rh(45f32.to_radians(), 1.0, 0.1, 1000.0);
    let grid = ClusterGrid::new(&small_grid_config(0.1).cluster).unwrap();
    CameraUniforms::new(proj, Mat4::IDENTITY, (512, 512), 0.1, 1000.0, &grid)
}

#[test]
fn corner_light_matches_host_reference() {
    let Some(gpu) = headless() else {
        eprintln!("Skipping corner_light_matches_host_reference (no GPU)");
        return;
    };

    let mut stage = Stage::new(&gpu, small_grid_config(0.1), Scene::new(&gpu.device)).unwrap();
    stage.set_camera_uniforms(&gpu.queue, origin_camera());
    stage.upload_lights(
        &gpu,
        LightSet::from_lights(&[
            GpuLight::new(Vec3::new(0.0, 0.0, -10.0), Vec3::ONE),
            // Far to the side of the frustum.
            GpuLight::new(Vec3::new(5000.0, 0.0, -20.0), Vec3::ONE),
        ]),
    );

    let from_gpu = stage.clustering().run_and_read_back(&gpu).unwrap();
    let reference = stage.reference_clusters();

    assert_eq!(from_gpu.cells_containing(0).len(), 8);
    assert_eq!(from_gpu.cells_containing(0), reference.cells_containing(0));
    assert!(from_gpu.cells_containing(1).is_empty());
    for cell in 0..stage.grid().total_cells() {
        assert_eq!(from_gpu.count(cell), reference.count(cell), "cell {cell}");
        assert_eq!(from_gpu.cell(cell), reference.cell(cell), "cell {cell}");
    }
}

#[test]
fn rerun_is_byte_identical() {
    let Some(mut gpu) = headless() else {
        eprintln!("Skipping rerun_is_byte_identical (no GPU)");
        return;
    };
    gpu.resize(1280, 720);

    let mut stage = Stage::new(&gpu, RendererConfig::default(), Scene::new(&gpu.device)).unwrap();
    stage.update_camera(&gpu, &Camera::default());

    let first = stage.clustering().run_and_read_back(&gpu).unwrap();
    let second = stage.clustering().run_and_read_back(&gpu).unwrap();

    assert_eq!(first.record_bytes(), second.record_bytes());
    assert_eq!(first.index_bytes(), second.index_bytes());
    assert!(
        (0..stage.grid().total_cells()).any(|cell| first.count(cell) > 0),
        "default lights should reach at least one cell"
    );
}

#[test]
fn full_pool_keeps_the_first_intersecting_lights() {
    let Some(gpu) = headless() else {
        eprintln!("Skipping full_pool_keeps_the_first_intersecting_lights (no GPU)");
        return;
    };

    let mut stage = Stage::new(&gpu, RendererConfig::default(), Scene::new(&gpu.device)).unwrap();
    stage.update_camera(&gpu, &Camera::default());
    assert_eq!(stage.set_active_lights(&gpu, MAX_LIGHTS + 100), MAX_LIGHTS);

    // The pool has not been animated, so the host copy is what the kernel reads.
    let assignment = stage.clustering().run_and_read_back(&gpu).unwrap();
    let reference = stage.reference_clusters();

    let grid = *stage.grid();
    let max = grid.max_lights_per_tile;
    let radius = stage.config().lights.radius;
    let camera = stage.camera().current();
    let frustum = ClusterFrustum::from_camera(camera);
    let view_positions: Vec<Vec3> = stage
        .lights()
        .set()
        .active_lights()
        .iter()
        .map(|light| camera.view_matrix().transform_point3(Vec3::from(light.position)))
        .collect();

    // Host and device round differently, so lights within a hair of a cell's
    // sphere-box boundary may go either way.
    let band = radius * radius * 1e-3;
    let mut saturated = 0;
    let mut identical = 0;
    for cell in 0..grid.total_cells() {
        let lights = assignment.cell(cell);
        assert!(lights.len() as u32 <= max);
        assert!(lights.windows(2).all(|w| w[0] < w[1]), "cell {cell} not ascending");
        if lights == reference.cell(cell) {
            identical += 1;
        }

        let (x, y, z) = grid.cell_coords(cell);
        let bounds = frustum.cell_bounds(&grid, x, y, z);
        let dist2 = |i: u32| {
            let center = view_positions[i as usize];
            center.distance_squared(center.clamp(bounds.min, bounds.max))
        };

        for &i in lights {
            assert!(dist2(i) <= radius * radius + band, "cell {cell} lists light {i} out of reach");
        }

        // Every clearly intersecting light up to the last one kept must be listed.
        let full = lights.len() as u32 == max;
        if full {
            saturated += 1;
        }
        let last = lights.last().copied().unwrap_or(0);
        for i in 0..MAX_LIGHTS {
            if full && i > last {
                break;
            }
            if dist2(i) < radius * radius - band {
                assert!(lights.contains(&i), "cell {cell} skipped light {i}");
            }
        }
    }

    assert!(saturated > 0, "5000 lights should fill some cells");
    assert!(
        identical * 100 >= grid.total_cells() * 95,
        "only {identical} cells match the host reference exactly"
    );
}
