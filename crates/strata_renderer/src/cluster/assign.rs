use glam::{Vec2, Vec3};

use super::{ClusterGrid, ClusterRecord};
use crate::{
    camera::CameraUniforms,
    error::{RenderError, Result},
    light::GpuLight,
};

/// Axis-aligned box in view space (camera looks down -Z).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Sphere vs box by squared distance from the center to the closest point.
    pub fn intersects_sphere(&self, center: Vec3, radius: f32) -> bool {
        let closest = center.clamp(self.min, self.max);
        center.distance_squared(closest) <= radius * radius
    }
}

/// The camera quantities the grid math needs, pulled out of a [`CameraUniforms`].
#[derive(Copy, Clone, Debug)]
pub struct ClusterFrustum {
    pub screen: Vec2,
    pub near: f32,
    pub far: f32,
    /// Projection scale terms `P[0][0]` and `P[1][1]`.
    pub scale: Vec2,
}

impl ClusterFrustum {
    pub fn from_camera(camera: &CameraUniforms) -> Self {
        let proj = camera.projection_matrix();
        Self {
            screen: Vec2::new(camera.screen_width, camera.screen_height),
            near: camera.near,
            far: camera.far,
            scale: Vec2::new(proj.x_axis.x, proj.y_axis.y),
        }
    }

    /// View depth where slice `k` starts; `k == tiles_z` gives `far`.
    pub fn slice_depth(&self, k: u32, tiles_z: u32) -> f32 {
        self.near * (self.far / self.near).powf(k as f32 / tiles_z as f32)
    }

    /// View-space box around the frustum piece of cell `(x, y, z)`.
    pub fn cell_bounds(&self, grid: &ClusterGrid, x: u32, y: u32, z: u32) -> Aabb {
        let ndc_x = Vec2::new(
            -1.0 + 2.0 * x as f32 / grid.tiles_x as f32,
            -1.0 + 2.0 * (x + 1) as f32 / grid.tiles_x as f32,
        );
        let ndc_y = Vec2::new(
            -1.0 + 2.0 * y as f32 / grid.tiles_y as f32,
            -1.0 + 2.0 * (y + 1) as f32 / grid.tiles_y as f32,
        );
        let d0 = self.slice_depth(z, grid.tiles_z);
        let d1 = self.slice_depth(z + 1, grid.tiles_z);

        // Extents grow with depth, so the box is spanned by the near and far faces.
        let xs = [ndc_x.x * d0, ndc_x.y * d0, ndc_x.x * d1, ndc_x.y * d1].map(|v| v / self.scale.x);
        let ys = [ndc_y.x * d0, ndc_y.y * d0, ndc_y.x * d1, ndc_y.y * d1].map(|v| v / self.scale.y);

        Aabb {
            min: Vec3::new(
                xs.into_iter().fold(f32::INFINITY, f32::min),
                ys.into_iter().fold(f32::INFINITY, f32::min),
                -d1,
            ),
            max: Vec3::new(
                xs.into_iter().fold(f32::NEG_INFINITY, f32::max),
                ys.into_iter().fold(f32::NEG_INFINITY, f32::max),
                -d0,
            ),
        }
    }

    /// Cell a fragment at `pixel` (y down) and positive `view_depth` reads from.
    pub fn fragment_cell(&self, grid: &ClusterGrid, pixel: Vec2, view_depth: f32) -> u32 {
        let clamp_tile = |v: f32, tiles: u32| (v.floor().max(0.0) as u32).min(tiles - 1);

        let x = clamp_tile(pixel.x / self.screen.x * grid.tiles_x as f32, grid.tiles_x);
        let y = clamp_tile((1.0 - pixel.y / self.screen.y) * grid.tiles_y as f32, grid.tiles_y);
        let depth = view_depth.max(self.near);
        let z = clamp_tile(
            (depth / self.near).ln() / (self.far / self.near).ln() * grid.tiles_z as f32,
            grid.tiles_z,
        );
        grid.cell_index(x, y, z)
    }
}

/// Host-side image of both cluster buffers.
///
/// [`ClusterAssignment::compute`] runs the same assignment as the clustering kernel
/// and is the reference its output is checked against; [`ClusterAssignment::from_bytes`]
/// decodes what the kernel actually wrote.
#[derive(Clone, Debug, PartialEq)]
pub struct ClusterAssignment {
    grid: ClusterGrid,
    records: Vec<ClusterRecord>,
    indices: Vec<u32>,
}

impl ClusterAssignment {
    pub fn compute(
        grid: &ClusterGrid,
        camera: &CameraUniforms,
        lights: &[GpuLight],
        radius: f32,
    ) -> Self {
        debug_assert_eq!(camera.tiles_x as u32, grid.tiles_x);
        debug_assert_eq!(camera.tiles_y as u32, grid.tiles_y);
        debug_assert_eq!(camera.tiles_z as u32, grid.tiles_z);

        let frustum = ClusterFrustum::from_camera(camera);
        let view = camera.view_matrix();
        let view_positions: Vec<Vec3> = lights
            .iter()
            .map(|light| view.transform_point3(Vec3::from(light.position)))
            .collect();

        let max = grid.max_lights_per_tile as usize;
        let mut records = vec![ClusterRecord::default(); grid.total_cells() as usize];
        let mut indices = vec![0u32; grid.total_cells() as usize * max];

        for (cell, record) in records.iter_mut().enumerate() {
            let (x, y, z) = grid.cell_coords(cell as u32);
            let bounds = frustum.cell_bounds(grid, x, y, z);
            let slots = &mut indices[cell * max..(cell + 1) * max];

            let mut count = 0;
            for (light_index, position) in view_positions.iter().enumerate() {
                if count == max {
                    break;
                }
                if bounds.intersects_sphere(*position, radius) {
                    slots[count] = light_index as u32;
                    count += 1;
                }
            }
            record.count = count as u32;
        }

        Self {
            grid: *grid,
            records,
            indices,
        }
    }

    /// Decodes the raw contents of the record and index buffers.
    pub fn from_bytes(grid: &ClusterGrid, record_bytes: &[u8], index_bytes: &[u8]) -> Result<Self> {
        check_size("cluster record buffer", grid.record_buffer_size(), record_bytes)?;
        check_size("cluster index buffer", grid.index_buffer_size(), index_bytes)?;

        let header = ClusterGrid::HEADER_SIZE as usize;
        let records = record_bytes[header..]
            .chunks_exact(ClusterRecord::SIZE as usize)
            .map(bytemuck::pod_read_unaligned::<ClusterRecord>)
            .collect();
        let indices = index_bytes
            .chunks_exact(4)
            .map(bytemuck::pod_read_unaligned::<u32>)
            .collect();

        Ok(Self {
            grid: *grid,
            records,
            indices,
        })
    }

    pub fn grid(&self) -> &ClusterGrid {
        &self.grid
    }

    pub fn records(&self) -> &[ClusterRecord] {
        &self.records
    }

    pub fn count(&self, cell: u32) -> u32 {
        self.records[cell as usize].count
    }

    /// The valid light indices of `cell`. Slots past the count are not included.
    pub fn cell(&self, cell: u32) -> &[u32] {
        let max = self.grid.max_lights_per_tile as usize;
        let start = cell as usize * max;
        let count = (self.records[cell as usize].count as usize).min(max);
        &self.indices[start..start + count]
    }

    /// Every cell whose list names `light`, in cell order.
    pub fn cells_containing(&self, light: u32) -> Vec<u32> {
        (0..self.grid.total_cells())
            .filter(|&cell| self.cell(cell).contains(&light))
            .collect()
    }

    /// Record buffer contents: cell count header, then the records.
    pub fn record_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.grid.record_buffer_size() as usize);
        bytes.extend_from_slice(&self.grid.total_cells().to_le_bytes());
        bytes.extend_from_slice(bytemuck::cast_slice(&self.records));
        bytes
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}

fn check_size(label: &'static str, expected: u64, bytes: &[u8]) -> Result<()> {
    if bytes.len() as u64 != expected {
        return Err(RenderError::ReadbackSize {
            label,
            expected,
            actual: bytes.len() as u64,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use glam::Mat4;

    use super::*;
    use crate::config::ClusterConfig;

    const NEAR: f32 = 0.1;
    const FAR: f32 = 1000.0;

    fn grid(x: u32, y: u32, z: u32, max: u32) -> ClusterGrid {
        ClusterGrid::new(&ClusterConfig {
            tiles_x: x,
            tiles_y: y,
            tiles_z: z,
            max_lights_per_tile: max,
            tile_workgroup_size: 64,
        })
        .unwrap()
    }

    /// Camera at the origin looking down -Z with a square viewport.
    fn origin_camera(grid: &ClusterGrid) -> CameraUniforms {
        let proj = Mat4::perspective_rh(45f32.to_radians(), 1.0, NEAR, FAR);
        CameraUniforms::new(proj, Mat4::IDENTITY, (512, 512), NEAR, FAR, grid)
    }

    fn light_at(x: f32, y: f32, z: f32) -> GpuLight {
        GpuLight::new(Vec3::new(x, y, z), Vec3::ONE)
    }

    fn scattered_lights(count: usize) -> Vec<GpuLight> {
        // Deterministic spread over the view volume, dense enough to saturate cells.
        (0..count)
            .map(|i| {
                let t = i as f32;
                light_at(
                    (t * 0.618).sin() * 6.0,
                    (t * 0.414).cos() * 4.0,
                    -1.0 - (t * 0.271).fract() * 30.0,
                )
            })
            .collect()
    }

    /// Every intersecting light of every cell, no cap.
    fn brute_force(grid: &ClusterGrid, camera: &CameraUniforms, lights: &[GpuLight], radius: f32) -> Vec<Vec<u32>> {
        let frustum = ClusterFrustum::from_camera(camera);
        (0..grid.total_cells())
            .map(|cell| {
                let (x, y, z) = grid.cell_coords(cell);
                let bounds = frustum.cell_bounds(grid, x, y, z);
                (0..lights.len() as u32)
                    .filter(|&i| bounds.intersects_sphere(Vec3::from(lights[i as usize].position), radius))
                    .collect()
            })
            .collect()
    }

    #[test]
    fn slices_are_exponential() {
        let grid = grid(4, 4, 4, 8);
        let frustum = ClusterFrustum::from_camera(&origin_camera(&grid));
        let expected = [0.1, 1.0, 10.0, 100.0, 1000.0];
        for (k, depth) in expected.iter().enumerate() {
            let got = frustum.slice_depth(k as u32, 4);
            assert!((got - depth).abs() / depth < 1e-4, "slice {k}: {got}");
        }
    }

    #[test]
    fn corner_light_lands_in_eight_cells() {
        let grid = grid(4, 4, 4, 8);
        let camera = origin_camera(&grid);
        // NDC (0, 0) at depth 10: the corner shared by tiles 1..=2 in x, y and z.
        let lights = [light_at(0.0, 0.0, -10.0)];

        let assignment = ClusterAssignment::compute(&grid, &camera, &lights, 0.1);

        let mut expected = Vec::new();
        for z in 1..=2 {
            for y in 1..=2 {
                for x in 1..=2 {
                    expected.push(grid.cell_index(x, y, z));
                }
            }
        }
        expected.sort();
        assert_eq!(assignment.cells_containing(0), expected);
        for cell in expected {
            assert_eq!(assignment.count(cell), 1);
            assert_eq!(assignment.cell(cell), &[0]);
        }
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic]
    fn camera_block_from_another_grid_is_caught() {
        let four_rows = grid(4, 4, 4, 8);
        let five_rows = grid(4, 5, 4, 8);
        ClusterAssignment::compute(&four_rows, &origin_camera(&five_rows), &[], 1.0);
    }

    #[test]
    fn light_behind_camera_is_nowhere() {
        let grid = grid(4, 4, 4, 8);
        let camera = origin_camera(&grid);
        let lights = [light_at(0.0, 0.0, 50.0), light_at(5000.0, 0.0, -20.0)];

        let assignment = ClusterAssignment::compute(&grid, &camera, &lights, 2.0);

        assert!(assignment.cells_containing(0).is_empty());
        assert!(assignment.cells_containing(1).is_empty());
        assert!(assignment.records().iter().all(|r| r.count == 0));
    }

    #[test]
    fn lists_match_brute_force_up_to_cap() {
        let grid = grid(8, 6, 8, 8);
        let camera = origin_camera(&grid);
        let lights = scattered_lights(300);

        let assignment = ClusterAssignment::compute(&grid, &camera, &lights, 2.0);
        let all = brute_force(&grid, &camera, &lights, 2.0);

        let mut saturated = 0;
        for cell in 0..grid.total_cells() {
            let hits = &all[cell as usize];
            let kept = hits.len().min(8);
            assert_eq!(assignment.cell(cell), &hits[..kept], "cell {cell}");
            if hits.len() > 8 {
                saturated += 1;
            }
        }
        assert!(saturated > 0, "scene should overflow some cells");
    }

    #[test]
    fn overflow_keeps_lowest_indices() {
        let grid = grid(4, 4, 4, 8);
        let camera = origin_camera(&grid);
        let lights = vec![light_at(0.3, 0.3, -5.0); 20];

        let assignment = ClusterAssignment::compute(&grid, &camera, &lights, 1.0);
        let cell = ClusterFrustum::from_camera(&camera).fragment_cell(&grid, Vec2::new(300.0, 200.0), 5.0);

        assert_eq!(assignment.count(cell), 8);
        assert_eq!(assignment.cell(cell), &[0, 1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn capacity_pool_stays_within_cap() {
        let grid = ClusterGrid::new(&ClusterConfig::default()).unwrap();
        let camera = origin_camera(&grid);
        let lights = scattered_lights(5000);

        let assignment = ClusterAssignment::compute(&grid, &camera, &lights, 2.0);

        let mut full = 0;
        for cell in 0..grid.total_cells() {
            let list = assignment.cell(cell);
            assert!(assignment.count(cell) <= grid.max_lights_per_tile);
            assert_eq!(list.len() as u32, assignment.count(cell));
            let mut sorted = list.to_vec();
            sorted.dedup();
            assert_eq!(sorted.len(), list.len(), "duplicate in cell {cell}");
            assert!(list.iter().all(|&i| i < 5000));
            if list.len() as u32 == grid.max_lights_per_tile {
                full += 1;
            }
        }
        assert!(full > 0);
    }

    #[test]
    fn recompute_is_byte_identical() {
        let grid = grid(8, 6, 8, 16);
        let camera = origin_camera(&grid);
        let lights = scattered_lights(200);

        let a = ClusterAssignment::compute(&grid, &camera, &lights, 2.0);
        let b = ClusterAssignment::compute(&grid, &camera, &lights, 2.0);

        assert_eq!(a.record_bytes(), b.record_bytes());
        assert_eq!(a.index_bytes(), b.index_bytes());
    }

    #[test]
    fn bytes_decode_to_same_assignment() {
        let grid = grid(4, 4, 4, 8);
        let camera = origin_camera(&grid);
        let a = ClusterAssignment::compute(&grid, &camera, &scattered_lights(40), 2.0);

        let record_bytes = a.record_bytes();
        assert_eq!(record_bytes.len() as u64, grid.record_buffer_size());
        assert_eq!(u32::from_le_bytes(record_bytes[..4].try_into().unwrap()), 64);

        let b = ClusterAssignment::from_bytes(&grid, &record_bytes, a.index_bytes()).unwrap();
        assert_eq!(a, b);

        let err = ClusterAssignment::from_bytes(&grid, &record_bytes[..100], a.index_bytes()).unwrap_err();
        assert!(matches!(err, RenderError::ReadbackSize { .. }));
    }

    #[test]
    fn fragment_lookup_clamps_and_orders() {
        let grid = grid(4, 4, 4, 8);
        let frustum = ClusterFrustum::from_camera(&origin_camera(&grid));

        // Top-left pixel, very near: tile x 0, y 3 (NDC y is up), slice 0.
        assert_eq!(frustum.fragment_cell(&grid, Vec2::new(0.5, 0.5), 0.05), grid.cell_index(0, 3, 0));
        // Bottom-right pixel beyond far: last tile in x, first in y, last slice.
        assert_eq!(
            frustum.fragment_cell(&grid, Vec2::new(511.5, 511.5), 5000.0),
            grid.cell_index(3, 0, 3)
        );
        // Depth 5 sits in slice 1 (1..10).
        assert_eq!(frustum.fragment_cell(&grid, Vec2::new(300.0, 200.0), 5.0), grid.cell_index(2, 2, 1));
    }

    #[test]
    fn fragment_cell_box_contains_the_fragment() {
        let grid = grid(16, 9, 24, 8);
        let camera = origin_camera(&grid);
        let frustum = ClusterFrustum::from_camera(&camera);
        let proj = camera.projection_matrix();

        for point in [Vec3::new(0.3, -0.2, -3.0), Vec3::new(-4.0, 2.5, -17.0), Vec3::new(1.0, 1.0, -250.0)] {
            let clip = proj * point.extend(1.0);
            let ndc = clip.truncate() / clip.w;
            let pixel = Vec2::new((ndc.x + 1.0) * 0.5 * 512.0, (1.0 - ndc.y) * 0.5 * 512.0);

            let cell = frustum.fragment_cell(&grid, pixel, -point.z);
            let (x, y, z) = grid.cell_coords(cell);
            assert!(frustum.cell_bounds(&grid, x, y, z).intersects_sphere(point, 1e-3));
        }
    }
}
