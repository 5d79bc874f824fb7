//! WGSL sources for every pipeline, with `${name}` placeholders filled from the
//! renderer configuration before the module is created.

use crate::config::RendererConfig;

/// Bind group slots shared by every render pipeline.
pub const SCENE_GROUP: u32 = 0;
pub const MODEL_GROUP: u32 = 1;
pub const MATERIAL_GROUP: u32 = 2;
/// The deferred lighting pass has no model or material, its G-buffer takes slot 1.
pub const GBUFFER_GROUP: u32 = 1;

const COMMON: &str = include_str!("shaders/common.wgsl");
const CLUSTER_LIGHTING: &str = include_str!("shaders/cluster_lighting.wgsl");

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ShaderId {
    NaiveVert,
    ForwardPlusFrag,
    GBufferFrag,
    FullscreenVert,
    DeferredLightingFrag,
    ClusteringCompute,
    MoveLightsCompute,
}

impl ShaderId {
    pub const ALL: [ShaderId; 7] = [
        ShaderId::NaiveVert,
        ShaderId::ForwardPlusFrag,
        ShaderId::GBufferFrag,
        ShaderId::FullscreenVert,
        ShaderId::DeferredLightingFrag,
        ShaderId::ClusteringCompute,
        ShaderId::MoveLightsCompute,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ShaderId::NaiveVert => "naive vert shader",
            ShaderId::ForwardPlusFrag => "forward+ frag shader",
            ShaderId::GBufferFrag => "g-buffer frag shader",
            ShaderId::FullscreenVert => "fullscreen vert shader",
            ShaderId::DeferredLightingFrag => "deferred lighting frag shader",
            ShaderId::ClusteringCompute => "light clustering compute shader",
            ShaderId::MoveLightsCompute => "move lights compute shader",
        }
    }

    /// Every module has a single entry point with the same name.
    pub fn entry_point(self) -> &'static str {
        "main"
    }

    fn template(self) -> &'static str {
        match self {
            ShaderId::NaiveVert => include_str!("shaders/naive.vs.wgsl"),
            ShaderId::ForwardPlusFrag => include_str!("shaders/forward_plus.fs.wgsl"),
            ShaderId::GBufferFrag => include_str!("shaders/gbuffer.fs.wgsl"),
            ShaderId::FullscreenVert => include_str!("shaders/fullscreen.vs.wgsl"),
            ShaderId::DeferredLightingFrag => include_str!("shaders/deferred_lighting.fs.wgsl"),
            ShaderId::ClusteringCompute => include_str!("shaders/clustering.cs.wgsl"),
            ShaderId::MoveLightsCompute => include_str!("shaders/move_lights.cs.wgsl"),
        }
    }

    /// Fragment shaders that walk a cluster's light list share one lighting routine.
    fn uses_cluster_lighting(self) -> bool {
        matches!(self, ShaderId::ForwardPlusFrag | ShaderId::DeferredLightingFrag)
    }
}

/// Preprocessed shader sources for one configuration.
#[derive(Clone, Debug)]
pub struct ShaderLibrary {
    constants: Vec<(&'static str, String)>,
}

impl ShaderLibrary {
    pub fn new(config: &RendererConfig) -> Self {
        let lights = &config.lights;
        let constants = vec![
            ("bindGroup_scene", SCENE_GROUP.to_string()),
            ("bindGroup_model", MODEL_GROUP.to_string()),
            ("bindGroup_material", MATERIAL_GROUP.to_string()),
            ("bindGroup_gbuffer", GBUFFER_GROUP.to_string()),
            ("maxLightsPerTile", config.cluster.max_lights_per_tile.to_string()),
            ("tileWorkgroupSize", config.cluster.tile_workgroup_size.to_string()),
            ("moveLightsWorkgroupSize", lights.move_workgroup_size.to_string()),
            // {:?} keeps the decimal point, so WGSL reads these as f32
            ("lightRadius", format!("{:?}", lights.radius)),
            ("lightBoundsMinX", format!("{:?}", lights.bounds_min[0])),
            ("lightBoundsMinY", format!("{:?}", lights.bounds_min[1])),
            ("lightBoundsMinZ", format!("{:?}", lights.bounds_min[2])),
            ("lightBoundsMaxX", format!("{:?}", lights.bounds_max[0])),
            ("lightBoundsMaxY", format!("{:?}", lights.bounds_max[1])),
            ("lightBoundsMaxZ", format!("{:?}", lights.bounds_max[2])),
        ];
        Self { constants }
    }

    /// Full source of `id`: shared definitions, then the shader itself, placeholders filled.
    pub fn source(&self, id: ShaderId) -> String {
        let mut source = String::from(COMMON);
        if id.uses_cluster_lighting() {
            source.push_str(CLUSTER_LIGHTING);
        }
        source.push_str(id.template());

        for (name, value) in &self.constants {
            source = source.replace(&format!("${{{name}}}"), value);
        }
        source
    }

    pub fn create_module(&self, device: &wgpu::Device, id: ShaderId) -> wgpu::ShaderModule {
        log::debug!("Compiling {}", id.label());
        device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(id.label()),
            source: wgpu::ShaderSource::Wgsl(self.source(id).into()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_placeholder_is_filled() {
        let library = ShaderLibrary::new(&RendererConfig::default());
        for id in ShaderId::ALL {
            let source = library.source(id);
            assert!(!source.contains("${"), "{} has an unfilled placeholder", id.label());
            assert!(source.contains("fn main("), "{} has no entry point", id.label());
        }
    }

    #[test]
    fn constants_follow_config() {
        let mut config = RendererConfig::default();
        config.cluster.max_lights_per_tile = 64;
        config.lights.radius = 3.0;
        let library = ShaderLibrary::new(&config);

        let clustering = library.source(ShaderId::ClusteringCompute);
        assert!(clustering.contains("const MAX_LIGHTS_PER_TILE: u32 = 64u;"));
        assert!(clustering.contains("const LIGHT_RADIUS: f32 = 3.0;"));
        assert!(clustering.contains("@workgroup_size(64)"));

        let moving = library.source(ShaderId::MoveLightsCompute);
        assert!(moving.contains("@workgroup_size(128)"));
        assert!(moving.contains("vec3f(-10.0, 0.0, -5.0)"));
    }

    #[test]
    fn only_lit_fragments_get_cluster_lighting() {
        let library = ShaderLibrary::new(&RendererConfig::default());
        assert!(library.source(ShaderId::ForwardPlusFrag).contains("fn accumulateClusterLights("));
        assert!(library.source(ShaderId::DeferredLightingFrag).contains("fn accumulateClusterLights("));
        assert!(!library.source(ShaderId::GBufferFrag).contains("fn accumulateClusterLights("));
        assert!(!library.source(ShaderId::ClusteringCompute).contains("fn accumulateClusterLights("));
    }

    #[test]
    fn deferred_depth_is_read_as_float_texture() {
        // GLSL has no texelFetch on depth-typed textures.
        let library = ShaderLibrary::new(&RendererConfig::default());
        let source = library.source(ShaderId::DeferredLightingFrag);
        assert!(!source.contains("texture_depth_2d"));
        assert!(source.contains("var depthTex: texture_2d<f32>;"));
    }
}
