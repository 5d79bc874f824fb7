use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{RenderError, Result};

/// Hard upper bound on the light pool. The light buffer is sized for this many
/// lights once and never resized.
pub const MAX_LIGHTS: u32 = 5000;

/// Which many-light strategy draws the frame. Chosen once at start-up.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderPath {
    #[default]
    ForwardPlus,
    ClusteredDeferred,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    pub tiles_x: u32,
    pub tiles_y: u32,
    pub tiles_z: u32,
    pub max_lights_per_tile: u32,
    /// Invocations per workgroup of the clustering kernel.
    pub tile_workgroup_size: u32,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            tiles_x: 16,
            tiles_y: 9,
            tiles_z: 24,
            max_lights_per_tile: 256,
            tile_workgroup_size: 64,
        }
    }
}

impl ClusterConfig {
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("tiles_x", self.tiles_x),
            ("tiles_y", self.tiles_y),
            ("tiles_z", self.tiles_z),
            ("max_lights_per_tile", self.max_lights_per_tile),
            ("tile_workgroup_size", self.tile_workgroup_size),
        ];
        for (name, value) in fields {
            if value == 0 {
                return Err(RenderError::InvalidClusterConfig(format!(
                    "{name} must be greater than zero"
                )));
            }
        }

        let total = (self.tiles_x as u64) * (self.tiles_y as u64) * (self.tiles_z as u64);
        if total > u32::MAX as u64 {
            return Err(RenderError::InvalidClusterConfig(format!(
                "{total} clusters do not fit a 32-bit cluster index"
            )));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightConfig {
    /// Active lights at start-up, clamped to [`MAX_LIGHTS`].
    pub initial_count: u32,
    pub intensity: f32,
    /// Radius of every light's influence volume, in world units.
    pub radius: f32,
    /// Invocations per workgroup of the move-lights kernel.
    pub move_workgroup_size: u32,
    /// Seed for light hues and start positions.
    pub seed: u64,
    pub bounds_min: [f32; 3],
    pub bounds_max: [f32; 3],
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            initial_count: 500,
            intensity: 0.1,
            radius: 2.0,
            move_workgroup_size: 128,
            seed: 0x5eed,
            bounds_min: [-10.0, 0.0, -5.0],
            bounds_max: [10.0, 8.0, 5.0],
        }
    }
}

impl LightConfig {
    pub fn validate(&self) -> Result<()> {
        if self.move_workgroup_size == 0 {
            return Err(RenderError::InvalidLightConfig(
                "move_workgroup_size must be greater than zero".into(),
            ));
        }
        if !(self.radius > 0.0) {
            return Err(RenderError::InvalidLightConfig(format!(
                "radius must be positive, got {}",
                self.radius
            )));
        }
        if (0..3).any(|i| self.bounds_min[i] > self.bounds_max[i]) {
            return Err(RenderError::InvalidLightConfig(
                "bounds_min must not exceed bounds_max".into(),
            ));
        }
        Ok(())
    }
}

/// Top-level renderer configuration, usually read from a JSON file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    pub render_path: RenderPath,
    pub cluster: ClusterConfig,
    pub lights: LightConfig,
}

impl RendererConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| RenderError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&text)?;
        log::info!("Loaded renderer config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.cluster.validate()?;
        self.lights.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_grid() {
        let config = RendererConfig::default();
        assert_eq!(config.render_path, RenderPath::ForwardPlus);
        assert_eq!(
            (config.cluster.tiles_x, config.cluster.tiles_y, config.cluster.tiles_z),
            (16, 9, 24)
        );
        assert_eq!(config.cluster.max_lights_per_tile, 256);
        assert_eq!(config.lights.initial_count, 500);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = RendererConfig::from_json_str(
            r#"{ "render_path": "clustered_deferred", "cluster": { "tiles_z": 32 } }"#,
        )
        .unwrap();
        assert_eq!(config.render_path, RenderPath::ClusteredDeferred);
        assert_eq!(config.cluster.tiles_z, 32);
        assert_eq!(config.cluster.tiles_x, 16);
        assert_eq!(config.lights, LightConfig::default());
    }

    #[test]
    fn unknown_render_path_is_rejected() {
        let err = RendererConfig::from_json_str(r#"{ "render_path": "deferred" }"#).unwrap_err();
        assert!(matches!(err, RenderError::ConfigParse(_)));
    }

    #[test]
    fn zero_sized_grid_is_rejected() {
        let mut config = RendererConfig::default();
        config.cluster.tiles_y = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("tiles_y"));
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        let mut config = RendererConfig::default();
        config.lights.bounds_min = [0.0, 10.0, 0.0];
        assert!(matches!(
            config.validate(),
            Err(RenderError::InvalidLightConfig(_))
        ));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = RendererConfig::load("/definitely/not/here.json").unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.json"));
    }
}
