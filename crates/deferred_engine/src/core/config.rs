//! # Engine Configuration
//!
//! Configuration for the deferred pipeline: logging, the light grid and the
//! renderer flags handed to the shader binder.
//!
//! ## Configuration Categories
//!
//! - **Light Grid Config**: resolution, light capacity, compute preferences
//! - **Deferred Config**: renderer feature flags
//! - **Engine Config**: logging plus the two sections above

use serde::{Deserialize, Serialize};

pub use crate::config::{Config, ConfigError};
use crate::render::flags::RendererFlags;

/// # Light Grid Configuration
///
/// Sizing of the tiled light-culling structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightGridConfig {
    /// Screen resolution in pixels (width, height)
    pub resolution: (u32, u32),
    /// Maximum number of point lights the grid accepts
    pub max_lights: u32,
    /// Optional cap on the slots reserved per tile; defaults to `max_lights`
    pub max_lights_per_tile: Option<u32>,
    /// Use the compute strategy when the backend offers a compute device
    pub prefer_compute: bool,
    /// Invocations per work group on the compute path
    pub compute_lanes: u32,
}

impl LightGridConfig {
    /// Create a configuration for the given resolution
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            resolution: (width, height),
            ..Self::default()
        }
    }

    /// Set the light capacity
    pub fn with_max_lights(mut self, max_lights: u32) -> Self {
        self.max_lights = max_lights;
        self
    }

    /// Cap the number of slots reserved for each tile
    pub fn with_max_lights_per_tile(mut self, per_tile: u32) -> Self {
        self.max_lights_per_tile = Some(per_tile);
        self
    }

    /// Enable or disable the compute strategy
    pub fn with_compute(mut self, enabled: bool) -> Self {
        self.prefer_compute = enabled;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.resolution.0 == 0 || self.resolution.1 == 0 {
            return Err(ConfigError::Invalid(format!(
                "light grid resolution must be non-zero, got {}x{}",
                self.resolution.0, self.resolution.1
            )));
        }
        if self.max_lights == 0 {
            return Err(ConfigError::Invalid("max_lights must be at least 1".to_string()));
        }
        if self.max_lights_per_tile == Some(0) {
            return Err(ConfigError::Invalid("max_lights_per_tile must be at least 1".to_string()));
        }
        if self.compute_lanes == 0 {
            return Err(ConfigError::Invalid("compute_lanes must be at least 1".to_string()));
        }
        Ok(())
    }
}

impl Default for LightGridConfig {
    fn default() -> Self {
        Self {
            resolution: (1280, 720),
            max_lights: 256,
            max_lights_per_tile: None,
            prefer_compute: true,
            compute_lanes: 64,
        }
    }
}

/// # Deferred Renderer Configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeferredConfig {
    /// Feature flags consulted by the shader callbacks
    pub flags: RendererFlags,
}

impl Default for DeferredConfig {
    fn default() -> Self {
        Self {
            flags: RendererFlags::TILED_SHADING | RendererFlags::HAS_SPECULAR_MAP,
        }
    }
}

/// # Engine Configuration
///
/// Top-level configuration applications load from TOML or RON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Log level for the engine
    pub log_level: String,
    /// Light grid configuration
    pub light_grid: LightGridConfig,
    /// Deferred renderer configuration
    pub deferred: DeferredConfig,
}

impl EngineConfig {
    /// Create a new engine configuration
    pub fn new() -> Self {
        Self {
            log_level: "info".to_string(),
            light_grid: LightGridConfig::default(),
            deferred: DeferredConfig::default(),
        }
    }

    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Set the light grid configuration
    pub fn with_light_grid(mut self, light_grid: LightGridConfig) -> Self {
        self.light_grid = light_grid;
        self
    }

    /// Set the renderer flags
    pub fn with_flags(mut self, flags: RendererFlags) -> Self {
        self.deferred.flags = flags;
        self
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.light_grid.validate()
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl Config for EngineConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_resolution_rejected() {
        let config = EngineConfig::new().with_light_grid(LightGridConfig::new(0, 720));
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = EngineConfig::new()
            .with_log_level("debug")
            .with_light_grid(LightGridConfig::new(1024, 768).with_max_lights(64).with_max_lights_per_tile(16))
            .with_flags(RendererFlags::PARALLAX_MAPPING | RendererFlags::HAS_LIGHT_MAP);

        let text = config.to_string_with_format("engine.toml").unwrap();
        let parsed = EngineConfig::from_str_with_format(&text, "engine.toml").unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_ron_roundtrip() {
        let config = EngineConfig::new().with_light_grid(LightGridConfig::new(800, 600).with_compute(false));

        let text = config.to_string_with_format("engine.ron").unwrap();
        let parsed = EngineConfig::from_str_with_format(&text, "engine.ron").unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_unknown_extension() {
        let result = EngineConfig::from_str_with_format("", "engine.yaml");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }
}
