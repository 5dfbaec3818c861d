//! Material texture layers
//!
//! A surface binds an ordered list of layer slots. Layer order is fixed:
//! base color, normal map, optional specular map, height map, light map.

use serde::{Deserialize, Serialize};

/// Handle to a texture owned by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextureId(pub u64);

/// Height-map layer with parallax occlusion settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReliefLayer {
    /// Height map texture
    pub texture: TextureId,
    /// Minimum ray-march samples
    pub min_samples: i32,
    /// Maximum ray-march samples
    pub max_samples: i32,
    /// Height scale
    pub height_map_scale: f32,
    /// Distance over which parallax fades out
    pub view_range: f32,
    /// Disabled relief layers are bound but not ray-marched
    pub enabled: bool,
}

impl ReliefLayer {
    /// Relief layer with default sampling settings
    pub fn new(texture: TextureId) -> Self {
        Self {
            texture,
            min_samples: 0,
            max_samples: 50,
            height_map_scale: 0.015,
            view_range: 2.0,
            enabled: true,
        }
    }
}

/// One texture layer of a surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TextureLayer {
    /// Base color
    Base(TextureId),
    /// Normal map
    Normal(TextureId),
    /// Specular map
    Specular(TextureId),
    /// Light map
    Light(TextureId),
    /// Height map with relief settings
    Relief(ReliefLayer),
}

impl TextureLayer {
    /// Texture bound by this layer
    pub fn texture(&self) -> TextureId {
        match self {
            TextureLayer::Base(texture)
            | TextureLayer::Normal(texture)
            | TextureLayer::Specular(texture)
            | TextureLayer::Light(texture) => *texture,
            TextureLayer::Relief(relief) => relief.texture,
        }
    }

    /// Relief settings when this is a height-map layer
    pub fn relief(&self) -> Option<&ReliefLayer> {
        match self {
            TextureLayer::Relief(relief) => Some(relief),
            _ => None,
        }
    }
}
