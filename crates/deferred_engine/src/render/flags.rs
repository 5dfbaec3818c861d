//! Renderer feature flags
//!
//! The flags describe the material layout the G-buffer shaders were compiled
//! for, so the shader binder knows which texture layer carries which map.

use bitflags::bitflags;

bitflags! {
    /// Features enabled on the deferred renderer
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
    pub struct RendererFlags: u32 {
        /// Shadow mapping for point and spot lights
        const SHADOW_MAPPING     = 0x0000_0001;
        /// Normal maps are sampled in the G-buffer pass
        const NORMAL_MAPPING     = 0x0000_0002;
        /// Parallax-occlusion mapping from a relief layer
        const PARALLAX_MAPPING   = 0x0000_0004;
        /// Materials carry a specular map layer
        const HAS_SPECULAR_MAP   = 0x0000_0008;
        /// Materials may carry a light map layer after the height map
        const HAS_LIGHT_MAP      = 0x0000_0010;
        /// Upload a texture matrix to the G-buffer vertex shader
        const USE_TEXTURE_MATRIX = 0x0000_0020;
        /// Light through the tile light-index lists
        const TILED_SHADING      = 0x0000_0040;
        /// Render G-buffer channels for inspection
        const DEBUG_GBUFFER      = 0x0000_0080;
    }
}

impl RendererFlags {
    /// Texture layer index holding the height map for this flag set
    ///
    /// The G-buffer shaders read the height map from slot 2 when materials
    /// carry a specular map and from slot 3 otherwise; the light map, when
    /// present, follows it.
    pub fn height_map_layer(self) -> usize {
        if self.contains(Self::HAS_SPECULAR_MAP) {
            2
        } else {
            3
        }
    }
}

impl Default for RendererFlags {
    fn default() -> Self {
        Self::empty()
    }
}
