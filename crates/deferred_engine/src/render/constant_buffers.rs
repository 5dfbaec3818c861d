//! Constant buffer layouts for the deferred passes
//!
//! Each struct matches the corresponding HLSL/GLSL constant block byte for
//! byte. Matrices are column-major `[[f32; 4]; 4]`. Deriving `Pod` rejects
//! implicit padding, so every gap is an explicit field.

use bytemuck::{Pod, Zeroable};

/// G-buffer vertex constants (slot 0)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GBufferMainCB {
    /// World-view-projection matrix
    pub wvp_matrix: [[f32; 4]; 4],
    /// World matrix
    pub world_matrix: [[f32; 4]; 4],
    /// Camera position (w unused)
    pub view_position: [f32; 4],
}

/// G-buffer relief constants (slot 1)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GBufferReliefCB {
    /// Specular intensity factor
    pub specular_factor: f32,
    /// Height map scale
    pub height_map_scale: f32,
    /// Parallax fade distance
    pub parallax_view_range: f32,
    /// Padding
    pub pad0: f32,
    /// Non-zero enables parallax occlusion mapping
    pub enable_pom: i32,
    /// Minimum ray-march samples
    pub min_samples_pom: i32,
    /// Maximum ray-march samples
    pub max_samples_pom: i32,
    /// Padding
    pub pad1: i32,
}

/// Deferred lighting constants
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct DeferredMainCB {
    /// Camera projection matrix
    pub projection_matrix: [[f32; 4]; 4],
    /// Inverse of projection times rotation-only view
    pub inv_view_projection: [[f32; 4]; 4],
    /// Screen size on the diagonal (`[0][0]` width, `[1][1]` height)
    pub world_matrix: [[f32; 4]; 4],
    /// Camera position
    pub view_position: [f32; 3],
    /// Tiles per light grid row
    pub light_grid_row_size: u32,
}

/// Shadow map constants
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ShadowMainCB {
    /// World-view-projection matrix
    pub world_view_projection_matrix: [[f32; 4]; 4],
    /// World matrix
    pub world_matrix: [[f32; 4]; 4],
    /// Texture matrix
    pub texture_matrix: [[f32; 4]; 4],
    /// Light position (w unused)
    pub view_position: [f32; 4],
}

/// Light grid cell: a tile's range in the tile light-index list
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct LightGridCell {
    /// First index of the tile's range
    pub offset: u32,
    /// Number of indices in the range
    pub count: u32,
}

/// Linked-list element of the tile light-index list
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct LightNode {
    /// Index into the frame's light list
    pub light_id: u32,
    /// Index of the next node, or [`LightNode::END`]
    pub next: u32,
}

impl LightNode {
    /// Terminator for `next`
    pub const END: u32 = u32::MAX;
}

const _: () = assert!(std::mem::size_of::<GBufferMainCB>() == 144);
const _: () = assert!(std::mem::size_of::<GBufferReliefCB>() == 32);
const _: () = assert!(std::mem::size_of::<DeferredMainCB>() == 208);
const _: () = assert!(std::mem::size_of::<ShadowMainCB>() == 208);
const _: () = assert!(std::mem::size_of::<LightGridCell>() == 8);
const _: () = assert!(std::mem::size_of::<LightNode>() == 8);
