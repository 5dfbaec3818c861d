//! Sequential light culling

use crate::foundation::math::Vec4;
use crate::render::constant_buffers::LightGridCell;
use crate::render::light_grid::tile::TileFrustum;
use crate::render::light_grid::TileLightIndices;

/// Cull `lights` against every tile frustum
///
/// Tiles are visited in row-major order and lights in list order. A tile
/// keeps at most `capacity` lights; the output is compacted, each tile's
/// range starting where the previous one ended.
pub(crate) fn cull(frusta: &[TileFrustum], lights: &[Vec4], capacity: u32, output: &mut TileLightIndices) {
    output.cells.clear();
    output.indices.clear();

    for frustum in frusta {
        let offset = output.indices.len() as u32;
        let mut count = 0;

        for (index, light) in lights.iter().enumerate() {
            if count == capacity {
                break;
            }
            if frustum.contains_light(light) {
                output.indices.push(index as u32);
                count += 1;
            }
        }

        output.cells.push(LightGridCell { offset, count });
    }
}
