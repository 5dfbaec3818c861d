//! Screen tiles and their view-space frusta

use crate::foundation::math::{Mat4, Vec3, Vec4};
use crate::scene::Plane;

/// Tile edge length in pixels
pub const TILE_SIZE: u32 = 32;

/// Number of tiles covering a resolution, `ceil(res / TILE_SIZE)` per axis
pub fn compute_num_tiles(resolution: (u32, u32)) -> (u32, u32) {
    (
        resolution.0.div_ceil(TILE_SIZE),
        resolution.1.div_ceil(TILE_SIZE),
    )
}

/// Pixel rectangle `[x0, y0, x1, y1)` of a tile, clipped to the screen
pub fn tile_pixel_rect(tile: (u32, u32), resolution: (u32, u32)) -> [u32; 4] {
    let x0 = (tile.0 * TILE_SIZE).min(resolution.0);
    let y0 = (tile.1 * TILE_SIZE).min(resolution.1);
    [
        x0,
        y0,
        (x0 + TILE_SIZE).min(resolution.0),
        (y0 + TILE_SIZE).min(resolution.1),
    ]
}

/// View-space volume covered by one tile
///
/// Four side planes through the eye bound the tile's screen rectangle; the
/// depth slab `[z_min, z_max]` bounds it along the view axis. All plane
/// normals point into the volume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileFrustum {
    /// Left, right, bottom and top planes
    pub planes: [Plane; 4],
    /// Nearest view-space depth
    pub z_min: f32,
    /// Farthest view-space depth
    pub z_max: f32,
}

impl TileFrustum {
    /// Frustum of `tile` for a left-handed projection looking down +Z
    pub fn new(tile: (u32, u32), resolution: (u32, u32), projection: &Mat4, z_range: (f32, f32)) -> Self {
        let [x0, y0, x1, y1] = tile_pixel_rect(tile, resolution);
        let width = resolution.0.max(1) as f32;
        let height = resolution.1.max(1) as f32;

        // NDC rectangle; pixel rows grow downwards, NDC y grows upwards
        let left = 2.0 * x0 as f32 / width - 1.0;
        let right = 2.0 * x1 as f32 / width - 1.0;
        let top = 1.0 - 2.0 * y0 as f32 / height;
        let bottom = 1.0 - 2.0 * y1 as f32 / height;

        // ndc.x = (m11 x + m13 z) / z, ndc.y = (m22 y + m23 z) / z
        let (xs, xo) = (projection.m11, projection.m13);
        let (ys, yo) = (projection.m22, projection.m23);

        Self {
            planes: [
                Plane::new(Vec3::new(xs, 0.0, xo - left), 0.0),
                Plane::new(Vec3::new(-xs, 0.0, right - xo), 0.0),
                Plane::new(Vec3::new(0.0, ys, yo - bottom), 0.0),
                Plane::new(Vec3::new(0.0, -ys, top - yo), 0.0),
            ],
            z_min: z_range.0,
            z_max: z_range.1,
        }
    }

    /// Sphere test against the side planes and the depth slab
    pub fn intersects_sphere(&self, center: &Vec3, radius: f32) -> bool {
        if center.z + radius < self.z_min || center.z - radius > self.z_max {
            return false;
        }
        !self
            .planes
            .iter()
            .any(|plane| plane.sphere_outside(center, radius))
    }

    /// Sphere test for a packed `(x, y, z, radius)` light
    pub fn contains_light(&self, light: &Vec4) -> bool {
        self.intersects_sphere(&light.xyz(), light.w)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{utils, Mat4Ext};

    #[test]
    fn test_num_tiles_rounds_up() {
        assert_eq!(compute_num_tiles((1024, 768)), (32, 24));
        assert_eq!(compute_num_tiles((1000, 700)), (32, 22));
        assert_eq!(compute_num_tiles((1, 1)), (1, 1));
    }

    #[test]
    fn test_edge_tile_is_clipped() {
        assert_eq!(tile_pixel_rect((31, 21), (1000, 700)), [992, 672, 1000, 700]);
    }

    #[test]
    fn test_full_screen_tile_contains_center_light() {
        let projection = Mat4::perspective_lh(utils::deg_to_rad(90.0), 1.0, 0.1, 100.0);
        let frustum = TileFrustum::new((0, 0), (32, 32), &projection, (0.1, 100.0));

        assert!(frustum.intersects_sphere(&Vec3::new(0.0, 0.0, 10.0), 0.5));
        assert!(!frustum.intersects_sphere(&Vec3::new(0.0, 0.0, -10.0), 0.5));
        assert!(!frustum.intersects_sphere(&Vec3::new(20.0, 0.0, 10.0), 0.5));
    }

    #[test]
    fn test_tile_halves_split_lights() {
        let projection = Mat4::perspective_lh(utils::deg_to_rad(90.0), 1.0, 0.1, 100.0);
        let left = TileFrustum::new((0, 0), (64, 32), &projection, (0.1, 100.0));
        let right = TileFrustum::new((1, 0), (64, 32), &projection, (0.1, 100.0));
        let light = Vec4::new(-5.0, 0.0, 10.0, 0.5);

        assert!(left.contains_light(&light));
        assert!(!right.contains_light(&light));
    }

    #[test]
    fn test_top_row_is_positive_y() {
        let projection = Mat4::perspective_lh(utils::deg_to_rad(90.0), 1.0, 0.1, 100.0);
        let top = TileFrustum::new((0, 0), (32, 64), &projection, (0.1, 100.0));

        assert!(top.intersects_sphere(&Vec3::new(0.0, 5.0, 10.0), 0.5));
        assert!(!top.intersects_sphere(&Vec3::new(0.0, -5.0, 10.0), 0.5));
    }

    #[test]
    fn test_depth_slab_rejects() {
        let projection = Mat4::perspective_lh(utils::deg_to_rad(90.0), 1.0, 0.1, 100.0);
        let frustum = TileFrustum::new((0, 0), (32, 32), &projection, (5.0, 6.0));

        assert!(!frustum.intersects_sphere(&Vec3::new(0.0, 0.0, 10.0), 1.0));
        assert!(frustum.intersects_sphere(&Vec3::new(0.0, 0.0, 6.5), 1.0));
    }
}
