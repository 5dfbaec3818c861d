//! Bounding volumes and planes
//!
//! Nodes carry their bounds in local space; `BoundingVolume::transformed`
//! moves them into world space using the node's world matrix.

use crate::foundation::math::{Mat4, Point3, Vec3};

/// Axis-aligned box bound of a node
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AABB {
    /// Lower corner
    pub min: Vec3,
    /// Upper corner
    pub max: Vec3,
}

impl AABB {
    /// Box spanning `min` to `max`
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// True when a sphere touches the box
    pub fn intersects_sphere(&self, center: &Vec3, radius: f32) -> bool {
        let closest = center.sup(&self.min).inf(&self.max);
        (closest - center).magnitude_squared() <= radius * radius
    }

    /// Box enclosing this box after transformation by `matrix`
    pub fn transformed(&self, matrix: &Mat4) -> AABB {
        let mut min = Vec3::repeat(f32::INFINITY);
        let mut max = Vec3::repeat(f32::NEG_INFINITY);

        for corner in 0..8 {
            let point = Point3::new(
                if corner & 1 == 0 { self.min.x } else { self.max.x },
                if corner & 2 == 0 { self.min.y } else { self.max.y },
                if corner & 4 == 0 { self.min.z } else { self.max.z },
            );
            let moved = matrix.transform_point(&point).coords;
            min = min.inf(&moved);
            max = max.sup(&moved);
        }

        AABB { min, max }
    }
}

/// Bounding sphere
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    /// Sphere center
    pub center: Vec3,
    /// Sphere radius
    pub radius: f32,
}

impl BoundingSphere {
    /// Create a new sphere
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Sphere enclosing this sphere after transformation by `matrix`
    ///
    /// The radius grows by the largest axis scale of the matrix.
    pub fn transformed(&self, matrix: &Mat4) -> BoundingSphere {
        let center = matrix.transform_point(&Point3::from(self.center)).coords;
        let max_scale = (0..3)
            .map(|column| matrix.fixed_view::<3, 1>(0, column).magnitude())
            .fold(0.0_f32, f32::max);
        BoundingSphere::new(center, self.radius * max_scale)
    }

    /// Check if another sphere touches this one
    pub fn intersects_sphere(&self, center: &Vec3, radius: f32) -> bool {
        let reach = self.radius + radius;
        (self.center - center).magnitude_squared() <= reach * reach
    }
}

/// Bounding volume of a scene node, in local space
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoundingVolume {
    /// Optional bounding sphere
    pub sphere: Option<BoundingSphere>,
    /// Optional bounding box
    pub aabb: Option<AABB>,
}

impl BoundingVolume {
    /// Volume with only a sphere
    pub fn sphere(center: Vec3, radius: f32) -> Self {
        Self {
            sphere: Some(BoundingSphere::new(center, radius)),
            aabb: None,
        }
    }

    /// Volume with only a box
    pub fn aabb(min: Vec3, max: Vec3) -> Self {
        Self {
            sphere: None,
            aabb: Some(AABB::new(min, max)),
        }
    }

    /// True when neither a sphere nor a box is set
    pub fn is_empty(&self) -> bool {
        self.sphere.is_none() && self.aabb.is_none()
    }

    /// The volume in the space described by `matrix`
    pub fn transformed(&self, matrix: &Mat4) -> BoundingVolume {
        BoundingVolume {
            sphere: self.sphere.map(|sphere| sphere.transformed(matrix)),
            aabb: self.aabb.map(|aabb| aabb.transformed(matrix)),
        }
    }

    /// Check a sphere against every bound that is set
    ///
    /// An empty volume never intersects.
    pub fn intersects_sphere(&self, center: &Vec3, radius: f32) -> bool {
        if self.is_empty() {
            return false;
        }
        self.sphere.map_or(true, |sphere| sphere.intersects_sphere(center, radius))
            && self.aabb.map_or(true, |aabb| aabb.intersects_sphere(center, radius))
    }
}

/// Half-space `normal · p + distance >= 0`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Unit normal pointing into the kept half-space
    pub normal: Vec3,
    /// Offset along the normal
    pub distance: f32,
}

impl Plane {
    /// Plane from an unnormalised normal and offset; both are rescaled
    pub fn new(normal: Vec3, distance: f32) -> Self {
        let length = normal.magnitude();
        Self {
            normal: normal / length,
            distance: distance / length,
        }
    }

    /// True when the sphere lies entirely on the negative side
    pub fn sphere_outside(&self, center: &Vec3, radius: f32) -> bool {
        self.normal.dot(center) + self.distance < -radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_aabb_sphere_touch() {
        let aabb = AABB::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0));

        assert!(aabb.intersects_sphere(&Vec3::zeros(), 0.1));
        assert!(aabb.intersects_sphere(&Vec3::new(1.5, 0.0, 0.0), 0.6));
        assert!(!aabb.intersects_sphere(&Vec3::new(2.0, 2.0, 0.0), 1.0));
    }

    #[test]
    fn test_aabb_transformed_by_translation() {
        let aabb = AABB::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0));
        let moved = aabb.transformed(&Mat4::new_translation(&Vec3::new(10.0, 0.0, 0.0)));

        assert_relative_eq!(moved.min, Vec3::new(9.0, -1.0, -1.0));
        assert_relative_eq!(moved.max, Vec3::new(11.0, 1.0, 1.0));
    }

    #[test]
    fn test_sphere_transformed_scales_radius() {
        let sphere = BoundingSphere::new(Vec3::zeros(), 1.0);
        let matrix = Mat4::new_translation(&Vec3::new(0.0, 5.0, 0.0)) * Mat4::new_nonuniform_scaling(&Vec3::new(1.0, 3.0, 2.0));
        let moved = sphere.transformed(&matrix);

        assert_relative_eq!(moved.center, Vec3::new(0.0, 5.0, 0.0));
        assert_relative_eq!(moved.radius, 3.0);
    }

    #[test]
    fn test_empty_volume_never_intersects() {
        assert!(!BoundingVolume::default().intersects_sphere(&Vec3::zeros(), 100.0));
        assert!(BoundingVolume::sphere(Vec3::zeros(), 1.0).intersects_sphere(&Vec3::new(1.5, 0.0, 0.0), 1.0));
    }

    #[test]
    fn test_plane_sphere_outside() {
        let plane = Plane::new(Vec3::new(2.0, 0.0, 0.0), 0.0);
        assert!(plane.sphere_outside(&Vec3::new(-3.0, 0.0, 0.0), 1.0));
        assert!(!plane.sphere_outside(&Vec3::new(-0.5, 0.0, 0.0), 1.0));
    }
}
