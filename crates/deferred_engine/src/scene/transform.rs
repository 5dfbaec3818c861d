//! Local transformation of a scene node
//!
//! A `Transform` stores position, rotation and scale relative to the node's
//! parent (or world space for top-level nodes). The derived matrix is always
//! `translation * rotation * scale`.

use nalgebra::{Rotation3, UnitQuaternion};

use crate::foundation::math::{utils, Mat3, Mat4, Mat4Ext, Quat, Vec3};

/// Forward axis of nodes and cameras (left-handed, looking down +Z)
pub const FORWARD: Vec3 = Vec3::new(0.0, 0.0, 1.0);

/// Position, rotation and scale of a node
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// Position relative to the parent
    pub position: Vec3,

    /// Rotation relative to the parent
    pub rotation: Quat,

    /// Scale factors
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform with only position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create from position, rotation and scale
    pub fn from_parts(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    /// Builder pattern: Set rotation
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    /// Convert to a transformation matrix (TRS order)
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position)
            * self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }

    /// Translation part as a matrix
    pub fn position_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position)
    }

    /// Rotation part as a matrix
    pub fn rotation_matrix(&self) -> Mat4 {
        self.rotation.to_homogeneous()
    }

    /// Scale part as a matrix
    pub fn scale_matrix(&self) -> Mat4 {
        Mat4::new_nonuniform_scaling(&self.scale)
    }

    /// Create a transform from a transformation matrix
    ///
    /// The matrix must be affine without shear; a zero scale axis yields an
    /// identity rotation for that axis.
    pub fn from_matrix(matrix: &Mat4) -> Self {
        let position = matrix.translation_part();

        let axis_x = Vec3::new(matrix.m11, matrix.m21, matrix.m31);
        let axis_y = Vec3::new(matrix.m12, matrix.m22, matrix.m32);
        let axis_z = Vec3::new(matrix.m13, matrix.m23, matrix.m33);
        let scale = Vec3::new(axis_x.magnitude(), axis_y.magnitude(), axis_z.magnitude());

        let unscale = |axis: Vec3, length: f32| if length > f32::EPSILON { axis / length } else { axis };
        let rotation_matrix = Mat3::from_columns(&[
            unscale(axis_x, scale.x),
            unscale(axis_y, scale.y),
            unscale(axis_z, scale.z),
        ]);
        let rotation = UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(rotation_matrix));

        Self {
            position,
            rotation,
            scale,
        }
    }

    /// Forward direction (+Z rotated by this transform)
    pub fn direction(&self) -> Vec3 {
        self.rotation * FORWARD
    }

    /// Move along the node's own axes
    pub fn move_local(&mut self, direction: &Vec3) {
        self.position += self.rotation * direction;
    }

    /// Move along the parent's axes, ignoring rotation
    pub fn translate(&mut self, direction: &Vec3) {
        self.position += direction;
    }

    /// Turn by relative Euler angles in degrees, applied Y, then X, then Z
    pub fn turn(&mut self, euler_degrees: &Vec3) {
        self.rotation *= euler_yxz(euler_degrees);
    }

    /// Turn by `rotation` around `origin` (both in parent space)
    pub fn turn_about(&mut self, rotation: &Quat, origin: &Vec3) {
        self.position = origin + rotation * (self.position - origin);
        self.rotation = rotation * self.rotation;
    }

    /// Grow the scale by `size`
    pub fn transform(&mut self, size: &Vec3) {
        self.scale += size;
    }
}

/// Rotation from Euler angles in degrees, applied Y, then X, then Z
pub fn euler_yxz(euler_degrees: &Vec3) -> Quat {
    Quat::from_axis_angle(&Vec3::y_axis(), utils::deg_to_rad(euler_degrees.y))
        * Quat::from_axis_angle(&Vec3::x_axis(), utils::deg_to_rad(euler_degrees.x))
        * Quat::from_axis_angle(&Vec3::z_axis(), utils::deg_to_rad(euler_degrees.z))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::constants::PI;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn test_matrix_is_translation_rotation_scale() {
        let transform = Transform::from_parts(
            Vec3::new(1.0, 2.0, 3.0),
            Quat::from_axis_angle(&Vec3::y_axis(), 0.5),
            Vec3::new(2.0, 3.0, 4.0),
        );

        let expected = Mat4::new_translation(&transform.position)
            * transform.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&transform.scale);
        assert_relative_eq!(transform.to_matrix(), expected, epsilon = EPSILON);
    }

    #[test]
    fn test_matrix_roundtrip_consistency() {
        let original = Transform::from_parts(
            Vec3::new(1.0, 2.0, 3.0),
            Quat::from_axis_angle(&nalgebra::Unit::new_normalize(Vec3::new(1.0, 1.0, 1.0)), 0.5),
            Vec3::new(2.0, 1.5, 0.8),
        );

        let reconstructed = Transform::from_matrix(&original.to_matrix());

        assert_relative_eq!(reconstructed.position, original.position, epsilon = EPSILON);
        assert_relative_eq!(reconstructed.scale, original.scale, epsilon = EPSILON);
        assert!(reconstructed.rotation.angle_to(&original.rotation) < 1e-3);
    }

    #[test]
    fn test_move_follows_rotation() {
        let mut transform = Transform::identity().with_rotation(Quat::from_axis_angle(&Vec3::y_axis(), PI / 2.0));
        transform.move_local(&Vec3::new(0.0, 0.0, 1.0));

        // +Z turned 90 degrees around Y points along +X
        assert_relative_eq!(transform.position, Vec3::new(1.0, 0.0, 0.0), epsilon = EPSILON);

        transform.translate(&Vec3::new(0.0, 0.0, 1.0));
        assert_relative_eq!(transform.position, Vec3::new(1.0, 0.0, 1.0), epsilon = EPSILON);
    }

    #[test]
    fn test_turn_and_direction() {
        let mut transform = Transform::identity();
        transform.turn(&Vec3::new(0.0, 90.0, 0.0));
        assert_relative_eq!(transform.direction(), Vec3::new(1.0, 0.0, 0.0), epsilon = EPSILON);
    }

    #[test]
    fn test_turn_about_origin() {
        let mut transform = Transform::from_position(Vec3::new(2.0, 0.0, 0.0));
        let half_turn = Quat::from_axis_angle(&Vec3::y_axis(), PI);
        transform.turn_about(&half_turn, &Vec3::new(1.0, 0.0, 0.0));

        assert_relative_eq!(transform.position, Vec3::new(0.0, 0.0, 0.0), epsilon = EPSILON);
    }

    #[test]
    fn test_transform_grows_scale() {
        let mut transform = Transform::identity();
        transform.transform(&Vec3::new(0.5, 0.0, 1.0));
        assert_eq!(transform.scale, Vec3::new(1.5, 1.0, 2.0));
    }
}
