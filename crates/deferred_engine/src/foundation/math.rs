//! Math utilities and types
//!
//! Thin aliases over `nalgebra` plus the handful of matrix helpers the scene
//! graph and the deferred pipeline need. Matrices use column vectors, so a
//! parent transform is applied by left multiplication: `parent * local`.

pub use nalgebra::{Matrix3, Matrix4, Quaternion, Unit, Vector3, Vector4};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;
}

/// Math utility functions
pub mod utils {
    use super::constants;

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }
}

/// Extension trait for Mat4 with the conventions used by the renderer
pub trait Mat4Ext {
    /// Left-handed perspective projection mapping view depth `[near, far]` to `[0, 1]`.
    ///
    /// The camera looks down `+Z` in view space.
    fn perspective_lh(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4;

    /// Translation column of an affine matrix
    fn translation_part(&self) -> Vec3;

    /// Copy of the matrix with its translation column replaced
    fn with_translation(&self, translation: &Vec3) -> Mat4;
}

impl Mat4Ext for Mat4 {
    fn perspective_lh(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        let y_scale = 1.0 / (fov_y * 0.5).tan();
        let x_scale = y_scale / aspect;
        let depth = far / (far - near);

        // P = [xs  0   0   0        ]
        //     [0   ys  0   0        ]
        //     [0   0   f/(f-n) -nf/(f-n)]
        //     [0   0   1   0        ]
        Mat4::new(
            x_scale, 0.0, 0.0, 0.0,
            0.0, y_scale, 0.0, 0.0,
            0.0, 0.0, depth, -near * depth,
            0.0, 0.0, 1.0, 0.0,
        )
    }

    fn translation_part(&self) -> Vec3 {
        Vec3::new(self.m14, self.m24, self.m34)
    }

    fn with_translation(&self, translation: &Vec3) -> Mat4 {
        let mut result = *self;
        result.m14 = translation.x;
        result.m24 = translation.y;
        result.m34 = translation.z;
        result
    }
}

/// Column-major array form of a matrix, as uploaded to shaders
pub fn mat4_to_array(matrix: &Mat4) -> [[f32; 4]; 4] {
    (*matrix).into()
}
