//! Camera projection data and per-frame camera state
//!
//! A camera is a scene node carrying a [`Camera`] component. Its placement
//! comes from the node's global transform; the component only describes the
//! projection. Cameras look down their local +Z axis (left-handed view space)
//! and store depth in `[0, 1]`.

use serde::{Deserialize, Serialize};

use crate::foundation::collections::NodeId;
use crate::foundation::math::{utils, Mat4, Mat4Ext, Vec3};
use crate::scene::{SceneError, SceneGraph};

/// Perspective projection parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
    /// Aspect ratio (width / height)
    pub aspect: f32,
    /// Distance to near clipping plane
    pub near: f32,
    /// Distance to far clipping plane
    pub far: f32,
}

impl Camera {
    /// Create a perspective camera
    pub fn perspective(fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            fov_degrees,
            aspect,
            near,
            far,
        }
    }

    /// Create a perspective camera matching a viewport resolution
    pub fn for_viewport(fov_degrees: f32, width: u32, height: u32, near: f32, far: f32) -> Self {
        let aspect = if height == 0 { 1.0 } else { width as f32 / height as f32 };
        Self::perspective(fov_degrees, aspect, near, far)
    }

    /// Left-handed projection matrix
    pub fn matrix_lh(&self) -> Mat4 {
        Mat4::perspective_lh(utils::deg_to_rad(self.fov_degrees), self.aspect, self.near, self.far)
    }

    /// View-space depth of a stored `[0, 1]` depth value
    pub fn linearize_depth(&self, depth: f32) -> f32 {
        let depth = depth.clamp(0.0, 1.0);
        self.near * self.far / (self.far - depth * (self.far - self.near))
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::perspective(74.0, 4.0 / 3.0, 0.25, 1000.0)
    }
}

/// Camera data resolved from the scene graph for one frame
#[derive(Debug, Clone, PartialEq)]
pub struct CameraState {
    /// Camera node the state was resolved from
    pub node: NodeId,
    /// Global camera position
    pub position: Vec3,
    /// Global camera transform (camera to world)
    pub global_matrix: Mat4,
    /// World to camera transform
    pub view_matrix: Mat4,
    /// Projection parameters
    pub camera: Camera,
}

impl CameraState {
    /// Resolve the state of `node` from the graph
    pub fn from_graph(graph: &SceneGraph, node: NodeId) -> Result<Self, SceneError> {
        let camera = *graph
            .node(node)?
            .camera()
            .ok_or(SceneError::NotACamera(node))?;
        let global_matrix = graph.global_matrix(node)?;
        let view_matrix = global_matrix
            .try_inverse()
            .ok_or(SceneError::SingularTransform(node))?;

        Ok(Self {
            node,
            position: global_matrix.translation_part(),
            global_matrix,
            view_matrix,
            camera,
        })
    }

    /// Left-handed projection matrix
    pub fn projection_lh(&self) -> Mat4 {
        self.camera.matrix_lh()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_linearize_depth_endpoints() {
        let camera = Camera::perspective(90.0, 1.0, 0.5, 50.0);
        assert_relative_eq!(camera.linearize_depth(0.0), 0.5, epsilon = 1e-5);
        assert_relative_eq!(camera.linearize_depth(1.0), 50.0, epsilon = 1e-3);
    }

    #[test]
    fn test_linearize_inverts_projection() {
        let camera = Camera::perspective(60.0, 1.5, 1.0, 200.0);
        let projected = camera.matrix_lh() * crate::foundation::math::Vec4::new(0.0, 0.0, 20.0, 1.0);
        let depth = projected.z / projected.w;

        assert_relative_eq!(camera.linearize_depth(depth), 20.0, epsilon = 1e-3);
    }

    #[test]
    fn test_for_viewport_aspect() {
        let camera = Camera::for_viewport(60.0, 1024, 768, 0.1, 100.0);
        assert_relative_eq!(camera.aspect, 1024.0 / 768.0);
    }
}
