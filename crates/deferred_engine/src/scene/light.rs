//! Point light component

use serde::{Deserialize, Serialize};

use crate::foundation::collections::NodeId;
use crate::foundation::math::{Vec3, Vec4};

/// Point light attached to a light node
///
/// Position comes from the node's global transform. Only position and radius
/// feed the light grid; the colour is uploaded separately.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointLight {
    /// Light color (RGB)
    pub color: Vec3,
    /// Influence radius
    pub radius: f32,
    /// Disabled lights are skipped when collecting the frame's lights
    pub enabled: bool,
}

impl PointLight {
    /// Create an enabled point light
    pub fn new(color: Vec3, radius: f32) -> Self {
        Self {
            color,
            radius,
            enabled: true,
        }
    }
}

impl Default for PointLight {
    fn default() -> Self {
        Self::new(Vec3::new(1.0, 1.0, 1.0), 10.0)
    }
}

/// A light as collected from the scene for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollectedLight {
    /// Light node
    pub node: NodeId,
    /// World-space position (xyz) and radius (w)
    pub sphere: Vec4,
    /// Light color
    pub color: Vec3,
}
