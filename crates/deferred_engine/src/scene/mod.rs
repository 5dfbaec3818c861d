//! Scene management
//!
//! Hierarchical scene nodes with local transforms, cached world matrices and
//! the camera and light components that feed the deferred renderer.
//!
//! ## Architecture
//!
//! ```text
//! SceneGraph (arena of SceneNode, keyed by NodeId)
//!      ↓ update_all()
//! final world matrices, CameraState, point lights
//!      ↓
//! LightGrid / DeferredShaderBinder
//! ```

mod bounding;
mod camera;
mod graph;
mod light;
mod node;
mod transform;

use thiserror::Error;

use crate::foundation::collections::NodeId;

pub use bounding::{BoundingSphere, BoundingVolume, Plane, AABB};
pub use camera::{Camera, CameraState};
pub use graph::{SceneGraph, SceneResult};
pub use light::{CollectedLight, PointLight};
pub use node::{AnimationId, AnimationLink, NodeComponent, NodeType, SceneNode};
pub use transform::{euler_yxz, Transform, FORWARD};

/// Scene graph errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    /// The handle does not refer to a live node
    #[error("Scene node {0:?} not found")]
    NodeNotFound(NodeId),

    /// The requested parent link would make a node its own ancestor
    #[error("Attaching {node:?} under {parent:?} would create a cycle")]
    CycleDetected {
        /// Node being re-parented
        node: NodeId,
        /// Requested parent
        parent: NodeId,
    },

    /// The node carries no camera component
    #[error("Scene node {0:?} is not a camera")]
    NotACamera(NodeId),

    /// A transform on the node's parent chain cannot be inverted
    #[error("Transform of scene node {0:?} is not invertible")]
    SingularTransform(NodeId),
}
