//! Scene node data
//!
//! Nodes live in the [`SceneGraph`](crate::scene::SceneGraph) arena. A node
//! refers to its parent by a weak [`NodeId`] and owns its children through
//! the ordered `children` list: removing a node from the graph removes its
//! whole subtree.

use crate::foundation::collections::NodeId;
use crate::foundation::math::Mat4;
use crate::scene::bounding::BoundingVolume;
use crate::scene::camera::Camera;
use crate::scene::light::PointLight;
use crate::scene::transform::Transform;

/// Scene node types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    /// Basic scene node
    Basic,
    /// Custom scene node
    Custom,
    /// Scene graph tree node
    SceneGraph,
    /// View camera
    Camera,
    /// Light source
    Light,
    /// 3D mesh object
    Mesh,
    /// Billboard, particle or sprite
    Billboard,
    /// Terrain object
    Terrain,
}

/// Handle to an animation owned outside the scene graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnimationId(pub u64);

/// Non-owning link from a node to an animation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimationLink {
    /// Animation handle
    pub id: AnimationId,
    /// Animation name, used by name lookups
    pub name: String,
}

/// Type-specific data of a node
#[derive(Debug, Clone, PartialEq)]
pub enum NodeComponent {
    /// Plain transform node
    None,
    /// Camera projection
    Camera(Camera),
    /// Point light
    Light(PointLight),
}

/// A node of the scene hierarchy
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub(crate) node_type: NodeType,
    pub(crate) name: String,
    pub(crate) visible: bool,
    pub(crate) transform: Transform,
    pub(crate) final_world_matrix: Mat4,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) animations: Vec<AnimationLink>,
    pub(crate) bounding: BoundingVolume,
    pub(crate) component: NodeComponent,
}

impl SceneNode {
    /// Create a detached node
    pub fn new(node_type: NodeType) -> Self {
        Self {
            node_type,
            name: String::new(),
            visible: true,
            transform: Transform::identity(),
            final_world_matrix: Mat4::identity(),
            parent: None,
            children: Vec::new(),
            animations: Vec::new(),
            bounding: BoundingVolume::default(),
            component: NodeComponent::None,
        }
    }

    /// Node type tag
    pub fn node_type(&self) -> NodeType {
        self.node_type
    }

    /// Node name (empty when unnamed)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the node
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Visibility of this node alone
    pub fn is_visible_local(&self) -> bool {
        self.visible
    }

    /// Local transform
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Mutable local transform
    pub fn transform_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }

    /// Replace the local transform
    pub fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
    }

    /// World matrix computed by the last propagation
    pub fn final_world_matrix(&self) -> &Mat4 {
        &self.final_world_matrix
    }

    /// Parent handle, if any
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in insertion order
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Linked animations
    pub fn animations(&self) -> &[AnimationLink] {
        &self.animations
    }

    /// Local-space bounding volume
    pub fn bounding_volume(&self) -> &BoundingVolume {
        &self.bounding
    }

    /// Set the local-space bounding volume
    pub fn set_bounding_volume(&mut self, bounding: BoundingVolume) {
        self.bounding = bounding;
    }

    /// Type-specific data
    pub fn component(&self) -> &NodeComponent {
        &self.component
    }

    /// Camera data for camera nodes
    pub fn camera(&self) -> Option<&Camera> {
        match &self.component {
            NodeComponent::Camera(camera) => Some(camera),
            _ => None,
        }
    }

    /// Mutable camera data for camera nodes
    pub fn camera_mut(&mut self) -> Option<&mut Camera> {
        match &mut self.component {
            NodeComponent::Camera(camera) => Some(camera),
            _ => None,
        }
    }

    /// Light data for light nodes
    pub fn light(&self) -> Option<&PointLight> {
        match &self.component {
            NodeComponent::Light(light) => Some(light),
            _ => None,
        }
    }

    /// Mutable light data for light nodes
    pub fn light_mut(&mut self) -> Option<&mut PointLight> {
        match &mut self.component {
            NodeComponent::Light(light) => Some(light),
            _ => None,
        }
    }
}
