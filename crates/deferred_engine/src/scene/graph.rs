//! Arena-backed scene hierarchy
//!
//! `SceneGraph` stores every node in a slot map. Parents are weak handles,
//! children are owned by their parent's ordered list, and the graph refuses
//! any link that would make a node its own ancestor. Global transforms are
//! resolved on demand by walking the parent chain; `update_all` caches them
//! once per frame in each node's final world matrix.

use crate::foundation::collections::{NodeArena, NodeId};
use crate::foundation::math::{Mat4, Mat4Ext, Quat, Vec3};
use crate::render::backend::RenderCoordinator;
use crate::scene::camera::Camera;
use crate::scene::light::{CollectedLight, PointLight};
use crate::scene::node::{AnimationId, AnimationLink, NodeComponent, NodeType, SceneNode};
use crate::scene::transform::{Transform, FORWARD};
use crate::scene::SceneError;

/// Scene graph result type
pub type SceneResult<T> = Result<T, SceneError>;

/// Hierarchy of scene nodes
#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: NodeArena<SceneNode>,
    active_camera: Option<NodeId>,
}

impl SceneGraph {
    /// Create an empty scene graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the graph has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// True when `id` refers to a live node
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Create a detached node
    pub fn create_node(&mut self, node_type: NodeType) -> NodeId {
        let id = self.nodes.insert(SceneNode::new(node_type));
        log::trace!("Created {:?} node {:?}", node_type, id);
        id
    }

    /// Create a camera node; the first camera becomes the active one
    pub fn create_camera(&mut self, camera: Camera) -> NodeId {
        let mut node = SceneNode::new(NodeType::Camera);
        node.component = NodeComponent::Camera(camera);
        let id = self.nodes.insert(node);
        if self.active_camera.is_none() {
            self.active_camera = Some(id);
        }
        id
    }

    /// Create a light node
    pub fn create_light(&mut self, light: PointLight) -> NodeId {
        let mut node = SceneNode::new(NodeType::Light);
        node.component = NodeComponent::Light(light);
        self.nodes.insert(node)
    }

    /// Node by handle
    pub fn node(&self, id: NodeId) -> SceneResult<&SceneNode> {
        self.nodes.get(id).ok_or(SceneError::NodeNotFound(id))
    }

    /// Mutable node by handle
    pub fn node_mut(&mut self, id: NodeId) -> SceneResult<&mut SceneNode> {
        self.nodes.get_mut(id).ok_or(SceneError::NodeNotFound(id))
    }

    /// First node with the given name
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|(_, node)| node.name == name)
            .map(|(id, _)| id)
    }

    /// All nodes
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &SceneNode)> {
        self.nodes.iter()
    }

    /// Nodes without a parent
    pub fn top_level_nodes(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|(_, node)| node.parent.is_none())
            .map(|(id, _)| id)
            .collect()
    }

    // === Transformation queries ===

    /// Global matrix: every ancestor's local matrix applied root to leaf
    pub fn global_matrix(&self, id: NodeId) -> SceneResult<Mat4> {
        let node = self.node(id)?;
        let mut matrix = node.transform.to_matrix();
        let mut current = node.parent;

        while let Some(parent_id) = current {
            let parent = self.node(parent_id)?;
            matrix = parent.transform.to_matrix() * matrix;
            current = parent.parent;
        }

        Ok(matrix)
    }

    fn parent_global_matrix(&self, id: NodeId) -> SceneResult<Option<Mat4>> {
        match self.node(id)?.parent {
            Some(parent) => self.global_matrix(parent).map(Some),
            None => Ok(None),
        }
    }

    fn parent_global_transform(&self, id: NodeId) -> SceneResult<Option<Transform>> {
        Ok(self
            .parent_global_matrix(id)?
            .map(|matrix| Transform::from_matrix(&matrix)))
    }

    /// Local or global transformation of a node
    pub fn transformation(&self, id: NodeId, is_global: bool) -> SceneResult<Transform> {
        if is_global {
            Ok(Transform::from_matrix(&self.global_matrix(id)?))
        } else {
            Ok(self.node(id)?.transform.clone())
        }
    }

    /// Local or global transformation matrix of a node
    pub fn transform_matrix(&self, id: NodeId, is_global: bool) -> SceneResult<Mat4> {
        if is_global {
            self.global_matrix(id)
        } else {
            Ok(self.node(id)?.transform.to_matrix())
        }
    }

    /// Set the position; with `is_global` the resulting global position equals `position`
    pub fn set_position(&mut self, id: NodeId, position: Vec3, is_global: bool) -> SceneResult<()> {
        let local = match (is_global, self.parent_global_matrix(id)?) {
            (true, Some(parent)) => {
                let inverse = parent.try_inverse().ok_or(SceneError::SingularTransform(id))?;
                inverse.transform_point(&position.into()).coords
            }
            _ => position,
        };
        self.node_mut(id)?.transform.position = local;
        Ok(())
    }

    /// Local or global position
    pub fn position(&self, id: NodeId, is_global: bool) -> SceneResult<Vec3> {
        if is_global {
            Ok(self.global_matrix(id)?.translation_part())
        } else {
            Ok(self.node(id)?.transform.position)
        }
    }

    /// Set the rotation; with `is_global` the resulting global rotation equals `rotation`
    pub fn set_rotation(&mut self, id: NodeId, rotation: Quat, is_global: bool) -> SceneResult<()> {
        let local = match (is_global, self.parent_global_transform(id)?) {
            (true, Some(parent)) => parent.rotation.inverse() * rotation,
            _ => rotation,
        };
        self.node_mut(id)?.transform.rotation = local;
        Ok(())
    }

    /// Local or global rotation
    pub fn rotation(&self, id: NodeId, is_global: bool) -> SceneResult<Quat> {
        Ok(self.transformation(id, is_global)?.rotation)
    }

    /// Set the scale; with `is_global` the resulting global scale equals `scale`
    pub fn set_scale(&mut self, id: NodeId, scale: Vec3, is_global: bool) -> SceneResult<()> {
        let local = match (is_global, self.parent_global_transform(id)?) {
            (true, Some(parent)) => {
                if parent.scale.iter().any(|axis| axis.abs() <= f32::EPSILON) {
                    return Err(SceneError::SingularTransform(id));
                }
                scale.component_div(&parent.scale)
            }
            _ => scale,
        };
        self.node_mut(id)?.transform.scale = local;
        Ok(())
    }

    /// Local or global scale
    pub fn scale(&self, id: NodeId, is_global: bool) -> SceneResult<Vec3> {
        if is_global {
            Ok(self.transformation(id, true)?.scale)
        } else {
            Ok(self.node(id)?.transform.scale)
        }
    }

    /// Set the position from the translation of a matrix
    pub fn set_position_matrix(&mut self, id: NodeId, matrix: &Mat4, is_global: bool) -> SceneResult<()> {
        self.set_position(id, matrix.translation_part(), is_global)
    }

    /// Position as a translation matrix
    pub fn position_matrix(&self, id: NodeId, is_global: bool) -> SceneResult<Mat4> {
        Ok(Mat4::new_translation(&self.position(id, is_global)?))
    }

    /// Set the rotation from the rotation part of a matrix
    pub fn set_rotation_matrix(&mut self, id: NodeId, matrix: &Mat4, is_global: bool) -> SceneResult<()> {
        let rotation = Transform::from_matrix(matrix).rotation;
        self.set_rotation(id, rotation, is_global)
    }

    /// Rotation as a matrix
    pub fn rotation_matrix(&self, id: NodeId, is_global: bool) -> SceneResult<Mat4> {
        Ok(self.rotation(id, is_global)?.to_homogeneous())
    }

    /// Set the scale from the axis lengths of a matrix
    pub fn set_scale_matrix(&mut self, id: NodeId, matrix: &Mat4, is_global: bool) -> SceneResult<()> {
        let scale = Transform::from_matrix(matrix).scale;
        self.set_scale(id, scale, is_global)
    }

    /// Scale as a matrix
    pub fn scale_matrix(&self, id: NodeId, is_global: bool) -> SceneResult<Mat4> {
        Ok(Mat4::new_nonuniform_scaling(&self.scale(id, is_global)?))
    }

    /// Rotate the node so its forward axis points at `target`
    ///
    /// With `is_global` the target is in world space, otherwise in the parent's space.
    pub fn look_at(&mut self, id: NodeId, target: Vec3, is_global: bool) -> SceneResult<()> {
        let direction = target - self.position(id, is_global)?;
        if direction.magnitude_squared() <= f32::EPSILON {
            return Ok(());
        }

        let up = if direction.normalize().cross(&Vec3::y()).magnitude_squared() <= f32::EPSILON {
            FORWARD
        } else {
            Vec3::y()
        };
        let rotation = Quat::face_towards(&direction, &up);
        self.set_rotation(id, rotation, is_global)
    }

    /// Move along the node's own axes
    pub fn move_node(&mut self, id: NodeId, direction: &Vec3) -> SceneResult<()> {
        self.node_mut(id)?.transform.move_local(direction);
        Ok(())
    }

    /// Turn by relative Euler angles in degrees
    pub fn turn(&mut self, id: NodeId, euler_degrees: &Vec3) -> SceneResult<()> {
        self.node_mut(id)?.transform.turn(euler_degrees);
        Ok(())
    }

    /// Turn around an origin given in the parent's space
    pub fn turn_about(&mut self, id: NodeId, rotation: &Quat, origin: &Vec3) -> SceneResult<()> {
        self.node_mut(id)?.transform.turn_about(rotation, origin);
        Ok(())
    }

    /// Move along the parent's axes
    pub fn translate(&mut self, id: NodeId, direction: &Vec3) -> SceneResult<()> {
        self.node_mut(id)?.transform.translate(direction);
        Ok(())
    }

    /// Grow the node's scale
    pub fn transform(&mut self, id: NodeId, size: &Vec3) -> SceneResult<()> {
        self.node_mut(id)?.transform.transform(size);
        Ok(())
    }

    // === Hierarchy ===

    /// True when `ancestor` appears in the parent chain of `id`
    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = self.nodes.get(id).and_then(|node| node.parent);
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.nodes.get(parent).and_then(|node| node.parent);
        }
        false
    }

    /// Change the parent of a node
    ///
    /// With `is_global` the node keeps its global pose; otherwise its local
    /// transform is kept and the global pose follows the new parent. Passing
    /// `None` detaches the node.
    pub fn set_parent(&mut self, id: NodeId, parent: Option<NodeId>, is_global: bool) -> SceneResult<()> {
        self.node(id)?;
        if let Some(parent) = parent {
            self.node(parent)?;
            if parent == id || self.is_ancestor(id, parent) {
                return Err(SceneError::CycleDetected { node: id, parent });
            }
        }

        if is_global {
            let global = self.global_matrix(id)?;
            let local = match parent {
                Some(parent) => {
                    let inverse = self
                        .global_matrix(parent)?
                        .try_inverse()
                        .ok_or(SceneError::SingularTransform(parent))?;
                    inverse * global
                }
                None => global,
            };
            self.node_mut(id)?.transform = Transform::from_matrix(&local);
        }

        self.link(id, parent);
        Ok(())
    }

    /// Relink `id` under `parent`; both handles must be valid
    fn link(&mut self, id: NodeId, parent: Option<NodeId>) {
        let old_parent = self.nodes.get_mut(id).and_then(|node| node.parent.take());
        if let Some(old) = old_parent.and_then(|old| self.nodes.get_mut(old)) {
            old.children.retain(|child| *child != id);
        }
        if let Some(new) = parent.and_then(|parent| self.nodes.get_mut(parent)) {
            new.children.push(id);
        }
        if let Some(node) = self.nodes.get_mut(id) {
            node.parent = parent;
        }
    }

    /// Append a child, keeping its local transform
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> SceneResult<()> {
        self.set_parent(child, Some(parent), false)
    }

    /// Append several children in order
    pub fn add_children(&mut self, parent: NodeId, children: &[NodeId]) -> SceneResult<()> {
        children
            .iter()
            .try_for_each(|child| self.add_child(parent, *child))
    }

    /// Detach `child` from `parent`; `false` when it is not a child of `parent`
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> SceneResult<bool> {
        if !self.node(parent)?.children.contains(&child) {
            return Ok(false);
        }
        self.link(child, None);
        Ok(true)
    }

    /// Detach the first child; `false` when there are no children
    pub fn remove_first_child(&mut self, parent: NodeId) -> SceneResult<bool> {
        match self.node(parent)?.children.first().copied() {
            Some(child) => self.remove_child(parent, child),
            None => Ok(false),
        }
    }

    /// Detach each listed child, returning how many were detached
    pub fn remove_children(&mut self, parent: NodeId, children: &[NodeId]) -> SceneResult<u32> {
        let mut removed = 0;
        for child in children {
            if self.remove_child(parent, *child)? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Detach all children
    pub fn clear_children(&mut self, parent: NodeId) -> SceneResult<()> {
        let children = std::mem::take(&mut self.node_mut(parent)?.children);
        for child in children {
            if let Some(node) = self.nodes.get_mut(child) {
                node.parent = None;
            }
        }
        Ok(())
    }

    /// Destroy a node together with its subtree, returning the number of removed nodes
    pub fn remove_node(&mut self, id: NodeId) -> SceneResult<usize> {
        self.node(id)?;
        self.link(id, None);

        let mut pending = vec![id];
        let mut removed = 0;
        while let Some(current) = pending.pop() {
            if let Some(node) = self.nodes.remove(current) {
                pending.extend(node.children);
                removed += 1;
                if self.active_camera == Some(current) {
                    self.active_camera = None;
                }
            }
        }

        log::debug!("Removed node {:?} and {} descendants", id, removed - 1);
        Ok(removed)
    }

    /// Copy a node without its parent link and children
    pub fn copy_node(&mut self, id: NodeId) -> SceneResult<NodeId> {
        let mut copy = self.node(id)?.clone();
        copy.parent = None;
        copy.children.clear();
        Ok(self.nodes.insert(copy))
    }

    // === Per-frame propagation ===

    /// Recompute final world matrices of `id` and its subtree from `base`
    ///
    /// Depth first: each node is resolved before any of its children, and a
    /// child's base is its parent's resulting matrix.
    pub fn update_transformation_base(&mut self, id: NodeId, base: &Mat4) -> SceneResult<()> {
        self.node(id)?;
        let mut pending = vec![(id, *base)];

        while let Some((current, base)) = pending.pop() {
            let node = self.node_mut(current)?;
            let world = base * node.transform.to_matrix();
            node.final_world_matrix = world;
            pending.extend(node.children.iter().rev().map(|child| (*child, world)));
        }

        Ok(())
    }

    /// Recompute `id`'s subtree starting from its parent's global matrix
    pub fn update_transformation(&mut self, id: NodeId) -> SceneResult<()> {
        let base = self.parent_global_matrix(id)?.unwrap_or_else(Mat4::identity);
        self.update_transformation_base(id, &base)
    }

    /// Recompute every node's final world matrix
    pub fn update_all(&mut self) {
        for id in self.top_level_nodes() {
            // Top-level handles come straight from the arena
            if let Err(err) = self.update_transformation_base(id, &Mat4::identity()) {
                log::warn!("Transform propagation stopped at {:?}: {}", id, err);
            }
        }
    }

    /// Store the local or global matrix as the final world matrix
    pub fn setup_transformation(&mut self, id: NodeId, is_global: bool) -> SceneResult<()> {
        let matrix = self.transform_matrix(id, is_global)?;
        self.node_mut(id)?.final_world_matrix = matrix;
        Ok(())
    }

    /// Override the final world matrix
    pub fn setup_world_matrix(&mut self, id: NodeId, matrix: Mat4) -> SceneResult<()> {
        self.node_mut(id)?.final_world_matrix = matrix;
        Ok(())
    }

    /// Final world matrix from the last propagation
    pub fn final_world_matrix(&self, id: NodeId) -> SceneResult<Mat4> {
        Ok(self.node(id)?.final_world_matrix)
    }

    /// Load the node's final world matrix into the renderer
    pub fn load_transformation(&self, id: NodeId, renderer: &mut dyn RenderCoordinator) -> SceneResult<()> {
        renderer.set_world_matrix(self.node(id)?.final_world_matrix);
        Ok(())
    }

    // === Visibility ===

    /// Show or hide a node
    pub fn set_visible(&mut self, id: NodeId, visible: bool) -> SceneResult<()> {
        self.node_mut(id)?.visible = visible;
        Ok(())
    }

    /// Visibility of the node, or of the node and its whole parent chain when `is_global`
    pub fn is_visible(&self, id: NodeId, is_global: bool) -> SceneResult<bool> {
        let node = self.node(id)?;
        if !node.visible {
            return Ok(false);
        }
        if !is_global {
            return Ok(true);
        }

        let mut current = node.parent;
        while let Some(parent_id) = current {
            let parent = self.node(parent_id)?;
            if !parent.visible {
                return Ok(false);
            }
            current = parent.parent;
        }
        Ok(true)
    }

    // === Animations ===

    /// Link an animation to a node
    pub fn add_animation(&mut self, id: NodeId, animation: AnimationId, name: impl Into<String>) -> SceneResult<()> {
        let node = self.node_mut(id)?;
        if !node.animations.iter().any(|link| link.id == animation) {
            node.animations.push(AnimationLink {
                id: animation,
                name: name.into(),
            });
        }
        Ok(())
    }

    /// Unlink an animation; `false` when it was not linked
    pub fn remove_animation(&mut self, id: NodeId, animation: AnimationId) -> SceneResult<bool> {
        let node = self.node_mut(id)?;
        let before = node.animations.len();
        node.animations.retain(|link| link.id != animation);
        Ok(node.animations.len() != before)
    }

    /// Unlink all animations
    pub fn clear_animations(&mut self, id: NodeId) -> SceneResult<()> {
        self.node_mut(id)?.animations.clear();
        Ok(())
    }

    /// Linked animation with the given name
    pub fn find_animation(&self, id: NodeId, name: &str) -> SceneResult<Option<AnimationId>> {
        Ok(self
            .node(id)?
            .animations
            .iter()
            .find(|link| link.name == name)
            .map(|link| link.id))
    }

    /// Linked animation by index
    pub fn animation(&self, id: NodeId, index: usize) -> SceneResult<Option<AnimationId>> {
        Ok(self.node(id)?.animations.get(index).map(|link| link.id))
    }

    /// Number of linked animations
    pub fn animation_count(&self, id: NodeId) -> SceneResult<usize> {
        Ok(self.node(id)?.animations.len())
    }

    // === Cameras and lights ===

    /// Camera used for rendering
    pub fn active_camera(&self) -> Option<NodeId> {
        self.active_camera
    }

    /// Select the rendering camera
    pub fn set_active_camera(&mut self, camera: Option<NodeId>) -> SceneResult<()> {
        if let Some(id) = camera {
            if self.node(id)?.camera().is_none() {
                return Err(SceneError::NotACamera(id));
            }
        }
        self.active_camera = camera;
        Ok(())
    }

    /// Enabled, globally visible point lights with world-space position and radius
    pub fn point_lights(&self) -> SceneResult<Vec<CollectedLight>> {
        let mut lights = Vec::new();
        for (id, node) in &self.nodes {
            let Some(light) = node.light() else { continue };
            if !light.enabled || !self.is_visible(id, true)? {
                continue;
            }
            let position = self.global_matrix(id)?.translation_part();
            lights.push(CollectedLight {
                node: id,
                sphere: position.push(light.radius),
                color: light.color,
            });
        }
        Ok(lights)
    }

    /// Globally visible nodes whose world bounding volume touches a sphere
    pub fn visible_nodes_in_sphere(&self, center: &Vec3, radius: f32) -> SceneResult<Vec<NodeId>> {
        let mut found = Vec::new();
        for (id, node) in &self.nodes {
            if node.bounding.is_empty() || !self.is_visible(id, true)? {
                continue;
            }
            let world = node.bounding.transformed(&self.global_matrix(id)?);
            if world.intersects_sphere(center, radius) {
                found.push(id);
            }
        }
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::constants::PI;
    use crate::scene::bounding::BoundingVolume;
    use approx::assert_relative_eq;

    #[test]
    fn test_global_position_through_parent() {
        let mut graph = SceneGraph::new();
        let parent = graph.create_node(NodeType::Basic);
        let child = graph.create_node(NodeType::Mesh);
        graph.add_child(parent, child).unwrap();

        graph.set_position(parent, Vec3::new(10.0, 0.0, 0.0), false).unwrap();
        graph.set_position(child, Vec3::new(0.0, 1.0, 0.0), false).unwrap();

        assert_relative_eq!(graph.position(child, true).unwrap(), Vec3::new(10.0, 1.0, 0.0));
        assert_relative_eq!(graph.position(child, false).unwrap(), Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_set_global_position_under_rotated_parent() {
        let mut graph = SceneGraph::new();
        let parent = graph.create_node(NodeType::Basic);
        let child = graph.create_node(NodeType::Basic);
        graph.add_child(parent, child).unwrap();
        graph.set_rotation(parent, Quat::from_axis_angle(&Vec3::y_axis(), PI / 2.0), false).unwrap();
        graph.set_scale(parent, Vec3::new(2.0, 2.0, 2.0), false).unwrap();

        graph.set_position(child, Vec3::new(3.0, 4.0, 5.0), true).unwrap();
        graph.set_scale(child, Vec3::new(1.0, 1.0, 1.0), true).unwrap();

        assert_relative_eq!(graph.position(child, true).unwrap(), Vec3::new(3.0, 4.0, 5.0), epsilon = 1e-5);
        assert_relative_eq!(graph.scale(child, true).unwrap(), Vec3::new(1.0, 1.0, 1.0), epsilon = 1e-5);
        assert_relative_eq!(graph.scale(child, false).unwrap(), Vec3::new(0.5, 0.5, 0.5), epsilon = 1e-5);
    }

    #[test]
    fn test_set_global_rotation() {
        let mut graph = SceneGraph::new();
        let parent = graph.create_node(NodeType::Basic);
        let child = graph.create_node(NodeType::Basic);
        graph.add_child(parent, child).unwrap();
        graph.set_rotation(parent, Quat::from_axis_angle(&Vec3::x_axis(), 0.7), false).unwrap();

        let target = Quat::from_axis_angle(&Vec3::z_axis(), 0.3);
        graph.set_rotation(child, target, true).unwrap();

        assert!(graph.rotation(child, true).unwrap().angle_to(&target) < 1e-4);
    }

    #[test]
    fn test_cycle_rejected() {
        let mut graph = SceneGraph::new();
        let a = graph.create_node(NodeType::Basic);
        let b = graph.create_node(NodeType::Basic);
        let c = graph.create_node(NodeType::Basic);
        graph.add_child(a, b).unwrap();
        graph.add_child(b, c).unwrap();

        assert!(matches!(graph.add_child(c, a), Err(SceneError::CycleDetected { .. })));
        assert!(matches!(graph.set_parent(a, Some(a), true), Err(SceneError::CycleDetected { .. })));
        assert_eq!(graph.node(a).unwrap().parent(), None);
    }

    #[test]
    fn test_reparent_moves_between_child_lists() {
        let mut graph = SceneGraph::new();
        let first = graph.create_node(NodeType::Basic);
        let second = graph.create_node(NodeType::Basic);
        let child = graph.create_node(NodeType::Basic);

        graph.add_child(first, child).unwrap();
        graph.add_child(second, child).unwrap();

        assert!(graph.node(first).unwrap().children().is_empty());
        assert_eq!(graph.node(second).unwrap().children(), &[child]);
        assert_eq!(graph.node(child).unwrap().parent(), Some(second));
    }

    #[test]
    fn test_remove_node_destroys_subtree() {
        let mut graph = SceneGraph::new();
        let root = graph.create_node(NodeType::Basic);
        let middle = graph.create_node(NodeType::Basic);
        let leaf = graph.create_node(NodeType::Basic);
        let other = graph.create_node(NodeType::Basic);
        graph.add_child(root, middle).unwrap();
        graph.add_child(middle, leaf).unwrap();
        graph.add_child(root, other).unwrap();

        assert_eq!(graph.remove_node(middle).unwrap(), 2);
        assert!(!graph.contains(leaf));
        assert_eq!(graph.node(root).unwrap().children(), &[other]);
    }

    #[test]
    fn test_update_transformation_base_propagates() {
        let mut graph = SceneGraph::new();
        let parent = graph.create_node(NodeType::Basic);
        let child = graph.create_node(NodeType::Basic);
        graph.add_child(parent, child).unwrap();
        graph.set_position(parent, Vec3::new(1.0, 0.0, 0.0), false).unwrap();
        graph.set_position(child, Vec3::new(0.0, 2.0, 0.0), false).unwrap();

        let base = Mat4::new_translation(&Vec3::new(0.0, 0.0, 5.0));
        graph.update_transformation_base(parent, &base).unwrap();

        let world = graph.final_world_matrix(child).unwrap();
        assert_relative_eq!(world.translation_part(), Vec3::new(1.0, 2.0, 5.0));
    }

    #[test]
    fn test_global_visibility_follows_parents() {
        let mut graph = SceneGraph::new();
        let parent = graph.create_node(NodeType::Basic);
        let child = graph.create_node(NodeType::Basic);
        graph.add_child(parent, child).unwrap();
        graph.set_visible(parent, false).unwrap();

        assert!(graph.is_visible(child, false).unwrap());
        assert!(!graph.is_visible(child, true).unwrap());
    }

    #[test]
    fn test_animation_links() {
        let mut graph = SceneGraph::new();
        let node = graph.create_node(NodeType::Mesh);
        graph.add_animation(node, AnimationId(7), "walk").unwrap();
        graph.add_animation(node, AnimationId(9), "run").unwrap();
        graph.add_animation(node, AnimationId(7), "walk").unwrap();

        assert_eq!(graph.animation_count(node).unwrap(), 2);
        assert_eq!(graph.find_animation(node, "run").unwrap(), Some(AnimationId(9)));
        assert!(graph.remove_animation(node, AnimationId(7)).unwrap());
        assert!(!graph.remove_animation(node, AnimationId(7)).unwrap());
        assert_eq!(graph.animation(node, 0).unwrap(), Some(AnimationId(9)));

        graph.clear_animations(node).unwrap();
        assert_eq!(graph.animation_count(node).unwrap(), 0);
    }

    #[test]
    fn test_look_at_points_forward_axis() {
        let mut graph = SceneGraph::new();
        let node = graph.create_node(NodeType::Camera);
        graph.set_position(node, Vec3::new(0.0, 0.0, -10.0), true).unwrap();
        graph.look_at(node, Vec3::new(10.0, 0.0, -10.0), true).unwrap();

        let forward = graph.rotation(node, true).unwrap() * FORWARD;
        assert_relative_eq!(forward, Vec3::new(1.0, 0.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn test_copy_node_is_detached() {
        let mut graph = SceneGraph::new();
        let parent = graph.create_node(NodeType::Basic);
        let child = graph.create_node(NodeType::Mesh);
        graph.add_child(parent, child).unwrap();
        graph.node_mut(child).unwrap().set_name("crate");

        let copy = graph.copy_node(child).unwrap();
        let copied = graph.node(copy).unwrap();
        assert_eq!(copied.name(), "crate");
        assert_eq!(copied.parent(), None);
        assert_eq!(graph.node(parent).unwrap().children(), &[child]);
    }

    #[test]
    fn test_point_lights_skips_disabled_and_hidden() {
        let mut graph = SceneGraph::new();
        let lit = graph.create_light(PointLight::new(Vec3::new(1.0, 0.0, 0.0), 4.0));
        let off = graph.create_light(PointLight::new(Vec3::new(0.0, 1.0, 0.0), 4.0));
        let hidden = graph.create_light(PointLight::new(Vec3::new(0.0, 0.0, 1.0), 4.0));
        graph.node_mut(off).unwrap().light_mut().unwrap().enabled = false;
        graph.set_visible(hidden, false).unwrap();
        graph.set_position(lit, Vec3::new(1.0, 2.0, 3.0), true).unwrap();

        let lights = graph.point_lights().unwrap();
        assert_eq!(lights.len(), 1);
        assert_eq!(lights[0].node, lit);
        assert_relative_eq!(lights[0].sphere, crate::foundation::math::Vec4::new(1.0, 2.0, 3.0, 4.0));
    }

    #[test]
    fn test_visible_nodes_in_sphere_uses_world_bounds() {
        let mut graph = SceneGraph::new();
        let near = graph.create_node(NodeType::Mesh);
        let far = graph.create_node(NodeType::Mesh);
        for id in [near, far] {
            graph.node_mut(id).unwrap().set_bounding_volume(BoundingVolume::sphere(Vec3::zeros(), 1.0));
        }
        graph.set_position(far, Vec3::new(100.0, 0.0, 0.0), false).unwrap();

        assert_eq!(graph.visible_nodes_in_sphere(&Vec3::new(1.5, 0.0, 0.0), 1.0).unwrap(), vec![near]);
    }

    #[test]
    fn test_active_camera_must_be_camera() {
        let mut graph = SceneGraph::new();
        let mesh = graph.create_node(NodeType::Mesh);
        let camera = graph.create_camera(Camera::default());

        assert_eq!(graph.active_camera(), Some(camera));
        assert!(matches!(graph.set_active_camera(Some(mesh)), Err(SceneError::NotACamera(_))));

        graph.remove_node(camera).unwrap();
        assert_eq!(graph.active_camera(), None);
    }
}
