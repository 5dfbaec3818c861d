//! Specialized collection types

pub use slotmap::SlotMap;

slotmap::new_key_type! {
    /// Stable handle of a scene node inside a [`crate::scene::SceneGraph`]
    ///
    /// Handles stay valid until the node is removed and are never reused for
    /// another node, so a stale parent index can be detected instead of
    /// dereferenced.
    pub struct NodeId;
}

/// Handle-based arena of scene nodes
pub type NodeArena<T> = SlotMap<NodeId, T>;
