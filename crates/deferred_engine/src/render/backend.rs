//! Backend abstraction traits for the deferred pipeline
//!
//! The renderer proper (device, swapchain, draw submission) lives outside
//! this crate. These traits are the capabilities the scene graph, light grid
//! and shader binder need from it.

use std::sync::Arc;

use crate::foundation::math::Mat4;
use crate::render::light_grid::ComputeDevice;

/// Matrix state and optional compute capability of the active renderer
pub trait RenderCoordinator {
    /// Current view matrix
    fn view_matrix(&self) -> Mat4;

    /// Current projection matrix
    fn projection_matrix(&self) -> Mat4;

    /// Current world matrix
    fn world_matrix(&self) -> Mat4;

    /// Current texture matrix
    fn texture_matrix(&self) -> Mat4 {
        Mat4::identity()
    }

    /// Replace the current world matrix
    fn set_world_matrix(&mut self, matrix: Mat4);

    /// World-view-projection matrix for the current state
    fn setup_wvp_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix() * self.world_matrix()
    }

    /// Compute device for the light grid, when the backend has one
    fn compute_device(&self) -> Option<Arc<dyn ComputeDevice>> {
        None
    }
}

/// Render coordinator without a GPU, holding plain matrices
///
/// Used by tools and tests that run the scene and light-grid passes without a
/// device.
#[derive(Debug, Clone)]
pub struct HeadlessCoordinator {
    /// View matrix
    pub view: Mat4,
    /// Projection matrix
    pub projection: Mat4,
    /// World matrix
    pub world: Mat4,
    /// Texture matrix
    pub texture: Mat4,
    compute: Option<Arc<dyn ComputeDevice>>,
}

impl HeadlessCoordinator {
    /// Coordinator with identity matrices and no compute device
    pub fn new() -> Self {
        Self {
            view: Mat4::identity(),
            projection: Mat4::identity(),
            world: Mat4::identity(),
            texture: Mat4::identity(),
            compute: None,
        }
    }

    /// Offer a compute device to the light grid
    pub fn with_compute_device(mut self, device: Arc<dyn ComputeDevice>) -> Self {
        self.compute = Some(device);
        self
    }
}

impl Default for HeadlessCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderCoordinator for HeadlessCoordinator {
    fn view_matrix(&self) -> Mat4 {
        self.view
    }

    fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    fn world_matrix(&self) -> Mat4 {
        self.world
    }

    fn texture_matrix(&self) -> Mat4 {
        self.texture
    }

    fn set_world_matrix(&mut self, matrix: Mat4) {
        self.world = matrix;
    }

    fn compute_device(&self) -> Option<Arc<dyn ComputeDevice>> {
        self.compute.clone()
    }
}

/// GPU resources the light grid exposes to shaders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Per-tile `{ offset, count }` table
    LightGridCells,
    /// Flat tile light index list
    TileLightIndices,
}

/// Binds shader-visible resources to numbered slots
pub trait ResourceBinder {
    /// Bind a resource at `slot`
    fn bind_resource(&mut self, slot: u32, resource: ResourceKind);

    /// Clear the resource at `slot`
    fn unbind_resource(&mut self, slot: u32);
}

/// Resource binder that records slot assignments
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SlotTable {
    slots: std::collections::BTreeMap<u32, ResourceKind>,
}

impl SlotTable {
    /// Empty slot table
    pub fn new() -> Self {
        Self::default()
    }

    /// Resource bound at `slot`
    pub fn get(&self, slot: u32) -> Option<ResourceKind> {
        self.slots.get(&slot).copied()
    }

    /// Number of occupied slots
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True when nothing is bound
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl ResourceBinder for SlotTable {
    fn bind_resource(&mut self, slot: u32, resource: ResourceKind) {
        self.slots.insert(slot, resource);
    }

    fn unbind_resource(&mut self, slot: u32) {
        self.slots.remove(&slot);
    }
}
