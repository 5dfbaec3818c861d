//! Tiled light culling
//!
//! The screen is split into [`TILE_SIZE`]-pixel tiles. For every tile the
//! grid records which point lights may touch it, as a per-tile
//! `{ offset, count }` cell (the light grid) into one flat index list (the
//! tile light-index list). Deferred lighting shaders read both to shade each
//! pixel with only the lights of its tile.
//!
//! ## Strategies
//!
//! The build strategy is chosen once when the grid is constructed:
//!
//! - [`BuildStrategy::Cpu`]: sequential scan with compacted output
//! - [`BuildStrategy::Compute`]: two dispatches on a [`ComputeDevice`] with
//!   fixed-stride output
//!
//! Both produce the same set of lights per tile for the same inputs.

mod compute;
mod cpu;
mod tile;

use std::sync::Arc;

use thiserror::Error;

use crate::core::config::LightGridConfig;
use crate::foundation::collections::NodeId;
use crate::foundation::math::{Mat4, Vec4};
use crate::render::backend::{ResourceBinder, ResourceKind};
use crate::render::constant_buffers::{LightGridCell, LightNode};
use crate::render::depth::DepthTexture;
use crate::scene::{CameraState, SceneError, SceneGraph};

pub use compute::{ComputeDevice, ComputeError, Invocation, Kernel, SoftwareComputeDevice};
pub use tile::{compute_num_tiles, tile_pixel_rect, TileFrustum, TILE_SIZE};

use compute::{ComputeBuffers, ComputePass};

/// Light grid errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LightGridError {
    /// The grid has not been created, or was deleted
    #[error("Light grid has not been created")]
    NotCreated,

    /// A resolution axis is zero
    #[error("Invalid light grid resolution {0}x{1}")]
    InvalidResolution(u32, u32),

    /// Zero light capacity
    #[error("Light grid capacity must be at least one light")]
    InvalidCapacity,

    /// Storage could not be reserved
    #[error("Failed to allocate light grid {0}")]
    Allocation(&'static str),

    /// More lights than the grid was created for
    #[error("{requested} lights exceed the light grid capacity of {max}")]
    CapacityExceeded {
        /// Requested light count
        requested: u32,
        /// Grid capacity
        max: u32,
    },

    /// The light list holds fewer entries than the requested count
    #[error("Light list holds {available} entries, {requested} requested")]
    LightListTooShort {
        /// Requested light count
        requested: u32,
        /// Entries in the list
        available: usize,
    },

    /// The camera node does not exist
    #[error("Camera node {0:?} does not exist")]
    CameraMissing(NodeId),

    /// Camera state could not be resolved
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    /// The compute device failed a dispatch
    #[error("Compute error: {0}")]
    Compute(#[from] ComputeError),
}

/// Light grid result type
pub type LightGridResult<T> = Result<T, LightGridError>;

/// How the grid is built
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStrategy {
    /// Sequential CPU scan
    Cpu,
    /// Dispatches on the compute device
    Compute,
}

/// Per-tile light lists produced by a build
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TileLightIndices {
    /// One cell per tile, row-major
    pub cells: Vec<LightGridCell>,
    /// Light indices referenced by the cells
    pub indices: Vec<u32>,
}

/// Tile light lists as singly linked lists
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkedTileLights {
    /// First node of each tile, or [`LightNode::END`]
    pub heads: Vec<u32>,
    /// List nodes
    pub nodes: Vec<LightNode>,
}

impl TileLightIndices {
    /// Light indices of a tile by linear index
    pub fn tile(&self, index: usize) -> Option<&[u32]> {
        let cell = self.cells.get(index)?;
        let start = cell.offset as usize;
        self.indices.get(start..start + cell.count as usize)
    }

    /// Sum of all tile counts
    pub fn total_count(&self) -> usize {
        self.cells.iter().map(|cell| cell.count as usize).sum()
    }

    /// Same lists in linked-list form
    pub fn to_linked_list(&self) -> LinkedTileLights {
        let mut linked = LinkedTileLights {
            heads: Vec::with_capacity(self.cells.len()),
            nodes: Vec::with_capacity(self.total_count()),
        };

        for index in 0..self.cells.len() {
            let lights = self.tile(index).unwrap_or_default();
            if lights.is_empty() {
                linked.heads.push(LightNode::END);
                continue;
            }

            let head = linked.nodes.len() as u32;
            linked.heads.push(head);
            for (position, light_id) in lights.iter().enumerate() {
                let next = if position + 1 < lights.len() {
                    head + position as u32 + 1
                } else {
                    LightNode::END
                };
                linked.nodes.push(LightNode { light_id: *light_id, next });
            }
        }

        linked
    }
}

/// Tile-based light culling structure
#[derive(Debug)]
pub struct LightGrid {
    strategy: BuildStrategy,
    device: Option<Arc<dyn ComputeDevice>>,
    compute_lanes: u32,
    resolution: (u32, u32),
    num_tiles: (u32, u32),
    max_lights: u32,
    max_lights_per_tile: Option<u32>,
    lights: Vec<Vec4>,
    num_lights: u32,
    frusta: Vec<TileFrustum>,
    result: TileLightIndices,
    buffers: Option<ComputeBuffers>,
    created: bool,
    built: bool,
}

impl LightGrid {
    /// Grid using the compute strategy when a device is given
    pub fn new(device: Option<Arc<dyn ComputeDevice>>) -> Self {
        let strategy = match &device {
            Some(device) => {
                log::info!("Light grid using compute device '{}'", device.label());
                BuildStrategy::Compute
            }
            None => {
                log::info!("No compute device available, light grid built on the CPU");
                BuildStrategy::Cpu
            }
        };
        let compute_lanes = device.as_ref().map_or(1, |device| device.max_lanes().max(1));

        Self {
            strategy,
            device,
            compute_lanes,
            resolution: (0, 0),
            num_tiles: (0, 0),
            max_lights: 0,
            max_lights_per_tile: None,
            lights: Vec::new(),
            num_lights: 0,
            frusta: Vec::new(),
            result: TileLightIndices::default(),
            buffers: None,
            created: false,
            built: false,
        }
    }

    /// Create a grid from configuration
    pub fn from_config(config: &LightGridConfig, device: Option<Arc<dyn ComputeDevice>>) -> LightGridResult<Self> {
        let device = device.filter(|_| config.prefer_compute);
        let mut grid = Self::new(device);
        grid.max_lights_per_tile = config.max_lights_per_tile;
        if let Some(device) = &grid.device {
            grid.compute_lanes = config.compute_lanes.clamp(1, device.max_lanes().max(1));
        }
        grid.create_grid(config.resolution, config.max_lights)?;
        Ok(grid)
    }

    /// Tiles covering a resolution
    pub fn compute_num_tiles(resolution: (u32, u32)) -> (u32, u32) {
        tile::compute_num_tiles(resolution)
    }

    /// Allocate storage for `max_lights` lights at `resolution`
    ///
    /// On failure the grid is left not created and the call may be retried.
    pub fn create_grid(&mut self, resolution: (u32, u32), max_lights: u32) -> LightGridResult<()> {
        if resolution.0 == 0 || resolution.1 == 0 {
            return Err(LightGridError::InvalidResolution(resolution.0, resolution.1));
        }
        if max_lights == 0 {
            return Err(LightGridError::InvalidCapacity);
        }

        self.delete_grid();
        self.resolution = resolution;
        self.num_tiles = tile::compute_num_tiles(resolution);
        self.max_lights = max_lights;

        if let Err(err) = self.allocate() {
            self.delete_grid();
            return Err(err);
        }

        self.created = true;
        log::debug!(
            "Created light grid {}x{} ({}x{} tiles, {} lights, {} per tile, {:?})",
            resolution.0,
            resolution.1,
            self.num_tiles.0,
            self.num_tiles.1,
            self.max_lights,
            self.tile_capacity(),
            self.strategy
        );
        Ok(())
    }

    fn allocate(&mut self) -> LightGridResult<()> {
        let tiles = self.tile_count();
        let capacity = self.tile_capacity();
        let index_slots = tiles
            .checked_mul(capacity as usize)
            .ok_or(LightGridError::Allocation("tile light-index list"))?;

        self.lights
            .try_reserve_exact(self.max_lights as usize)
            .map_err(|_| LightGridError::Allocation("light list"))?;
        self.frusta
            .try_reserve_exact(tiles)
            .map_err(|_| LightGridError::Allocation("tile frusta"))?;
        self.result
            .cells
            .try_reserve_exact(tiles)
            .map_err(|_| LightGridError::Allocation("light grid cells"))?;
        self.result
            .indices
            .try_reserve_exact(index_slots)
            .map_err(|_| LightGridError::Allocation("tile light-index list"))?;

        if self.strategy == BuildStrategy::Compute {
            if let Some(device) = &self.device {
                match ComputeBuffers::create(device.as_ref(), tiles, capacity, self.max_lights) {
                    Ok(buffers) => self.buffers = Some(buffers),
                    Err(err) => {
                        log::warn!("Compute light grid unavailable ({}), falling back to CPU", err);
                        self.strategy = BuildStrategy::Cpu;
                    }
                }
            }
        }

        Ok(())
    }

    /// Release all storage
    pub fn delete_grid(&mut self) {
        self.lights = Vec::new();
        self.frusta = Vec::new();
        self.result = TileLightIndices::default();
        self.buffers = None;
        self.num_lights = 0;
        self.created = false;
        self.built = false;
    }

    /// Change the resolution, keeping the current lights
    ///
    /// Previous build results are discarded until the next [`build`](Self::build).
    /// A rejected resolution leaves the grid untouched.
    pub fn set_resolution(&mut self, resolution: (u32, u32)) -> LightGridResult<()> {
        if resolution.0 == 0 || resolution.1 == 0 {
            return Err(LightGridError::InvalidResolution(resolution.0, resolution.1));
        }
        if !self.created {
            self.resolution = resolution;
            self.num_tiles = tile::compute_num_tiles(resolution);
            return Ok(());
        }

        let lights = std::mem::take(&mut self.lights);
        let num_lights = self.num_lights;
        self.create_grid(resolution, self.max_lights)?;
        self.lights.extend_from_slice(&lights);
        self.num_lights = num_lights;
        Ok(())
    }

    /// Copy the first `num_lights` lights (xyz position, w radius)
    ///
    /// Rejects counts above the grid capacity or the list length instead of
    /// truncating.
    pub fn update_lights(&mut self, lights: &[Vec4], num_lights: u32) -> LightGridResult<()> {
        if !self.created {
            return Err(LightGridError::NotCreated);
        }
        if num_lights > self.max_lights {
            return Err(LightGridError::CapacityExceeded {
                requested: num_lights,
                max: self.max_lights,
            });
        }
        let Some(lights) = lights.get(..num_lights as usize) else {
            return Err(LightGridError::LightListTooShort {
                requested: num_lights,
                available: lights.len(),
            });
        };

        self.lights.clear();
        self.lights.extend_from_slice(lights);
        self.num_lights = num_lights;
        Ok(())
    }

    /// Cull the current lights for the view of `camera`
    ///
    /// The depth texture, when given, narrows every tile to the depth range
    /// of its texels; without it tiles span the camera's near to far range.
    /// A failed build keeps the previous result.
    pub fn build(&mut self, graph: &SceneGraph, camera: NodeId, depth: Option<&DepthTexture>) -> LightGridResult<()> {
        if !self.created {
            return Err(LightGridError::NotCreated);
        }
        if !graph.contains(camera) {
            return Err(LightGridError::CameraMissing(camera));
        }

        let state = CameraState::from_graph(graph, camera)?;
        let view_lights = self.view_space_lights(&state.view_matrix);
        let projection = state.projection_lh();
        let capacity = self.tile_capacity();

        match (self.strategy, self.device.clone(), self.buffers.as_ref()) {
            (BuildStrategy::Compute, Some(device), Some(buffers)) => {
                let pass = ComputePass {
                    device: device.as_ref(),
                    lanes: self.compute_lanes,
                    num_tiles: self.num_tiles,
                    resolution: self.resolution,
                    depth,
                };
                let depth_ranges = pass.init(buffers)?;
                let frusta = self.tile_frusta(&state, &projection, |tile, _| {
                    depth_ranges.as_ref().and_then(|ranges| ranges.get(tile).copied())
                });
                let mut result = TileLightIndices {
                    cells: Vec::with_capacity(self.result.cells.capacity()),
                    indices: Vec::with_capacity(self.result.indices.capacity()),
                };
                pass.cull(buffers, &frusta, &view_lights, &mut result)?;
                self.frusta = frusta;
                self.result = result;
            }
            _ => {
                let resolution = self.resolution;
                let frusta = self.tile_frusta(&state, &projection, |_, pixels| {
                    depth.map(|depth| depth.tile_depth_range(pixels, resolution))
                });
                cpu::cull(&frusta, &view_lights, capacity, &mut self.result);
                self.frusta = frusta;
            }
        }

        self.built = true;
        log::trace!(
            "Light grid built: {} lights, {} tile entries",
            self.num_lights,
            self.result.total_count()
        );
        Ok(())
    }

    fn view_space_lights(&self, view: &Mat4) -> Vec<Vec4> {
        self.lights
            .iter()
            .map(|light| {
                let center = view.transform_point(&light.xyz().into());
                Vec4::new(center.x, center.y, center.z, light.w)
            })
            .collect()
    }

    /// Frustum of every tile, row-major
    ///
    /// `raw_depth` yields a tile's stored `[0, 1]` depth range, if known.
    fn tile_frusta(
        &self,
        state: &CameraState,
        projection: &Mat4,
        raw_depth: impl Fn(usize, [u32; 4]) -> Option<(f32, f32)>,
    ) -> Vec<TileFrustum> {
        let camera = &state.camera;
        let mut frusta = Vec::with_capacity(self.tile_count());

        for ty in 0..self.num_tiles.1 {
            for tx in 0..self.num_tiles.0 {
                let index = (ty * self.num_tiles.0 + tx) as usize;
                let pixels = tile_pixel_rect((tx, ty), self.resolution);
                let z_range = match raw_depth(index, pixels) {
                    Some((min, max)) => (camera.linearize_depth(min), camera.linearize_depth(max)),
                    None => (camera.near, camera.far),
                };
                frusta.push(TileFrustum::new((tx, ty), self.resolution, projection, z_range));
            }
        }

        frusta
    }

    /// Bind the grid cells at `base` and the index list at `base + 1`
    ///
    /// Returns the next free slot.
    pub fn bind(&self, base: u32, binder: &mut dyn ResourceBinder) -> u32 {
        binder.bind_resource(base, ResourceKind::LightGridCells);
        binder.bind_resource(base + 1, ResourceKind::TileLightIndices);
        base + 2
    }

    /// Clear the slots taken by [`bind`](Self::bind)
    pub fn unbind(&self, base: u32, binder: &mut dyn ResourceBinder) -> u32 {
        binder.unbind_resource(base);
        binder.unbind_resource(base + 1);
        base + 2
    }

    /// Tiles per axis
    pub fn num_tiles(&self) -> (u32, u32) {
        self.num_tiles
    }

    fn tile_count(&self) -> usize {
        self.num_tiles.0 as usize * self.num_tiles.1 as usize
    }

    /// Tiles per row, as consumed by the deferred shader
    pub fn row_size(&self) -> u32 {
        self.num_tiles.0
    }

    /// Screen resolution
    pub fn resolution(&self) -> (u32, u32) {
        self.resolution
    }

    /// Lights uploaded by the last [`update_lights`](Self::update_lights)
    pub fn num_lights(&self) -> u32 {
        self.num_lights
    }

    /// Current lights
    pub fn lights(&self) -> &[Vec4] {
        &self.lights
    }

    /// Light capacity
    pub fn max_lights(&self) -> u32 {
        self.max_lights
    }

    /// Slots reserved for each tile
    pub fn tile_capacity(&self) -> u32 {
        self.max_lights_per_tile
            .map_or(self.max_lights, |per_tile| per_tile.min(self.max_lights))
    }

    /// Active build strategy
    pub fn strategy(&self) -> BuildStrategy {
        self.strategy
    }

    /// True when builds run on the compute device
    pub fn uses_compute(&self) -> bool {
        self.strategy == BuildStrategy::Compute
    }

    /// True between a successful `create_grid` and `delete_grid`
    pub fn is_created(&self) -> bool {
        self.created
    }

    /// True when the result matches the current resolution
    pub fn is_built(&self) -> bool {
        self.built
    }

    /// Light indices of tile `(x, y)` from the last build
    pub fn tile_lights(&self, x: u32, y: u32) -> Option<&[u32]> {
        if !self.built || x >= self.num_tiles.0 || y >= self.num_tiles.1 {
            return None;
        }
        self.result.tile((y * self.num_tiles.0 + x) as usize)
    }

    /// Result of the last build
    pub fn result(&self) -> Option<&TileLightIndices> {
        self.built.then_some(&self.result)
    }

    /// Tile frusta of the last build
    pub fn frusta(&self) -> &[TileFrustum] {
        &self.frusta
    }
}
