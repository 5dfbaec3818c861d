//! Compute-dispatch light culling
//!
//! The light grid is built in three dispatches of one work group per tile:
//!
//! 1. **init**: lane 0 resets the tile's light counter, the lanes clear the
//!    tile's survivor mask and fold a stripe of the tile's depth texels into
//!    the tile's atomic min/max depth.
//! 2. **cull**: lane `i` tests lights `i, i + lanes, ...` against the tile
//!    frustum and marks survivors with `fetch_or` in the tile's mask.
//! 3. **compact**: a single lane per tile walks the mask in light order and
//!    writes the first `tile_capacity` survivors, so a crowded tile keeps
//!    the same lights as the sequential path and never writes into its
//!    neighbour's range.
//!
//! Tile ranges use a fixed stride of `tile_capacity` slots.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use rayon::prelude::*;
use thiserror::Error;

use crate::foundation::math::Vec4;
use crate::render::constant_buffers::LightGridCell;
use crate::render::depth::DepthTexture;
use crate::render::light_grid::tile::{tile_pixel_rect, TileFrustum};
use crate::render::light_grid::TileLightIndices;

/// Compute device errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ComputeError {
    /// Buffer larger than the device accepts
    #[error("Compute buffer of {requested} bytes exceeds the device limit of {limit} bytes")]
    BufferTooLarge {
        /// Requested size in bytes
        requested: usize,
        /// Device limit in bytes
        limit: usize,
    },

    /// Work group wider than the device supports
    #[error("Work group of {requested} lanes exceeds the device maximum of {max}")]
    TooManyLanes {
        /// Requested lanes per group
        requested: u32,
        /// Supported lanes per group
        max: u32,
    },

    /// Dispatch with no groups or no lanes
    #[error("Empty dispatch")]
    EmptyDispatch,
}

/// One kernel invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Invocation {
    /// Work group coordinates
    pub group: [u32; 2],
    /// Lane within the group
    pub lane: u32,
}

/// Kernel executed once per invocation
pub type Kernel<'a> = dyn Fn(Invocation) + Sync + 'a;

/// A device able to run light-culling dispatches
///
/// `dispatch` returns only after every invocation has finished.
pub trait ComputeDevice: Send + Sync + fmt::Debug {
    /// Device name for logs
    fn label(&self) -> &str;

    /// Maximum invocations per work group
    fn max_lanes(&self) -> u32;

    /// Reserve device memory for a buffer of `bytes`
    fn allocate(&self, bytes: usize) -> Result<(), ComputeError>;

    /// Run `kernel` for `groups[0] * groups[1]` work groups of `lanes` invocations
    fn dispatch(&self, groups: [u32; 2], lanes: u32, kernel: &Kernel<'_>) -> Result<(), ComputeError>;
}

/// Compute device running work groups on the rayon thread pool
#[derive(Debug, Clone)]
pub struct SoftwareComputeDevice {
    max_lanes: u32,
    max_buffer_bytes: usize,
}

impl SoftwareComputeDevice {
    /// Device with 64-lane groups and a 256 MiB buffer limit
    pub fn new() -> Self {
        Self {
            max_lanes: 64,
            max_buffer_bytes: 256 * 1024 * 1024,
        }
    }

    /// Set the maximum work group width
    pub fn with_max_lanes(mut self, max_lanes: u32) -> Self {
        self.max_lanes = max_lanes;
        self
    }

    /// Set the largest buffer the device accepts
    pub fn with_max_buffer_bytes(mut self, bytes: usize) -> Self {
        self.max_buffer_bytes = bytes;
        self
    }
}

impl Default for SoftwareComputeDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl ComputeDevice for SoftwareComputeDevice {
    fn label(&self) -> &str {
        "software (rayon)"
    }

    fn max_lanes(&self) -> u32 {
        self.max_lanes
    }

    fn allocate(&self, bytes: usize) -> Result<(), ComputeError> {
        if bytes > self.max_buffer_bytes {
            return Err(ComputeError::BufferTooLarge {
                requested: bytes,
                limit: self.max_buffer_bytes,
            });
        }
        Ok(())
    }

    fn dispatch(&self, groups: [u32; 2], lanes: u32, kernel: &Kernel<'_>) -> Result<(), ComputeError> {
        if groups[0] == 0 || groups[1] == 0 || lanes == 0 {
            return Err(ComputeError::EmptyDispatch);
        }
        if lanes > self.max_lanes {
            return Err(ComputeError::TooManyLanes {
                requested: lanes,
                max: self.max_lanes,
            });
        }

        let width = groups[0];
        (0..groups[0] * groups[1]).into_par_iter().for_each(|group| {
            let group = [group % width, group / width];
            (0..lanes)
                .into_par_iter()
                .for_each(|lane| kernel(Invocation { group, lane }));
        });
        Ok(())
    }
}

/// Device-side state of the compute strategy
#[derive(Debug)]
pub(crate) struct ComputeBuffers {
    counters: Vec<AtomicU32>,
    depth_min: Vec<AtomicU32>,
    depth_max: Vec<AtomicU32>,
    survivors: Vec<AtomicU32>,
    mask_words: usize,
    slots: Vec<AtomicU32>,
    capacity: u32,
}

impl ComputeBuffers {
    /// 32-bit words in one tile's survivor mask
    fn mask_words(max_lights: u32) -> usize {
        max_lights.div_ceil(32) as usize
    }

    /// Bytes the device must hold for a grid of `tiles` tiles
    pub(crate) fn byte_size(tiles: usize, capacity: u32, max_lights: u32) -> Option<usize> {
        let per_tile = (capacity as usize)
            .checked_add(Self::mask_words(max_lights))?
            .checked_add(3)?;
        tiles.checked_mul(per_tile)?.checked_mul(std::mem::size_of::<u32>())
    }

    /// Allocate the buffers on `device`
    pub(crate) fn create(
        device: &dyn ComputeDevice,
        tiles: usize,
        capacity: u32,
        max_lights: u32,
    ) -> Result<Self, ComputeError> {
        let bytes = Self::byte_size(tiles, capacity, max_lights).ok_or(ComputeError::BufferTooLarge {
            requested: usize::MAX,
            limit: 0,
        })?;
        device.allocate(bytes)?;
        let mask_words = Self::mask_words(max_lights);

        let atomics = |count: usize, value: u32| (0..count).map(|_| AtomicU32::new(value)).collect::<Vec<_>>();
        Ok(Self {
            counters: atomics(tiles, 0),
            depth_min: atomics(tiles, u32::MAX),
            depth_max: atomics(tiles, 0),
            survivors: atomics(tiles * mask_words, 0),
            mask_words,
            slots: atomics(tiles * capacity as usize, 0),
            capacity,
        })
    }

    /// Raw `[0, 1]` depth range reduced for a tile by the init pass
    fn depth_range(&self, tile: usize) -> (f32, f32) {
        (
            f32::from_bits(self.depth_min[tile].load(Ordering::Relaxed)),
            f32::from_bits(self.depth_max[tile].load(Ordering::Relaxed)),
        )
    }
}

/// Inputs of one compute build
pub(crate) struct ComputePass<'a> {
    pub device: &'a dyn ComputeDevice,
    pub lanes: u32,
    pub num_tiles: (u32, u32),
    pub resolution: (u32, u32),
    pub depth: Option<&'a DepthTexture>,
}

impl ComputePass<'_> {
    /// Reset counters and masks, and reduce per-tile raw depth ranges
    ///
    /// Returns the reduced ranges in tile order, or `None` without a depth
    /// texture.
    pub(crate) fn init(&self, buffers: &ComputeBuffers) -> Result<Option<Vec<(f32, f32)>>, ComputeError> {
        // Depth accumulators restart from the identity of min/max
        for (min, max) in buffers.depth_min.iter().zip(&buffers.depth_max) {
            min.store(u32::MAX, Ordering::Relaxed);
            max.store(0, Ordering::Relaxed);
        }

        let row = self.num_tiles.0;
        let lanes = self.lanes;
        let resolution = self.resolution;
        let depth = self.depth;
        let mask_words = buffers.mask_words;

        self.device.dispatch([self.num_tiles.0, self.num_tiles.1], lanes, &|invocation: Invocation| {
            let [tx, ty] = invocation.group;
            let tile = (ty * row + tx) as usize;
            if invocation.lane == 0 {
                buffers.counters[tile].store(0, Ordering::Relaxed);
            }
            for word in (invocation.lane as usize..mask_words).step_by(lanes as usize) {
                buffers.survivors[tile * mask_words + word].store(0, Ordering::Relaxed);
            }

            let Some(depth) = depth else { return };
            let [x0, y0, x1, y1] = depth.texel_rect(tile_pixel_rect((tx, ty), resolution), resolution);
            let mut min = u32::MAX;
            let mut max = 0;
            for y in (y0 + invocation.lane..y1).step_by(lanes as usize) {
                for x in x0..x1 {
                    if let Some(value) = depth.get(x, y).filter(|value| !value.is_nan()) {
                        // Non-negative floats order like their bit patterns
                        let bits = value.max(0.0).to_bits();
                        min = min.min(bits);
                        max = max.max(bits);
                    }
                }
            }
            if min <= max {
                buffers.depth_min[tile].fetch_min(min, Ordering::Relaxed);
                buffers.depth_max[tile].fetch_max(max, Ordering::Relaxed);
            }
        })?;

        Ok(depth.map(|_| (0..buffers.counters.len()).map(|tile| buffers.depth_range(tile)).collect()))
    }

    /// Cull `lights` against `frusta` and write the fixed-stride result
    pub(crate) fn cull(
        &self,
        buffers: &ComputeBuffers,
        frusta: &[TileFrustum],
        lights: &[Vec4],
        output: &mut TileLightIndices,
    ) -> Result<(), ComputeError> {
        let row = self.num_tiles.0;
        let lanes = self.lanes as usize;
        let capacity = buffers.capacity;

        let groups = [self.num_tiles.0, self.num_tiles.1];
        let mask_words = buffers.mask_words;

        self.device.dispatch(groups, self.lanes, &|invocation: Invocation| {
            let [tx, ty] = invocation.group;
            let tile = (ty * row + tx) as usize;
            let Some(frustum) = frusta.get(tile) else { return };

            for index in (invocation.lane as usize..lights.len()).step_by(lanes) {
                if index / 32 >= mask_words || !frustum.contains_light(&lights[index]) {
                    continue;
                }
                buffers.survivors[tile * mask_words + index / 32].fetch_or(1 << (index % 32), Ordering::Relaxed);
            }
        })?;

        self.device.dispatch(groups, 1, &|invocation: Invocation| {
            let [tx, ty] = invocation.group;
            let tile = (ty * row + tx) as usize;
            let base = tile * capacity as usize;
            let mut count = 0;

            'mask: for word in 0..mask_words {
                let mut bits = buffers.survivors[tile * mask_words + word].load(Ordering::Relaxed);
                while bits != 0 {
                    if count == capacity {
                        break 'mask;
                    }
                    let index = word as u32 * 32 + bits.trailing_zeros();
                    buffers.slots[base + count as usize].store(index, Ordering::Relaxed);
                    count += 1;
                    bits &= bits - 1;
                }
            }
            buffers.counters[tile].store(count, Ordering::Relaxed);
        })?;

        output.cells.clear();
        output.indices.clear();
        for (tile, counter) in buffers.counters.iter().enumerate() {
            let count = counter.load(Ordering::Relaxed).min(capacity);
            let offset = tile as u32 * capacity;
            output.cells.push(LightGridCell { offset, count });

            let range = offset as usize..(offset + capacity) as usize;
            for (slot, stored) in buffers.slots[range].iter().enumerate() {
                let value = if (slot as u32) < count { stored.load(Ordering::Relaxed) } else { 0 };
                output.indices.push(value);
            }
        }
        Ok(())
    }
}
