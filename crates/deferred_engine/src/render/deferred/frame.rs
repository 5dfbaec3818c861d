//! Per-frame preparation of the deferred renderer

use crate::core::config::EngineConfig;
use crate::foundation::math::{Vec3, Vec4};
use crate::render::backend::{RenderCoordinator, ResourceBinder};
use crate::render::deferred::binder::DeferredShaderBinder;
use crate::render::depth::DepthTexture;
use crate::render::light_grid::LightGrid;
use crate::render::{RenderError, RenderResult};
use crate::scene::{CameraState, SceneGraph};

/// Light grid and shader binder driven once per frame
///
/// ```text
/// update_all → active camera → point lights → update_lights → build
/// ```
#[derive(Debug)]
pub struct DeferredFrame {
    light_grid: LightGrid,
    binder: DeferredShaderBinder,
    light_spheres: Vec<Vec4>,
    light_colors: Vec<Vec3>,
    lighting_enabled: bool,
}

impl DeferredFrame {
    /// Create the frame state, using the renderer's compute device when offered
    pub fn new(config: &EngineConfig, renderer: &dyn RenderCoordinator) -> RenderResult<Self> {
        config.validate()?;

        let light_grid = LightGrid::from_config(&config.light_grid, renderer.compute_device())?;
        let mut binder = DeferredShaderBinder::new(config.deferred.flags);
        binder.set_light_grid_row_size(light_grid.row_size());

        log::info!(
            "Deferred frame ready: {}x{}, {} lights, {:?} light grid",
            light_grid.resolution().0,
            light_grid.resolution().1,
            light_grid.max_lights(),
            light_grid.strategy()
        );

        Ok(Self {
            light_grid,
            binder,
            light_spheres: Vec::new(),
            light_colors: Vec::new(),
            lighting_enabled: false,
        })
    }

    /// Propagate transforms, collect lights and build the light grid
    ///
    /// Lights beyond the grid capacity are dropped with a warning. A failed
    /// light grid build disables tiled lighting for the frame instead of
    /// failing it.
    pub fn prepare(&mut self, graph: &mut SceneGraph, depth: Option<&DepthTexture>) -> RenderResult<CameraState> {
        graph.update_all();

        let camera = graph.active_camera().ok_or(RenderError::NoActiveCamera)?;
        let state = CameraState::from_graph(graph, camera)?;

        let mut lights = graph.point_lights()?;
        let max_lights = self.light_grid.max_lights() as usize;
        if lights.len() > max_lights {
            log::warn!(
                "{} point lights in the scene, only the first {} are shaded",
                lights.len(),
                max_lights
            );
            lights.truncate(max_lights);
        }

        self.light_spheres.clear();
        self.light_colors.clear();
        for light in &lights {
            self.light_spheres.push(light.sphere);
            self.light_colors.push(light.color);
        }
        self.light_grid
            .update_lights(&self.light_spheres, self.light_spheres.len() as u32)?;

        self.lighting_enabled = match self.light_grid.build(graph, camera, depth) {
            Ok(()) => true,
            Err(err) => {
                log::warn!("Light grid build failed, tiled lighting disabled: {}", err);
                false
            }
        };
        self.binder.set_light_grid_row_size(self.light_grid.row_size());

        Ok(state)
    }

    /// Resize the light grid to a new screen resolution
    pub fn resize(&mut self, resolution: (u32, u32)) -> RenderResult<()> {
        self.light_grid.set_resolution(resolution)?;
        self.binder.set_light_grid_row_size(self.light_grid.row_size());
        self.lighting_enabled = false;
        Ok(())
    }

    /// Bind the light grid resources from `base`, returning the next free slot
    pub fn bind_resources(&self, base: u32, binder: &mut dyn ResourceBinder) -> u32 {
        self.light_grid.bind(base, binder)
    }

    /// Unbind the light grid resources from `base`, returning the next free slot
    pub fn unbind_resources(&self, base: u32, binder: &mut dyn ResourceBinder) -> u32 {
        self.light_grid.unbind(base, binder)
    }

    /// Light grid
    pub fn light_grid(&self) -> &LightGrid {
        &self.light_grid
    }

    /// Shader binder
    pub fn binder(&self) -> &DeferredShaderBinder {
        &self.binder
    }

    /// Mutable shader binder
    pub fn binder_mut(&mut self) -> &mut DeferredShaderBinder {
        &mut self.binder
    }

    /// Colors of the lights uploaded this frame, in light index order
    pub fn light_colors(&self) -> &[Vec3] {
        &self.light_colors
    }

    /// True when the last light grid build succeeded
    pub fn lighting_enabled(&self) -> bool {
        self.lighting_enabled
    }
}
