//! # Deferred Engine
//!
//! Scene hierarchy, tiled light culling and deferred shading constants for a
//! real-time 3D renderer.
//!
//! ## Features
//!
//! - **Scene Graph**: arena-backed node hierarchy with local/global transforms
//! - **Light Grid**: per-tile point light lists built on the CPU or on a
//!   compute device
//! - **Shader Binding**: named uniforms and packed constant buffers for the
//!   G-buffer, deferred, shadow and forward passes
//! - **Configuration**: TOML/RON engine configuration
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use deferred_engine::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     deferred_engine::foundation::logging::init();
//!
//!     let config = EngineConfig::default();
//!     let renderer = HeadlessCoordinator::new();
//!     let mut frame = DeferredFrame::new(&config, &renderer)?;
//!
//!     let mut graph = SceneGraph::new();
//!     let camera = graph.create_camera(Camera::for_viewport(74.0, 1280, 720, 0.25, 1000.0));
//!     graph.set_position(camera, Vec3::new(0.0, 2.0, -10.0), true)?;
//!     let light = graph.create_light(PointLight::new(Vec3::new(1.0, 0.9, 0.8), 15.0));
//!     graph.set_position(light, Vec3::new(0.0, 4.0, 0.0), true)?;
//!
//!     let camera_state = frame.prepare(&mut graph, None)?;
//!     println!("{} lights at {:?}", frame.light_grid().num_lights(), camera_state.position);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod core;
pub mod foundation;
pub mod render;
pub mod scene;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError},
        core::config::{DeferredConfig, EngineConfig, LightGridConfig},
        foundation::{
            collections::NodeId,
            math::{Mat4, Quat, Vec3, Vec4},
        },
        render::{
            DeferredFrame, DeferredShaderBinder, DepthTexture, HeadlessCoordinator, LightGrid, PassContext,
            RenderCoordinator, RenderError, RendererFlags, ShaderClass, TextureLayer,
        },
        scene::{Camera, CameraState, NodeType, PointLight, SceneError, SceneGraph, Transform},
    };
}
