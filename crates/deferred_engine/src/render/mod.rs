//! Deferred rendering support
//!
//! This crate does not own a graphics device. It prepares everything the
//! deferred renderer consumes each frame:
//!
//! - **Light grid**: per-tile point light lists ([`light_grid`])
//! - **Shader constants**: named uniforms and packed constant buffers for
//!   each pass ([`deferred`], [`constant_buffers`])
//! - **Backend traits**: the capabilities required from the renderer
//!   ([`backend`], [`shader`])

pub mod backend;
pub mod constant_buffers;
pub mod deferred;
pub mod depth;
pub mod flags;
pub mod light_grid;
pub mod shader;
pub mod texture_layer;

use thiserror::Error;

use crate::config::ConfigError;
use crate::render::light_grid::LightGridError;
use crate::scene::SceneError;

pub use backend::{HeadlessCoordinator, RenderCoordinator, ResourceBinder, ResourceKind, SlotTable};
pub use deferred::{DeferredFrame, DeferredShaderBinder, PassContext};
pub use depth::DepthTexture;
pub use flags::RendererFlags;
pub use light_grid::{BuildStrategy, ComputeDevice, LightGrid, SoftwareComputeDevice, TileLightIndices};
pub use shader::{RecordedShader, Shader, ShaderClass, ShaderConstant};
pub use texture_layer::{ReliefLayer, TextureId, TextureLayer};

/// Rendering errors
#[derive(Error, Debug)]
pub enum RenderError {
    /// The scene has no active camera
    #[error("No active camera in the scene")]
    NoActiveCamera,

    /// Scene graph query failed
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    /// Light grid operation failed
    #[error("Light grid error: {0}")]
    LightGrid(#[from] LightGridError),

    /// Configuration was rejected
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type for rendering operations
pub type RenderResult<T> = Result<T, RenderError>;
