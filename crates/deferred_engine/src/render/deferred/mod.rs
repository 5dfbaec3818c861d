//! Deferred shading passes
//!
//! [`DeferredFrame`] runs the per-frame preparation (transform propagation,
//! light collection, light grid build) and [`DeferredShaderBinder`] fills the
//! shader constants of each pass from the result.

mod binder;
mod frame;

pub use binder::{inverse_view_projection, DeferredShaderBinder, PassContext};
pub use frame::DeferredFrame;
