//! WebGPU rendering module
//!
//! The [`Compositor`] turns the ball into a fixed stack of shaded circles;
//! [`SdfRenderState`] paints that stack with signed distance fields in the
//! fragment shader.

pub mod compositor;
pub mod sdf_pipeline;

pub use compositor::{Compositor, Layer, LayerKind, SphereFrame};
pub use sdf_pipeline::SdfRenderState;
