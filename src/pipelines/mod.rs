//! Render pipelines and the uniform blocks they share.
//!
//! Bind group order for meshes: 0 camera, 1 lights, 2 material. Background
//! pipelines use 0 camera, 1 texture.

pub mod background;
pub mod basic;
pub mod light;
pub mod transparent;
