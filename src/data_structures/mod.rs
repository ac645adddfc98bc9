//! Engine data structures: scene graph, shapes, materials, textures and instances.
//!
//! This module contains the core data types for scene representation:
//!
//! - `scene_graph` holds the node arena, its hierarchy and the background slot
//! - `geometry` describes shapes and tessellates them into triangle meshes
//! - `material` and `light` describe appearance and illumination
//! - `texture_store` is the CPU registry textures are loaded into
//! - `instance` holds per-node transforms and their GPU instance layout
//! - `model` contains GPU meshes and materials built from the above
//! - `texture` contains the GPU texture wrapper and creation utilities

pub mod geometry;
pub mod instance;
pub mod light;
pub mod material;
pub mod model;
pub mod scene_graph;
pub mod texture;
pub mod texture_store;
