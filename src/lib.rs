//! aquarium
//!
//! An interactive 3D aquarium rendered with wgpu on native targets and in the
//! browser through WebGL. A glass tank holds patrolling fish loaded from
//! OBJ/MTL files and randomly placed bubbles. Next to it sit a textured globe
//! and a row of spinning cubes on a checkered ground under a skybox.
//!
//! High-level modules
//! - `world`: scene configuration and the builder that assembles the scene
//! - `animation`: per-frame motion formulas and the frame driver
//! - `data_structures`: the CPU scene graph, geometry, materials, lights and
//!   textures, plus their GPU counterparts
//! - `resources`: asynchronous asset loading with placeholder handles
//! - `camera`: perspective camera, orbit controls and the camera uniform
//! - `pipelines`: render pipelines and WGSL shaders
//! - `render`: presents a scene through the pipelines
//! - `context`: the window surface and GPU device
//! - `flow`: the application event loop
//!

pub mod animation;
pub mod camera;
pub mod context;
pub mod data_structures;
pub mod flow;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod world;

// Re-exports commonly used types for convenience in downstream code.
pub use animation::{AnimationDriver, Presenter};
pub use world::{SceneBuilder, SceneConfig, World};

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn start() -> Result<(), wasm_bindgen::JsValue> {
    flow::run(SceneConfig::default())
        .map_err(|e| wasm_bindgen::JsValue::from_str(&format!("{e:#}")))
}
