//! The aquarium world: everything the builder produces and the driver animates.

use rand::{SeedableRng, rngs::StdRng};

use crate::{animation::Animated, camera::Camera, data_structures::scene_graph::Scene};

pub mod builder;
pub mod config;

pub use builder::{Bubble, BubbleVariant, SceneBuilder};
pub use config::SceneConfig;

/// Result of one scene build. Owns the scene; `animated` only points into it.
#[derive(Clone, Debug, PartialEq)]
pub struct World {
    pub scene: Scene,
    pub camera: Camera,
    pub animated: Animated,
}

/// Seeded when a seed is configured, from OS entropy otherwise.
pub fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => {
            log::info!("Placing bubbles with seed {seed}");
            StdRng::seed_from_u64(seed)
        }
        None => StdRng::from_entropy(),
    }
}
