//! Literal configuration of the aquarium scene.
//!
//! [`SceneConfig::default`] is the complete scene. A few values can be
//! overridden from the environment with [`SceneConfig::from_env`].

use std::{env, str::FromStr};

/// What fills the background slot of the scene.
#[derive(Clone, Debug, PartialEq)]
pub enum Skybox {
    Color(u32),
    /// One image stretched behind everything.
    Texture(String),
    /// Six faces in +x, -x, +y, -y, +z, -z order.
    CubeMap([String; 6]),
}

#[derive(Clone, Debug, PartialEq)]
pub struct CameraConfig {
    pub fov_degrees: f32,
    /// Initial aspect ratio. It follows the surface once one exists.
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: [f32; 3],
    pub target: [f32; 3],
}

#[derive(Clone, Debug, PartialEq)]
pub struct TankConfig {
    /// World position of the tank group.
    pub position: [f32; 3],
    /// Inner water volume, width x height x depth.
    pub size: [f32; 3],
    /// How much the glass shell and panels stick out around the water.
    pub wall: f32,
    pub glass_color: u32,
    pub glass_opacity: f32,
    pub water_color: u32,
    pub water_opacity: f32,
    pub back_texture: String,
    pub sand_texture: String,
    pub light_color: u32,
    pub light_intensity: f32,
    pub light_distance: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FishConfig {
    pub mtl: String,
    pub obj: String,
    /// One fish per entry, placed at this depth inside the tank.
    pub depths: Vec<f32>,
    pub scale: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BubbleConfig {
    pub count: usize,
    /// Chance for a bubble to be translucent rather than globe textured.
    pub translucent_probability: f32,
    /// Radius is `min_radius + draw * radius_range`.
    pub min_radius: f32,
    pub radius_range: f32,
    /// Tank-local placement bounds.
    pub min: [f32; 3],
    pub max: [f32; 3],
    pub color: u32,
    pub opacity: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SceneConfig {
    pub assets_root: String,
    pub canvas_id: String,
    pub seed: Option<u64>,
    pub camera: CameraConfig,
    pub skybox: Skybox,
    pub ground_size: f32,
    pub ground_texture: String,
    pub globe_texture: String,
    pub globe_position: [f32; 3],
    pub globe_radius: f32,
    pub cube_colors: [u32; 3],
    pub cube_offsets: [f32; 3],
    /// Where the row of cubes sits; x is replaced by the per-cube offset.
    pub cube_row: [f32; 3],
    pub tank: TankConfig,
    pub fish: FishConfig,
    pub bubbles: BubbleConfig,
    pub hemisphere_light: bool,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            assets_root: "assets".to_string(),
            canvas_id: "c".to_string(),
            seed: None,
            camera: CameraConfig {
                fov_degrees: 75.0,
                aspect: 2.0,
                near: 0.1,
                far: 100.0,
                position: [0.0, 8.0, 16.0],
                target: [0.0, 3.0, 0.0],
            },
            skybox: Skybox::CubeMap([
                "skybox/pos-x.png".to_string(),
                "skybox/neg-x.png".to_string(),
                "skybox/pos-y.png".to_string(),
                "skybox/neg-y.png".to_string(),
                "skybox/pos-z.png".to_string(),
                "skybox/neg-z.png".to_string(),
            ]),
            ground_size: 40.0,
            ground_texture: "checker.png".to_string(),
            globe_texture: "globe.png".to_string(),
            globe_position: [-9.0, 2.0, 3.0],
            globe_radius: 1.5,
            cube_colors: [0x44aa88, 0x8844aa, 0xaa8844],
            cube_offsets: [0.0, -2.0, 2.0],
            cube_row: [0.0, 1.0, 6.0],
            tank: TankConfig {
                position: [0.0, 2.8, -2.0],
                size: [10.0, 5.0, 4.0],
                wall: 0.2,
                glass_color: 0xccf2ff,
                glass_opacity: 0.25,
                water_color: 0x3399cc,
                water_opacity: 0.3,
                back_texture: "tank_back.png".to_string(),
                sand_texture: "sand.png".to_string(),
                light_color: 0x88ccff,
                light_intensity: 6.0,
                light_distance: 12.0,
            },
            fish: FishConfig {
                mtl: "fish/fish.mtl".to_string(),
                obj: "fish/fish.obj".to_string(),
                depths: vec![-1.0, 0.0, 1.0],
                scale: 0.5,
            },
            bubbles: BubbleConfig {
                count: 40,
                translucent_probability: 0.85,
                min_radius: 0.05,
                radius_range: 0.2,
                min: [-4.6, -2.3, -1.8],
                max: [4.6, 2.3, 1.8],
                color: 0xddf4ff,
                opacity: 0.4,
            },
            hemisphere_light: true,
        }
    }
}

impl SceneConfig {
    /**
     * Defaults with overrides from `AQUARIUM_ASSETS`, `AQUARIUM_BUBBLES` and
     * `AQUARIUM_SEED`. Values that do not parse are logged and ignored.
     */
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| env::var(key).ok())
    }

    /// Applies overrides from any key/value source.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(root) = lookup("AQUARIUM_ASSETS") {
            if root.trim().is_empty() {
                log::warn!("AQUARIUM_ASSETS is empty, keeping {}", self.assets_root);
            } else {
                self.assets_root = root;
            }
        }
        if let Some(count) = parse_var(&lookup, "AQUARIUM_BUBBLES") {
            self.bubbles.count = count;
        }
        if let Some(seed) = parse_var(&lookup, "AQUARIUM_SEED") {
            self.seed = Some(seed);
        }
        self
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("Ignoring {key}={raw:?}, not a valid number");
            None
        }
    }
}
