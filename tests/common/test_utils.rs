#![allow(dead_code)]

use std::{
    path::PathBuf,
    sync::atomic::{AtomicUsize, Ordering},
};

use aquarium::{
    animation::Presenter,
    camera::Camera,
    data_structures::{
        instance::Transform,
        scene_graph::{NodeId, Scene},
    },
    resources::{AssetLoader, LoadingManager, Spawner},
    world::{SceneBuilder, SceneConfig, World},
};
use rand::{SeedableRng, rngs::StdRng};

/// Keeps a copy of every scene it is asked to draw.
#[derive(Default)]
pub(crate) struct RecordingPresenter {
    pub scenes: Vec<Scene>,
    pub cameras: Vec<Camera>,
}

impl RecordingPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> usize {
        self.scenes.len()
    }

    pub fn last_local(&self, id: NodeId) -> Transform {
        self.scenes
            .last()
            .and_then(|scene| scene.get(id))
            .map(|node| node.local)
            .expect("no frame recorded for node")
    }
}

impl Presenter for RecordingPresenter {
    fn render(&mut self, scene: &Scene, camera: &Camera) -> anyhow::Result<()> {
        self.scenes.push(scene.clone());
        self.cameras.push(*camera);
        Ok(())
    }
}

/// Refuses every frame, like a device that went away.
#[derive(Default)]
pub(crate) struct FailingPresenter {
    pub attempts: usize,
}

impl Presenter for FailingPresenter {
    fn render(&mut self, _: &Scene, _: &Camera) -> anyhow::Result<()> {
        self.attempts += 1;
        anyhow::bail!("device lost")
    }
}

pub(crate) fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Loads run to completion on the calling thread.
pub(crate) fn inline_loader(root: &str) -> AssetLoader {
    AssetLoader::new(root, Spawner::Inline, LoadingManager::new())
}

/// The assets shipped with the crate.
pub(crate) fn asset_root() -> String {
    format!("{}/assets", env!("CARGO_MANIFEST_DIR"))
}

/// Builds the default scene against the shipped assets.
pub(crate) fn build_world(seed: u64) -> (World, AssetLoader) {
    let config = SceneConfig::default();
    let mut loader = inline_loader(&asset_root());
    let world = SceneBuilder::new(&config).build(&mut seeded_rng(seed), &mut loader);
    (world, loader)
}

/// Builds the default scene against a directory without any files.
pub(crate) fn build_world_without_assets(seed: u64) -> (World, AssetLoader) {
    let config = SceneConfig::default();
    let mut loader = inline_loader("/nonexistent/aquarium-assets");
    let world = SceneBuilder::new(&config).build(&mut seeded_rng(seed), &mut loader);
    (world, loader)
}

pub(crate) fn assert_close(actual: f32, expected: f32) {
    assert!(
        (actual - expected).abs() < 1e-4,
        "expected {expected}, got {actual}"
    );
}

static TEMP_DIRS: AtomicUsize = AtomicUsize::new(0);

/// A scratch asset root that is removed again on drop.
pub(crate) struct TempAssets {
    pub root: PathBuf,
}

impl TempAssets {
    pub fn new(name: &str) -> Self {
        let root = std::env::temp_dir().join(format!(
            "aquarium-{name}-{}-{}",
            std::process::id(),
            TEMP_DIRS.fetch_add(1, Ordering::SeqCst)
        ));
        let _ = std::fs::remove_dir_all(&root);
        std::fs::create_dir_all(&root).expect("create temp asset dir");
        Self { root }
    }

    pub fn root_str(&self) -> String {
        self.root.to_string_lossy().into_owned()
    }

    pub fn write(&self, file: &str, contents: &str) {
        let path = self.root.join(file);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create asset subdir");
        }
        std::fs::write(path, contents).expect("write asset");
    }

    pub fn write_png(&self, file: &str, width: u32, height: u32, rgba: [u8; 4]) {
        let path = self.root.join(file);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create asset subdir");
        }
        image::RgbaImage::from_pixel(width, height, image::Rgba(rgba))
            .save(path)
            .expect("write png");
    }
}

impl Drop for TempAssets {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.root);
    }
}
