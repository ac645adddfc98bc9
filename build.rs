use anyhow::*;
use fs_extra::copy_items;
use fs_extra::dir::CopyOptions;
use std::env;
use std::path::{Path, PathBuf};

/// Files the default scene asks for. Missing ones only cost their texture or
/// model at runtime, so they are reported and the build goes on.
const SCENE_ASSETS: &[&str] = &[
    "checker.png",
    "globe.png",
    "sand.png",
    "tank_back.png",
    "fish/fish.obj",
    "fish/fish.mtl",
    "fish/fish.png",
    "skybox/pos-x.png",
    "skybox/neg-x.png",
    "skybox/pos-y.png",
    "skybox/neg-y.png",
    "skybox/pos-z.png",
    "skybox/neg-z.png",
];

fn report_missing(assets: &Path) {
    for file in SCENE_ASSETS {
        if !assets.join(file).exists() {
            println!("cargo:warning=assets/{file} is missing, the scene will render without it");
        }
    }
}

fn main() -> Result<()> {
    println!("cargo:rerun-if-changed=assets");

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let assets = manifest_dir.join("assets");
    if !assets.exists() {
        println!("cargo:warning=No assets/ directory, the scene will only show untextured shapes");
        return Ok(());
    }
    report_missing(&assets);

    // Keep a copy next to the build output for runs from target/.
    let out_dir = env::var("OUT_DIR")?;
    let mut copy_options = CopyOptions::new();
    copy_options.overwrite = true;
    copy_items(&[assets], out_dir, &copy_options).context("Copying assets")?;

    Ok(())
}
