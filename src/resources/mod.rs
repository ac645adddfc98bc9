/**
 * This module contains all logic for loading meshes, materials and textures
 * from external files.
 *
 * Natively files are read from an asset root directory on disk. On the web
 * the same relative path is fetched from `<origin>/<root>/`.
 */
use std::io::{BufReader, Cursor};

use anyhow::Context as _;
use image::RgbaImage;

pub mod loader;
pub mod mesh;

pub use loader::{AssetLoader, LoadingManager, Spawner};

#[cfg(target_arch = "wasm32")]
fn format_url(root: &str, file_name: &str) -> anyhow::Result<reqwest::Url> {
    let window = web_sys::window().ok_or_else(|| anyhow::anyhow!("No browser window"))?;
    let origin = window
        .location()
        .origin()
        .map_err(|_| anyhow::anyhow!("Page origin is not readable"))?;
    let base = reqwest::Url::parse(&format!("{}/{}/", origin, root.trim_matches('/')))?;
    Ok(base.join(file_name)?)
}

pub async fn load_string(root: &str, file_name: &str) -> anyhow::Result<String> {
    #[cfg(target_arch = "wasm32")]
    let txt = {
        let url = format_url(root, file_name)?;
        reqwest::get(url).await?.error_for_status()?.text().await?
    };
    #[cfg(not(target_arch = "wasm32"))]
    let txt = {
        let path = std::path::Path::new(root).join(file_name);
        std::fs::read_to_string(&path).with_context(|| format!("Reading {}", path.display()))?
    };

    Ok(txt)
}

pub async fn load_binary(root: &str, file_name: &str) -> anyhow::Result<Vec<u8>> {
    #[cfg(target_arch = "wasm32")]
    let data = {
        let url = format_url(root, file_name)?;
        reqwest::get(url).await?.error_for_status()?.bytes().await?.to_vec()
    };
    #[cfg(not(target_arch = "wasm32"))]
    let data = {
        let path = std::path::Path::new(root).join(file_name);
        std::fs::read(&path).with_context(|| format!("Reading {}", path.display()))?
    };

    Ok(data)
}

pub async fn load_image(root: &str, file_name: &str) -> anyhow::Result<RgbaImage> {
    let bytes = load_binary(root, file_name).await?;
    let img = image::load_from_memory(&bytes)
        .with_context(|| format!("Decoding image {file_name}"))?;
    Ok(img.to_rgba8())
}

/// Parses an OBJ file whose materials come from the separately fetched `mtl_text`.
pub async fn parse_obj(
    obj_text: String,
    mtl_text: String,
) -> anyhow::Result<(Vec<tobj::Model>, Vec<tobj::Material>)> {
    let mut obj_reader = BufReader::new(Cursor::new(obj_text));

    let (models, obj_materials) = tobj::load_obj_buf_async(
        &mut obj_reader,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
        |_| {
            let mtl_text = mtl_text.clone();
            async move { tobj::load_mtl_buf(&mut BufReader::new(Cursor::new(mtl_text))) }
        },
    )
    .await?;

    // An OBJ without `mtllib` never asks for its materials.
    let materials = match obj_materials {
        Ok(materials) if !materials.is_empty() => materials,
        _ => tobj::load_mtl_buf(&mut BufReader::new(Cursor::new(mtl_text)))?.0,
    };
    Ok((models, materials))
}

/// Resolves `file_name` next to `base`, the way MTL files reference textures.
pub fn sibling_path(base: &str, file_name: &str) -> String {
    let file_name = file_name.replace('\\', "/");
    match base.rfind('/') {
        Some(idx) if !file_name.starts_with('/') => format!("{}/{}", &base[..idx], file_name),
        _ => file_name,
    }
}
