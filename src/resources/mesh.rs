use crate::data_structures::{
    geometry::MeshData,
    material::{Color, Material},
    texture_store::TextureId,
};

/**
 * Obj texture coordinates put their origin in the bottom left corner while
 * wgpu samples from the top left, so V is flipped on the way in.
 *
 * Missing normals or texture coordinates are filled with zeros so every
 * attribute vector has one entry per vertex.
 */
pub fn to_mesh_data(model: &tobj::Model) -> MeshData {
    let m = &model.mesh;
    let vertex_count = m.positions.len() / 3;
    let mut data = MeshData::default();
    for i in 0..vertex_count {
        data.positions
            .push([m.positions[i * 3], m.positions[i * 3 + 1], m.positions[i * 3 + 2]]);
        data.uvs.push([
            m.texcoords.get(i * 2).map_or(0.0, |f| *f),
            1.0 - m.texcoords.get(i * 2 + 1).map_or(0.0, |f| *f),
        ]);
        data.normals.push([
            m.normals.get(i * 3).map_or(0.0, |f| *f),
            m.normals.get(i * 3 + 1).map_or(0.0, |f| *f),
            m.normals.get(i * 3 + 2).map_or(0.0, |f| *f),
        ]);
    }
    data.indices = m
        .indices
        .chunks_exact(3)
        .filter(|tri| tri.iter().all(|idx| (*idx as usize) < vertex_count))
        .flatten()
        .copied()
        .collect();
    if data.indices.len() != m.indices.len() {
        log::warn!(
            "Mesh {} references vertices out of range. Dropped {} indices.",
            model.name,
            m.indices.len() - data.indices.len()
        );
    }
    data
}

/// Phong material from MTL `Kd`, `Ks`, `Ns` and `d`. `map` is the already
/// requested diffuse texture, if the MTL names one.
pub fn to_material(mtl: &tobj::Material, map: Option<TextureId>) -> Material {
    let [r, g, b] = mtl.diffuse.unwrap_or([1.0, 1.0, 1.0]);
    let mut material = Material::phong(Color::new(r, g, b));
    if let Some([r, g, b]) = mtl.specular {
        material.specular = Color::new(r, g, b);
    }
    if let Some(shininess) = mtl.shininess {
        material.shininess = shininess;
    }
    if let Some(dissolve) = mtl.dissolve {
        if dissolve < 1.0 {
            material = material.with_opacity(dissolve);
        }
    }
    if let Some(map) = map {
        material = material.with_map(map);
    }
    material
}
