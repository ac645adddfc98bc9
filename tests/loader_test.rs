use std::time::Duration;

use aquarium::{
    data_structures::{
        geometry::Geometry,
        material::Color,
        scene_graph::Scene,
        texture_store::{ColorSpace, LoadState, TextureData, TextureSource},
    },
    resources::{self, mesh},
};

use crate::common::test_utils::{TempAssets, assert_close, inline_loader};

mod common;

const QUAD_OBJ: &str = "\
mtllib quad.mtl
o quad
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
vn 0 0 1
usemtl skin
f 1/1/1 2/2/1 3/3/1 4/4/1
";

#[test]
fn same_path_shares_one_texture() {
    let assets = TempAssets::new("dedupe");
    assets.write_png("a.png", 2, 2, [255, 0, 0, 255]);
    let mut loader = inline_loader(&assets.root_str());
    let mut scene = Scene::new();

    let first = loader.load_texture(&mut scene.textures, "a.png");
    let second = loader.load_texture(&mut scene.textures, "a.png");

    assert_eq!(first, second);
    assert_eq!(scene.textures.len(), 1);
    assert_eq!(loader.manager().started(), 1);
}

#[test]
fn textures_stay_pending_until_applied() {
    let assets = TempAssets::new("pending");
    assets.write_png("a.png", 4, 2, [0, 255, 0, 255]);
    let mut loader = inline_loader(&assets.root_str());
    let mut scene = Scene::new();

    let id = loader.load_texture(&mut scene.textures, "a.png");
    // the inline spawner already finished, but nothing touched the scene
    assert_eq!(scene.textures.get(id).expect("entry").state, LoadState::Pending);
    assert_eq!(loader.in_flight(), 1);

    assert_eq!(loader.apply_completed(&mut scene), 1);
    let entry = scene.textures.get(id).expect("entry");
    assert_eq!(entry.data().map(TextureData::dimensions), Some((4, 2)));
    assert_eq!(loader.in_flight(), 0);
    assert_eq!(loader.manager().loaded(), 1);
}

#[test]
fn missing_texture_fails_without_panicking() {
    let assets = TempAssets::new("missing");
    let mut loader = inline_loader(&assets.root_str());
    let mut scene = Scene::new();

    let id = loader.load_texture(&mut scene.textures, "nope.png");
    assert!(loader.wait_idle(&mut scene, Duration::from_secs(5)));

    assert_eq!(scene.textures.get(id).expect("entry").state, LoadState::Failed);
    assert_eq!(loader.manager().failed(), 1);
    assert!(loader.manager().is_idle());
}

#[test]
fn hooks_wait_for_the_data() {
    let assets = TempAssets::new("hooks");
    assets.write_png("a.png", 1, 1, [0, 0, 255, 255]);
    let mut loader = inline_loader(&assets.root_str());
    let mut scene = Scene::new();

    let id = loader.load_texture(&mut scene.textures, "a.png");
    loader.on_texture_load(&mut scene.textures, id, |config| {
        config.color_space = ColorSpace::Srgb;
    });
    assert_eq!(
        scene.textures.get(id).expect("entry").config.color_space,
        ColorSpace::Linear
    );

    loader.apply_completed(&mut scene);
    let entry = scene.textures.get(id).expect("entry");
    assert_eq!(entry.config.color_space, ColorSpace::Srgb);
    // loaded, then configured by the hook
    assert_eq!(entry.version, 2);
}

#[test]
fn hooks_on_ready_textures_run_immediately() {
    let assets = TempAssets::new("ready-hooks");
    assets.write_png("a.png", 1, 1, [0, 0, 0, 255]);
    let mut loader = inline_loader(&assets.root_str());
    let mut scene = Scene::new();

    let id = loader.load_texture(&mut scene.textures, "a.png");
    loader.apply_completed(&mut scene);
    loader.on_texture_load(&mut scene.textures, id, |config| config.repeat = [3.0, 3.0]);

    assert_eq!(scene.textures.get(id).expect("entry").config.repeat, [3.0, 3.0]);
}

#[test]
fn hooks_of_failed_loads_never_run() {
    let assets = TempAssets::new("failed-hooks");
    let mut loader = inline_loader(&assets.root_str());
    let mut scene = Scene::new();

    let id = loader.load_texture(&mut scene.textures, "nope.png");
    loader.on_texture_load(&mut scene.textures, id, |config| config.repeat = [3.0, 3.0]);
    loader.apply_completed(&mut scene);

    let entry = scene.textures.get(id).expect("entry");
    assert_eq!(entry.config.repeat, [1.0, 1.0]);
    assert_eq!(entry.version, 1);
}

#[test]
fn hooks_on_failed_textures_are_dropped() {
    let assets = TempAssets::new("late-hooks");
    let mut loader = inline_loader(&assets.root_str());
    let mut scene = Scene::new();

    let id = loader.load_texture(&mut scene.textures, "nope.png");
    loader.apply_completed(&mut scene);
    loader.on_texture_load(&mut scene.textures, id, |config| config.repeat = [3.0, 3.0]);

    assert_eq!(loader.pending_hooks(), 0);
    let entry = scene.textures.get(id).expect("entry");
    assert_eq!(entry.config.repeat, [1.0, 1.0]);
    assert_eq!(entry.version, 1);
}

#[test]
fn each_scene_gets_its_own_texture_ids() {
    let assets = TempAssets::new("two-scenes");
    assets.write_png("a.png", 1, 1, [255, 0, 0, 255]);
    assets.write_png("b.png", 1, 1, [0, 255, 0, 255]);
    let mut loader = inline_loader(&assets.root_str());
    let mut first = Scene::new();
    let mut second = Scene::new();

    let a = loader.load_texture(&mut first.textures, "a.png");
    let b = loader.load_texture(&mut second.textures, "b.png");
    let a_again = loader.load_texture(&mut second.textures, "a.png");
    assert_eq!(first.textures.len(), 1);
    assert_eq!(second.textures.len(), 2);
    assert_ne!(a_again, b);

    // the first scene's load settles without landing in the second scene
    assert!(loader.wait_idle(&mut second, Duration::from_secs(5)));
    assert_eq!(first.textures.get(a).expect("entry").state, LoadState::Pending);
    for (id, path) in [(b, "b.png"), (a_again, "a.png")] {
        let entry = second.textures.get(id).expect("entry");
        assert_eq!(entry.source, TextureSource::File(path.to_string()));
        assert!(entry.is_ready());
        assert_eq!(entry.version, 1);
    }
    assert_eq!(loader.manager().loaded(), 2);
    assert_eq!(loader.manager().failed(), 1);
}

#[test]
fn configure_bumps_the_version() {
    let mut scene = Scene::new();
    let mut loader = inline_loader("/nonexistent");
    let id = loader.load_texture(&mut scene.textures, "a.png");
    assert_eq!(scene.textures.get(id).expect("entry").version, 0);

    scene.textures.configure(id, |config| config.repeat = [2.0, 2.0]);
    scene.textures.configure(id, |config| config.repeat = [4.0, 4.0]);
    let entry = scene.textures.get(id).expect("entry");
    assert_eq!(entry.version, 2);
    assert_eq!(entry.config.repeat, [4.0, 4.0]);
}

#[test]
fn cube_faces_load_in_order() {
    let assets = TempAssets::new("cube");
    let faces = ["px.png", "nx.png", "py.png", "ny.png", "pz.png", "nz.png"];
    for (idx, face) in faces.iter().enumerate() {
        assets.write_png(face, 8, 8, [idx as u8 * 40, 0, 0, 255]);
    }
    let mut loader = inline_loader(&assets.root_str());
    let mut scene = Scene::new();

    let id = loader.load_cube_texture(&mut scene.textures, faces);
    assert!(loader.wait_idle(&mut scene, Duration::from_secs(5)));

    let entry = scene.textures.get(id).expect("entry");
    assert!(matches!(entry.source, TextureSource::CubeFaces(_)));
    let Some(TextureData::Cube(images)) = entry.data() else {
        panic!("expected six faces, got {:?}", entry.state);
    };
    assert_eq!(images.len(), 6);
    for (idx, image) in images.iter().enumerate() {
        assert_eq!(image.get_pixel(0, 0).0[0], idx as u8 * 40);
    }
}

#[test]
fn cube_faces_of_different_sizes_fail() {
    let assets = TempAssets::new("bad-cube");
    let faces = ["px.png", "nx.png", "py.png", "ny.png", "pz.png", "nz.png"];
    for face in &faces[..5] {
        assets.write_png(face, 8, 8, [0, 0, 0, 255]);
    }
    assets.write_png(faces[5], 4, 4, [0, 0, 0, 255]);
    let mut loader = inline_loader(&assets.root_str());
    let mut scene = Scene::new();

    let id = loader.load_cube_texture(&mut scene.textures, faces);
    assert!(loader.wait_idle(&mut scene, Duration::from_secs(5)));
    assert_eq!(scene.textures.get(id).expect("entry").state, LoadState::Failed);
}

#[test]
fn non_square_cube_faces_fail() {
    let assets = TempAssets::new("flat-cube");
    let faces = ["px.png", "nx.png", "py.png", "ny.png", "pz.png", "nz.png"];
    for face in &faces {
        assets.write_png(face, 8, 4, [0, 0, 0, 255]);
    }
    let mut loader = inline_loader(&assets.root_str());
    let mut scene = Scene::new();

    let id = loader.load_cube_texture(&mut scene.textures, faces);
    assert!(loader.wait_idle(&mut scene, Duration::from_secs(5)));
    assert_eq!(scene.textures.get(id).expect("entry").state, LoadState::Failed);
    assert_eq!(loader.manager().failed(), 1);
}

#[test]
fn model_fills_its_group_with_material_and_texture() {
    let assets = TempAssets::new("model");
    assets.write(
        "models/quad.mtl",
        "newmtl skin\nKd 0.5 0.25 1.0\nKs 0.2 0.2 0.2\nNs 12\nd 0.5\nmap_Kd tex.png\n",
    );
    assets.write("models/quad.obj", QUAD_OBJ);
    assets.write_png("models/tex.png", 2, 2, [10, 20, 30, 255]);
    let mut loader = inline_loader(&assets.root_str());
    let mut scene = Scene::new();

    let parent = scene.root();
    let group = loader.load_model(&mut scene, parent, "models/quad.mtl", "models/quad.obj");
    assert!(scene.get_children(group).is_empty());
    assert!(loader.wait_idle(&mut scene, Duration::from_secs(5)));

    let meshes = scene.get_children(group);
    assert_eq!(meshes.len(), 1);
    let mesh = scene.get(meshes[0]).and_then(|node| node.as_mesh()).expect("mesh");
    let Geometry::Custom(data) = &mesh.geometry else {
        panic!("expected model triangles");
    };
    assert_eq!(data.vertex_count(), 4);
    assert_eq!(data.triangle_count(), 2);

    let material = &mesh.material;
    assert_eq!(material.color, Color::new(0.5, 0.25, 1.0));
    assert_close(material.shininess, 12.0);
    assert!(material.transparent);
    assert_close(material.opacity, 0.5);

    let map = material.map.expect("diffuse map");
    let texture = scene.textures.get(map).expect("texture");
    assert_eq!(texture.source, TextureSource::File("models/tex.png".to_string()));
    assert!(texture.is_ready());
    assert_eq!(texture.config.color_space, ColorSpace::Srgb);
}

#[test]
fn models_sharing_a_texture_configure_it_once() {
    let assets = TempAssets::new("shared-model");
    assets.write("models/quad.mtl", "newmtl skin\nKd 1 1 1\nmap_Kd tex.png\n");
    assets.write("models/quad.obj", QUAD_OBJ);
    assets.write_png("models/tex.png", 2, 2, [10, 20, 30, 255]);
    let mut loader = inline_loader(&assets.root_str());
    let mut scene = Scene::new();

    let parent = scene.root();
    let groups = [
        loader.load_model(&mut scene, parent, "models/quad.mtl", "models/quad.obj"),
        loader.load_model(&mut scene, parent, "models/quad.mtl", "models/quad.obj"),
    ];
    assert!(loader.wait_idle(&mut scene, Duration::from_secs(5)));

    assert_eq!(scene.textures.len(), 1);
    let maps = groups.map(|group| {
        let mesh = scene.get_children(group)[0];
        scene
            .get(mesh)
            .and_then(|node| node.as_mesh())
            .and_then(|mesh| mesh.material.map)
            .expect("diffuse map")
    });
    assert_eq!(maps[0], maps[1]);

    let texture = scene.textures.get(maps[0]).expect("texture");
    assert_eq!(texture.config.color_space, ColorSpace::Srgb);
    // configured on registration, then loaded
    assert_eq!(texture.version, 2);
}

#[test]
fn model_without_its_mtl_stays_empty() {
    let assets = TempAssets::new("no-mtl");
    assets.write("quad.obj", QUAD_OBJ);
    let mut loader = inline_loader(&assets.root_str());
    let mut scene = Scene::new();

    let parent = scene.root();
    let group = loader.load_model(&mut scene, parent, "quad.mtl", "quad.obj");
    let nodes = scene.node_count();
    assert!(loader.wait_idle(&mut scene, Duration::from_secs(5)));

    assert!(scene.get_children(group).is_empty());
    assert_eq!(scene.node_count(), nodes);
    assert_eq!(loader.manager().failed(), 1);
}

#[test]
fn sibling_paths_resolve_next_to_the_base() {
    assert_eq!(resources::sibling_path("fish/fish.mtl", "fish.png"), "fish/fish.png");
    assert_eq!(resources::sibling_path("fish.mtl", "fish.png"), "fish.png");
    assert_eq!(resources::sibling_path("a/b/c.mtl", "tex\\skin.png"), "a/b/tex/skin.png");
    assert_eq!(resources::sibling_path("a/c.mtl", "/abs.png"), "/abs.png");
}

#[test]
fn obj_without_mtllib_still_gets_its_materials() {
    let obj = QUAD_OBJ.replace("mtllib quad.mtl\n", "");
    let mtl = "newmtl skin\nKd 1 0 0\n".to_string();
    let (models, materials) =
        futures::executor::block_on(resources::parse_obj(obj, mtl)).expect("parse");

    assert_eq!(models.len(), 1);
    assert_eq!(materials.len(), 1);
    assert_eq!(materials[0].diffuse, Some([1.0, 0.0, 0.0]));
}

#[test]
fn mesh_conversion_flips_v_and_drops_bad_triangles() {
    let raw = tobj::Mesh {
        positions: vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
        texcoords: vec![0.0, 0.0, 1.0, 0.25, 0.0, 1.0],
        indices: vec![0, 1, 2, 0, 2, 7],
        ..Default::default()
    };
    let model = tobj::Model::new(raw, "tri".to_string());
    let data = mesh::to_mesh_data(&model);

    assert_eq!(data.vertex_count(), 3);
    assert_eq!(data.indices, vec![0, 1, 2]);
    assert_eq!(data.uvs[1], [1.0, 0.75]);
    // missing normals are zero filled
    assert_eq!(data.normals.len(), 3);
    assert_eq!(data.normals[0], [0.0, 0.0, 0.0]);
}

#[test]
fn mtl_defaults_are_opaque_white() {
    let material = mesh::to_material(&tobj::Material::default(), None);
    assert_eq!(material.color, Color::WHITE);
    assert!(!material.transparent);
    assert!(material.map.is_none());
}
