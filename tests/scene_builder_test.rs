use std::time::Duration;

use aquarium::{
    data_structures::{
        geometry::Geometry,
        light::Light,
        material::Color,
        scene_graph::{Background, Node, NodeId, NodeKind, Scene},
        texture_store::{ColorSpace, Filter, LoadState, Mapping, TextureSource, Wrapping},
    },
    world::{Bubble, BubbleVariant, SceneBuilder, SceneConfig, config::Skybox},
};

use crate::common::test_utils::{
    assert_close, build_world, build_world_without_assets, inline_loader, seeded_rng,
};

mod common;

fn find<'a>(scene: &'a Scene, name: &str) -> (NodeId, &'a Node) {
    scene
        .iter()
        .find(|(_, node)| node.name == name)
        .unwrap_or_else(|| panic!("no node named {name:?}"))
}

fn texture_for<'a>(scene: &'a Scene, path: &str) -> &'a aquarium::data_structures::texture_store::TextureEntry {
    scene
        .textures
        .iter()
        .find(|(_, entry)| entry.source == TextureSource::File(path.to_string()))
        .map(|(_, entry)| entry)
        .unwrap_or_else(|| panic!("no texture for {path:?}"))
}

#[test]
fn tracks_three_cubes_in_creation_order() {
    let (world, _loader) = build_world_without_assets(1);
    let config = SceneConfig::default();

    assert_eq!(world.animated.cubes.len(), 3);
    for (idx, id) in world.animated.cubes.iter().enumerate() {
        let node = world.scene.get(*id).expect("cube");
        assert_eq!(node.name, format!("cube {idx}"));
        assert_close(node.local.position.x, config.cube_offsets[idx]);
        assert_close(node.local.position.y, 1.0);
        assert_close(node.local.position.z, 6.0);
        let mesh = node.as_mesh().expect("cube mesh");
        assert_eq!(mesh.geometry, Geometry::cube(1.0));
        assert_eq!(mesh.material.color, Color::from_hex(config.cube_colors[idx]));
    }
}

#[test]
fn spheres_are_the_globe_followed_by_every_bubble() {
    let (world, _loader) = build_world_without_assets(1);
    let count = SceneConfig::default().bubbles.count;

    assert_eq!(world.animated.spheres.len(), count + 1);
    let globe = world.scene.get(world.animated.spheres[0]).expect("globe");
    assert_eq!(globe.name, "globe");
    assert_eq!(globe.get_parent(), Some(world.scene.root()));

    let (tank, _) = find(&world.scene, "tank");
    for (idx, id) in world.animated.spheres[1..].iter().enumerate() {
        let bubble = world.scene.get(*id).expect("bubble");
        assert_eq!(bubble.name, format!("bubble {idx}"));
        assert_eq!(bubble.get_parent(), Some(tank));
        assert!(matches!(
            bubble.as_mesh().map(|m| &m.geometry),
            Some(Geometry::Sphere { .. })
        ));
    }
}

#[test]
fn bubble_count_follows_configuration() {
    let mut config = SceneConfig::default();
    config.bubbles.count = 5;
    let mut loader = inline_loader("/nonexistent");
    let world = SceneBuilder::new(&config).build(&mut seeded_rng(2), &mut loader);
    assert_eq!(world.animated.spheres.len(), 6);

    config.bubbles.count = 0;
    let world = SceneBuilder::new(&config).build(&mut seeded_rng(2), &mut loader);
    assert_eq!(world.animated.spheres.len(), 1);
}

#[test]
fn bubbles_stay_within_their_ranges() {
    let config = SceneConfig::default().bubbles;
    let mut rng = seeded_rng(11);
    for _ in 0..500 {
        let bubble = Bubble::draw(&config, &mut rng);
        assert!(bubble.radius >= config.min_radius);
        assert!(bubble.radius <= config.min_radius + config.radius_range);
        assert!((6..16).contains(&bubble.width_segments));
        assert!((4..12).contains(&bubble.height_segments));
        for axis in 0..3 {
            assert!(bubble.position[axis] >= config.min[axis]);
            assert!(bubble.position[axis] <= config.max[axis]);
        }
    }
}

#[test]
fn bubble_variants_follow_the_configured_probability() {
    let config = SceneConfig::default().bubbles;
    let mut rng = seeded_rng(7);
    let draws = 4000;
    let translucent = (0..draws)
        .filter(|_| Bubble::draw(&config, &mut rng).variant == BubbleVariant::Translucent)
        .count() as f64;
    let globe = draws as f64 - translucent;

    let p = config.translucent_probability as f64;
    let expected_translucent = draws as f64 * p;
    let expected_globe = draws as f64 * (1.0 - p);
    let chi_square = (translucent - expected_translucent).powi(2) / expected_translucent
        + (globe - expected_globe).powi(2) / expected_globe;
    // one degree of freedom, p = 0.001
    assert!(chi_square < 10.83, "chi square {chi_square}");
}

#[test]
fn same_seed_builds_the_same_world() {
    let (first, _a) = build_world_without_assets(42);
    let (second, _b) = build_world_without_assets(42);
    assert_eq!(first, second);
}

#[test]
fn one_loader_builds_identical_worlds() {
    let config = SceneConfig::default();
    let mut loader = inline_loader("/nonexistent/aquarium-assets");
    let first = SceneBuilder::new(&config).build(&mut seeded_rng(42), &mut loader);
    let second = SceneBuilder::new(&config).build(&mut seeded_rng(42), &mut loader);

    assert_eq!(first.scene.textures.len(), second.scene.textures.len());
    assert_eq!(first, second);

    let expected = [
        ("ground", &config.ground_texture),
        ("globe", &config.globe_texture),
        ("back panel", &config.tank.back_texture),
        ("sand", &config.tank.sand_texture),
    ];
    for world in [&first, &second] {
        for (name, path) in expected {
            let (_, node) = find(&world.scene, name);
            let map = node.as_mesh().and_then(|mesh| mesh.material.map).expect("mapped mesh");
            let entry = world.scene.textures.get(map).expect("registered texture");
            assert_eq!(entry.source, TextureSource::File(path.clone()), "{name} has the wrong map");
        }
        let Background::CubeMap(sky) = world.scene.background else {
            panic!("expected a cube map background");
        };
        let sky = world.scene.textures.get(sky).expect("sky texture");
        assert!(matches!(sky.source, TextureSource::CubeFaces(_)));
    }
}

#[test]
fn different_seeds_place_bubbles_differently() {
    let (first, _a) = build_world_without_assets(1);
    let (second, _b) = build_world_without_assets(2);
    let positions = |world: &aquarium::World| {
        world.animated.spheres[1..]
            .iter()
            .map(|id| world.scene.get(*id).expect("bubble").local.position)
            .collect::<Vec<_>>()
    };
    assert_ne!(positions(&first), positions(&second));
}

#[test]
fn fish_are_posed_groups_inside_the_tank() {
    let (world, _loader) = build_world_without_assets(1);
    let config = SceneConfig::default().fish;
    let (tank, _) = find(&world.scene, "tank");

    assert_eq!(world.animated.fish.len(), config.depths.len());
    for (id, depth) in world.animated.fish.iter().zip(&config.depths) {
        let fish = world.scene.get(*id).expect("fish");
        assert_eq!(fish.get_parent(), Some(tank));
        assert_close(fish.local.position.x, 0.0);
        assert_close(fish.local.position.y, 1.0);
        assert_close(fish.local.position.z, *depth);
        assert_close(fish.local.scale.x, config.scale);
        // the model placeholder group
        assert_eq!(fish.get_children().len(), 1);
    }
}

#[test]
fn tank_holds_its_parts_and_light() {
    let (world, _loader) = build_world_without_assets(1);
    let (tank, tank_node) = find(&world.scene, "tank");
    let config = SceneConfig::default().tank;
    assert_close(tank_node.local.position.y, config.position[1]);

    for part in ["water", "glass", "back panel", "top panel", "sand", "tank light"] {
        let (_, node) = find(&world.scene, part);
        assert_eq!(node.get_parent(), Some(tank), "{part} is not in the tank");
    }

    let (_, water) = find(&world.scene, "water");
    let water = &water.as_mesh().expect("water mesh").material;
    assert!(water.transparent);
    assert_close(water.opacity, config.water_opacity);

    let (_, light) = find(&world.scene, "tank light");
    assert!(matches!(light.as_light(), Some(Light::Point { distance, .. }) if *distance == config.light_distance));
}

#[test]
fn lights_are_sun_ambient_and_sky() {
    let (world, _loader) = build_world_without_assets(1);
    let (_, sun) = find(&world.scene, "sun");
    assert!(matches!(sun.as_light(), Some(Light::Directional { intensity, .. }) if *intensity == 3.0));
    let (_, ambient) = find(&world.scene, "ambient");
    assert!(matches!(ambient.as_light(), Some(Light::Ambient { .. })));
    let (_, sky) = find(&world.scene, "sky");
    assert!(matches!(sky.as_light(), Some(Light::Hemisphere { .. })));

    let mut config = SceneConfig::default();
    config.hemisphere_light = false;
    let world = SceneBuilder::new(&config).build(&mut seeded_rng(1), &mut inline_loader("/nonexistent"));
    assert!(world.scene.iter().all(|(_, node)| node.name != "sky"));
}

#[test]
fn ground_texture_is_configured_before_it_arrives() {
    let (world, _loader) = build_world_without_assets(1);
    let (_, ground) = find(&world.scene, "ground");
    assert!(matches!(ground.kind, NodeKind::Mesh(_)));

    let entry = texture_for(&world.scene, "checker.png");
    assert_eq!(entry.state, LoadState::Pending);
    assert_eq!(entry.config.wrap_s, Wrapping::Repeat);
    assert_eq!(entry.config.wrap_t, Wrapping::Repeat);
    assert_eq!(entry.config.mag_filter, Filter::Nearest);
    assert_eq!(entry.config.repeat, [20.0, 20.0]);
}

#[test]
fn background_follows_the_skybox_setting() {
    let (world, _loader) = build_world_without_assets(1);
    assert!(matches!(world.scene.background, Background::CubeMap(_)));

    let mut config = SceneConfig::default();
    config.skybox = Skybox::Color(0x112233);
    let world = SceneBuilder::new(&config).build(&mut seeded_rng(1), &mut inline_loader("/nonexistent"));
    assert_eq!(world.scene.background, Background::Color(Color::from_hex(0x112233)));
}

#[test]
fn camera_comes_from_configuration() {
    let (world, _loader) = build_world_without_assets(1);
    assert_close(world.camera.position.y, 8.0);
    assert_close(world.camera.position.z, 16.0);
    assert_close(world.camera.target.y, 3.0);
    assert_close(world.camera.projection.aspect, 2.0);
    assert_close(world.camera.projection.fovy.0, 75f32.to_radians());
}

#[test]
fn shipped_assets_fill_every_placeholder() {
    let (mut world, mut loader) = build_world(1);
    assert!(loader.wait_idle(&mut world.scene, Duration::from_secs(10)));

    for (_, entry) in world.scene.textures.iter() {
        assert!(entry.is_ready(), "{:?} did not load", entry.source);
    }
    let Background::CubeMap(sky) = world.scene.background else {
        panic!("expected a cube map background");
    };
    let sky = world.scene.textures.get(sky).expect("sky texture");
    assert_eq!(sky.config.color_space, ColorSpace::Srgb);
    assert_eq!(sky.config.mapping, Mapping::CubeReflection);

    for id in &world.animated.fish {
        let model = world.scene.get_children(*id)[0];
        let meshes = world.scene.get_children(model);
        assert!(!meshes.is_empty());
        let mesh = world.scene.get(meshes[0]).and_then(Node::as_mesh).expect("fish mesh");
        assert!(matches!(mesh.geometry, Geometry::Custom(_)));
        assert!(mesh.material.map.is_some());
    }
    assert_eq!(loader.manager().failed(), 0);
    assert!(loader.manager().is_idle());
}

#[test]
fn missing_assets_leave_placeholders_untextured() {
    let (mut world, mut loader) = build_world_without_assets(1);
    let nodes_before = world.scene.node_count();
    assert!(loader.wait_idle(&mut world.scene, Duration::from_secs(10)));

    assert_eq!(world.scene.node_count(), nodes_before);
    for (_, entry) in world.scene.textures.iter() {
        assert_eq!(entry.state, LoadState::Failed);
    }
    for id in &world.animated.fish {
        let model = world.scene.get_children(*id)[0];
        assert!(world.scene.get_children(model).is_empty());
    }
    assert_eq!(loader.manager().failed(), loader.manager().started());
}
