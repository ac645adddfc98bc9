use aquarium::data_structures::{
    instance::Transform,
    scene_graph::{Node, Scene},
};
use cgmath::Vector4;

use crate::common::test_utils::assert_close;

mod common;

#[test]
fn new_scene_has_only_the_root() {
    let scene = Scene::new();
    assert_eq!(scene.node_count(), 1);
    let root = scene.get(scene.root()).expect("root");
    assert_eq!(root.get_parent(), None);
    assert!(root.get_children().is_empty());
}

#[test]
fn world_transforms_compose_parent_first() {
    let mut scene = Scene::new();
    let outer = scene.add(Node::group("outer").with_transform(Transform::at(1.0, 2.0, 3.0)));
    let inner = scene.add_child(
        outer,
        Node::group("inner").with_transform(Transform::at(0.0, 1.0, 0.0).with_scale(2.0, 2.0, 2.0)),
    );
    let leaf = scene.add_child(inner, Node::group("leaf").with_transform(Transform::at(1.0, 0.0, 0.0)));
    scene.update_world_transforms();

    let origin = scene.get(leaf).expect("leaf").get_world_transform() * Vector4::new(0.0, 0.0, 0.0, 1.0);
    assert_close(origin.x, 3.0);
    assert_close(origin.y, 3.0);
    assert_close(origin.z, 3.0);
}

#[test]
fn moving_a_parent_moves_its_children() {
    let mut scene = Scene::new();
    let parent = scene.add(Node::group("parent"));
    let child = scene.add_child(parent, Node::group("child").with_transform(Transform::at(0.0, 0.0, 1.0)));
    scene.update_world_transforms();

    scene.set_local_transform(parent, Transform::at(5.0, 0.0, 0.0));
    scene.update_world_transforms();

    let origin = scene.get(child).expect("child").get_world_transform().w;
    assert_close(origin.x, 5.0);
    assert_close(origin.z, 1.0);
}

#[test]
fn world_transforms_wait_for_an_update() {
    let mut scene = Scene::new();
    let node = scene.add(Node::group("node").with_transform(Transform::at(4.0, 0.0, 0.0)));
    assert_close(scene.get(node).expect("node").get_world_transform().w.x, 0.0);

    scene.update_world_transforms();
    assert_close(scene.get(node).expect("node").get_world_transform().w.x, 4.0);
}

#[test]
fn unknown_parent_falls_back_to_the_root() {
    let mut other = Scene::new();
    let mut foreign = other.root();
    for idx in 0..5 {
        foreign = other.add(Node::group(format!("n{idx}")));
    }

    let mut scene = Scene::new();
    let orphan = scene.add_child(foreign, Node::group("orphan"));

    assert_eq!(scene.get(orphan).expect("orphan").get_parent(), Some(scene.root()));
    assert_eq!(scene.get_children(scene.root()), &[orphan]);
}

#[test]
fn visit_skips_hidden_subtrees() {
    let mut scene = Scene::new();
    let shown = scene.add(Node::group("shown"));
    let hidden = scene.add(Node::group("hidden"));
    scene.add_child(hidden, Node::group("hidden child"));
    scene.add_child(shown, Node::group("shown child"));
    scene.get_mut(hidden).expect("hidden").visible = false;

    let mut names = Vec::new();
    scene.visit(|_, node| names.push(node.name.clone()));

    assert_eq!(names, vec!["root", "shown", "shown child"]);
}

#[test]
fn stale_handles_resolve_to_nothing() {
    let mut big = Scene::new();
    let mut far = big.root();
    for idx in 0..3 {
        far = big.add(Node::group(format!("n{idx}")));
    }

    let mut scene = Scene::new();
    assert!(scene.get(far).is_none());
    assert!(scene.get_mut(far).is_none());
    assert!(scene.get_children(far).is_empty());
    scene.set_local_transform(far, Transform::at(1.0, 1.0, 1.0));
    assert_eq!(scene.node_count(), 1);
}
