//! Scene graph and hierarchical scene organization.
//!
//! The [`Scene`] owns every node in a flat arena and links them into a tree
//! below a root group. Nodes are addressed through [`NodeId`] handles that do
//! not own anything: looking one up returns `Option`, so code holding a handle
//! never keeps a node alive and never panics on a stale one.
//!
//! Nodes are never removed. Each one stores its local transform together with
//! the world transform computed by the last [`Scene::update_world_transforms`].

use cgmath::{Matrix4, SquareMatrix};
use log::warn;

use crate::data_structures::{
    geometry::Geometry,
    instance::Transform,
    light::Light,
    material::{Color, Material},
    texture_store::{TextureId, TextureStore},
};

/// Handle to a node inside one [`Scene`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// A renderable pairing of shape and appearance.
#[derive(Clone, Debug, PartialEq)]
pub struct Mesh {
    pub geometry: Geometry,
    pub material: Material,
}

#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    /// Only groups its children so they can be moved as one unit.
    Group,
    Mesh(Mesh),
    Light(Light),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub name: String,
    pub kind: NodeKind,
    pub local: Transform,
    pub visible: bool,
    world: Matrix4<f32>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            local: Transform::default(),
            visible: true,
            world: Matrix4::identity(),
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn group(name: impl Into<String>) -> Self {
        Self::new(name, NodeKind::Group)
    }

    pub fn mesh(name: impl Into<String>, geometry: Geometry, material: Material) -> Self {
        Self::new(name, NodeKind::Mesh(Mesh { geometry, material }))
    }

    pub fn light(name: impl Into<String>, light: Light) -> Self {
        Self::new(name, NodeKind::Light(light))
    }

    pub fn with_transform(mut self, local: Transform) -> Self {
        self.local = local;
        self
    }

    pub fn as_mesh(&self) -> Option<&Mesh> {
        match &self.kind {
            NodeKind::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }

    pub fn as_light(&self) -> Option<&Light> {
        match &self.kind {
            NodeKind::Light(light) => Some(light),
            _ => None,
        }
    }

    pub fn get_world_transform(&self) -> &Matrix4<f32> {
        &self.world
    }

    pub fn get_children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn get_parent(&self) -> Option<NodeId> {
        self.parent
    }
}

/// What gets drawn behind all scene content.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Background {
    #[default]
    None,
    Color(Color),
    /// A flat image stretched over the viewport.
    Texture(TextureId),
    CubeMap(TextureId),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    nodes: Vec<Node>,
    pub background: Background,
    pub textures: TextureStore,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::group("root")],
            background: Background::default(),
            textures: TextureStore::default(),
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Adds `node` directly below the root.
    pub fn add(&mut self, node: Node) -> NodeId {
        self.add_child(self.root(), node)
    }

    /**
     * Adds `node` below `parent`. An unknown parent is reported and the node
     * ends up below the root instead, so the returned handle is always valid.
     */
    pub fn add_child(&mut self, parent: NodeId, mut node: Node) -> NodeId {
        let parent = if parent.0 < self.nodes.len() {
            parent
        } else {
            warn!(
                "Parent {} does not exist in a scene of {} nodes. Attaching {:?} to the root.",
                parent.0,
                self.nodes.len(),
                node.name
            );
            self.root()
        };
        let id = NodeId(self.nodes.len());
        node.parent = Some(parent);
        node.children.clear();
        self.nodes.push(node);
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    pub fn set_local_transform(&mut self, id: NodeId, local: Transform) {
        if let Some(node) = self.nodes.get_mut(id.0) {
            node.local = local;
        }
    }

    pub fn get_children(&self, id: NodeId) -> &[NodeId] {
        match self.nodes.get(id.0) {
            Some(node) => &node.children,
            None => &[],
        }
    }

    /// Counts every node including the root.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(idx, node)| (NodeId(idx), node))
    }

    pub fn meshes(&self) -> impl Iterator<Item = (NodeId, &Node, &Mesh)> {
        self.iter()
            .filter_map(|(id, node)| node.as_mesh().map(|mesh| (id, node, mesh)))
    }

    /**
     * Recomputes every world transform top-down: `world = parent_world * local`.
     *
     * The arena is append-only and children are always pushed after their
     * parent, so a single forward pass sees each parent before its children.
     */
    pub fn update_world_transforms(&mut self) {
        for idx in 0..self.nodes.len() {
            let parent_world = match self.nodes[idx].parent {
                Some(parent) => self.nodes[parent.0].world,
                None => Matrix4::identity(),
            };
            let node = &mut self.nodes[idx];
            node.world = parent_world * node.local.to_matrix();
        }
    }

    /// Depth-first walk over the visible part of the tree, parents first.
    pub fn visit(&self, mut f: impl FnMut(NodeId, &Node)) {
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id.0];
            if !node.visible {
                continue;
            }
            f(id, node);
            stack.extend(node.children.iter().rev().copied());
        }
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}
