//! Asynchronous asset loading into a [`Scene`].
//!
//! Every request hands back a usable handle right away: a pending texture
//! entry or an empty group node. The actual IO and decoding run on a
//! [`Spawner`] and report back through a channel. Nothing touches the scene
//! until the owner calls [`AssetLoader::apply_completed`] on the frame thread.

use std::{
    collections::HashMap,
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
        mpsc::{self, Receiver, Sender},
    },
};

use image::RgbaImage;

use crate::{
    data_structures::{
        geometry::{Geometry, MeshData},
        scene_graph::{Node, NodeId, Scene},
        texture_store::{
            ColorSpace, LoadState, StoreOwner, TextureConfig, TextureData, TextureId, TextureSource,
            TextureStore,
        },
    },
    resources::{self, mesh},
};

/// Natively loads run on tokio workers and have to be `Send`.
#[cfg(not(target_arch = "wasm32"))]
pub trait MaybeSend: Send + 'static {}
#[cfg(not(target_arch = "wasm32"))]
impl<T: Send + 'static> MaybeSend for T {}

#[cfg(target_arch = "wasm32")]
pub trait MaybeSend: 'static {}
#[cfg(target_arch = "wasm32")]
impl<T: 'static> MaybeSend for T {}

/// Where load futures run.
#[derive(Clone, Debug)]
pub enum Spawner {
    #[cfg(not(target_arch = "wasm32"))]
    Tokio(tokio::runtime::Handle),
    /// The browser's microtask queue.
    #[cfg(target_arch = "wasm32")]
    Local,
    /// Runs each load to completion before the request returns. The result is
    /// still queued, so the placeholder semantics stay the same.
    Inline,
}

impl Spawner {
    pub fn spawn(&self, fut: impl Future<Output = ()> + MaybeSend) {
        match self {
            #[cfg(not(target_arch = "wasm32"))]
            Spawner::Tokio(handle) => {
                handle.spawn(fut);
            }
            #[cfg(target_arch = "wasm32")]
            Spawner::Local => wasm_bindgen_futures::spawn_local(fut),
            Spawner::Inline => futures::executor::block_on(fut),
        }
    }
}

#[derive(Debug, Default)]
struct Progress {
    started: AtomicUsize,
    loaded: AtomicUsize,
    failed: AtomicUsize,
}

/// Progress shared by every loader created from the same manager.
#[derive(Clone, Debug, Default)]
pub struct LoadingManager {
    progress: Arc<Progress>,
}

impl LoadingManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn item_start(&self, url: &str) {
        let started = self.progress.started.fetch_add(1, Ordering::SeqCst) + 1;
        log::debug!("Started loading {url} ({}/{started})", self.finished());
    }

    pub fn item_end(&self, url: &str) {
        self.progress.loaded.fetch_add(1, Ordering::SeqCst);
        log::info!("Loaded {url} ({}/{})", self.finished(), self.started());
        self.log_if_idle();
    }

    pub fn item_error(&self, url: &str, error: &anyhow::Error) {
        self.progress.failed.fetch_add(1, Ordering::SeqCst);
        log::warn!("Failed to load {url}: {error:#}");
        self.log_if_idle();
    }

    pub fn started(&self) -> usize {
        self.progress.started.load(Ordering::SeqCst)
    }

    pub fn loaded(&self) -> usize {
        self.progress.loaded.load(Ordering::SeqCst)
    }

    pub fn failed(&self) -> usize {
        self.progress.failed.load(Ordering::SeqCst)
    }

    pub fn finished(&self) -> usize {
        self.loaded() + self.failed()
    }

    pub fn is_idle(&self) -> bool {
        self.finished() >= self.started()
    }

    fn log_if_idle(&self) {
        if self.is_idle() {
            log::info!(
                "All {} assets settled, {} failed",
                self.started(),
                self.failed()
            );
        }
    }
}

/// One mesh of a parsed model, with its MTL material if the file had one.
#[derive(Clone, Debug)]
pub struct LoadedMesh {
    pub name: String,
    pub data: MeshData,
    pub material: Option<tobj::Material>,
}

#[derive(Debug)]
enum Completion {
    Texture {
        owner: StoreOwner,
        id: TextureId,
        url: String,
        result: anyhow::Result<TextureData>,
    },
    Model {
        owner: StoreOwner,
        group: NodeId,
        mtl: String,
        url: String,
        result: anyhow::Result<Vec<LoadedMesh>>,
    },
}

type ConfigHook = Box<dyn FnOnce(&mut TextureConfig)>;

pub struct AssetLoader {
    root: String,
    spawner: Spawner,
    manager: LoadingManager,
    sender: Sender<Completion>,
    receiver: Receiver<Completion>,
    hooks: HashMap<(StoreOwner, TextureId), Vec<ConfigHook>>,
    in_flight: usize,
}

impl std::fmt::Debug for AssetLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetLoader")
            .field("root", &self.root)
            .field("spawner", &self.spawner)
            .field("in_flight", &self.in_flight)
            .finish()
    }
}

impl AssetLoader {
    pub fn new(root: impl Into<String>, spawner: Spawner, manager: LoadingManager) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            root: root.into(),
            spawner,
            manager,
            sender,
            receiver,
            hooks: HashMap::new(),
            in_flight: 0,
        }
    }

    pub fn manager(&self) -> &LoadingManager {
        &self.manager
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    /// Requests that have not been applied to a scene yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /**
     * Requests a 2D texture. Within one store the same path always maps to
     * the same id, so materials sharing an image share one entry and one
     * upload.
     */
    pub fn load_texture(&mut self, textures: &mut TextureStore, path: &str) -> TextureId {
        let source = TextureSource::File(path.to_string());
        if let Some(id) = textures.find(&source) {
            return id;
        }
        let id = textures.register(source);
        let owner = textures.owner();

        let root = self.root.clone();
        let url = path.to_string();
        self.start(url.clone(), async move {
            let result = resources::load_image(&root, &url).await.map(TextureData::Image);
            Completion::Texture {
                owner,
                id,
                url,
                result,
            }
        });
        id
    }

    /// Requests a cube map from six faces in +x, -x, +y, -y, +z, -z order.
    pub fn load_cube_texture(&mut self, textures: &mut TextureStore, faces: [&str; 6]) -> TextureId {
        let faces = faces.map(str::to_string);
        let source = TextureSource::CubeFaces(faces.clone());
        if let Some(id) = textures.find(&source) {
            return id;
        }
        let id = textures.register(source);
        let owner = textures.owner();

        let root = self.root.clone();
        let url = faces.join(", ");
        self.start(url.clone(), async move {
            let loads = faces.iter().map(|face| resources::load_image(&root, face));
            let result = futures::future::try_join_all(loads)
                .await
                .and_then(|images| check_cube_faces(images).map(TextureData::Cube));
            Completion::Texture {
                owner,
                id,
                url,
                result,
            }
        });
        id
    }

    /// Configuration hooks still waiting for their texture.
    pub fn pending_hooks(&self) -> usize {
        self.hooks.values().map(Vec::len).sum()
    }

    /// Runs `hook` on the texture's configuration once its data is there,
    /// right away if it already is. Hooks of failed loads never run.
    pub fn on_texture_load(
        &mut self,
        textures: &mut TextureStore,
        id: TextureId,
        hook: impl FnOnce(&mut TextureConfig) + 'static,
    ) {
        match textures.get(id).map(|entry| &entry.state) {
            Some(LoadState::Ready(_)) => textures.configure(id, hook),
            Some(LoadState::Pending) => self
                .hooks
                .entry((textures.owner(), id))
                .or_default()
                .push(Box::new(hook)),
            Some(LoadState::Failed) => log::debug!("Texture {} failed to load, hook dropped", id.index()),
            None => log::warn!("Texture {} does not exist, hook dropped", id.index()),
        }
    }

    /**
     * Requests a model made of an MTL and an OBJ file.
     *
     * Returns an empty group below `parent`. The meshes are added to it once
     * the files are parsed. Textures named by the MTL are requested relative
     * to the MTL file.
     */
    pub fn load_model(&mut self, scene: &mut Scene, parent: NodeId, mtl: &str, obj: &str) -> NodeId {
        let group = scene.add_child(parent, Node::group(obj));
        let owner = scene.textures.owner();

        let root = self.root.clone();
        let url = obj.to_string();
        let mtl = mtl.to_string();
        self.start(url.clone(), async move {
            let result = load_meshes(&root, &mtl, &url).await;
            Completion::Model {
                owner,
                group,
                mtl,
                url,
                result,
            }
        });
        group
    }

    /// Applies everything that finished since the last call. Returns how many
    /// requests were settled.
    pub fn apply_completed(&mut self, scene: &mut Scene) -> usize {
        let mut applied = 0;
        while let Ok(completion) = self.receiver.try_recv() {
            self.apply(scene, completion);
            applied += 1;
        }
        applied
    }

    /**
     * Blocks until no request is in flight or `timeout` passes, applying
     * completions as they arrive. Returns `true` when everything settled.
     *
     * Model completions may request textures, which are waited for as well.
     */
    #[cfg(not(target_arch = "wasm32"))]
    pub fn wait_idle(&mut self, scene: &mut Scene, timeout: std::time::Duration) -> bool {
        let deadline = std::time::Instant::now() + timeout;
        self.apply_completed(scene);
        while self.in_flight > 0 {
            let remaining = deadline.saturating_duration_since(std::time::Instant::now());
            match self.receiver.recv_timeout(remaining) {
                Ok(completion) => self.apply(scene, completion),
                Err(_) => {
                    log::warn!("{} asset loads still pending after {:?}", self.in_flight, timeout);
                    return false;
                }
            }
        }
        true
    }

    fn start<F>(&mut self, url: String, load: F)
    where
        F: Future<Output = Completion> + MaybeSend,
    {
        self.manager.item_start(&url);
        self.in_flight += 1;
        let sender = self.sender.clone();
        self.spawner.spawn(async move {
            // The receiver only goes away with the loader, nobody is left to care.
            let _ = sender.send(load.await);
        });
    }

    fn apply(&mut self, scene: &mut Scene, completion: Completion) {
        self.in_flight = self.in_flight.saturating_sub(1);
        let owner = match &completion {
            Completion::Texture { owner, .. } | Completion::Model { owner, .. } => *owner,
        };
        if owner != scene.textures.owner() {
            self.discard(completion);
            return;
        }
        match completion {
            Completion::Texture { id, url, result, .. } => match result {
                Ok(data) => {
                    scene.textures.complete(id, data);
                    for hook in self.hooks.remove(&(owner, id)).unwrap_or_default() {
                        scene.textures.configure(id, hook);
                    }
                    self.manager.item_end(&url);
                }
                Err(e) => {
                    scene.textures.fail(id);
                    self.hooks.remove(&(owner, id));
                    self.manager.item_error(&url, &e);
                }
            },
            Completion::Model {
                group,
                mtl,
                url,
                result,
                ..
            } => match result {
                Ok(meshes) => {
                    for loaded in meshes {
                        let map = loaded
                            .material
                            .as_ref()
                            .and_then(|m| m.diffuse_texture.as_ref())
                            .map(|file| {
                                let path = resources::sibling_path(&mtl, file);
                                let source = TextureSource::File(path.clone());
                                if let Some(id) = scene.textures.find(&source) {
                                    return id;
                                }
                                let id = self.load_texture(&mut scene.textures, &path);
                                scene.textures.configure(id, |config| {
                                    config.color_space = ColorSpace::Srgb;
                                });
                                id
                            });
                        let material = match &loaded.material {
                            Some(mtl) => mesh::to_material(mtl, map),
                            None => Default::default(),
                        };
                        let geometry = Geometry::Custom(Arc::new(loaded.data));
                        scene.add_child(group, Node::mesh(loaded.name, geometry, material));
                    }
                    self.manager.item_end(&url);
                }
                Err(e) => self.manager.item_error(&url, &e),
            },
        }
    }

    /// Settles a request made for another scene without touching `scene`.
    fn discard(&mut self, completion: Completion) {
        let (owner, url, texture) = match completion {
            Completion::Texture { owner, id, url, .. } => (owner, url, Some(id)),
            Completion::Model { owner, url, .. } => (owner, url, None),
        };
        if let Some(id) = texture {
            self.hooks.remove(&(owner, id));
        }
        self.manager
            .item_error(&url, &anyhow::anyhow!("requested for a scene that is no longer being applied"));
    }
}

fn check_cube_faces(faces: Vec<RgbaImage>) -> anyhow::Result<Vec<RgbaImage>> {
    let Some((width, height)) = faces.first().map(|face| face.dimensions()) else {
        anyhow::bail!("A cube map needs 6 faces, got none");
    };
    if faces.len() != 6 || faces.iter().any(|face| face.dimensions() != (width, height)) {
        anyhow::bail!("A cube map needs 6 faces of the same size");
    }
    if width != height {
        anyhow::bail!("Cube map faces must be square, got {width}x{height}");
    }
    Ok(faces)
}

async fn load_meshes(root: &str, mtl: &str, obj: &str) -> anyhow::Result<Vec<LoadedMesh>> {
    let mtl_text = resources::load_string(root, mtl).await?;
    let obj_text = resources::load_string(root, obj).await?;
    let (models, materials) = resources::parse_obj(obj_text, mtl_text).await?;
    if models.is_empty() {
        anyhow::bail!("{obj} contains no meshes");
    }
    Ok(models
        .iter()
        .map(|model| LoadedMesh {
            name: model.name.clone(),
            data: mesh::to_mesh_data(model),
            material: model
                .mesh
                .material_id
                .or(if materials.is_empty() { None } else { Some(0) })
                .and_then(|idx| materials.get(idx).cloned()),
        })
        .collect())
}
