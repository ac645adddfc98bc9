//! CPU-side texture registry.
//!
//! A texture is requested by path and handed out as a [`TextureId`] before any
//! pixels exist. Materials reference the id; the asset loader fills in the
//! data once it arrives and the renderer re-uploads whenever the entry's
//! `version` changes.

use std::sync::atomic::{AtomicU64, Ordering};

use image::RgbaImage;

/// Shared reference to a texture owned by the scene's [`TextureStore`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub(crate) usize);

impl TextureId {
    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Wrapping {
    #[default]
    ClampToEdge,
    Repeat,
    MirroredRepeat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Filter {
    Nearest,
    #[default]
    Linear,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum ColorSpace {
    Srgb,
    #[default]
    Linear,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Mapping {
    #[default]
    Uv,
    /// Sampled by view direction; used for cube-map skyboxes.
    CubeReflection,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextureConfig {
    pub wrap_s: Wrapping,
    pub wrap_t: Wrapping,
    pub mag_filter: Filter,
    pub min_filter: Filter,
    pub color_space: ColorSpace,
    pub repeat: [f32; 2],
    pub mapping: Mapping,
}

impl Default for TextureConfig {
    fn default() -> Self {
        Self {
            wrap_s: Wrapping::default(),
            wrap_t: Wrapping::default(),
            mag_filter: Filter::default(),
            min_filter: Filter::default(),
            color_space: ColorSpace::default(),
            repeat: [1.0, 1.0],
            mapping: Mapping::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum TextureSource {
    File(String),
    /// Faces in +x, -x, +y, -y, +z, -z order.
    CubeFaces([String; 6]),
}

#[derive(Clone, Debug, PartialEq)]
pub enum TextureData {
    Image(RgbaImage),
    Cube(Vec<RgbaImage>),
}

impl TextureData {
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            TextureData::Image(img) => img.dimensions(),
            TextureData::Cube(faces) => faces.first().map_or((0, 0), |f| f.dimensions()),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum LoadState {
    Pending,
    Ready(TextureData),
    Failed,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TextureEntry {
    pub source: TextureSource,
    pub config: TextureConfig,
    pub state: LoadState,
    /// Bumped on every change to `config` or `state`.
    pub version: u32,
}

impl TextureEntry {
    pub fn data(&self) -> Option<&TextureData> {
        match &self.state {
            LoadState::Ready(data) => Some(data),
            _ => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, LoadState::Ready(_))
    }
}

/// Identifies one [`TextureStore`]. Ids handed out by a store are only
/// meaningful to the store with the same owner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StoreOwner(u64);

impl StoreOwner {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        StoreOwner(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Clone, Debug)]
pub struct TextureStore {
    owner: StoreOwner,
    entries: Vec<TextureEntry>,
}

impl Default for TextureStore {
    fn default() -> Self {
        Self {
            owner: StoreOwner::next(),
            entries: Vec::new(),
        }
    }
}

/// Two stores are equal when they hold the same entries, wherever they came from.
impl PartialEq for TextureStore {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl TextureStore {
    pub fn owner(&self) -> StoreOwner {
        self.owner
    }

    /// The entry already registered for `source`, if any.
    pub fn find(&self, source: &TextureSource) -> Option<TextureId> {
        self.entries
            .iter()
            .position(|entry| &entry.source == source)
            .map(TextureId)
    }

    pub fn register(&mut self, source: TextureSource) -> TextureId {
        self.entries.push(TextureEntry {
            source,
            config: TextureConfig::default(),
            state: LoadState::Pending,
            version: 0,
        });
        TextureId(self.entries.len() - 1)
    }

    pub fn get(&self, id: TextureId) -> Option<&TextureEntry> {
        self.entries.get(id.0)
    }

    /// Mutates the sampling configuration, whether or not the data has arrived.
    pub fn configure(&mut self, id: TextureId, mutation: impl FnOnce(&mut TextureConfig)) {
        if let Some(entry) = self.entries.get_mut(id.0) {
            mutation(&mut entry.config);
            entry.version += 1;
        }
    }

    pub(crate) fn complete(&mut self, id: TextureId, data: TextureData) {
        if let Some(entry) = self.entries.get_mut(id.0) {
            entry.state = LoadState::Ready(data);
            entry.version += 1;
        }
    }

    pub(crate) fn fail(&mut self, id: TextureId) {
        if let Some(entry) = self.entries.get_mut(id.0) {
            entry.state = LoadState::Failed;
            entry.version += 1;
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TextureId, &TextureEntry)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(idx, entry)| (TextureId(idx), entry))
    }
}
