//! # Resource Loading
//!
//! Components that reference external files by path (sprite images, script
//! sources, animator controllers) are *hydrated* after a scene is built. The
//! core never touches storage directly: it asks a [`ResourceLoader`] for the
//! bytes or text behind a project-relative path.
//!
//! ```text
//! SpriteRenderer { source: "Assets/hero.png" }
//!        │
//!        ▼
//! ResourceLoader::url_for_asset_path ──► "file:///game/Assets/hero.png"
//! ResourceLoader::load_binary_asset  ──► PNG bytes ──► (image-decode) 32×32
//!        │
//!        ▼
//! sprite.image = ResourceState::Loaded(LoadedImage { .. })
//! ```
//!
//! Two loaders ship with the crate: [`FsResourceLoader`] reads from a project
//! directory and [`MemoryResourceLoader`] serves an in-memory map (tests,
//! tools, packed builds).
//!
//! ## Graceful Degradation
//!
//! Every loader method returns `Option`. A missing file is not an error at
//! this level; the hydration pass turns `None` into a
//! [`SceneError::ResourceLoadFailure`](crate::SceneError::ResourceLoadFailure),
//! logs it, and leaves the component [`ResourceState::Unavailable`].

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};

/// Load state of a resource referenced by a component.
///
/// Never serialized: a freshly built component is always `Unloaded`.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ResourceState<T> {
    #[default]
    Unloaded,
    Loaded(T),
    /// The resource could not be loaded; the string says why.
    Unavailable(String),
}

impl<T> ResourceState<T> {
    pub fn get(&self) -> Option<&T> {
        match self {
            ResourceState::Loaded(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, ResourceState::Loaded(_))
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, ResourceState::Unavailable(_))
    }
}

/// An image resolved during hydration.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedImage {
    pub url: String,
    /// Pixel dimensions, when the bytes were decoded.
    pub dimensions: Option<(u32, u32)>,
}

/// Storage backend used by the hydration pass.
///
/// Paths are project-relative, `/`-separated (`"Assets/Sprites/hero.png"`).
pub trait ResourceLoader {
    /// A URL a renderer can use to fetch the asset, or `None` if the asset
    /// does not exist.
    fn url_for_asset_path(&self, path: &str) -> impl Future<Output = Option<String>>;

    fn load_text_asset(&self, path: &str) -> impl Future<Output = Option<String>>;

    fn load_binary_asset(&self, path: &str) -> impl Future<Output = Option<Vec<u8>>>;
}

/// Split a project path into its components, dropping empty and `.` segments.
///
/// Returns `None` for paths that try to climb out of the project (`..`).
pub fn normalize_asset_path(path: &str) -> Option<String> {
    let mut parts = Vec::new();
    for part in path.split(['/', '\\']) {
        match part {
            "" | "." => {}
            ".." => return None,
            other => parts.push(other),
        }
    }
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("/"))
}

// ── Filesystem ───────────────────────────────────────────────────────────

/// Loads assets from a project directory on disk.
#[derive(Debug, Clone)]
pub struct FsResourceLoader {
    root: PathBuf,
}

impl FsResourceLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Option<PathBuf> {
        let relative = normalize_asset_path(path)?;
        let full = self.root.join(relative);
        full.is_file().then_some(full)
    }
}

impl ResourceLoader for FsResourceLoader {
    async fn url_for_asset_path(&self, path: &str) -> Option<String> {
        let full = self.resolve(path)?;
        let absolute = full.canonicalize().unwrap_or(full);
        Some(format!("file://{}", absolute.display()))
    }

    async fn load_text_asset(&self, path: &str) -> Option<String> {
        let full = self.resolve(path)?;
        match std::fs::read_to_string(&full) {
            Ok(text) => Some(text),
            Err(e) => {
                log::warn!("Failed to read '{}': {e}", full.display());
                None
            }
        }
    }

    async fn load_binary_asset(&self, path: &str) -> Option<Vec<u8>> {
        let full = self.resolve(path)?;
        match std::fs::read(&full) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                log::warn!("Failed to read '{}': {e}", full.display());
                None
            }
        }
    }
}

// ── In-memory ────────────────────────────────────────────────────────────

/// Serves assets from a map of normalized path → bytes.
#[derive(Debug, Clone, Default)]
pub struct MemoryResourceLoader {
    files: HashMap<String, Vec<u8>>,
}

impl MemoryResourceLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: &str, bytes: impl Into<Vec<u8>>) {
        match normalize_asset_path(path) {
            Some(key) => {
                self.files.insert(key, bytes.into());
            }
            None => log::warn!("Ignoring asset with unusable path '{path}'"),
        }
    }

    /// Builder form of [`insert`](Self::insert) for text assets.
    pub fn with_text(mut self, path: &str, text: &str) -> Self {
        self.insert(path, text.as_bytes());
        self
    }

    pub fn with_bytes(mut self, path: &str, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(path, bytes);
        self
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    fn get(&self, path: &str) -> Option<&Vec<u8>> {
        self.files.get(&normalize_asset_path(path)?)
    }
}

impl ResourceLoader for MemoryResourceLoader {
    async fn url_for_asset_path(&self, path: &str) -> Option<String> {
        self.get(path)?;
        normalize_asset_path(path).map(|p| format!("memory://{p}"))
    }

    async fn load_text_asset(&self, path: &str) -> Option<String> {
        let bytes = self.get(path)?;
        String::from_utf8(bytes.clone()).ok()
    }

    async fn load_binary_asset(&self, path: &str) -> Option<Vec<u8>> {
        self.get(path).cloned()
    }
}

// ── Image decoding ───────────────────────────────────────────────────────

/// Read the pixel dimensions of an encoded image.
#[cfg(feature = "image-decode")]
pub fn decode_image_dimensions(bytes: &[u8]) -> Result<(u32, u32), String> {
    let reader = image::ImageReader::new(std::io::Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| e.to_string())?;
    reader.into_dimensions().map_err(|e| e.to_string())
}

/// Resolve an image path to a [`LoadedImage`].
///
/// With the `image-decode` feature the bytes are fetched and decoded, and
/// undecodable data is an error. Without it only the URL is resolved.
pub(crate) async fn load_image(
    loader: &impl ResourceLoader,
    path: &str,
) -> Result<LoadedImage, String> {
    let url = loader
        .url_for_asset_path(path)
        .await
        .ok_or_else(|| "asset not found".to_string())?;

    #[cfg(feature = "image-decode")]
    {
        let bytes = loader
            .load_binary_asset(path)
            .await
            .ok_or_else(|| "asset could not be read".to_string())?;
        let dimensions = decode_image_dimensions(&bytes)?;
        Ok(LoadedImage {
            url,
            dimensions: Some(dimensions),
        })
    }

    #[cfg(not(feature = "image-decode"))]
    {
        Ok(LoadedImage {
            url,
            dimensions: None,
        })
    }
}
