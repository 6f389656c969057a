//! Asset loading seam.
//!
//! The engine never touches files or the network directly; it asks an
//! [`AssetLoader`] to turn a URL into a decoded image, a JSON document or an
//! audio handle. Backends:
//! - [`FsLoader`] - resolves URLs against a root directory, decodes with `image`
//! - [`MemoryLoader`] - in-memory assets, counts decodes (embedding, tests)

use std::cell::Cell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::{debug, trace};

use super::error::AssetError;
use super::image::{AudioHandle, Image};

/// Resolves URLs to decoded assets.
pub trait AssetLoader {
    /// Fetch and parse a JSON document.
    fn fetch_json(&self, url: &str) -> Result<serde_json::Value, AssetError>;

    /// Fetch and decode an image.
    fn load_image(&self, url: &str) -> Result<Image, AssetError>;

    /// Audio handles are lazy: construction never fails.
    fn load_audio(&self, url: &str) -> AudioHandle {
        AudioHandle::new(url)
    }
}

/// What a media URL decodes to, by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Audio,
}

impl MediaKind {
    /// Dispatch on the URL's extension (case-insensitive, query ignored).
    pub fn from_url(url: &str) -> Option<MediaKind> {
        match url_ext(url).as_str() {
            "png" | "jpg" | "jpeg" | "webp" => Some(MediaKind::Image),
            "mp3" | "ogg" | "wav" => Some(MediaKind::Audio),
            _ => None,
        }
    }
}

/// Lowercased extension of a URL path.
pub fn url_ext(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rsplit_once('.') {
        Some((_, ext)) => ext.to_ascii_lowercase(),
        None => String::new(),
    }
}

/// Filesystem loader rooted at a directory.
///
/// Relative URLs and `file://` URLs resolve against `root`; absolute paths
/// are used as-is. Network URLs are rejected.
#[derive(Debug, Clone)]
pub struct FsLoader {
    root: PathBuf,
}

impl FsLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, url: &str) -> Result<PathBuf, AssetError> {
        if url.starts_with("http://") || url.starts_with("https://") {
            return Err(AssetError::Unsupported(url.to_string()));
        }
        let raw = url.strip_prefix("file://").unwrap_or(url);
        let path = Path::new(raw);
        let full = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        };
        if !full.exists() {
            return Err(AssetError::NotFound(full.display().to_string()));
        }
        Ok(full)
    }
}

impl AssetLoader for FsLoader {
    fn fetch_json(&self, url: &str) -> Result<serde_json::Value, AssetError> {
        let path = self.resolve(url)?;
        debug!("Fetching JSON {}", path.display());
        let text = std::fs::read_to_string(&path).map_err(|source| AssetError::Io {
            url: url.to_string(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| AssetError::Json {
            url: url.to_string(),
            source,
        })
    }

    fn load_image(&self, url: &str) -> Result<Image, AssetError> {
        let path = self.resolve(url)?;
        debug!("Decoding image {}", path.display());
        let img = image::open(&path).map_err(|e| AssetError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        Ok(Image::from_rgba(img.to_rgba8()))
    }
}

/// In-memory loader.
#[derive(Debug, Default)]
pub struct MemoryLoader {
    images: HashMap<String, Image>,
    documents: HashMap<String, serde_json::Value>,
    image_loads: Cell<usize>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image(mut self, url: impl Into<String>, image: Image) -> Self {
        self.images.insert(url.into(), image);
        self
    }

    pub fn with_json(mut self, url: impl Into<String>, doc: serde_json::Value) -> Self {
        self.documents.insert(url.into(), doc);
        self
    }

    /// Number of `load_image` calls served so far (hits and misses).
    pub fn image_loads(&self) -> usize {
        self.image_loads.get()
    }
}

impl AssetLoader for MemoryLoader {
    fn fetch_json(&self, url: &str) -> Result<serde_json::Value, AssetError> {
        self.documents
            .get(url)
            .cloned()
            .ok_or_else(|| AssetError::NotFound(url.to_string()))
    }

    fn load_image(&self, url: &str) -> Result<Image, AssetError> {
        self.image_loads.set(self.image_loads.get() + 1);
        trace!("MemoryLoader::load_image({})", url);
        self.images
            .get(url)
            .cloned()
            .ok_or_else(|| AssetError::NotFound(url.to_string()))
    }
}

impl<L: AssetLoader + ?Sized> AssetLoader for &L {
    fn fetch_json(&self, url: &str) -> Result<serde_json::Value, AssetError> {
        (**self).fetch_json(url)
    }

    fn load_image(&self, url: &str) -> Result<Image, AssetError> {
        (**self).load_image(url)
    }

    fn load_audio(&self, url: &str) -> AudioHandle {
        (**self).load_audio(url)
    }
}
