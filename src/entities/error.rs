//! Error types for scene construction, editing and asset resolution.
//!
//! Two error families:
//! - [`AssetError`] - raised by an [`AssetLoader`](super::loader::AssetLoader)
//!   when a URL cannot be fetched or decoded.
//! - [`SceneError`] - everything the engine itself reports. Per-placement
//!   variants (`UnknownAnimation`, `EmptyAnimation`, `UnknownFrame`,
//!   `UnknownImage`) are logged and skipped by the builder; whole-scene
//!   variants (`AssetResolution`, `MalformedRoom`) propagate to the caller.

use thiserror::Error;

/// Asset loader failure.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("asset not found: {0}")]
    NotFound(String),

    #[error("unsupported asset location: {0}")]
    Unsupported(String),

    #[error("failed to read {url}: {source}")]
    Io {
        url: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode image {url}: {message}")]
    Decode { url: String, message: String },

    #[error("invalid JSON in {url}: {source}")]
    Json {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Engine error.
#[derive(Debug, Error)]
pub enum SceneError {
    /// Placement references an animation the sprite sheet doesn't define.
    #[error("unknown animation '{0}'")]
    UnknownAnimation(String),

    /// Animation resolves to zero frames.
    #[error("animation '{0}' has no frames")]
    EmptyAnimation(String),

    /// Animation references a frame index outside the frame table.
    #[error("animation '{animation}' references missing frame {frame}")]
    UnknownFrame { animation: String, frame: usize },

    /// Frame references an image index outside the image pool.
    #[error("frame {frame} references missing image {image}")]
    UnknownImage { frame: usize, image: usize },

    /// Media slot has a file type no handler exists for.
    #[error("no file handler for '{ext}' files ({url})")]
    UnknownFrameHandler { ext: String, url: String },

    /// Room has no layout; placements are skipped.
    #[error("room has no layout")]
    MissingLayout,

    /// Loader rejected an asset needed by the scene.
    #[error("asset resolution failed: {0}")]
    AssetResolution(#[from] AssetError),

    /// Room descriptor (or sprite sheet) doesn't have the expected shape.
    #[error("malformed room: {0}")]
    MalformedRoom(String),

    #[error("no scene loaded")]
    NoScene,

    #[error("layer index {0} out of range")]
    LayerIndex(usize),

    #[error("unknown layer field '{0}'")]
    UnknownField(String),

    /// Field is computed from the frame table on animated layers.
    #[error("field '{0}' is derived from frameNo on animated layers")]
    DerivedField(String),

    #[error("field '{field}' expects {expected}, got '{got}'")]
    FieldType {
        field: String,
        expected: &'static str,
        got: String,
    },

    /// Reorder rows include an immovable layer.
    #[error("layer '{0}' is immovable")]
    ImmovableMoved(String),

    /// Reorder rows don't match the movable layer set.
    #[error("reorder mismatch: {0}")]
    ReorderMismatch(String),
}

/// Engine result alias.
pub type Result<T> = std::result::Result<T, SceneError>;
