//! Entities - scene data types and the passes over them
//!
//! Leaves first:
//! - `attrs`, `keys` - typed field table and the layer field schema
//! - `sprite_sheet` - frame table, animation resolution, frame lookup
//! - `layer` - one drawable layer, explicit patch-on-write field updates
//! - `room`, `manifest` - room descriptors and manifest indirection
//! - `builder` - room descriptor to ordered layer stack
//! - `scene` - layer stack, edits, reorder, frame advance
//! - `compositor` - draws a scene onto a `Surface`

pub mod attrs;
pub mod builder;
pub mod canvas;
pub mod compositor;
pub mod error;
pub mod image;
pub mod keys;
pub mod layer;
pub mod loader;
pub mod manifest;
pub mod room;
pub mod scene;
pub mod sprite_sheet;
pub mod surface;

pub use attrs::{AttrValue, Attrs};
pub use builder::SceneBuilder;
pub use canvas::Canvas;
pub use error::{AssetError, Result, SceneError};
pub use image::{AudioHandle, Image};
pub use layer::{Layer, LayerKind, LayerSource};
pub use loader::{AssetLoader, FsLoader, MemoryLoader};
pub use room::Room;
pub use scene::{LayerRow, Scene};
pub use sprite_sheet::{FrameGeometry, FrameSet, SpriteSheet};
pub use surface::{Rect, RecordingSurface, Surface};
