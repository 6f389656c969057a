//! Session events.
//!
//! Every scene mutation emits one [`SceneChangedEvent`] after the full
//! recomposite it triggered, so observers always see a consistent surface.

use uuid::Uuid;

use crate::entities::compositor::RenderStats;

/// What changed in the scene.
#[derive(Clone, Debug, PartialEq)]
pub enum SceneChange {
    /// New room built and installed.
    Loaded { layers: usize },
    /// One field of one layer written.
    FieldEdited { layer: Uuid, field: String },
    VisibilityToggled { layer: Uuid, visible: bool },
    /// Movable layers permuted.
    Reordered,
    /// Animation tick (automatic or manual).
    FramesAdvanced { advanced: usize },
}

/// Emitted after a mutation and its recomposite.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneChangedEvent {
    pub generation: u64,
    pub change: SceneChange,
    pub stats: RenderStats,
}

/// Emitted when a room switch fails; the previous scene stays.
#[derive(Clone, Debug)]
pub struct RoomLoadFailedEvent {
    pub room: String,
    pub message: String,
}

/// Emitted when the hovered (previewed) layer changes.
#[derive(Clone, Debug, PartialEq)]
pub struct PreviewChangedEvent {
    pub layer: Option<Uuid>,
}
