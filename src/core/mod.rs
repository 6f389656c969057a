//! Core engine services - cache, clock, events, session
//!
//! These modules drive a scene, independent of any UI.

pub mod clock;
pub mod event_bus;
pub mod events;
pub mod image_cache;
pub mod session;

// Re-exports for convenience
pub use clock::AnimationClock;
pub use event_bus::EventBus;
pub use image_cache::{CacheStats, ImageCache};
pub use session::Session;
