//! ROOMVIEW - room layer composition and animation engine
//!
//! Re-exports all modules for use by the binary target.

// Core engine (cache, clock, events, session)
pub mod core;

// App modules
pub mod cli;
pub mod config;
pub mod entities;

// Re-export commonly used types from core
pub use crate::core::event_bus::{downcast_event, BoxedEvent, EventBus, EventEmitter};
pub use crate::core::session::Session;

// Re-export entities
pub use entities::{AttrValue, Attrs, Layer, Room, Scene, SceneError};
