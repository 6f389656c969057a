//! Manifest indirection: `{ kind: { src: url } }`.
//!
//! The manifest document maps an asset kind ("rooms", "items", ...) to the
//! URL of the document holding that kind. Room lists are arrays of room
//! descriptors; each gets `roomId` defaulted from `id` and `name` from `roomId`.

use std::collections::HashMap;

use log::{debug, warn};
use serde::Deserialize;

use super::error::{Result, SceneError};
use super::loader::AssetLoader;
use super::room::Room;

#[derive(Debug, Clone, Deserialize)]
pub struct ManifestEntry {
    pub src: String,
}

/// Parsed manifest document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    entries: HashMap<String, ManifestEntry>,
}

impl Manifest {
    pub fn fetch<L: AssetLoader + ?Sized>(loader: &L, url: &str) -> Result<Self> {
        let doc = loader.fetch_json(url)?;
        serde_json::from_value(doc).map_err(|e| SceneError::MalformedRoom(format!("manifest {}: {}", url, e)))
    }

    pub fn src(&self, kind: &str) -> Option<&str> {
        self.entries.get(kind).map(|e| e.src.as_str())
    }
}

/// Fetch the document the manifest points to for `kind`.
pub fn fetch_manifest<L: AssetLoader + ?Sized>(loader: &L, manifest_url: &str, kind: &str) -> Result<serde_json::Value> {
    let manifest = Manifest::fetch(loader, manifest_url)?;
    let src = manifest
        .src(kind)
        .ok_or_else(|| SceneError::MalformedRoom(format!("manifest has no '{}' entry", kind)))?;
    debug!("Manifest '{}' -> {}", kind, src);
    Ok(loader.fetch_json(src)?)
}

/// Selectable room: resolved id, display name and descriptor.
#[derive(Debug, Clone)]
pub struct RoomEntry {
    pub room_id: String,
    pub name: String,
    pub room: Room,
}

/// Room entries from the manifest's "rooms" document.
///
/// Entries that don't parse are logged and skipped.
pub fn load_rooms<L: AssetLoader + ?Sized>(loader: &L, manifest_url: &str) -> Result<Vec<RoomEntry>> {
    let doc = fetch_manifest(loader, manifest_url, "rooms")?;
    rooms_from_json(doc)
}

/// Room entries from an array of room descriptors.
pub fn rooms_from_json(doc: serde_json::Value) -> Result<Vec<RoomEntry>> {
    let serde_json::Value::Array(items) = doc else {
        return Err(SceneError::MalformedRoom("rooms document is not an array".to_string()));
    };

    let mut rooms = Vec::with_capacity(items.len());
    for (idx, item) in items.into_iter().enumerate() {
        let room = match Room::from_json(item) {
            Ok(room) => room,
            Err(e) => {
                warn!("Skipping room #{}: {}", idx, e);
                continue;
            }
        };
        let room_id = room.key().map(str::to_string).unwrap_or_else(|| format!("room{}", idx));
        let name = room.name.clone().unwrap_or_else(|| room_id.clone());
        rooms.push(RoomEntry { room_id, name, room });
    }
    Ok(rooms)
}

/// Find a room by id.
pub fn find_room<'a>(rooms: &'a [RoomEntry], room_id: &str) -> Option<&'a RoomEntry> {
    rooms.iter().find(|r| r.room_id == room_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::loader::MemoryLoader;
    use serde_json::json;

    #[test]
    fn test_rooms_via_manifest() {
        let loader = MemoryLoader::new()
            .with_json("manifest.json", json!({"rooms": {"src": "rooms.json"}}))
            .with_json(
                "rooms.json",
                json!([
                    {"id": "tavern", "width": 10, "height": 10},
                    {"roomId": "port", "name": "Harbor", "width": 5, "height": 5},
                    {"id": "broken"}
                ]),
            );
        let rooms = load_rooms(&loader, "manifest.json").unwrap();
        assert_eq!(rooms.len(), 2);
        assert_eq!(rooms[0].room_id, "tavern");
        assert_eq!(rooms[0].name, "tavern");
        assert_eq!(rooms[1].name, "Harbor");
        assert_eq!(find_room(&rooms, "port").map(|r| r.room.width), Some(5));
    }

    #[test]
    fn test_missing_kind() {
        let loader = MemoryLoader::new().with_json("m.json", json!({"items": {"src": "i.json"}}));
        assert!(matches!(fetch_manifest(&loader, "m.json", "rooms"), Err(SceneError::MalformedRoom(_))));
        assert!(matches!(fetch_manifest(&loader, "nope.json", "rooms"), Err(SceneError::AssetResolution(_))));
    }
}
