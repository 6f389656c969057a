//! Room descriptor as delivered by the rooms manifest.
//!
//! ```json
//! { "width": 1520, "height": 760,
//!   "spriteSheet": "sheet.json" | { frames, animations, images },
//!   "layout": { "playground": [ {id, x, y, regX, regY}, ... ] | [[...], [...]] },
//!   "media": { "background": "bg.png", "foreground": "fg.png",
//!              "navMesh": "nav.png", "treasure": "t.png", "music": "m.mp3" } }
//! ```

use log::warn;
use serde::{Deserialize, Serialize};

use super::error::{Result, SceneError};
use super::sprite_sheet::SpriteSheet;

/// Positioned animation instance from the playground layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    /// Animation id in the sprite sheet.
    pub id: String,
    pub x: f32,
    pub y: f32,
    #[serde(default, rename = "regX")]
    pub reg_x: f32,
    #[serde(default, rename = "regY")]
    pub reg_y: f32,
}

/// Playground entries as delivered, flat or as a grid of rows.
///
/// Entries stay raw JSON until [`Playground::sorted`]; a malformed entry is
/// logged and dropped there instead of failing the whole room.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Playground(pub Vec<serde_json::Value>);

impl Playground {
    pub fn from_placements(items: impl IntoIterator<Item = Placement>) -> Self {
        Playground(
            items
                .into_iter()
                .filter_map(|p| serde_json::to_value(p).ok())
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parse entries, flatten rows row-major, then stable-sort by ascending `y`.
    pub fn sorted(&self) -> Vec<Placement> {
        let mut out = Vec::with_capacity(self.0.len());
        for entry in &self.0 {
            match entry {
                serde_json::Value::Array(row) => out.extend(row.iter().filter_map(parse_placement)),
                item => out.extend(parse_placement(item)),
            }
        }
        out.sort_by(|a, b| a.y.total_cmp(&b.y));
        out
    }
}

fn parse_placement(value: &serde_json::Value) -> Option<Placement> {
    match Placement::deserialize(value) {
        Ok(placement) => Some(placement),
        Err(e) => {
            warn!("Skipping playground entry {}: {}", value, e);
            None
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    #[serde(default)]
    pub playground: Playground,
}

/// Sprite sheet given inline or by URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SpriteSheetRef {
    Url(String),
    Inline(SpriteSheet),
}

/// Media slot: a URL, or an already-resolved object carrying `src`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MediaRef {
    Url(String),
    Object(serde_json::Value),
}

impl MediaRef {
    /// Source key of an already-resolved object.
    pub fn object_src(&self) -> Option<&str> {
        match self {
            MediaRef::Object(v) => v.get("src").and_then(|s| s.as_str()),
            MediaRef::Url(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Media {
    #[serde(default)]
    pub background: Option<MediaRef>,
    #[serde(default)]
    pub foreground: Option<MediaRef>,
    #[serde(default)]
    pub nav_mesh: Option<MediaRef>,
    #[serde(default)]
    pub treasure: Option<MediaRef>,
    #[serde(default)]
    pub music: Option<MediaRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub sprite_sheet: Option<SpriteSheetRef>,
    #[serde(default)]
    pub layout: Option<Layout>,
    #[serde(default)]
    pub media: Media,
}

impl Room {
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| SceneError::MalformedRoom(e.to_string()))
    }

    /// `roomId`, falling back to `id`.
    pub fn key(&self) -> Option<&str> {
        self.room_id.as_deref().or(self.id.as_deref())
    }

    /// `name`, falling back to the room key.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().or(self.key()).unwrap_or("untitled")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_grid_flattened_and_sorted() {
        let room = Room::from_json(json!({
            "width": 10, "height": 10,
            "layout": {"playground": [
                [{"id": "a", "x": 0, "y": 50}, {"id": "b", "x": 0, "y": 10}],
                [{"id": "c", "x": 0, "y": 30, "regX": 2, "regY": 3}]
            ]}
        }))
        .unwrap();
        let sorted = room.layout.unwrap().playground.sorted();
        let ys: Vec<f32> = sorted.iter().map(|p| p.y).collect();
        assert_eq!(ys, vec![10.0, 30.0, 50.0]);
        assert_eq!(sorted[1].reg_x, 2.0);
    }

    #[test]
    fn test_equal_y_keeps_input_order() {
        let pg = Playground::from_placements([
            Placement { id: "first".into(), x: 0.0, y: 5.0, reg_x: 0.0, reg_y: 0.0 },
            Placement { id: "second".into(), x: 0.0, y: 5.0, reg_x: 0.0, reg_y: 0.0 },
        ]);
        let sorted = pg.sorted();
        assert_eq!(sorted[0].id, "first");
        assert_eq!(sorted[1].id, "second");
    }

    #[test]
    fn test_sprite_sheet_forms_and_media() {
        let room = Room::from_json(json!({
            "id": "lobby", "width": 1, "height": 1,
            "spriteSheet": "sheet.json",
            "media": {"background": "bg.png", "navMesh": {"src": "nav.png"}}
        }))
        .unwrap();
        assert_eq!(room.sprite_sheet, Some(SpriteSheetRef::Url("sheet.json".into())));
        assert_eq!(room.media.nav_mesh.as_ref().and_then(|m| m.object_src()), Some("nav.png"));
        assert!(room.layout.is_none());
        assert_eq!(room.key(), Some("lobby"));
        assert_eq!(room.display_name(), "lobby");
    }

    #[test]
    fn test_bad_playground_entries_dropped() {
        let room = Room::from_json(json!({
            "width": 10, "height": 10,
            "layout": {"playground": [
                {"id": "a", "x": 0, "y": 0},
                {"id": "a", "x": 1},
                {"x": 2, "y": 2},
                {"id": "a", "x": "left", "y": 3},
                [{"id": "b", "x": 4, "y": 4}, 7]
            ]}
        }))
        .unwrap();
        let sorted = room.layout.unwrap().playground.sorted();
        let ids: Vec<&str> = sorted.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_malformed_room() {
        assert!(matches!(Room::from_json(json!({"width": "wide"})), Err(SceneError::MalformedRoom(_))));
    }
}
