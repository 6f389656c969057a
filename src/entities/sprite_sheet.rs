//! Sprite sheet frame table.
//!
//! A sheet carries three tables:
//! - `frames`: `[x, y, w, h, imageIndex?, regX?, regY?]` crop records
//! - `animations`: name -> ordered frame indices (`{frames: [..]}`, `[..]` or a bare index)
//! - `images`: image URLs addressed by `imageIndex`
//!
//! [`SpriteSheet::resolve_animation`] turns an animation name into concrete
//! [`FrameGeometry`] records; [`compute_frame_info`] picks the record for a
//! frame number, wrapping modulo the animation length.

use indexmap::IndexMap;
use serde::de::{self, Deserializer};
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::error::{Result, SceneError};

/// One frame's crop rectangle, image index and registration offset.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameGeometry {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    pub image: usize,
    pub reg_x: f32,
    pub reg_y: f32,
}

impl<'de> Deserialize<'de> for FrameGeometry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let v = Vec::<f64>::deserialize(deserializer)?;
        if v.len() < 4 {
            return Err(de::Error::invalid_length(v.len(), &"at least [x, y, w, h]"));
        }
        let at = |i: usize| v.get(i).copied().unwrap_or(0.0);
        let image = at(4);
        if image < 0.0 || image.fract() != 0.0 {
            return Err(de::Error::custom(format!("invalid image index {}", image)));
        }
        Ok(FrameGeometry {
            x: at(0) as f32,
            y: at(1) as f32,
            w: at(2) as f32,
            h: at(3) as f32,
            image: image as usize,
            reg_x: at(5) as f32,
            reg_y: at(6) as f32,
        })
    }
}

impl Serialize for FrameGeometry {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(7))?;
        seq.serialize_element(&self.x)?;
        seq.serialize_element(&self.y)?;
        seq.serialize_element(&self.w)?;
        seq.serialize_element(&self.h)?;
        seq.serialize_element(&self.image)?;
        seq.serialize_element(&self.reg_x)?;
        seq.serialize_element(&self.reg_y)?;
        seq.end()
    }
}

/// Animation definition in one of its accepted JSON shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnimationDef {
    Sequence { frames: Vec<usize> },
    List(Vec<usize>),
    Single(usize),
}

impl AnimationDef {
    pub fn frame_indices(&self) -> &[usize] {
        match self {
            AnimationDef::Sequence { frames } => frames,
            AnimationDef::List(frames) => frames,
            AnimationDef::Single(idx) => std::slice::from_ref(idx),
        }
    }
}

/// Decoded sprite sheet description.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpriteSheet {
    #[serde(default)]
    pub frames: Vec<FrameGeometry>,
    #[serde(default)]
    pub animations: IndexMap<String, AnimationDef>,
    #[serde(default)]
    pub images: Vec<String>,
}

impl SpriteSheet {
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| SceneError::MalformedRoom(format!("sprite sheet: {}", e)))
    }

    /// Ordered frame geometry for `animation_id`.
    ///
    /// Checks every referenced frame and image index on the way.
    pub fn resolve_animation(&self, animation_id: &str) -> Result<Vec<FrameGeometry>> {
        let anim = self
            .animations
            .get(animation_id)
            .ok_or_else(|| SceneError::UnknownAnimation(animation_id.to_string()))?;

        let indices = anim.frame_indices();
        if indices.is_empty() {
            return Err(SceneError::EmptyAnimation(animation_id.to_string()));
        }

        indices
            .iter()
            .map(|&idx| {
                let frame = self.frames.get(idx).copied().ok_or_else(|| SceneError::UnknownFrame {
                    animation: animation_id.to_string(),
                    frame: idx,
                })?;
                if frame.image >= self.images.len() {
                    return Err(SceneError::UnknownImage {
                        frame: idx,
                        image: frame.image,
                    });
                }
                Ok(frame)
            })
            .collect()
    }

    /// Check that every animation resolves.
    pub fn validate(&self) -> Result<()> {
        for name in self.animations.keys() {
            self.resolve_animation(name)?;
        }
        Ok(())
    }
}

/// Non-empty, shared frame sequence of one animated layer.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSet(Arc<[FrameGeometry]>);

impl FrameSet {
    /// Returns None for an empty sequence.
    pub fn new(frames: Vec<FrameGeometry>) -> Option<Self> {
        if frames.is_empty() {
            None
        } else {
            Some(Self(frames.into()))
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn as_slice(&self) -> &[FrameGeometry] {
        &self.0
    }
}

/// Frame record for `frame_no`, wrapping modulo the sequence length.
///
/// Negative frame numbers wrap from the end.
pub fn compute_frame_info(frames: &FrameSet, frame_no: i32) -> FrameGeometry {
    let len = frames.len() as i64;
    let idx = (frame_no as i64).rem_euclid(len) as usize;
    frames.0[idx]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sheet() -> SpriteSheet {
        SpriteSheet::from_json(json!({
            "frames": [[0, 0, 16, 16, 0, 2, 3], [16, 0, 16, 16, 1], [32, 0, 8, 8, 0, 1, 1]],
            "animations": {
                "walk": {"frames": [0, 1, 2]},
                "idle": [2],
                "blink": 1,
                "empty": {"frames": []},
                "broken": [0, 9]
            },
            "images": ["a.png", "b.png"]
        }))
        .unwrap()
    }

    #[test]
    fn test_frame_defaults() {
        let s = sheet();
        assert_eq!(s.frames[1].reg_x, 0.0);
        assert_eq!(s.frames[1].image, 1);
        assert_eq!(s.frames[0].reg_y, 3.0);
    }

    #[test]
    fn test_animation_shapes() {
        let s = sheet();
        assert_eq!(s.resolve_animation("walk").unwrap().len(), 3);
        assert_eq!(s.resolve_animation("idle").unwrap()[0].w, 8.0);
        assert_eq!(s.resolve_animation("blink").unwrap()[0].x, 16.0);
    }

    #[test]
    fn test_resolve_errors() {
        let s = sheet();
        assert!(matches!(s.resolve_animation("run"), Err(SceneError::UnknownAnimation(_))));
        assert!(matches!(s.resolve_animation("empty"), Err(SceneError::EmptyAnimation(_))));
        assert!(matches!(
            s.resolve_animation("broken"),
            Err(SceneError::UnknownFrame { frame: 9, .. })
        ));
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_missing_image_rejected() {
        let s = SpriteSheet::from_json(json!({
            "frames": [[0, 0, 4, 4, 3]],
            "animations": {"a": [0]},
            "images": ["only.png"]
        }))
        .unwrap();
        assert!(matches!(
            s.resolve_animation("a"),
            Err(SceneError::UnknownImage { frame: 0, image: 3 })
        ));
    }

    #[test]
    fn test_short_frame_rejected() {
        let r = SpriteSheet::from_json(json!({"frames": [[0, 0, 4]]}));
        assert!(matches!(r, Err(SceneError::MalformedRoom(_))));
    }

    #[test]
    fn test_frame_info_wraps() {
        let frames = FrameSet::new(sheet().resolve_animation("walk").unwrap()).unwrap();
        let n = frames.len() as i32;
        for k in 0..(n * 3) {
            assert_eq!(compute_frame_info(&frames, k), compute_frame_info(&frames, k % n));
        }
        assert_eq!(compute_frame_info(&frames, n), compute_frame_info(&frames, 0));
        assert_eq!(compute_frame_info(&frames, -1), compute_frame_info(&frames, n - 1));
    }

    #[test]
    fn test_empty_frameset() {
        assert!(FrameSet::new(Vec::new()).is_none());
    }
}
