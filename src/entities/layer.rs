//! Layer - one drawable unit of a room scene.
//!
//! # Architecture
//!
//! A layer is a typed wrapper around `Attrs` (the editable field table)
//! plus a [`LayerSource`] tag that says how the compositor treats it:
//! - `SurfaceResize` - fixes render target size from `frameW`/`frameH`, draws nothing
//! - `Static` - draws the `src` image region
//! - `Animated` - draws a frame picked from its `FrameSet` by `frameNo`
//!
//! # Field writes
//!
//! All writes go through [`Layer::with_field`], which returns a patched copy.
//! On animated layers `frameNo` is the driver: writing it recomputes `src`,
//! crop and registration from the frame table, and those derived fields
//! reject direct writes. The edit surface and the animation clock both use
//! this one path.
//!
//! # Draw geometry
//!
//! Crop: `(frameX, frameY, frameW, frameH)`.
//! Destination: `(posX - originX - frameRegX, posY - originY - frameRegY)`
//! at crop size. Registration moves the anchor, never the crop.

use std::sync::Arc;

use uuid::Uuid;

use super::attrs::{AttrValue, Attrs};
use super::error::{Result, SceneError};
use super::keys::*;
use super::sprite_sheet::{compute_frame_info, FrameGeometry, FrameSet};
use super::surface::Rect;

/// How the compositor dispatches a layer.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerSource {
    /// Resizes the render target to `(frameW, frameH)`.
    SurfaceResize,
    /// Single image, `src` field names it.
    Static,
    /// Sprite animation; `src` and crop come from `frames[frameNo mod len]`.
    Animated { frames: FrameSet, pool: Arc<[String]> },
}

/// Layer kind label for tables and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    Surface,
    Static,
    Animated,
}

impl LayerKind {
    pub fn as_str(self) -> &'static str {
        match self {
            LayerKind::Surface => "surface",
            LayerKind::Static => "static",
            LayerKind::Animated => "animated",
        }
    }
}

/// Single layer in the scene stack.
#[derive(Clone, Debug, PartialEq)]
pub struct Layer {
    /// Stable identity, used by the reorder widget to map rows back to layers.
    pub uuid: Uuid,
    /// Display name ("background", placement animation id, ...)
    pub name: String,
    /// Excluded from operator reordering.
    pub immovable: bool,
    pub source: LayerSource,
    /// Field table (see `LAYER_SCHEMA`).
    pub attrs: Attrs,
}

impl Layer {
    fn base(name: &str, source: LayerSource, src: &str) -> Self {
        let mut attrs = Attrs::new();
        attrs.set(A_VISIBLE, AttrValue::Bool(true));
        attrs.set(A_SRC, AttrValue::Str(src.to_string()));
        attrs.set(A_POS_X, AttrValue::Float(0.0));
        attrs.set(A_POS_Y, AttrValue::Float(0.0));
        attrs.set(A_ORIGIN_X, AttrValue::Float(0.0));
        attrs.set(A_ORIGIN_Y, AttrValue::Float(0.0));
        attrs.set(A_FRAME_NO, AttrValue::Int(0));
        attrs.set(A_FRAME_X, AttrValue::Float(0.0));
        attrs.set(A_FRAME_Y, AttrValue::Float(0.0));
        attrs.set(A_FRAME_REG_X, AttrValue::Float(0.0));
        attrs.set(A_FRAME_REG_Y, AttrValue::Float(0.0));
        attrs.set(A_FRAME_W, AttrValue::Float(0.0));
        attrs.set(A_FRAME_H, AttrValue::Float(0.0));
        attrs.set(A_ALPHA, AttrValue::Float(1.0));
        Self {
            uuid: Uuid::new_v4(),
            name: name.to_string(),
            immovable: false,
            source,
            attrs,
        }
    }

    /// Size-defining layer: immovable, draws nothing.
    pub fn surface(width: u32, height: u32) -> Self {
        let mut layer = Self::base("canvas", LayerSource::SurfaceResize, "");
        layer.immovable = true;
        layer.attrs.set(A_FRAME_W, AttrValue::Float(width as f32));
        layer.attrs.set(A_FRAME_H, AttrValue::Float(height as f32));
        layer
    }

    /// Static image layer covering `(0, 0, width, height)`.
    pub fn image(name: &str, src: &str, width: u32, height: u32) -> Self {
        let mut layer = Self::base(name, LayerSource::Static, src);
        layer.attrs.set(A_FRAME_W, AttrValue::Float(width as f32));
        layer.attrs.set(A_FRAME_H, AttrValue::Float(height as f32));
        layer
    }

    /// Animated layer at frame 0, derived fields seeded from the frame table.
    pub fn animated(name: &str, pos: (f32, f32), origin: (f32, f32), frames: FrameSet, pool: Arc<[String]>) -> Self {
        let mut layer = Self::base(name, LayerSource::Animated { frames, pool }, "");
        layer.attrs.set(A_POS_X, AttrValue::Float(pos.0));
        layer.attrs.set(A_POS_Y, AttrValue::Float(pos.1));
        layer.attrs.set(A_ORIGIN_X, AttrValue::Float(origin.0));
        layer.attrs.set(A_ORIGIN_Y, AttrValue::Float(origin.1));
        layer.apply_frame();
        layer
    }

    pub fn kind(&self) -> LayerKind {
        match self.source {
            LayerSource::SurfaceResize => LayerKind::Surface,
            LayerSource::Static => LayerKind::Static,
            LayerSource::Animated { .. } => LayerKind::Animated,
        }
    }

    pub fn is_animated(&self) -> bool {
        matches!(self.source, LayerSource::Animated { .. })
    }

    // === Field reads ===

    pub fn visible(&self) -> bool {
        self.attrs.get_bool_or(A_VISIBLE, true)
    }

    pub fn src(&self) -> &str {
        self.attrs.get_str(A_SRC).unwrap_or("")
    }

    pub fn pos(&self) -> (f32, f32) {
        (self.attrs.get_float_or(A_POS_X, 0.0), self.attrs.get_float_or(A_POS_Y, 0.0))
    }

    pub fn origin(&self) -> (f32, f32) {
        (self.attrs.get_float_or(A_ORIGIN_X, 0.0), self.attrs.get_float_or(A_ORIGIN_Y, 0.0))
    }

    pub fn frame_no(&self) -> i32 {
        self.attrs.get_i32_or_zero(A_FRAME_NO)
    }

    pub fn frame_w(&self) -> f32 {
        self.attrs.get_float_or(A_FRAME_W, 0.0)
    }

    pub fn frame_h(&self) -> f32 {
        self.attrs.get_float_or(A_FRAME_H, 0.0)
    }

    pub fn frame_reg(&self) -> (f32, f32) {
        (
            self.attrs.get_float_or(A_FRAME_REG_X, 0.0),
            self.attrs.get_float_or(A_FRAME_REG_Y, 0.0),
        )
    }

    pub fn alpha(&self) -> f32 {
        self.attrs.get_float_or(A_ALPHA, 1.0)
    }

    /// Source crop rectangle.
    pub fn crop(&self) -> Rect {
        Rect::new(
            self.attrs.get_float_or(A_FRAME_X, 0.0),
            self.attrs.get_float_or(A_FRAME_Y, 0.0),
            self.frame_w(),
            self.frame_h(),
        )
    }

    /// Destination rectangle: anchor shifted by origin and registration.
    pub fn dest(&self) -> Rect {
        let (px, py) = self.pos();
        let (ox, oy) = self.origin();
        let (rx, ry) = self.frame_reg();
        Rect::new(px - ox - rx, py - oy - ry, self.frame_w(), self.frame_h())
    }

    /// Read a field by name.
    pub fn get(&self, field: &str) -> Option<&AttrValue> {
        self.attrs.get(field)
    }

    /// All fields in schema order.
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &AttrValue)> + '_ {
        LAYER_SCHEMA
            .defs
            .iter()
            .filter_map(|d| self.attrs.get(d.name).map(|v| (d.name, v)))
    }

    /// Current frame record of an animated layer.
    pub fn frame_info(&self) -> Option<FrameGeometry> {
        match &self.source {
            LayerSource::Animated { frames, .. } => Some(compute_frame_info(frames, self.frame_no())),
            _ => None,
        }
    }

    // === Field writes ===

    /// Patched copy with `field` set to `value`.
    ///
    /// Ints coerce to floats. Derived fields of animated layers are rejected;
    /// `frameNo` on an animated layer recomputes them.
    pub fn with_field(&self, field: &str, value: AttrValue) -> Result<Layer> {
        let def = LAYER_SCHEMA
            .get(field)
            .ok_or_else(|| SceneError::UnknownField(field.to_string()))?;

        if def.is_derived() && self.is_animated() {
            return Err(SceneError::DerivedField(field.to_string()));
        }

        let got = value.to_string();
        let value = value.coerce(def.ty).ok_or_else(|| SceneError::FieldType {
            field: field.to_string(),
            expected: def.ty.name(),
            got,
        })?;

        let mut patched = self.clone();
        patched.attrs.set(def.name, value);
        if def.is_driver() {
            patched.apply_frame();
        }
        Ok(patched)
    }

    /// Patched copy with `field` parsed from edit-control text.
    pub fn with_field_text(&self, field: &str, text: &str) -> Result<Layer> {
        let def = LAYER_SCHEMA
            .get(field)
            .ok_or_else(|| SceneError::UnknownField(field.to_string()))?;
        let value = AttrValue::parse(def.ty, text).ok_or_else(|| SceneError::FieldType {
            field: field.to_string(),
            expected: def.ty.name(),
            got: text.to_string(),
        })?;
        self.with_field(field, value)
    }

    /// Copy `frames[frameNo mod len]` into the derived fields.
    fn apply_frame(&mut self) {
        let LayerSource::Animated { frames, pool } = &self.source else {
            return;
        };
        let frame = compute_frame_info(frames, self.frame_no());
        let src = pool.get(frame.image).cloned().unwrap_or_default();
        self.attrs.set(A_SRC, AttrValue::Str(src));
        self.attrs.set(A_FRAME_X, AttrValue::Float(frame.x));
        self.attrs.set(A_FRAME_Y, AttrValue::Float(frame.y));
        self.attrs.set(A_FRAME_REG_X, AttrValue::Float(frame.reg_x));
        self.attrs.set(A_FRAME_REG_Y, AttrValue::Float(frame.reg_y));
        self.attrs.set(A_FRAME_W, AttrValue::Float(frame.w));
        self.attrs.set(A_FRAME_H, AttrValue::Float(frame.h));
    }
}
