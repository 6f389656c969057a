//! Layer field names and the layer field schema.
//!
//! Names match the property table columns so an edit control can address a
//! field by the same string it displays.
//! Usage: `layer.attrs.get_float(A_POS_X)`

use super::attrs::{AttrDef, AttrSchema, AttrType, FLAG_DERIVED, FLAG_DISPLAY, FLAG_DRIVER};

// === Compose flags ===
/// Visibility flag
pub const A_VISIBLE: &str = "visible";
/// Image source key
pub const A_SRC: &str = "src";
/// Opacity (0.0-1.0)
pub const A_ALPHA: &str = "alpha";

// === Placement ===
pub const A_POS_X: &str = "posX";
pub const A_POS_Y: &str = "posY";
pub const A_ORIGIN_X: &str = "originX";
pub const A_ORIGIN_Y: &str = "originY";

// === Frame ===
/// Current animation frame index
pub const A_FRAME_NO: &str = "frameNo";
pub const A_FRAME_X: &str = "frameX";
pub const A_FRAME_Y: &str = "frameY";
pub const A_FRAME_W: &str = "frameW";
pub const A_FRAME_H: &str = "frameH";
pub const A_FRAME_REG_X: &str = "frameRegX";
pub const A_FRAME_REG_Y: &str = "frameRegY";

const DISP: u8 = FLAG_DISPLAY;
const DISP_DERIVED: u8 = FLAG_DISPLAY | FLAG_DERIVED;
const DISP_DRIVER: u8 = FLAG_DISPLAY | FLAG_DRIVER;

const LAYER_DEFS: &[AttrDef] = &[
    AttrDef::new(A_VISIBLE, AttrType::Bool, DISP),
    AttrDef::new(A_SRC, AttrType::Str, DISP_DERIVED),
    AttrDef::new(A_POS_X, AttrType::Float, DISP),
    AttrDef::new(A_POS_Y, AttrType::Float, DISP),
    AttrDef::new(A_ORIGIN_X, AttrType::Float, DISP),
    AttrDef::new(A_ORIGIN_Y, AttrType::Float, DISP),
    AttrDef::new(A_FRAME_NO, AttrType::Int, DISP_DRIVER),
    AttrDef::new(A_FRAME_X, AttrType::Float, DISP_DERIVED),
    AttrDef::new(A_FRAME_Y, AttrType::Float, DISP_DERIVED),
    AttrDef::new(A_FRAME_REG_X, AttrType::Float, DISP_DERIVED),
    AttrDef::new(A_FRAME_REG_Y, AttrType::Float, DISP_DERIVED),
    AttrDef::new(A_FRAME_W, AttrType::Float, DISP_DERIVED),
    AttrDef::new(A_FRAME_H, AttrType::Float, DISP_DERIVED),
    AttrDef::new(A_ALPHA, AttrType::Float, DISP),
];

/// Editable fields of every layer, in property table order.
pub static LAYER_SCHEMA: AttrSchema = AttrSchema::new("Layer", LAYER_DEFS);
