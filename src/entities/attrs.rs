//! Generic attribute storage backing the layer field table.
//!
//! Layers keep their editable fields (`posX`, `alpha`, `frameNo`, ...) in an
//! ordered `Attrs` map so the property table can iterate them in a stable
//! order and address each one by name.
//! Field metadata (type, derived flag) lives in [`AttrDef`] schemas.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Generic attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttrValue {
    Bool(bool),
    Str(String),
    Int(i32),
    Float(f32),
}

impl AttrValue {
    pub fn attr_type(&self) -> AttrType {
        match self {
            AttrValue::Bool(_) => AttrType::Bool,
            AttrValue::Str(_) => AttrType::Str,
            AttrValue::Int(_) => AttrType::Int,
            AttrValue::Float(_) => AttrType::Float,
        }
    }

    /// Parse text typed into an edit control.
    ///
    /// Ints accept integral floats ("3.0"); floats accept ints.
    pub fn parse(ty: AttrType, text: &str) -> Option<AttrValue> {
        let text = text.trim();
        match ty {
            AttrType::Bool => match text.to_ascii_lowercase().as_str() {
                "true" | "1" | "on" | "yes" => Some(AttrValue::Bool(true)),
                "false" | "0" | "off" | "no" => Some(AttrValue::Bool(false)),
                _ => None,
            },
            AttrType::Str => Some(AttrValue::Str(text.to_string())),
            AttrType::Int => text.parse::<i32>().ok().map(AttrValue::Int).or_else(|| {
                text.parse::<f64>()
                    .ok()
                    .filter(|f| f.fract() == 0.0 && f.abs() <= i32::MAX as f64)
                    .map(|f| AttrValue::Int(f as i32))
            }),
            AttrType::Float => text.parse::<f32>().ok().filter(|f| f.is_finite()).map(AttrValue::Float),
        }
    }

    /// Coerce to `ty` where lossless enough for an edit (Int -> Float).
    pub fn coerce(self, ty: AttrType) -> Option<AttrValue> {
        match (self, ty) {
            (v, t) if v.attr_type() == t => Some(v),
            (AttrValue::Int(i), AttrType::Float) => Some(AttrValue::Float(i as f32)),
            (AttrValue::Float(f), AttrType::Int) if f.fract() == 0.0 => Some(AttrValue::Int(f as i32)),
            _ => None,
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Bool(v) => write!(f, "{}", v),
            AttrValue::Str(v) => write!(f, "{}", v),
            AttrValue::Int(v) => write!(f, "{}", v),
            AttrValue::Float(v) => write!(f, "{}", v),
        }
    }
}

/// Attribute value type, used by schemas and the edit surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrType {
    Bool,
    Str,
    Int,
    Float,
}

impl AttrType {
    pub fn name(self) -> &'static str {
        match self {
            AttrType::Bool => "bool",
            AttrType::Str => "string",
            AttrType::Int => "int",
            AttrType::Float => "float",
        }
    }
}

/// Attribute flags
pub const FLAG_DISPLAY: u8 = 1 << 0;
/// Computed from the frame table on animated layers
pub const FLAG_DERIVED: u8 = 1 << 1;
/// Writing this field recomputes derived fields
pub const FLAG_DRIVER: u8 = 1 << 2;

/// Static attribute definition.
#[derive(Debug, Clone, Copy)]
pub struct AttrDef {
    pub name: &'static str,
    pub ty: AttrType,
    pub flags: u8,
}

impl AttrDef {
    pub const fn new(name: &'static str, ty: AttrType, flags: u8) -> Self {
        Self { name, ty, flags }
    }

    pub fn is_derived(&self) -> bool {
        self.flags & FLAG_DERIVED != 0
    }

    pub fn is_driver(&self) -> bool {
        self.flags & FLAG_DRIVER != 0
    }
}

/// Named set of attribute definitions.
#[derive(Debug)]
pub struct AttrSchema {
    pub name: &'static str,
    pub defs: &'static [AttrDef],
}

impl AttrSchema {
    pub const fn new(name: &'static str, defs: &'static [AttrDef]) -> Self {
        Self { name, defs }
    }

    pub fn get(&self, key: &str) -> Option<&AttrDef> {
        self.defs.iter().find(|d| d.name == key)
    }
}

/// Attribute container: string key -> typed value, insertion ordered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attrs {
    #[serde(default)]
    map: IndexMap<String, AttrValue>,
}

impl Attrs {
    pub fn new() -> Self {
        Self { map: IndexMap::new() }
    }

    pub fn set(&mut self, key: impl Into<String>, value: AttrValue) {
        self.map.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.map.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.map.get(key) {
            Some(AttrValue::Str(s)) => Some(s),
            _ => None,
        }
    }

    pub fn get_i32(&self, key: &str) -> Option<i32> {
        match self.map.get(key) {
            Some(AttrValue::Int(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_float(&self, key: &str) -> Option<f32> {
        match self.map.get(key) {
            Some(AttrValue::Float(v)) => Some(*v),
            Some(AttrValue::Int(v)) => Some(*v as f32),
            _ => None,
        }
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.map.get(key) {
            Some(AttrValue::Bool(v)) => Some(*v),
            _ => None,
        }
    }

    /// Get i32 value with default fallback of 0
    pub fn get_i32_or_zero(&self, key: &str) -> i32 {
        self.get_i32(key).unwrap_or(0)
    }

    /// Get float value with custom default
    pub fn get_float_or(&self, key: &str, default: f32) -> f32 {
        self.get_float(key).unwrap_or(default)
    }

    /// Get bool value with custom default
    pub fn get_bool_or(&self, key: &str, default: bool) -> bool {
        self.get_bool(key).unwrap_or(default)
    }

    /// Remove attribute by key
    pub fn remove(&mut self, key: &str) -> Option<AttrValue> {
        self.map.shift_remove(key)
    }

    /// Iterate over all attributes in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &AttrValue)> {
        self.map.iter()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
