//! Scene - the ordered layer stack of one room.
//!
//! Order is z-order: index 0 is drawn first (back), the last layer on top.
//! Index 0 is always the immovable size-defining layer.
//!
//! Mutations:
//! - [`Scene::edit_field`] - patch one layer in place, order unchanged
//! - [`Scene::reorder`] - permute movable layers from the widget's row order
//! - [`Scene::advance_frames`] - animation clock step
//!
//! Every mutation invalidates the whole composite; there is no per-layer
//! dirty tracking.

use std::collections::HashMap;

use log::{debug, trace};
use uuid::Uuid;

use super::attrs::AttrValue;
use super::error::{Result, SceneError};
use super::image::AudioHandle;
use super::keys::{A_FRAME_NO, A_VISIBLE};
use super::layer::{Layer, LayerKind};

/// One property table row.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerRow {
    pub index: usize,
    pub uuid: Uuid,
    pub name: String,
    pub kind: LayerKind,
    pub immovable: bool,
    /// (field, value) in schema order
    pub fields: Vec<(&'static str, AttrValue)>,
}

#[derive(Debug, Clone, Default)]
pub struct Scene {
    layers: Vec<Layer>,
    music: Option<AudioHandle>,
}

impl Scene {
    pub fn new(layers: Vec<Layer>, music: Option<AudioHandle>) -> Self {
        Self { layers, music }
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer(&self, index: usize) -> Option<&Layer> {
        self.layers.get(index)
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn music(&self) -> Option<&AudioHandle> {
        self.music.as_ref()
    }

    pub fn index_of(&self, uuid: Uuid) -> Option<usize> {
        self.layers.iter().position(|l| l.uuid == uuid)
    }

    /// Uuids of movable layers in current order (the draggable rows).
    pub fn movable(&self) -> Vec<Uuid> {
        self.layers.iter().filter(|l| !l.immovable).map(|l| l.uuid).collect()
    }

    /// Property table rows.
    pub fn rows(&self) -> Vec<LayerRow> {
        self.layers
            .iter()
            .enumerate()
            .map(|(index, layer)| LayerRow {
                index,
                uuid: layer.uuid,
                name: layer.name.clone(),
                kind: layer.kind(),
                immovable: layer.immovable,
                fields: layer.fields().map(|(name, v)| (name, v.clone())).collect(),
            })
            .collect()
    }

    /// Set one field of one layer. Order is untouched.
    pub fn edit_field(&mut self, index: usize, field: &str, value: AttrValue) -> Result<()> {
        let layer = self.layers.get(index).ok_or(SceneError::LayerIndex(index))?;
        let patched = layer.with_field(field, value)?;
        trace!("Layer {} '{}': {} = {:?}", index, patched.name, field, patched.get(field));
        self.layers[index] = patched;
        Ok(())
    }

    /// Set one field from edit-control text.
    pub fn edit_field_text(&mut self, index: usize, field: &str, text: &str) -> Result<()> {
        let layer = self.layers.get(index).ok_or(SceneError::LayerIndex(index))?;
        let patched = layer.with_field_text(field, text)?;
        self.layers[index] = patched;
        Ok(())
    }

    /// Flip `visible`, returning the new value.
    pub fn toggle_visible(&mut self, index: usize) -> Result<bool> {
        let layer = self.layers.get(index).ok_or(SceneError::LayerIndex(index))?;
        let visible = !layer.visible();
        self.edit_field(index, A_VISIBLE, AttrValue::Bool(visible))?;
        Ok(visible)
    }

    /// Rebuild order from the reorder widget's rows.
    ///
    /// `rows` lists every movable layer exactly once, in new visual order.
    /// Immovable layers keep their absolute slots; movable slots are refilled
    /// from `rows` front to back.
    pub fn reorder(&mut self, rows: &[Uuid]) -> Result<()> {
        let movable = self.movable();
        if rows.len() != movable.len() {
            return Err(SceneError::ReorderMismatch(format!(
                "expected {} movable rows, got {}",
                movable.len(),
                rows.len()
            )));
        }
        for (i, uuid) in rows.iter().enumerate() {
            if !movable.contains(uuid) {
                return Err(match self.layers.iter().find(|l| l.uuid == *uuid) {
                    Some(layer) => SceneError::ImmovableMoved(layer.name.clone()),
                    None => SceneError::ReorderMismatch(format!("row {} is not in the scene", uuid)),
                });
            }
            if rows[..i].contains(uuid) {
                return Err(SceneError::ReorderMismatch(format!("row {} listed twice", uuid)));
            }
        }

        let mut pending: HashMap<Uuid, Layer> = HashMap::new();
        let mut slots: Vec<Option<Layer>> = Vec::with_capacity(self.layers.len());
        for layer in std::mem::take(&mut self.layers) {
            if layer.immovable {
                slots.push(Some(layer));
            } else {
                pending.insert(layer.uuid, layer);
                slots.push(None);
            }
        }
        let mut next_row = rows.iter();
        self.layers = slots
            .into_iter()
            .filter_map(|slot| slot.or_else(|| next_row.next().and_then(|uuid| pending.remove(uuid))))
            .collect();
        debug!("Scene reordered: {:?}", self.layers.iter().map(|l| l.name.as_str()).collect::<Vec<_>>());
        Ok(())
    }

    /// Reorder by movable-row indices into [`Scene::movable`].
    pub fn reorder_rows(&mut self, rows: &[usize]) -> Result<()> {
        let movable = self.movable();
        let uuids = rows
            .iter()
            .map(|&r| {
                movable
                    .get(r)
                    .copied()
                    .ok_or_else(|| SceneError::ReorderMismatch(format!("row {} out of range", r)))
            })
            .collect::<Result<Vec<_>>>()?;
        self.reorder(&uuids)
    }

    /// One animation step: every layer with `frameNo > 0` advances by one.
    ///
    /// Layers at frame 0 are not yet activated and stay put. Returns the
    /// number of layers advanced.
    pub fn advance_frames(&mut self) -> Result<usize> {
        let mut advanced = 0;
        for index in 0..self.layers.len() {
            let frame_no = self.layers[index].frame_no();
            if frame_no <= 0 {
                continue;
            }
            self.edit_field(index, A_FRAME_NO, AttrValue::Int(frame_no.wrapping_add(1).max(1)))?;
            advanced += 1;
        }
        Ok(advanced)
    }
}
