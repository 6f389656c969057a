//! Scene compositor - draws the layer stack onto a surface.
//!
//! Full repaint every call: layers are drawn strictly in list order, back to
//! front, with no dirty tracking. Per layer:
//! - hidden: skipped (a hidden size layer leaves the surface size alone)
//! - `SurfaceResize`: resize target to `(frameW, frameH)`, draw nothing
//! - `Static`/`Animated`: resolve `src` through the image cache, draw the crop
//!   at the destination rect with the layer's `alpha`
//!
//! An image that fails to resolve at render time is logged and its layer
//! skipped; the rest of the composite still draws.

use log::{trace, warn};

use crate::core::image_cache::ImageCache;

use super::error::Result;
use super::layer::{Layer, LayerSource};
use super::loader::AssetLoader;
use super::scene::Scene;
use super::surface::{Rect, Surface};

/// Longest side of the preview box
pub const PREVIEW_MAX: f32 = 400.0;

/// Largest surface side a layer may request
pub const MAX_SURFACE_DIM: u32 = 16384;

/// Counters from one render pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RenderStats {
    pub drawn: usize,
    pub hidden: usize,
    pub failed: usize,
}

/// Draw every visible layer of `scene` onto `surface` in order.
pub fn render<L, S>(scene: &Scene, surface: &mut S, cache: &mut ImageCache, loader: &L) -> RenderStats
where
    L: AssetLoader + ?Sized,
    S: Surface + ?Sized,
{
    let mut stats = RenderStats::default();
    for layer in scene.layers() {
        if !layer.visible() {
            stats.hidden += 1;
            continue;
        }
        if let LayerSource::SurfaceResize = layer.source {
            let (w, h) = (surface_dim(layer.frame_w()), surface_dim(layer.frame_h()));
            if (w as f32, h as f32) != (layer.frame_w(), layer.frame_h()) {
                warn!(
                    "Surface size {}x{} out of range, using {}x{}",
                    layer.frame_w(),
                    layer.frame_h(),
                    w,
                    h
                );
            }
            surface.resize(w, h);
            continue;
        }
        if draw_layer(layer, layer.dest(), layer.alpha(), surface, cache, loader) {
            stats.drawn += 1;
        } else {
            stats.failed += 1;
        }
    }
    trace!("render: {:?}", stats);
    stats
}

/// Draw one layer's crop into the preview surface, scaled to fit `max`.
///
/// The preview ignores visibility and opacity so hidden overlays can still
/// be inspected. Returns false if there was nothing to draw.
pub fn render_preview<L, S>(layer: &Layer, surface: &mut S, cache: &mut ImageCache, loader: &L, max: f32) -> Result<bool>
where
    L: AssetLoader + ?Sized,
    S: Surface + ?Sized,
{
    if let LayerSource::SurfaceResize = layer.source {
        return Ok(false);
    }
    let crop = layer.crop();
    if crop.is_empty() {
        return Ok(false);
    }
    let (w, h) = preview_size(crop.w, crop.h, max);
    surface.resize(surface_dim(w.round()), surface_dim(h.round()));
    let image = cache.resolve(layer.src(), loader)?;
    surface.draw_region(&image, crop, Rect::new(0.0, 0.0, w, h), 1.0);
    Ok(true)
}

/// Fit `(w, h)` into a `max` x `max` box, keeping aspect ratio.
///
/// Height is clamped first, then width is re-checked against the result.
pub fn preview_size(w: f32, h: f32, max: f32) -> (f32, f32) {
    let (mut w, mut h) = (w, h);
    if h > max {
        w *= max / h;
        h = max;
    }
    if w > max {
        h *= max / w;
        w = max;
    }
    (w, h)
}

/// Surface side for a requested size: NaN and negatives become 0, the rest is capped.
fn surface_dim(v: f32) -> u32 {
    if v.is_nan() {
        return 0;
    }
    v.clamp(0.0, MAX_SURFACE_DIM as f32) as u32
}

fn draw_layer<L, S>(layer: &Layer, dst: Rect, opacity: f32, surface: &mut S, cache: &mut ImageCache, loader: &L) -> bool
where
    L: AssetLoader + ?Sized,
    S: Surface + ?Sized,
{
    let src = layer.src();
    match cache.resolve(src, loader) {
        Ok(image) => {
            surface.draw_region(&image, layer.crop(), dst, opacity);
            true
        }
        Err(e) => {
            warn!("Layer '{}' not drawn: {}", layer.name, e);
            false
        }
    }
}
