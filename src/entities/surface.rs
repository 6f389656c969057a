//! Raster surface abstraction.
//!
//! The compositor only needs two operations from a render target:
//! resize it, and draw a rectangular region of an image into a destination
//! rectangle at some opacity. Coordinates are top-left origin, y down.
//!
//! Implementations:
//! - [`Canvas`](super::canvas::Canvas) - CPU RGBA8 raster
//! - [`RecordingSurface`] - records draw calls, draws nothing

use super::image::Image;

/// Axis-aligned rectangle in surface units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn is_empty(&self) -> bool {
        self.w <= 0.0 || self.h <= 0.0
    }
}

/// Render target consumed by the compositor.
pub trait Surface {
    /// Resize and clear.
    fn resize(&mut self, width: u32, height: u32);

    fn size(&self) -> (u32, u32);

    /// Draw `src` region of `image` into `dst`, scaling if sizes differ.
    fn draw_region(&mut self, image: &Image, src: Rect, dst: Rect, opacity: f32);
}

/// One recorded surface call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Resize { width: u32, height: u32 },
    Region { src: Rect, dst: Rect, opacity: f32 },
}

/// Surface that records calls instead of rasterizing.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub ops: Vec<DrawOp>,
    size: (u32, u32),
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Destination rects of every region draw, in call order.
    pub fn draws(&self) -> Vec<Rect> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Region { dst, .. } => Some(*dst),
                DrawOp::Resize { .. } => None,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.ops.clear();
    }
}

impl Surface for RecordingSurface {
    fn resize(&mut self, width: u32, height: u32) {
        self.size = (width, height);
        self.ops.push(DrawOp::Resize { width, height });
    }

    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn draw_region(&mut self, _image: &Image, src: Rect, dst: Rect, opacity: f32) {
        self.ops.push(DrawOp::Region { src, dst, opacity });
    }
}
