//! CPU raster surface (RGBA8).
//!
//! Straight-alpha "normal" blending, same math as a layer-over-layer
//! composite: `out = bottom * (1 - a) + top * a` with `a = top_alpha * opacity`.
//! Region draws sample nearest-neighbor, so the preview path can scale a
//! crop into a smaller box.

use std::path::Path;

use anyhow::{Context, Result};
use image::RgbaImage;
use log::debug;

use super::image::Image;
use super::surface::{Rect, Surface};

/// CPU RGBA8 canvas.
#[derive(Debug, Clone, Default)]
pub struct Canvas {
    buffer: Vec<u8>,
    width: u32,
    height: u32,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            buffer: vec![0u8; width as usize * height as usize * 4],
            width,
            height,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// RGBA at (x, y), None outside the canvas.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        Some([self.buffer[i], self.buffer[i + 1], self.buffer[i + 2], self.buffer[i + 3]])
    }

    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    pub fn to_rgba_image(&self) -> Option<RgbaImage> {
        RgbaImage::from_raw(self.width, self.height, self.buffer.clone())
    }

    /// Write canvas to an image file (format from extension).
    pub fn save(&self, path: &Path) -> Result<()> {
        let img = self
            .to_rgba_image()
            .context("Canvas buffer does not match its dimensions")?;
        img.save(path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        debug!("Saved {}x{} canvas to {}", self.width, self.height, path.display());
        Ok(())
    }

    /// Blend one RGBA8 pixel over `dst` with opacity.
    fn blend_px(dst: &mut [u8], top: [u8; 4], opacity: f32) {
        let top_alpha = (top[3] as f32 / 255.0) * opacity;
        if top_alpha <= 0.0 {
            return;
        }
        let inv_alpha = 1.0 - top_alpha;
        for c in 0..3 {
            let b = dst[c] as f32 / 255.0;
            let t = top[c] as f32 / 255.0;
            let out = b * inv_alpha + t * top_alpha;
            dst[c] = (out.clamp(0.0, 1.0) * 255.0).round() as u8;
        }
        let out_a = dst[3] as f32 / 255.0 * inv_alpha + top_alpha;
        dst[3] = (out_a.clamp(0.0, 1.0) * 255.0).round() as u8;
    }
}

impl Surface for Canvas {
    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.buffer.clear();
        self.buffer.resize(width as usize * height as usize * 4, 0);
    }

    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn draw_region(&mut self, image: &Image, src: Rect, dst: Rect, opacity: f32) {
        if src.is_empty() || dst.is_empty() || opacity <= 0.0 {
            return;
        }
        if ![dst.x, dst.y, dst.w, dst.h].iter().all(|v| v.is_finite()) {
            return;
        }
        let opacity = opacity.min(1.0);
        let (cw, ch) = (self.width as i64, self.height as i64);
        let (iw, ih) = (image.width() as i64, image.height() as i64);

        let x0 = dst.x.round() as i64;
        let y0 = dst.y.round() as i64;
        let out_w = dst.w.round() as i64;
        let out_h = dst.h.round() as i64;
        let sx_scale = src.w / dst.w;
        let sy_scale = src.h / dst.h;

        // Only the part of dst that lands on the canvas
        let (ox_start, ox_end) = (x0.saturating_neg().max(0), out_w.min(cw.saturating_sub(x0)));
        let (oy_start, oy_end) = (y0.saturating_neg().max(0), out_h.min(ch.saturating_sub(y0)));

        for oy in oy_start..oy_end {
            let ty = y0 + oy;
            let sy = (src.y + (oy as f32 + 0.5) * sy_scale).floor() as i64;
            if sy < 0 || sy >= ih {
                continue;
            }
            for ox in ox_start..ox_end {
                let tx = x0 + ox;
                let sx = (src.x + (ox as f32 + 0.5) * sx_scale).floor() as i64;
                if sx < 0 || sx >= iw {
                    continue;
                }
                let top = image.pixel(sx as u32, sy as u32);
                let i = ((ty * cw + tx) * 4) as usize;
                Self::blend_px(&mut self.buffer[i..i + 4], top, opacity);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resize_clears() {
        let mut canvas = Canvas::new(2, 2);
        canvas.draw_region(&Image::solid(2, 2, [255, 0, 0, 255]), Rect::new(0.0, 0.0, 2.0, 2.0), Rect::new(0.0, 0.0, 2.0, 2.0), 1.0);
        assert_eq!(canvas.pixel(1, 1), Some([255, 0, 0, 255]));
        canvas.resize(3, 1);
        assert_eq!(canvas.size(), (3, 1));
        assert_eq!(canvas.pixel(2, 0), Some([0, 0, 0, 0]));
        assert_eq!(canvas.pixel(0, 1), None);
    }

    #[test]
    fn test_region_crop_and_offset() {
        // Left half red, right half blue
        let mut img = RgbaImage::from_pixel(4, 2, image::Rgba([255, 0, 0, 255]));
        for y in 0..2 {
            for x in 2..4 {
                img.put_pixel(x, y, image::Rgba([0, 0, 255, 255]));
            }
        }
        let img = Image::from_rgba(img);
        let mut canvas = Canvas::new(6, 6);
        canvas.draw_region(&img, Rect::new(2.0, 0.0, 2.0, 2.0), Rect::new(3.0, 1.0, 2.0, 2.0), 1.0);
        assert_eq!(canvas.pixel(3, 1), Some([0, 0, 255, 255]));
        assert_eq!(canvas.pixel(4, 2), Some([0, 0, 255, 255]));
        assert_eq!(canvas.pixel(2, 1), Some([0, 0, 0, 0]));
        assert_eq!(canvas.pixel(5, 3), Some([0, 0, 0, 0]));
    }

    #[test]
    fn test_half_opacity_blend() {
        let mut canvas = Canvas::new(1, 1);
        let full = Rect::new(0.0, 0.0, 1.0, 1.0);
        canvas.draw_region(&Image::solid(1, 1, [0, 0, 0, 255]), full, full, 1.0);
        canvas.draw_region(&Image::solid(1, 1, [255, 255, 255, 255]), full, full, 0.5);
        let px = canvas.pixel(0, 0).unwrap();
        assert!((127..=128).contains(&px[0]));
        assert_eq!(px[3], 255);
    }

    #[test]
    fn test_offscreen_draw_is_clipped() {
        let mut canvas = Canvas::new(2, 2);
        canvas.draw_region(
            &Image::solid(4, 4, [9, 9, 9, 255]),
            Rect::new(0.0, 0.0, 4.0, 4.0),
            Rect::new(-3.0, -3.0, 4.0, 4.0),
            1.0,
        );
        assert_eq!(canvas.pixel(0, 0), Some([9, 9, 9, 255]));
        assert_eq!(canvas.pixel(1, 1), Some([0, 0, 0, 0]));
    }

    #[test]
    fn test_scaled_draw() {
        let mut canvas = Canvas::new(2, 1);
        canvas.draw_region(
            &Image::solid(8, 4, [1, 2, 3, 255]),
            Rect::new(0.0, 0.0, 8.0, 4.0),
            Rect::new(0.0, 0.0, 2.0, 1.0),
            1.0,
        );
        assert_eq!(canvas.pixel(1, 0), Some([1, 2, 3, 255]));
    }

    #[test]
    fn test_huge_destination_only_touches_canvas() {
        let mut canvas = Canvas::new(10, 10);
        let img = Image::solid(4, 4, [7, 7, 7, 255]);
        let crop = Rect::new(0.0, 0.0, 4.0, 4.0);
        // Far wider than the canvas, mostly off to the left
        canvas.draw_region(&img, crop, Rect::new(-1.0e8, 0.0, 2.0e8, 10.0), 1.0);
        assert_eq!(canvas.pixel(0, 0), Some([7, 7, 7, 255]));
        assert_eq!(canvas.pixel(9, 9), Some([7, 7, 7, 255]));

        let mut canvas = Canvas::new(10, 10);
        canvas.draw_region(&img, crop, Rect::new(1.0e9, 0.0, 4.0, 4.0), 1.0);
        canvas.draw_region(&img, crop, Rect::new(0.0, 0.0, f32::INFINITY, 4.0), 1.0);
        assert!(canvas.buffer().iter().all(|&b| b == 0));
    }
}
