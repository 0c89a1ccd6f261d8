//! Software framebuffer renderer.
//!
//! Rasterizes the grid's draw calls into an RGB buffer that can be written
//! out as a PNG snapshot.

use anyhow::{Context, Result};
use glam::Vec2;
use pixelfield_common::Rgb;
use pixelfield_kernel::CellRenderer;
use std::path::Path;
use tracing::info;

/// How much the hover outline lightens the pixels under it.
const HIGHLIGHT_LIGHTEN: f32 = 0.6;

/// RGB framebuffer implementing [`CellRenderer`].
#[derive(Debug, Clone)]
pub struct Framebuffer {
    width: u32,
    height: u32,
    background: Rgb,
    pixels: Vec<Rgb>,
}

impl Framebuffer {
    /// Creates a framebuffer filled with `background`.
    #[must_use]
    pub fn new(width: u32, height: u32, background: Rgb) -> Self {
        Self {
            width,
            height,
            background,
            pixels: vec![background; width as usize * height as usize],
        }
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Fills the buffer with the background color.
    pub fn clear(&mut self) {
        self.pixels.fill(self.background);
    }

    /// Color at (`x`, `y`).
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get(self.offset(x, y)).copied()
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    fn set(&mut self, x: i64, y: i64, color: Rgb) {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return;
        }
        let offset = self.offset(x as u32, y as u32);
        if let Some(pixel) = self.pixels.get_mut(offset) {
            *pixel = color;
        }
    }

    fn shade(&mut self, x: i64, y: i64, f: impl Fn(Rgb) -> Rgb) {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return;
        }
        let offset = self.offset(x as u32, y as u32);
        if let Some(pixel) = self.pixels.get_mut(offset) {
            *pixel = f(*pixel);
        }
    }

    /// Pixel span covered by a box edge pair, clamped to the buffer.
    fn span(start: f32, size: f32, limit: u32) -> std::ops::Range<i64> {
        let from = start.floor().max(0.0) as i64;
        let to = (start + size).ceil().min(limit as f32) as i64;
        from..to.max(from)
    }

    /// Writes the buffer as a PNG.
    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let raw: Vec<u8> = self
            .pixels
            .iter()
            .flat_map(|p| [p.r, p.g, p.b])
            .collect();
        let image = image::RgbImage::from_raw(self.width, self.height, raw)
            .context("framebuffer size does not match its pixel data")?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        image
            .save(path)
            .with_context(|| format!("failed to write snapshot {}", path.display()))?;
        info!("Saved snapshot to {}", path.display());
        Ok(())
    }
}

impl CellRenderer for Framebuffer {
    fn render_cell(&mut self, x: f32, y: f32, color: Rgb, size: f32) {
        for py in Self::span(y, size, self.height) {
            for px in Self::span(x, size, self.width) {
                self.set(px, py, color);
            }
        }
    }

    fn render_highlight(&mut self, x: f32, y: f32, size: f32) {
        let left = x.floor() as i64 - 1;
        let top = y.floor() as i64 - 1;
        let right = (x + size).ceil() as i64;
        let bottom = (y + size).ceil() as i64;
        let lighten = |c: Rgb| c.lighten(HIGHLIGHT_LIGHTEN);

        for px in left..=right {
            self.shade(px, top, lighten);
            self.shade(px, bottom, lighten);
        }
        for py in top + 1..bottom {
            self.shade(left, py, lighten);
            self.shade(right, py, lighten);
        }
    }

    fn render_explosion(&mut self, center: Vec2, radius: f32, progress: f32) {
        if radius < 0.5 {
            return;
        }
        // The ring fades out as it grows.
        let color = Rgb::WHITE.darken(progress);
        let steps = (radius * std::f32::consts::TAU).ceil().max(8.0) as u32;
        for i in 0..steps {
            let angle = i as f32 / steps as f32 * std::f32::consts::TAU;
            let point = center + Vec2::new(angle.cos(), angle.sin()) * radius;
            self.set(point.x.round() as i64, point.y.round() as i64, color);
        }
    }
}
