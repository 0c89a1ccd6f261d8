//! Image-derived color themes.
//!
//! An [`ImageTheme`] holds an RGBA image stretched over the drawable area.
//! Each cell takes the average color of the image block under its box.

use glam::Vec2;
use pixelfield_common::Rgb;

use crate::quadtree::Rect;

/// An RGBA image used to recolor cells.
#[derive(Debug, Clone)]
pub struct ImageTheme {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl ImageTheme {
    /// Wraps raw RGBA bytes, row-major, `width` pixels per row.
    ///
    /// The buffer may be shorter than `width * height * 4`; blocks that fall
    /// past its end sample as missing.
    #[must_use]
    pub fn from_rgba(width: usize, height: usize, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            data,
        }
    }

    /// Image width in pixels.
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Image height in pixels.
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Average color under `cell_box`, with the image stretched over `area`.
    ///
    /// Returns `None` when the block holds no pixel data.
    #[must_use]
    pub fn sample(&self, cell_box: Rect, area: Vec2) -> Option<Rgb> {
        if self.width == 0 || self.height == 0 || area.x <= 0.0 || area.y <= 0.0 {
            return None;
        }

        let sx = self.width as f32 / area.x;
        let sy = self.height as f32 / area.y;
        let x = (cell_box.x.max(0.0) * sx) as usize;
        let y = (cell_box.y.max(0.0) * sy) as usize;
        if x >= self.width || y >= self.height {
            return None;
        }
        let size = (cell_box.width * sx.max(sy)).round().max(1.0) as usize;

        Rgb::average_block(&self.data, x, y, self.width, size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker() -> ImageTheme {
        // 2x2: left column red, right column blue.
        let red = [255, 0, 0, 255];
        let blue = [0, 0, 255, 255];
        let data = [red, blue, red, blue].concat();
        ImageTheme::from_rgba(2, 2, data)
    }

    #[test]
    fn test_sample_scales_to_area() {
        let theme = checker();
        let area = Vec2::new(100.0, 100.0);
        assert_eq!(
            theme.sample(Rect::new(10.0, 10.0, 10.0, 10.0), area),
            Some(Rgb::RED)
        );
        assert_eq!(
            theme.sample(Rect::new(60.0, 70.0, 10.0, 10.0), area),
            Some(Rgb::new(0, 0, 255))
        );
    }

    #[test]
    fn test_sample_missing_data() {
        let theme = ImageTheme::from_rgba(4, 4, vec![1, 2, 3, 255]);
        let area = Vec2::new(40.0, 40.0);
        assert_eq!(theme.sample(Rect::new(30.0, 30.0, 10.0, 10.0), area), None);
        assert!(theme.sample(Rect::new(0.0, 0.0, 10.0, 10.0), area).is_some());

        let empty = ImageTheme::from_rgba(0, 0, Vec::new());
        assert_eq!(empty.sample(Rect::new(0.0, 0.0, 1.0, 1.0), area), None);
    }
}
