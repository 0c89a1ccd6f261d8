//! RGB color tokens.
//!
//! The grid treats colors as opaque values. This module provides the
//! concrete token plus the conversions hosts need: `#rrggbb` and
//! `rgb(r,g,b)` text forms, random generation, shading, and block
//! averaging for image-derived themes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ColorError;

/// An 8-bit-per-channel RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rgb {
    /// Red channel
    pub r: u8,
    /// Green channel
    pub g: u8,
    /// Blue channel
    pub b: u8,
}

impl Rgb {
    /// Pure red, the color given to answered cells by default.
    pub const RED: Self = Self::new(255, 0, 0);
    /// White.
    pub const WHITE: Self = Self::new(255, 255, 255);
    /// Black.
    pub const BLACK: Self = Self::new(0, 0, 0);

    /// Creates a color from channels.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Draws a uniformly random color.
    #[must_use]
    pub fn random(rng: &mut fastrand::Rng) -> Self {
        Self::new(rng.u8(..), rng.u8(..), rng.u8(..))
    }

    /// Formats as `#rrggbb`.
    #[must_use]
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Formats as `rgb(r,g,b)`.
    #[must_use]
    pub fn to_css_rgb(self) -> String {
        format!("rgb({},{},{})", self.r, self.g, self.b)
    }

    /// Moves each channel toward 255 by `amount` (0.0-1.0).
    #[must_use]
    pub fn lighten(self, amount: f32) -> Self {
        let amount = amount.clamp(0.0, 1.0);
        let up = |c: u8| -> u8 {
            let c = f32::from(c);
            (c + (255.0 - c) * amount).round().min(255.0) as u8
        };
        Self::new(up(self.r), up(self.g), up(self.b))
    }

    /// Moves each channel toward 0 by `amount` (0.0-1.0).
    #[must_use]
    pub fn darken(self, amount: f32) -> Self {
        let amount = amount.clamp(0.0, 1.0);
        let down = |c: u8| -> u8 {
            let c = f32::from(c);
            (c - c * amount).round().max(0.0) as u8
        };
        Self::new(down(self.r), down(self.g), down(self.b))
    }

    /// Averages the RGBA pixels of a `size`×`size` block at (`x`, `y`) in an
    /// image buffer `width` pixels wide.
    ///
    /// Pixels that fall outside the buffer are skipped. Returns `None` when the
    /// block holds no pixel data at all, so callers can keep their previous
    /// color instead of writing an invalid one.
    #[must_use]
    pub fn average_block(data: &[u8], x: usize, y: usize, width: usize, size: usize) -> Option<Self> {
        let (mut r, mut g, mut b, mut count) = (0u64, 0u64, 0u64, 0u64);

        for dy in 0..size {
            for dx in 0..size {
                let px = x + dx;
                if px >= width {
                    continue;
                }
                let offset = ((y + dy) * width + px) * 4;
                if let Some(pixel) = data.get(offset..offset + 3) {
                    r += u64::from(pixel[0]);
                    g += u64::from(pixel[1]);
                    b += u64::from(pixel[2]);
                    count += 1;
                }
            }
        }

        if count == 0 {
            return None;
        }

        Some(Self::new(
            (r / count) as u8,
            (g / count) as u8,
            (b / count) as u8,
        ))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Rgb {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();

        if let Some(hex) = trimmed.strip_prefix('#') {
            if hex.len() != 6 || !hex.is_ascii() {
                return Err(ColorError::UnknownFormat(s.to_string()));
            }
            let channel = |range: std::ops::Range<usize>| {
                let digits = &hex[range];
                let invalid = || ColorError::InvalidChannel {
                    channel: digits.to_string(),
                    input: s.to_string(),
                };
                if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
                    return Err(invalid());
                }
                u8::from_str_radix(digits, 16).map_err(|_| invalid())
            };
            return Ok(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?));
        }

        if let Some(body) = trimmed
            .strip_prefix("rgb(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            let parts: Vec<&str> = body.split(',').map(str::trim).collect();
            if parts.len() != 3 {
                return Err(ColorError::UnknownFormat(s.to_string()));
            }
            let channel = |text: &str| {
                let invalid = || ColorError::InvalidChannel {
                    channel: text.to_string(),
                    input: s.to_string(),
                };
                if text.is_empty() || !text.chars().all(|c| c.is_ascii_digit()) {
                    return Err(invalid());
                }
                text.parse::<u8>().map_err(|_| invalid())
            };
            return Ok(Self::new(
                channel(parts[0])?,
                channel(parts[1])?,
                channel(parts[2])?,
            ));
        }

        Err(ColorError::UnknownFormat(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_css_rgb() {
        let color: Rgb = "rgb(12, 34,56)".parse().expect("valid rgb()");
        assert_eq!(color, Rgb::new(12, 34, 56));
        assert_eq!(color.to_css_rgb(), "rgb(12,34,56)");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            "blue".parse::<Rgb>(),
            Err(ColorError::UnknownFormat(_))
        ));
        assert!(matches!(
            "#12345".parse::<Rgb>(),
            Err(ColorError::UnknownFormat(_))
        ));
        assert!(matches!(
            "#zz0000".parse::<Rgb>(),
            Err(ColorError::InvalidChannel { .. })
        ));
        assert!(matches!(
            "rgb(300,0,0)".parse::<Rgb>(),
            Err(ColorError::InvalidChannel { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_signed_channels() {
        assert!(matches!(
            "#+f+f+f".parse::<Rgb>(),
            Err(ColorError::InvalidChannel { .. })
        ));
        assert!(matches!(
            "#-10000".parse::<Rgb>(),
            Err(ColorError::InvalidChannel { .. })
        ));
        assert!(matches!(
            "rgb(+1,2,3)".parse::<Rgb>(),
            Err(ColorError::InvalidChannel { .. })
        ));
        assert_eq!("#0aFf10".parse::<Rgb>(), Ok(Rgb::new(10, 255, 16)));
    }

    #[test]
    fn test_lighten_darken_extremes() {
        let c = Rgb::new(100, 50, 0);
        assert_eq!(c.lighten(1.0), Rgb::WHITE);
        assert_eq!(c.darken(1.0), Rgb::BLACK);
        assert_eq!(c.lighten(0.0), c);
    }

    #[test]
    fn test_average_block() {
        // 2x2 image: red, green / blue, white
        let data = [
            255, 0, 0, 255, 0, 255, 0, 255, //
            0, 0, 255, 255, 255, 255, 255, 255,
        ];
        let avg = Rgb::average_block(&data, 0, 0, 2, 2).expect("block has pixels");
        assert_eq!(avg, Rgb::new(127, 127, 127));

        let single = Rgb::average_block(&data, 1, 1, 2, 1).expect("one pixel");
        assert_eq!(single, Rgb::WHITE);
    }

    #[test]
    fn test_average_block_without_data() {
        let data = [10u8, 20, 30, 255];
        assert_eq!(Rgb::average_block(&data, 0, 5, 1, 2), None);
        assert_eq!(Rgb::average_block(&[], 0, 0, 4, 4), None);
    }

    #[test]
    fn test_random_is_seeded() {
        let mut a = fastrand::Rng::with_seed(7);
        let mut b = fastrand::Rng::with_seed(7);
        assert_eq!(Rgb::random(&mut a), Rgb::random(&mut b));
    }

    proptest! {
        #[test]
        fn lighten_never_darkens(r: u8, g: u8, b: u8, amount in 0.0f32..1.0) {
            let c = Rgb::new(r, g, b);
            let l = c.lighten(amount);
            prop_assert!(l.r >= c.r && l.g >= c.g && l.b >= c.b);
        }

        #[test]
        fn darken_never_lightens(r: u8, g: u8, b: u8, amount in 0.0f32..1.0) {
            let c = Rgb::new(r, g, b);
            let d = c.darken(amount);
            prop_assert!(d.r <= c.r && d.g <= c.g && d.b <= c.b);
        }
    }
}
