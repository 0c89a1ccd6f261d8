//! # Pixelfield Common
//!
//! Common types, utilities, and shared abstractions for Pixelfield.
//!
//! This crate provides foundational types used across the Pixelfield crates:
//! - Cell identifiers
//! - RGB color tokens with parsing and shading helpers
//! - Common error types
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod color;
pub mod error;
pub mod ids;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::color::*;
    pub use crate::error::*;
    pub use crate::ids::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_id_from_ordinal() {
        let id = CellId::particle(0);
        assert_eq!(id.as_str(), "particle-1");
    }

    #[test]
    fn test_color_hex_round_trip() {
        let color: Rgb = "#1a2b3c".parse().expect("valid hex");
        assert_eq!(color, Rgb::new(0x1a, 0x2b, 0x3c));
        assert_eq!(color.to_hex(), "#1a2b3c");
    }
}
