//! # Pixelfield Kernel
//!
//! Core of an interactive field of small colored cells.
//!
//! This crate provides:
//! - A generic region quadtree for box-range queries
//! - The cell population with batched builds and drifting physics
//! - Hover waves, click explosions and the focus transition
//! - The [`PixelGrid`] controller tying pointer input to all of the above
//! - An event bus for notifying the host
//!
//! ## Architecture
//!
//! The grid owns everything and is driven by the host: pointer callbacks
//! record input, and [`PixelGrid::frame`] advances one frame at a caller
//! supplied timestamp and emits draw calls through a [`CellRenderer`].
//! No clock or window is touched here, so every behavior is reproducible
//! in tests.
//!
//! ## Spatial Index
//!
//! The quadtree is cleared and refilled from the population periodically
//! and after any discontinuous layout change. Pointer hit-tests go through
//! a tiny probe query and are then confirmed against each candidate's box.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod animation;
pub mod cell;
pub mod effects;
pub mod error;
pub mod events;
pub mod focus;
pub mod grid;
pub mod population;
pub mod quadtree;
pub mod render;
pub mod theme;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::animation::*;
    pub use crate::cell::*;
    pub use crate::effects::*;
    pub use crate::error::*;
    pub use crate::events::*;
    pub use crate::focus::*;
    pub use crate::grid::*;
    pub use crate::population::*;
    pub use crate::quadtree::*;
    pub use crate::render::*;
    pub use crate::theme::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_grid_is_empty() {
        let grid = PixelGrid::new(GridConfig::default(), 800.0, 600.0);
        assert!(grid.cells().is_empty());
        assert!(!grid.is_building_complete());
        assert_eq!(grid.find_cell_under_point(10.0, 10.0), None);
    }

    #[test]
    fn test_default_index_config() {
        let config = IndexConfig::default();
        assert_eq!(config.capacity, 8);
        assert_eq!(config.rebuild_interval, 3);
    }
}
