//! Render hooks.
//!
//! The grid decides what is drawn, where and in which order; how a cell
//! looks is up to the renderer.

use glam::Vec2;
use pixelfield_common::Rgb;

/// Receives draw calls for one frame, in z-order.
pub trait CellRenderer {
    /// Draws a cell box at (`x`, `y`) with side `size`.
    fn render_cell(&mut self, x: f32, y: f32, color: Rgb, size: f32);

    /// Draws the hover outline around a cell box.
    fn render_highlight(&mut self, _x: f32, _y: f32, _size: f32) {}

    /// Draws an explosion ring. `progress` runs from 0.0 to 1.0 over its lifetime.
    fn render_explosion(&mut self, _center: Vec2, _radius: f32, _progress: f32) {}
}

/// A recorded draw call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawCommand {
    /// A cell box
    Cell {
        /// Left edge
        x: f32,
        /// Top edge
        y: f32,
        /// Fill color
        color: Rgb,
        /// Side length
        size: f32,
    },
    /// A hover outline
    Highlight {
        /// Left edge
        x: f32,
        /// Top edge
        y: f32,
        /// Side length
        size: f32,
    },
    /// An explosion ring
    Explosion {
        /// Ring center
        center: Vec2,
        /// Ring radius
        radius: f32,
        /// Lifetime progress
        progress: f32,
    },
}

/// Renderer that records draw calls, for headless hosts and tests.
#[derive(Debug, Default)]
pub struct DrawList {
    commands: Vec<DrawCommand>,
}

impl DrawList {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded commands in draw order.
    #[must_use]
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Number of cell boxes drawn.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Cell { .. }))
            .count()
    }

    /// Forgets every command.
    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

impl CellRenderer for DrawList {
    fn render_cell(&mut self, x: f32, y: f32, color: Rgb, size: f32) {
        self.commands.push(DrawCommand::Cell { x, y, color, size });
    }

    fn render_highlight(&mut self, x: f32, y: f32, size: f32) {
        self.commands.push(DrawCommand::Highlight { x, y, size });
    }

    fn render_explosion(&mut self, center: Vec2, radius: f32, progress: f32) {
        self.commands.push(DrawCommand::Explosion {
            center,
            radius,
            progress,
        });
    }
}
