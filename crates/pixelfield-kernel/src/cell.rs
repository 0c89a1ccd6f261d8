//! Grid cell records.

use glam::Vec2;
use pixelfield_common::{CellId, Rgb};

use crate::quadtree::Rect;

/// Interpolation endpoints for a cell taking part in a focus transition.
///
/// An active tween pins its cell for as long as the focus lasts, including
/// when the cell already rests at its target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellTween {
    /// Position when the transition started.
    pub origin: Vec2,
    /// Scale when the transition started.
    pub origin_scale: f32,
    /// Position at the end of the transition.
    pub target: Vec2,
    /// Scale at the end of the transition.
    pub target_scale: f32,
    /// Whether the cell is held by a focus.
    pub active: bool,
}

impl CellTween {
    /// A tween that is not transitioning, resting at the given state.
    #[must_use]
    pub const fn settled(position: Vec2, scale: f32) -> Self {
        Self {
            origin: position,
            origin_scale: scale,
            target: position,
            target_scale: scale,
            active: false,
        }
    }

    /// A tween toward `target`, starting from the given state.
    #[must_use]
    pub const fn toward(origin: Vec2, origin_scale: f32, target: Vec2, target_scale: f32) -> Self {
        Self {
            origin,
            origin_scale,
            target,
            target_scale,
            active: true,
        }
    }

    /// Whether the cell is held by a focus transition.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Position and scale at progress `t` (clamped to 0.0-1.0).
    #[must_use]
    pub fn sample(&self, t: f32) -> (Vec2, f32) {
        let t = t.clamp(0.0, 1.0);
        if t >= 1.0 {
            return (self.target, self.target_scale);
        }
        (
            self.origin.lerp(self.target, t),
            self.origin_scale + (self.target_scale - self.origin_scale) * t,
        )
    }
}

impl Default for CellTween {
    fn default() -> Self {
        Self::settled(Vec2::ZERO, 1.0)
    }
}

/// A single grid cell.
///
/// The base size is shared by every cell and held by the population; a
/// cell's footprint is `base_size * scale`.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    /// Stable identifier.
    pub id: CellId,
    /// Top-left corner.
    pub position: Vec2,
    /// Drift per reference frame.
    pub velocity: Vec2,
    /// Size multiplier (1.0 = base size).
    pub scale: f32,
    /// Owner-defined color token.
    pub color: Rgb,
    /// Opaque answer label marking the cell as claimed.
    pub answer: Option<String>,
    /// Focus transition endpoints.
    pub tween: CellTween,
    /// Render-only displacement from wave effects, cleared after each render.
    pub wave_offset: Vec2,
}

impl Cell {
    /// Creates an unanswered cell at unit scale.
    #[must_use]
    pub fn new(id: CellId, position: Vec2, velocity: Vec2, color: Rgb) -> Self {
        Self {
            id,
            position,
            velocity,
            scale: 1.0,
            color,
            answer: None,
            tween: CellTween::settled(position, 1.0),
            wave_offset: Vec2::ZERO,
        }
    }

    /// Side length of the cell box.
    #[must_use]
    pub fn footprint(&self, base_size: f32) -> f32 {
        base_size * self.scale
    }

    /// The full scaled box of the cell.
    #[must_use]
    pub fn bounds(&self, base_size: f32) -> Rect {
        let size = self.footprint(base_size);
        Rect::new(self.position.x, self.position.y, size, size)
    }

    /// Center of the scaled box.
    #[must_use]
    pub fn center(&self, base_size: f32) -> Vec2 {
        self.position + Vec2::splat(self.footprint(base_size) / 2.0)
    }

    /// Where the cell is drawn this frame, wave offset included.
    #[must_use]
    pub fn render_position(&self) -> Vec2 {
        self.position + self.wave_offset
    }

    /// Whether the cell carries an answer tag.
    #[must_use]
    pub fn is_answered(&self) -> bool {
        self.answer.as_deref().is_some_and(|a| !a.is_empty())
    }

    /// Ends any focus transition, resting at the current position and unit scale.
    pub fn settle(&mut self) {
        self.scale = 1.0;
        self.tween = CellTween::settled(self.position, 1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell_at(x: f32, y: f32) -> Cell {
        Cell::new(CellId::particle(0), Vec2::new(x, y), Vec2::ZERO, Rgb::WHITE)
    }

    #[test]
    fn test_new_cell_is_settled() {
        let cell = cell_at(5.0, 6.0);
        assert!(!cell.tween.is_active());
        assert!((cell.scale - 1.0).abs() < f32::EPSILON);
        assert!(!cell.is_answered());
    }

    #[test]
    fn test_bounds_follow_scale() {
        let mut cell = cell_at(10.0, 20.0);
        cell.scale = 3.0;
        let b = cell.bounds(10.0);
        assert_eq!(b, Rect::new(10.0, 20.0, 30.0, 30.0));
        assert_eq!(cell.center(10.0), Vec2::new(25.0, 35.0));
    }

    #[test]
    fn test_empty_answer_is_unanswered() {
        let mut cell = cell_at(0.0, 0.0);
        cell.answer = Some(String::new());
        assert!(!cell.is_answered());
        cell.answer = Some("yes".to_string());
        assert!(cell.is_answered());
    }

    #[test]
    fn test_tween_sample_clamps() {
        let tween = CellTween::toward(Vec2::ZERO, 1.0, Vec2::new(100.0, 50.0), 10.0);
        assert!(tween.is_active());
        assert_eq!(tween.sample(0.5), (Vec2::new(50.0, 25.0), 5.5));
        assert_eq!(tween.sample(2.0), (Vec2::new(100.0, 50.0), 10.0));
        assert_eq!(tween.sample(-1.0), (Vec2::ZERO, 1.0));
    }

    #[test]
    fn test_tween_at_target_stays_active() {
        let at = Vec2::new(0.0, 40.0);
        let tween = CellTween::toward(at, 1.0, at, 1.0);
        assert!(tween.is_active());
        assert_eq!(tween.sample(0.3), (at, 1.0));
        assert!(!CellTween::settled(at, 1.0).is_active());
    }

    #[test]
    fn test_settle_resets_scale() {
        let mut cell = cell_at(1.0, 1.0);
        cell.scale = 4.0;
        cell.tween = CellTween::toward(cell.position, 4.0, Vec2::new(9.0, 9.0), 1.0);
        cell.settle();
        assert!((cell.scale - 1.0).abs() < f32::EPSILON);
        assert!(!cell.tween.is_active());
    }
}
