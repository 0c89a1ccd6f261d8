//! Animation engine: hover waves, click explosions and the focus transition.
//!
//! Waves never move cells. They accumulate a render-only offset that the
//! grid clears right after drawing, so the quadtree always indexes the real
//! positions. The focus transition does move cells: the focused cell grows
//! toward the center and every other cell slides to the nearest side edge.

use glam::Vec2;
use tracing::debug;

use crate::cell::CellTween;
use crate::effects::{EffectClock, EffectSet, ExplosionEffect, WaveEffect};
use crate::focus::{FocusEasing, FocusPhase, FocusState};
use crate::population::CellPopulation;
use crate::quadtree::{QuadTree, Rect};

/// Effect and focus tuning.
#[derive(Debug, Clone)]
pub struct AnimationConfig {
    /// Wave lifetime in milliseconds.
    pub wave_duration_ms: f64,
    /// Final wave radius, also the distance at which the push fades out.
    pub wave_max_offset: f32,
    /// Push strength per unit of `max_offset - distance`.
    pub wave_damping: f32,
    /// Explosion lifetime in milliseconds.
    pub explosion_duration_ms: f64,
    /// Final explosion ring radius.
    pub explosion_max_radius: f32,
    /// Scale the focused cell grows to.
    pub focus_scale: f32,
    /// Focus transition duration in milliseconds.
    pub focus_duration_ms: f64,
    /// Focus easing curve.
    pub focus_easing: FocusEasing,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            wave_duration_ms: 600.0,
            wave_max_offset: 40.0,
            wave_damping: 0.1,
            explosion_duration_ms: 500.0,
            explosion_max_radius: 60.0,
            focus_scale: 10.0,
            focus_duration_ms: 800.0,
            focus_easing: FocusEasing::Linear,
        }
    }
}

/// Drives every time-based effect of one grid.
#[derive(Debug)]
pub struct AnimationEngine {
    config: AnimationConfig,
    effects: EffectSet,
    focus: FocusState,
    hits: Vec<usize>,
}

impl AnimationEngine {
    /// Creates an engine with no live effects.
    #[must_use]
    pub fn new(config: AnimationConfig) -> Self {
        let focus = FocusState::new(config.focus_duration_ms, config.focus_easing);
        Self {
            config,
            effects: EffectSet::new(),
            focus,
            hits: Vec::new(),
        }
    }

    /// Starts a wave centered at `center`.
    pub fn spawn_wave(&mut self, center: Vec2, now_ms: f64) {
        self.effects.push_wave(WaveEffect {
            center,
            clock: EffectClock::new(now_ms, self.config.wave_duration_ms),
            max_offset: self.config.wave_max_offset,
        });
    }

    /// Starts an explosion ring centered at `center`.
    pub fn spawn_explosion(&mut self, center: Vec2, now_ms: f64) {
        self.effects.push_explosion(ExplosionEffect {
            center,
            clock: EffectClock::new(now_ms, self.config.explosion_duration_ms),
            max_radius: self.config.explosion_max_radius,
        });
    }

    /// Drops expired waves and explosions.
    pub fn prune(&mut self, now_ms: f64) -> usize {
        self.effects.prune(now_ms)
    }

    /// Largest scale any cell can currently have.
    #[must_use]
    pub fn max_scale(&self) -> f32 {
        if self.focus.phase().is_active() {
            self.config.focus_scale.max(1.0)
        } else {
            1.0
        }
    }

    /// Accumulates the push of every live wave into the cells' render offsets.
    ///
    /// Candidates come from `index`; a cell is pushed when its center lies in
    /// the box bounding the current wave front. The index is queried with the
    /// front grown by the largest footprint so every such cell is returned.
    pub fn apply_waves(&mut self, population: &mut CellPopulation, index: &QuadTree<usize>, now_ms: f64) {
        let base = population.base_size();
        let reach = base * self.max_scale() * 2.0;
        let damping = self.config.wave_damping;

        for wave in self.effects.waves() {
            let radius = wave.radius(now_ms);
            if radius <= 0.0 {
                continue;
            }

            let front = Rect::from_center(wave.center.x, wave.center.y, radius * 2.0, radius * 2.0);
            let search = Rect::from_center(
                wave.center.x,
                wave.center.y,
                front.width + reach,
                front.height + reach,
            );
            self.hits.clear();
            self.hits.extend(index.query(search).into_iter().copied());

            for &i in &self.hits {
                let Some(cell) = population.get_mut(i) else {
                    continue;
                };
                let center = cell.center(base);
                if !front.contains_point(center.x, center.y) {
                    continue;
                }

                let away = center - wave.center;
                let distance = away.length();
                if distance <= f32::EPSILON || distance >= wave.max_offset {
                    continue;
                }
                cell.wave_offset += away / distance * (wave.max_offset - distance) * damping;
            }
        }
    }

    /// Zeroes every render offset.
    pub fn clear_wave_offsets(population: &mut CellPopulation) {
        for cell in population.cells_mut() {
            cell.wave_offset = Vec2::ZERO;
        }
    }

    /// Starts focusing the cell at `target`.
    ///
    /// The target moves to the center of the area at `focus_scale`; every other
    /// cell heads to the left or right edge (whichever its center is closer to)
    /// at unit scale, keeping its y. Origins are the cells' current state, so
    /// moving the focus mid-transition continues smoothly.
    pub fn begin_focus(&mut self, population: &mut CellPopulation, target: usize, now_ms: f64) {
        if target >= population.len() {
            return;
        }

        let base = population.base_size();
        let area = population.area();
        let mid_x = area.x / 2.0;
        let focus_scale = self.config.focus_scale.max(1.0);
        let focused_size = base * focus_scale;

        for (i, cell) in population.cells_mut().iter_mut().enumerate() {
            let (target_pos, target_scale) = if i == target {
                (
                    Vec2::new(mid_x - focused_size / 2.0, area.y / 2.0 - focused_size / 2.0),
                    focus_scale,
                )
            } else {
                let edge_x = if cell.center(base).x < mid_x {
                    0.0
                } else {
                    (area.x - base).max(0.0)
                };
                (Vec2::new(edge_x, cell.position.y), 1.0)
            };

            cell.tween = CellTween::toward(cell.position, cell.scale, target_pos, target_scale);
        }

        self.focus.begin(target, now_ms);
    }

    /// Ends the focus transition, returning every cell to unit scale.
    pub fn cancel_focus(&mut self, population: &mut CellPopulation) {
        if !self.focus.phase().is_active() {
            return;
        }
        for cell in population.cells_mut() {
            cell.settle();
        }
        self.focus.cancel();
    }

    /// Moves every held cell along its tween; once `Focused`, cells stay
    /// pinned at their targets until the focus is cancelled.
    ///
    /// Returns true on the frame the transition reaches `Focused`.
    pub fn advance_focus(&mut self, population: &mut CellPopulation, now_ms: f64) -> bool {
        if !self.focus.phase().is_active() {
            return false;
        }

        let t = self.focus.eased_progress(now_ms);
        for cell in population.cells_mut() {
            if cell.tween.is_active() {
                let (position, scale) = cell.tween.sample(t);
                cell.position = position;
                cell.scale = scale;
            }
        }

        let settled = self.focus.advance(now_ms);
        if settled {
            debug!("Focus transition complete");
        }
        settled
    }

    /// Focus state.
    #[must_use]
    pub fn focus(&self) -> &FocusState {
        &self.focus
    }

    /// Current focus phase.
    #[must_use]
    pub fn focus_phase(&self) -> FocusPhase {
        self.focus.phase()
    }

    /// Live effects.
    #[must_use]
    pub fn effects(&self) -> &EffectSet {
        &self.effects
    }

    /// Drops all effects and any focus without touching cells.
    pub fn reset(&mut self) {
        self.effects.clear();
        self.focus.cancel();
    }
}
