//! The interactive grid: one value owning population, index, effects,
//! focus and pointer state.
//!
//! ## Frame order
//!
//! [`PixelGrid::frame`] runs, in order:
//! 1. one build batch and effect pruning (and nothing else) while a build is
//!    in flight
//! 2. physics integration
//! 3. quadtree rebuild, every `rebuild_interval` frames or when the layout
//!    changed discontinuously
//! 4. expired effect pruning
//! 5. the coalesced hover hit-test
//! 6. wave offsets, queried against the freshly indexed positions
//! 7. focus interpolation, re-indexing the moved cells while focusing
//! 8. rendering, after which wave offsets are cleared
//!
//! ## Z-order
//!
//! Cells are drawn in index order with the focused cell, if any, drawn last.
//! Hit-testing uses the same order in reverse: the topmost drawn cell wins.

use glam::Vec2;
use pixelfield_common::{CellId, Rgb};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::animation::{AnimationConfig, AnimationEngine};
use crate::cell::Cell;
use crate::effects::EffectSet;
use crate::error::{GridError, GridResult};
use crate::events::{EventBus, GridEvent};
use crate::focus::FocusPhase;
use crate::population::{
    sanitize_area, BuildProgress, CellPopulation, ColorSource, PopulationConfig, RandomColors,
    REFERENCE_FRAME_MS,
};
use crate::quadtree::{QuadTree, QuadTreeStats, Rect};
use crate::render::CellRenderer;
use crate::theme::ImageTheme;

/// Spatial index parameters.
#[derive(Debug, Clone)]
pub struct IndexConfig {
    /// Items per node before subdividing.
    pub capacity: usize,
    /// Maximum subdivision depth.
    pub max_depth: usize,
    /// Frames between periodic rebuilds.
    pub rebuild_interval: u32,
    /// Side of the square probe used for pointer queries.
    pub probe_size: f32,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            capacity: 8,
            max_depth: 6,
            rebuild_interval: 3,
            probe_size: 2.0,
        }
    }
}

/// Everything needed to create a grid.
#[derive(Debug, Clone, Default)]
pub struct GridConfig {
    /// Population parameters.
    pub population: PopulationConfig,
    /// Spatial index parameters.
    pub index: IndexConfig,
    /// Effect and focus tuning.
    pub animation: AnimationConfig,
    /// Event bus capacity (0 = default).
    pub event_capacity: usize,
}

/// Bulk-overwrite record for restoring cell state after a build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellRecord {
    /// Cell to overwrite.
    pub id: CellId,
    /// New color.
    pub color: Rgb,
    /// New answer tag.
    pub answer: Option<String>,
}

/// What a pointer-down did.
#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    /// Nothing was hit and no focus was active.
    Miss,
    /// A focus transition started (or moved) to this cell.
    FocusStarted(CellId),
    /// The focused cell was clicked again.
    Committed {
        /// Committed cell
        id: CellId,
        /// Its color
        color: Rgb,
    },
    /// Empty space was clicked while focused.
    FocusCancelled,
    /// A cell with an answer was clicked.
    OwnedCell(CellId),
}

/// Per-frame diagnostics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameStats {
    /// Frame counter.
    pub frame: u64,
    /// Whether the population is still building.
    pub building: bool,
    /// Whether the quadtree was rebuilt this frame.
    pub index_rebuilt: bool,
    /// Effects pruned this frame.
    pub effects_pruned: usize,
    /// Live waves after pruning.
    pub waves: usize,
    /// Live explosions after pruning.
    pub explosions: usize,
    /// Cells handed to the renderer.
    pub cells_drawn: usize,
}

/// An interactive grid of animated cells.
pub struct PixelGrid {
    index_config: IndexConfig,
    population: CellPopulation,
    index: QuadTree<usize>,
    index_ready: bool,
    index_dirty: bool,
    animation: AnimationEngine,
    colors: Box<dyn ColorSource>,
    events: EventBus,
    area: Vec2,
    target_count: usize,
    frame: u64,
    last_frame_ms: Option<f64>,
    now_ms: f64,
    pending_pointer: Option<Vec2>,
    hovered: Option<usize>,
    last_wave_cell: Option<usize>,
    answered_only: bool,
    last_percent: Option<u8>,
}

impl PixelGrid {
    /// Creates an empty grid over a `width`×`height` drawable area.
    #[must_use]
    pub fn new(config: GridConfig, width: f32, height: f32) -> Self {
        let area = sanitize_area(width, height);
        let colors: Box<dyn ColorSource> = match config.population.seed {
            Some(seed) => Box::new(RandomColors::with_seed(seed.wrapping_add(1))),
            None => Box::new(RandomColors::new()),
        };
        let events = if config.event_capacity == 0 {
            EventBus::default()
        } else {
            EventBus::new(config.event_capacity)
        };

        Self {
            index: Self::new_index(&config.index, area),
            index_config: config.index,
            population: CellPopulation::new(config.population),
            index_ready: false,
            index_dirty: false,
            animation: AnimationEngine::new(config.animation),
            colors,
            events,
            area,
            target_count: 0,
            frame: 0,
            last_frame_ms: None,
            now_ms: 0.0,
            pending_pointer: None,
            hovered: None,
            last_wave_cell: None,
            answered_only: false,
            last_percent: None,
        }
    }

    /// Replaces the color source used by builds and [`PixelGrid::recolor`].
    #[must_use]
    pub fn with_color_source(mut self, colors: Box<dyn ColorSource>) -> Self {
        self.colors = colors;
        self
    }

    fn new_index(config: &IndexConfig, area: Vec2) -> QuadTree<usize> {
        QuadTree::new(
            Rect::new(0.0, 0.0, area.x, area.y),
            config.capacity,
            config.max_depth,
        )
    }

    /// Starts building `count` cells. Batches are generated by [`PixelGrid::frame`].
    ///
    /// Any build in flight is superseded and any focus is dropped.
    pub fn build(&mut self, count: usize) {
        self.target_count = count;
        self.population.begin_build(count, self.area.x, self.area.y);
        self.animation.reset();
        self.index.clear();
        self.index_ready = false;
        self.index_dirty = false;
        self.pending_pointer = None;
        self.hovered = None;
        self.last_wave_cell = None;
        self.last_percent = None;
    }

    /// Adopts a new drawable size and rebuilds the population for it.
    pub fn on_resize(&mut self, width: f32, height: f32) {
        self.area = sanitize_area(width, height);
        self.index = Self::new_index(&self.index_config, self.area);
        debug!("Grid resized to {}x{}", self.area.x, self.area.y);
        self.build(self.target_count);
    }

    /// Rebuilds the population with unscaled cells of side `size`.
    ///
    /// Non-finite or non-positive sizes are ignored.
    pub fn set_cell_size(&mut self, size: f32) {
        if !size.is_finite() || size <= 0.0 {
            warn!("Ignoring cell size {}", size);
            return;
        }
        self.population.set_base_size(size);
        debug!("Cell size set to {}", self.population.base_size());
        self.build(self.target_count);
    }

    /// Records the pointer position; the hit-test runs on the next frame.
    pub fn on_pointer_move(&mut self, x: f32, y: f32) {
        self.pending_pointer = Some(Vec2::new(x, y));
    }

    /// Clears hover when the pointer leaves the drawable area.
    pub fn on_pointer_leave(&mut self) {
        self.pending_pointer = None;
        self.hovered = None;
        self.last_wave_cell = None;
    }

    /// Handles a click at (`x`, `y`).
    ///
    /// Every click spawns an explosion at the click point.
    pub fn on_pointer_down(&mut self, x: f32, y: f32) -> ClickOutcome {
        let point = Vec2::new(x, y);
        self.animation.spawn_explosion(point, self.now_ms);

        let hit = self.find_cell_under_point(x, y);
        let focus_active = self.animation.focus_phase().is_active();

        let Some(index) = hit else {
            if focus_active {
                self.animation.cancel_focus(&mut self.population);
                self.index_dirty = true;
                self.events.publish(GridEvent::FocusCancelled);
                return ClickOutcome::FocusCancelled;
            }
            return ClickOutcome::Miss;
        };

        let Some(cell) = self.population.get(index) else {
            return ClickOutcome::Miss;
        };
        let id = cell.id.clone();

        if let Some(answer) = cell.answer.clone().filter(|a| !a.is_empty()) {
            debug!("Owned cell {} clicked", id);
            self.events.publish(GridEvent::OwnedCellClicked {
                id: id.clone(),
                answer,
            });
            return ClickOutcome::OwnedCell(id);
        }

        if self.animation.focus().is_focused(index) {
            let color = cell.color;
            debug!("Focus on {} committed", id);
            self.events.publish(GridEvent::FocusCommitted {
                id: id.clone(),
                color,
            });
            return ClickOutcome::Committed { id, color };
        }

        self.animation
            .begin_focus(&mut self.population, index, self.now_ms);
        self.index_dirty = true;
        self.events
            .publish(GridEvent::FocusStarted { id: id.clone() });
        ClickOutcome::FocusStarted(id)
    }

    /// Index of the topmost visible cell whose box contains (`x`, `y`).
    ///
    /// Always `None` while building or before the index has been filled.
    /// With the answered-only filter on, unanswered cells are ignored.
    ///
    /// The quadtree stores a cell in the first quadrant its box touches, so
    /// the probe is grown to cover the largest footprint; any cell containing
    /// the point then lies fully inside the probe and is returned.
    #[must_use]
    pub fn find_cell_under_point(&self, x: f32, y: f32) -> Option<usize> {
        if self.population.is_building() || !self.index_ready {
            return None;
        }

        let base = self.population.base_size();
        let probe_size =
            self.index_config.probe_size.max(f32::EPSILON) + base * self.animation.max_scale() * 2.0;
        let probe = Rect::from_center(x, y, probe_size, probe_size);

        self.index
            .query(probe)
            .into_iter()
            .copied()
            .filter(|&i| {
                self.is_visible(i)
                    && self
                        .population
                        .get(i)
                        .is_some_and(|cell| cell.bounds(base).contains_point(x, y))
            })
            .max_by_key(|&i| self.z_rank(i))
    }

    /// Draw/hit priority of the cell at `index`; higher is on top.
    #[must_use]
    pub fn z_rank(&self, index: usize) -> usize {
        if self.animation.focus().is_focused(index) {
            usize::MAX
        } else {
            index
        }
    }

    /// Runs one frame at time `now_ms` and draws it into `renderer`.
    pub fn frame(&mut self, now_ms: f64, renderer: &mut dyn CellRenderer) -> FrameStats {
        let dt_ms = self
            .last_frame_ms
            .map_or(REFERENCE_FRAME_MS, |last| (now_ms - last).max(0.0) as f32);
        self.last_frame_ms = Some(now_ms);
        self.now_ms = now_ms;
        self.frame += 1;

        let mut stats = FrameStats {
            frame: self.frame,
            ..FrameStats::default()
        };

        if self.population.is_building() {
            stats.effects_pruned = self.animation.prune(now_ms);
            self.step_build();
            stats.building = self.population.is_building();
            stats.index_rebuilt = self.index_ready;
            return stats;
        }

        self.population.integrate(dt_ms);

        let interval = u64::from(self.index_config.rebuild_interval.max(1));
        if self.index_dirty || self.frame % interval == 0 {
            self.rebuild_index();
            stats.index_rebuilt = true;
        }

        stats.effects_pruned = self.animation.prune(now_ms);

        if let Some(pointer) = self.pending_pointer.take() {
            self.update_hover(pointer);
        }

        self.animation
            .apply_waves(&mut self.population, &self.index, now_ms);

        let focusing = self.animation.focus_phase() == FocusPhase::Focusing;
        let settled = self.animation.advance_focus(&mut self.population, now_ms);
        if focusing {
            self.rebuild_index();
            stats.index_rebuilt = true;
        }
        if settled {
            if let Some(cell) = self.focused_cell() {
                self.events
                    .publish(GridEvent::FocusSettled { id: cell.id.clone() });
            }
        }

        stats.cells_drawn = self.render(renderer, now_ms);
        AnimationEngine::clear_wave_offsets(&mut self.population);

        let effects = self.animation.effects();
        stats.waves = effects.waves().len();
        stats.explosions = effects.explosions().len();
        trace!("Frame {}: {:?}", self.frame, stats);
        stats
    }

    fn step_build(&mut self) {
        let progress = self.population.step_build(self.colors.as_mut());
        let percent = progress.percent();
        if self.last_percent != Some(percent) {
            self.last_percent = Some(percent);
            self.events.publish(GridEvent::BuildProgress { percent });
        }

        if let BuildProgress::Complete { count } = progress {
            self.rebuild_index();
            self.events.publish(GridEvent::BuildComplete { count });
        }
    }

    fn rebuild_index(&mut self) {
        let base = self.population.base_size();
        self.index.clear();

        let mut rejected = 0usize;
        for (i, cell) in self.population.cells().iter().enumerate() {
            if !self.index.insert(cell.bounds(base), i) {
                rejected += 1;
            }
        }
        if rejected > 0 {
            warn!("{} cells fell outside the index bounds", rejected);
        }

        self.index_ready = true;
        self.index_dirty = false;
    }

    fn update_hover(&mut self, pointer: Vec2) {
        let hit = self.find_cell_under_point(pointer.x, pointer.y);
        if hit != self.hovered {
            self.hovered = None;
        }

        let Some(index) = hit else {
            return;
        };

        self.hovered = Some(index);
        if self.last_wave_cell != Some(index) {
            self.last_wave_cell = Some(index);
            if let Some(cell) = self.population.get(index) {
                let center = cell.center(self.population.base_size());
                self.animation.spawn_wave(center, self.now_ms);
            }
        }
    }

    fn is_visible(&self, index: usize) -> bool {
        !self.answered_only
            || self
                .population
                .get(index)
                .is_some_and(Cell::is_answered)
    }

    fn render(&self, renderer: &mut dyn CellRenderer, now_ms: f64) -> usize {
        let base = self.population.base_size();
        let focused = self
            .animation
            .focus()
            .index()
            .filter(|_| self.animation.focus_phase().is_active());

        let mut drawn = 0;
        let order = (0..self.population.len())
            .filter(|&i| Some(i) != focused)
            .chain(focused);

        for i in order {
            if !self.is_visible(i) {
                continue;
            }
            let Some(cell) = self.population.get(i) else {
                continue;
            };
            let at = cell.render_position();
            let size = cell.footprint(base);
            renderer.render_cell(at.x, at.y, cell.color, size);
            if self.hovered == Some(i) {
                renderer.render_highlight(at.x, at.y, size);
            }
            drawn += 1;
        }

        for explosion in self.animation.effects().explosions() {
            renderer.render_explosion(
                explosion.center,
                explosion.radius(now_ms),
                explosion.clock.fraction(now_ms),
            );
        }

        drawn
    }

    /// Cell with `id`.
    #[must_use]
    pub fn get_cell_by_id(&self, id: &CellId) -> Option<&Cell> {
        self.population
            .index_of(id)
            .and_then(|i| self.population.get(i))
    }

    /// Tags the cell `id` with `answer` and gives it `color`.
    pub fn submit_answer(&mut self, id: &CellId, answer: impl Into<String>, color: Rgb) -> GridResult<()> {
        if self.population.is_building() {
            return Err(GridError::Building);
        }
        let index = self
            .population
            .index_of(id)
            .ok_or_else(|| GridError::UnknownCell(id.clone()))?;
        if let Some(cell) = self.population.get_mut(index) {
            cell.answer = Some(answer.into());
            cell.color = color;
            debug!("Answer recorded for {}", id);
        }
        Ok(())
    }

    /// Overwrites color and answer of the listed cells.
    ///
    /// Records naming unknown cells are skipped. Returns how many were applied.
    pub fn apply_records(&mut self, records: &[CellRecord]) -> GridResult<usize> {
        if !self.population.is_building_complete() {
            return Err(GridError::Building);
        }

        let mut applied = 0;
        for record in records {
            let Some(index) = self.population.index_of(&record.id) else {
                warn!("Skipping record for unknown cell {}", record.id);
                continue;
            };
            if let Some(cell) = self.population.get_mut(index) {
                cell.color = record.color;
                cell.answer.clone_from(&record.answer);
                applied += 1;
            }
        }
        Ok(applied)
    }

    /// Recolors every cell from the grid's color source.
    pub fn recolor(&mut self) {
        self.population.recolor(self.colors.as_mut());
    }

    /// Recolors cells from an image; cells over missing image data keep their color.
    pub fn apply_theme(&mut self, theme: &ImageTheme) -> usize {
        let area = self.population.area();
        self.population
            .recolor_with(|cell, base| theme.sample(cell.bounds(base), area))
    }

    /// Limits rendering and pointer interaction to answered cells.
    pub fn set_answered_only(&mut self, answered_only: bool) {
        self.answered_only = answered_only;
        if answered_only && self.hovered.is_some_and(|i| !self.is_visible(i)) {
            self.hovered = None;
        }
    }

    /// Whether the answered-only filter is on.
    #[must_use]
    pub fn answered_only(&self) -> bool {
        self.answered_only
    }

    /// Whether the population is built and queryable.
    #[must_use]
    pub fn is_building_complete(&self) -> bool {
        self.population.is_building_complete()
    }

    /// The population.
    #[must_use]
    pub fn population(&self) -> &CellPopulation {
        &self.population
    }

    /// All cells in index order.
    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        self.population.cells()
    }

    /// Cell currently hovered.
    #[must_use]
    pub fn hovered_cell(&self) -> Option<&Cell> {
        self.hovered.and_then(|i| self.population.get(i))
    }

    /// Cell currently focused or being focused.
    #[must_use]
    pub fn focused_cell(&self) -> Option<&Cell> {
        let focus = self.animation.focus();
        if focus.phase().is_active() {
            focus.index().and_then(|i| self.population.get(i))
        } else {
            None
        }
    }

    /// Focus phase.
    #[must_use]
    pub fn focus_phase(&self) -> FocusPhase {
        self.animation.focus_phase()
    }

    /// Live effects.
    #[must_use]
    pub fn effects(&self) -> &EffectSet {
        self.animation.effects()
    }

    /// Event bus.
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Drains pending events.
    pub fn drain_events(&self) -> Vec<GridEvent> {
        self.events.drain()
    }

    /// Spatial index statistics.
    #[must_use]
    pub fn index_stats(&self) -> QuadTreeStats {
        self.index.stats()
    }

    /// Drawable area.
    #[must_use]
    pub fn area(&self) -> Vec2 {
        self.area
    }
}

impl std::fmt::Debug for PixelGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixelGrid")
            .field("area", &self.area)
            .field("cells", &self.population.len())
            .field("building", &self.population.is_building())
            .field("focus", &self.animation.focus_phase())
            .field("frame", &self.frame)
            .finish_non_exhaustive()
    }
}
