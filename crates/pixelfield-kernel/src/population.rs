//! Cell population: chunked construction and drift/bounce physics.
//!
//! A build is a resumable state machine. [`CellPopulation::begin_build`]
//! discards the current cells and starts a new job; every call to
//! [`CellPopulation::step_build`] generates one bounded batch. The host calls
//! it once per frame so construction of a large population never blocks the
//! display. While a job is in flight the population is not queryable and
//! physics is skipped.

use std::collections::HashMap;

use glam::Vec2;
use pixelfield_common::{CellId, Rgb};
use tracing::{debug, trace, warn};

use crate::cell::Cell;

/// Frame interval the drift velocities are expressed against, in milliseconds.
pub const REFERENCE_FRAME_MS: f32 = 16.6667;

/// Drawable area substituted for degenerate sizes.
pub const FALLBACK_AREA: Vec2 = Vec2::new(800.0, 600.0);

/// Population parameters.
#[derive(Debug, Clone)]
pub struct PopulationConfig {
    /// Side length of an unscaled cell.
    pub base_size: f32,
    /// Cells generated per build step.
    pub batch_size: usize,
    /// Velocity spread; each axis draws from `(-drift/2, drift/2)`.
    pub drift: f32,
    /// Seed for positions and velocities (None = random).
    pub seed: Option<u64>,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            base_size: 10.0,
            batch_size: 500,
            drift: 0.3,
            seed: None,
        }
    }
}

/// Supplies cell colors during a build or recolor.
pub trait ColorSource {
    /// Color for the cell at `index`.
    fn next_color(&mut self, index: usize) -> Rgb;
}

/// Uniform random RGB colors.
#[derive(Debug, Clone)]
pub struct RandomColors {
    rng: fastrand::Rng,
}

impl RandomColors {
    /// Creates a source with a random seed.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: fastrand::Rng::new(),
        }
    }

    /// Creates a deterministic source.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
        }
    }
}

impl Default for RandomColors {
    fn default() -> Self {
        Self::new()
    }
}

impl ColorSource for RandomColors {
    fn next_color(&mut self, _index: usize) -> Rgb {
        Rgb::random(&mut self.rng)
    }
}

/// Gives every cell the same color.
#[derive(Debug, Clone, Copy)]
pub struct SolidColor(pub Rgb);

impl ColorSource for SolidColor {
    fn next_color(&mut self, _index: usize) -> Rgb {
        self.0
    }
}

/// Outcome of one build step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildProgress {
    /// No build has been started, or the last one already completed.
    Idle,
    /// The job still has cells to generate.
    Building {
        /// Cells generated so far.
        generated: usize,
        /// Cells the job will generate.
        target: usize,
    },
    /// This step generated the final batch.
    Complete {
        /// Size of the finished population.
        count: usize,
    },
}

impl BuildProgress {
    /// Completion percentage (0-100).
    #[must_use]
    pub fn percent(&self) -> u8 {
        match *self {
            Self::Idle | Self::Complete { .. } => 100,
            Self::Building { generated, target } => {
                if target == 0 {
                    100
                } else {
                    ((generated * 100) / target).min(100) as u8
                }
            },
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct BuildJob {
    target: usize,
    generation: u64,
}

/// The authoritative list of cells.
#[derive(Debug)]
pub struct CellPopulation {
    config: PopulationConfig,
    cells: Vec<Cell>,
    by_id: HashMap<CellId, usize>,
    area: Vec2,
    rng: fastrand::Rng,
    job: Option<BuildJob>,
    generation: u64,
    built: bool,
}

impl CellPopulation {
    /// Creates an empty population. Nothing is queryable until a build completes.
    #[must_use]
    pub fn new(config: PopulationConfig) -> Self {
        let rng = config
            .seed
            .map_or_else(fastrand::Rng::new, fastrand::Rng::with_seed);
        Self {
            config: PopulationConfig {
                base_size: config.base_size.max(1.0),
                batch_size: config.batch_size.max(1),
                ..config
            },
            cells: Vec::new(),
            by_id: HashMap::new(),
            area: FALLBACK_AREA,
            rng,
            job: None,
            generation: 0,
            built: false,
        }
    }

    /// Starts a new build of `count` cells, discarding the current population.
    ///
    /// A build already in flight is superseded; its cells are dropped.
    pub fn begin_build(&mut self, count: usize, width: f32, height: f32) {
        if let Some(old) = self.job {
            debug!(
                "Superseding build #{} at {}/{} cells",
                old.generation,
                self.cells.len(),
                old.target
            );
        }

        self.area = sanitize_area(width, height);
        self.generation += 1;
        self.cells.clear();
        self.cells.reserve(count);
        self.by_id.clear();
        self.built = false;
        self.job = Some(BuildJob {
            target: count,
            generation: self.generation,
        });

        debug!(
            "Build #{} started: {} cells in {}x{}",
            self.generation, count, self.area.x, self.area.y
        );
    }

    /// Generates one batch of the current build.
    pub fn step_build(&mut self, colors: &mut dyn ColorSource) -> BuildProgress {
        let Some(job) = self.job else {
            return BuildProgress::Idle;
        };

        let end = (self.cells.len() + self.config.batch_size).min(job.target);
        let footprint = self.config.base_size;
        let span = (self.area - Vec2::splat(footprint)).max(Vec2::ZERO);
        let drift = self.config.drift;

        for index in self.cells.len()..end {
            let position = Vec2::new(self.rng.f32() * span.x, self.rng.f32() * span.y);
            let velocity = Vec2::new(
                (self.rng.f32() - 0.5) * drift,
                (self.rng.f32() - 0.5) * drift,
            );
            let id = CellId::particle(index);
            self.by_id.insert(id.clone(), index);
            self.cells
                .push(Cell::new(id, position, velocity, colors.next_color(index)));
        }

        if self.cells.len() >= job.target {
            self.job = None;
            self.built = true;
            debug!("Build #{} complete: {} cells", job.generation, self.cells.len());
            BuildProgress::Complete {
                count: self.cells.len(),
            }
        } else {
            trace!("Build #{}: {}/{}", job.generation, self.cells.len(), job.target);
            BuildProgress::Building {
                generated: self.cells.len(),
                target: job.target,
            }
        }
    }

    /// Whether a build job is in flight.
    #[must_use]
    pub fn is_building(&self) -> bool {
        self.job.is_some()
    }

    /// Whether a build has finished and no new one is in flight.
    #[must_use]
    pub fn is_building_complete(&self) -> bool {
        self.built && self.job.is_none()
    }

    /// Identifier of the latest build.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Advances every cell by its velocity and bounces it off the area edges.
    ///
    /// `dt_ms` is normalized against [`REFERENCE_FRAME_MS`]. Does nothing
    /// while building. Cells held by a focus tween are left where they are.
    pub fn integrate(&mut self, dt_ms: f32) {
        if self.job.is_some() {
            return;
        }

        let step = dt_ms.max(0.0) / REFERENCE_FRAME_MS;
        let base = self.config.base_size;
        let area = self.area;

        for cell in self.cells.iter_mut().filter(|c| !c.tween.is_active()) {
            cell.position += cell.velocity * step;

            let limit = (area - Vec2::splat(cell.footprint(base))).max(Vec2::ZERO);
            if cell.position.x < 0.0 {
                cell.position.x = 0.0;
                cell.velocity.x = cell.velocity.x.abs();
            } else if cell.position.x > limit.x {
                cell.position.x = limit.x;
                cell.velocity.x = -cell.velocity.x.abs();
            }
            if cell.position.y < 0.0 {
                cell.position.y = 0.0;
                cell.velocity.y = cell.velocity.y.abs();
            } else if cell.position.y > limit.y {
                cell.position.y = limit.y;
                cell.velocity.y = -cell.velocity.y.abs();
            }
        }
    }

    /// Recolors every cell from `colors`.
    pub fn recolor(&mut self, colors: &mut dyn ColorSource) {
        for (index, cell) in self.cells.iter_mut().enumerate() {
            cell.color = colors.next_color(index);
        }
    }

    /// Recolors each cell from `sample`; cells it returns `None` for keep
    /// their color. Returns the number of cells recolored.
    pub fn recolor_with<F>(&mut self, mut sample: F) -> usize
    where
        F: FnMut(&Cell, f32) -> Option<Rgb>,
    {
        let base = self.config.base_size;
        let mut changed = 0;
        for cell in &mut self.cells {
            if let Some(color) = sample(cell, base) {
                cell.color = color;
                changed += 1;
            }
        }
        changed
    }

    /// Number of cells carrying an answer.
    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_answered()).count()
    }

    /// Fraction of cells carrying an answer (0.0 when empty).
    #[must_use]
    pub fn answered_fraction(&self) -> f32 {
        if self.cells.is_empty() {
            0.0
        } else {
            self.answered_count() as f32 / self.cells.len() as f32
        }
    }

    /// Index of the cell with `id`.
    #[must_use]
    pub fn index_of(&self, id: &CellId) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    /// All cells, in z-order.
    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Mutable access to the cells.
    pub fn cells_mut(&mut self) -> &mut [Cell] {
        &mut self.cells
    }

    /// Cell at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Cell> {
        self.cells.get(index)
    }

    /// Mutable cell at `index`.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Cell> {
        self.cells.get_mut(index)
    }

    /// Number of cells generated so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the population has no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Side length of an unscaled cell.
    #[must_use]
    pub fn base_size(&self) -> f32 {
        self.config.base_size
    }

    /// Changes the side length of unscaled cells. Existing cells keep their
    /// positions; call [`CellPopulation::begin_build`] to lay out a new population.
    pub fn set_base_size(&mut self, size: f32) {
        self.config.base_size = size.max(1.0);
    }

    /// Drawable area the population lives in.
    #[must_use]
    pub fn area(&self) -> Vec2 {
        self.area
    }
}

/// Replaces a degenerate drawable size with [`FALLBACK_AREA`].
#[must_use]
pub fn sanitize_area(width: f32, height: f32) -> Vec2 {
    let valid = |v: f32| v.is_finite() && v > 0.0;
    if valid(width) && valid(height) {
        Vec2::new(width, height)
    } else {
        warn!(
            "Degenerate drawable area {}x{}, using {}x{}",
            width, height, FALLBACK_AREA.x, FALLBACK_AREA.y
        );
        FALLBACK_AREA
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn seeded(batch_size: usize) -> CellPopulation {
        CellPopulation::new(PopulationConfig {
            batch_size,
            seed: Some(42),
            ..PopulationConfig::default()
        })
    }

    fn finish(pop: &mut CellPopulation) {
        let mut colors = RandomColors::with_seed(1);
        while pop.is_building() {
            pop.step_build(&mut colors);
        }
    }

    #[test]
    fn test_building_flag_until_final_batch() {
        let mut pop = seeded(30);
        let mut colors = RandomColors::with_seed(1);
        assert!(!pop.is_building_complete());

        pop.begin_build(100, 800.0, 600.0);
        let mut steps = Vec::new();
        loop {
            assert!(pop.is_building());
            let progress = pop.step_build(&mut colors);
            steps.push(progress);
            if matches!(progress, BuildProgress::Complete { .. }) {
                break;
            }
        }

        assert_eq!(
            steps,
            vec![
                BuildProgress::Building { generated: 30, target: 100 },
                BuildProgress::Building { generated: 60, target: 100 },
                BuildProgress::Building { generated: 90, target: 100 },
                BuildProgress::Complete { count: 100 },
            ]
        );
        assert!(!pop.is_building());
        assert!(pop.is_building_complete());
        assert_eq!(pop.step_build(&mut colors), BuildProgress::Idle);
    }

    #[test]
    fn test_new_build_supersedes_old() {
        let mut pop = seeded(10);
        let mut colors = RandomColors::with_seed(1);

        pop.begin_build(100, 800.0, 600.0);
        pop.step_build(&mut colors);
        assert_eq!(pop.len(), 10);
        let first = pop.generation();

        pop.begin_build(15, 800.0, 600.0);
        assert_eq!(pop.len(), 0);
        assert!(pop.generation() > first);

        pop.step_build(&mut colors);
        assert_eq!(pop.step_build(&mut colors), BuildProgress::Complete { count: 15 });
        assert_eq!(pop.len(), 15);
    }

    #[test]
    fn test_empty_build_completes_on_first_step() {
        let mut pop = seeded(10);
        pop.begin_build(0, 800.0, 600.0);
        assert!(pop.is_building());
        assert_eq!(
            pop.step_build(&mut SolidColor(Rgb::RED)),
            BuildProgress::Complete { count: 0 }
        );
    }

    #[test]
    fn test_cells_spawn_inside_area() {
        let mut pop = seeded(1000);
        pop.begin_build(500, 200.0, 100.0);
        finish(&mut pop);
        for cell in pop.cells() {
            assert!(cell.position.x >= 0.0 && cell.position.x <= 190.0);
            assert!(cell.position.y >= 0.0 && cell.position.y <= 90.0);
            assert!(cell.velocity.x.abs() <= 0.15 && cell.velocity.y.abs() <= 0.15);
        }
    }

    #[test]
    fn test_ids_are_indexed() {
        let mut pop = seeded(7);
        pop.begin_build(20, 800.0, 600.0);
        finish(&mut pop);
        assert_eq!(pop.index_of(&CellId::particle(12)), Some(12));
        assert_eq!(pop.get(12).map(|c| c.id.as_str()), Some("particle-13"));
        assert_eq!(pop.index_of(&CellId::new("particle-999")), None);
    }

    #[test]
    fn test_degenerate_area_uses_fallback() {
        assert_eq!(sanitize_area(0.0, 600.0), FALLBACK_AREA);
        assert_eq!(sanitize_area(-5.0, -5.0), FALLBACK_AREA);
        assert_eq!(sanitize_area(f32::NAN, 10.0), FALLBACK_AREA);
        assert_eq!(sanitize_area(320.0, 240.0), Vec2::new(320.0, 240.0));

        let mut pop = seeded(10);
        pop.begin_build(5, 0.0, 0.0);
        assert_eq!(pop.area(), FALLBACK_AREA);
    }

    #[test]
    fn test_bounce_reflects_velocity() {
        let mut pop = seeded(10);
        pop.begin_build(1, 100.0, 100.0);
        finish(&mut pop);

        let cell = &mut pop.cells_mut()[0];
        cell.position = Vec2::new(88.0, 1.0);
        cell.velocity = Vec2::new(5.0, -5.0);

        pop.integrate(REFERENCE_FRAME_MS);
        let cell = &pop.cells()[0];
        assert_eq!(cell.position, Vec2::new(90.0, 0.0));
        assert_eq!(cell.velocity, Vec2::new(-5.0, 5.0));
    }

    #[test]
    fn test_integrate_skipped_while_building() {
        let mut pop = seeded(5);
        let mut colors = RandomColors::with_seed(3);
        pop.begin_build(20, 800.0, 600.0);
        pop.step_build(&mut colors);
        let before: Vec<Vec2> = pop.cells().iter().map(|c| c.position).collect();
        pop.integrate(1000.0);
        let after: Vec<Vec2> = pop.cells().iter().map(|c| c.position).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_recolor_with_keeps_unsampled() {
        let mut pop = seeded(10);
        pop.begin_build(4, 800.0, 600.0);
        let mut solid = SolidColor(Rgb::WHITE);
        while pop.is_building() {
            pop.step_build(&mut solid);
        }

        let changed = pop.recolor_with(|cell, _| (cell.id.as_str() != "particle-2").then_some(Rgb::RED));
        assert_eq!(changed, 3);
        assert_eq!(pop.cells()[1].color, Rgb::WHITE);
        assert_eq!(pop.cells()[0].color, Rgb::RED);
    }

    #[test]
    fn test_answered_stats() {
        let mut pop = seeded(10);
        pop.begin_build(4, 800.0, 600.0);
        finish(&mut pop);
        assert!(pop.answered_fraction().abs() < f32::EPSILON);
        pop.cells_mut()[2].answer = Some("b".into());
        assert_eq!(pop.answered_count(), 1);
        assert!((pop.answered_fraction() - 0.25).abs() < f32::EPSILON);
    }

    proptest! {
        #[test]
        fn cells_never_escape_area(
            seed: u64,
            width in 20.0f32..1000.0,
            height in 20.0f32..1000.0,
            frames in prop::collection::vec(0.0f32..250.0, 1..40),
            scale in 1.0f32..3.0,
        ) {
            let mut pop = CellPopulation::new(PopulationConfig {
                drift: 40.0,
                seed: Some(seed),
                ..PopulationConfig::default()
            });
            pop.begin_build(64, width, height);
            finish(&mut pop);
            for cell in pop.cells_mut() {
                cell.scale = scale;
            }

            for dt in frames {
                pop.integrate(dt);
                for cell in pop.cells() {
                    let size = cell.footprint(pop.base_size());
                    prop_assert!(cell.position.x >= 0.0 && cell.position.y >= 0.0);
                    prop_assert!(cell.position.x + size <= width.max(size) + 1e-3);
                    prop_assert!(cell.position.y + size <= height.max(size) + 1e-3);
                }
            }
        }
    }
}
