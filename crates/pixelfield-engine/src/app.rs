//! Application lifecycle management.
//!
//! Headless host loop: builds a grid, drives it with a scripted pointer
//! session and reacts to the grid's events the way an interactive host
//! would (a committed focus becomes a submitted answer).

use anyhow::{Context, Result};
use glam::Vec2;
use pixelfield_common::{CellId, Rgb};
use pixelfield_kernel::{ClickOutcome, FrameStats, GridEvent, ImageTheme, PixelGrid};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::renderer::Framebuffer;
use crate::timing::{ClockMode, FrameTiming};

/// Answer label given to committed cells.
const SESSION_ANSWER: &str = "claimed";

/// Frames to idle once the script has run, so effects play out.
const COOLDOWN_FRAMES: u32 = 30;

/// One action of a scripted pointer session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionStep {
    /// Pointer moves to a point.
    Move(Vec2),
    /// Pointer leaves the canvas.
    Leave,
    /// Pointer clicks a point.
    Click(Vec2),
    /// Run this many frames without input.
    Wait(u32),
    /// Toggle the answered-only filter.
    AnsweredOnly(bool),
    /// Rebuild the grid at a new cell size and wait for the build.
    Zoom(f32),
}

/// What happened during a session.
#[derive(Debug, Clone, Default)]
pub struct SessionReport {
    /// Frames run, build included.
    pub frames: u64,
    /// Frames spent building.
    pub build_frames: u64,
    /// Cells in the grid.
    pub cells: usize,
    /// Every grid event, in order.
    pub events: Vec<GridEvent>,
    /// Outcome of every scripted click.
    pub clicks: Vec<ClickOutcome>,
    /// Answered cells at the end.
    pub answered: usize,
    /// Cells recolored by the theme image.
    pub themed: usize,
    /// Average frames per second.
    pub fps: f32,
}

impl SessionReport {
    /// Number of recorded events matching `pred`.
    pub fn count_events(&self, pred: impl Fn(&GridEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(*e)).count()
    }
}

/// The headless host.
pub struct App {
    config: EngineConfig,
    grid: PixelGrid,
    timing: FrameTiming,
    framebuffer: Framebuffer,
    answer_color: Rgb,
    report: SessionReport,
    last_stats: FrameStats,
}

impl App {
    /// Creates a host for a validated config.
    pub fn new(config: EngineConfig) -> Result<Self> {
        let answer_color = config.answer_color().context("invalid answer_color")?;
        let (width, height) = (config.canvas_width, config.canvas_height);

        let grid = PixelGrid::new(config.to_grid_config(), width as f32, height as f32);
        let mode = if config.realtime {
            ClockMode::Realtime
        } else {
            ClockMode::Simulated
        };

        Ok(Self {
            timing: FrameTiming::new(config.target_fps).with_mode(mode),
            framebuffer: Framebuffer::new(width, height, Rgb::BLACK),
            grid,
            answer_color,
            report: SessionReport::default(),
            last_stats: FrameStats::default(),
            config,
        })
    }

    /// The grid being driven.
    #[must_use]
    pub fn grid(&self) -> &PixelGrid {
        &self.grid
    }

    /// The last rendered frame.
    #[must_use]
    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }

    /// Builds the grid, runs the session script and returns the report.
    pub fn run(&mut self) -> Result<SessionReport> {
        self.build()?;

        let script = self.session_script();
        debug!("Session script: {} steps", script.len());
        for step in script {
            self.apply(step);
        }
        self.run_frames(COOLDOWN_FRAMES);

        if let Some(path) = self.config.snapshot_path.clone() {
            debug!(
                "Writing {}x{} snapshot",
                self.framebuffer.width(),
                self.framebuffer.height()
            );
            self.framebuffer.save_png(path)?;
        }

        self.report.cells = self.grid.cells().len();
        self.report.answered = self.grid.population().answered_count();
        self.report.fps = self.timing.current_fps();
        debug!("Last frame: {:?}", self.last_stats);

        info!(
            "Session finished: {} frames, {} events, {}/{} cells answered ({:.1}%)",
            self.report.frames,
            self.report.events.len(),
            self.report.answered,
            self.report.cells,
            self.grid.population().answered_fraction() * 100.0
        );
        Ok(self.report.clone())
    }

    /// Builds the population, one batch per frame.
    fn build(&mut self) -> Result<()> {
        info!(
            "Building {} cells on a {}x{} canvas",
            self.config.cell_count, self.config.canvas_width, self.config.canvas_height
        );
        self.grid.build(self.config.cell_count);
        self.finish_build();

        if let Some(path) = self.config.theme_image.clone() {
            match load_theme(&path) {
                Ok(theme) => {
                    self.report.themed = self.grid.apply_theme(&theme);
                    info!("Theme applied to {} cells", self.report.themed);
                },
                Err(e) => warn!("Skipping theme: {e:#}"),
            }
        }
        Ok(())
    }

    /// Runs frames until the build in flight completes.
    fn finish_build(&mut self) {
        while !self.grid.is_building_complete() {
            self.frame();
            self.report.build_frames += 1;
        }
        self.timing.reset();
    }

    /// Pointer session exercising hover, focus, commit, cancel, the filter
    /// and, when configured, a zoom to another cell size.
    fn session_script(&self) -> Vec<SessionStep> {
        let cells = self.grid.cells();
        if cells.is_empty() {
            warn!("No cells to interact with");
            return Vec::new();
        }

        let base = self.grid.population().base_size();
        let area = self.grid.area();
        let first = cells[0].center(base);
        let second = cells[cells.len() / 2].center(base);
        let middle = area / 2.0;
        let empty = Vec2::new(area.x / 4.0, area.y / 4.0);
        // Where the focused cell rests once the focus is cancelled.
        let focused_size = base * self.config.focus_scale.max(1.0);
        let claimed = middle - Vec2::splat(focused_size / 2.0) + Vec2::splat(base / 2.0);
        let focus_frames = self.timing.frames_for(self.config.focus_duration_ms) + 2;

        let mut script = vec![
            SessionStep::Move(first),
            SessionStep::Wait(5),
            SessionStep::Move(second),
            SessionStep::Wait(5),
            SessionStep::Click(first),
            SessionStep::Wait(focus_frames),
            SessionStep::Click(middle),
            SessionStep::Wait(1),
            SessionStep::Click(empty),
            SessionStep::Wait(1),
            SessionStep::Click(claimed),
            SessionStep::AnsweredOnly(true),
            SessionStep::Move(claimed),
            SessionStep::Wait(10),
            SessionStep::AnsweredOnly(false),
            SessionStep::Leave,
        ];
        if let Some(size) = self.config.zoom_cell_size {
            script.push(SessionStep::Zoom(size));
        }
        script
    }

    fn apply(&mut self, step: SessionStep) {
        match step {
            SessionStep::Move(at) => {
                self.grid.on_pointer_move(at.x, at.y);
                self.frame();
            },
            SessionStep::Leave => {
                self.grid.on_pointer_leave();
                self.frame();
            },
            SessionStep::Click(at) => {
                let outcome = self.grid.on_pointer_down(at.x, at.y);
                debug!("Click at ({}, {}): {:?}", at.x, at.y, outcome);
                self.report.clicks.push(outcome);
                self.frame();
            },
            SessionStep::Wait(frames) => self.run_frames(frames),
            SessionStep::AnsweredOnly(on) => {
                self.grid.set_answered_only(on);
                debug!("Answered-only filter {}", if on { "on" } else { "off" });
            },
            SessionStep::Zoom(size) => {
                info!("Zooming to cell size {}", size);
                self.grid.set_cell_size(size);
                self.finish_build();
            },
        }
    }

    fn run_frames(&mut self, frames: u32) {
        for _ in 0..frames {
            self.frame();
        }
    }

    /// Runs and renders one frame, then handles what it published.
    fn frame(&mut self) {
        let now = self.timing.advance();
        self.framebuffer.clear();
        self.last_stats = self.grid.frame(now, &mut self.framebuffer);
        self.report.frames += 1;
        self.handle_events();
        self.timing.sleep_remainder();
    }

    fn handle_events(&mut self) {
        for event in self.grid.drain_events() {
            match &event {
                GridEvent::BuildProgress { percent } => debug!("Build {}%", percent),
                GridEvent::BuildComplete { count } => {
                    info!("Build complete: {} cells", count);
                    let stats = self.grid.index_stats();
                    debug!(
                        "Index: {} nodes, {} leaves, depth {}",
                        stats.node_count, stats.leaf_count, stats.max_depth
                    );
                },
                GridEvent::FocusStarted { id } => debug!("Focusing {}", id),
                GridEvent::FocusSettled { id } => debug!("Focused {}", id),
                GridEvent::FocusCommitted { id, color } => {
                    info!("Committed {} ({})", id, color.to_css_rgb());
                    self.claim(id);
                },
                GridEvent::FocusCancelled => debug!("Focus cancelled"),
                GridEvent::OwnedCellClicked { id, answer } => {
                    info!("{} already answered: {}", id, answer);
                },
            }
            self.report.events.push(event);
        }
    }

    fn claim(&mut self, id: &CellId) {
        if let Err(e) = self
            .grid
            .submit_answer(id, SESSION_ANSWER, self.answer_color)
        {
            warn!("Could not record answer for {}: {}", id, e);
        }
    }
}

/// Loads an image file as a theme.
fn load_theme(path: &Path) -> Result<ImageTheme> {
    let image = image::open(path)
        .with_context(|| format!("failed to open theme {}", path.display()))?
        .to_rgba8();
    let (width, height) = image.dimensions();
    Ok(ImageTheme::from_rgba(
        width as usize,
        height as usize,
        image.into_raw(),
    ))
}

/// Runs a headless session with the given config.
pub fn run(mut config: EngineConfig) -> Result<SessionReport> {
    config.validate();

    info!("Configuration loaded:");
    info!("  Canvas: {}x{}", config.canvas_width, config.canvas_height);
    info!("  Cells: {} (size {})", config.cell_count, config.cell_size);
    info!(
        "  Clock: {} at {} fps",
        if config.realtime { "realtime" } else { "simulated" },
        config.target_fps
    );

    let mut app = App::new(config)?;
    app.run()
}
