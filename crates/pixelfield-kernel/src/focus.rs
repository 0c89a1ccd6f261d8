//! Focus transition state.
//!
//! At most one cell is focused per grid. The state machine runs
//! `Idle -> Focusing -> Focused -> Idle`: `Focused` is a resting state that
//! persists until the focus is cancelled or moved to another cell.

use tracing::debug;

/// Default focus transition duration in milliseconds.
pub const DEFAULT_FOCUS_DURATION_MS: f64 = 800.0;

/// Easing curve applied to focus progress.
///
/// Every curve maps 0 to 0 and 1 to 1 and is monotonic, so the transition
/// keeps its duration whichever curve is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FocusEasing {
    /// Linear interpolation.
    #[default]
    Linear,
    /// Ease in (slow start).
    EaseIn,
    /// Ease out (slow end).
    EaseOut,
    /// Ease in and out (slow start and end).
    EaseInOut,
    /// Smooth step (Hermite interpolation).
    SmoothStep,
}

impl FocusEasing {
    /// Applies the easing function to a normalized time value.
    #[must_use]
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::EaseIn => t * t,
            Self::EaseOut => 1.0 - (1.0 - t) * (1.0 - t),
            Self::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            },
            Self::SmoothStep => t * t * (3.0 - 2.0 * t),
        }
    }

    /// Parses a config name (`linear`, `ease_in`, `ease_out`, `ease_in_out`, `smooth_step`).
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "linear" => Some(Self::Linear),
            "ease_in" => Some(Self::EaseIn),
            "ease_out" => Some(Self::EaseOut),
            "ease_in_out" => Some(Self::EaseInOut),
            "smooth_step" => Some(Self::SmoothStep),
            _ => None,
        }
    }
}

/// Phase of the focus transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FocusPhase {
    /// No cell focused.
    #[default]
    Idle,
    /// The focused cell is moving to the center.
    Focusing,
    /// The transition finished; the focused cell rests enlarged at the center.
    Focused,
}

impl FocusPhase {
    /// Whether a cell is focused or being focused.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Idle)
    }
}

/// Which cell is focused and how far its transition has run.
#[derive(Debug, Clone)]
pub struct FocusState {
    index: Option<usize>,
    phase: FocusPhase,
    started_ms: f64,
    duration_ms: f64,
    easing: FocusEasing,
}

impl Default for FocusState {
    fn default() -> Self {
        Self::new(DEFAULT_FOCUS_DURATION_MS, FocusEasing::Linear)
    }
}

impl FocusState {
    /// Creates an idle focus state.
    #[must_use]
    pub fn new(duration_ms: f64, easing: FocusEasing) -> Self {
        Self {
            index: None,
            phase: FocusPhase::Idle,
            started_ms: 0.0,
            duration_ms: duration_ms.max(1.0),
            easing,
        }
    }

    /// Starts focusing the cell at `index`.
    pub fn begin(&mut self, index: usize, now_ms: f64) {
        debug!("Focus on cell #{} started", index);
        self.index = Some(index);
        self.phase = FocusPhase::Focusing;
        self.started_ms = now_ms;
    }

    /// Returns to idle.
    pub fn cancel(&mut self) {
        if let Some(index) = self.index.take() {
            debug!("Focus on cell #{} cancelled", index);
        }
        self.phase = FocusPhase::Idle;
    }

    /// Updates the phase for `now_ms`.
    ///
    /// Returns true exactly once, on the update that completes the transition.
    pub fn advance(&mut self, now_ms: f64) -> bool {
        if self.phase == FocusPhase::Focusing && self.raw_progress(now_ms) >= 1.0 {
            self.phase = FocusPhase::Focused;
            debug!("Focus on cell #{:?} settled", self.index);
            return true;
        }
        false
    }

    /// Linear progress (0.0-1.0). Idle states report 0.
    #[must_use]
    pub fn raw_progress(&self, now_ms: f64) -> f32 {
        match self.phase {
            FocusPhase::Idle => 0.0,
            FocusPhase::Focused => 1.0,
            FocusPhase::Focusing => {
                ((now_ms - self.started_ms) / self.duration_ms).clamp(0.0, 1.0) as f32
            },
        }
    }

    /// Progress with the easing curve applied.
    #[must_use]
    pub fn eased_progress(&self, now_ms: f64) -> f32 {
        self.easing.apply(self.raw_progress(now_ms))
    }

    /// Index of the focused cell.
    #[must_use]
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> FocusPhase {
        self.phase
    }

    /// Whether `index` is the focused cell of an active transition.
    #[must_use]
    pub fn is_focused(&self, index: usize) -> bool {
        self.phase.is_active() && self.index == Some(index)
    }
}
