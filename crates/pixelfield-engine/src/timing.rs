//! Frame timing and performance tracking.
//!
//! Supplies the millisecond timestamps the grid is driven with. In realtime
//! mode timestamps follow the wall clock and frames are paced to the target
//! rate; in simulated mode every frame advances by exactly one frame budget,
//! so headless runs are fast and reproducible.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// How frame timestamps are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockMode {
    /// Wall-clock deltas, paced to the target rate.
    Realtime,
    /// Fixed deltas of one frame budget.
    Simulated,
}

/// Frame timing manager.
#[derive(Debug)]
pub struct FrameTiming {
    /// Target frames per second
    target_fps: u32,
    /// Time budget per frame
    frame_budget: Duration,
    /// Time of last frame start
    last_frame: Instant,
    /// Maximum delta in seconds, so a stall does not fast-forward effects
    max_dt: f32,
    /// Clock mode
    mode: ClockMode,
    /// Timestamp of the current frame in milliseconds
    now_ms: f64,
    /// Recent frame times for averaging
    frame_times: VecDeque<f32>,
    /// Maximum samples for averaging
    max_samples: usize,
}

impl Default for FrameTiming {
    fn default() -> Self {
        Self::new(60)
    }
}

impl FrameTiming {
    /// Create a simulated frame timing manager.
    ///
    /// # Arguments
    /// * `target_fps` - Target frames per second
    #[must_use]
    pub fn new(target_fps: u32) -> Self {
        let target_fps = target_fps.max(1);
        Self {
            target_fps,
            frame_budget: Duration::from_secs_f64(1.0 / f64::from(target_fps)),
            last_frame: Instant::now(),
            max_dt: 0.25, // Max 250ms delta
            mode: ClockMode::Simulated,
            now_ms: 0.0,
            frame_times: VecDeque::with_capacity(120),
            max_samples: 120,
        }
    }

    /// Create with a clock mode.
    #[must_use]
    pub fn with_mode(mut self, mode: ClockMode) -> Self {
        self.mode = mode;
        self
    }

    /// Clock mode in use.
    #[must_use]
    pub fn mode(&self) -> ClockMode {
        self.mode
    }

    /// Advance to the next frame and return its timestamp in milliseconds.
    /// Also stores the frame time for FPS calculation.
    pub fn advance(&mut self) -> f64 {
        let dt = match self.mode {
            ClockMode::Simulated => self.frame_budget.as_secs_f32(),
            ClockMode::Realtime => {
                let now = Instant::now();
                let dt = (now - self.last_frame).as_secs_f32();
                self.last_frame = now;
                dt.min(self.max_dt)
            },
        };

        self.frame_times.push_back(dt);
        if self.frame_times.len() > self.max_samples {
            self.frame_times.pop_front();
        }

        self.now_ms += f64::from(dt) * 1000.0;
        self.now_ms
    }

    /// Timestamp of the current frame in milliseconds.
    #[must_use]
    pub fn now_ms(&self) -> f64 {
        self.now_ms
    }

    /// Sleep for the remainder of the frame budget (realtime mode only).
    pub fn sleep_remainder(&self) {
        if self.mode == ClockMode::Simulated {
            return;
        }

        let elapsed = self.last_frame.elapsed();
        if elapsed < self.frame_budget {
            std::thread::sleep(self.frame_budget - elapsed);
        }
    }

    /// Get the current FPS (averaged over recent frames).
    #[must_use]
    pub fn current_fps(&self) -> f32 {
        let avg = self.average_frame_time_ms();
        if avg > 0.0 {
            1000.0 / avg
        } else {
            0.0
        }
    }

    /// Get the average frame time in milliseconds.
    #[must_use]
    pub fn average_frame_time_ms(&self) -> f32 {
        if self.frame_times.is_empty() {
            return 0.0;
        }

        (self.frame_times.iter().sum::<f32>() / self.frame_times.len() as f32) * 1000.0
    }

    /// Get the target FPS.
    #[must_use]
    pub fn target_fps(&self) -> u32 {
        self.target_fps
    }

    /// Number of frames needed to cover `ms` milliseconds.
    #[must_use]
    pub fn frames_for(&self, ms: f64) -> u32 {
        let budget_ms = self.frame_budget.as_nanos() as f64 / 1_000_000.0;
        (ms / budget_ms).ceil().max(0.0) as u32
    }

    /// Reset timing (call after a pause or a rebuild).
    pub fn reset(&mut self) {
        self.last_frame = Instant::now();
        self.frame_times.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_timing_creation() {
        let timing = FrameTiming::new(60);
        assert_eq!(timing.target_fps(), 60);
        assert_eq!(timing.mode(), ClockMode::Simulated);
        assert!(timing.now_ms().abs() < f64::EPSILON);
    }

    #[test]
    fn test_simulated_advance() {
        let mut timing = FrameTiming::new(50);
        assert!((timing.advance() - 20.0).abs() < 1e-3);
        assert!((timing.advance() - 40.0).abs() < 1e-3);
        assert!((timing.current_fps() - 50.0).abs() < 0.1);
    }

    #[test]
    fn test_realtime_delta_clamped() {
        let mut timing = FrameTiming::new(60).with_mode(ClockMode::Realtime);

        std::thread::sleep(Duration::from_millis(300));
        let now = timing.advance();

        assert!(now <= 250.0 + 1e-3);
        assert!(now >= 200.0);
    }

    #[test]
    fn test_frames_for() {
        let timing = FrameTiming::new(50);
        assert_eq!(timing.frames_for(800.0), 40);
        assert_eq!(timing.frames_for(810.0), 41);
        assert_eq!(timing.frames_for(0.0), 0);
    }

    #[test]
    fn test_reset_timing() {
        let mut timing = FrameTiming::new(60);
        timing.advance();

        timing.reset();

        assert!(timing.frame_times.is_empty());
        assert!(timing.current_fps().abs() < f32::EPSILON);
    }
}
