//! Transient hover waves and click explosions.
//!
//! Effects are timestamped with the frame clock (milliseconds) and expire
//! once their elapsed fraction reaches 1. Expired effects are pruned every
//! frame, so a burst of clicks never accumulates unbounded state.

use glam::Vec2;
use tracing::trace;

/// Start time and duration of a transient effect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectClock {
    /// Frame time the effect started at, in milliseconds.
    pub started_ms: f64,
    /// Lifetime in milliseconds.
    pub duration_ms: f64,
}

impl EffectClock {
    /// Creates a clock starting at `now_ms`.
    #[must_use]
    pub fn new(now_ms: f64, duration_ms: f64) -> Self {
        Self {
            started_ms: now_ms,
            duration_ms: duration_ms.max(1.0),
        }
    }

    /// Elapsed fraction of the lifetime, clamped to 0.0-1.0.
    #[must_use]
    pub fn fraction(&self, now_ms: f64) -> f32 {
        ((now_ms - self.started_ms) / self.duration_ms).clamp(0.0, 1.0) as f32
    }

    /// Whether the lifetime has fully elapsed.
    #[must_use]
    pub fn is_expired(&self, now_ms: f64) -> bool {
        now_ms - self.started_ms >= self.duration_ms
    }
}

/// Radial push spreading out from a hovered cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveEffect {
    /// Origin of the wave.
    pub center: Vec2,
    /// Lifetime.
    pub clock: EffectClock,
    /// Final radius; also the distance at which the push fades to zero.
    pub max_offset: f32,
}

impl WaveEffect {
    /// Current radius of the wave front.
    #[must_use]
    pub fn radius(&self, now_ms: f64) -> f32 {
        self.clock.fraction(now_ms) * self.max_offset
    }
}

/// Expanding ring drawn at a click point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExplosionEffect {
    /// Ring center.
    pub center: Vec2,
    /// Lifetime.
    pub clock: EffectClock,
    /// Radius reached at the end of the lifetime.
    pub max_radius: f32,
}

impl ExplosionEffect {
    /// Current ring radius.
    #[must_use]
    pub fn radius(&self, now_ms: f64) -> f32 {
        self.clock.fraction(now_ms) * self.max_radius
    }
}

/// Live waves and explosions.
#[derive(Debug, Default)]
pub struct EffectSet {
    waves: Vec<WaveEffect>,
    explosions: Vec<ExplosionEffect>,
}

impl EffectSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a wave.
    pub fn push_wave(&mut self, wave: WaveEffect) {
        trace!("Wave at ({}, {})", wave.center.x, wave.center.y);
        self.waves.push(wave);
    }

    /// Adds an explosion.
    pub fn push_explosion(&mut self, explosion: ExplosionEffect) {
        trace!("Explosion at ({}, {})", explosion.center.x, explosion.center.y);
        self.explosions.push(explosion);
    }

    /// Drops every expired effect and returns how many were removed.
    pub fn prune(&mut self, now_ms: f64) -> usize {
        let before = self.waves.len() + self.explosions.len();
        self.waves.retain(|w| !w.clock.is_expired(now_ms));
        self.explosions.retain(|e| !e.clock.is_expired(now_ms));
        before - self.waves.len() - self.explosions.len()
    }

    /// Live waves.
    #[must_use]
    pub fn waves(&self) -> &[WaveEffect] {
        &self.waves
    }

    /// Live explosions.
    #[must_use]
    pub fn explosions(&self) -> &[ExplosionEffect] {
        &self.explosions
    }

    /// Removes every effect.
    pub fn clear(&mut self) {
        self.waves.clear();
        self.explosions.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_fraction() {
        let clock = EffectClock::new(1000.0, 500.0);
        assert!(clock.fraction(900.0).abs() < f32::EPSILON);
        assert!((clock.fraction(1250.0) - 0.5).abs() < 1e-6);
        assert!((clock.fraction(2000.0) - 1.0).abs() < f32::EPSILON);
        assert!(!clock.is_expired(1499.0));
        assert!(clock.is_expired(1500.0));
    }

    #[test]
    fn test_radius_grows_linearly() {
        let explosion = ExplosionEffect {
            center: Vec2::ZERO,
            clock: EffectClock::new(0.0, 400.0),
            max_radius: 80.0,
        };
        assert!((explosion.radius(100.0) - 20.0).abs() < 1e-4);
        assert!((explosion.radius(400.0) - 80.0).abs() < 1e-4);
    }

    #[test]
    fn test_prune_removes_only_expired() {
        let mut set = EffectSet::new();
        set.push_wave(WaveEffect {
            center: Vec2::ZERO,
            clock: EffectClock::new(0.0, 100.0),
            max_offset: 10.0,
        });
        set.push_explosion(ExplosionEffect {
            center: Vec2::ONE,
            clock: EffectClock::new(0.0, 300.0),
            max_radius: 10.0,
        });

        assert_eq!(set.prune(50.0), 0);
        assert_eq!(set.prune(150.0), 1);
        assert!(set.waves().is_empty());
        assert_eq!(set.explosions().len(), 1);
        assert_eq!(set.prune(300.0), 1);
        assert!(set.explosions().is_empty());
    }
}
