use crate::error::{Result, SieveError};

/// Default axis size (positions 1..=N)
pub const DEFAULT_N: u32 = 512;

/// Default spawn stagger between consecutive primes, in simulation seconds
pub const DEFAULT_STEP: f64 = 0.75;

/// Default cap on simultaneous wavefronts
pub const DEFAULT_PRIME_CAP: u32 = 64;

/// Default propagation speed in positions per simulation second
pub const DEFAULT_SPEED: f64 = 48.0;

/// Hard upper bound on the prime cap
pub const MAX_PRIME_CAP: u32 = 128;

/// Largest sieve that fits in a single texture row (wgpu `max_texture_dimension_1d`)
pub const MAX_POSITIONS: u32 = 8192;

// ============================================
// Crossing detection
// ============================================

/// Half-width, in positions, of a wavefront's crossing band.
///
/// A multiple `m` of prime `p` is marked crossed when `|m - front| <= CROSSING_TOLERANCE`
/// for some front position the wave occupied since the previous check. Raising it
/// marks composites a frame earlier; lowering it to 0 requires the front to land on
/// the multiple exactly (the sweep between frames still catches it).
pub const CROSSING_TOLERANCE: u32 = 1;

// ============================================
// Render field
// ============================================

/// Gaussian falloff of a wavefront pulse: exp(-decay * distance²)
pub const PULSE_DECAY: f32 = 0.015;

/// Tolerance for `n mod p` to count as a multiple in the highlight pass
pub const HIGHLIGHT_EPSILON: f32 = 0.5;

/// How strongly the summed wave height brightens the base ramp
pub const HEIGHT_GAIN: f32 = 0.6;

/// Base color ramp endpoints (left edge of the axis, right edge)
pub const RAMP_LOW: [f32; 3] = [0.06, 0.09, 0.22];
pub const RAMP_HIGH: [f32; 3] = [0.10, 0.32, 0.45];

/// Color of persisted crossings and its blend weight
pub const CROSSED_COLOR: [f32; 3] = [0.85, 0.22, 0.18];
pub const CROSSED_ALPHA: f32 = 0.75;

/// Transient near-multiple highlight color and its blend weight
pub const HIGHLIGHT_COLOR: [f32; 3] = [1.0, 0.92, 0.55];
pub const HIGHLIGHT_ALPHA: f32 = 0.8;

// ============================================
// Playback
// ============================================

pub const DEFAULT_PLAYBACK_RATE: f64 = 1.0;
pub const MIN_PLAYBACK_RATE: f64 = 0.125;
pub const MAX_PLAYBACK_RATE: f64 = 16.0;

/// Normalized scrub increment for keyboard seeking
pub const SCRUB_STEP: f64 = 0.05;

/// Engine configuration. Changing any field requires a fresh `setup`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SieveConfig {
    /// Axis size N
    pub n: u32,
    /// Spawn stagger STEP, seconds
    pub step: f64,
    /// Maximum number of wavefronts
    pub prime_cap: u32,
    /// Propagation speed, positions per second
    pub speed: f64,
}

impl Default for SieveConfig {
    fn default() -> Self {
        Self {
            n: DEFAULT_N,
            step: DEFAULT_STEP,
            prime_cap: DEFAULT_PRIME_CAP,
            speed: DEFAULT_SPEED,
        }
    }
}

impl SieveConfig {
    pub fn new(n: u32, step: f64, prime_cap: u32, speed: f64) -> Self {
        Self {
            n,
            step,
            prime_cap,
            speed,
        }
    }

    /// Check every field, failing fast on the first violation
    pub fn validate(&self) -> Result<()> {
        if self.n < 2 {
            return Err(SieveError::invalid(format!("N must be at least 2, got {}", self.n)));
        }
        if self.n > MAX_POSITIONS {
            return Err(SieveError::invalid(format!(
                "N must fit a single texture row ({MAX_POSITIONS}), got {}",
                self.n
            )));
        }
        if self.prime_cap < 1 || self.prime_cap > MAX_PRIME_CAP {
            return Err(SieveError::invalid(format!(
                "primeCap must be in 1..={MAX_PRIME_CAP}, got {}",
                self.prime_cap
            )));
        }
        if !(self.step.is_finite() && self.step > 0.0) {
            return Err(SieveError::invalid(format!(
                "STEP must be positive and finite, got {}",
                self.step
            )));
        }
        if !(self.speed.is_finite() && self.speed > 0.0) {
            return Err(SieveError::invalid(format!(
                "speed must be positive and finite, got {}",
                self.speed
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(SieveConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_each_bad_field() {
        let bad = [
            SieveConfig::new(1, 1.0, 3, 6.0),
            SieveConfig::new(0, 1.0, 3, 6.0),
            SieveConfig::new(MAX_POSITIONS + 1, 1.0, 3, 6.0),
            SieveConfig::new(30, 1.0, 0, 6.0),
            SieveConfig::new(30, 1.0, MAX_PRIME_CAP + 1, 6.0),
            SieveConfig::new(30, 0.0, 3, 6.0),
            SieveConfig::new(30, -1.0, 3, 6.0),
            SieveConfig::new(30, f64::NAN, 3, 6.0),
            SieveConfig::new(30, 1.0, 3, 0.0),
            SieveConfig::new(30, 1.0, 3, f64::INFINITY),
        ];
        for config in bad {
            assert!(
                matches!(config.validate(), Err(SieveError::InvalidConfiguration { .. })),
                "expected rejection for {config:?}"
            );
        }
    }

    #[test]
    fn test_boundaries_accepted() {
        assert!(SieveConfig::new(2, 0.001, 1, 0.001).validate().is_ok());
        assert!(SieveConfig::new(MAX_POSITIONS, 1.0, MAX_PRIME_CAP, 1.0).validate().is_ok());
    }
}
