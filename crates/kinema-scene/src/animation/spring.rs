//! Spring-driven progress.
//!
//! A spring run animates a normalized displacement from 0 to 1 using the
//! damped harmonic oscillator
//!
//! ```text
//! m·x'' + c·x' + k·(x - 1) = 0,  x(0) = 0, x'(0) = 0
//! ```
//!
//! solved analytically:
//! - ζ (zeta) = c / (2·√(k·m)) is the damping ratio
//! - ω₀ = √(k/m) is the natural frequency
//!
//! Underdamped springs overshoot 1 before settling. The run ends once both
//! the displacement from 1 and the speed fall below the rest thresholds, and
//! the final sample is exactly 1.

use crate::error::{MotionError, Result};

/// Sampling step used to find the settle time.
const SETTLE_STEP: f64 = 1.0 / 240.0;

/// A spring that has not come to rest by this time is snapped to its target.
const MAX_SETTLE_TIME: f64 = 10.0;

/// Physical spring parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpringParams {
    /// Stiffness (k).
    pub stiffness: f64,
    /// Damping coefficient (c).
    pub damping: f64,
    /// Mass (m).
    pub mass: f64,
    /// Displacement from the target below which the spring may rest.
    pub rest_delta: f64,
    /// Speed below which the spring may rest.
    pub rest_speed: f64,
}

impl Default for SpringParams {
    fn default() -> Self {
        Self {
            stiffness: 100.0,
            damping: 10.0,
            mass: 1.0,
            rest_delta: 0.001,
            rest_speed: 0.01,
        }
    }
}

impl SpringParams {
    /// Fail with [`MotionError::InvalidTransition`] unless every parameter is
    /// finite and positive.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("stiffness", self.stiffness),
            ("damping", self.damping),
            ("mass", self.mass),
            ("restDelta", self.rest_delta),
            ("restSpeed", self.rest_speed),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value <= 0.0 {
                return Err(MotionError::InvalidTransition(format!(
                    "spring {name} must be positive, got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Damping ratio ζ.
    pub fn damping_ratio(&self) -> f64 {
        self.damping / (2.0 * (self.stiffness * self.mass).sqrt())
    }

    /// Natural frequency ω₀.
    pub fn natural_frequency(&self) -> f64 {
        (self.stiffness / self.mass).sqrt()
    }
}

/// A validated spring with its precomputed settle time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spring {
    params: SpringParams,
    omega_0: f64,
    zeta: f64,
    settle_time: f64,
}

impl Spring {
    pub fn new(params: SpringParams) -> Result<Self> {
        params.validate()?;
        let mut spring = Self {
            params,
            omega_0: params.natural_frequency(),
            zeta: params.damping_ratio(),
            settle_time: MAX_SETTLE_TIME,
        };
        spring.settle_time = spring.find_settle_time();
        Ok(spring)
    }

    /// Seconds until the spring comes to rest.
    pub fn settle_time(&self) -> f64 {
        self.settle_time
    }

    /// Normalized displacement at `t` seconds. Exactly 1 from the settle
    /// time on.
    pub fn position(&self, t: f64) -> f64 {
        if t <= 0.0 {
            return 0.0;
        }
        if t >= self.settle_time {
            return 1.0;
        }
        self.raw_position(t)
    }

    /// Speed at `t` seconds, by central difference.
    pub fn velocity(&self, t: f64) -> f64 {
        let h = 1e-4;
        let lo = (t - h).max(0.0);
        let hi = t + h;
        (self.raw_position(hi) - self.raw_position(lo)) / (hi - lo)
    }

    fn raw_position(&self, t: f64) -> f64 {
        let omega_0 = self.omega_0;
        let zeta = self.zeta;

        if (zeta - 1.0).abs() < 0.001 {
            Self::critically_damped_position(t, omega_0)
        } else if zeta < 1.0 {
            Self::underdamped_position(t, omega_0, zeta)
        } else {
            Self::overdamped_position(t, omega_0, zeta)
        }
    }

    fn find_settle_time(&self) -> f64 {
        let mut t = SETTLE_STEP;
        while t < MAX_SETTLE_TIME {
            let displacement = (1.0 - self.raw_position(t)).abs();
            if displacement <= self.params.rest_delta
                && self.velocity(t).abs() <= self.params.rest_speed
            {
                return t;
            }
            t += SETTLE_STEP;
        }
        MAX_SETTLE_TIME
    }

    /// x(t) = 1 - e^(-ζω₀t) * [cos(ωd*t) + (ζ/√(1-ζ²)) * sin(ωd*t)]
    ///
    /// Where ωd = ω₀ * √(1-ζ²) is the damped frequency.
    #[inline]
    fn underdamped_position(t: f64, omega_0: f64, zeta: f64) -> f64 {
        let zeta_sq_complement = zeta.mul_add(-zeta, 1.0);
        let omega_d = omega_0 * zeta_sq_complement.sqrt();
        let decay = (-zeta * omega_0 * t).exp();
        let cos_term = (omega_d * t).cos();
        let sin_term = (zeta / zeta_sq_complement.sqrt()) * (omega_d * t).sin();

        decay.mul_add(-(cos_term + sin_term), 1.0)
    }

    /// x(t) = 1 - e^(-ω₀t) * (1 + ω₀*t)
    #[inline]
    fn critically_damped_position(t: f64, omega_0: f64) -> f64 {
        let decay = (-omega_0 * t).exp();
        decay.mul_add(-omega_0.mul_add(t, 1.0), 1.0)
    }

    /// x(t) = 1 - (r₂·e^(r₁t) - r₁·e^(r₂t)) / (r₂ - r₁)
    ///
    /// Where r₁,₂ = -ω₀(ζ ∓ √(ζ²-1)) are the two real roots. Written with
    /// exponentials of negative roots so stiff, heavily damped springs do not
    /// overflow.
    #[inline]
    fn overdamped_position(t: f64, omega_0: f64, zeta: f64) -> f64 {
        let root = zeta.mul_add(zeta, -1.0).sqrt();
        let r1 = -omega_0 * (zeta - root);
        let r2 = -omega_0 * (zeta + root);

        1.0 - (r2 * (r1 * t).exp() - r1 * (r2 * t).exp()) / (r2 - r1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spring(stiffness: f64, damping: f64, mass: f64) -> Spring {
        Spring::new(SpringParams {
            stiffness,
            damping,
            mass,
            ..SpringParams::default()
        })
        .unwrap()
    }

    #[test]
    fn test_starts_at_rest() {
        let s = Spring::new(SpringParams::default()).unwrap();
        assert_eq!(s.position(0.0), 0.0);
        assert!(s.velocity(0.0).abs() < 0.05);
    }

    #[test]
    fn test_underdamped_overshoots_then_settles() {
        let s = spring(100.0, 10.0, 1.0);
        assert!(s.zeta < 1.0);

        let peak = (1..200)
            .map(|i| s.position(i as f64 / 100.0))
            .fold(f64::MIN, f64::max);
        assert!(peak > 1.0, "expected overshoot, peak {peak}");

        let settle = s.settle_time();
        assert!(settle > 0.5 && settle < MAX_SETTLE_TIME, "settle {settle}");
        assert_eq!(s.position(settle), 1.0);
        assert_eq!(s.position(settle + 5.0), 1.0);
    }

    #[test]
    fn test_critically_damped_never_overshoots() {
        // ζ = 20 / (2·√100) = 1
        let s = spring(100.0, 20.0, 1.0);
        for i in 0..300 {
            let x = s.position(i as f64 / 100.0);
            assert!(x <= 1.0 + 1e-9, "overshoot {x} at step {i}");
        }
        assert_eq!(s.position(s.settle_time()), 1.0);
    }

    #[test]
    fn test_overdamped_is_monotonic() {
        let s = spring(100.0, 60.0, 1.0);
        assert!(s.zeta > 1.0);

        let mut previous = 0.0;
        for i in 1..500 {
            let x = s.position(i as f64 / 100.0);
            assert!(x >= previous - 1e-12, "not monotonic at step {i}");
            assert!(x <= 1.0 + 1e-9);
            previous = x;
        }
    }

    #[test]
    fn test_heavy_damping_stays_finite() {
        let s = spring(1000.0, 5000.0, 1.0);
        for i in 0..100 {
            assert!(s.position(i as f64 / 10.0).is_finite());
        }
    }

    #[test]
    fn test_validation() {
        for params in [
            SpringParams {
                stiffness: 0.0,
                ..SpringParams::default()
            },
            SpringParams {
                damping: -1.0,
                ..SpringParams::default()
            },
            SpringParams {
                mass: f64::NAN,
                ..SpringParams::default()
            },
        ] {
            assert!(matches!(
                Spring::new(params),
                Err(MotionError::InvalidTransition(_))
            ));
        }
    }
}
