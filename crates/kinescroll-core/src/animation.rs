#![forbid(unsafe_code)]

//! Easing curves and progress helpers for fixed-duration transitions.
//!
//! All curves map `[0.0, 1.0] → [0.0, 1.0]`, are monotone, and pin both
//! endpoints. Inputs outside the unit interval are clamped first.

use core::time::Duration;

/// An easing curve.
pub type EasingFn = fn(f64) -> f64;

#[inline]
fn unit(t: f64) -> f64 {
    if t.is_nan() { 0.0 } else { t.max(0.0).min(1.0) }
}

/// Identity curve.
#[must_use]
pub fn linear(t: f64) -> f64 {
    unit(t)
}

/// Cubic ease-out: `1 − (1 − t)³`. Fast start, gentle landing.
#[must_use]
pub fn ease_out_cubic(t: f64) -> f64 {
    let inv = 1.0 - unit(t);
    1.0 - inv * inv * inv
}

/// Linear progress of `elapsed` through `duration`, clamped to `[0, 1]`.
///
/// A zero duration is complete immediately.
#[must_use]
pub fn progress(elapsed: Duration, duration: Duration) -> f64 {
    if duration.is_zero() {
        return 1.0;
    }
    unit(elapsed.as_secs_f64() / duration.as_secs_f64())
}
