//! Small numeric helpers shared by the segment and CLI layers.

use chrono::Duration;

use crate::error::{EngineError, Result};

/// Round `value` to `digits` decimal places, half-way cases toward positive
/// infinity.
///
/// # Errors
///
/// Returns [`EngineError::InvalidInput`] if `digits` is negative.
pub fn scale(value: f64, digits: i32) -> Result<f64> {
    if digits < 0 {
        return Err(EngineError::InvalidInput(format!(
            "cannot scale to {} digits",
            digits
        )));
    }
    let magnitude = 10f64.powi(digits);
    Ok((value * magnitude + 0.5).floor() / magnitude)
}

/// Express `fraction` as a percentage rounded to `digits` decimal places.
pub fn percent(fraction: f64, digits: i32) -> Result<f64> {
    scale(fraction * 100.0, digits)
}

/// Truncate `duration` down to a whole multiple of `granularity`.
///
/// Truncation is toward negative infinity, so a negative duration moves
/// further from zero.
///
/// # Errors
///
/// Returns [`EngineError::InvalidInput`] if `granularity` is not positive.
pub fn truncate(duration: Duration, granularity: Duration) -> Result<Duration> {
    let step = granularity.num_milliseconds();
    if step <= 0 {
        return Err(EngineError::InvalidInput(format!(
            "truncation granularity must be positive, got {}ms",
            step
        )));
    }
    let millis = duration.num_milliseconds();
    Ok(Duration::milliseconds(millis.div_euclid(step) * step))
}
