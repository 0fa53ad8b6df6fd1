//! The fixed time-step contract.
//!
//! Every `advance_time` entry point in the workspace accepts a step `dt`
//! in seconds with `0 <= dt < MAX_TIME_STEP`. Anything else is rejected by
//! the caller as an invalid argument.

/// Exclusive upper bound on a single time step, in seconds.
pub const MAX_TIME_STEP: f64 = 0.2;

/// Check whether `dt` is an acceptable time step.
///
/// NaN and infinities are rejected along with out-of-range values.
pub fn is_valid_time_step(dt: f64) -> bool {
    dt.is_finite() && (0.0..MAX_TIME_STEP).contains(&dt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_range_start() {
        assert!(is_valid_time_step(0.0));
        assert!(is_valid_time_step(0.19));
    }

    #[test]
    fn rejects_upper_bound_and_negative() {
        assert!(!is_valid_time_step(0.2));
        assert!(!is_valid_time_step(-0.01));
        assert!(!is_valid_time_step(f64::NAN));
        assert!(!is_valid_time_step(f64::INFINITY));
    }
}
