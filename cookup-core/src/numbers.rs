//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

/// Convert u64 to f64 while allowing precision loss in a single location.
#[must_use]
pub fn u64_to_f64(value: u64) -> f64 {
    cast::<u64, f64>(value).unwrap_or(0.0)
}

/// Round a f64 to one decimal place, returning 0.0 for non-finite values.
#[must_use]
pub fn round_to_tenth(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    (value * 10.0).round() / 10.0
}

/// Integer percentage of `part` over `whole`, floored and clamped to 0..=100.
///
/// A zero `whole` reads as complete.
#[must_use]
pub fn percent_of(part: u64, whole: u64) -> u8 {
    if whole == 0 {
        return 100;
    }
    let pct = (u128::from(part.min(whole)) * 100) / u128::from(whole);
    cast::<u128, u8>(pct).unwrap_or(100)
}

/// Convert a f64 into a u64 only if it is a finite, non-negative whole number.
#[must_use]
pub fn whole_f64_to_u64(value: f64) -> Option<u64> {
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 {
        return None;
    }
    cast::<f64, u64>(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_clamps_and_handles_zero_whole() {
        assert_eq!(percent_of(50, 200), 25);
        assert_eq!(percent_of(500, 200), 100);
        assert_eq!(percent_of(0, 0), 100);
        assert_eq!(percent_of(u64::MAX, u64::MAX), 100);
    }

    #[test]
    fn rounding_handles_non_finite() {
        assert!((round_to_tenth(4.26) - 4.3).abs() < f64::EPSILON);
        assert!((round_to_tenth(f64::NAN) - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn whole_conversion_rejects_fractions_and_negatives() {
        assert_eq!(whole_f64_to_u64(150.0), Some(150));
        assert_eq!(whole_f64_to_u64(-1.0), None);
        assert_eq!(whole_f64_to_u64(1.5), None);
        assert_eq!(whole_f64_to_u64(f64::INFINITY), None);
    }
}
