//! Numeric helpers centralizing currency sanitization and display formatting.

/// Clamp a currency amount to a finite, non-negative value.
#[must_use]
pub fn sanitize_currency(value: f64) -> f64 {
    if value.is_finite() { value.max(0.0) } else { 0.0 }
}

/// Clamp a multiplicative bonus factor to a finite, non-negative value.
/// Non-finite inputs fall back to the neutral factor of 1.
#[must_use]
pub fn sanitize_factor(value: f64) -> f64 {
    if value.is_finite() { value.max(0.0) } else { 1.0 }
}

/// Clamp a probability to the [0, 1] interval, mapping non-finite to 0.
#[must_use]
pub fn sanitize_chance(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Compact human display for large currency amounts (K / M / B suffixes).
#[must_use]
pub fn format_compact(value: f64) -> String {
    let abs = value.abs();
    if abs >= 1_000_000_000.0 {
        format!("{:.2} B", value / 1_000_000_000.0)
    } else if abs >= 1_000_000.0 {
        format!("{:.2} M", value / 1_000_000.0)
    } else if abs >= 1_000.0 {
        format!("{:.2} K", value / 1_000.0)
    } else {
        let rendered = format!("{value:.2}");
        rendered
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_currency_rejects_non_finite_and_negative() {
        assert!((sanitize_currency(f64::NAN) - 0.0).abs() < f64::EPSILON);
        assert!((sanitize_currency(f64::INFINITY) - 0.0).abs() < f64::EPSILON);
        assert!((sanitize_currency(-5.0) - 0.0).abs() < f64::EPSILON);
        assert!((sanitize_currency(12.5) - 12.5).abs() < f64::EPSILON);
    }

    #[test]
    fn sanitize_factor_is_neutral_for_non_finite() {
        assert!((sanitize_factor(f64::NAN) - 1.0).abs() < f64::EPSILON);
        assert!((sanitize_factor(-2.0) - 0.0).abs() < f64::EPSILON);
        assert!((sanitize_factor(1.5) - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn format_compact_picks_suffixes() {
        assert_eq!(format_compact(2_500_000_000.0), "2.50 B");
        assert_eq!(format_compact(1_250_000.0), "1.25 M");
        assert_eq!(format_compact(1_500.0), "1.50 K");
        assert_eq!(format_compact(12.5), "12.5");
        assert_eq!(format_compact(12.0), "12");
    }
}
