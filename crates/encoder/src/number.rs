//! Shared numeric rendering

/// Round to 4 decimal places, matching `{:.4}` exactly
///
/// Going through the formatted text keeps the json values identical to the
/// csv ones, ties included.
pub fn round4(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    format!("{value:.4}").parse().unwrap_or(value)
}
