/// Rounds an average to two decimals. `None` (empty table) becomes 0.0.
pub fn round_average(average: Option<f64>) -> f64 {
    match average {
        Some(value) if value.is_finite() => (value * 100.0).round() / 100.0,
        _ => 0.0,
    }
}
