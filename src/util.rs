pub fn mean(data: &[f64]) -> Option<f64> {
    let sum = data.iter().sum::<f64>();
    let count = data.len();

    match count {
        positive if positive > 0 => Some(sum / count as f64),
        _ => None,
    }
}

/// Share of `part` in `total` as a percentage, 0 for an empty total
pub fn percentage(part: u64, total: u64) -> f64 {
    match total {
        0 => 0.0,
        _ => part as f64 / total as f64 * 100.0,
    }
}

/// Round to a fixed number of decimals
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
