use crate::time_series::TimeSeriesPoint;

/// Smallest visible angle range on the live chart
const MIN_Y_MAX: f64 = 10.0;

/// X (seconds) and Y (degrees) bounds for the live angle chart.
/// The Y range always leaves room above the moderate threshold.
pub fn compute_chart_params(points: &[TimeSeriesPoint], moderate: f64) -> ([f64; 2], f64) {
    let highest = points
        .iter()
        .map(|p| p.angle)
        .fold(moderate, f64::max);
    let y_max = (highest * 1.2).ceil().max(MIN_Y_MAX);

    let x_min = points.first().map(|p| p.t).unwrap_or(0.0);
    let mut x_max = points.last().map(|p| p.t).unwrap_or(1.0);
    if x_max - x_min < 1.0 {
        x_max = x_min + 1.0;
    }

    ([x_min, x_max], y_max)
}

/// Horizontal line across the chart at `y`
pub fn threshold_line(x_bounds: [f64; 2], y: f64) -> [(f64, f64); 2] {
    [(x_bounds[0], y), (x_bounds[1], y)]
}

/// Format a simple numeric label consistently
pub fn format_label(val: f64) -> String {
    if (val - val.round()).abs() < f64::EPSILON {
        format!("{}", val.round())
    } else {
        format!("{val:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_chart_params_empty() {
        let (x, y) = compute_chart_params(&[], 12.0);
        assert_eq!(x, [0.0, 1.0]);
        assert_eq!(y, 15.0);
    }

    #[test]
    fn test_compute_chart_params_follows_window() {
        let points = vec![
            TimeSeriesPoint::new(30.0, 4.0),
            TimeSeriesPoint::new(45.5, 20.0),
        ];
        let (x, y) = compute_chart_params(&points, 12.0);
        assert_eq!(x, [30.0, 45.5]);
        assert_eq!(y, 24.0);
    }

    #[test]
    fn test_small_angles_keep_minimum_range() {
        let (_, y) = compute_chart_params(&[TimeSeriesPoint::new(0.0, 1.0)], 2.0);
        assert_eq!(y, MIN_Y_MAX);
    }

    #[test]
    fn test_format_label() {
        assert_eq!(format_label(1.0), "1");
        assert_eq!(format_label(1.2345), "1.23");
    }
}
