#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSeriesPoint {
    /// Seconds since the session started
    pub t: f64,
    /// Smoothed torso angle in degrees
    pub angle: f64,
}

impl TimeSeriesPoint {
    pub fn new(t: f64, angle: f64) -> Self {
        Self { t, angle }
    }
}

impl From<(f64, f64)> for TimeSeriesPoint {
    fn from(v: (f64, f64)) -> Self {
        TimeSeriesPoint { t: v.0, angle: v.1 }
    }
}

impl From<TimeSeriesPoint> for (f64, f64) {
    fn from(p: TimeSeriesPoint) -> Self {
        (p.t, p.angle)
    }
}
