//! Summaries over stored days: period reports, period-over-period comparison,
//! score trend and the hour-of-day heatmap.

use chrono::NaiveDate;
use std::fmt::Write;

use crate::feedback::day_score_label;
use crate::history::{merge_hourly, DailyPostureData, StreakData};
use crate::util::{mean, percentage, round_to};

/// Score change needed before a trend counts as up or down
pub const TREND_DELTA: f64 = 5.0;

#[derive(Debug, Clone, PartialEq)]
pub struct ReportData {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub total_sessions: u64,
    pub total_minutes: f64,
    pub total_hours: f64,
    pub good_percentage: f64,
    pub moderate_percentage: f64,
    pub poor_percentage: f64,
    /// Mean day score over tracked days
    pub average_score: f64,
    pub days_tracked: usize,
}

impl ReportData {
    pub fn from_days(days: &[DailyPostureData], start: NaiveDate, end: NaiveDate) -> Self {
        let tracked: Vec<&DailyPostureData> =
            days.iter().filter(|d| d.total_readings() > 0).collect();

        let good: u64 = tracked.iter().map(|d| d.good_count).sum();
        let moderate: u64 = tracked.iter().map(|d| d.moderate_count).sum();
        let poor: u64 = tracked.iter().map(|d| d.poor_count).sum();
        let total = good + moderate + poor;
        let total_minutes: f64 = days.iter().map(|d| d.total_minutes).sum();

        let scores: Vec<f64> = tracked.iter().map(|d| d.average_score).collect();

        Self {
            start,
            end,
            total_sessions: days.iter().map(|d| d.total_sessions).sum(),
            total_minutes: total_minutes.round(),
            total_hours: round_to(total_minutes / 60.0, 1),
            good_percentage: round_to(percentage(good, total), 1),
            moderate_percentage: round_to(percentage(moderate, total), 1),
            poor_percentage: round_to(percentage(poor, total), 1),
            average_score: mean(&scores).map(f64::round).unwrap_or(0.0),
            days_tracked: tracked.len(),
        }
    }

    pub fn score_label(&self) -> &'static str {
        day_score_label(self.average_score)
    }
}

/// Relative change between two reports, in percent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Comparison {
    pub good_change: f64,
    pub score_change: f64,
    pub minutes_change: f64,
}

fn percent_change(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        return 0.0;
    }
    round_to((current - previous) / previous * 100.0, 1)
}

impl Comparison {
    pub fn between(current: &ReportData, previous: &ReportData) -> Self {
        Self {
            good_change: percent_change(current.good_percentage, previous.good_percentage),
            score_change: percent_change(current.average_score, previous.average_score),
            minutes_change: percent_change(current.total_minutes, previous.total_minutes),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Trend {
    Up,
    Down,
    Flat,
}

impl Trend {
    /// Last tracked day against the one before it
    pub fn of(days: &[DailyPostureData]) -> Self {
        let mut scores = days
            .iter()
            .filter(|d| d.total_readings() > 0)
            .map(|d| d.average_score)
            .rev();
        let (Some(last), Some(previous)) = (scores.next(), scores.next()) else {
            return Trend::Flat;
        };

        let delta = last - previous;
        if delta > TREND_DELTA {
            Trend::Up
        } else if delta < -TREND_DELTA {
            Trend::Down
        } else {
            Trend::Flat
        }
    }

    pub fn arrow(&self) -> &'static str {
        match self {
            Trend::Up => "↑",
            Trend::Down => "↓",
            Trend::Flat => "→",
        }
    }
}

/// Share of poor readings per hour of day
#[derive(Debug, Clone, PartialEq)]
pub struct HourlyHeatmap {
    /// `None` for hours without readings
    pub poor_percentage: [Option<f64>; 24],
}

impl HourlyHeatmap {
    pub fn from_days(days: &[DailyPostureData]) -> Self {
        let mut poor_percentage = [None; 24];
        for (hour, data) in merge_hourly(days) {
            if let Some(slot) = poor_percentage.get_mut(hour as usize) {
                if data.total_readings > 0 {
                    *slot = Some(round_to(
                        percentage(data.poor_count, data.total_readings),
                        1,
                    ));
                }
            }
        }
        Self { poor_percentage }
    }

    /// 0 (no data or almost no poor readings) to 4 (mostly poor)
    pub fn intensity(&self, hour: usize) -> u8 {
        match self.poor_percentage.get(hour).copied().flatten() {
            Some(p) if p >= 60.0 => 4,
            Some(p) if p >= 40.0 => 3,
            Some(p) if p >= 20.0 => 2,
            Some(p) if p >= 10.0 => 1,
            _ => 0,
        }
    }

    /// Hour with the highest poor share, if any hour has data
    pub fn worst_hour(&self) -> Option<(usize, f64)> {
        self.poor_percentage
            .iter()
            .enumerate()
            .filter_map(|(h, p)| p.map(|p| (h, p)))
            .fold(None, |worst: Option<(usize, f64)>, (h, p)| match worst {
                Some((_, wp)) if wp >= p => worst,
                _ => Some((h, p)),
            })
    }
}

/// Plain-text report for a period
pub fn render_text(
    report: &ReportData,
    days: &[DailyPostureData],
    streaks: &StreakData,
    comparison: Option<&Comparison>,
) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Posture Report");
    let _ = writeln!(out, "{} to {}", report.start, report.end);
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Average score:  {:.0} ({})",
        report.average_score,
        report.score_label()
    );
    let _ = writeln!(out, "Sessions:       {}", report.total_sessions);
    let _ = writeln!(out, "Time monitored: {:.1} h", report.total_hours);
    let _ = writeln!(
        out,
        "Days tracked:   {} of {}",
        report.days_tracked,
        days.len()
    );
    let _ = writeln!(
        out,
        "Good / Moderate / Poor: {:.1}% / {:.1}% / {:.1}%",
        report.good_percentage, report.moderate_percentage, report.poor_percentage
    );
    let _ = writeln!(
        out,
        "Streak: {} days (longest {}, {} good days total)",
        streaks.current_streak, streaks.longest_streak, streaks.total_good_days
    );

    if let Some(c) = comparison {
        let _ = writeln!(out);
        let _ = writeln!(out, "Compared to the previous period");
        let _ = writeln!(out, "  good posture: {:+.1}%", c.good_change);
        let _ = writeln!(out, "  score:        {:+.1}%", c.score_change);
        let _ = writeln!(out, "  minutes:      {:+.1}%", c.minutes_change);
    }

    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{:<12} {:>8} {:>8} {:>6} {:>6} {:>6}",
        "Date", "Sessions", "Minutes", "Good", "Mod", "Poor"
    );
    for d in days {
        let total = d.total_readings();
        if total == 0 {
            let _ = writeln!(out, "{:<12} {:>8}", d.date, "-");
            continue;
        }
        let _ = writeln!(
            out,
            "{:<12} {:>8} {:>8.0} {:>5.0}% {:>5.0}% {:>5.0}%",
            d.date,
            d.total_sessions,
            d.total_minutes,
            percentage(d.good_count, total),
            percentage(d.moderate_count, total),
            percentage(d.poor_count, total),
        );
    }

    let heatmap = HourlyHeatmap::from_days(days);
    if let Some((hour, poor)) = heatmap.worst_hour() {
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "Most slouching around {:02}:00 ({:.0}% poor readings)",
            hour, poor
        );
    }

    out
}
