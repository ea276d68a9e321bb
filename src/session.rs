use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::classifier::PostureStatus;
use crate::time_series::TimeSeriesPoint;
use crate::util::percentage;

/// Readings kept for the live view; counters keep counting past this
pub const LIVE_READINGS_CAP: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PostureReading {
    pub timestamp: DateTime<Local>,
    /// Smoothed torso angle in degrees
    pub angle: f64,
    pub status: PostureStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionData {
    pub start_time: DateTime<Local>,
    pub readings: VecDeque<PostureReading>,
    pub good_count: u64,
    pub moderate_count: u64,
    pub poor_count: u64,
}

impl SessionData {
    pub fn new(start_time: DateTime<Local>) -> Self {
        Self {
            start_time,
            readings: VecDeque::with_capacity(LIVE_READINGS_CAP),
            good_count: 0,
            moderate_count: 0,
            poor_count: 0,
        }
    }

    /// Append a reading and bump the matching counter
    pub fn record(&mut self, reading: PostureReading) {
        match reading.status {
            PostureStatus::Good => self.good_count += 1,
            PostureStatus::Moderate => self.moderate_count += 1,
            PostureStatus::Poor => self.poor_count += 1,
            PostureStatus::Uncalibrated => {}
        }

        if self.readings.len() == LIVE_READINGS_CAP {
            self.readings.pop_front();
        }
        self.readings.push_back(reading);
    }

    pub fn total_readings(&self) -> u64 {
        self.good_count + self.moderate_count + self.poor_count
    }

    pub fn is_empty(&self) -> bool {
        self.total_readings() == 0
    }

    /// Weighted live score: Good 100, Moderate 60, Poor 20
    pub fn live_score(&self) -> Option<u32> {
        let total = self.total_readings();
        if total == 0 {
            return None;
        }
        let weighted = self.good_count * 100 + self.moderate_count * 60 + self.poor_count * 20;
        Some((weighted as f64 / total as f64).round() as u32)
    }

    /// (good, moderate, poor) shares in percent
    pub fn percentages(&self) -> (f64, f64, f64) {
        let total = self.total_readings();
        (
            percentage(self.good_count, total),
            percentage(self.moderate_count, total),
            percentage(self.poor_count, total),
        )
    }

    /// Live readings as (seconds since start, angle) points for charting
    pub fn angle_series(&self) -> Vec<TimeSeriesPoint> {
        self.readings
            .iter()
            .map(|r| {
                let t = (r.timestamp - self.start_time).num_milliseconds() as f64 / 1000.0;
                TimeSeriesPoint::new(t.max(0.0), r.angle)
            })
            .collect()
    }
}

pub fn score_label(score: u32) -> &'static str {
    if score >= 90 {
        "Excellent"
    } else if score >= 80 {
        "Great"
    } else if score >= 70 {
        "Good"
    } else if score >= 60 {
        "Fair"
    } else {
        "Needs Work"
    }
}

/// A stopped session handed to the history store
#[derive(Debug, Clone, PartialEq)]
pub struct FinishedSession {
    pub data: SessionData,
    pub end_time: DateTime<Local>,
}

impl FinishedSession {
    pub fn duration_minutes(&self) -> f64 {
        (self.end_time - self.data.start_time).num_milliseconds().max(0) as f64 / 60_000.0
    }
}
