//! Headless run of a recorded landmark feed through the monitor

use chrono::{DateTime, Duration, Local, TimeZone};
use std::fmt::Write;

use crate::achievements::AchievementId;
use crate::classifier::PostureStatus;
use crate::landmarks::PoseFrame;
use crate::monitor::{Monitor, MonitorEvent, FRAME_BUDGET_MS};
use crate::session::{score_label, FinishedSession};

#[derive(Debug, Clone, PartialEq)]
pub struct ReplaySummary {
    pub frames: usize,
    pub transitions: usize,
    pub alerts: usize,
    pub breaks: usize,
    pub unlocked: Vec<AchievementId>,
    pub final_status: PostureStatus,
    pub final_angle: f64,
    pub session: Option<FinishedSession>,
}

/// Timestamps below 2000-01-01 are offsets into the recording, not epoch times
pub const RELATIVE_TIMESTAMP_LIMIT_MS: i64 = 946_684_800_000;

/// Frame time from its own timestamp, else paced at the frame budget from `start`
pub fn frame_time(frame: &PoseFrame, index: usize, start: DateTime<Local>) -> DateTime<Local> {
    match frame.timestamp_ms {
        Some(ms) if (0..RELATIVE_TIMESTAMP_LIMIT_MS).contains(&ms) => {
            start + Duration::milliseconds(ms)
        }
        Some(ms) => Local
            .timestamp_millis_opt(ms)
            .single()
            .unwrap_or_else(|| paced(index, start)),
        None => paced(index, start),
    }
}

fn paced(index: usize, start: DateTime<Local>) -> DateTime<Local> {
    start + Duration::milliseconds(FRAME_BUDGET_MS * index as i64)
}

pub fn replay<I>(monitor: &mut Monitor, frames: I, start: DateTime<Local>) -> ReplaySummary
where
    I: IntoIterator<Item = PoseFrame>,
{
    let mut summary = ReplaySummary {
        frames: 0,
        transitions: 0,
        alerts: 0,
        breaks: 0,
        unlocked: Vec::new(),
        final_status: PostureStatus::Uncalibrated,
        final_angle: 0.0,
        session: None,
    };

    let mut frames = frames.into_iter().enumerate().peekable();
    let first_time = frames
        .peek()
        .map(|(i, f)| frame_time(f, *i, start))
        .unwrap_or(start);
    monitor.start(first_time);

    let mut last_time = first_time;
    for (index, frame) in frames {
        let now = frame_time(&frame, index, start);
        last_time = now;
        summary.frames += 1;

        let mut events = monitor.on_frame(&frame, now);
        events.extend(monitor.on_tick(now));
        for event in events {
            match event {
                MonitorEvent::StatusChanged { .. } => summary.transitions += 1,
                MonitorEvent::PostureAlert => summary.alerts += 1,
                MonitorEvent::BreakDue => summary.breaks += 1,
                MonitorEvent::AchievementUnlocked(id) => summary.unlocked.push(id),
                MonitorEvent::CalibrationChanged(_) => {}
            }
        }
    }

    summary.final_status = monitor.status();
    summary.final_angle = monitor.smoothed_angle();
    summary.session = monitor.stop(last_time);
    tracing::info!(frames = summary.frames, transitions = summary.transitions, "replay finished");
    summary
}

/// Human readable summary printed by the replay command
pub fn render_summary(summary: &ReplaySummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "frames:      {}", summary.frames);

    match &summary.session {
        Some(session) => {
            let data = &session.data;
            let (good, moderate, poor) = data.percentages();
            let _ = writeln!(out, "readings:    {}", data.total_readings());
            let _ = writeln!(
                out,
                "good:        {} ({good:.1}%)",
                data.good_count
            );
            let _ = writeln!(
                out,
                "moderate:    {} ({moderate:.1}%)",
                data.moderate_count
            );
            let _ = writeln!(out, "poor:        {} ({poor:.1}%)", data.poor_count);
            if let Some(score) = data.live_score() {
                let _ = writeln!(out, "score:       {score} ({})", score_label(score));
            }
            let _ = writeln!(out, "duration:    {:.1} min", session.duration_minutes());
        }
        None => {
            let _ = writeln!(out, "readings:    0");
        }
    }

    let _ = writeln!(out, "transitions: {}", summary.transitions);
    let _ = writeln!(out, "alerts:      {}", summary.alerts);
    let _ = writeln!(
        out,
        "final:       {} at {:.1}°",
        summary.final_status, summary.final_angle
    );
    for id in &summary.unlocked {
        let _ = writeln!(out, "unlocked:    {}", id.title());
    }
    out
}
