use chrono::{DateTime, Local};

use crate::achievements::{AchievementId, AchievementTracker};
use crate::angles::{neck_angle, torso_angle};
use crate::breaks::BreakReminder;
use crate::calibration::{CalibrationData, CalibrationError, CalibrationState};
use crate::classifier::{PostureClassifier, PostureStatus, Thresholds};
use crate::config::Config;
use crate::landmarks::PoseFrame;
use crate::session::{FinishedSession, PostureReading, SessionData};

/// Minimum spacing between classified frames (~30 Hz)
pub const FRAME_BUDGET_MS: i64 = 33;

/// Things the UI, notifier and persistence layers react to
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MonitorEvent {
    StatusChanged {
        from: PostureStatus,
        to: PostureStatus,
    },
    /// Posture just turned Poor while nudges are enabled
    PostureAlert,
    AchievementUnlocked(AchievementId),
    BreakDue,
    CalibrationChanged(CalibrationData),
}

/// Drops frames that arrive inside the budget of the last accepted one
#[derive(Debug, Clone, Default)]
pub struct FrameGate {
    last_accepted: Option<DateTime<Local>>,
}

impl FrameGate {
    pub fn admit(&mut self, now: DateTime<Local>) -> bool {
        match self.last_accepted {
            Some(last) if (now - last).num_milliseconds() < FRAME_BUDGET_MS => false,
            _ => {
                self.last_accepted = Some(now);
                true
            }
        }
    }

    pub fn reset(&mut self) {
        self.last_accepted = None;
    }
}

/// Latest per-frame values shown alongside the status
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameInfo {
    pub raw_angle: Option<f64>,
    pub neck_angle: Option<f64>,
    pub confidence: f64,
}

/// Owns the whole posture pipeline for one user
#[derive(Debug)]
pub struct Monitor {
    pub config: Config,
    pub calibration: CalibrationState,
    pub achievements: AchievementTracker,
    pub session: SessionData,
    pub breaks: BreakReminder,
    pub frame: FrameInfo,
    classifier: PostureClassifier,
    gate: FrameGate,
    active: bool,
}

impl Monitor {
    pub fn new(
        config: Config,
        calibration: CalibrationState,
        achievements: AchievementTracker,
        now: DateTime<Local>,
    ) -> Self {
        Self {
            breaks: BreakReminder::new(config.break_interval_mins, now),
            config,
            calibration,
            achievements,
            session: SessionData::new(now),
            frame: FrameInfo::default(),
            classifier: PostureClassifier::new(),
            gate: FrameGate::default(),
            active: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn status(&self) -> PostureStatus {
        self.classifier.current_status()
    }

    pub fn smoothed_angle(&self) -> f64 {
        self.classifier.smoothed_angle()
    }

    pub fn thresholds(&self) -> Thresholds {
        Thresholds::select(&self.calibration, self.config.posture_mode)
    }

    /// Begin a fresh session; smoothing and streak state start over
    pub fn start(&mut self, now: DateTime<Local>) {
        self.session = SessionData::new(now);
        self.classifier = PostureClassifier::new();
        self.gate.reset();
        self.achievements.reset_streak();
        self.breaks.reschedule(self.config.break_interval_mins, now);
        self.active = true;
        tracing::info!(mode = %self.config.posture_mode, "monitoring started");
    }

    /// Stop and hand off the session. None if nothing was recorded.
    pub fn stop(&mut self, now: DateTime<Local>) -> Option<FinishedSession> {
        if !self.active {
            return None;
        }
        self.active = false;
        tracing::info!(
            readings = self.session.total_readings(),
            "monitoring stopped"
        );

        if self.session.is_empty() {
            return None;
        }
        Some(FinishedSession {
            data: std::mem::replace(&mut self.session, SessionData::new(now)),
            end_time: now,
        })
    }

    /// Run one pose estimate through the pipeline
    pub fn on_frame(&mut self, frame: &PoseFrame, now: DateTime<Local>) -> Vec<MonitorEvent> {
        let mut events = Vec::new();
        if !self.active || !self.gate.admit(now) {
            return events;
        }

        let Some(landmarks) = frame.pose_landmarks() else {
            tracing::trace!("frame without torso landmarks skipped");
            return events;
        };

        let raw_angle = torso_angle(&landmarks);
        self.frame = FrameInfo {
            raw_angle: Some(raw_angle),
            neck_angle: neck_angle(&landmarks),
            confidence: frame.detection_confidence(),
        };

        let thresholds = self.thresholds();
        let classification = self
            .classifier
            .update(raw_angle, self.config.sensitivity, &thresholds);

        if let Some(t) = classification.transition {
            tracing::debug!(from = %t.from, to = %t.to, angle = classification.smoothed_angle, "posture status changed");
            events.push(MonitorEvent::StatusChanged {
                from: t.from,
                to: t.to,
            });
            if t.to == PostureStatus::Poor && self.config.nudges_enabled {
                events.push(MonitorEvent::PostureAlert);
            }
        }

        self.session.record(PostureReading {
            timestamp: now,
            angle: classification.smoothed_angle,
            status: classification.status,
        });

        events.extend(
            self.achievements
                .on_reading(classification.status, now)
                .into_iter()
                .map(MonitorEvent::AchievementUnlocked),
        );
        events
    }

    /// Periodic housekeeping between frames
    pub fn on_tick(&mut self, now: DateTime<Local>) -> Vec<MonitorEvent> {
        if self.active && self.config.break_reminders && self.breaks.check(now) {
            tracing::info!("break reminder due");
            return vec![MonitorEvent::BreakDue];
        }
        Vec::new()
    }

    pub fn capture_neutral(&mut self) -> Result<MonitorEvent, CalibrationError> {
        let raw = self.frame.raw_angle.ok_or(CalibrationError::NoReading)?;
        let data = self.calibration.capture_neutral(raw);
        tracing::info!(neutral = raw, "neutral position captured");
        Ok(MonitorEvent::CalibrationChanged(data))
    }

    pub fn capture_slouch(&mut self, now: DateTime<Local>) -> Result<Vec<MonitorEvent>, CalibrationError> {
        if !self.calibration.has_neutral() {
            return Err(CalibrationError::NeutralRequired);
        }
        let raw = self.frame.raw_angle.ok_or(CalibrationError::NoReading)?;
        let data = self.calibration.capture_slouch(raw)?;
        tracing::info!(
            slouch = raw,
            good = data.good_threshold,
            moderate = data.moderate_threshold,
            "calibration complete"
        );

        let mut events = vec![MonitorEvent::CalibrationChanged(data)];
        if self.achievements.unlock(AchievementId::Calibrated, now) {
            events.push(MonitorEvent::AchievementUnlocked(AchievementId::Calibrated));
        }
        Ok(events)
    }

    /// Called after a session is stored, with the number of distinct tracked days
    pub fn on_history_updated(&mut self, tracked_days: usize, now: DateTime<Local>) -> Vec<MonitorEvent> {
        if tracked_days >= crate::achievements::WEEK_WARRIOR_DAYS
            && self.achievements.unlock(AchievementId::WeekWarrior, now)
        {
            return vec![MonitorEvent::AchievementUnlocked(AchievementId::WeekWarrior)];
        }
        Vec::new()
    }
}
