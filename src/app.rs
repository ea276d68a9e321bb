use chrono::{DateTime, Duration, Local, NaiveDate};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::path::{Path, PathBuf};

use crate::achievements::{AchievementStore, AchievementTracker, FileAchievementStore};
use crate::calibration::{CalibrationError, CalibrationStore, FileCalibrationStore};
use crate::config::{Config, ConfigStore, FileConfigStore};
use crate::export;
use crate::history::{DailyPostureData, HistoryDb, StreakData};
use crate::landmarks::PoseFrame;
use crate::monitor::{Monitor, MonitorEvent};
use crate::report::{Comparison, HourlyHeatmap, ReportData, Trend};
use crate::runtime::AppEvent;

const NOTICE_SECS: i64 = 4;
const SENSITIVITY_STEP: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Monitor,
    Analytics,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
}

/// Transient message under the live view
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub text: String,
    pub level: NoticeLevel,
    pub until: DateTime<Local>,
}

/// Where settings, calibration and achievements are persisted
pub struct Stores {
    pub config: Box<dyn ConfigStore>,
    pub calibration: Box<dyn CalibrationStore>,
    pub achievements: Box<dyn AchievementStore>,
}

impl Stores {
    pub fn default_locations() -> Self {
        Self {
            config: Box::new(FileConfigStore::new()),
            calibration: Box::new(FileCalibrationStore::new()),
            achievements: Box::new(FileAchievementStore::new()),
        }
    }

    /// All three stores inside one directory
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            config: Box::new(FileConfigStore::with_path(dir.join("config.json"))),
            calibration: Box::new(FileCalibrationStore::with_path(dir.join("calibration.json"))),
            achievements: Box::new(FileAchievementStore::with_path(dir.join("achievements.json"))),
        }
    }
}

/// Analytics period shown on the analytics screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Week,
    Month,
}

impl Period {
    pub fn days(&self) -> u32 {
        match self {
            Period::Week => 7,
            Period::Month => 30,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Period::Week => "Last 7 days",
            Period::Month => "Last 30 days",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Analytics {
    pub period: Period,
    pub days: Vec<DailyPostureData>,
    pub report: ReportData,
    pub comparison: Comparison,
    pub streaks: StreakData,
    pub trend: Trend,
    pub heatmap: HourlyHeatmap,
    pub today: Option<DailyPostureData>,
}

impl Analytics {
    pub fn load(db: &HistoryDb, period: Period, today: NaiveDate) -> crate::Result<Self> {
        let span = period.days();
        let days = db.date_range(span, today)?;
        let start = days.first().map(|d| d.date).unwrap_or(today);
        let report = ReportData::from_days(&days, start, today);

        let previous_end = start - Duration::days(1);
        let previous_days = db.date_range(span, previous_end)?;
        let previous_start = previous_days.first().map(|d| d.date).unwrap_or(previous_end);
        let previous = ReportData::from_days(&previous_days, previous_start, previous_end);

        Ok(Self {
            period,
            comparison: Comparison::between(&report, &previous),
            streaks: db.streaks(today)?,
            trend: Trend::of(&days),
            heatmap: HourlyHeatmap::from_days(&days),
            today: db.daily_data(today)?,
            days,
            report,
        })
    }
}

pub struct App {
    pub monitor: Monitor,
    pub state: AppState,
    pub notice: Option<Notice>,
    pub analytics: Option<Analytics>,
    pub feed_closed: bool,
    pub should_quit: bool,
    history: Option<HistoryDb>,
    stores: Stores,
    export_dir: PathBuf,
}

impl App {
    pub fn new(
        config: Config,
        stores: Stores,
        history: Option<HistoryDb>,
        export_dir: PathBuf,
        now: DateTime<Local>,
    ) -> Self {
        let calibration = stores.calibration.load();
        let achievements = AchievementTracker::with_unlocked(&stores.achievements.load());

        Self {
            monitor: Monitor::new(config.sanitized(), calibration, achievements, now),
            state: AppState::Monitor,
            notice: None,
            analytics: None,
            feed_closed: false,
            should_quit: false,
            history,
            stores,
            export_dir,
        }
    }

    pub fn history(&self) -> Option<&HistoryDb> {
        self.history.as_ref()
    }

    pub fn handle_event(&mut self, event: AppEvent, now: DateTime<Local>) {
        match event {
            AppEvent::Key(key) => self.on_key(key, now),
            AppEvent::Frame(frame) => self.on_frame(&frame, now),
            AppEvent::FeedClosed => {
                self.feed_closed = true;
                tracing::info!("landmark feed closed");
                self.notify("Landmark feed ended", NoticeLevel::Warning, now);
            }
            AppEvent::Tick => self.on_tick(now),
            AppEvent::Resize => {}
        }
    }

    pub fn on_key(&mut self, key: KeyEvent, now: DateTime<Local>) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        match self.state {
            AppState::Monitor => match key.code {
                KeyCode::Esc | KeyCode::Char('q') => self.should_quit = true,
                KeyCode::Char(' ') => self.toggle_monitoring(now),
                KeyCode::Char('n') => self.capture_neutral(now),
                KeyCode::Char('s') => self.capture_slouch(now),
                KeyCode::Char('m') => self.toggle_mode(now),
                KeyCode::Char('+') | KeyCode::Char('=') => {
                    self.adjust_sensitivity(SENSITIVITY_STEP, now)
                }
                KeyCode::Char('-') => self.adjust_sensitivity(-SENSITIVITY_STEP, now),
                KeyCode::Char('r') => self.toggle_nudges(now),
                KeyCode::Char('b') => self.toggle_break_reminders(now),
                KeyCode::Char('e') => self.export_session(now),
                KeyCode::Char('a') => self.open_analytics(Period::Week, now),
                _ => {}
            },
            AppState::Analytics => match key.code {
                KeyCode::Char('q') => self.should_quit = true,
                KeyCode::Esc | KeyCode::Backspace | KeyCode::Char('b') => {
                    self.state = AppState::Monitor
                }
                KeyCode::Char('1') => self.open_analytics(Period::Week, now),
                KeyCode::Char('2') => self.open_analytics(Period::Month, now),
                _ => {}
            },
        }
    }

    pub fn on_frame(&mut self, frame: &PoseFrame, now: DateTime<Local>) {
        let events = self.monitor.on_frame(frame, now);
        self.apply(events, now);
    }

    pub fn on_tick(&mut self, now: DateTime<Local>) {
        if self.notice.as_ref().is_some_and(|n| now >= n.until) {
            self.notice = None;
        }
        let events = self.monitor.on_tick(now);
        self.apply(events, now);
    }

    fn notify(&mut self, text: impl Into<String>, level: NoticeLevel, now: DateTime<Local>) {
        self.notice = Some(Notice {
            text: text.into(),
            level,
            until: now + Duration::seconds(NOTICE_SECS),
        });
    }

    fn apply(&mut self, events: Vec<MonitorEvent>, now: DateTime<Local>) {
        let mut achievements_changed = false;
        for event in events {
            match event {
                MonitorEvent::StatusChanged { .. } => {}
                MonitorEvent::PostureAlert => self.notify(
                    "Poor posture detected! Sit up straight and relax your shoulders.",
                    NoticeLevel::Warning,
                    now,
                ),
                MonitorEvent::AchievementUnlocked(id) => {
                    achievements_changed = true;
                    self.notify(
                        format!("Achievement unlocked: {} ({})", id.title(), id.description()),
                        NoticeLevel::Success,
                        now,
                    );
                }
                MonitorEvent::BreakDue => self.notify(
                    "Time for a break! Stand up, stretch, and rest your eyes.",
                    NoticeLevel::Info,
                    now,
                ),
                MonitorEvent::CalibrationChanged(_) => {
                    if let Err(e) = self.stores.calibration.save(&self.monitor.calibration) {
                        tracing::warn!(error = %e, "failed to save calibration");
                    }
                }
            }
        }

        if achievements_changed {
            self.save_achievements();
        }
    }

    fn save_achievements(&self) {
        if let Err(e) = self
            .stores
            .achievements
            .save(self.monitor.achievements.achievements())
        {
            tracing::warn!(error = %e, "failed to save achievements");
        }
    }

    fn save_config(&self) {
        if let Err(e) = self.stores.config.save(&self.monitor.config) {
            tracing::warn!(error = %e, "failed to save config");
        }
    }

    pub fn toggle_monitoring(&mut self, now: DateTime<Local>) {
        if self.monitor.is_active() {
            self.finish_session(now);
        } else {
            self.monitor.start(now);
            self.notify("Monitoring started", NoticeLevel::Info, now);
        }
    }

    /// Stop monitoring and store the session in the history
    pub fn finish_session(&mut self, now: DateTime<Local>) {
        let Some(finished) = self.monitor.stop(now) else {
            return;
        };
        let Some(db) = self.history.as_mut() else {
            return;
        };

        match db.save_session(&finished, now) {
            Ok(_) => {
                let tracked_days = db.tracked_days().unwrap_or_default();
                let events = self.monitor.on_history_updated(tracked_days, now);
                self.apply(events, now);
                self.notify(
                    format!(
                        "Session saved: {} readings over {:.0} min",
                        finished.data.total_readings(),
                        finished.duration_minutes()
                    ),
                    NoticeLevel::Info,
                    now,
                );
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to save session");
                self.notify(format!("Could not save session: {e}"), NoticeLevel::Warning, now);
            }
        }
    }

    pub fn capture_neutral(&mut self, now: DateTime<Local>) {
        match self.monitor.capture_neutral() {
            Ok(event) => {
                self.apply(vec![event], now);
                let neutral = self.monitor.calibration.view().map(|c| c.neutral);
                self.notify(
                    format!(
                        "Neutral position captured at {:.1}°. Now slouch and press (s)",
                        neutral.unwrap_or_default()
                    ),
                    NoticeLevel::Success,
                    now,
                );
            }
            Err(e) => self.calibration_failed(e, now),
        }
    }

    pub fn capture_slouch(&mut self, now: DateTime<Local>) {
        match self.monitor.capture_slouch(now) {
            Ok(events) => {
                self.apply(events, now);
                if let Some((good, moderate)) = self.monitor.calibration.thresholds() {
                    self.notify(
                        format!("Calibration complete: good ≤ {good:.1}°, moderate ≤ {moderate:.1}°"),
                        NoticeLevel::Success,
                        now,
                    );
                }
            }
            Err(e) => self.calibration_failed(e, now),
        }
    }

    fn calibration_failed(&mut self, e: CalibrationError, now: DateTime<Local>) {
        tracing::debug!(error = %e, "calibration capture rejected");
        self.notify(e.to_string(), NoticeLevel::Warning, now);
    }

    pub fn toggle_mode(&mut self, now: DateTime<Local>) {
        self.monitor.config.posture_mode = self.monitor.config.posture_mode.toggled();
        self.save_config();
        self.notify(
            format!("Posture mode: {}", self.monitor.config.posture_mode),
            NoticeLevel::Info,
            now,
        );
    }

    pub fn adjust_sensitivity(&mut self, delta: f64, now: DateTime<Local>) {
        self.monitor.config.adjust_sensitivity(delta);
        self.save_config();
        self.notify(
            format!("Sensitivity: {:.1}", self.monitor.config.sensitivity),
            NoticeLevel::Info,
            now,
        );
    }

    pub fn toggle_nudges(&mut self, now: DateTime<Local>) {
        self.monitor.config.nudges_enabled = !self.monitor.config.nudges_enabled;
        self.save_config();
        let state = if self.monitor.config.nudges_enabled { "on" } else { "off" };
        self.notify(format!("Posture alerts {state}"), NoticeLevel::Info, now);
    }

    pub fn toggle_break_reminders(&mut self, now: DateTime<Local>) {
        let config = &mut self.monitor.config;
        config.break_reminders = !config.break_reminders;
        let interval = config.break_interval_mins;
        let enabled = config.break_reminders;
        self.monitor.breaks.reschedule(interval, now);
        self.save_config();
        let state = if enabled { "on" } else { "off" };
        self.notify(format!("Break reminders {state}"), NoticeLevel::Info, now);
    }

    pub fn export_session(&mut self, now: DateTime<Local>) {
        if self.monitor.session.is_empty() {
            self.notify("Nothing to export yet", NoticeLevel::Warning, now);
            return;
        }
        match export::export_session(&self.export_dir, &self.monitor.session.readings, now) {
            Ok(path) => self.notify(
                format!("Exported to {}", path.display()),
                NoticeLevel::Success,
                now,
            ),
            Err(e) => {
                tracing::error!(error = %e, "session export failed");
                self.notify(format!("Export failed: {e}"), NoticeLevel::Warning, now);
            }
        }
    }

    pub fn open_analytics(&mut self, period: Period, now: DateTime<Local>) {
        let Some(db) = self.history.as_ref() else {
            self.notify("History is unavailable", NoticeLevel::Warning, now);
            return;
        };
        match Analytics::load(db, period, now.date_naive()) {
            Ok(analytics) => {
                self.analytics = Some(analytics);
                self.state = AppState::Analytics;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to load analytics");
                self.notify(format!("Could not load history: {e}"), NoticeLevel::Warning, now);
            }
        }
    }

    /// Save the running session and settings before exit
    pub fn shutdown(&mut self, now: DateTime<Local>) {
        self.finish_session(now);
        self.save_config();
        self.save_achievements();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::achievements::AchievementId;
    use crate::calibration::CalibrationState;
    use crate::classifier::PostureStatus;
    use crate::landmarks::{Keypoint, PoseLandmarks};
    use tempfile::{tempdir, TempDir};

    fn frame_at(angle: f64) -> PoseFrame {
        let rad = angle.to_radians();
        let (dx, dy) = (200.0 * rad.sin(), 200.0 * rad.cos());
        PoseFrame::from_landmarks(PoseLandmarks::torso(
            Keypoint::new(90.0 + dx, 300.0 - dy),
            Keypoint::new(110.0 + dx, 300.0 - dy),
            Keypoint::new(90.0, 300.0),
            Keypoint::new(110.0, 300.0),
        ))
    }

    fn key(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)
    }

    fn app() -> (App, TempDir) {
        let dir = tempdir().unwrap();
        let app = App::new(
            Config::default(),
            Stores::in_dir(dir.path()),
            Some(HistoryDb::open_in_memory().unwrap()),
            dir.path().join("exports"),
            Local::now(),
        );
        (app, dir)
    }

    #[test]
    fn space_starts_and_stops_monitoring() {
        let (mut app, _dir) = app();
        let now = Local::now();
        app.on_key(key(' '), now);
        assert!(app.monitor.is_active());

        for i in 0..5 {
            app.on_frame(&frame_at(3.0), now + Duration::milliseconds(100 * i));
        }
        assert_eq!(app.monitor.session.total_readings(), 5);

        app.on_key(key(' '), now + Duration::seconds(2));
        assert!(!app.monitor.is_active());
        assert_eq!(app.history().unwrap().tracked_days().unwrap(), 1);
        assert!(app.notice.as_ref().unwrap().text.starts_with("Session saved"));
    }

    #[test]
    fn calibration_keys_capture_and_persist() {
        let (mut app, dir) = app();
        let now = Local::now();
        app.on_key(key('s'), now);
        assert_eq!(app.notice.as_ref().unwrap().level, NoticeLevel::Warning);

        app.on_key(key(' '), now);
        app.on_frame(&frame_at(5.0), now);
        app.on_key(key('n'), now);
        app.on_frame(&frame_at(25.0), now + Duration::milliseconds(100));
        app.on_key(key('s'), now + Duration::milliseconds(100));

        let (good, moderate) = app.monitor.calibration.thresholds().unwrap();
        assert!((good - 13.0).abs() < 1e-6);
        assert!((moderate - 20.0).abs() < 1e-6);
        assert!(app.monitor.achievements.is_unlocked(AchievementId::Calibrated));

        let restored = FileCalibrationStore::with_path(dir.path().join("calibration.json")).load();
        assert!(matches!(restored, CalibrationState::Calibrated(_)));
        let unlocked = FileAchievementStore::with_path(dir.path().join("achievements.json")).load();
        assert!(unlocked
            .iter()
            .any(|a| a.id == AchievementId::Calibrated && a.is_unlocked()));
    }

    #[test]
    fn settings_keys_update_and_save_config() {
        let (mut app, dir) = app();
        let now = Local::now();
        app.on_key(key('m'), now);
        app.on_key(key('+'), now);
        app.on_key(key('r'), now);

        let saved = FileConfigStore::with_path(dir.path().join("config.json")).load();
        assert_eq!(saved.posture_mode, crate::classifier::PostureMode::Standing);
        assert!((saved.sensitivity - 0.6).abs() < 1e-9);
        assert!(!saved.nudges_enabled);
    }

    #[test]
    fn poor_posture_raises_alert_notice() {
        let (mut app, _dir) = app();
        let now = Local::now();
        app.on_key(key(' '), now);
        for i in 0..30 {
            app.on_frame(&frame_at(40.0), now + Duration::milliseconds(100 * i));
        }
        assert_eq!(app.monitor.status(), PostureStatus::Poor);
        let notice = app.notice.as_ref().unwrap();
        assert_eq!(notice.level, NoticeLevel::Warning);
        assert!(notice.text.starts_with("Poor posture"));
    }

    #[test]
    fn notices_expire_on_tick() {
        let (mut app, _dir) = app();
        let now = Local::now();
        app.on_key(key('m'), now);
        app.on_tick(now + Duration::seconds(1));
        assert!(app.notice.is_some());
        app.on_tick(now + Duration::seconds(NOTICE_SECS));
        assert!(app.notice.is_none());
    }

    #[test]
    fn export_writes_csv_of_current_session() {
        let (mut app, dir) = app();
        let now = Local::now();
        app.on_key(key('e'), now);
        assert_eq!(app.notice.as_ref().unwrap().text, "Nothing to export yet");

        app.on_key(key(' '), now);
        app.on_frame(&frame_at(2.0), now);
        app.on_key(key('e'), now);
        let exported: Vec<_> = std::fs::read_dir(dir.path().join("exports"))
            .unwrap()
            .collect();
        assert_eq!(exported.len(), 1);
    }

    #[test]
    fn analytics_screen_round_trip() {
        let (mut app, _dir) = app();
        let now = Local::now();
        app.on_key(key('a'), now);
        assert_eq!(app.state, AppState::Analytics);
        let analytics = app.analytics.as_ref().unwrap();
        assert_eq!(analytics.days.len(), 7);

        app.on_key(key('2'), now);
        assert_eq!(app.analytics.as_ref().unwrap().days.len(), 30);

        app.on_key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE), now);
        assert_eq!(app.state, AppState::Monitor);
        assert!(!app.should_quit);

        app.on_key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE), now);
        assert!(app.should_quit);
    }
}
