use std::sync::mpsc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Local};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use spineguard::app::{App, AppState, Stores};
use spineguard::calibration::CalibrationState;
use spineguard::classifier::PostureStatus;
use spineguard::config::Config;
use spineguard::history::HistoryDb;
use spineguard::landmarks::{Keypoint, PoseFrame, PoseLandmarks};
use spineguard::runtime::{AppEvent, FixedTicker, Runner, TestEventSource};

fn key(c: char) -> AppEvent {
    AppEvent::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
}

/// Torso leaning forward by `angle` degrees
fn frame_at(angle: f64) -> AppEvent {
    let rad = angle.to_radians();
    let (dx, dy) = (0.4 * rad.sin(), 0.4 * rad.cos());
    AppEvent::Frame(PoseFrame::from_landmarks(PoseLandmarks::torso(
        Keypoint::new(0.4 + dx, 0.8 - dy),
        Keypoint::new(0.6 + dx, 0.8 - dy),
        Keypoint::new(0.4, 0.8),
        Keypoint::new(0.6, 0.8),
    )))
}

// Drives the app through Runner/TestEventSource without a TTY.
// Event times are simulated so the frame gate sees ~30 Hz input.
fn drive(app: &mut App, events: Vec<AppEvent>) {
    let (tx, rx) = mpsc::channel();
    let count = events.len();
    for ev in events {
        tx.send(ev).unwrap();
    }
    drop(tx);

    let runner = Runner::new(
        TestEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(5)),
    );
    let start = Local::now();
    for i in 0..count {
        let now = start + ChronoDuration::milliseconds(50 * i as i64);
        match runner.step() {
            AppEvent::Tick => break,
            ev => app.handle_event(ev, now),
        }
        if app.should_quit {
            break;
        }
    }
}

fn new_app(dir: &std::path::Path) -> App {
    App::new(
        Config::default(),
        Stores::in_dir(dir),
        Some(HistoryDb::open_in_memory().unwrap()),
        dir.join("exports"),
        Local::now(),
    )
}

#[test]
fn headless_calibrate_and_monitor_flow() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = new_app(dir.path());

    let mut events = vec![key(' ')];
    events.extend((0..10).map(|_| frame_at(5.0)));
    events.push(key('n'));
    events.extend((0..10).map(|_| frame_at(25.0)));
    events.push(key('s'));
    events.extend((0..40).map(|_| frame_at(5.0)));
    drive(&mut app, events);

    match &app.monitor.calibration {
        CalibrationState::Calibrated(data) => {
            assert!((data.neutral - 5.0).abs() < 1e-6);
            assert!((data.slouch - 25.0).abs() < 1e-6);
            assert!((data.good_threshold - 13.0).abs() < 1e-6);
            assert!((data.moderate_threshold - 20.0).abs() < 1e-6);
        }
        other => panic!("expected calibrated state, got {other:?}"),
    }

    // smoothing settles back near the neutral angle
    assert_eq!(app.monitor.status(), PostureStatus::Good);
    assert_eq!(app.monitor.session.total_readings(), 60);
    assert!(app.monitor.is_active());
}

#[test]
fn headless_session_is_saved_on_quit() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = new_app(dir.path());

    let mut events = vec![key(' ')];
    events.extend((0..20).map(|_| frame_at(2.0)));
    events.push(key('q'));
    drive(&mut app, events);

    assert!(app.should_quit);
    app.shutdown(Local::now());

    let db = app.history().unwrap();
    let today = db.daily_data(Local::now().date_naive()).unwrap().unwrap();
    assert_eq!(today.total_sessions, 1);
    assert_eq!(today.good_count, 20);
}

#[test]
fn headless_feed_end_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = new_app(dir.path());
    drive(&mut app, vec![key(' '), frame_at(1.0), AppEvent::FeedClosed]);
    assert!(app.feed_closed);
    assert_eq!(app.notice.as_ref().unwrap().text, "Landmark feed ended");
}

#[test]
fn headless_analytics_after_session() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = new_app(dir.path());

    let mut events = vec![key(' ')];
    events.extend((0..10).map(|_| frame_at(30.0)));
    events.push(key(' '));
    events.push(key('a'));
    drive(&mut app, events);

    assert_eq!(app.state, AppState::Analytics);
    let analytics = app.analytics.as_ref().unwrap();
    assert_eq!(analytics.report.total_sessions, 1);
    assert_eq!(analytics.report.days_tracked, 1);
    assert!(analytics.report.poor_percentage > 0.0);
}
