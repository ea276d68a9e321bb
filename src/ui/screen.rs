use ratatui::Frame;

use crate::app::{App, AppState};
use crate::ui::analytics::render_analytics;

/// A UI Screen boundary: responsible for rendering one app state
pub trait Screen {
    fn render(&self, app: &App, f: &mut Frame);
}

/// Live monitoring screen - renders the App widget
pub struct MonitorScreen;

impl Screen for MonitorScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        f.render_widget(app, f.area());
    }
}

/// History analytics screen - uses dedicated renderer
pub struct AnalyticsScreen;

impl Screen for AnalyticsScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        render_analytics(app, f);
    }
}

/// Helper to construct the appropriate screen for the current state
pub fn current_screen(state: &AppState) -> Box<dyn Screen> {
    match state {
        AppState::Monitor => Box::new(MonitorScreen),
        AppState::Analytics => Box::new(AnalyticsScreen),
    }
}
