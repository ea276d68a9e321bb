pub mod analytics;
pub mod charting;
pub mod screen;

use chrono::{DateTime, Local};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph, Widget, Wrap},
};
use time_humanize::{Accuracy, HumanTime, Tense};
use unicode_width::UnicodeWidthStr;

use crate::{
    app::{App, NoticeLevel},
    classifier::{PostureStatus, Thresholds},
    feedback::{advice_for, DetectionQuality},
    session::score_label,
};

const HORIZONTAL_MARGIN: u16 = 2;

pub fn status_color(status: PostureStatus) -> Color {
    match status {
        PostureStatus::Good => Color::Green,
        PostureStatus::Moderate => Color::Yellow,
        PostureStatus::Poor => Color::Red,
        PostureStatus::Uncalibrated => Color::Gray,
    }
}

fn status_message(status: PostureStatus) -> &'static str {
    match status {
        PostureStatus::Good => "Great posture! Keep it up",
        PostureStatus::Moderate => "Slight slouch detected",
        PostureStatus::Poor => "Poor posture, sit up straight",
        PostureStatus::Uncalibrated => "Waiting for posture data",
    }
}

/// Pad `text` with spaces so it sits centered in `width` columns
fn centered(text: &str, width: u16) -> String {
    let pad = (width as usize).saturating_sub(text.width()) / 2;
    format!("{}{}", " ".repeat(pad), text)
}

fn humanize(duration: chrono::Duration) -> String {
    match duration.to_std() {
        Ok(d) if d.as_secs() > 0 => {
            HumanTime::from(d).to_text_en(Accuracy::Rough, Tense::Present)
        }
        _ => String::from("now"),
    }
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let now = Local::now();
        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let dim_style = Style::default().add_modifier(Modifier::DIM);
        let italic_style = Style::default().add_modifier(Modifier::ITALIC);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .constraints([
                Constraint::Length(1), // header
                Constraint::Length(7), // status / score / calibration
                Constraint::Min(6),    // chart
                Constraint::Length(7), // advice / achievements
                Constraint::Length(1), // notice
                Constraint::Length(1), // legend
            ])
            .split(area);

        let monitor = &self.monitor;
        let config = &monitor.config;

        let (state_text, state_style) = if monitor.is_active() {
            ("● MONITORING", bold_style.fg(Color::Green))
        } else {
            ("○ PAUSED", bold_style.fg(Color::DarkGray))
        };
        let mut header = vec![
            Span::styled("SpineGuard  ", bold_style.fg(Color::Cyan)),
            Span::styled(state_text, state_style),
            Span::styled(
                format!(
                    "   mode: {}   sensitivity: {:.1}",
                    config.posture_mode, config.sensitivity
                ),
                dim_style,
            ),
        ];
        if self.feed_closed {
            header.push(Span::styled("   feed ended", bold_style.fg(Color::Red)));
        }
        Paragraph::new(Line::from(header)).render(chunks[0], buf);

        let top = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(40),
                Constraint::Percentage(30),
                Constraint::Percentage(30),
            ])
            .split(chunks[1]);

        render_status(self, top[0], buf);
        render_score(self, top[1], buf);
        render_calibration(self, top[2], buf);
        render_chart(self, chunks[2], buf);

        let bottom = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(chunks[3]);
        render_advice(self, bottom[0], buf);
        render_progress(self, now, bottom[1], buf);

        if let Some(notice) = &self.notice {
            let color = match notice.level {
                NoticeLevel::Info => Color::Cyan,
                NoticeLevel::Success => Color::Green,
                NoticeLevel::Warning => Color::Yellow,
            };
            Paragraph::new(Span::styled(notice.text.as_str(), bold_style.fg(color)))
                .alignment(Alignment::Center)
                .render(chunks[4], buf);
        }

        Paragraph::new(Span::styled(
            "(space) start/stop  (n)eutral  (s)louch  (m)ode  (+/-) sensitivity  (r) alerts  (b)reaks  (e)xport  (a)nalytics  (q)uit",
            italic_style,
        ))
        .render(chunks[5], buf);
    }
}

fn render_status(app: &App, area: Rect, buf: &mut Buffer) {
    let status = app.monitor.status();
    let color = status_color(status);
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Posture")
        .border_style(Style::default().fg(color));
    let inner_width = area.width.saturating_sub(2);

    let frame = &app.monitor.frame;
    let quality = DetectionQuality::from_confidence(frame.confidence);
    let neck = frame
        .neck_angle
        .map(|a| format!("{a:.1}°"))
        .unwrap_or_else(|| String::from("-"));

    let mut lines = vec![
        Line::from(Span::styled(
            centered(&status.to_string().to_uppercase(), inner_width),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::raw(centered(status_message(status), inner_width))),
        Line::from(format!(
            "torso {:.1}°  raw {}  neck {}",
            app.monitor.smoothed_angle(),
            frame
                .raw_angle
                .map(|a| format!("{a:.1}°"))
                .unwrap_or_else(|| String::from("-")),
            neck
        )),
        Line::from(format!(
            "detection: {} ({:.0}%)",
            quality,
            frame.confidence * 100.0
        )),
    ];
    if let Some(hint) = quality.hint().filter(|_| frame.raw_angle.is_some()) {
        lines.push(Line::from(Span::styled(
            hint,
            Style::default().fg(Color::Yellow),
        )));
    }

    Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: true })
        .render(area, buf);
}

fn render_score(app: &App, area: Rect, buf: &mut Buffer) {
    let session = &app.monitor.session;
    let block = Block::default().borders(Borders::ALL).title("Session");

    let lines = match session.live_score() {
        Some(score) => {
            let (good, moderate, poor) = session.percentages();
            let color = if score >= 80 {
                Color::Green
            } else if score >= 60 {
                Color::Yellow
            } else {
                Color::Red
            };
            vec![
                Line::from(vec![
                    Span::styled(
                        format!("{score}"),
                        Style::default().fg(color).add_modifier(Modifier::BOLD),
                    ),
                    Span::raw(format!(" / 100  {}", score_label(score))),
                ]),
                Line::from(Span::styled(
                    format!("good {good:.0}%"),
                    Style::default().fg(Color::Green),
                )),
                Line::from(Span::styled(
                    format!("moderate {moderate:.0}%"),
                    Style::default().fg(Color::Yellow),
                )),
                Line::from(Span::styled(
                    format!("poor {poor:.0}%"),
                    Style::default().fg(Color::Red),
                )),
                Line::from(format!("{} readings", session.total_readings())),
            ]
        }
        None => vec![Line::from(Span::styled(
            "Start monitoring to see your score",
            Style::default().add_modifier(Modifier::DIM),
        ))],
    };

    Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: true })
        .render(area, buf);
}

fn render_calibration(app: &App, area: Rect, buf: &mut Buffer) {
    let calibration = &app.monitor.calibration;
    let block = Block::default().borders(Borders::ALL).title("Calibration");

    let step = if calibration.is_calibrated() {
        Span::styled("✓ calibrated", Style::default().fg(Color::Green))
    } else if calibration.has_neutral() {
        Span::styled("step 2: slouch, press (s)", Style::default().fg(Color::Yellow))
    } else {
        Span::styled("step 1: sit up, press (n)", Style::default().fg(Color::Yellow))
    };

    let mut lines = vec![Line::from(step)];
    if let Some(view) = calibration.view() {
        lines.push(Line::from(format!(
            "neutral {:.1}°  slouch {:.1}°",
            view.neutral, view.slouch
        )));
    }
    let (good, moderate) = app.monitor.thresholds().bounds();
    let source = match app.monitor.thresholds() {
        Thresholds::Calibrated { .. } => "personal",
        Thresholds::FallbackSitting | Thresholds::FallbackStanding => "default",
    };
    lines.push(Line::from(format!("good ≤ {good:.1}°")));
    lines.push(Line::from(format!("moderate ≤ {moderate:.1}°  ({source})")));

    Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: true })
        .render(area, buf);
}

fn render_chart(app: &App, area: Rect, buf: &mut Buffer) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let (good, moderate) = app.monitor.thresholds().bounds();
    let points = app.monitor.session.angle_series();
    let (x_bounds, y_max) = charting::compute_chart_params(&points, moderate);

    let tuples: Vec<(f64, f64)> = points.iter().map(|&p| p.into()).collect();
    let good_line = charting::threshold_line(x_bounds, good);
    let moderate_line = charting::threshold_line(x_bounds, moderate);

    let datasets = vec![
        Dataset::default()
            .marker(Marker::Dot)
            .style(Style::default().fg(Color::Green).add_modifier(Modifier::DIM))
            .graph_type(GraphType::Line)
            .data(&good_line),
        Dataset::default()
            .marker(Marker::Dot)
            .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::DIM))
            .graph_type(GraphType::Line)
            .data(&moderate_line),
        Dataset::default()
            .marker(Marker::Braille)
            .style(Style::default().fg(status_color(app.monitor.status())))
            .graph_type(GraphType::Line)
            .data(&tuples),
    ];

    Chart::new(datasets)
        .block(Block::default().borders(Borders::ALL).title("Torso angle"))
        .x_axis(
            Axis::default()
                .title("seconds")
                .bounds(x_bounds)
                .labels(vec![
                    Span::styled(charting::format_label(x_bounds[0].round()), bold_style),
                    Span::styled(charting::format_label(x_bounds[1].round()), bold_style),
                ]),
        )
        .y_axis(
            Axis::default()
                .title("deg")
                .bounds([0.0, y_max])
                .labels(vec![
                    Span::styled("0", bold_style),
                    Span::styled(charting::format_label(y_max), bold_style),
                ]),
        )
        .render(area, buf);
}

fn render_advice(app: &App, area: Rect, buf: &mut Buffer) {
    let advice = advice_for(app.monitor.status());
    let mut lines = vec![Line::from(Span::styled(
        advice.title,
        Style::default().add_modifier(Modifier::BOLD),
    ))];
    lines.extend(advice.tips.iter().map(|tip| Line::from(format!("• {tip}"))));

    Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Advice"))
        .wrap(Wrap { trim: true })
        .render(area, buf);
}

fn render_progress(app: &App, now: DateTime<Local>, area: Rect, buf: &mut Buffer) {
    let monitor = &app.monitor;
    let tracker = &monitor.achievements;

    let mut lines = vec![Line::from(format!(
        "achievements {}/{}",
        tracker.unlocked_count(),
        tracker.achievements().len()
    ))];
    lines.push(Line::from(
        tracker
            .achievements()
            .iter()
            .map(|a| {
                if a.is_unlocked() {
                    Span::styled("★ ", Style::default().fg(Color::Yellow))
                } else {
                    Span::styled("☆ ", Style::default().add_modifier(Modifier::DIM))
                }
            })
            .collect::<Vec<_>>(),
    ));
    if let Some(latest) = tracker
        .achievements()
        .iter()
        .filter(|a| a.is_unlocked())
        .max_by_key(|a| a.unlocked_at)
    {
        lines.push(Line::from(Span::styled(
            format!("latest: {}", latest.id.title()),
            Style::default().add_modifier(Modifier::ITALIC),
        )));
    }

    let breaks = if !monitor.config.break_reminders {
        String::from("break reminders off")
    } else if monitor.is_active() {
        format!(
            "next break in {}",
            humanize(monitor.breaks.time_until_break(now))
        )
    } else {
        format!(
            "break every {} min",
            monitor.config.break_interval_mins
        )
    };
    lines.push(Line::from(breaks));
    if !monitor.config.nudges_enabled {
        lines.push(Line::from(Span::styled(
            "posture alerts off",
            Style::default().add_modifier(Modifier::DIM),
        )));
    }

    Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Progress"))
        .wrap(Wrap { trim: true })
        .render(area, buf);
}
