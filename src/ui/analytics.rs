use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Wrap},
    Frame,
};

use crate::app::{Analytics, App};
use crate::feedback::day_score_label;
use crate::history::DailyPostureData;
use crate::report::{HourlyHeatmap, Trend};
use crate::util::percentage;

fn score_color(score: f64) -> Color {
    if score >= 80.0 {
        Color::Green
    } else if score >= 60.0 {
        Color::Yellow
    } else if score >= 40.0 {
        Color::LightRed
    } else {
        Color::Red
    }
}

fn change_span(label: &str, change: f64) -> Span<'static> {
    let color = if change > 0.0 {
        Color::Green
    } else if change < 0.0 {
        Color::Red
    } else {
        Color::Gray
    };
    Span::styled(format!("{label} {change:+.1}%  "), Style::default().fg(color))
}

/// Pure presenter for a single day row
pub fn present_day_row(day: &DailyPostureData) -> Row<'static> {
    let date = day.date.format("%a %d %b").to_string();
    let total = day.total_readings();
    if total == 0 {
        return Row::new(vec![
            Cell::from(date),
            Cell::from("—").style(Style::default().add_modifier(Modifier::DIM)),
        ]);
    }

    Row::new(vec![
        Cell::from(date).style(Style::default().add_modifier(Modifier::BOLD)),
        Cell::from(format!("{:.0}", day.average_score))
            .style(Style::default().fg(score_color(day.average_score))),
        Cell::from(day.total_sessions.to_string()),
        Cell::from(format!("{:.0}", day.total_minutes)),
        Cell::from(format!("{:.0}%", percentage(day.good_count, total)))
            .style(Style::default().fg(Color::Green)),
        Cell::from(format!("{:.0}%", percentage(day.moderate_count, total)))
            .style(Style::default().fg(Color::Yellow)),
        Cell::from(format!("{:.0}%", percentage(day.poor_count, total)))
            .style(Style::default().fg(Color::Red)),
    ])
}

/// 24 cells, one per hour, shaded by share of poor readings
pub fn heatmap_line(heatmap: &HourlyHeatmap) -> Line<'static> {
    let shades = [
        Color::DarkGray,
        Color::Green,
        Color::Yellow,
        Color::LightRed,
        Color::Red,
    ];
    let spans = (0..24)
        .map(|hour| {
            let symbol = if heatmap.poor_percentage[hour].is_some() {
                "██"
            } else {
                "··"
            };
            let shade = shades[heatmap.intensity(hour) as usize];
            Span::styled(symbol, Style::default().fg(shade))
        })
        .collect::<Vec<_>>();
    Line::from(spans)
}

fn summary_lines(analytics: &Analytics) -> Vec<Line<'static>> {
    let report = &analytics.report;
    let streaks = &analytics.streaks;
    let bold = Style::default().add_modifier(Modifier::BOLD);

    let trend_color = match analytics.trend {
        Trend::Up => Color::Green,
        Trend::Down => Color::Red,
        Trend::Flat => Color::Gray,
    };

    let today = match &analytics.today {
        Some(d) => format!(
            "today: {:.0} ({}) over {} sessions",
            d.average_score,
            day_score_label(d.average_score),
            d.total_sessions
        ),
        None => String::from("today: no sessions yet"),
    };

    vec![
        Line::from(vec![
            Span::styled(
                format!("{:.0}", report.average_score),
                bold.fg(score_color(report.average_score)),
            ),
            Span::raw(format!(" avg score ({})  ", report.score_label())),
            Span::styled(
                format!("{} trend", analytics.trend.arrow()),
                Style::default().fg(trend_color),
            ),
        ]),
        Line::from(format!(
            "{} sessions  {:.1} h  {} of {} days tracked",
            report.total_sessions,
            report.total_hours,
            report.days_tracked,
            analytics.days.len()
        )),
        Line::from(vec![
            Span::styled(
                format!("good {:.1}%  ", report.good_percentage),
                Style::default().fg(Color::Green),
            ),
            Span::styled(
                format!("moderate {:.1}%  ", report.moderate_percentage),
                Style::default().fg(Color::Yellow),
            ),
            Span::styled(
                format!("poor {:.1}%", report.poor_percentage),
                Style::default().fg(Color::Red),
            ),
        ]),
        Line::from(format!(
            "streak {} days  longest {}  good days {}",
            streaks.current_streak, streaks.longest_streak, streaks.total_good_days
        )),
        Line::from(vec![
            Span::raw("vs previous: "),
            change_span("good", analytics.comparison.good_change),
            change_span("score", analytics.comparison.score_change),
            change_span("time", analytics.comparison.minutes_change),
        ]),
        Line::from(today),
    ]
}

/// Render the analytics screen
pub fn render_analytics(app: &App, f: &mut Frame) {
    let area = f.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Length(8), // Summary
            Constraint::Length(4), // Heatmap
            Constraint::Min(0),    // Daily table
            Constraint::Length(2), // Instructions
        ])
        .split(area);

    let Some(analytics) = &app.analytics else {
        let no_data = Paragraph::new("No history available yet. Monitor a session to collect data.")
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Gray));
        f.render_widget(no_data, area);
        return;
    };

    let title = Paragraph::new(format!(
        "Posture Analytics ({}: {} to {})",
        analytics.period.label(),
        analytics.report.start,
        analytics.report.end
    ))
    .block(Block::default().borders(Borders::ALL).title("Analytics"))
    .style(
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )
    .alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);

    let summary = Paragraph::new(summary_lines(analytics))
        .block(Block::default().borders(Borders::ALL).title("Summary"))
        .wrap(Wrap { trim: true });
    f.render_widget(summary, chunks[1]);

    let mut heatmap_lines = vec![heatmap_line(&analytics.heatmap)];
    heatmap_lines.push(Line::from(Span::styled(
        "00    04      08      12      16      20    23",
        Style::default().add_modifier(Modifier::DIM),
    )));
    let heatmap = Paragraph::new(heatmap_lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Poor posture by hour"),
    );
    f.render_widget(heatmap, chunks[2]);

    let header = Row::new(vec![
        Cell::from("Date"),
        Cell::from("Score"),
        Cell::from("Sessions"),
        Cell::from("Minutes"),
        Cell::from("Good"),
        Cell::from("Moderate"),
        Cell::from("Poor"),
    ])
    .style(
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    );

    let table_height = chunks[3].height.saturating_sub(3) as usize; // borders + header
    let rows: Vec<Row> = analytics
        .days
        .iter()
        .rev()
        .take(table_height)
        .map(present_day_row)
        .collect();

    let widths = [
        Constraint::Length(12),
        Constraint::Length(6),
        Constraint::Length(9),
        Constraint::Length(8),
        Constraint::Length(6),
        Constraint::Length(9),
        Constraint::Min(6),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title("Daily"))
        .column_spacing(2);
    f.render_widget(table, chunks[3]);

    let instructions = Paragraph::new("(1) week  (2) month  (b/esc) back  (q) quit")
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(instructions, chunks[4]);
}
