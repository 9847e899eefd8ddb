use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use super::{percent_bar, truncate};
use crate::models::{GoalStatus, XP_PER_LEVEL};
use crate::tui::App;

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(8), // Level + summary row
            Constraint::Min(0),    // Course progress
        ])
        .split(area);

    let top_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[0]);

    draw_level(f, app, top_chunks[0]);
    draw_summary(f, app, top_chunks[1]);
    draw_course_progress(f, app, chunks[1]);
}

fn draw_level(f: &mut Frame, app: &App, area: Rect) {
    let level = &app.snapshot.level;
    let into_level = (XP_PER_LEVEL - level.xp_to_next_level()).clamp(0, XP_PER_LEVEL);
    let level_percent = (into_level * 100 / XP_PER_LEVEL) as i32;

    let text = vec![
        Line::from(vec![
            Span::styled("Level: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{}", level.level),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            Span::styled("XP: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{}", level.total_xp),
                Style::default().fg(Color::White),
            ),
        ]),
        Line::from(vec![
            Span::styled(percent_bar(level_percent, 20), Style::default().fg(Color::Green)),
            Span::styled(
                format!(" {} to next", level.xp_to_next_level()),
                Style::default().fg(Color::DarkGray),
            ),
        ]),
        Line::from(vec![
            Span::styled("Streak: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{} days", level.streak_days),
                Style::default().fg(if level.streak_days > 0 {
                    Color::Magenta
                } else {
                    Color::White
                }),
            ),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", app.snapshot.user.name))
        .title_style(Style::default().fg(Color::Yellow));

    f.render_widget(Paragraph::new(text).block(block), area);
}

fn draw_summary(f: &mut Frame, app: &App, area: Rect) {
    let summary = &app.snapshot.summary;

    let text = vec![
        Line::from(vec![
            Span::styled("Courses: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{} ({} completed)", summary.total_courses, summary.completed_courses),
                Style::default().fg(Color::White),
            ),
        ]),
        Line::from(vec![
            Span::styled("Goals: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{} active", summary.active_goals),
                Style::default().fg(Color::Yellow),
            ),
            Span::raw(", "),
            Span::styled(
                format!("{} completed", summary.completed_goals),
                Style::default().fg(Color::Green),
            ),
        ]),
        Line::from(vec![
            Span::styled("Programs: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{}", summary.total_programs),
                Style::default().fg(Color::White),
            ),
        ]),
        Line::from(vec![
            Span::styled("Avg Progress: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{:.1}%", summary.average_progress),
                Style::default().fg(Color::Cyan),
            ),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Summary ")
        .title_style(Style::default().fg(Color::Cyan));

    f.render_widget(Paragraph::new(text).block(block), area);
}

fn draw_course_progress(f: &mut Frame, app: &App, area: Rect) {
    let locale = app.snapshot.user.locale;
    let mut items: Vec<ListItem> = app
        .snapshot
        .courses
        .iter()
        .map(|c| {
            let color = if c.enrollment.completed {
                Color::Green
            } else {
                Color::White
            };
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:<32}", truncate(c.course.title_for(locale), 30)),
                    Style::default().fg(color),
                ),
                Span::styled(
                    percent_bar(c.enrollment.percent, 10),
                    Style::default().fg(Color::Green),
                ),
                Span::styled(
                    format!(" {:>3}%", c.enrollment.percent),
                    Style::default().fg(Color::Yellow),
                ),
            ]))
        })
        .collect();

    items.extend(
        app.snapshot
            .goals
            .iter()
            .filter(|g| g.status == GoalStatus::Active)
            .map(|g| {
                ListItem::new(Line::from(vec![
                    Span::styled(
                        format!("{:<32}", truncate(&format!("◎ {}", g.title), 30)),
                        Style::default().fg(Color::Magenta),
                    ),
                    Span::styled(percent_bar(g.progress, 10), Style::default().fg(Color::Magenta)),
                    Span::styled(
                        format!(" {:>3}%", g.progress),
                        Style::default().fg(Color::Yellow),
                    ),
                ]))
            }),
    );

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Progress ")
        .title_style(Style::default().fg(Color::Magenta));

    f.render_widget(List::new(items).block(block), area);
}
