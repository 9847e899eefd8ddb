use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Frame,
};

use super::{format_date, percent_bar, truncate};
use crate::dashboard::EnrolledCourse;
use crate::models::Locale;
use crate::tui::App;

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let Some(enrolled) = &app.selected_course else {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Course Detail ");
        let paragraph = Paragraph::new("No course selected").block(block);
        f.render_widget(paragraph, area);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6), // Header + progress
            Constraint::Min(0),    // Modules and lessons
        ])
        .split(area);

    let locale = app.snapshot.user.locale;
    draw_header(f, enrolled, locale, chunks[0]);
    draw_lessons(f, app, chunks[1]);
}

fn draw_header(f: &mut Frame, enrolled: &EnrolledCourse, locale: Locale, area: Rect) {
    let description = enrolled
        .course
        .description
        .as_deref()
        .unwrap_or("No description");
    let last = enrolled
        .enrollment
        .last_accessed
        .as_deref()
        .map(format_date)
        .unwrap_or_else(|| "Never".to_string());

    let text = vec![
        Line::from(vec![
            Span::styled("Description: ", Style::default().fg(Color::Gray)),
            Span::styled(description, Style::default().fg(Color::White)),
        ]),
        Line::from(vec![
            Span::styled("Progress: ", Style::default().fg(Color::Gray)),
            Span::styled(
                percent_bar(enrolled.enrollment.percent, 20),
                Style::default().fg(Color::Green),
            ),
            Span::styled(
                format!(" {}%", enrolled.enrollment.percent),
                Style::default().fg(Color::Yellow),
            ),
        ]),
        Line::from(vec![
            Span::styled("Last accessed: ", Style::default().fg(Color::Gray)),
            Span::styled(last, Style::default().fg(Color::White)),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", enrolled.course.title_for(locale)))
        .title_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

    let paragraph = Paragraph::new(text).block(block).wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}

fn draw_lessons(f: &mut Frame, app: &App, area: Rect) {
    let mut items: Vec<ListItem> = Vec::new();

    for (module, lessons) in &app.selected_course_lessons {
        items.push(ListItem::new(Line::from(Span::styled(
            module.title.clone(),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ))));

        if lessons.is_empty() {
            items.push(ListItem::new(Span::styled(
                "    (no lessons)",
                Style::default().fg(Color::DarkGray),
            )));
        }

        for (lesson, progress) in lessons {
            let (marker, color, percent) = match progress {
                Some(p) if p.completed => ("✓", Color::Green, p.percent),
                Some(p) => ("…", Color::Yellow, p.percent),
                None => (" ", Color::DarkGray, 0),
            };

            items.push(ListItem::new(Line::from(vec![
                Span::styled(format!("  {} ", marker), Style::default().fg(color)),
                Span::styled(
                    format!("{:<36}", truncate(&lesson.title, 34)),
                    Style::default().fg(Color::White),
                ),
                Span::styled(format!("{:>3}%", percent), Style::default().fg(color)),
            ])));
        }
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Modules ")
        .title_style(Style::default().fg(Color::Cyan));

    f.render_widget(List::new(items).block(block), area);
}
