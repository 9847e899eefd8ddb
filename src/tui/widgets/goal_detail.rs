use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use super::{format_date, percent_bar};
use crate::models::{Goal, GoalStatus};
use crate::tui::App;

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let Some(goal) = &app.selected_goal else {
        let block = Block::default().borders(Borders::ALL).title(" Goal Detail ");
        let paragraph = Paragraph::new("No goal selected").block(block);
        f.render_widget(paragraph, area);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5), // Goal info
            Constraint::Min(0),    // Study history
        ])
        .split(area);

    draw_header(f, goal, chunks[0]);
    draw_history(f, app, chunks[1]);
}

fn draw_header(f: &mut Frame, goal: &Goal, area: Rect) {
    let (status_text, status_color) = match goal.status {
        GoalStatus::Active => ("Active", Color::Yellow),
        GoalStatus::Completed => ("Completed", Color::Green),
    };

    let text = vec![
        Line::from(vec![
            Span::styled("Progress: ", Style::default().fg(Color::Gray)),
            Span::styled(percent_bar(goal.progress, 20), Style::default().fg(Color::Green)),
            Span::styled(
                format!(" {}%", goal.progress),
                Style::default().fg(Color::Yellow),
            ),
        ]),
        Line::from(vec![
            Span::styled("Status: ", Style::default().fg(Color::Gray)),
            Span::styled(status_text, Style::default().fg(status_color)),
            Span::raw("  "),
            Span::styled("Created: ", Style::default().fg(Color::Gray)),
            Span::styled(format_date(&goal.created_at), Style::default().fg(Color::White)),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", goal.title))
        .title_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

    f.render_widget(Paragraph::new(text).block(block), area);
}

fn draw_history(f: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = if app.selected_goal_history.is_empty() {
        vec![ListItem::new(Span::styled(
            "No study sessions recorded",
            Style::default().fg(Color::DarkGray),
        ))]
    } else {
        app.selected_goal_history
            .iter()
            .map(|entry| {
                let hours = entry
                    .hours
                    .map(|h| format!("{:.1}h", h))
                    .unwrap_or_else(|| "-".to_string());
                let score = entry
                    .performance
                    .map(|p| format!("{}%", p))
                    .unwrap_or_else(|| "-".to_string());

                ListItem::new(Line::from(vec![
                    Span::styled(
                        format!("{:<12}", entry.studied_on),
                        Style::default().fg(Color::DarkGray),
                    ),
                    Span::styled(format!("{:<8}", hours), Style::default().fg(Color::White)),
                    Span::styled(score, Style::default().fg(Color::Cyan)),
                ]))
            })
            .collect()
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Study History ({}) ", app.selected_goal_history.len()))
        .title_style(Style::default().fg(Color::Magenta));

    f.render_widget(List::new(items).block(block), area);
}
