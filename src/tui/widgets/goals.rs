use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use super::{format_date, percent_bar, truncate};
use crate::models::GoalStatus;
use crate::tui::App;

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .goals
        .items
        .iter()
        .map(|goal| {
            let (status_text, status_color) = match goal.status {
                GoalStatus::Active => ("Active", Color::Yellow),
                GoalStatus::Completed => ("Completed", Color::Green),
            };

            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:<36}", truncate(&goal.title, 34)),
                    Style::default().fg(Color::White),
                ),
                Span::styled(percent_bar(goal.progress, 10), Style::default().fg(Color::Green)),
                Span::styled(
                    format!(" {:>3}%  ", goal.progress),
                    Style::default().fg(Color::Yellow),
                ),
                Span::styled(
                    format!("{:<11}", status_text),
                    Style::default().fg(status_color),
                ),
                Span::styled(
                    format_date(&goal.updated_at),
                    Style::default().fg(Color::DarkGray),
                ),
            ]))
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Goals ")
        .title_style(Style::default().fg(Color::Cyan));

    let header_style = Style::default()
        .fg(Color::DarkGray)
        .add_modifier(Modifier::BOLD);
    let header = Line::from(vec![
        Span::styled(format!("{:<36}", "Goal"), header_style),
        Span::styled(format!("{:<17}", "Progress"), header_style),
        Span::styled(format!("{:<11}", "Status"), header_style),
        Span::styled("Updated", header_style),
    ]);

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(app.goals.selected);

    let header_area = Rect {
        x: area.x + 1,
        y: area.y + 1,
        width: area.width.saturating_sub(2),
        height: 1,
    };
    f.render_widget(Paragraph::new(header), header_area);

    let list_area = Rect {
        x: area.x,
        y: area.y + 1,
        width: area.width,
        height: area.height.saturating_sub(1),
    };

    f.render_stateful_widget(list, list_area, &mut state);
}
