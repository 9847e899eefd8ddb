use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use super::{format_date, percent_bar, truncate};
use crate::tui::App;

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let locale = app.snapshot.user.locale;
    let title = if let Some(filter) = &app.filter {
        format!(" Courses (filter: {}) ", filter)
    } else {
        " Courses ".to_string()
    };

    let items: Vec<ListItem> = app
        .courses
        .items
        .iter()
        .map(|c| {
            let (status_text, status_color) = if c.enrollment.completed {
                ("Completed", Color::Green)
            } else if c.enrollment.percent > 0 {
                ("In Progress", Color::Yellow)
            } else {
                ("Not Started", Color::DarkGray)
            };
            let last = c
                .enrollment
                .last_accessed
                .as_deref()
                .map(format_date)
                .unwrap_or_else(|| "-".to_string());

            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:<34}", truncate(c.course.title_for(locale), 32)),
                    Style::default().fg(Color::White),
                ),
                Span::styled(
                    percent_bar(c.enrollment.percent, 10),
                    Style::default().fg(Color::Green),
                ),
                Span::styled(
                    format!(" {:>3}%  ", c.enrollment.percent),
                    Style::default().fg(Color::Yellow),
                ),
                Span::styled(
                    format!("{:<13}", status_text),
                    Style::default().fg(status_color),
                ),
                Span::styled(last, Style::default().fg(Color::DarkGray)),
            ]))
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .title_style(Style::default().fg(Color::Cyan));

    let header_style = Style::default()
        .fg(Color::DarkGray)
        .add_modifier(Modifier::BOLD);
    let header = Line::from(vec![
        Span::styled(format!("{:<34}", "Course"), header_style),
        Span::styled(format!("{:<17}", "Progress"), header_style),
        Span::styled(format!("{:<13}", "Status"), header_style),
        Span::styled("Last", header_style),
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
    state.select(app.courses.selected);

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
