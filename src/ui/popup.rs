use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph};
use ratatui::Frame;

use super::truncate;

fn popup_block(title: &str) -> Block<'static> {
    Block::default().borders(Borders::ALL).title(Span::styled(
        format!(" {} ", title),
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    ))
}

/// Render a centered confirmation popup: [y]es / [n]o
pub fn render_confirm(frame: &mut Frame, title: &str, message: &str) {
    let area = centered_rect(50, 7, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::raw(message.to_string())),
        Line::from(""),
        Line::from(vec![
            Span::styled("[y]", Style::default().fg(Color::Green)),
            Span::raw("es  "),
            Span::styled("[n]", Style::default().fg(Color::Red)),
            Span::raw("o"),
        ]),
    ];

    let popup = Paragraph::new(lines)
        .block(popup_block(title))
        .alignment(Alignment::Center);

    frame.render_widget(popup, area);
}

/// Render a centered selectable list popup. Space toggles, Esc closes.
pub fn render_select(frame: &mut Frame, title: &str, items: &[String], selected: usize) {
    let height = (items.len() + 2).min(14) as u16; // +2 for borders
    let area = centered_rect(44, height, frame.area());
    frame.render_widget(Clear, area);

    let list_items: Vec<ListItem> = items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let style = if i == selected {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            let prefix = if i == selected { "> " } else { "  " };
            ListItem::new(Line::from(Span::styled(
                format!("{}{}", prefix, item),
                style,
            )))
        })
        .collect();

    let list = List::new(list_items).block(popup_block(title));

    let mut state = ListState::default();
    state.select(Some(selected));
    frame.render_stateful_widget(list, area, &mut state);
}

/// Star rating for a copied prompt: 1-5, Enter submits, Esc skips.
pub fn render_rating(frame: &mut Frame, prompt_title: &str, rating: u8) {
    let area = centered_rect(50, 8, frame.area());
    frame.render_widget(Clear, area);

    let stars: Vec<Span> = (1..=5u8)
        .map(|n| {
            if n <= rating {
                Span::styled("★ ", Style::default().fg(Color::Yellow))
            } else {
                Span::styled("☆ ", Style::default().fg(Color::DarkGray))
            }
        })
        .collect();

    let lines = vec![
        Line::from(""),
        Line::from(Span::raw(format!(
            "How did \"{}\" work for you?",
            truncate(prompt_title, 30)
        ))),
        Line::from(""),
        Line::from(stars),
        Line::from(""),
        Line::from(vec![
            Span::styled("1-5", Style::default().fg(Color::Cyan)),
            Span::raw(" rate  "),
            Span::styled("Enter", Style::default().fg(Color::Green)),
            Span::raw(" send  "),
            Span::styled("Esc", Style::default().fg(Color::Red)),
            Span::raw(" skip"),
        ]),
    ];

    let popup = Paragraph::new(lines)
        .block(popup_block("Rate this prompt"))
        .alignment(Alignment::Center);

    frame.render_widget(popup, area);
}

/// Create a rect of the given size centered in `outer`
pub(crate) fn centered_rect(width: u16, height: u16, outer: Rect) -> Rect {
    let popup_width = width.min(outer.width);
    let popup_height = height.min(outer.height);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length((outer.height.saturating_sub(popup_height)) / 2),
            Constraint::Length(popup_height),
            Constraint::Min(0),
        ])
        .split(outer);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length((outer.width.saturating_sub(popup_width)) / 2),
            Constraint::Length(popup_width),
            Constraint::Min(0),
        ])
        .split(vertical[1]);

    horizontal[1]
}
