mod detail;
mod library;
mod popup;

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::action::{ConfirmAction, FilterKind, Popup};
use crate::app::{App, Screen};
use crate::feed::prefetch::PrefetchState;
use crate::feed::LoadStatus;

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_header(frame, app, chunks[0]);

    match app.screen {
        Screen::Library => library::render(frame, app, chunks[1]),
        Screen::Detail => detail::render(frame, app, chunks[1]),
    }

    render_status_bar(frame, app, chunks[2]);
    render_popup(frame, app);
}

/// Shorten `s` to at most `max` characters, marking the cut with "...".
pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let keep = max.saturating_sub(3);
    let mut out: String = s.chars().take(keep).collect();
    out.push_str("...");
    out
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let title = match app.screen {
        Screen::Library => format!("promptdeck - {}", app.feed.tab()),
        Screen::Detail => match app.current_prompt() {
            Some(prompt) => format!("promptdeck - {}", truncate(&prompt.title, 60)),
            None => "promptdeck - Prompt".to_string(),
        },
    };

    let mut spans = vec![Span::styled(
        title,
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )];
    if let Some(viewer) = app.feed.viewer() {
        let role = if viewer.is_admin { " (admin)" } else { "" };
        spans.push(Span::styled(
            format!("  @{}{}", viewer.username, role),
            Style::default().fg(Color::Gray),
        ));
    }

    let header = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let status = if let Some(error) = &app.error {
        Line::from(vec![Span::styled(
            format!("Error: {}", error),
            Style::default().fg(Color::Red),
        )])
    } else if app.search_mode {
        Line::from(vec![
            Span::styled("/", Style::default().fg(Color::Yellow)),
            Span::raw(app.search_input.clone()),
            Span::styled("_", Style::default().fg(Color::Gray)),
        ])
    } else if let LoadStatus::Failed(msg) = app.feed.status() {
        Line::from(vec![Span::styled(
            format!("Load failed: {} (R: retry)", msg),
            Style::default().fg(Color::Red),
        )])
    } else if app.is_loading() {
        Line::from(vec![Span::styled(
            "Loading...",
            Style::default().fg(Color::Yellow),
        )])
    } else if let Some(notice) = &app.notice {
        Line::from(vec![Span::styled(
            notice.clone(),
            Style::default().fg(Color::Green),
        )])
    } else {
        let help = match app.screen {
            Screen::Library => concat!(
                "h/l: tabs | j/k: nav | n/p: page | /: search | c/t/o: filters | ",
                "m/b/x: mine/saved/clear | Enter: open | +/-: vote | B: save | y: copy | q: quit",
            ),
            Screen::Detail => concat!(
                "j/k: scroll | +/-: vote | B: save | y: copy | v: pager | h: history | ",
                "e: edit | u: author | q: back",
            ),
        };
        let mut spans = vec![Span::styled(help, Style::default().fg(Color::Gray))];
        if app.feed.is_prefetching() {
            spans.insert(
                0,
                Span::styled("fetching more... ", Style::default().fg(Color::DarkGray)),
            );
        } else if app.feed.prefetch_state() == PrefetchState::Halted {
            spans.insert(
                0,
                Span::styled("read-ahead stopped ", Style::default().fg(Color::DarkGray)),
            );
        }
        Line::from(spans)
    };

    let status_bar = Paragraph::new(status).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(status_bar, area);
}

fn render_popup(frame: &mut Frame, app: &App) {
    let Some(popup) = &app.popup else {
        return;
    };
    match popup {
        Popup::Confirm(confirm) => {
            let (title, verb, id) = match confirm {
                ConfirmAction::Approve(id) => ("Approve", "Approve", *id),
                ConfirmAction::Reject(id) => ("Reject", "Reject", *id),
            };
            let name = app
                .feed
                .prompt(id)
                .map(|p| truncate(&p.title, 30))
                .unwrap_or_else(|| format!("#{}", id));
            popup::render_confirm(frame, title, &format!("{} \"{}\"?", verb, name));
        }
        Popup::Filter { kind, selected } => {
            let filter = app.feed.filter();
            let chosen = match kind {
                FilterKind::Category => &filter.categories,
                FilterKind::TaskType => &filter.task_types,
                FilterKind::OutputFormat => &filter.output_formats,
            };
            let items: Vec<String> = kind
                .options()
                .iter()
                .map(|(value, label)| {
                    let mark = if chosen.contains(*value) { "[x]" } else { "[ ]" };
                    format!("{} {}", mark, label)
                })
                .collect();
            popup::render_select(frame, kind.title(), &items, *selected);
        }
        Popup::Rating { feedback, rating } => {
            popup::render_rating(frame, &feedback.prompt_title, *rating);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_is_char_safe() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 6), "abc...");
        assert_eq!(truncate("ünïcødé text", 7), "ünïc...");
    }
}
