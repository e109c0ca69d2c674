use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

use crate::app::App;
use crate::pager::option_label;
use crate::types::{
    Prompt, PromptStatus, Vote, CATEGORY_OPTIONS, OUTPUT_FORMAT_OPTIONS, TASK_TYPE_OPTIONS,
};

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let Some(prompt) = app.current_prompt() else {
        let block = Block::default().borders(Borders::ALL).title("Prompt");
        let empty = Paragraph::new("This prompt is no longer in the list")
            .block(block)
            .style(Style::default().fg(Color::Gray));
        frame.render_widget(empty, area);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(6), Constraint::Min(0)])
        .split(area);

    render_header(frame, prompt, chunks[0]);
    render_body(frame, app, prompt, chunks[1]);
}

fn render_header(frame: &mut Frame, prompt: &Prompt, area: Rect) {
    let status_color = match prompt.status {
        PromptStatus::Approved => Color::Green,
        PromptStatus::Pending => Color::Yellow,
        PromptStatus::Rejected => Color::Red,
        PromptStatus::Unknown => Color::Gray,
    };
    let (up, down) = match prompt.user_vote {
        Vote::Up => (Color::Green, Color::DarkGray),
        Vote::Down => (Color::DarkGray, Color::Red),
        Vote::None => (Color::DarkGray, Color::DarkGray),
    };

    let mut tags = Vec::new();
    for (options, value) in [
        (CATEGORY_OPTIONS, &prompt.category),
        (TASK_TYPE_OPTIONS, &prompt.task_type),
        (OUTPUT_FORMAT_OPTIONS, &prompt.output_format),
    ] {
        if !value.is_empty() {
            tags.push(option_label(options, value).to_string());
        }
    }

    let lines = vec![
        Line::from(vec![
            Span::styled(
                format!("#{} ", prompt.id),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(&prompt.title, Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(
                if prompt.is_bookmarked { "  ♥ saved" } else { "" },
                Style::default().fg(Color::Magenta),
            ),
        ]),
        Line::from(vec![
            Span::styled(
                prompt.status.to_string(),
                Style::default()
                    .fg(status_color)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!(" ({}) | ", prompt.visibility)),
            Span::styled(
                format!("@{}", prompt.author),
                Style::default().fg(Color::Yellow),
            ),
            Span::raw(match prompt.created_at {
                Some(at) => format!(" | {}", at.format("%Y-%m-%d")),
                None => String::new(),
            }),
        ]),
        Line::from(vec![
            Span::styled(format!("▲ {}", prompt.like_count), Style::default().fg(up)),
            Span::raw("  "),
            Span::styled(format!("▼ {}", prompt.dislike_count), Style::default().fg(down)),
            Span::raw(format!("  score {:+}", prompt.vote_count)),
            Span::raw(format!(" | copied {} times", prompt.copy_count)),
        ]),
        Line::from(Span::styled(
            tags.join(" · "),
            Style::default().fg(Color::Blue),
        )),
    ];

    let header =
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Details"));

    frame.render_widget(header, area);
}

fn section<'a>(lines: &mut Vec<Line<'a>>, heading: &'a str, body: &'a str) {
    if body.trim().is_empty() {
        return;
    }
    lines.push(Line::from(Span::styled(
        heading,
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )));
    for l in body.lines() {
        lines.push(Line::from(l.replace('\t', "    ")));
    }
    lines.push(Line::from(""));
}

fn render_body(frame: &mut Frame, app: &App, prompt: &Prompt, area: Rect) {
    let mut lines = Vec::new();
    section(&mut lines, "Description", &prompt.description);
    section(&mut lines, "Prompt", &prompt.text);
    section(&mut lines, "Guidance", &prompt.guidance);
    section(&mut lines, "Intended use", &prompt.intended_use);

    let inner_height = area.height.saturating_sub(2) as usize;
    let max_scroll = lines.len().saturating_sub(inner_height);
    let scroll_offset = app.scroll_offset.min(max_scroll);

    frame.render_widget(Clear, area);

    let body = Paragraph::new(Text::from(lines))
        .block(Block::default().borders(Borders::ALL).title("Prompt"))
        .wrap(Wrap { trim: false })
        .scroll((scroll_offset as u16, 0));

    frame.render_widget(body, area);
}
