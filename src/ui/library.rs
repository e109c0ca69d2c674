use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Tabs};
use ratatui::Frame;

use crate::app::App;
use crate::pager::option_label;
use crate::types::{Prompt, PromptStatus, Tab, Vote, CATEGORY_OPTIONS};

use super::truncate;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    render_tabs(frame, app, chunks[0]);
    render_filter_bar(frame, app, chunks[1]);
    render_list(frame, app, chunks[2]);
    render_footer(frame, app, chunks[3]);
}

fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let mut tabs = Tab::cycle(app.is_admin());
    if matches!(app.feed.tab(), Tab::Author(_)) {
        tabs.push(app.feed.tab().clone());
    }
    let selected = tabs.iter().position(|t| t == app.feed.tab()).unwrap_or(0);
    let titles: Vec<String> = tabs.iter().map(|t| t.to_string()).collect();

    let widget = Tabs::new(titles)
        .block(Block::default().borders(Borders::ALL).title(Span::styled(
            " Prompt Library ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )))
        .select(selected)
        .style(Style::default().fg(Color::Gray))
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

    frame.render_widget(widget, area);
}

fn render_filter_bar(frame: &mut Frame, app: &App, area: Rect) {
    let parts = app.feed.filter().describe();
    let line = if parts.is_empty() {
        Line::from(Span::styled(
            " no filters",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Line::from(vec![
            Span::styled(" filters: ", Style::default().fg(Color::Gray)),
            Span::styled(parts.join(" | "), Style::default().fg(Color::Magenta)),
        ])
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn status_color(status: PromptStatus) -> Color {
    match status {
        PromptStatus::Approved => Color::Green,
        PromptStatus::Pending => Color::Yellow,
        PromptStatus::Rejected => Color::Red,
        PromptStatus::Unknown => Color::Gray,
    }
}

fn row<'a>(
    prompt: &'a Prompt,
    selected: bool,
    bookmarked: bool,
    show_status: bool,
    flex: usize,
) -> ListItem<'a> {
    let style = if selected {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };

    let vote_color = match prompt.user_vote {
        Vote::Up => Color::Green,
        Vote::Down => Color::Red,
        Vote::None => Color::DarkGray,
    };

    let mut spans = vec![
        Span::styled(
            if bookmarked { "♥ " } else { "  " },
            Style::default().fg(Color::Magenta),
        ),
        Span::styled(format!("{:<36}", truncate(&prompt.title, 36)), style),
        Span::raw(" "),
        Span::styled(
            format!("{:<14}", truncate(&format!("@{}", prompt.author), 14)),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(
            format!("{:>+4}", prompt.vote_count),
            Style::default().fg(vote_color),
        ),
        Span::styled(
            format!(" ⧉{:<4}", prompt.copy_count),
            Style::default().fg(Color::DarkGray),
        ),
    ];

    if show_status {
        spans.push(Span::styled(
            format!("{:<9}", prompt.status.to_string()),
            Style::default().fg(status_color(prompt.status)),
        ));
    } else if !prompt.category.is_empty() {
        spans.push(Span::styled(
            format!("{:<9}", truncate(option_label(CATEGORY_OPTIONS, &prompt.category), 9)),
            Style::default().fg(Color::Blue),
        ));
    }

    spans.push(Span::raw(" "));
    spans.push(Span::styled(
        truncate(&prompt.summary().replace('\n', " "), flex),
        Style::default().fg(Color::Gray),
    ));

    ListItem::new(Line::from(spans))
}

fn render_list(frame: &mut Frame, app: &App, area: Rect) {
    let items = app.page_items();
    let projected = app.feed.projected().len();
    let block = Block::default().borders(Borders::ALL).title(format!(
        " {} ({} shown, {} loaded) ",
        app.feed.tab(),
        projected,
        app.feed.cache().len()
    ));

    if items.is_empty() {
        let message = if app.is_loading() {
            "Loading prompts..."
        } else if !app.feed.filter().is_empty() && !app.feed.cache().is_empty() {
            "No prompts match the current filters"
        } else {
            "No prompts found"
        };
        let empty = Paragraph::new(message)
            .block(block)
            .style(Style::default().fg(Color::Gray));
        frame.render_widget(empty, area);
        return;
    }

    let w = area.width.saturating_sub(2) as usize;
    let fixed = 2 + 36 + 1 + 14 + 4 + 6 + 9 + 1;
    let flex = w.saturating_sub(fixed).max(10);
    let show_status = !matches!(app.feed.tab(), Tab::Browse | Tab::Author(_));

    let rows: Vec<ListItem> = items
        .iter()
        .enumerate()
        .map(|(i, prompt)| {
            let bookmarked = app.feed.bookmarks().contains(prompt.id);
            row(prompt, i == app.selected, bookmarked, show_status, flex)
        })
        .collect();

    let list = List::new(rows)
        .block(block)
        .highlight_style(Style::default().bg(Color::DarkGray));

    let mut state = ListState::default();
    state.select(Some(app.selected));

    frame.render_stateful_widget(list, area, &mut state);
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let total = app.feed.total_pages();
    if total == 0 {
        return;
    }
    let current = app.feed.pagination().current();
    let more = if app.feed.cache().has_more() { "+" } else { "" };

    let mut spans = vec![Span::styled(
        format!(" Page {} of {}{}  ", current, total, more),
        Style::default().fg(Color::Gray),
    )];
    let window = app.feed.page_window();
    if *window.start() > 1 {
        spans.push(Span::styled("« ", Style::default().fg(Color::DarkGray)));
    }
    let last = *window.end();
    for page in window {
        let style = if page == current {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        spans.push(Span::styled(format!(" {} ", page), style));
    }
    if last < total {
        spans.push(Span::styled(" »", Style::default().fg(Color::DarkGray)));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
