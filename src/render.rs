use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::markdown::render_markdown;
use crate::nav::{NavigationState, ViewMode};
use crate::tabnews::Comment;

pub const HEADER_LEGEND: &str =
    "TabNews TUI - ↑↓: Navigate | ←→: Pages | Enter: Select | Esc: Back | C: Comments | Q: Quit";

const COLOR_ACCENT: Color = Color::Rgb(137, 180, 250);
const COLOR_MUTED: Color = Color::Rgb(166, 173, 200);
const COLOR_ERROR: Color = Color::Rgb(243, 139, 168);
const COMMENT_DEPTH_COLORS: [Color; 4] = [
    Color::Rgb(250, 179, 135),
    Color::Rgb(166, 227, 161),
    Color::Rgb(203, 166, 247),
    Color::Rgb(137, 220, 235),
];

pub fn header_line() -> Line<'static> {
    Line::from(Span::styled(
        HEADER_LEGEND,
        Style::default().add_modifier(Modifier::REVERSED),
    ))
}

pub fn status_line(state: &NavigationState) -> Line<'static> {
    let scope = match &state.owner {
        Some(owner) => format!("@{owner}"),
        None => "all".to_string(),
    };
    let mut text = match state.view_mode {
        ViewMode::Feed => format!(
            "Page {} · {} · {} · {} items",
            state.page,
            state.strategy,
            scope,
            state.items.len()
        ),
        ViewMode::Content => "Reading · c: comments · Esc: back".to_string(),
        ViewMode::Comments => format!("{} comments · Esc: back", count_comments(&state.comments)),
    };
    if state.is_loading() {
        text.push_str(" · Loading…");
    }
    Line::from(Span::styled(text, Style::default().fg(COLOR_MUTED)))
}

/// Renders the body pane for the current view. Deterministic for a given
/// state; an error indicator, when present, is always the first line.
pub fn render(state: &NavigationState) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    if let Some(err) = &state.error {
        lines.push(Line::from(Span::styled(
            format!("Error: {err}"),
            Style::default().fg(COLOR_ERROR).add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::default());
    }

    match state.view_mode {
        ViewMode::Feed => render_feed(state, &mut lines),
        ViewMode::Content => render_content(state, &mut lines),
        ViewMode::Comments => render_comments(&state.comments, &mut lines),
    }
    lines
}

fn render_feed(state: &NavigationState, lines: &mut Vec<Line<'static>>) {
    if state.items.is_empty() {
        let message = if state.is_loading() {
            "Loading contents…".to_string()
        } else {
            format!("No contents on page {}.", state.page)
        };
        lines.push(Line::from(Span::styled(
            message,
            Style::default().fg(COLOR_MUTED),
        )));
        return;
    }

    for (index, item) in state.items.iter().enumerate() {
        let selected = index == state.selected_index;
        let marker = if selected { "→" } else { " " };
        let title_style = if selected {
            Style::default()
                .fg(COLOR_ACCENT)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        lines.push(Line::from(vec![
            Span::raw(format!("{marker} ")),
            Span::styled(item.title.clone(), title_style),
            Span::styled(
                format!(
                    "  {} · {} tabcoins · {} comments",
                    item.owner_username, item.tabcoins, item.children_deep_count
                ),
                Style::default().fg(COLOR_MUTED),
            ),
        ]));
    }
}

fn render_content(state: &NavigationState, lines: &mut Vec<Line<'static>>) {
    let Some(detail) = &state.current_detail else {
        return;
    };
    lines.push(Line::from(Span::styled(
        detail.title.clone(),
        Style::default()
            .fg(COLOR_ACCENT)
            .add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(Span::styled(
        format!("by {}", detail.owner_username),
        Style::default().fg(COLOR_MUTED),
    )));
    lines.push(Line::default());
    lines.extend(render_markdown(&detail.body));
}

fn render_comments(comments: &[Comment], lines: &mut Vec<Line<'static>>) {
    if comments.is_empty() {
        lines.push(Line::from(Span::styled(
            "No comments yet.",
            Style::default().fg(COLOR_MUTED),
        )));
        return;
    }
    for comment in comments {
        push_comment(comment, 0, lines);
    }
    while lines.last().is_some_and(|line| line.spans.is_empty()) {
        lines.pop();
    }
}

fn push_comment(comment: &Comment, depth: usize, lines: &mut Vec<Line<'static>>) {
    let indent = "  ".repeat(depth);
    let color = COMMENT_DEPTH_COLORS[depth % COMMENT_DEPTH_COLORS.len()];
    lines.push(Line::from(vec![
        Span::raw(indent.clone()),
        Span::styled(
            format!("┌ {}", comment.owner_username),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ),
    ]));
    for body_line in render_markdown(&comment.body) {
        let mut spans = vec![
            Span::raw(indent.clone()),
            Span::styled("│ ", Style::default().fg(color)),
        ];
        spans.extend(body_line.spans);
        lines.push(Line::from(spans));
    }
    lines.push(Line::default());
    for child in &comment.children {
        push_comment(child, depth + 1, lines);
    }
}

fn count_comments(comments: &[Comment]) -> usize {
    comments
        .iter()
        .map(|comment| 1 + count_comments(&comment.children))
        .sum()
}
