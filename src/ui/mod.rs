// UI module for rendering the TUI.
// Pane bar, the two strategy panes side by side, status bar and help.

mod list;
mod tabs;

use ratatui::{prelude::*, widgets::*};

use crate::api::PostsApi;
use crate::app::{App, Pane};

/// Main draw function that renders the entire UI.
pub fn draw<A: PostsApi>(frame: &mut Frame, app: &mut App<A>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Pane bar
            Constraint::Min(1),    // Panes
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    tabs::draw_tabs(frame, app, chunks[0]);

    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[1]);

    list::render_pane(
        frame,
        &app.uncached,
        &mut app.uncached_cursor,
        app.focus == Pane::Uncached,
        panes[0],
    );
    list::render_pane(
        frame,
        &app.cached,
        &mut app.cached_cursor,
        app.focus == Pane::Cached,
        panes[1],
    );

    draw_status_bar(frame, app, chunks[2]);

    // Help overlay (rendered last, on top of everything)
    if app.show_help {
        draw_help_overlay(frame);
    }
}

/// Draw the status bar with key hints.
fn draw_status_bar<A: PostsApi>(frame: &mut Frame, app: &App<A>, area: Rect) {
    let mut hints = vec![
        Span::raw(" ↑↓ "),
        Span::styled("Navigate", Style::default().fg(Color::DarkGray)),
        Span::raw("  ↵ "),
        Span::styled("Open/close", Style::default().fg(Color::DarkGray)),
        Span::raw("  Tab "),
        Span::styled("Switch", Style::default().fg(Color::DarkGray)),
        Span::raw("  ? "),
        Span::styled("Help", Style::default().fg(Color::DarkGray)),
        Span::raw("  q "),
        Span::styled("Quit", Style::default().fg(Color::DarkGray)),
    ];

    if app.focus == Pane::Cached {
        hints.push(Span::styled(
            "  hover prefetches",
            Style::default().fg(Color::Green),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(hints)), area);
}

/// Draw the help overlay.
fn draw_help_overlay(frame: &mut Frame) {
    let area = frame.area();

    // Create a centered popup
    let popup_width = 55.min(area.width);
    let popup_height = 14.min(area.height);
    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::Cyan));
    let help_text = vec![
        Line::from(vec![Span::styled(
            "Keyboard Shortcuts",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from(""),
        Line::from(vec![key("  ↑/↓ or j/k    "), Span::raw("Move between posts")]),
        Line::from(vec![key("  Enter/Space   "), Span::raw("Open / close a post")]),
        Line::from(vec![key("  Tab / ←/→     "), Span::raw("Switch pane")]),
        Line::from(vec![key("  ?             "), Span::raw("Show/hide this help")]),
        Line::from(vec![key("  q / Esc       "), Span::raw("Quit")]),
        Line::from(""),
        Line::from(Span::styled(
            "Moving onto a post in the cached pane prefetches it.",
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("Press ", Style::default().fg(Color::DarkGray)),
            Span::styled("Esc", Style::default().fg(Color::Yellow)),
            Span::styled(" or ", Style::default().fg(Color::DarkGray)),
            Span::styled("?", Style::default().fg(Color::Yellow)),
            Span::styled(" to close", Style::default().fg(Color::DarkGray)),
        ]),
    ];

    let help_paragraph = Paragraph::new(help_text).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Help ")
            .title_style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
    );

    frame.render_widget(help_paragraph, popup_area);
}
