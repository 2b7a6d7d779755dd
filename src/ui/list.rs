// Post list rendering.
// One pane per strategy: posts, the expanded detail and the load-time panel.

use ratatui::{prelude::*, widgets::*};

use crate::api::{Comment, PostDetails};
use crate::state::{DetailStatus, ListCursor, LoadingState, PostStrategy};

const BODY_PREVIEW_CHARS: usize = 100;
const COMMENT_PREVIEW_CHARS: usize = 50;

/// First `max` characters of `text` followed by an ellipsis.
pub fn preview(text: &str, max: usize) -> String {
    let head: String = text.chars().take(max).collect();
    format!("{}...", head)
}

/// Comment line as shown under an open post.
pub fn comment_preview(comment: &Comment) -> String {
    format!(
        "{}: {}",
        comment.email,
        preview(&comment.body, COMMENT_PREVIEW_CHARS)
    )
}

/// Render a loading indicator.
pub fn render_loading(frame: &mut Frame, area: Rect, message: &str) {
    let text = Paragraph::new(format!("⏳ {}...", message))
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Yellow));
    frame.render_widget(text, area);
}

/// Render an error message.
pub fn render_error(frame: &mut Frame, area: Rect, error: &str) {
    let text = Paragraph::new(format!("❌ {}", error))
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Red));
    frame.render_widget(text, area);
}

/// Render an empty state message.
pub fn render_empty(frame: &mut Frame, area: Rect, message: &str) {
    let text = Paragraph::new(message)
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(text, area);
}

/// Lines shown beneath the open post.
pub fn detail_lines(details: Option<&PostDetails>, status: &DetailStatus) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    for error in &status.errors {
        lines.push(Line::styled(
            format!("  ❌ {}", error),
            Style::default().fg(Color::Red),
        ));
    }

    let Some(details) = details else {
        if status.loading {
            lines.push(Line::styled(
                "  ⏳ Loading...",
                Style::default().fg(Color::Yellow),
            ));
        }
        return lines;
    };

    lines.push(Line::from(vec![
        Span::styled("  Author: ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            details.user.name.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(" <{}>", details.user.email)),
    ]));

    if !details.comments.is_empty() {
        lines.push(Line::styled(
            "  Comments:",
            Style::default().add_modifier(Modifier::BOLD),
        ));
        for comment in &details.comments {
            lines.push(Line::raw(format!("    {}", comment_preview(comment))));
        }
    }

    if !details.albums.is_empty() {
        let titles: Vec<&str> = details.albums.iter().map(|a| a.title.as_str()).collect();
        lines.push(Line::from(vec![
            Span::styled(
                format!("  Albums ({}): ", details.albums.len()),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw(titles.join(", ")),
        ]));
    }

    if !details.photos.is_empty() {
        lines.push(Line::styled(
            format!("  Photos ({}):", details.photos.len()),
            Style::default().add_modifier(Modifier::BOLD),
        ));
        for photo in &details.photos {
            lines.push(Line::styled(
                format!("    {}", photo.title),
                Style::default().fg(Color::Cyan),
            ));
        }
    }

    if status.loading {
        lines.push(Line::styled(
            "  ⏳ Loading...",
            Style::default().fg(Color::Yellow),
        ));
    }

    lines
}

/// Render one strategy's pane: post list on top, metrics at the bottom.
pub fn render_pane(
    frame: &mut Frame,
    strategy: &dyn PostStrategy,
    cursor: &mut ListCursor,
    focused: bool,
    area: Rect,
) {
    let border_color = if focused { Color::Yellow } else { Color::DarkGray };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(format!(" {} ", strategy.title()));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),    // Posts
            Constraint::Length(4), // Metrics
        ])
        .split(inner);

    match strategy.posts() {
        LoadingState::Idle => render_empty(frame, chunks[0], "Not loaded"),
        LoadingState::Loading => render_loading(frame, chunks[0], "Loading posts"),
        LoadingState::Error(e) => render_error(frame, chunks[0], e),
        LoadingState::Loaded(posts) if posts.is_empty() => {
            render_empty(frame, chunks[0], "No posts found")
        }
        LoadingState::Loaded(posts) => {
            let selected = strategy.selected_post();
            let details = strategy.details();
            let status = strategy.detail_status();

            let items: Vec<ListItem> = posts
                .iter()
                .map(|post| {
                    let mut lines = vec![
                        Line::styled(
                            post.title.clone(),
                            Style::default().add_modifier(Modifier::BOLD),
                        ),
                        Line::styled(
                            preview(&post.body, BODY_PREVIEW_CHARS),
                            Style::default().fg(Color::Gray),
                        ),
                    ];
                    if selected == Some(post.id) {
                        lines.extend(detail_lines(details.as_ref(), &status));
                    }
                    lines.push(Line::raw(""));
                    ListItem::new(lines)
                })
                .collect();

            let list_widget = List::new(items)
                .highlight_style(Style::default().bg(Color::DarkGray))
                .highlight_symbol("> ");

            frame.render_stateful_widget(list_widget, chunks[0], &mut cursor.list_state);
        }
    }

    render_metrics(frame, strategy, chunks[1]);
}

/// Render the load-time panel.
fn render_metrics(frame: &mut Frame, strategy: &dyn PostStrategy, area: Rect) {
    let color = if strategy.is_optimized() {
        Color::Green
    } else {
        Color::Red
    };

    let mut lines = vec![Line::raw(format!(
        "Load Time: {:.2}ms",
        strategy.timer().last_ms()
    ))];
    if strategy.detail_status().loading {
        lines.push(Line::styled("Loading...", Style::default().fg(Color::Blue)));
    }

    let panel = Paragraph::new(lines).style(Style::default().fg(color)).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(Style::default().fg(color))
            .title(format!(" {}: ", strategy.metrics_title())),
    );
    frame.render_widget(panel, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::{MockApi, comment, post};
    use crate::config::Config;
    use crate::error::Resource;
    use crate::state::UncachedPosts;
    use ratatui::backend::TestBackend;
    use ratatui::buffer::Buffer;
    use std::sync::Arc;

    fn buffer_text(buffer: &Buffer) -> String {
        let width = buffer.area.width as usize;
        buffer
            .content()
            .chunks(width)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn render(strategy: &dyn PostStrategy, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        let mut cursor = ListCursor::new();
        terminal
            .draw(|frame| render_pane(frame, strategy, &mut cursor, true, frame.area()))
            .unwrap();
        buffer_text(terminal.backend().buffer())
    }

    #[test]
    fn test_preview_truncates_by_chars() {
        assert_eq!(preview("short", 50), "short...");
        let long = "é".repeat(80);
        let p = preview(&long, 50);
        assert_eq!(p.chars().count(), 53);
    }

    #[test]
    fn test_detail_lines_loading_without_details() {
        let status = DetailStatus {
            loading: true,
            errors: vec![],
        };
        let lines = detail_lines(None, &status);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].to_string().contains("Loading"));
    }

    #[test]
    fn test_detail_lines_show_each_error() {
        let status = DetailStatus {
            loading: false,
            errors: vec!["Error loading comments".to_string()],
        };
        let lines = detail_lines(None, &status);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].to_string().contains("Error loading comments"));
    }

    #[tokio::test]
    async fn test_selected_post_shows_truncated_comments() {
        let long_body = "x".repeat(120);
        let api = MockApi::seeded()
            .with_posts((1..=5).map(|id| post(id, 1)).collect())
            .with_comments(
                1,
                vec![comment(1, 1, &long_body), comment(2, 1, &long_body)],
            );
        let mut posts = UncachedPosts::new(Arc::new(api), &Config::default());
        posts.mount();
        posts.next_update().await;
        posts.toggle_post(1);
        posts.next_update().await;

        let details = posts.details().unwrap();
        let comment_lines: Vec<String> = detail_lines(Some(&details), &posts.detail_status())
            .iter()
            .map(|l| l.to_string())
            .filter(|l| l.contains("@example.com:"))
            .collect();

        assert_eq!(comment_lines.len(), 2);
        let expected = format!("{}...", "x".repeat(50));
        for line in &comment_lines {
            assert!(line.ends_with(&expected));
            assert!(!line.contains(&"x".repeat(51)));
        }

        let screen = render(&posts, 120, 40);
        assert_eq!(screen.matches(&expected).count(), 2);
    }

    #[tokio::test]
    async fn test_posts_error_renders_once_with_no_items() {
        let api = MockApi::seeded().failing(Resource::Posts);
        let mut posts = UncachedPosts::new(Arc::new(api), &Config::default());
        posts.mount();
        posts.next_update().await;

        let screen = render(&posts, 80, 20);
        assert_eq!(screen.matches("Error loading posts").count(), 1);
        assert!(!screen.contains("Post 1"));
    }

    #[tokio::test]
    async fn test_metrics_panel_heading() {
        let posts = UncachedPosts::new(Arc::new(MockApi::seeded()), &Config::default());
        let screen = render(&posts, 80, 20);
        assert!(screen.contains("Single Query Performance"));
        assert!(screen.contains("Load Time: 0.00ms"));
    }
}
