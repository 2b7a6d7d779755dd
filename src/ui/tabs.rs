// Pane bar rendering.
// Shows both strategies and marks the one holding keyboard focus.

use ratatui::{prelude::*, widgets::*};

use crate::api::PostsApi;
use crate::app::{App, Pane};

/// Draw the pane bar at the top of the screen.
pub fn draw_tabs<A: PostsApi>(frame: &mut Frame, app: &App<A>, area: Rect) {
    let panes = [Pane::Uncached, Pane::Cached];

    let titles: Vec<Line> = panes
        .iter()
        .map(|pane| {
            let style = if *pane == app.focus {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            Line::from(Span::styled(pane.title(), style))
        })
        .collect();

    let selected_index = panes.iter().position(|p| *p == app.focus).unwrap_or(0);

    let tabs_widget = Tabs::new(titles)
        .block(
            Block::default()
                .borders(Borders::BOTTOM)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(" postcache ")
                .title_style(
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                ),
        )
        .select(selected_index)
        .highlight_style(Style::default().fg(Color::Yellow))
        .divider(Span::raw(" │ "));

    frame.render_widget(tabs_widget, area);
}
