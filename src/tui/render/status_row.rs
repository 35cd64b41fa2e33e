use chrono::Utc;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::tui::app::{App, Mode};
use crate::util::time::time_ago;

/// Render the status row (bottom of screen): refresh state on the left,
/// key hints on the right. In search mode it becomes the search prompt.
pub fn render_status_row(frame: &mut Frame, app: &App, area: Rect) {
    let bg = app.theme.background;
    let width = area.width as usize;

    let line = match app.mode {
        Mode::Search => {
            let mut spans = vec![
                Span::styled(
                    format!("/{}", app.search_input),
                    Style::default().fg(app.theme.text_bright).bg(bg),
                ),
                Span::styled("\u{258C}", Style::default().fg(app.theme.highlight).bg(bg)),
            ];
            pad_with_hint(&mut spans, width, "Enter search  Esc cancel", app, bg);
            Line::from(spans)
        }
        Mode::Navigate => {
            let left = left_text(app);
            let mut spans = vec![Span::styled(
                left,
                Style::default().fg(app.theme.dim).bg(bg),
            )];
            let hint = if app.signed_in() {
                "r refresh  / search  S sign out  q quit"
            } else {
                "q quit"
            };
            pad_with_hint(&mut spans, width, hint, app, bg);
            Line::from(spans)
        }
    };

    let paragraph = Paragraph::new(line).style(Style::default().bg(bg));
    frame.render_widget(paragraph, area);
}

fn left_text(app: &App) -> String {
    if !app.signed_in() {
        return String::new();
    }
    let view = app.refresh.view();
    if view.refreshing() {
        return "\u{27F3} refreshing\u{2026}".to_string();
    }
    match view.snapshot() {
        Some(snapshot) => format!("Updated {}", time_ago(snapshot.last_updated, Utc::now())),
        None => String::new(),
    }
}

fn pad_with_hint(
    spans: &mut Vec<Span<'_>>,
    width: usize,
    hint: &str,
    app: &App,
    bg: ratatui::style::Color,
) {
    let content_width: usize = spans.iter().map(|s| s.content.chars().count()).sum();
    let hint_width = hint.chars().count();
    if content_width + hint_width < width {
        let padding = width - content_width - hint_width;
        spans.push(Span::styled(" ".repeat(padding), Style::default().bg(bg)));
        spans.push(Span::styled(
            hint.to_string(),
            Style::default().fg(app.theme.dim).bg(bg),
        ));
    }
}
