use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::model::task::TaskNode;
use crate::tui::app::{App, FlatItem, node_at};
use crate::util::time::format_due;
use crate::util::unicode::{display_width, truncate_to_width};

use super::push_highlighted_spans;

/// Render the task surface: error banner, then the visible slice of the
/// flattened tree. While a refresh is in flight the previous tree stays on
/// screen untouched.
pub fn render_tasks_view(frame: &mut Frame, app: &mut App, area: Rect) {
    let theme = app.theme.clone();
    let bg = theme.background;
    let view = app.refresh.view();

    let mut banner_rows = 0u16;
    if let Some(error) = view.error() {
        let line = Line::from(Span::styled(
            truncate_to_width(&format!(" ! {error}"), area.width as usize),
            Style::default().fg(theme.error).bg(bg),
        ));
        let banner_area = Rect {
            height: 1,
            ..area
        };
        frame.render_widget(Paragraph::new(line).style(Style::default().bg(bg)), banner_area);
        banner_rows = 1;
    }

    let list_area = Rect {
        y: area.y + banner_rows,
        height: area.height.saturating_sub(banner_rows),
        ..area
    };
    if list_area.height == 0 {
        return;
    }

    // First ever load only shows a small message; after that the list is
    // never blanked.
    if view.first_load() {
        let line = Line::from(Span::styled(
            " Loading\u{2026}",
            Style::default().fg(theme.dim).bg(bg),
        ));
        frame.render_widget(Paragraph::new(line).style(Style::default().bg(bg)), list_area);
        return;
    }

    let Some(snapshot) = view.snapshot().cloned() else {
        return;
    };

    let items = app.flat_items();
    if items.is_empty() {
        if view.error().is_none() {
            let line = Line::from(Span::styled(
                " No tasks found.",
                Style::default().fg(theme.dim).bg(bg),
            ));
            frame.render_widget(Paragraph::new(line).style(Style::default().bg(bg)), list_area);
        }
        return;
    }

    // Keep the cursor visible within the viewport
    let height = list_area.height as usize;
    if app.cursor < app.scroll_offset {
        app.scroll_offset = app.cursor;
    } else if app.cursor >= app.scroll_offset + height {
        app.scroll_offset = app.cursor + 1 - height;
    }
    if app.scroll_offset + height > items.len() {
        app.scroll_offset = items.len().saturating_sub(height);
    }

    let search_re = app.active_search_re();
    let mut lines = Vec::with_capacity(height);
    for (row, item) in items
        .iter()
        .enumerate()
        .skip(app.scroll_offset)
        .take(height)
    {
        let Some(node) = node_at(&snapshot.roots, &item.path) else {
            continue;
        };
        lines.push(render_row(
            app,
            node,
            item,
            row == app.cursor,
            list_area.width as usize,
            search_re.as_ref(),
        ));
    }

    frame.render_widget(
        Paragraph::new(lines).style(Style::default().bg(bg)),
        list_area,
    );
}

fn render_row(
    app: &App,
    node: &TaskNode,
    item: &FlatItem,
    selected: bool,
    width: usize,
    search_re: Option<&regex::Regex>,
) -> Line<'static> {
    let theme = &app.theme;
    let bg = if selected {
        theme.selection_bg
    } else {
        theme.background
    };

    let marker = if item.is_collapsed {
        "\u{25B8} " // ▸
    } else if item.has_children {
        "\u{25BE} " // ▾
    } else {
        "  "
    };

    let checkbox = format!("[{}] ", node.status.checkbox_char());
    let indent = "  ".repeat(item.depth);

    let mut spans = vec![
        Span::styled(format!(" {indent}"), Style::default().bg(bg)),
        Span::styled(
            marker.to_string(),
            Style::default().fg(theme.dim).bg(bg),
        ),
        Span::styled(
            checkbox,
            Style::default()
                .fg(if node.is_completed() {
                    theme.done
                } else {
                    theme.text
                })
                .bg(bg),
        ),
    ];

    let title_style = if node.is_completed() {
        Style::default()
            .fg(theme.dim)
            .bg(bg)
            .add_modifier(Modifier::CROSSED_OUT)
    } else {
        Style::default().fg(theme.text_bright).bg(bg)
    };
    push_highlighted_spans(
        &mut spans,
        &node.title,
        title_style,
        Style::default()
            .fg(theme.search_match_fg)
            .bg(theme.search_match_bg),
        search_re,
    );

    if let Some(due) = node.due.as_deref() {
        spans.push(Span::styled(
            format!("  {}", format_due(due)),
            Style::default().fg(theme.due).bg(bg),
        ));
    }

    if !node.notes.is_empty() {
        let used: usize = spans.iter().map(|s| display_width(&s.content)).sum();
        if used + 4 < width {
            let notes = node.notes.replace('\n', " ");
            spans.push(Span::styled(
                format!("  {}", truncate_to_width(&notes, width - used - 2)),
                Style::default().fg(theme.dim).bg(bg),
            ));
        }
    }

    // pad the row so the selection background reaches the right edge
    let used: usize = spans.iter().map(|s| display_width(&s.content)).sum();
    if used < width {
        spans.push(Span::styled(
            " ".repeat(width - used),
            Style::default().bg(bg),
        ));
    }

    Line::from(spans)
}
