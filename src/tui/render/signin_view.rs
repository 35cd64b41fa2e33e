use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Wrap};

use crate::auth::session::SessionState;
use crate::tui::app::App;

/// Render the sign-in surface: a short pitch, the action line, and any
/// inline sign-in error.
pub fn render_signin_view(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let bg = theme.background;

    let mut lines = vec![
        Line::default(),
        Line::from(Span::styled(
            "  Sign in",
            Style::default()
                .fg(theme.text_bright)
                .bg(bg)
                .add_modifier(Modifier::BOLD),
        )),
        Line::default(),
        Line::from(Span::styled(
            "  Sign in with Google to see your tasks. Nothing is stored",
            Style::default().fg(theme.text).bg(bg),
        )),
        Line::from(Span::styled(
            "  locally except your session token.",
            Style::default().fg(theme.text).bg(bg),
        )),
        Line::default(),
    ];

    if !app.config.google.is_configured() {
        lines.push(Line::from(Span::styled(
            "  No OAuth client configured yet. Run `sg init` and fill in",
            Style::default().fg(theme.due).bg(bg),
        )));
        lines.push(Line::from(Span::styled(
            "  [google] client_id and client_secret.",
            Style::default().fg(theme.due).bg(bg),
        )));
    } else if matches!(app.session.state(), SessionState::Authenticating) {
        lines.push(Line::from(Span::styled(
            "  Waiting for authorization in your browser\u{2026}",
            Style::default().fg(theme.highlight).bg(bg),
        )));
    } else {
        lines.push(Line::from(vec![
            Span::styled("  Press ", Style::default().fg(theme.text).bg(bg)),
            Span::styled(
                "s",
                Style::default()
                    .fg(theme.highlight)
                    .bg(bg)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                " to sign in with Google",
                Style::default().fg(theme.text).bg(bg),
            ),
        ]));
    }

    if let SessionState::Unauthenticated { error: Some(msg) } = app.session.state() {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            format!("  {msg}"),
            Style::default().fg(theme.error).bg(bg),
        )));
    }

    let paragraph = Paragraph::new(lines)
        .style(Style::default().bg(bg))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}
