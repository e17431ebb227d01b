use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};

use super::Pane;
use crate::config::{Config, ThemeConfig};

pub fn render_about(f: &mut Frame, area: Rect, config: &Config, focused: bool, theme: &ThemeConfig) {
    let heading = Style::default()
        .fg(theme.primary())
        .add_modifier(Modifier::BOLD);
    let section = Style::default().fg(theme.secondary());
    let muted = Style::default().fg(theme.fg_muted());
    let path_line = |name: &'static str, path: String| {
        Line::from(vec![
            Span::styled(format!("  {:<12}", name), muted),
            Span::raw(path),
        ])
    };

    let lines = vec![
        Line::from(Span::styled(
            format!("bulkmail {}", env!("CARGO_PKG_VERSION")),
            heading,
        )),
        Line::raw(""),
        Line::raw("Send one message to every address on a list, one SMTP"),
        Line::raw("transaction per recipient, so nobody sees anyone else."),
        Line::raw(""),
        Line::from(Span::styled("Files", section)),
        path_line("config", Config::path().display().to_string()),
        path_line("email list", config.storage.recipients_path().display().to_string()),
        path_line("smtp", config.storage.profile_path().display().to_string()),
        path_line("draft", config.storage.draft_path().display().to_string()),
        path_line("log", crate::logging::default_log_path().display().to_string()),
    ];

    let paragraph = Paragraph::new(lines)
        .block(Pane::new(" About ", focused, theme).block())
        .wrap(Wrap { trim: false });
    f.render_widget(paragraph, area);
}
