use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::app::{Focus, Mode, View};
use crate::config::ThemeConfig;

pub fn render_help(
    f: &mut Frame,
    area: Rect,
    view: View,
    focus: Focus,
    mode: Mode,
    status: Option<&str>,
    theme: &ThemeConfig,
) {
    let key_style = Style::default().fg(theme.primary());
    let text_style = Style::default().fg(theme.fg_subtle());

    let keys: &[(&str, &str)] = match (mode, focus, view) {
        (Mode::Prompt(_), _, _) => &[("Enter", "confirm"), ("Esc", "cancel")],
        (Mode::ConfirmSend, _, _) => &[("y", "send anyway"), ("n", "back")],
        (Mode::Normal, Focus::Sidebar, _) => &[
            ("j/k", "page"),
            ("l", "open"),
            ("Tab", "next"),
            ("q", "quit"),
        ],
        (Mode::Normal, Focus::Page, View::Send) => &[
            ("e", "edit"),
            ("a/A", "attach"),
            ("d", "remove"),
            ("w", "save"),
            ("s", "send"),
            ("c", "cancel"),
            ("x", "clear log"),
            ("q", "quit"),
        ],
        (Mode::Normal, Focus::Page, View::Recipients) => &[
            ("j/k", "nav"),
            ("a", "add"),
            ("d", "delete"),
            ("i", "import"),
            ("w", "save"),
            ("q", "quit"),
        ],
        (Mode::Normal, Focus::Page, View::Smtp) => &[
            ("j/k", "field"),
            ("Enter", "edit"),
            ("t", "security"),
            ("i", "import"),
            ("T", "test"),
            ("w", "save"),
            ("q", "quit"),
        ],
        (Mode::Normal, Focus::Page, View::About) => &[("h", "menu"), ("Tab", "next"), ("q", "quit")],
    };

    let mut spans = Vec::with_capacity(keys.len() * 2 + 2);
    for (key, label) in keys {
        spans.push(Span::styled(*key, key_style));
        spans.push(Span::styled(format!(" {}  ", label), text_style));
    }
    let mut line = Line::from(spans);

    if let Some(msg) = status {
        line.spans
            .push(Span::styled("│  ", Style::default().fg(theme.border())));
        line.spans
            .push(Span::styled(msg, Style::default().fg(theme.success())));
    }

    let paragraph = Paragraph::new(line).style(Style::default().bg(theme.bg_panel()));
    f.render_widget(paragraph, area);
}
