use ratatui::{
    layout::{Alignment, Rect},
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use super::{mask, Modal};
use crate::app::Prompt;
use crate::config::ThemeConfig;

/// Single-line input dialog
pub fn render_prompt(f: &mut Frame, area: Rect, prompt: Prompt, input: &str, theme: &ThemeConfig) {
    let inner = Modal::new(prompt.title(), theme).draw(f, 60, 3, area);

    let shown = if prompt.is_secret() {
        mask(input)
    } else {
        input.to_string()
    };
    // Show the tail when the text is wider than the box
    let width = inner.width.saturating_sub(1) as usize;
    let skip = shown.chars().count().saturating_sub(width);
    let visible: String = shown.chars().skip(skip).collect();

    let line = Line::from(vec![
        Span::styled(visible, Style::default().fg(theme.fg())),
        Span::styled("_", Style::default().fg(theme.primary())),
    ]);
    f.render_widget(Paragraph::new(line), inner);
}

pub fn render_confirm_send(f: &mut Frame, area: Rect, recipients: usize, theme: &ThemeConfig) {
    let inner = Modal::new(" Empty subject ", theme).draw(f, 50, 4, area);

    let lines = vec![
        Line::from(Span::styled(
            "The subject is empty.",
            Style::default().fg(theme.warning()),
        )),
        Line::from(Span::styled(
            format!("Send to {} recipients anyway? (y/n)", recipients),
            Style::default().fg(theme.fg()),
        )),
    ];
    f.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);
}
