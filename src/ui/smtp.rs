use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use super::Pane;
use crate::app::SmtpField;
use crate::config::ThemeConfig;
use crate::store::SmtpProfile;

pub fn render_smtp(
    f: &mut Frame,
    area: Rect,
    profile: &SmtpProfile,
    selection: usize,
    focused: bool,
    theme: &ThemeConfig,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(7), Constraint::Min(3)])
        .split(area);

    let label_style = Style::default().fg(theme.fg_subtle());
    let items: Vec<ListItem> = SmtpField::ALL
        .iter()
        .map(|field| {
            let value = match field {
                SmtpField::Host => profile.host.clone(),
                SmtpField::Port => profile.port.to_string(),
                SmtpField::Username => profile.username.clone(),
                SmtpField::Password => mask(&profile.credential),
                SmtpField::Security => profile.security.label().to_string(),
            };
            let value = if value.is_empty() {
                Span::styled("(not set)", Style::default().fg(theme.warning()))
            } else {
                Span::styled(value, Style::default().fg(theme.fg()))
            };
            ListItem::new(Line::from(vec![
                Span::styled(format!("{:<10} ", field.label()), label_style),
                value,
            ]))
        })
        .collect();

    let mut state = ListState::default();
    state.select(Some(selection.min(SmtpField::ALL.len() - 1)));

    let list = List::new(items)
        .block(Pane::new(" SMTP Config ", focused, theme).block())
        .highlight_style(
            Style::default()
                .bg(theme.selected_bg())
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");
    f.render_stateful_widget(list, chunks[0], &mut state);

    let notes = vec![
        Line::from(Span::styled(
            "The username is also the sender address.",
            Style::default().fg(theme.fg_muted()),
        )),
        Line::from(Span::styled(
            "Saved settings keep the password in cleartext on disk.",
            Style::default().fg(theme.warning()),
        )),
    ];
    let notes = Paragraph::new(notes)
        .block(Pane::new(" Notes ", false, theme).block())
        .wrap(Wrap { trim: true });
    f.render_widget(notes, chunks[1]);
}

pub fn mask(secret: &str) -> String {
    "*".repeat(secret.chars().count())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_hides_every_character() {
        assert_eq!(mask("pässwd"), "******");
        assert_eq!(mask(""), "");
    }
}
