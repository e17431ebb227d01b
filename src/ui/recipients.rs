use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::Line,
    widgets::{List, ListItem, ListState},
    Frame,
};

use super::Pane;
use crate::config::ThemeConfig;
use crate::store::Recipient;

pub fn render_recipients(
    f: &mut Frame,
    area: Rect,
    recipients: &[Recipient],
    state: &mut ListState,
    focused: bool,
    theme: &ThemeConfig,
) {
    // Available width: area minus borders (2) minus highlight symbol (2) minus index column
    let number_width = recipients.len().to_string().len().max(1);
    let avail_width = (area.width as usize).saturating_sub(5 + number_width);

    let items: Vec<ListItem> = recipients
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let line = format!(
                "{:>nw$} {}",
                i + 1,
                truncate(r.as_str(), avail_width),
                nw = number_width
            );
            ListItem::new(Line::raw(line))
        })
        .collect();

    let title = format!(" Email List ({}) ", recipients.len());
    let list = List::new(items)
        .block(Pane::new(&title, focused, theme).block())
        .highlight_style(
            Style::default()
                .bg(theme.selected_bg())
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    f.render_stateful_widget(list, area, state);
}

fn truncate(s: &str, max: usize) -> String {
    if max < 4 {
        return s.chars().take(max).collect();
    }
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max - 3).collect();
        format!("{}...", truncated)
    }
}
