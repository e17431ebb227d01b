use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::Line,
    widgets::{List, ListItem, ListState},
    Frame,
};

use super::Pane;
use crate::app::View;
use crate::config::ThemeConfig;

pub fn render_sidebar(f: &mut Frame, area: Rect, view: View, focused: bool, theme: &ThemeConfig) {
    let items: Vec<ListItem> = View::ALL
        .iter()
        .enumerate()
        .map(|(i, v)| ListItem::new(Line::raw(format!("{} {}", i + 1, v.title()))))
        .collect();

    let mut state = ListState::default();
    state.select(View::ALL.iter().position(|v| *v == view));

    let list = List::new(items)
        .block(Pane::new(" bulkmail ", focused, theme).block())
        .highlight_style(
            Style::default()
                .bg(theme.selected_bg())
                .fg(theme.primary())
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    f.render_stateful_widget(list, area, &mut state);
}
