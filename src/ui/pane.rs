use ratatui::{
    layout::{Alignment, Rect},
    style::Style,
    widgets::{Block, Borders, Clear},
    Frame,
};

use crate::config::ThemeConfig;

/// Bordered page section; the active one gets the accent border
pub struct Pane<'a> {
    title: &'a str,
    focused: bool,
    theme: &'a ThemeConfig,
}

impl<'a> Pane<'a> {
    pub fn new(title: &'a str, focused: bool, theme: &'a ThemeConfig) -> Self {
        Self {
            title,
            focused,
            theme,
        }
    }

    pub fn block(&self) -> Block<'a> {
        let border_color = if self.focused {
            self.theme.border_active()
        } else {
            self.theme.border_subtle()
        };

        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border_color))
            .title_style(Style::default().fg(self.theme.primary()))
            .title(self.title)
            .style(Style::default().bg(self.theme.bg()).fg(self.theme.fg()))
    }
}

/// A centered dialog drawn over the page
pub struct Modal<'a> {
    title: &'a str,
    theme: &'a ThemeConfig,
}

impl<'a> Modal<'a> {
    pub fn new(title: &'a str, theme: &'a ThemeConfig) -> Self {
        Self { title, theme }
    }

    pub fn centered_rect(&self, width: u16, height: u16, area: Rect) -> Rect {
        let modal_width = width.min(area.width.saturating_sub(4));
        let modal_height = height.min(area.height.saturating_sub(4));
        let x = (area.width.saturating_sub(modal_width)) / 2 + area.x;
        let y = (area.height.saturating_sub(modal_height)) / 2 + area.y;
        Rect::new(x, y, modal_width, modal_height)
    }

    pub fn block(&self) -> Block<'a> {
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.border_active()))
            .title(self.title)
            .title_alignment(Alignment::Center)
            .title_style(Style::default().fg(self.theme.primary()))
            .style(Style::default().bg(self.theme.bg_panel()))
    }

    /// Clear the modal area, draw the frame, and return the inner rect
    pub fn draw(&self, f: &mut Frame, width: u16, height: u16, area: Rect) -> Rect {
        let modal_area = self.centered_rect(width, height, area);
        f.render_widget(Clear, modal_area);
        let block = self.block();
        let inner = block.inner(modal_area);
        f.render_widget(block, modal_area);
        inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_rect_fits_inside_area() {
        let theme = ThemeConfig::default();
        let modal = Modal::new(" x ", &theme);
        let area = Rect::new(0, 0, 100, 40);
        let r = modal.centered_rect(60, 5, area);
        assert_eq!(r, Rect::new(20, 17, 60, 5));

        let small = Rect::new(0, 0, 20, 6);
        let r = modal.centered_rect(60, 5, small);
        assert_eq!(r.width, 16);
        assert_eq!(r.height, 2);
    }
}
