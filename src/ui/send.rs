use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Gauge, List, ListItem, Paragraph, Wrap},
    Frame,
};

use super::Pane;
use crate::app::{LogKind, LogLine};
use crate::config::ThemeConfig;
use crate::store::Draft;

/// What the send page shows besides the draft itself
pub struct SendPage<'a> {
    pub draft: &'a Draft,
    pub recipient_count: usize,
    pub attachment_selection: usize,
    pub log: &'a [LogLine],
    pub progress: Option<(usize, usize)>,
    pub running: bool,
    pub log_height: u16,
    pub focused: bool,
}

pub fn render_send_page(f: &mut Frame, area: Rect, page: &SendPage, theme: &ThemeConfig) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),               // Recipients/Subject
            Constraint::Min(5),                  // Body preview
            Constraint::Length(6),               // Attachments
            Constraint::Length(1),               // Progress
            Constraint::Length(page.log_height), // Log
        ])
        .split(area);

    let label = Style::default().fg(theme.primary());
    let subject = if page.draft.subject.is_empty() {
        Span::styled("(no subject)", Style::default().fg(theme.fg_muted()))
    } else {
        Span::raw(page.draft.subject.as_str())
    };
    let header_text = vec![
        Line::from(vec![
            Span::styled("To: ", label),
            Span::raw(format!("{} recipients", page.recipient_count)),
        ]),
        Line::from(vec![Span::styled("Subject: ", label), subject]),
    ];
    let header = Paragraph::new(header_text)
        .block(Pane::new(" Message ", page.focused, theme).block());
    f.render_widget(header, chunks[0]);

    let body = Paragraph::new(page.draft.body.as_str())
        .block(Pane::new(" Body ", false, theme).block())
        .wrap(Wrap { trim: false });
    f.render_widget(body, chunks[1]);

    let attachment_items: Vec<ListItem> = if page.draft.attachments.is_empty() {
        vec![ListItem::new(Line::from(Span::styled(
            "(no attachments)",
            Style::default().fg(theme.fg_muted()),
        )))]
    } else {
        page.draft
            .attachments
            .iter()
            .enumerate()
            .map(|(i, path)| {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                let style = if i == page.attachment_selection {
                    Style::default()
                        .fg(theme.attachment())
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(theme.fg_subtle())
                };
                ListItem::new(Line::from(Span::styled(name, style)))
            })
            .collect()
    };
    let attachments_title = format!(" Attachments ({}) ", page.draft.attachments.len());
    let attachments =
        List::new(attachment_items).block(Pane::new(&attachments_title, false, theme).block());
    f.render_widget(attachments, chunks[2]);

    render_progress(f, chunks[3], page, theme);

    // Keep the newest lines visible
    let visible = page.log_height.saturating_sub(2) as usize;
    let skip = page.log.len().saturating_sub(visible);
    let log_lines: Vec<Line> = page.log[skip..]
        .iter()
        .map(|line| {
            let color = match line.kind {
                LogKind::Info => theme.fg_subtle(),
                LogKind::Success => theme.success(),
                LogKind::Failure => theme.error(),
            };
            Line::from(Span::styled(line.text.as_str(), Style::default().fg(color)))
        })
        .collect();
    let log = Paragraph::new(log_lines).block(Pane::new(" Log ", false, theme).block());
    f.render_widget(log, chunks[4]);
}

fn render_progress(f: &mut Frame, area: Rect, page: &SendPage, theme: &ThemeConfig) {
    let Some((done, total)) = page.progress else {
        return;
    };
    let ratio = if total == 0 {
        0.0
    } else {
        (done as f64 / total as f64).clamp(0.0, 1.0)
    };
    let label = if page.running {
        format!("{} / {}", done, total)
    } else {
        format!("{} / {} (finished)", done, total)
    };
    let gauge = Gauge::default()
        .ratio(ratio)
        .label(label)
        .gauge_style(Style::default().fg(theme.primary()).bg(theme.bg_element()))
        .use_unicode(true);
    f.render_widget(gauge, area);
}
