use linkify::{LinkFinder, LinkKind};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};

use mailroom_core::{Email, Mailbox};

use super::{App, ComposeMode, UiTheme, View};

/// A single email. `origin` is the mailbox Esc returns to.
#[derive(Debug, Clone)]
pub(crate) struct DetailView {
    pub(crate) id: i64,
    pub(crate) origin: Mailbox,
    pub(crate) email: Option<Email>,
    pub(crate) scroll: u16,
    /// Last scroll offset that still shows text; set on render.
    pub(crate) max_scroll: u16,
    pub(crate) loading: bool,
}

impl DetailView {
    pub(crate) fn loading(id: i64, origin: Mailbox) -> Self {
        Self {
            id,
            origin,
            email: None,
            scroll: 0,
            max_scroll: 0,
            loading: true,
        }
    }

    pub(crate) fn show(&mut self, email: Email) {
        self.email = Some(email);
        self.scroll = 0;
        self.loading = false;
    }

    pub(crate) fn scroll_down(&mut self) {
        self.scroll = self.scroll.saturating_add(1).min(self.max_scroll);
    }

    pub(crate) fn set_viewport(&mut self, content_rows: usize, height: u16) {
        let max = content_rows.saturating_sub(height as usize);
        self.max_scroll = u16::try_from(max).unwrap_or(u16::MAX);
        if self.scroll > self.max_scroll {
            self.scroll = self.max_scroll;
        }
    }

    pub(crate) fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(1);
    }
}

impl App {
    /// Opens the composer prefilled from the displayed email. No-op while loading.
    pub(crate) fn reply_current(&mut self) {
        let email = match &self.view {
            View::Detail(view) => view.email.clone(),
            _ => None,
        };
        if let Some(email) = email {
            self.compose_view(ComposeMode::ReplyTo(email));
        }
    }
}

pub(crate) fn detail_lines(email: &Email, theme: &UiTheme) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(Span::styled(
            email.subject.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled("From: ", theme.label),
            Span::raw(email.sender.clone()),
        ]),
        Line::from(vec![
            Span::styled("To: ", theme.label),
            Span::raw(email.recipients_line()),
        ]),
        Line::from(vec![
            Span::styled("Timestamp: ", theme.label),
            Span::raw(email.timestamp.clone()),
        ]),
        Line::from(Span::styled("[ Reply ]", theme.control)),
        Line::from(Span::styled("─".repeat(40), theme.separator)),
    ];
    for line in email.body.lines() {
        lines.push(Line::from(body_spans(line, theme)));
    }
    lines
}

/// Rows the lines occupy once wrapped to `width` columns.
fn wrapped_rows(lines: &[Line<'_>], width: u16) -> usize {
    let width = width.max(1) as usize;
    lines
        .iter()
        .map(|line| line.width().max(1).div_ceil(width))
        .sum()
}

fn link_ranges(text: &str) -> Vec<(usize, usize)> {
    let mut finder = LinkFinder::new();
    finder.kinds(&[LinkKind::Url, LinkKind::Email]);
    finder
        .links(text)
        .map(|link| (link.start(), link.end()))
        .collect()
}

/// Body text is shown verbatim; only link ranges get a style.
fn body_spans(line: &str, theme: &UiTheme) -> Vec<Span<'static>> {
    let ranges = link_ranges(line);
    if ranges.is_empty() {
        return vec![Span::raw(line.to_string())];
    }
    let mut spans = Vec::new();
    let mut last = 0usize;
    for (start, end) in ranges {
        if start > last {
            spans.push(Span::raw(line[last..start].to_string()));
        }
        spans.push(Span::styled(line[start..end].to_string(), theme.link));
        last = end;
    }
    if last < line.len() {
        spans.push(Span::raw(line[last..].to_string()));
    }
    spans
}

pub(crate) fn render_detail_view(
    frame: &mut ratatui::Frame,
    area: Rect,
    view: &mut DetailView,
    theme: &UiTheme,
) {
    let text = match &view.email {
        Some(email) => {
            let lines = detail_lines(email, theme);
            view.set_viewport(wrapped_rows(&lines, area.width), area.height.saturating_sub(1));
            Text::from(lines)
        }
        None if view.loading => Text::from("Loading..."),
        None => Text::from("Email could not be loaded"),
    };
    let block = Block::default()
        .borders(Borders::NONE)
        .title(Span::styled(
            format!(" {} ", view.origin.heading()),
            theme.label,
        ))
        .style(theme.base);
    frame.render_widget(
        Paragraph::new(text)
            .block(block)
            .style(theme.base)
            .wrap(Wrap { trim: false })
            .scroll((view.scroll, 0)),
        area,
    );
}
