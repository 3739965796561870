use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::Span,
    widgets::{Block, Borders, Paragraph},
};
use tracing::info;

use mailroom_api::ApiCommand;
use mailroom_core::{Email, NewEmail};

use super::{
    App, UiTheme, View, cursor_line_col, scroll_to_cursor, set_cursor_at, text_char_len,
};

/// How the composer was entered. Replaces a separate "replying" flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ComposeMode {
    Blank,
    ReplyTo(Email),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ComposeFocus {
    Recipients,
    Subject,
    Body,
}

impl ComposeFocus {
    pub(crate) fn next(self) -> Self {
        match self {
            ComposeFocus::Recipients => ComposeFocus::Subject,
            ComposeFocus::Subject => ComposeFocus::Body,
            ComposeFocus::Body => ComposeFocus::Recipients,
        }
    }

    pub(crate) fn prev(self) -> Self {
        match self {
            ComposeFocus::Recipients => ComposeFocus::Body,
            ComposeFocus::Subject => ComposeFocus::Recipients,
            ComposeFocus::Body => ComposeFocus::Subject,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ComposeView {
    pub(crate) recipients: String,
    pub(crate) subject: String,
    pub(crate) body: String,
    pub(crate) focus: ComposeFocus,
    pub(crate) cursor_recipients: usize,
    pub(crate) cursor_subject: usize,
    pub(crate) cursor_body: usize,
}

impl ComposeView {
    /// Fields start empty for `Blank`; a reply is prefilled and focuses the body.
    pub(crate) fn open(mode: ComposeMode) -> Self {
        let (recipients, subject, body, focus) = match mode {
            ComposeMode::Blank => (
                String::new(),
                String::new(),
                String::new(),
                ComposeFocus::Recipients,
            ),
            ComposeMode::ReplyTo(email) => (
                email.sender.clone(),
                reply_subject(&email.subject),
                reply_body(&email),
                ComposeFocus::Body,
            ),
        };
        Self {
            cursor_recipients: text_char_len(&recipients),
            cursor_subject: text_char_len(&subject),
            cursor_body: 0,
            recipients,
            subject,
            body,
            focus,
        }
    }

    pub(crate) fn focused_field_mut(&mut self) -> (&mut String, &mut usize) {
        match self.focus {
            ComposeFocus::Recipients => (&mut self.recipients, &mut self.cursor_recipients),
            ComposeFocus::Subject => (&mut self.subject, &mut self.cursor_subject),
            ComposeFocus::Body => (&mut self.body, &mut self.cursor_body),
        }
    }

    /// Field values exactly as typed; recipients are split server-side.
    pub(crate) fn to_new_email(&self) -> NewEmail {
        NewEmail {
            recipients: self.recipients.clone(),
            subject: self.subject.clone(),
            body: self.body.clone(),
        }
    }
}

/// Prefixes "Re: " unless the subject already starts with exactly "Re:".
pub(crate) fn reply_subject(subject: &str) -> String {
    if subject.starts_with("Re:") {
        subject.to_string()
    } else {
        format!("Re: {}", subject)
    }
}

pub(crate) fn reply_body(email: &Email) -> String {
    format!(
        "\n\nOn {} {} wrote:\n{}",
        email.timestamp, email.sender, email.body
    )
}

impl App {
    /// Submits the form. The view stays as is until the server answers.
    pub(crate) fn send_mail(&mut self) {
        let email = match &self.view {
            View::Compose(view) => view.to_new_email(),
            _ => return,
        };
        info!(recipients = %email.recipients, "sending email");
        self.dispatch(ApiCommand::Send {
            generation: self.generation,
            email,
        });
    }
}

pub(crate) fn render_compose_view(
    frame: &mut ratatui::Frame,
    area: Rect,
    view: &mut ComposeView,
    theme: &UiTheme,
) {
    let outer = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(" New Email ", theme.label_focus))
        .style(theme.base)
        .border_style(theme.border);
    let inner = outer.inner(area);
    frame.render_widget(outer, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(3),
        ])
        .split(inner);

    let label_for = |focus: ComposeFocus| {
        if view.focus == focus {
            theme.label_focus
        } else {
            theme.label
        }
    };
    let recipients_label = label_for(ComposeFocus::Recipients);
    let subject_label = label_for(ComposeFocus::Subject);

    let to_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(10), Constraint::Min(1)])
        .split(rows[0]);
    frame.render_widget(Paragraph::new("To:").style(recipients_label), to_layout[0]);
    let to_scroll = line_field_scroll(&view.recipients, view.cursor_recipients, to_layout[1]);
    frame.render_widget(
        Paragraph::new(view.recipients.as_str())
            .style(theme.base)
            .scroll((0, to_scroll)),
        to_layout[1],
    );

    let subject_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(10), Constraint::Min(1)])
        .split(rows[1]);
    frame.render_widget(
        Paragraph::new("Subject:").style(subject_label),
        subject_layout[0],
    );
    let subject_scroll = line_field_scroll(&view.subject, view.cursor_subject, subject_layout[1]);
    frame.render_widget(
        Paragraph::new(view.subject.as_str())
            .style(theme.base)
            .scroll((0, subject_scroll)),
        subject_layout[1],
    );

    frame.render_widget(
        Paragraph::new("─".repeat(rows[2].width as usize)).style(theme.separator),
        rows[2],
    );

    let body_area = rows[3];
    let (cursor_line, _) = cursor_line_col(&view.body, view.cursor_body);
    let body_scroll = scroll_to_cursor(cursor_line, body_area.height);
    frame.render_widget(
        Paragraph::new(view.body.as_str())
            .style(theme.base)
            .scroll((body_scroll, 0)),
        body_area,
    );

    match view.focus {
        ComposeFocus::Recipients => set_cursor_at(
            frame,
            to_layout[1],
            &view.recipients,
            view.cursor_recipients,
            (0, to_scroll),
        ),
        ComposeFocus::Subject => set_cursor_at(
            frame,
            subject_layout[1],
            &view.subject,
            view.cursor_subject,
            (0, subject_scroll),
        ),
        ComposeFocus::Body => set_cursor_at(
            frame,
            body_area,
            &view.body,
            view.cursor_body,
            (body_scroll, 0),
        ),
    }
}

/// Single-line fields scroll sideways so the cursor column stays visible.
fn line_field_scroll(text: &str, cursor: usize, area: Rect) -> u16 {
    let (_, col) = cursor_line_col(text, cursor);
    scroll_to_cursor(col, area.width)
}
