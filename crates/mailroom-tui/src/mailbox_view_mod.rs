use ratatui::{
    layout::{Constraint, Rect},
    style::Modifier,
    text::Span,
    widgets::{Block, Borders, Paragraph, Row, Table, TableState},
};
use tracing::debug;

use mailroom_api::ApiCommand;
use mailroom_core::{Email, Mailbox};

use super::{App, UiTheme, View, truncate_label};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReadState {
    Read,
    Unread,
}

/// Archive toggle shown on inbox and archive rows; sent rows have none.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ArchiveControl {
    pub(crate) archived: bool,
}

impl ArchiveControl {
    pub(crate) fn label(&self) -> &'static str {
        if self.archived { "Unarchive" } else { "Archive" }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MailboxItem {
    pub(crate) id: i64,
    pub(crate) sender: String,
    pub(crate) subject: String,
    pub(crate) timestamp: String,
    pub(crate) read_state: ReadState,
    pub(crate) archive: Option<ArchiveControl>,
}

impl MailboxItem {
    pub(crate) fn from_email(email: &Email, mailbox: Mailbox) -> Self {
        Self {
            id: email.id,
            sender: email.sender.clone(),
            subject: email.subject.clone(),
            timestamp: email.timestamp.clone(),
            read_state: if email.read {
                ReadState::Read
            } else {
                ReadState::Unread
            },
            archive: mailbox.allows_archive().then_some(ArchiveControl {
                archived: email.archived,
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct MailboxView {
    pub(crate) mailbox: Mailbox,
    pub(crate) heading: String,
    pub(crate) items: Vec<MailboxItem>,
    pub(crate) selected: usize,
    pub(crate) loading: bool,
}

impl MailboxView {
    pub(crate) fn new(mailbox: Mailbox) -> Self {
        Self {
            mailbox,
            heading: mailbox.heading(),
            items: Vec::new(),
            selected: 0,
            loading: true,
        }
    }

    /// Replaces the rows with one item per email, keeping server order.
    pub(crate) fn fill(&mut self, emails: &[Email]) {
        self.items = emails
            .iter()
            .map(|email| MailboxItem::from_email(email, self.mailbox))
            .collect();
        self.selected = self.selected.min(self.items.len().saturating_sub(1));
        self.loading = false;
    }

    pub(crate) fn selected_item(&self) -> Option<&MailboxItem> {
        self.items.get(self.selected)
    }

    pub(crate) fn select_next(&mut self) {
        if self.selected + 1 < self.items.len() {
            self.selected += 1;
        }
    }

    pub(crate) fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }
}

impl App {
    pub(crate) fn open_selected(&mut self) {
        let id = match &self.view {
            View::Mailbox(view) => view.selected_item().map(|item| item.id),
            _ => None,
        };
        if let Some(id) = id {
            self.view_email(id);
        }
    }

    /// Flips the archived flag of the selected row. Never opens the email.
    pub(crate) fn toggle_archive_selected(&mut self) {
        let target = match &self.view {
            View::Mailbox(view) => view
                .selected_item()
                .and_then(|item| item.archive.map(|control| (item.id, control.archived))),
            _ => None,
        };
        let Some((id, archived)) = target else {
            debug!("no archive control on selection");
            return;
        };
        self.dispatch(ApiCommand::SetArchived {
            generation: self.generation,
            id,
            archived: !archived,
        });
    }
}

pub(crate) fn render_mailbox_view(
    frame: &mut ratatui::Frame,
    area: Rect,
    view: &mut MailboxView,
    theme: &UiTheme,
) {
    let header = Row::new(vec!["From", "Subject", "Timestamp", ""]).style(theme.table_header);

    let total = view.items.len();
    let rows_visible = area.height.saturating_sub(3).max(1) as usize;
    let mut start = view
        .selected
        .saturating_sub(rows_visible.saturating_sub(1));
    if start + rows_visible > total {
        start = total.saturating_sub(rows_visible);
    }
    let end = (start + rows_visible).min(total);

    let rows: Vec<Row> = view.items[start..end]
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            let mut style = match item.read_state {
                ReadState::Unread => theme.unread,
                ReadState::Read => theme.read,
            };
            if start + idx == view.selected {
                style = style.patch(theme.focus_bg);
            }
            let control = item
                .archive
                .map(|control| format!("[{}]", control.label()))
                .unwrap_or_default();
            Row::new(vec![
                truncate_label(&item.sender, 28),
                item.subject.clone(),
                item.timestamp.clone(),
                control,
            ])
            .style(style)
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(28),
            Constraint::Min(10),
            Constraint::Length(22),
            Constraint::Length(11),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::NONE)
            .title(Span::styled(
                format!(" {} ", view.heading),
                theme.label_focus.add_modifier(Modifier::BOLD),
            ))
            .style(theme.base)
            .border_style(theme.border),
    )
    .column_spacing(1)
    .style(theme.base);

    frame.render_stateful_widget(table, area, &mut TableState::default());

    if view.items.is_empty() {
        let msg = if view.loading { "Loading..." } else { "No emails" };
        let hint_area = Rect {
            x: area.x + 2,
            y: area.y + 2,
            width: area.width.saturating_sub(4),
            height: 1,
        };
        frame.render_widget(Paragraph::new(msg).style(theme.base), hint_area);
    }
}
