use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;

use mailroom_api::{ApiEngine, ApiEvent};
use mailroom_core::Mailbox;

use super::{App, MailboxView, SPINNER_FRAMES, UiTheme, View};

impl App {
    pub(crate) fn new(
        engine: ApiEngine,
        events: mpsc::Receiver<ApiEvent>,
        ui_theme: Arc<UiTheme>,
        server_label: String,
        show_help: bool,
    ) -> Self {
        let mut app = Self {
            view: View::Mailbox(MailboxView::new(Mailbox::Inbox)),
            generation: 0,
            last_mailbox: Mailbox::Inbox,
            archive_reload: None,
            engine,
            events,
            ui_theme,
            server_label,
            show_help,
            pending: 0,
            spinner: 0,
            last_tick: Instant::now(),
        };
        app.load_mailbox(Mailbox::Inbox);
        app
    }

    pub(crate) fn drain_channels(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            self.on_event(event);
        }
    }

    pub(crate) fn on_tick(&mut self) {
        if self.pending > 0 {
            self.spinner = (self.spinner + 1) % SPINNER_FRAMES.len();
        } else {
            self.spinner = 0;
        }
    }
}
