use std::sync::Arc;

use tokio::sync::mpsc;

use mailroom_api::{ApiCommand, ApiEngine, ApiEvent};
use mailroom_core::Email;

use super::{App, UiTheme};

/// App wired to plain channels. The startup inbox request is already drained.
pub(crate) fn test_app_with_events() -> (App, mpsc::Receiver<ApiCommand>, mpsc::Sender<ApiEvent>) {
    let (cmd_tx, mut cmd_rx) = mpsc::channel(64);
    let (evt_tx, evt_rx) = mpsc::channel(64);
    let app = App::new(
        ApiEngine::from_sender(cmd_tx),
        evt_rx,
        Arc::new(UiTheme::default_theme()),
        "test".to_string(),
        true,
    );
    drain_commands(&mut cmd_rx);
    (app, cmd_rx, evt_tx)
}

pub(crate) fn test_app() -> (App, mpsc::Receiver<ApiCommand>) {
    let (app, commands, _events) = test_app_with_events();
    (app, commands)
}

pub(crate) fn drain_commands(rx: &mut mpsc::Receiver<ApiCommand>) -> Vec<ApiCommand> {
    let mut out = Vec::new();
    while let Ok(cmd) = rx.try_recv() {
        out.push(cmd);
    }
    out
}

pub(crate) fn sample_email(id: i64, subject: &str, read: bool, archived: bool) -> Email {
    Email {
        id,
        sender: "alice@example.com".to_string(),
        recipients: vec!["me@example.com".to_string()],
        subject: subject.to_string(),
        body: String::new(),
        timestamp: "Jan 02 2026, 09:30 AM".to_string(),
        read,
        archived,
    }
}
