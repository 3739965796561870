//! Request engine between the UI loop and a `MailBackend`.

use std::sync::Arc;

use anyhow::{Result, anyhow};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, error, warn};

use mailroom_core::{Email, EmailPatch, MailBackend, Mailbox, NewEmail, SendOutcome};

mod http;

pub use http::{ApiError, DEFAULT_BASE_URL, DEFAULT_TIMEOUT, HttpBackend, HttpConfig};

const API_CMD_QUEUE_CAPACITY: usize = 64;
const API_EVENT_QUEUE_CAPACITY: usize = 64;

/// Requests that render something carry the view generation that issued them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCommand {
    LoadMailbox { generation: u64, mailbox: Mailbox },
    LoadEmail { generation: u64, id: i64 },
    MarkRead { id: i64 },
    SetArchived {
        generation: u64,
        id: i64,
        archived: bool,
    },
    Send { generation: u64, email: NewEmail },
}

impl ApiCommand {
    /// Generation of the view that issued the request; `None` for fire-and-forget.
    pub fn generation(&self) -> Option<u64> {
        match self {
            ApiCommand::LoadMailbox { generation, .. }
            | ApiCommand::LoadEmail { generation, .. }
            | ApiCommand::SetArchived { generation, .. }
            | ApiCommand::Send { generation, .. } => Some(*generation),
            ApiCommand::MarkRead { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiEvent {
    MailboxLoaded {
        generation: u64,
        mailbox: Mailbox,
        emails: Vec<Email>,
    },
    EmailLoaded {
        generation: u64,
        email: Email,
    },
    ArchiveUpdated {
        generation: u64,
        id: i64,
        archived: bool,
    },
    SendCompleted {
        generation: u64,
        message: Option<String>,
    },
    SendRejected {
        generation: u64,
        error: String,
    },
    RequestFailed {
        generation: u64,
        context: RequestContext,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestContext {
    LoadMailbox(Mailbox),
    LoadEmail(i64),
    SetArchived { id: i64, archived: bool },
    Send,
}

#[derive(Clone)]
pub struct ApiEngine {
    tx: mpsc::Sender<ApiCommand>,
}

impl ApiEngine {
    /// Spawns the dispatch loop on the current tokio runtime. Every command runs on
    /// its own task; nothing orders or cancels them.
    pub fn start(backend: Arc<dyn MailBackend>) -> (Self, mpsc::Receiver<ApiEvent>) {
        let (cmd_tx, mut cmd_rx) = mpsc::channel::<ApiCommand>(API_CMD_QUEUE_CAPACITY);
        let (evt_tx, evt_rx) = mpsc::channel::<ApiEvent>(API_EVENT_QUEUE_CAPACITY);

        tokio::spawn(async move {
            while let Some(cmd) = cmd_rx.recv().await {
                let backend = backend.clone();
                let tx = evt_tx.clone();
                tokio::spawn(async move {
                    if let Some(event) = execute(backend.as_ref(), cmd).await {
                        if tx.send(event).await.is_err() {
                            debug!("api event receiver dropped");
                        }
                    }
                });
            }
        });

        (Self { tx: cmd_tx }, evt_rx)
    }

    /// Wraps an existing channel, for driving the UI without a backend.
    pub fn from_sender(tx: mpsc::Sender<ApiCommand>) -> Self {
        Self { tx }
    }

    pub fn send(&self, cmd: ApiCommand) -> Result<()> {
        match self.tx.try_send(cmd) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(cmd)) => {
                warn!(?cmd, "api cmd queue full, dropping");
                Err(anyhow!("api command queue full"))
            }
            Err(TrySendError::Closed(_)) => Err(anyhow!("api command queue closed")),
        }
    }
}

async fn execute(backend: &dyn MailBackend, cmd: ApiCommand) -> Option<ApiEvent> {
    match cmd {
        ApiCommand::LoadMailbox {
            generation,
            mailbox,
        } => match backend.list_mailbox(mailbox).await {
            Ok(emails) => Some(ApiEvent::MailboxLoaded {
                generation,
                mailbox,
                emails,
            }),
            Err(err) => Some(failed(generation, RequestContext::LoadMailbox(mailbox), err)),
        },
        ApiCommand::LoadEmail { generation, id } => match backend.get_email(id).await {
            Ok(email) => Some(ApiEvent::EmailLoaded { generation, email }),
            Err(err) => Some(failed(generation, RequestContext::LoadEmail(id), err)),
        },
        ApiCommand::MarkRead { id } => {
            if let Err(err) = backend.update_email(id, &EmailPatch::read(true)).await {
                error!(id, error = %err, "mark read failed");
            }
            None
        }
        ApiCommand::SetArchived {
            generation,
            id,
            archived,
        } => match backend
            .update_email(id, &EmailPatch::archived(archived))
            .await
        {
            Ok(()) => Some(ApiEvent::ArchiveUpdated {
                generation,
                id,
                archived,
            }),
            Err(err) => Some(failed(
                generation,
                RequestContext::SetArchived { id, archived },
                err,
            )),
        },
        ApiCommand::Send { generation, email } => match backend.send_email(&email).await {
            Ok(SendOutcome::Accepted { message }) => {
                Some(ApiEvent::SendCompleted { generation, message })
            }
            Ok(SendOutcome::Rejected { error }) => {
                Some(ApiEvent::SendRejected { generation, error })
            }
            Err(err) => Some(failed(generation, RequestContext::Send, err)),
        },
    }
}

fn failed(generation: u64, context: RequestContext, err: anyhow::Error) -> ApiEvent {
    error!(?context, error = %err, "request failed");
    ApiEvent::RequestFailed {
        generation,
        context,
        reason: err.to_string(),
    }
}
