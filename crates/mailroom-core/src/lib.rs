use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Mutex;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

mod memory;

pub use memory::{BackendCall, DEMO_USER, MemoryBackend};

pub const LOG_ENV: &str = "MAILROOM_LOG";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email {
    pub id: i64,
    pub sender: String,
    /// Absent from mailbox listings on some backends.
    #[serde(default)]
    pub recipients: Vec<String>,
    pub subject: String,
    #[serde(default)]
    pub body: String,
    pub timestamp: String,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub archived: bool,
}

impl Email {
    pub fn recipients_line(&self) -> String {
        self.recipients.join(", ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mailbox {
    Inbox,
    Sent,
    Archive,
}

impl Mailbox {
    pub const ALL: [Mailbox; 3] = [Mailbox::Inbox, Mailbox::Sent, Mailbox::Archive];

    /// Path segment used by the REST backend.
    pub fn as_str(self) -> &'static str {
        match self {
            Mailbox::Inbox => "inbox",
            Mailbox::Sent => "sent",
            Mailbox::Archive => "archive",
        }
    }

    pub fn heading(self) -> String {
        capitalize(self.as_str())
    }

    /// Sent items are never archivable from the listing.
    pub fn allows_archive(self) -> bool {
        self != Mailbox::Sent
    }
}

impl fmt::Display for Mailbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mailbox {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "inbox" => Ok(Mailbox::Inbox),
            "sent" => Ok(Mailbox::Sent),
            "archive" | "archived" => Ok(Mailbox::Archive),
            other => Err(anyhow!("unknown mailbox '{}'", other)),
        }
    }
}

pub fn capitalize(raw: &str) -> String {
    let mut chars = raw.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Body of `POST /emails`. `recipients` is the comma separated field text as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEmail {
    pub recipients: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived: Option<bool>,
}

impl EmailPatch {
    pub fn read(read: bool) -> Self {
        Self {
            read: Some(read),
            archived: None,
        }
    }

    pub fn archived(archived: bool) -> Self {
        Self {
            read: None,
            archived: Some(archived),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SendOutcome {
    Accepted { message: Option<String> },
    Rejected { error: String },
}

#[async_trait]
pub trait MailBackend: Send + Sync {
    async fn list_mailbox(&self, mailbox: Mailbox) -> Result<Vec<Email>>;
    async fn get_email(&self, id: i64) -> Result<Email>;
    async fn send_email(&self, email: &NewEmail) -> Result<SendOutcome>;
    async fn update_email(&self, id: i64, patch: &EmailPatch) -> Result<()>;
}

pub fn xdg_state_dir() -> PathBuf {
    std::env::var_os("XDG_STATE_HOME")
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".local").join("state"))
        })
        .unwrap_or_else(|| PathBuf::from("/tmp"))
}

pub fn log_path() -> PathBuf {
    xdg_state_dir().join("mailroom").join("mailroom.log")
}

/// Installs the file logger when `MAILROOM_LOG` is set. The terminal belongs to
/// the UI, so nothing is ever written to stdout or stderr.
pub fn init_logging() -> Result<bool> {
    let Ok(directive) = std::env::var(LOG_ENV) else {
        return Ok(false);
    };
    let path = log_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)?;
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(&directive))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|err| anyhow!(err.to_string()))?;
    tracing::info!(path = %path.display(), "logging initialized");
    Ok(true)
}

fn log_filter(directive: &str) -> EnvFilter {
    let trimmed = directive.trim();
    if trimmed.is_empty() || trimmed == "1" || trimmed.eq_ignore_ascii_case("true") {
        return EnvFilter::new("debug");
    }
    EnvFilter::try_new(trimmed).unwrap_or_else(|_| EnvFilter::new("debug"))
}
