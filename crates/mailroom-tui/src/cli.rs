use clap::{Args, Parser, Subcommand};

use super::{CLI_SCHEMA_VERSION, shell_split};

#[path = "cli_command_handlers.rs"]
mod cli_command_handlers;
#[path = "cli_runtime_helpers.rs"]
mod cli_runtime_helpers;

pub(crate) use cli_command_handlers::run_cli;
pub(crate) use cli_runtime_helpers::{output_error, output_ok, resolve_cli_command};

#[derive(Parser, Debug)]
#[command(name = "mailroom", version, about = "Terminal client for a REST mail backend")]
pub(crate) struct Cli {
    /// Run one command given as a single shell-quoted string.
    #[arg(short = 'c', long = "cmd")]
    cmd: Option<String>,
    /// Use the in-memory demo backend instead of the HTTP server.
    #[arg(long, global = true)]
    pub(crate) demo: bool,
    #[command(subcommand)]
    pub(crate) command: Option<CliCommand>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub(crate) enum CliCommand {
    /// List a mailbox: inbox, sent or archive.
    Mailbox(MailboxCmd),
    /// Show one email.
    Show(ShowCmd),
    Send(SendCmd),
    Archive(IdCmd),
    Unarchive(IdCmd),
}

#[derive(Args, Debug, PartialEq, Eq)]
pub(crate) struct MailboxCmd {
    pub(crate) name: String,
}

#[derive(Args, Debug, PartialEq, Eq)]
pub(crate) struct ShowCmd {
    pub(crate) id: i64,
    #[arg(long)]
    pub(crate) no_mark_read: bool,
}

#[derive(Args, Debug, PartialEq, Eq)]
pub(crate) struct SendCmd {
    /// Comma separated recipient addresses.
    #[arg(long)]
    pub(crate) to: String,
    #[arg(long)]
    pub(crate) subject: String,
    #[arg(long, default_value = "")]
    pub(crate) body: String,
}

#[derive(Args, Debug, PartialEq, Eq)]
pub(crate) struct IdCmd {
    pub(crate) id: i64,
}
