use std::sync::Arc;

use anyhow::{Result, anyhow};
use serde_json::{Value as JsonValue, json};
use tracing::{info, warn};

use mailroom_core::{EmailPatch, MailBackend, Mailbox, NewEmail, SendOutcome};

use super::{CliCommand, output_error, output_ok};

pub(crate) fn run_cli(
    rt: &Arc<tokio::runtime::Runtime>,
    command: CliCommand,
    backend: &dyn MailBackend,
) -> Result<()> {
    match rt.block_on(execute_cli(command, backend)) {
        Ok(value) => output_ok(value),
        Err(err) => output_error(&err.to_string()),
    }
}

pub(crate) async fn execute_cli(command: CliCommand, backend: &dyn MailBackend) -> Result<JsonValue> {
    match command {
        CliCommand::Mailbox(args) => {
            let mailbox: Mailbox = args.name.parse()?;
            let emails = backend.list_mailbox(mailbox).await?;
            info!(%mailbox, count = emails.len(), "cli mailbox");
            Ok(json!(emails))
        }
        CliCommand::Show(args) => {
            let email = backend.get_email(args.id).await?;
            if !args.no_mark_read {
                if let Err(err) = backend.update_email(args.id, &EmailPatch::read(true)).await {
                    warn!(id = args.id, error = %err, "cli mark read failed");
                }
            }
            Ok(json!(email))
        }
        CliCommand::Send(args) => {
            let email = NewEmail {
                recipients: args.to,
                subject: args.subject,
                body: args.body,
            };
            match backend.send_email(&email).await? {
                SendOutcome::Rejected { error } => Err(anyhow!(error)),
                outcome => Ok(serde_json::to_value(outcome)?),
            }
        }
        CliCommand::Archive(args) => set_archived(backend, args.id, true).await,
        CliCommand::Unarchive(args) => set_archived(backend, args.id, false).await,
    }
}

async fn set_archived(backend: &dyn MailBackend, id: i64, archived: bool) -> Result<JsonValue> {
    backend
        .update_email(id, &EmailPatch::archived(archived))
        .await?;
    Ok(json!({ "id": id, "archived": archived }))
}

#[cfg(test)]
mod tests {
    use mailroom_core::{BackendCall, DEMO_USER, EmailPatch, MemoryBackend, NewEmail};

    use super::execute_cli;
    use crate::cli::{CliCommand, IdCmd, MailboxCmd, SendCmd, ShowCmd};

    fn backend() -> MemoryBackend {
        MemoryBackend::new(DEMO_USER, &["alice@example.com"])
    }

    #[tokio::test]
    async fn mailbox_lists_emails_as_json() -> anyhow::Result<()> {
        let backend = backend();
        backend.deliver("alice@example.com", &[DEMO_USER], "hello", "body")?;

        let value = execute_cli(
            CliCommand::Mailbox(MailboxCmd {
                name: "Inbox".to_string(),
            }),
            &backend,
        )
        .await?;

        assert_eq!(value.as_array().map(Vec::len), Some(1));
        assert_eq!(value[0]["subject"], "hello");
        Ok(())
    }

    #[tokio::test]
    async fn unknown_mailbox_is_an_error() {
        let err = execute_cli(
            CliCommand::Mailbox(MailboxCmd {
                name: "spam".to_string(),
            }),
            &backend(),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("spam"));
    }

    #[tokio::test]
    async fn show_marks_read_unless_disabled() -> anyhow::Result<()> {
        let backend = backend();
        let id = backend
            .deliver("alice@example.com", &[DEMO_USER], "hello", "")?
            .unwrap();

        execute_cli(
            CliCommand::Show(ShowCmd {
                id,
                no_mark_read: true,
            }),
            &backend,
        )
        .await?;
        assert_eq!(backend.take_calls(), vec![BackendCall::Get(id)]);

        execute_cli(
            CliCommand::Show(ShowCmd {
                id,
                no_mark_read: false,
            }),
            &backend,
        )
        .await?;
        assert_eq!(
            backend.take_calls(),
            vec![
                BackendCall::Get(id),
                BackendCall::Update {
                    id,
                    patch: EmailPatch::read(true)
                }
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn send_reports_outcome() -> anyhow::Result<()> {
        let backend = backend();
        let value = execute_cli(
            CliCommand::Send(SendCmd {
                to: "alice@example.com".to_string(),
                subject: "Hi".to_string(),
                body: "Hey".to_string(),
            }),
            &backend,
        )
        .await?;
        assert_eq!(value["status"], "accepted");
        assert_eq!(
            backend.take_calls(),
            vec![BackendCall::Send(NewEmail {
                recipients: "alice@example.com".to_string(),
                subject: "Hi".to_string(),
                body: "Hey".to_string(),
            })]
        );

        let err = execute_cli(
            CliCommand::Send(SendCmd {
                to: "ghost@example.com".to_string(),
                subject: "Hi".to_string(),
                body: String::new(),
            }),
            &backend,
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("ghost@example.com"));
        Ok(())
    }

    #[tokio::test]
    async fn archive_and_unarchive_issue_puts() -> anyhow::Result<()> {
        let backend = backend();
        let id = backend
            .deliver("alice@example.com", &[DEMO_USER], "old news", "")?
            .unwrap();
        let value = execute_cli(CliCommand::Archive(IdCmd { id }), &backend).await?;
        assert_eq!(value["archived"], true);
        execute_cli(CliCommand::Unarchive(IdCmd { id }), &backend).await?;
        assert_eq!(
            backend.take_calls(),
            vec![
                BackendCall::Update {
                    id,
                    patch: EmailPatch::archived(true)
                },
                BackendCall::Update {
                    id,
                    patch: EmailPatch::archived(false)
                },
            ]
        );
        Ok(())
    }
}
