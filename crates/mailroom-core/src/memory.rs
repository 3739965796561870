use std::sync::{Mutex, MutexGuard};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::Local;

use crate::{Email, EmailPatch, MailBackend, Mailbox, NewEmail, SendOutcome};

pub const DEMO_USER: &str = "me@example.com";

/// One request as it reached the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    List(Mailbox),
    Get(i64),
    Send(NewEmail),
    Update { id: i64, patch: EmailPatch },
}

#[derive(Debug, Clone)]
struct StoredEmail {
    owner: String,
    email: Email,
}

#[derive(Debug)]
struct State {
    user: String,
    users: Vec<String>,
    emails: Vec<StoredEmail>,
    next_id: i64,
    calls: Vec<BackendCall>,
    unavailable: bool,
}

/// In-process backend with the same mailbox semantics as the REST server: every
/// delivered message is copied once per participant, and each user only sees
/// their own copies.
#[derive(Debug)]
pub struct MemoryBackend {
    state: Mutex<State>,
}

impl MemoryBackend {
    pub fn new(user: &str, users: &[&str]) -> Self {
        let mut known: Vec<String> = users.iter().map(|u| u.to_string()).collect();
        if !known.iter().any(|u| u == user) {
            known.push(user.to_string());
        }
        Self {
            state: Mutex::new(State {
                user: user.to_string(),
                users: known,
                emails: Vec::new(),
                next_id: 1,
                calls: Vec::new(),
                unavailable: false,
            }),
        }
    }

    pub fn demo() -> Self {
        let backend = Self::new(
            DEMO_USER,
            &["alice@example.com", "bob@example.com", "carol@example.com"],
        );
        let seed = [
            (
                "alice@example.com",
                "Project kickoff",
                "Hi!\n\nThe kickoff is moved to Thursday. Agenda: https://example.com/agenda",
                "Mar 04 2024, 09:12 AM",
            ),
            (
                "bob@example.com",
                "Lunch?",
                "Are you free for lunch tomorrow?",
                "Mar 05 2024, 11:40 AM",
            ),
            (
                "carol@example.com",
                "Re: Quarterly numbers",
                "Numbers attached in the shared drive.",
                "Mar 06 2024, 04:05 PM",
            ),
        ];
        if let Ok(mut state) = backend.state() {
            for (sender, subject, body, timestamp) in seed {
                state.deliver(sender, &[DEMO_USER], subject, body, timestamp);
            }
            state.deliver(
                DEMO_USER,
                &["alice@example.com"],
                "Slides",
                "Draft slides are ready for review.",
                "Mar 06 2024, 05:30 PM",
            );
        }
        backend
    }

    /// Delivers a message as the server would and returns the id of the copy owned
    /// by the current user, if they take part in it.
    pub fn deliver(
        &self,
        sender: &str,
        recipients: &[&str],
        subject: &str,
        body: &str,
    ) -> Result<Option<i64>> {
        let timestamp = now_timestamp();
        let mut state = self.state()?;
        Ok(state.deliver(sender, recipients, subject, body, &timestamp))
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.state().map(|s| s.calls.clone()).unwrap_or_default()
    }

    pub fn take_calls(&self) -> Vec<BackendCall> {
        self.state()
            .map(|mut s| std::mem::take(&mut s.calls))
            .unwrap_or_default()
    }

    /// Makes every following request fail as if the network was down.
    pub fn set_unavailable(&self, unavailable: bool) {
        if let Ok(mut state) = self.state() {
            state.unavailable = unavailable;
        }
    }

    fn state(&self) -> Result<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| anyhow!("memory backend lock poisoned"))
    }

    fn begin(&self, call: BackendCall) -> Result<MutexGuard<'_, State>> {
        let mut state = self.state()?;
        state.calls.push(call);
        if state.unavailable {
            return Err(anyhow!("backend unavailable"));
        }
        Ok(state)
    }
}

impl State {
    fn deliver(
        &mut self,
        sender: &str,
        recipients: &[&str],
        subject: &str,
        body: &str,
        timestamp: &str,
    ) -> Option<i64> {
        let mut participants = vec![sender.to_string()];
        for recipient in recipients {
            if !participants.iter().any(|p| p == recipient) {
                participants.push(recipient.to_string());
            }
        }
        let mut own_id = None;
        for owner in participants {
            let id = self.next_id;
            self.next_id += 1;
            if owner == self.user && own_id.is_none() {
                own_id = Some(id);
            }
            self.emails.push(StoredEmail {
                email: Email {
                    id,
                    sender: sender.to_string(),
                    recipients: recipients.iter().map(|r| r.to_string()).collect(),
                    subject: subject.to_string(),
                    body: body.to_string(),
                    timestamp: timestamp.to_string(),
                    read: owner == sender,
                    archived: false,
                },
                owner,
            });
        }
        own_id
    }

    fn owned_mut(&mut self, id: i64) -> Option<&mut Email> {
        let user = self.user.clone();
        self.emails
            .iter_mut()
            .find(|s| s.owner == user && s.email.id == id)
            .map(|s| &mut s.email)
    }
}

fn now_timestamp() -> String {
    Local::now().format("%b %d %Y, %I:%M %p").to_string()
}

#[async_trait]
impl MailBackend for MemoryBackend {
    async fn list_mailbox(&self, mailbox: Mailbox) -> Result<Vec<Email>> {
        let state = self.begin(BackendCall::List(mailbox))?;
        let user = state.user.as_str();
        let mut emails: Vec<Email> = state
            .emails
            .iter()
            .filter(|s| s.owner == user)
            .map(|s| &s.email)
            .filter(|e| {
                let received = e.recipients.iter().any(|r| r == user);
                match mailbox {
                    Mailbox::Inbox => received && !e.archived,
                    Mailbox::Sent => e.sender == user,
                    Mailbox::Archive => received && e.archived,
                }
            })
            .cloned()
            .collect();
        // Newest first, like the server's reverse-chronological ordering.
        emails.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(emails)
    }

    async fn get_email(&self, id: i64) -> Result<Email> {
        let mut state = self.begin(BackendCall::Get(id))?;
        state
            .owned_mut(id)
            .map(|e| e.clone())
            .ok_or_else(|| anyhow!("Email not found."))
    }

    async fn send_email(&self, email: &NewEmail) -> Result<SendOutcome> {
        let timestamp = now_timestamp();
        let mut state = self.begin(BackendCall::Send(email.clone()))?;
        let recipients: Vec<String> = email
            .recipients
            .split(',')
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .collect();
        if recipients.is_empty() {
            return Ok(SendOutcome::Rejected {
                error: "At least one recipient required.".to_string(),
            });
        }
        if let Some(unknown) = recipients.iter().find(|r| !state.users.contains(r)) {
            return Ok(SendOutcome::Rejected {
                error: format!("User with email {} does not exist.", unknown),
            });
        }
        let sender = state.user.clone();
        let refs: Vec<&str> = recipients.iter().map(String::as_str).collect();
        state.deliver(&sender, &refs, &email.subject, &email.body, &timestamp);
        Ok(SendOutcome::Accepted {
            message: Some("Email sent successfully.".to_string()),
        })
    }

    async fn update_email(&self, id: i64, patch: &EmailPatch) -> Result<()> {
        let mut state = self.begin(BackendCall::Update {
            id,
            patch: patch.clone(),
        })?;
        let email = state
            .owned_mut(id)
            .ok_or_else(|| anyhow!("Email not found."))?;
        if let Some(read) = patch.read {
            email.read = read;
        }
        if let Some(archived) = patch.archived {
            email.archived = archived;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{BackendCall, DEMO_USER, MemoryBackend};
    use crate::{EmailPatch, MailBackend, Mailbox, NewEmail, SendOutcome};

    fn backend() -> MemoryBackend {
        MemoryBackend::new(DEMO_USER, &["alice@example.com", "bob@example.com"])
    }

    #[tokio::test]
    async fn inbox_lists_received_unarchived_newest_first() -> anyhow::Result<()> {
        let backend = backend();
        let first = backend.deliver("alice@example.com", &[DEMO_USER], "one", "1")?;
        let second = backend.deliver("bob@example.com", &[DEMO_USER], "two", "2")?;
        backend.deliver("alice@example.com", &["bob@example.com"], "hidden", "x")?;

        let inbox = backend.list_mailbox(Mailbox::Inbox).await?;
        let ids: Vec<i64> = inbox.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![second.unwrap(), first.unwrap()]);
        assert!(inbox.iter().all(|e| !e.read));
        Ok(())
    }

    #[tokio::test]
    async fn archiving_moves_between_inbox_and_archive() -> anyhow::Result<()> {
        let backend = backend();
        let id = backend
            .deliver("alice@example.com", &[DEMO_USER], "hello", "body")?
            .unwrap();

        backend.update_email(id, &EmailPatch::archived(true)).await?;
        assert!(backend.list_mailbox(Mailbox::Inbox).await?.is_empty());
        let archive = backend.list_mailbox(Mailbox::Archive).await?;
        assert_eq!(archive.len(), 1);
        assert!(archive[0].archived);

        backend.update_email(id, &EmailPatch::archived(false)).await?;
        assert_eq!(backend.list_mailbox(Mailbox::Inbox).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn send_creates_read_sent_copy() -> anyhow::Result<()> {
        let backend = backend();
        let outcome = backend
            .send_email(&NewEmail {
                recipients: "alice@example.com, bob@example.com".to_string(),
                subject: "Hi".to_string(),
                body: "Hey".to_string(),
            })
            .await?;
        assert!(matches!(outcome, SendOutcome::Accepted { .. }));

        let sent = backend.list_mailbox(Mailbox::Sent).await?;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].recipients, vec!["alice@example.com", "bob@example.com"]);
        assert!(sent[0].read);
        assert!(backend.list_mailbox(Mailbox::Inbox).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn send_rejects_missing_or_unknown_recipients() -> anyhow::Result<()> {
        let backend = backend();
        let empty = backend
            .send_email(&NewEmail {
                recipients: " , ".to_string(),
                ..NewEmail::default()
            })
            .await?;
        assert_eq!(
            empty,
            SendOutcome::Rejected {
                error: "At least one recipient required.".to_string()
            }
        );

        let unknown = backend
            .send_email(&NewEmail {
                recipients: "nobody@example.com".to_string(),
                ..NewEmail::default()
            })
            .await?;
        match unknown {
            SendOutcome::Rejected { error } => assert!(error.contains("nobody@example.com")),
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert!(backend.list_mailbox(Mailbox::Sent).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn get_only_returns_own_copies() -> anyhow::Result<()> {
        let backend = backend();
        backend.deliver("alice@example.com", &["bob@example.com"], "private", "x")?;
        let err = backend.get_email(1).await.unwrap_err();
        assert!(err.to_string().contains("not found"));
        Ok(())
    }

    #[tokio::test]
    async fn calls_are_recorded_even_when_unavailable() {
        let backend = backend();
        backend.set_unavailable(true);
        assert!(backend.list_mailbox(Mailbox::Sent).await.is_err());
        assert!(backend.update_email(3, &EmailPatch::read(true)).await.is_err());
        assert_eq!(
            backend.take_calls(),
            vec![
                BackendCall::List(Mailbox::Sent),
                BackendCall::Update {
                    id: 3,
                    patch: EmailPatch::read(true)
                },
            ]
        );
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn demo_seed_has_inbox_and_sent_items() -> anyhow::Result<()> {
        let backend = MemoryBackend::demo();
        assert_eq!(backend.list_mailbox(Mailbox::Inbox).await?.len(), 3);
        assert_eq!(backend.list_mailbox(Mailbox::Sent).await?.len(), 1);
        Ok(())
    }
}
