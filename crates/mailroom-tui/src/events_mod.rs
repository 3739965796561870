use tracing::{debug, error, info};

use mailroom_api::{ApiCommand, ApiEvent};
use mailroom_core::Mailbox;

use super::{App, View};

/// Inbox reload the app issued itself after an archive change. Toggles made
/// from the listing that preceded it stay valid while it is still shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ArchiveReload {
    pub(crate) generation: u64,
    pub(crate) issuers: Vec<u64>,
}

impl App {
    fn finish_request(&mut self) {
        self.pending = self.pending.saturating_sub(1);
    }

    fn is_current(&self, generation: u64, what: &str) -> bool {
        if generation == self.generation {
            return true;
        }
        debug!(
            generation,
            current = self.generation,
            what,
            "discarding stale response"
        );
        false
    }

    fn archive_completion_applies(&self, generation: u64) -> bool {
        if generation == self.generation {
            return true;
        }
        match &self.archive_reload {
            Some(reload) if reload.generation == self.generation => {
                reload.issuers.contains(&generation) || self.is_current(generation, "archive")
            }
            _ => self.is_current(generation, "archive"),
        }
    }

    fn reload_inbox_after_archive(&mut self, issuer: u64) {
        let mut issuers = match self.archive_reload.take() {
            Some(reload) if reload.generation == self.generation => reload.issuers,
            _ => Vec::new(),
        };
        if !issuers.contains(&issuer) {
            issuers.push(issuer);
        }
        self.load_mailbox(Mailbox::Inbox);
        self.archive_reload = Some(ArchiveReload {
            generation: self.generation,
            issuers,
        });
    }

    pub(crate) fn on_event(&mut self, event: ApiEvent) {
        self.finish_request();
        match event {
            ApiEvent::MailboxLoaded {
                generation,
                mailbox,
                emails,
            } => {
                if !self.is_current(generation, "mailbox") {
                    return;
                }
                match &mut self.view {
                    View::Mailbox(view) if view.mailbox == mailbox => {
                        debug!(%mailbox, count = emails.len(), "mailbox loaded");
                        view.fill(&emails);
                    }
                    _ => debug!(%mailbox, "mailbox view no longer shown"),
                }
            }
            ApiEvent::EmailLoaded { generation, email } => {
                if !self.is_current(generation, "email") {
                    return;
                }
                let shown = match &mut self.view {
                    View::Detail(view) if view.id == email.id => {
                        let id = email.id;
                        view.show(email);
                        Some(id)
                    }
                    _ => None,
                };
                if let Some(id) = shown {
                    self.dispatch(ApiCommand::MarkRead { id });
                }
            }
            ApiEvent::ArchiveUpdated {
                generation,
                id,
                archived,
            } => {
                info!(id, archived, "archive flag updated");
                if self.archive_completion_applies(generation) {
                    self.reload_inbox_after_archive(generation);
                }
            }
            ApiEvent::SendCompleted {
                generation,
                message,
            } => {
                info!(message = message.as_deref().unwrap_or(""), "email sent");
                if self.is_current(generation, "send") {
                    self.load_mailbox(Mailbox::Sent);
                }
            }
            ApiEvent::SendRejected { generation, error } => {
                error!(generation, error = %error, "send rejected by server");
            }
            ApiEvent::RequestFailed {
                generation,
                context,
                reason,
            } => {
                error!(generation, ?context, reason = %reason, "request failed");
                if !self.is_current(generation, "failure") {
                    return;
                }
                match &mut self.view {
                    View::Mailbox(view) => view.loading = false,
                    View::Detail(view) => view.loading = false,
                    View::Compose(_) => {}
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use mailroom_api::{ApiCommand, ApiEvent, RequestContext};
    use mailroom_core::{Mailbox, NewEmail};

    use crate::test_support::{drain_commands, sample_email, test_app};
    use crate::{ComposeMode, View};

    #[test]
    fn mailbox_response_fills_current_view() {
        let (mut app, _commands) = test_app();
        app.on_event(ApiEvent::MailboxLoaded {
            generation: app.generation,
            mailbox: Mailbox::Inbox,
            emails: vec![
                sample_email(2, "b", false, false),
                sample_email(1, "a", true, false),
            ],
        });
        match &app.view {
            View::Mailbox(view) => {
                assert_eq!(view.items.len(), 2);
                assert!(!view.loading);
            }
            other => panic!("unexpected view: {:?}", other),
        }
    }

    #[test]
    fn stale_mailbox_response_is_ignored() {
        let (mut app, mut commands) = test_app();
        let stale = app.generation;
        app.load_mailbox(Mailbox::Sent);
        drain_commands(&mut commands);

        app.on_event(ApiEvent::MailboxLoaded {
            generation: stale,
            mailbox: Mailbox::Inbox,
            emails: vec![sample_email(1, "late", false, false)],
        });

        match &app.view {
            View::Mailbox(view) => {
                assert_eq!(view.mailbox, Mailbox::Sent);
                assert!(view.items.is_empty());
                assert!(view.loading);
            }
            other => panic!("unexpected view: {:?}", other),
        }
    }

    #[test]
    fn opening_email_marks_read_exactly_once() {
        for already_read in [false, true] {
            let (mut app, mut commands) = test_app();
            app.view_email(5);
            drain_commands(&mut commands);

            app.on_event(ApiEvent::EmailLoaded {
                generation: app.generation,
                email: sample_email(5, "hello", already_read, false),
            });

            assert_eq!(
                drain_commands(&mut commands),
                vec![ApiCommand::MarkRead { id: 5 }]
            );
            match &app.view {
                View::Detail(view) => assert_eq!(view.email.as_ref().map(|e| e.id), Some(5)),
                other => panic!("unexpected view: {:?}", other),
            }
        }
    }

    #[test]
    fn stale_email_response_does_not_mark_read() {
        let (mut app, mut commands) = test_app();
        app.view_email(5);
        let stale = app.generation;
        app.load_mailbox(Mailbox::Inbox);
        drain_commands(&mut commands);

        app.on_event(ApiEvent::EmailLoaded {
            generation: stale,
            email: sample_email(5, "hello", false, false),
        });

        assert!(drain_commands(&mut commands).is_empty());
        assert!(matches!(app.view, View::Mailbox(_)));
    }

    #[test]
    fn archive_update_reloads_inbox() {
        let (mut app, mut commands) = test_app();
        app.load_mailbox(Mailbox::Archive);
        drain_commands(&mut commands);

        app.on_event(ApiEvent::ArchiveUpdated {
            generation: app.generation,
            id: 3,
            archived: false,
        });

        let generation = app.generation;
        assert_eq!(
            drain_commands(&mut commands),
            vec![ApiCommand::LoadMailbox {
                generation,
                mailbox: Mailbox::Inbox
            }]
        );
        match &app.view {
            View::Mailbox(view) => assert_eq!(view.mailbox, Mailbox::Inbox),
            other => panic!("unexpected view: {:?}", other),
        }
    }

    #[test]
    fn toggles_from_one_listing_each_reload_inbox() {
        let (mut app, mut commands) = test_app();
        let listing = app.generation;
        app.on_event(ApiEvent::MailboxLoaded {
            generation: listing,
            mailbox: Mailbox::Inbox,
            emails: vec![
                sample_email(9, "first", false, false),
                sample_email(8, "second", false, false),
            ],
        });
        app.toggle_archive_selected();
        if let View::Mailbox(view) = &mut app.view {
            view.select_next();
        }
        app.toggle_archive_selected();
        assert_eq!(drain_commands(&mut commands).len(), 2);

        app.on_event(ApiEvent::ArchiveUpdated {
            generation: listing,
            id: 9,
            archived: true,
        });
        assert_eq!(
            drain_commands(&mut commands),
            vec![ApiCommand::LoadMailbox {
                generation: listing + 1,
                mailbox: Mailbox::Inbox
            }]
        );

        app.on_event(ApiEvent::ArchiveUpdated {
            generation: listing,
            id: 8,
            archived: true,
        });
        assert_eq!(
            drain_commands(&mut commands),
            vec![ApiCommand::LoadMailbox {
                generation: listing + 2,
                mailbox: Mailbox::Inbox
            }]
        );
    }

    #[test]
    fn archive_completion_after_navigating_away_is_dropped() {
        let (mut app, mut commands) = test_app();
        let listing = app.generation;
        app.on_event(ApiEvent::ArchiveUpdated {
            generation: listing,
            id: 9,
            archived: true,
        });
        app.load_mailbox(Mailbox::Sent);
        drain_commands(&mut commands);

        app.on_event(ApiEvent::ArchiveUpdated {
            generation: listing,
            id: 8,
            archived: true,
        });

        assert!(drain_commands(&mut commands).is_empty());
        match &app.view {
            View::Mailbox(view) => assert_eq!(view.mailbox, Mailbox::Sent),
            other => panic!("unexpected view: {:?}", other),
        }
    }

    #[test]
    fn accepted_send_switches_to_sent() {
        let (mut app, mut commands) = test_app();
        app.compose_view(ComposeMode::Blank);

        app.on_event(ApiEvent::SendCompleted {
            generation: app.generation,
            message: Some("Email sent successfully.".to_string()),
        });

        match &app.view {
            View::Mailbox(view) => assert_eq!(view.mailbox, Mailbox::Sent),
            other => panic!("unexpected view: {:?}", other),
        }
        assert!(matches!(
            drain_commands(&mut commands).as_slice(),
            [ApiCommand::LoadMailbox {
                mailbox: Mailbox::Sent,
                ..
            }]
        ));
    }

    #[test]
    fn rejected_send_keeps_form_populated() {
        let (mut app, mut commands) = test_app();
        app.compose_view(ComposeMode::Blank);
        if let View::Compose(view) = &mut app.view {
            view.recipients = "ghost@example.com".to_string();
            view.subject = "Hi".to_string();
            view.body = "Hey".to_string();
        }

        app.on_event(ApiEvent::SendRejected {
            generation: app.generation,
            error: "User with email ghost@example.com does not exist.".to_string(),
        });
        app.on_event(ApiEvent::RequestFailed {
            generation: app.generation,
            context: RequestContext::Send,
            reason: "timed out".to_string(),
        });

        match &app.view {
            View::Compose(view) => assert_eq!(
                view.to_new_email(),
                NewEmail {
                    recipients: "ghost@example.com".to_string(),
                    subject: "Hi".to_string(),
                    body: "Hey".to_string(),
                }
            ),
            other => panic!("unexpected view: {:?}", other),
        }
        assert!(drain_commands(&mut commands).is_empty());
    }

    #[test]
    fn failed_load_leaves_heading_without_items() {
        let (mut app, _commands) = test_app();
        app.on_event(ApiEvent::RequestFailed {
            generation: app.generation,
            context: RequestContext::LoadMailbox(Mailbox::Inbox),
            reason: "connection refused".to_string(),
        });
        match &app.view {
            View::Mailbox(view) => {
                assert_eq!(view.heading, "Inbox");
                assert!(view.items.is_empty());
                assert!(!view.loading);
            }
            other => panic!("unexpected view: {:?}", other),
        }
    }
}
