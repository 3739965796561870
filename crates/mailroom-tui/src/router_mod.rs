use tracing::{debug, error};

use mailroom_api::ApiCommand;
use mailroom_core::Mailbox;

use super::{App, ComposeMode, ComposeView, DetailView, MailboxView, View};

impl App {
    /// Every navigation goes through here; events from earlier generations are stale.
    pub(crate) fn begin_transition(&mut self) -> u64 {
        self.generation = self.generation.wrapping_add(1);
        self.generation
    }

    pub(crate) fn dispatch(&mut self, cmd: ApiCommand) {
        let tracked = cmd.generation().is_some();
        match self.engine.send(cmd) {
            Ok(()) => {
                if tracked {
                    self.pending += 1;
                }
            }
            Err(err) => error!(error = %err, "failed to queue request"),
        }
    }

    pub(crate) fn load_mailbox(&mut self, mailbox: Mailbox) {
        let generation = self.begin_transition();
        debug!(%mailbox, generation, "load mailbox");
        self.last_mailbox = mailbox;
        self.view = View::Mailbox(MailboxView::new(mailbox));
        self.dispatch(ApiCommand::LoadMailbox {
            generation,
            mailbox,
        });
    }

    pub(crate) fn view_email(&mut self, id: i64) {
        let origin = match &self.view {
            View::Mailbox(view) => view.mailbox,
            _ => self.last_mailbox,
        };
        let generation = self.begin_transition();
        debug!(id, generation, "view email");
        self.view = View::Detail(DetailView::loading(id, origin));
        self.dispatch(ApiCommand::LoadEmail { generation, id });
    }

    pub(crate) fn compose_view(&mut self, mode: ComposeMode) {
        let generation = self.begin_transition();
        debug!(generation, reply = matches!(mode, ComposeMode::ReplyTo(_)), "compose");
        self.view = View::Compose(ComposeView::open(mode));
    }

    /// Leaves detail or compose for the mailbox that was last listed.
    pub(crate) fn back_to_mailbox(&mut self) {
        let target = match &self.view {
            View::Detail(view) => view.origin,
            _ => self.last_mailbox,
        };
        self.load_mailbox(target);
    }

    pub(crate) fn reload_current(&mut self) {
        match &self.view {
            View::Mailbox(view) => {
                let mailbox = view.mailbox;
                self.load_mailbox(mailbox);
            }
            View::Detail(view) => {
                let id = view.id;
                self.view_email(id);
            }
            View::Compose(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use mailroom_api::ApiCommand;
    use mailroom_core::Mailbox;

    use crate::test_support::{drain_commands, test_app};
    use crate::{ComposeMode, View};

    #[test]
    fn startup_loads_inbox() {
        let (app, _commands) = test_app();
        match &app.view {
            View::Mailbox(view) => {
                assert_eq!(view.mailbox, Mailbox::Inbox);
                assert_eq!(view.heading, "Inbox");
            }
            other => panic!("unexpected view: {:?}", other),
        }
        assert_eq!(app.generation, 1);
    }

    #[test]
    fn every_transition_bumps_generation() {
        let (mut app, mut commands) = test_app();
        let start = app.generation;

        app.load_mailbox(Mailbox::Sent);
        app.view_email(4);
        app.compose_view(ComposeMode::Blank);

        assert_eq!(app.generation, start + 3);
        assert_eq!(
            drain_commands(&mut commands),
            vec![
                ApiCommand::LoadMailbox {
                    generation: start + 1,
                    mailbox: Mailbox::Sent
                },
                ApiCommand::LoadEmail {
                    generation: start + 2,
                    id: 4
                },
            ]
        );
    }

    #[test]
    fn detail_remembers_origin_mailbox() {
        let (mut app, mut commands) = test_app();
        app.load_mailbox(Mailbox::Archive);
        app.view_email(11);
        app.back_to_mailbox();
        drain_commands(&mut commands);

        match &app.view {
            View::Mailbox(view) => assert_eq!(view.mailbox, Mailbox::Archive),
            other => panic!("unexpected view: {:?}", other),
        }
    }

    #[test]
    fn compose_view_issues_no_request() {
        let (mut app, mut commands) = test_app();
        let pending = app.pending;
        app.compose_view(ComposeMode::Blank);
        assert!(drain_commands(&mut commands).is_empty());
        assert_eq!(app.pending, pending);
    }
}
