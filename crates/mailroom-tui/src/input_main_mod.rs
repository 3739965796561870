use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};

use mailroom_core::Mailbox;

use super::{App, ComposeMode, View};

impl App {
    /// Returns true when the app should exit.
    pub(crate) fn on_key(&mut self, key: KeyEvent) -> bool {
        if key.kind == KeyEventKind::Release {
            return false;
        }
        match self.view {
            View::Compose(_) => self.on_key_compose(key),
            View::Mailbox(_) | View::Detail(_) => self.on_key_main(key),
        }
    }

    pub(crate) fn on_key_main(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Char('i') => self.load_mailbox(Mailbox::Inbox),
            KeyCode::Char('s') => self.load_mailbox(Mailbox::Sent),
            KeyCode::Char('A') => self.load_mailbox(Mailbox::Archive),
            KeyCode::Char('c') => self.compose_view(ComposeMode::Blank),
            KeyCode::Char('?') => self.show_help = !self.show_help,
            _ => {
                if matches!(self.view, View::Mailbox(_)) {
                    self.on_key_mailbox(key);
                } else {
                    self.on_key_detail(key);
                }
            }
        }
        false
    }

    fn on_key_mailbox(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                if let View::Mailbox(view) = &mut self.view {
                    view.select_next();
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                if let View::Mailbox(view) = &mut self.view {
                    view.select_prev();
                }
            }
            KeyCode::Enter => self.open_selected(),
            KeyCode::Char('a') => self.toggle_archive_selected(),
            KeyCode::Char('r') => self.reload_current(),
            _ => {}
        }
    }

    fn on_key_detail(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                if let View::Detail(view) = &mut self.view {
                    view.scroll_down();
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                if let View::Detail(view) = &mut self.view {
                    view.scroll_up();
                }
            }
            KeyCode::Char('R') | KeyCode::Enter => self.reply_current(),
            KeyCode::Char('r') => self.reload_current(),
            KeyCode::Esc | KeyCode::Backspace => self.back_to_mailbox(),
            _ => {}
        }
    }
}
