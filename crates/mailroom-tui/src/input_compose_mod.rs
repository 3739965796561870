use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::debug;

use mailroom_core::Mailbox;

use super::{
    App, ComposeFocus, View, apply_input_key, move_cursor_left, move_cursor_right, text_char_len,
};
use crate::util_mod::insert_char_at;

impl App {
    pub(crate) fn on_key_compose(&mut self, key: KeyEvent) -> bool {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            if let KeyCode::Char('s') = key.code {
                self.send_mail();
            }
            return false;
        }
        if key.code == KeyCode::Esc {
            debug!("compose discarded");
            self.load_mailbox(Mailbox::Inbox);
            return false;
        }

        let View::Compose(view) = &mut self.view else {
            return false;
        };
        match key.code {
            KeyCode::Tab => view.focus = view.focus.next(),
            KeyCode::BackTab => view.focus = view.focus.prev(),
            KeyCode::Enter => {
                if view.focus == ComposeFocus::Body {
                    let (text, cursor) = view.focused_field_mut();
                    insert_char_at(text, cursor, '\n');
                } else {
                    view.focus = view.focus.next();
                }
            }
            KeyCode::Left => {
                let (text, cursor) = view.focused_field_mut();
                move_cursor_left(text, cursor);
            }
            KeyCode::Right => {
                let (text, cursor) = view.focused_field_mut();
                move_cursor_right(text, cursor);
            }
            KeyCode::Up | KeyCode::Down if view.focus == ComposeFocus::Body => {
                let up = key.code == KeyCode::Up;
                let (text, cursor) = view.focused_field_mut();
                *cursor = vertical_move(text, *cursor, up);
            }
            _ => {
                let (text, cursor) = view.focused_field_mut();
                apply_input_key(text, cursor, key);
            }
        }
        false
    }
}

/// Cursor index one line up or down, keeping the column where the line allows.
fn vertical_move(text: &str, cursor: usize, up: bool) -> usize {
    let lines: Vec<&str> = text.split('\n').collect();
    let mut remaining = cursor.min(text_char_len(text));
    let mut line = 0usize;
    for (idx, l) in lines.iter().enumerate() {
        let len = text_char_len(l);
        if remaining <= len {
            line = idx;
            break;
        }
        remaining -= len + 1;
    }
    let col = remaining;
    let target = if up {
        match line.checked_sub(1) {
            Some(target) => target,
            None => return cursor,
        }
    } else if line + 1 < lines.len() {
        line + 1
    } else {
        return cursor;
    };
    let start: usize = lines[..target].iter().map(|l| text_char_len(l) + 1).sum();
    start + col.min(text_char_len(lines[target]))
}
