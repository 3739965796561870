use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::Rect;
use unicode_width::UnicodeWidthChar as _;

pub(crate) fn apply_input_key(target: &mut String, cursor: &mut usize, key: KeyEvent) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return false;
    }
    match key.code {
        KeyCode::Backspace => {
            if *cursor > 0 {
                remove_char_at(target, *cursor - 1);
                *cursor -= 1;
                return true;
            }
        }
        KeyCode::Delete => {
            let len = text_char_len(target);
            if *cursor < len {
                remove_char_at(target, *cursor);
                return true;
            }
        }
        KeyCode::Char(c) => {
            insert_char_at(target, cursor, c);
            return true;
        }
        KeyCode::Home => {
            *cursor = 0;
            return true;
        }
        KeyCode::End => {
            *cursor = text_char_len(target);
            return true;
        }
        _ => {}
    }
    *cursor = clamp_cursor(*cursor, target);
    false
}

pub(crate) fn insert_char_at(target: &mut String, cursor: &mut usize, c: char) {
    let idx = char_to_byte_idx(target, *cursor);
    target.insert_str(idx, c.encode_utf8(&mut [0; 4]));
    *cursor += 1;
}

pub(crate) fn text_char_len(text: &str) -> usize {
    text.chars().count()
}

pub(crate) fn clamp_cursor(cursor: usize, text: &str) -> usize {
    cursor.min(text_char_len(text))
}

pub(crate) fn char_to_byte_idx(text: &str, char_idx: usize) -> usize {
    if char_idx == 0 {
        return 0;
    }
    let mut count = 0usize;
    for (byte_idx, _) in text.char_indices() {
        if count == char_idx {
            return byte_idx;
        }
        count += 1;
    }
    text.len()
}

pub(crate) fn remove_char_at(text: &mut String, char_idx: usize) {
    let start = char_to_byte_idx(text, char_idx);
    let end = char_to_byte_idx(text, char_idx + 1);
    if start < end {
        text.replace_range(start..end, "");
    }
}

pub(crate) fn move_cursor_left(text: &str, cursor: &mut usize) {
    let len = text_char_len(text);
    *cursor = (*cursor).min(len);
    if *cursor > 0 {
        *cursor -= 1;
    }
}

pub(crate) fn move_cursor_right(text: &str, cursor: &mut usize) {
    let len = text_char_len(text);
    *cursor = (*cursor).min(len);
    if *cursor < len {
        *cursor += 1;
    }
}

pub(crate) fn cursor_line_col(text: &str, cursor: usize) -> (usize, usize) {
    let mut line = 0usize;
    let mut col = 0usize;
    let max = clamp_cursor(cursor, text);
    for (idx, ch) in text.chars().enumerate() {
        if idx == max {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 0;
        } else {
            col += ch.width().unwrap_or(0);
        }
    }
    (line, col)
}

/// Offset that keeps `pos` inside a window of `extent` cells.
pub(crate) fn scroll_to_cursor(pos: usize, extent: u16) -> u16 {
    let offset = pos.saturating_sub(extent.saturating_sub(1) as usize);
    u16::try_from(offset).unwrap_or(u16::MAX)
}

/// `scroll` is the (rows, cols) offset the text was rendered with.
pub(crate) fn set_cursor_at(
    frame: &mut ratatui::Frame,
    area: Rect,
    text: &str,
    cursor: usize,
    scroll: (u16, u16),
) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    let (line, col) = cursor_line_col(text, cursor);
    let line = line.saturating_sub(scroll.0 as usize);
    let col = col.saturating_sub(scroll.1 as usize);
    let max_x = area.width.saturating_sub(1) as usize;
    let max_y = area.height.saturating_sub(1) as usize;
    let x = area.x + col.min(max_x) as u16;
    let y = area.y + line.min(max_y) as u16;
    frame.set_cursor_position((x, y));
}

/// Cuts to `max_width` display columns, ending in "..." when shortened.
pub(crate) fn truncate_label(label: &str, max_width: usize) -> String {
    let text = label.replace(['\n', '\r'], " ");
    let width: usize = text.chars().map(|c| c.width().unwrap_or(0)).sum();
    if width <= max_width {
        return text;
    }
    let budget = max_width.saturating_sub(3);
    let mut out = String::new();
    let mut used = 0usize;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(ch);
    }
    if max_width > 3 {
        out.push_str("...");
    }
    out
}
