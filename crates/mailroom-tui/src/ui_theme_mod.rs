use ratatui::style::{Color, Modifier, Style};
use tracing::warn;

use super::UiTheme;

pub(crate) const THEME_NAMES: [&str; 3] = ["default", "nord", "gruvbox"];

impl UiTheme {
    pub(crate) fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "" | "default" => Self::default_theme(),
            "nord" => Self::nord(),
            "gruvbox" => Self::gruvbox(),
            other => {
                warn!(theme = other, known = ?THEME_NAMES, "unknown ui.theme; using default");
                Self::default_theme()
            }
        }
    }

    pub(crate) fn default_theme() -> Self {
        Self {
            base: Style::default(),
            border: Style::default().fg(Color::DarkGray),
            bar: Style::default(),
            show_bars: true,
            accent: Style::default().fg(Color::Black).bg(Color::Cyan),
            focus_bg: Style::default().bg(Color::DarkGray),
            table_header: Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::BOLD),
            unread: Style::default().add_modifier(Modifier::BOLD),
            read: Style::default().fg(Color::Gray),
            link: Style::default()
                .fg(Color::LightBlue)
                .add_modifier(Modifier::UNDERLINED),
            label: Style::default().fg(Color::Gray),
            label_focus: Style::default().fg(Color::Yellow),
            control: Style::default().fg(Color::Cyan),
            separator: Style::default().fg(Color::DarkGray),
        }
    }

    pub(crate) fn nord() -> Self {
        let nord0 = Color::Rgb(46, 52, 64);
        let nord2 = Color::Rgb(67, 76, 94);
        let nord4 = Color::Rgb(216, 222, 233);
        let nord6 = Color::Rgb(236, 239, 244);
        let nord8 = Color::Rgb(136, 192, 208);
        let nord13 = Color::Rgb(235, 203, 139);
        Self {
            base: Style::default().fg(nord6).bg(nord0),
            border: Style::default().fg(nord4),
            bar: Style::default().fg(nord6).bg(nord2),
            show_bars: false,
            accent: Style::default().fg(nord0).bg(nord8),
            focus_bg: Style::default().bg(nord2),
            table_header: Style::default().fg(nord6).add_modifier(Modifier::BOLD),
            unread: Style::default().fg(nord6).add_modifier(Modifier::BOLD),
            read: Style::default().fg(nord4),
            link: Style::default()
                .fg(nord8)
                .add_modifier(Modifier::UNDERLINED),
            label: Style::default().fg(nord4),
            label_focus: Style::default().fg(nord13),
            control: Style::default().fg(nord8),
            separator: Style::default().fg(nord4),
        }
    }

    pub(crate) fn gruvbox() -> Self {
        let bg = Color::Rgb(40, 40, 40);
        let bg_alt = Color::Rgb(60, 56, 54);
        let fg = Color::Rgb(235, 219, 178);
        let border = Color::Rgb(146, 131, 116);
        let accent = Color::Rgb(131, 165, 152);
        let warn = Color::Rgb(250, 189, 47);
        Self {
            base: Style::default().fg(fg).bg(bg),
            border: Style::default().fg(border),
            bar: Style::default().fg(fg).bg(bg_alt),
            show_bars: false,
            accent: Style::default().fg(bg).bg(accent),
            focus_bg: Style::default().bg(bg_alt),
            table_header: Style::default().fg(fg).add_modifier(Modifier::BOLD),
            unread: Style::default().fg(fg).add_modifier(Modifier::BOLD),
            read: Style::default().fg(border),
            link: Style::default()
                .fg(accent)
                .add_modifier(Modifier::UNDERLINED),
            label: Style::default().fg(border),
            label_focus: Style::default().fg(warn),
            control: Style::default().fg(accent),
            separator: Style::default().fg(border),
        }
    }
}
