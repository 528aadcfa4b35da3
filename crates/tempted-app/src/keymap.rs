// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::fmt;

use crate::pages::Page;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCode {
    Char(char),
    Enter,
    Esc,
    Backspace,
    Tab,
    Up,
    Down,
    Left,
    Right,
    PageUp,
    PageDown,
    Home,
    End,
    Other,
}

/// A terminal-independent key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Key {
    pub code: KeyCode,
    pub ctrl: bool,
}

impl Key {
    pub const fn new(code: KeyCode) -> Self {
        Self { code, ctrl: false }
    }

    pub const fn char(value: char) -> Self {
        Self::new(KeyCode::Char(value))
    }

    pub const fn ctrl(value: char) -> Self {
        Self {
            code: KeyCode::Char(value),
            ctrl: true,
        }
    }

    pub fn name(&self) -> String {
        let base = match self.code {
            KeyCode::Char(' ') => "space".to_owned(),
            KeyCode::Char(value) => value.to_string(),
            KeyCode::Enter => "enter".to_owned(),
            KeyCode::Esc => "esc".to_owned(),
            KeyCode::Backspace => "backspace".to_owned(),
            KeyCode::Tab => "tab".to_owned(),
            KeyCode::Up => "up".to_owned(),
            KeyCode::Down => "down".to_owned(),
            KeyCode::Left => "left".to_owned(),
            KeyCode::Right => "right".to_owned(),
            KeyCode::PageUp => "pgup".to_owned(),
            KeyCode::PageDown => "pgdown".to_owned(),
            KeyCode::Home => "home".to_owned(),
            KeyCode::End => "end".to_owned(),
            KeyCode::Other => "unknown".to_owned(),
        };
        if self.ctrl {
            format!("ctrl+{base}")
        } else {
            base
        }
    }

    /// Printable character for text entry, if any.
    pub const fn text(&self) -> Option<char> {
        match self.code {
            KeyCode::Char(value) if !self.ctrl => Some(value),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    keys: &'static [&'static str],
    help_key: &'static str,
    help_desc: &'static str,
}

impl Binding {
    pub const fn new(
        keys: &'static [&'static str],
        help_key: &'static str,
        help_desc: &'static str,
    ) -> Self {
        Self {
            keys,
            help_key,
            help_desc,
        }
    }

    pub fn matches(&self, key: &Key) -> bool {
        let name = key.name();
        self.keys.iter().any(|candidate| *candidate == name)
    }

    pub fn help(&self) -> HelpEntry {
        self.help_as(self.help_desc)
    }

    pub fn help_as(&self, desc: impl Into<String>) -> HelpEntry {
        HelpEntry {
            key: self.help_key,
            desc: desc.into(),
        }
    }
}

pub const BACK: Binding = Binding::new(&["esc"], "esc", "back");
pub const EXIT: Binding = Binding::new(&["q", "ctrl+c"], "q/ctrl+c", "exit");
pub const FILTER: Binding = Binding::new(&["/"], "/", "filter");
pub const FORWARD: Binding = Binding::new(&["enter"], "enter", "enter");
pub const RELOAD: Binding = Binding::new(&["r"], "r", "reload");
pub const TERM: Binding = Binding::new(&["t"], "t", "term");
pub const WRAP: Binding = Binding::new(&["ctrl+w"], "ctrl+w", "toggle wrap");

pub const SAVE: Binding = Binding::new(&["s"], "s", "save");
pub const DOWN: Binding = Binding::new(&["down", "j"], "↓/j", "down");
pub const UP: Binding = Binding::new(&["up", "k"], "↑/k", "up");
pub const HALF_PAGE_DOWN: Binding = Binding::new(&["ctrl+d"], "ctrl+d", "½ page down");
pub const HALF_PAGE_UP: Binding = Binding::new(&["ctrl+u"], "ctrl+u", "½ page up");
pub const PAGE_DOWN: Binding = Binding::new(&["pgdown", "f"], "f/pgdn", "page down");
pub const PAGE_UP: Binding = Binding::new(&["pgup", "b"], "b/pgup", "page up");
pub const BOTTOM: Binding = Binding::new(&["G", "end"], "G", "bottom");
pub const TOP: Binding = Binding::new(&["g", "home"], "g", "top");
pub const LEFT: Binding = Binding::new(&["left", "h"], "←/h", "left");
pub const RIGHT: Binding = Binding::new(&["right", "l"], "→/l", "right");

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelpEntry {
    pub key: &'static str,
    pub desc: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyHelp {
    pub rows: Vec<Vec<HelpEntry>>,
}

impl KeyHelp {
    pub fn line_count(&self) -> usize {
        self.rows.len()
    }

    pub fn contains(&self, key: &str, desc: &str) -> bool {
        self.rows
            .iter()
            .flatten()
            .any(|entry| entry.key == key && entry.desc == desc)
    }
}

impl fmt::Display for KeyHelp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines = self
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|entry| format!("{} {}", entry.key, entry.desc))
                    .collect::<Vec<_>>()
                    .join("    ")
            })
            .collect::<Vec<_>>();
        write!(f, "{}", lines.join("\n"))
    }
}

/// Key help for the current page and input state.
pub fn page_key_help(
    page: Page,
    filter_focused: bool,
    filter_applied: bool,
    saving: bool,
    entering_input: bool,
) -> KeyHelp {
    let mut first_row = vec![EXIT.help()];
    if page.does_reload() && !saving && !filter_focused {
        first_row.push(RELOAD.help());
    }

    if saving {
        let second_row = vec![BACK.help_as("cancel save"), FORWARD.help_as("confirm save")];
        return KeyHelp {
            rows: vec![first_row, second_row],
        };
    }

    if filter_focused {
        let second_row = vec![BACK.help_as("cancel filter"), FORWARD.help_as("apply filter")];
        return KeyHelp {
            rows: vec![first_row, second_row],
        };
    }

    if entering_input {
        let second_row = vec![BACK.help_as("cancel input"), FORWARD.help_as("submit")];
        return KeyHelp {
            rows: vec![first_row, second_row],
        };
    }

    let second_row = vec![FILTER.help(), SAVE.help(), WRAP.help()];
    let third_row = vec![
        DOWN.help(),
        UP.help(),
        PAGE_DOWN.help(),
        PAGE_UP.help(),
        BOTTOM.help(),
        TOP.help(),
    ];

    let mut fourth_row = Vec::new();
    let next_page = page.forward();
    if next_page != page {
        fourth_row.push(FORWARD.help_as(next_page.label()));
    }
    if filter_applied {
        fourth_row.push(BACK.help_as("remove filter"));
    } else {
        let previous_page = page.backward();
        if previous_page != page {
            fourth_row.push(BACK.help_as(previous_page.label()));
        }
    }
    if page == Page::Workflows {
        fourth_row.push(TERM.help());
    }

    let mut rows = vec![first_row, second_row, third_row];
    if !fourth_row.is_empty() {
        rows.push(fourth_row);
    }
    KeyHelp { rows }
}
