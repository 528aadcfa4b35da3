// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::error::Error;
use std::fmt;
use std::time::Duration;

use crate::formatter;
use crate::keymap::{self, Key, KeyCode};
use crate::message::{Command, Msg};
use crate::pages::Page;

const HORIZONTAL_STEP: usize = 4;
const TOAST_DURATION: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Row {
    pub key: String,
    pub text: String,
}

impl Row {
    pub fn new(key: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            text: text.into(),
        }
    }

    /// A row that cannot be selected.
    pub fn info(text: impl Into<String>) -> Self {
        Self::new(String::new(), text)
    }

    pub fn is_selectable(&self) -> bool {
        !self.key.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageConfig {
    pub width: u16,
    pub height: u16,
    pub filter_prefix: String,
    pub loading_label: String,
    pub selection_enabled: bool,
    pub wrap_text: bool,
    pub request_input: bool,
    pub loading: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionError;

impl fmt::Display for SelectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no selectable row")
    }
}

impl Error for SelectionError {}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct FilterState {
    text: String,
    focused: bool,
    applied: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: u64,
    pub message: String,
    pub is_error: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Viewport {
    width: u16,
    height: u16,
    selection: usize,
    y_offset: usize,
    x_offset: usize,
    selection_enabled: bool,
    wrap_text: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageModel {
    page: Page,
    header: Vec<String>,
    rows: Vec<Row>,
    visible_rows: Vec<Row>,
    loading: bool,
    loading_label: String,
    filter_prefix: String,
    filter: FilterState,
    viewport: Viewport,
    save_path: Option<String>,
    entering_input: bool,
    input: String,
    toast: Option<Toast>,
    next_toast_id: u64,
}

impl PageModel {
    pub fn new(page: Page, config: PageConfig) -> Self {
        Self {
            page,
            header: Vec::new(),
            rows: Vec::new(),
            visible_rows: Vec::new(),
            loading: config.loading,
            loading_label: config.loading_label,
            filter_prefix: config.filter_prefix,
            filter: FilterState::default(),
            viewport: Viewport {
                width: config.width,
                height: config.height,
                selection: 0,
                y_offset: 0,
                x_offset: 0,
                selection_enabled: config.selection_enabled,
                wrap_text: config.wrap_text,
            },
            save_path: None,
            entering_input: config.request_input,
            input: String::new(),
            toast: None,
            next_toast_id: 0,
        }
    }

    pub const fn page(&self) -> Page {
        self.page
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn visible_rows(&self) -> &[Row] {
        &self.visible_rows
    }

    pub fn set_header(&mut self, header: Vec<String>) {
        self.header = header;
        self.clamp_viewport();
    }

    pub fn set_all_rows(&mut self, rows: Vec<Row>) {
        self.rows = rows;
        self.apply_filter();
    }

    /// Appends rows. Unless `start_on_new_line` is set, the first incoming
    /// row continues the current last row.
    pub fn append_rows(&mut self, rows: Vec<Row>, start_on_new_line: bool) {
        let mut incoming = rows.into_iter();
        if !start_on_new_line
            && let Some(last) = self.rows.last_mut()
            && let Some(first) = incoming.next()
        {
            last.text.push_str(&first.text);
        }
        self.rows.extend(incoming);
        self.apply_filter();
    }

    pub const fn loading(&self) -> bool {
        self.loading
    }

    pub fn loading_label(&self) -> &str {
        &self.loading_label
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    pub const fn selection_enabled(&self) -> bool {
        self.viewport.selection_enabled
    }

    pub fn set_selection_enabled(&mut self, enabled: bool) {
        self.viewport.selection_enabled = enabled;
        self.clamp_viewport();
    }

    pub fn selected_row(&self) -> Result<&Row, SelectionError> {
        if !self.viewport.selection_enabled {
            return Err(SelectionError);
        }
        self.visible_rows
            .get(self.viewport.selection)
            .filter(|row| row.is_selectable())
            .ok_or(SelectionError)
    }

    /// Index of the highlighted row within `visible_rows`.
    pub fn selection(&self) -> Option<usize> {
        (self.viewport.selection_enabled && !self.visible_rows.is_empty())
            .then_some(self.viewport.selection)
    }

    pub fn filter_prefix(&self) -> &str {
        &self.filter_prefix
    }

    pub fn set_filter_prefix(&mut self, prefix: impl Into<String>) {
        self.filter_prefix = prefix.into();
    }

    pub fn filter_text(&self) -> &str {
        &self.filter.text
    }

    pub const fn filter_focused(&self) -> bool {
        self.filter.focused
    }

    pub const fn filter_applied(&self) -> bool {
        self.filter.applied
    }

    pub const fn viewport_saving(&self) -> bool {
        self.save_path.is_some()
    }

    pub fn save_path(&self) -> Option<&str> {
        self.save_path.as_deref()
    }

    pub const fn entering_input(&self) -> bool {
        self.entering_input
    }

    pub fn set_entering_input(&mut self, entering: bool) {
        self.entering_input = entering;
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn take_input(&mut self) -> String {
        std::mem::take(&mut self.input)
    }

    pub const fn wrap_text(&self) -> bool {
        self.viewport.wrap_text
    }

    pub const fn x_offset(&self) -> usize {
        self.viewport.x_offset
    }

    pub const fn y_offset(&self) -> usize {
        self.viewport.y_offset
    }

    pub fn set_viewport_x_offset(&mut self, offset: usize) {
        self.viewport.x_offset = offset;
    }

    pub fn set_window_size(&mut self, width: u16, height: u16) {
        self.viewport.width = width;
        self.viewport.height = height;
        self.clamp_viewport();
    }

    pub const fn window_size(&self) -> (u16, u16) {
        (self.viewport.width, self.viewport.height)
    }

    /// Number of row lines the page can show below its filter line and
    /// table header.
    pub fn content_height(&self) -> usize {
        let reserved = 1 + self.header.len() + usize::from(self.toast.is_some());
        usize::from(self.viewport.height)
            .saturating_sub(reserved)
            .max(1)
    }

    /// Rows currently inside the viewport.
    pub fn window(&self) -> &[Row] {
        let start = self.viewport.y_offset.min(self.visible_rows.len());
        let end = (start + self.content_height()).min(self.visible_rows.len());
        &self.visible_rows[start..end]
    }

    pub fn scroll_to_bottom(&mut self) {
        let len = self.visible_rows.len();
        self.viewport.selection = len.saturating_sub(1);
        self.viewport.y_offset = len.saturating_sub(self.content_height());
    }

    pub fn toast(&self) -> Option<&Toast> {
        self.toast.as_ref()
    }

    pub fn show_toast(&mut self, message: impl Into<String>, is_error: bool) -> Command {
        self.next_toast_id += 1;
        self.toast = Some(Toast {
            id: self.next_toast_id,
            message: message.into(),
            is_error,
        });
        self.clamp_viewport();
        Command::ExpireToast {
            page: self.page,
            id: self.next_toast_id,
            after: TOAST_DURATION,
        }
    }

    pub fn hide_toast(&mut self) {
        self.toast = None;
    }

    pub fn update(&mut self, msg: &Msg) -> Vec<Command> {
        match msg {
            Msg::Key(key) => self.handle_key(key),
            Msg::ToastExpired { page, id } if *page == self.page => {
                if self.toast.as_ref().is_some_and(|toast| toast.id == *id) {
                    self.hide_toast();
                }
                Vec::new()
            }
            Msg::SaveFinished { page, result } if *page == self.page => {
                let command = match result {
                    Ok(path) => self.show_toast(format!("Saved to {path}"), false),
                    Err(error) => self.show_toast(format!("Save failed: {error}"), true),
                };
                vec![command]
            }
            _ => Vec::new(),
        }
    }

    fn handle_key(&mut self, key: &Key) -> Vec<Command> {
        if self.save_path.is_some() {
            return self.handle_save_key(key);
        }
        if self.filter.focused {
            self.handle_filter_key(key);
            return Vec::new();
        }
        if self.entering_input {
            self.handle_input_key(key);
            return Vec::new();
        }

        if keymap::FILTER.matches(key) {
            self.filter.focused = true;
        } else if keymap::BACK.matches(key) && self.filter.applied {
            self.clear_filter();
        } else if keymap::SAVE.matches(key) {
            self.save_path = Some(default_save_path(self.page));
        } else if keymap::WRAP.matches(key) {
            self.viewport.wrap_text = !self.viewport.wrap_text;
            self.viewport.x_offset = 0;
        } else if keymap::DOWN.matches(key) {
            self.move_by(1);
        } else if keymap::UP.matches(key) {
            self.move_by(-1);
        } else if keymap::HALF_PAGE_DOWN.matches(key) {
            self.move_by(self.half_page());
        } else if keymap::HALF_PAGE_UP.matches(key) {
            self.move_by(-self.half_page());
        } else if keymap::PAGE_DOWN.matches(key) {
            self.move_by(self.full_page());
        } else if keymap::PAGE_UP.matches(key) {
            self.move_by(-self.full_page());
        } else if keymap::BOTTOM.matches(key) {
            self.scroll_to_bottom();
        } else if keymap::TOP.matches(key) {
            self.viewport.selection = 0;
            self.viewport.y_offset = 0;
        } else if keymap::LEFT.matches(key) && !self.viewport.wrap_text {
            self.viewport.x_offset = self.viewport.x_offset.saturating_sub(HORIZONTAL_STEP);
        } else if keymap::RIGHT.matches(key) && !self.viewport.wrap_text {
            self.viewport.x_offset += HORIZONTAL_STEP;
        }
        Vec::new()
    }

    fn handle_filter_key(&mut self, key: &Key) {
        match key.code {
            KeyCode::Esc => self.clear_filter(),
            KeyCode::Enter => {
                self.filter.focused = false;
                self.filter.applied = !self.filter.text.is_empty();
            }
            KeyCode::Backspace => {
                self.filter.text.pop();
                self.apply_filter();
            }
            _ => {
                if let Some(value) = key.text() {
                    self.filter.text.push(value);
                    self.apply_filter();
                }
            }
        }
    }

    fn handle_save_key(&mut self, key: &Key) -> Vec<Command> {
        match key.code {
            KeyCode::Esc => {
                self.save_path = None;
                Vec::new()
            }
            KeyCode::Enter => {
                let path = self.save_path.take().unwrap_or_default();
                let path = path.trim().to_owned();
                if path.is_empty() {
                    return vec![self.show_toast("Save failed: file path is empty", true)];
                }
                vec![Command::SaveContent {
                    page: self.page,
                    path,
                    contents: self.saved_contents(),
                }]
            }
            KeyCode::Backspace => {
                if let Some(path) = self.save_path.as_mut() {
                    path.pop();
                }
                Vec::new()
            }
            _ => {
                if let (Some(value), Some(path)) = (key.text(), self.save_path.as_mut()) {
                    path.push(value);
                }
                Vec::new()
            }
        }
    }

    fn handle_input_key(&mut self, key: &Key) {
        match key.code {
            KeyCode::Esc => {
                self.input.clear();
                self.entering_input = false;
            }
            KeyCode::Enter => self.entering_input = false,
            KeyCode::Backspace => {
                self.input.pop();
            }
            _ => {
                if let Some(value) = key.text() {
                    self.input.push(value);
                }
            }
        }
    }

    fn saved_contents(&self) -> String {
        let mut lines = self.header.clone();
        lines.extend(self.visible_rows.iter().map(|row| row.text.clone()));
        let mut contents = lines.join("\n");
        contents.push('\n');
        contents
    }

    fn clear_filter(&mut self) {
        self.filter = FilterState::default();
        self.apply_filter();
    }

    fn apply_filter(&mut self) {
        let needle = self.filter.text.to_lowercase();
        self.visible_rows = if needle.is_empty() {
            self.rows.clone()
        } else {
            self.rows
                .iter()
                .filter(|row| row.text.to_lowercase().contains(&needle))
                .cloned()
                .collect()
        };
        self.clamp_viewport();
    }

    fn half_page(&self) -> isize {
        (self.content_height() / 2).max(1) as isize
    }

    fn full_page(&self) -> isize {
        self.content_height() as isize
    }

    fn move_by(&mut self, delta: isize) {
        let len = self.visible_rows.len();
        if len == 0 {
            return;
        }
        if self.viewport.selection_enabled {
            let next = self.viewport.selection as isize + delta;
            self.viewport.selection = next.clamp(0, len as isize - 1) as usize;
        } else {
            let max_offset = len.saturating_sub(self.content_height()) as isize;
            let next = self.viewport.y_offset as isize + delta;
            self.viewport.y_offset = next.clamp(0, max_offset) as usize;
        }
        self.clamp_viewport();
    }

    fn clamp_viewport(&mut self) {
        let len = self.visible_rows.len();
        let height = self.content_height();
        self.viewport.selection = self.viewport.selection.min(len.saturating_sub(1));
        if self.viewport.selection_enabled {
            if self.viewport.selection < self.viewport.y_offset {
                self.viewport.y_offset = self.viewport.selection;
            } else if self.viewport.selection >= self.viewport.y_offset + height {
                self.viewport.y_offset = self.viewport.selection + 1 - height;
            }
        }
        self.viewport.y_offset = self.viewport.y_offset.min(len.saturating_sub(height));
    }
}

fn default_save_path(page: Page) -> String {
    format!("tempted-{}.txt", page.label().replace(' ', "-"))
}

/// Converts streamed output into rows for `append_rows`.
pub fn output_rows(content: &str) -> Vec<Row> {
    formatter::output_lines(content)
        .into_iter()
        .map(Row::info)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{PageModel, Row, SelectionError, output_rows};
    use crate::keymap::{Key, KeyCode};
    use crate::message::{Command, Msg};
    use crate::pages::Page;

    fn workflows_page(height: u16) -> PageModel {
        let mut page = PageModel::new(Page::Workflows, Page::Workflows.config(80, height));
        page.set_header(vec!["Type  Workflow ID".to_owned()]);
        page
    }

    fn numbered_rows(count: usize) -> Vec<Row> {
        (0..count)
            .map(|index| Row::new(format!("wf-{index} run ns"), format!("row {index}")))
            .collect()
    }

    fn press(page: &mut PageModel, key: Key) -> Vec<Command> {
        page.update(&Msg::Key(key))
    }

    fn type_text(page: &mut PageModel, text: &str) {
        for value in text.chars() {
            press(page, Key::char(value));
        }
    }

    #[test]
    fn selection_moves_and_clamps() {
        let mut page = workflows_page(10);
        page.set_all_rows(numbered_rows(3));

        press(&mut page, Key::char('j'));
        press(&mut page, Key::new(KeyCode::Down));
        press(&mut page, Key::char('j'));
        assert_eq!(page.selected_row().map(|row| row.text.as_str()), Ok("row 2"));

        press(&mut page, Key::char('g'));
        assert_eq!(page.selection(), Some(0));
    }

    #[test]
    fn selected_row_fails_when_disabled_or_informational() {
        let mut page = workflows_page(10);
        assert_eq!(page.selected_row(), Err(SelectionError));

        page.set_all_rows(vec![Row::info("nothing here")]);
        assert_eq!(page.selected_row(), Err(SelectionError));

        page.set_all_rows(numbered_rows(2));
        assert!(page.selected_row().is_ok());
        page.set_selection_enabled(false);
        assert_eq!(page.selected_row(), Err(SelectionError));
    }

    #[test]
    fn viewport_follows_selection() {
        // height 6: filter line + one header line leaves four rows
        let mut page = workflows_page(6);
        page.set_all_rows(numbered_rows(10));
        assert_eq!(page.content_height(), 4);

        for _ in 0..5 {
            press(&mut page, Key::char('j'));
        }
        assert_eq!(page.selection(), Some(5));
        assert_eq!(page.y_offset(), 2);
        assert_eq!(page.window().first().map(|row| row.text.as_str()), Some("row 2"));

        press(&mut page, Key::char('G'));
        assert_eq!(page.selection(), Some(9));
        assert_eq!(page.window().len(), 4);
    }

    #[test]
    fn filter_narrows_rows_and_applies_on_enter() {
        let mut page = workflows_page(10);
        page.set_all_rows(vec![
            Row::new("a r n", "OrderWorkflow order-1"),
            Row::new("b r n", "PaymentWorkflow pay-1"),
            Row::new("c r n", "OrderWorkflow order-2"),
        ]);

        press(&mut page, Key::char('/'));
        assert!(page.filter_focused());
        type_text(&mut page, "ORDER");
        assert_eq!(page.visible_rows().len(), 2);
        assert!(!page.filter_applied());

        press(&mut page, Key::new(KeyCode::Enter));
        assert!(!page.filter_focused());
        assert!(page.filter_applied());
        assert_eq!(page.filter_text(), "ORDER");

        press(&mut page, Key::new(KeyCode::Esc));
        assert!(!page.filter_applied());
        assert_eq!(page.visible_rows().len(), 3);
    }

    #[test]
    fn escape_cancels_focused_filter() {
        let mut page = workflows_page(10);
        page.set_all_rows(numbered_rows(4));
        press(&mut page, Key::char('/'));
        type_text(&mut page, "row 1");
        assert_eq!(page.visible_rows().len(), 1);

        press(&mut page, Key::new(KeyCode::Esc));
        assert!(!page.filter_focused());
        assert!(page.filter_text().is_empty());
        assert_eq!(page.visible_rows().len(), 4);
    }

    #[test]
    fn empty_filter_enter_is_not_applied() {
        let mut page = workflows_page(10);
        press(&mut page, Key::char('/'));
        press(&mut page, Key::new(KeyCode::Enter));
        assert!(!page.filter_applied());
    }

    #[test]
    fn save_prompt_emits_save_command() {
        let mut page = workflows_page(10);
        page.set_all_rows(numbered_rows(2));

        press(&mut page, Key::char('s'));
        assert!(page.viewport_saving());
        assert_eq!(page.save_path(), Some("tempted-workflows.txt"));
        for _ in 0.."tempted-workflows.txt".len() {
            press(&mut page, Key::new(KeyCode::Backspace));
        }
        type_text(&mut page, "out.txt");

        let commands = press(&mut page, Key::new(KeyCode::Enter));
        assert!(!page.viewport_saving());
        assert_eq!(
            commands,
            vec![Command::SaveContent {
                page: Page::Workflows,
                path: "out.txt".to_owned(),
                contents: "Type  Workflow ID\nrow 0\nrow 1\n".to_owned(),
            }]
        );
    }

    #[test]
    fn save_result_shows_toast_until_expired() {
        let mut page = workflows_page(10);
        let commands = page.update(&Msg::SaveFinished {
            page: Page::Workflows,
            result: Ok("out.txt".to_owned()),
        });
        let toast = page.toast().cloned().expect("toast shown");
        assert_eq!(toast.message, "Saved to out.txt");
        assert!(!toast.is_error);
        assert!(matches!(
            commands.as_slice(),
            [Command::ExpireToast { page: Page::Workflows, id, .. }] if *id == toast.id
        ));

        page.update(&Msg::ToastExpired {
            page: Page::Workflows,
            id: toast.id + 1,
        });
        assert!(page.toast().is_some());
        page.update(&Msg::ToastExpired {
            page: Page::Workflows,
            id: toast.id,
        });
        assert!(page.toast().is_none());
    }

    #[test]
    fn append_rows_continues_last_line_unless_forced() {
        let mut page = PageModel::new(
            Page::WorkflowDetails,
            Page::WorkflowDetails.config(80, 20),
        );
        page.set_all_rows(vec![Row::info("partial")]);
        page.append_rows(vec![Row::info(" line"), Row::info("next")], false);
        assert_eq!(
            page.rows(),
            &[Row::info("partial line"), Row::info("next")]
        );

        page.append_rows(vec![Row::info("fresh")], true);
        assert_eq!(page.rows().len(), 3);
        page.scroll_to_bottom();
        assert_eq!(page.window().last(), Some(&Row::info("fresh")));
    }

    #[test]
    fn output_rows_strip_sequences() {
        assert_eq!(
            output_rows("\u{1b}[1mbold\u{1b}[0m\nplain"),
            vec![Row::info("bold"), Row::info("plain")]
        );
    }

    #[test]
    fn horizontal_scroll_disabled_when_wrapping() {
        let mut page = PageModel::new(
            Page::WorkflowDetails,
            Page::WorkflowDetails.config(80, 20),
        );
        assert!(page.wrap_text());
        press(&mut page, Key::char('l'));
        assert_eq!(page.x_offset(), 0);

        press(&mut page, Key::ctrl('w'));
        press(&mut page, Key::char('l'));
        press(&mut page, Key::char('l'));
        assert_eq!(page.x_offset(), 8);
        press(&mut page, Key::char('h'));
        assert_eq!(page.x_offset(), 4);
    }

    #[test]
    fn input_entry_captures_text() {
        let mut page = workflows_page(10);
        page.set_entering_input(true);
        type_text(&mut page, "q/");
        assert!(!page.filter_focused());
        assert_eq!(page.input(), "q/");
        press(&mut page, Key::new(KeyCode::Enter));
        assert!(!page.entering_input());
        assert_eq!(page.take_input(), "q/");
    }
}
