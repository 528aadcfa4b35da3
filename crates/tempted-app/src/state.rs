// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use crate::header::Header;
use crate::keymap::{self, Key, page_key_help};
use crate::keys::WorkflowKey;
use crate::message::{Command, Msg};
use crate::page::{PageModel, Row, output_rows};
use crate::pages::Page;
use crate::source::{Connector, WorkflowSource};

pub const DEFAULT_ADDRESS: &str = "http://localhost:7243";
pub const DEFAULT_NAMESPACE: &str = "default";
pub const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_secs(2);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Resolved runtime settings. A zero `update_interval` disables periodic
/// refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub address: String,
    pub namespace: String,
    pub update_interval: Duration,
    pub logo_color: String,
    pub version: String,
    pub sha: String,
    pub token: Option<String>,
    pub timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_owned(),
            namespace: DEFAULT_NAMESPACE.to_owned(),
            update_interval: DEFAULT_UPDATE_INTERVAL,
            logo_color: String::new(),
            version: String::new(),
            sha: String::new(),
            token: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl Config {
    pub fn target(&self) -> String {
        format!("{} [{}]", self.address, self.namespace)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramOption {
    AltScreen,
}

/// What the renderer should draw.
#[derive(Debug, Clone, Copy)]
pub enum Screen<'a> {
    Error(&'a str),
    Blank,
    Page {
        header: &'a Header,
        page: &'a PageModel,
    },
}

/// Builds the model and the terminal options it expects. An override
/// token replaces whatever token the configuration carries.
pub fn setup(
    mut config: Config,
    connector: Box<dyn Connector>,
    override_token: Option<String>,
) -> (Model, Vec<ProgramOption>) {
    if let Some(token) = override_token.filter(|token| !token.is_empty()) {
        config.token = Some(token);
    }
    (Model::new(config, connector), vec![ProgramOption::AltScreen])
}

pub struct Model {
    config: Config,
    connector: Box<dyn Connector>,
    source: Option<Arc<dyn WorkflowSource>>,
    header: Header,
    current_page: Page,
    page_models: BTreeMap<Page, PageModel>,
    workflow_key: WorkflowKey,
    refresh_generation: u64,
    width: u16,
    height: u16,
    connect_attempted: bool,
    initialized: bool,
    err: Option<String>,
}

impl Model {
    pub fn new(config: Config, connector: Box<dyn Connector>) -> Self {
        let header = Header::new(
            &config.logo_color,
            &config.target(),
            &config.version,
            &config.sha,
        );
        let mut model = Self {
            config,
            connector,
            source: None,
            header,
            current_page: Page::Workflows,
            page_models: BTreeMap::new(),
            workflow_key: WorkflowKey::default(),
            refresh_generation: 0,
            width: 0,
            height: 0,
            connect_attempted: false,
            initialized: false,
            err: None,
        };
        model.refresh_key_help();
        model
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn source(&self) -> Option<Arc<dyn WorkflowSource>> {
        self.source.clone()
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub const fn current_page(&self) -> Page {
        self.current_page
    }

    pub fn page_model(&self, page: Page) -> Option<&PageModel> {
        self.page_models.get(&page)
    }

    pub fn current_page_model(&self) -> Option<&PageModel> {
        if !self.initialized {
            return None;
        }
        self.page_models.get(&self.current_page)
    }

    /// Direct access for callers that drive page state themselves, such as
    /// an embedding that opens an input prompt.
    pub fn current_page_model_mut(&mut self) -> Option<&mut PageModel> {
        if !self.initialized {
            return None;
        }
        self.page_models.get_mut(&self.current_page)
    }

    pub fn workflow_key(&self) -> &WorkflowKey {
        &self.workflow_key
    }

    pub const fn refresh_generation(&self) -> u64 {
        self.refresh_generation
    }

    pub const fn initialized(&self) -> bool {
        self.initialized
    }

    pub fn error(&self) -> Option<&str> {
        self.err.as_deref()
    }

    pub const fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    pub fn screen(&self) -> Screen<'_> {
        if let Some(error) = self.err.as_deref() {
            return Screen::Error(error);
        }
        match self.current_page_model() {
            Some(page) => Screen::Page {
                header: &self.header,
                page,
            },
            None => Screen::Blank,
        }
    }

    /// Handles one message to completion and returns the side effects the
    /// driver must run.
    pub fn update(&mut self, msg: Msg) -> Vec<Command> {
        tracing::debug!(kind = msg.kind(), page = ?self.current_page, "update");
        let commands = match msg {
            Msg::CleanupComplete => vec![Command::Quit],
            Msg::Key(key) => self.handle_key(key),
            Msg::Error(message) => {
                tracing::error!(error = %message, "showing error");
                self.err = Some(message);
                Vec::new()
            }
            Msg::Resize { width, height } => self.handle_resize(width, height),
            Msg::PageLoaded {
                page,
                key,
                header,
                rows,
            } => self.handle_page_loaded(page, key.as_ref(), header, rows),
            Msg::RefreshTick { generation, page } => self.handle_refresh_tick(generation, page),
            Msg::PageOutput {
                page,
                content,
                start_on_new_line,
            } => {
                if self.initialized
                    && let Some(model) = self.page_models.get_mut(&page)
                {
                    model.append_rows(output_rows(&content), start_on_new_line);
                    model.scroll_to_bottom();
                }
                Vec::new()
            }
            msg @ (Msg::SaveFinished { .. } | Msg::ToastExpired { .. }) => {
                self.forward_to_page(&msg)
            }
        };
        self.refresh_key_help();
        self.sync_page_size();
        commands
    }

    fn handle_key(&mut self, key: Key) -> Vec<Command> {
        if keymap::EXIT.matches(&key) && !self.suppresses_exit(&key) {
            return vec![Command::Cleanup];
        }
        let Some(page) = self.current_page_model() else {
            return Vec::new();
        };
        let capturing_text =
            page.filter_focused() || page.viewport_saving() || page.entering_input();

        if !capturing_text {
            let handled = if keymap::FORWARD.matches(&key) {
                self.navigate_forward()
            } else if keymap::BACK.matches(&key) {
                self.navigate_backward()
            } else if keymap::RELOAD.matches(&key) {
                self.reload()
            } else if keymap::TERM.matches(&key) {
                self.open_termination()
            } else {
                None
            };
            if let Some(commands) = handled {
                return commands;
            }
        }
        self.forward_to_page(&Msg::Key(key))
    }

    /// `q` types into text fields; ctrl+c always exits.
    fn suppresses_exit(&self, key: &Key) -> bool {
        if *key != Key::char('q') || self.err.is_some() {
            return false;
        }
        self.current_page_model().is_some_and(|page| {
            page.filter_focused() || page.viewport_saving() || page.entering_input()
        })
    }

    fn navigate_forward(&mut self) -> Option<Vec<Command>> {
        if self.current_page == Page::Workflows {
            let row_key = self.selected_row_key()?;
            match row_key.parse::<WorkflowKey>() {
                Ok(key) => self.workflow_key = key,
                Err(error) => {
                    self.err = Some(format!("{error:#}"));
                    return Some(Vec::new());
                }
            }
        }
        let next = self.current_page.forward();
        if next == self.current_page {
            return None;
        }
        self.set_page(next);
        Some(self.load_current())
    }

    fn navigate_backward(&mut self) -> Option<Vec<Command>> {
        if self.current_page_model()?.filter_applied() {
            return None;
        }
        let previous = self.current_page.backward();
        if previous == self.current_page {
            return None;
        }
        self.set_page(previous);
        Some(self.load_current())
    }

    fn reload(&mut self) -> Option<Vec<Command>> {
        if !self.current_page.does_reload() {
            return None;
        }
        if let Some(model) = self.page_models.get_mut(&self.current_page) {
            model.set_loading(true);
        }
        Some(self.load_current())
    }

    fn open_termination(&mut self) -> Option<Vec<Command>> {
        if self.current_page != Page::Workflows {
            return None;
        }
        let row_key = self.selected_row_key()?;
        match row_key.parse::<WorkflowKey>() {
            Ok(key) => self.workflow_key = key,
            Err(error) => {
                self.err = Some(format!("{error:#}"));
                return Some(Vec::new());
            }
        }
        self.set_page(Page::WorkflowTermination);
        Some(Vec::new())
    }

    fn selected_row_key(&self) -> Option<String> {
        let page = self.current_page_model()?;
        match page.selected_row() {
            Ok(row) => Some(row.key.clone()),
            Err(error) => {
                tracing::debug!(%error, "key ignored without selection");
                None
            }
        }
    }

    fn set_page(&mut self, page: Page) {
        if let Some(model) = self.page_models.get_mut(&self.current_page) {
            model.hide_toast();
        }
        tracing::debug!(from = ?self.current_page, to = ?page, "changing page");
        self.current_page = page;
        let prefix = page.filter_prefix(&self.workflow_key.workflow_id);
        let static_rows = page.static_rows(&self.workflow_key);
        if let Some(model) = self.page_models.get_mut(&page) {
            model.set_filter_prefix(prefix);
            model.set_loading(page.does_load());
            if let Some(rows) = static_rows {
                model.set_all_rows(rows);
            }
        }
    }

    fn load_current(&self) -> Vec<Command> {
        self.current_page
            .load_request(&self.workflow_key)
            .map(Command::Load)
            .into_iter()
            .collect()
    }

    fn handle_resize(&mut self, width: u16, height: u16) -> Vec<Command> {
        self.width = width;
        self.height = height;
        if self.connect_attempted {
            self.sync_page_size();
            return Vec::new();
        }
        self.connect_attempted = true;
        match self.connector.connect(&self.config) {
            Ok(source) => self.source = Some(source),
            Err(error) => {
                tracing::error!(error = %format!("{error:#}"), "failed to connect");
                self.err = Some(format!("{error:#}"));
                return Vec::new();
            }
        }
        let page_height = self.page_height();
        for page in Page::ALL {
            self.page_models
                .insert(page, PageModel::new(page, page.config(width, page_height)));
        }
        self.initialized = true;
        self.set_page(self.current_page);
        self.load_current()
    }

    fn handle_page_loaded(
        &mut self,
        page: Page,
        key: Option<&WorkflowKey>,
        header: Vec<String>,
        rows: Vec<Row>,
    ) -> Vec<Command> {
        if !self.initialized || page != self.current_page {
            tracing::debug!(?page, current = ?self.current_page, "dropping stale page load");
            return Vec::new();
        }
        if key.is_some_and(|key| *key != self.workflow_key) {
            tracing::debug!(
                ?page,
                ?key,
                current = ?self.workflow_key,
                "dropping load for another workflow"
            );
            return Vec::new();
        }
        let Some(model) = self.page_models.get_mut(&page) else {
            return Vec::new();
        };
        model.set_header(header);
        if model.loading() {
            model.set_viewport_x_offset(0);
        }
        model.set_loading(false);
        match page.empty_rows().filter(|_| rows.is_empty()) {
            Some(fallback) => {
                model.set_all_rows(fallback);
                model.set_selection_enabled(false);
            }
            None => {
                model.set_all_rows(rows);
                model.set_selection_enabled(page.selection_enabled());
            }
        }

        let Some(after) = page.refresh_delay(self.config.update_interval) else {
            return Vec::new();
        };
        self.refresh_generation += 1;
        vec![Command::ScheduleRefresh {
            generation: self.refresh_generation,
            page,
            after,
        }]
    }

    fn handle_refresh_tick(&mut self, generation: u64, page: Page) -> Vec<Command> {
        if !self.initialized || generation != self.refresh_generation || page != self.current_page {
            tracing::debug!(
                generation,
                current = self.refresh_generation,
                ?page,
                "dropping superseded refresh"
            );
            return Vec::new();
        }
        self.refresh_generation += 1;
        self.load_current()
    }

    fn forward_to_page(&mut self, msg: &Msg) -> Vec<Command> {
        if !self.initialized {
            return Vec::new();
        }
        let target = match msg {
            Msg::SaveFinished { page, .. } | Msg::ToastExpired { page, .. } => *page,
            _ => self.current_page,
        };
        self.page_models
            .get_mut(&target)
            .map(|model| model.update(msg))
            .unwrap_or_default()
    }

    fn refresh_key_help(&mut self) {
        let (filter_focused, filter_applied, saving, entering_input) = self
            .current_page_model()
            .map(|page| {
                (
                    page.filter_focused(),
                    page.filter_applied(),
                    page.viewport_saving(),
                    page.entering_input(),
                )
            })
            .unwrap_or_default();
        self.header.set_key_help(page_key_help(
            self.current_page,
            filter_focused,
            filter_applied,
            saving,
            entering_input,
        ));
    }

    fn page_height(&self) -> u16 {
        self.height.saturating_sub(self.header.view_height())
    }

    fn sync_page_size(&mut self) {
        if !self.initialized {
            return;
        }
        let (width, height) = (self.width, self.page_height());
        for model in self.page_models.values_mut() {
            if model.window_size() != (width, height) {
                model.set_window_size(width, height);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Config, Model, ProgramOption, Screen, setup};
    use crate::message::{Command, Msg};
    use crate::model::{ExecutionDetail, ExecutionPage};
    use crate::pages::{LoadRequest, Page};
    use crate::source::{Connector, WorkflowSource};
    use anyhow::{Result, bail};
    use std::sync::Arc;

    struct NoopSource;

    impl WorkflowSource for NoopSource {
        fn list_executions_page(&self, _query: &str, _token: &str) -> Result<ExecutionPage> {
            Ok(ExecutionPage::default())
        }

        fn describe_execution(&self, _workflow_id: &str, _run_id: &str) -> Result<ExecutionDetail> {
            Ok(serde_json::Value::Null)
        }
    }

    struct NoopConnector;

    impl Connector for NoopConnector {
        fn connect(&self, config: &Config) -> Result<Arc<dyn WorkflowSource>> {
            if config.address.is_empty() {
                bail!("address is required");
            }
            Ok(Arc::new(NoopSource))
        }
    }

    #[test]
    fn setup_requests_alt_screen_and_applies_override_token() {
        let (model, options) = setup(
            Config::default(),
            Box::new(NoopConnector),
            Some("secret".to_owned()),
        );
        assert_eq!(options, vec![ProgramOption::AltScreen]);
        assert_eq!(model.config().token.as_deref(), Some("secret"));
        assert!(model.source().is_none());
    }

    #[test]
    fn nothing_renders_before_first_resize() {
        let model = Model::new(Config::default(), Box::new(NoopConnector));
        assert!(matches!(model.screen(), Screen::Blank));
        assert!(model.current_page_model().is_none());
    }

    #[test]
    fn first_resize_initialises_and_loads() {
        let mut model = Model::new(Config::default(), Box::new(NoopConnector));
        let commands = model.update(Msg::Resize {
            width: 100,
            height: 30,
        });
        assert!(model.initialized());
        assert!(model.source().is_some());
        assert_eq!(
            commands,
            vec![Command::Load(LoadRequest::Workflows {
                query: String::new()
            })]
        );
        for page in Page::ALL {
            assert!(model.page_model(page).is_some());
        }
        assert!(matches!(model.screen(), Screen::Page { .. }));
    }

    #[test]
    fn page_height_excludes_header() {
        let mut model = Model::new(Config::default(), Box::new(NoopConnector));
        model.update(Msg::Resize {
            width: 100,
            height: 30,
        });
        let header_height = model.header().view_height();
        let page = model.current_page_model().expect("initialised");
        assert_eq!(page.window_size(), (100, 30 - header_height));
    }

    #[test]
    fn failed_connect_shows_error_without_retry() {
        let config = Config {
            address: String::new(),
            ..Config::default()
        };
        let mut model = Model::new(config, Box::new(NoopConnector));
        let commands = model.update(Msg::Resize {
            width: 80,
            height: 24,
        });
        assert!(commands.is_empty());
        assert!(!model.initialized());
        assert!(matches!(model.screen(), Screen::Error("address is required")));

        model.update(Msg::Resize {
            width: 90,
            height: 24,
        });
        assert!(!model.initialized());
    }

    #[test]
    fn cleanup_complete_quits() {
        let mut model = Model::new(Config::default(), Box::new(NoopConnector));
        assert_eq!(model.update(Msg::CleanupComplete), vec![Command::Quit]);
    }

    #[test]
    fn target_names_address_and_namespace() {
        let config = Config {
            address: "http://temporal:7243".to_owned(),
            namespace: "orders".to_owned(),
            ..Config::default()
        };
        assert_eq!(config.target(), "http://temporal:7243 [orders]");
    }
}
