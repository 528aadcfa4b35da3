// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::time::Duration;

use crate::keymap::Key;
use crate::keys::WorkflowKey;
use crate::page::Row;
use crate::pages::{LoadRequest, Page};

/// Everything the event loop can be asked to handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    Resize {
        width: u16,
        height: u16,
    },
    Key(Key),
    /// `key` names the execution a keyed page was loaded for.
    PageLoaded {
        page: Page,
        key: Option<WorkflowKey>,
        header: Vec<String>,
        rows: Vec<Row>,
    },
    RefreshTick {
        generation: u64,
        page: Page,
    },
    PageOutput {
        page: Page,
        content: String,
        start_on_new_line: bool,
    },
    SaveFinished {
        page: Page,
        result: Result<String, String>,
    },
    ToastExpired {
        page: Page,
        id: u64,
    },
    Error(String),
    CleanupComplete,
}

impl Msg {
    pub fn error(error: &anyhow::Error) -> Self {
        Self::Error(format!("{error:#}"))
    }

    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Resize { .. } => "resize",
            Self::Key(_) => "key",
            Self::PageLoaded { .. } => "page_loaded",
            Self::RefreshTick { .. } => "refresh_tick",
            Self::PageOutput { .. } => "page_output",
            Self::SaveFinished { .. } => "save_finished",
            Self::ToastExpired { .. } => "toast_expired",
            Self::Error(_) => "error",
            Self::CleanupComplete => "cleanup_complete",
        }
    }
}

/// Side effects requested by an update. The runtime executes these and
/// feeds their results back as messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Load(LoadRequest),
    ScheduleRefresh {
        generation: u64,
        page: Page,
        after: Duration,
    },
    SaveContent {
        page: Page,
        path: String,
        contents: String,
    },
    ExpireToast {
        page: Page,
        id: u64,
        after: Duration,
    },
    Cleanup,
    Quit,
}
