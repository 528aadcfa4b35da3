// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::time::Duration;

use crate::keys::WorkflowKey;
use crate::page::{PageConfig, Row};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Page {
    Unset,
    Workflows,
    WorkflowDetails,
    WorkflowTermination,
}

/// What a page fetches when it loads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadRequest {
    Workflows { query: String },
    WorkflowDetails(WorkflowKey),
}

impl Page {
    /// Pages that own a page model.
    pub const ALL: [Self; 3] = [
        Self::Workflows,
        Self::WorkflowDetails,
        Self::WorkflowTermination,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Unset => "undefined",
            Self::Workflows => "workflows",
            Self::WorkflowDetails => "workflow details",
            Self::WorkflowTermination => "workflow termination",
        }
    }

    pub fn loading_label(self) -> String {
        format!("Loading {}...", self.label())
    }

    pub const fn forward(self) -> Self {
        match self {
            Self::Workflows => Self::WorkflowDetails,
            Self::Unset | Self::WorkflowDetails | Self::WorkflowTermination => self,
        }
    }

    pub const fn backward(self) -> Self {
        match self {
            Self::WorkflowDetails | Self::WorkflowTermination => Self::Workflows,
            Self::Unset | Self::Workflows => self,
        }
    }

    pub const fn does_load(self) -> bool {
        match self {
            Self::Workflows | Self::WorkflowDetails => true,
            Self::Unset | Self::WorkflowTermination => false,
        }
    }

    pub const fn does_reload(self) -> bool {
        match self {
            Self::Workflows | Self::WorkflowDetails => true,
            Self::Unset | Self::WorkflowTermination => false,
        }
    }

    pub const fn does_periodic_update(self) -> bool {
        match self {
            Self::Workflows | Self::WorkflowDetails => true,
            Self::Unset | Self::WorkflowTermination => false,
        }
    }

    pub const fn selection_enabled(self) -> bool {
        matches!(self, Self::Workflows)
    }

    pub fn filter_prefix(self, workflow_id: &str) -> String {
        match self {
            Self::Unset => String::new(),
            Self::Workflows => "Workflows".to_owned(),
            Self::WorkflowDetails => format!("Workflow Details for {workflow_id}"),
            Self::WorkflowTermination => format!("Workflow Termination for {workflow_id}"),
        }
    }

    pub fn load_request(self, key: &WorkflowKey) -> Option<LoadRequest> {
        match self {
            Self::Workflows => Some(LoadRequest::Workflows {
                query: String::new(),
            }),
            Self::WorkflowDetails => Some(LoadRequest::WorkflowDetails(key.clone())),
            Self::Unset | Self::WorkflowTermination => None,
        }
    }

    /// Content shown by pages that never fetch.
    pub fn static_rows(self, key: &WorkflowKey) -> Option<Vec<Row>> {
        match self {
            Self::WorkflowTermination => Some(vec![
                Row::info(format!(
                    "Terminate workflow {} (run {})",
                    key.workflow_id, key.run_id
                )),
                Row::info("Workflow termination is not available in this version."),
                Row::info("Press esc to return to workflows."),
            ]),
            Self::Unset | Self::Workflows | Self::WorkflowDetails => None,
        }
    }

    /// Informational rows that replace an empty result.
    pub fn empty_rows(self) -> Option<Vec<Row>> {
        match self {
            Self::Workflows => Some(vec![
                Row::info("No workflow executions found. Is the namespace empty or the address wrong?"),
                Row::info("Press q or ctrl+c to quit."),
            ]),
            Self::Unset | Self::WorkflowDetails | Self::WorkflowTermination => None,
        }
    }

    /// Delay before the next periodic refresh, if this page refreshes.
    pub fn refresh_delay(self, interval: Duration) -> Option<Duration> {
        (self.does_periodic_update() && interval > Duration::ZERO).then_some(interval)
    }

    pub fn config(self, width: u16, height: u16) -> PageConfig {
        PageConfig {
            width,
            height,
            filter_prefix: self.filter_prefix(""),
            loading_label: self.loading_label(),
            selection_enabled: self.selection_enabled(),
            wrap_text: matches!(self, Self::WorkflowDetails),
            request_input: false,
            loading: self.does_load(),
        }
    }
}
