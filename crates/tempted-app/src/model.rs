// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::keys::WorkflowKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionStatus {
    Unspecified,
    Running,
    Completed,
    Failed,
    Canceled,
    Terminated,
    ContinuedAsNew,
    TimedOut,
}

impl ExecutionStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unspecified => "unspecified",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Canceled => "canceled",
            Self::Terminated => "terminated",
            Self::ContinuedAsNew => "continued_as_new",
            Self::TimedOut => "timed_out",
        }
    }

    /// Accepts both the short form and the server's enum spelling
    /// (`WORKFLOW_EXECUTION_STATUS_RUNNING`).
    pub fn parse(value: &str) -> Option<Self> {
        let short = value
            .strip_prefix("WORKFLOW_EXECUTION_STATUS_")
            .unwrap_or(value)
            .to_ascii_lowercase();
        match short.as_str() {
            "" | "unspecified" => Some(Self::Unspecified),
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            "canceled" => Some(Self::Canceled),
            "terminated" => Some(Self::Terminated),
            "continued_as_new" => Some(Self::ContinuedAsNew),
            "timed_out" => Some(Self::TimedOut),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionInfo {
    pub workflow_type: String,
    pub workflow_id: String,
    pub run_id: String,
    pub task_queue: String,
    pub status: ExecutionStatus,
    pub start_time: Option<OffsetDateTime>,
    pub execution_time: Option<OffsetDateTime>,
    pub close_time: Option<OffsetDateTime>,
    pub parent_namespace_id: String,
}

impl ExecutionInfo {
    pub fn key(&self) -> WorkflowKey {
        WorkflowKey::new(
            self.workflow_id.clone(),
            self.run_id.clone(),
            self.parent_namespace_id.clone(),
        )
    }
}

/// One page of a list call. An empty `next_page_token` marks the last page.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExecutionPage {
    pub executions: Vec<ExecutionInfo>,
    pub next_page_token: String,
}

/// Raw description of a single execution as returned by the server.
pub type ExecutionDetail = serde_json::Value;
