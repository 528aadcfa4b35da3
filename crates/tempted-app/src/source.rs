// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use std::sync::Arc;

use crate::model::{ExecutionDetail, ExecutionInfo, ExecutionPage};
use crate::state::Config;

/// Remote provider of workflow executions. Implementations own transport,
/// authentication and timeouts; calls block and run off the event loop.
pub trait WorkflowSource: Send + Sync {
    fn list_executions_page(&self, query: &str, next_page_token: &str) -> Result<ExecutionPage>;

    fn describe_execution(&self, workflow_id: &str, run_id: &str) -> Result<ExecutionDetail>;

    fn list_executions(&self, query: &str) -> Result<Vec<ExecutionInfo>> {
        let mut executions = Vec::new();
        let mut token = String::new();
        loop {
            let page = self.list_executions_page(query, &token)?;
            executions.extend(page.executions);
            if page.next_page_token.is_empty() {
                return Ok(executions);
            }
            token = page.next_page_token;
        }
    }
}

/// Builds the workflow source once the UI knows it is live.
pub trait Connector: Send {
    fn connect(&self, config: &Config) -> Result<Arc<dyn WorkflowSource>>;
}
