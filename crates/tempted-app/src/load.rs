// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};

use crate::formatter::{format_time, pretty_value_lines, render_table};
use crate::keys::WorkflowKey;
use crate::message::Msg;
use crate::model::ExecutionInfo;
use crate::page::Row;
use crate::pages::{LoadRequest, Page};
use crate::source::WorkflowSource;

pub const WORKFLOW_COLUMNS: [&str; 8] = [
    "Type",
    "Workflow ID",
    "Run ID",
    "Task Queue",
    "Status",
    "Start Time",
    "Exec Time",
    "End Time",
];

/// Runs a load against the source and converts the outcome into the
/// message the model expects. Blocks; call off the event loop.
pub fn load_page(request: &LoadRequest, source: &dyn WorkflowSource) -> Msg {
    let loaded = match request {
        LoadRequest::Workflows { query } => load_workflows(source, query),
        LoadRequest::WorkflowDetails(key) => load_details(source, key),
    };
    match loaded {
        Ok(msg) => msg,
        Err(error) => {
            tracing::warn!(error = %format!("{error:#}"), "page load failed");
            Msg::error(&error)
        }
    }
}

fn load_workflows(source: &dyn WorkflowSource, query: &str) -> Result<Msg> {
    let executions = source
        .list_executions(query)
        .context("list workflow executions")?;
    tracing::debug!(count = executions.len(), "loaded workflow executions");
    let (header, rows) = workflow_table(&executions);
    Ok(Msg::PageLoaded {
        page: Page::Workflows,
        key: None,
        header,
        rows,
    })
}

fn load_details(source: &dyn WorkflowSource, key: &WorkflowKey) -> Result<Msg> {
    let detail = source
        .describe_execution(&key.workflow_id, &key.run_id)
        .with_context(|| format!("describe workflow {}", key.workflow_id))?;
    let rows = pretty_value_lines(&detail)
        .into_iter()
        .map(Row::info)
        .collect();
    Ok(Msg::PageLoaded {
        page: Page::WorkflowDetails,
        key: Some(key.clone()),
        header: Vec::new(),
        rows,
    })
}

/// Header line and one keyed row per execution.
pub fn workflow_table(executions: &[ExecutionInfo]) -> (Vec<String>, Vec<Row>) {
    let cells = executions
        .iter()
        .map(|execution| {
            vec![
                execution.workflow_type.clone(),
                execution.workflow_id.clone(),
                execution.run_id.clone(),
                execution.task_queue.clone(),
                execution.status.as_str().to_owned(),
                format_time(execution.start_time),
                format_time(execution.execution_time),
                format_time(execution.close_time),
            ]
        })
        .collect::<Vec<_>>();
    let table = render_table(&WORKFLOW_COLUMNS, &cells);
    let rows = executions
        .iter()
        .zip(table.content_rows)
        .map(|(execution, text)| Row::new(execution.key().to_row_key(), text))
        .collect();
    (table.header_rows, rows)
}

#[cfg(test)]
mod tests {
    use super::{load_page, workflow_table};
    use crate::keys::WorkflowKey;
    use crate::message::Msg;
    use crate::model::{ExecutionDetail, ExecutionInfo, ExecutionPage, ExecutionStatus};
    use crate::pages::{LoadRequest, Page};
    use crate::source::WorkflowSource;
    use anyhow::{Result, bail};
    use serde_json::json;
    use std::sync::Mutex;
    use time::macros::datetime;

    fn execution(id: &str) -> ExecutionInfo {
        ExecutionInfo {
            workflow_type: "OrderWorkflow".to_owned(),
            workflow_id: id.to_owned(),
            run_id: format!("{id}-run"),
            task_queue: "orders".to_owned(),
            status: ExecutionStatus::Running,
            start_time: Some(datetime!(2026-01-02 03:04:05 UTC)),
            execution_time: None,
            close_time: None,
            parent_namespace_id: "ns".to_owned(),
        }
    }

    struct PagedSource {
        pages: Vec<ExecutionPage>,
        tokens_seen: Mutex<Vec<String>>,
    }

    impl WorkflowSource for PagedSource {
        fn list_executions_page(&self, _query: &str, token: &str) -> Result<ExecutionPage> {
            let mut seen = self
                .tokens_seen
                .lock()
                .map_err(|_| anyhow::anyhow!("poisoned"))?;
            let index = seen.len();
            seen.push(token.to_owned());
            Ok(self.pages.get(index).cloned().unwrap_or_default())
        }

        fn describe_execution(&self, workflow_id: &str, run_id: &str) -> Result<ExecutionDetail> {
            if workflow_id == "missing" {
                bail!("workflow not found");
            }
            Ok(json!({"workflowId": workflow_id, "runId": run_id}))
        }
    }

    #[test]
    fn list_follows_page_tokens() -> Result<()> {
        let source = PagedSource {
            pages: vec![
                ExecutionPage {
                    executions: vec![execution("a")],
                    next_page_token: "t1".to_owned(),
                },
                ExecutionPage {
                    executions: vec![execution("b"), execution("c")],
                    next_page_token: String::new(),
                },
            ],
            tokens_seen: Mutex::new(Vec::new()),
        };
        let executions = source.list_executions("")?;
        assert_eq!(executions.len(), 3);
        let seen = source
            .tokens_seen
            .lock()
            .map_err(|_| anyhow::anyhow!("poisoned"))?;
        assert_eq!(*seen, vec![String::new(), "t1".to_owned()]);
        Ok(())
    }

    #[test]
    fn workflow_rows_carry_keys() -> Result<()> {
        let (header, rows) = workflow_table(&[execution("order-1")]);
        assert_eq!(header.len(), 1);
        assert!(header[0].starts_with("Type"));
        assert!(header[0].ends_with("End Time"));
        let key = rows[0].key.parse::<WorkflowKey>()?;
        assert_eq!(key, WorkflowKey::new("order-1", "order-1-run", "ns"));
        assert!(rows[0].text.contains("running"));
        assert!(rows[0].text.contains("2026-01-02 03:04:05"));
        Ok(())
    }

    #[test]
    fn spaced_workflow_id_survives_row_key() -> Result<()> {
        let mut spaced = execution("a b");
        spaced.run_id = "r".to_owned();
        let (_, rows) = workflow_table(&[spaced]);
        let key = rows[0].key.parse::<WorkflowKey>()?;
        assert_eq!(key, WorkflowKey::new("a b", "r", "ns"));
        assert!(rows[0].text.contains("a b"));
        Ok(())
    }

    #[test]
    fn details_are_pretty_printed() {
        let source = PagedSource {
            pages: Vec::new(),
            tokens_seen: Mutex::new(Vec::new()),
        };
        let msg = load_page(
            &LoadRequest::WorkflowDetails(WorkflowKey::new("wf", "run", "")),
            &source,
        );
        let Msg::PageLoaded {
            page,
            key,
            header,
            rows,
        } = msg
        else {
            panic!("expected page loaded, got {msg:?}");
        };
        assert_eq!(page, Page::WorkflowDetails);
        assert_eq!(key, Some(WorkflowKey::new("wf", "run", "")));
        assert!(header.is_empty());
        assert_eq!(rows.first().map(|row| row.text.as_str()), Some("{"));
        assert!(rows.iter().all(|row| row.key.is_empty()));
    }

    #[test]
    fn failures_become_error_messages() {
        let source = PagedSource {
            pages: Vec::new(),
            tokens_seen: Mutex::new(Vec::new()),
        };
        let msg = load_page(
            &LoadRequest::WorkflowDetails(WorkflowKey::new("missing", "run", "")),
            &source,
        );
        assert_eq!(
            msg,
            Msg::Error("describe workflow missing: workflow not found".to_owned())
        );
    }
}
