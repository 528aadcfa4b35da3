// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use serde_json::json;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use tempted_app::{
    Config, Connector, ExecutionDetail, ExecutionInfo, ExecutionPage, ExecutionStatus,
    WorkflowSource,
};
use time::{Duration, OffsetDateTime};

const WORKFLOW_TYPES: [&str; 8] = [
    "OrderWorkflow",
    "PaymentWorkflow",
    "ShipmentWorkflow",
    "RefundWorkflow",
    "InventorySync",
    "InvoiceBatch",
    "UserOnboarding",
    "NightlyReport",
];

const TASK_QUEUES: [&str; 4] = ["orders", "payments", "fulfilment", "reports"];

const STATUSES: [ExecutionStatus; 5] = [
    ExecutionStatus::Running,
    ExecutionStatus::Running,
    ExecutionStatus::Completed,
    ExecutionStatus::Failed,
    ExecutionStatus::TimedOut,
];

const REFERENCE_TIMESTAMP: i64 = 1_771_504_496;
const FIXTURE_DATETIME: &str = "2026-02-19T12:34:56Z";

/// SplitMix64; small, seedable and good enough for fixtures.
#[derive(Debug, Clone)]
struct SplitMix {
    state: u64,
}

impl SplitMix {
    const GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;

    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(Self::GAMMA);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    fn below(&mut self, bound: usize) -> usize {
        match u64::try_from(bound) {
            Ok(0 | 1) | Err(_) => 0,
            Ok(bound) => usize::try_from(self.next_u64() % bound).unwrap_or(0),
        }
    }

    fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[self.below(items.len())]
    }
}

/// Generates plausible workflow executions from a seed.
#[derive(Debug, Clone)]
pub struct WorkflowFaker {
    rng: SplitMix,
    counter: u64,
}

impl WorkflowFaker {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: SplitMix::new(seed),
            counter: 0,
        }
    }

    pub fn execution(&mut self) -> ExecutionInfo {
        self.counter += 1;
        let workflow_type = *self.rng.pick(&WORKFLOW_TYPES);
        let status = *self.rng.pick(&STATUSES);
        let started = reference_now() - Duration::minutes(self.rng.below(600) as i64);
        let close_time = (status != ExecutionStatus::Running)
            .then(|| started + Duration::seconds(self.rng.below(3_600) as i64 + 1));
        let prefix = workflow_type.trim_end_matches("Workflow").to_lowercase();
        ExecutionInfo {
            workflow_type: workflow_type.to_owned(),
            workflow_id: format!("{prefix}-{}", self.counter),
            run_id: format!("{:016x}", self.rng.next_u64()),
            task_queue: (*self.rng.pick(&TASK_QUEUES)).to_owned(),
            status,
            start_time: Some(started),
            execution_time: Some(started),
            close_time,
            parent_namespace_id: String::new(),
        }
    }

    pub fn executions(&mut self, count: usize) -> Vec<ExecutionInfo> {
        (0..count).map(|_| self.execution()).collect()
    }
}

/// A running execution with predictable identifiers.
pub fn sample_execution(workflow_id: &str, run_id: &str) -> ExecutionInfo {
    ExecutionInfo {
        workflow_type: "OrderWorkflow".to_owned(),
        workflow_id: workflow_id.to_owned(),
        run_id: run_id.to_owned(),
        task_queue: "orders".to_owned(),
        status: ExecutionStatus::Running,
        start_time: Some(reference_now()),
        execution_time: Some(reference_now()),
        close_time: None,
        parent_namespace_id: "ns-1".to_owned(),
    }
}

/// Description document shaped like the server's describe response.
pub fn sample_detail(execution: &ExecutionInfo) -> ExecutionDetail {
    json!({
        "executionConfig": {
            "taskQueue": {"name": execution.task_queue},
        },
        "workflowExecutionInfo": {
            "execution": {
                "workflowId": execution.workflow_id,
                "runId": execution.run_id,
            },
            "type": {"name": execution.workflow_type},
            "status": format!("WORKFLOW_EXECUTION_STATUS_{}", execution.status.as_str().to_uppercase()),
            "startTime": FIXTURE_DATETIME,
        },
        "pendingActivities": [],
    })
}

#[derive(Debug, Default)]
struct SourceState {
    pages: Vec<ExecutionPage>,
    details: BTreeMap<(String, String), ExecutionDetail>,
    failure: Option<String>,
    list_calls: usize,
    describe_calls: usize,
}

/// In-memory workflow source with scripted pages and call counters.
#[derive(Debug, Default)]
pub struct StaticSource {
    state: Mutex<SourceState>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `executions` split into pages of `page_size`, chained by
    /// page tokens.
    pub fn with_executions(executions: Vec<ExecutionInfo>, page_size: usize) -> Result<Self> {
        let source = Self::new();
        source.set_executions(executions, page_size)?;
        Ok(source)
    }

    pub fn set_executions(&self, executions: Vec<ExecutionInfo>, page_size: usize) -> Result<()> {
        let page_size = page_size.max(1);
        let mut state = self.lock()?;
        state.details.clear();
        for execution in &executions {
            state.details.insert(
                (execution.workflow_id.clone(), execution.run_id.clone()),
                sample_detail(execution),
            );
        }
        let chunks = executions.chunks(page_size).collect::<Vec<_>>();
        let last = chunks.len().saturating_sub(1);
        state.pages = chunks
            .iter()
            .enumerate()
            .map(|(index, chunk)| ExecutionPage {
                executions: chunk.to_vec(),
                next_page_token: if index == last {
                    String::new()
                } else {
                    format!("page-{}", index + 1)
                },
            })
            .collect();
        Ok(())
    }

    pub fn fail_with(&self, message: &str) -> Result<()> {
        self.lock()?.failure = Some(message.to_owned());
        Ok(())
    }

    pub fn list_calls(&self) -> Result<usize> {
        Ok(self.lock()?.list_calls)
    }

    pub fn describe_calls(&self) -> Result<usize> {
        Ok(self.lock()?.describe_calls)
    }

    fn lock(&self) -> Result<MutexGuard<'_, SourceState>> {
        self.state
            .lock()
            .map_err(|_| anyhow!("static source state poisoned"))
    }
}

impl WorkflowSource for StaticSource {
    fn list_executions_page(&self, _query: &str, next_page_token: &str) -> Result<ExecutionPage> {
        let mut state = self.lock()?;
        state.list_calls += 1;
        if let Some(message) = &state.failure {
            bail!("{message}");
        }
        let index = if next_page_token.is_empty() {
            0
        } else {
            next_page_token
                .strip_prefix("page-")
                .and_then(|value| value.parse::<usize>().ok())
                .with_context(|| format!("unknown page token {next_page_token:?}"))?
        };
        Ok(state.pages.get(index).cloned().unwrap_or_default())
    }

    fn describe_execution(&self, workflow_id: &str, run_id: &str) -> Result<ExecutionDetail> {
        let mut state = self.lock()?;
        state.describe_calls += 1;
        if let Some(message) = &state.failure {
            bail!("{message}");
        }
        state
            .details
            .get(&(workflow_id.to_owned(), run_id.to_owned()))
            .cloned()
            .with_context(|| format!("workflow {workflow_id} run {run_id} not found"))
    }
}

/// Hands out a shared `StaticSource` and records the configs it saw.
#[derive(Debug, Default)]
pub struct StaticConnector {
    source: Arc<StaticSource>,
    seen: Arc<Mutex<Vec<Config>>>,
}

impl StaticConnector {
    pub fn new(source: Arc<StaticSource>) -> Self {
        Self {
            source,
            seen: Arc::default(),
        }
    }

    /// Handle to the configs passed to `connect`, usable after the
    /// connector moves into a model.
    pub fn seen_configs(&self) -> Arc<Mutex<Vec<Config>>> {
        Arc::clone(&self.seen)
    }
}

impl Connector for StaticConnector {
    fn connect(&self, config: &Config) -> Result<Arc<dyn WorkflowSource>> {
        self.seen
            .lock()
            .map_err(|_| anyhow!("connector state poisoned"))?
            .push(config.clone());
        let source: Arc<dyn WorkflowSource> = self.source.clone();
        Ok(source)
    }
}

/// Connector whose connect always fails with the given message.
#[derive(Debug, Clone)]
pub struct FailingConnector {
    message: String,
}

impl FailingConnector {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Connector for FailingConnector {
    fn connect(&self, _config: &Config) -> Result<Arc<dyn WorkflowSource>> {
        bail!("{}", self.message)
    }
}

pub fn temp_save_path(name: &str) -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let path = dir.path().join(name);
    Ok((dir, path))
}

pub fn reference_now() -> OffsetDateTime {
    OffsetDateTime::from_unix_timestamp(REFERENCE_TIMESTAMP).unwrap_or(OffsetDateTime::UNIX_EPOCH)
}
