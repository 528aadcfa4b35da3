// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use reqwest::StatusCode;
use reqwest::blocking::{Client as HttpClient, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tempted_app::{
    Config, Connector, ExecutionDetail, ExecutionInfo, ExecutionPage, ExecutionStatus,
    WorkflowSource,
};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use url::Url;

/// Blocking client for the Temporal HTTP API.
#[derive(Debug, Clone)]
pub struct Client {
    base_url: Url,
    namespace: String,
    token: Option<String>,
    timeout: Duration,
    http: HttpClient,
}

impl Client {
    pub fn new(
        address: &str,
        namespace: &str,
        token: Option<&str>,
        timeout: Duration,
    ) -> Result<Self> {
        let base_url = normalize_address(address)?;
        if namespace.trim().is_empty() {
            bail!("temporal.namespace must not be empty");
        }
        if timeout.is_zero() {
            bail!("temporal.timeout must be positive");
        }

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            namespace: namespace.trim().to_owned(),
            token: token
                .map(str::trim)
                .filter(|token| !token.is_empty())
                .map(str::to_owned),
            timeout,
            http,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            &config.address,
            &config.namespace,
            config.token.as_deref(),
            config.timeout,
        )
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn list_page(&self, query: &str, next_page_token: &str) -> Result<ExecutionPage> {
        let mut url = self.endpoint(&["workflows"])?;
        {
            let mut pairs = url.query_pairs_mut();
            if !query.is_empty() {
                pairs.append_pair("query", query);
            }
            if !next_page_token.is_empty() {
                pairs.append_pair("nextPageToken", next_page_token);
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }

        let parsed: ListResponse = self.get_json(url, "workflow list")?;
        let executions = parsed
            .executions
            .into_iter()
            .map(ExecutionRecord::into_info)
            .collect::<Result<Vec<_>>>()?;
        tracing::debug!(
            count = executions.len(),
            more = !parsed.next_page_token.is_empty(),
            "listed workflow page"
        );
        Ok(ExecutionPage {
            executions,
            next_page_token: parsed.next_page_token,
        })
    }

    pub fn describe(&self, workflow_id: &str, run_id: &str) -> Result<ExecutionDetail> {
        if workflow_id.is_empty() {
            bail!("workflow id must not be empty");
        }
        let mut url = self.endpoint(&["workflows", workflow_id])?;
        if !run_id.is_empty() {
            url.query_pairs_mut().append_pair("execution.runId", run_id);
        }
        self.get_json(url, "workflow description")
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| anyhow!("address {} cannot carry a path", self.base_url))?
            .pop_if_empty()
            .extend(["api", "v1", "namespaces", self.namespace.as_str()])
            .extend(segments);
        Ok(url)
    }

    fn get_json<T: DeserializeOwned>(&self, url: Url, what: &str) -> Result<T> {
        tracing::debug!(%url, "temporal request");
        let response = self
            .authorize(self.http.get(url.clone()))
            .send()
            .map_err(|error| connection_error(self.base_url(), error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(status, &body));
        }
        response.json().with_context(|| format!("decode {what}"))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

impl WorkflowSource for Client {
    fn list_executions_page(&self, query: &str, next_page_token: &str) -> Result<ExecutionPage> {
        self.list_page(query, next_page_token)
    }

    fn describe_execution(&self, workflow_id: &str, run_id: &str) -> Result<ExecutionDetail> {
        self.describe(workflow_id, run_id)
    }
}

/// Connects by building an HTTP client from the resolved configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpConnector;

impl Connector for HttpConnector {
    fn connect(&self, config: &Config) -> Result<Arc<dyn WorkflowSource>> {
        let client = Client::from_config(config)?;
        tracing::info!(
            address = client.base_url(),
            namespace = client.namespace(),
            "connected to temporal"
        );
        Ok(Arc::new(client))
    }
}

/// Accepts `host:port` or a full URL. Bare addresses get `http://`.
pub fn normalize_address(address: &str) -> Result<Url> {
    let trimmed = address.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        bail!("temporal.address must not be empty");
    }
    let with_scheme = if trimmed.contains("://") {
        trimmed.to_owned()
    } else {
        format!("http://{trimmed}")
    };
    let url = Url::parse(&with_scheme)
        .with_context(|| format!("invalid temporal address {address:?}"))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!(
            "temporal address {address:?} uses unsupported scheme {:?} -- use http or https",
            url.scheme()
        );
    }
    if url.host_str().is_none() {
        bail!("temporal address {address:?} has no host");
    }
    Ok(url)
}

fn connection_error(base_url: &str, error: reqwest::Error) -> anyhow::Error {
    if error.is_timeout() {
        return anyhow!("request to {base_url} timed out ({error})");
    }
    anyhow!(
        "cannot reach {} -- check that the Temporal server is running and its HTTP API is enabled ({})",
        base_url,
        error
    )
}

fn clean_error_response(status: StatusCode, body: &str) -> anyhow::Error {
    if let Ok(parsed) = serde_json::from_str::<ErrorEnvelope>(body)
        && let Some(message) = parsed.message
        && !message.is_empty()
    {
        return anyhow!("server error ({}): {}", status.as_u16(), message);
    }

    if body.len() < 100 && !body.contains('{') && !body.trim().is_empty() {
        return anyhow!("server error ({}): {}", status.as_u16(), body.trim());
    }

    anyhow!("server returned {}", status.as_u16())
}

fn parse_time(value: Option<&str>) -> Result<Option<OffsetDateTime>> {
    match value.filter(|value| !value.is_empty()) {
        Some(value) => OffsetDateTime::parse(value, &Rfc3339)
            .map(Some)
            .with_context(|| format!("invalid timestamp {value:?}")),
        None => Ok(None),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorEnvelope {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    executions: Vec<ExecutionRecord>,
    #[serde(default)]
    next_page_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExecutionRecord {
    #[serde(default)]
    execution: ExecutionRef,
    #[serde(default, rename = "type")]
    workflow_type: TypeRef,
    #[serde(default)]
    task_queue: String,
    #[serde(default)]
    status: String,
    start_time: Option<String>,
    execution_time: Option<String>,
    close_time: Option<String>,
    #[serde(default)]
    parent_namespace_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExecutionRef {
    #[serde(default)]
    workflow_id: String,
    #[serde(default)]
    run_id: String,
}

#[derive(Debug, Default, Deserialize)]
struct TypeRef {
    #[serde(default)]
    name: String,
}

impl ExecutionRecord {
    fn into_info(self) -> Result<ExecutionInfo> {
        let status = ExecutionStatus::parse(&self.status).unwrap_or_else(|| {
            tracing::warn!(
                status = %self.status,
                workflow_id = %self.execution.workflow_id,
                "unknown workflow status"
            );
            ExecutionStatus::Unspecified
        });
        Ok(ExecutionInfo {
            workflow_type: self.workflow_type.name,
            workflow_id: self.execution.workflow_id,
            run_id: self.execution.run_id,
            task_queue: self.task_queue,
            status,
            start_time: parse_time(self.start_time.as_deref())?,
            execution_time: parse_time(self.execution_time.as_deref())?,
            close_time: parse_time(self.close_time.as_deref())?,
            parent_namespace_id: self.parent_namespace_id,
        })
    }
}
