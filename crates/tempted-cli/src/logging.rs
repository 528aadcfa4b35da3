// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use std::fs::{File, OpenOptions};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub const DEBUG_ENV: &str = "TEMPTED_DEBUG";
pub const FILTER_ENV: &str = "TEMPTED_LOG";
const DEFAULT_LOG_FILE: &str = "tempted.log";
const DEFAULT_LEVEL: &str = "debug";

/// Where debug logs go. The terminal belongs to the UI, so logging is off
/// unless `TEMPTED_DEBUG` asks for a file.
pub fn log_path(debug: Option<&str>) -> Option<PathBuf> {
    let value = debug?.trim();
    if value.is_empty() || matches!(value.to_ascii_lowercase().as_str(), "0" | "false") {
        return None;
    }
    if matches!(value.to_ascii_lowercase().as_str(), "1" | "true") {
        return Some(PathBuf::from(DEFAULT_LOG_FILE));
    }
    Some(PathBuf::from(value))
}

fn build_env_filter(project: Option<&str>) -> EnvFilter {
    if let Some(directive) = project.filter(|value| !value.trim().is_empty())
        && let Ok(filter) = EnvFilter::try_new(directive)
    {
        return filter;
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL))
}

/// Installs the file subscriber when debugging is on. Returns the log path.
pub fn init() -> Result<Option<PathBuf>> {
    let Some(path) = log_path(std::env::var(DEBUG_ENV).ok().as_deref()) else {
        return Ok(None);
    };

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("open log file {}", path.display()))?;
    let writer: Arc<File> = Arc::new(file);
    let filter = build_env_filter(std::env::var(FILTER_ENV).ok().as_deref());

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .try_init()
        .map_err(|error| anyhow!("install log subscriber: {error}"))?;

    tracing::debug!(path = %path.display(), "logging enabled");
    Ok(Some(path))
}
