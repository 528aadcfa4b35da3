// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const KEY_DELIMITER: char = ' ';
const ESCAPE: char = '%';

/// Identifies one workflow execution. Rows on the workflows page carry this
/// as their opaque key so that selecting a row yields the execution to load.
/// Fields are escaped in the row key, so workflow IDs may contain spaces.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkflowKey {
    pub workflow_id: String,
    pub run_id: String,
    pub parent_namespace_id: String,
}

impl WorkflowKey {
    pub fn new(
        workflow_id: impl Into<String>,
        run_id: impl Into<String>,
        parent_namespace_id: impl Into<String>,
    ) -> Self {
        Self {
            workflow_id: workflow_id.into(),
            run_id: run_id.into(),
            parent_namespace_id: parent_namespace_id.into(),
        }
    }

    pub fn to_row_key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for WorkflowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{KEY_DELIMITER}{}{KEY_DELIMITER}{}",
            escape_field(&self.workflow_id),
            escape_field(&self.run_id),
            escape_field(&self.parent_namespace_id)
        )
    }
}

impl FromStr for WorkflowKey {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        let parts = value.split(KEY_DELIMITER).collect::<Vec<_>>();
        let [workflow_id, run_id, parent_namespace_id] = parts.as_slice() else {
            bail!(
                "malformed workflow row key {value:?}; expected 3 space-separated fields, got {}",
                parts.len()
            );
        };
        Ok(Self::new(
            unescape_field(workflow_id, value)?,
            unescape_field(run_id, value)?,
            unescape_field(parent_namespace_id, value)?,
        ))
    }
}

fn escape_field(field: &str) -> String {
    let mut escaped = String::with_capacity(field.len());
    for ch in field.chars() {
        match ch {
            ESCAPE => escaped.push_str("%25"),
            KEY_DELIMITER => escaped.push_str("%20"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn unescape_field(field: &str, key: &str) -> Result<String> {
    let mut unescaped = String::with_capacity(field.len());
    let mut chars = field.chars();
    while let Some(ch) = chars.next() {
        if ch != ESCAPE {
            unescaped.push(ch);
            continue;
        }
        let code = chars.by_ref().take(2).collect::<String>();
        match code.as_str() {
            "20" => unescaped.push(KEY_DELIMITER),
            "25" => unescaped.push(ESCAPE),
            _ => bail!("malformed workflow row key {key:?}; bad escape %{code}"),
        }
    }
    Ok(unescaped)
}
