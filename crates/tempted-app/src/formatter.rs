// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use regex::Regex;
use std::sync::LazyLock;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

const COLUMN_GAP: &str = "  ";
const MISSING_TIME: &str = "-";
const BELL: &str = "\u{7}";

static ANSI_SEQUENCE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\x1b\[[0-9;?]*[ -/]*[@-~]").ok());
static OS_COMMAND_SEQUENCE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\x1b\][^\x07\x1b]*(?:\x07|\x1b\\)").ok());

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RenderedTable {
    pub header_rows: Vec<String>,
    pub content_rows: Vec<String>,
}

/// Lays out cells in left-aligned columns padded to the widest cell.
pub fn render_table(columns: &[&str], rows: &[Vec<String>]) -> RenderedTable {
    let mut widths = columns
        .iter()
        .map(|column| column.chars().count())
        .collect::<Vec<_>>();
    for row in rows {
        for (index, cell) in row.iter().enumerate() {
            let width = cell.chars().count();
            match widths.get_mut(index) {
                Some(current) => *current = (*current).max(width),
                None => widths.push(width),
            }
        }
    }

    let header = columns
        .iter()
        .map(|column| (*column).to_owned())
        .collect::<Vec<_>>();
    RenderedTable {
        header_rows: vec![join_padded(&header, &widths)],
        content_rows: rows.iter().map(|row| join_padded(row, &widths)).collect(),
    }
}

fn join_padded(cells: &[String], widths: &[usize]) -> String {
    let padded = cells
        .iter()
        .enumerate()
        .map(|(index, cell)| {
            let width = widths.get(index).copied().unwrap_or(0);
            format!("{cell:<width$}")
        })
        .collect::<Vec<_>>();
    padded.join(COLUMN_GAP).trim_end().to_owned()
}

/// Pretty-prints a JSON document one line per entry. Input that is not
/// JSON is returned line by line unchanged.
pub fn pretty_json_lines(raw: &str) -> Vec<String> {
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(value) => pretty_value_lines(&value),
        Err(_) => raw.lines().map(str::to_owned).collect(),
    }
}

pub fn pretty_value_lines(value: &serde_json::Value) -> Vec<String> {
    match serde_json::to_string_pretty(value) {
        Ok(pretty) => pretty.lines().map(str::to_owned).collect(),
        Err(_) => vec![value.to_string()],
    }
}

pub fn strip_ansi(input: &str) -> String {
    match ANSI_SEQUENCE.as_ref() {
        Some(pattern) => pattern.replace_all(input, "").into_owned(),
        None => input.to_owned(),
    }
}

pub fn strip_os_command_sequences(input: &str) -> String {
    match OS_COMMAND_SEQUENCE.as_ref() {
        Some(pattern) => pattern.replace_all(input, "").into_owned(),
        None => input.to_owned(),
    }
}

/// Splits streamed output into display lines with terminal control
/// sequences removed. Lone bells are dropped because they ring the
/// hosting terminal.
pub fn output_lines(content: &str) -> Vec<String> {
    content
        .split('\n')
        .map(|line| strip_ansi(&strip_os_command_sequences(line)))
        .filter(|line| line != BELL)
        .collect()
}

pub fn format_time(value: Option<OffsetDateTime>) -> String {
    let Some(value) = value else {
        return MISSING_TIME.to_owned();
    };
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    value
        .to_offset(UtcOffset::UTC)
        .format(&format)
        .unwrap_or_else(|_| MISSING_TIME.to_owned())
}
