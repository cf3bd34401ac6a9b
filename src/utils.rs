// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::aggregator::{Crosscheck, Progress, ProgressUpdate};
use crate::chunk::RowFilter;
use crate::config::Settings;
use crate::dashboard::Dashboard;
use crate::error::DashError;
use anyhow::{Context, Result};
use clap::ArgMatches;
use comfy_table::{Cell, Table, presets::UTF8_FULL};
use rust_decimal::Decimal;
use std::path::Path;
use tracing::{debug, info};

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // arrays stream one element per line
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// `1234567` -> `1,234,567`.
pub fn fmt_count(n: u64) -> String {
    group_thousands(&n.to_string())
}

/// Two decimals with thousands separators, followed by `ccy` when given:
/// `1234.5` -> `1,234.50 MMK`.
pub fn fmt_amount(d: &Decimal, ccy: &str) -> String {
    let rounded = d.round_dp(2);
    let plain = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    let body = format!("{}{}.{}", sign, group_thousands(int_part), frac_part);
    if ccy.is_empty() {
        body
    } else {
        format!("{} {}", body, ccy)
    }
}

/// Reports batch progress through the log.
#[derive(Debug, Default)]
pub struct LogProgress;

impl Progress for LogProgress {
    fn on_window(&mut self, update: ProgressUpdate<'_>) {
        debug!(
            file = update.file,
            done = update.bytes_done,
            total = update.bytes_total,
            "{:.1}%",
            update.percent()
        );
    }
}

/// Applies the per-invocation overrides on top of the loaded settings.
pub fn settings_for(m: &ArgMatches, base: &Settings) -> Result<Settings> {
    let mut settings = base.clone();
    if let Some(size) = m.get_one::<usize>("chunk-size") {
        settings.chunk_size = *size;
    }
    if m.get_flag("crosscheck") {
        settings.crosscheck = true;
    }
    settings.validate()?;
    Ok(settings)
}

pub fn filter_for(m: &ArgMatches) -> RowFilter {
    let upper = |key: &str| {
        m.get_one::<String>(key)
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
    };
    RowFilter {
        currency: upper("currency"),
        report_type: upper("report-type"),
    }
}

/// Builds the session a command works on: selects the given files, runs one
/// batch and applies any `--remove`s in order.
pub fn open_session(m: &ArgMatches, base: &Settings) -> Result<Dashboard> {
    let settings = settings_for(m, base)?;
    let mut dash = Dashboard::new(settings).with_filter(filter_for(m));

    for path in m.get_many::<String>("files").into_iter().flatten() {
        match dash.select_path(Path::new(path)) {
            Ok(()) => {}
            Err(e @ (DashError::NotCsv(_) | DashError::DuplicateFile(_))) => {
                eprintln!("Skipping {}: {}", path, e);
            }
            Err(e) => return Err(e).with_context(|| format!("Failed to load '{}'", path)),
        }
    }

    let report = dash.process_files(&mut LogProgress)?;
    for file in &report.processed {
        if file.crosscheck == Some(Crosscheck::Mismatched) {
            eprintln!("Warning: crosscheck mismatch for {}", file.name);
        }
    }

    for name in m.get_many::<String>("remove").into_iter().flatten() {
        let outcome = dash
            .remove_file(name)
            .with_context(|| format!("Failed to remove '{}'", name))?;
        info!(file = %outcome.name, status = %outcome.status, "removal applied");
    }
    Ok(dash)
}
