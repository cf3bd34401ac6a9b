// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config::Settings;
use crate::table::{DateRow, DateTable};
use crate::utils::open_session;
use anyhow::{Context, Result, bail};
use std::path::Path;

pub fn handle(m: &clap::ArgMatches, settings: &Settings) -> Result<()> {
    let fmt = m
        .get_one::<String>("format")
        .map(|s| s.to_lowercase())
        .unwrap_or_else(|| "csv".to_string());
    let out = m.get_one::<String>("out").context("--out is required")?;
    if fmt != "csv" && fmt != "json" {
        bail!("Unknown format: {} (use csv|json)", fmt);
    }

    let dash = open_session(m, settings)?;
    export_table(dash.table(), &fmt, Path::new(out))?;
    println!("Exported {} date rows to {}", dash.table().len(), out);
    Ok(())
}

/// Writes every date-table row in display order.
pub fn export_table(table: &DateTable, fmt: &str, out: &Path) -> Result<()> {
    let rows = table.rows();
    match fmt {
        "csv" => {
            let mut wtr = csv::Writer::from_path(out)
                .with_context(|| format!("Create {}", out.display()))?;
            wtr.write_record(DateRow::HEADERS)?;
            for r in &rows {
                wtr.write_record([
                    r.date.clone(),
                    r.hoc_credit_count.to_string(),
                    format!("{:.2}", r.hoc_credit_amount),
                    r.hoc_debit_count.to_string(),
                    format!("{:.2}", r.hoc_debit_amount),
                    r.ibd_credit_count.to_string(),
                    format!("{:.2}", r.ibd_credit_amount),
                    r.ibd_debit_count.to_string(),
                    format!("{:.2}", r.ibd_debit_amount),
                ])?;
            }
            wtr.flush()?;
        }
        "json" => {
            std::fs::write(out, serde_json::to_string_pretty(&rows)?)
                .with_context(|| format!("Write {}", out.display()))?;
        }
        other => bail!("Unknown format: {} (use csv|json)", other),
    }
    Ok(())
}
