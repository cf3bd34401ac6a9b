// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config::Settings;
use crate::utils::{fmt_amount, fmt_count, open_session, pretty_table};
use anyhow::Result;

pub fn handle(m: &clap::ArgMatches, settings: &Settings) -> Result<()> {
    let json_flag = m.get_flag("json");
    let jsonl_flag = m.get_flag("jsonl");
    let with_samples = m.get_flag("samples");
    let dash = open_session(m, settings)?;

    if crate::utils::maybe_print_json(json_flag, jsonl_flag, &dash.files())? {
        return Ok(());
    }
    let ccy = settings.display_currency.as_str();
    let data = dash
        .files()
        .iter()
        .map(|f| {
            vec![
                f.name.clone(),
                fmt_count(f.size),
                f.status.to_string(),
                fmt_count(f.row_count),
                fmt_count(f.processed_row_count),
                fmt_amount(&f.metrics.total_amount, ccy),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["File", "Bytes", "Status", "Rows", "Valid", "Amount"], data)
    );

    if with_samples {
        for f in dash.files().iter().filter(|f| !f.sample_rows.is_empty()) {
            println!("{}", f.name);
            let rows = f
                .sample_rows
                .iter()
                .map(|r| {
                    vec![
                        r.report_type.to_string(),
                        fmt_amount(&r.amount, ""),
                        r.currency.to_string(),
                        r.account_role.to_string(),
                        r.transaction_date.clone(),
                        r.serial_number.clone(),
                    ]
                })
                .collect();
            println!(
                "{}",
                pretty_table(&["Type", "Amount", "CCY", "Role", "Date", "Serial"], rows)
            );
        }
    }
    Ok(())
}
