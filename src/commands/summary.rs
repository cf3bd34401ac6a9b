// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config::Settings;
use crate::models::MetricsRecord;
use crate::utils::{fmt_amount, fmt_count, open_session, pretty_table};
use anyhow::Result;
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SummaryView<'a> {
    files_processed: usize,
    #[serde(flatten)]
    metrics: &'a MetricsRecord,
}

pub fn handle(m: &clap::ArgMatches, settings: &Settings) -> Result<()> {
    let json_flag = m.get_flag("json");
    let jsonl_flag = m.get_flag("jsonl");
    let dash = open_session(m, settings)?;

    let view = SummaryView {
        files_processed: dash.processed_count(),
        metrics: dash.metrics(),
    };
    if !crate::utils::maybe_print_json(json_flag, jsonl_flag, &view)? {
        let rows = summary_rows(view.files_processed, view.metrics, &settings.display_currency);
        println!("{}", pretty_table(&["Metric", "Value"], rows));
    }
    Ok(())
}

pub fn summary_rows(files: usize, m: &MetricsRecord, ccy: &str) -> Vec<Vec<String>> {
    let amt = |d: &Decimal| fmt_amount(d, ccy);
    let row = |k: &str, v: String| vec![k.to_string(), v];
    vec![
        row("Files processed", fmt_count(files as u64)),
        row("Total transactions", fmt_count(m.total_transactions)),
        row("Total amount", amt(&m.total_amount)),
        row("HOC transactions", fmt_count(m.hoc.total.count)),
        row("HOC amount", amt(&m.hoc.total.amount)),
        row("HOC credit", fmt_count(m.hoc.split.credit.count)),
        row("HOC credit amount", amt(&m.hoc.split.credit.amount)),
        row("HOC debit", fmt_count(m.hoc.split.debit.count)),
        row("HOC debit amount", amt(&m.hoc.split.debit.amount)),
        row("IBD transactions", fmt_count(m.ibd.total.count)),
        row("IBD amount", amt(&m.ibd.total.amount)),
        row("IBD credit", fmt_count(m.ibd.split.credit.count)),
        row("IBD credit amount", amt(&m.ibd.split.credit.amount)),
        row("IBD debit", fmt_count(m.ibd.split.debit.count)),
        row("IBD debit amount", amt(&m.ibd.split.debit.amount)),
        row("USD transactions", fmt_count(m.currencies.usd.count)),
        row("USD amount", fmt_amount(&m.currencies.usd.amount, "USD")),
        row("MMK transactions", fmt_count(m.currencies.mmk.count)),
        row("MMK amount", fmt_amount(&m.currencies.mmk.amount, "MMK")),
        row("HOC unique serials", fmt_count(m.hoc_unique_serial_count as u64)),
        row("IBD unique serials", fmt_count(m.ibd_unique_serial_count as u64)),
        row("Total unique serials", fmt_count(m.total_unique_serial_count as u64)),
    ]
}
