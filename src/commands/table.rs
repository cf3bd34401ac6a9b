// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config::Settings;
use crate::table::DateRow;
use crate::utils::{fmt_amount, fmt_count, open_session, pretty_table};
use anyhow::Result;

pub fn handle(m: &clap::ArgMatches, settings: &Settings) -> Result<()> {
    let json_flag = m.get_flag("json");
    let jsonl_flag = m.get_flag("jsonl");
    let page: usize = *m.get_one::<usize>("page").unwrap_or(&1);
    let per_page: usize = *m
        .get_one::<usize>("per-page")
        .unwrap_or(&settings.rows_per_page);
    let dash = open_session(m, settings)?;

    let page = dash.table().page(page, per_page);
    if jsonl_flag {
        crate::utils::maybe_print_json(false, true, &page.rows)?;
        return Ok(());
    }
    if crate::utils::maybe_print_json(json_flag, false, &page)? {
        return Ok(());
    }
    if page.total_rows == 0 {
        println!("No dated rows.");
        return Ok(());
    }
    let ccy = settings.display_currency.as_str();
    let rows = page.rows.iter().map(|r| display_row(r, ccy)).collect();
    println!("{}", pretty_table(&DateRow::HEADERS, rows));
    println!(
        "Page {} of {} ({} rows)",
        page.page,
        page.total_pages,
        fmt_count(page.total_rows as u64)
    );
    Ok(())
}

fn display_row(r: &DateRow, ccy: &str) -> Vec<String> {
    vec![
        r.date.clone(),
        fmt_count(r.hoc_credit_count),
        fmt_amount(&r.hoc_credit_amount, ccy),
        fmt_count(r.hoc_debit_count),
        fmt_amount(&r.hoc_debit_amount, ccy),
        fmt_count(r.ibd_credit_count),
        fmt_amount(&r.ibd_credit_amount, ccy),
        fmt_count(r.ibd_debit_count),
        fmt_amount(&r.ibd_debit_amount, ccy),
    ]
}
