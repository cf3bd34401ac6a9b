// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rust_decimal::Decimal;
use tempfile::tempdir;
use txdash::config::Settings;
use txdash::models::FileStatus;
use txdash::{cli, commands::summary, utils};

const HEADER: &str = "REPORTTYPE,TRANSACTION_AMOUNT,TRANSACTION_CURRENCY,ACCOUNT_HOLDER_ACCOUNT_ROLE,TRANSACTION_DATE,SERIAL_NO";

fn write(dir: &std::path::Path, name: &str, rows: &[&str]) -> String {
    let path = dir.join(name);
    let mut body = String::from(HEADER);
    for r in rows {
        body.push('\n');
        body.push_str(r);
    }
    body.push('\n');
    std::fs::write(&path, body).unwrap();
    path.to_string_lossy().to_string()
}

fn session(args: &[&str]) -> txdash::Dashboard {
    let mut argv = vec!["txdash", "summary"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(argv);
    let (_, sub) = matches.subcommand().unwrap();
    utils::open_session(sub, &Settings::default()).unwrap()
}

#[test]
fn summary_session_applies_remove_and_skips_rejects() {
    let dir = tempdir().unwrap();
    let a = write(dir.path(), "a.csv", &["HOC,100,USD,C,05-JAN-23,S1"]);
    let b = write(dir.path(), "b.csv", &["IBD,50,MMK,D,06-JAN-23,S2"]);
    let txt = write(dir.path(), "notes.txt", &[]);

    let dash = session(&[&a, &b, &txt, &a, "--remove", "b.csv", "--chunk-size", "5"]);
    assert_eq!(dash.files().len(), 2);
    assert_eq!(dash.file("b.csv").unwrap().status, FileStatus::Removed);
    assert_eq!(dash.metrics().total_transactions, 1);
    assert_eq!(dash.metrics().total_amount, Decimal::from(100));
}

#[test]
fn summary_session_filters_by_report_type() {
    let dir = tempdir().unwrap();
    let a = write(
        dir.path(),
        "a.csv",
        &["HOC,100,USD,C,05-JAN-23,S1", "WU,3,MMK,C,05-JAN-23,S2"],
    );
    let dash = session(&[&a, "--report-type", "ibd", "--crosscheck"]);
    assert_eq!(dash.metrics().total_transactions, 1);
    assert_eq!(dash.metrics().ibd_unique_serial_count, 1);
    assert!(dash.settings().crosscheck);
}

#[test]
fn zero_chunk_size_is_rejected() {
    let dir = tempdir().unwrap();
    let a = write(dir.path(), "a.csv", &["HOC,1,USD,C,05-JAN-23,S1"]);
    let matches = cli::build_cli().get_matches_from(["txdash", "summary", &a, "--chunk-size", "0"]);
    let (_, sub) = matches.subcommand().unwrap();
    assert!(utils::open_session(sub, &Settings::default()).is_err());
}

#[test]
fn summary_rows_format_amounts() {
    let dir = tempdir().unwrap();
    let a = write(dir.path(), "a.csv", &["HOC,1234.5,USD,C,05-JAN-23,S1"]);
    let dash = session(&[&a]);
    let rows = summary::summary_rows(dash.processed_count(), dash.metrics(), "MMK");
    assert_eq!(rows[0], vec!["Files processed".to_string(), "1".to_string()]);
    assert_eq!(rows[2][1], "1,234.50 MMK");
    assert_eq!(rows[15][1], "1");
    assert_eq!(rows[16][1], "1,234.50 USD");
}
