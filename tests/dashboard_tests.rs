// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rust_decimal::Decimal;
use std::fs;
use tempfile::tempdir;
use txdash::aggregator::NoProgress;
use txdash::config::Settings;
use txdash::models::{FileStatus, MetricsRecord};
use txdash::source::FileOrigin;
use txdash::{DashError, Dashboard};

const HEADER: &str = "REPORTTYPE,TRANSACTION_AMOUNT,TRANSACTION_CURRENCY,ACCOUNT_HOLDER_ACCOUNT_ROLE,TRANSACTION_DATE,SERIAL_NO";

fn csv(rows: &[&str]) -> FileOrigin {
    let mut s = String::from(HEADER);
    for r in rows {
        s.push('\n');
        s.push_str(r);
    }
    FileOrigin::memory(s)
}

fn small_windows() -> Settings {
    Settings {
        chunk_size: 16,
        ..Settings::default()
    }
}

fn file_a() -> FileOrigin {
    csv(&["HOC,100,USD,C,05-JAN-23,S1", "IBD,20,MMK,D,05-JAN-23,S2"])
}

fn file_b() -> FileOrigin {
    csv(&["HOC,40,USD,D,06-JAN-23,S1", "WU,0,MMK,C,06-JAN-23,S3"])
}

fn file_c() -> FileOrigin {
    csv(&["IBD,5,USD,C,07-JAN-23,S2", "HOC,1,MMK,C,07-JAN-23,S4"])
}

fn processed(files: &[(&str, FileOrigin)]) -> Dashboard {
    let mut dash = Dashboard::new(small_windows());
    for (name, origin) in files {
        dash.select_file(name, origin.clone()).unwrap();
    }
    dash.process_files(&mut NoProgress).unwrap();
    dash
}

#[test]
fn batch_commits_every_file() {
    let dash = processed(&[("a.csv", file_a()), ("b.csv", file_b())]);
    assert_eq!(dash.processed_count(), 2);
    let m = dash.metrics();
    assert_eq!(m.total_transactions, 4);
    assert_eq!(m.total_amount, Decimal::from(160));
    // S1 appears in both files
    assert_eq!(m.hoc_unique_serial_count, 1);
    assert_eq!(m.total_unique_serial_count, 3);
    for f in dash.files() {
        assert_eq!(f.status, FileStatus::Processed);
        assert_eq!(f.row_count, 2);
    }
}

#[test]
fn duplicate_and_non_csv_names_rejected() {
    let mut dash = Dashboard::new(Settings::default());
    dash.select_file("a.csv", file_a()).unwrap();
    let err = dash.select_file("a.csv", file_b()).unwrap_err();
    assert!(matches!(err, DashError::DuplicateFile(ref n) if n == "a.csv"));
    assert!(err.to_string().contains("already been uploaded"));

    let err = dash.select_file("notes.txt", file_b()).unwrap_err();
    assert!(matches!(err, DashError::NotCsv(_)));
    dash.select_file("UPPER.CSV", file_b()).unwrap();
    assert_eq!(dash.files().len(), 2);
}

#[test]
fn removal_matches_fresh_session_without_the_file() {
    let mut dash = processed(&[("a.csv", file_a()), ("b.csv", file_b()), ("c.csv", file_c())]);
    let outcome = dash.remove_file("a.csv").unwrap();
    assert_eq!(outcome.status, FileStatus::Removed);

    let fresh = processed(&[("b.csv", file_b()), ("c.csv", file_c())]);
    assert_eq!(dash.metrics(), fresh.metrics());
    // S1 and S2 are still held by b and c
    assert_eq!(dash.unique_counts().total, 4);
    assert_eq!(dash.processed_count(), 2);
}

#[test]
fn removed_record_keeps_its_data() {
    let mut dash = processed(&[("a.csv", file_a()), ("b.csv", file_b())]);
    dash.remove_file("a.csv").unwrap();

    let a = dash.file("a.csv").unwrap();
    assert_eq!(a.status, FileStatus::Removed);
    assert_eq!(a.metrics.total_transactions, 2);
    assert_eq!(a.metrics.total_amount, Decimal::from(120));
    assert_eq!(a.row_count, 2);
    assert_eq!(a.processed_row_count, 2);
    assert!(a.serials.hoc.contains("S1"));
    assert!(a.serials.ibd.contains("S2"));
    assert_eq!(a.sample_rows.len(), 2);

    // the kept data no longer feeds the totals
    let fresh = processed(&[("b.csv", file_b())]);
    assert_eq!(dash.metrics(), fresh.metrics());
    assert_eq!(dash.processed_count(), 1);
}

#[test]
fn second_removal_deletes_record() {
    let mut dash = processed(&[("a.csv", file_a()), ("b.csv", file_b())]);
    assert_eq!(dash.remove_file("b.csv").unwrap().status, FileStatus::Removed);
    assert_eq!(dash.file("b.csv").unwrap().status, FileStatus::Removed);
    assert_eq!(dash.remove_file("b.csv").unwrap().status, FileStatus::Deleted);
    assert!(dash.file("b.csv").is_none());

    let err = dash.remove_file("b.csv").unwrap_err();
    assert!(matches!(err, DashError::UnknownFile(_)));
    // the name stays taken for the rest of the session
    assert!(matches!(
        dash.select_file("b.csv", file_b()),
        Err(DashError::DuplicateFile(_))
    ));
}

#[test]
fn removing_last_active_file_clears_dashboard() {
    let mut dash = processed(&[("a.csv", file_a())]);
    assert!(!dash.table().is_empty());
    dash.remove_file("a.csv").unwrap();
    assert_eq!(dash.metrics(), &MetricsRecord::default());
    assert!(dash.table().is_empty());
    assert_eq!(dash.files().len(), 1);
}

#[test]
fn unprocessed_file_can_be_removed() {
    let mut dash = Dashboard::new(Settings::default());
    dash.select_file("a.csv", file_a()).unwrap();
    assert_eq!(dash.remove_file("a.csv").unwrap().status, FileStatus::Removed);
    let report = dash.process_files(&mut NoProgress).unwrap();
    assert!(report.processed.is_empty());
    assert_eq!(dash.metrics().total_transactions, 0);
}

#[test]
fn second_batch_only_processes_new_files() {
    let mut dash = processed(&[("a.csv", file_a())]);
    dash.select_file("b.csv", file_b()).unwrap();
    let report = dash.process_files(&mut NoProgress).unwrap();
    assert_eq!(report.processed.len(), 1);
    assert_eq!(report.processed[0].name, "b.csv");
    assert_eq!(dash.metrics().total_transactions, 4);
}

#[test]
fn busy_gate_blocks_processing_and_removal() {
    let mut dash = processed(&[("a.csv", file_a())]);
    dash.select_file("b.csv", file_b()).unwrap();

    let gate = dash.processing_gate();
    let guard = gate.try_enter().unwrap();
    assert!(matches!(dash.process_files(&mut NoProgress), Err(DashError::Busy)));
    assert!(matches!(dash.remove_file("a.csv"), Err(DashError::Busy)));
    assert!(matches!(dash.select_file("c.csv", file_c()), Err(DashError::Busy)));
    assert!(matches!(gate.try_enter(), Err(DashError::Busy)));
    drop(guard);

    dash.process_files(&mut NoProgress).unwrap();
    assert_eq!(dash.processed_count(), 2);
}

#[test]
fn io_failure_halts_batch_and_requeues_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("gone.csv");
    fs::write(&path, format!("{}\nHOC,1,USD,C,05-JAN-23,S9\n", HEADER)).unwrap();

    let mut dash = Dashboard::new(Settings::default());
    dash.select_file("a.csv", file_a()).unwrap();
    dash.select_path(&path).unwrap();
    dash.select_file("c.csv", file_c()).unwrap();
    fs::remove_file(&path).unwrap();

    let err = dash.process_files(&mut NoProgress).unwrap_err();
    assert!(matches!(err, DashError::FileRead { ref file, .. } if file == "gone.csv"));
    assert_eq!(dash.file("a.csv").unwrap().status, FileStatus::Processed);
    assert_eq!(dash.file("gone.csv").unwrap().status, FileStatus::Unprocessed);
    assert_eq!(dash.file("c.csv").unwrap().status, FileStatus::Unprocessed);
    assert_eq!(dash.metrics().total_transactions, 2);
    assert!(!dash.processing_gate().is_busy());
}

#[test]
fn retried_file_counts_its_rows_once() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("late.csv");
    let content = format!(
        "{}\nHOC,7,USD,C,05-JAN-23,S7\nIBD,3,MMK,D,08-JAN-23,S8\n",
        HEADER
    );
    fs::write(&path, &content).unwrap();

    let mut dash = Dashboard::new(small_windows());
    dash.select_file("a.csv", file_a()).unwrap();
    dash.select_path(&path).unwrap();
    fs::remove_file(&path).unwrap();
    assert!(dash.process_files(&mut NoProgress).is_err());
    let only_a = processed(&[("a.csv", file_a())]);
    assert_eq!(dash.table().rows(), only_a.table().rows());

    fs::write(&path, &content).unwrap();
    let report = dash.process_files(&mut NoProgress).unwrap();
    assert_eq!(report.processed.len(), 1);
    assert_eq!(report.processed[0].name, "late.csv");

    let clean = processed(&[
        ("a.csv", file_a()),
        ("late.csv", FileOrigin::memory(content.clone())),
    ]);
    assert_eq!(dash.table().rows(), clean.table().rows());
    assert_eq!(dash.metrics(), clean.metrics());
}

#[test]
fn reset_keeps_names_taken() {
    let mut dash = processed(&[("a.csv", file_a())]);
    dash.reset().unwrap();
    assert!(dash.files().is_empty());
    assert_eq!(dash.metrics(), &MetricsRecord::default());
    assert!(dash.table().is_empty());
    assert!(matches!(
        dash.select_file("a.csv", file_a()),
        Err(DashError::DuplicateFile(_))
    ));
}

#[test]
fn filter_applies_to_metrics_and_table() {
    let mut dash = Dashboard::new(small_windows()).with_filter(txdash::chunk::RowFilter {
        currency: Some("MMK".into()),
        report_type: None,
    });
    dash.select_file("a.csv", file_a()).unwrap();
    dash.process_files(&mut NoProgress).unwrap();
    assert_eq!(dash.metrics().total_transactions, 1);
    assert_eq!(dash.metrics().hoc.total.count, 0);
    let row = &dash.table().rows()[0];
    assert_eq!(row.hoc_credit_count, 0);
    assert_eq!(row.ibd_debit_count, 1);
}
