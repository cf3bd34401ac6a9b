// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, crate_version, value_parser};

/// Arguments every session command takes: the input files and the knobs
/// that shape how they are aggregated.
fn session_args() -> Vec<Arg> {
    vec![
        Arg::new("files")
            .value_name("FILES")
            .help("CSV files to load, in processing order")
            .num_args(1..)
            .required(true),
        Arg::new("remove")
            .long("remove")
            .value_name("NAME")
            .help("Remove a file by name after processing; a second removal deletes it")
            .action(ArgAction::Append),
        Arg::new("currency")
            .long("currency")
            .value_name("CCY")
            .help("Only aggregate rows in this currency (e.g. USD, MMK)"),
        Arg::new("report-type")
            .long("report-type")
            .value_name("TYPE")
            .help("Only aggregate rows of this report type; IBD includes WU"),
        Arg::new("chunk-size")
            .long("chunk-size")
            .value_name("BYTES")
            .help("Window size used when reading files")
            .value_parser(value_parser!(usize)),
        Arg::new("crosscheck")
            .long("crosscheck")
            .help("Recompute every file on a worker thread and compare")
            .action(ArgAction::SetTrue),
        Arg::new("json")
            .long("json")
            .help("Print as pretty JSON")
            .action(ArgAction::SetTrue)
            .conflicts_with("jsonl"),
        Arg::new("jsonl")
            .long("jsonl")
            .help("Print as JSON lines")
            .action(ArgAction::SetTrue),
    ]
}

pub fn build_cli() -> Command {
    Command::new("txdash")
        .version(crate_version!())
        .about("Chunked CSV transaction metrics: HOC/IBD totals, unique serials and date tables")
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable debug logging")
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .subcommand(
            Command::new("summary")
                .about("Show summary metrics across all loaded files")
                .args(session_args()),
        )
        .subcommand(
            Command::new("table")
                .about("Show the per-date credit/debit table")
                .args(session_args())
                .arg(
                    Arg::new("page")
                        .long("page")
                        .value_name("N")
                        .default_value("1")
                        .value_parser(value_parser!(usize)),
                )
                .arg(
                    Arg::new("per-page")
                        .long("per-page")
                        .value_name("N")
                        .help("Rows per page (defaults to the configured value)")
                        .value_parser(value_parser!(usize)),
                ),
        )
        .subcommand(
            Command::new("files")
                .about("List loaded files with status and row counts")
                .args(session_args())
                .arg(
                    Arg::new("samples")
                        .long("samples")
                        .help("Also print the cached sample rows of each file")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("export")
                .about("Export the date table")
                .args(session_args())
                .arg(
                    Arg::new("format")
                        .long("format")
                        .value_name("FORMAT")
                        .help("csv|json")
                        .default_value("csv"),
                )
                .arg(
                    Arg::new("out")
                        .long("out")
                        .value_name("PATH")
                        .required(true),
                ),
        )
}
