// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use txdash::{cli, commands, config::Settings};

fn main() -> Result<()> {
    let cli = cli::build_cli();
    let matches = cli.get_matches();

    // RUST_LOG wins over --verbose; default stays quiet
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if matches.get_flag("verbose") {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr).compact())
        .init();

    let settings = Settings::load().context("Failed to load settings")?;

    match matches.subcommand() {
        Some(("summary", sub)) => commands::summary::handle(sub, &settings)?,
        Some(("table", sub)) => commands::table::handle(sub, &settings)?,
        Some(("files", sub)) => commands::files::handle(sub, &settings)?,
        Some(("export", sub)) => commands::exporter::handle(sub, &settings)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
