// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod aggregator;
pub mod chunk;
pub mod cli;
pub mod commands;
pub mod config;
pub mod dashboard;
pub mod dates;
pub mod error;
pub mod ledger;
pub mod metrics;
pub mod models;
pub mod parser;
pub mod source;
pub mod table;
pub mod utils;

pub use dashboard::Dashboard;
pub use error::{DashError, Result};
