// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Library error type. Row-level problems never surface here: malformed
//! rows are skipped and bad values fall back to defaults.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(
        "File '{0}' has already been uploaded in this session. Start a new session to upload it again."
    )]
    DuplicateFile(String),

    #[error("'{0}' is not a CSV file")]
    NotCsv(String),

    #[error("processing in progress")]
    Busy,

    #[error("Unknown file '{0}'")]
    UnknownFile(String),

    #[error("Failed to process '{file}': {source}")]
    FileRead {
        file: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, DashError>;
