// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::{DashError, Result};
use crate::source::DEFAULT_WINDOW_SIZE;
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

static APP: Lazy<(&str, &str, &str)> = Lazy::new(|| ("com.alphavelocity", "Txdash", "txdash"));

pub const DEFAULT_SAMPLE_ROWS: usize = 10;
pub const DEFAULT_ROWS_PER_PAGE: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Bytes per window handed to the aggregator.
    pub chunk_size: usize,
    pub sample_rows: usize,
    pub rows_per_page: usize,
    pub crosscheck: bool,
    /// Suffix printed after formatted amounts.
    pub display_currency: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            chunk_size: DEFAULT_WINDOW_SIZE,
            sample_rows: DEFAULT_SAMPLE_ROWS,
            rows_per_page: DEFAULT_ROWS_PER_PAGE,
            crosscheck: false,
            display_currency: "MMK".to_string(),
        }
    }
}

pub fn config_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)?;
    Some(proj.config_dir().join("settings.json"))
}

impl Settings {
    /// Reads `settings.json` from the platform config dir. Falls back to the
    /// defaults when there is no config dir or no file.
    pub fn load() -> Result<Self> {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no settings file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };
        let settings: Settings = serde_json::from_str(&raw)?;
        settings.validate()?;
        debug!(path = %path.display(), "settings loaded");
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(DashError::Config("chunk_size must be greater than zero".into()));
        }
        if self.rows_per_page == 0 {
            return Err(DashError::Config("rows_per_page must be greater than zero".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let s = Settings::load_from(&dir.path().join("settings.json")).unwrap();
        assert_eq!(s, Settings::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, r#"{{"chunk_size": 4096, "display_currency": "USD"}}"#).unwrap();
        let s = Settings::load_from(f.path()).unwrap();
        assert_eq!(s.chunk_size, 4096);
        assert_eq!(s.display_currency, "USD");
        assert_eq!(s.rows_per_page, DEFAULT_ROWS_PER_PAGE);
    }

    #[test]
    fn zero_chunk_size_rejected() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, r#"{{"chunk_size": 0}}"#).unwrap();
        let err = Settings::load_from(f.path()).unwrap_err();
        assert!(matches!(err, DashError::Config(_)));
    }
}
