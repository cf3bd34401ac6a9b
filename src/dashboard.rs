// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! One dashboard session: file selection, batch processing, removal and
//! reset on top of the ledger and the date table.

use crate::aggregator::{Crosscheck, FileAggregator, Progress, ProgressUpdate};
use crate::chunk::{ChunkProcessor, RowFilter};
use crate::config::Settings;
use crate::error::{DashError, Result};
use crate::ledger::GlobalLedger;
use crate::models::{FileRecord, FileStatus, MetricsRecord, UniqueCounts};
use crate::source::FileOrigin;
use crate::table::DateTable;
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

/// Set while a batch is running. Cloning shares the flag.
#[derive(Debug, Clone, Default)]
pub struct ProcessingGate(Arc<AtomicBool>);

impl ProcessingGate {
    pub fn try_enter(&self) -> Result<GateGuard> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| DashError::Busy)?;
        Ok(GateGuard(Arc::clone(&self.0)))
    }

    pub fn is_busy(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Releases the gate on drop.
#[derive(Debug)]
pub struct GateGuard(Arc<AtomicBool>);

impl Drop for GateGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedFile {
    pub name: String,
    pub row_count: u64,
    pub processed_row_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crosscheck: Option<Crosscheck>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub processed: Vec<ProcessedFile>,
    /// Already merged under the same name and size.
    pub skipped: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoveOutcome {
    pub name: String,
    pub status: FileStatus,
}

/// Maps per-file progress onto the whole batch.
struct BatchProgress<'a> {
    inner: &'a mut dyn Progress,
    offset: u64,
    total: u64,
}

impl Progress for BatchProgress<'_> {
    fn on_window(&mut self, update: ProgressUpdate<'_>) {
        self.inner.on_window(ProgressUpdate {
            file: update.file,
            bytes_done: self.offset + update.bytes_done,
            bytes_total: self.total,
        });
    }
}

#[derive(Debug, Default)]
pub struct Dashboard {
    settings: Settings,
    filter: RowFilter,
    ledger: GlobalLedger,
    table: DateTable,
    // names ever selected; survives reset
    seen_names: HashSet<String>,
    processed_ids: HashSet<String>,
    gate: ProcessingGate,
}

impl Dashboard {
    pub fn new(settings: Settings) -> Self {
        Dashboard {
            settings,
            ..Self::default()
        }
    }

    pub fn with_filter(mut self, filter: RowFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn filter(&self) -> &RowFilter {
        &self.filter
    }

    pub fn processing_gate(&self) -> ProcessingGate {
        self.gate.clone()
    }

    /// Queues a file for the next batch.
    pub fn select_file(&mut self, name: &str, origin: FileOrigin) -> Result<()> {
        if self.gate.is_busy() {
            return Err(DashError::Busy);
        }
        if !name.to_ascii_lowercase().ends_with(".csv") {
            warn!(file = name, "rejected non-csv selection");
            return Err(DashError::NotCsv(name.to_string()));
        }
        if !self.seen_names.insert(name.to_string()) {
            warn!(file = name, "rejected duplicate selection");
            return Err(DashError::DuplicateFile(name.to_string()));
        }
        let record = FileRecord::new(name, origin);
        debug!(file = name, size = record.size, "file selected");
        self.ledger.register(record);
        Ok(())
    }

    /// Selects a file from disk under its file name.
    pub fn select_path(&mut self, path: &Path) -> Result<()> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        if !name.to_ascii_lowercase().ends_with(".csv") {
            return Err(DashError::NotCsv(name));
        }
        let origin = FileOrigin::path(path).map_err(|source| DashError::FileRead {
            file: name.clone(),
            source,
        })?;
        self.select_file(&name, origin)
    }

    /// Processes every unprocessed file in selection order.
    ///
    /// An I/O failure puts the failing file back to unprocessed and stops the
    /// batch; files committed before it stay committed. A failed file leaves
    /// no trace in the totals or the date table.
    pub fn process_files(&mut self, progress: &mut dyn Progress) -> Result<BatchReport> {
        let _guard = self.gate.try_enter()?;

        let pending: Vec<(String, u64)> = self
            .ledger
            .files()
            .iter()
            .filter(|f| f.status == FileStatus::Unprocessed)
            .map(|f| (f.name.clone(), f.size))
            .collect();
        let batch_total: u64 = pending.iter().map(|(_, size)| size).sum();
        info!(files = pending.len(), bytes = batch_total, "batch started");

        let processor = ChunkProcessor::new()
            .with_filter(self.filter.clone())
            .with_sample_limit(self.settings.sample_rows);
        let aggregator = FileAggregator::new(processor).with_crosscheck(self.settings.crosscheck);

        let mut report = BatchReport::default();
        let mut offset = 0u64;
        for (name, size) in pending {
            let Some(record) = self.ledger.file_mut(&name) else {
                continue;
            };
            let id = record.file_id();
            if self.processed_ids.contains(&id) {
                debug!(file = %name, "already merged, skipping");
                report.skipped.push(name);
                offset += size;
                continue;
            }
            record.status = FileStatus::Processing;
            let origin = record.origin.clone();

            let mut batch = BatchProgress {
                inner: &mut *progress,
                offset,
                total: batch_total,
            };
            let result = origin
                .open(self.settings.chunk_size)
                .and_then(|mut src| aggregator.run(&name, src.as_mut(), size, &mut batch));

            let outcome = match result {
                Ok(outcome) => outcome,
                Err(source) => {
                    if let Some(record) = self.ledger.file_mut(&name) {
                        record.status = FileStatus::Unprocessed;
                    }
                    warn!(file = %name, error = %source, "file failed, batch halted");
                    return Err(DashError::FileRead { file: name, source });
                }
            };

            self.ledger.merge_file(&outcome.metrics, &outcome.serials);
            self.table.merge(&outcome.date_buckets);
            self.processed_ids.insert(id);
            let record = self
                .ledger
                .file_mut(&name)
                .ok_or_else(|| DashError::UnknownFile(name.clone()))?;
            record.status = FileStatus::Processed;
            record.row_count = outcome.row_count;
            record.processed_row_count = outcome.processed_row_count;
            record.metrics = outcome.metrics;
            record.serials = outcome.serials;
            record.sample_rows = outcome.samples;
            info!(
                file = %name,
                rows = outcome.row_count,
                valid = outcome.processed_row_count,
                windows = outcome.windows,
                "file committed"
            );

            report.processed.push(ProcessedFile {
                name,
                row_count: outcome.row_count,
                processed_row_count: outcome.processed_row_count,
                crosscheck: outcome.crosscheck,
            });
            offset += size;
        }
        Ok(report)
    }

    /// First removal of a file takes its contribution out of the totals but
    /// leaves its metrics, serials and samples on the record; removing it
    /// again deletes the record.
    pub fn remove_file(&mut self, name: &str) -> Result<RemoveOutcome> {
        if self.gate.is_busy() {
            return Err(DashError::Busy);
        }
        let record = self
            .ledger
            .file_mut(name)
            .ok_or_else(|| DashError::UnknownFile(name.to_string()))?;

        let status = match record.status {
            FileStatus::Removed | FileStatus::Deleted => {
                self.ledger.delete(name);
                info!(file = name, "file deleted");
                FileStatus::Deleted
            }
            FileStatus::Processing => return Err(DashError::Busy),
            FileStatus::Unprocessed => {
                record.status = FileStatus::Removed;
                info!(file = name, "unprocessed file removed");
                FileStatus::Removed
            }
            FileStatus::Processed => {
                // the record keeps its data until it is deleted
                record.status = FileStatus::Removed;
                let metrics = record.metrics.clone();
                let serials = record.serials.clone();

                self.ledger.unmerge_file(&metrics);
                self.ledger.remove_serials(&serials);
                if self.ledger.active_files().next().is_none() {
                    self.clear_data();
                } else {
                    // the serial difference above can drop serials another
                    // file still holds; rebuild from the per-file sets
                    self.ledger.full_recompute();
                }
                info!(
                    file = name,
                    remaining = self.ledger.active_files().count(),
                    "file removed"
                );
                FileStatus::Removed
            }
        };
        Ok(RemoveOutcome {
            name: name.to_string(),
            status,
        })
    }

    /// Drops every aggregate but keeps the file list.
    fn clear_data(&mut self) {
        self.ledger.clear_totals();
        self.table.reset();
        self.processed_ids.clear();
        debug!("no active files left, dashboard cleared");
    }

    /// Starts over with no files. Names already used stay rejected.
    pub fn reset(&mut self) -> Result<()> {
        if self.gate.is_busy() {
            return Err(DashError::Busy);
        }
        self.ledger.reset();
        self.table.reset();
        self.processed_ids.clear();
        info!("dashboard reset");
        Ok(())
    }

    pub fn summary(&self) -> MetricsRecord {
        self.ledger.summary()
    }

    pub fn metrics(&self) -> &MetricsRecord {
        self.ledger.metrics()
    }

    pub fn unique_counts(&self) -> UniqueCounts {
        self.ledger.unique_counts()
    }

    pub fn ledger(&self) -> &GlobalLedger {
        &self.ledger
    }

    pub fn table(&self) -> &DateTable {
        &self.table
    }

    pub fn files(&self) -> &[FileRecord] {
        self.ledger.files()
    }

    pub fn file(&self, name: &str) -> Option<&FileRecord> {
        self.ledger.file(name)
    }

    pub fn processed_count(&self) -> usize {
        self.ledger.active_files().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::NoProgress;

    const CSV: &str = "REPORTTYPE,TRANSACTION_AMOUNT,TRANSACTION_CURRENCY,ACCOUNT_HOLDER_ACCOUNT_ROLE,TRANSACTION_DATE,SERIAL_NO\nHOC,10,USD,C,05-JAN-23,S1\n";

    #[test]
    fn merged_id_is_not_merged_twice() {
        let mut dash = Dashboard::new(Settings::default());
        dash.select_file("a.csv", FileOrigin::memory(CSV)).unwrap();
        dash.process_files(&mut NoProgress).unwrap();

        // force the record back into the queue under the same id
        dash.ledger.file_mut("a.csv").unwrap().status = FileStatus::Unprocessed;
        let report = dash.process_files(&mut NoProgress).unwrap();
        assert_eq!(report.skipped, vec!["a.csv".to_string()]);
        assert!(report.processed.is_empty());
        assert_eq!(dash.metrics().total_transactions, 1);
    }

    #[test]
    fn gate_is_released_after_batch() {
        let mut dash = Dashboard::new(Settings::default());
        dash.select_file("a.csv", FileOrigin::memory(CSV)).unwrap();
        dash.process_files(&mut NoProgress).unwrap();
        assert!(!dash.processing_gate().is_busy());
    }
}
