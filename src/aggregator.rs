// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Per-file aggregation over a stream of byte windows.
//!
//! Window boundaries fall anywhere, including inside a line or inside a
//! multi-byte character. [`WindowAssembler`] carries the unfinished tail of
//! each window over to the next one as raw bytes and only decodes complete
//! lines, so the split points never show up in the parsed rows.

use crate::chunk::{ChunkProcessor, ChunkResult, Header};
use crate::metrics::merge_date_buckets;
use crate::models::{DateBuckets, MetricsRecord, TransactionRow, UniqueSerialSets};
use crate::source::ChunkSource;
use serde::Serialize;
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use tracing::{debug, warn};

/// A run of complete lines ready for the chunk processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub text: String,
    /// The first line of `text` is the file header.
    pub header_line: bool,
}

/// Splices windows into blocks of complete lines.
#[derive(Debug, Default)]
pub struct WindowAssembler {
    carry: Vec<u8>,
    header: Option<Header>,
}

impl WindowAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(&self) -> Option<&Header> {
        self.header.as_ref()
    }

    /// Bytes held back waiting for the rest of their line.
    pub fn carry(&self) -> &[u8] {
        &self.carry
    }

    /// Appends a window. Unless it is the last one, the trailing partial line
    /// stays behind as carry. Returns `None` when no complete line is
    /// available yet.
    pub fn push(&mut self, window: &[u8], is_last: bool) -> Option<Block> {
        self.carry.extend_from_slice(window);
        if is_last {
            return self.finish();
        }
        let cut = self.carry.iter().rposition(|&b| b == b'\n')?;
        let rest = self.carry.split_off(cut + 1);
        let complete = std::mem::replace(&mut self.carry, rest);
        self.block(complete)
    }

    /// Flushes whatever is still carried as a final block.
    pub fn finish(&mut self) -> Option<Block> {
        let complete = std::mem::take(&mut self.carry);
        self.block(complete)
    }

    fn block(&mut self, bytes: Vec<u8>) -> Option<Block> {
        if bytes.is_empty() {
            return None;
        }
        let text = String::from_utf8_lossy(&bytes).into_owned();
        let header_line = self.header.is_none();
        if header_line {
            let first = text.split('\n').next().unwrap_or_default();
            self.header = Some(Header::parse(first));
        }
        Some(Block { text, header_line })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressUpdate<'a> {
    pub file: &'a str,
    pub bytes_done: u64,
    pub bytes_total: u64,
}

impl ProgressUpdate<'_> {
    pub fn percent(&self) -> f64 {
        if self.bytes_total == 0 {
            return 100.0;
        }
        self.bytes_done as f64 * 100.0 / self.bytes_total as f64
    }
}

/// Notified once per window.
pub trait Progress {
    fn on_window(&mut self, update: ProgressUpdate<'_>);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn on_window(&mut self, _update: ProgressUpdate<'_>) {}
}

/// Result of the independent recomputation, when one was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Crosscheck {
    Matched,
    Mismatched,
    /// The worker died before reporting.
    Unavailable,
}

/// Everything a completed pass over one file produced.
#[derive(Debug, Clone, Default)]
pub struct FileOutcome {
    pub metrics: MetricsRecord,
    pub serials: UniqueSerialSets,
    /// Held back from the date table until the file commits.
    pub date_buckets: DateBuckets,
    pub row_count: u64,
    pub processed_row_count: u64,
    pub samples: Vec<TransactionRow>,
    pub windows: usize,
    pub crosscheck: Option<Crosscheck>,
}

impl FileOutcome {
    fn absorb(&mut self, chunk: ChunkResult, sample_limit: usize) {
        self.metrics.merge(&chunk.metrics);
        self.serials.union_with(&chunk.serials);
        merge_date_buckets(&mut self.date_buckets, &chunk.date_buckets);
        self.row_count += chunk.line_count;
        self.processed_row_count += chunk.valid_row_count;
        let room = sample_limit.saturating_sub(self.samples.len());
        self.samples.extend(chunk.samples.into_iter().take(room));
    }
}

struct CrosscheckJob {
    text: String,
    header: Header,
    header_line: bool,
}

/// Drives a [`ChunkSource`] through the chunk processor and accumulates the
/// file-level result.
#[derive(Debug, Clone, Default)]
pub struct FileAggregator {
    processor: ChunkProcessor,
    crosscheck: bool,
}

impl FileAggregator {
    pub fn new(processor: ChunkProcessor) -> Self {
        FileAggregator {
            processor,
            crosscheck: false,
        }
    }

    /// Also recompute every file on a worker thread and compare the results.
    pub fn with_crosscheck(mut self, enabled: bool) -> Self {
        self.crosscheck = enabled;
        self
    }

    /// Reads `source` to the end and returns the file's aggregates, date
    /// buckets included, for the caller to commit. Nothing is committed on
    /// an I/O error.
    pub fn run(
        &self,
        name: &str,
        source: &mut dyn ChunkSource,
        bytes_total: u64,
        progress: &mut dyn Progress,
    ) -> io::Result<FileOutcome> {
        if !self.crosscheck {
            let mut outcome = self.drive(name, source, bytes_total, progress, None)?;
            outcome.metrics.set_unique_counts(outcome.serials.counts());
            return Ok(outcome);
        }

        thread::scope(|s| -> io::Result<FileOutcome> {
            let (tx, rx) = mpsc::channel();
            let processor = self.processor.clone();
            let worker = s.spawn(move || recompute(&processor, rx));

            let mut outcome = self.drive(name, source, bytes_total, progress, Some(tx))?;
            outcome.metrics.set_unique_counts(outcome.serials.counts());

            let verdict = match worker.join() {
                Ok(expected) if expected == outcome.metrics => Crosscheck::Matched,
                Ok(expected) => {
                    warn!(
                        file = name,
                        expected = expected.total_transactions,
                        actual = outcome.metrics.total_transactions,
                        "crosscheck mismatch"
                    );
                    Crosscheck::Mismatched
                }
                Err(_) => {
                    warn!(file = name, "crosscheck worker panicked");
                    Crosscheck::Unavailable
                }
            };
            outcome.crosscheck = Some(verdict);
            Ok(outcome)
        })
    }

    fn drive(
        &self,
        name: &str,
        source: &mut dyn ChunkSource,
        bytes_total: u64,
        progress: &mut dyn Progress,
        crosscheck: Option<Sender<CrosscheckJob>>,
    ) -> io::Result<FileOutcome> {
        let mut assembler = WindowAssembler::new();
        let mut outcome = FileOutcome::default();
        let mut bytes_done = 0u64;

        while let Some(window) = source.next_window()? {
            bytes_done += window.bytes.len() as u64;
            outcome.windows += 1;
            if let Some(block) = assembler.push(&window.bytes, window.is_last) {
                self.absorb(name, block, &assembler, &mut outcome, crosscheck.as_ref());
            }
            progress.on_window(ProgressUpdate {
                file: name,
                bytes_done,
                bytes_total,
            });
        }
        // a source that never flagged its last window still owes the carry
        if let Some(block) = assembler.finish() {
            self.absorb(name, block, &assembler, &mut outcome, crosscheck.as_ref());
        }
        Ok(outcome)
    }

    fn absorb(
        &self,
        name: &str,
        block: Block,
        assembler: &WindowAssembler,
        outcome: &mut FileOutcome,
        crosscheck: Option<&Sender<CrosscheckJob>>,
    ) {
        let Some(header) = assembler.header() else {
            return;
        };
        let chunk = self.processor.process(&block.text, header, block.header_line);
        debug!(
            file = name,
            window = outcome.windows,
            lines = chunk.line_count,
            valid = chunk.valid_row_count,
            "block processed"
        );
        outcome.absorb(chunk, self.processor.sample_limit());

        if let Some(tx) = crosscheck {
            // a send only fails once the worker is gone; its join reports that
            let _ = tx.send(CrosscheckJob {
                text: block.text,
                header: header.clone(),
                header_line: block.header_line,
            });
        }
    }
}

fn recompute(processor: &ChunkProcessor, jobs: Receiver<CrosscheckJob>) -> MetricsRecord {
    let mut metrics = MetricsRecord::default();
    let mut serials = UniqueSerialSets::default();
    for job in jobs {
        let chunk = processor.process(&job.text, &job.header, job.header_line);
        metrics.merge(&chunk.metrics);
        serials.union_with(&chunk.serials);
    }
    metrics.set_unique_counts(serials.counts());
    metrics
}
