// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{FileRecord, MetricsRecord, UniqueCounts, UniqueSerialSets};

/// Running totals across every committed file, plus the file registry.
///
/// Counters and amounts move incrementally. Unique-serial counts are always
/// re-read from the global sets after any change.
#[derive(Debug, Default)]
pub struct GlobalLedger {
    metrics: MetricsRecord,
    serials: UniqueSerialSets,
    files: Vec<FileRecord>,
}

impl GlobalLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge_file(&mut self, metrics: &MetricsRecord, serials: &UniqueSerialSets) {
        self.metrics.merge(metrics);
        self.serials.union_with(serials);
        self.refresh_unique_counts();
    }

    /// Subtracts a file's counters and amounts, floored at zero. Its serials
    /// are handled separately by [`GlobalLedger::remove_serials`].
    pub fn unmerge_file(&mut self, metrics: &MetricsRecord) {
        self.metrics.unmerge_floored(metrics);
        self.refresh_unique_counts();
    }

    pub fn remove_serials(&mut self, serials: &UniqueSerialSets) {
        self.serials.remove_all(serials);
        self.refresh_unique_counts();
    }

    /// Rebuilds totals and sets from the active file records alone.
    pub fn full_recompute(&mut self) {
        let mut metrics = MetricsRecord::default();
        let mut serials = UniqueSerialSets::default();
        for file in self.files.iter().filter(|f| f.is_active()) {
            metrics.merge(&file.metrics);
            serials.union_with(&file.serials);
        }
        metrics.set_unique_counts(serials.counts());
        self.metrics = metrics;
        self.serials = serials;
    }

    fn refresh_unique_counts(&mut self) {
        self.metrics.set_unique_counts(self.serials.counts());
    }

    pub fn metrics(&self) -> &MetricsRecord {
        &self.metrics
    }

    pub fn summary(&self) -> MetricsRecord {
        self.metrics.clone()
    }

    pub fn serials(&self) -> &UniqueSerialSets {
        &self.serials
    }

    pub fn unique_counts(&self) -> UniqueCounts {
        self.serials.counts()
    }

    pub fn register(&mut self, record: FileRecord) {
        self.files.push(record);
    }

    pub fn files(&self) -> &[FileRecord] {
        &self.files
    }

    pub fn file(&self, name: &str) -> Option<&FileRecord> {
        self.files.iter().find(|f| f.name == name)
    }

    pub(crate) fn file_mut(&mut self, name: &str) -> Option<&mut FileRecord> {
        self.files.iter_mut().find(|f| f.name == name)
    }

    pub fn active_files(&self) -> impl Iterator<Item = &FileRecord> + '_ {
        self.files.iter().filter(|f| f.is_active())
    }

    /// Drops a record from the registry for good.
    pub(crate) fn delete(&mut self, name: &str) -> Option<FileRecord> {
        let idx = self.files.iter().position(|f| f.name == name)?;
        Some(self.files.remove(idx))
    }

    /// Zeroes the totals and sets but keeps the registry.
    pub fn clear_totals(&mut self) {
        self.metrics = MetricsRecord::default();
        self.serials.clear();
    }

    pub fn reset(&mut self) {
        self.clear_totals();
        self.files.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FileStatus, TransactionRow};
    use crate::source::FileOrigin;

    fn record(name: &str, rows: &[TransactionRow]) -> FileRecord {
        let mut rec = FileRecord::new(name, FileOrigin::memory(Vec::new()));
        for row in rows {
            crate::metrics::fold_row(row, &mut rec.metrics, &mut rec.serials);
        }
        rec.metrics.set_unique_counts(rec.serials.counts());
        rec.status = FileStatus::Processed;
        rec
    }

    fn hoc(amount: &str, serial: &str) -> TransactionRow {
        TransactionRow::from_fields("HOC", amount, "USD", "C", "05-JAN-23", serial)
    }

    #[test]
    fn merge_recounts_uniques_from_sets() {
        let a = record("a.csv", &[hoc("10", "S1"), hoc("5", "S2")]);
        let b = record("b.csv", &[hoc("1", "S2")]);
        let mut ledger = GlobalLedger::new();
        ledger.merge_file(&a.metrics, &a.serials);
        ledger.merge_file(&b.metrics, &b.serials);
        assert_eq!(ledger.metrics().total_transactions, 3);
        assert_eq!(ledger.metrics().hoc_unique_serial_count, 2);
        assert_eq!(ledger.unique_counts().total, 2);
    }

    #[test]
    fn full_recompute_skips_inactive_records() {
        let a = record("a.csv", &[hoc("10", "S1")]);
        let mut b = record("b.csv", &[hoc("7", "S2")]);
        b.status = FileStatus::Removed;
        let mut ledger = GlobalLedger::new();
        ledger.register(a);
        ledger.register(b);
        ledger.full_recompute();
        assert_eq!(ledger.metrics().total_transactions, 1);
        assert_eq!(ledger.metrics().total_amount, rust_decimal::Decimal::from(10));
        assert_eq!(ledger.active_files().count(), 1);
    }
}
