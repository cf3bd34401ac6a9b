// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::metrics::{fold_date_bucket, fold_row};
use crate::models::{
    DateBuckets, FIELD_ACCOUNT_ROLE, FIELD_AMOUNT, FIELD_CURRENCY, FIELD_DATE, FIELD_REPORT_TYPE,
    FIELD_SERIAL, MetricsRecord, TransactionRow, UniqueSerialSets,
};
use crate::parser::parse_line;
use serde::Serialize;

/// Column layout of a file, resolved once from its first line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    columns: Vec<String>,
    report_type: Option<usize>,
    amount: Option<usize>,
    currency: Option<usize>,
    account_role: Option<usize>,
    date: Option<usize>,
    serial: Option<usize>,
}

impl Header {
    pub fn parse(line: &str) -> Self {
        Self::from_columns(parse_line(line.trim_start_matches('\u{feff}')))
    }

    pub fn from_columns(columns: Vec<String>) -> Self {
        // a repeated column name resolves to its last occurrence
        let find = |name: &str| columns.iter().rposition(|c| c == name);
        Header {
            report_type: find(FIELD_REPORT_TYPE),
            amount: find(FIELD_AMOUNT),
            currency: find(FIELD_CURRENCY),
            account_role: find(FIELD_ACCOUNT_ROLE),
            date: find(FIELD_DATE),
            serial: find(FIELD_SERIAL),
            columns,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Builds a row from parsed fields, or `None` when the line is too short
    /// for the header or carries no report type.
    pub fn build_row(&self, fields: &[String]) -> Option<TransactionRow> {
        if fields.len() < self.columns.len() {
            return None;
        }
        let get = |idx: Option<usize>| {
            idx.and_then(|i| fields.get(i))
                .map(String::as_str)
                .unwrap_or("")
        };
        let report_type = get(self.report_type);
        if report_type.is_empty() {
            return None;
        }
        Some(TransactionRow::from_fields(
            report_type,
            get(self.amount),
            get(self.currency),
            get(self.account_role),
            get(self.date),
            get(self.serial),
        ))
    }
}

/// Narrows which valid rows are aggregated. Choosing `IBD` also admits `WU`
/// rows since they belong to the IBD side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RowFilter {
    pub currency: Option<String>,
    pub report_type: Option<String>,
}

impl RowFilter {
    pub fn is_empty(&self) -> bool {
        self.currency.is_none() && self.report_type.is_none()
    }

    pub fn matches(&self, row: &TransactionRow) -> bool {
        if let Some(ccy) = &self.currency {
            if row.currency.as_str() != ccy {
                return false;
            }
        }
        if let Some(wanted) = &self.report_type {
            let rt = row.report_type.as_str();
            let admitted = if wanted == "IBD" {
                rt == "IBD" || rt == "WU"
            } else {
                rt == wanted
            };
            if !admitted {
                return false;
            }
        }
        true
    }
}

/// Aggregate of one block of text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkResult {
    pub metrics: MetricsRecord,
    pub serials: UniqueSerialSets,
    pub date_buckets: DateBuckets,
    /// Non-blank data lines seen, valid or not.
    pub line_count: u64,
    /// Rows that passed the validity gate and the filter.
    pub valid_row_count: u64,
    pub samples: Vec<TransactionRow>,
}

/// Turns a block of complete lines into a [`ChunkResult`]. Holds no state
/// between calls, so any block can be reprocessed safely.
#[derive(Debug, Clone, Default)]
pub struct ChunkProcessor {
    filter: RowFilter,
    sample_limit: usize,
}

impl ChunkProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(mut self, filter: RowFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Keep up to `limit` of the first valid rows as display samples.
    pub fn with_sample_limit(mut self, limit: usize) -> Self {
        self.sample_limit = limit;
        self
    }

    pub fn sample_limit(&self) -> usize {
        self.sample_limit
    }

    pub fn process(&self, text: &str, header: &Header, first_line_is_header: bool) -> ChunkResult {
        let mut out = ChunkResult::default();
        let skip = usize::from(first_line_is_header);

        for line in text.split('\n').skip(skip) {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            out.line_count += 1;

            let fields = parse_line(line);
            let Some(row) = header.build_row(&fields) else {
                continue;
            };
            if !self.filter.matches(&row) {
                continue;
            }

            out.valid_row_count += 1;
            fold_row(&row, &mut out.metrics, &mut out.serials);
            fold_date_bucket(&row, &mut out.date_buckets);
            if out.samples.len() < self.sample_limit {
                out.samples.push(row);
            }
        }
        out.metrics.set_unique_counts(out.serials.counts());
        out
    }
}
