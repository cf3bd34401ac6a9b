// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::dates::compare_keys;
use crate::metrics::merge_date_buckets;
use crate::models::{DateBucket, DateBuckets};
use rust_decimal::Decimal;
use serde::Serialize;

/// Running date -> credit/debit aggregate behind the detail table.
#[derive(Debug, Clone, Default)]
pub struct DateTable {
    buckets: DateBuckets,
}

/// One display row of the date table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRow {
    pub date: String,
    pub hoc_credit_count: u64,
    pub hoc_credit_amount: Decimal,
    pub hoc_debit_count: u64,
    pub hoc_debit_amount: Decimal,
    pub ibd_credit_count: u64,
    pub ibd_credit_amount: Decimal,
    pub ibd_debit_count: u64,
    pub ibd_debit_amount: Decimal,
}

impl DateRow {
    pub const HEADERS: [&'static str; 9] = [
        "Date",
        "HOC Credit Count",
        "HOC Credit Amount",
        "HOC Debit Count",
        "HOC Debit Amount",
        "IBD Credit Count",
        "IBD Credit Amount",
        "IBD Debit Count",
        "IBD Debit Amount",
    ];

    fn from_bucket(date: &str, b: &DateBucket) -> Self {
        DateRow {
            date: date.to_string(),
            hoc_credit_count: b.hoc.credit.count,
            hoc_credit_amount: b.hoc.credit.amount,
            hoc_debit_count: b.hoc.debit.count,
            hoc_debit_amount: b.hoc.debit.amount,
            ibd_credit_count: b.ibd.credit.count,
            ibd_credit_amount: b.ibd.credit.amount,
            ibd_debit_count: b.ibd.debit.count,
            ibd_debit_amount: b.ibd.debit.amount,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatePage {
    pub page: usize,
    pub total_pages: usize,
    pub total_rows: usize,
    pub rows: Vec<DateRow>,
}

impl DateTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge(&mut self, incoming: &DateBuckets) {
        merge_date_buckets(&mut self.buckets, incoming);
    }

    pub fn bucket(&self, date: &str) -> Option<&DateBucket> {
        self.buckets.get(date)
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn reset(&mut self) {
        self.buckets.clear();
    }

    /// Snapshot of every row in display order.
    pub fn rows(&self) -> Vec<DateRow> {
        let mut rows: Vec<DateRow> = self
            .buckets
            .iter()
            .map(|(date, b)| DateRow::from_bucket(date, b))
            .collect();
        rows.sort_by(|a, b| compare_keys(&a.date, &b.date));
        rows
    }

    /// One page of the sorted rows. `page` is 1-based and clamped into range.
    pub fn page(&self, page: usize, per_page: usize) -> DatePage {
        let rows = self.rows();
        let total_rows = rows.len();
        let per_page = per_page.max(1);
        let total_pages = total_rows.div_ceil(per_page).max(1);
        let page = page.clamp(1, total_pages);
        let rows = rows
            .into_iter()
            .skip((page - 1) * per_page)
            .take(per_page)
            .collect();
        DatePage {
            page,
            total_pages,
            total_rows,
            rows,
        }
    }
}
