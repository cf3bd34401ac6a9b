// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Per-row accumulation and the additive algebra over metrics records.
//!
//! Every counter and amount combines by pointwise addition, so a file can be
//! folded row by row, chunk by chunk or file by file with the same result.
//! Unique-serial counts are the exception: they are always re-read from the
//! serial sets and never summed.

use crate::dates::extract_date_key;
use crate::models::{
    AccountRole, CreditDebit, Currency, CurrencyTotals, DateBucket, DateBuckets, MetricsRecord,
    ReportTotals, ReportType, Tally, TransactionRow, UniqueCounts, UniqueSerialSets,
};
use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::warn;

/// Reads the leading numeric prefix of `raw` as a decimal.
///
/// `"12.5"` and `"12.5 MMK"` both give 12.5, `"1e3"` gives 1000, and anything
/// without leading digits gives zero. Never fails.
pub fn parse_amount(raw: &str) -> Decimal {
    let s = raw.trim();
    let bytes = s.as_bytes();
    let mut i = 0;
    let negative = match bytes.first() {
        Some(b'-') => {
            i = 1;
            true
        }
        Some(b'+') => {
            i = 1;
            false
        }
        _ => false,
    };

    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let int_part = &s[int_start..i];

    let mut frac_part = "";
    if i < bytes.len() && bytes[i] == b'.' {
        let frac_start = i + 1;
        let mut j = frac_start;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        frac_part = &s[frac_start..j];
        i = j;
    }
    if int_part.is_empty() && frac_part.is_empty() {
        return Decimal::ZERO;
    }

    let mut exponent: i64 = 0;
    if i < bytes.len() && matches!(bytes[i], b'e' | b'E') {
        let mut j = i + 1;
        let exp_negative = match bytes.get(j) {
            Some(b'-') => {
                j += 1;
                true
            }
            Some(b'+') => {
                j += 1;
                false
            }
            _ => false,
        };
        let digits_start = j;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > digits_start {
            exponent = s[digits_start..j].parse::<i64>().unwrap_or(i64::MAX);
            if exp_negative {
                exponent = -exponent;
            }
        }
    }

    let mut mantissa = String::with_capacity(int_part.len() + frac_part.len() + 3);
    if negative {
        mantissa.push('-');
    }
    mantissa.push_str(if int_part.is_empty() { "0" } else { int_part });
    if !frac_part.is_empty() {
        mantissa.push('.');
        mantissa.push_str(frac_part);
    }

    let Ok(mut value) = Decimal::from_str(&mantissa) else {
        return Decimal::ZERO;
    };
    // Decimal carries at most 28 significant digits.
    if exponent.abs() > 28 {
        return Decimal::ZERO;
    }
    for _ in 0..exponent.unsigned_abs() {
        let next = if exponent > 0 {
            value.checked_mul(Decimal::TEN)
        } else {
            value.checked_div(Decimal::TEN)
        };
        match next {
            Some(v) => value = v,
            None => return Decimal::ZERO,
        }
    }
    value
}

/// Folds one row into `record`, adding its serial number to `serials`.
///
/// Totals move for every row. HOC and IBD rows move their own volume and
/// credit/debit split; WU rows only register their serial on the IBD side.
/// The currency buckets are independent of the report type.
///
/// A row whose amount would overflow the running total still counts, with an
/// amount of zero.
pub fn fold_row(row: &TransactionRow, record: &mut MetricsRecord, serials: &mut UniqueSerialSets) {
    let serial = row.serial_number.as_str();
    let amount = match record.total_amount.checked_add(row.amount) {
        Some(total) => {
            record.total_amount = total;
            row.amount
        }
        None => {
            warn!(serial, amount = %row.amount, "amount overflows running total, counted as 0");
            Decimal::ZERO
        }
    };
    record.total_transactions += 1;

    match &row.report_type {
        ReportType::Hoc => {
            record.hoc.record(&row.account_role, amount);
            if !serial.is_empty() {
                serials.insert_hoc(serial);
            }
        }
        ReportType::Ibd => {
            record.ibd.record(&row.account_role, amount);
            if !serial.is_empty() {
                serials.insert_ibd(serial);
            }
        }
        ReportType::Wu => {
            if !serial.is_empty() {
                serials.insert_ibd(serial);
            }
        }
        ReportType::Other(_) => {}
    }

    match &row.currency {
        Currency::Usd => record.currencies.usd.record(amount),
        Currency::Mmk => record.currencies.mmk.record(amount),
        Currency::Other(_) => {}
    }
}

/// Adds a row's credit/debit volume to its date bucket. Only HOC and IBD rows
/// land in the table.
pub fn fold_date_bucket(row: &TransactionRow, buckets: &mut DateBuckets) {
    let is_hoc = match &row.report_type {
        ReportType::Hoc => true,
        ReportType::Ibd => false,
        _ => return,
    };
    let bucket = buckets
        .entry(extract_date_key(&row.transaction_date))
        .or_default();
    let target = if is_hoc {
        &mut bucket.hoc
    } else {
        &mut bucket.ibd
    };
    target.record(&row.account_role, row.amount);
}

/// `a + b`, pinned to the `Decimal` bounds instead of overflowing.
fn saturating_add(a: Decimal, b: Decimal) -> Decimal {
    a.checked_add(b).unwrap_or(if b.is_sign_negative() {
        Decimal::MIN
    } else {
        Decimal::MAX
    })
}

fn floored_sub(a: Decimal, b: Decimal) -> Decimal {
    a.checked_sub(b)
        .unwrap_or(if b.is_sign_negative() {
            Decimal::MAX
        } else {
            Decimal::MIN
        })
        .max(Decimal::ZERO)
}

impl Tally {
    pub fn record(&mut self, amount: Decimal) {
        self.count += 1;
        self.amount = saturating_add(self.amount, amount);
    }

    pub fn merge(&mut self, other: &Tally) {
        self.count += other.count;
        self.amount = saturating_add(self.amount, other.amount);
    }

    pub fn unmerge_floored(&mut self, other: &Tally) {
        self.count = self.count.saturating_sub(other.count);
        self.amount = floored_sub(self.amount, other.amount);
    }
}

impl CreditDebit {
    pub fn record(&mut self, role: &AccountRole, amount: Decimal) {
        match role {
            AccountRole::Credit => self.credit.record(amount),
            AccountRole::Debit => self.debit.record(amount),
            AccountRole::Other(_) => {}
        }
    }

    pub fn merge(&mut self, other: &CreditDebit) {
        self.credit.merge(&other.credit);
        self.debit.merge(&other.debit);
    }

    pub fn unmerge_floored(&mut self, other: &CreditDebit) {
        self.credit.unmerge_floored(&other.credit);
        self.debit.unmerge_floored(&other.debit);
    }
}

impl ReportTotals {
    pub fn record(&mut self, role: &AccountRole, amount: Decimal) {
        self.total.record(amount);
        self.split.record(role, amount);
    }

    pub fn merge(&mut self, other: &ReportTotals) {
        self.total.merge(&other.total);
        self.split.merge(&other.split);
    }

    pub fn unmerge_floored(&mut self, other: &ReportTotals) {
        self.total.unmerge_floored(&other.total);
        self.split.unmerge_floored(&other.split);
    }
}

impl CurrencyTotals {
    pub fn merge(&mut self, other: &CurrencyTotals) {
        self.usd.merge(&other.usd);
        self.mmk.merge(&other.mmk);
    }

    pub fn unmerge_floored(&mut self, other: &CurrencyTotals) {
        self.usd.unmerge_floored(&other.usd);
        self.mmk.unmerge_floored(&other.mmk);
    }
}

impl MetricsRecord {
    /// Pointwise addition of every additive field. Unique counts are left
    /// alone; call [`MetricsRecord::set_unique_counts`] afterwards.
    pub fn merge(&mut self, other: &MetricsRecord) {
        self.total_transactions += other.total_transactions;
        self.total_amount = saturating_add(self.total_amount, other.total_amount);
        self.hoc.merge(&other.hoc);
        self.ibd.merge(&other.ibd);
        self.currencies.merge(&other.currencies);
    }

    /// Pointwise subtraction floored at zero. Unique counts are left alone.
    pub fn unmerge_floored(&mut self, other: &MetricsRecord) {
        self.total_transactions = self
            .total_transactions
            .saturating_sub(other.total_transactions);
        self.total_amount = floored_sub(self.total_amount, other.total_amount);
        self.hoc.unmerge_floored(&other.hoc);
        self.ibd.unmerge_floored(&other.ibd);
        self.currencies.unmerge_floored(&other.currencies);
    }

    pub fn set_unique_counts(&mut self, counts: UniqueCounts) {
        self.hoc_unique_serial_count = counts.hoc;
        self.ibd_unique_serial_count = counts.ibd;
        self.total_unique_serial_count = counts.total;
    }

    pub fn unique_counts(&self) -> UniqueCounts {
        UniqueCounts {
            hoc: self.hoc_unique_serial_count,
            ibd: self.ibd_unique_serial_count,
            total: self.total_unique_serial_count,
        }
    }
}

impl DateBucket {
    pub fn merge(&mut self, other: &DateBucket) {
        self.hoc.merge(&other.hoc);
        self.ibd.merge(&other.ibd);
    }
}

/// Pointwise merge of one bucket map into another.
pub fn merge_date_buckets(target: &mut DateBuckets, incoming: &DateBuckets) {
    for (date, bucket) in incoming {
        target.entry(date.clone()).or_default().merge(bucket);
    }
}

impl UniqueSerialSets {
    pub fn insert_hoc(&mut self, serial: &str) {
        if !self.hoc.contains(serial) {
            self.hoc.insert(serial.to_string());
        }
        if !self.all.contains(serial) {
            self.all.insert(serial.to_string());
        }
    }

    pub fn insert_ibd(&mut self, serial: &str) {
        if !self.ibd.contains(serial) {
            self.ibd.insert(serial.to_string());
        }
        if !self.all.contains(serial) {
            self.all.insert(serial.to_string());
        }
    }

    pub fn union_with(&mut self, other: &UniqueSerialSets) {
        self.hoc.extend(other.hoc.iter().cloned());
        self.ibd.extend(other.ibd.iter().cloned());
        self.all.extend(other.hoc.iter().cloned());
        self.all.extend(other.ibd.iter().cloned());
    }

    /// Removes `other`'s serials. A serial leaves the union only once it is
    /// in neither category set.
    ///
    /// This is a set difference, so it also drops serials that some other
    /// file still contributes; rebuild from the per-file sets when that
    /// matters.
    pub fn remove_all(&mut self, other: &UniqueSerialSets) {
        for serial in &other.hoc {
            self.hoc.remove(serial);
            if !self.ibd.contains(serial) {
                self.all.remove(serial);
            }
        }
        for serial in &other.ibd {
            self.ibd.remove(serial);
            if !self.hoc.contains(serial) {
                self.all.remove(serial);
            }
        }
    }

    pub fn counts(&self) -> UniqueCounts {
        UniqueCounts {
            hoc: self.hoc.len(),
            ibd: self.ibd.len(),
            total: self.all.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }

    pub fn clear(&mut self) {
        self.hoc.clear();
        self.ibd.clear();
        self.all.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_amount_reads_numeric_prefix() {
        assert_eq!(parse_amount("100"), Decimal::from(100));
        assert_eq!(parse_amount(" -12.50 "), Decimal::new(-1250, 2));
        assert_eq!(parse_amount("7.5 MMK"), Decimal::new(75, 1));
        assert_eq!(parse_amount(".5"), Decimal::new(5, 1));
        assert_eq!(parse_amount("1,250.00"), Decimal::from(1));
    }

    #[test]
    fn parse_amount_handles_exponents() {
        assert_eq!(parse_amount("1e3"), Decimal::from(1000));
        assert_eq!(parse_amount("25E-1"), Decimal::new(25, 1));
        assert_eq!(parse_amount("4e"), Decimal::from(4));
    }

    #[test]
    fn parse_amount_defaults_to_zero() {
        assert_eq!(parse_amount(""), Decimal::ZERO);
        assert_eq!(parse_amount("abc"), Decimal::ZERO);
        assert_eq!(parse_amount("-"), Decimal::ZERO);
        assert_eq!(parse_amount("1e400"), Decimal::ZERO);
    }

    #[test]
    fn unmerge_floors_at_zero() {
        let mut t = Tally {
            count: 1,
            amount: Decimal::from(10),
        };
        t.unmerge_floored(&Tally {
            count: 3,
            amount: Decimal::from(25),
        });
        assert_eq!(t, Tally::default());
    }

    #[test]
    fn merging_near_limit_totals_saturates() {
        let big = Tally {
            count: 1,
            amount: Decimal::MAX,
        };
        let mut t = big.clone();
        t.merge(&big);
        assert_eq!(t.count, 2);
        assert_eq!(t.amount, Decimal::MAX);

        let mut m = MetricsRecord {
            total_amount: Decimal::MAX,
            ..MetricsRecord::default()
        };
        let other = m.clone();
        m.merge(&other);
        assert_eq!(m.total_amount, Decimal::MAX);

        assert_eq!(floored_sub(Decimal::MAX, Decimal::MIN), Decimal::MAX);
        assert_eq!(floored_sub(Decimal::MIN, Decimal::MAX), Decimal::ZERO);
    }
}
