// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::source::FileOrigin;
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// Column names the engine understands. Everything else in a file is dropped
/// as soon as the row is built.
pub const FIELD_REPORT_TYPE: &str = "REPORTTYPE";
pub const FIELD_AMOUNT: &str = "TRANSACTION_AMOUNT";
pub const FIELD_CURRENCY: &str = "TRANSACTION_CURRENCY";
pub const FIELD_ACCOUNT_ROLE: &str = "ACCOUNT_HOLDER_ACCOUNT_ROLE";
pub const FIELD_DATE: &str = "TRANSACTION_DATE";
pub const FIELD_SERIAL: &str = "SERIAL_NO";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReportType {
    Hoc,
    Ibd,
    /// Only feeds IBD-side serial uniqueness; never counted as IBD volume.
    Wu,
    Other(String),
}

impl ReportType {
    pub fn parse(s: &str) -> Self {
        match s {
            "HOC" => ReportType::Hoc,
            "IBD" => ReportType::Ibd,
            "WU" => ReportType::Wu,
            other => ReportType::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ReportType::Hoc => "HOC",
            ReportType::Ibd => "IBD",
            ReportType::Wu => "WU",
            ReportType::Other(s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Currency {
    Usd,
    Mmk,
    Other(String),
}

impl Currency {
    pub fn parse(s: &str) -> Self {
        match s {
            "USD" => Currency::Usd,
            "MMK" => Currency::Mmk,
            other => Currency::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Currency::Usd => "USD",
            Currency::Mmk => "MMK",
            Currency::Other(s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AccountRole {
    Credit,
    Debit,
    Other(String),
}

impl AccountRole {
    pub fn parse(s: &str) -> Self {
        match s {
            "C" | "Credit" | "CREDIT" => AccountRole::Credit,
            "D" | "Debit" | "DEBIT" => AccountRole::Debit,
            _ => AccountRole::Other(s.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            AccountRole::Credit => "C",
            AccountRole::Debit => "D",
            AccountRole::Other(s) => s,
        }
    }
}

macro_rules! str_serialize {
    ($($t:ty),*) => {$(
        impl Serialize for $t {
            fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
                s.serialize_str(self.as_str())
            }
        }

        impl fmt::Display for $t {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    )*};
}

str_serialize!(ReportType, Currency, AccountRole);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRow {
    pub report_type: ReportType,
    pub amount: Decimal,
    pub currency: Currency,
    pub account_role: AccountRole,
    pub transaction_date: String,
    pub serial_number: String,
}

impl TransactionRow {
    /// Builds a row from raw field text. The amount never fails to parse;
    /// unreadable values become zero.
    pub fn from_fields(
        report_type: &str,
        amount: &str,
        currency: &str,
        account_role: &str,
        transaction_date: &str,
        serial_number: &str,
    ) -> Self {
        TransactionRow {
            report_type: ReportType::parse(report_type.trim()),
            amount: crate::metrics::parse_amount(amount),
            currency: Currency::parse(currency.trim()),
            account_role: AccountRole::parse(account_role.trim()),
            transaction_date: transaction_date.trim().to_string(),
            serial_number: serial_number.trim().to_string(),
        }
    }
}

/// A count paired with the amount it sums.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub count: u64,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CreditDebit {
    pub credit: Tally,
    pub debit: Tally,
}

/// Volume for one report type. `total` also covers rows whose account role
/// is neither credit nor debit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReportTotals {
    #[serde(flatten)]
    pub total: Tally,
    #[serde(flatten)]
    pub split: CreditDebit,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct CurrencyTotals {
    pub usd: Tally,
    pub mmk: Tally,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsRecord {
    pub total_transactions: u64,
    pub total_amount: Decimal,
    pub hoc: ReportTotals,
    pub ibd: ReportTotals,
    pub currencies: CurrencyTotals,
    // derived from set cardinality, never summed
    pub hoc_unique_serial_count: usize,
    pub ibd_unique_serial_count: usize,
    pub total_unique_serial_count: usize,
}

/// Serial numbers seen per category. `all` is the union of `hoc` and `ibd`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UniqueSerialSets {
    pub hoc: HashSet<String>,
    pub ibd: HashSet<String>,
    pub all: HashSet<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UniqueCounts {
    pub hoc: usize,
    pub ibd: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DateBucket {
    pub hoc: CreditDebit,
    pub ibd: CreditDebit,
}

pub type DateBuckets = BTreeMap<String, DateBucket>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Unprocessed,
    Processing,
    Processed,
    Removed,
    Deleted,
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FileStatus::Unprocessed => "unprocessed",
            FileStatus::Processing => "processing",
            FileStatus::Processed => "processed",
            FileStatus::Removed => "removed",
            FileStatus::Deleted => "deleted",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub name: String,
    pub size: u64,
    pub status: FileStatus,
    pub metrics: MetricsRecord,
    #[serde(skip)]
    pub serials: UniqueSerialSets,
    pub row_count: u64,
    pub processed_row_count: u64,
    pub sample_rows: Vec<TransactionRow>,
    #[serde(skip)]
    pub origin: FileOrigin,
}

impl FileRecord {
    pub fn new(name: impl Into<String>, origin: FileOrigin) -> Self {
        FileRecord {
            name: name.into(),
            size: origin.len(),
            status: FileStatus::Unprocessed,
            metrics: MetricsRecord::default(),
            serials: UniqueSerialSets::default(),
            row_count: 0,
            processed_row_count: 0,
            sample_rows: Vec::new(),
            origin,
        }
    }

    /// Identity used by the processed-file guard.
    pub fn file_id(&self) -> String {
        format!("{}_{}", self.name, self.size)
    }

    /// Processed and not removed: the records that feed the running totals.
    pub fn is_active(&self) -> bool {
        self.status == FileStatus::Processed
    }
}
