//! Invoice numbers: `INV-YYYYMM-NNNN`, with the sequence restarting every
//! calendar month of the issue date.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;
use crate::store::InvoiceStore;

pub const NUMBER_PREFIX: &str = "INV";

/// How the next sequence of a period is obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumberingStrategy {
    /// Read the highest existing number for the period and add one.
    /// Concurrent creations can collide; the store rejects the loser.
    #[default]
    Scan,
    /// Bump a per-period counter row in one atomic store call
    Counter,
}

/// `INV-YYYYMM-` for the month of `date`
pub fn period_prefix(date: NaiveDate) -> String {
    format!("{}-{:04}{:02}-", NUMBER_PREFIX, date.year(), date.month())
}

pub fn format_number(prefix: &str, seq: u32) -> String {
    format!("{prefix}{seq:04}")
}

/// Trailing sequence of `number`, if it belongs to `prefix` and is numeric
pub fn parse_sequence(number: &str, prefix: &str) -> Option<u32> {
    let suffix = number.strip_prefix(prefix)?;
    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    suffix.parse().ok()
}

/// Sequence following `last`. A corrupted last number restarts the period at 1.
pub fn sequence_after(last: Option<&str>, prefix: &str) -> u32 {
    let Some(last) = last else {
        return 1;
    };
    match parse_sequence(last, prefix).and_then(|seq| seq.checked_add(1)) {
        Some(next) => next,
        None => {
            warn!(last, prefix, "unparseable invoice number, restarting sequence at 1");
            1
        }
    }
}

/// Compute the number for a new invoice issued on `issued_at`.
/// Nothing is reserved under `Scan`; uniqueness is enforced when the invoice is persisted.
pub fn next_number<S: InvoiceStore + ?Sized>(
    store: &S,
    strategy: NumberingStrategy,
    issued_at: NaiveDate,
) -> Result<String> {
    let prefix = period_prefix(issued_at);
    let seq = match strategy {
        NumberingStrategy::Scan => {
            let last = store.max_number_with_prefix(&prefix)?;
            sequence_after(last.as_deref(), &prefix)
        }
        NumberingStrategy::Counter => store.next_period_sequence(&prefix)?,
    };
    Ok(format_number(&prefix, seq))
}
