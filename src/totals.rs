//! Keeps `Invoice::amount` equal to the rounded total of its line items.
//!
//! Rounding happens at every stage: subtotal, then tax on the rounded
//! subtotal, then the sum of the two.

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use crate::model::{InvoiceId, LineItem};
use crate::money::round2;
use crate::store::InvoiceStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
}

impl Totals {
    pub fn zero() -> Self {
        Self {
            subtotal: Decimal::ZERO,
            tax_amount: Decimal::ZERO,
            total: Decimal::ZERO,
        }
    }

    /// `tax_rate` is a percentage, e.g. 20.00 for 20%
    pub fn compute(items: &[LineItem], tax_rate: Decimal) -> Self {
        let raw: Decimal = items.iter().map(|item| item.qty * item.unit_price).sum();
        let subtotal = round2(raw);
        let tax_amount = round2(subtotal * tax_rate / Decimal::ONE_HUNDRED);
        Self {
            subtotal,
            tax_amount,
            total: round2(subtotal + tax_amount),
        }
    }
}

/// Recompute and store the cached total of one invoice.
///
/// Only the `amount` column is written, in one store step. Returns `None`
/// when the invoice no longer exists, which is not an error: there is
/// nothing left to keep in sync.
pub fn recompute_cached_total<S: InvoiceStore + ?Sized>(
    store: &S,
    invoice_id: InvoiceId,
) -> Result<Option<Totals>> {
    let Some(totals) = store.recompute_amount(invoice_id)? else {
        debug!(invoice_id, "skipping recompute, invoice is gone");
        return Ok(None);
    };

    debug!(
        invoice_id,
        subtotal = %totals.subtotal,
        tax = %totals.tax_amount,
        amount = %totals.total,
        "cached total recomputed"
    );
    Ok(Some(totals))
}
