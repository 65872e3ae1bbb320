mod invoice;
mod line_item;
mod status;

pub(crate) use invoice::check_dates;
pub use invoice::{normalize_currency, Invoice, InvoiceDraft, InvoiceEdit, InvoiceId};
pub use line_item::{LineItem, LineItemId, LineItemPatch, NewLineItem};
pub use status::InvoiceStatus;

use rust_decimal::Decimal;

use crate::error::{BillingError, Result};

/// Largest quantity or unit price accepted (10 digits, 2 of them decimals)
pub fn max_line_value() -> Decimal {
    Decimal::new(9_999_999_999, 2)
}

/// Largest tax rate accepted, in percent
pub fn max_tax_rate() -> Decimal {
    Decimal::new(99_999, 2)
}

/// Reject negative values, more than two decimal places, and values above `max`
fn check_amount(field: &'static str, value: Decimal, max: Decimal) -> Result<()> {
    let reason = if value < Decimal::ZERO {
        Some("must not be negative".to_string())
    } else if value.normalize().scale() > crate::money::DECIMAL_PLACES {
        Some("at most two decimal places".to_string())
    } else if value > max {
        Some(format!("must not exceed {max}"))
    } else {
        None
    };

    match reason {
        Some(reason) => Err(BillingError::InvalidAmount {
            field,
            value: value.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}
