use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{check_amount, max_line_value, InvoiceId};
use crate::error::Result;
use crate::money::round2;

pub type LineItemId = u64;

/// One billable row belonging to an invoice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: LineItemId,
    pub invoice_id: InvoiceId,
    pub description: String,
    pub qty: Decimal,
    pub unit_price: Decimal,
}

impl LineItem {
    /// `qty * unit_price` rounded to cents; never stored
    pub fn line_total(&self) -> Decimal {
        round2(self.qty * self.unit_price)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewLineItem {
    pub description: String,
    pub qty: Decimal,
    pub unit_price: Decimal,
}

impl NewLineItem {
    pub fn new(description: impl Into<String>, qty: Decimal, unit_price: Decimal) -> Self {
        Self {
            description: description.into(),
            qty,
            unit_price,
        }
    }

    pub fn validate(&self) -> Result<()> {
        check_amount("quantity", self.qty, max_line_value())?;
        check_amount("unit price", self.unit_price, max_line_value())
    }
}

/// Partial edit of a line item; `None` keeps the current value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineItemPatch {
    pub description: Option<String>,
    pub qty: Option<Decimal>,
    pub unit_price: Option<Decimal>,
}

impl LineItemPatch {
    pub fn is_empty(&self) -> bool {
        self.description.is_none() && self.qty.is_none() && self.unit_price.is_none()
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(qty) = self.qty {
            check_amount("quantity", qty, max_line_value())?;
        }
        if let Some(unit_price) = self.unit_price {
            check_amount("unit price", unit_price, max_line_value())?;
        }
        Ok(())
    }

    pub fn apply(&self, item: &mut LineItem) {
        if let Some(description) = &self.description {
            item.description = description.clone();
        }
        if let Some(qty) = self.qty {
            item.qty = qty;
        }
        if let Some(unit_price) = self.unit_price {
            item.unit_price = unit_price;
        }
    }
}
