use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::error::{BillingError, Result};
use crate::model::{
    Invoice, InvoiceDraft, InvoiceEdit, InvoiceId, InvoiceStatus, LineItem, LineItemId,
    LineItemPatch, NewLineItem,
};
use crate::numbering::parse_sequence;
use crate::totals::Totals;

/// The full contents of a store: invoices, line items and per-period counters
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Ledger {
    #[serde(default)]
    pub last_invoice_id: InvoiceId,
    #[serde(default)]
    pub last_item_id: LineItemId,
    #[serde(default)]
    pub counters: Vec<PeriodCounter>,
    #[serde(default)]
    pub invoices: Vec<Invoice>,
    #[serde(default)]
    pub items: Vec<LineItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodCounter {
    pub prefix: String,
    pub last_seq: u32,
}

/// Numeric order for numbers sharing a prefix: shorter sequences sort first
fn number_order(a: &str, b: &str) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

impl Ledger {
    pub fn create_invoice(&mut self, number: &str, draft: &InvoiceDraft) -> Result<Invoice> {
        if self.invoices.iter().any(|inv| inv.number == number) {
            return Err(BillingError::DuplicateNumber(number.to_string()));
        }

        let issued_at = draft
            .issued_at
            .unwrap_or_else(|| Local::now().date_naive());
        self.last_invoice_id += 1;
        let invoice = Invoice::from_draft(self.last_invoice_id, number.to_string(), draft, issued_at);
        self.invoices.push(invoice.clone());
        Ok(invoice)
    }

    pub fn get_invoice(&self, id: InvoiceId) -> Option<Invoice> {
        self.invoices.iter().find(|inv| inv.id == id).cloned()
    }

    pub fn find_by_number(&self, number: &str) -> Option<Invoice> {
        self.invoices.iter().find(|inv| inv.number == number).cloned()
    }

    pub fn list_invoices(&self) -> Vec<Invoice> {
        let mut invoices = self.invoices.clone();
        invoices.sort_by(|a, b| b.id.cmp(&a.id));
        invoices
    }

    pub fn update_invoice_amount(&mut self, id: InvoiceId, amount: Decimal) -> bool {
        match self.invoices.iter_mut().find(|inv| inv.id == id) {
            Some(invoice) => {
                invoice.amount = amount;
                true
            }
            None => false,
        }
    }

    pub fn update_invoice_fields(&mut self, id: InvoiceId, edit: &InvoiceEdit) -> Option<Invoice> {
        let invoice = self.invoices.iter_mut().find(|inv| inv.id == id)?;
        edit.apply(invoice);
        Some(invoice.clone())
    }

    /// Recompute `amount` from the current items in the same critical section
    pub fn recompute_amount(&mut self, id: InvoiceId) -> Option<Totals> {
        let tax_rate = self.invoices.iter().find(|inv| inv.id == id)?.tax_rate;
        let totals = Totals::compute(&self.list_items(id), tax_rate);
        self.update_invoice_amount(id, totals.total).then_some(totals)
    }

    pub fn update_status(
        &mut self,
        id: InvoiceId,
        status: InvoiceStatus,
        paid_at: Option<NaiveDate>,
    ) -> bool {
        match self.invoices.iter_mut().find(|inv| inv.id == id) {
            Some(invoice) => {
                invoice.status = status;
                invoice.paid_at = paid_at;
                true
            }
            None => false,
        }
    }

    pub fn delete_invoice(&mut self, id: InvoiceId) -> bool {
        let before = self.invoices.len();
        self.invoices.retain(|inv| inv.id != id);
        if self.invoices.len() == before {
            return false;
        }
        self.items.retain(|item| item.invoice_id != id);
        true
    }

    pub fn max_number_with_prefix(&self, prefix: &str) -> Option<String> {
        self.invoices
            .iter()
            .map(|inv| inv.number.as_str())
            .filter(|number| number.starts_with(prefix))
            .max_by(|a, b| number_order(a, b))
            .map(str::to_string)
    }

    /// Counter rows are seeded from the highest existing sequence so that
    /// switching strategies never hands out a number already in use.
    pub fn next_period_sequence(&mut self, prefix: &str) -> u32 {
        let existing = self
            .max_number_with_prefix(prefix)
            .and_then(|number| parse_sequence(&number, prefix))
            .unwrap_or(0);

        let idx = match self.counters.iter().position(|c| c.prefix == prefix) {
            Some(idx) => idx,
            None => {
                self.counters.push(PeriodCounter {
                    prefix: prefix.to_string(),
                    last_seq: 0,
                });
                self.counters.len() - 1
            }
        };

        let counter = &mut self.counters[idx];
        counter.last_seq = counter.last_seq.max(existing).saturating_add(1);
        counter.last_seq
    }

    pub fn insert_item(&mut self, invoice_id: InvoiceId, item: &NewLineItem) -> Result<LineItem> {
        if !self.invoices.iter().any(|inv| inv.id == invoice_id) {
            return Err(BillingError::InvoiceNotFound(invoice_id.to_string()));
        }

        self.last_item_id += 1;
        let stored = LineItem {
            id: self.last_item_id,
            invoice_id,
            description: item.description.clone(),
            qty: item.qty,
            unit_price: item.unit_price,
        };
        self.items.push(stored.clone());
        Ok(stored)
    }

    pub fn update_item(&mut self, item_id: LineItemId, patch: &LineItemPatch) -> Result<LineItem> {
        let item = self
            .items
            .iter_mut()
            .find(|item| item.id == item_id)
            .ok_or_else(|| BillingError::LineItemNotFound(item_id.to_string()))?;
        patch.apply(item);
        Ok(item.clone())
    }

    pub fn delete_item(&mut self, item_id: LineItemId) -> Result<LineItem> {
        let idx = self
            .items
            .iter()
            .position(|item| item.id == item_id)
            .ok_or_else(|| BillingError::LineItemNotFound(item_id.to_string()))?;
        Ok(self.items.remove(idx))
    }

    pub fn list_items(&self, invoice_id: InvoiceId) -> Vec<LineItem> {
        self.items
            .iter()
            .filter(|item| item.invoice_id == invoice_id)
            .cloned()
            .collect()
    }
}
