use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{InvoiceStore, Ledger};
use crate::error::Result;
use crate::model::{
    Invoice, InvoiceDraft, InvoiceEdit, InvoiceId, InvoiceStatus, LineItem, LineItemId,
    LineItemPatch, NewLineItem,
};
use crate::totals::Totals;

/// Process-local store. Each call holds the lock for its whole duration.
#[derive(Debug, Default)]
pub struct MemoryStore {
    ledger: Mutex<Ledger>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_ledger(ledger: Ledger) -> Self {
        Self {
            ledger: Mutex::new(ledger),
        }
    }

    /// Copy of the current contents
    pub fn snapshot(&self) -> Ledger {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Ledger> {
        self.ledger.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl InvoiceStore for MemoryStore {
    fn create_invoice(&self, number: &str, draft: &InvoiceDraft) -> Result<Invoice> {
        self.lock().create_invoice(number, draft)
    }

    fn get_invoice(&self, id: InvoiceId) -> Result<Option<Invoice>> {
        Ok(self.lock().get_invoice(id))
    }

    fn find_by_number(&self, number: &str) -> Result<Option<Invoice>> {
        Ok(self.lock().find_by_number(number))
    }

    fn list_invoices(&self) -> Result<Vec<Invoice>> {
        Ok(self.lock().list_invoices())
    }

    fn update_invoice_amount(&self, id: InvoiceId, amount: Decimal) -> Result<bool> {
        Ok(self.lock().update_invoice_amount(id, amount))
    }

    fn update_invoice_fields(&self, id: InvoiceId, edit: &InvoiceEdit) -> Result<Option<Invoice>> {
        Ok(self.lock().update_invoice_fields(id, edit))
    }

    fn recompute_amount(&self, id: InvoiceId) -> Result<Option<Totals>> {
        Ok(self.lock().recompute_amount(id))
    }

    fn update_status(
        &self,
        id: InvoiceId,
        status: InvoiceStatus,
        paid_at: Option<NaiveDate>,
    ) -> Result<bool> {
        Ok(self.lock().update_status(id, status, paid_at))
    }

    fn delete_invoice(&self, id: InvoiceId) -> Result<bool> {
        Ok(self.lock().delete_invoice(id))
    }

    fn max_number_with_prefix(&self, prefix: &str) -> Result<Option<String>> {
        Ok(self.lock().max_number_with_prefix(prefix))
    }

    fn next_period_sequence(&self, prefix: &str) -> Result<u32> {
        Ok(self.lock().next_period_sequence(prefix))
    }

    fn insert_item(&self, invoice_id: InvoiceId, item: &NewLineItem) -> Result<LineItem> {
        self.lock().insert_item(invoice_id, item)
    }

    fn update_item(&self, item_id: LineItemId, patch: &LineItemPatch) -> Result<LineItem> {
        self.lock().update_item(item_id, patch)
    }

    fn delete_item(&self, item_id: LineItemId) -> Result<LineItem> {
        self.lock().delete_item(item_id)
    }

    fn list_items(&self, invoice_id: InvoiceId) -> Result<Vec<LineItem>> {
        Ok(self.lock().list_items(invoice_id))
    }
}
