//! Persistence boundary for invoices and their line items.
//!
//! Every required method is synchronous and is a single atomic step against
//! the underlying tables. The cached total is only written through
//! `update_invoice_amount` and `recompute_amount`, which callers reach via
//! [`crate::totals`].

mod file;
mod ledger;
mod memory;

pub use file::FileStore;
pub use ledger::{Ledger, PeriodCounter};
pub use memory::MemoryStore;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::Result;
use crate::model::{
    Invoice, InvoiceDraft, InvoiceEdit, InvoiceId, InvoiceStatus, LineItem, LineItemId,
    LineItemPatch, NewLineItem,
};
use crate::totals::Totals;

pub trait InvoiceStore: Send + Sync {
    /// Insert a Draft invoice with a zero cached total.
    /// Fails with `DuplicateNumber` when `number` is already taken.
    fn create_invoice(&self, number: &str, draft: &InvoiceDraft) -> Result<Invoice>;

    fn get_invoice(&self, id: InvoiceId) -> Result<Option<Invoice>>;

    fn find_by_number(&self, number: &str) -> Result<Option<Invoice>>;

    /// All invoices, newest first
    fn list_invoices(&self) -> Result<Vec<Invoice>>;

    /// Write only the cached `amount`. Returns false if the invoice is gone.
    fn update_invoice_amount(&self, id: InvoiceId, amount: Decimal) -> Result<bool>;

    /// Apply header changes, returning the updated invoice or `None` if it is gone.
    /// Leaves `number`, `status` and `amount` untouched.
    fn update_invoice_fields(&self, id: InvoiceId, edit: &InvoiceEdit) -> Result<Option<Invoice>>;

    /// Recompute the cached `amount` from the invoice's current items and
    /// write it back. `None` if the invoice is gone.
    ///
    /// The default reads and writes in three calls, so a concurrent item
    /// change can slip in between. Stores holding a single lock override it.
    fn recompute_amount(&self, id: InvoiceId) -> Result<Option<Totals>> {
        let Some(invoice) = self.get_invoice(id)? else {
            return Ok(None);
        };
        let totals = Totals::compute(&self.list_items(id)?, invoice.tax_rate);
        Ok(self.update_invoice_amount(id, totals.total)?.then_some(totals))
    }

    fn update_status(
        &self,
        id: InvoiceId,
        status: InvoiceStatus,
        paid_at: Option<NaiveDate>,
    ) -> Result<bool>;

    /// Delete an invoice and every line item it owns
    fn delete_invoice(&self, id: InvoiceId) -> Result<bool>;

    /// Highest existing number starting with `prefix`, in numeric order
    fn max_number_with_prefix(&self, prefix: &str) -> Result<Option<String>>;

    /// Atomically bump and return the per-period counter for `prefix`
    fn next_period_sequence(&self, prefix: &str) -> Result<u32>;

    fn insert_item(&self, invoice_id: InvoiceId, item: &NewLineItem) -> Result<LineItem>;

    fn update_item(&self, item_id: LineItemId, patch: &LineItemPatch) -> Result<LineItem>;

    /// Remove a line item, returning what was removed
    fn delete_item(&self, item_id: LineItemId) -> Result<LineItem>;

    /// Items of an invoice in insertion order
    fn list_items(&self, invoice_id: InvoiceId) -> Result<Vec<LineItem>>;
}
