//! Invoice operations. Every item mutation calls the cached-total
//! maintainer directly before returning, so readers can trust `amount`.

use chrono::{Local, NaiveDate};
use tracing::{info, warn};

use crate::config::Company;
use crate::error::{BillingError, Result};
use crate::invoice::InvoiceDocument;
use crate::model::{
    check_dates, Invoice, InvoiceDraft, InvoiceEdit, InvoiceId, InvoiceStatus, LineItem,
    LineItemId, LineItemPatch, NewLineItem,
};
use crate::numbering::{self, period_prefix, NumberingStrategy};
use crate::store::InvoiceStore;
use crate::totals::{recompute_cached_total, Totals};

#[derive(Debug, Clone, Copy)]
pub struct BillingSettings {
    pub numbering: NumberingStrategy,
    /// Attempts at persisting a new invoice; at least one is always made
    pub max_attempts: u32,
}

impl Default for BillingSettings {
    fn default() -> Self {
        Self {
            numbering: NumberingStrategy::Scan,
            max_attempts: 5,
        }
    }
}

/// Search criteria for [`Billing::search`]
#[derive(Debug, Clone, Default)]
pub struct InvoiceFilter {
    /// Case-insensitive substring of number, customer name or email
    pub query: Option<String>,
    pub status: Option<InvoiceStatus>,
}

impl InvoiceFilter {
    fn matches(&self, invoice: &Invoice) -> bool {
        if self.status.is_some_and(|status| status != invoice.status) {
            return false;
        }
        let Some(query) = self.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) else {
            return true;
        };
        let needle = query.to_lowercase();
        invoice.number.to_lowercase().contains(&needle)
            || invoice.customer.to_lowercase().contains(&needle)
            || invoice
                .customer_email
                .as_deref()
                .is_some_and(|email| email.to_lowercase().contains(&needle))
    }
}

pub struct Billing<S> {
    store: S,
    settings: BillingSettings,
}

impl<S: InvoiceStore> Billing<S> {
    pub fn new(store: S, settings: BillingSettings) -> Self {
        Self { store, settings }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Number, persist, attach items, then cache the total.
    ///
    /// A number taken by a concurrent creation is recomputed and retried up
    /// to `max_attempts` times before `DuplicateNumber` is returned.
    pub fn create_invoice(&self, draft: InvoiceDraft, items: &[NewLineItem]) -> Result<Invoice> {
        let mut draft = draft.validate()?;
        for item in items {
            item.validate()?;
        }
        let issued_at = *draft
            .issued_at
            .get_or_insert_with(|| Local::now().date_naive());

        let attempts = self.settings.max_attempts.max(1);
        let mut attempt = 1;
        let invoice = loop {
            let number = numbering::next_number(&self.store, self.settings.numbering, issued_at)?;
            match self.store.create_invoice(&number, &draft) {
                Ok(invoice) => break invoice,
                Err(BillingError::DuplicateNumber(taken)) if attempt < attempts => {
                    warn!(number = %taken, attempt, "invoice number taken, retrying");
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        };

        for item in items {
            self.store.insert_item(invoice.id, item)?;
        }
        recompute_cached_total(&self.store, invoice.id)?;

        let invoice = self.get(invoice.id)?;
        info!(
            number = %invoice.number,
            customer = %invoice.customer,
            items = items.len(),
            amount = %invoice.amount,
            "invoice created"
        );
        Ok(invoice)
    }

    pub fn get(&self, id: InvoiceId) -> Result<Invoice> {
        self.store
            .get_invoice(id)?
            .ok_or_else(|| BillingError::InvoiceNotFound(id.to_string()))
    }

    /// Look up by invoice number, falling back to the numeric id
    pub fn find(&self, reference: &str) -> Result<Invoice> {
        let reference = reference.trim();
        if let Some(invoice) = self.store.find_by_number(reference)? {
            return Ok(invoice);
        }
        if let Ok(id) = reference.trim_start_matches('#').parse::<InvoiceId>() {
            if let Some(invoice) = self.store.get_invoice(id)? {
                return Ok(invoice);
            }
        }
        Err(BillingError::InvoiceNotFound(reference.to_string()))
    }

    /// Matching invoices, newest first
    pub fn search(&self, filter: &InvoiceFilter) -> Result<Vec<Invoice>> {
        Ok(self
            .store
            .list_invoices()?
            .into_iter()
            .filter(|invoice| filter.matches(invoice))
            .collect())
    }

    pub fn items(&self, invoice_id: InvoiceId) -> Result<Vec<LineItem>> {
        self.store.list_items(invoice_id)
    }

    /// Item at 1-based `position` within an invoice
    pub fn item_at(&self, invoice_id: InvoiceId, position: usize) -> Result<LineItem> {
        let items = self.store.list_items(invoice_id)?;
        position
            .checked_sub(1)
            .and_then(|idx| items.into_iter().nth(idx))
            .ok_or_else(|| BillingError::LineItemNotFound(format!("#{position}")))
    }

    pub fn add_item(&self, invoice_id: InvoiceId, item: &NewLineItem) -> Result<LineItem> {
        item.validate()?;
        let stored = self.store.insert_item(invoice_id, item)?;
        recompute_cached_total(&self.store, invoice_id)?;
        Ok(stored)
    }

    pub fn update_item(&self, item_id: LineItemId, patch: &LineItemPatch) -> Result<LineItem> {
        patch.validate()?;
        let stored = self.store.update_item(item_id, patch)?;
        recompute_cached_total(&self.store, stored.invoice_id)?;
        Ok(stored)
    }

    pub fn remove_item(&self, item_id: LineItemId) -> Result<LineItem> {
        let removed = self.store.delete_item(item_id)?;
        recompute_cached_total(&self.store, removed.invoice_id)?;
        Ok(removed)
    }

    /// Change header fields, then recompute the cached total since the tax
    /// rate may have moved. The invoice keeps its number.
    pub fn update_invoice(&self, invoice_id: InvoiceId, edit: InvoiceEdit) -> Result<Invoice> {
        let edit = edit.validate()?;
        let mut merged = self.get(invoice_id)?;
        edit.apply(&mut merged);
        check_dates(merged.issued_at, merged.due_at)?;

        let updated = self
            .store
            .update_invoice_fields(invoice_id, &edit)?
            .ok_or_else(|| BillingError::InvoiceNotFound(invoice_id.to_string()))?;
        recompute_cached_total(&self.store, invoice_id)?;

        info!(number = %updated.number, "invoice updated");
        self.get(invoice_id)
    }

    /// Recompute the cached total on demand; `None` if the invoice is gone
    pub fn recalculate(&self, invoice_id: InvoiceId) -> Result<Option<Totals>> {
        recompute_cached_total(&self.store, invoice_id)
    }

    /// Move an invoice along the status machine. Paying records `on` as the payment date.
    pub fn transition(&self, invoice_id: InvoiceId, to: InvoiceStatus, on: NaiveDate) -> Result<Invoice> {
        let invoice = self.get(invoice_id)?;
        if !invoice.status.can_transition_to(to) {
            return Err(BillingError::InvalidTransition {
                number: invoice.number,
                from: invoice.status,
                to,
            });
        }

        let paid_at = if to == InvoiceStatus::Paid {
            Some(on)
        } else {
            invoice.paid_at
        };
        if !self.store.update_status(invoice_id, to, paid_at)? {
            return Err(BillingError::InvoiceNotFound(invoice.number));
        }

        info!(number = %invoice.number, from = %invoice.status, to = %to, "invoice status changed");
        self.get(invoice_id)
    }

    /// Delete an invoice together with its items
    pub fn delete_invoice(&self, invoice_id: InvoiceId) -> Result<Invoice> {
        let invoice = self.get(invoice_id)?;
        if !self.store.delete_invoice(invoice_id)? {
            return Err(BillingError::InvoiceNotFound(invoice.number));
        }
        info!(number = %invoice.number, "invoice deleted");
        Ok(invoice)
    }

    /// Everything a renderer needs for one invoice, issued by `company`
    pub fn document(&self, invoice_id: InvoiceId, company: &Company) -> Result<InvoiceDocument> {
        let invoice = self.get(invoice_id)?;
        let items = self.store.list_items(invoice_id)?;
        Ok(InvoiceDocument::build(company, &invoice, &items))
    }

    /// Number the next invoice of `date`'s month would receive. Reserves nothing.
    pub fn preview_number(&self, date: NaiveDate) -> Result<String> {
        let prefix = period_prefix(date);
        let last = self.store.max_number_with_prefix(&prefix)?;
        Ok(numbering::format_number(
            &prefix,
            numbering::sequence_after(last.as_deref(), &prefix),
        ))
    }
}
