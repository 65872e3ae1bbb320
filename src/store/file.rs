use chrono::NaiveDate;
use fs4::fs_std::FileExt;
use rust_decimal::Decimal;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use super::{InvoiceStore, Ledger};
use crate::error::{BillingError, Result};
use crate::model::{
    Invoice, InvoiceDraft, InvoiceEdit, InvoiceId, InvoiceStatus, LineItem, LineItemId,
    LineItemPatch, NewLineItem,
};
use crate::totals::Totals;

/// Ledger persisted as TOML.
///
/// Every call takes an advisory lock on a `<ledger>.lock` file next to the
/// ledger: shared for reads, exclusive for load-mutate-save. The lock holds
/// across processes, so concurrent CLI runs serialize their writes and a
/// duplicate number is rejected instead of overwriting another run's invoice.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock_path: PathBuf,
}

impl FileStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut lock_name = path
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("ledger"));
        lock_name.push(".lock");
        let lock_path = path.with_file_name(lock_name);
        Self { path, lock_path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Snapshot of the ledger; a missing file is an empty ledger
    pub fn load(&self) -> Result<Ledger> {
        self.read(Ledger::clone)
    }

    fn lock_file(&self) -> Result<File> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.lock_path)?;
        Ok(file)
    }

    fn load_unlocked(&self) -> Result<Ledger> {
        if !self.path.exists() {
            return Ok(Ledger::default());
        }
        let content = fs::read_to_string(&self.path)?;
        toml::from_str(&content).map_err(|e| BillingError::LedgerParse {
            path: self.path.clone(),
            source: e,
        })
    }

    /// Write to a fresh temp file beside the ledger, then rename over it
    fn save_unlocked(&self, ledger: &Ledger) -> Result<()> {
        let content = toml::to_string_pretty(ledger)?;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }

    fn read<T>(&self, f: impl FnOnce(&Ledger) -> T) -> Result<T> {
        let lock = self.lock_file()?;
        FileExt::lock_shared(&lock)?;
        let ledger = self.load_unlocked()?;
        Ok(f(&ledger))
    }

    fn write<T>(&self, f: impl FnOnce(&mut Ledger) -> Result<T>) -> Result<T> {
        let lock = self.lock_file()?;
        FileExt::lock_exclusive(&lock)?;
        let mut ledger = self.load_unlocked()?;
        let out = f(&mut ledger)?;
        self.save_unlocked(&ledger)?;
        Ok(out)
    }
}

impl InvoiceStore for FileStore {
    fn create_invoice(&self, number: &str, draft: &InvoiceDraft) -> Result<Invoice> {
        self.write(|ledger| ledger.create_invoice(number, draft))
    }

    fn get_invoice(&self, id: InvoiceId) -> Result<Option<Invoice>> {
        self.read(|ledger| ledger.get_invoice(id))
    }

    fn find_by_number(&self, number: &str) -> Result<Option<Invoice>> {
        self.read(|ledger| ledger.find_by_number(number))
    }

    fn list_invoices(&self) -> Result<Vec<Invoice>> {
        self.read(Ledger::list_invoices)
    }

    fn update_invoice_amount(&self, id: InvoiceId, amount: Decimal) -> Result<bool> {
        self.write(|ledger| Ok(ledger.update_invoice_amount(id, amount)))
    }

    fn update_invoice_fields(&self, id: InvoiceId, edit: &InvoiceEdit) -> Result<Option<Invoice>> {
        self.write(|ledger| Ok(ledger.update_invoice_fields(id, edit)))
    }

    fn recompute_amount(&self, id: InvoiceId) -> Result<Option<Totals>> {
        self.write(|ledger| Ok(ledger.recompute_amount(id)))
    }

    fn update_status(
        &self,
        id: InvoiceId,
        status: InvoiceStatus,
        paid_at: Option<NaiveDate>,
    ) -> Result<bool> {
        self.write(|ledger| Ok(ledger.update_status(id, status, paid_at)))
    }

    fn delete_invoice(&self, id: InvoiceId) -> Result<bool> {
        self.write(|ledger| Ok(ledger.delete_invoice(id)))
    }

    fn max_number_with_prefix(&self, prefix: &str) -> Result<Option<String>> {
        self.read(|ledger| ledger.max_number_with_prefix(prefix))
    }

    fn next_period_sequence(&self, prefix: &str) -> Result<u32> {
        self.write(|ledger| Ok(ledger.next_period_sequence(prefix)))
    }

    fn insert_item(&self, invoice_id: InvoiceId, item: &NewLineItem) -> Result<LineItem> {
        self.write(|ledger| ledger.insert_item(invoice_id, item))
    }

    fn update_item(&self, item_id: LineItemId, patch: &LineItemPatch) -> Result<LineItem> {
        self.write(|ledger| ledger.update_item(item_id, patch))
    }

    fn delete_item(&self, item_id: LineItemId) -> Result<LineItem> {
        self.write(|ledger| ledger.delete_item(item_id))
    }

    fn list_items(&self, invoice_id: InvoiceId) -> Result<Vec<LineItem>> {
        self.read(|ledger| ledger.list_items(invoice_id))
    }
}
