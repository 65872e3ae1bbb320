use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{check_amount, max_tax_rate, InvoiceStatus};
use crate::error::{BillingError, Result};

pub type InvoiceId = u64;

/// A stored invoice. `amount` is the cached total of its line items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub number: String,
    pub customer: String,
    #[serde(default)]
    pub customer_email: Option<String>,
    pub status: InvoiceStatus,
    pub currency: String,
    pub tax_rate: Decimal,
    pub issued_at: NaiveDate,
    #[serde(default)]
    pub due_at: Option<NaiveDate>,
    #[serde(default)]
    pub paid_at: Option<NaiveDate>,
    #[serde(default)]
    pub notes: String,
    pub amount: Decimal,
}

impl Invoice {
    /// Build the stored form of a draft. Status starts at Draft and the cached total at zero.
    pub fn from_draft(id: InvoiceId, number: String, draft: &InvoiceDraft, issued_at: NaiveDate) -> Self {
        Self {
            id,
            number,
            customer: draft.customer.clone(),
            customer_email: draft.customer_email.clone(),
            status: InvoiceStatus::Draft,
            currency: draft.currency.clone(),
            tax_rate: draft.tax_rate,
            issued_at,
            due_at: draft.due_at,
            paid_at: None,
            notes: draft.notes.clone(),
            amount: Decimal::ZERO,
        }
    }
}

/// Caller-supplied fields for a new invoice
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceDraft {
    pub customer: String,
    pub customer_email: Option<String>,
    pub currency: String,
    pub tax_rate: Decimal,
    /// Defaults to the processing date when unset
    pub issued_at: Option<NaiveDate>,
    pub due_at: Option<NaiveDate>,
    pub notes: String,
}

impl InvoiceDraft {
    pub fn new(customer: impl Into<String>, currency: impl Into<String>) -> Self {
        Self {
            customer: customer.into(),
            customer_email: None,
            currency: currency.into(),
            tax_rate: Decimal::ZERO,
            issued_at: None,
            due_at: None,
            notes: String::new(),
        }
    }

    pub fn with_tax_rate(mut self, tax_rate: Decimal) -> Self {
        self.tax_rate = tax_rate;
        self
    }

    pub fn issued_on(mut self, date: NaiveDate) -> Self {
        self.issued_at = Some(date);
        self
    }

    /// Check field constraints and normalize the currency to uppercase
    pub fn validate(mut self) -> Result<Self> {
        self.currency = normalize_currency(&self.currency)?;
        check_amount("tax rate", self.tax_rate, max_tax_rate())?;
        if let Some(issued) = self.issued_at {
            check_dates(issued, self.due_at)?;
        }
        Ok(self)
    }
}

/// Header changes to an existing invoice; `None` keeps the current value.
/// The number and status are not editable here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvoiceEdit {
    pub customer: Option<String>,
    pub customer_email: Option<String>,
    pub currency: Option<String>,
    pub tax_rate: Option<Decimal>,
    pub issued_at: Option<NaiveDate>,
    pub due_at: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl InvoiceEdit {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Check the edited fields on their own and normalize the currency
    pub fn validate(mut self) -> Result<Self> {
        if let Some(currency) = &self.currency {
            self.currency = Some(normalize_currency(currency)?);
        }
        if let Some(tax_rate) = self.tax_rate {
            check_amount("tax rate", tax_rate, max_tax_rate())?;
        }
        Ok(self)
    }

    pub fn apply(&self, invoice: &mut Invoice) {
        if let Some(customer) = &self.customer {
            invoice.customer = customer.clone();
        }
        if let Some(email) = &self.customer_email {
            invoice.customer_email = Some(email.clone());
        }
        if let Some(currency) = &self.currency {
            invoice.currency = currency.clone();
        }
        if let Some(tax_rate) = self.tax_rate {
            invoice.tax_rate = tax_rate;
        }
        if let Some(issued_at) = self.issued_at {
            invoice.issued_at = issued_at;
        }
        if let Some(due_at) = self.due_at {
            invoice.due_at = Some(due_at);
        }
        if let Some(notes) = &self.notes {
            invoice.notes = notes.clone();
        }
    }
}

/// Due date must not precede the issue date
pub(crate) fn check_dates(issued_at: NaiveDate, due_at: Option<NaiveDate>) -> Result<()> {
    match due_at {
        Some(due) if due < issued_at => Err(BillingError::InvalidDate(format!(
            "{due} (due date is before issue date {issued_at})"
        ))),
        _ => Ok(()),
    }
}

/// Currency codes are 3+ ASCII letters, stored uppercase
pub fn normalize_currency(raw: &str) -> Result<String> {
    let code = raw.trim();
    if code.len() < 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(BillingError::InvalidCurrency(raw.to_string()));
    }
    Ok(code.to_ascii_uppercase())
}
