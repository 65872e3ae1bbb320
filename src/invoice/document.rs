use rust_decimal::Decimal;
use serde::{Serialize, Serializer};

use crate::config::Company;
use crate::model::{Invoice, InvoiceStatus, LineItem};
use crate::money::round2;
use crate::totals::Totals;

/// Money goes out as a two-decimal string so renderers never reformat it
fn cents<S: Serializer>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("{:.2}", round2(*value)))
}

/// A line as printed on the document
#[derive(Debug, Serialize)]
pub struct DocumentLine {
    pub position: usize,
    pub description: String,
    pub qty: Decimal,
    #[serde(serialize_with = "cents")]
    pub unit_price: Decimal,
    #[serde(serialize_with = "cents")]
    pub line_total: Decimal,
}

/// Fully materialized invoice handed to renderers
#[derive(Debug, Serialize)]
pub struct InvoiceDocument {
    pub number: String,
    pub status: InvoiceStatus,
    pub currency: String,
    pub issued_at: String,
    pub due_at: Option<String>,
    pub paid_at: Option<String>,
    pub company: Company,
    pub customer: String,
    pub customer_email: Option<String>,
    pub notes: String,
    pub items: Vec<DocumentLine>,
    #[serde(serialize_with = "cents")]
    pub subtotal: Decimal,
    #[serde(serialize_with = "cents")]
    pub tax_rate: Decimal,
    #[serde(serialize_with = "cents")]
    pub tax_amount: Decimal,
    #[serde(serialize_with = "cents")]
    pub total: Decimal,
}

impl InvoiceDocument {
    /// Subtotal and tax come from the items; the total is the invoice's cached amount
    pub fn build(company: &Company, invoice: &Invoice, items: &[LineItem]) -> Self {
        let totals = Totals::compute(items, invoice.tax_rate);
        let fmt_date = |d: chrono::NaiveDate| d.format("%d %b %Y").to_string();

        Self {
            number: invoice.number.clone(),
            status: invoice.status,
            currency: invoice.currency.clone(),
            issued_at: fmt_date(invoice.issued_at),
            due_at: invoice.due_at.map(fmt_date),
            paid_at: invoice.paid_at.map(fmt_date),
            company: company.clone(),
            customer: invoice.customer.clone(),
            customer_email: invoice.customer_email.clone(),
            notes: invoice.notes.clone(),
            items: items
                .iter()
                .enumerate()
                .map(|(idx, item)| DocumentLine {
                    position: idx + 1,
                    description: item.description.clone(),
                    qty: item.qty,
                    unit_price: item.unit_price,
                    line_total: item.line_total(),
                })
                .collect(),
            subtotal: totals.subtotal,
            tax_rate: invoice.tax_rate,
            tax_amount: totals.tax_amount,
            total: invoice.amount,
        }
    }
}
