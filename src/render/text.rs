use std::fmt::Write;

use super::Renderer;
use crate::error::{BillingError, Result};
use crate::invoice::InvoiceDocument;
use crate::money::format_money;

/// Plain-text rendition; always available
#[derive(Debug, Default)]
pub struct TextRenderer;

impl TextRenderer {
    fn write_document(document: &InvoiceDocument, out: &mut String) -> std::fmt::Result {
        let money = |value| format_money(value, &document.currency);

        writeln!(out, "{}", document.company.name)?;
        writeln!(out, "{}", document.company.address)?;
        writeln!(
            out,
            "{} {}, {}",
            document.company.zip, document.company.city, document.company.country
        )?;
        writeln!(out, "{}", document.company.email)?;
        writeln!(out)?;
        writeln!(out, "INVOICE {}", document.number)?;
        writeln!(out, "Billed to:   {}", document.customer)?;
        if let Some(email) = &document.customer_email {
            writeln!(out, "             {email}")?;
        }
        writeln!(out, "Issue date:  {}", document.issued_at)?;
        writeln!(out, "Due date:    {}", document.due_at.as_deref().unwrap_or("-"))?;
        if let Some(paid_at) = &document.paid_at {
            writeln!(out, "Paid on:     {paid_at}")?;
        }
        writeln!(out, "Status:      {}", document.status)?;
        writeln!(out)?;

        writeln!(
            out,
            "{:<4}{:<36}{:>10}{:>18}{:>18}",
            "No", "Description", "Qty", "Unit price", "Total"
        )?;
        for line in &document.items {
            writeln!(
                out,
                "{:<4}{:<36}{:>10}{:>18}{:>18}",
                format!("{:02}", line.position),
                line.description,
                format!("{:.2}", line.qty),
                money(line.unit_price),
                money(line.line_total),
            )?;
        }
        writeln!(out)?;

        writeln!(out, "{:>68}{:>18}", "Subtotal:", money(document.subtotal))?;
        writeln!(
            out,
            "{:>68}{:>18}",
            format!("Tax ({:.2}%):", document.tax_rate),
            money(document.tax_amount)
        )?;
        writeln!(out, "{:>68}{:>18}", "Grand Total:", money(document.total))?;

        if !document.notes.is_empty() {
            writeln!(out)?;
            writeln!(out, "Note: {}", document.notes)?;
        }
        if let Some(tax_id) = &document.company.tax_id {
            writeln!(out, "Tax ID: {tax_id}")?;
        }
        Ok(())
    }
}

impl Renderer for TextRenderer {
    fn name(&self) -> &'static str {
        "text"
    }

    fn extension(&self) -> &'static str {
        "txt"
    }

    fn render(&self, document: &InvoiceDocument) -> Result<Vec<u8>> {
        let mut out = String::new();
        Self::write_document(document, &mut out).map_err(|e| BillingError::Render(e.to_string()))?;
        Ok(out.into_bytes())
    }
}
