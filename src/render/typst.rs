use std::fs;
use std::process::Command;

use super::Renderer;
use crate::error::{BillingError, Result};
use crate::invoice::InvoiceDocument;

/// Embedded Typst template. Money fields arrive pre-formatted with two decimals.
const INVOICE_TEMPLATE: &str = r##"// Invoice Template
// Data is loaded from JSON file

#let data = json("DATA_JSON_PATH")

#set page(
  paper: "a4",
  margin: (top: 20mm, bottom: 20mm, left: 18mm, right: 18mm),
)

#set text(font: "Helvetica", size: 10pt)

#let money(amount) = amount + " " + data.currency

// Header with company info and invoice details
#grid(
  columns: (1fr, 1fr),
  align: (left, right),
  [
    #text(size: 18pt, weight: "bold")[#data.company.name]
    #v(0.3em)
    #data.company.address \
    #data.company.zip #data.company.city, #data.company.country \
    #data.company.email
    #if data.company.phone != none [
      \ #data.company.phone
    ]
  ],
  [
    #text(size: 24pt, weight: "bold")[INVOICE]
    #v(0.5em)
    #table(
      columns: (auto, auto),
      stroke: none,
      align: (right, left),
      inset: 2pt,
      [*Invoice \#:*], [#data.number],
      [*Issue date:*], [#data.issued_at],
      [*Due date:*], [#if data.due_at != none { data.due_at } else { "-" }],
      [*Status:*], [#data.status],
    )
  ]
)

#v(1em)
#line(length: 100%, stroke: 0.5pt + gray)
#v(1em)

#text(weight: "bold", size: 11pt)[Billed to:]
#v(0.3em)
#text(weight: "bold")[#data.customer]
#if data.customer_email != none [
  \ #data.customer_email
]

#v(1.5em)

#table(
  columns: (auto, 1fr, auto, auto, auto),
  align: (center, left, right, right, right),
  stroke: (x, y) => if y == 0 { (bottom: 1pt + black) } else if y > 0 { (bottom: 0.5pt + gray) },
  inset: 8pt,
  fill: (x, y) => if y == 0 { rgb("#e8f0fb") } else { none },

  [*No*], [*Description*], [*Qty*], [*Unit price*], [*Total*],

  ..data.items.map(item => (
    str(item.position),
    item.description,
    str(item.qty),
    money(item.unit_price),
    money(item.line_total),
  )).flatten()
)

#v(1em)

#align(right)[
  #table(
    columns: (auto, auto),
    stroke: none,
    align: (right, right),
    inset: 6pt,

    [Subtotal:], [#money(data.subtotal)],
    [Tax (#data.tax_rate%):], [#money(data.tax_amount)],
    table.hline(stroke: 1pt),
    [*Grand Total:*], [*#money(data.total)*],
  )
]

#if data.notes != "" [
  #v(1em)
  #text(weight: "bold")[Note:] #data.notes
]

#if data.company.tax_id != none [
  #v(0.5em)
  #text(size: 9pt, fill: gray)[Tax ID: #data.company.tax_id]
]
"##;

/// Compiles the document with the `typst` CLI
#[derive(Debug, Default)]
pub struct TypstRenderer;

impl Renderer for TypstRenderer {
    fn name(&self) -> &'static str {
        "typst"
    }

    fn extension(&self) -> &'static str {
        "pdf"
    }

    fn render(&self, document: &InvoiceDocument) -> Result<Vec<u8>> {
        if Command::new("typst").arg("--version").output().is_err() {
            return Err(BillingError::TypstNotFound);
        }

        let temp_dir = std::env::temp_dir().join(format!("aerobill-{}", std::process::id()));
        fs::create_dir_all(&temp_dir)?;

        let json_data =
            serde_json::to_string(document).map_err(|e| BillingError::Render(e.to_string()))?;
        let json_path = temp_dir.join("data.json");
        fs::write(&json_path, json_data)?;

        let template_path = temp_dir.join("invoice.typ");
        fs::write(&template_path, INVOICE_TEMPLATE.replace("DATA_JSON_PATH", "data.json"))?;

        let pdf_path = temp_dir.join("invoice.pdf");
        let output = Command::new("typst")
            .arg("compile")
            .arg("--root")
            .arg(&temp_dir)
            .arg(&template_path)
            .arg(&pdf_path)
            .output()?;

        if !output.status.success() {
            let _ = fs::remove_dir_all(&temp_dir);
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BillingError::Render(stderr.to_string()));
        }

        let bytes = fs::read(&pdf_path)?;
        let _ = fs::remove_dir_all(&temp_dir);
        Ok(bytes)
    }
}
