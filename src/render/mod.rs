//! Document renderers. Callers try them in order and keep the first that works.

mod text;
mod typst;

pub use text::TextRenderer;
pub use typst::TypstRenderer;

use tracing::warn;

use crate::error::{BillingError, Result};
use crate::invoice::InvoiceDocument;

pub trait Renderer {
    fn name(&self) -> &'static str;

    /// File extension of the produced bytes
    fn extension(&self) -> &'static str;

    fn render(&self, document: &InvoiceDocument) -> Result<Vec<u8>>;
}

/// Output of the first renderer that succeeded
#[derive(Debug)]
pub struct Rendition {
    pub renderer: &'static str,
    pub extension: &'static str,
    pub bytes: Vec<u8>,
}

/// Renderers in preference order: Typst PDF, then plain text
pub fn default_renderers() -> Vec<Box<dyn Renderer>> {
    vec![Box::new(TypstRenderer), Box::new(TextRenderer)]
}

pub fn render_first_available(
    renderers: &[Box<dyn Renderer>],
    document: &InvoiceDocument,
) -> Result<Rendition> {
    for renderer in renderers {
        match renderer.render(document) {
            Ok(bytes) => {
                return Ok(Rendition {
                    renderer: renderer.name(),
                    extension: renderer.extension(),
                    bytes,
                })
            }
            Err(e) => {
                warn!(renderer = renderer.name(), number = %document.number, error = %e, "renderer failed, trying next");
            }
        }
    }
    Err(BillingError::NoRenderer(document.number.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Company;
    use crate::model::{Invoice, InvoiceDraft, LineItem};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    struct Broken;

    impl Renderer for Broken {
        fn name(&self) -> &'static str {
            "broken"
        }

        fn extension(&self) -> &'static str {
            "bin"
        }

        fn render(&self, _document: &InvoiceDocument) -> Result<Vec<u8>> {
            Err(BillingError::Render("no output".to_string()))
        }
    }

    fn document() -> InvoiceDocument {
        let company = Company {
            name: "AeroLogicTech".to_string(),
            address: "1 Terminal Road".to_string(),
            city: "Lisbon".to_string(),
            zip: "1700-111".to_string(),
            country: "Portugal".to_string(),
            email: "billing@aerologictech.example".to_string(),
            phone: None,
            tax_id: None,
        };
        let draft = InvoiceDraft::new("Jane Traveller", "EUR").with_tax_rate(dec!(20.00));
        let issued = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        let mut invoice = Invoice::from_draft(1, "INV-202503-0001".to_string(), &draft, issued);
        invoice.amount = dec!(30.60);
        let items = [
            LineItem {
                id: 1,
                invoice_id: 1,
                description: "Chauffeur service".to_string(),
                qty: dec!(2),
                unit_price: dec!(10.00),
            },
            LineItem {
                id: 2,
                invoice_id: 1,
                description: "Parking".to_string(),
                qty: dec!(1),
                unit_price: dec!(5.50),
            },
        ];
        InvoiceDocument::build(&company, &invoice, &items)
    }

    #[test]
    fn falls_back_past_failing_renderers() {
        let renderers: Vec<Box<dyn Renderer>> = vec![Box::new(Broken), Box::new(TextRenderer)];
        let rendition = render_first_available(&renderers, &document()).unwrap();

        assert_eq!(rendition.renderer, "text");
        assert_eq!(rendition.extension, "txt");
        let text = String::from_utf8(rendition.bytes).unwrap();
        assert!(text.contains("INVOICE INV-202503-0001"));
        assert!(text.contains("Chauffeur service"));
        assert!(text.contains("30.60 EUR"));
    }

    #[test]
    fn reports_when_nothing_renders() {
        let renderers: Vec<Box<dyn Renderer>> = vec![Box::new(Broken)];
        let err = render_first_available(&renderers, &document()).unwrap_err();
        assert!(matches!(err, BillingError::NoRenderer(n) if n == "INV-202503-0001"));
    }
}
