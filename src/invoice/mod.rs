mod document;
mod input;

pub use document::{DocumentLine, InvoiceDocument};
pub use input::{parse_date, parse_decimal, parse_item_spec};
