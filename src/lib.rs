pub mod config;
pub mod error;
pub mod invoice;
pub mod model;
pub mod money;
pub mod numbering;
pub mod render;
pub mod service;
pub mod store;
pub mod totals;

pub use config::{CatalogItem, Company, Config, Customer};
pub use error::{BillingError, Result};
pub use invoice::InvoiceDocument;
pub use model::{
    Invoice, InvoiceDraft, InvoiceEdit, InvoiceStatus, LineItem, LineItemPatch, NewLineItem,
};
pub use numbering::NumberingStrategy;
pub use service::{Billing, BillingSettings, InvoiceFilter};
pub use store::{FileStore, InvoiceStore, MemoryStore};
pub use totals::Totals;
