use std::path::PathBuf;
use thiserror::Error;

use crate::model::InvoiceStatus;

#[derive(Error, Debug)]
pub enum BillingError {
    #[error("Config directory not found at {0}. Run 'aerobill init' to create it.")]
    ConfigNotFound(PathBuf),

    #[error("Config file not found: {0}")]
    ConfigFileNotFound(PathBuf),

    #[error("Failed to parse config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to read ledger {path}: {source}")]
    LedgerParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to write ledger: {0}")]
    LedgerWrite(#[from] toml::ser::Error),

    #[error("Config directory already exists at {0}")]
    AlreadyInitialized(PathBuf),

    #[error("Customer '{0}' not found in customers.toml")]
    CustomerNotFound(String),

    #[error("Service '{0}' not found in catalog.toml")]
    CatalogItemNotFound(String),

    #[error(
        "Invalid item format '{0}'. Expected 'service:qty' or 'description:qty:unit_price'"
    )]
    InvalidItemFormat(String),

    #[error("Invalid {field} '{value}': {reason}")]
    InvalidAmount {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("Invalid currency '{0}'. Use letters only (e.g., EUR, USD).")]
    InvalidCurrency(String),

    #[error("Invalid date '{0}'. Expected YYYY-MM-DD.")]
    InvalidDate(String),

    #[error("Invoice '{0}' not found")]
    InvoiceNotFound(String),

    #[error("Line item {0} not found")]
    LineItemNotFound(String),

    #[error("Invoice number {0} is already taken")]
    DuplicateNumber(String),

    #[error("Invoice {number} cannot move from {from} to {to}")]
    InvalidTransition {
        number: String,
        from: InvoiceStatus,
        to: InvoiceStatus,
    },

    #[error("Typst not found. Install it from https://typst.app/ or run: cargo install typst-cli")]
    TypstNotFound,

    #[error("Failed to render document: {0}")]
    Render(String),

    #[error("No renderer could produce a document for {0}")]
    NoRenderer(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BillingError>;
