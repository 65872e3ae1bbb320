use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::numbering::NumberingStrategy;

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    pub company: Company,
    #[serde(default)]
    pub invoice: InvoiceSettings,
    #[serde(default)]
    pub pdf: PdfSettings,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Company {
    pub name: String,
    pub address: String,
    pub city: String,
    pub zip: String,
    pub country: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub tax_id: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct InvoiceSettings {
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Percentage, e.g. 20.00 for 20%
    #[serde(default)]
    pub tax_rate: Decimal,
    /// Days after issue for the default due date; 0 leaves it unset
    #[serde(default)]
    pub due_days: u32,
    #[serde(default)]
    pub numbering: NumberingStrategy,
    /// Attempts at persisting a new invoice before a duplicate number is reported
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for InvoiceSettings {
    fn default() -> Self {
        Self {
            currency: default_currency(),
            tax_rate: Decimal::ZERO,
            due_days: 0,
            numbering: NumberingStrategy::default(),
            max_attempts: default_max_attempts(),
        }
    }
}

fn default_currency() -> String {
    "EUR".to_string()
}

fn default_max_attempts() -> u32 {
    5
}

#[derive(Debug, Deserialize, Serialize)]
pub struct PdfSettings {
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

impl Default for PdfSettings {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> String {
    "output".to_string()
}
