use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A billable service with a list price
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CatalogItem {
    pub description: String,
    pub unit_price: Decimal,
    pub unit: String,
}
