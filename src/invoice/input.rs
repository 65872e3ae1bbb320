use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;

use crate::config::CatalogItem;
use crate::error::{BillingError, Result};
use crate::model::NewLineItem;

/// Parse a decimal amount typed by the user
pub fn parse_decimal(field: &'static str, raw: &str) -> Result<Decimal> {
    Decimal::from_str(raw.trim()).map_err(|_| BillingError::InvalidAmount {
        field,
        value: raw.to_string(),
        reason: "must be a number".to_string(),
    })
}

/// Parse a YYYY-MM-DD date
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| BillingError::InvalidDate(raw.to_string()))
}

/// Parse an item argument.
///
/// `service:qty` takes description and price from the catalog;
/// `description:qty:unit_price` is a free-form line.
pub fn parse_item_spec(input: &str, catalog: &HashMap<String, CatalogItem>) -> Result<NewLineItem> {
    let parts: Vec<&str> = input.rsplitn(3, ':').collect();

    match parts.as_slice() {
        [qty, service] => {
            let service = service.trim();
            let entry = catalog
                .get(service)
                .ok_or_else(|| BillingError::CatalogItemNotFound(service.to_string()))?;
            Ok(NewLineItem::new(
                entry.description.clone(),
                parse_decimal("quantity", qty)?,
                entry.unit_price,
            ))
        }
        [unit_price, qty, description] if !description.trim().is_empty() => Ok(NewLineItem::new(
            description.trim(),
            parse_decimal("quantity", qty)?,
            parse_decimal("unit price", unit_price)?,
        )),
        _ => Err(BillingError::InvalidItemFormat(input.to_string())),
    }
}
