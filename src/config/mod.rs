mod catalog;
mod company;
mod customer;

pub use catalog::CatalogItem;
pub use company::{Company, Config, InvoiceSettings, PdfSettings};
pub use customer::Customer;

use crate::error::{BillingError, Result};
use directories::ProjectDirs;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Get the config directory path (XDG config dir, or ~/.aerobill/)
pub fn config_dir() -> Result<PathBuf> {
    if let Some(proj_dirs) = ProjectDirs::from("", "", "aerobill") {
        return Ok(proj_dirs.config_dir().to_path_buf());
    }

    let home = dirs_home().ok_or_else(|| {
        BillingError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Could not determine home directory",
        ))
    })?;

    Ok(home.join(".aerobill"))
}

fn dirs_home() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

/// Expand ~ in paths
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs_home() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Output directory for rendered documents; relative paths live under the config dir
pub fn resolve_output_dir(output_dir: &str, config_dir: &Path) -> PathBuf {
    let path = expand_path(output_dir);
    if path.is_absolute() {
        path
    } else {
        config_dir.join(path)
    }
}

/// Location of the invoice ledger inside the config dir
pub fn ledger_path(config_dir: &Path) -> PathBuf {
    config_dir.join("ledger.toml")
}

fn load_toml<T: DeserializeOwned>(path: PathBuf) -> Result<T> {
    if !path.exists() {
        return Err(BillingError::ConfigFileNotFound(path));
    }
    let content = fs::read_to_string(&path)?;
    toml::from_str(&content).map_err(|e| BillingError::ConfigParse { path, source: e })
}

/// Load the main config.toml
pub fn load_config(config_dir: &Path) -> Result<Config> {
    load_toml(config_dir.join("config.toml"))
}

/// Load customers.toml keyed by customer id
pub fn load_customers(config_dir: &Path) -> Result<HashMap<String, Customer>> {
    load_toml(config_dir.join("customers.toml"))
}

/// Load catalog.toml keyed by service id
pub fn load_catalog(config_dir: &Path) -> Result<HashMap<String, CatalogItem>> {
    load_toml(config_dir.join("catalog.toml"))
}

/// Create the config directory with template files
pub fn init_config_dir(config_dir: &Path) -> Result<()> {
    if config_dir.exists() {
        return Err(BillingError::AlreadyInitialized(config_dir.to_path_buf()));
    }

    fs::create_dir_all(config_dir)?;
    fs::create_dir_all(config_dir.join("output"))?;
    fs::write(config_dir.join("config.toml"), CONFIG_TEMPLATE)?;
    fs::write(config_dir.join("customers.toml"), CUSTOMERS_TEMPLATE)?;
    fs::write(config_dir.join("catalog.toml"), CATALOG_TEMPLATE)?;
    Ok(())
}

/// Template content for config.toml
pub const CONFIG_TEMPLATE: &str = r#"[company]
name = "AeroLogicTech"
address = "1 Terminal Road"
city = "Lisbon"
zip = "1700-111"
country = "Portugal"
email = "billing@aerologictech.example"
# phone = "+351-21-000-0000"   # optional
# tax_id = "PT123456789"       # optional

[invoice]
currency = "EUR"
tax_rate = "0.00"    # percentage, e.g. "23.00" for 23%
due_days = 30        # 0 = no default due date
numbering = "scan"   # "scan" (highest number + 1) or "counter" (per-month counter)
max_attempts = 5     # retries when two invoices race for the same number

[pdf]
output_dir = "output"   # relative to this directory, or an absolute / ~/ path
"#;

/// Template content for customers.toml
pub const CUSTOMERS_TEMPLATE: &str = r#"# Define your customers here. The table name (e.g., [acme]) is used
# as the customer identifier in the create command.
#
# Example:
#   aerobill create --customer example-customer --item airport-transfer:1

[example-customer]
name = "Example Customer Ltd."
email = "accounts@example.com"   # optional
address = "456 Client Avenue"    # optional
city = "Porto"                   # optional
zip = "4000-001"                 # optional
# country = "Portugal"           # optional
"#;

/// Template content for catalog.toml
pub const CATALOG_TEMPLATE: &str = r#"# Billable services. The table name (e.g., [airport-transfer]) is used
# as the service identifier in --item service:qty.
#
# Example:
#   aerobill create --customer example-customer --item car-rental-day:3

[airport-transfer]
description = "Airport Transfer"
unit_price = "45.00"
unit = "trip"

[meet-and-greet]
description = "Meet & Greet Service"
unit_price = "30.00"
unit = "passenger"

[car-rental-day]
description = "Car Rental"
unit_price = "55.00"
unit = "day"
"#;
