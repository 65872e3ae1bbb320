use rust_decimal::{Decimal, RoundingStrategy};

/// Decimal places kept on every stored or displayed amount
pub const DECIMAL_PLACES: u32 = 2;

/// Round to cents, half away from zero
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Format an amount with exactly two decimals and the currency code, e.g. `30.60 EUR`
pub fn format_money(value: Decimal, currency: &str) -> String {
    format!("{:.2} {}", round2(value), currency)
}
