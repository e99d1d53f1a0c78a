//! Comma-decimal number handling.

use rust_decimal::Decimal;
use std::str::FromStr;

use super::patterns::{DECIMAL_LITERAL, QUANTITY_WITH_UNIT};
use crate::error::MalformedNumberError;

/// Parse a comma-decimal string (e.g. "1234,56") into a decimal.
///
/// A period is accepted in place of the comma. Thousands separators,
/// a second separator, units and empty input are rejected.
pub fn parse_decimal(s: &str) -> Result<Decimal, MalformedNumberError> {
    let trimmed = s.trim();

    if !DECIMAL_LITERAL.is_match(trimmed) {
        return Err(MalformedNumberError::new(s));
    }

    let mut normalized = trimmed.replace(',', ".");
    if normalized.ends_with('.') {
        normalized.pop();
    }

    Decimal::from_str(&normalized).map_err(|_| MalformedNumberError::new(s))
}

/// Parse a quantity, dropping its trailing unit marker ("12 U" -> 12).
pub fn parse_quantity(s: &str) -> Result<Decimal, MalformedNumberError> {
    let caps = QUANTITY_WITH_UNIT
        .captures(s)
        .ok_or_else(|| MalformedNumberError::new(s))?;

    parse_decimal(&caps[1]).map_err(|_| MalformedNumberError::new(s))
}

/// Format a decimal with two places and a comma separator (1234,56).
pub fn format_decimal(value: Decimal) -> String {
    format!("{:.2}", value).replace('.', ",")
}
