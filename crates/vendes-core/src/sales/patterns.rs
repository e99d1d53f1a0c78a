//! Regex patterns shared by the reply parser and number helpers.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Fenced-code markers, with or without a language tag
    pub static ref CODE_FENCE: Regex = Regex::new(r"```[A-Za-z0-9_+\-]*").unwrap();

    // Comma- or dot-decimal number, optionally signed
    pub static ref DECIMAL_LITERAL: Regex = Regex::new(r"^[+\-]?(?:\d+(?:[.,]\d*)?|[.,]\d+)$").unwrap();

    // Quantity followed by a unit marker: "12 U", "3,5kg", "-2 u."
    pub static ref QUANTITY_WITH_UNIT: Regex = Regex::new(
        r"^\s*([+\-]?\d+(?:[.,]\d+)?)\s*(\p{L}+\.?)?\s*$"
    ).unwrap();
}
