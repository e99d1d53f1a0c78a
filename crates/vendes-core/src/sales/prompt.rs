//! Extraction instruction building.

use crate::models::record::columns;

/// Sampling temperature for every extraction request.
pub const EXTRACTION_TEMPERATURE: f32 = 0.0;

/// Per-column extraction rules, in table order.
const COLUMN_RULES: [(&str, &str); 6] = [
    (columns::ARTICLE, "The article code or identification number. Use an empty string if the row has none."),
    (columns::DESCRIPTION, "The complete article description, joining text wrapped over several lines."),
    (columns::QUANTITY, "The quantity sold as an integer followed by its unit marker, e.g. \"12 U\"."),
    (columns::IMPORT, "The total sale amount. Decimal number written with a comma, e.g. \"1234,56\"."),
    (columns::COST, "The article cost. Decimal number written with a comma."),
    (columns::MARGIN, "The margin percentage. Decimal number written with a comma, without the % sign."),
];

const PREAMBLE: &str = "Extract the sales data for every article in the sales report below. \
Ignore rows containing totals (such as \"Total Client\" or \"Total Vendes\") and any text that \
is not part of the main article table (dates, page headers, page footers). \
Extract the following columns:";

const OUTPUT_FORMAT: &str = "Output format: a JSON array of objects, one object per article row, \
every object having exactly the keys listed above, every value written as a string. \
Return only the array, without code fences, comments or any other text.";

/// A ready-to-send extraction request.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    text: String,
    temperature: f32,
}

impl Instruction {
    /// Prompt text, document included.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }
}

/// Build the extraction instruction for `document_text`.
///
/// The output depends only on the input: the same document always yields
/// the same instruction.
pub fn build_request(document_text: &str) -> Instruction {
    let mut text = String::with_capacity(document_text.len() + 1024);

    text.push_str(PREAMBLE);
    text.push_str("\n\n");
    for (column, rule) in COLUMN_RULES {
        text.push_str(&format!("- \"{}\": {}\n", column, rule));
    }
    text.push('\n');
    text.push_str(OUTPUT_FORMAT);
    text.push_str("\n\nReport content:\n");
    text.push_str(document_text);

    Instruction {
        text,
        temperature: EXTRACTION_TEMPERATURE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_request_is_deterministic() {
        let doc = "1001 SAMARRETA BLAVA 3 U 45,00 20,00 55,56";
        assert_eq!(build_request(doc), build_request(doc));
    }

    #[test]
    fn test_request_names_every_column() {
        let instruction = build_request("x");
        for column in columns::ALL {
            assert!(instruction.text().contains(&format!("\"{}\"", column)), "missing {column}");
        }
    }

    #[test]
    fn test_request_excludes_totals_and_fences() {
        let text = build_request("x").text().to_string();
        assert!(text.contains("Total Vendes"));
        assert!(text.contains("page headers"));
        assert!(text.contains("without code fences"));
    }

    #[test]
    fn test_document_appended_verbatim() {
        let doc = "Page 1\n  1001\tTASSA  2 U\n\nTotal Vendes 10,00 ";
        let instruction = build_request(doc);
        assert!(instruction.text().ends_with(doc));
        assert_eq!(instruction.temperature(), 0.0);
    }
}
