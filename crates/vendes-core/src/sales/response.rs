//! Parsing of the extraction backend's reply into sales-line records.

use std::collections::BTreeMap;

use tracing::debug;

use super::literal::{self, Literal};
use super::patterns::CODE_FENCE;
use crate::error::ResponseFormatError;
use crate::models::record::{columns, SalesLineRecord};

/// Accent-less spelling some replies use for the description key.
const DESCRIPTION_ALIAS: &str = "Descripcio";

/// Remove code fences and surrounding whitespace from a reply.
pub fn strip_wrappers(raw_text: &str) -> String {
    CODE_FENCE.replace_all(raw_text.trim(), "").trim().to_string()
}

/// Parse a backend reply into records, in reply order.
///
/// The reply must be a list of dictionaries carrying all six columns. JSON
/// is tried first, then the looser literal syntax (single quotes, `None`,
/// trailing commas). Nothing in the reply is ever executed.
pub fn parse_response(raw_text: &str) -> Result<Vec<SalesLineRecord>, ResponseFormatError> {
    let cleaned = strip_wrappers(raw_text);

    let value = match serde_json::from_str::<serde_json::Value>(&cleaned) {
        Ok(json) => Literal::from(json),
        Err(json_err) => {
            debug!("Reply is not JSON ({}), trying literal syntax", json_err);
            literal::parse(&cleaned).map_err(|e| {
                ResponseFormatError::new(format!("reply is not a list of records: {}", e), &cleaned)
            })?
        }
    };

    let items = match value {
        Literal::List(items) => items,
        other => {
            return Err(ResponseFormatError::new(
                format!("expected a list of records, found a {}", other.kind()),
                &cleaned,
            ));
        }
    };

    let records = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            to_record(index, item).map_err(|reason| ResponseFormatError::new(reason, &cleaned))
        })
        .collect::<Result<Vec<_>, _>>()?;

    debug!("Parsed {} records from reply", records.len());
    Ok(records)
}

fn to_record(index: usize, item: Literal) -> Result<SalesLineRecord, String> {
    let entries = match item {
        Literal::Dict(entries) => entries,
        other => return Err(format!("element {} is a {}, not a record", index + 1, other.kind())),
    };

    let mut fields: BTreeMap<String, String> = BTreeMap::new();
    for (key, value) in entries {
        let text = scalar_text(value)
            .ok_or_else(|| format!("element {} has a non-scalar value for '{}'", index + 1, key))?;
        let key = if key == DESCRIPTION_ALIAS {
            columns::DESCRIPTION.to_string()
        } else {
            key
        };
        fields.insert(key, text);
    }

    let mut take = |column: &str| {
        fields
            .remove(column)
            .ok_or_else(|| format!("element {} is missing '{}'", index + 1, column))
    };

    let article_code = take(columns::ARTICLE)?;
    let description = take(columns::DESCRIPTION)?;
    let quantity = take(columns::QUANTITY)?;
    let import_amount = take(columns::IMPORT)?;
    let cost_amount = take(columns::COST)?;
    let margin_percent = take(columns::MARGIN)?;

    let record = SalesLineRecord {
        article_code,
        description,
        quantity,
        import_amount,
        cost_amount,
        margin_percent,
        extra: fields,
    };

    if record.description.trim().is_empty() {
        return Err(format!("element {} has an empty description", index + 1));
    }

    Ok(record)
}

fn scalar_text(value: Literal) -> Option<String> {
    match value {
        Literal::Str(s) | Literal::Number(s) => Some(s),
        Literal::Null => Some(String::new()),
        Literal::Bool(_) | Literal::List(_) | Literal::Dict(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const JSON_REPLY: &str = r#"[
        {"Article": "1001", "Descripció": "SAMARRETA BLAVA", "Quantitat": "3 U", "Import": "45,00", "Cost": "20,00", "% Marge": "55,56"},
        {"Article": "", "Descripció": "VISITA GUIADA", "Quantitat": "20 U", "Import": "100,00", "Cost": "0,00", "% Marge": "100,00"}
    ]"#;

    #[test]
    fn test_parse_json_reply() {
        let records = parse_response(JSON_REPLY).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].article_code, "1001");
        assert_eq!(records[0].description, "SAMARRETA BLAVA");
        assert_eq!(records[0].quantity, "3 U");
        assert_eq!(records[0].margin_percent, "55,56");
        assert_eq!(records[1].article_code, "");
        assert!(records[1].extra.is_empty());
    }

    #[test]
    fn test_fenced_reply_matches_unwrapped() {
        let fenced = format!("```json\n{}\n```", JSON_REPLY);
        assert_eq!(parse_response(&fenced).unwrap(), parse_response(JSON_REPLY).unwrap());

        let python = format!("```python\n{}\n```  ", JSON_REPLY);
        assert_eq!(parse_response(&python).unwrap(), parse_response(JSON_REPLY).unwrap());
    }

    #[test]
    fn test_parse_literal_reply() {
        let reply = "[{'Article': 1001, 'Descripció': 'Tassa l\\'Ermita', 'Quantitat': '2 U', \
                     'Import': '12,00', 'Cost': '5,00', '% Marge': '58,33'},]";
        let records = parse_response(reply).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].article_code, "1001");
        assert_eq!(records[0].description, "Tassa l'Ermita");
    }

    #[test]
    fn test_extra_columns_kept() {
        let reply = r#"[{"Article": null, "Descripcio": "Tassa", "Quantitat": "1 U", "Import": "1,00",
                         "Cost": "0,50", "% Marge": "50,00", "PVP": "1,21"}]"#;
        let records = parse_response(reply).unwrap();
        assert_eq!(records[0].article_code, "");
        assert_eq!(records[0].description, "Tassa");
        assert_eq!(records[0].extra.get("PVP").map(String::as_str), Some("1,21"));
    }

    #[test]
    fn test_empty_list_is_valid() {
        assert!(parse_response("```\n[]\n```").unwrap().is_empty());
    }

    #[test]
    fn test_empty_description_rejected() {
        let reply = "```python\n[{'Article': '1', 'Descripció': '  ', 'Quantitat': '1 U', \
                     'Import': '1,00', 'Cost': '1,00', '% Marge': '0,00'}]\n```";
        let err = parse_response(reply).unwrap_err();
        assert!(err.reason().contains("empty description"));
        assert!(err.raw_text().starts_with("[{'Article'"));
        assert!(!err.raw_text().contains("```"));
    }

    #[test]
    fn test_missing_key_rejected() {
        let reply = r#"[{"Article": "1", "Descripció": "Tassa", "Import": "1,00", "Cost": "1,00", "% Marge": "0"}]"#;
        let err = parse_response(reply).unwrap_err();
        assert!(err.reason().contains("missing 'Quantitat'"));
        assert_eq!(err.raw_text(), reply);
    }

    #[test]
    fn test_non_list_rejected() {
        let err = parse_response(r#"{"Article": "1"}"#).unwrap_err();
        assert!(err.reason().contains("found a dictionary"));

        let err = parse_response("[1, 2]").unwrap_err();
        assert!(err.reason().contains("element 1 is a number"));
    }

    #[test]
    fn test_prose_reply_rejected() {
        let reply = "I could not find any sales table in this document.";
        let err = parse_response(reply).unwrap_err();
        assert_eq!(err.raw_text(), reply);
    }

    #[test]
    fn test_nested_value_rejected() {
        let reply = r#"[{"Article": "1", "Descripció": ["a"], "Quantitat": "1 U", "Import": "1", "Cost": "1", "% Marge": "0"}]"#;
        let err = parse_response(reply).unwrap_err();
        assert!(err.reason().contains("non-scalar"));
    }
}
