//! Sales-line records as extracted from a sales report.

use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{MalformedNumberError, RecordRef};
use crate::sales::numbers::parse_quantity;

/// Column headers of the source sales table.
pub mod columns {
    pub const ARTICLE: &str = "Article";
    pub const DESCRIPTION: &str = "Descripció";
    pub const QUANTITY: &str = "Quantitat";
    pub const IMPORT: &str = "Import";
    pub const COST: &str = "Cost";
    pub const MARGIN: &str = "% Marge";

    /// All extracted columns, in table order.
    pub const ALL: [&str; 6] = [ARTICLE, DESCRIPTION, QUANTITY, IMPORT, COST, MARGIN];
}

/// One item row of the source table.
///
/// Monetary and percentage fields keep the document's comma-decimal text;
/// conversion happens only when a value is aggregated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesLineRecord {
    /// Article code, possibly empty.
    #[serde(rename = "Article")]
    pub article_code: String,

    /// Full item description. Never blank.
    #[serde(rename = "Descripció")]
    pub description: String,

    /// Quantity with its unit marker, e.g. "12 U".
    #[serde(rename = "Quantitat")]
    pub quantity: String,

    /// Sale amount.
    #[serde(rename = "Import")]
    pub import_amount: String,

    /// Cost amount.
    #[serde(rename = "Cost")]
    pub cost_amount: String,

    /// Margin percentage.
    #[serde(rename = "% Marge")]
    pub margin_percent: String,

    /// Additional columns returned alongside the six known ones.
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

impl SalesLineRecord {
    /// Look up a column by its source header.
    pub fn column(&self, name: &str) -> Option<&str> {
        match name {
            columns::ARTICLE => Some(&self.article_code),
            columns::DESCRIPTION => Some(&self.description),
            columns::QUANTITY => Some(&self.quantity),
            columns::IMPORT => Some(&self.import_amount),
            columns::COST => Some(&self.cost_amount),
            columns::MARGIN => Some(&self.margin_percent),
            other => self.extra.get(other).map(String::as_str),
        }
    }

    /// Quantity without its unit marker.
    pub fn quantity_value(&self) -> Result<Decimal, MalformedNumberError> {
        parse_quantity(&self.quantity)
    }

    pub(crate) fn reference(&self, index: usize) -> RecordRef {
        RecordRef {
            index,
            article_code: self.article_code.clone(),
            description: self.description.clone(),
        }
    }
}

/// Sales category derived from a record's description.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Visits,
    Sponsorship,
    Donation,
    /// Anything else. Carries the record's margin verbatim when
    /// merchandise is split per margin.
    Merchandising(Option<String>),
}

impl Category {
    /// Grouping label used in summary tables.
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Visits => write!(f, "Visits"),
            Self::Sponsorship => write!(f, "Sponsorship"),
            Self::Donation => write!(f, "Donation"),
            Self::Merchandising(Some(margin)) => write!(f, "Merchandising ({}% Marge)", margin),
            Self::Merchandising(None) => write!(f, "Merchandising"),
        }
    }
}

/// A record paired with its category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifiedRecord {
    #[serde(flatten)]
    pub record: SalesLineRecord,
    #[serde(rename = "Category", serialize_with = "serialize_label")]
    pub category: Category,
}

fn serialize_label<S: serde::Serializer>(category: &Category, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(category)
}

#[cfg(test)]
pub(crate) fn record(description: &str, import: &str, cost: &str, margin: &str) -> SalesLineRecord {
    SalesLineRecord {
        article_code: String::new(),
        description: description.to_string(),
        quantity: "1 U".to_string(),
        import_amount: import.to_string(),
        cost_amount: cost.to_string(),
        margin_percent: margin.to_string(),
        extra: BTreeMap::new(),
    }
}
