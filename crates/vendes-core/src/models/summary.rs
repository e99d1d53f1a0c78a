//! Per-category summary tables.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::record::columns;
use crate::error::{Result, VendesError};

/// Label of the synthetic last row of every summary table.
pub const TOTAL_LABEL: &str = "Total";

/// A numeric column that can be summed per category.
///
/// `Import` and `Cost` come from the extracted record schema. `Base`,
/// `Tax` and `Price` belong to an alternative report layout and are only
/// present when the backend returned those columns as extras.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryField {
    Import,
    Cost,
    Base,
    Tax,
    Price,
}

impl SummaryField {
    /// Source column the values are read from.
    pub fn column(self) -> &'static str {
        match self {
            Self::Import => columns::IMPORT,
            Self::Cost => columns::COST,
            Self::Base => "Base",
            Self::Tax => "Import IVA",
            Self::Price => "PVP",
        }
    }

    /// The default `Import`/`Cost` schema.
    pub fn import_cost() -> Vec<Self> {
        vec![Self::Import, Self::Cost]
    }

    /// The alternative `Base`/`Import IVA`/`PVP` schema.
    pub fn base_tax_price() -> Vec<Self> {
        vec![Self::Base, Self::Tax, Self::Price]
    }
}

/// Summed values for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySummaryRow {
    pub category: String,
    /// One value per configured field, in field order.
    pub values: Vec<Decimal>,
}

/// Category rows followed by exactly one `Total` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryTable {
    fields: Vec<SummaryField>,
    rows: Vec<CategorySummaryRow>,
}

impl SummaryTable {
    /// Build a table from already rounded category rows, appending the total.
    pub(crate) fn with_total(
        fields: Vec<SummaryField>,
        mut rows: Vec<CategorySummaryRow>,
    ) -> Result<Self> {
        let mut totals = vec![Decimal::ZERO; fields.len()];
        for row in &rows {
            for ((total, value), field) in totals.iter_mut().zip(&row.values).zip(&fields) {
                *total = total.checked_add(*value).ok_or_else(|| VendesError::Overflow {
                    column: field.column().to_string(),
                    at: format!("the {} row", TOTAL_LABEL),
                })?;
            }
        }

        rows.push(CategorySummaryRow {
            category: TOTAL_LABEL.to_string(),
            values: totals.into_iter().map(|t| t.round_dp(2)).collect(),
        });

        Ok(Self { fields, rows })
    }

    pub fn fields(&self) -> &[SummaryField] {
        &self.fields
    }

    /// All rows, the total last.
    pub fn rows(&self) -> &[CategorySummaryRow] {
        &self.rows
    }

    /// Rows without the total.
    pub fn category_rows(&self) -> &[CategorySummaryRow] {
        &self.rows[..self.rows.len() - 1]
    }

    pub fn total(&self) -> &CategorySummaryRow {
        &self.rows[self.rows.len() - 1]
    }

    /// Value of `field` in the row for `category`.
    pub fn get(&self, category: &str, field: SummaryField) -> Option<Decimal> {
        let idx = self.fields.iter().position(|f| *f == field)?;
        self.rows
            .iter()
            .find(|r| r.category == category)
            .and_then(|r| r.values.get(idx).copied())
    }

    /// Header line: category column then one column per field.
    pub fn headers(&self) -> Vec<&'static str> {
        std::iter::once("Category")
            .chain(self.fields.iter().map(|f| f.column()))
            .collect()
    }
}
