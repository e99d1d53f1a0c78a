//! Per-category aggregation of classified records.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use tracing::debug;

use super::numbers::parse_decimal;
use crate::error::{Result, VendesError};
use crate::models::record::ClassifiedRecord;
use crate::models::summary::{CategorySummaryRow, SummaryField, SummaryTable};

/// Sums configured numeric fields per category.
///
/// Category rows come out sorted by label. Sums are rounded to two places
/// after summation (half to even); the total row is the sum of the rounded
/// category rows, rounded again.
#[derive(Debug, Clone)]
pub struct Aggregator {
    fields: Vec<SummaryField>,
}

impl Aggregator {
    /// Create an aggregator over `fields`. Duplicates are dropped.
    pub fn new(fields: impl IntoIterator<Item = SummaryField>) -> Self {
        let mut unique = Vec::new();
        for field in fields {
            if !unique.contains(&field) {
                unique.push(field);
            }
        }
        Self { fields: unique }
    }

    pub fn fields(&self) -> &[SummaryField] {
        &self.fields
    }

    /// Build the summary table. Fails without a partial result if any
    /// configured value is missing or not a comma-decimal number.
    pub fn aggregate(&self, records: &[ClassifiedRecord]) -> Result<SummaryTable> {
        if self.fields.is_empty() {
            return Err(VendesError::Config("no summary fields configured".to_string()));
        }

        let mut groups: BTreeMap<String, Vec<Decimal>> = BTreeMap::new();

        for (index, classified) in records.iter().enumerate() {
            let record = &classified.record;
            let sums = groups
                .entry(classified.category.label())
                .or_insert_with(|| vec![Decimal::ZERO; self.fields.len()]);

            for (sum, field) in sums.iter_mut().zip(&self.fields) {
                let column = field.column();
                let raw = record.column(column).ok_or_else(|| VendesError::MissingField {
                    column: column.to_string(),
                    record: record.reference(index),
                })?;
                let value = parse_decimal(raw)
                    .map_err(|e| e.in_record(column, record.reference(index)))?;
                *sum = sum.checked_add(value).ok_or_else(|| VendesError::Overflow {
                    column: column.to_string(),
                    at: record.reference(index).to_string(),
                })?;
            }
        }

        let rows: Vec<CategorySummaryRow> = groups
            .into_iter()
            .map(|(category, sums)| CategorySummaryRow {
                category,
                values: sums.into_iter().map(|s| s.round_dp(2)).collect(),
            })
            .collect();

        debug!("Aggregated {} records into {} categories", records.len(), rows.len());

        SummaryTable::with_total(self.fields.clone(), rows)
    }
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new(SummaryField::import_cost())
    }
}

/// Aggregate `records` over `fields`.
pub fn aggregate(records: &[ClassifiedRecord], fields: &[SummaryField]) -> Result<SummaryTable> {
    Aggregator::new(fields.iter().copied()).aggregate(records)
}
