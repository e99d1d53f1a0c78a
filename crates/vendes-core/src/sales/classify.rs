//! Sales category classification from description text.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::models::config::ClassifierConfig;
use crate::models::record::{Category, ClassifiedRecord, SalesLineRecord};

/// How records that match no marker are grouped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MerchandisingGrouping {
    /// One category per distinct margin percentage.
    #[default]
    PerMargin,
    /// A single merchandising category.
    Combined,
}

/// Keyword classifier. Markers are checked in order: visit, sponsorship,
/// donation; the first one found in the description wins.
#[derive(Debug, Clone)]
pub struct CategoryClassifier {
    visit_marker: String,
    sponsorship_marker: String,
    donation_marker: String,
    grouping: MerchandisingGrouping,
}

impl CategoryClassifier {
    /// Create a classifier with the default markers.
    pub fn new() -> Self {
        Self::from_config(&ClassifierConfig::default())
    }

    pub fn from_config(config: &ClassifierConfig) -> Self {
        Self {
            visit_marker: config.visit_marker.to_uppercase(),
            sponsorship_marker: config.sponsorship_marker.to_uppercase(),
            donation_marker: config.donation_marker.to_uppercase(),
            grouping: config.merchandising,
        }
    }

    /// Set merchandising grouping.
    pub fn with_grouping(mut self, grouping: MerchandisingGrouping) -> Self {
        self.grouping = grouping;
        self
    }

    /// Classify a description. `margin_percent` is only used for
    /// merchandise and is embedded verbatim.
    pub fn classify(&self, description: &str, margin_percent: &str) -> Category {
        let upper = description.to_uppercase();

        let category = if upper.contains(&self.visit_marker) {
            Category::Visits
        } else if upper.contains(&self.sponsorship_marker) {
            Category::Sponsorship
        } else if upper.contains(&self.donation_marker) {
            Category::Donation
        } else {
            match self.grouping {
                MerchandisingGrouping::PerMargin => {
                    Category::Merchandising(Some(margin_percent.to_string()))
                }
                MerchandisingGrouping::Combined => Category::Merchandising(None),
            }
        };

        trace!("'{}' -> {}", description, category);
        category
    }

    pub fn classify_record(&self, record: &SalesLineRecord) -> ClassifiedRecord {
        ClassifiedRecord {
            category: self.classify(&record.description, &record.margin_percent),
            record: record.clone(),
        }
    }

    pub fn classify_all(&self, records: &[SalesLineRecord]) -> Vec<ClassifiedRecord> {
        records.iter().map(|r| self.classify_record(r)).collect()
    }
}

impl Default for CategoryClassifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Classify with the default markers and per-margin merchandising.
pub fn classify(description: &str, margin_percent: &str) -> Category {
    CategoryClassifier::new().classify(description, margin_percent)
}
