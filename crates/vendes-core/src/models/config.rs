//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{Result, VendesError};
use crate::models::summary::SummaryField;
use crate::sales::classify::MerchandisingGrouping;

/// Main configuration for the vendes pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VendesConfig {
    /// Extraction backend configuration.
    pub backend: BackendConfig,

    /// Category classification configuration.
    pub classifier: ClassifierConfig,

    /// Summary aggregation configuration.
    pub summary: SummaryConfig,

    /// Export configuration.
    pub output: OutputConfig,
}

/// Extraction backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Model identifier.
    pub model: String,

    /// REST endpoint base URL.
    pub endpoint: String,

    /// Environment variable holding the API key. The key itself is never
    /// written to the config file.
    pub api_key_env: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.0-pro-exp-02-05".to_string(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            api_key_env: "GOOGLE_API_KEY".to_string(),
            timeout_secs: 120,
        }
    }
}

impl BackendConfig {
    /// Read the API key from the configured environment variable.
    pub fn resolve_api_key(&self) -> Result<String> {
        match std::env::var(&self.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(VendesError::Config(format!(
                "API key not found: set the {} environment variable",
                self.api_key_env
            ))),
        }
    }
}

/// Category classification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Description marker for guided visits.
    pub visit_marker: String,

    /// Description marker for sponsorships.
    pub sponsorship_marker: String,

    /// Description marker for donations.
    pub donation_marker: String,

    /// Split merchandise per margin or keep one bucket.
    pub merchandising: MerchandisingGrouping,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            visit_marker: "VISITA".to_string(),
            sponsorship_marker: "APADRINAMENT".to_string(),
            donation_marker: "DONACIÓ".to_string(),
            merchandising: MerchandisingGrouping::PerMargin,
        }
    }
}

/// Summary aggregation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryConfig {
    /// Numeric fields summed per category.
    pub fields: Vec<SummaryField>,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            fields: SummaryField::import_cost(),
        }
    }
}

/// Export configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving exported files.
    pub dir: PathBuf,

    /// chrono format string used in file names.
    pub timestamp_format: String,

    /// File name prefix for the record export.
    pub records_prefix: String,

    /// File name prefix for the summary export.
    pub summary_prefix: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("Output"),
            timestamp_format: "%Y%m%d_%H%M%S".to_string(),
            records_prefix: "articles".to_string(),
            summary_prefix: "sales_summary".to_string(),
        }
    }
}

impl VendesConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> std::result::Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> std::result::Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }

    /// Check values that would make the pipeline misbehave.
    pub fn validate(&self) -> Result<()> {
        if self.summary.fields.is_empty() {
            return Err(VendesError::Config("summary.fields must not be empty".to_string()));
        }

        let markers = [
            ("classifier.visit_marker", &self.classifier.visit_marker),
            ("classifier.sponsorship_marker", &self.classifier.sponsorship_marker),
            ("classifier.donation_marker", &self.classifier.donation_marker),
        ];
        for (key, marker) in markers {
            if marker.trim().is_empty() {
                return Err(VendesError::Config(format!("{} must not be empty", key)));
            }
        }

        if self.backend.model.trim().is_empty() {
            return Err(VendesError::Config("backend.model must not be empty".to_string()));
        }

        Ok(())
    }
}
