//! Extraction pipeline: document text to records and summary.

use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, warn};
use vendes_backend::GenerationBackend;

use crate::error::{Result, VendesError};
use crate::models::config::VendesConfig;
use crate::models::record::{ClassifiedRecord, SalesLineRecord};
use crate::models::summary::SummaryTable;
use crate::sales::{build_request, parse_response, strip_wrappers, Aggregator, CategoryClassifier};

/// Result of a full pipeline run over one document.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutput {
    /// Extracted records, in document order.
    pub records: Vec<SalesLineRecord>,
    /// Records with their categories.
    pub classified: Vec<ClassifiedRecord>,
    /// Per-category summary with total row, absent when the run skipped it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<SummaryTable>,
    /// Backend reply after wrapper stripping.
    #[serde(skip)]
    pub raw_reply: String,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

/// Runs request building, the backend call, reply parsing, classification
/// and aggregation for one document at a time.
///
/// Holds no per-document state; one pipeline can serve any number of
/// documents, each run failing or succeeding as a whole.
pub struct ExtractionPipeline<B> {
    backend: B,
    classifier: CategoryClassifier,
    aggregator: Aggregator,
}

impl<B: GenerationBackend> ExtractionPipeline<B> {
    /// Create a pipeline over `backend` using `config`.
    pub fn new(backend: B, config: &VendesConfig) -> Self {
        Self {
            backend,
            classifier: CategoryClassifier::from_config(&config.classifier),
            aggregator: Aggregator::new(config.summary.fields.iter().copied()),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Extract records from document text with one backend call.
    pub fn extract(&self, document_text: &str) -> Result<Vec<SalesLineRecord>> {
        self.extract_with_reply(document_text).map(|(records, _)| records)
    }

    fn extract_with_reply(&self, document_text: &str) -> Result<(Vec<SalesLineRecord>, String)> {
        if document_text.trim().is_empty() {
            return Err(VendesError::EmptyDocument);
        }

        let instruction = build_request(document_text);
        debug!(
            "Sending {} chars to backend '{}'",
            instruction.text().len(),
            self.backend.name()
        );

        let started = Instant::now();
        let reply = self
            .backend
            .generate(instruction.text(), instruction.temperature())
            .inspect_err(|e| warn!("Backend call failed: {}", e))?;
        debug!("Backend replied in {}ms", started.elapsed().as_millis());

        let records = parse_response(&reply).inspect_err(|e| warn!("{}", e))?;
        info!("Extracted {} sales lines", records.len());

        Ok((records, strip_wrappers(&reply)))
    }

    /// Classify records with the configured markers.
    pub fn classify(&self, records: &[SalesLineRecord]) -> Vec<ClassifiedRecord> {
        self.classifier.classify_all(records)
    }

    /// Classify and aggregate records into a summary table.
    pub fn summarize(&self, records: &[SalesLineRecord]) -> Result<SummaryTable> {
        self.aggregator.aggregate(&self.classify(records))
    }

    /// Run every stage for one document.
    pub fn run(&self, document_text: &str) -> Result<PipelineOutput> {
        self.run_stages(document_text, true)
    }

    /// Extract and classify without aggregating, so numeric values are
    /// never parsed.
    pub fn run_without_summary(&self, document_text: &str) -> Result<PipelineOutput> {
        self.run_stages(document_text, false)
    }

    fn run_stages(&self, document_text: &str, with_summary: bool) -> Result<PipelineOutput> {
        let started = Instant::now();

        let (records, raw_reply) = self.extract_with_reply(document_text)?;
        let classified = self.classify(&records);

        let summary = if with_summary {
            let summary = self.aggregator.aggregate(&classified)?;
            info!(
                "Summarized {} records into {} categories",
                records.len(),
                summary.category_rows().len()
            );
            Some(summary)
        } else {
            None
        };

        Ok(PipelineOutput {
            records,
            classified,
            summary,
            raw_reply,
            processing_time_ms: started.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::summary::SummaryField;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use vendes_backend::FixedReplyBackend;

    const REPLY: &str = r#"```json
[{"Article": "1", "Descripció": "VISITA", "Quantitat": "2 U", "Import": "20,00", "Cost": "0,00", "% Marge": "100,00"}]
```"#;

    #[test]
    fn test_run_single_record() {
        let pipeline = ExtractionPipeline::new(FixedReplyBackend::new(REPLY), &VendesConfig::default());
        let output = pipeline.run("1 VISITA 2 U 20,00").unwrap();

        assert_eq!(output.records.len(), 1);
        let summary = output.summary.unwrap();
        assert_eq!(summary.get("Visits", SummaryField::Import), Some(dec!(20.00)));
        assert!(!output.raw_reply.contains("```"));
    }

    #[test]
    fn test_request_uses_zero_temperature() {
        let pipeline = ExtractionPipeline::new(FixedReplyBackend::new(REPLY), &VendesConfig::default());
        pipeline.extract("document body").unwrap();

        let requests = pipeline.backend().requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].1, 0.0);
        assert!(requests[0].0.ends_with("document body"));
    }

    #[test]
    fn test_empty_document_skips_backend() {
        let pipeline = ExtractionPipeline::new(FixedReplyBackend::new(REPLY), &VendesConfig::default());
        let err = pipeline.run("  \n ").unwrap_err();
        assert!(matches!(err, VendesError::EmptyDocument));
        assert!(pipeline.backend().requests().is_empty());
    }

    #[test]
    fn test_skipping_summary_ignores_malformed_amounts() {
        let reply = r#"[{"Article": "1", "Descripció": "Tassa", "Quantitat": "1 U", "Import": "1.234,50", "Cost": "2,50", "% Marge": "50,00"}]"#;
        let pipeline = ExtractionPipeline::new(FixedReplyBackend::new(reply), &VendesConfig::default());

        assert!(matches!(pipeline.run("text").unwrap_err(), VendesError::MalformedNumber(_)));

        let output = pipeline.run_without_summary("text").unwrap();
        assert!(output.summary.is_none());
        assert_eq!(output.records[0].import_amount, "1.234,50");
        assert_eq!(output.classified.len(), 1);
    }

    #[test]
    fn test_backend_failure_propagates() {
        let pipeline = ExtractionPipeline::new(
            FixedReplyBackend::failing("quota"),
            &VendesConfig::default(),
        );
        assert!(matches!(pipeline.run("text").unwrap_err(), VendesError::Backend(_)));
    }
}
