//! Core library for sales report extraction.
//!
//! This crate provides:
//! - Extraction request building from raw document text
//! - Safe structural parsing of the extraction backend's reply
//! - Sales category classification and per-category aggregation
//! - PDF text extraction for the document source

pub mod error;
pub mod models;
pub mod pdf;
pub mod pipeline;
pub mod sales;

pub use error::{MalformedNumberError, RecordRef, ResponseFormatError, Result, VendesError};
pub use models::record::{Category, ClassifiedRecord, SalesLineRecord};
pub use models::summary::{CategorySummaryRow, SummaryField, SummaryTable};
pub use pdf::{PdfExtractor, PdfProcessor, PdfType};
pub use pipeline::{ExtractionPipeline, PipelineOutput};
pub use sales::{
    aggregate, build_request, classify, parse_decimal, parse_response, Aggregator,
    CategoryClassifier, Instruction, MerchandisingGrouping,
};

/// Re-export backend types.
pub use vendes_backend::{BackendError, FixedReplyBackend, GenerationBackend};

#[cfg(feature = "gemini")]
pub use vendes_backend::{GeminiBackend, GeminiSettings};
