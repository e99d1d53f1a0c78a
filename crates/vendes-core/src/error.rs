//! Error types for the vendes-core library.

use std::fmt;

use thiserror::Error;

/// Main error type for the vendes library.
#[derive(Error, Debug)]
pub enum VendesError {
    /// The extraction backend could not produce a reply.
    #[error("backend error: {0}")]
    Backend(#[from] vendes_backend::BackendError),

    /// The backend reply did not match the record schema.
    #[error(transparent)]
    ResponseFormat(#[from] ResponseFormatError),

    /// A numeric field was not a valid locale-decimal string.
    #[error(transparent)]
    MalformedNumber(#[from] MalformedNumberError),

    /// A configured summary column is absent from a record.
    #[error("column '{column}' missing from {record}")]
    MissingField { column: String, record: RecordRef },

    /// A column sum exceeded the decimal range.
    #[error("sum of column '{column}' overflowed at {at}")]
    Overflow { column: String, at: String },

    /// The document text was empty.
    #[error("document contains no text")]
    EmptyDocument,

    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// The backend reply could not be turned into sales-line records.
///
/// Carries the cleaned reply text so callers can show what came back.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unexpected reply format: {reason}")]
pub struct ResponseFormatError {
    reason: String,
    raw_text: String,
}

impl ResponseFormatError {
    pub fn new(reason: impl Into<String>, raw_text: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            raw_text: raw_text.into(),
        }
    }

    /// Why the reply was rejected.
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// The reply text after wrapper stripping.
    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }
}

/// Identifies a record within one document's record set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordRef {
    /// Zero-based position in the extracted sequence.
    pub index: usize,
    pub article_code: String,
    pub description: String,
}

impl fmt::Display for RecordRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "record #{} ('{}'", self.index + 1, self.description)?;
        if !self.article_code.is_empty() {
            write!(f, ", article {}", self.article_code)?;
        }
        write!(f, ")")
    }
}

/// A value that is not a comma-decimal number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedNumberError {
    value: String,
    column: Option<String>,
    record: Option<RecordRef>,
}

impl MalformedNumberError {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            column: None,
            record: None,
        }
    }

    /// Attach the column and record the value was read from.
    pub fn in_record(mut self, column: impl Into<String>, record: RecordRef) -> Self {
        self.column = Some(column.into());
        self.record = Some(record);
        self
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn column(&self) -> Option<&str> {
        self.column.as_deref()
    }

    pub fn record(&self) -> Option<&RecordRef> {
        self.record.as_ref()
    }
}

impl fmt::Display for MalformedNumberError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "malformed number '{}'", self.value)?;
        if let Some(column) = &self.column {
            write!(f, " in column '{}'", column)?;
        }
        if let Some(record) = &self.record {
            write!(f, " of {}", record)?;
        }
        Ok(())
    }
}

impl std::error::Error for MalformedNumberError {}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,
}

/// Result type for the vendes library.
pub type Result<T> = std::result::Result<T, VendesError>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_malformed_number_display() {
        let err = MalformedNumberError::new("12.3.4");
        assert_eq!(err.to_string(), "malformed number '12.3.4'");

        let err = err.in_record(
            "Import",
            RecordRef {
                index: 1,
                article_code: "A-7".to_string(),
                description: "Tassa".to_string(),
            },
        );
        assert_eq!(
            err.to_string(),
            "malformed number '12.3.4' in column 'Import' of record #2 ('Tassa', article A-7)"
        );
    }

    #[test]
    fn test_response_format_keeps_raw_text() {
        let err: VendesError = ResponseFormatError::new("not a list", "{}").into();
        match err {
            VendesError::ResponseFormat(e) => {
                assert_eq!(e.reason(), "not a list");
                assert_eq!(e.raw_text(), "{}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
