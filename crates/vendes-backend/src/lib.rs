//! Text generation backend abstraction for vendes.
//!
//! The extraction pipeline only needs one narrow capability: send an
//! instruction, get raw text back. This crate provides:
//! - the [`GenerationBackend`] trait every backend implements
//! - `GeminiBackend`, a blocking client for the Gemini `generateContent` API
//! - [`FixedReplyBackend`], a canned-reply backend for replay and tests

mod backend;
mod error;

pub use backend::GenerationBackend;
pub use backend::fixed::FixedReplyBackend;
pub use error::BackendError;

#[cfg(feature = "gemini")]
pub use backend::gemini::{GeminiBackend, GeminiSettings};

/// Result type for backend operations.
pub type Result<T> = std::result::Result<T, BackendError>;
