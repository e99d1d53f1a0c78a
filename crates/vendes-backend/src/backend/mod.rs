//! Generation backend implementations.

pub mod fixed;

#[cfg(feature = "gemini")]
pub mod gemini;

use crate::Result;

/// Trait for text generation backends.
///
/// This trait abstracts over the service that turns an extraction
/// instruction into structured record text, so the pipeline can run
/// against a real model or against a canned reply in tests.
pub trait GenerationBackend: Send + Sync {
    /// Generate a completion for the given instruction.
    ///
    /// # Arguments
    /// * `instruction` - Full prompt, document text included
    /// * `temperature` - Sampling temperature; extraction always passes 0
    ///
    /// # Returns
    /// The raw reply text, unmodified
    fn generate(&self, instruction: &str, temperature: f32) -> Result<String>;

    /// Short name used in logs.
    fn name(&self) -> &str;
}

impl<B: GenerationBackend + ?Sized> GenerationBackend for Box<B> {
    fn generate(&self, instruction: &str, temperature: f32) -> Result<String> {
        (**self).generate(instruction, temperature)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<B: GenerationBackend + ?Sized> GenerationBackend for std::sync::Arc<B> {
    fn generate(&self, instruction: &str, temperature: f32) -> Result<String> {
        (**self).generate(instruction, temperature)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
