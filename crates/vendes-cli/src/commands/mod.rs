//! CLI subcommands and the helpers they share.

pub mod batch;
pub mod config;
pub mod process;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, warn};

use vendes_core::models::config::VendesConfig;
use vendes_core::pdf::{PdfExtractor, PdfProcessor, PdfType};
use vendes_core::{
    ExtractionPipeline, FixedReplyBackend, GeminiBackend, GeminiSettings, GenerationBackend,
    PipelineOutput,
};

/// Load the config from `path`, else from the default location, else defaults.
pub(crate) fn load_config(path: Option<&str>) -> anyhow::Result<VendesConfig> {
    let config = match path {
        Some(path) => VendesConfig::from_file(Path::new(path))?,
        None => {
            let default_path = config::default_config_path();
            if default_path.exists() {
                debug!("Using config at {}", default_path.display());
                VendesConfig::from_file(&default_path)?
            } else {
                VendesConfig::default()
            }
        }
    };

    config.validate()?;
    Ok(config)
}

/// Where extraction replies come from.
#[derive(Debug, Clone)]
pub(crate) enum BackendSource {
    /// Call the generation service.
    Gemini(GeminiSettings),
    /// Answer with a reply saved on disk.
    Replay(PathBuf),
}

impl BackendSource {
    /// Pick the backend. The API key is only required for live calls.
    pub(crate) fn from_args(config: &VendesConfig, replay: Option<&Path>) -> anyhow::Result<Self> {
        if let Some(path) = replay {
            return Ok(Self::Replay(path.to_path_buf()));
        }

        let api_key = config.backend.resolve_api_key()?;
        let settings = GeminiSettings::new(api_key, &config.backend.model)
            .with_endpoint(&config.backend.endpoint)
            .with_timeout(Duration::from_secs(config.backend.timeout_secs));
        Ok(Self::Gemini(settings))
    }

    /// Build the backend. Must run on a blocking thread.
    fn build(&self) -> anyhow::Result<Box<dyn GenerationBackend>> {
        Ok(match self {
            Self::Gemini(settings) => Box::new(GeminiBackend::new(settings.clone())?),
            Self::Replay(path) => Box::new(FixedReplyBackend::from_file(path).map_err(|e| {
                anyhow::anyhow!("Failed to read reply file {}: {}", path.display(), e)
            })?),
        })
    }
}

/// Read document text from a PDF or a plain-text file.
pub(crate) fn read_document(path: &Path) -> anyhow::Result<String> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "pdf" => {
            let data = fs::read(path)?;
            let mut extractor = PdfExtractor::new();
            extractor.load(&data)?;

            let content = extractor.extract_all()?;
            match content.pdf_type {
                PdfType::Empty => anyhow::bail!("PDF appears to be empty"),
                PdfType::Image => {
                    anyhow::bail!("PDF is image-based; scanned reports are not supported")
                }
                PdfType::Hybrid => warn!(
                    "{} has image-only pages; their content is skipped",
                    path.display()
                ),
                PdfType::Text => {}
            }

            Ok(content.text)
        }
        "txt" | "text" => Ok(fs::read_to_string(path)?),
        _ => anyhow::bail!("Unsupported file format: {}", extension),
    }
}

/// Run one document through a fresh pipeline. Blocking.
pub(crate) fn run_document(
    path: &Path,
    source: &BackendSource,
    config: &VendesConfig,
    with_summary: bool,
) -> anyhow::Result<PipelineOutput> {
    let text = read_document(path)?;
    let pipeline = ExtractionPipeline::new(source.build()?, config);
    let output = if with_summary {
        pipeline.run(&text)?
    } else {
        pipeline.run_without_summary(&text)?
    };
    Ok(output)
}

/// File types accepted as input.
pub(crate) fn is_supported(path: &Path) -> bool {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    matches!(ext.to_lowercase().as_str(), "pdf" | "txt" | "text")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_supported() {
        assert!(is_supported(Path::new("march.PDF")));
        assert!(is_supported(Path::new("march.txt")));
        assert!(!is_supported(Path::new("march.png")));
        assert!(!is_supported(Path::new("march")));
    }

    #[test]
    fn test_read_text_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.txt");
        fs::write(&path, "1001 SAMARRETA 3 U 45,00").unwrap();
        assert_eq!(read_document(&path).unwrap(), "1001 SAMARRETA 3 U 45,00");
    }

    #[test]
    fn test_read_unsupported_document() {
        let err = read_document(Path::new("report.docx")).unwrap_err();
        assert!(err.to_string().contains("Unsupported file format"));
    }

    #[test]
    fn test_replay_source_needs_no_key() {
        let mut config = VendesConfig::default();
        config.backend.api_key_env = "VENDES_TEST_UNSET_KEY".to_string();

        let source = BackendSource::from_args(&config, Some(Path::new("reply.txt"))).unwrap();
        assert!(matches!(source, BackendSource::Replay(_)));
        assert!(BackendSource::from_args(&config, None).is_err());
    }
}
