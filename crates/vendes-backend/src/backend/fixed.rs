//! Backend answering every request with a canned reply.

use std::path::Path;
use std::sync::Mutex;

use tracing::debug;

use crate::error::BackendError;
use crate::{GenerationBackend, Result};

/// Backend that never leaves the process.
///
/// Used to replay a reply saved from an earlier run and as the backend
/// double in tests. Every instruction it receives is recorded.
pub struct FixedReplyBackend {
    reply: std::result::Result<String, String>,
    seen: Mutex<Vec<(String, f32)>>,
}

impl FixedReplyBackend {
    /// Answer every request with `reply`.
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: Ok(reply.into()),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Fail every request with a transport error carrying `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            reply: Err(message.into()),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Load the reply from a file saved by a previous run.
    pub fn from_file<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let path = path.as_ref();
        debug!("Loading canned reply from: {}", path.display());
        Ok(Self::new(std::fs::read_to_string(path)?))
    }

    /// Instructions received so far, with the requested temperature.
    pub fn requests(&self) -> Vec<(String, f32)> {
        self.seen.lock().map(|seen| seen.clone()).unwrap_or_default()
    }
}

impl GenerationBackend for FixedReplyBackend {
    fn generate(&self, instruction: &str, temperature: f32) -> Result<String> {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push((instruction.to_string(), temperature));
        }

        match &self.reply {
            Ok(reply) => Ok(reply.clone()),
            Err(message) => Err(BackendError::Transport(message.clone())),
        }
    }

    fn name(&self) -> &str {
        "fixed-reply"
    }
}
