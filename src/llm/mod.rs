//! Language-model integration.
//!
//! [`CompletionClient`] wraps a [`CompletionBackend`] with a fixed-delay retry
//! policy. Backends are picked from [`LlmConfig`]: an external CLI (Ollama by
//! default), the Ollama or OpenAI HTTP APIs, or an echo backend for dry runs.

pub mod backend;
pub mod prompt;

pub use backend::{CommandBackend, CompletionBackend, EchoBackend, OllamaBackend, OpenAIBackend};
pub use prompt::{build_prompt, SegmentKind};

use crate::config::{LlmConfig, LlmProvider};
use crate::error::{BackendError, Result};
use std::time::Duration;
use tracing::warn;

/// How often to retry a failed prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retries: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 1,
            delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            retries: 0,
            delay: Duration::ZERO,
        }
    }

    pub fn from_config(config: &LlmConfig) -> Self {
        Self {
            retries: config.retries,
            delay: Duration::from_millis(config.retry_delay_ms),
        }
    }
}

/// Build the backend selected by `config.provider`
pub fn build_backend(config: &LlmConfig) -> Result<Box<dyn CompletionBackend>> {
    let backend: Box<dyn CompletionBackend> = match config.provider {
        LlmProvider::Command => Box::new(CommandBackend::from_config(config)),
        LlmProvider::Ollama => Box::new(OllamaBackend::from_config(config)?),
        LlmProvider::OpenAI => Box::new(OpenAIBackend::from_config(config)?),
        LlmProvider::Echo => Box::new(EchoBackend),
    };
    Ok(backend)
}

/// Sends prompts to a backend, one blocking call at a time
pub struct CompletionClient {
    backend: Box<dyn CompletionBackend>,
    retry: RetryPolicy,
}

impl CompletionClient {
    pub fn new(backend: Box<dyn CompletionBackend>, retry: RetryPolicy) -> Self {
        Self { backend, retry }
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        Ok(Self::new(build_backend(config)?, RetryPolicy::from_config(config)))
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Complete `prompt`, retrying failures up to the policy limit
    pub fn complete(&self, prompt: &str) -> std::result::Result<String, BackendError> {
        let attempts = self.retry.retries + 1;
        let mut attempt = 1;

        loop {
            match self.backend.complete(prompt) {
                Ok(text) => return Ok(text),
                Err(err) if attempt < attempts => {
                    warn!(
                        "{} failed (attempt {}/{}): {}; retrying",
                        self.backend.name(),
                        attempt,
                        attempts,
                        err
                    );
                    std::thread::sleep(self.retry.delay);
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
