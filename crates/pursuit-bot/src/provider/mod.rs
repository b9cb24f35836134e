//! External reasoning providers consulted before the local policy.
//!
//! A provider turns a prompt into raw text; [`Decision::parse`] then checks
//! that text against the strict decision schema. Providers are tried in
//! priority order by the engine and never retried.

mod command;
mod prompt;
mod response;

pub use command::{CommandProvider, CommandProviderOptions};
pub use prompt::{PromptInput, build_prompt};
pub use response::Decision;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("provider is not configured: {0}")]
    NotConfigured(String),
    #[error("failed to spawn provider process: {0}")]
    Spawn(String),
    #[error("I/O error: {0}")]
    Io(String),
    #[error("provider timed out after {0} ms")]
    Timeout(u64),
    #[error("provider exited unsuccessfully: {0}")]
    Status(String),
    #[error("malformed decision: {0}")]
    Malformed(String),
    #[error("illegal decision: {0}")]
    Illegal(String),
}

/// One pluggable source of decisions.
pub trait ReasoningProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Providers without credentials are skipped rather than failed.
    fn is_configured(&self) -> bool {
        true
    }

    /// Sends the prompt and returns the provider's raw reply.
    fn complete(&self, prompt: &str) -> Result<String, ProviderError>;

    fn attempt_decision(&self, prompt: &str) -> Result<Decision, ProviderError> {
        let raw = self.complete(prompt)?;
        Decision::parse(&raw)
    }
}
