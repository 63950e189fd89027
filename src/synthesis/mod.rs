//! Insight synthesis.
//!
//! The merged analysis is serialized into a single prompt and handed to an
//! external narrative generator. A failure here degrades the report but
//! never discards the numbers.

pub mod ollama;
pub mod prompt;

use crate::error::{ReviewError, ReviewResult};
use async_trait::async_trait;

pub use ollama::{OllamaSynthesizer, SynthesizerConfig};
pub use prompt::build_prompt;

/// External narrative generator.
#[async_trait]
pub trait InsightSynthesizer: Send + Sync {
    /// Turn a structured prompt into free-form narrative text.
    async fn synthesize(&self, prompt: &str) -> ReviewResult<String>;

    /// Model name recorded in the run metadata.
    fn model_name(&self) -> String;
}

/// Synthesizer used when insights are switched off.
#[derive(Debug, Clone, Default)]
pub struct DisabledSynthesizer;

#[async_trait]
impl InsightSynthesizer for DisabledSynthesizer {
    async fn synthesize(&self, _prompt: &str) -> ReviewResult<String> {
        Err(ReviewError::Synthesis("insights disabled".to_string()))
    }

    fn model_name(&self) -> String {
        "none".to_string()
    }
}
