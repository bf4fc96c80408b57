//! Generation collaborator: resume text + job description (+ shorten hint) → document markup.

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::generation::prompts::{build_generation_prompt, GENERATION_SYSTEM};
use crate::llm_client::{LlmClient, LlmError};

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("model returned no markup")]
    EmptyMarkup,

    #[error("generation provider still rate limited after {attempts} attempts")]
    ProviderBusy { attempts: u32 },
}

impl GenerationError {
    /// Transient provider throttling, worth retrying after a delay.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, GenerationError::Llm(e) if e.is_rate_limited())
    }
}

/// Produces resume markup tailored to a job description.
///
/// Output is non-deterministic: every call is an independent generation, never an
/// edit of a previous draft. `shorten_hint` is advisory text, not a hard constraint.
#[async_trait]
pub trait ResumeGenerator: Send + Sync {
    async fn generate(
        &self,
        resume_text: &str,
        job_description: &str,
        shorten_hint: Option<&str>,
    ) -> Result<String, GenerationError>;
}

/// Generator backed by the Claude Messages API. Makes exactly one call per invocation.
pub struct LlmResumeGenerator {
    llm: LlmClient,
}

impl LlmResumeGenerator {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl ResumeGenerator for LlmResumeGenerator {
    async fn generate(
        &self,
        resume_text: &str,
        job_description: &str,
        shorten_hint: Option<&str>,
    ) -> Result<String, GenerationError> {
        let prompt = build_generation_prompt(resume_text, job_description, shorten_hint);
        let markup = self.llm.call_text(&prompt, GENERATION_SYSTEM).await?;

        if markup.trim().is_empty() {
            return Err(GenerationError::EmptyMarkup);
        }
        debug!(
            chars = markup.len(),
            shortened = shorten_hint.is_some(),
            "Generated resume markup"
        );
        Ok(markup)
    }
}
