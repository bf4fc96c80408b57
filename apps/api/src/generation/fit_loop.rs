//! Fit-seeking loop: generate, render, measure, and regenerate with a stronger shorten
//! hint until the document fits one page or the iteration budget runs out.
//!
//! Each iteration is an independent generation from the original resume text, not an
//! edit of the previous draft. On exhaustion the last rendered attempt is returned with
//! `fits = false`; the loop never blocks waiting for a fit.

use std::sync::Arc;

use bytes::Bytes;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::generation::prompts::shorten_hint;
use crate::generation::{GenerationError, ResumeGenerator};
use crate::layout::{DocumentRenderer, RenderError};

/// Page budget the loop aims for.
pub const TARGET_PAGE_COUNT: u32 = 1;

#[derive(Debug, Error)]
pub enum FitError {
    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

#[derive(Debug, Clone)]
pub struct FitOutcome {
    pub markup: String,
    pub document: Bytes,
    pub page_count: u32,
    /// Generate/render rounds spent, including discarded ones.
    pub iterations: u32,
    pub fits: bool,
}

pub struct FitSeeker {
    generator: Arc<dyn ResumeGenerator>,
    renderer: Arc<dyn DocumentRenderer>,
    max_iterations: u32,
}

impl FitSeeker {
    pub fn new(
        generator: Arc<dyn ResumeGenerator>,
        renderer: Arc<dyn DocumentRenderer>,
        max_iterations: u32,
    ) -> Self {
        Self {
            generator,
            renderer,
            max_iterations: max_iterations.max(1),
        }
    }

    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    pub async fn run(
        &self,
        resume_text: &str,
        job_description: &str,
    ) -> Result<FitOutcome, FitError> {
        let mut last: Option<FitOutcome> = None;

        for iteration in 0..self.max_iterations {
            let is_last = iteration + 1 == self.max_iterations;
            let hint = shorten_hint(iteration);

            let markup = self
                .generator
                .generate(resume_text, job_description, hint)
                .await?;

            let rendered = match self.renderer.render(&markup).await {
                Ok(rendered) => rendered,
                Err(e) if is_last => return Err(e.into()),
                Err(e) => {
                    warn!(iteration, error = %e, "Draft failed to render; discarding and regenerating");
                    continue;
                }
            };

            let fits = rendered.page_count <= TARGET_PAGE_COUNT;
            debug!(iteration, page_count = rendered.page_count, fits, "Draft rendered");

            let outcome = FitOutcome {
                markup,
                document: rendered.document,
                page_count: rendered.page_count,
                iterations: iteration + 1,
                fits,
            };
            if fits {
                info!(iterations = outcome.iterations, "Document fits one page");
                return Ok(outcome);
            }
            last = Some(outcome);
        }

        // The terminal iteration either rendered (and set `last`) or returned its fault.
        match last {
            Some(outcome) => {
                warn!(
                    iterations = outcome.iterations,
                    page_count = outcome.page_count,
                    "Iteration budget exhausted; returning overflowing document"
                );
                Ok(outcome)
            }
            None => Err(FitError::Render(RenderError::InvalidMarkup(
                "no draft rendered".to_string(),
            ))),
        }
    }
}
