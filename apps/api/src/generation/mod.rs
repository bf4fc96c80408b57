// Tailoring engine: generation collaborator, provider rate-limit retry, and the
// fit-seeking loop that regenerates until the rendered document fits one page.
// All LLM calls go through llm_client — no direct Anthropic calls here.

pub mod fit_loop;
pub mod generator;
pub mod handlers;
pub mod prompts;
pub mod retry;

pub use generator::{GenerationError, ResumeGenerator};
