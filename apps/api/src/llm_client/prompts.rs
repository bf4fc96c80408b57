// Shared prompt fragments. Each service that needs LLM calls defines its own
// prompts.rs alongside it; this file only holds cross-cutting instructions.

/// Keeps the model from wrapping the document in commentary.
pub const RAW_OUTPUT_INSTRUCTION: &str = "\
    Respond with the document only. \
    Do NOT include any text before or after it. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Forbids inventing experience the candidate does not have.
pub const FACTUALITY_INSTRUCTION: &str = "\
    CRITICAL: Every statement must be supported by the candidate's resume text. \
    Rephrase, reorder, and emphasise to match the job description, but do NOT invent \
    employers, titles, dates, degrees, metrics, or skills. \
    If the resume does not support a claim, omit it entirely.";
