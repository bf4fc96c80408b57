// All LLM prompt constants for the tailoring engine.
// Reuses cross-cutting fragments from llm_client::prompts.

use crate::llm_client::prompts::{FACTUALITY_INSTRUCTION, RAW_OUTPUT_INSTRUCTION};

/// System prompt for resume tailoring.
pub const GENERATION_SYSTEM: &str = "You are an expert resume writer. \
    You rewrite a candidate's resume so it targets one specific job description, \
    using only facts from the candidate's own resume. \
    You write in the line-oriented markup described in the request and nothing else.";

/// Markup dialect the renderer understands. Kept in sync with `layout::markup`.
pub const MARKUP_RULES: &str = "\
OUTPUT FORMAT (one construct per line):\n\
# Candidate Name            (exactly once, first line)\n\
plain line                  (contact line or short summary paragraph)\n\
## Section Title            (e.g. Experience, Education, Skills, Projects)\n\
### Entry heading           (e.g. Role — Company — Dates)\n\
- bullet text               (achievements under an entry or section)\n\
Blank lines separate blocks. No tables, no code fences, no headings deeper than ###.";

/// Instruction header of the tailoring request.
/// Replace: {factuality_instruction}, {raw_output_instruction}, {markup_rules}, {length_guidance}
pub const GENERATION_PROMPT_TEMPLATE: &str = r#"{factuality_instruction}

{raw_output_instruction}

{markup_rules}

LENGTH GUIDANCE:
{length_guidance}"#;

pub const GENERATION_TASK: &str = "\
Rewrite the resume for this job. Lead with the most relevant experience, mirror the job \
description's terminology where the resume supports it, and quantify outcomes that the \
resume already quantifies.";

/// First draft: comprehensive, not pre-constrained.
pub const FIRST_DRAFT_GUIDANCE: &str = "\
Produce a complete, comprehensive draft. Include every relevant role, project, and skill.";

/// Iteration 1: the previous draft overflowed.
pub const MODERATE_SHORTEN_HINT: &str = "\
The previous draft overflowed a single page. Shorten it: reduce to at most 4 bullets per role, \
condense phrasing, merge overlapping bullets, and trim the summary to one sentence.";

/// Iteration 2 and later: drafts keep overflowing.
pub const AGGRESSIVE_SHORTEN_HINT: &str = "\
STRICT ONE-PAGE CONSTRAINT: previous drafts still overflowed. Include only the minimum content: \
at most 3 bullets for the most recent role and at most 2 bullets for each earlier role, \
every bullet a single short line, no summary paragraph, omit roles and projects irrelevant \
to the job, and list skills on one line.";

/// Shorten hint for a fit-seeking iteration. Severity only ever increases with `iteration`.
pub fn shorten_hint(iteration: u32) -> Option<&'static str> {
    match iteration {
        0 => None,
        1 => Some(MODERATE_SHORTEN_HINT),
        _ => Some(AGGRESSIVE_SHORTEN_HINT),
    }
}

/// Fills the generation template for one attempt.
pub fn build_generation_prompt(
    resume_text: &str,
    job_description: &str,
    shorten_hint: Option<&str>,
) -> String {
    let instructions = GENERATION_PROMPT_TEMPLATE
        .replace("{factuality_instruction}", FACTUALITY_INSTRUCTION)
        .replace("{raw_output_instruction}", RAW_OUTPUT_INSTRUCTION)
        .replace("{markup_rules}", MARKUP_RULES)
        .replace(
            "{length_guidance}",
            shorten_hint.unwrap_or(FIRST_DRAFT_GUIDANCE),
        );

    // User text is appended, never substituted, so braces in it stay literal.
    format!(
        "{instructions}\n\n\
         CANDIDATE RESUME (source of truth — ONLY use facts from this):\n{}\n\n\
         JOB DESCRIPTION:\n{}\n\n\
         {GENERATION_TASK}",
        resume_text.trim(),
        job_description.trim(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_iteration_has_no_hint() {
        assert_eq!(shorten_hint(0), None);
    }

    #[test]
    fn test_hints_escalate() {
        let moderate = shorten_hint(1).unwrap();
        let aggressive = shorten_hint(2).unwrap();
        assert_ne!(moderate, aggressive);
        assert!(moderate.contains("at most 4 bullets"));
        assert!(aggressive.contains("at most 3 bullets"));
        assert!(aggressive.contains("STRICT ONE-PAGE"));
        // Past the schedule the most severe hint repeats.
        assert_eq!(shorten_hint(7), Some(aggressive));
    }

    #[test]
    fn test_prompt_without_hint_asks_for_full_draft() {
        let prompt = build_generation_prompt("Jane Doe, Rust engineer", "Hiring Rust devs", None);
        assert!(prompt.contains(FIRST_DRAFT_GUIDANCE));
        assert!(prompt.contains("Jane Doe, Rust engineer"));
        assert!(prompt.contains("Hiring Rust devs"));
        assert!(!prompt.contains("{"), "all placeholders filled");
    }

    #[test]
    fn test_prompt_with_hint_replaces_guidance() {
        let prompt = build_generation_prompt("r", "j", Some(AGGRESSIVE_SHORTEN_HINT));
        assert!(prompt.contains(AGGRESSIVE_SHORTEN_HINT));
        assert!(!prompt.contains(FIRST_DRAFT_GUIDANCE));
    }

    #[test]
    fn test_user_text_placeholders_not_expanded() {
        let prompt = build_generation_prompt("I wrote {length_guidance} once", "{resume_text}", None);
        assert!(prompt.contains("I wrote {length_guidance} once"));
        assert!(prompt.contains("JOB DESCRIPTION:\n{resume_text}"));
    }
}
