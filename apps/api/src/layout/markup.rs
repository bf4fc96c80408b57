//! Parser for the line-oriented resume markup the generator is asked to produce.
//!
//! ```text
//! # Jane Doe                       → Title (exactly one, first block)
//! jane@example.com | Berlin        → Paragraph
//! ## Experience                    → Section
//! ### Staff Engineer, Acme, 2021–  → Entry
//! - Cut p99 latency by 40%         → Bullet ("* " also accepted)
//! ```
//!
//! Anything structurally off is a `RenderError::InvalidMarkup` naming the line, so a
//! bad draft fails loudly instead of rendering as an empty or garbled page.

use crate::layout::RenderError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Title(String),
    Section(String),
    Entry(String),
    Bullet(String),
    Paragraph(String),
}

impl Block {
    pub fn text(&self) -> &str {
        match self {
            Block::Title(t)
            | Block::Section(t)
            | Block::Entry(t)
            | Block::Bullet(t)
            | Block::Paragraph(t) => t,
        }
    }
}

/// Parses markup into blocks, validating document structure.
pub fn parse_markup(markup: &str) -> Result<Vec<Block>, RenderError> {
    let mut blocks: Vec<Block> = Vec::new();
    let mut in_section = false;

    for (index, raw) in markup.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with("```") {
            return Err(invalid(line_no, "code fences are not supported"));
        }

        let block = match heading_level(line) {
            Some((level, text)) => {
                if text.is_empty() {
                    return Err(invalid(line_no, "heading has no text"));
                }
                match level {
                    1 if !blocks.is_empty() => {
                        return Err(invalid(line_no, "only one '#' title is allowed, at the top"))
                    }
                    1 => Block::Title(text),
                    2 => {
                        in_section = true;
                        Block::Section(text)
                    }
                    3 => Block::Entry(text),
                    _ => return Err(invalid(line_no, "headings deeper than '###' are not supported")),
                }
            }
            None => match bullet_text(line) {
                Some(_) if !in_section => {
                    return Err(invalid(line_no, "bullet appears before any '##' section"))
                }
                Some(text) => Block::Bullet(text),
                None => Block::Paragraph(clean_inline(line)),
            },
        };

        if blocks.is_empty() && !matches!(block, Block::Title(_)) {
            return Err(invalid(line_no, "document must start with a '# ' title"));
        }
        blocks.push(block);
    }

    if blocks.is_empty() {
        return Err(RenderError::InvalidMarkup("markup is empty".to_string()));
    }
    Ok(blocks)
}

fn invalid(line_no: usize, what: &str) -> RenderError {
    RenderError::InvalidMarkup(format!("line {line_no}: {what}"))
}

/// `## Text` → `Some((2, "Text"))`. Hashes not followed by whitespace are plain text.
fn heading_level(line: &str) -> Option<(usize, String)> {
    let level = line.chars().take_while(|&c| c == '#').count();
    if level == 0 {
        return None;
    }
    let rest = &line[level..];
    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        return None;
    }
    Some((level, clean_inline(rest.trim())))
}

fn bullet_text(line: &str) -> Option<String> {
    ["- ", "* ", "• "]
        .iter()
        .find_map(|marker| line.strip_prefix(marker))
        .map(|rest| clean_inline(rest.trim()))
        .filter(|text| !text.is_empty())
}

/// Drops emphasis markers and transliterates to the printable ASCII the fonts cover.
pub fn clean_inline(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.replace("**", "").replace("__", "").chars() {
        match c {
            ' '..='~' => out.push(c),
            '\u{2018}' | '\u{2019}' | '\u{2032}' => out.push('\''),
            '\u{201C}' | '\u{201D}' | '\u{2033}' => out.push('"'),
            '\u{2010}'..='\u{2015}' | '\u{2212}' => out.push('-'),
            '\u{2022}' | '\u{00B7}' => out.push('-'),
            '\u{2026}' => out.push_str("..."),
            '\u{00A0}' | '\t' => out.push(' '),
            _ => out.push('?'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# Jane Doe
jane@example.com | Berlin

## Experience
### Staff Engineer — Acme — 2021–present
- Cut **p99 latency** by 40% across 12 services
* Led migration to Rust

## Skills
Rust, Tokio, PostgreSQL
";

    #[test]
    fn test_parses_all_block_kinds() {
        let blocks = parse_markup(SAMPLE).unwrap();
        assert_eq!(
            blocks,
            vec![
                Block::Title("Jane Doe".into()),
                Block::Paragraph("jane@example.com | Berlin".into()),
                Block::Section("Experience".into()),
                Block::Entry("Staff Engineer - Acme - 2021-present".into()),
                Block::Bullet("Cut p99 latency by 40% across 12 services".into()),
                Block::Bullet("Led migration to Rust".into()),
                Block::Section("Skills".into()),
                Block::Paragraph("Rust, Tokio, PostgreSQL".into()),
            ]
        );
    }

    #[test]
    fn test_empty_markup_rejected() {
        let err = parse_markup("  \n\n ").unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_missing_title_rejected() {
        let err = parse_markup("## Experience\n- Did things").unwrap_err();
        assert!(err.to_string().contains("must start with"));
    }

    #[test]
    fn test_second_title_rejected() {
        let err = parse_markup("# Jane\n## Skills\n# Jane again").unwrap_err();
        assert!(err.to_string().contains("line 3"));
    }

    #[test]
    fn test_code_fence_rejected() {
        assert!(parse_markup("# Jane\n```\n## Skills").is_err());
    }

    #[test]
    fn test_deep_heading_rejected() {
        let err = parse_markup("# Jane\n## Skills\n#### Tiny").unwrap_err();
        assert!(err.to_string().contains("deeper"));
    }

    #[test]
    fn test_empty_heading_rejected() {
        assert!(parse_markup("# Jane\n##   \n").is_err());
    }

    #[test]
    fn test_bullet_before_section_rejected() {
        let err = parse_markup("# Jane\n- floating bullet").unwrap_err();
        assert!(err.to_string().contains("before any"));
    }

    #[test]
    fn test_hash_without_space_is_text() {
        let blocks = parse_markup("# Jane\n#rustlang enthusiast").unwrap();
        assert_eq!(blocks[1], Block::Paragraph("#rustlang enthusiast".into()));
    }

    #[test]
    fn test_clean_inline_transliterates() {
        assert_eq!(clean_inline("“Rust” – fast…"), "\"Rust\" - fast...");
        assert_eq!(clean_inline("naïve"), "na?ve");
    }
}
