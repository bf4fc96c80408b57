//! Line wrapping and pagination.
//!
//! Greedy word wrap against measured glyph widths, then a top-to-bottom cursor that
//! starts a new page whenever the next line would cross the bottom margin. The
//! number of pages produced here is the document's page count.

use crate::layout::font_metrics::{get_metrics, FontFace, PageConfig};
use crate::layout::markup::Block;

/// Horizontal offset of a bullet's marker from the left margin.
const BULLET_MARKER_INDENT_PT: f32 = 4.0;
/// Offset of the bullet text (and its continuation lines) from the left margin.
const BULLET_TEXT_INDENT_PT: f32 = 14.0;
/// Helvetica descends about 0.21 em below the baseline.
const DESCENT_EM: f32 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockStyle {
    pub face: FontFace,
    pub size_pt: f32,
    pub space_before_pt: f32,
    pub indent_pt: f32,
}

pub fn style_for(block: &Block) -> BlockStyle {
    let (face, size_pt, space_before_pt, indent_pt) = match block {
        Block::Title(_) => (FontFace::Bold, 18.0, 0.0, 0.0),
        Block::Paragraph(_) => (FontFace::Regular, 10.0, 2.0, 0.0),
        Block::Section(_) => (FontFace::Bold, 12.0, 10.0, 0.0),
        Block::Entry(_) => (FontFace::Bold, 10.5, 5.0, 0.0),
        Block::Bullet(_) => (FontFace::Regular, 10.0, 1.5, BULLET_TEXT_INDENT_PT),
    };
    BlockStyle {
        face,
        size_pt,
        space_before_pt,
        indent_pt,
    }
}

/// One run of text at an absolute position on a page.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    pub face: FontFace,
    pub size_pt: f32,
    pub x_pt: f32,
    pub baseline_pt: f32,
    pub text: String,
}

#[derive(Debug, Clone, Default)]
pub struct Page {
    pub lines: Vec<PlacedLine>,
}

/// Greedy word wrap. A single word wider than the line is kept whole on its own line.
pub fn wrap_text(text: &str, face: FontFace, size_pt: f32, max_width_pt: f32) -> Vec<String> {
    let metrics = get_metrics(face);
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }
        let candidate = format!("{current} {word}");
        if metrics.measure_str(&candidate, size_pt) <= max_width_pt {
            current = candidate;
        } else {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

struct Cursor<'a> {
    config: &'a PageConfig,
    pages: Vec<Page>,
    /// Top edge of the next line box.
    y: f32,
}

impl<'a> Cursor<'a> {
    fn new(config: &'a PageConfig) -> Self {
        Self {
            config,
            pages: vec![Page::default()],
            y: config.top_pt(),
        }
    }

    fn page_is_empty(&self) -> bool {
        self.pages.last().map_or(true, |p| p.lines.is_empty())
    }

    /// Vertical gap before a block; swallowed at the top of a page.
    fn space(&mut self, pt: f32) {
        if !self.page_is_empty() {
            self.y -= pt;
        }
    }

    /// Reserves one line box and returns its baseline, breaking the page if needed.
    fn advance(&mut self, size_pt: f32) -> f32 {
        let line_height = size_pt * self.config.line_height;
        if self.y - line_height < self.config.margin_pt && !self.page_is_empty() {
            self.pages.push(Page::default());
            self.y = self.config.top_pt();
        }
        self.y -= line_height;
        self.y + DESCENT_EM * size_pt
    }

    fn place(&mut self, line: PlacedLine) {
        if let Some(page) = self.pages.last_mut() {
            page.lines.push(line);
        }
    }
}

/// Lays out blocks onto as many pages as they need. Always returns at least one page.
pub fn paginate(blocks: &[Block], config: &PageConfig) -> Vec<Page> {
    let mut cursor = Cursor::new(config);

    for block in blocks {
        let style = style_for(block);
        let lines = wrap_text(
            block.text(),
            style.face,
            style.size_pt,
            config.text_width_pt() - style.indent_pt,
        );
        cursor.space(style.space_before_pt);

        for (i, text) in lines.into_iter().enumerate() {
            let baseline_pt = cursor.advance(style.size_pt);
            if i == 0 && matches!(block, Block::Bullet(_)) {
                cursor.place(PlacedLine {
                    face: FontFace::Regular,
                    size_pt: style.size_pt,
                    x_pt: config.margin_pt + BULLET_MARKER_INDENT_PT,
                    baseline_pt,
                    text: "-".to_string(),
                });
            }
            cursor.place(PlacedLine {
                face: style.face,
                size_pt: style.size_pt,
                x_pt: config.margin_pt + style.indent_pt,
                baseline_pt,
                text,
            });
        }
    }

    cursor.pages
}
