//! Static font-metric tables for the two PDF base-14 faces the renderer uses.
//!
//! Widths are the Adobe AFM advance widths in thousandths of an em, so
//! `width_pt = sum(widths) / 1000 * font_size_pt`. Base-14 fonts are not embedded,
//! which keeps these numbers exact for any conforming viewer.
//! Tables cover ASCII 0x20..=0x7E (95 printable characters); index = (char as usize) - 32.
//! Markup text is transliterated to ASCII before it is measured (see `markup`).

// ────────────────────────────────────────────────────────────────────────────
// Faces
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontFace {
    /// Body text, bullets, contact line.
    Regular,
    /// Name, section titles, entry headings.
    Bold,
}

impl FontFace {
    /// PostScript name written into the font dictionary.
    pub fn base_font(self) -> &'static str {
        match self {
            FontFace::Regular => "Helvetica",
            FontFace::Bold => "Helvetica-Bold",
        }
    }

    /// Key under `/Resources /Font` that content streams refer to.
    pub fn resource_name(self) -> &'static str {
        match self {
            FontFace::Regular => "F1",
            FontFace::Bold => "F2",
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Page configuration
// ────────────────────────────────────────────────────────────────────────────

/// Fixed page geometry, in PDF points (1/72 in).
#[derive(Debug, Clone)]
pub struct PageConfig {
    pub page_width_pt: f32,
    pub page_height_pt: f32,
    pub margin_pt: f32,
    /// Baseline-to-baseline distance as a multiple of the font size.
    pub line_height: f32,
}

impl PageConfig {
    pub fn text_width_pt(&self) -> f32 {
        self.page_width_pt - 2.0 * self.margin_pt
    }

    /// Y of the first line's top edge.
    pub fn top_pt(&self) -> f32 {
        self.page_height_pt - self.margin_pt
    }
}

/// US letter (8.5" × 11"), 0.6" margins all sides.
pub fn default_page_config() -> PageConfig {
    PageConfig {
        page_width_pt: 612.0,
        page_height_pt: 792.0,
        margin_pt: 43.2,
        line_height: 1.25,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Font metric table
// ────────────────────────────────────────────────────────────────────────────

pub struct FontMetricTable {
    widths: [u16; 95],
    /// Fallback for anything outside 0x20..=0x7E.
    pub average_char_width: u16,
}

impl FontMetricTable {
    /// Rendered width of `s` in points at `size_pt`.
    pub fn measure_str(&self, s: &str, size_pt: f32) -> f32 {
        let units: u32 = s
            .chars()
            .map(|c| {
                let code = c as usize;
                if (32..=126).contains(&code) {
                    u32::from(self.widths[code - 32])
                } else {
                    u32::from(self.average_char_width)
                }
            })
            .sum();
        units as f32 / 1000.0 * size_pt
    }
}

#[rustfmt::skip]
static HELVETICA: FontMetricTable = FontMetricTable {
    widths: [
        // sp   !    "    #    $    %    &    '
        278, 278, 355, 556, 556, 889, 667, 191,
        // (    )    *    +    ,    -    .    /
        333, 333, 389, 584, 278, 333, 278, 278,
        // 0-9
        556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
        // :    ;    <    =    >    ?    @
        278, 278, 584, 584, 584, 556, 1015,
        // A-Z
        667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833,
        722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
        // [    \    ]    ^    _    `
        278, 278, 278, 469, 556, 333,
        // a-z
        556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833,
        556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500,
        // {    |    }    ~
        334, 260, 334, 584,
    ],
    average_char_width: 556,
};

#[rustfmt::skip]
static HELVETICA_BOLD: FontMetricTable = FontMetricTable {
    widths: [
        // sp   !    "    #    $    %    &    '
        278, 333, 474, 556, 556, 889, 722, 238,
        // (    )    *    +    ,    -    .    /
        333, 333, 389, 584, 278, 333, 278, 278,
        // 0-9
        556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
        // :    ;    <    =    >    ?    @
        333, 333, 584, 584, 584, 611, 975,
        // A-Z
        722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
        722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
        // [    \    ]    ^    _    `
        333, 278, 333, 584, 556, 333,
        // a-z
        556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
        611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
        // {    |    }    ~
        389, 280, 389, 584,
    ],
    average_char_width: 611,
};

pub fn get_metrics(face: FontFace) -> &'static FontMetricTable {
    match face {
        FontFace::Regular => &HELVETICA,
        FontFace::Bold => &HELVETICA_BOLD,
    }
}
