//! PDF writer for paginated lines.
//!
//! Uses the two base-14 Helvetica faces, so no font program is embedded and the
//! widths in `font_metrics` are the widths the viewer will use.

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream};

use crate::layout::font_metrics::{FontFace, PageConfig};
use crate::layout::paginate::Page;
use crate::layout::RenderError;

fn font_dictionary(face: FontFace) -> Dictionary {
    Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(face.base_font().as_bytes().to_vec())),
        ("Encoding", Object::Name(b"WinAnsiEncoding".to_vec())),
    ])
}

fn page_operations(page: &Page) -> Vec<Operation> {
    let mut operations = Vec::with_capacity(page.lines.len() * 4);
    for line in &page.lines {
        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new(
            "Tf",
            vec![
                Object::Name(line.face.resource_name().as_bytes().to_vec()),
                Object::Real(line.size_pt),
            ],
        ));
        operations.push(Operation::new(
            "Td",
            vec![Object::Real(line.x_pt), Object::Real(line.baseline_pt)],
        ));
        operations.push(Operation::new(
            "Tj",
            vec![Object::string_literal(line.text.as_bytes().to_vec())],
        ));
        operations.push(Operation::new("ET", vec![]));
    }
    operations
}

/// Serializes pages into a PDF byte buffer. Output is deterministic for equal input.
pub fn write_pdf(pages: &[Page], config: &PageConfig) -> Result<Vec<u8>, RenderError> {
    let mut document = Document::with_version("1.5");

    let pages_id = document.new_object_id();
    let regular_id = document.add_object(font_dictionary(FontFace::Regular));
    let bold_id = document.add_object(font_dictionary(FontFace::Bold));
    let resources_id = document.add_object(Dictionary::from_iter(vec![(
        "Font",
        Object::Dictionary(Dictionary::from_iter(vec![
            (FontFace::Regular.resource_name(), Object::Reference(regular_id)),
            (FontFace::Bold.resource_name(), Object::Reference(bold_id)),
        ])),
    )]));

    let mut kids = Vec::with_capacity(pages.len());
    for page in pages {
        let content = Content {
            operations: page_operations(page),
        };
        let encoded = content
            .encode()
            .map_err(|e| RenderError::Pdf(format!("encoding page content: {e}")))?;
        let content_id = document.add_object(Stream::new(Dictionary::new(), encoded));
        let page_id = document.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            ("Contents", Object::Reference(content_id)),
            ("Resources", Object::Reference(resources_id)),
        ]));
        kids.push(Object::Reference(page_id));
    }

    let page_count = kids.len() as i64;
    document.objects.insert(
        pages_id,
        Object::Dictionary(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Kids", Object::Array(kids)),
            ("Count", Object::Integer(page_count)),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Real(config.page_width_pt),
                    Object::Real(config.page_height_pt),
                ]),
            ),
        ])),
    );

    let catalog_id = document.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    document.trailer.set("Root", Object::Reference(catalog_id));
    document.compress();

    let mut bytes = Vec::new();
    document
        .save_to(&mut bytes)
        .map_err(|e| RenderError::Pdf(format!("writing document: {e}")))?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::font_metrics::default_page_config;
    use crate::layout::paginate::PlacedLine;

    fn page_with(text: &str) -> Page {
        Page {
            lines: vec![PlacedLine {
                face: FontFace::Bold,
                size_pt: 18.0,
                x_pt: 43.2,
                baseline_pt: 730.0,
                text: text.to_string(),
            }],
        }
    }

    #[test]
    fn test_written_pdf_loads_with_page_count() {
        let config = default_page_config();
        let bytes = write_pdf(&[page_with("Jane Doe"), page_with("Page two")], &config).unwrap();

        assert!(bytes.starts_with(b"%PDF-1.5"));
        let loaded = Document::load_mem(&bytes).unwrap();
        assert_eq!(loaded.get_pages().len(), 2);
    }

    #[test]
    fn test_output_is_deterministic() {
        let config = default_page_config();
        let pages = [page_with("Jane Doe")];
        assert_eq!(
            write_pdf(&pages, &config).unwrap(),
            write_pdf(&pages, &config).unwrap()
        );
    }

    #[test]
    fn test_content_stream_carries_text_and_fonts() {
        let ops = page_operations(&page_with("Jane (Doe)"));
        let operators: Vec<&str> = ops.iter().map(|op| op.operator.as_str()).collect();
        assert_eq!(operators, vec!["BT", "Tf", "Td", "Tj", "ET"]);

        let encoded = Content { operations: ops }.encode().unwrap();
        let text = String::from_utf8_lossy(&encoded);
        assert!(text.contains("/F2"));
        assert!(text.contains("Doe"));
    }
}
