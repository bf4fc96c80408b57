// Document rendering: markup → blocks → wrapped lines → pages → PDF bytes.
// Layout and serialization are CPU-bound and run inside tokio::task::spawn_blocking.

pub mod font_metrics;
pub mod markup;
pub mod paginate;
pub mod pdf;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

pub use font_metrics::{default_page_config, PageConfig};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid markup: {0}")]
    InvalidMarkup(String),

    #[error("pdf serialization failed: {0}")]
    Pdf(String),

    #[error("render task failed: {0}")]
    Task(String),
}

/// A rendered document and the number of pages it occupies.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub document: Bytes,
    pub page_count: u32,
}

#[async_trait]
pub trait DocumentRenderer: Send + Sync {
    async fn render(&self, markup: &str) -> Result<RenderedDocument, RenderError>;
}

/// Renders markup to a US-letter PDF using the base-14 Helvetica faces.
pub struct PdfRenderer {
    config: PageConfig,
}

impl PdfRenderer {
    pub fn new(config: PageConfig) -> Self {
        Self { config }
    }
}

impl Default for PdfRenderer {
    fn default() -> Self {
        Self::new(default_page_config())
    }
}

/// Synchronous render pass. Callers on the async runtime go through `PdfRenderer`.
pub fn render_sync(markup: &str, config: &PageConfig) -> Result<RenderedDocument, RenderError> {
    let blocks = markup::parse_markup(markup)?;
    let pages = paginate::paginate(&blocks, config);
    let document = pdf::write_pdf(&pages, config)?;
    Ok(RenderedDocument {
        document: Bytes::from(document),
        page_count: pages.len() as u32,
    })
}

#[async_trait]
impl DocumentRenderer for PdfRenderer {
    async fn render(&self, markup: &str) -> Result<RenderedDocument, RenderError> {
        let markup = markup.to_owned();
        let config = self.config.clone();
        tokio::task::spawn_blocking(move || render_sync(&markup, &config))
            .await
            .map_err(|e| RenderError::Task(format!("spawn_blocking failed in render: {e}")))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resume(bullets: usize) -> String {
        let mut markup = String::from(
            "# Jane Doe\njane@example.com | Berlin\n\n## Experience\n### Staff Engineer - Acme\n",
        );
        for i in 0..bullets {
            markup.push_str(&format!(
                "- Delivered initiative {i}, cutting infrastructure cost by a measurable margin\n"
            ));
        }
        markup.push_str("\n## Skills\nRust, Tokio, PostgreSQL\n");
        markup
    }

    #[tokio::test]
    async fn test_short_resume_renders_one_page() {
        let rendered = PdfRenderer::default().render(&resume(6)).await.unwrap();
        assert_eq!(rendered.page_count, 1);
        assert!(rendered.document.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_long_resume_renders_multiple_pages() {
        let rendered = PdfRenderer::default().render(&resume(150)).await.unwrap();
        assert!(rendered.page_count > 1);

        let loaded = lopdf::Document::load_mem(&rendered.document).unwrap();
        assert_eq!(loaded.get_pages().len() as u32, rendered.page_count);
    }

    #[tokio::test]
    async fn test_invalid_markup_is_a_render_error() {
        let err = PdfRenderer::default()
            .render("no title here\n- stray")
            .await
            .unwrap_err();
        assert!(matches!(err, RenderError::InvalidMarkup(_)));
    }
}
