//! Resume text extraction for uploaded files.
//!
//! PDFs go through `pdf-extract` on the blocking pool; anything else must already be
//! UTF-8 text.

use crate::errors::AppError;

const PDF_MAGIC: &[u8] = b"%PDF";

pub fn is_pdf(content_type: Option<&str>, file_name: Option<&str>, data: &[u8]) -> bool {
    content_type == Some("application/pdf")
        || file_name.is_some_and(|name| name.to_ascii_lowercase().ends_with(".pdf"))
        || data.starts_with(PDF_MAGIC)
}

/// Extracts plain text from an uploaded resume file.
pub async fn extract_resume_text(
    data: Vec<u8>,
    content_type: Option<&str>,
    file_name: Option<&str>,
) -> Result<String, AppError> {
    if !is_pdf(content_type, file_name, &data) {
        return String::from_utf8(data)
            .map_err(|_| AppError::Validation("resume_file must be a PDF or UTF-8 text".to_string()));
    }

    run_pdf_extraction(move || pdf_extract::extract_text_from_mem(&data)).await
}

/// Runs a PDF extractor on the blocking pool. `pdf-extract` panics on some malformed
/// documents, so a panicked task is reported as an unreadable upload, not a server fault.
async fn run_pdf_extraction<F>(extract: F) -> Result<String, AppError>
where
    F: FnOnce() -> Result<String, pdf_extract::OutputError> + Send + 'static,
{
    tokio::task::spawn_blocking(extract)
        .await
        .map_err(|e| AppError::Validation(format!("could not read text from resume PDF: {e}")))?
        .map_err(|e| AppError::Validation(format!("could not read text from resume PDF: {e}")))
}
