//! PDF text extraction using lopdf and pdf-extract.

use lopdf::Document;
use tracing::debug;

use super::TextSource;
use crate::error::{DocexError, PdfError};

/// Produces the text layer of a PDF, pages separated by line breaks.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfTextSource;

impl PdfTextSource {
    pub fn new() -> Self {
        Self
    }

    /// Load the document, decrypting it when it only has an empty password,
    /// and return the bytes pdf-extract should read.
    fn prepare(&self, data: &[u8]) -> Result<Vec<u8>, PdfError> {
        let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        let page_count = doc.get_pages().len();
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }
        debug!("Loaded PDF with {} pages", page_count);

        if !doc.is_encrypted() {
            return Ok(data.to_vec());
        }

        if doc.decrypt("").is_err() {
            return Err(PdfError::Encrypted);
        }
        debug!("Decrypted PDF with empty password");

        let mut decrypted = Vec::new();
        doc.save_to(&mut decrypted)
            .map_err(|e| PdfError::Parse(format!("Failed to save decrypted PDF: {}", e)))?;
        Ok(decrypted)
    }
}

impl TextSource for PdfTextSource {
    fn text(&self, data: &[u8]) -> crate::Result<String> {
        let bytes = self.prepare(data)?;
        let text = pdf_extract::extract_text_from_mem(&bytes)
            .map_err(|e| DocexError::from(PdfError::TextExtraction(e.to_string())))?;

        debug!("Extracted {} characters of PDF text", text.len());
        Ok(text)
    }
}
