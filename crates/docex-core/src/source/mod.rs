//! Turning a document into the raw text the extractors read.

#[cfg(feature = "pdf")]
mod pdf;

#[cfg(feature = "pdf")]
pub use pdf::PdfTextSource;

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::DocexError;

/// Produces text for a document.
pub trait TextSource {
    /// Extract the document's text from its raw bytes.
    fn text(&self, data: &[u8]) -> crate::Result<String>;
}

/// Documents that already are text. Invalid UTF-8 is replaced.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextSource;

impl TextSource for PlainTextSource {
    fn text(&self, data: &[u8]) -> crate::Result<String> {
        Ok(String::from_utf8_lossy(data).into_owned())
    }
}

/// Pick a text source from the file extension.
pub fn source_for_path(path: &Path) -> crate::Result<Box<dyn TextSource + Send + Sync>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        #[cfg(feature = "pdf")]
        "pdf" => Ok(Box::new(PdfTextSource::new())),
        "txt" | "text" => Ok(Box::new(PlainTextSource)),
        _ => Err(DocexError::UnsupportedSource(extension)),
    }
}

/// Read a document from disk and produce its text.
pub fn read_document(path: &Path) -> crate::Result<String> {
    let source = source_for_path(path)?;
    let data = fs::read(path)?;
    let text = source.text(&data)?;

    debug!("Read {} characters from {}", text.len(), path.display());
    Ok(text)
}
