//! Text extraction for the supported document formats.

mod docx;
mod pdf;
mod text;

pub use docx::DocxParser;
pub use pdf::PdfParser;
pub use text::TextParser;

use crate::error::{IngestError, IngestResult};
use docrag_core::TextExtractor;
use std::path::Path;
use tracing::debug;

/// Trait for document parsers.
pub trait DocumentParser: Send + Sync {
    /// Read a file into ordered text units (pages, paragraphs, or the whole file).
    fn parse(&self, path: &Path) -> IngestResult<Vec<String>>;

    /// Get the supported file extensions.
    fn extensions(&self) -> &[&str];

    /// Check if this parser supports the given extension.
    fn supports(&self, extension: &str) -> bool {
        self.extensions()
            .iter()
            .any(|ext| ext.eq_ignore_ascii_case(extension))
    }
}

/// [`TextExtractor`] that dispatches on the file extension.
pub struct FileExtractor {
    parsers: Vec<Box<dyn DocumentParser>>,
}

impl FileExtractor {
    pub fn new() -> Self {
        Self {
            parsers: vec![
                Box::new(PdfParser::new()),
                Box::new(DocxParser::new()),
                Box::new(TextParser::new()),
            ],
        }
    }

    fn parser_for(&self, path: &Path) -> Option<&dyn DocumentParser> {
        let extension = path.extension().and_then(|e| e.to_str())?;
        self.parsers
            .iter()
            .find(|p| p.supports(extension))
            .map(|p| p.as_ref())
    }

    /// Parse a file, failing for extensions no parser handles.
    pub fn parse(&self, path: &Path) -> IngestResult<Vec<String>> {
        let parser = self.parser_for(path).ok_or_else(|| {
            IngestError::UnsupportedFileType(
                path.extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("")
                    .to_string(),
            )
        })?;

        let units = parser.parse(path)?;
        debug!("Extracted {} text units from {}", units.len(), path.display());
        Ok(units)
    }
}

impl Default for FileExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl TextExtractor for FileExtractor {
    fn extract(&self, path: &Path) -> docrag_core::Result<Vec<String>> {
        self.parse(path).map_err(docrag_core::Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_dispatch_by_extension() {
        let mut file = NamedTempFile::with_suffix(".TXT").unwrap();
        write!(file, "Plain notes about the IVA rate.").unwrap();

        let units = FileExtractor::new().extract(file.path()).unwrap();
        assert_eq!(units, vec!["Plain notes about the IVA rate.".to_string()]);
    }

    #[test]
    fn test_unsupported_extension() {
        let file = NamedTempFile::with_suffix(".xlsx").unwrap();
        let err = FileExtractor::new().parse(file.path()).unwrap_err();
        assert!(matches!(err, IngestError::UnsupportedFileType(ext) if ext == "xlsx"));
    }
}
