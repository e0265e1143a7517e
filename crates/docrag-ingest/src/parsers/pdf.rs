//! PDF document parser.

use super::DocumentParser;
use crate::error::{IngestError, IngestResult};
use std::path::Path;
use tracing::debug;

/// Parser for PDF files. Produces one text unit per page.
pub struct PdfParser;

impl PdfParser {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PdfParser {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentParser for PdfParser {
    fn parse(&self, path: &Path) -> IngestResult<Vec<String>> {
        debug!("Parsing PDF: {:?}", path);

        let content = pdf_extract::extract_text(path).map_err(|e| IngestError::ParseError {
            path: path.to_path_buf(),
            message: format!("Failed to extract text from PDF: {}", e),
        })?;

        let pages = split_pages(&content);
        debug!("Extracted {} pages from PDF", pages.len());

        Ok(pages)
    }

    fn extensions(&self) -> &[&str] {
        &["pdf"]
    }
}

/// Split extracted text on form feeds, cleaning each page and dropping blank ones.
fn split_pages(text: &str) -> Vec<String> {
    text.split('\x0C')
        .map(clean_pdf_text)
        .filter(|page| !page.is_empty())
        .collect()
}

/// Trim lines and collapse runs of blank lines.
fn clean_pdf_text(text: &str) -> String {
    text.lines()
        .map(|line| line.trim())
        .fold(Vec::new(), |mut acc: Vec<&str>, line| {
            let last_was_empty = acc.last().map(|s| s.is_empty()).unwrap_or(true);
            if !(line.is_empty() && last_was_empty) {
                acc.push(line);
            }
            acc
        })
        .join("\n")
        .trim()
        .to_string()
}
