//! Plain text document parser.

use super::DocumentParser;
use crate::error::IngestResult;
use std::path::Path;

/// Parser for plain text files. The whole file is a single text unit.
pub struct TextParser;

impl TextParser {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TextParser {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentParser for TextParser {
    fn parse(&self, path: &Path) -> IngestResult<Vec<String>> {
        let bytes = std::fs::read(path)?;
        // Stray non-UTF-8 bytes are replaced rather than rejecting the file
        let content = String::from_utf8_lossy(&bytes).into_owned();

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![content])
    }

    fn extensions(&self) -> &[&str] {
        &["txt"]
    }
}
