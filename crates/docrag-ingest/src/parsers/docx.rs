//! Word (.docx) document parser.

use super::DocumentParser;
use crate::error::{IngestError, IngestResult};
use quick_xml::events::Event;
use std::io::Read;
use std::path::Path;

const DOCUMENT_XML: &str = "word/document.xml";
const MAX_XML_ENTRY_BYTES: u64 = 64 * 1024 * 1024;

/// Parser for Office Open XML word documents. Produces one text unit per paragraph.
pub struct DocxParser;

impl DocxParser {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DocxParser {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentParser for DocxParser {
    fn parse(&self, path: &Path) -> IngestResult<Vec<String>> {
        let parse_error = |message: String| IngestError::ParseError {
            path: path.to_path_buf(),
            message,
        };

        let file = std::fs::File::open(path)?;
        let mut archive = zip::ZipArchive::new(file).map_err(|e| parse_error(e.to_string()))?;
        let entry = archive
            .by_name(DOCUMENT_XML)
            .map_err(|e| parse_error(format!("{}: {}", DOCUMENT_XML, e)))?;

        let mut xml = Vec::new();
        entry.take(MAX_XML_ENTRY_BYTES).read_to_end(&mut xml)?;
        if xml.len() as u64 >= MAX_XML_ENTRY_BYTES {
            return Err(parse_error(format!("{} exceeds size limit", DOCUMENT_XML)));
        }

        paragraphs(&xml).map_err(parse_error)
    }

    fn extensions(&self) -> &[&str] {
        &["docx"]
    }
}

/// Collect the text of each `w:p` element, skipping empty paragraphs.
fn paragraphs(xml: &[u8]) -> Result<Vec<String>, String> {
    let mut reader = quick_xml::Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut out = Vec::new();
    let mut current = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"t" => in_text = true,
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => {
                    let text = current.trim();
                    if !text.is_empty() {
                        out.push(text.to_string());
                    }
                    current.clear();
                }
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"tab" => current.push('\t'),
                b"br" => current.push('\n'),
                _ => {}
            },
            Ok(Event::Text(te)) if in_text => {
                let text = te.unescape().map_err(|e| e.to_string())?;
                current.push_str(&text);
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.to_string()),
            _ => {}
        }
        buf.clear();
    }

    // Text outside any paragraph element
    let tail = current.trim();
    if !tail.is_empty() {
        out.push(tail.to_string());
    }

    Ok(out)
}
