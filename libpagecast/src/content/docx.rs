//! Plain text extraction from `.docx` documents
//!
//! Only the main document part (`word/document.xml`) is read. Each `<w:p>`
//! becomes one paragraph made of its `<w:t>` runs; tabs and line breaks
//! inside a paragraph are kept as `\t` and `\n`.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::ContentError;

const DOCUMENT_PART: &str = "word/document.xml";

/// Read a `.docx` file and join its non-blank paragraphs with `\n`
pub fn read_docx_text(path: &Path) -> Result<String, ContentError> {
    let document_error = |message: String| ContentError::Document {
        path: path.to_path_buf(),
        message,
    };

    let file = File::open(path).map_err(|source| ContentError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut archive = zip::ZipArchive::new(file).map_err(|e| document_error(e.to_string()))?;
    let mut xml = String::new();
    archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| document_error(format!("{}: {}", DOCUMENT_PART, e)))?
        .read_to_string(&mut xml)
        .map_err(|e| document_error(e.to_string()))?;

    let paragraphs = extract_paragraphs(&xml).map_err(|e| document_error(e.to_string()))?;

    Ok(paragraphs
        .into_iter()
        .filter(|p| !p.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n"))
}

/// Paragraph texts of a WordprocessingML document body, in document order
///
/// Paragraphs nested inside another paragraph (text boxes) do not start a
/// paragraph of their own and their text is not collected; the enclosing
/// paragraph keeps the text around them.
pub fn extract_paragraphs(xml: &str) -> Result<Vec<String>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut in_text = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.name().as_ref() {
                b"w:p" => {
                    if depth == 0 {
                        current.clear();
                    }
                    depth += 1;
                }
                b"w:t" => in_text = true,
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"w:p" if depth == 0 => paragraphs.push(String::new()),
                b"w:tab" if depth == 1 => current.push('\t'),
                b"w:br" | b"w:cr" if depth == 1 => current.push('\n'),
                _ => {}
            },
            Event::Text(t) if in_text && depth == 1 => {
                current.push_str(&t.unescape()?);
            }
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" if depth > 0 => {
                    depth -= 1;
                    if depth == 0 {
                        paragraphs.push(std::mem::take(&mut current));
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs)
}
