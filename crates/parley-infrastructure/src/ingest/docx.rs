//! DOCX raw-text extraction.
//!
//! Reads `word/document.xml` from the OOXML archive and walks it with a
//! streaming XML reader. Run text (`w:t`) is emitted as-is, `w:tab` becomes a
//! tab, `w:br`/`w:cr` become newlines and every paragraph ends with a blank line.

use std::io::{Cursor, Read};

use parley_core::{ParleyError, Result};
use quick_xml::Reader;
use quick_xml::events::Event;
use zip::ZipArchive;

const DOCUMENT_PART: &str = "word/document.xml";

/// Extracts the raw text of a DOCX file.
///
/// Blocking; call it from the blocking pool.
pub fn extract_text(file_name: &str, bytes: &[u8]) -> Result<String> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ParleyError::extraction(file_name, format!("not a DOCX archive: {e}")))?;

    let mut xml = String::new();
    archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| ParleyError::extraction(file_name, format!("missing {DOCUMENT_PART}: {e}")))?
        .read_to_string(&mut xml)
        .map_err(|e| ParleyError::extraction(file_name, format!("unreadable {DOCUMENT_PART}: {e}")))?;

    document_text(&xml).map_err(|e| ParleyError::extraction(file_name, e))
}

/// Walks `word/document.xml` and collects its text.
fn document_text(xml: &str) -> std::result::Result<String, String> {
    let mut reader = Reader::from_str(xml);
    let mut text = String::new();
    let mut in_run_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"t" => in_run_text = true,
                b"tab" => text.push('\t'),
                b"br" | b"cr" => text.push('\n'),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"tab" => text.push('\t'),
                b"br" | b"cr" => text.push('\n'),
                b"p" => text.push_str("\n\n"),
                _ => {}
            },
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_run_text = false,
                b"p" => text.push_str("\n\n"),
                _ => {}
            },
            Ok(Event::Text(t)) if in_run_text => {
                let decoded = t.decode().map_err(|e| e.to_string())?;
                text.push_str(&decoded);
            }
            Ok(Event::CData(t)) if in_run_text => {
                let decoded = t.decode().map_err(|e| e.to_string())?;
                text.push_str(&decoded);
            }
            Ok(Event::GeneralRef(r)) if in_run_text => {
                if let Some(ch) = r.resolve_char_ref().map_err(|e| e.to_string())? {
                    text.push(ch);
                } else {
                    let name = r.decode().map_err(|e| e.to_string())?;
                    let resolved = quick_xml::escape::resolve_xml_entity(&name)
                        .ok_or_else(|| format!("unknown entity &{name};"))?;
                    text.push_str(resolved);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(format!(
                    "XML error at position {}: {e}",
                    reader.error_position()
                ));
            }
            _ => {}
        }
    }

    Ok(text)
}
