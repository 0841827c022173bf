//! PDF text extraction.

use lopdf::Document;
use parley_core::{ParleyError, Result};

/// Text used when a PDF cannot be decoded.
pub fn fallback_text(file_name: &str) -> String {
    format!(
        "PDF-Datei \"{file_name}\" wurde hochgeladen, aber der Text konnte nicht extrahiert werden. \
Bitte beschreiben Sie den Inhalt oder stellen Sie Ihre Frage zum PDF."
    )
}

/// Extracts the text of every page, labeled with its page number.
///
/// Blocking; call it from the blocking pool.
pub fn extract_text(file_name: &str, bytes: &[u8]) -> Result<String> {
    let document = Document::load_mem(bytes)
        .map_err(|e| ParleyError::extraction(file_name, format!("failed to load PDF: {e}")))?;

    let pages = document.get_pages();
    tracing::debug!(file = file_name, pages = pages.len(), "Loaded PDF");

    let mut page_texts = Vec::with_capacity(pages.len());
    for &page_number in pages.keys() {
        let raw = document.extract_text(&[page_number]).map_err(|e| {
            ParleyError::extraction(
                file_name,
                format!("failed to read page {page_number}: {e}"),
            )
        })?;
        page_texts.push((page_number, raw));
    }

    Ok(join_pages(page_texts))
}

/// Collapses whitespace per page, drops blank pages and labels the rest.
pub(crate) fn join_pages<I, S>(pages: I) -> String
where
    I: IntoIterator<Item = (u32, S)>,
    S: AsRef<str>,
{
    pages
        .into_iter()
        .filter_map(|(number, raw)| {
            let text = raw.as_ref().split_whitespace().collect::<Vec<_>>().join(" ");
            if text.is_empty() {
                None
            } else {
                Some(format!("=== Seite {number} ===\n{text}"))
            }
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{Object, Stream, dictionary};

    /// Builds a PDF with one page per entry; `None` is a page without text.
    fn build_pdf(pages: &[Option<&str>]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for text in pages {
            let operations = match text {
                Some(text) => vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 24.into()]),
                    Operation::new("Td", vec![100.into(), 600.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ],
                None => Vec::new(),
            };
            let content = Content { operations };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn test_extract_text_labels_pages_and_skips_blank_ones() {
        let bytes = build_pdf(&[Some("Hallo Welt"), None, Some("Dritte Seite")]);
        assert_eq!(
            extract_text("x.pdf", &bytes).unwrap(),
            "=== Seite 1 ===\nHallo Welt\n\n=== Seite 3 ===\nDritte Seite"
        );
    }

    #[test]
    fn test_extract_text_without_any_text() {
        let bytes = build_pdf(&[None]);
        assert_eq!(extract_text("leer.pdf", &bytes).unwrap(), "");
    }

    #[test]
    fn test_join_pages_labels_each_page() {
        let joined = join_pages(vec![(1, "Erste  Seite\n"), (2, "Zweite\tSeite")]);
        assert_eq!(
            joined,
            "=== Seite 1 ===\nErste Seite\n\n=== Seite 2 ===\nZweite Seite"
        );
    }

    #[test]
    fn test_join_pages_skips_blank_pages() {
        let joined = join_pages(vec![(1, "eins"), (2, "  \n "), (3, "drei")]);
        assert_eq!(joined, "=== Seite 1 ===\neins\n\n=== Seite 3 ===\ndrei");
    }

    #[test]
    fn test_join_pages_all_blank() {
        assert_eq!(join_pages(Vec::<(u32, &str)>::new()), "");
        assert_eq!(join_pages(vec![(1, "\n")]), "");
    }

    #[test]
    fn test_invalid_pdf_is_extraction_error() {
        let err = extract_text("broken.pdf", b"not a pdf").unwrap_err();
        assert!(matches!(err, ParleyError::Extraction { ref file_name, .. } if file_name == "broken.pdf"));
    }

    #[test]
    fn test_fallback_names_file() {
        assert_eq!(
            fallback_text("Vertrag.pdf"),
            "PDF-Datei \"Vertrag.pdf\" wurde hochgeladen, aber der Text konnte nicht extrahiert werden. Bitte beschreiben Sie den Inhalt oder stellen Sie Ihre Frage zum PDF."
        );
    }
}
