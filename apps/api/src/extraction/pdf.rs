use std::panic;

use tracing::debug;

use crate::errors::PipelineError;

/// Page texts in page order, joined by newlines. Pages without extractable
/// text (blank or image-only) are skipped entirely.
pub(super) fn extract_text(bytes: &[u8]) -> Result<String, PipelineError> {
    // pdf-extract panics on some malformed inputs instead of returning an error.
    let pages = panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(bytes))
        .map_err(|_| {
            PipelineError::Extraction("Failed to extract text from PDF: parser aborted".to_string())
        })?
        .map_err(|e| PipelineError::Extraction(format!("Failed to extract text from PDF: {e}")))?;

    debug!("PDF yielded {} pages", pages.len());
    Ok(join_pages(pages))
}

fn join_pages<I, S>(pages: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    pages
        .into_iter()
        .filter_map(|page| page_body(page.as_ref()).map(str::to_string))
        .collect::<Vec<_>>()
        .join("\n")
}

/// A page's text without the blank lines around it. Indentation of the
/// first text line is kept. `None` for a page with no text at all.
fn page_body(page: &str) -> Option<&str> {
    let first_text = page.find(|c: char| !c.is_whitespace())?;
    let line_start = page[..first_text].rfind('\n').map_or(0, |i| i + 1);
    Some(page[line_start..].trim_end())
}

#[cfg(test)]
pub(super) mod tests {
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};

    use super::*;

    /// Builds a PDF with one page per entry; `""` becomes a page with an
    /// empty content stream.
    pub(crate) fn build_pdf(pages: &[&str]) -> Vec<u8> {
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

        let mut kids = Vec::new();
        for text in pages {
            let operations = if text.is_empty() {
                Vec::new()
            } else {
                vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 24.into()]),
                    Operation::new("Td", vec![72.into(), 700.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ]
            };
            let content = Content { operations };
            let content_id =
                doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(Object::from(page_id));
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    fn text_lines(text: &str) -> Vec<&str> {
        text.lines().map(str::trim).collect()
    }

    #[test]
    fn test_pages_join_with_newlines() {
        assert_eq!(join_pages(["Page one", "Page two"]), "Page one\nPage two");
    }

    #[test]
    fn test_textless_pages_leave_no_placeholder() {
        assert_eq!(
            join_pages(["Page one", "", "  \n ", "Page four"]),
            "Page one\nPage four"
        );
    }

    #[test]
    fn test_all_textless_pages_join_to_empty() {
        assert_eq!(join_pages(["", "\n\n"]), "");
    }

    #[test]
    fn test_page_indentation_is_kept() {
        assert_eq!(
            join_pages(["\n\n    Indented heading\n  body\n\n", "Next page"]),
            "    Indented heading\n  body\nNext page"
        );
    }

    #[test]
    fn test_non_pdf_bytes_fail() {
        let err = extract_text(b"hello world").unwrap_err();
        assert!(matches!(err, PipelineError::Extraction(_)));
    }

    #[test]
    fn test_real_pdf_pages_in_order_skipping_blank_page() {
        let bytes = build_pdf(&["Jane Doe", "", "Rust Engineer"]);
        let text = extract_text(&bytes).unwrap();
        assert_eq!(text_lines(&text), ["Jane Doe", "Rust Engineer"]);
    }

    #[test]
    fn test_blank_pdf_yields_no_text() {
        let bytes = build_pdf(&["", ""]);
        assert!(extract_text(&bytes).unwrap().trim().is_empty());
    }
}
