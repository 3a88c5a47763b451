use docx_rs::{
    DocumentChild, InsertChild, Paragraph, ParagraphChild, Run, RunChild, Table, TableCellContent,
    TableChild, TableRowChild,
};
use tracing::debug;

use crate::errors::PipelineError;

/// One line per paragraph in document order, empty paragraphs included.
/// Paragraphs nested in table cells are emitted row by row, cell by cell.
pub(super) fn extract_text(bytes: &[u8]) -> Result<String, PipelineError> {
    let docx = docx_rs::read_docx(bytes).map_err(|e| {
        PipelineError::Extraction(format!("Failed to extract text from DOCX: {e}"))
    })?;

    let mut lines = Vec::new();
    for child in &docx.document.children {
        match child {
            DocumentChild::Paragraph(paragraph) => lines.push(paragraph_text(paragraph)),
            DocumentChild::Table(table) => table_lines(table, &mut lines),
            _ => {}
        }
    }

    debug!("DOCX yielded {} paragraphs", lines.len());
    Ok(lines.join("\n"))
}

fn paragraph_text(paragraph: &Paragraph) -> String {
    let mut buffer = String::new();
    for child in &paragraph.children {
        paragraph_child_text(child, &mut buffer);
    }
    buffer
}

fn paragraph_child_text(child: &ParagraphChild, buffer: &mut String) {
    match child {
        ParagraphChild::Run(run) => run_text(run, buffer),
        ParagraphChild::Hyperlink(link) => {
            for link_child in &link.children {
                paragraph_child_text(link_child, buffer);
            }
        }
        ParagraphChild::Insert(insert) => {
            for insert_child in &insert.children {
                if let InsertChild::Run(run) = insert_child {
                    run_text(run, buffer);
                }
            }
        }
        _ => {}
    }
}

fn run_text(run: &Run, buffer: &mut String) {
    for child in &run.children {
        match child {
            RunChild::Text(text) => buffer.push_str(&text.text),
            RunChild::Tab(_) => buffer.push('\t'),
            RunChild::Break(_) => buffer.push('\n'),
            _ => {}
        }
    }
}

fn table_lines(table: &Table, lines: &mut Vec<String>) {
    for row in &table.rows {
        let TableChild::TableRow(row) = row;
        for cell in &row.cells {
            let TableRowChild::TableCell(cell) = cell;
            for content in &cell.children {
                match content {
                    TableCellContent::Paragraph(paragraph) => {
                        lines.push(paragraph_text(paragraph))
                    }
                    TableCellContent::Table(nested) => table_lines(nested, lines),
                    _ => {}
                }
            }
        }
    }
}

#[cfg(test)]
pub(super) mod tests {
    use std::io::Cursor;

    use docx_rs::{Docx, Paragraph, Run, Table, TableCell, TableRow};

    use super::*;

    /// Builds a DOCX with one paragraph per line; `""` becomes an empty paragraph.
    pub(crate) fn build_docx(lines: &[&str]) -> Vec<u8> {
        let mut docx = Docx::new();
        for line in lines {
            let mut paragraph = Paragraph::new();
            if !line.is_empty() {
                paragraph = paragraph.add_run(Run::new().add_text(*line));
            }
            docx = docx.add_paragraph(paragraph);
        }
        let mut buf = Vec::new();
        docx.build().pack(Cursor::new(&mut buf)).unwrap();
        buf
    }

    #[test]
    fn test_paragraphs_join_in_document_order() {
        let bytes = build_docx(&["Jane Doe", "Senior Engineer", "Acme Corp"]);
        assert_eq!(
            extract_text(&bytes).unwrap(),
            "Jane Doe\nSenior Engineer\nAcme Corp"
        );
    }

    #[test]
    fn test_empty_paragraphs_become_empty_lines() {
        let bytes = build_docx(&["Jane Doe", "", "Experience"]);
        assert_eq!(extract_text(&bytes).unwrap(), "Jane Doe\n\nExperience");
    }

    #[test]
    fn test_document_without_text_yields_blank_string() {
        let bytes = build_docx(&["", ""]);
        assert!(extract_text(&bytes).unwrap().trim().is_empty());
    }

    #[test]
    fn test_table_cells_are_included() {
        let table = Table::new(vec![TableRow::new(vec![
            TableCell::new().add_paragraph(Paragraph::new().add_run(Run::new().add_text("Rust"))),
            TableCell::new().add_paragraph(Paragraph::new().add_run(Run::new().add_text("Go"))),
        ])]);
        let mut buf = Vec::new();
        Docx::new()
            .add_paragraph(Paragraph::new().add_run(Run::new().add_text("Skills")))
            .add_table(table)
            .build()
            .pack(Cursor::new(&mut buf))
            .unwrap();

        assert_eq!(extract_text(&buf).unwrap(), "Skills\nRust\nGo");
    }
}
