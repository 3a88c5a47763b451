use std::io::Cursor;

use docx_rs::{
    AbstractNumbering, AlignmentType, Docx, IndentLevel, Level, LevelJc, LevelText, LineSpacing,
    NumberFormat, Numbering, NumberingId, PageMargin, Paragraph, Run, SpecialIndentType, Start,
};

use crate::errors::PipelineError;
use crate::render::layout::{Block, Span, HEADING_SIZE_PT, NAME_SIZE_PT};

const BULLET_NUMBERING_ID: usize = 1;
/// One inch, in twentieths of a point.
const PAGE_MARGIN_TWIPS: i32 = 1440;
const RULE_WIDTH: usize = 80;
/// 12pt of space under a rule, in twentieths of a point.
const RULE_SPACE_AFTER: u32 = 240;

/// Serializes laid-out blocks into a fresh DOCX package.
pub(super) fn to_docx(blocks: &[Block]) -> Result<Vec<u8>, PipelineError> {
    let mut docx = Docx::new()
        .page_margin(
            PageMargin::new()
                .top(PAGE_MARGIN_TWIPS)
                .bottom(PAGE_MARGIN_TWIPS)
                .left(PAGE_MARGIN_TWIPS)
                .right(PAGE_MARGIN_TWIPS),
        )
        .add_abstract_numbering(bullet_numbering())
        .add_numbering(Numbering::new(BULLET_NUMBERING_ID, BULLET_NUMBERING_ID));

    for block in blocks {
        docx = docx.add_paragraph(paragraph(block));
    }

    let mut buf = Vec::new();
    docx.build()
        .pack(Cursor::new(&mut buf))
        .map_err(|e| PipelineError::Render(format!("failed to write DOCX package: {e}")))?;
    Ok(buf)
}

fn bullet_numbering() -> AbstractNumbering {
    AbstractNumbering::new(BULLET_NUMBERING_ID).add_level(
        Level::new(
            0,
            Start::new(1),
            NumberFormat::new("bullet"),
            LevelText::new("•"),
            LevelJc::new("left"),
        )
        .indent(Some(720), Some(SpecialIndentType::Hanging(360)), None, None),
    )
}

fn paragraph(block: &Block) -> Paragraph {
    match block {
        Block::Title(name) => Paragraph::new()
            .add_run(Run::new().add_text(name).bold().size(half_points(NAME_SIZE_PT)))
            .align(AlignmentType::Center),
        Block::Heading(text) => Paragraph::new()
            .add_run(
                Run::new()
                    .add_text(text)
                    .bold()
                    .size(half_points(HEADING_SIZE_PT))
                    .color("000000"),
            )
            .line_spacing(LineSpacing::new().after(0)),
        Block::Rule => Paragraph::new()
            .add_run(Run::new().add_text("_".repeat(RULE_WIDTH)))
            .line_spacing(LineSpacing::new().after(RULE_SPACE_AFTER)),
        Block::Paragraph(spans) => spans
            .iter()
            .fold(Paragraph::new(), |p, span| p.add_run(run(span))),
        Block::Bullet(text) => Paragraph::new()
            .add_run(Run::new().add_text(text))
            .numbering(NumberingId::new(BULLET_NUMBERING_ID), IndentLevel::new(0)),
        Block::Spacer => Paragraph::new(),
    }
}

fn run(span: &Span) -> Run {
    let mut run = Run::new().add_text(&span.text);
    if span.bold {
        run = run.bold();
    }
    if span.italic {
        run = run.italic();
    }
    if let Some(size) = span.size_pt {
        run = run.size(half_points(size));
    }
    run
}

/// DOCX font sizes are expressed in half-points.
fn half_points(pt: usize) -> usize {
    pt * 2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_is_a_readable_docx_package() {
        let blocks = vec![
            Block::Title("Jane Doe".into()),
            Block::Heading("Education".into()),
            Block::Rule,
            Block::Bullet("Graduated".into()),
        ];
        let bytes = to_docx(&blocks).unwrap();
        assert!(bytes.starts_with(b"PK"));

        let docx = docx_rs::read_docx(&bytes).unwrap();
        assert!(docx.document.children.len() >= blocks.len());
    }

    #[test]
    fn test_font_sizes_are_half_points() {
        assert_eq!(half_points(NAME_SIZE_PT), 40);
        assert_eq!(half_points(HEADING_SIZE_PT), 32);
    }
}
