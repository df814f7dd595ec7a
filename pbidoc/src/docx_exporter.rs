//! DOCX export using the docx-rs library
//!
//! Builds a Word document from scratch: cover paragraphs, built-in heading
//! styles, bordered tables, and the diagram image scaled to the page width.
//! Mermaid source is written as monospace text since Word cannot render it.

use crate::report_document::{Cell, ContentBlock, DiagramImage, DocumentSection, ReportDocument};
use docx_rs::{
    AlignmentType, BreakType, Docx, Paragraph, Pic, Run, RunFonts, Style, StyleType, Table,
    TableCell, TableRow, WidthType,
};
use std::io::Cursor;
use std::path::Path;
use thiserror::Error;

/// EMUs (English Metric Units) per inch - Word uses this for measurements
const EMUS_PER_INCH: u32 = 914400;

/// Default DPI for images without embedded DPI information
const DEFAULT_IMAGE_DPI: f64 = 96.0;

/// Maximum image width in inches (to fit on a standard page with margins)
const MAX_IMAGE_WIDTH_INCHES: f64 = 6.5;

/// Usable table width in twentieths of a point (6.5in)
const TABLE_WIDTH_DXA: usize = 9360;

const ACCENT_COLOR: &str = "2B7A9B";
const MUTED_COLOR: &str = "64748B";
const CODE_FONT: &str = "Consolas";

/// Errors that can occur during DOCX export
#[derive(Error, Debug)]
pub enum DocxExportError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Format error: {0}")]
    FormatError(String),
}

/// Export to Microsoft Word (.docx) using docx-rs
///
/// # Parameters
/// * `doc` - The report document to export
/// * `output_path` - Path where the .docx file will be written
///
/// # Returns
/// * `Ok(())` - Successfully exported to DOCX format
/// * `Err(DocxExportError)` - Error during export
pub fn to_docx(doc: &ReportDocument, output_path: &Path) -> Result<(), DocxExportError> {
    let bytes = render_docx(doc)?;

    // Create parent directories if they don't exist
    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    log::info!("Writing DOCX to: {}", output_path.display());
    std::fs::write(output_path, bytes)?;

    Ok(())
}

/// Build the .docx package in memory
pub fn render_docx(doc: &ReportDocument) -> Result<Vec<u8>, DocxExportError> {
    log::info!(
        "Creating DOCX with docx-rs: {} sections",
        doc.sections.len()
    );

    let mut docx = add_heading_styles(Docx::new());
    docx = append_cover(docx, doc);

    for section in &doc.sections {
        docx = append_section(docx, section);
    }

    let mut buffer = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut buffer)
        .map_err(|e| DocxExportError::FormatError(format!("Failed to write DOCX: {}", e)))?;

    Ok(buffer.into_inner())
}

/// Add heading styles to the document
fn add_heading_styles(mut docx: Docx) -> Docx {
    let heading_sizes = [
        ("Title", 28),    // cover
        ("Heading1", 18), // sections
        ("Heading2", 14), // tables, subsections
        ("Heading3", 12), // pages
        ("Heading4", 11),
    ];

    for (style_id, size) in heading_sizes {
        let style = Style::new(style_id, StyleType::Paragraph)
            .name(style_id)
            .bold()
            .size(size * 2); // docx-rs uses half-points
        docx = docx.add_style(style);
    }

    docx
}

/// Get the heading style ID for a given heading level
fn heading_style_id(level: usize) -> &'static str {
    match level {
        0 | 1 => "Heading1",
        2 => "Heading2",
        3 => "Heading3",
        _ => "Heading4",
    }
}

fn append_cover(docx: Docx, doc: &ReportDocument) -> Docx {
    let mut docx = docx
        .add_paragraph(
            Paragraph::new()
                .align(AlignmentType::Center)
                .add_run(Run::new().add_text("Power BI Documentation").color(MUTED_COLOR)),
        )
        .add_paragraph(
            Paragraph::new()
                .style("Title")
                .align(AlignmentType::Center)
                .add_run(Run::new().add_text(&doc.metadata.title)),
        )
        .add_paragraph(
            Paragraph::new()
                .align(AlignmentType::Center)
                .add_run(
                    Run::new()
                        .add_text(&doc.metadata.subtitle)
                        .color(MUTED_COLOR)
                        .italic(),
                ),
        );

    if let Some(author) = &doc.metadata.author {
        docx = docx.add_paragraph(
            Paragraph::new()
                .align(AlignmentType::Center)
                .add_run(Run::new().add_text(author).color(MUTED_COLOR)),
        );
    }

    docx
}

/// Append a section, then its subsections
fn append_section(mut docx: Docx, section: &DocumentSection) -> Docx {
    let mut heading = Run::new().add_text(&section.title);
    if section.heading_level <= 1 {
        heading = heading.color(ACCENT_COLOR);
    }
    docx = docx.add_paragraph(
        Paragraph::new()
            .style(heading_style_id(section.heading_level))
            .add_run(heading),
    );

    for block in &section.content {
        docx = append_block(docx, block);
    }

    for subsection in &section.subsections {
        docx = append_section(docx, subsection);
    }

    docx
}

/// Append a content block to the docx document
fn append_block(docx: Docx, block: &ContentBlock) -> Docx {
    match block {
        ContentBlock::Caption(text) => docx.add_paragraph(
            Paragraph::new().add_run(Run::new().add_text(text).italic().color(MUTED_COLOR)),
        ),

        ContentBlock::KeyValue(pairs) => {
            let rows = pairs
                .iter()
                .map(|(label, value)| {
                    TableRow::new(vec![
                        text_cell(&format!("{}:", label), true, TABLE_WIDTH_DXA * 3 / 10),
                        text_cell(value, false, TABLE_WIDTH_DXA * 7 / 10),
                    ])
                })
                .collect();
            docx.add_table(Table::new(rows))
        }

        ContentBlock::Table { headers, rows } => docx.add_table(create_table(headers, rows)),

        ContentBlock::Diagram(source) => {
            let para = source
                .lines()
                .enumerate()
                .fold(Paragraph::new(), |para, (i, line)| {
                    para.add_run(code_run(line, i > 0))
                });
            docx.add_paragraph(para)
        }

        ContentBlock::Image(image) => docx.add_paragraph(create_image_paragraph(image)),
    }
}

/// Create a table with a bold header row; columns share the page width
fn create_table(headers: &[String], rows: &[Vec<Cell>]) -> Table {
    let width = TABLE_WIDTH_DXA / headers.len().max(1);

    let mut table_rows = vec![TableRow::new(
        headers.iter().map(|h| text_cell(h, true, width)).collect(),
    )];

    for row in rows {
        let cells = row
            .iter()
            .map(|cell| {
                if cell.code {
                    code_cell(&cell.text, width)
                } else {
                    text_cell(&cell.text, false, width)
                }
            })
            .collect();
        table_rows.push(TableRow::new(cells));
    }

    Table::new(table_rows)
}

fn text_cell(text: &str, bold: bool, width: usize) -> TableCell {
    let mut run = Run::new().add_text(text);
    if bold {
        run = run.bold();
    }
    TableCell::new()
        .width(width, WidthType::Dxa)
        .add_paragraph(Paragraph::new().add_run(run))
}

/// Monospace cell; every source line after the first starts after a break
fn code_cell(text: &str, width: usize) -> TableCell {
    let para = text
        .lines()
        .enumerate()
        .fold(Paragraph::new(), |para, (i, line)| {
            para.add_run(code_run(line, i > 0))
        });
    TableCell::new()
        .width(width, WidthType::Dxa)
        .add_paragraph(para)
}

fn code_run(line: &str, break_before: bool) -> Run {
    let mut run = Run::new();
    if break_before {
        run = run.add_break(BreakType::TextWrapping);
    }
    run.add_text(line)
        .size(17)
        .fonts(RunFonts::new().ascii(CODE_FONT).hi_ansi(CODE_FONT))
}

/// Image size in EMUs, scaled to fit the page width
fn image_size_emu(bytes: &[u8]) -> (u32, u32) {
    match imagesize::blob_size(bytes) {
        Ok(size) if size.width > 0 && size.height > 0 => {
            // Calculate natural size in inches based on pixel dimensions
            let natural_width_inches = size.width as f64 / DEFAULT_IMAGE_DPI;
            let aspect_ratio = size.height as f64 / size.width as f64;

            // Scale to fit within max width while preserving aspect ratio
            let final_width_inches = natural_width_inches.min(MAX_IMAGE_WIDTH_INCHES);
            let final_height_inches = final_width_inches * aspect_ratio;

            let width = (final_width_inches * EMUS_PER_INCH as f64) as u32;
            let height = (final_height_inches * EMUS_PER_INCH as f64) as u32;
            (width, height)
        }
        _ => {
            // Fallback to default 6x4 inches if dimensions unknown
            let width = (6.0 * EMUS_PER_INCH as f64) as u32;
            let height = (4.0 * EMUS_PER_INCH as f64) as u32;
            (width, height)
        }
    }
}

/// Create a centered image paragraph
fn create_image_paragraph(image: &DiagramImage) -> Paragraph {
    let (width_emu, height_emu) = image_size_emu(&image.bytes);
    let pic = Pic::new(&image.bytes).size(width_emu, height_emu);

    Paragraph::new()
        .align(AlignmentType::Center)
        .add_run(Run::new().add_image(pic))
}
