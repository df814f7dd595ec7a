//! Markdown exporter for report documents
//!
//! This module exports a ReportDocument to a single markdown file with:
//! - The cover as an H1 title followed by the subtitle
//! - Mermaid diagrams as fenced `mermaid` blocks
//! - Images embedded as data URLs (base64 encoded)

use crate::report_document::{Cell, ContentBlock, DiagramImage, DocumentSection, ReportDocument};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::fs;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during markdown export
#[derive(Error, Debug)]
pub enum MarkdownExportError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Export a report document to markdown format
///
/// # Parameters
/// * `doc` - The report document to export
/// * `output_path` - Path where the markdown file will be written
///
/// # Returns
/// * `Ok(())` - Successfully exported to markdown
/// * `Err(MarkdownExportError)` - Error during export
pub fn to_markdown(doc: &ReportDocument, output_path: &Path) -> Result<(), MarkdownExportError> {
    let output = render_markdown(doc);

    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = fs::File::create(output_path)?;
    file.write_all(output.as_bytes())?;

    Ok(())
}

/// Render a report document as markdown text
pub fn render_markdown(doc: &ReportDocument) -> String {
    let mut output = String::new();

    output.push_str(&format!("# {}\n\n", doc.metadata.title));
    output.push_str(&format!("*{}*\n\n", doc.metadata.subtitle));

    for section in &doc.sections {
        write_section(&mut output, section);
    }

    output
}

/// Write a section and its subsections; document headings start at H2
fn write_section(output: &mut String, section: &DocumentSection) {
    let heading_prefix = "#".repeat((section.heading_level + 1).min(6));
    output.push_str(&format!("{} {}\n\n", heading_prefix, section.title));

    for block in &section.content {
        write_block(output, block);
    }

    for subsection in &section.subsections {
        write_section(output, subsection);
    }
}

/// Write a single block to the output
fn write_block(output: &mut String, block: &ContentBlock) {
    match block {
        ContentBlock::Caption(text) => {
            output.push_str(&format!("*{}*\n\n", text));
        }

        ContentBlock::KeyValue(pairs) => {
            for (label, value) in pairs {
                output.push_str(&format!("- **{}:** {}\n", label, value));
            }
            output.push('\n');
        }

        ContentBlock::Table { headers, rows } => {
            write_table(output, headers, rows);
        }

        ContentBlock::Diagram(source) => {
            output.push_str("```mermaid\n");
            output.push_str(source);
            if !source.ends_with('\n') {
                output.push('\n');
            }
            output.push_str("```\n\n");
        }

        ContentBlock::Image(image) => write_image(output, image),
    }
}

/// Write an image as a base64 data URL
fn write_image(output: &mut String, image: &DiagramImage) {
    let data_url = format!(
        "data:{};base64,{}",
        image.mime_type(),
        STANDARD.encode(&image.bytes)
    );
    output.push_str(&format!("![{}]({})\n\n", image.alt_text, data_url));
}

/// Write a markdown table
fn write_table(output: &mut String, headers: &[String], rows: &[Vec<Cell>]) {
    output.push('|');
    for header in headers {
        output.push_str(&format!(" {} |", escape_cell(header)));
    }
    output.push('\n');

    output.push('|');
    for _ in headers {
        output.push_str(" --- |");
    }
    output.push('\n');

    for row in rows {
        output.push('|');
        for cell in row {
            output.push_str(&format!(" {} |", cell_to_markdown(cell)));
        }
        output.push('\n');
    }

    output.push('\n');
}

/// Table cells cannot span lines; code keeps its breaks as `<br>`
fn cell_to_markdown(cell: &Cell) -> String {
    if cell.code {
        let lines: Vec<String> = cell
            .text
            .lines()
            .map(|line| escape_cell(&escape_html(line)).replace(' ', "&nbsp;"))
            .collect();
        format!("<code>{}</code>", lines.join("<br>"))
    } else {
        escape_cell(&cell.text).replace('\n', "<br>")
    }
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
