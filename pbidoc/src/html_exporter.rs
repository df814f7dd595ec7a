//! HTML exporter for report documents
//!
//! This module exports a ReportDocument to a single self-contained HTML file
//! with:
//! - A cover header holding the title and subtitle
//! - Images embedded as data URLs (base64 encoded)
//! - Mermaid diagrams rendered in the browser by the Mermaid module script
//! - Print-friendly CSS styling

use crate::report_document::{Cell, ContentBlock, DiagramImage, DocumentSection, ReportDocument};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::fs;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

const MERMAID_SCRIPT: &str = "<script type=\"module\">\n\
import mermaid from 'https://cdn.jsdelivr.net/npm/mermaid@10/dist/mermaid.esm.min.mjs';\n\
mermaid.initialize({ startOnLoad: true });\n\
</script>\n";

/// Errors that can occur during HTML export
#[derive(Error, Debug)]
pub enum HtmlExportError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Export a report document to HTML format
///
/// # Parameters
/// * `doc` - The report document to export
/// * `output_path` - Path where the HTML file will be written
///
/// # Returns
/// * `Ok(())` - Successfully exported to HTML
/// * `Err(HtmlExportError)` - Error during export
pub fn to_html(doc: &ReportDocument, output_path: &Path) -> Result<(), HtmlExportError> {
    let output = render_html(doc);

    // Create parent directories if they don't exist
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = fs::File::create(output_path)?;
    file.write_all(output.as_bytes())?;

    Ok(())
}

/// Render a report document as an HTML page
pub fn render_html(doc: &ReportDocument) -> String {
    let mut output = String::new();

    let has_diagram = doc
        .sections
        .iter()
        .flat_map(|s| s.flatten())
        .flat_map(|s| &s.content)
        .any(|b| matches!(b, ContentBlock::Diagram(_)));

    write_html_header(&mut output, &doc.metadata.title, has_diagram);

    output.push_str("<body>\n");
    output.push_str("<div class=\"container\">\n");

    write_cover(&mut output, doc);

    for section in &doc.sections {
        write_section(&mut output, section);
    }

    output.push_str("</div>\n");
    output.push_str("</body>\n");
    output.push_str("</html>\n");

    output
}

/// Write HTML header with CSS styling
fn write_html_header(output: &mut String, title: &str, with_mermaid: bool) {
    output.push_str("<!DOCTYPE html>\n");
    output.push_str("<html lang=\"en\">\n");
    output.push_str("<head>\n");
    output.push_str("<meta charset=\"UTF-8\">\n");
    output.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n");
    output.push_str(&format!("<title>{}</title>\n", escape_html(title)));
    output.push_str("<style>\n");
    output.push_str(CSS_STYLES);
    output.push_str("</style>\n");
    if with_mermaid {
        output.push_str(MERMAID_SCRIPT);
    }
    output.push_str("</head>\n");
}

fn write_cover(output: &mut String, doc: &ReportDocument) {
    output.push_str("<header class=\"cover\">\n");
    output.push_str("<p class=\"eyebrow\">Power BI Documentation</p>\n");
    output.push_str(&format!(
        "<h1 class=\"document-title\">{}</h1>\n",
        escape_html(&doc.metadata.title)
    ));
    output.push_str(&format!(
        "<p class=\"subtitle\">{}</p>\n",
        escape_html(&doc.metadata.subtitle)
    ));
    if let Some(author) = &doc.metadata.author {
        output.push_str(&format!(
            "<p class=\"author\">{}</p>\n",
            escape_html(author)
        ));
    }
    output.push_str("</header>\n");
}

/// Write a section and its subsections; document headings start at h2
fn write_section(output: &mut String, section: &DocumentSection) {
    let level = (section.heading_level + 1).min(6);
    output.push_str(&format!(
        "<h{} class=\"section-heading\">{}</h{}>\n",
        level,
        escape_html(&section.title),
        level
    ));

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
            output.push_str(&format!(
                "<p class=\"caption\">{}</p>\n",
                escape_html(text)
            ));
        }

        ContentBlock::KeyValue(pairs) => {
            output.push_str("<table class=\"metadata-table\">\n");
            for (label, value) in pairs {
                output.push_str(&format!(
                    "<tr><td class=\"label\">{}:</td><td>{}</td></tr>\n",
                    escape_html(label),
                    escape_html(value)
                ));
            }
            output.push_str("</table>\n");
        }

        ContentBlock::Table { headers, rows } => write_table(output, headers, rows),

        ContentBlock::Diagram(source) => {
            output.push_str(&format!(
                "<pre class=\"mermaid\">\n{}</pre>\n",
                escape_html(source)
            ));
        }

        ContentBlock::Image(image) => write_image(output, image),
    }
}

/// Write an image block with embedded data URL
fn write_image(output: &mut String, image: &DiagramImage) {
    let data_url = format!(
        "data:{};base64,{}",
        image.mime_type(),
        STANDARD.encode(&image.bytes)
    );

    output.push_str("<figure>\n");
    output.push_str(&format!(
        "<img src=\"{}\" alt=\"{}\">\n",
        data_url,
        escape_html(&image.alt_text)
    ));
    output.push_str("</figure>\n");
}

fn write_table(output: &mut String, headers: &[String], rows: &[Vec<Cell>]) {
    output.push_str("<table>\n<thead>\n<tr>");
    for header in headers {
        output.push_str(&format!("<th>{}</th>", escape_html(header)));
    }
    output.push_str("</tr>\n</thead>\n<tbody>\n");

    for row in rows {
        output.push_str("<tr>");
        for cell in row {
            if cell.code {
                output.push_str(&format!(
                    "<td><pre><code>{}</code></pre></td>",
                    escape_html(&cell.text)
                ));
            } else {
                output.push_str(&format!("<td>{}</td>", escape_html(&cell.text)));
            }
        }
        output.push_str("</tr>\n");
    }

    output.push_str("</tbody>\n</table>\n");
}

/// Escape HTML special characters
fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Report styling in the Power BI blue palette
const CSS_STYLES: &str = r#"
* {
    margin: 0;
    padding: 0;
    box-sizing: border-box;
}

body {
    font-family: 'Segoe UI', -apple-system, BlinkMacSystemFont, 'Roboto',
                 'Helvetica Neue', Arial, sans-serif;
    line-height: 1.6;
    color: #0F172A;
    background-color: #F1F5F9;
    padding: 20px;
}

.container {
    max-width: 1000px;
    margin: 0 auto;
    background: white;
    padding: 60px;
    box-shadow: 0 2px 4px rgba(15, 23, 42, 0.1);
    border-radius: 4px;
}

.cover {
    text-align: center;
    margin-bottom: 48px;
    padding-bottom: 24px;
    border-bottom: 3px solid #2B7A9B;
}

.eyebrow {
    font-size: 0.9em;
    color: #64748B;
    text-transform: uppercase;
    letter-spacing: 0.08em;
}

.document-title {
    font-size: 2.4em;
    font-weight: 700;
    margin: 12px 0;
}

.subtitle {
    font-size: 1.2em;
    color: #64748B;
}

.author {
    margin-top: 8px;
    color: #94A3B8;
}

.section-heading {
    margin-top: 36px;
    margin-bottom: 16px;
    font-weight: 600;
}

h2.section-heading {
    font-size: 1.8em;
    color: #2B7A9B;
    border-bottom: 2px solid #E2E8F0;
    padding-bottom: 8px;
}

h3.section-heading {
    font-size: 1.3em;
    color: #475569;
}

h4.section-heading {
    font-size: 1.1em;
    color: #475569;
}

.caption {
    color: #64748B;
    font-style: italic;
    margin-bottom: 16px;
}

.metadata-table {
    width: 100%;
    border-collapse: collapse;
    margin-bottom: 20px;
}

.metadata-table td {
    padding: 8px 10px;
    border-bottom: 1px solid #E2E8F0;
}

.metadata-table td.label {
    font-weight: 600;
    color: #475569;
    width: 30%;
}

table {
    width: 100%;
    border-collapse: collapse;
    margin-bottom: 20px;
    font-size: 0.92em;
}

thead {
    background-color: #E8F4F8;
}

th {
    padding: 10px;
    text-align: left;
    font-weight: 600;
    color: #475569;
    border-bottom: 2px solid #E2E8F0;
}

td {
    padding: 8px 10px;
    border-bottom: 1px solid #E2E8F0;
    vertical-align: top;
}

pre {
    background-color: #F1F5F9;
    border-radius: 4px;
    padding: 8px;
    overflow-x: auto;
}

pre code {
    font-family: 'Cascadia Code', 'Consolas', 'Menlo', monospace;
    font-size: 0.85em;
    color: #1E293B;
}

pre.mermaid {
    background: none;
    text-align: center;
}

figure {
    margin: 24px 0;
    text-align: center;
}

figure img {
    max-width: 100%;
    height: auto;
    border: 1px solid #E2E8F0;
    border-radius: 4px;
}

@media print {
    body {
        background: white;
        padding: 0;
    }

    .container {
        box-shadow: none;
        padding: 0;
    }

    .section-heading {
        page-break-after: avoid;
    }

    figure, tr {
        page-break-inside: avoid;
    }
}
"#;
