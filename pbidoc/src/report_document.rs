//! Format-neutral report document (Stage 2 output)
//!
//! [`build`] lays the edited [`ProjectModel`] out as cover information plus
//! a list of sections. Exporters only walk this structure; none of them look
//! at the project model directly.

use itertools::Itertools;
use regex::Regex;
use std::sync::LazyLock;

use crate::diagram::DiagramView;
use crate::project_model::{ProjectMetadata, ProjectModel};

/// Subtitle used on the cover when the report has no description
pub const DEFAULT_SUBTITLE: &str = "Technical documentation of the Power BI report";

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// The report ready for export
#[derive(Debug, Clone)]
pub struct ReportDocument {
    /// Cover information
    pub metadata: DocumentMetadata,
    /// Top-level sections in reading order
    pub sections: Vec<DocumentSection>,
}

impl ReportDocument {
    /// Get the total word count across all sections
    pub fn word_count(&self) -> usize {
        self.sections.iter().map(|s| s.word_count()).sum()
    }

    /// Find a top-level section by title
    pub fn section(&self, title: &str) -> Option<&DocumentSection> {
        self.sections.iter().find(|s| s.title == title)
    }
}

/// Cover page information
#[derive(Debug, Clone)]
pub struct DocumentMetadata {
    pub title: String,
    /// Report description, or [`DEFAULT_SUBTITLE`]
    pub subtitle: String,
    pub author: Option<String>,
}

/// A section in the report document
#[derive(Debug, Clone)]
pub struct DocumentSection {
    pub title: String,
    /// Heading level in the final document (1 = top level)
    pub heading_level: usize,
    /// Content blocks in this section
    pub content: Vec<ContentBlock>,
    /// Subsections (nested sections)
    pub subsections: Vec<DocumentSection>,
}

impl DocumentSection {
    fn new(title: impl Into<String>, heading_level: usize) -> Self {
        Self {
            title: title.into(),
            heading_level,
            content: Vec::new(),
            subsections: Vec::new(),
        }
    }

    /// Get the word count for this section and all subsections
    pub fn word_count(&self) -> usize {
        let own_count: usize = self.content.iter().map(|block| block.word_count()).sum();
        let subsection_count: usize = self.subsections.iter().map(|s| s.word_count()).sum();
        own_count + subsection_count
    }

    /// Flatten the section hierarchy into a linear list
    pub fn flatten(&self) -> Vec<&DocumentSection> {
        let mut result = vec![self];
        for subsection in &self.subsections {
            result.extend(subsection.flatten());
        }
        result
    }
}

/// A table cell; code cells hold DAX and keep their line breaks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub text: String,
    pub code: bool,
}

impl Cell {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            code: false,
        }
    }

    pub fn code(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            code: true,
        }
    }
}

/// Raster image of the relationship diagram supplied by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramImage {
    /// Encoded image file contents (PNG, JPEG, ...)
    pub bytes: Vec<u8>,
    pub alt_text: String,
}

impl DiagramImage {
    /// MIME type sniffed from the image header
    pub fn mime_type(&self) -> &'static str {
        match imagesize::image_type(&self.bytes) {
            Ok(imagesize::ImageType::Png) => "image/png",
            Ok(imagesize::ImageType::Jpeg) => "image/jpeg",
            Ok(imagesize::ImageType::Gif) => "image/gif",
            Ok(imagesize::ImageType::Bmp) => "image/bmp",
            Ok(imagesize::ImageType::Webp) => "image/webp",
            _ => "application/octet-stream",
        }
    }
}

/// A block of content in a section
#[derive(Debug, Clone)]
pub enum ContentBlock {
    /// Secondary, de-emphasized text (legends, empty-list notes)
    Caption(String),
    /// Label/value rows
    KeyValue(Vec<(String, String)>),
    /// A table with a header row
    Table {
        headers: Vec<String>,
        rows: Vec<Vec<Cell>>,
    },
    /// Mermaid diagram source
    Diagram(String),
    Image(DiagramImage),
}

impl ContentBlock {
    /// Get the word count for this content block
    pub fn word_count(&self) -> usize {
        let words = |s: &str| s.split_whitespace().count();
        match self {
            ContentBlock::Caption(text) => words(text),
            ContentBlock::KeyValue(pairs) => pairs.iter().map(|(k, v)| words(k) + words(v)).sum(),
            ContentBlock::Table { headers, rows } => {
                let header_count: usize = headers.iter().map(|h| words(h)).sum();
                let row_count: usize = rows.iter().flatten().map(|c| words(&c.text)).sum();
                header_count + row_count
            }
            ContentBlock::Image(image) => words(&image.alt_text),
            ContentBlock::Diagram(_) => 0,
        }
    }
}

/// Section titles, shared with tests and exporters
pub mod titles {
    pub const DASHBOARD: &str = "Dashboard Documentation";
    pub const MEASURES: &str = "DAX Measures";
    pub const DIAGRAM: &str = "Relationship Diagram";
    pub const RELATIONSHIPS: &str = "Relationship Details";
    pub const GENERAL: &str = "General Information and Statistics";
}

/// Lay out the report document for a model
///
/// # Parameters
/// * `model` - The edited project model
/// * `diagram` - Mermaid diagram of the model, if one was generated
/// * `image` - Raster diagram supplied by the user; shown instead of the
///   Mermaid source
///
/// # Returns
/// The document, with sections in this order: dashboard documentation
/// (only when any field is set), DAX measures, relationship diagram (only
/// with a diagram or image), relationship details, general information
pub fn build(
    model: &ProjectModel,
    diagram: Option<&DiagramView>,
    image: Option<DiagramImage>,
) -> ReportDocument {
    let metadata = &model.metadata;
    let mut sections = Vec::new();

    if metadata.has_documentation() {
        sections.push(dashboard_section(metadata));
    }
    sections.push(measures_section(model));
    if let Some(section) = diagram_section(diagram, image) {
        sections.push(section);
    }
    sections.push(relationships_section(model));
    sections.push(general_section(model));

    ReportDocument {
        metadata: DocumentMetadata {
            title: metadata.title.clone(),
            subtitle: metadata
                .description
                .clone()
                .unwrap_or_else(|| DEFAULT_SUBTITLE.to_string()),
            author: metadata.author.clone(),
        },
        sections,
    }
}

/// Output file name for a report title
///
/// Each whitespace run becomes `_`, as do characters that are not allowed
/// in file names, followed by `_Documentation.<extension>`.
pub fn document_file_name(title: &str, extension: &str) -> String {
    let collapsed = WHITESPACE_RUN.replace_all(title, "_");
    let safe: String = collapsed
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c => c,
        })
        .collect();
    format!("{}_Documentation.{}", safe, extension)
}

fn dashboard_section(metadata: &ProjectMetadata) -> DocumentSection {
    let mut section = DocumentSection::new(titles::DASHBOARD, 1);

    let mut general = Vec::new();
    push_pair(&mut general, "Area", metadata.area.as_deref());
    push_pair(&mut general, "Update Frequency", metadata.update_frequency.as_deref());
    general.push((
        "Row-Level Security".to_string(),
        if metadata.has_rls { "Yes" } else { "No" }.to_string(),
    ));
    section.content.push(ContentBlock::KeyValue(general));

    if let Some(objective) = &metadata.objective {
        let mut sub = DocumentSection::new("Objective", 2);
        let mut pairs = Vec::new();
        push_pair(&mut pairs, "Description", Some(&objective.description));
        push_pair(&mut pairs, "Problem Resolved", Some(&objective.problem_resolved));
        push_pair(&mut pairs, "Decisions Supported", Some(&objective.decision_helper));
        push_pair(&mut pairs, "Target Audience", Some(&objective.target_audience));
        push_pair(&mut pairs, "Main Question", Some(&objective.main_question));
        if !pairs.is_empty() {
            sub.content.push(ContentBlock::KeyValue(pairs));
            section.subsections.push(sub);
        }
    }

    if !metadata.business_rules.is_empty() {
        let mut sub = DocumentSection::new("Business Rules", 2);
        sub.content.push(ContentBlock::Table {
            headers: strings(&["ID", "Rule", "Description"]),
            rows: metadata
                .business_rules
                .iter()
                .map(|r| {
                    vec![
                        Cell::text(&r.id),
                        Cell::text(&r.title),
                        Cell::text(&r.description),
                    ]
                })
                .collect(),
        });
        section.subsections.push(sub);
    }

    if !metadata.page_explanations.is_empty() {
        let mut sub = DocumentSection::new("Page Explanations", 2);
        for page in &metadata.page_explanations {
            let title = match (page.id.is_empty(), page.title.is_empty()) {
                (false, false) => format!("{} - {}", page.id, page.title),
                (true, false) => page.title.clone(),
                (false, true) => page.id.clone(),
                (true, true) => "Page".to_string(),
            };
            let mut page_section = DocumentSection::new(title, 3);
            let mut pairs = Vec::new();
            push_pair(&mut pairs, "Objective", Some(&page.objective));
            push_pair(&mut pairs, "KPIs", Some(&page.kpis));
            push_pair(&mut pairs, "Filters", Some(&page.filters));
            push_pair(&mut pairs, "Observations", Some(&page.observations));
            if !pairs.is_empty() {
                page_section.content.push(ContentBlock::KeyValue(pairs));
            }
            sub.subsections.push(page_section);
        }
        section.subsections.push(sub);
    }

    section
}

/// Measures grouped by owning table, tables in name order
fn measures_section(model: &ProjectModel) -> DocumentSection {
    let mut section = DocumentSection::new(titles::MEASURES, 1);

    if model.measures.is_empty() {
        section
            .content
            .push(ContentBlock::Caption("No measures found.".to_string()));
        return section;
    }

    let by_table = model
        .measures
        .iter()
        .sorted_by(|a, b| a.table.cmp(&b.table))
        .chunk_by(|m| m.table.clone());

    for (table, measures) in &by_table {
        let mut sub = DocumentSection::new(format!("Table: {}", table), 2);
        sub.content.push(ContentBlock::Table {
            headers: strings(&["Measure", "DAX Formula", "Description"]),
            rows: measures
                .map(|m| {
                    vec![
                        Cell::text(&m.name),
                        Cell::code(&m.formula),
                        Cell::text(&m.description),
                    ]
                })
                .collect(),
        });
        section.subsections.push(sub);
    }

    section
}

fn diagram_section(
    diagram: Option<&DiagramView>,
    image: Option<DiagramImage>,
) -> Option<DocumentSection> {
    let block = match (image, diagram) {
        (Some(image), _) => ContentBlock::Image(image),
        (None, Some(view)) => ContentBlock::Diagram(view.mermaid.clone()),
        (None, None) => return None,
    };

    let mut section = DocumentSection::new(titles::DIAGRAM, 1);
    section.content.push(block);
    section.content.push(ContentBlock::Caption(
        "Legend: arrows show the direction of each relationship between tables.".to_string(),
    ));
    Some(section)
}

fn relationships_section(model: &ProjectModel) -> DocumentSection {
    let mut section = DocumentSection::new(titles::RELATIONSHIPS, 1);

    if model.relationships.is_empty() {
        section
            .content
            .push(ContentBlock::Caption("No relationships defined.".to_string()));
        return section;
    }

    section.content.push(ContentBlock::Table {
        headers: strings(&[
            "From Table",
            "Column",
            "To Table",
            "Column",
            "Cardinality",
        ]),
        rows: model
            .relationships
            .iter()
            .map(|r| {
                vec![
                    Cell::text(&r.from),
                    Cell::text(&r.from_column),
                    Cell::text(&r.to),
                    Cell::text(&r.to_column),
                    Cell::text(r.cardinality.as_str()),
                ]
            })
            .collect(),
    });
    section
}

fn general_section(model: &ProjectModel) -> DocumentSection {
    let metadata = &model.metadata;
    let mut pairs = vec![("Title".to_string(), metadata.title.clone())];
    push_pair(&mut pairs, "Author", metadata.author.as_deref());
    if let Some(modified) = metadata.last_modified {
        pairs.push((
            "Last Modified".to_string(),
            modified.format("%Y-%m-%d").to_string(),
        ));
    }
    pairs.push(("Tables".to_string(), model.tables.len().to_string()));
    pairs.push(("Columns".to_string(), model.column_count().to_string()));
    pairs.push(("DAX Measures".to_string(), model.measures.len().to_string()));
    pairs.push((
        "Relationships".to_string(),
        model.relationships.len().to_string(),
    ));

    let mut section = DocumentSection::new(titles::GENERAL, 1);
    section.content.push(ContentBlock::KeyValue(pairs));
    section
}

/// Push a label/value row unless the value is missing or blank
fn push_pair(pairs: &mut Vec<(String, String)>, label: &str, value: Option<&str>) {
    if let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) {
        pairs.push((label.to_string(), value.to_string()));
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
