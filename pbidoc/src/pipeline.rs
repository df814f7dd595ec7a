//! Three-stage documentation pipeline
//!
//! This module orchestrates the three stages of report documentation:
//! 1. **Parsing**: Read the model folder and extract the project model
//! 2. **Transformation**: Apply documentation and edits, then lay out the
//!    report document
//! 3. **Export**: Generate the output format (markdown, html, docx)

use crate::diagram;
use crate::docx_exporter::{self, DocxExportError};
use crate::documentation_config::{DocumentationConfig, DocumentationConfigError};
use crate::edit::{self, EditError};
use crate::extractor::{self, ExtractError, Extraction};
use crate::html_exporter::{self, HtmlExportError};
use crate::markdown_exporter::{self, MarkdownExportError};
use crate::project_model::ProjectModel;
use crate::report_document::{self, DiagramImage, ReportDocument};
use crate::source_files::{self, SourceFilesError};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Output format of the generated document
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Single markdown file with Mermaid diagram and embedded image
    Markdown,
    /// Self-contained HTML page
    Html,
    /// Microsoft Word DOCX format
    Docx,
}

impl OutputFormat {
    /// File extension written for this format
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Markdown => "md",
            OutputFormat::Html => "html",
            OutputFormat::Docx => "docx",
        }
    }

    /// Detect the format from an output file extension
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "md" | "markdown" => Some(OutputFormat::Markdown),
            "html" | "htm" => Some(OutputFormat::Html),
            "docx" => Some(OutputFormat::Docx),
            _ => None,
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            OutputFormat::Markdown => "Markdown",
            OutputFormat::Html => "HTML",
            OutputFormat::Docx => "DOCX",
        })
    }
}

/// User edits applied between extraction and layout
#[derive(Debug, Clone, Default)]
pub struct EditOptions {
    /// Documentation file contents, applied first
    pub documentation: Option<DocumentationConfig>,
    /// Title override, applied after the documentation file
    pub title: Option<String>,
    pub description: Option<String>,
    /// Tables to remove, with their measures and relationships
    pub drop_tables: Vec<String>,
}

/// Stage 1: Read a model folder and extract its project model
///
/// Warnings from reading files come first, then those from extraction.
///
/// # Parameters
/// * `root` - The `.SemanticModel` (or project) folder
///
/// # Returns
/// * `Ok(Extraction)` - The model and every recoverable problem met
/// * `Err(PipelineError)` - The folder cannot be walked or is not a model folder
pub fn parse_sources(root: &Path) -> Result<Extraction, PipelineError> {
    let collected = source_files::collect_source_files(root)?;
    log::info!(
        "Read {} files from {}",
        collected.files.len(),
        root.display()
    );

    let mut extraction = extractor::extract(&collected.files)?;

    let mut warnings = collected.warnings;
    warnings.append(&mut extraction.warnings);
    extraction.warnings = warnings;

    Ok(extraction)
}

/// Stage 2a: Apply documentation and user edits to an extracted model
///
/// # Returns
/// * `Ok(ProjectModel)` - A new model; the input is untouched
/// * `Err(PipelineError)` - A table to drop does not exist
pub fn apply_edits(model: &ProjectModel, options: &EditOptions) -> Result<ProjectModel, PipelineError> {
    let mut edited = match &options.documentation {
        Some(config) => edit::apply_documentation(model, config),
        None => model.clone(),
    };

    if let Some(title) = &options.title {
        edited = edit::with_title(&edited, title);
    }
    if let Some(description) = &options.description {
        edited = edit::with_description(&edited, description);
    }
    for table in &options.drop_tables {
        edited = edit::without_table(&edited, table)?;
        log::info!("Dropped table {}", table);
    }

    Ok(edited)
}

/// Stage 2b: Lay out the report document
///
/// A Mermaid diagram is generated when the model has tables and
/// relationships; a supplied image takes its place in the document.
pub fn transform(model: &ProjectModel, image: Option<DiagramImage>) -> ReportDocument {
    let view = diagram::for_model(model);
    if let Some(view) = &view {
        log::info!(
            "Diagram: {} entities, {} edges",
            view.entity_count,
            view.edge_count
        );
    }
    report_document::build(model, view.as_ref(), image)
}

/// Stage 3: Export the document
///
/// # Parameters
/// * `doc` - The report document
/// * `format` - Output format
/// * `output_path` - File to write
pub fn export(
    doc: &ReportDocument,
    format: OutputFormat,
    output_path: &Path,
) -> Result<(), PipelineError> {
    match format {
        OutputFormat::Markdown => markdown_exporter::to_markdown(doc, output_path)?,
        OutputFormat::Html => html_exporter::to_html(doc, output_path)?,
        OutputFormat::Docx => docx_exporter::to_docx(doc, output_path)?,
    }
    log::info!("Wrote {} to {}", format, output_path.display());
    Ok(())
}

/// Default output path: the title-derived file name in `dir`
pub fn default_output_path(dir: &Path, title: &str, format: OutputFormat) -> PathBuf {
    dir.join(report_document::document_file_name(title, format.extension()))
}

/// Read a diagram image file
///
/// # Returns
/// * `Ok(DiagramImage)` - A file in a recognized image format
/// * `Err(PipelineError)` - The file cannot be read or is not an image
pub fn load_diagram_image(path: &Path) -> Result<DiagramImage, PipelineError> {
    let bytes =
        std::fs::read(path).map_err(|e| PipelineError::ImageReadError(path.to_path_buf(), e))?;

    if imagesize::image_type(&bytes).is_err() {
        return Err(PipelineError::UnsupportedImage(path.to_path_buf()));
    }

    Ok(DiagramImage {
        bytes,
        alt_text: "Relationship diagram".to_string(),
    })
}

/// Pipeline errors
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    SourceFiles(#[from] SourceFilesError),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Config(#[from] DocumentationConfigError),

    #[error(transparent)]
    Edit(#[from] EditError),

    #[error("IO error reading image {path}: {source}", path = .0.display(), source = .1)]
    ImageReadError(PathBuf, #[source] std::io::Error),

    #[error("Not a recognized image format: {path}", path = .0.display())]
    UnsupportedImage(PathBuf),

    #[error("Markdown export failed: {0}")]
    Markdown(#[from] MarkdownExportError),

    #[error("HTML export failed: {0}")]
    Html(#[from] HtmlExportError),

    #[error("DOCX export failed: {0}")]
    Docx(#[from] DocxExportError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project_model::{Measure, ProjectMetadata, Relationship, Table};

    fn model() -> ProjectModel {
        let mut model = ProjectModel::new(ProjectMetadata::titled("Shop"));
        model.tables = ["Sales", "Customer"]
            .iter()
            .map(|name| Table {
                name: name.to_string(),
                columns: vec!["ID".to_string()],
                measure_count: 1,
            })
            .collect();
        model.measures = vec![Measure {
            name: "Buyers".to_string(),
            table: "Customer".to_string(),
            formula: "COUNTROWS(Customer)".to_string(),
            description: "Counts the number of Buyers".to_string(),
            format_string: None,
        }];
        model.relationships = vec![Relationship::between("Sales", "CustomerID", "Customer", "ID")];
        model
    }

    #[test]
    fn test_output_format_extensions() {
        assert_eq!(
            OutputFormat::from_extension(Path::new("a/b.MD")),
            Some(OutputFormat::Markdown)
        );
        assert_eq!(
            OutputFormat::from_extension(Path::new("x.htm")),
            Some(OutputFormat::Html)
        );
        assert_eq!(OutputFormat::from_extension(Path::new("x.pdf")), None);
        assert_eq!(OutputFormat::from_extension(Path::new("x")), None);
        assert_eq!(OutputFormat::Docx.extension(), "docx");
    }

    #[test]
    fn test_apply_edits_order() {
        let options = EditOptions {
            documentation: Some(DocumentationConfig {
                title: Some("From config".to_string()),
                area: Some("Retail".to_string()),
                ..Default::default()
            }),
            title: Some("From flag".to_string()),
            description: None,
            drop_tables: vec!["Customer".to_string()],
        };
        let edited = apply_edits(&model(), &options).unwrap();
        assert_eq!(edited.metadata.title, "From flag");
        assert_eq!(edited.metadata.area.as_deref(), Some("Retail"));
        assert_eq!(edited.tables.len(), 1);
        assert!(edited.measures.is_empty());
        assert!(edited.relationships.is_empty());
    }

    #[test]
    fn test_apply_edits_unknown_table() {
        let options = EditOptions {
            drop_tables: vec!["Nope".to_string()],
            ..Default::default()
        };
        assert!(matches!(
            apply_edits(&model(), &options),
            Err(PipelineError::Edit(EditError::UnknownTable(_)))
        ));
    }

    #[test]
    fn test_transform_adds_diagram_section() {
        let doc = transform(&model(), None);
        assert!(doc
            .section(report_document::titles::DIAGRAM)
            .is_some());

        let mut no_rels = model();
        no_rels.relationships.clear();
        let doc = transform(&no_rels, None);
        assert!(doc
            .section(report_document::titles::DIAGRAM)
            .is_none());
    }

    #[test]
    fn test_default_output_path() {
        let path = default_output_path(Path::new("out"), "Sales Overview", OutputFormat::Html);
        assert_eq!(path, Path::new("out").join("Sales_Overview_Documentation.html"));
    }

    #[test]
    fn test_load_diagram_image_rejects_non_images() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("diagram.png");
        std::fs::write(&path, b"plain text").unwrap();
        assert!(matches!(
            load_diagram_image(&path),
            Err(PipelineError::UnsupportedImage(_))
        ));
        assert!(matches!(
            load_diagram_image(&dir.path().join("missing.png")),
            Err(PipelineError::ImageReadError(..))
        ));
    }
}
