//! Text-model extractor
//!
//! Turns the text files of an unpacked Power BI semantic model folder into a
//! [`ProjectModel`]. Each construct (measure, column, relationship,
//! metadata) is recovered by its own pattern rule returning a
//! [`RuleResult`], so unknown syntax is skipped rather than rejected.
//!
//! Failures are split three ways:
//! - an empty file set, or one with neither `item.metadata.json` nor any
//!   `.tmdl` file, aborts with [`ExtractError`];
//! - a file that cannot be scanned is skipped and reported as an
//!   [`ExtractionWarning`];
//! - a file with nothing to extract contributes nothing, silently.

use crate::project_model::{Measure, ProjectMetadata, ProjectModel, Table};
use crate::source_files::SourceFile;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

// Submodules
mod classify;
mod describe;
mod error;
mod measures;
mod metadata;
mod relationships;
mod rule;
mod tables;

// Re-export public types
pub use classify::{classify, ClassifiedFiles};
pub use describe::describe_measure;
pub use error::ExtractError;
pub use measures::{extract_measures, strip_metadata_lines};
pub use metadata::{from_descriptor, from_folder_name, parse_date};
pub use relationships::{extract_relationships, RelationshipScan, UNKNOWN_COLUMN};
pub use rule::RuleResult;
pub use tables::extract_table;

/// Largest text a single rule will scan (bytes)
pub const MAX_SCAN_BYTES: usize = 8 * 1024 * 1024;

const TMDL_EXTENSION: &str = ".tmdl";

/// A recoverable problem met during extraction
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ExtractionWarning {
    /// Relative path of the file concerned, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub message: String,
}

impl ExtractionWarning {
    pub fn for_path(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ExtractionWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{}: {}", path, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// The extracted model plus everything that was skipped on the way
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub model: ProjectModel,
    pub warnings: Vec<ExtractionWarning>,
}

/// Extract a project model from a set of source files
///
/// # Parameters
/// * `files` - Every file of the folder, in the order results should follow
///
/// # Returns
/// * `Ok(Extraction)` - The assembled model and any per-file warnings
/// * `Err(ExtractError)` - The set is empty or not a model folder
pub fn extract(files: &[SourceFile]) -> Result<Extraction, ExtractError> {
    if files.is_empty() {
        return Err(ExtractError::EmptyInput);
    }

    let classified = classify(files)?;
    let mut warnings = Vec::new();

    let metadata = assemble_metadata(&classified, files, &mut warnings);
    let mut model = ProjectModel::new(metadata);

    for scan in scan_table_files(&classified.table_files) {
        collect_table_scan(scan, &mut model, &mut warnings);
    }

    if let Some(file) = classified.relationships_file {
        match extract_relationships(&file.content) {
            RuleResult::Found(scan) => {
                for reason in scan.skipped {
                    warn(&mut warnings, file, format!("skipped relationship: {}", reason));
                }
                model.relationships = scan.relationships;
            }
            RuleResult::NotFound => {
                log::debug!("No relationships declared in {}", file.relative_path);
            }
            RuleResult::Malformed(reason) => warn(&mut warnings, file, reason),
        }
    }

    log::info!(
        "Extracted {} tables, {} measures, {} relationships ({} warnings)",
        model.tables.len(),
        model.measures.len(),
        model.relationships.len(),
        warnings.len()
    );

    Ok(Extraction { model, warnings })
}

fn assemble_metadata(
    classified: &ClassifiedFiles<'_>,
    files: &[SourceFile],
    warnings: &mut Vec<ExtractionWarning>,
) -> ProjectMetadata {
    let Some(file) = classified.metadata_file else {
        return from_folder_name(files);
    };

    match from_descriptor(&file.content) {
        RuleResult::Found(metadata) => metadata,
        RuleResult::NotFound => ProjectMetadata::default(),
        RuleResult::Malformed(reason) => {
            warn(warnings, file, format!("using default metadata: {}", reason));
            ProjectMetadata::default()
        }
    }
}

/// Results of both table-file rules for one file
struct TableFileScan<'a> {
    file: &'a SourceFile,
    table: RuleResult<Table>,
    measures: RuleResult<Vec<Measure>>,
}

fn scan_table_file(file: &SourceFile) -> TableFileScan<'_> {
    let name = table_name(&file.name);
    TableFileScan {
        file,
        table: extract_table(name, &file.content),
        measures: extract_measures(name, &file.content),
    }
}

/// Scan every table file; output order matches input order
fn scan_table_files<'a>(files: &[&'a SourceFile]) -> Vec<TableFileScan<'a>> {
    #[cfg(feature = "parallel")]
    let scans = files.par_iter().map(|f| scan_table_file(f)).collect();

    #[cfg(not(feature = "parallel"))]
    let scans = files.iter().map(|f| scan_table_file(f)).collect();

    scans
}

fn collect_table_scan(
    scan: TableFileScan<'_>,
    model: &mut ProjectModel,
    warnings: &mut Vec<ExtractionWarning>,
) {
    // Both rules share the size guard, so one warning covers the file
    match scan.table {
        RuleResult::Found(table) => model.tables.push(table),
        RuleResult::NotFound => {}
        RuleResult::Malformed(reason) => {
            warn(warnings, scan.file, format!("skipped table file: {}", reason));
            return;
        }
    }

    match scan.measures {
        RuleResult::Found(measures) => model.measures.extend(measures),
        RuleResult::NotFound => {}
        RuleResult::Malformed(reason) => {
            warn(warnings, scan.file, format!("skipped measures: {}", reason));
        }
    }
}

/// File name without its `.tmdl` extension
fn table_name(file_name: &str) -> &str {
    let cut = file_name.len().saturating_sub(TMDL_EXTENSION.len());
    match file_name.get(cut..) {
        Some(ext) if ext.eq_ignore_ascii_case(TMDL_EXTENSION) => &file_name[..cut],
        _ => file_name,
    }
}

fn warn(warnings: &mut Vec<ExtractionWarning>, file: &SourceFile, message: String) {
    log::warn!("{}: {}", file.relative_path, message);
    warnings.push(ExtractionWarning::for_path(&file.relative_path, message));
}
