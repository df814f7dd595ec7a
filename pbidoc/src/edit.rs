//! Editor operations on an extracted model
//!
//! Every operation borrows the current model and returns a new one; the
//! extractor's output is never changed in place. Removing a table cascades
//! to its measures and to every relationship touching it.

use thiserror::Error;

use crate::documentation_config::DocumentationConfig;
use crate::project_model::{ProjectMetadata, ProjectModel};

/// Errors from editor operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    /// A measure index past the end of the measure list
    #[error("Measure index {index} is out of range ({len} measures)")]
    MeasureOutOfRange {
        /// Requested index
        index: usize,
        /// Number of measures in the model
        len: usize,
    },

    /// A relationship index past the end of the relationship list
    #[error("Relationship index {index} is out of range ({len} relationships)")]
    RelationshipOutOfRange {
        /// Requested index
        index: usize,
        /// Number of relationships in the model
        len: usize,
    },

    /// No table with this name exists
    #[error("Unknown table: {0}")]
    UnknownTable(String),
}

/// Replace the report title
///
/// A blank title falls back to the default, as at extraction.
pub fn with_title(model: &ProjectModel, title: &str) -> ProjectModel {
    let mut edited = model.clone();
    edited.metadata.title = ProjectMetadata::titled(title).title;
    edited
}

/// Replace the report description; an empty string clears it
pub fn with_description(model: &ProjectModel, description: &str) -> ProjectModel {
    let mut edited = model.clone();
    edited.metadata.description = Some(description.trim())
        .filter(|d| !d.is_empty())
        .map(str::to_string);
    edited
}

/// Replace the whole metadata block
pub fn with_metadata(model: &ProjectModel, metadata: ProjectMetadata) -> ProjectModel {
    let mut edited = model.clone();
    edited.metadata = metadata;
    if edited.metadata.title.trim().is_empty() {
        edited.metadata.title = ProjectMetadata::default().title;
    }
    edited
}

/// Overwrite the synthesized description of one measure
pub fn with_measure_description(
    model: &ProjectModel,
    index: usize,
    description: &str,
) -> Result<ProjectModel, EditError> {
    check_measure(model, index)?;
    let mut edited = model.clone();
    edited.measures[index].description = description.to_string();
    Ok(edited)
}

/// Remove one measure
///
/// The owning table's `measure_count` is left as extracted.
pub fn without_measure(model: &ProjectModel, index: usize) -> Result<ProjectModel, EditError> {
    check_measure(model, index)?;
    let mut edited = model.clone();
    edited.measures.remove(index);
    Ok(edited)
}

/// Remove one relationship
pub fn without_relationship(
    model: &ProjectModel,
    index: usize,
) -> Result<ProjectModel, EditError> {
    let len = model.relationships.len();
    if index >= len {
        return Err(EditError::RelationshipOutOfRange { index, len });
    }
    let mut edited = model.clone();
    edited.relationships.remove(index);
    Ok(edited)
}

/// Remove a table and everything that refers to it
///
/// Drops every table named `name`, every measure owned by it and every
/// relationship with `name` at either end. Nothing else changes.
///
/// # Returns
/// * `Ok(ProjectModel)` - The model without the table
/// * `Err(EditError::UnknownTable)` - No table has this name
pub fn without_table(model: &ProjectModel, name: &str) -> Result<ProjectModel, EditError> {
    if model.table(name).is_none() {
        return Err(EditError::UnknownTable(name.to_string()));
    }

    let edited = ProjectModel {
        metadata: model.metadata.clone(),
        tables: model
            .tables
            .iter()
            .filter(|t| t.name != name)
            .cloned()
            .collect(),
        measures: model
            .measures
            .iter()
            .filter(|m| m.table != name)
            .cloned()
            .collect(),
        relationships: model
            .relationships
            .iter()
            .filter(|r| !r.touches(name))
            .cloned()
            .collect(),
    };

    log::debug!(
        "Removed table {}: {} measures, {} relationships dropped",
        name,
        model.measures.len() - edited.measures.len(),
        model.relationships.len() - edited.relationships.len()
    );

    Ok(edited)
}

/// Merge user-supplied documentation into the metadata
pub fn apply_documentation(model: &ProjectModel, config: &DocumentationConfig) -> ProjectModel {
    with_metadata(model, config.merge_into(&model.metadata))
}

fn check_measure(model: &ProjectModel, index: usize) -> Result<(), EditError> {
    let len = model.measures.len();
    if index >= len {
        return Err(EditError::MeasureOutOfRange { index, len });
    }
    Ok(())
}
