//! Error types for extraction

use thiserror::Error;

/// Failures that abort the whole extraction
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    /// No files were supplied at all
    #[error("No files were provided")]
    EmptyInput,

    /// Neither a metadata descriptor nor any `.tmdl` file was found
    #[error(
        "Not a recognized model folder: no item.metadata.json or .tmdl files found. \
         Select the folder ending in \".SemanticModel\" of your Power BI project"
    )]
    NotAModelFolder,
}
