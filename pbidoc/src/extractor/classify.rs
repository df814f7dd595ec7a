//! Sorting a flat file set into metadata, table and relationship files

use super::error::ExtractError;
use crate::source_files::SourceFile;

const METADATA_FILE_NAME: &str = "item.metadata.json";
const RELATIONSHIPS_FILE_NAME: &str = "relationships.tmdl";
const TABLES_DIR: &str = "tables";

/// The files the extractors will read, borrowed from the input set
#[derive(Debug, Default)]
pub struct ClassifiedFiles<'a> {
    pub metadata_file: Option<&'a SourceFile>,
    /// Table definition files in input order
    pub table_files: Vec<&'a SourceFile>,
    pub relationships_file: Option<&'a SourceFile>,
}

/// Classify a set of source files
///
/// # Returns
/// * `Ok(ClassifiedFiles)` - The set contains a metadata descriptor or at
///   least one `.tmdl` file
/// * `Err(ExtractError::NotAModelFolder)` - Neither is present
pub fn classify(files: &[SourceFile]) -> Result<ClassifiedFiles<'_>, ExtractError> {
    let metadata_file = files
        .iter()
        .find(|f| f.name.eq_ignore_ascii_case(METADATA_FILE_NAME));

    if metadata_file.is_none() {
        if files.iter().any(is_tmdl) {
            log::info!("item.metadata.json not found but .tmdl files are present, continuing");
        } else {
            return Err(ExtractError::NotAModelFolder);
        }
    }

    let table_files: Vec<&SourceFile> = files.iter().filter(|f| is_table_file(f)).collect();

    let relationships_file = files
        .iter()
        .find(|f| f.name.eq_ignore_ascii_case(RELATIONSHIPS_FILE_NAME))
        .or_else(|| {
            files.iter().find(|f| {
                is_tmdl(f) && f.relative_path.to_ascii_lowercase().contains("relationships")
            })
        });

    log::debug!(
        "Classified {} files: metadata={}, tables={}, relationships={}",
        files.len(),
        metadata_file.map_or("none", |f| f.relative_path.as_str()),
        table_files.len(),
        relationships_file.map_or("none", |f| f.relative_path.as_str()),
    );

    Ok(ClassifiedFiles {
        metadata_file,
        table_files,
        relationships_file,
    })
}

fn is_tmdl(file: &SourceFile) -> bool {
    file.name.to_ascii_lowercase().ends_with(".tmdl")
}

/// A `.tmdl` file with a `tables` directory somewhere in its path
fn is_table_file(file: &SourceFile) -> bool {
    is_tmdl(file)
        && file
            .directories()
            .any(|dir| dir.eq_ignore_ascii_case(TABLES_DIR))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(path: &str) -> SourceFile {
        SourceFile::new(path, "")
    }

    #[test]
    fn test_classifies_standard_layout() {
        let files = vec![
            file("Shop.SemanticModel/item.metadata.json"),
            file("Shop.SemanticModel/definition/model.tmdl"),
            file("Shop.SemanticModel/definition/relationships.tmdl"),
            file("Shop.SemanticModel/definition/tables/Sales.tmdl"),
            file("Shop.SemanticModel/definition/tables/Customer.tmdl"),
        ];
        let classified = classify(&files).unwrap();
        assert_eq!(
            classified.metadata_file.map(|f| f.name.as_str()),
            Some("item.metadata.json")
        );
        let names: Vec<_> = classified.table_files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Sales.tmdl", "Customer.tmdl"]);
        assert_eq!(
            classified.relationships_file.map(|f| f.name.as_str()),
            Some("relationships.tmdl")
        );
    }

    #[test]
    fn test_matching_is_case_insensitive_and_accepts_backslashes() {
        let files = vec![
            file("Shop\\Item.Metadata.JSON"),
            file("Shop\\Definition\\TABLES\\Sales.TMDL"),
            file("Shop\\Definition\\Relationships.tmdl"),
        ];
        let classified = classify(&files).unwrap();
        assert!(classified.metadata_file.is_some());
        assert_eq!(classified.table_files.len(), 1);
        assert!(classified.relationships_file.is_some());
    }

    #[test]
    fn test_tables_must_be_a_directory_segment() {
        let files = vec![
            file("Shop/definition/mytables/Sales.tmdl"),
            file("Shop/definition/tables.tmdl"),
            file("Shop/definition/tables/Notes.txt"),
        ];
        let classified = classify(&files).unwrap();
        assert!(classified.table_files.is_empty());
    }

    #[test]
    fn test_relationships_fallback_by_path() {
        let files = vec![
            file("Shop/definition/tables/Sales.tmdl"),
            file("Shop/definition/relationships/all.tmdl"),
        ];
        let classified = classify(&files).unwrap();
        assert_eq!(
            classified.relationships_file.map(|f| f.name.as_str()),
            Some("all.tmdl")
        );
    }

    #[test]
    fn test_exact_relationships_name_preferred_over_fallback() {
        let files = vec![
            file("Shop/relationships/old.tmdl"),
            file("Shop/definition/relationships.tmdl"),
        ];
        let classified = classify(&files).unwrap();
        assert_eq!(
            classified.relationships_file.map(|f| f.name.as_str()),
            Some("relationships.tmdl")
        );
    }

    #[test]
    fn test_tmdl_without_metadata_is_accepted() {
        let files = vec![file("Shop/definition/tables/Sales.tmdl")];
        let classified = classify(&files).unwrap();
        assert!(classified.metadata_file.is_none());
        assert_eq!(classified.table_files.len(), 1);
    }

    #[test]
    fn test_unrecognized_folder_is_rejected() {
        let files = vec![file("Shop/readme.json"), file("Shop/report.json")];
        assert_eq!(classify(&files).unwrap_err(), ExtractError::NotAModelFolder);
    }
}
