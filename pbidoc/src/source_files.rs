//! Directory walker for collecting the text files of a project folder

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

use crate::extractor::ExtractionWarning;

/// Largest file the walker will read into memory (bytes)
pub const MAX_FILE_BYTES: u64 = 16 * 1024 * 1024;

/// Directory names never descended into
const IGNORED_DIRS: &[&str] = &[".git", ".pbi", "node_modules", "target"];

/// Extensions of the files the extractor looks at
const TEXT_EXTENSIONS: &[&str] = &["tmdl", "json"];

/// Snapshot of one file's text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Path relative to the selected folder's parent, `/`-separated, so the
    /// first segment is the selected folder itself
    pub relative_path: String,
    /// File name including extension
    pub name: String,
    /// Full decoded text
    pub content: String,
}

impl SourceFile {
    /// Build a source file from a relative path, deriving the name from its
    /// last segment (either separator convention)
    pub fn new(relative_path: impl Into<String>, content: impl Into<String>) -> Self {
        let relative_path = relative_path.into();
        let name = relative_path
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(relative_path.as_str())
            .to_string();
        Self {
            relative_path,
            name,
            content: content.into(),
        }
    }

    /// Directory segments of the relative path, excluding the file name
    pub fn directories(&self) -> impl Iterator<Item = &str> {
        let mut segments: Vec<&str> = self
            .relative_path
            .split(['/', '\\'])
            .filter(|s| !s.is_empty())
            .collect();
        segments.pop();
        segments.into_iter()
    }
}

/// Errors that stop the walk as a whole
#[derive(Error, Debug)]
pub enum SourceFilesError {
    #[error("Input folder not found: {path}", path = .0.display())]
    NotFound(PathBuf),

    #[error("Input must be a directory: {path}", path = .0.display())]
    NotADirectory(PathBuf),

    #[error("Failed to walk {path}: {source}", path = .0.display(), source = .1)]
    Walk(PathBuf, #[source] walkdir::Error),
}

/// Files collected from disk plus the ones that had to be skipped
#[derive(Debug, Default)]
pub struct CollectedFiles {
    pub files: Vec<SourceFile>,
    pub warnings: Vec<ExtractionWarning>,
}

/// Walk a project folder and read every `.tmdl` and `.json` file in it
///
/// # Parameters
/// * `root` - The selected folder (e.g. `Sales.SemanticModel`)
///
/// # Returns
/// * `Ok(CollectedFiles)` - Files in file-name order; unreadable files are
///   reported as warnings rather than errors
/// * `Err(SourceFilesError)` - The root is missing, not a directory, or
///   cannot be traversed
pub fn collect_source_files(root: &Path) -> Result<CollectedFiles, SourceFilesError> {
    if !root.exists() {
        return Err(SourceFilesError::NotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(SourceFilesError::NotADirectory(root.to_path_buf()));
    }

    let root_name = root_folder_name(root);
    let mut collected = CollectedFiles::default();

    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_ignored_dir(e));

    for entry in walker {
        let entry = entry.map_err(|e| SourceFilesError::Walk(root.to_path_buf(), e))?;
        if !entry.file_type().is_file() || !has_text_extension(entry.path()) {
            continue;
        }

        let relative = relative_path(&root_name, root, entry.path());
        match read_text(&entry) {
            Ok(content) => collected.files.push(SourceFile::new(relative, content)),
            Err(reason) => {
                log::warn!("Skipping {}: {}", relative, reason);
                collected
                    .warnings
                    .push(ExtractionWarning::for_path(relative, reason));
            }
        }
    }

    log::info!(
        "Collected {} text files from {}",
        collected.files.len(),
        root.display()
    );
    Ok(collected)
}

/// Name of the selected folder, used as the first relative path segment
fn root_folder_name(root: &Path) -> String {
    let canonical = fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
    canonical
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string()
}

fn is_ignored_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| IGNORED_DIRS.contains(&name))
}

fn has_text_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            TEXT_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

/// `/`-joined path of `path` below `root`, prefixed with the root's name
fn relative_path(root_name: &str, root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    let mut parts: Vec<String> = Vec::new();
    if !root_name.is_empty() {
        parts.push(root_name.to_string());
    }
    parts.extend(
        rel.components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned()),
    );
    parts.join("/")
}

fn read_text(entry: &DirEntry) -> Result<String, String> {
    let len = entry
        .metadata()
        .map_err(|e| format!("failed to read metadata: {}", e))?
        .len();
    if len > MAX_FILE_BYTES {
        return Err(format!(
            "file too large ({} bytes > {} bytes cap)",
            len, MAX_FILE_BYTES
        ));
    }
    fs::read_to_string(entry.path()).map_err(|e| format!("failed to read as UTF-8 text: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_file_name_from_either_separator() {
        let file = SourceFile::new("Model/definition/tables/Sales.tmdl", "");
        assert_eq!(file.name, "Sales.tmdl");

        let file = SourceFile::new("Model\\definition\\tables\\Sales.tmdl", "");
        assert_eq!(file.name, "Sales.tmdl");

        let file = SourceFile::new("item.metadata.json", "");
        assert_eq!(file.name, "item.metadata.json");
    }

    #[test]
    fn test_directories_exclude_file_name() {
        let file = SourceFile::new("Model/definition/tables/Sales.tmdl", "");
        let dirs: Vec<_> = file.directories().collect();
        assert_eq!(dirs, vec!["Model", "definition", "tables"]);

        let file = SourceFile::new("Sales.tmdl", "");
        assert_eq!(file.directories().count(), 0);
    }

    #[test]
    fn test_collect_prefixes_root_name_and_skips_other_files() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("Shop.SemanticModel");
        fs::create_dir_all(root.join("definition/tables")).unwrap();
        fs::create_dir_all(root.join(".pbi")).unwrap();
        fs::write(root.join("definition/tables/Sales.tmdl"), "table Sales").unwrap();
        fs::write(root.join("item.metadata.json"), "{}").unwrap();
        fs::write(root.join("diagram.png"), [0u8, 1, 2]).unwrap();
        fs::write(root.join(".pbi/cache.json"), "{}").unwrap();

        let collected = collect_source_files(&root).unwrap();
        let paths: Vec<_> = collected
            .files
            .iter()
            .map(|f| f.relative_path.as_str())
            .collect();
        assert_eq!(
            paths,
            vec![
                "Shop.SemanticModel/definition/tables/Sales.tmdl",
                "Shop.SemanticModel/item.metadata.json",
            ]
        );
        assert!(collected.warnings.is_empty());
    }

    #[test]
    fn test_collect_reports_non_utf8_file_as_warning() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("Model");
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("broken.tmdl"), [0xffu8, 0xfe, 0x00]).unwrap();

        let collected = collect_source_files(&root).unwrap();
        assert!(collected.files.is_empty());
        assert_eq!(collected.warnings.len(), 1);
        assert_eq!(
            collected.warnings[0].path.as_deref(),
            Some("Model/broken.tmdl")
        );
    }

    #[test]
    fn test_walk_error_message_names_folder_and_cause() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gone");
        let walk_error = WalkDir::new(&missing)
            .into_iter()
            .next()
            .unwrap()
            .unwrap_err();

        let err = SourceFilesError::Walk(missing.clone(), walk_error);
        let message = err.to_string();
        assert!(message.starts_with(&format!("Failed to walk {}: ", missing.display())));
        assert!(message.len() > format!("Failed to walk {}: ", missing.display()).len());
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_collect_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let err = collect_source_files(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, SourceFilesError::NotFound(_)));
    }
}
