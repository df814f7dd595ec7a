//! Report metadata from `item.metadata.json` or the folder name

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

use super::rule::{check_scan_size, RuleResult};
use crate::project_model::{ProjectMetadata, DEFAULT_TITLE};
use crate::source_files::SourceFile;

/// Only this exact suffix is removed from a folder-derived title
const REPORT_SUFFIX: &str = ".Report";

/// Parse the metadata descriptor
///
/// Title comes from `displayName`, then `name`; author from
/// `createdBy.displayName`, then `author`; dates from `created` and
/// `lastModified`. Dates that do not parse are left unset.
///
/// # Returns
/// * `Found(metadata)` - The text is a JSON object
/// * `Malformed(reason)` - Invalid JSON, not an object, or too large
pub fn from_descriptor(text: &str) -> RuleResult<ProjectMetadata> {
    if let Err(malformed) = check_scan_size(text) {
        return malformed;
    }

    let json: Value = match serde_json::from_str(text) {
        Ok(json) => json,
        Err(e) => return RuleResult::Malformed(format!("invalid JSON: {}", e)),
    };
    let Some(object) = json.as_object() else {
        return RuleResult::Malformed("metadata is not a JSON object".to_string());
    };

    let title = non_empty(object.get("displayName"))
        .or_else(|| non_empty(object.get("name")))
        .unwrap_or_else(|| DEFAULT_TITLE.to_string());

    let mut metadata = ProjectMetadata::titled(title);
    metadata.author = non_empty(json.pointer("/createdBy/displayName"))
        .or_else(|| non_empty(object.get("author")))
        .or_else(|| non_empty(json.pointer("/author/displayName")));
    metadata.created_date = object
        .get("created")
        .and_then(Value::as_str)
        .and_then(parse_date);
    metadata.last_modified = object
        .get("lastModified")
        .and_then(Value::as_str)
        .and_then(parse_date);
    metadata.description = non_empty(object.get("description"));

    RuleResult::Found(metadata)
}

/// Metadata for a folder without a descriptor
///
/// The title is the first directory segment of the first file that has one,
/// minus a trailing `.Report`; otherwise [`DEFAULT_TITLE`].
pub fn from_folder_name(files: &[SourceFile]) -> ProjectMetadata {
    let folder = files.iter().find_map(|f| f.directories().next());
    let title = folder
        .map(|name| name.strip_suffix(REPORT_SUFFIX).unwrap_or(name))
        .unwrap_or(DEFAULT_TITLE);
    ProjectMetadata::titled(title)
}

fn non_empty(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Parse an ISO-8601 timestamp or date
///
/// Timestamps without an offset and bare dates are taken as UTC.
pub fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
