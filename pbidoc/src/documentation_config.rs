//! Hand-written dashboard documentation from pbidoc.toml
//!
//! The semantic model folder says nothing about why a dashboard exists or
//! how its pages should be read. Those fields live in an optional
//! `pbidoc.toml` next to the model (or wherever `--config` points) and are
//! merged over the extracted metadata.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::project_model::{BusinessRule, DashboardObjective, PageExplanation, ProjectMetadata};

/// File name looked up inside the input folder
pub const CONFIG_FILE_NAME: &str = "pbidoc.toml";

/// Documentation fields supplied by the user
///
/// Every field is optional; unset fields leave the extracted value alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentationConfig {
    /// Overrides the extracted report title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    /// Business area (e.g., Finance, Sales Operations)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,

    /// How often the data is refreshed (e.g., Daily)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_frequency: Option<String>,

    /// Whether row-level security is applied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_rls: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub objective: Option<ObjectiveConfig>,

    /// Replaces the business rule list when non-empty
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub business_rules: Vec<BusinessRule>,

    /// Replaces the page explanation list when non-empty
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub page_explanations: Vec<PageExplanation>,
}

/// `[objective]` table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectiveConfig {
    pub description: String,
    pub problem_resolved: String,
    pub decision_helper: String,
    pub target_audience: String,
    pub main_question: String,
}

impl From<ObjectiveConfig> for DashboardObjective {
    fn from(config: ObjectiveConfig) -> Self {
        Self {
            description: config.description,
            problem_resolved: config.problem_resolved,
            decision_helper: config.decision_helper,
            target_audience: config.target_audience,
            main_question: config.main_question,
        }
    }
}

impl DocumentationConfig {
    /// Load configuration from a pbidoc.toml file
    ///
    /// # Parameters
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    /// * `Ok(DocumentationConfig)` - Successfully loaded configuration
    /// * `Err(DocumentationConfigError)` - Error reading or parsing the file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DocumentationConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| DocumentationConfigError::IoError(path.to_path_buf(), e))?;

        let config: DocumentationConfig = toml::from_str(&content)
            .map_err(|e| DocumentationConfigError::ParseError(path.to_path_buf(), e))?;

        Ok(config)
    }

    /// Save configuration to a pbidoc.toml file
    ///
    /// # Parameters
    /// * `path` - Path where the file will be written
    ///
    /// # Returns
    /// * `Ok(())` - Successfully saved configuration
    /// * `Err(DocumentationConfigError)` - Error serializing or writing the file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), DocumentationConfigError> {
        let path = path.as_ref();
        let content =
            toml::to_string_pretty(self).map_err(DocumentationConfigError::SerializeError)?;

        fs::write(path, content)
            .map_err(|e| DocumentationConfigError::IoError(path.to_path_buf(), e))?;

        Ok(())
    }

    /// Find the configuration for an input folder
    ///
    /// An explicit path must exist. Without one, `<input>/pbidoc.toml` is
    /// used when present.
    ///
    /// # Returns
    /// * `Ok(Some(config))` - A configuration file was found and parsed
    /// * `Ok(None)` - No explicit path and no file in the input folder
    /// * `Err(DocumentationConfigError)` - The file could not be read or parsed
    pub fn locate(
        input: &Path,
        explicit: Option<&Path>,
    ) -> Result<Option<Self>, DocumentationConfigError> {
        if let Some(path) = explicit {
            return Self::load(path).map(Some);
        }

        let candidate = input.join(CONFIG_FILE_NAME);
        if !candidate.is_file() {
            log::debug!("No {} in {}", CONFIG_FILE_NAME, input.display());
            return Ok(None);
        }

        log::info!("Using documentation config {}", candidate.display());
        Self::load(candidate).map(Some)
    }

    /// Merge these fields over extracted metadata
    ///
    /// Set values win; the extracted title, author and description survive
    /// when the configuration leaves them unset. A blank title is ignored.
    pub fn merge_into(&self, metadata: &ProjectMetadata) -> ProjectMetadata {
        let mut merged = metadata.clone();

        if let Some(title) = self.title.as_deref().filter(|t| !t.trim().is_empty()) {
            merged.title = title.to_string();
        }
        override_with(&mut merged.description, &self.description);
        override_with(&mut merged.author, &self.author);
        override_with(&mut merged.area, &self.area);
        override_with(&mut merged.update_frequency, &self.update_frequency);

        if let Some(has_rls) = self.has_rls {
            merged.has_rls = has_rls;
        }
        if let Some(objective) = &self.objective {
            merged.objective = Some(objective.clone().into());
        }
        if !self.business_rules.is_empty() {
            merged.business_rules = self.business_rules.clone();
        }
        if !self.page_explanations.is_empty() {
            merged.page_explanations = self.page_explanations.clone();
        }

        merged
    }
}

fn override_with(target: &mut Option<String>, value: &Option<String>) {
    if let Some(value) = value {
        *target = Some(value.clone());
    }
}

/// Errors that can occur when loading or saving documentation configuration
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum DocumentationConfigError {
    #[error("IO error on {path}: {1}", path = .0.display())]
    IoError(PathBuf, #[source] std::io::Error),

    #[error("TOML parse error in {path}: {1}", path = .0.display())]
    ParseError(PathBuf, #[source] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    SerializeError(#[from] toml::ser::Error),
}
