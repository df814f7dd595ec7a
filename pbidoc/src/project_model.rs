//! Semantic model recovered from a Power BI project folder
//!
//! These are the types handed to the editor, the diagram renderer and the
//! document exporters. The extractor builds them once; every later change
//! goes through [`crate::edit`] and produces a new value.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Title used when neither the metadata descriptor nor the folder name
/// provides one
pub const DEFAULT_TITLE: &str = "Power BI Report";

/// The complete model of one project folder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectModel {
    /// Report-level metadata
    pub metadata: ProjectMetadata,
    /// Measures in discovery order (file order, then declaration order)
    pub measures: Vec<Measure>,
    /// One summary per table definition file
    pub tables: Vec<Table>,
    /// Relationships in declaration order
    pub relationships: Vec<Relationship>,
}

impl ProjectModel {
    /// Create a model with the given metadata and no content
    pub fn new(metadata: ProjectMetadata) -> Self {
        Self {
            metadata,
            measures: Vec::new(),
            tables: Vec::new(),
            relationships: Vec::new(),
        }
    }

    /// Total number of columns across all tables
    pub fn column_count(&self) -> usize {
        self.tables.iter().map(|t| t.columns.len()).sum()
    }

    /// Look up a table by name
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Measures owned by the given table, in model order
    pub fn measures_of<'a>(&'a self, table: &'a str) -> impl Iterator<Item = &'a Measure> + 'a {
        self.measures.iter().filter(move |m| m.table == table)
    }
}

/// Report metadata plus the free-form documentation fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMetadata {
    /// Report title, never empty
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Business area the dashboard belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_frequency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub objective: Option<DashboardObjective>,
    #[serde(default)]
    pub business_rules: Vec<BusinessRule>,
    #[serde(default)]
    pub page_explanations: Vec<PageExplanation>,
    /// Whether row-level security is applied to the report
    #[serde(default, rename = "hasRLS")]
    pub has_rls: bool,
}

impl ProjectMetadata {
    /// Metadata carrying only a title
    ///
    /// An empty or whitespace-only title is replaced by [`DEFAULT_TITLE`].
    pub fn titled(title: impl Into<String>) -> Self {
        let title = title.into();
        let title = if title.trim().is_empty() {
            DEFAULT_TITLE.to_string()
        } else {
            title
        };
        Self {
            title,
            author: None,
            created_date: None,
            last_modified: None,
            description: None,
            area: None,
            update_frequency: None,
            objective: None,
            business_rules: Vec::new(),
            page_explanations: Vec::new(),
            has_rls: false,
        }
    }

    /// True when any of the hand-written documentation fields is filled in
    pub fn has_documentation(&self) -> bool {
        self.area.is_some()
            || self.update_frequency.is_some()
            || self.objective.is_some()
            || !self.business_rules.is_empty()
            || !self.page_explanations.is_empty()
            || self.has_rls
    }
}

impl Default for ProjectMetadata {
    fn default() -> Self {
        Self::titled(DEFAULT_TITLE)
    }
}

/// What the dashboard is for and who reads it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardObjective {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub problem_resolved: String,
    #[serde(default)]
    pub decision_helper: String,
    #[serde(default)]
    pub target_audience: String,
    #[serde(default)]
    pub main_question: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessRule {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// Reader-facing notes for one report page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageExplanation {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub objective: String,
    #[serde(default)]
    pub kpis: String,
    #[serde(default)]
    pub filters: String,
    #[serde(default)]
    pub observations: String,
}

/// A DAX measure declared in a table file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Measure {
    pub name: String,
    /// Name of the table whose file declared the measure
    pub table: String,
    /// Calculation body with metadata lines removed
    pub formula: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format_string: Option<String>,
}

/// Summary of one table definition file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub name: String,
    /// Column names in declaration order, duplicates kept
    pub columns: Vec<String>,
    /// Number of `measure` keywords found in the file
    pub measure_count: usize,
}

/// Link between two table columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub from: String,
    pub to: String,
    pub from_column: String,
    pub to_column: String,
    pub cardinality: Cardinality,
    pub cross_filter_direction: CrossFilterDirection,
    pub is_active: bool,
}

impl Relationship {
    /// Build a relationship with the fixed attributes the extractor assigns
    pub fn between(
        from: impl Into<String>,
        from_column: impl Into<String>,
        to: impl Into<String>,
        to_column: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            from_column: from_column.into(),
            to_column: to_column.into(),
            cardinality: Cardinality::OneToMany,
            cross_filter_direction: CrossFilterDirection::Single,
            is_active: true,
        }
    }

    /// True when either endpoint names the given table
    pub fn touches(&self, table: &str) -> bool {
        self.from == table || self.to == table
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cardinality {
    #[serde(rename = "1:1")]
    OneToOne,
    #[serde(rename = "1:N")]
    OneToMany,
    #[serde(rename = "N:1")]
    ManyToOne,
    #[serde(rename = "N:N")]
    ManyToMany,
}

impl Cardinality {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OneToOne => "1:1",
            Self::OneToMany => "1:N",
            Self::ManyToOne => "N:1",
            Self::ManyToMany => "N:N",
        }
    }
}

impl std::fmt::Display for Cardinality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrossFilterDirection {
    Single,
    Both,
}

impl CrossFilterDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Single => "Single",
            Self::Both => "Both",
        }
    }
}

impl std::fmt::Display for CrossFilterDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_titled_falls_back_to_default() {
        assert_eq!(ProjectMetadata::titled("").title, DEFAULT_TITLE);
        assert_eq!(ProjectMetadata::titled("   ").title, DEFAULT_TITLE);
        assert_eq!(ProjectMetadata::titled("Sales").title, "Sales");
    }

    #[test]
    fn test_relationship_between_uses_fixed_attributes() {
        let rel = Relationship::between("Sales", "CustomerID", "Customer", "ID");
        assert_eq!(rel.cardinality, Cardinality::OneToMany);
        assert_eq!(rel.cross_filter_direction, CrossFilterDirection::Single);
        assert!(rel.is_active);
        assert!(rel.touches("Sales"));
        assert!(rel.touches("Customer"));
        assert!(!rel.touches("Date"));
    }

    #[test]
    fn test_serializes_with_wire_names() {
        let rel = Relationship::between("A", "a", "B", "b");
        let json = serde_json::to_value(&rel).unwrap();
        assert_eq!(json["cardinality"], "1:N");
        assert_eq!(json["crossFilterDirection"], "Single");
        assert_eq!(json["fromColumn"], "a");
        assert_eq!(json["isActive"], true);

        let meta = ProjectMetadata::titled("Report");
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["hasRLS"], false);
        assert!(json.get("author").is_none());
    }

    #[test]
    fn test_measures_of_filters_by_table() {
        let mut model = ProjectModel::new(ProjectMetadata::default());
        for (name, table) in [("A", "Sales"), ("B", "Customer"), ("C", "Sales")] {
            model.measures.push(Measure {
                name: name.to_string(),
                table: table.to_string(),
                formula: String::new(),
                description: String::new(),
                format_string: None,
            });
        }
        let names: Vec<_> = model.measures_of("Sales").map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["A", "C"]);
    }
}
