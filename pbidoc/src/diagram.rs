//! Relationship diagram as Mermaid `erDiagram` text
//!
//! Tables become entities labelled with their column and measure counts;
//! relationships become edges labelled `fromColumn -> toColumn`. Entity ids
//! are positional (`t0`, `t1`, ...) so table names with spaces or symbols
//! never break the syntax; the real name is shown through the entity alias.

use std::collections::HashMap;

use crate::project_model::{Cardinality, ProjectModel, Relationship, Table};

/// Rendered diagram source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramView {
    /// Mermaid source, starting with `erDiagram`
    pub mermaid: String,
    /// Number of entities drawn, dangling relationship endpoints included
    pub entity_count: usize,
    pub edge_count: usize,
}

impl std::fmt::Display for DiagramView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.mermaid)
    }
}

/// Diagram for a model, if it has anything to connect
///
/// # Returns
/// * `Some(DiagramView)` - The model has at least one table and one relationship
/// * `None` - Nothing to draw
pub fn for_model(model: &ProjectModel) -> Option<DiagramView> {
    if model.tables.is_empty() || model.relationships.is_empty() {
        return None;
    }
    Some(render(&model.tables, &model.relationships))
}

/// Render tables and relationships as a Mermaid entity-relationship diagram
///
/// Relationship endpoints that name no table are still drawn, as entities
/// without counts.
pub fn render(tables: &[Table], relationships: &[Relationship]) -> DiagramView {
    let mut ids: HashMap<&str, String> = HashMap::new();
    let mut entities: Vec<(String, String)> = Vec::new();

    for table in tables {
        let label = format!(
            "{} ({} columns, {} measures)",
            table.name,
            table.columns.len(),
            table.measure_count
        );
        declare(&mut ids, &mut entities, &table.name, label);
    }
    for rel in relationships {
        declare(&mut ids, &mut entities, &rel.from, rel.from.clone());
        declare(&mut ids, &mut entities, &rel.to, rel.to.clone());
    }

    let mut mermaid = String::from("erDiagram\n");
    for (id, label) in &entities {
        mermaid.push_str(&format!(
            "    {}[\"{}\"] {{\n    }}\n",
            id,
            escape_label(label)
        ));
    }
    for rel in relationships {
        let (Some(from), Some(to)) = (ids.get(rel.from.as_str()), ids.get(rel.to.as_str())) else {
            continue;
        };
        mermaid.push_str(&format!(
            "    {} {} {} : \"{} -> {}\"\n",
            from,
            connector(rel),
            to,
            escape_label(&rel.from_column),
            escape_label(&rel.to_column)
        ));
    }

    DiagramView {
        mermaid,
        entity_count: entities.len(),
        edge_count: relationships.len(),
    }
}

/// Assign the next positional id to `name` unless it already has one
fn declare<'a>(
    ids: &mut HashMap<&'a str, String>,
    entities: &mut Vec<(String, String)>,
    name: &'a str,
    label: String,
) {
    if ids.contains_key(name) {
        return;
    }
    let id = format!("t{}", entities.len());
    ids.insert(name, id.clone());
    entities.push((id, label));
}

/// Crow's-foot connector; inactive relationships are dotted
fn connector(rel: &Relationship) -> String {
    let (left, right) = match rel.cardinality {
        Cardinality::OneToOne => ("||", "||"),
        Cardinality::OneToMany => ("||", "o{"),
        Cardinality::ManyToOne => ("}o", "||"),
        Cardinality::ManyToMany => ("}o", "o{"),
    };
    let line = if rel.is_active { "--" } else { ".." };
    format!("{}{}{}", left, line, right)
}

fn escape_label(text: &str) -> String {
    text.replace('"', "'")
}
