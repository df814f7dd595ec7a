use pbidoc::documentation_config::DocumentationConfig;
use pbidoc::pipeline::{self, EditOptions, OutputFormat};
use pbidoc::report_document::titles;
use std::fs;
use std::path::{Path, PathBuf};

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// A small model folder with two tables, two measures and one relationship
fn shop_model(dir: &Path) -> PathBuf {
    let root = dir.join("Shop.SemanticModel");
    write(
        &root,
        "item.metadata.json",
        r#"{"displayName": "Shop Sales", "createdBy": {"displayName": "BI Team"}}"#,
    );
    write(
        &root,
        "definition/tables/Sales.tmdl",
        "table Sales\n\tcolumn CustomerID\n\tcolumn Amount\n\
         \tmeasure 'Total Sales' = SUM(Sales[Amount])\n\
         \tmeasure Margin =\n\t\tVAR cost = SUM(Sales[Cost])\n\t\tRETURN [Total Sales] - cost\n",
    );
    write(
        &root,
        "definition/tables/Customer.tmdl",
        "table Customer\n\tcolumn ID\n\tcolumn Name\n",
    );
    write(
        &root,
        "definition/relationships.tmdl",
        "relationship r1\n\tfromColumn: Sales.CustomerID\n\ttoColumn: Customer.ID\n",
    );
    root
}

const DOCUMENTATION: &str = r#"
area = "Commercial"
update_frequency = "Daily"

[objective]
description = "Track revenue"
problem_resolved = "Late reports"
decision_helper = "Budget allocation"
target_audience = "Sales managers"
main_question = "Are we on target?"

[[business_rules]]
id = "BR-1"
title = "Returns"
description = "Returned orders are excluded"
"#;

#[test]
fn test_build_markdown() {
    let dir = tempfile::tempdir().unwrap();
    let root = shop_model(dir.path());

    let extraction = pipeline::parse_sources(&root).unwrap();
    let doc = pipeline::transform(&extraction.model, None);
    let output = pipeline::default_output_path(
        &dir.path().join("out"),
        &extraction.model.metadata.title,
        OutputFormat::Markdown,
    );
    pipeline::export(&doc, OutputFormat::Markdown, &output).unwrap();

    assert!(output.ends_with("Shop_Sales_Documentation.md"));
    let text = fs::read_to_string(&output).unwrap();
    assert!(text.starts_with("# Shop Sales"));
    assert!(text.contains(titles::MEASURES));
    assert!(text.contains("Total Sales"));
    assert!(text.contains("```mermaid"));
    assert!(text.contains("erDiagram"));
    assert!(text.contains(titles::RELATIONSHIPS));
    // No documentation file, no dashboard section
    assert!(!text.contains(titles::DASHBOARD));
}

#[test]
fn test_build_html_and_docx() {
    let dir = tempfile::tempdir().unwrap();
    let root = shop_model(dir.path());

    let extraction = pipeline::parse_sources(&root).unwrap();
    let doc = pipeline::transform(&extraction.model, None);

    let html = dir.path().join("report.html");
    pipeline::export(&doc, OutputFormat::Html, &html).unwrap();
    let text = fs::read_to_string(&html).unwrap();
    assert!(text.starts_with("<!DOCTYPE html>"));
    assert!(text.contains("Shop Sales"));
    assert!(text.contains("class=\"mermaid\""));

    let docx = dir.path().join("report.docx");
    pipeline::export(&doc, OutputFormat::Docx, &docx).unwrap();
    let bytes = fs::read(&docx).unwrap();
    assert!(bytes.starts_with(b"PK"));
}

#[test]
fn test_documentation_file_is_applied() {
    let dir = tempfile::tempdir().unwrap();
    let root = shop_model(dir.path());
    write(&root, "pbidoc.toml", DOCUMENTATION);

    let extraction = pipeline::parse_sources(&root).unwrap();
    let config = DocumentationConfig::locate(&root, None).unwrap();
    assert!(config.is_some());

    let options = EditOptions {
        documentation: config,
        ..Default::default()
    };
    let model = pipeline::apply_edits(&extraction.model, &options).unwrap();
    assert_eq!(model.metadata.title, "Shop Sales");
    assert_eq!(model.metadata.area.as_deref(), Some("Commercial"));
    assert_eq!(model.metadata.business_rules.len(), 1);

    let doc = pipeline::transform(&model, None);
    let dashboard = doc.section(titles::DASHBOARD).unwrap();
    assert!(!dashboard.subsections.is_empty());

    let output = dir.path().join("doc.md");
    pipeline::export(&doc, OutputFormat::Markdown, &output).unwrap();
    let text = fs::read_to_string(&output).unwrap();
    assert!(text.contains("Commercial"));
    assert!(text.contains("Returned orders are excluded"));
}

#[test]
fn test_dropping_a_table_removes_its_diagram() {
    let dir = tempfile::tempdir().unwrap();
    let root = shop_model(dir.path());

    let extraction = pipeline::parse_sources(&root).unwrap();
    let options = EditOptions {
        title: Some("Customers only".to_string()),
        drop_tables: vec!["Sales".to_string()],
        ..Default::default()
    };
    let model = pipeline::apply_edits(&extraction.model, &options).unwrap();
    assert_eq!(model.metadata.title, "Customers only");
    assert_eq!(model.tables.len(), 1);
    assert!(model.measures.is_empty());
    assert!(model.relationships.is_empty());

    let doc = pipeline::transform(&model, None);
    assert!(doc.section(titles::DIAGRAM).is_none());
    // The source model is unchanged
    assert_eq!(extraction.model.tables.len(), 2);
}

#[test]
fn test_pipeline_warnings_do_not_stop_the_build() {
    let dir = tempfile::tempdir().unwrap();
    let root = shop_model(dir.path());
    write(
        &root,
        "definition/relationships.tmdl",
        "relationship r1\n\tfromColumn: Sales.CustomerID\n\ttoColumn: Customer.ID\n\
         relationship r2\n\ttoColumn: Customer.ID\n",
    );

    let extraction = pipeline::parse_sources(&root).unwrap();
    assert_eq!(extraction.model.relationships.len(), 1);
    assert_eq!(extraction.warnings.len(), 1);
    assert_eq!(
        extraction.warnings[0].path.as_deref(),
        Some("Shop.SemanticModel/definition/relationships.tmdl")
    );

    let doc = pipeline::transform(&extraction.model, None);
    let output = dir.path().join("doc.html");
    pipeline::export(&doc, OutputFormat::Html, &output).unwrap();
    assert!(output.exists());
}
