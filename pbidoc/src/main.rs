//! pbidoc - Power BI project documentation tool
//!
//! A CLI tool that documents an unpacked Power BI project folder as a
//! Markdown, HTML or DOCX report.

#![deny(unsafe_code)]
#![cfg_attr(all(not(debug_assertions), not(test)), deny(clippy::all))]

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use pbidoc::documentation_config::DocumentationConfig;
use pbidoc::pipeline::{self, EditOptions, OutputFormat};
use pbidoc::{diagram, ExtractionWarning, ProjectModel};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Main entry point for the pbidoc CLI application
fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:?}", e);
        std::process::exit(1);
    }
}

/// Run the CLI application
fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            input,
            output,
            format,
            config,
            diagram_image,
            title,
            description,
            drop_tables,
            verbose,
        } => {
            init_logging(verbose);
            let request = BuildRequest {
                input,
                output,
                format,
                config,
                diagram_image,
                edits: EditOptions {
                    documentation: None,
                    title,
                    description,
                    drop_tables,
                },
            };
            handle_build_command(request)?;
        }

        Commands::Inspect {
            input,
            json,
            verbose,
        } => {
            init_logging(verbose);
            handle_inspect_command(&input, json)?;
        }

        Commands::Diagram {
            input,
            output,
            verbose,
        } => {
            init_logging(verbose);
            handle_diagram_command(&input, output.as_deref())?;
        }
    }

    Ok(())
}

/// Log to stderr; `--verbose` shows progress, otherwise `RUST_LOG` (default warn)
fn init_logging(verbose: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if verbose {
        builder.filter_level(log::LevelFilter::Info);
    }
    builder.init();
}

/// Arguments of the build command
struct BuildRequest {
    input: PathBuf,
    output: Option<PathBuf>,
    format: Option<OutputFormat>,
    config: Option<PathBuf>,
    diagram_image: Option<PathBuf>,
    edits: EditOptions,
}

/// Handle the build command
fn handle_build_command(mut request: BuildRequest) -> Result<()> {
    println!("Building documentation...");
    println!("Input: {}", request.input.display());

    // Stage 1: Extract the model
    println!("\n[Stage 1/3] Extracting model...");
    let extraction = pipeline::parse_sources(&request.input)
        .with_context(|| format!("Failed to extract model from {}", request.input.display()))?;
    print_extraction_summary(&extraction.model, &extraction.warnings);

    // Stage 2: Apply documentation and edits, lay out the report
    println!("\n[Stage 2/3] Building report...");
    request.edits.documentation =
        DocumentationConfig::locate(&request.input, request.config.as_deref())
            .context("Failed to load documentation config")?;
    let model = pipeline::apply_edits(&extraction.model, &request.edits)
        .context("Failed to apply edits")?;

    let image = request
        .diagram_image
        .as_deref()
        .map(pipeline::load_diagram_image)
        .transpose()
        .context("Failed to load diagram image")?;

    let document = pipeline::transform(&model, image);
    println!(
        "✓ Laid out {} sections ({} words)",
        document.sections.len(),
        document.word_count()
    );

    // Stage 3: Export
    let (format, output) = resolve_output(request.format, request.output, &model.metadata.title)?;
    println!("\n[Stage 3/3] Exporting to {}...", format);
    pipeline::export(&document, format, &output)
        .with_context(|| format!("Failed to export {} to {}", format, output.display()))?;
    println!("✓ Successfully wrote: {}", output.display());

    println!("\n✓ Build completed successfully!");

    Ok(())
}

/// Decide format and output path
///
/// An explicit format adds its extension to an output path without one.
/// Otherwise the format comes from the output extension, defaulting to DOCX.
fn resolve_output(
    format: Option<OutputFormat>,
    output: Option<PathBuf>,
    title: &str,
) -> Result<(OutputFormat, PathBuf)> {
    match (format, output) {
        (Some(format), Some(mut output)) => {
            if output.extension().is_none() {
                output.set_extension(format.extension());
            }
            Ok((format, output))
        }
        (Some(format), None) => Ok((
            format,
            pipeline::default_output_path(Path::new("."), title, format),
        )),
        (None, Some(mut output)) => match output.extension().and_then(|s| s.to_str()) {
            None => {
                output.set_extension(OutputFormat::Docx.extension());
                Ok((OutputFormat::Docx, output))
            }
            Some(ext) => {
                let format = OutputFormat::from_extension(&output).with_context(|| {
                    format!(
                        "Unknown output format for extension '.{}'. Supported: .md, .html, .docx\nUse --format to specify explicitly.",
                        ext
                    )
                })?;
                Ok((format, output))
            }
        },
        (None, None) => Ok((
            OutputFormat::Docx,
            pipeline::default_output_path(Path::new("."), title, OutputFormat::Docx),
        )),
    }
}

/// Full model plus warnings, as printed by `inspect --json`
#[derive(Serialize)]
struct InspectReport<'a> {
    model: &'a ProjectModel,
    warnings: &'a [ExtractionWarning],
}

/// Handle the inspect command
fn handle_inspect_command(input: &Path, json: bool) -> Result<()> {
    let extraction = pipeline::parse_sources(input)
        .with_context(|| format!("Failed to extract model from {}", input.display()))?;

    if json {
        let report = InspectReport {
            model: &extraction.model,
            warnings: &extraction.warnings,
        };
        let text = serde_json::to_string_pretty(&report).context("Failed to serialize model")?;
        println!("{}", text);
        return Ok(());
    }

    let model = &extraction.model;
    println!("{}", model.metadata.title);
    if let Some(author) = &model.metadata.author {
        println!("Author: {}", author);
    }
    if let Some(modified) = model.metadata.last_modified {
        println!("Last modified: {}", modified.format("%Y-%m-%d %H:%M UTC"));
    }
    print_extraction_summary(model, &extraction.warnings);

    println!("\nTables:");
    for table in &model.tables {
        println!(
            "  {} ({} columns, {} measures)",
            table.name,
            table.columns.len(),
            table.measure_count
        );
        for measure in model.measures_of(&table.name) {
            println!("    - {}: {}", measure.name, measure.description);
        }
    }

    if !model.relationships.is_empty() {
        println!("\nRelationships:");
        for rel in &model.relationships {
            println!(
                "  {}.{} -> {}.{} ({})",
                rel.from, rel.from_column, rel.to, rel.to_column, rel.cardinality
            );
        }
    }

    for warning in &extraction.warnings {
        println!("⚠ {}", warning);
    }

    Ok(())
}

/// Handle the diagram command
fn handle_diagram_command(input: &Path, output: Option<&Path>) -> Result<()> {
    let extraction = pipeline::parse_sources(input)
        .with_context(|| format!("Failed to extract model from {}", input.display()))?;

    let Some(view) = diagram::for_model(&extraction.model) else {
        anyhow::bail!("The model has no relationships to draw");
    };

    match output {
        Some(path) => {
            std::fs::write(path, &view.mermaid)
                .with_context(|| format!("Failed to write diagram to {}", path.display()))?;
            println!("✓ Successfully wrote: {}", path.display());
        }
        None => print!("{}", view),
    }

    Ok(())
}

/// Print extraction counts
fn print_extraction_summary(model: &ProjectModel, warnings: &[ExtractionWarning]) {
    println!(
        "✓ Extracted {} tables, {} columns, {} measures, {} relationships",
        model.tables.len(),
        model.column_count(),
        model.measures.len(),
        model.relationships.len()
    );
    if !warnings.is_empty() {
        println!("  {} files or blocks were skipped", warnings.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_output_from_extension() {
        let (format, path) = resolve_output(None, Some(PathBuf::from("doc.html")), "T").unwrap();
        assert_eq!(format, OutputFormat::Html);
        assert_eq!(path, PathBuf::from("doc.html"));

        let (format, path) = resolve_output(None, Some(PathBuf::from("doc")), "T").unwrap();
        assert_eq!(format, OutputFormat::Docx);
        assert_eq!(path, PathBuf::from("doc.docx"));

        assert!(resolve_output(None, Some(PathBuf::from("doc.pdf")), "T").is_err());
    }

    #[test]
    fn test_resolve_output_from_title() {
        let (format, path) = resolve_output(Some(OutputFormat::Markdown), None, "Sales Report").unwrap();
        assert_eq!(format, OutputFormat::Markdown);
        assert_eq!(path, Path::new(".").join("Sales_Report_Documentation.md"));

        let (_, path) = resolve_output(Some(OutputFormat::Html), Some(PathBuf::from("out/report")), "T").unwrap();
        assert_eq!(path, PathBuf::from("out/report.html"));
    }
}
