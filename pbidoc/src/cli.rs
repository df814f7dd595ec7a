//! Command-line interface definitions for pbidoc

use clap::{Parser, Subcommand};
use pbidoc::pipeline::OutputFormat;
use std::path::PathBuf;

/// CLI structure for the pbidoc application
#[derive(Parser)]
#[command(name = "pbidoc")]
#[command(version)]
#[command(about = "Power BI project documentation tool", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands for pbidoc
#[derive(Subcommand)]
pub enum Commands {
    /// Extract a model folder and write its documentation
    Build {
        /// Model folder, usually the one ending in .SemanticModel
        #[arg(value_name = "PATH", default_value = ".")]
        input: PathBuf,

        /// Output file (defaults to <title>_Documentation.<ext>)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format (detected from the output extension if omitted)
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,

        /// Documentation file (defaults to <PATH>/pbidoc.toml when present)
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Rendered relationship diagram to embed instead of Mermaid source
        #[arg(long, value_name = "IMAGE")]
        diagram_image: Option<PathBuf>,

        /// Report title override
        #[arg(long)]
        title: Option<String>,

        /// Report description override
        #[arg(long)]
        description: Option<String>,

        /// Leave a table out, with its measures and relationships (repeatable)
        #[arg(long = "drop-table", value_name = "NAME")]
        drop_tables: Vec<String>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Print what was extracted from a model folder
    Inspect {
        /// Model folder
        #[arg(value_name = "PATH", default_value = ".")]
        input: PathBuf,

        /// Print the full model and warnings as JSON
        #[arg(long)]
        json: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Print or write the Mermaid relationship diagram
    Diagram {
        /// Model folder
        #[arg(value_name = "PATH", default_value = ".")]
        input: PathBuf,

        /// Output file (prints to stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_arguments() {
        let cli = Cli::try_parse_from([
            "pbidoc",
            "build",
            "Sales.SemanticModel",
            "-f",
            "html",
            "--drop-table",
            "Staging",
            "--drop-table",
            "Audit",
        ])
        .unwrap();

        let Commands::Build {
            input,
            format,
            drop_tables,
            output,
            ..
        } = cli.command
        else {
            panic!("expected build");
        };
        assert_eq!(input, PathBuf::from("Sales.SemanticModel"));
        assert_eq!(format, Some(OutputFormat::Html));
        assert_eq!(drop_tables, vec!["Staging", "Audit"]);
        assert_eq!(output, None);
    }

    #[test]
    fn test_inspect_defaults_to_current_dir() {
        let cli = Cli::try_parse_from(["pbidoc", "inspect", "--json"]).unwrap();
        let Commands::Inspect { input, json, .. } = cli.command else {
            panic!("expected inspect");
        };
        assert_eq!(input, PathBuf::from("."));
        assert!(json);
    }
}
