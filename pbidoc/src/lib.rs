//! pbidoc - Power BI project documentation
//!
//! Reads an unpacked Power BI project folder (`.SemanticModel` / `.Report`),
//! extracts tables, columns, DAX measures and relationships from its text
//! model files, and writes a documentation report.
//!
//! The work is split into three stages (see [`pipeline`]):
//! 1. [`source_files`] + [`extractor`] build a [`project_model::ProjectModel`]
//! 2. [`edit`] and [`documentation_config`] adjust it, [`report_document`]
//!    lays it out
//! 3. the exporters write Markdown, HTML or DOCX

#![deny(unsafe_code)]
#![cfg_attr(all(not(debug_assertions), not(test)), deny(clippy::all))]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]

pub mod diagram;
pub mod documentation_config;
pub mod edit;
pub mod extractor;
pub mod pipeline;
pub mod project_model;
pub mod report_document;
pub mod source_files;

// Exporters
pub mod docx_exporter;
pub mod html_exporter;
pub mod markdown_exporter;

pub use extractor::{extract, ExtractError, Extraction, ExtractionWarning};
pub use project_model::{Measure, ProjectMetadata, ProjectModel, Relationship, Table};
pub use source_files::{collect_source_files, SourceFile};
