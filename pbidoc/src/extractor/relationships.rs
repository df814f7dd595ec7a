//! Relationship blocks in the relationships definition file
//!
//! ```text
//! relationship 6f1b0c9e-1111-4c1d-9a55-0c3f3d1c2b7a
//!     fromColumn: 'Sales'.'CustomerID'
//!     toColumn: Customer.ID
//! ```
//!
//! A block runs from its `relationship` header to the next header. Only the
//! endpoints are read; every relationship gets the fixed cardinality,
//! direction and active flag of [`Relationship::between`].

use regex::{Captures, Regex};
use std::sync::LazyLock;

use super::rule::{check_scan_size, RuleResult};
use crate::project_model::Relationship;

/// Placeholder for a column name that could not be read
pub const UNKNOWN_COLUMN: &str = "?";

static RELATIONSHIP_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\brelationship[ \t]+(?:'[^'\r\n]+'|[\w-]+)[ \t]*(?:\r\n|\n|\r)")
        .expect("relationship header pattern is valid")
});

static FROM_COLUMN: LazyLock<Regex> = LazyLock::new(|| endpoint_pattern("fromColumn"));

static TO_COLUMN: LazyLock<Regex> = LazyLock::new(|| endpoint_pattern("toColumn"));

/// `<property>: <Table>[.<Column>]`, each part quoted or bare
fn endpoint_pattern(property: &str) -> Regex {
    Regex::new(&format!(
        r"(?i)\b{}\s*:[ \t]*(?:'([^'\r\n]*)'|(\w+))(?:\.(?:'([^'\r\n]*)'|(\w+)))?",
        property
    ))
    .expect("endpoint pattern is valid")
}

/// Relationships recovered from one file, plus the blocks that were skipped
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationshipScan {
    pub relationships: Vec<Relationship>,
    /// One reason per block that named a relationship but had unusable
    /// endpoints
    pub skipped: Vec<String>,
}

/// Extract every relationship declared in the relationships file
///
/// # Returns
/// * `Found(scan)` - At least one `relationship` block was present
/// * `NotFound` - The text declares no relationships
/// * `Malformed(reason)` - The text exceeds the scan limit
pub fn extract_relationships(text: &str) -> RuleResult<RelationshipScan> {
    if let Err(malformed) = check_scan_size(text) {
        return malformed;
    }

    let blocks = blocks(text);
    if blocks.is_empty() {
        return RuleResult::NotFound;
    }

    let mut scan = RelationshipScan::default();
    for block in blocks {
        match parse_block(block) {
            RuleResult::Found(rel) => scan.relationships.push(rel),
            RuleResult::Malformed(reason) => scan.skipped.push(reason),
            RuleResult::NotFound => {}
        }
    }
    RuleResult::Found(scan)
}

/// Split the text into relationship blocks, header included
fn blocks(text: &str) -> Vec<&str> {
    let starts: Vec<usize> = RELATIONSHIP_HEADER
        .find_iter(text)
        .map(|m| m.start())
        .collect();

    starts
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let end = starts.get(i + 1).copied().unwrap_or(text.len());
            &text[start..end]
        })
        .collect()
}

/// One endpoint as written, before resolution
struct Endpoint {
    table: String,
    column: String,
}

fn endpoint(caps: &Captures<'_>) -> Endpoint {
    let pick = |quoted: usize, bare: usize| {
        caps.get(quoted)
            .or_else(|| caps.get(bare))
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default()
    };
    let column = pick(3, 4);
    Endpoint {
        table: pick(1, 2),
        column: if column.is_empty() {
            UNKNOWN_COLUMN.to_string()
        } else {
            column
        },
    }
}

/// Read the endpoints of a single block
///
/// A block with neither endpoint line is `NotFound`; a block with one
/// missing or an empty table name is `Malformed`.
pub fn parse_block(block: &str) -> RuleResult<Relationship> {
    let from = FROM_COLUMN.captures(block).map(|c| endpoint(&c));
    let to = TO_COLUMN.captures(block).map(|c| endpoint(&c));
    let header = block.lines().next().unwrap_or_default().trim();

    match (from, to) {
        (None, None) => RuleResult::NotFound,
        (None, Some(_)) => RuleResult::Malformed(format!("'{}' has no fromColumn", header)),
        (Some(_), None) => RuleResult::Malformed(format!("'{}' has no toColumn", header)),
        (Some(from), Some(to)) if from.table.is_empty() || to.table.is_empty() => {
            RuleResult::Malformed(format!("'{}' names an empty table", header))
        }
        (Some(from), Some(to)) => RuleResult::Found(Relationship::between(
            from.table,
            from.column,
            to.table,
            to.column,
        )),
    }
}
