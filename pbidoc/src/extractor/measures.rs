//! Measure declarations in table definition files
//!
//! A declaration looks like `measure <name> = <body>`. The body runs until
//! the next line that starts a `measure` or `column` declaration, or the end
//! of the text. Property lines such as `formatString:` and `lineageTag:`
//! belong to the source format, not to the calculation, and are removed.

use regex::Regex;
use std::sync::LazyLock;

use super::describe::describe_measure;
use super::rule::{check_scan_size, RuleResult};
use crate::project_model::Measure;

/// `measure` keyword, then a quoted or bare name, then `=`
static MEASURE_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\bmeasure\s+(?:'([^'\r\n]+)'|"([^"\r\n]+)"|(\w+))\s*="#)
        .expect("measure header pattern is valid")
});

/// Start of the next line that opens a `measure` or `column` declaration
static DECLARATION_BOUNDARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\n\s*(?:measure|column)\b").expect("declaration boundary pattern is valid")
});

/// Line prefixes that carry source-format metadata
const METADATA_LINE_PREFIXES: &[&str] = &["formatString", "lineageTag", "annotation"];

const FORMAT_STRING_PREFIX: &str = "formatString";

/// One raw declaration as found in the text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeasureDeclaration<'t> {
    pub name: &'t str,
    /// Body between `=` and the next declaration, untrimmed
    pub body: &'t str,
}

/// Extract every measure declared in a table file
///
/// # Parameters
/// * `table` - Table name derived from the file name
/// * `text` - Full file text
///
/// # Returns
/// * `Found(measures)` - At least one declaration, in textual order
/// * `NotFound` - The file declares no measures
/// * `Malformed(reason)` - The text exceeds the scan limit
pub fn extract_measures(table: &str, text: &str) -> RuleResult<Vec<Measure>> {
    if let Err(malformed) = check_scan_size(text) {
        return malformed;
    }

    let measures: Vec<Measure> = declarations(text)
        .into_iter()
        .map(|decl| build_measure(table, decl))
        .collect();

    if measures.is_empty() {
        RuleResult::NotFound
    } else {
        RuleResult::Found(measures)
    }
}

/// Find all measure declarations, left to right, without overlap
pub fn declarations(text: &str) -> Vec<MeasureDeclaration<'_>> {
    let mut found = Vec::new();
    let mut pos = 0;

    while let Some(caps) = MEASURE_HEADER.captures_at(text, pos) {
        let Some(header) = caps.get(0) else { break };
        let name = caps
            .get(1)
            .or_else(|| caps.get(2))
            .or_else(|| caps.get(3))
            .map_or("", |m| m.as_str());

        let body_start = header.end();
        let body_end = DECLARATION_BOUNDARY
            .find_at(text, body_start)
            .map_or(text.len(), |m| m.start());

        found.push(MeasureDeclaration {
            name,
            body: &text[body_start..body_end],
        });
        pos = body_end;
    }

    found
}

fn build_measure(table: &str, decl: MeasureDeclaration<'_>) -> Measure {
    let body = decl.body.trim();
    let formula = strip_metadata_lines(body);
    let description = describe_measure(decl.name, &formula);
    Measure {
        name: decl.name.to_string(),
        table: table.to_string(),
        formula,
        description,
        format_string: format_string(body),
    }
}

/// Remove lines that start with a source-format metadata property
///
/// Running this on its own output returns the same string.
pub fn strip_metadata_lines(body: &str) -> String {
    body.split('\n')
        .filter(|line| {
            let trimmed = line.trim();
            !METADATA_LINE_PREFIXES
                .iter()
                .any(|prefix| trimmed.starts_with(prefix))
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Value of the first `formatString:` line, without surrounding quotes
fn format_string(body: &str) -> Option<String> {
    body.lines()
        .map(str::trim)
        .find(|line| line.starts_with(FORMAT_STRING_PREFIX))
        .and_then(|line| line.split_once(':'))
        .map(|(_, value)| value.trim())
        .map(|value| {
            value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(value)
                .to_string()
        })
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn found(result: RuleResult<Vec<Measure>>) -> Vec<Measure> {
        match result {
            RuleResult::Found(measures) => measures,
            other => panic!("expected measures, got {:?}", other),
        }
    }

    #[test]
    fn test_sales_sample() {
        let text = "column Amount\ncolumn Date\nmeasure TotalSales = SUM(Sales[Amount])\n  formatString: \"#,0\"";
        let measures = found(extract_measures("Sales", text));
        assert_eq!(measures.len(), 1);
        assert_eq!(measures[0].name, "TotalSales");
        assert_eq!(measures[0].table, "Sales");
        assert_eq!(measures[0].formula, "SUM(Sales[Amount])");
        assert_eq!(measures[0].description, "Calculates the total of Sales");
        assert_eq!(measures[0].format_string.as_deref(), Some("#,0"));
    }

    #[test]
    fn test_measures_in_declaration_order() {
        let text = "\
table Sales
\tmeasure 'Total Sales' = SUM(Sales[Amount])
\t\tformatString: #,0.00
\t\tlineageTag: 1b2c

\tmeasure Orders = COUNTROWS(Sales)
\t\tlineageTag: 3d4e

\tmeasure \"Avg Ticket\" =
\t\t\tDIVIDE(
\t\t\t\t[Total Sales],
\t\t\t\t[Orders]
\t\t\t)
\t\tannotation PBI_FormatHint = {\"isGeneralNumber\":true}

\tcolumn Amount
\t\tdataType: decimal
";
        let measures = found(extract_measures("Sales", text));
        let names: Vec<_> = measures.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Total Sales", "Orders", "Avg Ticket"]);
        assert_eq!(measures[0].formula, "SUM(Sales[Amount])");
        assert_eq!(measures[0].format_string.as_deref(), Some("#,0.00"));
        assert_eq!(measures[1].formula, "COUNTROWS(Sales)");
        assert_eq!(measures[1].format_string, None);
        assert_eq!(
            measures[2].formula,
            "DIVIDE(\n\t\t\t\t[Total Sales],\n\t\t\t\t[Orders]\n\t\t\t)"
        );
        assert!(measures.iter().all(|m| m.table == "Sales"));
    }

    #[test]
    fn test_no_measures_is_not_found() {
        let text = "table Customer\n\tcolumn ID\n\tcolumn Name\n";
        assert_eq!(extract_measures("Customer", text), RuleResult::NotFound);
        assert_eq!(extract_measures("Empty", ""), RuleResult::NotFound);
    }

    #[test]
    fn test_keyword_is_case_insensitive() {
        let text = "MEASURE Margin = [Revenue] - [Cost]\nColumn Revenue";
        let measures = found(extract_measures("Finance", text));
        assert_eq!(measures.len(), 1);
        assert_eq!(measures[0].formula, "[Revenue] - [Cost]");
    }

    #[test]
    fn test_measure_inside_word_is_not_a_declaration() {
        let text = "column Remeasure = 1\nmeasure Real = 2";
        let decls = declarations(text);
        assert_eq!(decls.len(), 1);
        assert_eq!(decls[0].name, "Real");
    }

    #[test]
    fn test_n_declarations_yield_n_measures() {
        for n in 0..6 {
            let text: String = (0..n)
                .map(|i| format!("measure M{} = {}\n", i, i))
                .collect();
            let measures = extract_measures("T", &text).found().unwrap_or_default();
            assert_eq!(measures.len(), n);
            for (i, m) in measures.iter().enumerate() {
                assert_eq!(m.name, format!("M{}", i));
                assert_eq!(m.formula, i.to_string());
            }
        }
    }

    #[test]
    fn test_strip_is_idempotent() {
        let body = "  CALCULATE(\n    [Sales],\n    formatString: x\n  )\n  lineageTag: abc\n  annotation Foo = 1";
        let once = strip_metadata_lines(body);
        assert_eq!(once, "CALCULATE(\n    [Sales],\n  )");
        assert_eq!(strip_metadata_lines(&once), once);
    }

    #[test]
    fn test_crlf_line_endings() {
        let text = "measure Total = SUM(T[x])\r\n\tformatString: 0\r\nmeasure Count = COUNT(T[x])\r\n";
        let measures = found(extract_measures("T", text));
        assert_eq!(measures.len(), 2);
        assert_eq!(measures[0].formula, "SUM(T[x])");
        assert_eq!(measures[1].formula, "COUNT(T[x])");
    }
}
