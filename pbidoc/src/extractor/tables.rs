//! Table summaries: declared columns and the measure keyword count

use regex::Regex;
use std::sync::LazyLock;

use super::rule::{check_scan_size, RuleResult};
use crate::project_model::Table;

static COLUMN_DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\bcolumn\s+(?:'([^'\r\n]+)'|"([^"\r\n]+)"|(\w+))"#)
        .expect("column declaration pattern is valid")
});

static MEASURE_KEYWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bmeasure\s+").expect("measure keyword pattern is valid"));

/// Summarise one table definition file
///
/// The measure count is a plain keyword count and may disagree with the
/// number of declarations [`super::measures::extract_measures`] recovers.
///
/// # Returns
/// * `Found(table)` - Always, for text within the scan limit
/// * `Malformed(reason)` - The text exceeds the scan limit
pub fn extract_table(name: &str, text: &str) -> RuleResult<Table> {
    if let Err(malformed) = check_scan_size(text) {
        return malformed;
    }

    RuleResult::Found(Table {
        name: name.to_string(),
        columns: columns(text),
        measure_count: MEASURE_KEYWORD.find_iter(text).count(),
    })
}

/// Column names in order of appearance, duplicates kept
pub fn columns(text: &str) -> Vec<String> {
    COLUMN_DECLARATION
        .captures_iter(text)
        .filter_map(|caps| {
            caps.get(1)
                .or_else(|| caps.get(2))
                .or_else(|| caps.get(3))
                .map(|m| m.as_str().to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sales_sample() {
        let text = "column Amount\ncolumn Date\nmeasure TotalSales = SUM(Sales[Amount])\n  formatString: \"#,0\"";
        let table = extract_table("Sales", text).found().unwrap();
        assert_eq!(
            table,
            Table {
                name: "Sales".to_string(),
                columns: vec!["Amount".to_string(), "Date".to_string()],
                measure_count: 1,
            }
        );
    }

    #[test]
    fn test_quoted_columns_and_duplicates() {
        let text = "\
table Customer
\tcolumn 'Customer Key'
\t\tdataType: int64
\t\tsortByColumn: Name
\tcolumn Name
\tcolumn \"Name\"
";
        let table = extract_table("Customer", text).found().unwrap();
        assert_eq!(table.columns, vec!["Customer Key", "Name", "Name"]);
        assert_eq!(table.measure_count, 0);
    }

    #[test]
    fn test_measure_count_counts_keywords() {
        let text = "measure A = 1\nMEASURE B = 2\n// measure notes\nmeasures";
        let table = extract_table("T", text).found().unwrap();
        assert_eq!(table.measure_count, 3);
    }

    #[test]
    fn test_measure_count_ignores_longer_words() {
        let text = "measure A = 1\nRemeasure x\nremeasure\ty";
        let table = extract_table("T", text).found().unwrap();
        assert_eq!(table.measure_count, 1);
    }

    #[test]
    fn test_empty_file_yields_empty_table() {
        let table = extract_table("Blank", "").found().unwrap();
        assert!(table.columns.is_empty());
        assert_eq!(table.measure_count, 0);
    }
}
