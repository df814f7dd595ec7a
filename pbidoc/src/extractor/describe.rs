//! One-line descriptions for measures
//!
//! An ordered list of rules; the first whose predicate holds writes the
//! description. Name checks are case-insensitive, formula checks look for
//! upper-case DAX function names.

use regex::Regex;
use std::sync::LazyLock;

static TOTAL_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)total").expect("total pattern is valid"));
static COUNT_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)count").expect("count pattern is valid"));
static AVERAGE_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)avg|media").expect("average pattern is valid"));

/// Measure text prepared once for all rules
struct MeasureText<'a> {
    name: &'a str,
    lower_name: String,
    upper_formula: String,
}

struct DescriptionRule {
    applies: fn(&MeasureText<'_>) -> bool,
    describe: fn(&MeasureText<'_>) -> String,
}

const RULES: &[DescriptionRule] = &[
    DescriptionRule {
        applies: is_total,
        describe: describe_total,
    },
    DescriptionRule {
        applies: is_count,
        describe: describe_count,
    },
    DescriptionRule {
        applies: is_average,
        describe: describe_average,
    },
    DescriptionRule {
        applies: is_conditional,
        describe: describe_conditional,
    },
];

/// Describe a measure from its name and formula
pub fn describe_measure(name: &str, formula: &str) -> String {
    let text = MeasureText {
        name,
        lower_name: name.to_lowercase(),
        upper_formula: formula.to_uppercase(),
    };

    RULES
        .iter()
        .find(|rule| (rule.applies)(&text))
        .map(|rule| (rule.describe)(&text))
        .unwrap_or_else(|| format!("Calculated measure: {}", name))
}

fn is_total(m: &MeasureText<'_>) -> bool {
    m.lower_name.contains("total") || m.upper_formula.contains("SUM(")
}

fn describe_total(m: &MeasureText<'_>) -> String {
    format!("Calculates the total of {}", subject(m.name, &TOTAL_WORD))
}

fn is_count(m: &MeasureText<'_>) -> bool {
    m.lower_name.contains("count") || m.upper_formula.contains("COUNT")
}

fn describe_count(m: &MeasureText<'_>) -> String {
    format!("Counts the number of {}", subject(m.name, &COUNT_WORD))
}

fn is_average(m: &MeasureText<'_>) -> bool {
    m.lower_name.contains("avg")
        || m.lower_name.contains("media")
        || m.upper_formula.contains("AVERAGE")
}

fn describe_average(m: &MeasureText<'_>) -> String {
    format!("Calculates the average of {}", subject(m.name, &AVERAGE_WORD))
}

fn is_conditional(m: &MeasureText<'_>) -> bool {
    m.upper_formula.contains("CALCULATE(")
}

fn describe_conditional(m: &MeasureText<'_>) -> String {
    format!("Conditional calculation for {}", m.name)
}

/// The name with its first keyword occurrence removed, trimmed
///
/// A name that is only the keyword leaves an empty subject.
fn subject(name: &str, keyword: &Regex) -> String {
    keyword.replacen(name, 1, "").trim().to_string()
}
