//! # SQL Function Registry
//!
//! Static classification of built-in SQL function names into five
//! categories. The registry backs function-call extraction in `scan`,
//! type inference in `expr`, and aggregate detection in the planner and
//! validator.
//!
//! Names are stored upper-case in a compile-time perfect hash map (phf
//! crate); lookups fold the queried name to upper-case, so
//! `category_of("count")` and `category_of("COUNT")` agree.

use phf::phf_map;

/// Category of a built-in SQL function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionCategory {
    Aggregate,
    String,
    Numeric,
    Date,
    Conditional,
    Unknown,
}

static FUNCTIONS: phf::Map<&'static str, FunctionCategory> = phf_map! {
    "COUNT" => FunctionCategory::Aggregate,
    "SUM" => FunctionCategory::Aggregate,
    "AVG" => FunctionCategory::Aggregate,
    "MIN" => FunctionCategory::Aggregate,
    "MAX" => FunctionCategory::Aggregate,
    "GROUP_CONCAT" => FunctionCategory::Aggregate,
    "STRING_AGG" => FunctionCategory::Aggregate,
    "STDDEV" => FunctionCategory::Aggregate,
    "VARIANCE" => FunctionCategory::Aggregate,
    "MEDIAN" => FunctionCategory::Aggregate,
    "UPPER" => FunctionCategory::String,
    "LOWER" => FunctionCategory::String,
    "TRIM" => FunctionCategory::String,
    "LTRIM" => FunctionCategory::String,
    "RTRIM" => FunctionCategory::String,
    "SUBSTR" => FunctionCategory::String,
    "SUBSTRING" => FunctionCategory::String,
    "LENGTH" => FunctionCategory::String,
    "LEN" => FunctionCategory::String,
    "CONCAT" => FunctionCategory::String,
    "REPLACE" => FunctionCategory::String,
    "LEFT" => FunctionCategory::String,
    "RIGHT" => FunctionCategory::String,
    "REVERSE" => FunctionCategory::String,
    "CHARINDEX" => FunctionCategory::String,
    "PATINDEX" => FunctionCategory::String,
    "STUFF" => FunctionCategory::String,
    "REPLICATE" => FunctionCategory::String,
    "ROUND" => FunctionCategory::Numeric,
    "FLOOR" => FunctionCategory::Numeric,
    "CEIL" => FunctionCategory::Numeric,
    "ABS" => FunctionCategory::Numeric,
    "SQRT" => FunctionCategory::Numeric,
    "POWER" => FunctionCategory::Numeric,
    "MOD" => FunctionCategory::Numeric,
    "RAND" => FunctionCategory::Numeric,
    "SIN" => FunctionCategory::Numeric,
    "COS" => FunctionCategory::Numeric,
    "TAN" => FunctionCategory::Numeric,
    "LOG" => FunctionCategory::Numeric,
    "LOG10" => FunctionCategory::Numeric,
    "EXP" => FunctionCategory::Numeric,
    "PI" => FunctionCategory::Numeric,
    "SIGN" => FunctionCategory::Numeric,
    "NOW" => FunctionCategory::Date,
    "CURRENT_DATE" => FunctionCategory::Date,
    "CURRENT_TIME" => FunctionCategory::Date,
    "CURRENT_TIMESTAMP" => FunctionCategory::Date,
    "DATEADD" => FunctionCategory::Date,
    "DATEDIFF" => FunctionCategory::Date,
    "EXTRACT" => FunctionCategory::Date,
    "YEAR" => FunctionCategory::Date,
    "MONTH" => FunctionCategory::Date,
    "DAY" => FunctionCategory::Date,
    "HOUR" => FunctionCategory::Date,
    "MINUTE" => FunctionCategory::Date,
    "SECOND" => FunctionCategory::Date,
    "GETDATE" => FunctionCategory::Date,
    "GETUTCDATE" => FunctionCategory::Date,
    "CASE" => FunctionCategory::Conditional,
    "WHEN" => FunctionCategory::Conditional,
    "THEN" => FunctionCategory::Conditional,
    "ELSE" => FunctionCategory::Conditional,
    "END" => FunctionCategory::Conditional,
    "COALESCE" => FunctionCategory::Conditional,
    "NULLIF" => FunctionCategory::Conditional,
    "ISNULL" => FunctionCategory::Conditional,
    "IIF" => FunctionCategory::Conditional,
    "CHOOSE" => FunctionCategory::Conditional,
};

/// Returns the category for a function name, folding to upper-case.
/// Unregistered names map to [`FunctionCategory::Unknown`].
pub fn category_of(name: &str) -> FunctionCategory {
    FUNCTIONS
        .get(name.to_ascii_uppercase().as_str())
        .copied()
        .unwrap_or(FunctionCategory::Unknown)
}

/// Returns true if the name is a registered built-in function.
pub fn is_registered(name: &str) -> bool {
    FUNCTIONS.contains_key(name.to_ascii_uppercase().as_str())
}

/// All registered function names, sorted longest-first (ties broken
/// alphabetically). Extraction scans anchor on names in this order so
/// that e.g. SUBSTRING is matched before SUBSTR.
pub fn all_names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = FUNCTIONS.keys().copied().collect();
    names.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
    names
}

/// A parsed SQL function call, as harvested from a select item or a
/// condition string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionCall {
    name: String,
    args: Vec<String>,
    category: FunctionCategory,
    source_text: String,
}

impl FunctionCall {
    pub fn new(name: &str, args: Vec<String>, source_text: String) -> Self {
        let name = name.to_ascii_uppercase();
        let category = category_of(&name);
        Self {
            name,
            args,
            category,
            source_text,
        }
    }

    /// Canonical upper-case function name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn category(&self) -> FunctionCategory {
        self.category
    }

    /// The exact text this call was extracted from.
    pub fn source_text(&self) -> &str {
        &self.source_text
    }

    pub fn is_aggregate(&self) -> bool {
        self.category == FunctionCategory::Aggregate
    }

    pub fn is_string(&self) -> bool {
        self.category == FunctionCategory::String
    }

    pub fn is_numeric(&self) -> bool {
        self.category == FunctionCategory::Numeric
    }

    /// Reconstructs the call as SQL: `NAME(arg,arg)`.
    pub fn to_sql(&self) -> String {
        format!("{}({})", self.name, self.args.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_fold_case() {
        assert_eq!(category_of("count"), FunctionCategory::Aggregate);
        assert_eq!(category_of("COUNT"), FunctionCategory::Aggregate);
        assert_eq!(category_of("Upper"), FunctionCategory::String);
        assert_eq!(category_of("round"), FunctionCategory::Numeric);
        assert_eq!(category_of("now"), FunctionCategory::Date);
        assert_eq!(category_of("coalesce"), FunctionCategory::Conditional);
        assert_eq!(category_of("bogus"), FunctionCategory::Unknown);
    }

    #[test]
    fn registered_lookup() {
        assert!(is_registered("sum"));
        assert!(is_registered("SUBSTRING"));
        assert!(!is_registered("FOO"));
    }

    #[test]
    fn all_names_longest_first() {
        let names = all_names();
        assert!(!names.is_empty());
        for pair in names.windows(2) {
            assert!(pair[0].len() >= pair[1].len());
        }
        let substring = names.iter().position(|n| *n == "SUBSTRING").unwrap();
        let substr = names.iter().position(|n| *n == "SUBSTR").unwrap();
        assert!(substring < substr);
    }

    #[test]
    fn function_call_canonicalizes_name() {
        let call = FunctionCall::new("count", vec!["*".into()], "count(*)".into());
        assert_eq!(call.name(), "COUNT");
        assert!(call.is_aggregate());
        assert_eq!(call.to_sql(), "COUNT(*)");
    }

    #[test]
    fn function_call_sql_joins_args_without_spaces() {
        let call = FunctionCall::new(
            "SUBSTR",
            vec!["name".into(), "1".into(), "5".into()],
            "SUBSTR(name, 1, 5)".into(),
        );
        assert_eq!(call.to_sql(), "SUBSTR(name,1,5)");
    }
}
