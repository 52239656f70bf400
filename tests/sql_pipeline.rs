//! # Integration Tests for the SQL Front-End
//!
//! End-to-end tests over the public API: SQL text in, plan trees out,
//! round trips through the parenthetical form, and validation against a
//! schema. Tests are organized by feature area and verify observable
//! behavior, with expected values written out by hand rather than
//! derived from running the code.
//!
//! ## Test Categories
//!
//! 1. **Translation**: SELECT statements produce the documented operator
//!    trees
//! 2. **Round trips**: plan → parenthetical → plan and plan → SQL → plan
//! 3. **Validation**: schema errors and warnings with their exact
//!    message fragments
//!
//! ## Running Tests
//!
//! ```sh
//! cargo test --test sql_pipeline
//! ```

use relq::sql::{parenthetical, parser};
use relq::{Column, DataType, Schema, Table, Validator};

fn company_schema() -> Schema {
    let mut schema = Schema::new();
    schema.add_table(Table::with_columns(
        "users",
        vec![
            Column::new("id", DataType::Integer).primary_key(),
            Column::new("name", DataType::Varchar),
            Column::new("age", DataType::Integer),
            Column::new("department_id", DataType::Integer),
        ],
    ));
    schema.add_table(Table::with_columns(
        "employees",
        vec![
            Column::new("id", DataType::Integer).primary_key(),
            Column::new("department", DataType::Varchar),
            Column::new("age", DataType::Integer),
            Column::new("salary", DataType::Decimal),
        ],
    ));
    schema.add_table(Table::with_columns(
        "posts",
        vec![
            Column::new("id", DataType::Integer).primary_key(),
            Column::new("user_id", DataType::Integer),
            Column::new("title", DataType::Varchar),
        ],
    ));
    schema
}

mod translation {
    use super::*;

    #[test]
    fn simple_projection_prints_expected_parenthetical() {
        let plan = parser::parse("SELECT name FROM users").unwrap();
        assert_eq!(
            plan.to_parenthetical(),
            "PROJECTION(name, TABLE_SCAN(users))"
        );
    }

    #[test]
    fn full_query_builds_the_documented_tree() {
        let plan = parser::parse(
            "SELECT department, COUNT(*) FROM employees WHERE age > 25 \
             GROUP BY department HAVING COUNT(*) > 5 ORDER BY department ASC",
        )
        .unwrap();
        assert_eq!(
            plan.to_parenthetical(),
            "PROJECTION(department, COUNT(*), \
             SORT(department ASC, \
             AGGREGATION(GROUP_BY:department, AGG:COUNT(*), HAVING:COUNT(*) > 5, \
             SELECTION(age > 25, TABLE_SCAN(employees)))))"
        );
    }

    #[test]
    fn subquery_in_from_nests_a_plan() {
        let plan = parser::parse("SELECT name FROM (SELECT name, age FROM users) AS u").unwrap();
        assert_eq!(
            plan.to_parenthetical(),
            "PROJECTION(name, SUBQUERY(TYPE:FROM, ALIAS:u, \
             PROJECTION(name, age, TABLE_SCAN(users))))"
        );
    }

    #[test]
    fn tree_string_matches_documented_layout() {
        let plan = parser::parse("SELECT name FROM users WHERE age > 25").unwrap();
        assert_eq!(
            plan.to_tree_string(),
            "PROJECTION(name)\n  SELECTION(age > 25)\n    TABLE_SCAN(users)"
        );
    }

    #[test]
    fn to_sql_reconstructs_the_full_statement() {
        let plan = parser::parse(
            "SELECT department, COUNT(*) FROM employees WHERE age > 25 \
             GROUP BY department HAVING COUNT(*) > 5 ORDER BY department ASC",
        )
        .unwrap();
        assert_eq!(
            plan.to_sql(),
            "SELECT department, COUNT(*) FROM employees WHERE age > 25 \
             GROUP BY department HAVING COUNT(*) > 5 ORDER BY department ASC"
        );
    }
}

mod round_trips {
    use super::*;

    const QUERIES: &[&str] = &[
        "SELECT name FROM users",
        "SELECT DISTINCT department FROM employees",
        "SELECT name, age FROM users WHERE age > 18",
        "SELECT u.name, p.title FROM users u JOIN posts p ON u.id = p.user_id",
        "SELECT a FROM t1 LEFT JOIN t2 ON t1.id = t2.id",
        "SELECT a FROM t1 CROSS JOIN t2",
        "SELECT department, COUNT(*) FROM employees GROUP BY department",
        "SELECT department, COUNT(*), AVG(salary) FROM employees \
         GROUP BY department HAVING COUNT(*) > 5",
        "SELECT name FROM users ORDER BY name ASC, age DESC",
        "SELECT name FROM (SELECT name, age FROM users) AS u",
        "SELECT name AS full_name, COUNT(*) AS total FROM users GROUP BY name",
        "SELECT department, COUNT(*) FROM employees WHERE age > 25 \
         GROUP BY department HAVING COUNT(*) > 5 ORDER BY department ASC",
    ];

    #[test]
    fn parenthetical_round_trip_preserves_structure() {
        for sql in QUERIES {
            let plan = parser::parse(sql).unwrap();
            let printed = plan.to_parenthetical();
            let reparsed = parenthetical::parse(&printed)
                .unwrap_or_else(|e| panic!("reparse of {printed:?} failed: {e}"));
            assert_eq!(reparsed, plan, "round trip changed the plan for {sql:?}");
        }
    }

    #[test]
    fn sql_round_trip_preserves_canonical_form() {
        for sql in QUERIES {
            let plan = parser::parse(sql).unwrap();
            let reconstructed = plan.to_sql();
            let reparsed = parser::parse(&reconstructed)
                .unwrap_or_else(|e| panic!("reparse of {reconstructed:?} failed: {e}"));
            assert_eq!(
                reparsed.to_parenthetical(),
                plan.to_parenthetical(),
                "SQL round trip changed the canonical form for {sql:?}"
            );
        }
    }

    #[test]
    fn tree_string_is_deterministic() {
        let plan = parser::parse("SELECT name FROM users WHERE age > 25").unwrap();
        assert_eq!(plan.to_tree_string(), plan.to_tree_string());
        let again = parser::parse("SELECT name FROM users WHERE age > 25").unwrap();
        assert_eq!(plan.to_tree_string(), again.to_tree_string());
    }
}

mod validation {
    use super::*;

    #[test]
    fn fully_resolvable_query_is_valid() {
        let schema = company_schema();
        let plan = parser::parse(
            "SELECT u.name, p.title FROM users u JOIN posts p ON u.id = p.user_id \
             WHERE u.age > 21 ORDER BY u.name ASC",
        )
        .unwrap();
        let report = Validator::new(&schema).validate(&plan);
        assert!(report.is_valid(), "unexpected errors: {:?}", report.errors());
    }

    #[test]
    fn unknown_projection_column_reports_one_error() {
        let schema = company_schema();
        let plan = parser::parse("SELECT nonexistent FROM users").unwrap();
        let report = Validator::new(&schema).validate(&plan);
        assert_eq!(report.errors().len(), 1);
        assert!(report.errors()[0].contains("is not available in projection"));
    }

    #[test]
    fn unknown_table_reports_schema_error() {
        let schema = company_schema();
        let plan = parser::parse("SELECT name FROM missing").unwrap();
        let report = Validator::new(&schema).validate(&plan);
        assert!(report
            .errors()
            .iter()
            .any(|e| e.contains("does not exist in schema")));
    }

    #[test]
    fn having_with_non_grouped_column_is_an_error() {
        // SELECT name, COUNT(*) ... GROUP BY department_id: HAVING may
        // only see department_id and COUNT(*), so `name` must fail.
        let schema = company_schema();
        let plan = relq::PlanNode::projection(
            vec![
                relq::sql::SelectItem::parse("name"),
                relq::sql::SelectItem::parse("COUNT(*)"),
            ],
            false,
            relq::PlanNode::aggregation(
                vec!["department_id".to_string()],
                vec!["COUNT(*)".to_string()],
                Some("name > 5".to_string()),
                relq::PlanNode::table_scan("users", None),
            ),
        );
        let report = Validator::new(&schema).validate(&plan);
        assert!(report
            .errors()
            .iter()
            .any(|e| e.contains("name") && e.contains("is not available")));
    }

    #[test]
    fn ambiguous_join_columns_warn_but_stay_valid() {
        let schema = company_schema();
        let plan = parser::parse(
            "SELECT u.name FROM users u JOIN posts p ON u.id = p.user_id",
        )
        .unwrap();
        let report = Validator::new(&schema).validate(&plan);
        assert!(report.is_valid(), "unexpected errors: {:?}", report.errors());
        assert!(report.has_warnings());
        assert!(report
            .warnings()
            .iter()
            .any(|w| w.contains("Ambiguous column name")));
    }

    #[test]
    fn validating_a_reparsed_plan_gives_identical_results() {
        let schema = company_schema();
        let sql = "SELECT department, COUNT(*) FROM employees \
                   GROUP BY department HAVING COUNT(*) > 5";
        let plan = parser::parse(sql).unwrap();
        let reparsed = parenthetical::parse(&plan.to_parenthetical()).unwrap();

        let validator = Validator::new(&schema);
        assert_eq!(validator.validate(&plan), validator.validate(&reparsed));
    }

    #[test]
    fn subquery_validation_respects_projection_narrowing() {
        let schema = company_schema();

        let plan = parser::parse("SELECT name FROM (SELECT name, age FROM users) AS u").unwrap();
        let report = Validator::new(&schema).validate(&plan);
        assert!(report.is_valid(), "unexpected errors: {:?}", report.errors());

        let plan = parser::parse("SELECT id FROM (SELECT name FROM users) AS u").unwrap();
        let report = Validator::new(&schema).validate(&plan);
        assert!(!report.is_valid());
    }
}
