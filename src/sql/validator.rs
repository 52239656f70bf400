//! # Schema Validator
//!
//! Walks a plan tree in post-order under a [`Schema`], threading upward
//! the set of columns available at each point, and collects human-readable
//! errors and warnings. Semantic problems never abort the walk: the caller
//! gets every finding at once, in deterministic encounter order.
//!
//! ## Context Propagation
//!
//! Each operator receives the contexts produced by its children and emits
//! its own:
//!
//! - **TableScan** introduces every schema column, qualified by the alias
//!   (or table name) and unqualified.
//! - **Projection** narrows the context to the projected items.
//! - **Selection** and **Sort** pass their child context through.
//! - **Join** merges both sides, warning on unqualified names present in
//!   both.
//! - **Aggregation** reduces the context to the GROUP BY columns plus the
//!   aggregate expressions; HAVING is checked against that reduced
//!   context, which is what catches `SELECT name ... GROUP BY dept`
//!   referencing the non-grouped `name`.
//! - **Subquery** validates its inner plan independently and re-exports
//!   the inner output columns under the subquery alias.
//!
//! Column lookups accept `column` and `table.column` forms and fold case.

use crate::sql::functions::FunctionCall;
use crate::sql::plan::PlanNode;
use crate::sql::scan;
use crate::sql::schema::{DataType, Schema};
use hashbrown::HashSet;
use phf::phf_set;

/// Keywords skipped when scanning conditions for column references.
static CONDITION_KEYWORDS: phf::Set<&'static str> = phf_set! {
    "SELECT", "FROM", "WHERE", "JOIN", "INNER", "LEFT", "RIGHT", "FULL",
    "CROSS", "GROUP", "BY", "HAVING", "ORDER", "DISTINCT", "ON", "AS",
    "AND", "OR", "NOT", "IN", "EXISTS", "BETWEEN", "LIKE", "IS", "NULL",
    "TRUE", "FALSE", "ASC", "DESC", "WHEN", "THEN", "ELSE", "CASE", "END",
    "UNION", "ALL", "INTERSECT", "EXCEPT",
};

/// Result of validating a plan: errors make the plan invalid, warnings
/// do not.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

#[derive(Debug, Clone)]
struct ColumnEntry {
    table: Option<String>,
    column: String,
    data_type: DataType,
}

/// Columns visible at one point of the tree walk.
#[derive(Debug, Clone, Default)]
struct ColumnContext {
    entries: Vec<ColumnEntry>,
}

impl ColumnContext {
    fn add(&mut self, table: Option<&str>, column: &str, data_type: DataType) {
        self.entries.push(ColumnEntry {
            table: table.map(str::to_string),
            column: column.to_string(),
            data_type,
        });
    }

    fn merge(&mut self, other: ColumnContext) {
        self.entries.extend(other.entries);
    }

    fn resolves(&self, reference: &str) -> bool {
        self.find(reference).is_some()
    }

    /// Finds the first entry matching a `column` or `table.column`
    /// reference, case-insensitively.
    fn find(&self, reference: &str) -> Option<&ColumnEntry> {
        match reference.split_once('.') {
            Some((table, column)) => self.entries.iter().find(|entry| {
                entry
                    .table
                    .as_deref()
                    .is_some_and(|t| t.eq_ignore_ascii_case(table))
                    && entry.column.eq_ignore_ascii_case(column)
            }),
            None => self
                .entries
                .iter()
                .find(|entry| entry.column.eq_ignore_ascii_case(reference)),
        }
    }

    /// Unqualified column names present in this context, lower-cased.
    fn unqualified_names(&self) -> HashSet<String> {
        self.entries
            .iter()
            .filter(|entry| entry.table.is_none())
            .map(|entry| entry.column.to_lowercase())
            .collect()
    }
}

/// Validates plan trees against a schema.
pub struct Validator<'s> {
    schema: &'s Schema,
}

struct Walk {
    errors: Vec<String>,
    warnings: Vec<String>,
    subquery_seq: usize,
}

impl<'s> Validator<'s> {
    pub fn new(schema: &'s Schema) -> Self {
        Self { schema }
    }

    pub fn validate(&self, plan: &PlanNode) -> ValidationReport {
        let mut walk = Walk {
            errors: Vec::new(),
            warnings: Vec::new(),
            subquery_seq: 0,
        };
        self.visit(plan, &mut walk);
        ValidationReport {
            errors: walk.errors,
            warnings: walk.warnings,
        }
    }

    fn visit(&self, node: &PlanNode, walk: &mut Walk) -> ColumnContext {
        match node {
            PlanNode::TableScan(scan) => self.visit_table_scan(scan, walk),
            PlanNode::Projection(proj) => self.visit_projection(proj, walk),
            PlanNode::Selection(sel) => self.visit_selection(sel, walk),
            PlanNode::Join(join) => self.visit_join(join, walk),
            PlanNode::Aggregation(agg) => self.visit_aggregation(agg, walk),
            PlanNode::Sort(sort) => self.visit_sort(sort, walk),
            PlanNode::Subquery(sub) => self.visit_subquery(sub, walk),
        }
    }

    fn visit_children(&self, children: &[PlanNode], walk: &mut Walk) -> ColumnContext {
        let mut context = ColumnContext::default();
        for child in children {
            let child_context = self.visit(child, walk);
            context.merge(child_context);
        }
        context
    }

    fn visit_table_scan(
        &self,
        scan: &crate::sql::plan::TableScan,
        walk: &mut Walk,
    ) -> ColumnContext {
        let Some(table) = self.schema.table(&scan.table) else {
            walk.errors
                .push(format!("Table '{}' does not exist in schema", scan.table));
            return ColumnContext::default();
        };

        let qualifier = scan.alias.as_deref().unwrap_or(&scan.table);
        let mut context = ColumnContext::default();
        for column in table.columns() {
            context.add(Some(qualifier), column.name(), column.data_type());
            context.add(None, column.name(), column.data_type());
        }
        context
    }

    fn visit_projection(
        &self,
        proj: &crate::sql::plan::Projection,
        walk: &mut Walk,
    ) -> ColumnContext {
        let child_context = self.visit_children(&proj.children, walk);
        let mut output = ColumnContext::default();

        for item in &proj.items {
            let expression = item.expression.as_str();

            if expression == "*" {
                output.merge(child_context.clone());
                continue;
            }

            if !item.functions.is_empty() || (expression.contains('(') && expression.contains(')'))
            {
                let calls = if item.functions.is_empty() {
                    scan::extract_function_calls(expression)
                } else {
                    item.functions.clone()
                };
                for call in &calls {
                    self.check_function_args(call, &child_context, walk);
                }
                output.add(None, item.effective_name(), DataType::Varchar);
                continue;
            }

            match child_context.find(expression) {
                Some(entry) => match &item.alias {
                    Some(alias) => output.add(None, alias, entry.data_type),
                    None => {
                        let entry = entry.clone();
                        output.add(entry.table.as_deref(), &entry.column, entry.data_type);
                    }
                },
                None => {
                    walk.errors.push(format!(
                        "Column '{expression}' is not available in projection"
                    ));
                }
            }
        }

        output
    }

    fn visit_selection(
        &self,
        sel: &crate::sql::plan::Selection,
        walk: &mut Walk,
    ) -> ColumnContext {
        let context = self.visit_children(&sel.children, walk);
        self.check_condition(&sel.condition, &context, walk);
        context
    }

    fn visit_join(&self, join: &crate::sql::plan::Join, walk: &mut Walk) -> ColumnContext {
        if join.children.len() != 2 {
            walk.errors
                .push("Join operator must have exactly 2 children".to_string());
            return self.visit_children(&join.children, walk);
        }

        let left = self.visit(&join.children[0], walk);
        let right = self.visit(&join.children[1], walk);

        // Same unqualified name on both sides makes bare references
        // ambiguous.
        let left_names = left.unqualified_names();
        let right_names = right.unqualified_names();
        let mut ambiguous: Vec<&String> = left_names.intersection(&right_names).collect();
        ambiguous.sort();
        for name in ambiguous {
            walk.warnings.push(format!(
                "Ambiguous column name '{name}' exists in both sides of join"
            ));
        }

        let mut combined = left;
        combined.merge(right);

        if let Some(condition) = &join.condition {
            if !condition.is_empty() {
                self.check_condition(condition, &combined, walk);
            }
        }

        combined
    }

    fn visit_aggregation(
        &self,
        agg: &crate::sql::plan::Aggregation,
        walk: &mut Walk,
    ) -> ColumnContext {
        let child_context = self.visit_children(&agg.children, walk);

        for group_column in &agg.group_by {
            if !child_context.resolves(group_column) {
                walk.errors.push(format!(
                    "GROUP BY column '{group_column}' is not available"
                ));
            }
        }

        for aggregate in &agg.aggregates {
            for call in scan::extract_function_calls(aggregate) {
                self.check_function_args(&call, &child_context, walk);
            }
        }

        // After aggregation only the grouping columns and the aggregate
        // expressions remain visible.
        let mut reduced = ColumnContext::default();
        for group_column in &agg.group_by {
            if let Some(entry) = child_context.find(group_column) {
                let entry = entry.clone();
                reduced.add(entry.table.as_deref(), &entry.column, entry.data_type);
            }
        }
        for aggregate in &agg.aggregates {
            reduced.add(None, aggregate, DataType::Decimal);
        }

        if let Some(having) = &agg.having {
            self.check_having(having, &reduced, walk);
        }

        reduced
    }

    fn visit_sort(&self, sort: &crate::sql::plan::Sort, walk: &mut Walk) -> ColumnContext {
        let context = self.visit_children(&sort.children, walk);
        for item in &sort.items {
            if !context.resolves(&item.column) {
                walk.errors.push(format!(
                    "ORDER BY column '{}' is not available",
                    item.column
                ));
            }
        }
        context
    }

    fn visit_subquery(
        &self,
        sub: &crate::sql::plan::Subquery,
        walk: &mut Walk,
    ) -> ColumnContext {
        let inner = self.visit_children(&sub.children, walk);

        walk.subquery_seq += 1;
        let qualifier = match &sub.alias {
            Some(alias) => alias.clone(),
            None => format!("subquery_{}", walk.subquery_seq),
        };

        let mut context = ColumnContext::default();
        for entry in &inner.entries {
            context.add(Some(&qualifier), &entry.column, entry.data_type);
            context.add(None, &entry.column, entry.data_type);
        }
        context
    }

    /// Validates a Selection or Join condition: function arguments first,
    /// then every remaining identifier.
    fn check_condition(&self, condition: &str, context: &ColumnContext, walk: &mut Walk) {
        let calls = scan::extract_function_calls(condition);
        for call in &calls {
            self.check_function_args(call, context, walk);
        }

        let masked = scan::mask_function_calls(condition, &calls);
        let cleaned = scan::strip_string_literals(&masked);

        for reference in scan::identifiers(&cleaned) {
            if is_keyword_or_literal(reference) {
                continue;
            }
            if !context.resolves(reference) {
                walk.errors.push(format!(
                    "Column '{reference}' in condition '{condition}' is not available"
                ));
            }
        }
    }

    /// Validates a HAVING condition against the post-aggregation context.
    /// Aggregate calls are allowed as-is; anything else must resolve.
    fn check_having(&self, condition: &str, context: &ColumnContext, walk: &mut Walk) {
        let calls = scan::extract_function_calls(condition);
        for call in &calls {
            if !call.is_aggregate() {
                self.check_function_args(call, context, walk);
            }
        }

        let masked = scan::mask_function_calls(condition, &calls);
        let cleaned = scan::strip_string_literals(&masked);

        for reference in scan::identifiers(&cleaned) {
            if is_keyword_or_literal(reference) {
                continue;
            }
            if !context.resolves(reference) {
                walk.errors.push(format!(
                    "Column '{reference}' in HAVING condition is not available. \
                     Only GROUP BY columns and aggregate functions are allowed in HAVING."
                ));
            }
        }
    }

    /// Validates the arguments of one function call: wildcards and
    /// literals pass, column references must resolve, and nested calls
    /// recurse.
    fn check_function_args(
        &self,
        call: &FunctionCall,
        context: &ColumnContext,
        walk: &mut Walk,
    ) {
        for arg in call.args() {
            if arg == "*" || is_keyword_or_literal(arg) {
                continue;
            }

            if scan::is_column_ref(arg) {
                if !context.resolves(arg) {
                    walk.errors.push(format!(
                        "Function argument '{arg}' in function '{}' is not available",
                        call.name()
                    ));
                }
                continue;
            }

            // Expression argument: check nested calls, then any leftover
            // identifiers.
            let nested = scan::extract_function_calls(arg);
            for inner in &nested {
                self.check_function_args(inner, context, walk);
            }
            let masked = scan::mask_function_calls(arg, &nested);
            let cleaned = scan::strip_string_literals(&masked);
            for reference in scan::identifiers(&cleaned) {
                if is_keyword_or_literal(reference) {
                    continue;
                }
                if !context.resolves(reference) {
                    walk.errors.push(format!(
                        "Function argument '{reference}' in function '{}' is not available",
                        call.name()
                    ));
                }
            }
        }
    }
}

fn is_keyword_or_literal(token: &str) -> bool {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return true;
    }
    if trimmed.starts_with('\'') && trimmed.ends_with('\'') {
        return true;
    }
    if trimmed.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        return true;
    }
    CONDITION_KEYWORDS.contains(trimmed.to_ascii_uppercase().as_str())
}
