//! # Relational-Algebra Plan Nodes
//!
//! The plan tree produced by the SQL parser and consumed by the validator
//! and the serializers. The operator set is closed, so the tree is a
//! tagged sum rather than an open trait hierarchy: dispatch is a `match`
//! on the variant.
//!
//! Every node renders itself three ways:
//!
//! - `to_sql()`: reconstructed SQL for the subtree. FROM-clause emission
//!   is delegated down the single-child spine so that `SELECT ... FROM`
//!   lands immediately before the table reference.
//! - `to_tree_string()`: human-readable form, children indented two
//!   spaces per level.
//! - `to_parenthetical()`: the round-trippable `OPNAME(param, ..., child,
//!   ...)` form understood by [`crate::sql::parenthetical`].
//!
//! Nodes own their children (`Vec<PlanNode>`); there are no cross-subtree
//! references.

use crate::sql::functions::FunctionCall;
use crate::sql::scan;

/// Join flavor. The condition is required for every kind except Cross.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
    Cross,
}

impl JoinKind {
    pub fn as_str(self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER",
            JoinKind::Left => "LEFT",
            JoinKind::Right => "RIGHT",
            JoinKind::Full => "FULL",
            JoinKind::Cross => "CROSS",
        }
    }

    pub fn from_keyword(word: &str) -> Option<Self> {
        match word.to_ascii_uppercase().as_str() {
            "INNER" => Some(JoinKind::Inner),
            "LEFT" => Some(JoinKind::Left),
            "RIGHT" => Some(JoinKind::Right),
            "FULL" => Some(JoinKind::Full),
            "CROSS" => Some(JoinKind::Cross),
            _ => None,
        }
    }
}

/// Where a subquery appears. The SQL parser only emits `From`; the other
/// kinds round-trip through the parenthetical form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubqueryKind {
    From,
    Exists,
    In,
    NotIn,
    Scalar,
    SelectScalar,
}

impl SubqueryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SubqueryKind::From => "FROM",
            SubqueryKind::Exists => "EXISTS",
            SubqueryKind::In => "IN",
            SubqueryKind::NotIn => "NOT_IN",
            SubqueryKind::Scalar => "SCALAR",
            SubqueryKind::SelectScalar => "SELECT_SCALAR",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "FROM" => Some(SubqueryKind::From),
            "EXISTS" => Some(SubqueryKind::Exists),
            "IN" => Some(SubqueryKind::In),
            "NOT_IN" => Some(SubqueryKind::NotIn),
            "SCALAR" => Some(SubqueryKind::Scalar),
            "SELECT_SCALAR" => Some(SubqueryKind::SelectScalar),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    Asc,
    Desc,
}

impl OrderDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderDirection::Asc => "ASC",
            OrderDirection::Desc => "DESC",
        }
    }
}

/// One ORDER BY entry: a column and an optional explicit direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItem {
    pub column: String,
    pub direction: Option<OrderDirection>,
}

impl OrderItem {
    pub fn new(column: impl Into<String>, direction: Option<OrderDirection>) -> Self {
        Self {
            column: column.into(),
            direction,
        }
    }

    /// Parses `col`, `col ASC`, or `col DESC`.
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        if let Some((column, last)) = text.rsplit_once(char::is_whitespace) {
            match last.to_ascii_uppercase().as_str() {
                "ASC" => return Self::new(column.trim_end(), Some(OrderDirection::Asc)),
                "DESC" => return Self::new(column.trim_end(), Some(OrderDirection::Desc)),
                _ => {}
            }
        }
        Self::new(text, None)
    }

    pub fn to_sql(&self) -> String {
        match self.direction {
            Some(dir) => format!("{} {}", self.column, dir.as_str()),
            None => self.column.clone(),
        }
    }
}

/// One SELECT-list entry: the expression text, an optional alias, and the
/// function calls found inside the expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectItem {
    pub expression: String,
    pub alias: Option<String>,
    pub functions: Vec<FunctionCall>,
}

impl SelectItem {
    pub fn new(expression: impl Into<String>, alias: Option<String>) -> Self {
        let expression = expression.into();
        let functions = scan::extract_function_calls(&expression);
        Self {
            expression,
            alias,
            functions,
        }
    }

    /// Splits `expr [AS] alias` and extracts function calls.
    pub fn parse(item: &str) -> Self {
        let (expression, alias) = scan::split_alias(item);
        Self::new(expression, alias)
    }

    /// The name this item contributes to the output: the alias when
    /// present, otherwise the expression itself.
    pub fn effective_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.expression)
    }

    pub fn has_alias(&self) -> bool {
        self.alias.is_some()
    }

    pub fn to_sql(&self) -> String {
        match &self.alias {
            Some(alias) => format!("{} AS {}", self.expression, alias),
            None => self.expression.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableScan {
    pub table: String,
    pub alias: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub items: Vec<SelectItem>,
    pub distinct: bool,
    pub children: Vec<PlanNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub condition: String,
    pub children: Vec<PlanNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub kind: JoinKind,
    pub condition: Option<String>,
    pub children: Vec<PlanNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    pub group_by: Vec<String>,
    pub aggregates: Vec<String>,
    pub having: Option<String>,
    pub children: Vec<PlanNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sort {
    pub items: Vec<OrderItem>,
    pub children: Vec<PlanNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Subquery {
    pub kind: SubqueryKind,
    pub alias: Option<String>,
    pub children: Vec<PlanNode>,
}

/// A relational-algebra operator tree.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanNode {
    TableScan(TableScan),
    Projection(Projection),
    Selection(Selection),
    Join(Join),
    Aggregation(Aggregation),
    Sort(Sort),
    Subquery(Subquery),
}

impl PlanNode {
    pub fn table_scan(table: impl Into<String>, alias: Option<String>) -> Self {
        PlanNode::TableScan(TableScan {
            table: table.into(),
            alias,
        })
    }

    pub fn projection(items: Vec<SelectItem>, distinct: bool, child: PlanNode) -> Self {
        PlanNode::Projection(Projection {
            items,
            distinct,
            children: vec![child],
        })
    }

    pub fn selection(condition: impl Into<String>, child: PlanNode) -> Self {
        PlanNode::Selection(Selection {
            condition: condition.into(),
            children: vec![child],
        })
    }

    pub fn join(kind: JoinKind, condition: Option<String>, left: PlanNode, right: PlanNode) -> Self {
        PlanNode::Join(Join {
            kind,
            condition,
            children: vec![left, right],
        })
    }

    pub fn aggregation(
        group_by: Vec<String>,
        aggregates: Vec<String>,
        having: Option<String>,
        child: PlanNode,
    ) -> Self {
        PlanNode::Aggregation(Aggregation {
            group_by,
            aggregates,
            having,
            children: vec![child],
        })
    }

    pub fn sort(items: Vec<OrderItem>, child: PlanNode) -> Self {
        PlanNode::Sort(Sort {
            items,
            children: vec![child],
        })
    }

    pub fn subquery(kind: SubqueryKind, alias: Option<String>, child: PlanNode) -> Self {
        PlanNode::Subquery(Subquery {
            kind,
            alias,
            children: vec![child],
        })
    }

    /// The operator name used in parenthetical and tree-string output.
    pub fn name(&self) -> String {
        match self {
            PlanNode::TableScan(_) => "TABLE_SCAN".to_string(),
            PlanNode::Projection(_) => "PROJECTION".to_string(),
            PlanNode::Selection(_) => "SELECTION".to_string(),
            PlanNode::Join(join) => format!("{}_JOIN", join.kind.as_str()),
            PlanNode::Aggregation(_) => "AGGREGATION".to_string(),
            PlanNode::Sort(_) => "SORT".to_string(),
            PlanNode::Subquery(_) => "SUBQUERY".to_string(),
        }
    }

    pub fn children(&self) -> &[PlanNode] {
        match self {
            PlanNode::TableScan(_) => &[],
            PlanNode::Projection(n) => &n.children,
            PlanNode::Selection(n) => &n.children,
            PlanNode::Join(n) => &n.children,
            PlanNode::Aggregation(n) => &n.children,
            PlanNode::Sort(n) => &n.children,
            PlanNode::Subquery(n) => &n.children,
        }
    }

    pub fn first_child(&self) -> Option<&PlanNode> {
        self.children().first()
    }

    /// Operator-specific parameters, comma-joined, exactly as they appear
    /// between the parentheses of the parenthetical form.
    fn params(&self) -> String {
        match self {
            PlanNode::TableScan(scan) => match &scan.alias {
                Some(alias) => format!("{} AS {}", scan.table, alias),
                None => scan.table.clone(),
            },
            PlanNode::Projection(proj) => {
                let mut parts = Vec::new();
                if proj.distinct {
                    parts.push("DISTINCT".to_string());
                }
                parts.extend(proj.items.iter().map(SelectItem::to_sql));
                parts.join(", ")
            }
            PlanNode::Selection(sel) => sel.condition.clone(),
            PlanNode::Join(join) => join.condition.clone().unwrap_or_default(),
            PlanNode::Aggregation(agg) => {
                let mut parts = Vec::new();
                if !agg.group_by.is_empty() {
                    parts.push(format!("GROUP_BY:{}", agg.group_by.join(",")));
                }
                if !agg.aggregates.is_empty() {
                    parts.push(format!("AGG:{}", agg.aggregates.join(",")));
                }
                if let Some(having) = &agg.having {
                    parts.push(format!("HAVING:{having}"));
                }
                parts.join(", ")
            }
            PlanNode::Sort(sort) => sort
                .items
                .iter()
                .map(OrderItem::to_sql)
                .collect::<Vec<_>>()
                .join(", "),
            PlanNode::Subquery(sub) => {
                let mut parts = vec![format!("TYPE:{}", sub.kind.as_str())];
                if let Some(alias) = &sub.alias {
                    parts.push(format!("ALIAS:{alias}"));
                }
                parts.join(", ")
            }
        }
    }

    /// Renders the subtree as `OPNAME(param, ..., child, ...)`.
    pub fn to_parenthetical(&self) -> String {
        let mut out = String::new();
        out.push_str(&self.name());
        out.push('(');

        let params = self.params();
        out.push_str(&params);

        for child in self.children() {
            if out.ends_with('(') {
                out.push_str(&child.to_parenthetical());
            } else {
                out.push_str(", ");
                out.push_str(&child.to_parenthetical());
            }
        }

        out.push(')');
        out
    }

    /// Renders the subtree as an indented tree, two spaces per level.
    pub fn to_tree_string(&self) -> String {
        let mut out = String::new();
        self.write_tree(&mut out, 0);
        out
    }

    fn write_tree(&self, out: &mut String, level: usize) {
        if level > 0 {
            out.push('\n');
        }
        for _ in 0..level {
            out.push_str("  ");
        }
        out.push_str(&self.name());
        out.push('(');
        out.push_str(&self.params());
        out.push(')');
        for child in self.children() {
            child.write_tree(out, level + 1);
        }
    }

    /// Reconstructs SQL for the subtree.
    pub fn to_sql(&self) -> String {
        match self {
            PlanNode::TableScan(scan) => match &scan.alias {
                Some(alias) => format!("{} AS {}", scan.table, alias),
                None => scan.table.clone(),
            },
            PlanNode::Subquery(sub) => {
                let inner = sub.children.first().map(PlanNode::to_sql).unwrap_or_default();
                match &sub.alias {
                    Some(alias) => format!("({inner}) AS {alias}"),
                    None => format!("({inner})"),
                }
            }
            PlanNode::Join(join) => {
                let left = join.children.first().map(PlanNode::to_sql).unwrap_or_default();
                let right = join.children.get(1).map(PlanNode::to_sql).unwrap_or_default();
                let mut sql = format!("{left} {} JOIN {right}", join.kind.as_str());
                if let Some(condition) = &join.condition {
                    sql.push_str(" ON ");
                    sql.push_str(condition);
                }
                sql
            }
            PlanNode::Selection(sel) => {
                let child = sel.children.first().map(PlanNode::to_sql).unwrap_or_default();
                format!("{child} WHERE {}", sel.condition)
            }
            PlanNode::Aggregation(agg) => {
                let mut sql = agg.children.first().map(PlanNode::to_sql).unwrap_or_default();
                if !agg.group_by.is_empty() {
                    sql.push_str(" GROUP BY ");
                    sql.push_str(&agg.group_by.join(", "));
                }
                if let Some(having) = &agg.having {
                    sql.push_str(" HAVING ");
                    sql.push_str(having);
                }
                sql
            }
            PlanNode::Sort(sort) => {
                let child = sort.children.first().map(PlanNode::to_sql).unwrap_or_default();
                let items = sort
                    .items
                    .iter()
                    .map(OrderItem::to_sql)
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{child} ORDER BY {items}")
            }
            PlanNode::Projection(proj) => {
                let mut sql = String::from("SELECT ");
                if proj.distinct {
                    sql.push_str("DISTINCT ");
                }
                sql.push_str(
                    &proj
                        .items
                        .iter()
                        .map(SelectItem::to_sql)
                        .collect::<Vec<_>>()
                        .join(", "),
                );
                if let Some(child) = proj.children.first() {
                    sql.push_str(" FROM ");
                    sql.push_str(&child.to_sql());
                }
                sql
            }
        }
    }
}
