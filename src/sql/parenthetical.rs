//! # Parenthetical Plan Form
//!
//! Parses the textual plan serialization produced by
//! [`PlanNode::to_parenthetical`]:
//!
//! ```text
//! PROJECTION(name, age, SELECTION(age > 18, TABLE_SCAN(users)))
//! ```
//!
//! The grammar is `OPNAME '(' param (',' param)* ')'`. Parameters are
//! split on top-level commas only (commas inside nested parentheses or
//! quotes do not split) and captured as verbatim trimmed slices, so
//! conditions like `COUNT(*) > 5` survive the round trip byte for byte.
//! A parameter is itself a child operator iff it has the shape
//! `KNOWN_OPNAME(...)`; anything else is operator-specific data.
//!
//! Newlines are insignificant; leading and trailing whitespace is
//! trimmed. For every plan `P` built by the SQL parser,
//! `parse(P.to_parenthetical())` reproduces `P` structurally.

use crate::sql::plan::{
    Aggregation, Join, JoinKind, OrderItem, PlanNode, Projection, SelectItem, Selection, Sort,
    Subquery, SubqueryKind,
};
use crate::sql::scan;
use eyre::{bail, Result};

const OPERATOR_NAMES: &[&str] = &[
    "TABLE_SCAN",
    "PROJECTION",
    "SELECTION",
    "INNER_JOIN",
    "LEFT_JOIN",
    "RIGHT_JOIN",
    "FULL_JOIN",
    "CROSS_JOIN",
    "AGGREGATION",
    "SORT",
    "SUBQUERY",
];

/// Parses a parenthetical expression into a plan tree.
pub fn parse(expression: &str) -> Result<PlanNode> {
    let trimmed = expression.trim();
    if trimmed.is_empty() {
        bail!("parenthetical expression is null or empty");
    }

    let (node, consumed) = parse_operator(trimmed)?;
    let rest = trimmed[consumed..].trim();
    if !rest.is_empty() {
        bail!("unexpected trailing text after operator: '{rest}'");
    }
    Ok(node)
}

fn parse_operator(text: &str) -> Result<(PlanNode, usize)> {
    let name_len = text
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(text.len());
    let name = &text[..name_len];
    if name.is_empty() {
        bail!("expected an operator name, found '{text}'");
    }

    let after_name = text[name_len..].trim_start();
    if !after_name.starts_with('(') {
        bail!("expected '(' after operator name: {name}");
    }
    let open = text.len() - after_name.len();

    let Some(close) = scan::matching_paren(text, open) else {
        bail!("expected ')' to close operator: {name}");
    };

    let params = scan::split_top_level(&text[open + 1..close]);
    let node = build_operator(name, &params)?;
    Ok((node, close + 1))
}

/// A parameter is a child operator iff everything before its first `(` is
/// a known operator name.
fn is_operator_expression(param: &str) -> bool {
    let trimmed = param.trim();
    let Some(open) = trimmed.find('(') else {
        return false;
    };
    let name = trimmed[..open].trim().to_ascii_uppercase();
    OPERATOR_NAMES.contains(&name.as_str())
}

fn build_operator(name: &str, params: &[&str]) -> Result<PlanNode> {
    match name.to_ascii_uppercase().as_str() {
        "TABLE_SCAN" => build_table_scan(params),
        "PROJECTION" => build_projection(params),
        "SELECTION" => build_selection(params),
        "INNER_JOIN" => build_join(JoinKind::Inner, params),
        "LEFT_JOIN" => build_join(JoinKind::Left, params),
        "RIGHT_JOIN" => build_join(JoinKind::Right, params),
        "FULL_JOIN" => build_join(JoinKind::Full, params),
        "CROSS_JOIN" => build_join(JoinKind::Cross, params),
        "AGGREGATION" => build_aggregation(params),
        "SORT" => build_sort(params),
        "SUBQUERY" => build_subquery(params),
        other => bail!("unknown operator: {other}"),
    }
}

fn parse_children(params: &[&str]) -> Result<Vec<PlanNode>> {
    params
        .iter()
        .filter(|p| is_operator_expression(p))
        .map(|p| parse(p))
        .collect()
}

fn build_table_scan(params: &[&str]) -> Result<PlanNode> {
    let Some(spec) = params.first() else {
        bail!("TABLE_SCAN requires a table name parameter");
    };
    let (table, alias) = scan::split_alias(spec);
    if table.is_empty() || table.chars().any(char::is_whitespace) {
        bail!("invalid table specification: '{spec}'");
    }
    Ok(PlanNode::table_scan(table, alias))
}

fn build_projection(params: &[&str]) -> Result<PlanNode> {
    if params.is_empty() {
        bail!("PROJECTION requires at least one parameter");
    }

    let mut distinct = false;
    let mut start = 0;
    if params[0].eq_ignore_ascii_case("DISTINCT") {
        distinct = true;
        start = 1;
    }

    let mut items = Vec::new();
    let mut children = Vec::new();
    for param in &params[start..] {
        if is_operator_expression(param) {
            children.push(parse(param)?);
        } else {
            items.push(SelectItem::parse(param));
        }
    }

    if items.is_empty() {
        bail!("PROJECTION requires at least one column");
    }
    if items.len() > 1 && items.iter().any(|item| item.expression == "*") {
        bail!("'*' may only appear as the sole projection column");
    }

    Ok(PlanNode::Projection(Projection {
        items,
        distinct,
        children,
    }))
}

fn build_selection(params: &[&str]) -> Result<PlanNode> {
    let condition = params
        .iter()
        .find(|p| !is_operator_expression(p))
        .map(|p| p.to_string());
    let Some(condition) = condition else {
        bail!("SELECTION requires a condition parameter");
    };
    Ok(PlanNode::Selection(Selection {
        condition,
        children: parse_children(params)?,
    }))
}

fn build_join(kind: JoinKind, params: &[&str]) -> Result<PlanNode> {
    let condition = params
        .iter()
        .find(|p| !is_operator_expression(p))
        .map(|p| p.to_string());
    Ok(PlanNode::Join(Join {
        kind,
        condition,
        children: parse_children(params)?,
    }))
}

fn build_aggregation(params: &[&str]) -> Result<PlanNode> {
    enum ActiveList {
        None,
        GroupBy,
        Aggregates,
    }

    let mut group_by = Vec::new();
    let mut aggregates = Vec::new();
    let mut having = None;
    let mut children = Vec::new();
    // The GROUP_BY and AGG lists are comma-joined by the printer, so their
    // entries after the first arrive as bare parameters; attach them to
    // whichever list was opened last.
    let mut active = ActiveList::None;

    for param in params {
        if is_operator_expression(param) {
            children.push(parse(param)?);
            active = ActiveList::None;
        } else if let Some(list) = param.strip_prefix("GROUP_BY:") {
            group_by = scan::split_arguments(list.trim());
            active = ActiveList::GroupBy;
        } else if let Some(list) = param.strip_prefix("AGG:") {
            aggregates = scan::split_arguments(list.trim());
            active = ActiveList::Aggregates;
        } else if let Some(cond) = param.strip_prefix("HAVING:") {
            having = Some(cond.trim().to_string());
            active = ActiveList::None;
        } else {
            match active {
                ActiveList::GroupBy => group_by.push(param.to_string()),
                ActiveList::Aggregates => aggregates.push(param.to_string()),
                ActiveList::None => {
                    bail!("unrecognized AGGREGATION parameter: '{param}'")
                }
            }
        }
    }

    if group_by.is_empty() && aggregates.is_empty() {
        bail!("AGGREGATION requires a GROUP_BY or AGG parameter");
    }

    Ok(PlanNode::Aggregation(Aggregation {
        group_by,
        aggregates,
        having,
        children,
    }))
}

fn build_sort(params: &[&str]) -> Result<PlanNode> {
    let mut items = Vec::new();
    let mut children = Vec::new();

    for param in params {
        if is_operator_expression(param) {
            children.push(parse(param)?);
        } else {
            items.push(OrderItem::parse(param));
        }
    }

    if items.is_empty() {
        bail!("SORT requires at least one order item");
    }

    Ok(PlanNode::Sort(Sort { items, children }))
}

fn build_subquery(params: &[&str]) -> Result<PlanNode> {
    let mut kind = SubqueryKind::From;
    let mut alias = None;
    let mut children = Vec::new();

    for param in params {
        if is_operator_expression(param) {
            children.push(parse(param)?);
        } else if let Some(type_name) = param.strip_prefix("TYPE:") {
            kind = SubqueryKind::from_name(type_name.trim())
                .ok_or_else(|| eyre::eyre!("unknown subquery type: {}", type_name.trim()))?;
        } else if let Some(name) = param.strip_prefix("ALIAS:") {
            alias = Some(name.trim().to_string());
        } else {
            bail!("unrecognized SUBQUERY parameter: '{param}'");
        }
    }

    if children.is_empty() {
        bail!("SUBQUERY requires a child operator");
    }

    Ok(PlanNode::Subquery(Subquery {
        kind,
        alias,
        children,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::plan::OrderDirection;

    #[test]
    fn parses_table_scan() {
        let plan = parse("TABLE_SCAN(users)").unwrap();
        assert_eq!(plan, PlanNode::table_scan("users", None));

        let plan = parse("TABLE_SCAN(users AS u)").unwrap();
        assert_eq!(plan, PlanNode::table_scan("users", Some("u".to_string())));
    }

    #[test]
    fn parses_projection_with_columns_and_child() {
        let plan = parse("PROJECTION(name, age, TABLE_SCAN(users))").unwrap();
        let PlanNode::Projection(proj) = &plan else {
            panic!("expected projection");
        };
        let exprs: Vec<_> = proj.items.iter().map(|i| i.expression.as_str()).collect();
        assert_eq!(exprs, ["name", "age"]);
        assert!(!proj.distinct);
        assert_eq!(proj.children.len(), 1);
    }

    #[test]
    fn parses_distinct_projection() {
        let plan = parse("PROJECTION(DISTINCT, department, TABLE_SCAN(employees))").unwrap();
        let PlanNode::Projection(proj) = &plan else {
            panic!("expected projection");
        };
        assert!(proj.distinct);
        assert_eq!(proj.items[0].expression, "department");
    }

    #[test]
    fn parses_selection_condition() {
        let plan = parse("SELECTION(age > 18, TABLE_SCAN(users))").unwrap();
        let PlanNode::Selection(sel) = &plan else {
            panic!("expected selection");
        };
        assert_eq!(sel.condition, "age > 18");
        assert_eq!(sel.children.len(), 1);
    }

    #[test]
    fn parses_join_with_condition() {
        let plan = parse(
            "INNER_JOIN(users.id = posts.user_id, TABLE_SCAN(users), TABLE_SCAN(posts))",
        )
        .unwrap();
        let PlanNode::Join(join) = &plan else {
            panic!("expected join");
        };
        assert_eq!(join.kind, JoinKind::Inner);
        assert_eq!(join.condition.as_deref(), Some("users.id = posts.user_id"));
        assert_eq!(join.children.len(), 2);
    }

    #[test]
    fn parses_cross_join_without_condition() {
        let plan = parse("CROSS_JOIN(TABLE_SCAN(a), TABLE_SCAN(b))").unwrap();
        let PlanNode::Join(join) = &plan else {
            panic!("expected join");
        };
        assert_eq!(join.kind, JoinKind::Cross);
        assert_eq!(join.condition, None);
    }

    #[test]
    fn join_condition_with_and_round_trips() {
        let text =
            "INNER_JOIN(users.id = posts.user_id AND users.status = 'active', TABLE_SCAN(users AS u), TABLE_SCAN(posts AS p))";
        let plan = parse(text).unwrap();
        let PlanNode::Join(join) = &plan else {
            panic!("expected join");
        };
        assert_eq!(
            join.condition.as_deref(),
            Some("users.id = posts.user_id AND users.status = 'active'")
        );
        assert_eq!(plan.to_parenthetical(), text);
    }

    #[test]
    fn parses_aggregation_parameters() {
        let plan = parse(
            "AGGREGATION(GROUP_BY:department, AGG:COUNT(*),AVG(salary), HAVING:COUNT(*) > 5, TABLE_SCAN(employees))",
        )
        .unwrap();
        let PlanNode::Aggregation(agg) = &plan else {
            panic!("expected aggregation");
        };
        assert_eq!(agg.group_by, ["department"]);
        assert_eq!(agg.aggregates, ["COUNT(*)", "AVG(salary)"]);
        assert_eq!(agg.having.as_deref(), Some("COUNT(*) > 5"));
    }

    #[test]
    fn aggregate_list_commas_inside_parens_do_not_split() {
        let plan =
            parse("AGGREGATION(AGG:SUBSTR(name, 1, 3),COUNT(*), TABLE_SCAN(t))").unwrap();
        let PlanNode::Aggregation(agg) = &plan else {
            panic!("expected aggregation");
        };
        assert_eq!(agg.aggregates, ["SUBSTR(name, 1, 3)", "COUNT(*)"]);
    }

    #[test]
    fn parses_sort_items_with_directions() {
        let plan = parse("SORT(name ASC, age DESC, TABLE_SCAN(users))").unwrap();
        let PlanNode::Sort(sort) = &plan else {
            panic!("expected sort");
        };
        assert_eq!(
            sort.items,
            vec![
                OrderItem::new("name", Some(OrderDirection::Asc)),
                OrderItem::new("age", Some(OrderDirection::Desc)),
            ]
        );
    }

    #[test]
    fn parses_subquery_with_type_and_alias() {
        let plan = parse(
            "SUBQUERY(TYPE:FROM, ALIAS:u, PROJECTION(name, TABLE_SCAN(users)))",
        )
        .unwrap();
        let PlanNode::Subquery(sub) = &plan else {
            panic!("expected subquery");
        };
        assert_eq!(sub.kind, SubqueryKind::From);
        assert_eq!(sub.alias.as_deref(), Some("u"));
        assert_eq!(sub.children.len(), 1);
    }

    #[test]
    fn nested_tree_parses_depth_first() {
        let plan = parse(
            "PROJECTION(name, SELECTION(age > 18, TABLE_SCAN(users)))",
        )
        .unwrap();
        let PlanNode::Projection(proj) = &plan else {
            panic!("expected projection");
        };
        let PlanNode::Selection(sel) = &proj.children[0] else {
            panic!("expected selection child");
        };
        assert_eq!(sel.condition, "age > 18");
        assert!(matches!(sel.children[0], PlanNode::TableScan(_)));
    }

    #[test]
    fn newlines_are_insignificant() {
        let plan = parse(
            "PROJECTION(name,\n  SELECTION(age > 18,\n    TABLE_SCAN(users)))",
        )
        .unwrap();
        assert_eq!(
            plan.to_parenthetical(),
            "PROJECTION(name, SELECTION(age > 18, TABLE_SCAN(users)))"
        );
    }

    #[test]
    fn empty_expression_is_rejected() {
        assert!(parse("").is_err());
        assert!(parse("   \n ").is_err());
    }

    #[test]
    fn unknown_operator_is_rejected() {
        let err = parse("MYSTERY(users)").unwrap_err();
        assert!(err.to_string().contains("unknown operator"));
    }

    #[test]
    fn missing_open_paren_is_rejected() {
        let err = parse("TABLE_SCAN users").unwrap_err();
        assert!(err.to_string().contains("expected '('"));
    }

    #[test]
    fn missing_close_paren_is_rejected() {
        let err = parse("PROJECTION(name, TABLE_SCAN(users)").unwrap_err();
        assert!(err.to_string().contains("expected ')'"));
    }

    #[test]
    fn missing_required_parameter_is_rejected() {
        assert!(parse("PROJECTION()").is_err());
        assert!(parse("SELECTION(TABLE_SCAN(users))").is_err());
        assert!(parse("SUBQUERY(TYPE:FROM)").is_err());
    }

    #[test]
    fn quoted_commas_do_not_split_parameters() {
        let plan = parse("SELECTION(status = 'a, b', TABLE_SCAN(t))").unwrap();
        let PlanNode::Selection(sel) = &plan else {
            panic!("expected selection");
        };
        assert_eq!(sel.condition, "status = 'a, b'");
    }
}
