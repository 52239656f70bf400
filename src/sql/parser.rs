//! # SQL Parser
//!
//! Translates a SQL SELECT statement into a relational-algebra plan tree.
//! The parser works over the word-level token list from
//! [`crate::sql::tokenizer`], locating top-level clause keywords first and
//! then building the tree bottom-up:
//!
//! ```text
//! FROM (tables, joins, subqueries)
//!   └─ WHERE      → Selection
//!       └─ GROUP BY [HAVING] → Aggregation
//!           └─ ORDER BY      → Sort
//!               └─ SELECT    → Projection (root)
//! ```
//!
//! "Top-level" means at parenthesis depth zero: a WHERE inside a
//! parenthesized subquery belongs to that subquery, not to the outer
//! statement.
//!
//! Condition and item strings are reassembled from tokens with canonical
//! spacing (no space after `(`, before `)` or `,`, around `.`; no space
//! between a function name and its `(`), so a reconstructed condition
//! reads `UPPER(name) > 5`, never `UPPER ( name )>5`.

use crate::sql::plan::{JoinKind, OrderItem, PlanNode, SelectItem, SubqueryKind};
use crate::sql::tokenizer::{self, Tokenizer};
use eyre::{bail, ensure, Result};
use smallvec::SmallVec;


/// Parses a SQL SELECT statement into a plan tree.
pub fn parse(sql: &str) -> Result<PlanNode> {
    let trimmed = sql.trim();
    if trimmed.is_empty() {
        bail!("SQL input is null or empty");
    }
    let tokens = Tokenizer::new(trimmed).tokenize();
    parse_query(&tokens)
}

fn parse_query(tokens: &[&str]) -> Result<PlanNode> {
    check_balanced_parens(tokens)?;

    let select_idx = top_level_keyword(tokens, "SELECT")
        .ok_or_else(|| eyre::eyre!("no SELECT clause found"))?;
    let from_idx = top_level_keyword(tokens, "FROM")
        .ok_or_else(|| eyre::eyre!("missing FROM clause"))?;
    ensure!(
        select_idx < from_idx,
        "malformed query: FROM appears before SELECT"
    );

    let where_idx = top_level_keyword(tokens, "WHERE");
    let group_idx = top_level_keyword_pair(tokens, "GROUP", "BY");
    let having_idx = top_level_keyword(tokens, "HAVING");
    let order_idx = top_level_keyword_pair(tokens, "ORDER", "BY");

    check_clause_order(from_idx, where_idx, group_idx, having_idx, order_idx)?;

    // SELECT list
    let mut items_start = select_idx + 1;
    let mut distinct = false;
    if tokens
        .get(items_start)
        .is_some_and(|t| t.eq_ignore_ascii_case("DISTINCT"))
    {
        distinct = true;
        items_start += 1;
    }
    let items = parse_select_items(&tokens[items_start..from_idx])?;

    // FROM range ends at the first top-level clause keyword after it.
    let clause_starts: SmallVec<[usize; 3]> = [where_idx, group_idx, order_idx]
        .into_iter()
        .flatten()
        .filter(|&i| i > from_idx)
        .collect();
    let from_end = clause_starts.iter().copied().min().unwrap_or(tokens.len());
    let mut node = parse_from_clause(&tokens[from_idx + 1..from_end])?;

    if let Some(where_pos) = where_idx {
        let end = [group_idx, order_idx]
            .into_iter()
            .flatten()
            .filter(|&i| i > where_pos)
            .min()
            .unwrap_or(tokens.len());
        ensure!(end > where_pos + 1, "WHERE clause is empty");
        let condition = reconstruct(&tokens[where_pos + 1..end]);
        node = PlanNode::selection(condition, node);
    }

    if let Some(group_pos) = group_idx {
        let group_end = having_idx.or(order_idx).unwrap_or(tokens.len());
        let group_by: Vec<String> = split_on_commas(&tokens[group_pos + 2..group_end])
            .into_iter()
            .map(|group| reconstruct(&group))
            .collect();
        ensure!(!group_by.is_empty(), "GROUP BY clause is empty");

        let having = match having_idx {
            Some(having_pos) => {
                let end = order_idx.unwrap_or(tokens.len());
                ensure!(end > having_pos + 1, "HAVING clause is empty");
                Some(reconstruct(&tokens[having_pos + 1..end]))
            }
            None => None,
        };

        let aggregates: Vec<String> = items
            .iter()
            .flat_map(|item| item.functions.iter())
            .filter(|call| call.is_aggregate())
            .map(|call| call.to_sql())
            .collect();

        node = PlanNode::aggregation(group_by, aggregates, having, node);
    }

    if let Some(order_pos) = order_idx {
        let order_items: Vec<OrderItem> = split_on_commas(&tokens[order_pos + 2..])
            .into_iter()
            .map(|group| order_item_from_tokens(&group))
            .collect();
        ensure!(!order_items.is_empty(), "ORDER BY clause is empty");
        node = PlanNode::sort(order_items, node);
    }

    Ok(PlanNode::projection(items, distinct, node))
}

fn parse_select_items(tokens: &[&str]) -> Result<Vec<SelectItem>> {
    let groups = split_on_commas(tokens);
    let mut items = Vec::with_capacity(groups.len());
    for group in groups {
        let text = reconstruct(&group);
        items.push(SelectItem::parse(&text));
    }
    ensure!(!items.is_empty(), "SELECT list is empty");
    if items.len() > 1 && items.iter().any(|item| item.expression == "*") {
        bail!("'*' may only appear as the sole select item");
    }
    Ok(items)
}

fn parse_from_clause(tokens: &[&str]) -> Result<PlanNode> {
    ensure!(!tokens.is_empty(), "FROM clause is empty");

    let mut pos = 0;
    let mut node = parse_table_ref(tokens, &mut pos)?;

    while let Some((kind, after_join)) = peek_join(tokens, pos) {
        pos = after_join;
        let right = parse_table_ref(tokens, &mut pos)?;

        let mut condition = None;
        if tokens.get(pos).is_some_and(|t| t.eq_ignore_ascii_case("ON")) {
            ensure!(
                kind != JoinKind::Cross,
                "CROSS JOIN does not take an ON condition"
            );
            pos += 1;
            let end = join_condition_end(tokens, pos);
            ensure!(end > pos, "ON condition is empty");
            condition = Some(reconstruct(&tokens[pos..end]));
            pos = end;
        }

        node = PlanNode::join(kind, condition, node, right);
    }

    ensure!(
        pos == tokens.len(),
        "unexpected token '{}' in FROM clause",
        tokens[pos]
    );
    Ok(node)
}

/// Parses `table [AS] alias?` or `( SELECT ... ) [AS] alias?`, advancing
/// the cursor past everything consumed.
fn parse_table_ref(tokens: &[&str], pos: &mut usize) -> Result<PlanNode> {
    let Some(&first) = tokens.get(*pos) else {
        bail!("expected a table reference in FROM clause");
    };

    if first == "(" {
        let window_end = (*pos + 5).min(tokens.len());
        let has_select = tokens[*pos + 1..window_end]
            .iter()
            .any(|t| t.eq_ignore_ascii_case("SELECT"));
        if !has_select {
            bail!(
                "invalid subquery in FROM clause: no SELECT found after opening parenthesis"
            );
        }
        let close = matching_paren_token(tokens, *pos).ok_or_else(|| {
            eyre::eyre!("invalid subquery in FROM clause: missing closing parenthesis")
        })?;

        let inner_sql = tokens[*pos + 1..close].join(" ");
        let inner = parse(&inner_sql)?;
        *pos = close + 1;
        let alias = consume_alias(tokens, pos)?;
        return Ok(PlanNode::subquery(SubqueryKind::From, alias, inner));
    }

    ensure!(
        tokenizer::is_identifier(first),
        "expected table name in FROM clause, found '{first}'"
    );
    *pos += 1;
    let alias = consume_alias(tokens, pos)?;
    Ok(PlanNode::table_scan(first, alias))
}

/// Consumes `AS alias` or a bare alias identifier, if present.
fn consume_alias(tokens: &[&str], pos: &mut usize) -> Result<Option<String>> {
    match tokens.get(*pos) {
        Some(t) if t.eq_ignore_ascii_case("AS") => {
            let alias = tokens
                .get(*pos + 1)
                .ok_or_else(|| eyre::eyre!("expected alias after AS"))?;
            *pos += 2;
            Ok(Some(unquote_alias(alias)))
        }
        Some(t) if tokenizer::is_identifier(t) => {
            *pos += 1;
            Ok(Some((*t).to_string()))
        }
        Some(t) if tokenizer::is_string_literal(t) && t.starts_with('"') => {
            *pos += 1;
            Ok(Some(unquote_alias(t)))
        }
        _ => Ok(None),
    }
}

fn unquote_alias(alias: &str) -> String {
    let trimmed = alias.trim();
    if trimmed.len() >= 2
        && ((trimmed.starts_with('"') && trimmed.ends_with('"'))
            || (trimmed.starts_with('`') && trimmed.ends_with('`')))
    {
        trimmed[1..trimmed.len() - 1].to_string()
    } else {
        trimmed.to_string()
    }
}

/// Detects `[prefix] JOIN` at the cursor. Returns the join kind and the
/// position just past the JOIN keyword.
fn peek_join(tokens: &[&str], pos: usize) -> Option<(JoinKind, usize)> {
    let first = tokens.get(pos)?;
    if first.eq_ignore_ascii_case("JOIN") {
        return Some((JoinKind::Inner, pos + 1));
    }
    let kind = JoinKind::from_keyword(first)?;
    if tokens.get(pos + 1)?.eq_ignore_ascii_case("JOIN") {
        return Some((kind, pos + 2));
    }
    None
}

fn is_join_prefix(token: &str) -> bool {
    JoinKind::from_keyword(token).is_some()
}

/// Finds where an ON condition ends: at the start of the next top-level
/// join clause, or at the end of the tokens.
fn join_condition_end(tokens: &[&str], start: usize) -> usize {
    let mut depth = 0i32;
    for (i, token) in tokens.iter().enumerate().skip(start) {
        match *token {
            "(" => depth += 1,
            ")" => depth -= 1,
            _ if depth == 0 => {
                if token.eq_ignore_ascii_case("JOIN") {
                    if i > start && is_join_prefix(tokens[i - 1]) {
                        return i - 1;
                    }
                    return i;
                }
                if is_join_prefix(token)
                    && tokens.get(i + 1).is_some_and(|t| t.eq_ignore_ascii_case("JOIN"))
                {
                    return i;
                }
            }
            _ => {}
        }
    }
    tokens.len()
}

fn check_balanced_parens(tokens: &[&str]) -> Result<()> {
    let mut depth = 0i32;
    for &token in tokens {
        match token {
            "(" => depth += 1,
            ")" => depth -= 1,
            _ => {}
        }
        ensure!(depth >= 0, "unbalanced parentheses: unmatched ')'");
    }
    ensure!(
        depth == 0,
        "unbalanced parentheses: missing closing parenthesis"
    );
    Ok(())
}

/// Clauses must appear in the standard order:
/// FROM < WHERE < GROUP BY < HAVING < ORDER BY.
fn check_clause_order(
    from: usize,
    where_idx: Option<usize>,
    group: Option<usize>,
    having: Option<usize>,
    order: Option<usize>,
) -> Result<()> {
    let sequence = [Some(from), where_idx, group, having, order];
    let mut last = 0;
    for position in sequence.into_iter().flatten() {
        ensure!(position >= last, "clauses appear in an unsupported order");
        last = position;
    }
    ensure!(
        having.is_none() || group.is_some(),
        "HAVING requires a GROUP BY clause"
    );
    Ok(())
}

/// Returns the index of the token matching the opening parenthesis at
/// `open`.
fn matching_paren_token(tokens: &[&str], open: usize) -> Option<usize> {
    let mut depth = 0i32;
    for (i, token) in tokens.iter().enumerate().skip(open) {
        match *token {
            "(" => depth += 1,
            ")" => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Finds a keyword at parenthesis depth zero.
fn top_level_keyword(tokens: &[&str], keyword: &str) -> Option<usize> {
    let mut depth = 0i32;
    for (i, token) in tokens.iter().enumerate() {
        match *token {
            "(" => depth += 1,
            ")" => depth -= 1,
            _ if depth == 0 && token.eq_ignore_ascii_case(keyword) => return Some(i),
            _ => {}
        }
    }
    None
}

/// Finds a two-keyword sequence (GROUP BY, ORDER BY) at depth zero.
fn top_level_keyword_pair(tokens: &[&str], first: &str, second: &str) -> Option<usize> {
    let mut depth = 0i32;
    for (i, token) in tokens.iter().enumerate() {
        match *token {
            "(" => depth += 1,
            ")" => depth -= 1,
            _ if depth == 0
                && token.eq_ignore_ascii_case(first)
                && tokens.get(i + 1).is_some_and(|t| t.eq_ignore_ascii_case(second)) =>
            {
                return Some(i)
            }
            _ => {}
        }
    }
    None
}

/// Splits a token range into groups separated by top-level commas.
fn split_on_commas<'t>(tokens: &[&'t str]) -> Vec<Vec<&'t str>> {
    let mut groups = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut depth = 0i32;

    for &token in tokens {
        match token {
            "(" => {
                depth += 1;
                current.push(token);
            }
            ")" => {
                depth -= 1;
                current.push(token);
            }
            "," if depth == 0 => {
                if !current.is_empty() {
                    groups.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(token),
        }
    }
    if !current.is_empty() {
        groups.push(current);
    }
    groups
}

fn order_item_from_tokens(tokens: &[&str]) -> OrderItem {
    use crate::sql::plan::OrderDirection;

    if let Some((&last, rest)) = tokens.split_last() {
        let direction = match last.to_ascii_uppercase().as_str() {
            "ASC" => Some(OrderDirection::Asc),
            "DESC" => Some(OrderDirection::Desc),
            _ => None,
        };
        if direction.is_some() && !rest.is_empty() {
            return OrderItem::new(reconstruct(rest), direction);
        }
    }
    OrderItem::new(reconstruct(tokens), None)
}

/// Reassembles tokens into canonical expression text.
pub(crate) fn reconstruct(tokens: &[&str]) -> String {
    let mut out = String::new();
    for (i, &token) in tokens.iter().enumerate() {
        if i > 0 {
            let prev = tokens[i - 1];
            let tight = prev == "("
                || prev == "."
                || token == ")"
                || token == ","
                || token == "."
                || (token == "(" && starts_like_identifier(prev));
            if !tight {
                out.push(' ');
            }
        }
        out.push_str(token);
    }
    out
}

fn starts_like_identifier(token: &str) -> bool {
    token
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
}
