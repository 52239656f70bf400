//! # Expression Trees
//!
//! A recursive-descent parser that turns condition and select-item
//! expressions into typed trees. Trees are transient: they are built,
//! type-checked, and discarded, so nodes live in a `bumpalo` arena and
//! borrow their string slices straight from the input expression.
//!
//! ## Precedence
//!
//! The parser searches left-to-right at parenthesis depth zero for the
//! lowest-precedence binary operator, level by level:
//!
//! | Level (lowest first) | Operators |
//! |----------------------|-----------|
//! | 1 | OR |
//! | 2 | AND |
//! | 3 | `=  !=  <>  <  >  <=  >=  LIKE  NOT LIKE` |
//! | 4 | `+  -` |
//! | 5 | `*  /  %` |
//!
//! At a given position the longest operator of the level wins, so `<=`
//! never splits as `<` followed by `=`. Word operators must be
//! word-bounded; nothing matches inside quotes or parentheses.
//!
//! ## Type Inference
//!
//! Literals carry their obvious types. Column references take their type
//! from the schema when it can be resolved, defaulting to Varchar.
//! Function results follow the registry category; operator results follow
//! the operand types, with `None` marking an inference failure that
//! `validate_types` then reports.

use crate::sql::functions::{self, FunctionCategory};
use crate::sql::scan;
use crate::sql::schema::{DataType, Schema};
use bumpalo::Bump;
use eyre::{bail, Result};

/// A literal value carried by a [`Literal`] node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LiteralValue<'a> {
    Integer(i64),
    Decimal(f64),
    Text(&'a str),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Literal<'a> {
    pub value: LiteralValue<'a>,
    pub source: &'a str,
}

impl<'a> Literal<'a> {
    /// Builds a numeric literal; the presence of a decimal point decides
    /// Integer vs Decimal. Non-numeric text is an argument error.
    pub fn numeric(source: &'a str) -> Result<Self> {
        let value = if source.contains('.') {
            match source.parse::<f64>() {
                Ok(v) => LiteralValue::Decimal(v),
                Err(_) => bail!("invalid numeric literal: {source}"),
            }
        } else {
            match source.parse::<i64>() {
                Ok(v) => LiteralValue::Integer(v),
                Err(_) => bail!("invalid numeric literal: {source}"),
            }
        };
        Ok(Self { value, source })
    }

    /// Builds a string literal, stripping the surrounding quotes from the
    /// value while keeping the source text as written.
    pub fn string(source: &'a str) -> Self {
        let value = if source.len() >= 2
            && ((source.starts_with('\'') && source.ends_with('\''))
                || (source.starts_with('"') && source.ends_with('"')))
        {
            &source[1..source.len() - 1]
        } else {
            source
        };
        Self {
            value: LiteralValue::Text(value),
            source,
        }
    }

    pub fn data_type(&self) -> DataType {
        match self.value {
            LiteralValue::Integer(_) => DataType::Integer,
            LiteralValue::Decimal(_) => DataType::Decimal,
            LiteralValue::Text(_) => DataType::Varchar,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnRef<'a> {
    pub table: Option<&'a str>,
    pub column: &'a str,
    pub data_type: DataType,
    pub source: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OperatorExpr<'a> {
    pub op: &'a str,
    pub operands: &'a [Expr<'a>],
    pub source: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FunctionExpr<'a> {
    pub name: &'a str,
    pub category: FunctionCategory,
    pub args: &'a [Expr<'a>],
    pub source: &'a str,
}

/// An expression tree node. All nodes are allocated in the parse arena.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Expr<'a> {
    Literal(Literal<'a>),
    Column(ColumnRef<'a>),
    Operator(OperatorExpr<'a>),
    Function(FunctionExpr<'a>),
}

const COMPARISON_OPS: &[&str] = &["=", "!=", "<>", "<", ">", "<=", ">="];

impl<'a> Expr<'a> {
    pub fn source(&self) -> &'a str {
        match self {
            Expr::Literal(l) => l.source,
            Expr::Column(c) => c.source,
            Expr::Operator(o) => o.source,
            Expr::Function(f) => f.source,
        }
    }

    pub fn children(&self) -> &'a [Expr<'a>] {
        match self {
            Expr::Literal(_) | Expr::Column(_) => &[],
            Expr::Operator(o) => o.operands,
            Expr::Function(f) => f.args,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children().is_empty()
    }

    /// Infers the result type; `None` means inference failed (for
    /// example, arithmetic over mixed string and numeric operands).
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Expr::Literal(l) => Some(l.data_type()),
            Expr::Column(c) => Some(c.data_type),
            Expr::Function(f) => Some(f.result_type()),
            Expr::Operator(o) => o.result_type(),
        }
    }

    /// Validates type constraints over the whole tree.
    pub fn validate_types(&self) -> bool {
        match self {
            Expr::Literal(_) | Expr::Column(_) => true,
            Expr::Operator(o) => {
                o.operands.iter().all(Expr::validate_types) && o.constraints_hold()
            }
            Expr::Function(f) => {
                f.args.iter().all(Expr::validate_types) && f.constraints_hold()
            }
        }
    }
}

impl<'a> FunctionExpr<'a> {
    /// Result type by registry category.
    pub fn result_type(&self) -> DataType {
        let first_arg = self.args.first().and_then(Expr::data_type);
        match self.category {
            FunctionCategory::Aggregate => {
                if self.name.eq_ignore_ascii_case("COUNT") {
                    DataType::Integer
                } else if matches!(
                    self.name.to_ascii_uppercase().as_str(),
                    "SUM" | "AVG" | "MIN" | "MAX"
                ) {
                    match first_arg {
                        Some(t) if t.is_numeric() => t,
                        _ => DataType::Decimal,
                    }
                } else {
                    DataType::Decimal
                }
            }
            FunctionCategory::String => {
                if self.name.eq_ignore_ascii_case("LENGTH") || self.name.eq_ignore_ascii_case("LEN")
                {
                    DataType::Integer
                } else {
                    DataType::Varchar
                }
            }
            FunctionCategory::Numeric => match first_arg {
                Some(t @ (DataType::Integer | DataType::Decimal)) => t,
                _ => DataType::Decimal,
            },
            FunctionCategory::Date => DataType::Timestamp,
            FunctionCategory::Conditional | FunctionCategory::Unknown => DataType::Varchar,
        }
    }

    fn constraints_hold(&self) -> bool {
        match self.category {
            FunctionCategory::String => self.args.iter().all(|arg| {
                matches!(
                    arg.data_type(),
                    Some(DataType::Varchar | DataType::Text)
                )
            }),
            FunctionCategory::Numeric => self.args.iter().all(|arg| {
                matches!(
                    arg.data_type(),
                    Some(DataType::Integer | DataType::Decimal | DataType::BigInt)
                )
            }),
            // Aggregates and the rest are permissive.
            _ => true,
        }
    }
}

impl<'a> OperatorExpr<'a> {
    pub fn result_type(&self) -> Option<DataType> {
        let op = self.op.to_ascii_uppercase();

        if COMPARISON_OPS.contains(&op.as_str())
            || matches!(op.as_str(), "OR" | "AND" | "LIKE" | "NOT LIKE")
        {
            return Some(DataType::Boolean);
        }

        if op == "+" || op == "||" {
            if self.all_operands(|t| t.is_textual()) {
                return Some(DataType::Varchar);
            }
            return self.numeric_result();
        }

        if matches!(op.as_str(), "-" | "*" | "/" | "%") {
            return self.numeric_result();
        }

        Some(DataType::Varchar)
    }

    fn numeric_result(&self) -> Option<DataType> {
        if !self.all_operands(|t| t.is_numeric()) {
            return None;
        }
        let has_decimal = self.operands.iter().any(|child| {
            matches!(
                child.data_type(),
                Some(DataType::Decimal | DataType::Float | DataType::Double)
            )
        });
        Some(if has_decimal {
            DataType::Decimal
        } else {
            DataType::Integer
        })
    }

    fn all_operands(&self, check: impl Fn(DataType) -> bool) -> bool {
        !self.operands.is_empty()
            && self
                .operands
                .iter()
                .all(|child| child.data_type().is_some_and(&check))
    }

    fn constraints_hold(&self) -> bool {
        if self.operands.is_empty() {
            return false;
        }
        let op = self.op.to_ascii_uppercase();
        match op.as_str() {
            "+" => {
                self.all_operands(|t| t.is_numeric()) || self.all_operands(|t| t.is_textual())
            }
            "-" | "*" | "/" | "%" => self.all_operands(|t| t.is_numeric()),
            "||" | "LIKE" | "NOT LIKE" => self.all_operands(|t| t.is_textual()),
            "OR" | "AND" => self.all_operands(|t| t == DataType::Boolean),
            _ if COMPARISON_OPS.contains(&op.as_str()) => {
                self.all_operands(|t| t.is_numeric())
                    || self.all_operands(|t| t.is_textual())
                    || self.all_operands(|t| t.is_temporal())
                    || self.all_operands(|t| t == DataType::Boolean)
            }
            _ => true,
        }
    }
}

/// Binary operators by precedence level, lowest first. Within a level,
/// longer operators are listed first so they win at a shared position.
const PRECEDENCE_LEVELS: &[&[&str]] = &[
    &["OR"],
    &["AND"],
    &["NOT LIKE", "LIKE", "!=", "<>", "<=", ">=", "=", "<", ">"],
    &["+", "-"],
    &["*", "/", "%"],
];

/// Expression parser. Construct once per arena; `parse` may be called
/// any number of times for expressions that outlive the arena borrow.
pub struct ExprParser<'a> {
    arena: &'a Bump,
    schema: Option<&'a Schema>,
}

impl<'a> ExprParser<'a> {
    pub fn new(arena: &'a Bump) -> Self {
        Self {
            arena,
            schema: None,
        }
    }

    /// Attaches a schema for column-type resolution.
    pub fn with_schema(mut self, schema: &'a Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn parse(&self, expression: &'a str) -> Result<&'a Expr<'a>> {
        let trimmed = expression.trim();
        if trimmed.is_empty() {
            bail!("expression cannot be empty");
        }
        let expr = self.parse_inner(trimmed)?;
        Ok(self.arena.alloc(expr))
    }

    fn parse_inner(&self, expression: &'a str) -> Result<Expr<'a>> {
        let trimmed = expression.trim();
        if trimmed.is_empty() {
            bail!("expression cannot be empty");
        }

        // Strip one pair of enclosing parentheses when they wrap the
        // whole expression.
        if trimmed.starts_with('(') {
            if let Some(close) = scan::matching_paren(trimmed, 0) {
                if close == trimmed.len() - 1 {
                    return self.parse_inner(&trimmed[1..close]);
                }
            }
        }

        if let Some(expr) = self.try_parse_function(trimmed)? {
            return Ok(expr);
        }

        for level in PRECEDENCE_LEVELS {
            if let Some((index, op)) = find_operator(trimmed, level) {
                let left = trimmed[..index].trim();
                let right = trimmed[index + op.len()..].trim();
                if left.is_empty() || right.is_empty() {
                    continue;
                }
                let operands = self.arena.alloc_slice_copy(&[
                    self.parse_inner(left)?,
                    self.parse_inner(right)?,
                ]);
                return Ok(Expr::Operator(OperatorExpr {
                    op: &trimmed[index..index + op.len()],
                    operands,
                    source: trimmed,
                }));
            }
        }

        if is_quoted(trimmed) {
            return Ok(Expr::Literal(Literal::string(trimmed)));
        }

        if looks_numeric(trimmed) {
            return Ok(Expr::Literal(Literal::numeric(trimmed)?));
        }

        Ok(Expr::Column(self.column_ref(trimmed)))
    }

    /// `identifier( ... )` spanning the whole expression parses as a
    /// function call; unregistered names get category Unknown.
    fn try_parse_function(&self, expression: &'a str) -> Result<Option<Expr<'a>>> {
        let Some(open) = expression.find('(') else {
            return Ok(None);
        };
        let name = expression[..open].trim();
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Ok(None);
        }
        if !name.chars().next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_') {
            return Ok(None);
        }
        match scan::matching_paren(expression, open) {
            Some(close) if close == expression.len() - 1 => {
                let inner = &expression[open + 1..close];
                let mut args = Vec::new();
                for arg in scan::split_top_level(inner) {
                    if arg == "*" {
                        args.push(Expr::Column(ColumnRef {
                            table: None,
                            column: arg,
                            data_type: DataType::Varchar,
                            source: arg,
                        }));
                    } else {
                        args.push(self.parse_inner(arg)?);
                    }
                }
                let args = self.arena.alloc_slice_copy(&args);
                Ok(Some(Expr::Function(FunctionExpr {
                    name,
                    category: functions::category_of(name),
                    args,
                    source: expression,
                })))
            }
            _ => Ok(None),
        }
    }

    fn column_ref(&self, text: &'a str) -> ColumnRef<'a> {
        let (table, column) = match text.split_once('.') {
            Some((t, c)) if !t.is_empty() && !c.is_empty() => (Some(t), c),
            _ => (None, text),
        };

        let data_type = self
            .resolve_column_type(table, column)
            .unwrap_or(DataType::Varchar);

        ColumnRef {
            table,
            column,
            data_type,
            source: text,
        }
    }

    fn resolve_column_type(&self, table: Option<&str>, column: &str) -> Option<DataType> {
        let schema = self.schema?;

        if let Some(table_name) = table {
            if let Some(table) = schema.table(table_name) {
                return table.column(column).map(|c| c.data_type());
            }
        }

        // Unqualified (or alias-qualified) reference: first table that
        // has the column wins, in catalog order.
        schema
            .tables()
            .iter()
            .find_map(|t| t.column(column).map(|c| c.data_type()))
    }
}

/// Finds the leftmost top-level occurrence of any operator in `level`.
/// Returns the byte index and the matched operator text.
fn find_operator<'b>(expression: &str, level: &[&'b str]) -> Option<(usize, &'b str)> {
    let bytes = expression.as_bytes();
    let mut depth = 0i32;
    let mut in_quotes = false;
    let mut i = 0;

    while i < bytes.len() {
        let ch = bytes[i];
        match ch {
            b'\'' | b'"' => in_quotes = !in_quotes,
            b'(' if !in_quotes => depth += 1,
            b')' if !in_quotes => depth -= 1,
            _ => {}
        }

        if !in_quotes && depth == 0 && i > 0 {
            for &op in level {
                if matches_operator_at(expression, i, op) {
                    return Some((i, op));
                }
            }
        }
        i += 1;
    }
    None
}

fn matches_operator_at(expression: &str, index: usize, op: &str) -> bool {
    let bytes = expression.as_bytes();
    if index + op.len() > bytes.len() {
        return false;
    }
    if !expression[index..index + op.len()].eq_ignore_ascii_case(op) {
        return false;
    }

    let is_word = op.chars().next().is_some_and(|c| c.is_ascii_alphabetic());
    if is_word {
        let before_ok = !bytes[index - 1].is_ascii_alphanumeric() && bytes[index - 1] != b'_';
        let after = index + op.len();
        let after_ok =
            after >= bytes.len() || (!bytes[after].is_ascii_alphanumeric() && bytes[after] != b'_');
        return before_ok && after_ok;
    }

    // Symbol operator: reject matches that are the tail of a longer
    // operator (`=` inside `<=`, `>` inside `<>`).
    let prev = bytes[index - 1];
    if matches!(prev, b'<' | b'>' | b'!' | b'=') {
        return false;
    }
    // And matches that are the head of a longer one (`<` before `=`).
    let after = index + op.len();
    if op.len() == 1
        && matches!(bytes[index], b'<' | b'>' | b'!' | b'=')
        && after < bytes.len()
        && matches!(bytes[after], b'=' | b'>')
    {
        return false;
    }
    true
}

fn is_quoted(text: &str) -> bool {
    text.len() >= 2
        && ((text.starts_with('\'') && text.ends_with('\''))
            || (text.starts_with('"') && text.ends_with('"')))
}

fn looks_numeric(text: &str) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text);
    !digits.is_empty() && digits.chars().next().is_some_and(|c| c.is_ascii_digit())
}
