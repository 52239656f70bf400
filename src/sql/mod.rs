//! # SQL Processing Module
//!
//! This module provides the SQL front-end: tokenization, parsing into
//! relational-algebra plans, plan serialization, and schema validation.
//!
//! ## Module Structure
//!
//! - `tokenizer`: word-level SQL tokenizer with classification predicates
//! - `functions`: static registry of built-in SQL functions by category
//! - `scan`: textual expression scanning (function calls, aliases, literals)
//! - `expr`: arena-allocated expression trees with type inference
//! - `plan`: relational-algebra operator tree and its serializers
//! - `parser`: SELECT statement → plan tree
//! - `parenthetical`: round-trippable `OP(param, ..., child, ...)` form
//! - `schema`: case-insensitive table/column catalog
//! - `validator`: post-order plan validation against a schema
//!
//! ## Data Flow
//!
//! ```text
//! SQL text ──► tokenizer ──► parser ──► PlanNode tree
//!                                          │
//! parenthetical text ◄──► parenthetical ◄──┤
//!                                          ▼
//!                            validator (+ schema) ──► errors/warnings
//! ```
//!
//! Plan nodes store condition and item expressions as strings; the
//! validator and the expression parser re-parse them on demand. This keeps
//! the plan tree cheap to build and print while still supporting full
//! column resolution and type checking.

pub mod expr;
pub mod functions;
pub mod parenthetical;
pub mod parser;
pub mod plan;
pub mod scan;
pub mod schema;
pub mod tokenizer;
pub mod validator;

pub use functions::{FunctionCall, FunctionCategory};
pub use plan::{JoinKind, OrderDirection, OrderItem, PlanNode, SelectItem, SubqueryKind};
pub use schema::{Column, DataType, Schema, Table};
pub use tokenizer::Tokenizer;
pub use validator::{ValidationReport, Validator};
