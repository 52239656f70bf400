//! # relq - Relational Query Toolkit
//!
//! relq bundles two independently useful systems:
//!
//! - **SQL front-end**: translate a SQL SELECT statement into a tree of
//!   relational-algebra operators, serialize that plan back to SQL, to an
//!   indented tree form, or to a round-trippable parenthetical form, and
//!   validate any plan against a database schema.
//! - **Vocabulary lookup**: answer "is this word in the vocabulary, and if
//!   not, what are the nearest candidates?" using a trie for exact matches
//!   and a BK-tree over Levenshtein distance for approximate ones.
//!
//! ## Quick Start
//!
//! ```ignore
//! use relq::sql::{parenthetical, parser};
//! use relq::{Schema, Validator};
//!
//! let plan = parser::parse("SELECT name FROM users WHERE age > 25")?;
//! println!("{}", plan.to_tree_string());
//!
//! let round_trip = parenthetical::parse(&plan.to_parenthetical())?;
//! assert_eq!(plan, round_trip);
//!
//! let report = Validator::new(&schema).validate(&plan);
//! for error in report.errors() {
//!     eprintln!("{error}");
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │   SQL text          parenthetical text       │
//! ├────────────────┬─────────────────────────────┤
//! │ sql::tokenizer │    sql::parenthetical       │
//! ├────────────────┴──┬──────────────────────────┤
//! │  sql::parser ─────►  plan tree (sql::plan)   │
//! ├───────────────────┴──────────────────────────┤
//! │ sql::validator │ sql::expr │ sql::functions  │
//! ├──────────────────────────────────────────────┤
//! │            sql::schema (catalog)             │
//! └──────────────────────────────────────────────┘
//!
//! ┌──────────────────────────────────────────────┐
//! │        vocab::Vocabulary (facade)            │
//! ├──────────────────────┬───────────────────────┤
//! │     vocab::trie      │    vocab::bktree      │
//! ├──────────────────────┴───────────────────────┤
//! │    vocab::distance (Levenshtein metric)      │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! ## Module Overview
//!
//! - [`sql`]: tokenizer, function registry, expression trees, plan nodes,
//!   SQL and parenthetical parsers, schema, validator
//! - [`vocab`]: trie, BK-tree, Levenshtein distance, vocabulary facade
//!
//! All parsing and validation is pure: equal inputs produce equal outputs,
//! including the order of reported errors and warnings. The only I/O in the
//! crate is the vocabulary reader consumed during facade construction.

pub mod sql;
pub mod vocab;

pub use sql::plan::PlanNode;
pub use sql::schema::{Column, DataType, Schema, Table};
pub use sql::validator::{ValidationReport, Validator};
pub use vocab::Vocabulary;
