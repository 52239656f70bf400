//! # SQL Tokenizer
//!
//! This module turns SQL text into a flat list of word-level tokens. Tokens
//! are borrowed slices of the input string; the tokenizer never allocates
//! per token.
//!
//! ## Token Categories
//!
//! - **Identifiers and keywords**: `[A-Za-z_][A-Za-z0-9_]*`, case preserved
//! - **String literals**: single- or double-quoted, delimiters included in
//!   the token, doubled quotes act as escapes
//! - **Numeric literals**: `digits (. digits)?`
//! - **Operators**: `= != <> < > <= >= + - * / % || && ! ^ & | << >> ~`,
//!   two-character forms preferred
//! - **Delimiters**: `( ) , ; . [ ] { }`, always their own token
//!
//! Whitespace separates tokens and is dropped. `-- ...` line comments and
//! `/* ... */` block comments are elided. An unterminated string literal
//! absorbs the rest of the input into a single token; misuse is reported
//! later by the parser, not here.
//!
//! ## Keyword Lookup
//!
//! Keywords are matched case-insensitively through a compile-time perfect
//! hash set (phf crate), so `is_keyword` is a single O(1) probe.

use phf::phf_set;

static KEYWORDS: phf::Set<&'static str> = phf_set! {
    "SELECT", "FROM", "WHERE", "JOIN", "INNER", "LEFT", "RIGHT", "FULL",
    "OUTER", "ON", "GROUP", "BY", "ORDER", "HAVING", "DISTINCT", "AS",
    "AND", "OR", "NOT", "IN", "LIKE", "BETWEEN", "IS", "NULL", "COUNT",
    "SUM", "AVG", "MIN", "MAX", "INSERT", "UPDATE", "DELETE", "CREATE",
    "DROP", "ALTER", "TABLE", "INDEX", "PRIMARY", "KEY", "FOREIGN",
    "REFERENCES", "UNIQUE", "CHECK", "DEFAULT", "UNION", "INTERSECT",
    "EXCEPT", "LIMIT", "OFFSET", "ASC", "DESC",
};

static TWO_CHAR_OPERATORS: &[&str] = &["!=", "<>", "<=", ">=", "||", "&&", "<<", ">>"];

const SINGLE_CHAR_OPERATORS: &[u8] = b"=<>+-*/%!^&|~";

const DELIMITERS: &[u8] = b"(),;.[]{}";

pub struct Tokenizer<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Tokenizer<'a> {
    pub fn new(sql: &'a str) -> Self {
        let input = sql.trim();
        Self {
            input,
            bytes: input.as_bytes(),
            pos: 0,
        }
    }

    /// Tokenizes the input into an ordered list of token slices.
    ///
    /// Empty or whitespace-only input yields an empty list; tokenization
    /// itself never fails.
    pub fn tokenize(mut self) -> Vec<&'a str> {
        let mut tokens = Vec::new();

        while !self.is_eof() {
            let ch = self.current();

            if ch.is_ascii_whitespace() {
                self.pos += 1;
                continue;
            }

            if ch == b'\'' || ch == b'"' {
                tokens.push(self.scan_string(ch));
                continue;
            }

            if ch == b'-' && self.peek() == Some(b'-') {
                self.skip_line_comment();
                continue;
            }

            if ch == b'/' && self.peek() == Some(b'*') {
                self.skip_block_comment();
                continue;
            }

            if let Some(op) = self.scan_two_char_operator() {
                tokens.push(op);
                continue;
            }

            if DELIMITERS.contains(&ch) || SINGLE_CHAR_OPERATORS.contains(&ch) {
                tokens.push(&self.input[self.pos..self.pos + 1]);
                self.pos += 1;
                continue;
            }

            if ch.is_ascii_digit() {
                tokens.push(self.scan_number());
                continue;
            }

            if ch.is_ascii_alphabetic() || ch == b'_' {
                tokens.push(self.scan_identifier());
                continue;
            }

            // Unexpected character: emit it as a one-byte token and move on.
            let width = self.input[self.pos..]
                .chars()
                .next()
                .map(char::len_utf8)
                .unwrap_or(1);
            tokens.push(&self.input[self.pos..self.pos + width]);
            self.pos += width;
        }

        tokens
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn current(&self) -> u8 {
        self.bytes[self.pos]
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos + 1).copied()
    }

    fn scan_string(&mut self, quote: u8) -> &'a str {
        let start = self.pos;
        self.pos += 1;

        while !self.is_eof() {
            let ch = self.current();
            self.pos += 1;
            if ch == quote {
                if !self.is_eof() && self.current() == quote {
                    // Doubled delimiter is an escaped quote; keep scanning.
                    self.pos += 1;
                } else {
                    break;
                }
            }
        }

        // An unterminated literal runs to end of input without error.
        &self.input[start..self.pos]
    }

    fn scan_number(&mut self) -> &'a str {
        let start = self.pos;
        let mut seen_point = false;

        while !self.is_eof() {
            let ch = self.current();
            if ch.is_ascii_digit() {
                self.pos += 1;
            } else if ch == b'.' && !seen_point {
                seen_point = true;
                self.pos += 1;
            } else {
                break;
            }
        }

        &self.input[start..self.pos]
    }

    fn scan_identifier(&mut self) -> &'a str {
        let start = self.pos;
        while !self.is_eof() {
            let ch = self.current();
            if ch.is_ascii_alphanumeric() || ch == b'_' {
                self.pos += 1;
            } else {
                break;
            }
        }
        &self.input[start..self.pos]
    }

    fn scan_two_char_operator(&mut self) -> Option<&'a str> {
        let pair = self.input.get(self.pos..self.pos + 2)?;
        if TWO_CHAR_OPERATORS.contains(&pair) {
            self.pos += 2;
            Some(pair)
        } else {
            None
        }
    }

    fn skip_line_comment(&mut self) {
        while !self.is_eof() && self.current() != b'\n' && self.current() != b'\r' {
            self.pos += 1;
        }
    }

    fn skip_block_comment(&mut self) {
        self.pos += 2;
        while self.pos + 1 < self.bytes.len() {
            if self.current() == b'*' && self.peek() == Some(b'/') {
                self.pos += 2;
                return;
            }
            self.pos += 1;
        }
        self.pos = self.bytes.len();
    }
}

/// Returns true if the token is a SQL keyword (case-insensitive).
pub fn is_keyword(token: &str) -> bool {
    KEYWORDS.contains(token.to_ascii_uppercase().as_str())
}

/// Returns true if the token is a recognized operator atom.
pub fn is_operator(token: &str) -> bool {
    TWO_CHAR_OPERATORS.contains(&token)
        || (token.len() == 1 && SINGLE_CHAR_OPERATORS.contains(&token.as_bytes()[0]))
}

/// Returns true if the token is a single-character delimiter.
pub fn is_delimiter(token: &str) -> bool {
    token.len() == 1 && DELIMITERS.contains(&token.as_bytes()[0])
}

/// Returns true if the token is a quoted string literal.
pub fn is_string_literal(token: &str) -> bool {
    (token.starts_with('\'') && token.ends_with('\'') && token.len() >= 2)
        || (token.starts_with('"') && token.ends_with('"') && token.len() >= 2)
}

/// Returns true if the token parses as a number.
pub fn is_numeric_literal(token: &str) -> bool {
    !token.is_empty() && token.parse::<f64>().is_ok()
}

/// Returns true if the token is a plain identifier: not a keyword,
/// operator, delimiter, or literal, starting with a letter or underscore.
pub fn is_identifier(token: &str) -> bool {
    if token.is_empty()
        || is_keyword(token)
        || is_operator(token)
        || is_delimiter(token)
        || is_string_literal(token)
        || is_numeric_literal(token)
    {
        return false;
    }

    let mut chars = token.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !first.is_ascii_alphabetic() && first != '_' {
        return false;
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
