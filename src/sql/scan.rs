//! # Expression Text Scanning
//!
//! Plan nodes keep conditions and select items as strings; this module is
//! the shared machinery for picking those strings apart: extracting
//! function calls, splitting arguments, stripping literals, and finding
//! column identifiers.
//!
//! Everything here is a hand-rolled, quote- and parenthesis-aware
//! character scan. Scans work on byte positions of the original text, so
//! extracted spans are exact even when the same substring occurs twice.

use crate::sql::functions::{self, FunctionCall};
use crate::sql::tokenizer;

/// A function call together with the byte span it was extracted from.
struct SpannedCall {
    call: FunctionCall,
    start: usize,
    end: usize,
}

/// Extracts all registered function calls from an expression.
///
/// Registry names are tried longest-first so that SUBSTRING anchors
/// before SUBSTR; a match inside an already-claimed span is dropped, which
/// keeps nested calls (CONCAT(UPPER(name))) from double-reporting.
pub fn extract_function_calls(expression: &str) -> Vec<FunctionCall> {
    extract_spanned(expression)
        .into_iter()
        .map(|s| s.call)
        .collect()
}

fn extract_spanned(expression: &str) -> Vec<SpannedCall> {
    let expression = expression.trim();
    let mut found: Vec<SpannedCall> = Vec::new();
    if expression.is_empty() {
        return found;
    }

    let bytes = expression.as_bytes();
    for name in functions::all_names() {
        let mut search_from = 0;
        while let Some(start) = find_name(expression, name, search_from) {
            search_from = start + 1;

            // Word boundary on the left.
            if start > 0 {
                let prev = bytes[start - 1];
                if prev.is_ascii_alphanumeric() || prev == b'_' {
                    continue;
                }
            }

            // Optional whitespace, then the opening parenthesis.
            let mut open = start + name.len();
            while open < bytes.len() && bytes[open].is_ascii_whitespace() {
                open += 1;
            }
            if open >= bytes.len() || bytes[open] != b'(' {
                continue;
            }

            let Some(close) = matching_paren(expression, open) else {
                continue;
            };

            let overlaps = found
                .iter()
                .any(|f| start <= f.end && close >= f.start);
            if overlaps {
                continue;
            }

            let args = split_arguments(&expression[open + 1..close]);
            let source = expression[start..=close].to_string();
            found.push(SpannedCall {
                call: FunctionCall::new(name, args, source),
                start,
                end: close,
            });
            search_from = close + 1;
        }
    }

    found
}

/// Case-insensitive search for `name` in `text` starting at `from`,
/// skipping quoted regions.
fn find_name(text: &str, name: &str, from: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let name_bytes = name.as_bytes();
    let mut in_quotes = false;
    let mut i = 0;

    while i + name_bytes.len() <= bytes.len() {
        let ch = bytes[i];
        if ch == b'\'' {
            in_quotes = !in_quotes;
            i += 1;
            continue;
        }
        if !in_quotes
            && i >= from
            && bytes[i..i + name_bytes.len()].eq_ignore_ascii_case(name_bytes)
        {
            return Some(i);
        }
        i += 1;
    }
    None
}

/// Returns the index of the parenthesis matching the one at `open`,
/// ignoring parentheses inside single-quoted strings.
pub fn matching_paren(text: &str, open: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0i32;
    let mut in_quotes = false;

    for (i, &ch) in bytes.iter().enumerate().skip(open) {
        match ch {
            b'\'' => in_quotes = !in_quotes,
            b'(' if !in_quotes => depth += 1,
            b')' if !in_quotes => {
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

/// Splits an argument list on top-level commas, trimming each argument.
/// Commas inside nested parentheses or quotes do not split.
pub fn split_arguments(arguments: &str) -> Vec<String> {
    split_top_level(arguments)
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Splits text on top-level commas, returning trimmed non-empty slices.
pub fn split_top_level(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let bytes = text.as_bytes();
    let mut depth = 0i32;
    let mut in_quotes = false;
    let mut start = 0;

    for (i, &ch) in bytes.iter().enumerate() {
        match ch {
            b'\'' | b'"' if !in_quotes => in_quotes = true,
            b'\'' | b'"' if in_quotes => in_quotes = false,
            b'(' if !in_quotes => depth += 1,
            b')' if !in_quotes => depth -= 1,
            b',' if !in_quotes && depth == 0 => {
                let part = text[start..i].trim();
                if !part.is_empty() {
                    parts.push(part);
                }
                start = i + 1;
            }
            _ => {}
        }
    }

    let last = text[start..].trim();
    if !last.is_empty() {
        parts.push(last);
    }
    parts
}

/// Replaces the contents of quoted string literals (both quote styles,
/// doubled-quote escapes included) with spaces, preserving length so byte
/// positions stay stable.
pub fn strip_string_literals(expression: &str) -> String {
    let mut out = String::with_capacity(expression.len());
    let mut chars = expression.chars().peekable();
    let mut quote: Option<char> = None;

    while let Some(c) = chars.next() {
        match quote {
            Some(q) if c == q => {
                if chars.peek() == Some(&q) {
                    chars.next();
                    out.push(' ');
                } else {
                    quote = None;
                }
                out.push(' ');
            }
            Some(_) => {
                for _ in 0..c.len_utf8() {
                    out.push(' ');
                }
            }
            None if c == '\'' || c == '"' => {
                quote = Some(c);
                out.push(' ');
            }
            None => out.push(c),
        }
    }

    out
}

/// Blanks every occurrence of each function call's source text with
/// spaces, so a later identifier scan does not see function arguments.
pub fn mask_function_calls(expression: &str, calls: &[FunctionCall]) -> String {
    let mut masked = expression.to_string();
    for call in calls {
        let source = call.source_text();
        if source.is_empty() {
            continue;
        }
        let blank = " ".repeat(source.len());
        while let Some(pos) = masked.find(source) {
            masked.replace_range(pos..pos + source.len(), &blank);
        }
    }
    masked
}

/// Scans text for column-shaped identifiers: `name` or `table.name`,
/// where both parts match `[A-Za-z_][A-Za-z0-9_]*`. Returns them in
/// source order.
pub fn identifiers(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut out = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let ch = bytes[i];
        if ch.is_ascii_alphabetic() || ch == b'_' {
            let start = i;
            while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                i += 1;
            }
            // One level of qualification: table.column
            if i + 1 < bytes.len()
                && bytes[i] == b'.'
                && (bytes[i + 1].is_ascii_alphabetic() || bytes[i + 1] == b'_')
            {
                i += 1;
                while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                    i += 1;
                }
            }
            out.push(&text[start..i]);
        } else if ch.is_ascii_digit() {
            // Skip numbers (and any trailing decimal part) entirely so
            // `1.5` does not read as a qualified name.
            while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'.') {
                i += 1;
            }
        } else {
            i += 1;
        }
    }

    out
}

/// Returns true if the text is a plain or table-qualified column
/// reference.
pub fn is_column_ref(text: &str) -> bool {
    let mut parts = text.splitn(2, '.');
    let first = parts.next().unwrap_or("");
    let ident = |s: &str| {
        !s.is_empty()
            && s.chars().next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    };
    match parts.next() {
        Some(second) => ident(first) && ident(second),
        None => ident(first),
    }
}

/// Splits `expr [AS] alias` into the expression and an optional alias.
///
/// An explicit `AS` is honored anywhere at top level (quoted or
/// backticked aliases are unwrapped). A bare trailing identifier counts
/// as an alias only for parenthesis-free expressions where the preceding
/// word is not an operator; function calls need `AS`.
pub fn split_alias(item: &str) -> (&str, Option<String>) {
    let item = item.trim();

    if let Some(pos) = find_top_level_as(item) {
        let expr = item[..pos].trim();
        let mut alias = item[pos + 2..].trim();
        if (alias.starts_with('"') && alias.ends_with('"') && alias.len() >= 2)
            || (alias.starts_with('`') && alias.ends_with('`') && alias.len() >= 2)
        {
            alias = &alias[1..alias.len() - 1];
        }
        if !expr.is_empty() && !alias.is_empty() {
            return (expr, Some(alias.to_string()));
        }
        return (item, None);
    }

    if item.contains('(') {
        return (item, None);
    }

    let words: Vec<&str> = item.split_whitespace().collect();
    if words.len() >= 2 {
        let candidate = words[words.len() - 1];
        let before = words[words.len() - 2];
        if tokenizer::is_identifier(candidate)
            && !functions::is_registered(candidate)
            && !tokenizer::is_operator(before)
        {
            let expr = item[..item.len() - candidate.len()].trim_end();
            return (expr, Some(candidate.to_string()));
        }
    }

    (item, None)
}

/// Finds a word-bounded top-level `AS` (case-insensitive), outside quotes
/// and parentheses. Returns its byte offset.
fn find_top_level_as(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0i32;
    let mut in_quotes = false;
    let mut i = 0;

    while i + 2 <= bytes.len() {
        match bytes[i] {
            b'\'' | b'"' => in_quotes = !in_quotes,
            b'(' if !in_quotes => depth += 1,
            b')' if !in_quotes => depth -= 1,
            _ => {}
        }
        if !in_quotes
            && depth == 0
            && bytes[i..i + 2].eq_ignore_ascii_case(b"AS")
            && (i == 0 || !is_word_byte(bytes[i - 1]))
            && (i + 2 == bytes.len() || !is_word_byte(bytes[i + 2]))
        {
            return Some(i);
        }
        i += 1;
    }
    None
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}
