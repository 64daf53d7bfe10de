//! Best-effort structured extraction from model text
//!
//! Models wrap JSON in prose and code fences, and sometimes answer with
//! Python-style literals instead. We take the greedy outermost span, try strict
//! JSON, then retry after rewriting the literal syntax into JSON.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::error::{TutorError, TutorResult};

static OBJECT_SPAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\{.*\}").expect("valid object regex"));
static ARRAY_SPAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\[.*\]").expect("valid array regex"));

/// First `{` through last `}`, parsed
pub fn extract_object(text: &str) -> TutorResult<Value> {
    let span = OBJECT_SPAN.find(text).map(|m| m.as_str()).unwrap_or(text);
    parse_lenient(span)
}

/// First `[` through last `]`, parsed
pub fn extract_array(text: &str) -> TutorResult<Value> {
    let span = ARRAY_SPAN.find(text).map(|m| m.as_str()).unwrap_or(text);
    parse_lenient(span)
}

/// Strict JSON first, then the relaxed literal syntax
pub fn parse_lenient(src: &str) -> TutorResult<Value> {
    match serde_json::from_str(src) {
        Ok(value) => Ok(value),
        Err(strict_err) => serde_json::from_str(&relax_to_json(src)).map_err(|_| {
            TutorError::generation(format!(
                "could not parse model output as JSON ({}): {}",
                strict_err,
                crate::truncate_safe(src, 200)
            ))
        }),
    }
}

/// Rewrite literal syntax into JSON:
/// single-quoted strings, `True`/`False`/`None`, trailing commas.
pub fn relax_to_json(src: &str) -> String {
    let mut out = String::with_capacity(src.len());
    let mut chars = src.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' | '\'' => copy_string(c, &mut chars, &mut out),
            ',' => {
                let mut look = chars.clone();
                while look.peek().map_or(false, |n| n.is_whitespace()) {
                    look.next();
                }
                if !matches!(look.peek(), Some(']') | Some('}')) {
                    out.push(',');
                }
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut word = String::from(c);
                while let Some(&n) = chars.peek() {
                    if n.is_alphanumeric() || n == '_' {
                        word.push(n);
                        chars.next();
                    } else {
                        break;
                    }
                }
                match word.as_str() {
                    "True" => out.push_str("true"),
                    "False" => out.push_str("false"),
                    "None" => out.push_str("null"),
                    _ => out.push_str(&word),
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Copy one quoted string as a JSON double-quoted string
fn copy_string(quote: char, chars: &mut std::iter::Peekable<std::str::Chars<'_>>, out: &mut String) {
    out.push('"');
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('\'') => out.push('\''),
                Some(escaped) => {
                    out.push('\\');
                    out.push(escaped);
                }
                None => out.push_str("\\\\"),
            },
            c if c == quote => break,
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out.push('"');
}
