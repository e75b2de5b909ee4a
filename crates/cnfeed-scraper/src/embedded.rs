//! Extraction of the `__INITIAL_PROPS__` object literal from a listing page.
//!
//! The marketplace server-renders its listing state into an inline script:
//!
//! ```text
//! <script>window.__INITIAL_PROPS__ = {"vehiclesList": {...}, ...};</script>
//! ```
//!
//! The literal is isolated with a bracket-depth scanner that ignores braces
//! inside string literals, so a `};` sequence in a vehicle description does
//! not cut the payload short. When the scanner cannot close the literal
//! (truncated markup), the first `}` followed by an optional `;` and the next
//! tag is used instead.
//!
//! Isolated text is parsed as-is first. On failure it is repaired (comments
//! and trailing commas removed), then HTML-entity decoded, and finally both.
//! The first candidate that parses wins; if none does the page is reported as
//! [`ScraperError::PayloadNotFound`].

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::error::ScraperError;
use crate::markup::decode_entities;

static ASSIGNMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)__INITIAL_PROPS__\s*=\s*").expect("valid regex"));
static TERMINATED_LITERAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^(\{.*?\})\s*;?\s*<").expect("valid regex"));

/// Locates and parses the `__INITIAL_PROPS__` payload embedded in `html`.
///
/// Every assignment of the identifier is tried in document order; the first
/// one that yields valid JSON is returned.
///
/// # Errors
///
/// Returns [`ScraperError::PayloadNotFound`] when no assignment exists or no
/// parse attempt succeeds.
pub fn extract_initial_props(html: &str) -> Result<Value, ScraperError> {
    let mut assignments = 0usize;

    for m in ASSIGNMENT_RE.find_iter(html) {
        let rest = &html[m.end()..];
        if !rest.starts_with('{') {
            continue;
        }
        assignments += 1;

        for literal in literal_candidates(rest) {
            if let Some(value) = parse_with_repair(literal) {
                tracing::debug!(
                    offset = m.start(),
                    payload_bytes = literal.len(),
                    "parsed __INITIAL_PROPS__ payload"
                );
                return Ok(value);
            }
        }
    }

    tracing::warn!(
        assignments,
        html_bytes = html.len(),
        "__INITIAL_PROPS__ payload not found"
    );
    Err(ScraperError::PayloadNotFound)
}

/// Returns the balanced literal (when the scanner closes it) followed by the
/// terminator-based guess, skipping the guess when it is identical.
fn literal_candidates(rest: &str) -> Vec<&str> {
    let mut out = Vec::with_capacity(2);
    if let Some(balanced) = extract_balanced_object(rest) {
        out.push(balanced);
    }
    if let Some(terminated) = TERMINATED_LITERAL_RE
        .captures(rest)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
    {
        if !out.contains(&terminated) {
            out.push(terminated);
        }
    }
    out
}

/// Try to extract a balanced object literal from the start of `s`.
///
/// Tracks brace/bracket depth while respecting double-quoted strings and
/// escape sequences. Returns the shortest prefix that closes the opening `{`,
/// or `None` if the literal is unterminated.
pub(crate) fn extract_balanced_object(s: &str) -> Option<&str> {
    if !s.starts_with('{') {
        return None;
    }
    let mut depth: i32 = 0;
    let mut in_string = false;
    let mut escape = false;
    for (i, c) in s.char_indices() {
        if escape {
            escape = false;
            continue;
        }
        if in_string {
            match c {
                '\\' => escape = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '[' | '{' => depth += 1,
            ']' => depth -= 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&s[..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

fn parse_with_repair(raw: &str) -> Option<Value> {
    if let Ok(value) = serde_json::from_str::<Value>(raw) {
        return Some(value);
    }

    let repaired = repair_literal(raw);
    if let Ok(value) = serde_json::from_str::<Value>(&repaired) {
        tracing::debug!("payload parsed after comment/trailing-comma repair");
        return Some(value);
    }

    // Entity-escaped payloads have no real quotes yet, so repair must run
    // after decoding for the string-aware passes to see the strings.
    let decoded = decode_entities(raw);
    if let Ok(value) = serde_json::from_str::<Value>(&decoded) {
        tracing::debug!("payload parsed after entity decoding");
        return Some(value);
    }
    let decoded_repaired = repair_literal(&decoded);
    match serde_json::from_str::<Value>(&decoded_repaired) {
        Ok(value) => {
            tracing::debug!("payload parsed after entity decoding and repair");
            Some(value)
        }
        Err(e) => {
            tracing::debug!(error = %e, "payload candidate rejected after all repair passes");
            None
        }
    }
}

/// Removes `//` line comments, `/* */` block comments and trailing commas
/// before `}` / `]`. String literals are copied through untouched.
pub(crate) fn repair_literal(raw: &str) -> String {
    remove_trailing_commas(&strip_comments(raw))
}

fn strip_comments(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    let mut in_string = false;
    let mut escape = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            if escape {
                escape = false;
            } else if c == '\\' {
                escape = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match (c, chars.peek().copied()) {
            ('"', _) => {
                in_string = true;
                out.push(c);
            }
            ('/', Some('/')) => {
                // Line comment: drop through end of line, keep the newline.
                for skipped in chars.by_ref() {
                    if skipped == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut prev = '\0';
                for skipped in chars.by_ref() {
                    if prev == '*' && skipped == '/' {
                        break;
                    }
                    prev = skipped;
                }
            }
            _ => out.push(c),
        }
    }
    out
}

fn remove_trailing_commas(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_string = false;
    let mut escape = false;

    for (i, c) in raw.char_indices() {
        if in_string {
            out.push(c);
            if escape {
                escape = false;
            } else if c == '\\' {
                escape = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            ',' if raw[i + 1..].trim_start().starts_with(['}', ']']) => {}
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
#[path = "embedded_test.rs"]
mod tests;
