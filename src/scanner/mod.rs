//! Statement extraction from decoded T-SQL export scripts.
//!
//! Locates `INSERT [dbo].[Table] (cols) VALUES (vals)` spans and filters
//! them against the table allow-list. Two strategies are supported:
//!
//! - [`ExtractStrategy::LineOriented`] treats each line as a candidate and
//!   matches it with a regex whose VALUES list allows at most one level of
//!   nested parentheses. Two or more nesting levels do not match, and a
//!   closing parenthesis inside a string literal truncates the match. Only
//!   suitable for dumps that emit one statement per line.
//! - [`ExtractStrategy::WholeDocument`] scans the full text with a small
//!   state machine that tracks quote state (including `''` doubling) and
//!   parenthesis depth explicitly, so statements may span lines and contain
//!   arbitrary nesting or embedded delimiters.
//!
//! Allow-listed statements that fail to parse are reported as misparses,
//! never silently dropped. Statements for tables outside the allow-list are
//! filtered without comment; DDL and administrative batches never match
//! because only a word-boundary `INSERT` followed by `[dbo].[Name]`
//! qualifies as a candidate.

use crate::tables::TableMapping;
use memchr::{memchr_iter, memmem};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

/// How INSERT statements are located in the decoded text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtractStrategy {
    LineOriented,
    #[default]
    WholeDocument,
}

impl FromStr for ExtractStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "line" => Ok(ExtractStrategy::LineOriented),
            "document" => Ok(ExtractStrategy::WholeDocument),
            _ => Err(format!(
                "Unknown extraction strategy '{s}' (expected 'line' or 'document')"
            )),
        }
    }
}

impl fmt::Display for ExtractStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractStrategy::LineOriented => write!(f, "line"),
            ExtractStrategy::WholeDocument => write!(f, "document"),
        }
    }
}

/// A candidate INSERT span with its extracted table name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawStatement {
    pub table: String,
    pub text: String,
}

/// An allow-listed statement the extractor could not parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Misparse {
    pub table: String,
    pub preview: String,
    pub reason: String,
}

impl fmt::Display for Misparse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}...", self.reason, self.table, self.preview)
    }
}

/// Result of a scan over one document.
#[derive(Debug, Default)]
pub struct ScanResult {
    pub statements: Vec<RawStatement>,
    pub misparses: Vec<Misparse>,
}

static TABLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bINSERT\s+\[dbo\]\.\[(\w+)\]").unwrap());

// The VALUES list alternation matches either non-paren characters or one
// fully parenthesized run, so a single nesting level (a function call) is
// captured but two levels are not.
static LINE_INSERT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bINSERT\s+\[dbo\]\.\[(\w+)\]\s*\([^)]+\)\s*VALUES\s*\((?:[^()]|\([^()]*\))*\)")
        .unwrap()
});

/// Extract allow-listed INSERT statements from decoded text.
pub fn extract(text: &str, tables: &TableMapping, strategy: ExtractStrategy) -> ScanResult {
    match strategy {
        ExtractStrategy::LineOriented => extract_lines(text, tables),
        ExtractStrategy::WholeDocument => extract_document(text, tables),
    }
}

fn extract_lines(text: &str, tables: &TableMapping) -> ScanResult {
    let mut result = ScanResult::default();
    let finder = memmem::Finder::new(b"INSERT [dbo].");

    for line in lines(text) {
        if finder.find(line.as_bytes()).is_none() {
            continue;
        }
        let Some(caps) = TABLE_RE.captures(line) else {
            continue;
        };
        let table = caps[1].to_string();
        if !tables.contains(&table) {
            continue;
        }

        match LINE_INSERT_RE.find(line) {
            Some(m) => result.statements.push(RawStatement {
                table,
                text: m.as_str().to_string(),
            }),
            None => result.misparses.push(Misparse {
                preview: preview(line),
                table,
                reason: "statement did not match the line pattern".to_string(),
            }),
        }
    }

    result
}

fn extract_document(text: &str, tables: &TableMapping) -> ScanResult {
    let mut result = ScanResult::default();
    let bytes = text.as_bytes();
    let mut pos = 0;

    while let Some(caps) = TABLE_RE.captures_at(text, pos) {
        let header = caps.get(0).unwrap();
        let table = caps[1].to_string();

        if !tables.contains(&table) {
            pos = header.end();
            continue;
        }

        match scan_statement(bytes, header.end()) {
            Ok(end) => {
                result.statements.push(RawStatement {
                    table,
                    text: text[header.start()..end].to_string(),
                });
                pos = end;
            }
            Err(resume) => {
                result.misparses.push(Misparse {
                    preview: preview(&text[header.start()..]),
                    table,
                    reason: "statement truncated before its VALUES list closed".to_string(),
                });
                pos = resume.max(header.end());
            }
        }
    }

    result
}

/// Scan forward from the end of an `INSERT [dbo].[T]` header until the
/// second top-level parenthesized group (the VALUES list) closes.
///
/// Returns the exclusive end offset, or on truncation (a `GO` batch
/// separator or end of input reached first) the offset to resume scanning
/// from.
fn scan_statement(bytes: &[u8], start: usize) -> Result<usize, usize> {
    let mut depth = 0usize;
    let mut groups_closed = 0;
    let mut in_string = false;
    let mut i = start;

    while i < bytes.len() {
        let b = bytes[i];
        if in_string {
            if b == b'\'' {
                // '' is an escaped quote inside a T-SQL string literal
                if bytes.get(i + 1) == Some(&b'\'') {
                    i += 2;
                    continue;
                }
                in_string = false;
            }
        } else {
            match b {
                b'\'' => in_string = true,
                b'(' => depth += 1,
                b')' => {
                    if depth > 0 {
                        depth -= 1;
                        if depth == 0 {
                            groups_closed += 1;
                            if groups_closed == 2 {
                                return Ok(i + 1);
                            }
                        }
                    }
                }
                // A batch separator terminates the statement no matter how
                // many parens are still open: whatever came before is
                // truncated.
                b'G' | b'g' if is_go_separator(bytes, i) => {
                    return Err(i + 2);
                }
                _ => {}
            }
        }
        i += 1;
    }

    Err(bytes.len())
}

/// True when `bytes[i..]` starts a `GO` batch separator. T-SQL requires GO
/// to stand alone on its line, which is also what keeps identifiers like
/// `[Go]` from matching.
fn is_go_separator(bytes: &[u8], i: usize) -> bool {
    if i + 2 > bytes.len() || !bytes[i..i + 2].eq_ignore_ascii_case(b"GO") {
        return false;
    }
    let mut j = i;
    while j > 0 && matches!(bytes[j - 1], b' ' | b'\t') {
        j -= 1;
    }
    if j != 0 && bytes[j - 1] != b'\n' {
        return false;
    }
    let mut k = i + 2;
    while k < bytes.len() && matches!(bytes[k], b' ' | b'\t' | b'\r') {
        k += 1;
    }
    k == bytes.len() || bytes[k] == b'\n'
}

fn preview(text: &str) -> String {
    text.chars().take(60).collect()
}

/// Split into newline-delimited lines, trimming `\r`.
fn lines(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    for nl in memchr_iter(b'\n', text.as_bytes()) {
        out.push(text[start..nl].trim_end_matches('\r'));
        start = nl + 1;
    }
    if start < text.len() {
        out.push(text[start..].trim_end_matches('\r'));
    }
    out
}
