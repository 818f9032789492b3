//! Dialect rewriting for matched INSERT statements.
//!
//! Applies a fixed, ordered sequence of textual substitutions that turn a
//! T-SQL `INSERT [dbo].[T] (...) VALUES (...)` into its PostgreSQL form.
//! The order is load-bearing: the `[dbo].[T]` header must be rewritten
//! before generic bracket stripping, and the `CAST(N'..' AS DateTime2)`
//! rule must run before the bare `N'` prefix rule.
//!
//! Rewriting is purely textual. The rewriter does not validate that the
//! result is syntactically correct SQL, and bracket stripping is not aware
//! of string literals, so `[text]` inside a value is rewritten too. Both
//! are accepted limitations of the format being converted. Re-running the
//! rewriter on its own output is a no-op.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::fmt;
use std::str::FromStr;

/// How identifiers are rendered in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdentifierCase {
    /// `[TeamName]` → `"TeamName"`, table kept verbatim in double quotes.
    #[default]
    Quoted,
    /// `[TeamName]` → `team_name`, table name lower-cased and unquoted.
    Snake,
}

impl FromStr for IdentifierCase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "quoted" => Ok(IdentifierCase::Quoted),
            "snake" => Ok(IdentifierCase::Snake),
            _ => Err(format!(
                "Unknown identifier case '{s}' (expected 'quoted' or 'snake')"
            )),
        }
    }
}

impl fmt::Display for IdentifierCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentifierCase::Quoted => write!(f, "quoted"),
            IdentifierCase::Snake => write!(f, "snake"),
        }
    }
}

static INSERT_HEADER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bINSERT\s+\[dbo\]\.\[(\w+)\]").unwrap());

static BRACKET_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[(\w+)\]").unwrap());

static CAST_DATETIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)CAST\(N'([^']+)' AS DateTime2\)").unwrap());

// Only strip N when it sits where a value can start, so data that happens
// to end in N before a quote survives and the rewrite stays idempotent.
static NCHAR_PREFIX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(^|[\s,(=])N'").unwrap());

pub struct Rewriter {
    case: IdentifierCase,
    collapse_whitespace: bool,
}

impl Rewriter {
    pub fn new(case: IdentifierCase) -> Self {
        Self {
            case,
            collapse_whitespace: true,
        }
    }

    /// Whether internal whitespace runs are collapsed to single spaces.
    /// Wanted for multi-line extraction; pointless for line-oriented input.
    pub fn with_collapse_whitespace(mut self, collapse: bool) -> Self {
        self.collapse_whitespace = collapse;
        self
    }

    /// Apply the substitution sequence to one statement.
    pub fn rewrite(&self, stmt: &str) -> String {
        // 1. INSERT [dbo].[T] → INSERT INTO ...
        let result = INSERT_HEADER_RE.replace_all(stmt, |caps: &Captures| match self.case {
            IdentifierCase::Quoted => format!("INSERT INTO \"{}\"", &caps[1]),
            IdentifierCase::Snake => format!("INSERT INTO {}", caps[1].to_lowercase()),
        });

        // 2. Remaining bracketed identifiers
        let result = match self.case {
            IdentifierCase::Quoted => BRACKET_RE.replace_all(&result, "\"$1\""),
            IdentifierCase::Snake => {
                BRACKET_RE.replace_all(&result, |caps: &Captures| to_snake_case(&caps[1]))
            }
        }
        .into_owned();

        // 3. DateTime2 casts
        let result = CAST_DATETIME_RE.replace_all(&result, "'$1'::timestamp");

        // 4. National-character string prefixes
        let result = NCHAR_PREFIX_RE.replace_all(&result, "${1}'");

        // 5. Whitespace runs
        let result = if self.collapse_whitespace {
            collapse_whitespace(&result)
        } else {
            result.into_owned()
        };

        // 6. Exactly one trailing semicolon
        let trimmed = result.trim_end().trim_end_matches(';').trim_end();
        format!("{trimmed};")
    }
}

/// Convert a camelCase/PascalCase identifier to snake_case: an underscore
/// goes before a capital following a lowercase letter or digit, and before
/// the last capital of a run that is followed by lowercase.
pub fn to_snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_ascii_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars
                .get(i + 1)
                .map(|n| n.is_ascii_lowercase())
                .unwrap_or(false);
            if prev.is_ascii_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_ascii_uppercase() && next_is_lower)
            {
                out.push('_');
            }
        }
        out.push(c.to_ascii_lowercase());
    }
    out
}

/// Collapse whitespace runs to single spaces, leaving string literals
/// untouched so embedded newlines and spacing in data survive.
fn collapse_whitespace(stmt: &str) -> String {
    let mut out = String::with_capacity(stmt.len());
    let mut chars = stmt.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            if c == '\'' {
                if chars.peek() == Some(&'\'') {
                    out.push(chars.next().unwrap());
                } else {
                    in_string = false;
                }
            }
        } else if c.is_whitespace() {
            while chars.peek().map(|n| n.is_whitespace()).unwrap_or(false) {
                chars.next();
            }
            out.push(' ');
        } else {
            if c == '\'' {
                in_string = true;
            }
            out.push(c);
        }
    }
    out
}
