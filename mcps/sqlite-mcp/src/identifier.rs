//! Identifier validation
//!
//! SQLite cannot bind table or column names as parameters, so they have to
//! be spliced into statement text. [`Identifier`] is the only type the
//! statement builders accept for that, and the only way to get one is
//! [`Identifier::parse`].

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::DbError;

/// Longest identifier accepted
pub const MAX_IDENTIFIER_LEN: usize = 128;

static IDENTIFIER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is a valid regex")
});

/// A table or column name safe to embed in SQL text
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier(String);

impl Identifier {
    pub fn parse(name: &str) -> Result<Self, DbError> {
        let reason = if name.is_empty() {
            Some("must not be empty")
        } else if name.len() > MAX_IDENTIFIER_LEN {
            Some("longer than 128 characters")
        } else if !IDENTIFIER_PATTERN.is_match(name) {
            Some("must start with a letter or underscore and contain only letters, digits and underscores")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(DbError::InvalidIdentifier {
                name: truncate_for_display(name),
                reason,
            }),
            None => Ok(Self(name.to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Renders the identifier double-quoted, ready for SQL text
///
/// Quoting lets keyword-named tables (`order`, `group`) work; the pattern
/// guarantees there is no `"` to escape.
impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.0)
    }
}

fn truncate_for_display(name: &str) -> String {
    match name.char_indices().nth(MAX_IDENTIFIER_LEN) {
        Some((cut, _)) => format!("{}...", &name[..cut]),
        None => name.to_string(),
    }
}
