//! Directory Filter Construction
//!
//! The query pattern is caller-supplied, so it only ever enters a filter
//! through [`escape_filter_value`].

use std::fmt;

/// Attribute holding a person's login identifiers
pub const UID_ATTRIBUTE: &str = "uid";
/// Attribute holding a person's common name
pub const CN_ATTRIBUTE: &str = "cn";

/// Directory search filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchFilter {
    /// Logical OR of the inner filters
    Or(Vec<SearchFilter>),
    /// Substring match anywhere in the attribute value. An empty value
    /// renders as a presence test.
    Contains {
        /// Attribute name
        attribute: String,
        /// Unescaped value
        value: String,
    },
}

impl SearchFilter {
    /// Substring match on `attribute`
    pub fn contains(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Contains {
            attribute: attribute.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for SearchFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Or(filters) => {
                f.write_str("(|")?;
                for filter in filters {
                    write!(f, "{filter}")?;
                }
                f.write_str(")")
            }
            Self::Contains { attribute, value } if value.is_empty() => {
                write!(f, "({attribute}=*)")
            }
            Self::Contains { attribute, value } => {
                write!(f, "({}=*{}*)", attribute, escape_filter_value(value))
            }
        }
    }
}

/// Filter matching people whose identifier or common name contains `pattern`
pub fn person_filter(pattern: &str) -> SearchFilter {
    SearchFilter::Or(vec![
        SearchFilter::contains(UID_ATTRIBUTE, pattern),
        SearchFilter::contains(CN_ATTRIBUTE, pattern),
    ])
}

/// Escape special characters in filter values (RFC 4515).
pub fn escape_filter_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => escaped.push_str("\\5c"),
            '*' => escaped.push_str("\\2a"),
            '(' => escaped.push_str("\\28"),
            ')' => escaped.push_str("\\29"),
            '\0' => escaped.push_str("\\00"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
