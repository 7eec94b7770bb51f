//! Story search filters.
//!
//! The tracker's story search takes a single `filter` parameter made of
//! space-separated `key:value` terms.

use chrono::NaiveDate;
use std::fmt;

/// Formats a date the way the tracker's filter syntax expects (MM/DD/YYYY).
pub fn tracker_date(date: NaiveDate) -> String {
    date.format("%m/%d/%Y").to_string()
}

/// Builder for a story search filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoryFilter {
    terms: Vec<String>,
}

impl StoryFilter {
    /// An empty filter matches every story.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(self, state: &str) -> Self {
        self.term("state", state)
    }

    pub fn include_done(self, include: bool) -> Self {
        self.term("includedone", if include { "true" } else { "false" })
    }

    pub fn modified_since(self, date: NaiveDate) -> Self {
        self.term("modified_since", &tracker_date(date))
    }

    pub fn created_since(self, date: NaiveDate) -> Self {
        self.term("created_since", &tracker_date(date))
    }

    /// Labels containing whitespace or quotes are quoted, with inner quotes
    /// backslash-escaped.
    pub fn label(self, label: &str) -> Self {
        if label.chars().any(|c| c.is_whitespace() || c == '"') {
            let escaped = label.replace('\\', "\\\\").replace('"', "\\\"");
            self.term("label", &format!("\"{}\"", escaped))
        } else {
            self.term("label", label)
        }
    }

    /// Appends every term of `other`.
    pub fn and(mut self, other: &StoryFilter) -> Self {
        self.terms.extend(other.terms.iter().cloned());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    fn term(mut self, key: &str, value: &str) -> Self {
        self.terms.push(format!("{}:{}", key, value));
        self
    }
}

impl fmt::Display for StoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.terms.join(" "))
    }
}
