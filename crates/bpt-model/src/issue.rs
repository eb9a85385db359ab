//! Issues and stage outcomes
//!
//! Every checking stage returns an [`Outcome`]: either valid, or a non-empty,
//! ordered list of [`Issue`]s. Never both.

use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A unit of validation or confirmation failure
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Issue {
    /// Flat message
    Message(String),
    /// Heading with sub-items, e.g. several field failures of one entity
    Group { heading: String, items: Vec<Issue> },
}

impl Issue {
    /// Create a flat issue
    #[inline]
    #[must_use]
    pub fn message(text: impl Into<String>) -> Self {
        Self::Message(text.into())
    }

    /// Create a grouped issue
    #[inline]
    #[must_use]
    pub fn group(heading: impl Into<String>, items: Vec<Issue>) -> Self {
        Self::Group {
            heading: heading.into(),
            items,
        }
    }

    /// Heading or message text
    #[must_use]
    pub fn title(&self) -> &str {
        match self {
            Self::Message(text) => text,
            Self::Group { heading, .. } => heading,
        }
    }

    /// Leaf messages, each prefixed by the headings above it
    #[must_use]
    pub fn flatten(&self) -> Vec<String> {
        match self {
            Self::Message(text) => vec![text.clone()],
            Self::Group { heading, items } => items
                .iter()
                .flat_map(Issue::flatten)
                .map(|leaf| format!("{heading}: {leaf}"))
                .collect(),
        }
    }

    fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let pad = "  ".repeat(depth);
        match self {
            Self::Message(text) => writeln!(f, "{pad}- {text}"),
            Self::Group { heading, items } => {
                writeln!(f, "{pad}- {heading}")?;
                for item in items {
                    item.fmt_indented(f, depth + 1)?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_indented(f, 0)
    }
}

impl From<String> for Issue {
    fn from(text: String) -> Self {
        Self::Message(text)
    }
}

impl From<&str> for Issue {
    fn from(text: &str) -> Self {
        Self::Message(text.to_string())
    }
}

/// Result of a checking stage
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Outcome {
    #[default]
    Valid,
    Invalid(Vec<Issue>),
}

impl Outcome {
    /// `Valid` for an empty list, `Invalid` otherwise
    #[must_use]
    pub fn from_issues(issues: Vec<Issue>) -> Self {
        if issues.is_empty() {
            Self::Valid
        } else {
            Self::Invalid(issues)
        }
    }

    /// Like [`Outcome::from_issues`], sorting and de-duplicating first
    #[must_use]
    pub fn from_sorted_issues(mut issues: Vec<Issue>) -> Self {
        issues.sort();
        issues.dedup();
        Self::from_issues(issues)
    }

    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// Recorded issues, empty when valid
    #[inline]
    #[must_use]
    pub fn issues(&self) -> &[Issue] {
        match self {
            Self::Valid => &[],
            Self::Invalid(issues) => issues,
        }
    }

    /// Consume into the issue list
    #[must_use]
    pub fn into_issues(self) -> Vec<Issue> {
        match self {
            Self::Valid => Vec::new(),
            Self::Invalid(issues) => issues,
        }
    }

    /// Every leaf message, flattened under its headings
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.issues().iter().flat_map(Issue::flatten).collect()
    }

    /// Combine two outcomes, keeping issue order
    #[must_use]
    pub fn merge(self, other: Outcome) -> Outcome {
        let mut issues = self.into_issues();
        issues.extend(other.into_issues());
        Self::from_issues(issues)
    }
}

// `true` when valid, the issue list otherwise.
impl Serialize for Outcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Valid => serializer.serialize_bool(true),
            Self::Invalid(issues) => {
                let mut seq = serializer.serialize_seq(Some(issues.len()))?;
                for issue in issues {
                    seq.serialize_element(issue)?;
                }
                seq.end()
            }
        }
    }
}
