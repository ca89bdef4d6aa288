//! Metadata filtering for similarity queries.
//!
//! A filter targets one metadata key and a list of allowed values. One value
//! is a plain equality test; several values are OR-ed together. Filtering is a
//! predicate over candidates, so a record matching several clauses is still
//! returned once.

use crate::metadata::Metadata;

/// Predicate restricting the candidate set of a similarity query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataFilter {
    /// `metadata[key] == value`.
    Eq {
        /// Metadata key to test.
        key: String,
        /// Required value.
        value: String,
    },
    /// `metadata[key] == v1 OR metadata[key] == v2 OR ...`.
    AnyOf {
        /// Metadata key to test.
        key: String,
        /// Accepted values.
        values: Vec<String>,
    },
}

impl MetadataFilter {
    /// Build a filter from a key and its allowed values.
    ///
    /// Returns `None` when `values` is empty: no restriction applies and the
    /// query behaves exactly like an unfiltered one.
    pub fn from_values<I, S>(key: impl Into<String>, values: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let key = key.into();
        let mut values: Vec<String> = values.into_iter().map(Into::into).collect();
        match values.len() {
            0 => None,
            1 => Some(Self::Eq {
                key,
                value: values.remove(0),
            }),
            _ => Some(Self::AnyOf { key, values }),
        }
    }

    /// The metadata key this filter inspects.
    pub fn key(&self) -> &str {
        match self {
            Self::Eq { key, .. } | Self::AnyOf { key, .. } => key,
        }
    }

    /// Whether a record with this metadata passes the filter.
    ///
    /// Records without the key never match.
    pub fn matches(&self, metadata: &Metadata) -> bool {
        let Some(actual) = metadata.get(self.key()) else {
            return false;
        };
        match self {
            Self::Eq { value, .. } => actual == value,
            Self::AnyOf { values, .. } => values.iter().any(|v| v == actual),
        }
    }
}
