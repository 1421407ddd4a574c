//! Error types for recursive-schema
//!
//! This module defines all error types used throughout the library, along with
//! the [`ErrorDetail`] tree that validation failures are collected into.

use indexmap::IndexMap;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Result type alias using the crate [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for schema operations
#[derive(Error, Debug)]
pub enum Error {
    /// A recursive field was used before it was attached to a schema tree
    #[error("recursive field must be attached to a schema before it is used")]
    NotAttached,

    /// The container owning a recursive field is not a composite schema
    #[error("owner of a recursive field must be a composite schema, found {0}")]
    NotComposite(String),

    /// The schema named by a recursive field reference could not be located
    #[error("could not locate schema '{reference}'")]
    SchemaNotFound {
        /// The reference as it was written in the declaration
        reference: String,
        /// Why the lookup failed
        #[source]
        source: LookupError,
    },

    /// Input data did not conform to the schema
    #[error("invalid data: {0}")]
    Validation(ErrorDetail),

    /// Invalid construction options for a field
    #[error("option error: {0}")]
    Options(String),

    /// A required attribute could not be read from the source object
    #[error("missing attribute '{path}' for field '{field}'")]
    MissingAttribute {
        /// Name of the field being serialized
        field: String,
        /// Source path that was read
        path: String,
    },

    /// Limit exceeded error
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    /// Malformed schema declaration
    #[error("declaration error: {0}")]
    Declaration(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Build a validation error holding a single message
    pub fn invalid(message: impl Into<String>) -> Self {
        Error::Validation(ErrorDetail::message(message))
    }

    /// Returns the validation detail if this is a validation failure
    pub fn detail(&self) -> Option<&ErrorDetail> {
        match self {
            Error::Validation(detail) => Some(detail),
            _ => None,
        }
    }
}

/// Failure to look up a schema type by reference
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// The reference is not a valid identifier path
    #[error("'{0}' is not a valid schema reference")]
    InvalidReference(String),

    /// No schemas are registered in the module
    #[error("no module named '{0}'")]
    UnknownModule(String),

    /// The module exists but does not define the name
    #[error("module '{module}' has no schema named '{name}'")]
    UnknownName {
        /// Module that was searched
        module: String,
        /// Name that was not found
        name: String,
    },

    /// The tree the reference was resolved from has no registry attached
    #[error("no schema registry is attached to the tree")]
    NoRegistry,
}

/// Collected validation errors, shaped like the data that failed
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ErrorDetail {
    /// Messages for a single value
    Messages(Vec<String>),
    /// Errors keyed by field name
    Fields(IndexMap<String, ErrorDetail>),
    /// Errors keyed by list position
    Items(BTreeMap<usize, ErrorDetail>),
}

impl ErrorDetail {
    /// Create a detail with one message
    pub fn message(message: impl Into<String>) -> Self {
        ErrorDetail::Messages(vec![message.into()])
    }

    /// Flatten the tree into `(path, message)` pairs
    ///
    /// Field names and list positions are joined with `.`; messages attached
    /// to the value itself have an empty path.
    pub fn paths(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        self.collect_paths(String::new(), &mut out);
        out
    }

    fn collect_paths(&self, prefix: String, out: &mut Vec<(String, String)>) {
        match self {
            ErrorDetail::Messages(messages) => {
                for message in messages {
                    out.push((prefix.clone(), message.clone()));
                }
            }
            ErrorDetail::Fields(fields) => {
                for (name, detail) in fields {
                    detail.collect_paths(join_path(&prefix, name), out);
                }
            }
            ErrorDetail::Items(items) => {
                for (index, detail) in items {
                    detail.collect_paths(join_path(&prefix, &index.to_string()), out);
                }
            }
        }
    }

    /// Look up the messages recorded at a dotted path
    pub fn messages_at(&self, path: &str) -> Vec<String> {
        self.paths()
            .into_iter()
            .filter(|(p, _)| p == path)
            .map(|(_, m)| m)
            .collect()
    }
}

fn join_path(prefix: &str, segment: &str) -> String {
    if prefix.is_empty() {
        segment.to_string()
    } else {
        format!("{}.{}", prefix, segment)
    }
}

impl fmt::Display for ErrorDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let paths = self.paths();
        for (i, (path, message)) in paths.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            if path.is_empty() {
                write!(f, "{}", message)?;
            } else {
                write!(f, "{}: {}", path, message)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nested() -> ErrorDetail {
        let mut inner = IndexMap::new();
        inner.insert("name".to_string(), ErrorDetail::message("too long"));
        let mut items = BTreeMap::new();
        items.insert(1, ErrorDetail::Fields(inner));
        let mut outer = IndexMap::new();
        outer.insert("children".to_string(), ErrorDetail::Items(items));
        outer.insert("id".to_string(), ErrorDetail::message("required"));
        ErrorDetail::Fields(outer)
    }

    #[test]
    fn test_detail_paths() {
        let paths = nested().paths();
        assert_eq!(
            paths,
            vec![
                ("children.1.name".to_string(), "too long".to_string()),
                ("id".to_string(), "required".to_string()),
            ]
        );
        assert_eq!(nested().messages_at("id"), vec!["required".to_string()]);
    }

    #[test]
    fn test_detail_display() {
        let msg = format!("{}", Error::Validation(nested()));
        assert!(msg.contains("children.1.name: too long"));
        assert!(msg.contains("id: required"));
    }

    #[test]
    fn test_detail_serializes_like_data() {
        let json = serde_json::to_value(nested()).unwrap();
        assert_eq!(json["children"]["1"]["name"][0], "too long");
        assert_eq!(json["id"][0], "required");
    }

    #[test]
    fn test_schema_not_found_keeps_cause() {
        use std::error::Error as _;

        let err = Error::SchemaNotFound {
            reference: "app.Missing".to_string(),
            source: LookupError::UnknownModule("app".to_string()),
        };
        assert!(err.to_string().contains("app.Missing"));
        let cause = err.source().unwrap().to_string();
        assert!(cause.contains("no module named 'app'"));
    }
}
