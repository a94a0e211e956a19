//! Error taxonomy for the generator.
//!
//! Only two failure kinds are recovered inside a run: an ambiguous union tag
//! (downgraded to an untagged union by the classifier) and an endpoint body
//! failure (replaced by a stub method). Everything else aborts generation.

use std::path::PathBuf;

/// Errors raised while parsing, classifying, synthesizing or writing.
#[derive(Debug, thiserror::Error)]
pub enum GenError {
    /// The input document is not valid JSON or not a valid OpenAPI shape.
    #[error("Failed to parse OpenAPI document: {0}")]
    Parse(#[from] serde_json::Error),

    /// A `$ref` points outside the supported component sections or at a missing entry.
    #[error("Unresolved reference '{reference}': {reason}")]
    UnresolvedReference {
        /// The pointer as written in the document.
        reference: String,
        /// Why resolution failed.
        reason: String,
    },

    /// A schema matched none of the recognized shapes.
    #[error("Schema at '{location}' matches no known shape: {reason}")]
    UnknownShape {
        /// Location pointer of the offending schema.
        location: String,
        /// What made the schema unrecognizable.
        reason: String,
    },

    /// Union branches disagree on the discriminant property.
    #[error("Ambiguous union tag: {reason}")]
    AmbiguousUnionTag {
        /// Which branch broke the pattern.
        reason: String,
    },

    /// Two component schemas normalize to the same PascalCase name.
    #[error(
        "Duplicate type name '{name}' produced by schemas {first:?} and {second:?}; add it to skip_duplicate_types to keep the first"
    )]
    DuplicateTypeName {
        /// The colliding PascalCase name.
        name: String,
        /// Raw name of the schema that claimed it first.
        first: String,
        /// Raw name of the schema that collided.
        second: String,
    },

    /// Two operations normalize to the same function name.
    #[error("Duplicate operation '{function}' at {first} and {second}")]
    DuplicateOperation {
        /// The colliding function name.
        function: String,
        /// `METHOD path` of the first operation.
        first: String,
        /// `METHOD path` of the second operation.
        second: String,
    },

    /// Rendering a single endpoint method failed.
    #[error("Failed to generate body of '{function}': {reason}")]
    EndpointBody {
        /// Function whose body could not be rendered.
        function: String,
        /// Diagnostic carried into the stub comment.
        reason: String,
    },

    /// The configuration file is missing or malformed.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Reading the input or writing the output tree failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File or directory involved.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
}

impl GenError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn unresolved(reference: &str, reason: impl Into<String>) -> Self {
        Self::UnresolvedReference {
            reference: reference.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn unknown_shape(location: &str, reason: impl Into<String>) -> Self {
        Self::UnknownShape {
            location: location.to_string(),
            reason: reason.into(),
        }
    }
}
