//! Error types for interchange operations.

use thiserror::Error;

use crate::model::{Constraint, DataTypeDefXsd, ModelError};

/// Errors that can occur while encoding or decoding a document.
///
/// Every decode-time variant carries the document path of the offending
/// node: a slash-delimited trail of id-shorts and array indices for JSON,
/// an XPath-like trail for XML.
#[derive(Debug, Error)]
pub enum InterchangeError {
    /// JSON parsing or serialization error.
    #[error("JSON error: {0}")]
    Json(String),

    /// XML parsing or serialization error.
    #[error("XML error: {0}")]
    Xml(String),

    /// IO error during read/write.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Unrecognized polymorphic discriminator.
    #[error("{path}: unknown {kind} `{name}`")]
    UnknownVariant {
        path: String,
        kind: &'static str,
        name: String,
    },

    /// Required field absent.
    #[error("{path}: missing required field `{field}`")]
    MissingField { path: String, field: String },

    /// Unrecognized field, only raised when unknown fields are rejected.
    #[error("{path}: unknown field `{field}`")]
    UnknownField { path: String, field: String },

    /// Field present but malformed.
    #[error("{path}: invalid `{field}`: {message}")]
    InvalidValue {
        path: String,
        field: String,
        message: String,
    },

    /// Typed value does not parse under its declared type.
    #[error("{path}: value `{value}` does not conform to {value_type}")]
    ValueTypeMismatch {
        path: String,
        value_type: DataTypeDefXsd,
        value: String,
    },

    /// Metamodel invariant broken by the decoded content.
    #[error("{path}: constraint {constraint} violated: {detail}")]
    ConstraintViolation {
        path: String,
        constraint: Constraint,
        detail: String,
    },
}

impl InterchangeError {
    /// Create a JSON error.
    pub fn json(message: impl Into<String>) -> Self {
        Self::Json(message.into())
    }

    /// Create an XML error.
    pub fn xml(message: impl Into<String>) -> Self {
        Self::Xml(message.into())
    }

    pub fn missing(path: impl Into<String>, field: impl Into<String>) -> Self {
        Self::MissingField {
            path: path.into(),
            field: field.into(),
        }
    }

    pub fn unknown_variant(path: impl Into<String>, kind: &'static str, name: impl Into<String>) -> Self {
        Self::UnknownVariant {
            path: path.into(),
            kind,
            name: name.into(),
        }
    }

    pub fn unknown_field(path: impl Into<String>, field: impl Into<String>) -> Self {
        Self::UnknownField {
            path: path.into(),
            field: field.into(),
        }
    }

    pub fn invalid(
        path: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            path: path.into(),
            field: field.into(),
            message: message.into(),
        }
    }

    /// Document path of the failure, for decode-time errors.
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::UnknownVariant { path, .. }
            | Self::MissingField { path, .. }
            | Self::UnknownField { path, .. }
            | Self::InvalidValue { path, .. }
            | Self::ValueTypeMismatch { path, .. }
            | Self::ConstraintViolation { path, .. } => Some(path),
            Self::Json(_) | Self::Xml(_) | Self::Io(_) => None,
        }
    }
}

impl ModelError {
    /// Attach a document path to a construction error.
    pub fn at(self, path: impl Into<String>) -> InterchangeError {
        let path = path.into();
        match self {
            Self::ValueTypeMismatch { value_type, value } => InterchangeError::ValueTypeMismatch {
                path,
                value_type,
                value,
            },
            Self::ConstraintViolation { constraint, detail } => {
                InterchangeError::ConstraintViolation {
                    path,
                    constraint,
                    detail,
                }
            }
            Self::IndexOutOfBounds { index, len } => InterchangeError::InvalidValue {
                path,
                field: "index".to_string(),
                message: format!("{index} is out of bounds for a list of {len}"),
            },
        }
    }
}
