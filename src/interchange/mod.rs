//! Wire formats for the AAS metamodel.
//!
//! Two official encodings of the same object graph:
//!
//! - **JSON** - `modelType` discriminators, lexical values as strings
//! - **XML** - element-name dispatch in the `aas` namespace, schema-ordered
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐                         ┌──────────────┐
//! │  JSON bytes  │                         │  XML bytes   │
//! └──────┬───────┘                         └──────┬───────┘
//!        │                                        │
//!        ▼                                        ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │                 EnvironmentFormat trait                   │
//! │  - read(&[u8]) -> Result<Environment>                    │
//! │  - write(&Environment) -> Result<Vec<u8>>                │
//! │  - read_identifiable / write_identifiable                │
//! └──────────────────────────────────────────────────────────┘
//!        │
//!        ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │                       Environment                         │
//! │  shells, submodels, concept descriptions by identifier   │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Decoding runs the [validation overlay](crate::validation) unless
//! [`CodecOptions::validate`] is off.
//!
//! ## Usage
//!
//! ```ignore
//! use aas::interchange::{EnvironmentFormat, Json, Xml};
//!
//! let bytes = std::fs::read("plant.json")?;
//! let env = Json::new().read(&bytes)?;
//! let xml = Xml::new().write(&env)?;
//! ```

mod error;
mod format;
mod json;
mod options;
mod xml;

pub use error::InterchangeError;
pub use format::EnvironmentFormat;
pub use json::Json;
pub use options::{CodecOptions, UnknownFieldPolicy};
pub use xml::{NS_AAS, NS_ABAC, NS_IEC61360, Xml};

use crate::model::{Environment, IdentifiableRef};
use crate::validation::{self, Violation};

/// Supported file extensions for interchange formats.
pub fn supported_extensions() -> &'static [&'static str] {
    &["json", "xml"]
}

/// Detect format from file extension.
pub fn detect_format(path: &std::path::Path) -> Option<Box<dyn EnvironmentFormat>> {
    let ext = path.extension()?.to_str()?;
    match ext.to_lowercase().as_str() {
        "json" => Some(Box::new(Json::new())),
        "xml" => Some(Box::new(Xml::new())),
        _ => None,
    }
}

/// Detect format from MIME type.
pub fn detect_format_from_mime(mime: &str) -> Option<Box<dyn EnvironmentFormat>> {
    let essence = mime.split(';').next().unwrap_or(mime).trim();
    match essence {
        "application/json" => Some(Box::new(Json::new())),
        "application/xml" | "text/xml" => Some(Box::new(Xml::new())),
        _ => None,
    }
}

fn first_violation(violations: Vec<Violation>) -> Result<(), InterchangeError> {
    match violations.into_iter().next() {
        None => Ok(()),
        Some(v) => Err(InterchangeError::ConstraintViolation {
            path: v.path,
            constraint: v.invariant,
            detail: v.detail,
        }),
    }
}

pub(crate) fn check_environment(env: &Environment) -> Result<(), InterchangeError> {
    first_violation(validation::validate(env))
}

pub(crate) fn check_identifiable(identifiable: IdentifiableRef<'_>) -> Result<(), InterchangeError> {
    first_violation(validation::validate_identifiable(identifiable))
}
