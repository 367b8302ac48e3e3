//! Common trait for environment interchange formats.

use super::InterchangeError;
use crate::model::{Environment, Identifiable, IdentifiableRef};

/// Trait for AAS wire formats.
///
/// Implementations translate between the in-memory graph and bytes, either
/// a whole [`Environment`] or a single [`Identifiable`] as stored by a
/// backend. Decoding checks the metamodel invariants unless the format's
/// options disable validation.
pub trait EnvironmentFormat: Send + Sync {
    /// Human-readable name of the format.
    fn name(&self) -> &'static str;

    /// File extension(s) for this format.
    fn extensions(&self) -> &'static [&'static str];

    /// MIME type for this format.
    fn mime_type(&self) -> &'static str;

    /// Decode an environment document.
    fn read(&self, input: &[u8]) -> Result<Environment, InterchangeError>;

    /// Encode an environment document.
    fn write(&self, env: &Environment) -> Result<Vec<u8>, InterchangeError>;

    /// Decode a document holding one identifiable.
    fn read_identifiable(&self, input: &[u8]) -> Result<Identifiable, InterchangeError>;

    /// Encode one identifiable as a standalone document.
    fn write_identifiable(
        &self,
        identifiable: IdentifiableRef<'_>,
    ) -> Result<Vec<u8>, InterchangeError>;

    /// Quick well-formedness check that doesn't fully decode the content.
    fn validate(&self, input: &[u8]) -> Result<(), InterchangeError> {
        let _ = input;
        Ok(())
    }
}
