//! Identifier generation.
//!
//! [`UuidGenerator`] mints `urn:uuid:` IRIs that need no uniqueness check.
//! [`NamespaceIriGenerator`] appends a caller-proposed segment to a fixed
//! namespace IRI and, on collision with an identifiable already in a
//! [`Namespace`], tries `<proposal>_0001`, `<proposal>_0002`, and so on.

use std::sync::LazyLock;

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use regex::Regex;
use rustc_hash::FxHashMap;
use thiserror::Error;
use tracing::trace;

use crate::model::{Identifier, ModelError};
use crate::resolve::Namespace;

static NAMESPACE_IRI: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z][a-zA-Z0-9+\-\.]*:.*[#/=]$")
        .unwrap_or_else(|e| panic!("invalid namespace grammar: {e}"))
});

/// Reserved IRI characters, minus the path, query and fragment delimiters
/// `/ ? = & #`, plus characters never allowed in an IRI.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b':')
    .add(b'[')
    .add(b']')
    .add(b'@')
    .add(b'!')
    .add(b'$')
    .add(b'\'')
    .add(b'(')
    .add(b')')
    .add(b'*')
    .add(b'+')
    .add(b',')
    .add(b';')
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'\\')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

#[derive(Debug, Error)]
pub enum IdentificationError {
    #[error("namespace `{0}` must be an IRI ending with `#`, `/` or `=`")]
    InvalidNamespace(String),

    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Produces identifiers for new identifiables.
pub trait IdentifierGenerator {
    /// Generate an identifier not yet present in `taken`.
    ///
    /// `proposal` is a hint for the last segment; implementations may
    /// ignore or alter it.
    fn generate_id(
        &mut self,
        proposal: Option<&str>,
        taken: &dyn Namespace,
    ) -> Result<Identifier, IdentificationError>;
}

/// `urn:uuid:<random v4 uuid>`.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidGenerator;

impl IdentifierGenerator for UuidGenerator {
    fn generate_id(
        &mut self,
        _proposal: Option<&str>,
        _taken: &dyn Namespace,
    ) -> Result<Identifier, IdentificationError> {
        Ok(Identifier::iri(format!("urn:uuid:{}", uuid::Uuid::new_v4()))?)
    }
}

/// IRIs inside a fixed namespace, made unique by a numeric suffix.
#[derive(Debug, Clone)]
pub struct NamespaceIriGenerator {
    namespace: String,
    /// Next counter to try, per quoted proposal.
    counters: FxHashMap<String, u32>,
}

impl NamespaceIriGenerator {
    pub fn new(namespace: impl Into<String>) -> Result<Self, IdentificationError> {
        let namespace = namespace.into();
        if !NAMESPACE_IRI.is_match(&namespace) {
            return Err(IdentificationError::InvalidNamespace(namespace));
        }
        Ok(Self {
            namespace,
            counters: FxHashMap::default(),
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn candidate(&self, proposal: &str, counter: u32) -> String {
        if counter == 0 && !proposal.is_empty() {
            format!("{}{proposal}", self.namespace)
        } else {
            let separator = if proposal.is_empty() { "" } else { "_" };
            format!("{}{proposal}{separator}{counter:04}", self.namespace)
        }
    }
}

impl IdentifierGenerator for NamespaceIriGenerator {
    fn generate_id(
        &mut self,
        proposal: Option<&str>,
        taken: &dyn Namespace,
    ) -> Result<Identifier, IdentificationError> {
        let proposal = quote_segment(proposal.unwrap_or(""));
        let mut counter = self.counters.get(&proposal).copied().unwrap_or(0);
        loop {
            let iri = self.candidate(&proposal, counter);
            if taken.identifiable(&iri).is_none() {
                self.counters.insert(proposal, counter);
                return Ok(Identifier::iri(iri)?);
            }
            trace!(iri = %iri, "identifier taken");
            counter += 1;
        }
    }
}

/// Percent-encode the characters that would change an IRI segment's
/// meaning and drop ASCII control characters. Non-ASCII text is kept.
pub fn quote_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    let mut utf8 = [0u8; 4];
    for c in segment.chars() {
        if !c.is_ascii() {
            out.push(c);
        } else if c.is_ascii_control() {
            continue;
        } else {
            out.extend(utf8_percent_encode(c.encode_utf8(&mut utf8), SEGMENT));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ConceptDescription, Environment, IdentifierKind};

    fn occupy(env: &mut Environment, iri: &str) {
        env.insert(ConceptDescription::new(Identifier::iri(iri).unwrap(), None).unwrap())
            .unwrap();
    }

    #[test]
    fn test_uuid_generator() {
        let env = Environment::new();
        let id = UuidGenerator.generate_id(Some("ignored"), &env).unwrap();
        assert!(id.id().starts_with("urn:uuid:"));
        assert_eq!(id.kind(), IdentifierKind::Iri);
        assert_ne!(id, UuidGenerator.generate_id(None, &env).unwrap());
    }

    #[test]
    fn test_rejects_bad_namespace() {
        assert!(NamespaceIriGenerator::new("https://example.com/ns").is_err());
        assert!(NamespaceIriGenerator::new("no-scheme/").is_err());
        assert!(NamespaceIriGenerator::new("https://example.com/ns#").is_ok());
        assert!(NamespaceIriGenerator::new("urn:x:ids=").is_ok());
    }

    #[test]
    fn test_collisions_get_numbered() {
        let mut env = Environment::new();
        let mut generator = NamespaceIriGenerator::new("https://example.com/sm/").unwrap();

        let first = generator.generate_id(Some("Motor"), &env).unwrap();
        assert_eq!(first.id(), "https://example.com/sm/Motor");
        occupy(&mut env, first.id());

        let second = generator.generate_id(Some("Motor"), &env).unwrap();
        assert_eq!(second.id(), "https://example.com/sm/Motor_0001");
        occupy(&mut env, second.id());

        let third = generator.generate_id(Some("Motor"), &env).unwrap();
        assert_eq!(third.id(), "https://example.com/sm/Motor_0002");
    }

    #[test]
    fn test_empty_proposal_is_numbered() {
        let mut env = Environment::new();
        let mut generator = NamespaceIriGenerator::new("https://example.com/sm/").unwrap();
        let first = generator.generate_id(None, &env).unwrap();
        assert_eq!(first.id(), "https://example.com/sm/0000");
        occupy(&mut env, first.id());
        assert_eq!(
            generator.generate_id(Some(""), &env).unwrap().id(),
            "https://example.com/sm/0001"
        );
    }

    #[test]
    fn test_quote_segment() {
        assert_eq!(quote_segment("a b:c"), "a%20b%3Ac");
        assert_eq!(quote_segment("x/y?z=1&w#f"), "x/y?z=1&w#f");
        assert_eq!(quote_segment("tab\there"), "tabhere");
        assert_eq!(quote_segment("Größe"), "Größe");
    }
}
