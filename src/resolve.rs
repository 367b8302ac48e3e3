//! Reference resolution.
//!
//! [`resolve`] walks a model reference's key chain through a caller-supplied
//! [`Namespace`]: the first key selects an identifiable, every later key
//! selects a child by id-short (named containers) or by decimal index
//! (lists). Resolution only borrows; it never mutates or builds nodes.

use std::collections::HashMap;
use std::hash::BuildHasher;

use indexmap::IndexMap;
use thiserror::Error;
use tracing::trace;

use crate::model::{
    ElementKind, Environment, ExternalReference, Identifiable, IdentifiableRef, Key, KeyTypes,
    Reference, SubmodelElement,
};

/// A lookup from identifier to identifiable.
pub trait Namespace {
    fn identifiable(&self, id: &str) -> Option<IdentifiableRef<'_>>;
}

impl Namespace for Environment {
    fn identifiable(&self, id: &str) -> Option<IdentifiableRef<'_>> {
        self.get(id)
    }
}

impl<S: BuildHasher> Namespace for HashMap<String, Identifiable, S> {
    fn identifiable(&self, id: &str) -> Option<IdentifiableRef<'_>> {
        self.get(id).map(Identifiable::view)
    }
}

impl<S: BuildHasher> Namespace for IndexMap<String, Identifiable, S> {
    fn identifiable(&self, id: &str) -> Option<IdentifiableRef<'_>> {
        self.get(id).map(Identifiable::view)
    }
}

impl<N: Namespace + ?Sized> Namespace for &N {
    fn identifiable(&self, id: &str) -> Option<IdentifiableRef<'_>> {
        (**self).identifiable(id)
    }
}

/// What a reference resolved to.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Resolved<'a> {
    /// External references are not followed.
    External(&'a ExternalReference),
    Identifiable(IdentifiableRef<'a>),
    Element(&'a SubmodelElement),
}

impl<'a> Resolved<'a> {
    pub fn as_element(&self) -> Option<&'a SubmodelElement> {
        match self {
            Self::Element(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_identifiable(&self) -> Option<IdentifiableRef<'a>> {
        match self {
            Self::Identifiable(i) => Some(*i),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ResolutionError {
    /// The first key names no identifiable in the namespace.
    #[error("identifier `{id}` not found in namespace")]
    IdentifierNotFound { id: String },

    /// A later key could not be followed.
    #[error("reference chain broken at key {index} {key}: {reason}")]
    BrokenReferenceChain {
        index: usize,
        key: Key,
        reason: String,
    },
}

fn broken(index: usize, key: &Key, reason: impl Into<String>) -> ResolutionError {
    ResolutionError::BrokenReferenceChain {
        index,
        key: key.clone(),
        reason: reason.into(),
    }
}

/// Resolve `reference` against `namespace`.
pub fn resolve<'a, N>(
    reference: &'a Reference,
    namespace: &'a N,
) -> Result<Resolved<'a>, ResolutionError>
where
    N: Namespace + ?Sized,
{
    let model = match reference {
        Reference::External(external) => return Ok(Resolved::External(external)),
        Reference::Model(model) => model,
    };
    let keys = model.keys();
    let Some((first, rest)) = keys.split_first() else {
        return Err(ResolutionError::IdentifierNotFound { id: String::new() });
    };

    let identifiable = namespace.identifiable(first.value()).ok_or_else(|| {
        ResolutionError::IdentifierNotFound {
            id: first.value().to_string(),
        }
    })?;
    let found = identifiable.key_type();
    if !matches!(first.key_type(), KeyTypes::Identifiable | KeyTypes::Referable)
        && first.key_type() != found
    {
        return Err(broken(0, first, format!("identifier names a {found}")));
    }
    trace!(id = first.value(), kind = %found, "resolved identifiable");

    let Some((head, tail)) = rest.split_first() else {
        return Ok(Resolved::Identifiable(identifiable));
    };
    let IdentifiableRef::Submodel(submodel) = identifiable else {
        return Err(broken(1, head, format!("{found} has no child elements")));
    };
    let mut current = submodel
        .elements()
        .get(head.value())
        .ok_or_else(|| broken(1, head, "no such child"))?;
    check_kind(1, head, current)?;

    for (offset, key) in tail.iter().enumerate() {
        let index = offset + 2;
        if key.key_type() == KeyTypes::FragmentReference {
            // fragments address into a payload, not a node
            return match current.kind() {
                ElementKind::File | ElementKind::Blob => Ok(Resolved::Element(current)),
                other => Err(broken(index, key, format!("{other} has no fragments"))),
            };
        }
        let next = current.child(key.value()).ok_or_else(|| {
            let reason = match current.kind() {
                ElementKind::SubmodelElementCollection
                | ElementKind::SubmodelElementList
                | ElementKind::Entity
                | ElementKind::AnnotatedRelationshipElement
                | ElementKind::Operation => "no such child".to_string(),
                other => format!("{other} is not a container"),
            };
            broken(index, key, reason)
        })?;
        check_kind(index, key, next)?;
        trace!(index, key = key.value(), "descended");
        current = next;
    }
    Ok(Resolved::Element(current))
}

fn check_kind(index: usize, key: &Key, element: &SubmodelElement) -> Result<(), ResolutionError> {
    if element.kind().answers_to(key.key_type()) {
        Ok(())
    } else {
        Err(broken(
            index,
            key,
            format!("found a {} instead", element.kind()),
        ))
    }
}
