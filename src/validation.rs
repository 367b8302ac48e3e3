//! Validation overlay.
//!
//! Constructors reject what they can see locally. [`validate`] re-checks a
//! whole environment after arbitrary mutation through the `*_mut` accessors:
//! parent links, container keys, list homogeneity, annotation kinds and the
//! lexical fields that are kept as plain strings.
//!
//! Validation never fails; callers decide what a non-empty result means.

use serde::Serialize;
use tracing::debug;

use crate::model::{
    AssetAdministrationShell, Constraint, Environment, IdentifiableRef,
    KeyTypes, ListItems, ModelError, NamedElements, NodeId, Submodel, SubmodelElement, is_date_time,
    is_duration,
};

/// One broken invariant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Slash-delimited trail: identifier, then id-shorts or list indices.
    pub path: String,
    pub invariant: Constraint,
    pub detail: String,
}

impl Violation {
    pub fn into_model_error(self) -> ModelError {
        ModelError::violation(self.invariant, format!("{}: {}", self.path, self.detail))
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}]: {}", self.path, self.invariant, self.detail)
    }
}

/// Validate every identifiable in `env`.
pub fn validate(env: &Environment) -> Vec<Violation> {
    let mut validator = Validator::default();
    for identifiable in env.iter() {
        validator.identifiable(identifiable);
    }
    debug!(
        identifiables = env.len(),
        violations = validator.violations.len(),
        "validated environment"
    );
    validator.violations
}

/// Validate a single identifiable.
pub fn validate_identifiable(identifiable: IdentifiableRef<'_>) -> Vec<Violation> {
    let mut validator = Validator::default();
    validator.identifiable(identifiable);
    validator.violations
}

#[derive(Default)]
struct Validator {
    path: Vec<String>,
    violations: Vec<Violation>,
}

impl Validator {
    fn report(&mut self, invariant: Constraint, detail: impl Into<String>) {
        self.violations.push(Violation {
            path: self.path.join("/"),
            invariant,
            detail: detail.into(),
        });
    }

    fn enter(&mut self, segment: impl Into<String>) {
        self.path.push(segment.into());
    }

    fn leave(&mut self) {
        self.path.pop();
    }

    fn identifiable(&mut self, identifiable: IdentifiableRef<'_>) {
        self.enter(identifiable.identifier().id());
        match identifiable {
            IdentifiableRef::Shell(shell) => self.shell(shell),
            IdentifiableRef::Submodel(submodel) => self.submodel(submodel),
            IdentifiableRef::ConceptDescription(_) => {}
        }
        self.leave();
    }

    fn shell(&mut self, shell: &AssetAdministrationShell) {
        if let Some(thumbnail) = &shell.asset_information.default_thumbnail {
            if thumbnail.path.is_empty() {
                self.report(Constraint::NonEmptyString, "default thumbnail path is empty");
            }
        }
        let derived_from = shell
            .derived_from
            .as_ref()
            .and_then(|r| r.as_model())
            .and_then(|r| r.keys().first())
            .map(|k| k.key_type());
        if let Some(found) = derived_from.filter(|k| *k != KeyTypes::AssetAdministrationShell) {
            self.report(
                Constraint::ReferenceKeyChain,
                format!("derivedFrom must address a shell, not a {found}"),
            );
        }
    }

    fn submodel(&mut self, submodel: &Submodel) {
        self.named(submodel.common.referable.node(), submodel.elements());
    }

    fn named(&mut self, owner: NodeId, elements: &NamedElements) {
        if elements.owner() != owner {
            self.report(
                Constraint::ParentConsistency,
                "child container belongs to another node",
            );
        }
        for (key, element) in elements.entries() {
            self.enter(key);
            match element.id_short() {
                None => self.report(Constraint::IdShortRequired, "named child has no id-short"),
                Some(id_short) if id_short != key => self.report(
                    Constraint::IdShortUnique,
                    format!("filed under `{key}` but named `{id_short}`"),
                ),
                Some(_) => {}
            }
            self.element(owner, element);
            self.leave();
        }
    }

    fn list(&mut self, owner: NodeId, items: &ListItems) {
        for (index, element) in items.iter().enumerate() {
            self.enter(index.to_string());
            if !items.element_type().matches(element.kind()) {
                self.report(
                    Constraint::ListElementType,
                    format!("{} in a list of {}", element.kind(), items.element_type()),
                );
            }
            if let Some(found) = element.value_type() {
                if items.value_type() != Some(found) {
                    self.report(
                        Constraint::ListValueType,
                        format!("{found} item in a list declared otherwise"),
                    );
                }
            }
            self.element(owner, element);
            self.leave();
        }
    }

    fn element(&mut self, parent: NodeId, element: &SubmodelElement) {
        if element.parent() != Some(parent) {
            self.report(
                Constraint::ParentConsistency,
                "element does not report its container as parent",
            );
        }
        let node = element.node();
        match element {
            SubmodelElement::SubmodelElementCollection(c) => self.named(node, c.elements()),
            SubmodelElement::Entity(e) => self.named(node, e.statements()),
            SubmodelElement::AnnotatedRelationshipElement(a) => {
                for annotation in a.annotations().iter() {
                    if !annotation.kind().is_data_element() {
                        self.report(
                            Constraint::AnnotationDataElement,
                            format!("annotation is a {}", annotation.kind()),
                        );
                    }
                }
                self.named(node, a.annotations());
            }
            SubmodelElement::SubmodelElementList(l) => self.list(node, l.items()),
            SubmodelElement::Operation(o) => {
                for (index, variable) in o.variables().iter().enumerate() {
                    self.enter(variable.id_short().map_or_else(|| index.to_string(), str::to_string));
                    if variable.id_short().is_none() {
                        self.report(Constraint::IdShortRequired, "operation variable has no id-short");
                    }
                    self.element(node, variable);
                    self.leave();
                }
            }
            SubmodelElement::Blob(b) if b.content_type.is_empty() => {
                self.report(Constraint::NonEmptyString, "blob content type is empty");
            }
            SubmodelElement::File(f) if f.content_type.is_empty() => {
                self.report(Constraint::NonEmptyString, "file content type is empty");
            }
            SubmodelElement::BasicEventElement(event) => {
                if let Some(t) = &event.last_update {
                    if !is_date_time(t) {
                        self.report(
                            Constraint::ValueTypeAgreement,
                            format!("lastUpdate `{t}` is not an xs:dateTime"),
                        );
                    }
                }
                for (field, interval) in [
                    ("minInterval", &event.min_interval),
                    ("maxInterval", &event.max_interval),
                ] {
                    if let Some(d) = interval {
                        if !is_duration(d) {
                            self.report(
                                Constraint::ValueTypeAgreement,
                                format!("{field} `{d}` is not an xs:duration"),
                            );
                        }
                    }
                }
            }
            _ => {}
        }
    }
}
