//! The Asset Administration Shell metamodel as an owned object graph.
//!
//! ## Architecture
//!
//! ```text
//! Environment
//! ├── AssetAdministrationShell ──(submodel refs)──┐
//! ├── Submodel  ◄─────────────────────────────────┘
//! │   └── NamedElements
//! │       ├── Property / Range / Blob / ...
//! │       ├── SubmodelElementCollection ── NamedElements
//! │       ├── SubmodelElementList ──────── ListItems
//! │       ├── Entity ───────────────────── NamedElements (statements)
//! │       └── Operation ────────────────── OperationVariables
//! └── ConceptDescription
//! ```
//!
//! Containers own their children. Each node has a [`NodeId`]; a child keeps
//! its container's node id as a non-owning parent link, set by `add` and
//! cleared by `remove`.
//!
//! Constructors check the invariants they can see locally and fail with a
//! [`ModelError`]. Cross-cutting checks run in [`crate::validation`].

mod containers;
mod data_spec;
mod elements;
mod environment;
mod error;
mod identifiables;
mod lang;
mod referable;
mod reference;
mod value;

pub use containers::{ListItems, NamedElements, OperationVariables, VariableGroup};
pub use data_spec::{
    DataSpecificationContent, DataSpecificationIec61360, DataTypeIec61360,
    EmbeddedDataSpecification, LevelType, ValueList, ValueReferencePair,
};
pub use elements::{
    AasSubmodelElements, AnnotatedRelationshipElement, BasicEventElement, Blob, Capability,
    Direction, ElementKind, Entity, EntityType, File, MultiLanguageProperty, Operation, Property,
    Range, ReferenceElement, RelationshipElement, StateOfEvent, SubmodelElement,
    SubmodelElementCollection, SubmodelElementList,
};
pub use environment::Environment;
pub use error::{Constraint, ModelError};
pub use identifiables::{
    AssetAdministrationShell, AssetInformation, AssetKind, ConceptDescription, Identifiable,
    IdentifiableRef, ModellingKind, Resource, SpecificAssetId, Submodel,
};
pub use lang::{LangStringSet, is_language_tag};
pub use referable::{
    AdministrativeInformation, Capabilities, ElementCommon, Extension, Identifier,
    IdentifierKind, NodeId, Qualifier, QualifierKind, ReferableData, check_id_short,
};
pub use reference::{ExternalReference, Key, KeyTypes, ModelReference, Reference, check_key_chain};
pub use value::{DataTypeDefXsd, TimeZone, Value};

pub(crate) use value::{is_date_time, is_duration};
