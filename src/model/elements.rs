//! The submodel element variants.
//!
//! [`SubmodelElement`] is a closed sum over the fourteen concrete element
//! kinds. Codec dispatch, resolution and validation all match on it
//! exhaustively, so adding a variant is a compile error until every layer
//! handles it.

use std::sync::Arc;

use super::containers::{ListItems, NamedElements, OperationVariables};
use super::error::{Constraint, ModelError};
use super::identifiables::SpecificAssetId;
use super::lang::LangStringSet;
use super::reference::{KeyTypes, Reference};
use super::referable::{Capabilities, ElementCommon, NodeId};
use super::value::{DataTypeDefXsd, Value};

// ============================================================================
// KINDS
// ============================================================================

/// Concrete submodel element kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Property,
    MultiLanguageProperty,
    Range,
    Blob,
    File,
    ReferenceElement,
    RelationshipElement,
    AnnotatedRelationshipElement,
    SubmodelElementCollection,
    SubmodelElementList,
    Operation,
    Capability,
    Entity,
    BasicEventElement,
}

impl ElementKind {
    pub const ALL: [Self; 14] = [
        Self::Property,
        Self::MultiLanguageProperty,
        Self::Range,
        Self::Blob,
        Self::File,
        Self::ReferenceElement,
        Self::RelationshipElement,
        Self::AnnotatedRelationshipElement,
        Self::SubmodelElementCollection,
        Self::SubmodelElementList,
        Self::Operation,
        Self::Capability,
        Self::Entity,
        Self::BasicEventElement,
    ];

    /// The JSON `modelType` discriminator.
    pub fn model_type(&self) -> &'static str {
        self.key_type().as_str()
    }

    pub fn from_model_type(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.model_type() == name)
    }

    /// The XML element local name.
    pub fn xml_tag(&self) -> &'static str {
        match self {
            Self::Property => "property",
            Self::MultiLanguageProperty => "multiLanguageProperty",
            Self::Range => "range",
            Self::Blob => "blob",
            Self::File => "file",
            Self::ReferenceElement => "referenceElement",
            Self::RelationshipElement => "relationshipElement",
            Self::AnnotatedRelationshipElement => "annotatedRelationshipElement",
            Self::SubmodelElementCollection => "submodelElementCollection",
            Self::SubmodelElementList => "submodelElementList",
            Self::Operation => "operation",
            Self::Capability => "capability",
            Self::Entity => "entity",
            Self::BasicEventElement => "basicEventElement",
        }
    }

    pub fn from_xml_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.xml_tag() == tag)
    }

    /// The key type naming exactly this kind.
    pub fn key_type(&self) -> KeyTypes {
        match self {
            Self::Property => KeyTypes::Property,
            Self::MultiLanguageProperty => KeyTypes::MultiLanguageProperty,
            Self::Range => KeyTypes::Range,
            Self::Blob => KeyTypes::Blob,
            Self::File => KeyTypes::File,
            Self::ReferenceElement => KeyTypes::ReferenceElement,
            Self::RelationshipElement => KeyTypes::RelationshipElement,
            Self::AnnotatedRelationshipElement => KeyTypes::AnnotatedRelationshipElement,
            Self::SubmodelElementCollection => KeyTypes::SubmodelElementCollection,
            Self::SubmodelElementList => KeyTypes::SubmodelElementList,
            Self::Operation => KeyTypes::Operation,
            Self::Capability => KeyTypes::Capability,
            Self::Entity => KeyTypes::Entity,
            Self::BasicEventElement => KeyTypes::BasicEventElement,
        }
    }

    pub fn is_data_element(&self) -> bool {
        matches!(
            self,
            Self::Property
                | Self::MultiLanguageProperty
                | Self::Range
                | Self::Blob
                | Self::File
                | Self::ReferenceElement
        )
    }

    /// Returns true if a key of type `key` may address a node of this kind.
    pub fn answers_to(&self, key: KeyTypes) -> bool {
        match key {
            KeyTypes::SubmodelElement | KeyTypes::Referable => true,
            KeyTypes::DataElement => self.is_data_element(),
            KeyTypes::EventElement => *self == Self::BasicEventElement,
            KeyTypes::RelationshipElement => matches!(
                self,
                Self::RelationshipElement | Self::AnnotatedRelationshipElement
            ),
            other => self.key_type() == other,
        }
    }
}

impl std::fmt::Display for ElementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.model_type())
    }
}

/// Element types a list may declare, including the abstract ones.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AasSubmodelElements {
    AnnotatedRelationshipElement,
    BasicEventElement,
    Blob,
    Capability,
    DataElement,
    Entity,
    EventElement,
    File,
    MultiLanguageProperty,
    Operation,
    Property,
    Range,
    ReferenceElement,
    RelationshipElement,
    SubmodelElement,
    SubmodelElementCollection,
    SubmodelElementList,
}

impl AasSubmodelElements {
    pub const ALL: [Self; 17] = [
        Self::AnnotatedRelationshipElement,
        Self::BasicEventElement,
        Self::Blob,
        Self::Capability,
        Self::DataElement,
        Self::Entity,
        Self::EventElement,
        Self::File,
        Self::MultiLanguageProperty,
        Self::Operation,
        Self::Property,
        Self::Range,
        Self::ReferenceElement,
        Self::RelationshipElement,
        Self::SubmodelElement,
        Self::SubmodelElementCollection,
        Self::SubmodelElementList,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AnnotatedRelationshipElement => "AnnotatedRelationshipElement",
            Self::BasicEventElement => "BasicEventElement",
            Self::Blob => "Blob",
            Self::Capability => "Capability",
            Self::DataElement => "DataElement",
            Self::Entity => "Entity",
            Self::EventElement => "EventElement",
            Self::File => "File",
            Self::MultiLanguageProperty => "MultiLanguageProperty",
            Self::Operation => "Operation",
            Self::Property => "Property",
            Self::Range => "Range",
            Self::ReferenceElement => "ReferenceElement",
            Self::RelationshipElement => "RelationshipElement",
            Self::SubmodelElement => "SubmodelElement",
            Self::SubmodelElementCollection => "SubmodelElementCollection",
            Self::SubmodelElementList => "SubmodelElementList",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }

    /// Returns true if an item of `kind` is admitted by this declared type.
    pub fn matches(&self, kind: ElementKind) -> bool {
        let key = match KeyTypes::from_name(self.as_str()) {
            Some(key) => key,
            None => return false,
        };
        kind.answers_to(key)
    }
}

impl std::fmt::Display for AasSubmodelElements {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityType {
    CoManagedEntity,
    SelfManagedEntity,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CoManagedEntity => "CoManagedEntity",
            Self::SelfManagedEntity => "SelfManagedEntity",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "CoManagedEntity" => Some(Self::CoManagedEntity),
            "SelfManagedEntity" => Some(Self::SelfManagedEntity),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Input,
    Output,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Output => "output",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "input" => Some(Self::Input),
            "output" => Some(Self::Output),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StateOfEvent {
    On,
    Off,
}

impl StateOfEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::On => "on",
            Self::Off => "off",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "on" => Some(Self::On),
            "off" => Some(Self::Off),
            _ => None,
        }
    }
}

// ============================================================================
// DATA ELEMENTS
// ============================================================================

/// A single typed value.
#[derive(Clone, Debug, PartialEq)]
pub struct Property {
    pub common: ElementCommon,
    value_type: DataTypeDefXsd,
    value: Option<Value>,
    pub value_id: Option<Reference>,
}

impl Property {
    pub fn new<'a>(
        id_short: impl Into<Option<&'a str>>,
        value_type: DataTypeDefXsd,
        value: Option<&str>,
    ) -> Result<Self, ModelError> {
        Ok(Self {
            common: ElementCommon::new(id_short.into())?,
            value_type,
            value: value.map(|v| Value::parse(value_type, v)).transpose()?,
            value_id: None,
        })
    }

    pub fn value_type(&self) -> DataTypeDefXsd {
        self.value_type
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn set_value(&mut self, value: Option<Value>) -> Result<(), ModelError> {
        check_conforms(self.value_type, value.as_ref())?;
        self.value = value;
        Ok(())
    }
}

fn check_conforms(value_type: DataTypeDefXsd, value: Option<&Value>) -> Result<(), ModelError> {
    match value {
        Some(v) if !v.conforms_to(value_type) => Err(ModelError::mismatch(value_type, v.render())),
        _ => Ok(()),
    }
}

/// Text in several languages.
#[derive(Clone, Debug, PartialEq)]
pub struct MultiLanguageProperty {
    pub common: ElementCommon,
    pub value: LangStringSet,
    pub value_id: Option<Reference>,
}

impl MultiLanguageProperty {
    pub fn new<'a>(
        id_short: impl Into<Option<&'a str>>,
        value: LangStringSet,
    ) -> Result<Self, ModelError> {
        Ok(Self {
            common: ElementCommon::new(id_short.into())?,
            value,
            value_id: None,
        })
    }
}

/// A typed interval; either bound may be open.
#[derive(Clone, Debug, PartialEq)]
pub struct Range {
    pub common: ElementCommon,
    value_type: DataTypeDefXsd,
    min: Option<Value>,
    max: Option<Value>,
}

impl Range {
    pub fn new<'a>(
        id_short: impl Into<Option<&'a str>>,
        value_type: DataTypeDefXsd,
        min: Option<&str>,
        max: Option<&str>,
    ) -> Result<Self, ModelError> {
        let parse = |v: &str| Value::parse(value_type, v);
        Ok(Self {
            common: ElementCommon::new(id_short.into())?,
            value_type,
            min: min.map(parse).transpose()?,
            max: max.map(parse).transpose()?,
        })
    }

    pub fn value_type(&self) -> DataTypeDefXsd {
        self.value_type
    }

    pub fn min(&self) -> Option<&Value> {
        self.min.as_ref()
    }

    pub fn max(&self) -> Option<&Value> {
        self.max.as_ref()
    }

    pub fn set_bounds(&mut self, min: Option<Value>, max: Option<Value>) -> Result<(), ModelError> {
        check_conforms(self.value_type, min.as_ref())?;
        check_conforms(self.value_type, max.as_ref())?;
        self.min = min;
        self.max = max;
        Ok(())
    }
}

/// Binary payload. The bytes are shared, never copied by traversal.
#[derive(Clone, Debug, PartialEq)]
pub struct Blob {
    pub common: ElementCommon,
    pub content_type: String,
    value: Option<Arc<[u8]>>,
}

impl Blob {
    pub fn new<'a>(
        id_short: impl Into<Option<&'a str>>,
        content_type: impl Into<String>,
        value: Option<Vec<u8>>,
    ) -> Result<Self, ModelError> {
        Ok(Self {
            common: ElementCommon::new(id_short.into())?,
            content_type: content_type.into(),
            value: value.map(Arc::from),
        })
    }

    pub fn value(&self) -> Option<&[u8]> {
        self.value.as_deref()
    }

    /// The payload handle, for callers that keep it beyond the graph.
    pub fn shared_value(&self) -> Option<Arc<[u8]>> {
        self.value.clone()
    }

    pub fn set_value(&mut self, value: Option<Vec<u8>>) {
        self.value = value.map(Arc::from);
    }
}

/// Path or URI of an external file.
#[derive(Clone, Debug, PartialEq)]
pub struct File {
    pub common: ElementCommon,
    pub content_type: String,
    pub value: Option<String>,
}

impl File {
    pub fn new<'a>(
        id_short: impl Into<Option<&'a str>>,
        content_type: impl Into<String>,
        value: Option<&str>,
    ) -> Result<Self, ModelError> {
        Ok(Self {
            common: ElementCommon::new(id_short.into())?,
            content_type: content_type.into(),
            value: value.map(str::to_string),
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReferenceElement {
    pub common: ElementCommon,
    pub value: Option<Reference>,
}

impl ReferenceElement {
    pub fn new<'a>(
        id_short: impl Into<Option<&'a str>>,
        value: Option<Reference>,
    ) -> Result<Self, ModelError> {
        Ok(Self {
            common: ElementCommon::new(id_short.into())?,
            value,
        })
    }
}

// ============================================================================
// STRUCTURED ELEMENTS
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
pub struct RelationshipElement {
    pub common: ElementCommon,
    pub first: Reference,
    pub second: Reference,
}

impl RelationshipElement {
    pub fn new<'a>(
        id_short: impl Into<Option<&'a str>>,
        first: Reference,
        second: Reference,
    ) -> Result<Self, ModelError> {
        Ok(Self {
            common: ElementCommon::new(id_short.into())?,
            first,
            second,
        })
    }
}

/// A relationship annotated with data elements.
#[derive(Clone, Debug, PartialEq)]
pub struct AnnotatedRelationshipElement {
    pub common: ElementCommon,
    pub first: Reference,
    pub second: Reference,
    annotations: NamedElements,
}

impl AnnotatedRelationshipElement {
    pub fn new<'a>(
        id_short: impl Into<Option<&'a str>>,
        first: Reference,
        second: Reference,
    ) -> Result<Self, ModelError> {
        let common = ElementCommon::new(id_short.into())?;
        let annotations = NamedElements::data_elements(common.referable.node());
        Ok(Self {
            common,
            first,
            second,
            annotations,
        })
    }

    pub fn annotations(&self) -> &NamedElements {
        &self.annotations
    }

    pub fn annotations_mut(&mut self) -> &mut NamedElements {
        &mut self.annotations
    }
}

/// Unordered named children.
#[derive(Clone, Debug, PartialEq)]
pub struct SubmodelElementCollection {
    pub common: ElementCommon,
    elements: NamedElements,
}

impl SubmodelElementCollection {
    pub fn new<'a>(id_short: impl Into<Option<&'a str>>) -> Result<Self, ModelError> {
        let common = ElementCommon::new(id_short.into())?;
        let elements = NamedElements::new(common.referable.node());
        Ok(Self { common, elements })
    }

    pub fn elements(&self) -> &NamedElements {
        &self.elements
    }

    pub fn elements_mut(&mut self) -> &mut NamedElements {
        &mut self.elements
    }
}

/// Ordered, homogeneously typed children.
#[derive(Clone, Debug, PartialEq)]
pub struct SubmodelElementList {
    pub common: ElementCommon,
    pub order_relevant: bool,
    pub semantic_id_list_element: Option<Reference>,
    items: ListItems,
}

impl SubmodelElementList {
    pub fn new<'a>(
        id_short: impl Into<Option<&'a str>>,
        element_type: AasSubmodelElements,
        value_type: Option<DataTypeDefXsd>,
    ) -> Result<Self, ModelError> {
        let common = ElementCommon::new(id_short.into())?;
        let items = ListItems::new(common.referable.node(), element_type, value_type);
        Ok(Self {
            common,
            order_relevant: true,
            semantic_id_list_element: None,
            items,
        })
    }

    pub fn element_type(&self) -> AasSubmodelElements {
        self.items.element_type()
    }

    pub fn value_type(&self) -> Option<DataTypeDefXsd> {
        self.items.value_type()
    }

    pub fn items(&self) -> &ListItems {
        &self.items
    }

    pub fn items_mut(&mut self) -> &mut ListItems {
        &mut self.items
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Operation {
    pub common: ElementCommon,
    variables: OperationVariables,
}

impl Operation {
    pub fn new<'a>(id_short: impl Into<Option<&'a str>>) -> Result<Self, ModelError> {
        let common = ElementCommon::new(id_short.into())?;
        let variables = OperationVariables::new(common.referable.node());
        Ok(Self { common, variables })
    }

    pub fn variables(&self) -> &OperationVariables {
        &self.variables
    }

    pub fn variables_mut(&mut self) -> &mut OperationVariables {
        &mut self.variables
    }
}

/// Marker element with no payload.
#[derive(Clone, Debug, PartialEq)]
pub struct Capability {
    pub common: ElementCommon,
}

impl Capability {
    pub fn new<'a>(id_short: impl Into<Option<&'a str>>) -> Result<Self, ModelError> {
        Ok(Self {
            common: ElementCommon::new(id_short.into())?,
        })
    }
}

/// A self- or co-managed asset with statements about it.
#[derive(Clone, Debug, PartialEq)]
pub struct Entity {
    pub common: ElementCommon,
    entity_type: EntityType,
    global_asset_id: Option<String>,
    specific_asset_ids: Vec<SpecificAssetId>,
    statements: NamedElements,
}

impl Entity {
    /// Self-managed entities need an asset id; co-managed ones must not carry one.
    pub fn new<'a>(
        id_short: impl Into<Option<&'a str>>,
        entity_type: EntityType,
        global_asset_id: Option<&str>,
        specific_asset_ids: Vec<SpecificAssetId>,
    ) -> Result<Self, ModelError> {
        check_entity_asset_ids(entity_type, global_asset_id, &specific_asset_ids)?;
        let common = ElementCommon::new(id_short.into())?;
        let statements = NamedElements::new(common.referable.node());
        Ok(Self {
            common,
            entity_type,
            global_asset_id: global_asset_id.map(str::to_string),
            specific_asset_ids,
            statements,
        })
    }

    pub fn entity_type(&self) -> EntityType {
        self.entity_type
    }

    pub fn global_asset_id(&self) -> Option<&str> {
        self.global_asset_id.as_deref()
    }

    pub fn specific_asset_ids(&self) -> &[SpecificAssetId] {
        &self.specific_asset_ids
    }

    pub fn statements(&self) -> &NamedElements {
        &self.statements
    }

    pub fn statements_mut(&mut self) -> &mut NamedElements {
        &mut self.statements
    }
}

pub(crate) fn check_entity_asset_ids(
    entity_type: EntityType,
    global_asset_id: Option<&str>,
    specific_asset_ids: &[SpecificAssetId],
) -> Result<(), ModelError> {
    let has_asset = global_asset_id.is_some() || !specific_asset_ids.is_empty();
    match (entity_type, has_asset) {
        (EntityType::SelfManagedEntity, false) => Err(ModelError::violation(
            Constraint::EntityAssetId,
            "self-managed entity needs a global or specific asset id",
        )),
        (EntityType::CoManagedEntity, true) => Err(ModelError::violation(
            Constraint::EntityAssetId,
            "co-managed entity cannot carry asset ids",
        )),
        _ => Ok(()),
    }
}

/// An event source observing a model element.
#[derive(Clone, Debug, PartialEq)]
pub struct BasicEventElement {
    pub common: ElementCommon,
    observed: Reference,
    pub direction: Direction,
    pub state: StateOfEvent,
    pub message_topic: Option<String>,
    pub message_broker: Option<Reference>,
    /// `xs:dateTime`
    pub last_update: Option<String>,
    /// `xs:duration`
    pub min_interval: Option<String>,
    /// `xs:duration`
    pub max_interval: Option<String>,
}

impl BasicEventElement {
    pub fn new<'a>(
        id_short: impl Into<Option<&'a str>>,
        observed: Reference,
        direction: Direction,
        state: StateOfEvent,
    ) -> Result<Self, ModelError> {
        if observed.as_model().is_none() {
            return Err(ModelError::violation(
                Constraint::EventObservedReference,
                "observed must be a model reference",
            ));
        }
        Ok(Self {
            common: ElementCommon::new(id_short.into())?,
            observed,
            direction,
            state,
            message_topic: None,
            message_broker: None,
            last_update: None,
            min_interval: None,
            max_interval: None,
        })
    }

    pub fn observed(&self) -> &Reference {
        &self.observed
    }
}

// ============================================================================
// SUM TYPE
// ============================================================================

/// Any submodel element.
#[derive(Clone, Debug, PartialEq)]
pub enum SubmodelElement {
    Property(Property),
    MultiLanguageProperty(MultiLanguageProperty),
    Range(Range),
    Blob(Blob),
    File(File),
    ReferenceElement(ReferenceElement),
    RelationshipElement(RelationshipElement),
    AnnotatedRelationshipElement(AnnotatedRelationshipElement),
    SubmodelElementCollection(SubmodelElementCollection),
    SubmodelElementList(SubmodelElementList),
    Operation(Operation),
    Capability(Capability),
    Entity(Entity),
    BasicEventElement(BasicEventElement),
}

macro_rules! each_variant {
    ($value:expr, $e:ident => $body:expr) => {
        match $value {
            SubmodelElement::Property($e) => $body,
            SubmodelElement::MultiLanguageProperty($e) => $body,
            SubmodelElement::Range($e) => $body,
            SubmodelElement::Blob($e) => $body,
            SubmodelElement::File($e) => $body,
            SubmodelElement::ReferenceElement($e) => $body,
            SubmodelElement::RelationshipElement($e) => $body,
            SubmodelElement::AnnotatedRelationshipElement($e) => $body,
            SubmodelElement::SubmodelElementCollection($e) => $body,
            SubmodelElement::SubmodelElementList($e) => $body,
            SubmodelElement::Operation($e) => $body,
            SubmodelElement::Capability($e) => $body,
            SubmodelElement::Entity($e) => $body,
            SubmodelElement::BasicEventElement($e) => $body,
        }
    };
}

macro_rules! impl_from_variant {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for SubmodelElement {
                fn from(e: $variant) -> Self {
                    Self::$variant(e)
                }
            }
        )*
    };
}

impl_from_variant!(
    Property,
    MultiLanguageProperty,
    Range,
    Blob,
    File,
    ReferenceElement,
    RelationshipElement,
    AnnotatedRelationshipElement,
    SubmodelElementCollection,
    SubmodelElementList,
    Operation,
    Capability,
    Entity,
    BasicEventElement,
);

impl SubmodelElement {
    pub fn kind(&self) -> ElementKind {
        match self {
            Self::Property(_) => ElementKind::Property,
            Self::MultiLanguageProperty(_) => ElementKind::MultiLanguageProperty,
            Self::Range(_) => ElementKind::Range,
            Self::Blob(_) => ElementKind::Blob,
            Self::File(_) => ElementKind::File,
            Self::ReferenceElement(_) => ElementKind::ReferenceElement,
            Self::RelationshipElement(_) => ElementKind::RelationshipElement,
            Self::AnnotatedRelationshipElement(_) => ElementKind::AnnotatedRelationshipElement,
            Self::SubmodelElementCollection(_) => ElementKind::SubmodelElementCollection,
            Self::SubmodelElementList(_) => ElementKind::SubmodelElementList,
            Self::Operation(_) => ElementKind::Operation,
            Self::Capability(_) => ElementKind::Capability,
            Self::Entity(_) => ElementKind::Entity,
            Self::BasicEventElement(_) => ElementKind::BasicEventElement,
        }
    }

    pub fn common(&self) -> &ElementCommon {
        each_variant!(self, e => &e.common)
    }

    pub fn common_mut(&mut self) -> &mut ElementCommon {
        each_variant!(self, e => &mut e.common)
    }

    pub fn id_short(&self) -> Option<&str> {
        self.common().id_short()
    }

    pub fn node(&self) -> NodeId {
        self.common().referable.node()
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.common().referable.parent()
    }

    pub(crate) fn set_parent(&mut self, parent: Option<NodeId>) {
        self.common_mut().referable.set_parent(parent);
    }

    /// Every element kind carries all optional capabilities.
    pub fn capabilities(&self) -> Capabilities {
        Capabilities::ALL
    }

    /// Declared value type of properties and ranges.
    pub fn value_type(&self) -> Option<DataTypeDefXsd> {
        match self {
            Self::Property(p) => Some(p.value_type()),
            Self::Range(r) => Some(r.value_type()),
            _ => None,
        }
    }

    /// Look up a direct child the way a reference key addresses it: by
    /// id-short in named containers and operation variables, by decimal
    /// index in lists.
    pub fn child(&self, key: &str) -> Option<&SubmodelElement> {
        match self {
            Self::Operation(o) => o.variables().find(key).map(|(_, element)| element),
            Self::SubmodelElementCollection(c) => c.elements().get(key),
            Self::Entity(e) => e.statements().get(key),
            Self::AnnotatedRelationshipElement(a) => a.annotations().get(key),
            Self::SubmodelElementList(l) => key.parse::<usize>().ok().and_then(|i| l.items().get(i)),
            _ => None,
        }
    }

    /// Direct children, including operation variables.
    pub fn children(&self) -> Box<dyn Iterator<Item = &SubmodelElement> + '_> {
        match self {
            Self::SubmodelElementCollection(c) => Box::new(c.elements().iter()),
            Self::Entity(e) => Box::new(e.statements().iter()),
            Self::AnnotatedRelationshipElement(a) => Box::new(a.annotations().iter()),
            Self::SubmodelElementList(l) => Box::new(l.items().iter()),
            Self::Operation(o) => Box::new(o.variables().iter()),
            _ => Box::new(std::iter::empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::reference::Key;

    fn prop(id_short: &str) -> SubmodelElement {
        Property::new(id_short, DataTypeDefXsd::String, Some("x"))
            .unwrap()
            .into()
    }

    #[test]
    fn test_collection_rejects_duplicate_id_short() {
        let mut coll = SubmodelElementCollection::new("c").unwrap();
        coll.elements_mut().add(prop("a")).unwrap();
        let err = coll.elements_mut().add(prop("a")).unwrap_err();
        assert_eq!(err.constraint(), Some(Constraint::IdShortUnique));
    }

    #[test]
    fn test_list_accepts_duplicate_id_short() {
        let mut list =
            SubmodelElementList::new("l", AasSubmodelElements::Property, Some(DataTypeDefXsd::String))
                .unwrap();
        list.items_mut().push(prop("a")).unwrap();
        list.items_mut().push(prop("a")).unwrap();
        assert_eq!(list.items().len(), 2);
    }

    #[test]
    fn test_list_enforces_homogeneity() {
        let mut list =
            SubmodelElementList::new("l", AasSubmodelElements::Property, Some(DataTypeDefXsd::Int))
                .unwrap();
        let err = list.items_mut().push(prop("a")).unwrap_err();
        assert_eq!(err.constraint(), Some(Constraint::ListValueType));

        let cap: SubmodelElement = Capability::new("c").unwrap().into();
        let err = list.items_mut().push(cap).unwrap_err();
        assert_eq!(err.constraint(), Some(Constraint::ListElementType));
    }

    #[test]
    fn test_list_insert_past_end_is_an_index_error() {
        let mut list =
            SubmodelElementList::new("l", AasSubmodelElements::Property, Some(DataTypeDefXsd::String))
                .unwrap();
        list.items_mut().insert(0, prop("a")).unwrap();
        list.items_mut().insert(1, prop("c")).unwrap();
        list.items_mut().insert(1, prop("b")).unwrap();

        let err = list.items_mut().insert(4, prop("d")).unwrap_err();
        assert_eq!(err, ModelError::IndexOutOfBounds { index: 4, len: 3 });
        assert_eq!(err.constraint(), None);
        let id_shorts: Vec<_> = list.items().iter().filter_map(|e| e.id_short()).collect();
        assert_eq!(id_shorts, ["a", "b", "c"]);
    }

    #[test]
    fn test_add_and_remove_maintain_parent() {
        let mut coll = SubmodelElementCollection::new("c").unwrap();
        let owner = coll.common.referable.node();
        coll.elements_mut().add(prop("a")).unwrap();
        assert_eq!(coll.elements().get("a").unwrap().parent(), Some(owner));
        let removed = coll.elements_mut().remove("a").unwrap();
        assert_eq!(removed.parent(), None);
    }

    #[test]
    fn test_annotations_must_be_data_elements() {
        let r = Reference::external("urn:x").unwrap();
        let mut rel = AnnotatedRelationshipElement::new("rel", r.clone(), r).unwrap();
        rel.annotations_mut().add(prop("note")).unwrap();
        let cap: SubmodelElement = Capability::new("c").unwrap().into();
        let err = rel.annotations_mut().add(cap).unwrap_err();
        assert_eq!(err.constraint(), Some(Constraint::AnnotationDataElement));
    }

    #[test]
    fn test_operation_variables_unique_across_groups() {
        use crate::model::containers::VariableGroup;
        let mut op = Operation::new("run").unwrap();
        op.variables_mut().add(VariableGroup::Input, prop("speed")).unwrap();
        let err = op
            .variables_mut()
            .add(VariableGroup::Output, prop("speed"))
            .unwrap_err();
        assert_eq!(err.constraint(), Some(Constraint::IdShortUnique));
    }

    #[test]
    fn test_entity_asset_ids() {
        assert!(Entity::new("e", EntityType::SelfManagedEntity, None, vec![]).is_err());
        assert!(Entity::new("e", EntityType::CoManagedEntity, Some("urn:a"), vec![]).is_err());
        assert!(Entity::new("e", EntityType::SelfManagedEntity, Some("urn:a"), vec![]).is_ok());
    }

    #[test]
    fn test_event_observes_model_reference() {
        let ext = Reference::external("urn:x").unwrap();
        assert!(BasicEventElement::new("ev", ext, Direction::Output, StateOfEvent::On).is_err());
        let model = Reference::model(vec![Key::new(KeyTypes::Submodel, "urn:sm").unwrap()]).unwrap();
        assert!(BasicEventElement::new("ev", model, Direction::Output, StateOfEvent::On).is_ok());
    }

    #[test]
    fn test_kind_tables_are_consistent() {
        for kind in ElementKind::ALL {
            assert_eq!(ElementKind::from_model_type(kind.model_type()), Some(kind));
            assert_eq!(ElementKind::from_xml_tag(kind.xml_tag()), Some(kind));
        }
        assert!(AasSubmodelElements::DataElement.matches(ElementKind::Blob));
        assert!(!AasSubmodelElements::DataElement.matches(ElementKind::Entity));
        assert!(AasSubmodelElements::RelationshipElement.matches(ElementKind::AnnotatedRelationshipElement));
    }
}
