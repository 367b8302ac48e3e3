//! XML format support.
//!
//! Polymorphic dispatch is by element local name within the core namespace.
//! Scalars are element text; the only attributes are `idType` on `<aas:id>`
//! and `valueType` / `valueTypeListElement` on the typed elements.
//!
//! ## Structure
//!
//! ```xml
//! <aas:environment xmlns:aas="https://admin-shell.io/aas/3/0">
//!   <aas:submodels>
//!     <aas:submodel>
//!       <aas:idShort>TechnicalData</aas:idShort>
//!       <aas:id idType="IRI">https://example.com/sm/1</aas:id>
//!       <aas:submodelElements>
//!         <aas:property valueType="xs:int">
//!           <aas:idShort>MaxRpm</aas:idShort>
//!           <aas:value>5000</aas:value>
//!         </aas:property>
//!       </aas:submodelElements>
//!     </aas:submodel>
//!   </aas:submodels>
//! </aas:environment>
//! ```
//!
//! The writer emits children in schema sequence order. The reader accepts
//! them in any order, skips the access-control namespace, and reports
//! failures with an XPath-like path such as
//! `/aas:environment/aas:submodels/aas:submodel[1]/aas:id`.

use super::{CodecOptions, EnvironmentFormat, InterchangeError};
use crate::model::{Environment, Identifiable, IdentifiableRef};

/// Core metamodel namespace.
pub const NS_AAS: &str = "https://admin-shell.io/aas/3/0";
/// IEC 61360 data-specification namespace.
pub const NS_IEC61360: &str = "https://admin-shell.io/DataSpecificationIEC61360/3/0";
/// Access-control namespace. Declared on output, skipped on input.
pub const NS_ABAC: &str = "https://admin-shell.io/aas/abac/3/0";

/// XML format handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct Xml {
    pub options: CodecOptions,
}

impl Xml {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: CodecOptions) -> Self {
        Self { options }
    }
}

impl EnvironmentFormat for Xml {
    fn name(&self) -> &'static str {
        "XML"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["xml"]
    }

    fn mime_type(&self) -> &'static str {
        "application/xml"
    }

    fn read(&self, input: &[u8]) -> Result<Environment, InterchangeError> {
        let root = dom::parse(input)?;
        let mut decoder = reader::Decoder::new(&self.options);
        let env = decoder.environment(&root)?;
        tracing::debug!(
            identifiables = env.len(),
            skipped = decoder.skipped(),
            "decoded XML environment"
        );
        if self.options.validate {
            super::check_environment(&env)?;
        }
        Ok(env)
    }

    fn write(&self, env: &Environment) -> Result<Vec<u8>, InterchangeError> {
        let mut out = writer::Out::new(self.options.pretty)?;
        out.environment(env)?;
        Ok(out.finish())
    }

    fn read_identifiable(&self, input: &[u8]) -> Result<Identifiable, InterchangeError> {
        let root = dom::parse(input)?;
        let identifiable = reader::Decoder::new(&self.options).root_identifiable(&root)?;
        if self.options.validate {
            super::check_identifiable(identifiable.view())?;
        }
        Ok(identifiable)
    }

    fn write_identifiable(
        &self,
        identifiable: IdentifiableRef<'_>,
    ) -> Result<Vec<u8>, InterchangeError> {
        let mut out = writer::Out::new(self.options.pretty)?;
        out.identifiable(identifiable, writer::ROOT_NAMESPACES)?;
        Ok(out.finish())
    }

    fn validate(&self, input: &[u8]) -> Result<(), InterchangeError> {
        let content = std::str::from_utf8(input)
            .map_err(|e| InterchangeError::xml(format!("Invalid UTF-8: {e}")))?;
        if !content.trim_start().starts_with('<') {
            return Err(InterchangeError::xml("Missing XML declaration or root element"));
        }
        dom::check_well_formed(input)
    }
}

// ============================================================================
// CHILD TABLES
// ============================================================================

const REFERABLE_CHILDREN: &[&str] = &["extensions", "category", "idShort", "displayName", "description"];
const IDENTIFIABLE_CHILDREN: &[&str] = &["administration", "id"];
const SEMANTIC_CHILDREN: &[&str] = &["semanticId", "supplementalSemanticIds"];
const QUALIFIABLE_CHILDREN: &[&str] = &["qualifiers"];
const DATA_SPEC_CHILDREN: &[&str] = &["embeddedDataSpecifications"];

// ============================================================================
// DOCUMENT TREE
// ============================================================================

mod dom {
    use quick_xml::events::{BytesStart, Event};
    use quick_xml::name::{Namespace, ResolveResult};
    use quick_xml::NsReader;

    use super::{InterchangeError, NS_AAS, NS_ABAC, NS_IEC61360};

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub enum Ns {
        Core,
        Iec,
        Abac,
        Foreign,
    }

    impl Ns {
        fn classify(resolved: &ResolveResult<'_>) -> Self {
            let ResolveResult::Bound(Namespace(uri)) = resolved else {
                return Self::Foreign;
            };
            let uri = *uri;
            if uri == NS_AAS.as_bytes() {
                Self::Core
            } else if uri == NS_IEC61360.as_bytes() {
                Self::Iec
            } else if uri == NS_ABAC.as_bytes() {
                Self::Abac
            } else {
                Self::Foreign
            }
        }

        pub fn prefix(&self) -> &'static str {
            match self {
                Self::Core => "aas",
                Self::Iec => "IEC61360",
                Self::Abac => "abac",
                Self::Foreign => "?",
            }
        }
    }

    /// An element with its resolved namespace, unprefixed attributes,
    /// child elements and raw text.
    #[derive(Debug)]
    pub struct Node {
        pub ns: Ns,
        pub name: String,
        pub attributes: Vec<(String, String)>,
        pub children: Vec<Node>,
        pub text: String,
    }

    impl Node {
        /// `prefix:name`, for paths.
        pub fn qualified(&self) -> String {
            format!("{}:{}", self.ns.prefix(), self.name)
        }

        pub fn is_modelled(&self) -> bool {
            matches!(self.ns, Ns::Core | Ns::Iec)
        }

        pub fn child(&self, name: &str) -> Option<&Node> {
            self.children
                .iter()
                .find(|c| c.is_modelled() && c.name == name)
        }

        pub fn text(&self, name: &str) -> Option<String> {
            self.child(name).map(|c| c.text.clone())
        }

        pub fn attribute(&self, name: &str) -> Option<&str> {
            self.attributes
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str())
        }
    }

    fn open(ns: Ns, e: &BytesStart<'_>) -> Result<Node, InterchangeError> {
        let name = std::str::from_utf8(e.local_name().as_ref())
            .map_err(|e| InterchangeError::xml(format!("Invalid tag name: {e}")))?
            .to_string();
        let mut attributes = Vec::new();
        for attr in e.attributes() {
            let attr = attr.map_err(|e| InterchangeError::xml(format!("Attribute error: {e}")))?;
            if attr.key.as_namespace_binding().is_some() || attr.key.prefix().is_some() {
                continue;
            }
            let key = std::str::from_utf8(attr.key.local_name().as_ref())
                .map_err(|e| InterchangeError::xml(format!("Attribute key error: {e}")))?
                .to_string();
            let value = attr
                .unescape_value()
                .map_err(|e| InterchangeError::xml(format!("Attribute value error: {e}")))?
                .into_owned();
            attributes.push((key, value));
        }
        Ok(Node {
            ns,
            name,
            attributes,
            children: Vec::new(),
            text: String::new(),
        })
    }

    fn attach(stack: &mut [Node], root: &mut Option<Node>, node: Node) {
        match stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None => *root = Some(node),
        }
    }

    /// Walk the whole document without building a tree: tags must balance
    /// and there must be exactly one root element.
    pub fn check_well_formed(input: &[u8]) -> Result<(), InterchangeError> {
        let mut reader = NsReader::from_reader(input);
        let mut buf = Vec::new();
        let mut depth = 0usize;
        let mut roots = 0usize;

        loop {
            buf.clear();
            let event = match reader.read_event_into(&mut buf) {
                Ok(event) => event,
                Err(e) => {
                    return Err(InterchangeError::xml(format!(
                        "XML parse error at position {}: {e}",
                        reader.error_position()
                    )));
                }
            };
            match event {
                Event::Start(_) => {
                    if depth == 0 {
                        roots += 1;
                    }
                    depth += 1;
                }
                Event::Empty(_) if depth == 0 => roots += 1,
                Event::End(_) => {
                    depth = depth
                        .checked_sub(1)
                        .ok_or_else(|| InterchangeError::xml("Unbalanced end tag"))?;
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if depth != 0 {
            return Err(InterchangeError::xml("Unexpected end of document"));
        }
        match roots {
            0 => Err(InterchangeError::xml("Document has no root element")),
            1 => Ok(()),
            _ => Err(InterchangeError::xml("Document has more than one root element")),
        }
    }

    /// Parse a document into its root element.
    pub fn parse(input: &[u8]) -> Result<Node, InterchangeError> {
        let mut reader = NsReader::from_reader(input);
        let mut buf = Vec::new();
        let mut stack: Vec<Node> = Vec::new();
        let mut root = None;

        loop {
            buf.clear();
            let (ns, event) = match reader.read_resolved_event_into(&mut buf) {
                Ok((resolved, event)) => (Ns::classify(&resolved), event),
                Err(e) => {
                    return Err(InterchangeError::xml(format!(
                        "XML parse error at position {}: {e}",
                        reader.error_position()
                    )));
                }
            };
            match event {
                Event::Start(ref e) => stack.push(open(ns, e)?),
                Event::Empty(ref e) => {
                    let node = open(ns, e)?;
                    attach(&mut stack, &mut root, node);
                }
                Event::End(_) => {
                    let node = stack
                        .pop()
                        .ok_or_else(|| InterchangeError::xml("Unbalanced end tag"))?;
                    attach(&mut stack, &mut root, node);
                }
                Event::Text(ref t) => {
                    if let Some(top) = stack.last_mut() {
                        let text = t
                            .unescape()
                            .map_err(|e| InterchangeError::xml(format!("Text error: {e}")))?;
                        top.text.push_str(&text);
                    }
                }
                Event::CData(ref c) => {
                    if let Some(top) = stack.last_mut() {
                        let text = std::str::from_utf8(c)
                            .map_err(|e| InterchangeError::xml(format!("CDATA error: {e}")))?;
                        top.text.push_str(text);
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(InterchangeError::xml("Unexpected end of document"));
        }
        root.ok_or_else(|| InterchangeError::xml("Document has no root element"))
    }
}

// ============================================================================
// READER
// ============================================================================

mod reader {
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD as BASE64;
    use rustc_hash::FxHashMap;
    use tracing::{debug, error, warn};

    use super::dom::{Node, Ns};
    use super::*;
    use crate::interchange::UnknownFieldPolicy;
    use crate::model::{
        AasSubmodelElements, AdministrativeInformation, AnnotatedRelationshipElement,
        AssetAdministrationShell, AssetInformation, AssetKind, BasicEventElement, Blob,
        Capability, ConceptDescription, DataSpecificationContent, DataSpecificationIec61360,
        DataTypeDefXsd, DataTypeIec61360, Direction, ElementCommon, ElementKind,
        EmbeddedDataSpecification, Entity, EntityType, Extension, File, Identifier,
        IdentifierKind, Key, KeyTypes, LangStringSet, LevelType, ModelError, ModellingKind,
        MultiLanguageProperty, Operation, Property, Qualifier, QualifierKind, Range, Reference,
        ReferableData, ReferenceElement, RelationshipElement, Resource, SpecificAssetId,
        StateOfEvent, Submodel, SubmodelElement, SubmodelElementCollection, SubmodelElementList,
        ValueList, ValueReferencePair, VariableGroup,
    };

    type ElementDecoder =
        fn(&mut Decoder<'_>, &Node, Option<&str>) -> Result<SubmodelElement, InterchangeError>;

    /// Dispatch table: one decoder and one child list per concrete kind,
    /// looked up through the kind's tag.
    pub(super) const ELEMENT_DECODERS: [(ElementKind, &[&str], ElementDecoder); 14] = [
        (ElementKind::Property, &["value", "valueId"], property),
        (ElementKind::MultiLanguageProperty, &["value", "valueId"], multi_language_property),
        (ElementKind::Range, &["min", "max"], range),
        (ElementKind::Blob, &["value", "contentType"], blob),
        (ElementKind::File, &["value", "contentType"], file),
        (ElementKind::ReferenceElement, &["value"], reference_element),
        (ElementKind::RelationshipElement, &["first", "second"], relationship),
        (
            ElementKind::AnnotatedRelationshipElement,
            &["first", "second", "annotations"],
            annotated_relationship,
        ),
        (ElementKind::SubmodelElementCollection, &["value"], collection),
        (
            ElementKind::SubmodelElementList,
            &["orderRelevant", "semanticIdListElement", "typeValueListElement", "value"],
            list,
        ),
        (
            ElementKind::Operation,
            &["inputVariables", "outputVariables", "inoutputVariables"],
            operation,
        ),
        (ElementKind::Capability, &[], capability),
        (
            ElementKind::Entity,
            &["statements", "entityType", "globalAssetId", "specificAssetIds"],
            entity,
        ),
        (
            ElementKind::BasicEventElement,
            &[
                "observed",
                "direction",
                "state",
                "messageTopic",
                "messageBroker",
                "lastUpdate",
                "minInterval",
                "maxInterval",
            ],
            basic_event,
        ),
    ];

    /// Children worth visiting, each with its positional path segment.
    fn indexed(children: &[Node]) -> impl Iterator<Item = (String, &Node)> {
        let mut seen: FxHashMap<&str, usize> = FxHashMap::default();
        children
            .iter()
            .filter(|c| c.ns != Ns::Abac)
            .map(move |c| {
                let position = seen.entry(c.name.as_str()).or_insert(0);
                *position += 1;
                (format!("{}[{position}]", c.qualified()), c)
            })
    }

    fn parse_bool(text: &str) -> Option<bool> {
        match text.trim() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        }
    }

    pub(crate) struct Decoder<'o> {
        options: &'o CodecOptions,
        path: Vec<String>,
        skipped: usize,
    }

    impl<'o> Decoder<'o> {
        pub fn new(options: &'o CodecOptions) -> Self {
            Self {
                options,
                path: Vec::new(),
                skipped: 0,
            }
        }

        pub fn skipped(&self) -> usize {
            self.skipped
        }

        fn path(&self) -> String {
            format!("/{}", self.path.join("/"))
        }

        fn path_with(&self, field: &str) -> String {
            format!("{}/aas:{field}", self.path())
        }

        fn at(&self) -> impl Fn(ModelError) -> InterchangeError + '_ {
            move |e| e.at(self.path())
        }

        fn nested<T>(
            &mut self,
            segment: impl Into<String>,
            f: impl FnOnce(&mut Self) -> Result<T, InterchangeError>,
        ) -> Result<T, InterchangeError> {
            self.path.push(segment.into());
            let result = f(self);
            self.path.pop();
            result
        }

        fn unknown(&self, node: &Node) -> Result<(), InterchangeError> {
            match self.options.unknown_fields {
                UnknownFieldPolicy::Ignore => {
                    warn!(path = %self.path(), element = %node.qualified(), "ignoring unknown element");
                    Ok(())
                }
                UnknownFieldPolicy::Reject => {
                    Err(InterchangeError::unknown_field(self.path(), node.qualified()))
                }
            }
        }

        fn check_children(&self, node: &Node, known: &[&[&str]]) -> Result<(), InterchangeError> {
            for child in &node.children {
                if child.ns == Ns::Abac {
                    debug!(path = %self.path(), element = %child.name, "skipping access-control element");
                    continue;
                }
                if child.is_modelled() && known.iter().any(|group| group.contains(&child.name.as_str())) {
                    continue;
                }
                self.unknown(child)?;
            }
            Ok(())
        }

        // --------------------------------------------------------------------
        // primitives
        // --------------------------------------------------------------------

        fn required_text(&self, node: &Node, field: &str) -> Result<String, InterchangeError> {
            node.text(field)
                .ok_or_else(|| InterchangeError::missing(self.path(), field))
        }

        fn literal<T>(
            &self,
            field: &str,
            value: Option<&str>,
            parse: fn(&str) -> Option<T>,
        ) -> Result<Option<T>, InterchangeError> {
            match value {
                None => Ok(None),
                Some(name) => parse(name.trim()).map(Some).ok_or_else(|| {
                    InterchangeError::invalid(self.path(), field, format!("unknown literal `{name}`"))
                }),
            }
        }

        fn enumeration<T>(
            &self,
            node: &Node,
            field: &str,
            parse: fn(&str) -> Option<T>,
        ) -> Result<Option<T>, InterchangeError> {
            self.literal(field, node.text(field).as_deref(), parse)
        }

        fn required_enumeration<T>(
            &self,
            node: &Node,
            field: &str,
            parse: fn(&str) -> Option<T>,
        ) -> Result<T, InterchangeError> {
            self.enumeration(node, field, parse)?
                .ok_or_else(|| InterchangeError::missing(self.path(), field))
        }

        fn value_type_attribute(
            &self,
            node: &Node,
            attribute: &str,
        ) -> Result<Option<DataTypeDefXsd>, InterchangeError> {
            let field = format!("@{attribute}");
            self.literal(&field, node.attribute(attribute), DataTypeDefXsd::from_name)
        }

        fn bool(&self, node: &Node, field: &str) -> Result<Option<bool>, InterchangeError> {
            self.literal(field, node.text(field).as_deref(), parse_bool)
        }

        /// Decode the items of wrapper `field` whose tag `accept` admits.
        fn items_where<T>(
            &mut self,
            node: &Node,
            field: &str,
            accept: impl Fn(&str) -> bool,
            mut decode: impl FnMut(&mut Self, &Node) -> Result<T, InterchangeError>,
        ) -> Result<Vec<T>, InterchangeError> {
            let Some(wrapper) = node.child(field) else {
                return Ok(Vec::new());
            };
            self.nested(wrapper.qualified(), |d| {
                let mut out = Vec::new();
                for (segment, child) in indexed(&wrapper.children) {
                    if !child.is_modelled() || !accept(&child.name) {
                        d.unknown(child)?;
                        continue;
                    }
                    out.push(d.nested(segment, |d| decode(d, child))?);
                }
                Ok(out)
            })
        }

        fn items<T>(
            &mut self,
            node: &Node,
            field: &str,
            item: &str,
            decode: impl FnMut(&mut Self, &Node) -> Result<T, InterchangeError>,
        ) -> Result<Vec<T>, InterchangeError> {
            self.items_where(node, field, |name| name == item, decode)
        }

        fn lang_strings(&mut self, node: &Node, field: &str) -> Result<LangStringSet, InterchangeError> {
            let pairs = self.items_where(
                node,
                field,
                |name| name.starts_with("langString"),
                |d, entry| {
                    d.check_children(entry, &[&["language", "text"]])?;
                    Ok((
                        d.required_text(entry, "language")?,
                        d.required_text(entry, "text")?,
                    ))
                },
            )?;
            LangStringSet::from_pairs(pairs).map_err(|e| e.at(self.path_with(field)))
        }

        // --------------------------------------------------------------------
        // references
        // --------------------------------------------------------------------

        fn reference(&mut self, node: &Node) -> Result<Reference, InterchangeError> {
            self.check_children(node, &[&["type", "keys", "referredSemanticId"]])?;
            let type_name = self.required_text(node, "type")?;
            if node.child("keys").is_none() {
                return Err(InterchangeError::missing(self.path(), "keys"));
            }
            let keys = self.items(node, "keys", "key", |d, key| {
                d.check_children(key, &[&["type", "value"]])?;
                let key_type = d.required_text(key, "type")?;
                let key_type = KeyTypes::from_name(key_type.trim()).ok_or_else(|| {
                    InterchangeError::unknown_variant(d.path(), "key type", &key_type)
                })?;
                Key::new(key_type, d.required_text(key, "value")?).map_err(d.at())
            })?;
            let mut reference = Reference::from_parts(type_name.trim(), keys)
                .ok_or_else(|| InterchangeError::unknown_variant(self.path(), "reference type", &type_name))?
                .map_err(self.at())?;
            reference.set_referred_semantic_id(self.optional_reference(node, "referredSemanticId")?);
            Ok(reference)
        }

        fn optional_reference(
            &mut self,
            node: &Node,
            field: &str,
        ) -> Result<Option<Reference>, InterchangeError> {
            match node.child(field) {
                None => Ok(None),
                Some(child) => self.nested(child.qualified(), |d| d.reference(child)).map(Some),
            }
        }

        fn required_reference(&mut self, node: &Node, field: &str) -> Result<Reference, InterchangeError> {
            self.optional_reference(node, field)?
                .ok_or_else(|| InterchangeError::missing(self.path(), field))
        }

        fn references(&mut self, node: &Node, field: &str) -> Result<Vec<Reference>, InterchangeError> {
            self.items(node, field, "reference", |d, item| d.reference(item))
        }

        // --------------------------------------------------------------------
        // shared attribute groups
        // --------------------------------------------------------------------

        fn referable(&mut self, node: &Node, referable: &mut ReferableData) -> Result<(), InterchangeError> {
            referable.category = node.text("category");
            referable.display_name = self.lang_strings(node, "displayName")?;
            referable.description = self.lang_strings(node, "description")?;
            let extensions = self.items(node, "extensions", "extension", |d, item| d.extension(item))?;
            for extension in extensions {
                referable
                    .add_extension(extension)
                    .map_err(|e| e.at(self.path_with("extensions")))?;
            }
            Ok(())
        }

        fn extension(&mut self, node: &Node) -> Result<Extension, InterchangeError> {
            self.check_children(node, &[SEMANTIC_CHILDREN, &["name", "value", "refersTo"]])?;
            let value_type = self.value_type_attribute(node, "valueType")?;
            let mut extension = Extension::new(
                self.required_text(node, "name")?,
                value_type,
                node.text("value").as_deref(),
            )
            .map_err(self.at())?;
            extension.refers_to = self.references(node, "refersTo")?;
            extension.semantic_id = self.optional_reference(node, "semanticId")?;
            extension.supplemental_semantic_ids = self.references(node, "supplementalSemanticIds")?;
            Ok(extension)
        }

        fn qualifier(&mut self, node: &Node) -> Result<Qualifier, InterchangeError> {
            self.check_children(node, &[SEMANTIC_CHILDREN, &["kind", "type", "value", "valueId"]])?;
            let value_type = self
                .value_type_attribute(node, "valueType")?
                .ok_or_else(|| InterchangeError::missing(self.path(), "@valueType"))?;
            let mut qualifier = Qualifier::new(
                self.required_text(node, "type")?,
                value_type,
                node.text("value").as_deref(),
            )
            .map_err(self.at())?;
            qualifier.kind = self.enumeration(node, "kind", QualifierKind::from_name)?;
            qualifier.value_id = self.optional_reference(node, "valueId")?;
            qualifier.semantic_id = self.optional_reference(node, "semanticId")?;
            qualifier.supplemental_semantic_ids = self.references(node, "supplementalSemanticIds")?;
            Ok(qualifier)
        }

        fn element_common(&mut self, node: &Node, common: &mut ElementCommon) -> Result<(), InterchangeError> {
            self.referable(node, &mut common.referable)?;
            common.semantic_id = self.optional_reference(node, "semanticId")?;
            common.supplemental_semantic_ids = self.references(node, "supplementalSemanticIds")?;
            let qualifiers = self.items(node, "qualifiers", "qualifier", |d, item| d.qualifier(item))?;
            for qualifier in qualifiers {
                common
                    .add_qualifier(qualifier)
                    .map_err(|e| e.at(self.path_with("qualifiers")))?;
            }
            common.embedded_data_specifications = self.data_specifications(node)?;
            Ok(())
        }

        fn data_specifications(
            &mut self,
            node: &Node,
        ) -> Result<Vec<EmbeddedDataSpecification>, InterchangeError> {
            self.items(
                node,
                "embeddedDataSpecifications",
                "embeddedDataSpecification",
                |d, eds| {
                    d.check_children(eds, &[&["dataSpecification", "dataSpecificationContent"]])?;
                    let data_specification = d.required_reference(eds, "dataSpecification")?;
                    let wrapper = eds
                        .child("dataSpecificationContent")
                        .ok_or_else(|| InterchangeError::missing(d.path(), "dataSpecificationContent"))?;
                    let content = d.nested(wrapper.qualified(), |d| d.data_spec_content(wrapper))?;
                    Ok(EmbeddedDataSpecification {
                        data_specification,
                        content,
                    })
                },
            )
        }

        fn data_spec_content(
            &mut self,
            wrapper: &Node,
        ) -> Result<DataSpecificationContent, InterchangeError> {
            let mut found = None;
            for (segment, child) in indexed(&wrapper.children) {
                if child.ns == Ns::Iec && child.name == "dataSpecificationIec61360" {
                    found = Some((segment, child));
                } else {
                    return Err(InterchangeError::unknown_variant(
                        self.path(),
                        "data specification content",
                        child.qualified(),
                    ));
                }
            }
            let (segment, node) =
                found.ok_or_else(|| InterchangeError::missing(self.path(), "dataSpecificationIec61360"))?;
            self.nested(segment, |d| d.iec61360(node))
                .map(DataSpecificationContent::Iec61360)
        }

        fn iec61360(&mut self, node: &Node) -> Result<DataSpecificationIec61360, InterchangeError> {
            self.check_children(
                node,
                &[&[
                    "preferredName",
                    "shortName",
                    "unit",
                    "unitId",
                    "sourceOfDefinition",
                    "symbol",
                    "dataType",
                    "definition",
                    "valueFormat",
                    "valueList",
                    "value",
                    "levelType",
                ]],
            )?;
            let preferred_name = self.lang_strings(node, "preferredName")?;
            let mut iec = DataSpecificationIec61360::new(preferred_name)
                .map_err(|e| e.at(self.path_with("preferredName")))?;
            iec.short_name = self.lang_strings(node, "shortName")?;
            iec.unit = node.text("unit");
            iec.unit_id = self.optional_reference(node, "unitId")?;
            iec.source_of_definition = node.text("sourceOfDefinition");
            iec.symbol = node.text("symbol");
            iec.data_type = self.enumeration(node, "dataType", DataTypeIec61360::from_name)?;
            iec.definition = self.lang_strings(node, "definition")?;
            iec.value_format = node.text("valueFormat");
            iec.value = node.text("value");
            if let Some(list) = node.child("valueList") {
                iec.value_list = Some(self.nested(list.qualified(), |d| {
                    d.check_children(list, &[&["valueReferencePairs"]])?;
                    let pairs = d.items(list, "valueReferencePairs", "valueReferencePair", |d, pair| {
                        d.check_children(pair, &[&["value", "valueId"]])?;
                        Ok(ValueReferencePair {
                            value: d.required_text(pair, "value")?,
                            value_id: d.required_reference(pair, "valueId")?,
                        })
                    })?;
                    ValueList::new(pairs).map_err(d.at())
                })?);
            }
            if let Some(level) = node.child("levelType") {
                iec.level_type = Some(self.nested(level.qualified(), |d| {
                    d.check_children(level, &[&["min", "nom", "typ", "max"]])?;
                    Ok(LevelType {
                        min: d.bool(level, "min")?.unwrap_or(false),
                        nom: d.bool(level, "nom")?.unwrap_or(false),
                        typ: d.bool(level, "typ")?.unwrap_or(false),
                        max: d.bool(level, "max")?.unwrap_or(false),
                    })
                })?);
            }
            Ok(iec)
        }

        fn administration(
            &mut self,
            node: &Node,
        ) -> Result<Option<AdministrativeInformation>, InterchangeError> {
            let Some(admin) = node.child("administration") else {
                return Ok(None);
            };
            self.nested(admin.qualified(), |d| {
                d.check_children(
                    admin,
                    &[DATA_SPEC_CHILDREN, &["version", "revision", "creator", "templateId"]],
                )?;
                let mut info = AdministrativeInformation::new(
                    admin.text("version").as_deref(),
                    admin.text("revision").as_deref(),
                )
                .map_err(d.at())?;
                info.creator = d.optional_reference(admin, "creator")?;
                info.template_id = admin.text("templateId");
                info.embedded_data_specifications = d.data_specifications(admin)?;
                Ok(Some(info))
            })
        }

        fn identifier(&self, node: &Node) -> Result<Identifier, InterchangeError> {
            let id = node
                .child("id")
                .ok_or_else(|| InterchangeError::missing(self.path(), "id"))?;
            let kind = self
                .literal("@idType", id.attribute("idType"), IdentifierKind::from_name)?
                .unwrap_or_default();
            Identifier::new(id.text.clone(), kind).map_err(|e| e.at(self.path_with("id")))
        }

        fn specific_asset_ids(&mut self, node: &Node) -> Result<Vec<SpecificAssetId>, InterchangeError> {
            self.items(node, "specificAssetIds", "specificAssetId", |d, entry| {
                d.check_children(entry, &[SEMANTIC_CHILDREN, &["name", "value", "externalSubjectId"]])?;
                let mut id = SpecificAssetId::new(
                    d.required_text(entry, "name")?,
                    d.required_text(entry, "value")?,
                )
                .map_err(d.at())?;
                id.external_subject_id = d.optional_reference(entry, "externalSubjectId")?;
                id.semantic_id = d.optional_reference(entry, "semanticId")?;
                id.supplemental_semantic_ids = d.references(entry, "supplementalSemanticIds")?;
                Ok(id)
            })
        }

        // --------------------------------------------------------------------
        // elements
        // --------------------------------------------------------------------

        pub(super) fn element(&mut self, node: &Node) -> Result<SubmodelElement, InterchangeError> {
            let (_, children, decode) = Some(node)
                .filter(|n| n.ns == Ns::Core)
                .and_then(|n| ElementKind::from_xml_tag(&n.name))
                .and_then(|kind| ELEMENT_DECODERS.iter().find(|(k, _, _)| *k == kind))
                .copied()
                .ok_or_else(|| {
                    InterchangeError::unknown_variant(self.path(), "submodel element", node.qualified())
                })?;
            self.check_children(
                node,
                &[
                    REFERABLE_CHILDREN,
                    SEMANTIC_CHILDREN,
                    QUALIFIABLE_CHILDREN,
                    DATA_SPEC_CHILDREN,
                    children,
                ],
            )?;
            let id_short = node.text("idShort");
            let mut element = decode(self, node, id_short.as_deref())?;
            self.element_common(node, element.common_mut())?;
            Ok(element)
        }

        /// Decode the elements under wrapper `field`, handing each to `add`.
        /// In failsafe mode broken items are logged and skipped.
        fn elements(
            &mut self,
            node: &Node,
            field: &str,
            mut add: impl FnMut(SubmodelElement) -> Result<(), ModelError>,
        ) -> Result<(), InterchangeError> {
            let Some(wrapper) = node.child(field) else {
                return Ok(());
            };
            self.nested(wrapper.qualified(), |d| {
                for (segment, item) in indexed(&wrapper.children) {
                    d.nested(segment, |d| {
                        let result = d
                            .element(item)
                            .and_then(|element| add(element).map_err(d.at()));
                        match result {
                            Err(err) if d.options.failsafe => {
                                error!(path = %d.path(), error = %err, "skipping submodel element");
                                d.skipped += 1;
                                Ok(())
                            }
                            other => other,
                        }
                    })?;
                }
                Ok(())
            })
        }

        // --------------------------------------------------------------------
        // identifiables
        // --------------------------------------------------------------------

        pub fn environment(&mut self, root: &Node) -> Result<Environment, InterchangeError> {
            if root.ns != Ns::Core || root.name != "environment" {
                return Err(InterchangeError::unknown_variant("/", "root element", root.qualified()));
            }
            self.nested(root.qualified(), |d| {
                d.check_children(
                    root,
                    &[&["assetAdministrationShells", "submodels", "conceptDescriptions"]],
                )?;
                let mut env = Environment::new();
                for field in ["assetAdministrationShells", "submodels", "conceptDescriptions"] {
                    let Some(wrapper) = root.child(field) else {
                        continue;
                    };
                    d.nested(wrapper.qualified(), |d| {
                        for (segment, item) in indexed(&wrapper.children) {
                            d.nested(segment, |d| {
                                let result = d
                                    .identifiable(item)
                                    .and_then(|i| env.insert(i).map_err(d.at()));
                                match result {
                                    Err(err) if d.options.failsafe => {
                                        error!(path = %d.path(), error = %err, "skipping identifiable");
                                        d.skipped += 1;
                                        Ok(())
                                    }
                                    other => other,
                                }
                            })?;
                        }
                        Ok(())
                    })?;
                }
                Ok(env)
            })
        }

        pub fn root_identifiable(&mut self, root: &Node) -> Result<Identifiable, InterchangeError> {
            self.nested(root.qualified(), |d| d.identifiable(root))
        }

        fn identifiable(&mut self, node: &Node) -> Result<Identifiable, InterchangeError> {
            match (node.ns, node.name.as_str()) {
                (Ns::Core, "assetAdministrationShell") => self.shell(node).map(Identifiable::Shell),
                (Ns::Core, "submodel") => self.submodel(node).map(Identifiable::Submodel),
                (Ns::Core, "conceptDescription") => {
                    self.concept_description(node).map(Identifiable::ConceptDescription)
                }
                _ => Err(InterchangeError::unknown_variant(self.path(), "identifiable", node.qualified())),
            }
        }

        fn shell(&mut self, node: &Node) -> Result<AssetAdministrationShell, InterchangeError> {
            self.check_children(
                node,
                &[
                    REFERABLE_CHILDREN,
                    IDENTIFIABLE_CHILDREN,
                    DATA_SPEC_CHILDREN,
                    &["derivedFrom", "assetInformation", "submodels"],
                ],
            )?;
            let identifier = self.identifier(node)?;
            let info = node
                .child("assetInformation")
                .ok_or_else(|| InterchangeError::missing(self.path(), "assetInformation"))?;
            let asset_information = self.nested(info.qualified(), |d| d.asset_information(info))?;
            let id_short = node.text("idShort");
            let mut shell = AssetAdministrationShell::new(identifier, id_short.as_deref(), asset_information)
                .map_err(self.at())?;
            self.referable(node, &mut shell.referable)?;
            shell.administration = self.administration(node)?;
            shell.embedded_data_specifications = self.data_specifications(node)?;
            shell.derived_from = self.optional_reference(node, "derivedFrom")?;
            for reference in self.references(node, "submodels")? {
                shell
                    .add_submodel(reference)
                    .map_err(|e| e.at(self.path_with("submodels")))?;
            }
            Ok(shell)
        }

        fn asset_information(&mut self, node: &Node) -> Result<AssetInformation, InterchangeError> {
            self.check_children(
                node,
                &[&[
                    "assetKind",
                    "globalAssetId",
                    "specificAssetIds",
                    "assetType",
                    "defaultThumbnail",
                ]],
            )?;
            let asset_kind = self.required_enumeration(node, "assetKind", AssetKind::from_name)?;
            let specific = self.specific_asset_ids(node)?;
            let mut info = AssetInformation::new(
                asset_kind,
                node.text("globalAssetId").as_deref(),
                specific,
            )
            .map_err(self.at())?;
            info.asset_type = node.text("assetType");
            if let Some(thumb) = node.child("defaultThumbnail") {
                info.default_thumbnail = Some(self.nested(thumb.qualified(), |d| {
                    d.check_children(thumb, &[&["path", "contentType"]])?;
                    Ok(Resource {
                        path: d.required_text(thumb, "path")?,
                        content_type: thumb.text("contentType"),
                    })
                })?);
            }
            Ok(info)
        }

        fn submodel(&mut self, node: &Node) -> Result<Submodel, InterchangeError> {
            self.check_children(
                node,
                &[
                    REFERABLE_CHILDREN,
                    IDENTIFIABLE_CHILDREN,
                    SEMANTIC_CHILDREN,
                    QUALIFIABLE_CHILDREN,
                    DATA_SPEC_CHILDREN,
                    &["kind", "submodelElements"],
                ],
            )?;
            let identifier = self.identifier(node)?;
            let id_short = node.text("idShort");
            let mut submodel = Submodel::new(identifier, id_short.as_deref()).map_err(self.at())?;
            self.element_common(node, &mut submodel.common)?;
            submodel.administration = self.administration(node)?;
            submodel.kind = self.enumeration(node, "kind", ModellingKind::from_name)?;
            let elements = submodel.elements_mut();
            self.elements(node, "submodelElements", |e| elements.add(e))?;
            Ok(submodel)
        }

        fn concept_description(&mut self, node: &Node) -> Result<ConceptDescription, InterchangeError> {
            self.check_children(
                node,
                &[REFERABLE_CHILDREN, IDENTIFIABLE_CHILDREN, DATA_SPEC_CHILDREN, &["isCaseOf"]],
            )?;
            let identifier = self.identifier(node)?;
            let id_short = node.text("idShort");
            let mut cd = ConceptDescription::new(identifier, id_short.as_deref()).map_err(self.at())?;
            self.referable(node, &mut cd.referable)?;
            cd.administration = self.administration(node)?;
            cd.embedded_data_specifications = self.data_specifications(node)?;
            cd.is_case_of = self.references(node, "isCaseOf")?;
            Ok(cd)
        }
    }

    // ------------------------------------------------------------------------
    // per-kind decoders
    // ------------------------------------------------------------------------

    fn required_value_type(d: &Decoder<'_>, node: &Node) -> Result<DataTypeDefXsd, InterchangeError> {
        d.value_type_attribute(node, "valueType")?
            .ok_or_else(|| InterchangeError::missing(d.path(), "@valueType"))
    }

    fn property(d: &mut Decoder<'_>, node: &Node, id_short: Option<&str>) -> Result<SubmodelElement, InterchangeError> {
        let value_type = required_value_type(d, node)?;
        let mut property = Property::new(id_short, value_type, node.text("value").as_deref())
            .map_err(|e| e.at(d.path_with("value")))?;
        property.value_id = d.optional_reference(node, "valueId")?;
        Ok(property.into())
    }

    fn multi_language_property(
        d: &mut Decoder<'_>,
        node: &Node,
        id_short: Option<&str>,
    ) -> Result<SubmodelElement, InterchangeError> {
        let value = d.lang_strings(node, "value")?;
        let mut mlp = MultiLanguageProperty::new(id_short, value).map_err(d.at())?;
        mlp.value_id = d.optional_reference(node, "valueId")?;
        Ok(mlp.into())
    }

    fn range(d: &mut Decoder<'_>, node: &Node, id_short: Option<&str>) -> Result<SubmodelElement, InterchangeError> {
        let value_type = required_value_type(d, node)?;
        Range::new(
            id_short,
            value_type,
            node.text("min").as_deref(),
            node.text("max").as_deref(),
        )
        .map(Into::into)
        .map_err(d.at())
    }

    fn blob(d: &mut Decoder<'_>, node: &Node, id_short: Option<&str>) -> Result<SubmodelElement, InterchangeError> {
        let content_type = d.required_text(node, "contentType")?;
        let value = node
            .text("value")
            .map(|encoded| {
                let compact: String = encoded.split_whitespace().collect();
                BASE64
                    .decode(compact.as_bytes())
                    .map_err(|e| InterchangeError::invalid(d.path(), "value", e.to_string()))
            })
            .transpose()?;
        Blob::new(id_short, content_type, value)
            .map(Into::into)
            .map_err(d.at())
    }

    fn file(d: &mut Decoder<'_>, node: &Node, id_short: Option<&str>) -> Result<SubmodelElement, InterchangeError> {
        let content_type = d.required_text(node, "contentType")?;
        File::new(id_short, content_type, node.text("value").as_deref())
            .map(Into::into)
            .map_err(d.at())
    }

    fn reference_element(
        d: &mut Decoder<'_>,
        node: &Node,
        id_short: Option<&str>,
    ) -> Result<SubmodelElement, InterchangeError> {
        let value = d.optional_reference(node, "value")?;
        ReferenceElement::new(id_short, value)
            .map(Into::into)
            .map_err(d.at())
    }

    fn relationship(
        d: &mut Decoder<'_>,
        node: &Node,
        id_short: Option<&str>,
    ) -> Result<SubmodelElement, InterchangeError> {
        let first = d.required_reference(node, "first")?;
        let second = d.required_reference(node, "second")?;
        RelationshipElement::new(id_short, first, second)
            .map(Into::into)
            .map_err(d.at())
    }

    fn annotated_relationship(
        d: &mut Decoder<'_>,
        node: &Node,
        id_short: Option<&str>,
    ) -> Result<SubmodelElement, InterchangeError> {
        let first = d.required_reference(node, "first")?;
        let second = d.required_reference(node, "second")?;
        let mut rel = AnnotatedRelationshipElement::new(id_short, first, second).map_err(d.at())?;
        let annotations = rel.annotations_mut();
        d.elements(node, "annotations", |e| annotations.add(e))?;
        Ok(rel.into())
    }

    fn collection(
        d: &mut Decoder<'_>,
        node: &Node,
        id_short: Option<&str>,
    ) -> Result<SubmodelElement, InterchangeError> {
        let mut collection = SubmodelElementCollection::new(id_short).map_err(d.at())?;
        let elements = collection.elements_mut();
        d.elements(node, "value", |e| elements.add(e))?;
        Ok(collection.into())
    }

    fn list(d: &mut Decoder<'_>, node: &Node, id_short: Option<&str>) -> Result<SubmodelElement, InterchangeError> {
        let element_type =
            d.required_enumeration(node, "typeValueListElement", AasSubmodelElements::from_name)?;
        let value_type = d.value_type_attribute(node, "valueTypeListElement")?;
        let mut list = SubmodelElementList::new(id_short, element_type, value_type).map_err(d.at())?;
        list.order_relevant = d.bool(node, "orderRelevant")?.unwrap_or(true);
        list.semantic_id_list_element = d.optional_reference(node, "semanticIdListElement")?;
        let items = list.items_mut();
        d.elements(node, "value", |e| items.push(e))?;
        Ok(list.into())
    }

    fn operation(
        d: &mut Decoder<'_>,
        node: &Node,
        id_short: Option<&str>,
    ) -> Result<SubmodelElement, InterchangeError> {
        let mut operation = Operation::new(id_short).map_err(d.at())?;
        for (group, field) in [
            (VariableGroup::Input, "inputVariables"),
            (VariableGroup::Output, "outputVariables"),
            (VariableGroup::InOutput, "inoutputVariables"),
        ] {
            let variables = d.items(node, field, "operationVariable", |d, variable| {
                d.check_children(variable, &[&["value"]])?;
                let wrapper = variable
                    .child("value")
                    .ok_or_else(|| InterchangeError::missing(d.path(), "value"))?;
                d.nested(wrapper.qualified(), |d| {
                    let mut elements = indexed(&wrapper.children);
                    let (segment, element) = elements
                        .next()
                        .ok_or_else(|| InterchangeError::missing(d.path(), "submodel element"))?;
                    if let Some((_, extra)) = elements.next() {
                        d.unknown(extra)?;
                    }
                    d.nested(segment, |d| d.element(element))
                })
            })?;
            for variable in variables {
                operation
                    .variables_mut()
                    .add(group, variable)
                    .map_err(|e| e.at(d.path_with(field)))?;
            }
        }
        Ok(operation.into())
    }

    fn capability(
        d: &mut Decoder<'_>,
        _node: &Node,
        id_short: Option<&str>,
    ) -> Result<SubmodelElement, InterchangeError> {
        Capability::new(id_short).map(Into::into).map_err(d.at())
    }

    fn entity(d: &mut Decoder<'_>, node: &Node, id_short: Option<&str>) -> Result<SubmodelElement, InterchangeError> {
        let entity_type = d.required_enumeration(node, "entityType", EntityType::from_name)?;
        let specific = d.specific_asset_ids(node)?;
        let mut entity = Entity::new(
            id_short,
            entity_type,
            node.text("globalAssetId").as_deref(),
            specific,
        )
        .map_err(d.at())?;
        let statements = entity.statements_mut();
        d.elements(node, "statements", |e| statements.add(e))?;
        Ok(entity.into())
    }

    fn basic_event(
        d: &mut Decoder<'_>,
        node: &Node,
        id_short: Option<&str>,
    ) -> Result<SubmodelElement, InterchangeError> {
        let observed = d.required_reference(node, "observed")?;
        let direction = d.required_enumeration(node, "direction", Direction::from_name)?;
        let state = d.required_enumeration(node, "state", StateOfEvent::from_name)?;
        let mut event =
            BasicEventElement::new(id_short, observed, direction, state).map_err(d.at())?;
        event.message_topic = node.text("messageTopic");
        event.message_broker = d.optional_reference(node, "messageBroker")?;
        event.last_update = node.text("lastUpdate");
        event.min_interval = node.text("minInterval");
        event.max_interval = node.text("maxInterval");
        Ok(event.into())
    }
}

// ============================================================================
// WRITER
// ============================================================================

mod writer {
    use std::io::Cursor;

    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD as BASE64;
    use quick_xml::Writer;
    use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

    use super::*;
    use crate::model::{
        AdministrativeInformation, AssetAdministrationShell, AssetInformation,
        ConceptDescription, DataSpecificationContent, ElementCommon, EmbeddedDataSpecification,
        Extension, Identifier, LangStringSet, Qualifier, Reference, ReferableData,
        SpecificAssetId, Submodel, SubmodelElement, VariableGroup,
    };

    type Attributes<'a> = &'a [(&'a str, &'a str)];

    pub const ROOT_NAMESPACES: Attributes<'static> = &[
        ("xmlns:aas", NS_AAS),
        ("xmlns:IEC61360", NS_IEC61360),
        ("xmlns:abac", NS_ABAC),
    ];

    fn write_error(e: impl std::fmt::Display) -> InterchangeError {
        InterchangeError::xml(format!("Write error: {e}"))
    }

    /// Output document with schema-ordered helpers.
    pub struct Out {
        writer: Writer<Cursor<Vec<u8>>>,
    }

    impl Out {
        pub fn new(pretty: bool) -> Result<Self, InterchangeError> {
            let buffer = Cursor::new(Vec::new());
            let writer = if pretty {
                Writer::new_with_indent(buffer, b' ', 2)
            } else {
                Writer::new(buffer)
            };
            let mut out = Self { writer };
            out.event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
            Ok(out)
        }

        pub fn finish(self) -> Vec<u8> {
            let mut output = self.writer.into_inner().into_inner();
            output.push(b'\n');
            output
        }

        fn event(&mut self, event: Event<'_>) -> Result<(), InterchangeError> {
            self.writer.write_event(event).map_err(write_error)
        }

        fn open(&mut self, tag: &str, attributes: Attributes<'_>) -> Result<(), InterchangeError> {
            let mut start = BytesStart::new(tag);
            for attribute in attributes {
                start.push_attribute(*attribute);
            }
            self.event(Event::Start(start))
        }

        fn close(&mut self, tag: &str) -> Result<(), InterchangeError> {
            self.event(Event::End(BytesEnd::new(tag)))
        }

        fn leaf_with(&mut self, tag: &str, attributes: Attributes<'_>, text: &str) -> Result<(), InterchangeError> {
            if text.is_empty() {
                let mut start = BytesStart::new(tag);
                for attribute in attributes {
                    start.push_attribute(*attribute);
                }
                return self.event(Event::Empty(start));
            }
            self.open(tag, attributes)?;
            self.event(Event::Text(BytesText::new(text)))?;
            self.close(tag)
        }

        fn leaf(&mut self, tag: &str, text: &str) -> Result<(), InterchangeError> {
            self.leaf_with(tag, &[], text)
        }

        fn opt_leaf(&mut self, tag: &str, text: Option<&str>) -> Result<(), InterchangeError> {
            match text {
                Some(text) => self.leaf(tag, text),
                None => Ok(()),
            }
        }

        /// Wrapper element around `items`, omitted when there are none.
        fn list<T>(
            &mut self,
            tag: &str,
            items: &[T],
            mut each: impl FnMut(&mut Self, &T) -> Result<(), InterchangeError>,
        ) -> Result<(), InterchangeError> {
            if items.is_empty() {
                return Ok(());
            }
            self.open(tag, &[])?;
            for item in items {
                each(self, item)?;
            }
            self.close(tag)
        }

        fn reference(&mut self, tag: &str, reference: &Reference) -> Result<(), InterchangeError> {
            self.open(tag, &[])?;
            self.leaf("aas:type", reference.type_name())?;
            self.opt_reference("aas:referredSemanticId", reference.referred_semantic_id())?;
            self.list("aas:keys", &reference.keys(), |out, key| {
                out.open("aas:key", &[])?;
                out.leaf("aas:type", key.key_type().as_str())?;
                out.leaf("aas:value", key.value())?;
                out.close("aas:key")
            })?;
            self.close(tag)
        }

        fn opt_reference(&mut self, tag: &str, reference: Option<&Reference>) -> Result<(), InterchangeError> {
            match reference {
                Some(reference) => self.reference(tag, reference),
                None => Ok(()),
            }
        }

        fn references(&mut self, tag: &str, references: &[Reference]) -> Result<(), InterchangeError> {
            self.list(tag, references, |out, r| out.reference("aas:reference", r))
        }

        fn lang_strings(&mut self, tag: &str, item: &str, set: &LangStringSet) -> Result<(), InterchangeError> {
            if set.is_empty() {
                return Ok(());
            }
            self.open(tag, &[])?;
            for (language, text) in set.iter() {
                self.open(item, &[])?;
                self.leaf("aas:language", language)?;
                self.leaf("aas:text", text)?;
                self.close(item)?;
            }
            self.close(tag)
        }

        // --------------------------------------------------------------------
        // attribute groups
        // --------------------------------------------------------------------

        fn referable(&mut self, referable: &ReferableData) -> Result<(), InterchangeError> {
            self.list("aas:extensions", referable.extensions(), Self::extension)?;
            self.opt_leaf("aas:category", referable.category.as_deref())?;
            self.opt_leaf("aas:idShort", referable.id_short())?;
            self.lang_strings("aas:displayName", "aas:langStringNameType", &referable.display_name)?;
            self.lang_strings("aas:description", "aas:langStringTextType", &referable.description)
        }

        fn extension(&mut self, extension: &Extension) -> Result<(), InterchangeError> {
            match extension.value_type() {
                Some(t) => self.open("aas:extension", &[("valueType", t.as_str())])?,
                None => self.open("aas:extension", &[])?,
            }
            self.opt_reference("aas:semanticId", extension.semantic_id.as_ref())?;
            self.references("aas:supplementalSemanticIds", &extension.supplemental_semantic_ids)?;
            self.leaf("aas:name", extension.name())?;
            self.opt_leaf("aas:value", extension.value().map(|v| v.render()).as_deref())?;
            self.references("aas:refersTo", &extension.refers_to)?;
            self.close("aas:extension")
        }

        fn qualifier(&mut self, qualifier: &Qualifier) -> Result<(), InterchangeError> {
            self.open("aas:qualifier", &[("valueType", qualifier.value_type().as_str())])?;
            self.opt_reference("aas:semanticId", qualifier.semantic_id.as_ref())?;
            self.references("aas:supplementalSemanticIds", &qualifier.supplemental_semantic_ids)?;
            self.opt_leaf("aas:kind", qualifier.kind.map(|k| k.as_str()))?;
            self.leaf("aas:type", qualifier.qualifier_type())?;
            self.opt_leaf("aas:value", qualifier.value().map(|v| v.render()).as_deref())?;
            self.opt_reference("aas:valueId", qualifier.value_id.as_ref())?;
            self.close("aas:qualifier")
        }

        fn semantics(&mut self, common: &ElementCommon) -> Result<(), InterchangeError> {
            self.opt_reference("aas:semanticId", common.semantic_id.as_ref())?;
            self.references("aas:supplementalSemanticIds", &common.supplemental_semantic_ids)?;
            self.list("aas:qualifiers", common.qualifiers(), Self::qualifier)?;
            self.data_specifications(&common.embedded_data_specifications)
        }

        fn data_specifications(&mut self, specs: &[EmbeddedDataSpecification]) -> Result<(), InterchangeError> {
            self.list("aas:embeddedDataSpecifications", specs, |out, eds| {
                out.open("aas:embeddedDataSpecification", &[])?;
                out.reference("aas:dataSpecification", &eds.data_specification)?;
                out.open("aas:dataSpecificationContent", &[])?;
                out.data_spec_content(&eds.content)?;
                out.close("aas:dataSpecificationContent")?;
                out.close("aas:embeddedDataSpecification")
            })
        }

        fn data_spec_content(&mut self, content: &DataSpecificationContent) -> Result<(), InterchangeError> {
            let DataSpecificationContent::Iec61360(iec) = content;
            self.open("IEC61360:dataSpecificationIec61360", &[])?;
            self.lang_strings(
                "IEC61360:preferredName",
                "IEC61360:langStringPreferredNameTypeIec61360",
                iec.preferred_name(),
            )?;
            self.lang_strings(
                "IEC61360:shortName",
                "IEC61360:langStringShortNameTypeIec61360",
                &iec.short_name,
            )?;
            self.opt_leaf("IEC61360:unit", iec.unit.as_deref())?;
            self.opt_reference("IEC61360:unitId", iec.unit_id.as_ref())?;
            self.opt_leaf("IEC61360:sourceOfDefinition", iec.source_of_definition.as_deref())?;
            self.opt_leaf("IEC61360:symbol", iec.symbol.as_deref())?;
            self.opt_leaf("IEC61360:dataType", iec.data_type.map(|t| t.as_str()))?;
            self.lang_strings(
                "IEC61360:definition",
                "IEC61360:langStringDefinitionTypeIec61360",
                &iec.definition,
            )?;
            self.opt_leaf("IEC61360:valueFormat", iec.value_format.as_deref())?;
            if let Some(list) = &iec.value_list {
                self.open("IEC61360:valueList", &[])?;
                self.list("IEC61360:valueReferencePairs", list.pairs(), |out, pair| {
                    out.open("IEC61360:valueReferencePair", &[])?;
                    out.leaf("IEC61360:value", &pair.value)?;
                    out.reference("IEC61360:valueId", &pair.value_id)?;
                    out.close("IEC61360:valueReferencePair")
                })?;
                self.close("IEC61360:valueList")?;
            }
            self.opt_leaf("IEC61360:value", iec.value.as_deref())?;
            if let Some(level) = &iec.level_type {
                self.open("IEC61360:levelType", &[])?;
                for (tag, set) in [
                    ("IEC61360:min", level.min),
                    ("IEC61360:nom", level.nom),
                    ("IEC61360:typ", level.typ),
                    ("IEC61360:max", level.max),
                ] {
                    self.leaf(tag, if set { "true" } else { "false" })?;
                }
                self.close("IEC61360:levelType")?;
            }
            self.close("IEC61360:dataSpecificationIec61360")
        }

        fn identification(
            &mut self,
            identifier: &Identifier,
            admin: Option<&AdministrativeInformation>,
        ) -> Result<(), InterchangeError> {
            if let Some(admin) = admin {
                self.open("aas:administration", &[])?;
                self.data_specifications(&admin.embedded_data_specifications)?;
                self.opt_leaf("aas:version", admin.version())?;
                self.opt_leaf("aas:revision", admin.revision())?;
                self.opt_reference("aas:creator", admin.creator.as_ref())?;
                self.opt_leaf("aas:templateId", admin.template_id.as_deref())?;
                self.close("aas:administration")?;
            }
            self.leaf_with("aas:id", &[("idType", identifier.kind().as_str())], identifier.id())
        }

        fn specific_asset_ids(&mut self, ids: &[SpecificAssetId]) -> Result<(), InterchangeError> {
            self.list("aas:specificAssetIds", ids, |out, id| {
                out.open("aas:specificAssetId", &[])?;
                out.opt_reference("aas:semanticId", id.semantic_id.as_ref())?;
                out.references("aas:supplementalSemanticIds", &id.supplemental_semantic_ids)?;
                out.leaf("aas:name", id.name())?;
                out.leaf("aas:value", id.value())?;
                out.opt_reference("aas:externalSubjectId", id.external_subject_id.as_ref())?;
                out.close("aas:specificAssetId")
            })
        }

        // --------------------------------------------------------------------
        // identifiables
        // --------------------------------------------------------------------

        pub fn environment(&mut self, env: &Environment) -> Result<(), InterchangeError> {
            self.open("aas:environment", ROOT_NAMESPACES)?;
            let shells: Vec<_> = env.shells().collect();
            self.list("aas:assetAdministrationShells", &shells, |out, s| out.shell(s, &[]))?;
            let submodels: Vec<_> = env.submodels().collect();
            self.list("aas:submodels", &submodels, |out, s| out.submodel(s, &[]))?;
            let cds: Vec<_> = env.concept_descriptions().collect();
            self.list("aas:conceptDescriptions", &cds, |out, c| out.concept_description(c, &[]))?;
            self.close("aas:environment")
        }

        pub fn identifiable(
            &mut self,
            identifiable: IdentifiableRef<'_>,
            attributes: Attributes<'_>,
        ) -> Result<(), InterchangeError> {
            match identifiable {
                IdentifiableRef::Shell(s) => self.shell(s, attributes),
                IdentifiableRef::Submodel(s) => self.submodel(s, attributes),
                IdentifiableRef::ConceptDescription(c) => self.concept_description(c, attributes),
            }
        }

        fn shell(&mut self, shell: &AssetAdministrationShell, attributes: Attributes<'_>) -> Result<(), InterchangeError> {
            self.open("aas:assetAdministrationShell", attributes)?;
            self.referable(&shell.referable)?;
            self.identification(shell.identifier(), shell.administration.as_ref())?;
            self.data_specifications(&shell.embedded_data_specifications)?;
            self.opt_reference("aas:derivedFrom", shell.derived_from.as_ref())?;
            self.asset_information(&shell.asset_information)?;
            self.references("aas:submodels", shell.submodels())?;
            self.close("aas:assetAdministrationShell")
        }

        fn asset_information(&mut self, info: &AssetInformation) -> Result<(), InterchangeError> {
            self.open("aas:assetInformation", &[])?;
            self.leaf("aas:assetKind", info.asset_kind.as_str())?;
            self.opt_leaf("aas:globalAssetId", info.global_asset_id())?;
            self.specific_asset_ids(info.specific_asset_ids())?;
            self.opt_leaf("aas:assetType", info.asset_type.as_deref())?;
            if let Some(thumb) = &info.default_thumbnail {
                self.open("aas:defaultThumbnail", &[])?;
                self.leaf("aas:path", &thumb.path)?;
                self.opt_leaf("aas:contentType", thumb.content_type.as_deref())?;
                self.close("aas:defaultThumbnail")?;
            }
            self.close("aas:assetInformation")
        }

        fn submodel(&mut self, submodel: &Submodel, attributes: Attributes<'_>) -> Result<(), InterchangeError> {
            self.open("aas:submodel", attributes)?;
            self.referable(&submodel.common.referable)?;
            self.identification(submodel.identifier(), submodel.administration.as_ref())?;
            self.opt_leaf("aas:kind", submodel.kind.map(|k| k.as_str()))?;
            self.semantics(&submodel.common)?;
            self.elements("aas:submodelElements", submodel.elements().iter())?;
            self.close("aas:submodel")
        }

        fn concept_description(&mut self, cd: &ConceptDescription, attributes: Attributes<'_>) -> Result<(), InterchangeError> {
            self.open("aas:conceptDescription", attributes)?;
            self.referable(&cd.referable)?;
            self.identification(cd.identifier(), cd.administration.as_ref())?;
            self.data_specifications(&cd.embedded_data_specifications)?;
            self.references("aas:isCaseOf", &cd.is_case_of)?;
            self.close("aas:conceptDescription")
        }

        // --------------------------------------------------------------------
        // elements
        // --------------------------------------------------------------------

        fn elements<'e>(
            &mut self,
            tag: &str,
            elements: impl Iterator<Item = &'e SubmodelElement>,
        ) -> Result<(), InterchangeError> {
            let mut elements = elements.peekable();
            if elements.peek().is_none() {
                return Ok(());
            }
            self.open(tag, &[])?;
            for element in elements {
                self.element(element)?;
            }
            self.close(tag)
        }

        pub(super) fn element(&mut self, element: &SubmodelElement) -> Result<(), InterchangeError> {
            let tag = format!("aas:{}", element.kind().xml_tag());
            let value_type = match element {
                SubmodelElement::Property(p) => Some(("valueType", p.value_type().as_str())),
                SubmodelElement::Range(r) => Some(("valueType", r.value_type().as_str())),
                SubmodelElement::SubmodelElementList(l) => {
                    l.value_type().map(|t| ("valueTypeListElement", t.as_str()))
                }
                _ => None,
            };
            match value_type {
                Some(attribute) => self.open(&tag, &[attribute])?,
                None => self.open(&tag, &[])?,
            }
            self.referable(&element.common().referable)?;
            self.semantics(element.common())?;
            match element {
                SubmodelElement::Property(p) => {
                    self.opt_leaf("aas:value", p.value().map(|v| v.render()).as_deref())?;
                    self.opt_reference("aas:valueId", p.value_id.as_ref())?;
                }
                SubmodelElement::MultiLanguageProperty(m) => {
                    self.lang_strings("aas:value", "aas:langStringTextType", &m.value)?;
                    self.opt_reference("aas:valueId", m.value_id.as_ref())?;
                }
                SubmodelElement::Range(r) => {
                    self.opt_leaf("aas:min", r.min().map(|v| v.render()).as_deref())?;
                    self.opt_leaf("aas:max", r.max().map(|v| v.render()).as_deref())?;
                }
                SubmodelElement::Blob(b) => {
                    self.opt_leaf("aas:value", b.value().map(|v| BASE64.encode(v)).as_deref())?;
                    self.leaf("aas:contentType", &b.content_type)?;
                }
                SubmodelElement::File(f) => {
                    self.opt_leaf("aas:value", f.value.as_deref())?;
                    self.leaf("aas:contentType", &f.content_type)?;
                }
                SubmodelElement::ReferenceElement(r) => {
                    self.opt_reference("aas:value", r.value.as_ref())?;
                }
                SubmodelElement::RelationshipElement(r) => {
                    self.reference("aas:first", &r.first)?;
                    self.reference("aas:second", &r.second)?;
                }
                SubmodelElement::AnnotatedRelationshipElement(r) => {
                    self.reference("aas:first", &r.first)?;
                    self.reference("aas:second", &r.second)?;
                    self.elements("aas:annotations", r.annotations().iter())?;
                }
                SubmodelElement::SubmodelElementCollection(c) => {
                    self.elements("aas:value", c.elements().iter())?;
                }
                SubmodelElement::SubmodelElementList(l) => {
                    self.leaf("aas:orderRelevant", if l.order_relevant { "true" } else { "false" })?;
                    self.opt_reference("aas:semanticIdListElement", l.semantic_id_list_element.as_ref())?;
                    self.leaf("aas:typeValueListElement", l.element_type().as_str())?;
                    self.elements("aas:value", l.items().iter())?;
                }
                SubmodelElement::Operation(o) => {
                    for (group, wrapper) in [
                        (VariableGroup::Input, "aas:inputVariables"),
                        (VariableGroup::Output, "aas:outputVariables"),
                        (VariableGroup::InOutput, "aas:inoutputVariables"),
                    ] {
                        self.list(wrapper, o.variables().group(group), |out, variable| {
                            out.open("aas:operationVariable", &[])?;
                            out.open("aas:value", &[])?;
                            out.element(variable)?;
                            out.close("aas:value")?;
                            out.close("aas:operationVariable")
                        })?;
                    }
                }
                SubmodelElement::Capability(_) => {}
                SubmodelElement::Entity(e) => {
                    self.elements("aas:statements", e.statements().iter())?;
                    self.leaf("aas:entityType", e.entity_type().as_str())?;
                    self.opt_leaf("aas:globalAssetId", e.global_asset_id())?;
                    self.specific_asset_ids(e.specific_asset_ids())?;
                }
                SubmodelElement::BasicEventElement(e) => {
                    self.reference("aas:observed", e.observed())?;
                    self.leaf("aas:direction", e.direction.as_str())?;
                    self.leaf("aas:state", e.state.as_str())?;
                    self.opt_leaf("aas:messageTopic", e.message_topic.as_deref())?;
                    self.opt_reference("aas:messageBroker", e.message_broker.as_ref())?;
                    self.opt_leaf("aas:lastUpdate", e.last_update.as_deref())?;
                    self.opt_leaf("aas:minInterval", e.min_interval.as_deref())?;
                    self.opt_leaf("aas:maxInterval", e.max_interval.as_deref())?;
                }
            }
            self.close(&tag)
        }
    }
}
