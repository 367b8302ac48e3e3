//! JSON format support.
//!
//! Every polymorphic object carries a `modelType` discriminator; references
//! are `{type, keys}` objects; typed values travel as their canonical
//! lexical string next to a `valueType` tag.
//!
//! ## Structure
//!
//! ```json
//! {
//!   "submodels": [{
//!     "modelType": "Submodel",
//!     "id": "https://example.com/sm/1",
//!     "idType": "IRI",
//!     "idShort": "TechnicalData",
//!     "submodelElements": [
//!       { "modelType": "Property", "idShort": "MaxRpm",
//!         "valueType": "xs:int", "value": "5000" }
//!     ]
//!   }]
//! }
//! ```
//!
//! Paths in decode errors are slash-delimited: field names, then the
//! id-short of an array item when it has one, its index otherwise.

use super::{CodecOptions, EnvironmentFormat, InterchangeError};
use crate::model::{Environment, Identifiable, IdentifiableRef};

/// JSON format handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct Json {
    pub options: CodecOptions,
}

impl Json {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: CodecOptions) -> Self {
        Self { options }
    }
}

impl EnvironmentFormat for Json {
    fn name(&self) -> &'static str {
        "JSON"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["json"]
    }

    fn mime_type(&self) -> &'static str {
        "application/json"
    }

    fn read(&self, input: &[u8]) -> Result<Environment, InterchangeError> {
        let env = reader::read_environment(input, &self.options)?;
        if self.options.validate {
            super::check_environment(&env)?;
        }
        Ok(env)
    }

    fn write(&self, env: &Environment) -> Result<Vec<u8>, InterchangeError> {
        writer::finish(writer::environment(env), self.options.pretty)
    }

    fn read_identifiable(&self, input: &[u8]) -> Result<Identifiable, InterchangeError> {
        let identifiable = reader::read_identifiable(input, &self.options)?;
        if self.options.validate {
            super::check_identifiable(identifiable.view())?;
        }
        Ok(identifiable)
    }

    fn write_identifiable(
        &self,
        identifiable: IdentifiableRef<'_>,
    ) -> Result<Vec<u8>, InterchangeError> {
        writer::finish(writer::identifiable(identifiable), self.options.pretty)
    }

    fn validate(&self, input: &[u8]) -> Result<(), InterchangeError> {
        let content = std::str::from_utf8(input)
            .map_err(|e| InterchangeError::json(format!("Invalid UTF-8: {e}")))?;
        if !content.trim_start().starts_with('{') {
            return Err(InterchangeError::json("Expected a JSON object"));
        }
        serde_json::from_str::<serde::de::IgnoredAny>(content)
            .map(|_| ())
            .map_err(|e| InterchangeError::json(format!("Parse error: {e}")))
    }
}

// ============================================================================
// FIELD TABLES
// ============================================================================

const REFERABLE_FIELDS: &[&str] = &[
    "modelType",
    "idShort",
    "category",
    "displayName",
    "description",
    "extensions",
];
const SEMANTIC_FIELDS: &[&str] = &["semanticId", "supplementalSemanticIds"];
const QUALIFIABLE_FIELDS: &[&str] = &["qualifiers"];
const DATA_SPEC_FIELDS: &[&str] = &["embeddedDataSpecifications"];
const IDENTIFIABLE_FIELDS: &[&str] = &["id", "idType", "administration"];

// ============================================================================
// READER
// ============================================================================

mod reader {
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD as BASE64;
    use serde_json::{Map, Value as JsonValue};
    use tracing::{debug, error, warn};

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

    type Object = Map<String, JsonValue>;

    type ElementDecoder =
        fn(&mut Decoder<'_>, &Object, Option<&str>) -> Result<SubmodelElement, InterchangeError>;

    /// Dispatch table: one decoder and one field list per concrete kind.
    pub(super) const ELEMENT_DECODERS: [(ElementKind, &[&str], ElementDecoder); 14] = [
        (ElementKind::Property, &["valueType", "value", "valueId"], property),
        (ElementKind::MultiLanguageProperty, &["value", "valueId"], multi_language_property),
        (ElementKind::Range, &["valueType", "min", "max"], range),
        (ElementKind::Blob, &["contentType", "value"], blob),
        (ElementKind::File, &["contentType", "value"], file),
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
            &[
                "orderRelevant",
                "semanticIdListElement",
                "typeValueListElement",
                "valueTypeListElement",
                "value",
            ],
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
            &["entityType", "globalAssetId", "specificAssetIds", "statements"],
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

    pub fn read_environment(
        input: &[u8],
        options: &CodecOptions,
    ) -> Result<Environment, InterchangeError> {
        let value = parse(input)?;
        let mut decoder = Decoder::new(options);
        let env = decoder.environment(&value)?;
        debug!(
            identifiables = env.len(),
            skipped = decoder.skipped,
            "decoded JSON environment"
        );
        Ok(env)
    }

    pub fn read_identifiable(
        input: &[u8],
        options: &CodecOptions,
    ) -> Result<Identifiable, InterchangeError> {
        let value = parse(input)?;
        Decoder::new(options).identifiable(&value)
    }

    fn parse(input: &[u8]) -> Result<JsonValue, InterchangeError> {
        serde_json::from_slice(input).map_err(|e| InterchangeError::json(format!("Parse error: {e}")))
    }

    fn item_segment(index: usize, item: &JsonValue) -> String {
        item.get("idShort")
            .and_then(JsonValue::as_str)
            .map_or_else(|| index.to_string(), str::to_string)
    }

    /// Decoding state: options plus the current document path.
    pub(super) struct Decoder<'o> {
        options: &'o CodecOptions,
        path: Vec<String>,
        skipped: usize,
    }

    impl<'o> Decoder<'o> {
        fn new(options: &'o CodecOptions) -> Self {
            Self {
                options,
                path: Vec::new(),
                skipped: 0,
            }
        }

        fn path(&self) -> String {
            self.path.join("/")
        }

        fn path_with(&self, field: &str) -> String {
            if self.path.is_empty() {
                field.to_string()
            } else {
                format!("{}/{field}", self.path())
            }
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

        // --------------------------------------------------------------------
        // primitives
        // --------------------------------------------------------------------

        fn object<'v>(&self, value: &'v JsonValue) -> Result<&'v Object, InterchangeError> {
            value
                .as_object()
                .ok_or_else(|| InterchangeError::invalid(self.path(), "", "expected an object"))
        }

        fn check_fields(&self, map: &Object, known: &[&[&str]]) -> Result<(), InterchangeError> {
            for field in map.keys() {
                if known.iter().any(|group| group.contains(&field.as_str())) {
                    continue;
                }
                match self.options.unknown_fields {
                    UnknownFieldPolicy::Ignore => {
                        warn!(path = %self.path(), field = %field, "ignoring unknown field");
                    }
                    UnknownFieldPolicy::Reject => {
                        return Err(InterchangeError::unknown_field(self.path(), field));
                    }
                }
            }
            Ok(())
        }

        fn string(&self, map: &Object, field: &str) -> Result<Option<String>, InterchangeError> {
            match map.get(field) {
                None | Some(JsonValue::Null) => Ok(None),
                Some(JsonValue::String(s)) => Ok(Some(s.clone())),
                Some(_) => Err(InterchangeError::invalid(self.path(), field, "expected a string")),
            }
        }

        fn required_string(&self, map: &Object, field: &str) -> Result<String, InterchangeError> {
            self.string(map, field)?
                .ok_or_else(|| InterchangeError::missing(self.path(), field))
        }

        fn bool(&self, map: &Object, field: &str) -> Result<Option<bool>, InterchangeError> {
            match map.get(field) {
                None | Some(JsonValue::Null) => Ok(None),
                Some(JsonValue::Bool(b)) => Ok(Some(*b)),
                Some(_) => Err(InterchangeError::invalid(self.path(), field, "expected a boolean")),
            }
        }

        fn array<'v>(&self, map: &'v Object, field: &str) -> Result<&'v [JsonValue], InterchangeError> {
            match map.get(field) {
                None | Some(JsonValue::Null) => Ok(&[]),
                Some(JsonValue::Array(items)) => Ok(items),
                Some(_) => Err(InterchangeError::invalid(self.path(), field, "expected an array")),
            }
        }

        fn enumeration<T>(
            &self,
            map: &Object,
            field: &str,
            parse: fn(&str) -> Option<T>,
        ) -> Result<Option<T>, InterchangeError> {
            match self.string(map, field)? {
                None => Ok(None),
                Some(name) => parse(&name).map(Some).ok_or_else(|| {
                    InterchangeError::invalid(self.path(), field, format!("unknown literal `{name}`"))
                }),
            }
        }

        fn required_enumeration<T>(
            &self,
            map: &Object,
            field: &str,
            parse: fn(&str) -> Option<T>,
        ) -> Result<T, InterchangeError> {
            self.enumeration(map, field, parse)?
                .ok_or_else(|| InterchangeError::missing(self.path(), field))
        }

        /// Decode each item of an array field with the item's path segment pushed.
        fn items<T>(
            &mut self,
            map: &Object,
            field: &str,
            mut decode: impl FnMut(&mut Self, &JsonValue) -> Result<T, InterchangeError>,
        ) -> Result<Vec<T>, InterchangeError> {
            let items = self.array(map, field)?;
            self.nested(field, |d| {
                items
                    .iter()
                    .enumerate()
                    .map(|(index, item)| d.nested(item_segment(index, item), |d| decode(d, item)))
                    .collect()
            })
        }

        fn lang_strings(&mut self, map: &Object, field: &str) -> Result<LangStringSet, InterchangeError> {
            let pairs = self.items(map, field, |d, item| {
                let entry = d.object(item)?;
                d.check_fields(entry, &[&["language", "text"]])?;
                Ok((
                    d.required_string(entry, "language")?,
                    d.required_string(entry, "text")?,
                ))
            })?;
            LangStringSet::from_pairs(pairs).map_err(|e| e.at(self.path_with(field)))
        }

        // --------------------------------------------------------------------
        // references
        // --------------------------------------------------------------------

        fn reference(&mut self, value: &JsonValue) -> Result<Reference, InterchangeError> {
            let map = self.object(value)?;
            self.check_fields(map, &[&["type", "keys", "referredSemanticId"]])?;
            let type_name = self.required_string(map, "type")?;
            if !map.contains_key("keys") {
                return Err(InterchangeError::missing(self.path(), "keys"));
            }
            let keys = self.items(map, "keys", |d, item| {
                let key = d.object(item)?;
                d.check_fields(key, &[&["type", "value"]])?;
                let key_type = d.required_string(key, "type")?;
                let key_type = KeyTypes::from_name(&key_type).ok_or_else(|| {
                    InterchangeError::unknown_variant(d.path(), "key type", &key_type)
                })?;
                let value = d.required_string(key, "value")?;
                Key::new(key_type, value).map_err(d.at())
            })?;
            let mut reference = Reference::from_parts(&type_name, keys)
                .ok_or_else(|| InterchangeError::unknown_variant(self.path(), "reference type", &type_name))?
                .map_err(self.at())?;
            reference.set_referred_semantic_id(self.optional_reference(map, "referredSemanticId")?);
            Ok(reference)
        }

        fn optional_reference(
            &mut self,
            map: &Object,
            field: &str,
        ) -> Result<Option<Reference>, InterchangeError> {
            match map.get(field) {
                None | Some(JsonValue::Null) => Ok(None),
                Some(value) => self.nested(field, |d| d.reference(value)).map(Some),
            }
        }

        fn required_reference(&mut self, map: &Object, field: &str) -> Result<Reference, InterchangeError> {
            self.optional_reference(map, field)?
                .ok_or_else(|| InterchangeError::missing(self.path(), field))
        }

        fn references(&mut self, map: &Object, field: &str) -> Result<Vec<Reference>, InterchangeError> {
            self.items(map, field, |d, item| d.reference(item))
        }

        // --------------------------------------------------------------------
        // shared attribute groups
        // --------------------------------------------------------------------

        fn referable(&mut self, map: &Object, referable: &mut ReferableData) -> Result<(), InterchangeError> {
            referable.category = self.string(map, "category")?;
            referable.display_name = self.lang_strings(map, "displayName")?;
            referable.description = self.lang_strings(map, "description")?;
            let extensions = self.items(map, "extensions", |d, item| d.extension(item))?;
            for extension in extensions {
                referable
                    .add_extension(extension)
                    .map_err(|e| e.at(self.path_with("extensions")))?;
            }
            Ok(())
        }

        fn extension(&mut self, value: &JsonValue) -> Result<Extension, InterchangeError> {
            let map = self.object(value)?;
            self.check_fields(map, &[SEMANTIC_FIELDS, &["name", "valueType", "value", "refersTo"]])?;
            let value_type = self.enumeration(map, "valueType", DataTypeDefXsd::from_name)?;
            let mut extension = Extension::new(
                self.required_string(map, "name")?,
                value_type,
                self.string(map, "value")?.as_deref(),
            )
            .map_err(self.at())?;
            extension.refers_to = self.references(map, "refersTo")?;
            extension.semantic_id = self.optional_reference(map, "semanticId")?;
            extension.supplemental_semantic_ids = self.references(map, "supplementalSemanticIds")?;
            Ok(extension)
        }

        fn qualifier(&mut self, value: &JsonValue) -> Result<Qualifier, InterchangeError> {
            let map = self.object(value)?;
            self.check_fields(map, &[SEMANTIC_FIELDS, &["kind", "type", "valueType", "value", "valueId"]])?;
            let value_type = self.required_enumeration(map, "valueType", DataTypeDefXsd::from_name)?;
            let mut qualifier = Qualifier::new(
                self.required_string(map, "type")?,
                value_type,
                self.string(map, "value")?.as_deref(),
            )
            .map_err(self.at())?;
            qualifier.kind = self.enumeration(map, "kind", QualifierKind::from_name)?;
            qualifier.value_id = self.optional_reference(map, "valueId")?;
            qualifier.semantic_id = self.optional_reference(map, "semanticId")?;
            qualifier.supplemental_semantic_ids = self.references(map, "supplementalSemanticIds")?;
            Ok(qualifier)
        }

        fn element_common(&mut self, map: &Object, common: &mut ElementCommon) -> Result<(), InterchangeError> {
            self.referable(map, &mut common.referable)?;
            common.semantic_id = self.optional_reference(map, "semanticId")?;
            common.supplemental_semantic_ids = self.references(map, "supplementalSemanticIds")?;
            let qualifiers = self.items(map, "qualifiers", |d, item| d.qualifier(item))?;
            for qualifier in qualifiers {
                common
                    .add_qualifier(qualifier)
                    .map_err(|e| e.at(self.path_with("qualifiers")))?;
            }
            common.embedded_data_specifications = self.data_specifications(map)?;
            Ok(())
        }

        fn data_specifications(
            &mut self,
            map: &Object,
        ) -> Result<Vec<EmbeddedDataSpecification>, InterchangeError> {
            self.items(map, "embeddedDataSpecifications", |d, item| {
                let eds = d.object(item)?;
                d.check_fields(eds, &[&["dataSpecification", "dataSpecificationContent"]])?;
                let data_specification = d.required_reference(eds, "dataSpecification")?;
                let content = eds
                    .get("dataSpecificationContent")
                    .ok_or_else(|| InterchangeError::missing(d.path(), "dataSpecificationContent"))?;
                let content = d.nested("dataSpecificationContent", |d| d.data_spec_content(content))?;
                Ok(EmbeddedDataSpecification {
                    data_specification,
                    content,
                })
            })
        }

        fn data_spec_content(
            &mut self,
            value: &JsonValue,
        ) -> Result<DataSpecificationContent, InterchangeError> {
            let map = self.object(value)?;
            let model_type = self.required_string(map, "modelType")?;
            if model_type != "DataSpecificationIec61360" {
                return Err(InterchangeError::unknown_variant(
                    self.path(),
                    "data specification content",
                    model_type,
                ));
            }
            self.check_fields(
                map,
                &[&[
                    "modelType",
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
            let preferred_name = self.lang_strings(map, "preferredName")?;
            let mut iec = DataSpecificationIec61360::new(preferred_name)
                .map_err(|e| e.at(self.path_with("preferredName")))?;
            iec.short_name = self.lang_strings(map, "shortName")?;
            iec.unit = self.string(map, "unit")?;
            iec.unit_id = self.optional_reference(map, "unitId")?;
            iec.source_of_definition = self.string(map, "sourceOfDefinition")?;
            iec.symbol = self.string(map, "symbol")?;
            iec.data_type = self.enumeration(map, "dataType", DataTypeIec61360::from_name)?;
            iec.definition = self.lang_strings(map, "definition")?;
            iec.value_format = self.string(map, "valueFormat")?;
            iec.value = self.string(map, "value")?;
            if let Some(list) = map.get("valueList").filter(|v| !v.is_null()) {
                iec.value_list = Some(self.nested("valueList", |d| {
                    let list = d.object(list)?;
                    d.check_fields(list, &[&["valueReferencePairs"]])?;
                    let pairs = d.items(list, "valueReferencePairs", |d, item| {
                        let pair = d.object(item)?;
                        d.check_fields(pair, &[&["value", "valueId"]])?;
                        Ok(ValueReferencePair {
                            value: d.required_string(pair, "value")?,
                            value_id: d.required_reference(pair, "valueId")?,
                        })
                    })?;
                    ValueList::new(pairs).map_err(d.at())
                })?);
            }
            if let Some(level) = map.get("levelType").filter(|v| !v.is_null()) {
                iec.level_type = Some(self.nested("levelType", |d| {
                    let level = d.object(level)?;
                    d.check_fields(level, &[&["min", "nom", "typ", "max"]])?;
                    Ok(LevelType {
                        min: d.bool(level, "min")?.unwrap_or(false),
                        nom: d.bool(level, "nom")?.unwrap_or(false),
                        typ: d.bool(level, "typ")?.unwrap_or(false),
                        max: d.bool(level, "max")?.unwrap_or(false),
                    })
                })?);
            }
            Ok(DataSpecificationContent::Iec61360(iec))
        }

        fn administration(
            &mut self,
            map: &Object,
        ) -> Result<Option<AdministrativeInformation>, InterchangeError> {
            let Some(value) = map.get("administration").filter(|v| !v.is_null()) else {
                return Ok(None);
            };
            self.nested("administration", |d| {
                let admin = d.object(value)?;
                d.check_fields(
                    admin,
                    &[DATA_SPEC_FIELDS, &["version", "revision", "creator", "templateId"]],
                )?;
                let mut info = AdministrativeInformation::new(
                    d.string(admin, "version")?.as_deref(),
                    d.string(admin, "revision")?.as_deref(),
                )
                .map_err(d.at())?;
                info.creator = d.optional_reference(admin, "creator")?;
                info.template_id = d.string(admin, "templateId")?;
                info.embedded_data_specifications = d.data_specifications(admin)?;
                Ok(Some(info))
            })
        }

        fn identifier(&self, map: &Object) -> Result<Identifier, InterchangeError> {
            let id = self.required_string(map, "id")?;
            let kind = self
                .enumeration(map, "idType", IdentifierKind::from_name)?
                .unwrap_or_default();
            Identifier::new(id, kind).map_err(|e| e.at(self.path_with("id")))
        }

        fn specific_asset_ids(
            &mut self,
            map: &Object,
        ) -> Result<Vec<SpecificAssetId>, InterchangeError> {
            self.items(map, "specificAssetIds", |d, item| {
                let entry = d.object(item)?;
                d.check_fields(entry, &[SEMANTIC_FIELDS, &["name", "value", "externalSubjectId"]])?;
                let mut id = SpecificAssetId::new(
                    d.required_string(entry, "name")?,
                    d.required_string(entry, "value")?,
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

        pub(super) fn element(&mut self, value: &JsonValue) -> Result<SubmodelElement, InterchangeError> {
            let map = self.object(value)?;
            let model_type = self.required_string(map, "modelType")?;
            let (_, fields, decode) = ElementKind::from_model_type(&model_type)
                .and_then(|kind| ELEMENT_DECODERS.iter().find(|(k, _, _)| *k == kind))
                .copied()
                .ok_or_else(|| {
                    InterchangeError::unknown_variant(self.path(), "submodel element", &model_type)
                })?;
            self.check_fields(
                map,
                &[REFERABLE_FIELDS, SEMANTIC_FIELDS, QUALIFIABLE_FIELDS, DATA_SPEC_FIELDS, fields],
            )?;
            let id_short = self.string(map, "idShort")?;
            let mut element = decode(self, map, id_short.as_deref())?;
            self.element_common(map, element.common_mut())?;
            Ok(element)
        }

        /// Decode an array of elements, handing each to `add`. In failsafe
        /// mode broken items are logged and skipped.
        fn elements(
            &mut self,
            map: &Object,
            field: &str,
            mut add: impl FnMut(SubmodelElement) -> Result<(), ModelError>,
        ) -> Result<(), InterchangeError> {
            let items = self.array(map, field)?;
            self.nested(field, |d| {
                for (index, item) in items.iter().enumerate() {
                    d.nested(item_segment(index, item), |d| {
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

        fn environment(&mut self, value: &JsonValue) -> Result<Environment, InterchangeError> {
            let map = self.object(value)?;
            self.check_fields(
                map,
                &[&["assetAdministrationShells", "submodels", "conceptDescriptions"]],
            )?;
            let mut env = Environment::new();
            for field in ["assetAdministrationShells", "submodels", "conceptDescriptions"] {
                let items = self.array(map, field)?;
                self.nested(field, |d| {
                    for (index, item) in items.iter().enumerate() {
                        d.nested(index.to_string(), |d| {
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
        }

        pub(super) fn identifiable(&mut self, value: &JsonValue) -> Result<Identifiable, InterchangeError> {
            let map = self.object(value)?;
            let model_type = self.required_string(map, "modelType")?;
            match model_type.as_str() {
                "AssetAdministrationShell" => self.shell(map).map(Identifiable::Shell),
                "Submodel" => self.submodel(map).map(Identifiable::Submodel),
                "ConceptDescription" => self.concept_description(map).map(Identifiable::ConceptDescription),
                _ => Err(InterchangeError::unknown_variant(self.path(), "identifiable", model_type)),
            }
        }

        fn shell(&mut self, map: &Object) -> Result<AssetAdministrationShell, InterchangeError> {
            self.check_fields(
                map,
                &[
                    REFERABLE_FIELDS,
                    IDENTIFIABLE_FIELDS,
                    DATA_SPEC_FIELDS,
                    &["derivedFrom", "assetInformation", "submodels"],
                ],
            )?;
            let identifier = self.identifier(map)?;
            let info = map
                .get("assetInformation")
                .filter(|v| !v.is_null())
                .ok_or_else(|| InterchangeError::missing(self.path(), "assetInformation"))?;
            let asset_information = self.nested("assetInformation", |d| d.asset_information(info))?;
            let id_short = self.string(map, "idShort")?;
            let mut shell = AssetAdministrationShell::new(identifier, id_short.as_deref(), asset_information)
                .map_err(self.at())?;
            self.referable(map, &mut shell.referable)?;
            shell.administration = self.administration(map)?;
            shell.embedded_data_specifications = self.data_specifications(map)?;
            shell.derived_from = self.optional_reference(map, "derivedFrom")?;
            for reference in self.references(map, "submodels")? {
                shell
                    .add_submodel(reference)
                    .map_err(|e| e.at(self.path_with("submodels")))?;
            }
            Ok(shell)
        }

        fn asset_information(&mut self, value: &JsonValue) -> Result<AssetInformation, InterchangeError> {
            let map = self.object(value)?;
            self.check_fields(
                map,
                &[&[
                    "assetKind",
                    "globalAssetId",
                    "specificAssetIds",
                    "assetType",
                    "defaultThumbnail",
                ]],
            )?;
            let asset_kind = self.required_enumeration(map, "assetKind", AssetKind::from_name)?;
            let specific = self.specific_asset_ids(map)?;
            let mut info = AssetInformation::new(
                asset_kind,
                self.string(map, "globalAssetId")?.as_deref(),
                specific,
            )
            .map_err(self.at())?;
            info.asset_type = self.string(map, "assetType")?;
            if let Some(thumb) = map.get("defaultThumbnail").filter(|v| !v.is_null()) {
                info.default_thumbnail = Some(self.nested("defaultThumbnail", |d| {
                    let thumb = d.object(thumb)?;
                    d.check_fields(thumb, &[&["path", "contentType"]])?;
                    Ok(Resource {
                        path: d.required_string(thumb, "path")?,
                        content_type: d.string(thumb, "contentType")?,
                    })
                })?);
            }
            Ok(info)
        }

        fn submodel(&mut self, map: &Object) -> Result<Submodel, InterchangeError> {
            self.check_fields(
                map,
                &[
                    REFERABLE_FIELDS,
                    IDENTIFIABLE_FIELDS,
                    SEMANTIC_FIELDS,
                    QUALIFIABLE_FIELDS,
                    DATA_SPEC_FIELDS,
                    &["kind", "submodelElements"],
                ],
            )?;
            let identifier = self.identifier(map)?;
            let id_short = self.string(map, "idShort")?;
            let mut submodel = Submodel::new(identifier, id_short.as_deref()).map_err(self.at())?;
            self.element_common(map, &mut submodel.common)?;
            submodel.administration = self.administration(map)?;
            submodel.kind = self.enumeration(map, "kind", ModellingKind::from_name)?;
            let elements = submodel.elements_mut();
            self.elements(map, "submodelElements", |e| elements.add(e))?;
            Ok(submodel)
        }

        fn concept_description(&mut self, map: &Object) -> Result<ConceptDescription, InterchangeError> {
            self.check_fields(
                map,
                &[REFERABLE_FIELDS, IDENTIFIABLE_FIELDS, DATA_SPEC_FIELDS, &["isCaseOf"]],
            )?;
            let identifier = self.identifier(map)?;
            let id_short = self.string(map, "idShort")?;
            let mut cd = ConceptDescription::new(identifier, id_short.as_deref()).map_err(self.at())?;
            self.referable(map, &mut cd.referable)?;
            cd.administration = self.administration(map)?;
            cd.embedded_data_specifications = self.data_specifications(map)?;
            cd.is_case_of = self.references(map, "isCaseOf")?;
            Ok(cd)
        }
    }

    // ------------------------------------------------------------------------
    // per-kind decoders
    // ------------------------------------------------------------------------

    fn property(d: &mut Decoder<'_>, map: &Object, id_short: Option<&str>) -> Result<SubmodelElement, InterchangeError> {
        let value_type = d.required_enumeration(map, "valueType", DataTypeDefXsd::from_name)?;
        let value = d.string(map, "value")?;
        let mut property = Property::new(id_short, value_type, value.as_deref())
            .map_err(|e| e.at(d.path_with("value")))?;
        property.value_id = d.optional_reference(map, "valueId")?;
        Ok(property.into())
    }

    fn multi_language_property(
        d: &mut Decoder<'_>,
        map: &Object,
        id_short: Option<&str>,
    ) -> Result<SubmodelElement, InterchangeError> {
        let value = d.lang_strings(map, "value")?;
        let mut mlp = MultiLanguageProperty::new(id_short, value).map_err(d.at())?;
        mlp.value_id = d.optional_reference(map, "valueId")?;
        Ok(mlp.into())
    }

    fn range(d: &mut Decoder<'_>, map: &Object, id_short: Option<&str>) -> Result<SubmodelElement, InterchangeError> {
        let value_type = d.required_enumeration(map, "valueType", DataTypeDefXsd::from_name)?;
        let min = d.string(map, "min")?;
        let max = d.string(map, "max")?;
        Range::new(id_short, value_type, min.as_deref(), max.as_deref())
            .map(Into::into)
            .map_err(d.at())
    }

    fn blob(d: &mut Decoder<'_>, map: &Object, id_short: Option<&str>) -> Result<SubmodelElement, InterchangeError> {
        let content_type = d.required_string(map, "contentType")?;
        let value = d
            .string(map, "value")?
            .map(|encoded| {
                BASE64
                    .decode(encoded.as_bytes())
                    .map_err(|e| InterchangeError::invalid(d.path(), "value", e.to_string()))
            })
            .transpose()?;
        Blob::new(id_short, content_type, value)
            .map(Into::into)
            .map_err(d.at())
    }

    fn file(d: &mut Decoder<'_>, map: &Object, id_short: Option<&str>) -> Result<SubmodelElement, InterchangeError> {
        let content_type = d.required_string(map, "contentType")?;
        let value = d.string(map, "value")?;
        File::new(id_short, content_type, value.as_deref())
            .map(Into::into)
            .map_err(d.at())
    }

    fn reference_element(
        d: &mut Decoder<'_>,
        map: &Object,
        id_short: Option<&str>,
    ) -> Result<SubmodelElement, InterchangeError> {
        let value = d.optional_reference(map, "value")?;
        ReferenceElement::new(id_short, value)
            .map(Into::into)
            .map_err(d.at())
    }

    fn relationship(
        d: &mut Decoder<'_>,
        map: &Object,
        id_short: Option<&str>,
    ) -> Result<SubmodelElement, InterchangeError> {
        let first = d.required_reference(map, "first")?;
        let second = d.required_reference(map, "second")?;
        RelationshipElement::new(id_short, first, second)
            .map(Into::into)
            .map_err(d.at())
    }

    fn annotated_relationship(
        d: &mut Decoder<'_>,
        map: &Object,
        id_short: Option<&str>,
    ) -> Result<SubmodelElement, InterchangeError> {
        let first = d.required_reference(map, "first")?;
        let second = d.required_reference(map, "second")?;
        let mut rel = AnnotatedRelationshipElement::new(id_short, first, second).map_err(d.at())?;
        let annotations = rel.annotations_mut();
        d.elements(map, "annotations", |e| annotations.add(e))?;
        Ok(rel.into())
    }

    fn collection(
        d: &mut Decoder<'_>,
        map: &Object,
        id_short: Option<&str>,
    ) -> Result<SubmodelElement, InterchangeError> {
        let mut collection = SubmodelElementCollection::new(id_short).map_err(d.at())?;
        let elements = collection.elements_mut();
        d.elements(map, "value", |e| elements.add(e))?;
        Ok(collection.into())
    }

    fn list(d: &mut Decoder<'_>, map: &Object, id_short: Option<&str>) -> Result<SubmodelElement, InterchangeError> {
        let element_type =
            d.required_enumeration(map, "typeValueListElement", AasSubmodelElements::from_name)?;
        let value_type = d.enumeration(map, "valueTypeListElement", DataTypeDefXsd::from_name)?;
        let mut list = SubmodelElementList::new(id_short, element_type, value_type).map_err(d.at())?;
        list.order_relevant = d.bool(map, "orderRelevant")?.unwrap_or(true);
        list.semantic_id_list_element = d.optional_reference(map, "semanticIdListElement")?;
        let items = list.items_mut();
        d.elements(map, "value", |e| items.push(e))?;
        Ok(list.into())
    }

    fn operation(
        d: &mut Decoder<'_>,
        map: &Object,
        id_short: Option<&str>,
    ) -> Result<SubmodelElement, InterchangeError> {
        let mut operation = Operation::new(id_short).map_err(d.at())?;
        for (group, field) in [
            (VariableGroup::Input, "inputVariables"),
            (VariableGroup::Output, "outputVariables"),
            (VariableGroup::InOutput, "inoutputVariables"),
        ] {
            let variables = d.items(map, field, |d, item| {
                let variable = d.object(item)?;
                d.check_fields(variable, &[&["value"]])?;
                let value = variable
                    .get("value")
                    .ok_or_else(|| InterchangeError::missing(d.path(), "value"))?;
                d.nested("value", |d| d.element(value))
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
        _map: &Object,
        id_short: Option<&str>,
    ) -> Result<SubmodelElement, InterchangeError> {
        Capability::new(id_short).map(Into::into).map_err(d.at())
    }

    fn entity(d: &mut Decoder<'_>, map: &Object, id_short: Option<&str>) -> Result<SubmodelElement, InterchangeError> {
        let entity_type = d.required_enumeration(map, "entityType", EntityType::from_name)?;
        let global_asset_id = d.string(map, "globalAssetId")?;
        let specific = d.specific_asset_ids(map)?;
        let mut entity = Entity::new(id_short, entity_type, global_asset_id.as_deref(), specific)
            .map_err(d.at())?;
        let statements = entity.statements_mut();
        d.elements(map, "statements", |e| statements.add(e))?;
        Ok(entity.into())
    }

    fn basic_event(
        d: &mut Decoder<'_>,
        map: &Object,
        id_short: Option<&str>,
    ) -> Result<SubmodelElement, InterchangeError> {
        let observed = d.required_reference(map, "observed")?;
        let direction = d.required_enumeration(map, "direction", Direction::from_name)?;
        let state = d.required_enumeration(map, "state", StateOfEvent::from_name)?;
        let mut event =
            BasicEventElement::new(id_short, observed, direction, state).map_err(d.at())?;
        event.message_topic = d.string(map, "messageTopic")?;
        event.message_broker = d.optional_reference(map, "messageBroker")?;
        event.last_update = d.string(map, "lastUpdate")?;
        event.min_interval = d.string(map, "minInterval")?;
        event.max_interval = d.string(map, "maxInterval")?;
        Ok(event.into())
    }
}

// ============================================================================
// WRITER
// ============================================================================

mod writer {
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD as BASE64;
    use serde_json::{Map, Value as JsonValue, json};

    use super::*;
    use crate::model::{
        AdministrativeInformation, AssetAdministrationShell, AssetInformation,
        ConceptDescription, DataSpecificationContent, ElementCommon, EmbeddedDataSpecification,
        Extension, Identifier, LangStringSet, Qualifier, Reference, ReferableData,
        SpecificAssetId, Submodel, SubmodelElement, VariableGroup,
    };

    type Object = Map<String, JsonValue>;

    pub fn finish(value: JsonValue, pretty: bool) -> Result<Vec<u8>, InterchangeError> {
        let result = if pretty {
            serde_json::to_vec_pretty(&value)
        } else {
            serde_json::to_vec(&value)
        };
        result.map_err(|e| InterchangeError::json(format!("Serialize error: {e}")))
    }

    pub fn environment(env: &Environment) -> JsonValue {
        let mut map = Object::new();
        put_array(
            &mut map,
            "assetAdministrationShells",
            env.shells().map(|s| JsonValue::Object(shell(s))).collect(),
        );
        put_array(
            &mut map,
            "submodels",
            env.submodels().map(|s| JsonValue::Object(submodel(s))).collect(),
        );
        put_array(
            &mut map,
            "conceptDescriptions",
            env.concept_descriptions()
                .map(|c| JsonValue::Object(concept_description(c)))
                .collect(),
        );
        JsonValue::Object(map)
    }

    pub fn identifiable(identifiable: IdentifiableRef<'_>) -> JsonValue {
        JsonValue::Object(match identifiable {
            IdentifiableRef::Shell(s) => shell(s),
            IdentifiableRef::Submodel(s) => submodel(s),
            IdentifiableRef::ConceptDescription(c) => concept_description(c),
        })
    }

    // ------------------------------------------------------------------------
    // helpers
    // ------------------------------------------------------------------------

    fn put_str(map: &mut Object, field: &str, value: Option<&str>) {
        if let Some(value) = value {
            map.insert(field.to_string(), JsonValue::String(value.to_string()));
        }
    }

    fn put_array(map: &mut Object, field: &str, items: Vec<JsonValue>) {
        if !items.is_empty() {
            map.insert(field.to_string(), JsonValue::Array(items));
        }
    }

    fn put_reference(map: &mut Object, field: &str, value: Option<&Reference>) {
        if let Some(value) = value {
            map.insert(field.to_string(), reference(value));
        }
    }

    fn put_references(map: &mut Object, field: &str, values: &[Reference]) {
        put_array(map, field, values.iter().map(reference).collect());
    }

    fn put_lang_strings(map: &mut Object, field: &str, set: &LangStringSet) {
        put_array(
            map,
            field,
            set.iter()
                .map(|(language, text)| json!({ "language": language, "text": text }))
                .collect(),
        );
    }

    fn model_type(name: &str) -> Object {
        let mut map = Object::new();
        map.insert("modelType".to_string(), JsonValue::String(name.to_string()));
        map
    }

    pub(super) fn reference(reference: &Reference) -> JsonValue {
        let keys: Vec<JsonValue> = reference
            .keys()
            .iter()
            .map(|k| json!({ "type": k.key_type().as_str(), "value": k.value() }))
            .collect();
        let mut map = Object::new();
        put_str(&mut map, "type", Some(reference.type_name()));
        put_reference(&mut map, "referredSemanticId", reference.referred_semantic_id());
        map.insert("keys".to_string(), JsonValue::Array(keys));
        JsonValue::Object(map)
    }

    // ------------------------------------------------------------------------
    // attribute groups
    // ------------------------------------------------------------------------

    fn referable(map: &mut Object, referable: &ReferableData) {
        put_str(map, "idShort", referable.id_short());
        put_str(map, "category", referable.category.as_deref());
        put_lang_strings(map, "displayName", &referable.display_name);
        put_lang_strings(map, "description", &referable.description);
        put_array(
            map,
            "extensions",
            referable.extensions().iter().map(extension).collect(),
        );
    }

    fn extension(extension: &Extension) -> JsonValue {
        let mut map = Object::new();
        put_reference(&mut map, "semanticId", extension.semantic_id.as_ref());
        put_references(&mut map, "supplementalSemanticIds", &extension.supplemental_semantic_ids);
        put_str(&mut map, "name", Some(extension.name()));
        put_str(&mut map, "valueType", extension.value_type().map(|t| t.as_str()));
        put_str(&mut map, "value", extension.value().map(|v| v.render()).as_deref());
        put_references(&mut map, "refersTo", &extension.refers_to);
        JsonValue::Object(map)
    }

    fn qualifier(qualifier: &Qualifier) -> JsonValue {
        let mut map = Object::new();
        put_reference(&mut map, "semanticId", qualifier.semantic_id.as_ref());
        put_references(&mut map, "supplementalSemanticIds", &qualifier.supplemental_semantic_ids);
        put_str(&mut map, "kind", qualifier.kind.map(|k| k.as_str()));
        put_str(&mut map, "type", Some(qualifier.qualifier_type()));
        put_str(&mut map, "valueType", Some(qualifier.value_type().as_str()));
        put_str(&mut map, "value", qualifier.value().map(|v| v.render()).as_deref());
        put_reference(&mut map, "valueId", qualifier.value_id.as_ref());
        JsonValue::Object(map)
    }

    fn element_common(map: &mut Object, common: &ElementCommon) {
        referable(map, &common.referable);
        put_reference(map, "semanticId", common.semantic_id.as_ref());
        put_references(map, "supplementalSemanticIds", &common.supplemental_semantic_ids);
        put_array(
            map,
            "qualifiers",
            common.qualifiers().iter().map(qualifier).collect(),
        );
        data_specifications(map, &common.embedded_data_specifications);
    }

    fn data_specifications(map: &mut Object, specs: &[EmbeddedDataSpecification]) {
        put_array(
            map,
            "embeddedDataSpecifications",
            specs
                .iter()
                .map(|eds| {
                    json!({
                        "dataSpecification": reference(&eds.data_specification),
                        "dataSpecificationContent": data_spec_content(&eds.content),
                    })
                })
                .collect(),
        );
    }

    fn data_spec_content(content: &DataSpecificationContent) -> JsonValue {
        let DataSpecificationContent::Iec61360(iec) = content;
        let mut map = model_type(content.model_type());
        put_lang_strings(&mut map, "preferredName", iec.preferred_name());
        put_lang_strings(&mut map, "shortName", &iec.short_name);
        put_str(&mut map, "unit", iec.unit.as_deref());
        put_reference(&mut map, "unitId", iec.unit_id.as_ref());
        put_str(&mut map, "sourceOfDefinition", iec.source_of_definition.as_deref());
        put_str(&mut map, "symbol", iec.symbol.as_deref());
        put_str(&mut map, "dataType", iec.data_type.map(|t| t.as_str()));
        put_lang_strings(&mut map, "definition", &iec.definition);
        put_str(&mut map, "valueFormat", iec.value_format.as_deref());
        if let Some(list) = &iec.value_list {
            let pairs: Vec<JsonValue> = list
                .pairs()
                .iter()
                .map(|p| json!({ "value": p.value, "valueId": reference(&p.value_id) }))
                .collect();
            map.insert("valueList".to_string(), json!({ "valueReferencePairs": pairs }));
        }
        put_str(&mut map, "value", iec.value.as_deref());
        if let Some(level) = &iec.level_type {
            map.insert(
                "levelType".to_string(),
                json!({ "min": level.min, "nom": level.nom, "typ": level.typ, "max": level.max }),
            );
        }
        JsonValue::Object(map)
    }

    fn identification(map: &mut Object, identifier: &Identifier, admin: Option<&AdministrativeInformation>) {
        put_str(map, "id", Some(identifier.id()));
        put_str(map, "idType", Some(identifier.kind().as_str()));
        if let Some(admin) = admin {
            let mut info = Object::new();
            data_specifications(&mut info, &admin.embedded_data_specifications);
            put_str(&mut info, "version", admin.version());
            put_str(&mut info, "revision", admin.revision());
            put_reference(&mut info, "creator", admin.creator.as_ref());
            put_str(&mut info, "templateId", admin.template_id.as_deref());
            map.insert("administration".to_string(), JsonValue::Object(info));
        }
    }

    fn specific_asset_ids(map: &mut Object, ids: &[SpecificAssetId]) {
        put_array(
            map,
            "specificAssetIds",
            ids.iter()
                .map(|id| {
                    let mut entry = Object::new();
                    put_reference(&mut entry, "semanticId", id.semantic_id.as_ref());
                    put_references(&mut entry, "supplementalSemanticIds", &id.supplemental_semantic_ids);
                    put_str(&mut entry, "name", Some(id.name()));
                    put_str(&mut entry, "value", Some(id.value()));
                    put_reference(&mut entry, "externalSubjectId", id.external_subject_id.as_ref());
                    JsonValue::Object(entry)
                })
                .collect(),
        );
    }

    // ------------------------------------------------------------------------
    // identifiables
    // ------------------------------------------------------------------------

    fn shell(shell: &AssetAdministrationShell) -> Object {
        let mut map = model_type("AssetAdministrationShell");
        referable(&mut map, &shell.referable);
        identification(&mut map, shell.identifier(), shell.administration.as_ref());
        data_specifications(&mut map, &shell.embedded_data_specifications);
        put_reference(&mut map, "derivedFrom", shell.derived_from.as_ref());
        map.insert(
            "assetInformation".to_string(),
            asset_information(&shell.asset_information),
        );
        put_references(&mut map, "submodels", shell.submodels());
        map
    }

    fn asset_information(info: &AssetInformation) -> JsonValue {
        let mut map = Object::new();
        put_str(&mut map, "assetKind", Some(info.asset_kind.as_str()));
        put_str(&mut map, "globalAssetId", info.global_asset_id());
        specific_asset_ids(&mut map, info.specific_asset_ids());
        put_str(&mut map, "assetType", info.asset_type.as_deref());
        if let Some(thumb) = &info.default_thumbnail {
            let mut resource = Object::new();
            put_str(&mut resource, "path", Some(thumb.path.as_str()));
            put_str(&mut resource, "contentType", thumb.content_type.as_deref());
            map.insert("defaultThumbnail".to_string(), JsonValue::Object(resource));
        }
        JsonValue::Object(map)
    }

    fn submodel(submodel: &Submodel) -> Object {
        let mut map = model_type("Submodel");
        element_common(&mut map, &submodel.common);
        identification(&mut map, submodel.identifier(), submodel.administration.as_ref());
        put_str(&mut map, "kind", submodel.kind.map(|k| k.as_str()));
        put_array(
            &mut map,
            "submodelElements",
            submodel.elements().iter().map(element).collect(),
        );
        map
    }

    fn concept_description(cd: &ConceptDescription) -> Object {
        let mut map = model_type("ConceptDescription");
        referable(&mut map, &cd.referable);
        identification(&mut map, cd.identifier(), cd.administration.as_ref());
        data_specifications(&mut map, &cd.embedded_data_specifications);
        put_references(&mut map, "isCaseOf", &cd.is_case_of);
        map
    }

    // ------------------------------------------------------------------------
    // elements
    // ------------------------------------------------------------------------

    pub(super) fn element(element: &SubmodelElement) -> JsonValue {
        let mut map = model_type(element.kind().model_type());
        element_common(&mut map, element.common());
        match element {
            SubmodelElement::Property(p) => {
                put_str(&mut map, "valueType", Some(p.value_type().as_str()));
                put_str(&mut map, "value", p.value().map(|v| v.render()).as_deref());
                put_reference(&mut map, "valueId", p.value_id.as_ref());
            }
            SubmodelElement::MultiLanguageProperty(m) => {
                put_lang_strings(&mut map, "value", &m.value);
                put_reference(&mut map, "valueId", m.value_id.as_ref());
            }
            SubmodelElement::Range(r) => {
                put_str(&mut map, "valueType", Some(r.value_type().as_str()));
                put_str(&mut map, "min", r.min().map(|v| v.render()).as_deref());
                put_str(&mut map, "max", r.max().map(|v| v.render()).as_deref());
            }
            SubmodelElement::Blob(b) => {
                put_str(&mut map, "contentType", Some(b.content_type.as_str()));
                put_str(&mut map, "value", b.value().map(|v| BASE64.encode(v)).as_deref());
            }
            SubmodelElement::File(f) => {
                put_str(&mut map, "contentType", Some(f.content_type.as_str()));
                put_str(&mut map, "value", f.value.as_deref());
            }
            SubmodelElement::ReferenceElement(r) => {
                put_reference(&mut map, "value", r.value.as_ref());
            }
            SubmodelElement::RelationshipElement(r) => {
                put_reference(&mut map, "first", Some(&r.first));
                put_reference(&mut map, "second", Some(&r.second));
            }
            SubmodelElement::AnnotatedRelationshipElement(r) => {
                put_reference(&mut map, "first", Some(&r.first));
                put_reference(&mut map, "second", Some(&r.second));
                put_array(&mut map, "annotations", r.annotations().iter().map(self::element).collect());
            }
            SubmodelElement::SubmodelElementCollection(c) => {
                put_array(&mut map, "value", c.elements().iter().map(self::element).collect());
            }
            SubmodelElement::SubmodelElementList(l) => {
                map.insert("orderRelevant".to_string(), JsonValue::Bool(l.order_relevant));
                put_reference(&mut map, "semanticIdListElement", l.semantic_id_list_element.as_ref());
                put_str(&mut map, "typeValueListElement", Some(l.element_type().as_str()));
                put_str(&mut map, "valueTypeListElement", l.value_type().map(|t| t.as_str()));
                put_array(&mut map, "value", l.items().iter().map(self::element).collect());
            }
            SubmodelElement::Operation(o) => {
                for (group, field) in [
                    (VariableGroup::Input, "inputVariables"),
                    (VariableGroup::Output, "outputVariables"),
                    (VariableGroup::InOutput, "inoutputVariables"),
                ] {
                    let variables = o
                        .variables()
                        .group(group)
                        .iter()
                        .map(|v| json!({ "value": self::element(v) }))
                        .collect();
                    put_array(&mut map, field, variables);
                }
            }
            SubmodelElement::Capability(_) => {}
            SubmodelElement::Entity(e) => {
                put_str(&mut map, "entityType", Some(e.entity_type().as_str()));
                put_str(&mut map, "globalAssetId", e.global_asset_id());
                specific_asset_ids(&mut map, e.specific_asset_ids());
                put_array(&mut map, "statements", e.statements().iter().map(self::element).collect());
            }
            SubmodelElement::BasicEventElement(e) => {
                put_reference(&mut map, "observed", Some(e.observed()));
                put_str(&mut map, "direction", Some(e.direction.as_str()));
                put_str(&mut map, "state", Some(e.state.as_str()));
                put_str(&mut map, "messageTopic", e.message_topic.as_deref());
                put_reference(&mut map, "messageBroker", e.message_broker.as_ref());
                put_str(&mut map, "lastUpdate", e.last_update.as_deref());
                put_str(&mut map, "minInterval", e.min_interval.as_deref());
                put_str(&mut map, "maxInterval", e.max_interval.as_deref());
            }
        }
        JsonValue::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interchange::UnknownFieldPolicy;
    use crate::model::{DataTypeDefXsd, ElementKind, Identifier, Property, Submodel, Value};

    fn submodel_doc(elements: &str) -> String {
        format!(
            r#"{{ "submodels": [ {{ "modelType": "Submodel", "id": "urn:sm", "idShort": "sm",
                 "submodelElements": [ {elements} ] }} ] }}"#
        )
    }

    #[test]
    fn test_decoder_table_is_complete() {
        for kind in ElementKind::ALL {
            assert!(
                reader::ELEMENT_DECODERS.iter().any(|(k, _, _)| *k == kind),
                "no JSON decoder for {kind}"
            );
        }
    }

    #[test]
    fn test_reads_property() {
        let doc = submodel_doc(
            r#"{ "modelType": "Property", "idShort": "rpm", "valueType": "xs:int", "value": "+0500" }"#,
        );
        let env = Json::new().read(doc.as_bytes()).unwrap();
        let sm = env.submodel("urn:sm").unwrap();
        let Some(crate::model::SubmodelElement::Property(p)) = sm.elements().get("rpm") else {
            panic!("expected a property");
        };
        assert_eq!(p.value(), Some(&Value::Integer(500)));
        assert_eq!(sm.identifier().kind(), crate::model::IdentifierKind::Iri);
    }

    #[test]
    fn test_unknown_model_type() {
        let doc = submodel_doc(r#"{ "modelType": "Gadget", "idShort": "g" }"#);
        let err = Json::new().read(doc.as_bytes()).unwrap_err();
        match err {
            InterchangeError::UnknownVariant { path, name, .. } => {
                assert_eq!(name, "Gadget");
                assert_eq!(path, "submodels/0/submodelElements/g");
            }
            other => panic!("unexpected {other}"),
        }
    }

    #[test]
    fn test_missing_field_carries_path() {
        let doc = submodel_doc(r#"{ "modelType": "Property", "idShort": "rpm" }"#);
        let err = Json::new().read(doc.as_bytes()).unwrap_err();
        match err {
            InterchangeError::MissingField { path, field } => {
                assert_eq!(field, "valueType");
                assert_eq!(path, "submodels/0/submodelElements/rpm");
            }
            other => panic!("unexpected {other}"),
        }
    }

    #[test]
    fn test_value_type_mismatch() {
        let doc = submodel_doc(
            r#"{ "modelType": "Property", "idShort": "rpm", "valueType": "xs:int", "value": "12.5" }"#,
        );
        let err = Json::new().read(doc.as_bytes()).unwrap_err();
        assert!(matches!(err, InterchangeError::ValueTypeMismatch { .. }), "{err}");
    }

    #[test]
    fn test_strict_mode_rejects_unknown_field() {
        let doc = submodel_doc(
            r#"{ "modelType": "Capability", "idShort": "c", "extraneous": true }"#,
        );
        assert!(Json::new().read(doc.as_bytes()).is_ok());
        let strict = Json::with_options(CodecOptions {
            unknown_fields: UnknownFieldPolicy::Reject,
            ..CodecOptions::default()
        });
        let err = strict.read(doc.as_bytes()).unwrap_err();
        assert!(matches!(err, InterchangeError::UnknownField { ref field, .. } if field == "extraneous"));
    }

    #[test]
    fn test_failsafe_skips_broken_element() {
        let doc = submodel_doc(
            r#"{ "modelType": "Property", "idShort": "bad", "valueType": "xs:int", "value": "x" },
               { "modelType": "Capability", "idShort": "good" }"#,
        );
        let env = Json::with_options(CodecOptions::failsafe())
            .read(doc.as_bytes())
            .unwrap();
        let sm = env.submodel("urn:sm").unwrap();
        assert!(sm.elements().contains("good"));
        assert!(!sm.elements().contains("bad"));
    }

    #[test]
    fn test_validate_parses_whole_document() {
        let json = Json::new();
        assert!(json.validate(br#"{ "submodels": [] }"#).is_ok());
        assert!(json.validate(br#"{"submodels": [ {"modelType": "#).is_err());
        assert!(json.validate(br#"{ "a": 1 } trailing"#).is_err());
        assert!(json.validate(b"[]").is_err());
    }

    #[test]
    fn test_write_identifiable_roundtrip() {
        let mut sm = Submodel::new(Identifier::iri("urn:sm").unwrap(), "sm").unwrap();
        sm.elements_mut()
            .add(Property::new("t", DataTypeDefXsd::Double, Some("21.5")).unwrap().into())
            .unwrap();
        let json = Json::new();
        let bytes = json
            .write_identifiable(crate::model::IdentifiableRef::Submodel(&sm))
            .unwrap();
        let back = json.read_identifiable(&bytes).unwrap();
        assert_eq!(back, sm.into());
    }
}
