//! Embedded data specifications and the IEC 61360 content template.

use super::error::{Constraint, ModelError};
use super::lang::LangStringSet;
use super::reference::Reference;

/// A data-specification template reference plus its content.
#[derive(Clone, Debug, PartialEq)]
pub struct EmbeddedDataSpecification {
    pub data_specification: Reference,
    pub content: DataSpecificationContent,
}

/// Content payload of an embedded data specification.
#[derive(Clone, Debug, PartialEq)]
pub enum DataSpecificationContent {
    Iec61360(DataSpecificationIec61360),
}

impl DataSpecificationContent {
    pub fn model_type(&self) -> &'static str {
        match self {
            Self::Iec61360(_) => "DataSpecificationIec61360",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DataTypeIec61360 {
    Date,
    String,
    StringTranslatable,
    IntegerMeasure,
    IntegerCount,
    IntegerCurrency,
    RealMeasure,
    RealCount,
    RealCurrency,
    Boolean,
    Iri,
    Irdi,
    Rational,
    RationalMeasure,
    Time,
    Timestamp,
    File,
    Html,
    Blob,
}

impl DataTypeIec61360 {
    pub const ALL: [Self; 19] = [
        Self::Date,
        Self::String,
        Self::StringTranslatable,
        Self::IntegerMeasure,
        Self::IntegerCount,
        Self::IntegerCurrency,
        Self::RealMeasure,
        Self::RealCount,
        Self::RealCurrency,
        Self::Boolean,
        Self::Iri,
        Self::Irdi,
        Self::Rational,
        Self::RationalMeasure,
        Self::Time,
        Self::Timestamp,
        Self::File,
        Self::Html,
        Self::Blob,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Date => "DATE",
            Self::String => "STRING",
            Self::StringTranslatable => "STRING_TRANSLATABLE",
            Self::IntegerMeasure => "INTEGER_MEASURE",
            Self::IntegerCount => "INTEGER_COUNT",
            Self::IntegerCurrency => "INTEGER_CURRENCY",
            Self::RealMeasure => "REAL_MEASURE",
            Self::RealCount => "REAL_COUNT",
            Self::RealCurrency => "REAL_CURRENCY",
            Self::Boolean => "BOOLEAN",
            Self::Iri => "IRI",
            Self::Irdi => "IRDI",
            Self::Rational => "RATIONAL",
            Self::RationalMeasure => "RATIONAL_MEASURE",
            Self::Time => "TIME",
            Self::Timestamp => "TIMESTAMP",
            Self::File => "FILE",
            Self::Html => "HTML",
            Self::Blob => "BLOB",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }
}

/// Which level values (min/nom/typ/max) a property carries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LevelType {
    pub min: bool,
    pub nom: bool,
    pub typ: bool,
    pub max: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValueReferencePair {
    pub value: String,
    pub value_id: Reference,
}

/// Non-empty list of allowed values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValueList {
    pairs: Vec<ValueReferencePair>,
}

impl ValueList {
    pub fn new(pairs: Vec<ValueReferencePair>) -> Result<Self, ModelError> {
        if pairs.is_empty() {
            return Err(ModelError::violation(
                Constraint::Iec61360ValueList,
                "value list is empty",
            ));
        }
        Ok(Self { pairs })
    }

    pub fn pairs(&self) -> &[ValueReferencePair] {
        &self.pairs
    }
}

/// IEC 61360 concept description content.
#[derive(Clone, Debug, PartialEq)]
pub struct DataSpecificationIec61360 {
    preferred_name: LangStringSet,
    pub short_name: LangStringSet,
    pub unit: Option<String>,
    pub unit_id: Option<Reference>,
    pub source_of_definition: Option<String>,
    pub symbol: Option<String>,
    pub data_type: Option<DataTypeIec61360>,
    pub definition: LangStringSet,
    pub value_format: Option<String>,
    pub value_list: Option<ValueList>,
    pub value: Option<String>,
    pub level_type: Option<LevelType>,
}

impl DataSpecificationIec61360 {
    pub fn new(preferred_name: LangStringSet) -> Result<Self, ModelError> {
        if preferred_name.is_empty() {
            return Err(ModelError::violation(
                Constraint::Iec61360PreferredName,
                "preferred name needs at least one language",
            ));
        }
        Ok(Self {
            preferred_name,
            short_name: LangStringSet::new(),
            unit: None,
            unit_id: None,
            source_of_definition: None,
            symbol: None,
            data_type: None,
            definition: LangStringSet::new(),
            value_format: None,
            value_list: None,
            value: None,
            level_type: None,
        })
    }

    pub fn preferred_name(&self) -> &LangStringSet {
        &self.preferred_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preferred_name_required() {
        let err = DataSpecificationIec61360::new(LangStringSet::new()).unwrap_err();
        assert_eq!(err.constraint(), Some(Constraint::Iec61360PreferredName));
    }

    #[test]
    fn test_value_list_non_empty() {
        assert!(ValueList::new(Vec::new()).is_err());
    }

    #[test]
    fn test_iec_data_type_names() {
        for t in DataTypeIec61360::ALL {
            assert_eq!(DataTypeIec61360::from_name(t.as_str()), Some(t));
        }
    }
}
