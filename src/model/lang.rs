//! Multi-language text.

use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;

use super::error::{Constraint, ModelError};

static LANGUAGE_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z]{2,8}(-[a-zA-Z0-9]{1,8})*$")
        .unwrap_or_else(|e| panic!("invalid language tag grammar: {e}"))
});

/// Returns true if `tag` is a well-formed BCP 47 language tag.
pub fn is_language_tag(tag: &str) -> bool {
    LANGUAGE_TAG.is_match(tag)
}

/// A mapping from language tag to text.
///
/// Equality ignores insertion order; iteration and encoding preserve it.
#[derive(Clone, Debug, Default)]
pub struct LangStringSet {
    entries: IndexMap<String, String>,
}

impl LangStringSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from `(language, text)` pairs.
    pub fn from_pairs<L, T>(pairs: impl IntoIterator<Item = (L, T)>) -> Result<Self, ModelError>
    where
        L: Into<String>,
        T: Into<String>,
    {
        let mut set = Self::new();
        for (language, text) in pairs {
            set.insert(language, text)?;
        }
        Ok(set)
    }

    /// Insert or replace the text for `language`.
    ///
    /// Replacing keeps the original position of the language.
    pub fn insert(
        &mut self,
        language: impl Into<String>,
        text: impl Into<String>,
    ) -> Result<Option<String>, ModelError> {
        let language = language.into();
        if !is_language_tag(&language) {
            return Err(ModelError::violation(
                Constraint::LanguageTag,
                format!("`{language}` is not a language tag"),
            ));
        }
        Ok(self.entries.insert(language, text.into()))
    }

    pub fn get(&self, language: &str) -> Option<&str> {
        self.entries.get(language).map(String::as_str)
    }

    pub fn remove(&mut self, language: &str) -> Option<String> {
        self.entries.shift_remove(language)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(l, t)| (l.as_str(), t.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PartialEq for LangStringSet {
    fn eq(&self, other: &Self) -> bool {
        // IndexMap equality is already order-insensitive
        self.entries == other.entries
    }
}

impl Eq for LangStringSet {}
