//! Language-keyed values with fallback lookup.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A value that may differ per language.
///
/// Absence and emptiness are different things: `set("zh", String::new())`
/// records a real (empty) Chinese value, while a language that was never
/// set is missing and triggers the fallback in [`Localized::get`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Localized<T> {
    values: BTreeMap<String, T>,
}

impl<T> Default for Localized<T> {
    fn default() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }
}

impl<T> Localized<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-language value.
    pub fn from_value(lang: &str, value: T) -> Self {
        let mut localized = Self::new();
        localized.set(lang, value);
        localized
    }

    /// Value for `lang`, else for `fallback`, else `None`.
    pub fn get(&self, lang: &str, fallback: &str) -> Option<&T> {
        self.values.get(lang).or_else(|| self.values.get(fallback))
    }

    /// Value for `lang` only, no fallback.
    pub fn get_exact(&self, lang: &str) -> Option<&T> {
        self.values.get(lang)
    }

    pub fn set(&mut self, lang: &str, value: T) {
        self.values.insert(lang.to_string(), value);
    }

    pub fn has(&self, lang: &str) -> bool {
        self.values.contains_key(lang)
    }

    /// Languages with a value, in code order.
    pub fn languages(&self) -> Vec<&str> {
        self.values.keys().map(String::as_str).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<T: Clone> Localized<T> {
    /// Copy `other`'s value for `lang` into `self`, if it has one.
    /// Returns whether anything was copied.
    pub fn absorb(&mut self, other: &Localized<T>, lang: &str) -> bool {
        match other.get_exact(lang) {
            Some(value) => {
                self.set(lang, value.clone());
                true
            }
            None => false,
        }
    }
}
