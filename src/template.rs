//! Templates, substitution values and the two marker syntaxes.
//!
//! A template is plain SQL text in which `{key}` stands for an identifier
//! (table or column name) and `%key%` stands for a runtime value. Keys are
//! bare names made of ASCII letters, digits and underscores.
//!
//! There is no escape syntax. Doubled braces are ordinary text, so
//! `'{{k}}'` still contains the marker `{k}` and compiles to `'{"t"}'` when
//! `k` is bound to `t`.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::Result;

lazy_static! {
    static ref KEY: Regex = Regex::new(r"^[A-Za-z0-9_]+$").unwrap();
    static ref IDENTIFIER_MARKER: Regex = Regex::new(r"\{([A-Za-z0-9_]+)\}").unwrap();
}

/// Returns true when `key` can appear inside a marker.
pub fn is_valid_key(key: &str) -> bool {
    KEY.is_match(key)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerKind {
    /// `{key}`
    Identifier,
    /// `%key%`
    Value,
}

impl MarkerKind {
    pub fn marker(&self, key: &str) -> String {
        match self {
            MarkerKind::Identifier => format!("{{{key}}}"),
            MarkerKind::Value => format!("%{key}%"),
        }
    }
}

/// An immutable SQL skeleton.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    text: String,
}

impl Template {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(std::fs::read_to_string(path)?))
    }
    pub fn text(&self) -> &str {
        &self.text
    }
    /// Byte offset of the first occurrence of the marker for `key`.
    pub fn find(&self, kind: MarkerKind, key: &str) -> Option<usize> {
        self.text.find(&kind.marker(key))
    }
    /// Byte offset of a second occurrence of the marker, searching from one
    /// past the first so that overlapping repeats like `%k%k%` are found.
    pub fn find_repeat(&self, kind: MarkerKind, key: &str, first: usize) -> Option<usize> {
        let start = first + 1;
        self.text
            .get(start..)
            .and_then(|rest| rest.find(&kind.marker(key)))
            .map(|offset| start + offset)
    }
    /// Keys of every `{key}` marker, in order of appearance.
    pub fn identifier_keys(&self) -> impl Iterator<Item = &str> {
        IDENTIFIER_MARKER
            .captures_iter(&self.text)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str())
    }
}

impl From<&str> for Template {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for Template {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// What a key is substituted with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    Single(String),
    List(Vec<String>),
}

impl Binding {
    pub fn len(&self) -> usize {
        match self {
            Binding::Single(_) => 1,
            Binding::List(items) => items.len(),
        }
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
    pub fn items(&self) -> &[String] {
        match self {
            Binding::Single(item) => std::slice::from_ref(item),
            Binding::List(items) => items,
        }
    }
}

impl From<&str> for Binding {
    fn from(value: &str) -> Self {
        Binding::Single(value.to_string())
    }
}

impl From<String> for Binding {
    fn from(value: String) -> Self {
        Binding::Single(value)
    }
}

impl<S: Into<String>> From<Vec<S>> for Binding {
    fn from(values: Vec<S>) -> Self {
        Binding::List(values.into_iter().map(Into::into).collect())
    }
}

impl<S: Into<String> + Clone> From<&[S]> for Binding {
    fn from(values: &[S]) -> Self {
        Binding::List(values.iter().cloned().map(Into::into).collect())
    }
}

/// A substitution request: key to binding, built per call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Substitutions {
    bindings: BTreeMap<String, Binding>,
}

impl Substitutions {
    pub fn new() -> Self {
        Self::default()
    }
    /// Builder style insert.
    pub fn with(mut self, key: impl Into<String>, binding: impl Into<Binding>) -> Self {
        self.insert(key, binding);
        self
    }
    pub fn insert(&mut self, key: impl Into<String>, binding: impl Into<Binding>) -> Option<Binding> {
        self.bindings.insert(key.into(), binding.into())
    }
    pub fn get(&self, key: &str) -> Option<&Binding> {
        self.bindings.get(key)
    }
    pub fn contains_key(&self, key: &str) -> bool {
        self.bindings.contains_key(key)
    }
    pub fn len(&self) -> usize {
        self.bindings.len()
    }
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Binding)> {
        self.bindings.iter().map(|(k, b)| (k.as_str(), b))
    }
}

impl<K: Into<String>, B: Into<Binding>> FromIterator<(K, B)> for Substitutions {
    fn from_iter<I: IntoIterator<Item = (K, B)>>(iter: I) -> Self {
        let mut substitutions = Substitutions::new();
        for (key, binding) in iter {
            substitutions.insert(key, binding);
        }
        substitutions
    }
}
