//! Sorting requested keys into identifiers and values.

use std::collections::BTreeMap;

use crate::error::{Result, StencilError};
use crate::template::{is_valid_key, Binding, MarkerKind, Substitutions, Template};

/// A binding together with the byte offset of its marker in the original template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placed {
    pub offset: usize,
    pub binding: Binding,
}

/// Two disjoint buckets of keys, partitioned by the marker syntax they matched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifiedKeys {
    pub identifiers: BTreeMap<String, Placed>,
    pub values: BTreeMap<String, Placed>,
}

impl ClassifiedKeys {
    pub fn identifier(&self, key: &str) -> Option<&Binding> {
        self.identifiers.get(key).map(|p| &p.binding)
    }
    pub fn value(&self, key: &str) -> Option<&Binding> {
        self.values.get(key).map(|p| &p.binding)
    }
    pub fn len(&self) -> usize {
        self.identifiers.len() + self.values.len()
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
    /// Value keys in the order their markers appear in the template.
    pub fn values_in_order(&self) -> Vec<(&str, &Placed)> {
        let mut ordered: Vec<_> = self.values.iter().map(|(k, p)| (k.as_str(), p)).collect();
        ordered.sort_by_key(|(_, p)| p.offset);
        ordered
    }
}

/// Decide for every requested key whether it is an identifier or a value.
///
/// Fails on the first key that is malformed, absent from the template, used
/// under both marker syntaxes, or used more than once.
pub fn classify(template: &Template, request: &Substitutions) -> Result<ClassifiedKeys> {
    let mut classified = ClassifiedKeys::default();
    for (key, binding) in request.iter() {
        if !is_valid_key(key) {
            return Err(StencilError::InvalidKey { key: key.to_string() });
        }
        let identifier = template.find(MarkerKind::Identifier, key);
        let value = template.find(MarkerKind::Value, key);
        let (kind, offset) = match (identifier, value) {
            (Some(_), Some(_)) => {
                return Err(StencilError::AmbiguousKeyUsage { key: key.to_string() });
            }
            (Some(offset), None) => (MarkerKind::Identifier, offset),
            (None, Some(offset)) => (MarkerKind::Value, offset),
            (None, None) => {
                return Err(StencilError::KeyNotFoundInTemplate { key: key.to_string() });
            }
        };
        if template.find_repeat(kind, key, offset).is_some() {
            return Err(StencilError::RepeatedKeyUsage { key: key.to_string() });
        }
        let placed = Placed { offset, binding: binding.clone() };
        match kind {
            MarkerKind::Identifier => classified.identifiers.insert(key.to_string(), placed),
            MarkerKind::Value => classified.values.insert(key.to_string(), placed),
        };
    }
    Ok(classified)
}
