// src/manifest/aliases.rs

//! Alias table: human-readable names mapped to package identifiers

use crate::error::{Error, Result};
use indexmap::IndexMap;
use serde_json::{Map, Value};

/// Ordered mapping from alias name to package identifier
///
/// Insertion order is kept so that rewriting the manifest does not shuffle
/// existing aliases.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasTable {
    entries: IndexMap<String, String>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the manifest's `packageAliases` object
    pub fn from_json(value: &Value) -> Result<Self> {
        let object = value.as_object().ok_or_else(|| {
            Error::ManifestParseError("packageAliases must be an object".to_string())
        })?;

        let mut table = Self::new();
        for (alias, id) in object {
            let id = id.as_str().ok_or_else(|| {
                Error::ManifestParseError(format!(
                    "packageAliases entry '{}' must map to a string identifier",
                    alias
                ))
            })?;
            table.insert(alias.clone(), id.to_string());
        }

        Ok(table)
    }

    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .iter()
            .map(|(alias, id)| (alias.to_string(), Value::String(id.to_string())))
            .collect();
        Value::Object(map)
    }

    /// Identifier registered for an alias
    pub fn id_for(&self, alias: &str) -> Option<&str> {
        self.entries.get(alias).map(String::as_str)
    }

    /// First alias registered for an identifier
    pub fn alias_for(&self, id: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, i)| i.as_str() == id)
            .map(|(alias, _)| alias.as_str())
    }

    pub fn contains_alias(&self, alias: &str) -> bool {
        self.entries.contains_key(alias)
    }

    /// Add or replace a mapping; an existing alias keeps its position
    pub fn insert(&mut self, alias: String, id: String) {
        self.entries.insert(alias, id);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(a, i)| (a.as_str(), i.as_str()))
    }
}
