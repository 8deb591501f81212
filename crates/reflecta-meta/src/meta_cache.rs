//! Precomputed metadata
//!
//! A table built ahead of time, keyed by fully qualified type name. When
//! it has an entry for a declaration, that entry is the answer; sources
//! are not consulted.
//!
//! ```json
//! {
//!   "app\\User": {
//!     "class": { "annotations": { "table": "users" }, "comment": "A user" },
//!     "properties": { "id": { "annotations": { "id": null }, "type": "int" } },
//!     "methods": {
//!       "find": { "return": "?self", "params": [{ "name": "id", "type": "int" }] }
//!     },
//!     "virtual": { "age": { "type": "int", "writable": false } },
//!     "aliases": { "table": "orm\\Table", "id": "orm\\Id" }
//!   }
//! }
//! ```

use crate::annotations::{Annotation, Annotations};
use crate::error::{MetaError, MetaResult};
use crate::scope::short_name;
use crate::value::{Array, Value};
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Annotation name → arguments as JSON.
pub type RawAnnotations = IndexMap<String, serde_json::Value>;

/// Metadata of a type, constant or property.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemberMeta {
    pub annotations: RawAnnotations,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub ty: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterMeta {
    pub name: String,
    pub annotations: RawAnnotations,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub ty: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MethodMeta {
    pub annotations: RawAnnotations,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(rename = "return", skip_serializing_if = "Option::is_none")]
    pub returns: Option<String>,
    pub params: Vec<ParameterMeta>,
}

impl MethodMeta {
    pub fn param(&self, name: &str) -> Option<&ParameterMeta> {
        self.params.iter().find(|p| p.name == name)
    }
}

/// A property that exists only in metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VirtualMeta {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub ty: Option<String>,
    pub readable: bool,
    pub writable: bool,
}

impl Default for VirtualMeta {
    fn default() -> Self {
        Self {
            ty: None,
            readable: true,
            writable: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetaEntry {
    pub class: MemberMeta,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// Class imports of the declaring file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imports: Option<IndexMap<String, String>>,
    pub constants: IndexMap<String, MemberMeta>,
    pub properties: IndexMap<String, MemberMeta>,
    pub methods: IndexMap<String, MethodMeta>,
    #[serde(rename = "virtual")]
    pub virtual_properties: IndexMap<String, VirtualMeta>,
    /// Short or lowercase annotation name → fully qualified name
    pub aliases: IndexMap<String, String>,
}

impl MetaEntry {
    /// Method names are case-insensitive.
    pub fn method(&self, name: &str) -> Option<&MethodMeta> {
        self.methods
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, m)| m)
    }

    /// Fully qualified name of an annotation as recorded.
    pub fn resolve_alias(&self, name: &str) -> String {
        let name = name.trim_start_matches('\\');
        let lower = name.to_ascii_lowercase();
        let short = short_name(&lower);
        self.aliases
            .get(name)
            .or_else(|| self.aliases.get(&lower))
            .or_else(|| self.aliases.get(short))
            .map(|target| target.trim_start_matches('\\').to_string())
            .unwrap_or_else(|| name.to_string())
    }

    pub fn annotations(&self, raw: &RawAnnotations) -> Annotations {
        raw.iter()
            .map(|(name, value)| Annotation::new(self.resolve_alias(name), arguments_from_json(value)))
            .collect()
    }
}

/// `null` → no arguments, array → positional, object → named, anything
/// else → one positional argument.
pub fn arguments_from_json(value: &serde_json::Value) -> Array {
    match Value::from(value.clone()) {
        Value::Null => Array::new(),
        Value::Array(arguments) => arguments,
        single => Array::list([single]),
    }
}

/// Entries keyed by type name (case-insensitive).
#[derive(Debug, Clone, Default)]
pub struct MetaCache {
    entries: FxHashMap<String, MetaEntry>,
}

fn key(type_name: &str) -> String {
    type_name.trim_start_matches('\\').to_ascii_lowercase()
}

impl MetaCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, type_name: &str, entry: MetaEntry) {
        self.entries.insert(key(type_name), entry);
    }

    pub fn get(&self, type_name: &str) -> Option<&MetaEntry> {
        self.entries.get(&key(type_name))
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.entries.contains_key(&key(type_name))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn from_json_str(json: &str) -> MetaResult<Self> {
        let raw: IndexMap<String, MetaEntry> = serde_json::from_str(json)
            .map_err(|err| MetaError::Options(format!("meta cache: {}", err)))?;
        let mut cache = MetaCache::new();
        for (type_name, entry) in raw {
            cache.insert(&type_name, entry);
        }
        debug!(entries = cache.len(), "loaded meta cache");
        Ok(cache)
    }

    pub fn load(path: &Path) -> MetaResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|err| MetaError::Options(format!("{}: {}", path.display(), err)))?;
        Self::from_json_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ArrayKey;

    const JSON: &str = r#"{
        "\\app\\User": {
            "class": { "annotations": { "table": "users", "cached": null }, "comment": "A user" },
            "properties": {
                "id": { "annotations": { "Column": { "name": "user_id", "size": 11 } }, "type": "int" }
            },
            "methods": {
                "Find": { "return": "?self", "params": [{ "name": "id", "annotations": { "range": [1, 10] } }] }
            },
            "virtual": { "age": { "type": "int", "writable": false } },
            "aliases": { "table": "orm\\Table", "column": "\\orm\\Column" }
        }
    }"#;

    #[test]
    fn test_loads_entries_case_insensitively() {
        let cache = MetaCache::from_json_str(JSON).unwrap();
        assert_eq!(cache.len(), 1);
        assert!(cache.contains("APP\\USER"));
        assert!(cache.get("app\\Other").is_none());
    }

    #[test]
    fn test_annotation_values() {
        let cache = MetaCache::from_json_str(JSON).unwrap();
        let entry = cache.get("app\\User").unwrap();

        let class = entry.annotations(&entry.class.annotations);
        let names: Vec<_> = class.iter().map(|a| a.type_name.as_str()).collect();
        assert_eq!(names, ["orm\\Table", "cached"]);
        assert_eq!(class.get("Table").unwrap().arguments, Array::list([Value::from("users")]));
        assert!(class.get("cached").unwrap().is_marker());

        let column = entry.annotations(&entry.properties["id"].annotations);
        let column = column.get("orm\\Column").unwrap();
        assert_eq!(column.argument("name"), Some(&Value::from("user_id")));
        assert_eq!(column.argument(ArrayKey::Int(0)), None);
    }

    #[test]
    fn test_methods_and_virtual_properties() {
        let cache = MetaCache::from_json_str(JSON).unwrap();
        let entry = cache.get("app\\User").unwrap();
        let find = entry.method("find").unwrap();
        assert_eq!(find.returns.as_deref(), Some("?self"));
        let range = entry.annotations(&find.param("id").unwrap().annotations);
        assert_eq!(
            range.get("range").unwrap().arguments,
            Array::list([Value::Int(1), Value::Int(10)])
        );

        let age = &entry.virtual_properties["age"];
        assert!(age.readable);
        assert!(!age.writable);
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(MetaCache::from_json_str("{"), Err(MetaError::Options(_))));
    }
}
