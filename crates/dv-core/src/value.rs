//! Shared configuration values
//!
//! Panel options, field config defaults, matcher options and override values
//! are all plain JSON documents. `ConfigValue` keeps them as a persistent tree:
//! objects and arrays sit behind `Arc`, so updating one nested property only
//! copies the nodes along the updated path while every other subtree is shared
//! with the previous version.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// Ordered object map used for config objects
pub type ConfigMap = IndexMap<String, ConfigValue>;

static NULL_VALUE: ConfigValue = ConfigValue::Null;

/// A JSON value with structurally shared objects and arrays
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum ConfigValue {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Arc<Vec<ConfigValue>>),
    Object(Arc<ConfigMap>),
}

/// One step of a property path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// Object key (`a` in `a.b`)
    Key(String),
    /// Array index (`2` in `a[2]`)
    Index(usize),
}

impl ConfigValue {
    /// Create an empty object
    pub fn object() -> Self {
        ConfigValue::Object(Arc::new(ConfigMap::new()))
    }

    /// Create an object from key/value pairs
    pub fn from_pairs<K, I>(pairs: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, ConfigValue)>,
    {
        ConfigValue::Object(Arc::new(
            pairs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }

    /// Create an array from values
    pub fn array(items: Vec<ConfigValue>) -> Self {
        ConfigValue::Array(Arc::new(items))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ConfigValue::Null)
    }

    /// True for `null` and the empty string, the two values an editor uses to
    /// clear a setting
    pub fn is_unset_marker(&self) -> bool {
        match self {
            ConfigValue::Null => true,
            ConfigValue::String(s) => s.is_empty(),
            _ => false,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ConfigValue::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ConfigValue::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[ConfigValue]> {
        match self {
            ConfigValue::Array(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ConfigMap> {
        match self {
            ConfigValue::Object(map) => Some(map.as_ref()),
            _ => None,
        }
    }

    pub fn is_object(&self) -> bool {
        matches!(self, ConfigValue::Object(_))
    }

    /// Look up a direct child key of an object
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.as_object().and_then(|map| map.get(key))
    }

    /// Look up a nested value by dotted/bracketed path (`a.b[2].c`)
    pub fn get_path(&self, path: &str) -> Option<&ConfigValue> {
        get_segments(self, &parse_path(path))
    }

    /// Whether both values point at the same shared node.
    ///
    /// Scalars never share a node.
    pub fn shares_node(&self, other: &ConfigValue) -> bool {
        match (self, other) {
            (ConfigValue::Object(a), ConfigValue::Object(b)) => Arc::ptr_eq(a, b),
            (ConfigValue::Array(a), ConfigValue::Array(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Convert into a plain `serde_json::Value`
    pub fn to_json(&self) -> Value {
        Value::from(self.clone())
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::String(s) => write!(f, "{}", s),
            other => write!(f, "{}", other.to_json()),
        }
    }
}

impl From<Value> for ConfigValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => ConfigValue::Null,
            Value::Bool(b) => ConfigValue::Bool(b),
            Value::Number(n) => ConfigValue::Number(n),
            Value::String(s) => ConfigValue::String(s),
            Value::Array(items) => {
                ConfigValue::Array(Arc::new(items.into_iter().map(ConfigValue::from).collect()))
            }
            Value::Object(map) => ConfigValue::Object(Arc::new(
                map.into_iter().map(|(k, v)| (k, ConfigValue::from(v))).collect(),
            )),
        }
    }
}

impl From<ConfigValue> for Value {
    fn from(value: ConfigValue) -> Self {
        match value {
            ConfigValue::Null => Value::Null,
            ConfigValue::Bool(b) => Value::Bool(b),
            ConfigValue::Number(n) => Value::Number(n),
            ConfigValue::String(s) => Value::String(s),
            ConfigValue::Array(items) => {
                Value::Array(items.iter().cloned().map(Value::from).collect())
            }
            ConfigValue::Object(map) => Value::Object(
                map.iter().map(|(k, v)| (k.clone(), Value::from(v.clone()))).collect(),
            ),
        }
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        ConfigValue::Bool(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        ConfigValue::Number(value.into())
    }
}

impl From<f64> for ConfigValue {
    fn from(value: f64) -> Self {
        Number::from_f64(value)
            .map(ConfigValue::Number)
            .unwrap_or(ConfigValue::Null)
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::String(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        ConfigValue::String(value)
    }
}

impl<T: Into<ConfigValue>> From<Option<T>> for ConfigValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(ConfigValue::Null)
    }
}

/// Split a property path into segments.
///
/// `a.b[2].c` becomes `Key(a) Key(b) Index(2) Key(c)`. A dot segment whose
/// brackets don't hold a valid index is kept as a literal key.
pub fn parse_path(path: &str) -> Vec<PathSegment> {
    let mut segments = Vec::new();
    if path.is_empty() {
        return segments;
    }

    for part in path.split('.') {
        match part.find('[') {
            None => segments.push(PathSegment::Key(part.to_string())),
            Some(open) => match parse_indices(&part[open..]) {
                Some(indices) => {
                    if open > 0 {
                        segments.push(PathSegment::Key(part[..open].to_string()));
                    }
                    segments.extend(indices.into_iter().map(PathSegment::Index));
                }
                None => segments.push(PathSegment::Key(part.to_string())),
            },
        }
    }

    segments
}

/// Parse a run of `[n]` groups
fn parse_indices(mut rest: &str) -> Option<Vec<usize>> {
    let mut indices = Vec::new();
    while !rest.is_empty() {
        let inner = rest.strip_prefix('[')?;
        let close = inner.find(']')?;
        indices.push(inner[..close].trim().parse::<usize>().ok()?);
        rest = &inner[close + 1..];
    }
    Some(indices)
}

fn get_segments<'a>(node: &'a ConfigValue, segments: &[PathSegment]) -> Option<&'a ConfigValue> {
    let Some((head, rest)) = segments.split_first() else {
        return Some(node);
    };

    let child = match (head, node) {
        (PathSegment::Key(key), ConfigValue::Object(map)) => map.get(key)?,
        (PathSegment::Index(index), ConfigValue::Array(items)) => items.get(*index)?,
        // `a.0` addresses arrays too
        (PathSegment::Key(key), ConfigValue::Array(items)) => items.get(key.parse::<usize>().ok()?)?,
        _ => return None,
    };

    get_segments(child, rest)
}

/// Largest number of `null` slots an array may be padded with by one update
pub const MAX_ARRAY_PADDING: usize = 1024;

/// Return a copy of `root` with the value at `path` replaced.
///
/// Only the objects and arrays along the path are copied; every other subtree
/// is shared with `root`, which is left untouched. Missing or non-container
/// intermediates are replaced by an empty object (key segment) or an empty
/// array (index segment). A numeric key on an existing array addresses an
/// element, like `get_path` does. Arrays grow with `null` padding when the
/// index is past the end, by at most [`MAX_ARRAY_PADDING`] slots; an index
/// further out leaves `root` unchanged.
pub fn set_immutably(root: &ConfigValue, path: &str, value: ConfigValue) -> ConfigValue {
    match set_segments(root, &parse_path(path), value) {
        Some(updated) => updated,
        None => {
            tracing::debug!("Index out of range in path '{}', value not set", path);
            root.clone()
        }
    }
}

/// Index addressed by a segment on `node`, when `node` is an array
fn array_index(segment: &PathSegment, node: &ConfigValue) -> Option<usize> {
    match (segment, node) {
        (PathSegment::Index(index), _) => Some(*index),
        (PathSegment::Key(key), ConfigValue::Array(_)) => key.parse::<usize>().ok(),
        _ => None,
    }
}

fn set_segments(node: &ConfigValue, segments: &[PathSegment], value: ConfigValue) -> Option<ConfigValue> {
    let Some((head, rest)) = segments.split_first() else {
        return Some(value);
    };

    if let Some(index) = array_index(head, node) {
        let mut items = match node {
            ConfigValue::Array(items) => items.as_ref().clone(),
            _ => Vec::new(),
        };
        if items.len() <= index {
            if index - items.len() >= MAX_ARRAY_PADDING {
                return None;
            }
            items.resize(index + 1, ConfigValue::Null);
        }
        let next = set_segments(&items[index], rest, value)?;
        items[index] = next;
        return Some(ConfigValue::Array(Arc::new(items)));
    }

    let PathSegment::Key(key) = head else {
        return None;
    };
    let mut map = match node {
        ConfigValue::Object(map) => map.as_ref().clone(),
        _ => ConfigMap::new(),
    };
    let next = {
        let current = map.get(key).unwrap_or(&NULL_VALUE);
        set_segments(current, rest, value)?
    };
    map.insert(key.clone(), next);
    Some(ConfigValue::Object(Arc::new(map)))
}

/// Return a copy of `root` with the value at `path` removed.
///
/// Object keys are removed (keeping the order of the remaining keys), array
/// slots are reset to `null`. When nothing lives at `path` the result shares
/// the whole of `root`.
pub fn unset_immutably(root: &ConfigValue, path: &str) -> ConfigValue {
    let segments = parse_path(path);
    if get_segments(root, &segments).is_none() {
        return root.clone();
    }
    unset_segments(root, &segments)
}

fn unset_segments(node: &ConfigValue, segments: &[PathSegment]) -> ConfigValue {
    let Some((head, rest)) = segments.split_first() else {
        return ConfigValue::Null;
    };

    match (array_index(head, node), node) {
        (Some(index), ConfigValue::Array(items)) if index < items.len() => {
            let mut items = items.as_ref().clone();
            items[index] = if rest.is_empty() {
                ConfigValue::Null
            } else {
                unset_segments(&items[index], rest)
            };
            ConfigValue::Array(Arc::new(items))
        }
        (None, ConfigValue::Object(map)) => {
            let PathSegment::Key(key) = head else {
                return node.clone();
            };
            let mut map = map.as_ref().clone();
            if rest.is_empty() {
                map.shift_remove(key);
            } else if let Some(child) = map.get(key) {
                let next = unset_segments(child, rest);
                map.insert(key.clone(), next);
            }
            ConfigValue::Object(Arc::new(map))
        }
        _ => node.clone(),
    }
}

/// Deep-merge `defaults` under `current`.
///
/// Values present in `current` win; objects are merged key by key, anything
/// else (arrays included) is taken whole. Keys from `defaults` come first in
/// the result. Subtrees that need no merging are shared.
pub fn merge_defaults(defaults: &ConfigValue, current: &ConfigValue) -> ConfigValue {
    match (defaults, current) {
        (ConfigValue::Object(base), ConfigValue::Object(over)) => {
            if base.is_empty() {
                return current.clone();
            }
            let mut merged = ConfigMap::with_capacity(base.len() + over.len());
            for (key, value) in base.iter() {
                let next = match over.get(key) {
                    Some(own) => merge_defaults(value, own),
                    None => value.clone(),
                };
                merged.insert(key.clone(), next);
            }
            for (key, value) in over.iter() {
                if !merged.contains_key(key) {
                    merged.insert(key.clone(), value.clone());
                }
            }
            ConfigValue::Object(Arc::new(merged))
        }
        (_, ConfigValue::Null) => defaults.clone(),
        _ => current.clone(),
    }
}
