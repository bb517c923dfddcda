//! Field matchers
//!
//! A matcher kind is a named predicate over a field plus the options the
//! user configured for it. Kinds are looked up by id; an id no longer known
//! to this version matches nothing.

use std::fmt;
use std::sync::Arc;

use dv_core::ConfigValue;
use dv_data::{DataFrame, FieldType, FrameField};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::editor::{EditorKind, SelectableValue};
use crate::source::MatcherConfig;

pub const BY_NAME: &str = "byName";
pub const BY_REGEXP: &str = "byRegexp";
pub const BY_TYPE: &str = "byType";
pub const BY_FRAME_REF_ID: &str = "byFrameRefID";
pub const BY_NAMES: &str = "byNames";

/// Predicate run with configured options against one field of a frame
pub type MatchFn = Arc<dyn Fn(&ConfigValue, &FrameField, &DataFrame) -> bool + Send + Sync>;

/// Short label describing configured options
pub type OptionsToLabelFn = Arc<dyn Fn(&ConfigValue) -> String + Send + Sync>;

/// A matcher kind together with how it is presented in the options pane
#[derive(Clone)]
pub struct FieldMatcherInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    pub editor: EditorKind,
    /// Kept out of the "add override" picker (system matchers)
    pub exclude_from_picker: bool,
    pub matches: MatchFn,
    pub options_to_label: OptionsToLabelFn,
}

impl FieldMatcherInfo {
    pub fn new<F>(id: &str, name: &str, description: &str, editor: EditorKind, matches: F) -> Self
    where
        F: Fn(&ConfigValue, &FrameField, &DataFrame) -> bool + Send + Sync + 'static,
    {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            editor,
            exclude_from_picker: false,
            matches: Arc::new(matches),
            options_to_label: Arc::new(|options: &ConfigValue| options.to_string()),
        }
    }

    pub fn excluded_from_picker(mut self) -> Self {
        self.exclude_from_picker = true;
        self
    }

    pub fn with_options_to_label<F>(mut self, f: F) -> Self
    where
        F: Fn(&ConfigValue) -> String + Send + Sync + 'static,
    {
        self.options_to_label = Arc::new(f);
        self
    }

    /// Run the predicate; unset options select nothing
    pub fn is_match(&self, options: Option<&ConfigValue>, field: &FrameField, frame: &DataFrame) -> bool {
        match options {
            Some(options) if !options.is_unset_marker() => (self.matches)(options, field, frame),
            _ => false,
        }
    }
}

impl fmt::Debug for FieldMatcherInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldMatcherInfo")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("exclude_from_picker", &self.exclude_from_picker)
            .finish()
    }
}

/// Matcher kinds keyed by id, in registration order
#[derive(Debug, Clone, Default)]
pub struct MatcherRegistry {
    matchers: IndexMap<String, FieldMatcherInfo>,
}

impl MatcherRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a matcher kind, replacing one with the same id
    pub fn register(&mut self, info: FieldMatcherInfo) {
        self.matchers.insert(info.id.clone(), info);
    }

    pub fn get(&self, id: &str) -> Option<&FieldMatcherInfo> {
        self.matchers.get(id)
    }

    pub fn list(&self) -> impl Iterator<Item = &FieldMatcherInfo> {
        self.matchers.values()
    }

    /// Choices for the "add field override" picker
    pub fn picker_options(&self) -> Vec<SelectableValue> {
        self.list()
            .filter(|info| !info.exclude_from_picker)
            .map(|info| SelectableValue::new(&info.name, &info.id).with_description(Some(info.description.clone())))
            .collect()
    }

    /// Whether a rule's matcher selects the field
    pub fn matches(&self, matcher: &MatcherConfig, field: &FrameField, frame: &DataFrame) -> bool {
        match self.get(&matcher.id) {
            Some(info) => info.is_match(matcher.options.as_ref(), field, frame),
            None => false,
        }
    }
}

fn field_names(field: &FrameField) -> [&str; 2] {
    [field.name.as_str(), field.display_name()]
}

fn match_by_name(options: &ConfigValue, field: &FrameField, _: &DataFrame) -> bool {
    options
        .as_str()
        .map_or(false, |name| field_names(field).contains(&name))
}

fn match_by_regexp(options: &ConfigValue, field: &FrameField, _: &DataFrame) -> bool {
    let Some(pattern) = options.as_str() else {
        return false;
    };
    match Regex::new(pattern) {
        Ok(regex) => field_names(field).iter().any(|name| regex.is_match(name)),
        Err(err) => {
            tracing::debug!("Ignoring invalid field name pattern '{}': {}", pattern, err);
            false
        }
    }
}

fn match_by_type(options: &ConfigValue, field: &FrameField, _: &DataFrame) -> bool {
    options
        .as_str()
        .and_then(FieldType::from_name)
        .map_or(false, |field_type| field.field_type == field_type)
}

fn match_by_frame_ref_id(options: &ConfigValue, _: &FrameField, frame: &DataFrame) -> bool {
    match (options.as_str(), frame.ref_id.as_deref()) {
        (Some(expected), Some(ref_id)) => expected == ref_id,
        _ => false,
    }
}

fn match_by_names(options: &ConfigValue, field: &FrameField, _: &DataFrame) -> bool {
    let listed = options
        .get("names")
        .and_then(|names| names.as_array())
        .map_or(false, |names| {
            names
                .iter()
                .filter_map(|name| name.as_str())
                .any(|name| field_names(field).contains(&name))
        });
    let exclude = options.get("mode").and_then(|mode| mode.as_str()) == Some("exclude");
    listed != exclude
}

fn names_label(options: &ConfigValue) -> String {
    let names: Vec<String> = options
        .get("names")
        .and_then(|names| names.as_array())
        .map(|names| names.iter().map(|name| name.to_string()).collect())
        .unwrap_or_default();
    let prefix = match options.get("mode").and_then(|mode| mode.as_str()) {
        Some("exclude") => "All except: ",
        _ => "",
    };
    format!("{}{}", prefix, names.join(", "))
}

static STANDARD_MATCHERS: Lazy<MatcherRegistry> = Lazy::new(|| {
    let mut registry = MatcherRegistry::new();
    registry.register(FieldMatcherInfo::new(
        BY_NAME,
        "Fields with name",
        "Set properties for a specific field",
        EditorKind::FieldName,
        match_by_name,
    ));
    registry.register(FieldMatcherInfo::new(
        BY_REGEXP,
        "Fields with name matching regex",
        "Set properties for fields with names matching a regex",
        EditorKind::Text,
        match_by_regexp,
    ));
    registry.register(FieldMatcherInfo::new(
        BY_TYPE,
        "Fields with type",
        "Set properties for fields of a specific type (number, string, boolean)",
        EditorKind::FieldType,
        match_by_type,
    ));
    registry.register(FieldMatcherInfo::new(
        BY_FRAME_REF_ID,
        "Fields returned by query",
        "Set properties for fields from a specific query",
        EditorKind::RefId,
        match_by_frame_ref_id,
    ));
    registry.register(
        FieldMatcherInfo::new(
            BY_NAMES,
            "Fields with names",
            "Set properties for a list of fields",
            EditorKind::FieldNames,
            match_by_names,
        )
        .excluded_from_picker()
        .with_options_to_label(names_label),
    );
    registry
});

/// The built-in matcher kinds
pub fn standard_matchers() -> &'static MatcherRegistry {
    &STANDARD_MATCHERS
}
