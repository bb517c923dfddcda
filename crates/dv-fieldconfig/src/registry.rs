//! Field config property registry
//!
//! Every property a panel can set per field (standard options such as unit
//! or min/max, plus the plugin's own custom options) is described once by a
//! [`FieldConfigPropertyItem`] when the plugin loads. The registry is
//! immutable afterwards.

use std::fmt;
use std::sync::Arc;

use dv_core::{set_immutably, ConfigValue};
use dv_data::{DataFrame, FrameField};
use indexmap::IndexMap;

use crate::editor::EditorKind;
use crate::FieldConfigError;

/// Prefix of custom property ids
pub const CUSTOM_ID_PREFIX: &str = "custom.";

/// Decides whether a property applies to a field
pub type ShouldApplyFn = Arc<dyn Fn(&FrameField) -> bool + Send + Sync>;

/// Normalizes a configured value before it lands in a field config
pub type ProcessFn = Arc<dyn Fn(&ConfigValue) -> ConfigValue + Send + Sync>;

/// Decides whether an option is shown, given the config it lives in and the
/// current data
pub type ShowIfFn = Arc<dyn Fn(&ConfigValue, &[DataFrame]) -> bool + Send + Sync>;

/// Counts the entries of a list-like value for the category header
pub type ItemsCountFn = Arc<dyn Fn(Option<&ConfigValue>) -> Option<usize> + Send + Sync>;

/// One field-configurable property
#[derive(Clone)]
pub struct FieldConfigPropertyItem {
    /// Unique id (`unit`, `custom.lineWidth`)
    pub id: String,

    /// Path inside the field config (inside `custom` for custom properties)
    pub path: String,

    /// Display name
    pub name: String,

    /// Optional help text
    pub description: Option<String>,

    /// Category path, first element picks the options pane category
    pub category: Option<Vec<String>>,

    /// Whether the value lives under `custom`
    pub is_custom: bool,

    /// Plugin-level default
    pub default_value: Option<ConfigValue>,

    /// Editor shown for the value
    pub editor: EditorKind,

    /// Editor settings (select options, min/max for sliders...)
    pub settings: ConfigValue,

    /// Rank in the "recent options" shortlist
    pub popular_rank: Option<u32>,

    /// Hide from the defaults pane (still available in overrides)
    pub hide_from_defaults: bool,

    /// Hide from the override property picker
    pub hide_from_overrides: bool,

    pub should_apply: ShouldApplyFn,
    pub process: ProcessFn,
    pub show_if: Option<ShowIfFn>,
    pub get_items_count: Option<ItemsCountFn>,
}

impl FieldConfigPropertyItem {
    /// A standard property stored directly on the field config
    pub fn standard(path: impl Into<String>, name: impl Into<String>) -> Self {
        let path = path.into();
        Self::build(path.clone(), path, name.into(), false)
    }

    /// A plugin property stored under `custom`
    pub fn custom(path: impl Into<String>, name: impl Into<String>) -> Self {
        let path = path.into();
        Self::build(format!("{}{}", CUSTOM_ID_PREFIX, path), path, name.into(), true)
    }

    fn build(id: String, path: String, name: String, is_custom: bool) -> Self {
        Self {
            id,
            path,
            name,
            description: None,
            category: None,
            is_custom,
            default_value: None,
            editor: EditorKind::Text,
            settings: ConfigValue::object(),
            popular_rank: None,
            hide_from_defaults: false,
            hide_from_overrides: false,
            should_apply: Arc::new(|_: &FrameField| true),
            process: Arc::new(|value: &ConfigValue| value.clone()),
            show_if: None,
            get_items_count: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_category(mut self, category: &[&str]) -> Self {
        self.category = Some(category.iter().map(|c| c.to_string()).collect());
        self
    }

    pub fn with_default(mut self, value: impl Into<ConfigValue>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn with_editor(mut self, editor: EditorKind) -> Self {
        self.editor = editor;
        self
    }

    pub fn with_settings(mut self, settings: ConfigValue) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_popular_rank(mut self, rank: u32) -> Self {
        self.popular_rank = Some(rank);
        self
    }

    pub fn hidden_from_defaults(mut self) -> Self {
        self.hide_from_defaults = true;
        self
    }

    pub fn hidden_from_overrides(mut self) -> Self {
        self.hide_from_overrides = true;
        self
    }

    pub fn with_should_apply<F>(mut self, f: F) -> Self
    where
        F: Fn(&FrameField) -> bool + Send + Sync + 'static,
    {
        self.should_apply = Arc::new(f);
        self
    }

    pub fn with_process<F>(mut self, f: F) -> Self
    where
        F: Fn(&ConfigValue) -> ConfigValue + Send + Sync + 'static,
    {
        self.process = Arc::new(f);
        self
    }

    pub fn with_show_if<F>(mut self, f: F) -> Self
    where
        F: Fn(&ConfigValue, &[DataFrame]) -> bool + Send + Sync + 'static,
    {
        self.show_if = Some(Arc::new(f));
        self
    }

    pub fn with_items_count<F>(mut self, f: F) -> Self
    where
        F: Fn(Option<&ConfigValue>) -> Option<usize> + Send + Sync + 'static,
    {
        self.get_items_count = Some(Arc::new(f));
        self
    }

    /// Path of the value inside a field config (`custom.` prefixed for custom
    /// properties)
    pub fn config_path(&self) -> String {
        if self.is_custom {
            format!("custom.{}", self.path)
        } else {
            self.path.clone()
        }
    }

    /// Whether the property is shown for the given config and data
    pub fn is_shown(&self, config: &ConfigValue, data: &[DataFrame]) -> bool {
        self.show_if.as_ref().map_or(true, |show_if| show_if(config, data))
    }
}

impl fmt::Debug for FieldConfigPropertyItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldConfigPropertyItem")
            .field("id", &self.id)
            .field("path", &self.path)
            .field("name", &self.name)
            .field("category", &self.category)
            .field("is_custom", &self.is_custom)
            .field("default_value", &self.default_value)
            .field("hide_from_defaults", &self.hide_from_defaults)
            .field("hide_from_overrides", &self.hide_from_overrides)
            .finish()
    }
}

/// Ordered registry of field config properties
#[derive(Debug, Clone, Default)]
pub struct FieldConfigRegistry {
    items: IndexMap<String, FieldConfigPropertyItem>,
}

impl FieldConfigRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from items, rejecting duplicate ids
    pub fn from_items<I>(items: I) -> Result<Self, FieldConfigError>
    where
        I: IntoIterator<Item = FieldConfigPropertyItem>,
    {
        let mut registry = Self::new();
        for item in items {
            registry.register(item)?;
        }
        Ok(registry)
    }

    /// Register a property
    pub fn register(&mut self, item: FieldConfigPropertyItem) -> Result<(), FieldConfigError> {
        if self.items.contains_key(&item.id) {
            return Err(FieldConfigError::DuplicateProperty(item.id));
        }
        self.items.insert(item.id.clone(), item);
        Ok(())
    }

    /// All properties in registration order
    pub fn list(&self) -> impl Iterator<Item = &FieldConfigPropertyItem> {
        self.items.values()
    }

    /// Look up a property that must exist
    pub fn get(&self, id: &str) -> Result<&FieldConfigPropertyItem, FieldConfigError> {
        self.items
            .get(id)
            .ok_or_else(|| FieldConfigError::PropertyNotFound(id.to_string()))
    }

    /// Look up a property that may have been removed or renamed since the
    /// config referencing it was saved
    pub fn get_if_exists(&self, id: &str) -> Option<&FieldConfigPropertyItem> {
        self.items.get(id)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Field config defaults declared by the registered properties: standard
    /// defaults at their path, custom defaults under `custom`
    pub fn defaults(&self) -> ConfigValue {
        let mut defaults = ConfigValue::object();
        for item in self.list() {
            if let Some(value) = &item.default_value {
                defaults = set_immutably(&defaults, &item.config_path(), value.clone());
            }
        }
        defaults
    }
}

/// Collects a plugin's custom field config properties
#[derive(Debug, Default)]
pub struct FieldConfigEditorBuilder {
    items: Vec<FieldConfigPropertyItem>,
}

impl FieldConfigEditorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a custom property
    pub fn add(&mut self, item: FieldConfigPropertyItem) -> &mut Self {
        self.items.push(item);
        self
    }

    /// Number input stored under `custom.<path>`
    pub fn add_number_input(&mut self, path: &str, name: &str, default: Option<f64>) -> &mut Self {
        let mut item = FieldConfigPropertyItem::custom(path, name)
            .with_editor(EditorKind::Number)
            .with_process(crate::standard::number_processor);
        item.default_value = default.map(ConfigValue::from);
        self.add(item)
    }

    /// Boolean switch stored under `custom.<path>`
    pub fn add_boolean_switch(&mut self, path: &str, name: &str, default: bool) -> &mut Self {
        self.add(
            FieldConfigPropertyItem::custom(path, name)
                .with_editor(EditorKind::Boolean)
                .with_default(default),
        )
    }

    /// Radio group stored under `custom.<path>`
    pub fn add_radio(&mut self, path: &str, name: &str, choices: &[(&str, &str)], default: &str) -> &mut Self {
        let options = choices
            .iter()
            .map(|(value, label)| {
                ConfigValue::from_pairs([("value", (*value).into()), ("label", (*label).into())])
            })
            .collect();
        self.add(
            FieldConfigPropertyItem::custom(path, name)
                .with_editor(EditorKind::Radio)
                .with_settings(ConfigValue::from_pairs([("options", ConfigValue::array(options))]))
                .with_default(default),
        )
    }

    pub fn items(&self) -> &[FieldConfigPropertyItem] {
        &self.items
    }

    pub fn into_items(self) -> Vec<FieldConfigPropertyItem> {
        self.items
    }
}
