//! Standard field options shared by every panel that uses field config

use ahash::AHashMap;
use dv_core::ConfigValue;
use serde_json::json;

use crate::editor::EditorKind;
use crate::registry::{FieldConfigEditorBuilder, FieldConfigPropertyItem, FieldConfigRegistry};
use crate::FieldConfigError;

pub const CATEGORY_STANDARD: &str = "Standard options";
pub const CATEGORY_THRESHOLDS: &str = "Thresholds";
pub const CATEGORY_VALUE_MAPPINGS: &str = "Value mappings";
pub const CATEGORY_DATA_LINKS: &str = "Data links";

/// Keep numbers, parse numeric strings, drop everything else
pub fn number_processor(value: &ConfigValue) -> ConfigValue {
    match value {
        ConfigValue::Number(_) => value.clone(),
        ConfigValue::String(s) => s.trim().parse::<f64>().map(ConfigValue::from).unwrap_or_default(),
        _ => ConfigValue::Null,
    }
}

/// Keep non-empty strings
pub fn string_processor(value: &ConfigValue) -> ConfigValue {
    match value {
        ConfigValue::String(s) if s.is_empty() => ConfigValue::Null,
        ConfigValue::String(_) => value.clone(),
        ConfigValue::Null => ConfigValue::Null,
        other => ConfigValue::String(other.to_string()),
    }
}

fn array_items_count(value: Option<&ConfigValue>) -> Option<usize> {
    value.and_then(|v| v.as_array()).map(|items| items.len())
}

fn steps_count(value: Option<&ConfigValue>) -> Option<usize> {
    value
        .and_then(|v| v.get("steps"))
        .and_then(|steps| steps.as_array())
        .map(|steps| steps.len())
}

/// The built-in standard options, in display order
pub fn standard_field_config_items() -> Vec<FieldConfigPropertyItem> {
    let standard = [CATEGORY_STANDARD];

    vec![
        FieldConfigPropertyItem::standard("displayName", "Display name")
            .with_description("Change the field or series name")
            .with_category(&standard)
            .with_editor(EditorKind::Text)
            .with_process(string_processor)
            .with_popular_rank(5),
        FieldConfigPropertyItem::standard("unit", "Unit")
            .with_category(&standard)
            .with_editor(EditorKind::Unit)
            .with_process(string_processor)
            .with_popular_rank(2),
        FieldConfigPropertyItem::standard("min", "Min")
            .with_description("Leave empty to calculate based on all values")
            .with_category(&standard)
            .with_editor(EditorKind::Number)
            .with_process(number_processor)
            .with_popular_rank(3),
        FieldConfigPropertyItem::standard("max", "Max")
            .with_description("Leave empty to calculate based on all values")
            .with_category(&standard)
            .with_editor(EditorKind::Number)
            .with_process(number_processor)
            .with_popular_rank(4),
        FieldConfigPropertyItem::standard("decimals", "Decimals")
            .with_category(&standard)
            .with_editor(EditorKind::Number)
            .with_settings(ConfigValue::from(json!({"min": 0, "max": 15, "integer": true})))
            .with_process(number_processor),
        FieldConfigPropertyItem::standard("noValue", "No value")
            .with_description("What to show when there is no value")
            .with_category(&standard)
            .with_editor(EditorKind::Text)
            .with_process(string_processor),
        FieldConfigPropertyItem::standard("color", "Color scheme")
            .with_category(&standard)
            .with_editor(EditorKind::Color)
            .with_default(ConfigValue::from(json!({"mode": "palette-classic"}))),
        FieldConfigPropertyItem::standard("thresholds", "Thresholds")
            .with_category(&[CATEGORY_THRESHOLDS])
            .with_editor(EditorKind::Thresholds)
            .with_default(ConfigValue::from(json!({
                "mode": "absolute",
                "steps": [
                    {"value": null, "color": "green"},
                    {"value": 80, "color": "red"}
                ]
            })))
            .with_items_count(steps_count),
        FieldConfigPropertyItem::standard("mappings", "Value mappings")
            .with_category(&[CATEGORY_VALUE_MAPPINGS])
            .with_editor(EditorKind::ValueMappings)
            .with_default(ConfigValue::array(Vec::new()))
            .with_items_count(array_items_count),
        FieldConfigPropertyItem::standard("links", "Data links")
            .with_category(&[CATEGORY_DATA_LINKS])
            .with_editor(EditorKind::DataLinks)
            .with_items_count(array_items_count),
    ]
}

/// Per-option adjustment a plugin makes to a standard option
#[derive(Debug, Clone, Default)]
pub struct StandardOptionOverride {
    pub default_value: Option<ConfigValue>,
    pub hide_from_defaults: bool,
}

/// How a plugin uses the standard options
#[derive(Debug, Clone, Default)]
pub struct StandardOptionsConfig {
    /// Standard option ids left out of the registry
    pub disable: Vec<String>,

    /// Adjustments keyed by standard option id
    pub options: AHashMap<String, StandardOptionOverride>,
}

impl StandardOptionsConfig {
    pub fn disable(mut self, id: &str) -> Self {
        self.disable.push(id.to_string());
        self
    }

    pub fn with_default(mut self, id: &str, value: impl Into<ConfigValue>) -> Self {
        self.options.entry(id.to_string()).or_default().default_value = Some(value.into());
        self
    }

    pub fn hide_from_defaults(mut self, id: &str) -> Self {
        self.options.entry(id.to_string()).or_default().hide_from_defaults = true;
        self
    }
}

/// Registry holding the standard options followed by the plugin's custom
/// properties
pub fn build_field_config_registry(
    standard: &StandardOptionsConfig,
    custom: FieldConfigEditorBuilder,
) -> Result<FieldConfigRegistry, FieldConfigError> {
    let mut registry = FieldConfigRegistry::new();

    for mut item in standard_field_config_items() {
        if standard.disable.iter().any(|id| *id == item.id) {
            continue;
        }
        if let Some(adjust) = standard.options.get(&item.id) {
            if let Some(value) = &adjust.default_value {
                item.default_value = Some(value.clone());
            }
            item.hide_from_defaults |= adjust.hide_from_defaults;
        }
        registry.register(item)?;
    }

    for item in custom.into_items() {
        registry.register(item)?;
    }

    tracing::debug!("Built field config registry with {} properties", registry.len());
    Ok(registry)
}
