//! Editing field config defaults

use dv_core::{merge_defaults, set_immutably, unset_immutably, ConfigValue};

use crate::registry::FieldConfigRegistry;
use crate::source::FieldConfigSource;

/// Set or remove one default.
///
/// `null` and `""` remove the default so the plugin-level default applies
/// again. Custom properties live under `defaults.custom`, which is always
/// left in place as an object, even once its last key is removed.
pub fn update_default_field_config_value(
    config: &FieldConfigSource,
    path: &str,
    value: ConfigValue,
    is_custom: bool,
) -> FieldConfigSource {
    let remove = value.is_unset_marker();

    let defaults = if is_custom {
        let custom = match config.defaults.get("custom") {
            Some(custom) if custom.is_object() => custom.clone(),
            _ => ConfigValue::object(),
        };
        let custom = if remove {
            unset_immutably(&custom, path)
        } else {
            set_immutably(&custom, path, value)
        };
        set_immutably(&config.defaults, "custom", custom)
    } else if remove {
        unset_immutably(&config.defaults, path)
    } else {
        set_immutably(&config.defaults, path, value)
    };

    config.with_defaults(defaults)
}

/// Fill defaults declared by the registry that the source leaves unset
pub fn apply_registry_defaults(config: &FieldConfigSource, registry: &FieldConfigRegistry) -> FieldConfigSource {
    let defaults = merge_defaults(&registry.defaults(), &config.defaults);
    let defaults = match defaults.get("custom") {
        Some(custom) if custom.is_object() => defaults,
        _ => set_immutably(&defaults, "custom", ConfigValue::object()),
    };
    config.with_defaults(defaults)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::FieldConfigPropertyItem;
    use crate::source::ConfigOverrideRule;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn source(defaults: serde_json::Value) -> FieldConfigSource {
        FieldConfigSource::new(ConfigValue::from(defaults), vec![ConfigOverrideRule::new("byName")])
    }

    #[test]
    fn test_removing_last_custom_key_keeps_custom_object() {
        let config = source(json!({"custom": {"x": true}}));
        let updated = update_default_field_config_value(&config, "x", ConfigValue::Null, true);
        assert_eq!(updated.defaults.to_json(), json!({"custom": {}}));

        let updated = update_default_field_config_value(&config, "x", "".into(), true);
        assert_eq!(updated.defaults.to_json(), json!({"custom": {}}));
    }

    #[test]
    fn test_custom_object_created_when_missing() {
        let config = source(json!({"unit": "ms"}));
        let removed = update_default_field_config_value(&config, "x", ConfigValue::Null, true);
        assert_eq!(removed.defaults.to_json(), json!({"unit": "ms", "custom": {}}));

        let set = update_default_field_config_value(&config, "axis.width", 2i64.into(), true);
        assert_eq!(set.defaults.to_json(), json!({"unit": "ms", "custom": {"axis": {"width": 2}}}));
    }

    #[test]
    fn test_standard_properties() {
        let config = source(json!({"unit": "ms", "custom": {}}));
        let set = update_default_field_config_value(&config, "thresholds.steps[1].value", 90i64.into(), false);
        assert_eq!(
            set.defaults.to_json(),
            json!({"unit": "ms", "custom": {}, "thresholds": {"steps": [null, {"value": 90}]}})
        );

        let removed = update_default_field_config_value(&config, "unit", ConfigValue::Null, false);
        assert_eq!(removed.defaults.to_json(), json!({"custom": {}}));
        assert_eq!(removed.overrides, config.overrides);
        assert!(config.defaults.get("unit").is_some());
    }

    #[test]
    fn test_dot_addressed_array_defaults() {
        let config = source(json!({"thresholds": {"steps": [{"value": 0}, {"value": 80}]}}));
        let set = update_default_field_config_value(&config, "thresholds.steps.1.value", 90i64.into(), false);
        assert_eq!(
            set.defaults.to_json(),
            json!({"thresholds": {"steps": [{"value": 0}, {"value": 90}]}})
        );

        let removed = update_default_field_config_value(&config, "thresholds.steps.1", ConfigValue::Null, false);
        assert_eq!(
            removed.defaults.to_json(),
            json!({"thresholds": {"steps": [{"value": 0}, null]}})
        );
    }

    #[test]
    fn test_unchanged_subtrees_are_shared() {
        let config = source(json!({"custom": {"a": {"deep": 1}}, "thresholds": {"steps": []}}));
        let updated = update_default_field_config_value(&config, "b", true.into(), true);
        assert!(config
            .defaults
            .get("thresholds")
            .unwrap()
            .shares_node(updated.defaults.get("thresholds").unwrap()));
        assert!(config
            .defaults
            .get_path("custom.a")
            .unwrap()
            .shares_node(updated.defaults.get_path("custom.a").unwrap()));
    }

    #[test]
    fn test_apply_registry_defaults() {
        let registry = FieldConfigRegistry::from_items(vec![
            FieldConfigPropertyItem::standard("unit", "Unit").with_default("short"),
            FieldConfigPropertyItem::custom("lineWidth", "Line width").with_default(1i64),
            FieldConfigPropertyItem::custom("fill", "Fill").with_default(10i64),
        ])
        .unwrap();
        let config = source(json!({"unit": "ms", "custom": {"fill": 50}}));
        let applied = apply_registry_defaults(&config, &registry);
        assert_eq!(
            applied.defaults.to_json(),
            json!({"unit": "ms", "custom": {"lineWidth": 1, "fill": 50}})
        );

        let empty = apply_registry_defaults(&source(json!({})), &FieldConfigRegistry::new());
        assert_eq!(empty.defaults.to_json(), json!({"custom": {}}));
    }
}
