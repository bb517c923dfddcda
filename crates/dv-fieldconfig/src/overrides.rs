//! Effective per-field configuration
//!
//! A field ends up with its own config (set by the data source), unset
//! properties filled from the panel defaults and then the plugin defaults,
//! and finally every matching override rule applied in list order so later
//! rules refine what earlier ones set.

use dv_core::{set_immutably, unset_immutably, ConfigValue};
use dv_data::{DataFrame, FrameField};

use crate::matchers::MatcherRegistry;
use crate::registry::FieldConfigRegistry;
use crate::source::FieldConfigSource;

/// Resolve the effective config of every field of every frame
pub fn apply_field_overrides(
    frames: &[DataFrame],
    source: &FieldConfigSource,
    registry: &FieldConfigRegistry,
    matchers: &MatcherRegistry,
) -> Vec<DataFrame> {
    let mut skipped = 0usize;

    let resolved = frames
        .iter()
        .map(|frame| {
            let fields = frame
                .fields
                .iter()
                .map(|field| {
                    let mut config = apply_defaults(field, source, registry);

                    for rule in &source.overrides {
                        if !matchers.matches(&rule.matcher, field, frame) {
                            continue;
                        }
                        for property in &rule.properties {
                            let Some(item) = registry.get_if_exists(&property.id) else {
                                skipped += 1;
                                continue;
                            };
                            let value = (item.process)(&property.value);
                            config = if value.is_null() {
                                unset_immutably(&config, &item.config_path())
                            } else {
                                set_immutably(&config, &item.config_path(), value)
                            };
                        }
                    }

                    FrameField {
                        config: validate_field_config(config),
                        ..field.clone()
                    }
                })
                .collect();
            DataFrame {
                fields,
                ..frame.clone()
            }
        })
        .collect();

    if skipped > 0 {
        tracing::debug!("Skipped {} override properties unknown to the field config registry", skipped);
    }

    resolved
}

fn apply_defaults(field: &FrameField, source: &FieldConfigSource, registry: &FieldConfigRegistry) -> ConfigValue {
    let mut config = if field.config.is_object() {
        field.config.clone()
    } else {
        ConfigValue::object()
    };

    for item in registry.list() {
        if !(item.should_apply)(field) {
            continue;
        }
        let path = item.config_path();
        if config.get_path(&path).map_or(false, |own| !own.is_null()) {
            continue;
        }
        let fallback = source
            .defaults
            .get_path(&path)
            .filter(|value| !value.is_null())
            .or(item.default_value.as_ref());
        if let Some(value) = fallback {
            let value = (item.process)(value);
            if !value.is_null() {
                config = set_immutably(&config, &path, value);
            }
        }
    }

    config
}

/// Fix up inconsistent resolved values; `min` above `max` swaps the two
pub fn validate_field_config(config: ConfigValue) -> ConfigValue {
    let swap = match (config.get("min"), config.get("max")) {
        (Some(min), Some(max)) => match (min.as_f64(), max.as_f64()) {
            (Some(low), Some(high)) if low > high => Some((min.clone(), max.clone())),
            _ => None,
        },
        _ => None,
    };

    match swap {
        Some((min, max)) => {
            let swapped = set_immutably(&config, "min", max);
            set_immutably(&swapped, "max", min)
        }
        None => config,
    }
}
