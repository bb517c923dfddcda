//! Persisted field config: defaults plus ordered override rules
//!
//! Every edit produces a new [`FieldConfigSource`] with a freshly cloned
//! `overrides` list; the source a caller already holds is never mutated.

use dv_core::{ConfigMap, ConfigValue};
use serde::{Deserialize, Serialize};

use crate::registry::FieldConfigRegistry;
use crate::FieldConfigError;

/// Field config defaults and override rules of one panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldConfigSource {
    #[serde(default = "ConfigValue::object")]
    pub defaults: ConfigValue,

    #[serde(default)]
    pub overrides: Vec<ConfigOverrideRule>,

    /// Keys this version does not know about, kept for lossless saves
    #[serde(flatten)]
    pub extra: ConfigMap,
}

impl Default for FieldConfigSource {
    fn default() -> Self {
        Self {
            defaults: ConfigValue::object(),
            overrides: Vec::new(),
            extra: ConfigMap::new(),
        }
    }
}

/// Selects fields by matcher kind and options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatcherConfig {
    pub id: String,

    /// Unset until the user configures the matcher
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<ConfigValue>,
}

impl MatcherConfig {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            options: None,
        }
    }

    pub fn with_options(mut self, options: impl Into<ConfigValue>) -> Self {
        self.options = Some(options.into());
        self
    }

    /// Whether the options carry a usable value
    pub fn is_configured(&self) -> bool {
        self.options.as_ref().map_or(false, |options| !options.is_unset_marker())
    }
}

/// One override rule: a matcher and the properties set on matching fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigOverrideRule {
    pub matcher: MatcherConfig,

    #[serde(default)]
    pub properties: Vec<DynamicConfigValue>,

    /// Marks rules created by the platform rather than the user
    #[serde(rename = "__systemRef", default, skip_serializing_if = "Option::is_none")]
    pub system_ref: Option<String>,

    #[serde(flatten)]
    pub extra: ConfigMap,
}

impl ConfigOverrideRule {
    /// A rule with an unconfigured matcher and no properties
    pub fn new(matcher_id: impl Into<String>) -> Self {
        Self {
            matcher: MatcherConfig::new(matcher_id),
            properties: Vec::new(),
            system_ref: None,
            extra: ConfigMap::new(),
        }
    }

    pub fn with_matcher_options(mut self, options: impl Into<ConfigValue>) -> Self {
        self.matcher.options = Some(options.into());
        self
    }

    pub fn with_property(mut self, id: impl Into<String>, value: impl Into<ConfigValue>) -> Self {
        self.properties.push(DynamicConfigValue::new(id, value));
        self
    }

    pub fn with_system_ref(mut self, system_ref: impl Into<String>) -> Self {
        self.system_ref = Some(system_ref.into());
        self
    }

    /// System overrides are resolved like any other rule but cannot be
    /// removed from the options pane
    pub fn is_system_override(&self) -> bool {
        self.system_ref.is_some()
    }
}

/// A property id and the value an override sets for it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DynamicConfigValue {
    pub id: String,

    #[serde(default, skip_serializing_if = "ConfigValue::is_null")]
    pub value: ConfigValue,
}

impl DynamicConfigValue {
    pub fn new(id: impl Into<String>, value: impl Into<ConfigValue>) -> Self {
        Self {
            id: id.into(),
            value: value.into(),
        }
    }
}

impl FieldConfigSource {
    pub fn new(defaults: ConfigValue, overrides: Vec<ConfigOverrideRule>) -> Self {
        Self {
            defaults,
            overrides,
            extra: ConfigMap::new(),
        }
    }

    /// Parse a persisted field config
    pub fn from_json(json: &str) -> Result<Self, FieldConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize for saving
    pub fn to_json(&self) -> Result<String, FieldConfigError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Copy of this source with a different override list
    fn with_overrides(&self, overrides: Vec<ConfigOverrideRule>) -> Self {
        Self {
            defaults: self.defaults.clone(),
            overrides,
            extra: self.extra.clone(),
        }
    }

    /// Copy of this source with different defaults
    pub fn with_defaults(&self, defaults: ConfigValue) -> Self {
        Self {
            defaults,
            overrides: self.overrides.clone(),
            extra: self.extra.clone(),
        }
    }

    /// Replace the rule at `index`
    pub fn with_override_replaced(&self, index: usize, rule: ConfigOverrideRule) -> Option<Self> {
        let mut overrides = self.overrides.clone();
        *overrides.get_mut(index)? = rule;
        Some(self.with_overrides(overrides))
    }

    /// Remove the rule at `index`, keeping the order of the others
    pub fn with_override_removed(&self, index: usize) -> Option<Self> {
        if index >= self.overrides.len() {
            return None;
        }
        let mut overrides = self.overrides.clone();
        overrides.remove(index);
        Some(self.with_overrides(overrides))
    }

    /// Append a rule for the given matcher kind with unset options
    pub fn with_override_added(&self, matcher_id: &str) -> Self {
        let mut overrides = self.overrides.clone();
        overrides.push(ConfigOverrideRule::new(matcher_id));
        self.with_overrides(overrides)
    }

    /// Set the matcher options of a rule; an unset marker clears them
    pub fn with_matcher_options(&self, index: usize, options: ConfigValue) -> Option<Self> {
        let mut overrides = self.overrides.clone();
        let rule = overrides.get_mut(index)?;
        rule.matcher.options = if options.is_null() { None } else { Some(options) };
        Some(self.with_overrides(overrides))
    }

    /// Append a property to a rule, starting from the registry default.
    ///
    /// Returns `None` for an unknown rule index or property id.
    pub fn with_property_added(
        &self,
        index: usize,
        property_id: &str,
        registry: &FieldConfigRegistry,
    ) -> Option<Self> {
        let item = registry.get_if_exists(property_id)?;
        let mut overrides = self.overrides.clone();
        let rule = overrides.get_mut(index)?;
        rule.properties.push(DynamicConfigValue::new(
            property_id,
            item.default_value.clone().unwrap_or_default(),
        ));
        Some(self.with_overrides(overrides))
    }

    /// Change the value of one property of a rule
    pub fn with_property_changed(&self, index: usize, property_index: usize, value: ConfigValue) -> Option<Self> {
        let mut overrides = self.overrides.clone();
        let property = overrides.get_mut(index)?.properties.get_mut(property_index)?;
        property.value = value;
        Some(self.with_overrides(overrides))
    }

    /// Remove one property of a rule
    pub fn with_property_removed(&self, index: usize, property_index: usize) -> Option<Self> {
        let mut overrides = self.overrides.clone();
        let rule = overrides.get_mut(index)?;
        if property_index >= rule.properties.len() {
            return None;
        }
        rule.properties.remove(property_index);
        Some(self.with_overrides(overrides))
    }
}
