//! Panel plugins and their option builders

use std::fmt;
use std::sync::Arc;

use dv_core::{set_immutably, ConfigValue};
use dv_data::DataFrame;
use dv_fieldconfig::registry::ShowIfFn;
use dv_fieldconfig::{
    build_field_config_registry, EditorKind, FieldConfigEditorBuilder, FieldConfigRegistry,
    StandardOptionsConfig,
};
use serde::{Deserialize, Serialize};

use crate::PanelError;

/// Release state of a plugin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginState {
    Alpha,
    Beta,
    #[default]
    Stable,
    Deprecated,
}

/// What the visualization picker knows about a plugin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelPluginMeta {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Position in the picker, lower first
    #[serde(default)]
    pub sort: i32,
    #[serde(default)]
    pub hide_from_list: bool,
    #[serde(default)]
    pub state: PluginState,
    /// Panels of this kind run no queries
    #[serde(default)]
    pub skip_data_query: bool,
}

impl PanelPluginMeta {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            sort: 100,
            hide_from_list: false,
            state: PluginState::Stable,
            skip_data_query: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_sort(mut self, sort: i32) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_state(mut self, state: PluginState) -> Self {
        self.state = state;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hide_from_list = true;
        self
    }
}

/// One panel option declared by a plugin
#[derive(Clone)]
pub struct PanelOptionsEditorItem {
    /// Path inside the panel options
    pub path: String,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<Vec<String>>,
    pub default_value: Option<ConfigValue>,
    pub editor: EditorKind,
    pub settings: ConfigValue,
    /// Evaluated against the options object the item lives in
    pub show_if: Option<ShowIfFn>,
}

impl PanelOptionsEditorItem {
    pub fn new(path: impl Into<String>, name: impl Into<String>, editor: EditorKind) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            description: None,
            category: None,
            default_value: None,
            editor,
            settings: ConfigValue::object(),
            show_if: None,
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

    pub fn with_settings(mut self, settings: ConfigValue) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_show_if<F>(mut self, f: F) -> Self
    where
        F: Fn(&ConfigValue, &[DataFrame]) -> bool + Send + Sync + 'static,
    {
        self.show_if = Some(Arc::new(f));
        self
    }

    pub fn is_shown(&self, options: &ConfigValue, data: &[DataFrame]) -> bool {
        self.show_if.as_ref().map_or(true, |show_if| show_if(options, data))
    }
}

impl fmt::Debug for PanelOptionsEditorItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PanelOptionsEditorItem")
            .field("path", &self.path)
            .field("name", &self.name)
            .field("category", &self.category)
            .field("default_value", &self.default_value)
            .field("editor", &self.editor)
            .finish()
    }
}

/// What an options supplier sees when it runs
#[derive(Debug, Clone, Copy)]
pub struct OptionsSupplierContext<'a> {
    /// Current options of the panel (or of the nested group)
    pub options: &'a ConfigValue,
    /// Latest data delivered to the panel
    pub data: &'a [DataFrame],
}

impl OptionsSupplierContext<'static> {
    /// Context without options or data, used to collect defaults
    pub fn empty() -> Self {
        static EMPTY: ConfigValue = ConfigValue::Null;
        Self {
            options: &EMPTY,
            data: &[],
        }
    }
}

/// Callback that declares a plugin's options
pub type PanelOptionsSupplier =
    Arc<dyn Fn(&mut PanelOptionsEditorBuilder, &OptionsSupplierContext<'_>) + Send + Sync>;

/// A group of options stored under a common path
#[derive(Clone)]
pub struct NestedPanelOptions {
    pub path: String,
    pub category: Option<Vec<String>>,
    pub show_if: Option<ShowIfFn>,
    pub build: PanelOptionsSupplier,
}

impl NestedPanelOptions {
    pub fn new<F>(path: impl Into<String>, build: F) -> Self
    where
        F: Fn(&mut PanelOptionsEditorBuilder, &OptionsSupplierContext<'_>) + Send + Sync + 'static,
    {
        Self {
            path: path.into(),
            category: None,
            show_if: None,
            build: Arc::new(build),
        }
    }

    pub fn with_category(mut self, category: &[&str]) -> Self {
        self.category = Some(category.iter().map(|c| c.to_string()).collect());
        self
    }

    pub fn with_show_if<F>(mut self, f: F) -> Self
    where
        F: Fn(&ConfigValue, &[DataFrame]) -> bool + Send + Sync + 'static,
    {
        self.show_if = Some(Arc::new(f));
        self
    }

    /// Options of the group, relative to the group path
    pub fn items(&self, context: &OptionsSupplierContext<'_>) -> PanelOptionsEditorBuilder {
        let mut builder = PanelOptionsEditorBuilder::new();
        (self.build)(&mut builder, context);
        builder
    }
}

impl fmt::Debug for NestedPanelOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NestedPanelOptions")
            .field("path", &self.path)
            .field("category", &self.category)
            .finish()
    }
}

/// An entry of the options builder, in declaration order
#[derive(Debug, Clone)]
pub enum OptionsEditorEntry {
    Item(PanelOptionsEditorItem),
    Nested(NestedPanelOptions),
}

/// Collects the options a plugin declares
#[derive(Debug, Clone, Default)]
pub struct PanelOptionsEditorBuilder {
    entries: Vec<OptionsEditorEntry>,
}

impl PanelOptionsEditorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, item: PanelOptionsEditorItem) -> &mut Self {
        self.entries.push(OptionsEditorEntry::Item(item));
        self
    }

    pub fn add_nested_options(&mut self, nested: NestedPanelOptions) -> &mut Self {
        self.entries.push(OptionsEditorEntry::Nested(nested));
        self
    }

    pub fn add_text_input(&mut self, path: &str, name: &str, default: &str) -> &mut Self {
        self.add(PanelOptionsEditorItem::new(path, name, EditorKind::Text).with_default(default))
    }

    pub fn add_number_input(&mut self, path: &str, name: &str, default: i64) -> &mut Self {
        self.add(PanelOptionsEditorItem::new(path, name, EditorKind::Number).with_default(default))
    }

    pub fn add_boolean_switch(&mut self, path: &str, name: &str, default: bool) -> &mut Self {
        self.add(PanelOptionsEditorItem::new(path, name, EditorKind::Boolean).with_default(default))
    }

    pub fn add_radio(&mut self, path: &str, name: &str, choices: &[(&str, &str)], default: &str) -> &mut Self {
        let options = choices
            .iter()
            .map(|(value, label)| ConfigValue::from_pairs([("value", (*value).into()), ("label", (*label).into())]))
            .collect();
        self.add(
            PanelOptionsEditorItem::new(path, name, EditorKind::Radio)
                .with_settings(ConfigValue::from_pairs([("options", ConfigValue::array(options))]))
                .with_default(default),
        )
    }

    pub fn entries(&self) -> &[OptionsEditorEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Defaults of every declared option, nested groups under their path
    pub fn defaults(&self) -> ConfigValue {
        let mut defaults = ConfigValue::object();
        for entry in &self.entries {
            match entry {
                OptionsEditorEntry::Item(item) => {
                    if let Some(value) = &item.default_value {
                        defaults = set_immutably(&defaults, &item.path, value.clone());
                    }
                }
                OptionsEditorEntry::Nested(nested) => {
                    let group = nested.items(&OptionsSupplierContext::empty()).defaults();
                    if group.as_object().map_or(false, |map| !map.is_empty()) {
                        defaults = set_immutably(&defaults, &nested.path, group);
                    }
                }
            }
        }
        defaults
    }
}

/// A loaded panel plugin
#[derive(Clone)]
pub struct PanelPlugin {
    pub meta: PanelPluginMeta,
    options_supplier: Option<PanelOptionsSupplier>,
    field_config_registry: FieldConfigRegistry,
}

impl PanelPlugin {
    /// A plugin without options and without field config
    pub fn new(meta: PanelPluginMeta) -> Self {
        Self {
            meta,
            options_supplier: None,
            field_config_registry: FieldConfigRegistry::new(),
        }
    }

    /// Declare the panel options
    pub fn set_panel_options<F>(mut self, supplier: F) -> Self
    where
        F: Fn(&mut PanelOptionsEditorBuilder, &OptionsSupplierContext<'_>) + Send + Sync + 'static,
    {
        self.options_supplier = Some(Arc::new(supplier));
        self
    }

    /// Enable field config: the standard options plus the plugin's own
    pub fn use_field_config(
        mut self,
        standard: StandardOptionsConfig,
        custom: FieldConfigEditorBuilder,
    ) -> Result<Self, PanelError> {
        self.field_config_registry = build_field_config_registry(&standard, custom)?;
        Ok(self)
    }

    pub fn id(&self) -> &str {
        &self.meta.id
    }

    pub fn field_config_registry(&self) -> &FieldConfigRegistry {
        &self.field_config_registry
    }

    /// Run the options supplier
    pub fn options_editors(&self, context: &OptionsSupplierContext<'_>) -> PanelOptionsEditorBuilder {
        let mut builder = PanelOptionsEditorBuilder::new();
        if let Some(supplier) = &self.options_supplier {
            supplier(&mut builder, context);
        }
        builder
    }

    /// Option defaults declared by the plugin
    pub fn options_defaults(&self) -> ConfigValue {
        self.options_editors(&OptionsSupplierContext::empty()).defaults()
    }
}

impl fmt::Debug for PanelPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PanelPlugin")
            .field("meta", &self.meta)
            .field("has_options", &self.options_supplier.is_some())
            .field("field_config_registry", &self.field_config_registry.len())
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    /// A time series like plugin used across the crate's tests
    pub(crate) fn timeseries_plugin() -> PanelPlugin {
        let mut custom = FieldConfigEditorBuilder::new();
        custom
            .add_number_input("lineWidth", "Line width", Some(1.0))
            .add_boolean_switch("spanNulls", "Connect null values", false);

        PanelPlugin::new(PanelPluginMeta::new("timeseries", "Time series").with_sort(0))
            .set_panel_options(|builder, _| {
                builder
                    .add(
                        PanelOptionsEditorItem::new("legend.showLegend", "Visibility", EditorKind::Boolean)
                            .with_category(&["Legend"])
                            .with_default(true),
                    )
                    .add_radio("tooltip.mode", "Tooltip mode", &[("single", "Single"), ("multi", "All")], "single");
            })
            .use_field_config(StandardOptionsConfig::default(), custom)
            .unwrap()
    }

    #[test]
    fn test_options_defaults() {
        let plugin = timeseries_plugin();
        assert_eq!(
            plugin.options_defaults().to_json(),
            json!({"legend": {"showLegend": true}, "tooltip": {"mode": "single"}})
        );
        assert!(!plugin.field_config_registry().is_empty());
    }

    #[test]
    fn test_nested_defaults() {
        let plugin = PanelPlugin::new(PanelPluginMeta::new("geomap", "Geomap")).set_panel_options(|builder, _| {
            builder
                .add_boolean_switch("showScale", "Show scale", false)
                .add_nested_options(NestedPanelOptions::new("view", |builder, _| {
                    builder.add_number_input("zoom", "Zoom", 1).add_text_input("id", "Initial view", "zero");
                }))
                .add_nested_options(NestedPanelOptions::new("empty", |_, _| {}));
        });
        assert_eq!(
            plugin.options_defaults().to_json(),
            json!({"showScale": false, "view": {"zoom": 1, "id": "zero"}})
        );
    }

    #[test]
    fn test_plugin_without_field_config() {
        let plugin = PanelPlugin::new(PanelPluginMeta::new("text", "Text"));
        assert!(plugin.field_config_registry().is_empty());
        assert!(plugin.options_editors(&OptionsSupplierContext::empty()).is_empty());
        assert_eq!(plugin.options_defaults().to_json(), json!({}));
    }

    #[test]
    fn test_supplier_sees_current_options() {
        let plugin = PanelPlugin::new(PanelPluginMeta::new("text", "Text")).set_panel_options(|builder, context| {
            builder.add_text_input("mode", "Mode", "markdown");
            if context.options.get("mode").and_then(|m| m.as_str()) == Some("html") {
                builder.add_boolean_switch("sanitize", "Sanitize", true);
            }
        });
        let options = ConfigValue::from(json!({"mode": "html"}));
        let context = OptionsSupplierContext { options: &options, data: &[] };
        assert_eq!(plugin.options_editors(&context).entries().len(), 2);
        assert_eq!(plugin.options_editors(&OptionsSupplierContext::empty()).entries().len(), 1);
    }
}
