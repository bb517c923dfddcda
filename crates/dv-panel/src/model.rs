//! Panel model
//!
//! [`PanelModel`] is the in-memory state of one dashboard panel. Its
//! persisted part is a [`PanelSaveModel`]; on top of that it tracks the
//! loaded plugin, a configuration revision, options cached per plugin while
//! the user tries out other visualizations, and the query runner handle.

use std::sync::Arc;

use ahash::AHashMap;
use dv_core::{merge_defaults, ConfigMap, ConfigValue, EventBus};
use dv_fieldconfig::{apply_registry_defaults, ConfigOverrideRule, DynamicConfigValue, FieldConfigSource};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::events::{
    FieldConfigChanged, PanelDestroyed, PanelEditCommitted, PanelOptionsChanged, PanelPluginChanged,
    PanelPropertyChanged, PanelQueriesChanged,
};
use crate::plugin::PanelPlugin;
use crate::query_runner::PanelQueryRunner;
use crate::PanelError;

fn is_false(value: &bool) -> bool {
    !*value
}

/// Direction panels repeat in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepeatDirection {
    #[serde(rename = "h")]
    Horizontal,
    #[serde(rename = "v")]
    Vertical,
}

/// Link shown in the panel header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelLink {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub target_blank: bool,
    #[serde(flatten)]
    pub extra: ConfigMap,
}

impl PanelLink {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            target_blank: false,
            extra: ConfigMap::new(),
        }
    }
}

/// Persisted panel JSON.
///
/// Keys this version does not model are kept in `extra`. Empty values are
/// left out on save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelSaveModel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    #[serde(rename = "type")]
    pub plugin_id: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub transparent: bool,

    #[serde(default)]
    pub targets: Vec<ConfigValue>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<PanelLink>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat_direction: Option<RepeatDirection>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_per_row: Option<u32>,

    #[serde(default = "ConfigValue::object")]
    pub options: ConfigValue,

    #[serde(default)]
    pub field_config: FieldConfigSource,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugin_version: Option<String>,

    #[serde(flatten)]
    pub extra: ConfigMap,
}

impl PanelSaveModel {
    pub fn new(plugin_id: impl Into<String>) -> Self {
        Self {
            id: None,
            plugin_id: plugin_id.into(),
            title: String::new(),
            description: None,
            transparent: false,
            targets: Vec::new(),
            links: Vec::new(),
            repeat: None,
            repeat_direction: None,
            max_per_row: None,
            options: ConfigValue::object(),
            field_config: FieldConfigSource::default(),
            plugin_version: None,
            extra: ConfigMap::new(),
        }
    }
}

/// A panel-level property edited from the panel frame category
#[derive(Debug, Clone, PartialEq)]
pub enum PanelProperty {
    Title(String),
    Description(Option<String>),
    Transparent(bool),
    Links(Vec<PanelLink>),
    Repeat(Option<String>),
    RepeatDirection(Option<RepeatDirection>),
    MaxPerRow(Option<u32>),
}

impl PanelProperty {
    pub fn name(&self) -> &'static str {
        match self {
            PanelProperty::Title(_) => "title",
            PanelProperty::Description(_) => "description",
            PanelProperty::Transparent(_) => "transparent",
            PanelProperty::Links(_) => "links",
            PanelProperty::Repeat(_) => "repeat",
            PanelProperty::RepeatDirection(_) => "repeatDirection",
            PanelProperty::MaxPerRow(_) => "maxPerRow",
        }
    }
}

/// Options and field config remembered for a plugin the panel switched away
/// from
#[derive(Debug, Clone)]
struct CachedPluginOptions {
    options: ConfigValue,
    field_config: FieldConfigSource,
}

/// One panel of a dashboard
pub struct PanelModel {
    key: Uuid,
    model: PanelSaveModel,
    config_rev: u64,
    has_changed: bool,
    is_editing: bool,
    plugin: Option<Arc<PanelPlugin>>,
    cached_plugin_options: AHashMap<String, CachedPluginOptions>,
    events: EventBus,
    query_runner: OnceCell<Arc<PanelQueryRunner>>,
}

impl PanelModel {
    /// Create a panel from its persisted model
    pub fn new(model: PanelSaveModel) -> Self {
        Self {
            key: Uuid::new_v4(),
            model,
            config_rev: 0,
            has_changed: false,
            is_editing: false,
            plugin: None,
            cached_plugin_options: AHashMap::new(),
            events: EventBus::new(),
            query_runner: OnceCell::new(),
        }
    }

    /// Load a panel from dashboard JSON
    pub fn from_json(json: &str) -> Result<Self, PanelError> {
        let model: PanelSaveModel = serde_json::from_str(json)?;
        Ok(Self::new(model))
    }

    /// Persisted state
    pub fn save_model(&self) -> PanelSaveModel {
        self.model.clone()
    }

    pub fn to_json(&self) -> Result<String, PanelError> {
        Ok(serde_json::to_string(&self.model)?)
    }

    /// Identity of this in-memory instance (edit clones get their own)
    pub fn key(&self) -> Uuid {
        self.key
    }

    pub fn plugin_id(&self) -> &str {
        &self.model.plugin_id
    }

    pub fn title(&self) -> &str {
        &self.model.title
    }

    pub fn description(&self) -> Option<&str> {
        self.model.description.as_deref()
    }

    pub fn transparent(&self) -> bool {
        self.model.transparent
    }

    pub fn links(&self) -> &[PanelLink] {
        &self.model.links
    }

    pub fn repeat(&self) -> Option<&str> {
        self.model.repeat.as_deref()
    }

    pub fn repeat_direction(&self) -> Option<RepeatDirection> {
        self.model.repeat_direction
    }

    pub fn max_per_row(&self) -> Option<u32> {
        self.model.max_per_row
    }

    pub fn options(&self) -> &ConfigValue {
        &self.model.options
    }

    pub fn field_config(&self) -> &FieldConfigSource {
        &self.model.field_config
    }

    pub fn targets(&self) -> &[ConfigValue] {
        &self.model.targets
    }

    /// Revision bumped by every configuration change
    pub fn config_rev(&self) -> u64 {
        self.config_rev
    }

    pub fn has_changed(&self) -> bool {
        self.has_changed
    }

    pub fn is_editing(&self) -> bool {
        self.is_editing
    }

    pub fn plugin(&self) -> Option<&Arc<PanelPlugin>> {
        self.plugin.as_ref()
    }

    /// Event bus carrying this panel's change events
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// The query runner handle, created on first use
    pub fn query_runner(&self) -> Arc<PanelQueryRunner> {
        self.query_runner
            .get_or_init(|| Arc::new(PanelQueryRunner::new()))
            .clone()
    }

    fn bump_revision(&mut self) {
        self.config_rev += 1;
        self.has_changed = true;
    }

    /// Attach the plugin matching the panel's type and fill its defaults
    pub fn plugin_loaded(&mut self, plugin: Arc<PanelPlugin>) -> Result<(), PanelError> {
        if plugin.meta.id != self.model.plugin_id {
            return Err(PanelError::PluginMismatch {
                expected: self.model.plugin_id.clone(),
                actual: plugin.meta.id.clone(),
            });
        }
        self.plugin = Some(plugin);
        self.apply_plugin_defaults();
        Ok(())
    }

    /// Fill option and field config defaults the plugin declares without
    /// overwriting values already set
    pub fn apply_plugin_defaults(&mut self) {
        let Some(plugin) = self.plugin.clone() else {
            return;
        };
        self.model.options = merge_defaults(&plugin.options_defaults(), &self.model.options);
        self.model.field_config = apply_registry_defaults(&self.model.field_config, plugin.field_config_registry());
    }

    /// Replace the panel options
    pub fn update_options(&mut self, options: ConfigValue) {
        self.model.options = options;
        self.bump_revision();
        self.events.publish(PanelOptionsChanged {
            key: self.key,
            config_rev: self.config_rev,
        });
    }

    /// Replace the field config; the last query result is delivered again so
    /// views pick the new config up
    pub fn update_field_config(&mut self, field_config: FieldConfigSource) {
        self.model.field_config = field_config;
        self.bump_revision();
        self.events.publish(FieldConfigChanged {
            key: self.key,
            config_rev: self.config_rev,
        });
        if let Some(runner) = self.query_runner.get() {
            runner.resend_last_result();
        }
    }

    /// Change a panel-level property
    pub fn set_property(&mut self, property: PanelProperty) {
        let name = property.name();
        match property {
            PanelProperty::Title(title) => self.model.title = title,
            PanelProperty::Description(description) => self.model.description = description,
            PanelProperty::Transparent(transparent) => self.model.transparent = transparent,
            PanelProperty::Links(links) => self.model.links = links,
            PanelProperty::Repeat(repeat) => self.model.repeat = repeat,
            PanelProperty::RepeatDirection(direction) => self.model.repeat_direction = direction,
            PanelProperty::MaxPerRow(max) => self.model.max_per_row = max,
        }
        self.bump_revision();
        self.events.publish(PanelPropertyChanged {
            key: self.key,
            property: name,
        });
    }

    /// Replace the queries
    pub fn update_queries(&mut self, targets: Vec<ConfigValue>) {
        self.model.targets = targets;
        self.bump_revision();
        self.events.publish(PanelQueriesChanged { key: self.key });
    }

    /// Switch the panel to another visualization.
    ///
    /// The current options and field config are remembered for the old
    /// plugin. Switching back restores them; switching elsewhere keeps the
    /// standard field config and drops plugin-specific values.
    pub fn change_plugin(&mut self, plugin: Arc<PanelPlugin>) {
        let previous = self.model.plugin_id.clone();
        let current = plugin.meta.id.clone();

        self.cached_plugin_options.insert(
            previous.clone(),
            CachedPluginOptions {
                options: self.model.options.clone(),
                field_config: self.model.field_config.clone(),
            },
        );

        self.model.options = ConfigValue::object();
        self.model.field_config = without_custom_config(&self.model.field_config);
        self.model.plugin_id = current.clone();
        self.model.plugin_version = None;

        if let Some(cached) = self.cached_plugin_options.get(&current) {
            tracing::debug!("Restoring cached options for panel plugin '{}'", current);
            self.model.options = cached.options.clone();
            self.model.field_config = restore_custom_config(&self.model.field_config, &cached.field_config);
        }

        self.plugin = Some(plugin);
        self.apply_plugin_defaults();
        self.bump_revision();

        tracing::info!("Panel plugin changed from '{}' to '{}'", previous, current);
        self.events.publish(PanelPluginChanged {
            key: self.key,
            previous,
            current,
        });
    }

    /// Copy used by an edit session; edits stay off the live panel until
    /// committed with [`PanelModel::commit_edit_clone`]
    pub fn edit_clone(&self) -> PanelModel {
        let mut clone = PanelModel::new(self.model.clone());
        clone.plugin = self.plugin.clone();
        clone.cached_plugin_options = self.cached_plugin_options.clone();
        clone.config_rev = self.config_rev;
        clone.is_editing = true;
        if let Some(runner) = self.query_runner.get() {
            clone.query_runner().use_last_result_from(runner);
        }
        clone
    }

    /// Apply an edit clone's state to this panel
    pub fn commit_edit_clone(&mut self, clone: &PanelModel) {
        self.model = clone.model.clone();
        self.plugin = clone.plugin.clone();
        self.cached_plugin_options = clone.cached_plugin_options.clone();
        self.bump_revision();

        if let Some(runner) = clone.query_runner.get() {
            self.query_runner().use_last_result_from(runner);
        }

        tracing::debug!("Committed edit clone {} into panel {}", clone.key, self.key);
        self.events.publish(PanelEditCommitted {
            key: self.key,
            config_rev: self.config_rev,
        });
    }

    /// Tear the panel down; subscribers of its query runner are released
    pub fn destroy(&mut self) {
        self.events.publish(PanelDestroyed { key: self.key });
        if let Some(runner) = self.query_runner.get() {
            runner.destroy();
        }
    }
}

fn is_custom_property(property: &DynamicConfigValue) -> bool {
    property.id.starts_with(dv_fieldconfig::registry::CUSTOM_ID_PREFIX)
}

/// Field config with the plugin-specific parts removed: custom defaults are
/// emptied and custom override properties dropped, along with rules left
/// without properties
fn without_custom_config(source: &FieldConfigSource) -> FieldConfigSource {
    let defaults = dv_core::set_immutably(&source.defaults, "custom", ConfigValue::object());
    let overrides = source
        .overrides
        .iter()
        .filter_map(|rule| {
            let properties: Vec<DynamicConfigValue> = rule
                .properties
                .iter()
                .filter(|property| !is_custom_property(property))
                .cloned()
                .collect();
            if properties.is_empty() {
                return None;
            }
            Some(ConfigOverrideRule {
                properties,
                ..rule.clone()
            })
        })
        .collect();

    FieldConfigSource {
        defaults,
        overrides,
        extra: source.extra.clone(),
    }
}

/// Bring back custom defaults and custom override properties remembered for
/// a plugin, merging custom properties into rules with the same matcher
fn restore_custom_config(current: &FieldConfigSource, cached: &FieldConfigSource) -> FieldConfigSource {
    let custom = cached
        .defaults
        .get("custom")
        .cloned()
        .unwrap_or_else(ConfigValue::object);
    let defaults = dv_core::set_immutably(&current.defaults, "custom", custom);

    let mut overrides = current.overrides.clone();
    for cached_rule in &cached.overrides {
        let custom_properties: Vec<DynamicConfigValue> = cached_rule
            .properties
            .iter()
            .filter(|property| is_custom_property(property))
            .cloned()
            .collect();
        if custom_properties.is_empty() {
            continue;
        }
        match overrides.iter_mut().find(|rule| rule.matcher == cached_rule.matcher) {
            Some(rule) => rule.properties.extend(custom_properties),
            None => overrides.push(ConfigOverrideRule {
                properties: custom_properties,
                ..cached_rule.clone()
            }),
        }
    }

    FieldConfigSource {
        defaults,
        overrides,
        extra: current.extra.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::tests::timeseries_plugin;
    use crate::plugin::{PanelPluginMeta, PanelOptionsEditorItem};
    use crate::query_runner::PanelDataSubscriber;
    use dv_data::PanelData;
    use dv_fieldconfig::{EditorKind, FieldConfigEditorBuilder, StandardOptionsConfig};
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    fn table_plugin() -> Arc<PanelPlugin> {
        let mut custom = FieldConfigEditorBuilder::new();
        custom.add_radio("align", "Column alignment", &[("auto", "Auto"), ("left", "Left")], "auto");
        Arc::new(
            PanelPlugin::new(PanelPluginMeta::new("table", "Table"))
                .set_panel_options(|builder, _| {
                    builder.add(PanelOptionsEditorItem::new("showHeader", "Show table header", EditorKind::Boolean).with_default(true));
                })
                .use_field_config(StandardOptionsConfig::default(), custom)
                .unwrap(),
        )
    }

    fn loaded_timeseries_panel() -> PanelModel {
        let json = json!({
            "type": "timeseries",
            "title": "CPU",
            "targets": [{"refId": "A", "expr": "cpu"}],
            "options": {"legend": {"showLegend": false}},
            "fieldConfig": {
                "defaults": {"unit": "percent", "custom": {"lineWidth": 3}},
                "overrides": [{
                    "matcher": {"id": "byName", "options": "cpu"},
                    "properties": [
                        {"id": "custom.lineWidth", "value": 5},
                        {"id": "unit", "value": "short"}
                    ]
                }, {
                    "matcher": {"id": "byName", "options": "mem"},
                    "properties": [{"id": "custom.spanNulls", "value": true}]
                }]
            }
        });
        let mut panel = PanelModel::from_json(&json.to_string()).unwrap();
        panel.plugin_loaded(Arc::new(timeseries_plugin())).unwrap();
        panel
    }

    #[test]
    fn test_save_model_round_trip() {
        let raw = json!({
            "id": 4,
            "type": "stat",
            "title": "Requests",
            "targets": [{"refId": "A"}],
            "links": [{"title": "Docs", "url": "https://example.com", "targetBlank": true}],
            "repeat": "host",
            "repeatDirection": "h",
            "maxPerRow": 4,
            "options": {"reduceOptions": {"calcs": ["lastNotNull"]}},
            "fieldConfig": {
                "defaults": {"custom": {}},
                "overrides": [{
                    "matcher": {"id": "byName", "options": "a"},
                    "properties": [{"id": "custom.gone", "value": [1, {"x": null}]}]
                }]
            },
            "gridPos": {"x": 0, "y": 0, "w": 12, "h": 8},
            "pluginVersion": "10.0.0"
        });
        let panel = PanelModel::from_json(&raw.to_string()).unwrap();
        let saved: Value = serde_json::from_str(&panel.to_json().unwrap()).unwrap();
        assert_eq!(saved, raw);
    }

    #[test]
    fn test_plugin_defaults_fill_unset_values() {
        let panel = loaded_timeseries_panel();
        assert_eq!(
            panel.options().to_json(),
            json!({"legend": {"showLegend": false}, "tooltip": {"mode": "single"}})
        );
        let defaults = &panel.field_config().defaults;
        assert_eq!(defaults.get("unit").and_then(|v| v.as_str()), Some("percent"));
        assert_eq!(defaults.get_path("custom.lineWidth").and_then(|v| v.as_i64()), Some(3));
        assert_eq!(defaults.get_path("custom.spanNulls").and_then(|v| v.as_bool()), Some(false));
        assert!(defaults.get("thresholds").is_some());
        assert_eq!(panel.config_rev(), 0);
    }

    #[test]
    fn test_plugin_mismatch() {
        let mut panel = PanelModel::new(PanelSaveModel::new("stat"));
        assert!(matches!(
            panel.plugin_loaded(table_plugin()),
            Err(PanelError::PluginMismatch { .. })
        ));
    }

    #[test]
    fn test_mutations_bump_revision_and_publish() {
        let mut panel = loaded_timeseries_panel();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let log = seen.clone();
        panel.events().subscribe_fn(move |event: &PanelOptionsChanged| log.lock().push(format!("options {}", event.config_rev)));
        let log = seen.clone();
        panel.events().subscribe_fn(move |event: &PanelPropertyChanged| log.lock().push(format!("property {}", event.property)));
        let log = seen.clone();
        panel.events().subscribe_fn(move |_: &PanelQueriesChanged| log.lock().push("queries".to_string()));

        panel.update_options(ConfigValue::from(json!({"legend": {"showLegend": true}})));
        panel.set_property(PanelProperty::Title("Memory".to_string()));
        panel.update_queries(vec![]);

        assert_eq!(panel.config_rev(), 3);
        assert!(panel.has_changed());
        assert_eq!(panel.title(), "Memory");
        assert_eq!(*seen.lock(), vec!["options 1", "property title", "queries"]);
    }

    #[test]
    fn test_field_config_change_resends_last_result() {
        struct Counter(Mutex<usize>);
        impl PanelDataSubscriber for Counter {
            fn on_panel_data(&self, _: &PanelData) {
                *self.0.lock() += 1;
            }
        }

        let mut panel = loaded_timeseries_panel();
        let counter = Arc::new(Counter(Mutex::new(0)));
        panel.query_runner().subscribe(counter.clone());
        panel.query_runner().publish(PanelData::done(vec![]));

        let updated = panel.field_config().with_override_added("byType");
        panel.update_field_config(updated);

        assert_eq!(*counter.0.lock(), 2);
        assert_eq!(panel.field_config().overrides.len(), 3);
    }

    #[test]
    fn test_change_plugin_drops_custom_and_restores_on_return() {
        let mut panel = loaded_timeseries_panel();
        let timeseries = panel.plugin().cloned().unwrap();

        panel.change_plugin(table_plugin());
        assert_eq!(panel.plugin_id(), "table");
        assert_eq!(panel.options().to_json(), json!({"showHeader": true}));
        assert_eq!(
            panel.field_config().defaults.get("custom").map(|c| c.to_json()),
            Some(json!({"align": "auto"}))
        );
        assert_eq!(panel.field_config().defaults.get("unit").and_then(|v| v.as_str()), Some("percent"));
        assert_eq!(panel.field_config().overrides.len(), 1);
        assert_eq!(
            panel.field_config().overrides[0].properties,
            vec![DynamicConfigValue::new("unit", "short")]
        );

        panel.change_plugin(timeseries);
        assert_eq!(panel.plugin_id(), "timeseries");
        assert_eq!(
            panel.options().to_json(),
            json!({"legend": {"showLegend": false}, "tooltip": {"mode": "single"}})
        );
        assert_eq!(panel.field_config().defaults.get_path("custom.lineWidth").and_then(|v| v.as_i64()), Some(3));
        let overrides = &panel.field_config().overrides;
        assert_eq!(overrides.len(), 2);
        assert_eq!(
            overrides[0].properties,
            vec![
                DynamicConfigValue::new("unit", "short"),
                DynamicConfigValue::new("custom.lineWidth", 5i64),
            ]
        );
        assert_eq!(overrides[1].matcher.options.as_ref().and_then(|o| o.as_str()), Some("mem"));
        assert_eq!(panel.config_rev(), 2);
    }

    #[test]
    fn test_edit_clone_isolated_until_commit() {
        let mut live = loaded_timeseries_panel();
        live.query_runner().publish(PanelData::done(vec![]));

        let mut clone = live.edit_clone();
        assert_ne!(clone.key(), live.key());
        assert!(clone.is_editing());
        assert!(clone.query_runner().last_result().is_some());

        clone.set_property(PanelProperty::Title("Edited".to_string()));
        clone.update_options(ConfigValue::from(json!({"legend": {"showLegend": true}})));
        assert_eq!(live.title(), "CPU");
        assert!(!live.has_changed());

        let committed = Arc::new(Mutex::new(0u64));
        let sink = committed.clone();
        live.events().subscribe_fn(move |event: &PanelEditCommitted| *sink.lock() = event.config_rev);

        live.commit_edit_clone(&clone);
        assert_eq!(live.title(), "Edited");
        assert_eq!(live.options(), clone.options());
        assert!(live.has_changed());
        assert_eq!(*committed.lock(), live.config_rev());
    }

    #[test]
    fn test_destroy_releases_runner() {
        let mut panel = loaded_timeseries_panel();
        panel.query_runner().publish(PanelData::done(vec![]));
        let destroyed = Arc::new(Mutex::new(false));
        let flag = destroyed.clone();
        panel.events().subscribe_fn(move |_: &PanelDestroyed| *flag.lock() = true);

        panel.destroy();
        assert!(*destroyed.lock());
        assert!(panel.query_runner().last_result().is_none());
    }
}
