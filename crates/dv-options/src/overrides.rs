//! Override rule categories and the edits made from them

use std::sync::Arc;

use dv_core::ConfigValue;
use dv_data::DataFrame;
use dv_fieldconfig::{
    ConfigOverrideRule, EditorKind, FieldConfigPropertyItem, FieldConfigRegistry, FieldConfigSource, FieldMatcherInfo,
    SelectableValue,
};
use indexmap::IndexSet;

use crate::descriptors::{
    CategoryHeader, EditorElement, OnRemoveFn, OptionsPaneCategoryDescriptor, OptionsPaneItemDescriptor,
};
use crate::props::{OnFieldConfigChangeFn, OptionPaneRenderProps};

pub const ADD_OVERRIDE_CATEGORY: &str = "add-override";

/// Edits of the override rules of one field config.
///
/// Every operation builds a new [`FieldConfigSource`] from the one the editor
/// was created with, forwards it to the change callback and returns it. Out of
/// range indexes and unknown property ids change nothing.
#[derive(Clone)]
pub struct OverrideEditor {
    source: FieldConfigSource,
    registry: Arc<FieldConfigRegistry>,
    on_change: OnFieldConfigChangeFn,
}

impl OverrideEditor {
    pub fn new(source: FieldConfigSource, registry: Arc<FieldConfigRegistry>, on_change: OnFieldConfigChangeFn) -> Self {
        Self {
            source,
            registry,
            on_change,
        }
    }

    pub fn source(&self) -> &FieldConfigSource {
        &self.source
    }

    fn forward(&self, next: Option<FieldConfigSource>) -> Option<FieldConfigSource> {
        if let Some(next) = &next {
            (self.on_change)(next.clone());
        }
        next
    }

    pub fn on_override_change(&self, index: usize, rule: ConfigOverrideRule) -> Option<FieldConfigSource> {
        self.forward(self.source.with_override_replaced(index, rule))
    }

    pub fn on_override_remove(&self, index: usize) -> Option<FieldConfigSource> {
        self.forward(self.source.with_override_removed(index))
    }

    /// Append a rule for the matcher kind; its options stay unset
    pub fn on_override_add(&self, matcher_id: &str) -> Option<FieldConfigSource> {
        self.forward(Some(self.source.with_override_added(matcher_id)))
    }

    pub fn on_matcher_options_change(&self, index: usize, options: ConfigValue) -> Option<FieldConfigSource> {
        self.forward(self.source.with_matcher_options(index, options))
    }

    pub fn on_dynamic_config_value_add(&self, index: usize, property_id: &str) -> Option<FieldConfigSource> {
        let next = self.source.with_property_added(index, property_id, &self.registry);
        if next.is_none() {
            tracing::debug!("Cannot add property '{}' to override {}", property_id, index + 1);
        }
        self.forward(next)
    }

    pub fn on_dynamic_config_value_change(
        &self,
        index: usize,
        property_index: usize,
        value: ConfigValue,
    ) -> Option<FieldConfigSource> {
        self.forward(self.source.with_property_changed(index, property_index, value))
    }

    pub fn on_dynamic_config_value_remove(&self, index: usize, property_index: usize) -> Option<FieldConfigSource> {
        self.forward(self.source.with_property_removed(index, property_index))
    }
}

/// One category per override rule, then the "add field override" category
/// when no search is active.
///
/// Nothing is returned for plugins without field config. Rules whose matcher
/// kind is unknown keep their header and properties but get no matcher
/// editor. Properties unknown to the registry are not rendered and stay
/// untouched in the source.
pub fn get_field_override_categories(
    props: &OptionPaneRenderProps<'_>,
    search_query: &str,
) -> Vec<OptionsPaneCategoryDescriptor> {
    let registry = props.plugin.field_config_registry();
    if registry.is_empty() {
        return Vec::new();
    }

    let source = props.field_config().clone();
    let editor = OverrideEditor::new(
        source.clone(),
        Arc::new(registry.clone()),
        props.on_field_config_change.clone(),
    );
    let field_names = data_field_names(props.data);

    let mut categories = Vec::with_capacity(source.overrides.len() + 1);
    for (index, rule) in source.overrides.iter().enumerate() {
        let title = format!("Override {}", index + 1);
        let matcher = props.matchers.get(&rule.matcher.id);
        if matcher.is_none() {
            tracing::debug!("Unknown matcher '{}' in {}", rule.matcher.id, title);
        }

        let mut category = OptionsPaneCategoryDescriptor::new(&title, &title);
        category.force_open = rule.properties.is_empty();
        category.header = Some(rule_header(rule, index, matcher, &editor));

        if let Some(matcher) = matcher {
            category.add_item(matcher_item(&title, index, rule, matcher, &field_names, &editor));
        }

        for (property_index, property) in rule.properties.iter().enumerate() {
            let Some(item) = registry.get_if_exists(&property.id) else {
                tracing::debug!("Skipping unknown property '{}' in {}", property.id, title);
                continue;
            };
            let descriptor = property_item(&title, index, property_index, item, property.value.clone(), &editor);
            category.add_item(descriptor);
        }

        if !rule.is_system_override() && rule.matcher.is_configured() {
            category.add_item(add_property_item(&title, index, rule, registry, &editor));
        }

        categories.push(category);
    }

    if search_query.is_empty() {
        categories.push(add_override_category(props, &editor));
    }

    categories
}

/// Distinct display names of the data fields, in data order
fn data_field_names(data: &[DataFrame]) -> Vec<String> {
    let names: IndexSet<String> = data
        .iter()
        .flat_map(|frame| frame.fields.iter())
        .map(|field| field.display_name().to_string())
        .collect();
    names.into_iter().collect()
}

fn rule_header(
    rule: &ConfigOverrideRule,
    index: usize,
    matcher: Option<&FieldMatcherInfo>,
    editor: &OverrideEditor,
) -> CategoryHeader {
    let label = rule
        .matcher
        .options
        .as_ref()
        .filter(|_| rule.matcher.is_configured())
        .map(|options| match matcher {
            Some(matcher) => (matcher.options_to_label)(options),
            None => options.to_string(),
        });

    let on_remove = if rule.is_system_override() {
        None
    } else {
        let editor = editor.clone();
        let on_remove: OnRemoveFn = Arc::new(move || {
            editor.on_override_remove(index);
        });
        Some(on_remove)
    };

    CategoryHeader {
        matcher_name: matcher.map_or_else(|| rule.matcher.id.clone(), |m| m.name.clone()),
        label,
        on_remove,
    }
}

fn matcher_item(
    title: &str,
    index: usize,
    rule: &ConfigOverrideRule,
    matcher: &FieldMatcherInfo,
    field_names: &[String],
    editor: &OverrideEditor,
) -> OptionsPaneItemDescriptor {
    let kind = matcher.editor.clone();
    let value = rule.matcher.options.clone().unwrap_or_default();
    let choices: Vec<SelectableValue> = field_names
        .iter()
        .map(|name| SelectableValue::new(name, name))
        .collect();
    let editor = editor.clone();

    OptionsPaneItemDescriptor::new(format!("{}/matcher", title), &matcher.name, move || {
        let editor = editor.clone();
        EditorElement::new(kind.clone(), value.clone())
            .with_choices(choices.clone())
            .on_change(move |options| {
                editor.on_matcher_options_change(index, options);
            })
    })
    .with_description(Some(matcher.description.clone()))
    .with_category_path(vec![title.to_string()])
}

fn property_item(
    title: &str,
    index: usize,
    property_index: usize,
    item: &FieldConfigPropertyItem,
    value: ConfigValue,
    editor: &OverrideEditor,
) -> OptionsPaneItemDescriptor {
    let kind = item.editor.clone();
    let settings = item.settings.clone();
    let editor = editor.clone();

    OptionsPaneItemDescriptor::new(format!("{}/property-{}", title, property_index), &item.name, move || {
        let on_change = editor.clone();
        let on_remove = editor.clone();
        EditorElement::new(kind.clone(), value.clone())
            .with_settings(settings.clone())
            .on_change(move |value| {
                on_change.on_dynamic_config_value_change(index, property_index, value);
            })
            .on_remove(move || {
                on_remove.on_dynamic_config_value_remove(index, property_index);
            })
    })
    .with_description(item.description.clone())
    .with_category_path(vec![title.to_string()])
}

fn property_label(item: &FieldConfigPropertyItem) -> String {
    match item.category.as_ref().filter(|names| !names.is_empty()) {
        Some(names) => format!("{} > {}", names.join(" > "), item.name),
        None => item.name.clone(),
    }
}

/// Picker of the properties the rule does not set yet
fn add_property_item(
    title: &str,
    index: usize,
    rule: &ConfigOverrideRule,
    registry: &FieldConfigRegistry,
    editor: &OverrideEditor,
) -> OptionsPaneItemDescriptor {
    let choices: Vec<SelectableValue> = registry
        .list()
        .filter(|item| !item.hide_from_overrides)
        .filter(|item| !rule.properties.iter().any(|property| property.id == item.id))
        .map(|item| SelectableValue::new(property_label(item), &item.id).with_description(item.description.clone()))
        .collect();
    let editor = editor.clone();

    OptionsPaneItemDescriptor::new(format!("{}/add-property", title), "Add override property", move || {
        let editor = editor.clone();
        EditorElement::new(EditorKind::ValuePicker, ConfigValue::Null)
            .with_choices(choices.clone())
            .on_change(move |value| {
                if let Some(property_id) = value.as_str() {
                    editor.on_dynamic_config_value_add(index, property_id);
                }
            })
    })
    .skipping_field()
    .with_category_path(vec![title.to_string()])
}

fn add_override_category(props: &OptionPaneRenderProps<'_>, editor: &OverrideEditor) -> OptionsPaneCategoryDescriptor {
    let choices = props.matchers.picker_options();
    let editor = editor.clone();
    let picker = OptionsPaneItemDescriptor::new(ADD_OVERRIDE_CATEGORY, "Add field override", move || {
        let editor = editor.clone();
        EditorElement::new(EditorKind::ValuePicker, ConfigValue::Null)
            .with_choices(choices.clone())
            .on_change(move |value| {
                if let Some(matcher_id) = value.as_str() {
                    editor.on_override_add(matcher_id);
                }
            })
    })
    .skipping_field();

    let mut category = OptionsPaneCategoryDescriptor::new(ADD_OVERRIDE_CATEGORY, "Add field override");
    category.custom_render = Some(picker);
    category
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visualization::tests::graph_plugin;
    use dv_data::{FieldType, FrameField};
    use dv_panel::{PanelModel, PanelPlugin, PanelPluginMeta};
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn panel_with(overrides: serde_json::Value) -> PanelModel {
        let json = json!({
            "type": "graph2",
            "fieldConfig": {"defaults": {}, "overrides": overrides},
        });
        PanelModel::from_json(&json.to_string()).unwrap()
    }

    fn capture(
        panel: &PanelModel,
        plugin: &PanelPlugin,
        data: &[DataFrame],
        query: &str,
    ) -> (Vec<OptionsPaneCategoryDescriptor>, Arc<Mutex<Option<FieldConfigSource>>>) {
        let seen = Arc::new(Mutex::new(None));
        let sink = seen.clone();
        let props = OptionPaneRenderProps::new(panel, plugin, data)
            .on_field_config_change(move |config| *sink.lock() = Some(config));
        (get_field_override_categories(&props, query), seen)
    }

    fn item_ids(category: &OptionsPaneCategoryDescriptor) -> Vec<String> {
        category.items.iter().map(|item| item.id.clone()).collect()
    }

    #[test]
    fn test_no_categories_without_field_config() {
        let plugin = PanelPlugin::new(PanelPluginMeta::new("text", "Text"));
        let panel = panel_with(json!([{"matcher": {"id": "byName", "options": "a"}, "properties": []}]));
        let (categories, _) = capture(&panel, &plugin, &[], "");
        assert!(categories.is_empty());
    }

    #[test]
    fn test_rule_categories_and_add_override() {
        let plugin = graph_plugin();
        let panel = panel_with(json!([
            {"matcher": {"id": "byName", "options": "cpu"}, "properties": [{"id": "unit", "value": "ms"}]},
            {"matcher": {"id": "byRegexp"}, "properties": []},
        ]));
        let (categories, _) = capture(&panel, &plugin, &[], "");

        let ids: Vec<_> = categories.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["Override 1", "Override 2", ADD_OVERRIDE_CATEGORY]);
        assert_eq!(
            item_ids(&categories[0]),
            vec!["Override 1/matcher", "Override 1/property-0", "Override 1/add-property"]
        );
        assert_eq!(item_ids(&categories[1]), vec!["Override 2/matcher"]);
        assert!(!categories[0].force_open);
        assert!(categories[1].force_open);

        let header = categories[0].header.as_ref().unwrap();
        assert_eq!(header.matcher_name, "Fields with name");
        assert_eq!(header.label.as_deref(), Some("cpu"));
        assert!(categories[1].header.as_ref().unwrap().label.is_none());

        let add = categories[2].custom_render.as_ref().unwrap().render();
        assert_eq!(add.choices.len(), 4);

        let (categories, _) = capture(&panel, &plugin, &[], "unit");
        assert_eq!(categories.len(), 2);
    }

    #[test]
    fn test_unknown_references_are_skipped_and_kept() {
        let plugin = graph_plugin();
        let overrides = json!([
            {"matcher": {"id": "removedMatcher", "options": "x"}, "properties": [{"id": "unit", "value": "s"}]},
            {
                "matcher": {"id": "byName", "options": "cpu"},
                "properties": [{"id": "custom.gone", "value": 5}, {"id": "unit", "value": "ms"}],
            },
        ]);
        let panel = panel_with(overrides.clone());
        let (categories, seen) = capture(&panel, &plugin, &[], "");

        assert_eq!(categories[0].header.as_ref().unwrap().matcher_name, "removedMatcher");
        assert_eq!(item_ids(&categories[0]), vec!["Override 1/property-0", "Override 1/add-property"]);
        assert_eq!(
            item_ids(&categories[1]),
            vec!["Override 2/matcher", "Override 2/property-1", "Override 2/add-property"]
        );

        let saved = serde_json::to_value(&panel.save_model().field_config.overrides).unwrap();
        assert_eq!(saved, overrides);

        categories[1].items[1].render().change("h".into());
        let next = seen.lock().clone().unwrap();
        let next = serde_json::to_value(&next.overrides).unwrap();
        assert_eq!(next[0], overrides[0]);
        assert_eq!(next[1]["properties"][0], json!({"id": "custom.gone", "value": 5}));
        assert_eq!(next[1]["properties"][1], json!({"id": "unit", "value": "h"}));
    }

    #[test]
    fn test_add_override_then_configure() {
        let plugin = graph_plugin();
        let mut panel = panel_with(json!([]));

        let (categories, seen) = capture(&panel, &plugin, &[], "");
        categories[0].custom_render.as_ref().unwrap().render().change("byName".into());
        let added = seen.lock().take().unwrap();
        assert_eq!(added.overrides[0].matcher.options, None);
        panel.update_field_config(added);

        let (categories, seen) = capture(&panel, &plugin, &[], "");
        assert!(categories[0].force_open);
        assert_eq!(item_ids(&categories[0]), vec!["Override 1/matcher"]);

        categories[0].items[0].render().change("cpu".into());
        panel.update_field_config(seen.lock().take().unwrap());
        let (categories, seen) = capture(&panel, &plugin, &[], "");
        assert!(categories[0].force_open);

        let picker = categories[0].items.last().unwrap().render();
        picker.change("custom.lineWidth".into());
        panel.update_field_config(seen.lock().take().unwrap());
        let (categories, _) = capture(&panel, &plugin, &[], "");
        assert!(!categories[0].force_open);
        assert_eq!(categories[0].items[1].title, "Line width");
        assert_eq!(categories[0].items[1].render().value.as_f64(), Some(1.0));
    }

    #[test]
    fn test_hidden_from_defaults_renders_in_override() {
        let plugin = graph_plugin();
        let panel = panel_with(json!([
            {"matcher": {"id": "byName", "options": "cpu"}, "properties": [{"id": "custom.hidden", "value": true}]},
        ]));
        let (categories, _) = capture(&panel, &plugin, &[], "");
        assert_eq!(categories[0].items[1].title, "Hidden option");
    }

    #[test]
    fn test_system_override_and_picker_choices() {
        let plugin = graph_plugin();
        let panel = panel_with(json!([
            {
                "matcher": {"id": "byNames", "options": {"names": ["a"], "mode": "exclude"}},
                "properties": [],
                "__systemRef": "hideSeriesFrom",
            },
            {"matcher": {"id": "byName", "options": "cpu"}, "properties": [{"id": "unit", "value": "ms"}]},
        ]));
        let data = vec![DataFrame::new(vec![
            FrameField::new("time", FieldType::Time),
            FrameField::new("cpu", FieldType::Number),
        ])];
        let (categories, _) = capture(&panel, &plugin, &data, "");

        let header = categories[0].header.as_ref().unwrap();
        assert!(header.on_remove.is_none());
        assert_eq!(header.label.as_deref(), Some("All except: a"));
        assert_eq!(item_ids(&categories[0]), vec!["Override 1/matcher"]);
        let names: Vec<_> = categories[0].items[0].render().choices.into_iter().map(|c| c.value).collect();
        assert_eq!(names, vec!["time", "cpu"]);

        assert!(categories[1].header.as_ref().unwrap().on_remove.is_some());
        let picker = categories[1].items.last().unwrap().render();
        let labels: Vec<_> = picker.choices.iter().map(|c| c.label.as_str()).collect();
        assert!(!labels.contains(&"Standard options > Unit"));
        assert!(labels.contains(&"Standard options > Min"));
        assert!(labels.contains(&"Axis > Soft min"));
        assert!(labels.contains(&"Hidden option"));
    }

    #[test]
    fn test_editor_operations_leave_source_untouched() {
        let plugin = graph_plugin();
        let source = FieldConfigSource::new(
            ConfigValue::object(),
            vec![
                ConfigOverrideRule::new("byName").with_matcher_options("a").with_property("unit", "ms"),
                ConfigOverrideRule::new("byType").with_matcher_options("number"),
            ],
        );
        let calls = Arc::new(Mutex::new(0usize));
        let counter = calls.clone();
        let editor = OverrideEditor::new(
            source.clone(),
            Arc::new(plugin.field_config_registry().clone()),
            Arc::new(move |_: FieldConfigSource| *counter.lock() += 1),
        );

        let removed = editor.on_override_remove(0).unwrap();
        assert_eq!(removed.overrides.len(), 1);
        assert_eq!(removed.overrides[0].matcher.id, "byType");

        let added = editor.on_dynamic_config_value_add(1, "custom.axisCustomScale").unwrap();
        assert_eq!(added.overrides[1].properties[0].value.as_bool(), Some(false));
        assert!(editor.on_dynamic_config_value_add(1, "custom.gone").is_none());

        let changed = editor.on_dynamic_config_value_change(0, 0, "s".into()).unwrap();
        assert_eq!(changed.overrides[0].properties[0].value.as_str(), Some("s"));
        let cleared = editor.on_matcher_options_change(0, ConfigValue::Null).unwrap();
        assert_eq!(cleared.overrides[0].matcher.options, None);
        let dropped = editor.on_dynamic_config_value_remove(0, 0).unwrap();
        assert!(dropped.overrides[0].properties.is_empty());
        let replaced = editor.on_override_change(1, ConfigOverrideRule::new("byRegexp")).unwrap();
        assert_eq!(replaced.overrides[1].matcher.id, "byRegexp");
        assert!(editor.on_override_remove(5).is_none());

        assert_eq!(*calls.lock(), 6);
        assert_eq!(editor.source(), &source);
    }
}
