//! Categories for the plugin's panel options and field config defaults

use std::sync::Arc;

use dv_core::{set_immutably, ConfigValue};
use dv_fieldconfig::update_default_field_config_value;
use dv_panel::{NestedPanelOptions, OptionsEditorEntry, OptionsSupplierContext, PanelOptionsEditorItem};
use indexmap::IndexMap;

use crate::descriptors::{EditorElement, OptionsPaneCategoryDescriptor, OptionsPaneItemDescriptor};
use crate::override_info::get_option_overrides;
use crate::props::{OnOptionsChangeFn, OptionPaneRenderProps};

/// Categories keyed by title, in first-seen order
struct CategoryIndex {
    fallback: String,
    categories: IndexMap<String, OptionsPaneCategoryDescriptor>,
}

impl CategoryIndex {
    fn new(fallback: &str) -> Self {
        Self {
            fallback: fallback.to_string(),
            categories: IndexMap::new(),
        }
    }

    /// Bucket named by the first category element, the plugin name otherwise
    fn get(&mut self, category: Option<&Vec<String>>) -> &mut OptionsPaneCategoryDescriptor {
        let title = category
            .and_then(|names| names.first())
            .cloned()
            .unwrap_or_else(|| self.fallback.clone());
        self.categories
            .entry(title.clone())
            .or_insert_with(|| OptionsPaneCategoryDescriptor::new(title.clone(), title))
    }

    fn into_categories(self) -> Vec<OptionsPaneCategoryDescriptor> {
        self.categories.into_values().collect()
    }
}

/// Build the plugin's option categories followed by the field config
/// defaults categories.
///
/// Items hidden from defaults and items whose `show_if` rejects the current
/// config are left out. Nested option groups are flattened into their parent
/// category; items of a group that declare a category land in a subcategory.
pub fn get_visualization_options(props: &OptionPaneRenderProps<'_>) -> Vec<OptionsPaneCategoryDescriptor> {
    let plugin = props.plugin;
    let options = props.options().clone();
    let mut index = CategoryIndex::new(&plugin.meta.name);

    let context = OptionsSupplierContext {
        options: &options,
        data: props.data,
    };
    for entry in plugin.options_editors(&context).entries() {
        match entry {
            OptionsEditorEntry::Item(item) => {
                if !item.is_shown(&options, props.data) {
                    continue;
                }
                let category = index.get(item.category.as_ref());
                let category_path = vec![category.title.clone()];
                category.add_item(panel_option_item(item, item.path.clone(), &options, category_path, props));
            }
            OptionsEditorEntry::Nested(nested) => {
                if !nested.show_if.as_ref().map_or(true, |show_if| show_if(&options, props.data)) {
                    continue;
                }
                let category = index.get(nested.category.as_ref());
                add_nested_options(category, nested, &nested.path, &options, props);
            }
        }
    }

    let field_config = props.field_config().clone();
    let defaults = &field_config.defaults;
    let custom = defaults.get("custom").cloned().unwrap_or_else(ConfigValue::object);

    for item in plugin.field_config_registry().list() {
        if item.hide_from_defaults {
            continue;
        }
        let shown_for = if item.is_custom { &custom } else { defaults };
        if !item.is_shown(shown_for, props.data) {
            continue;
        }

        let value = defaults.get_path(&item.config_path()).cloned().unwrap_or_default();
        let category = index.get(item.category.as_ref());
        if let Some(items_count) = &item.get_items_count {
            category.items_count = items_count(Some(&value).filter(|v| !v.is_null()));
        }

        let render_item = item.clone();
        let source = field_config.clone();
        let on_change = props.on_field_config_change.clone();
        let descriptor = OptionsPaneItemDescriptor::new(format!("fieldConfig.{}", item.id), &item.name, move || {
            let item = render_item.clone();
            let source = source.clone();
            let on_change = on_change.clone();
            EditorElement::new(item.editor.clone(), value.clone())
                .with_settings(item.settings.clone())
                .on_change(move |value| {
                    on_change(update_default_field_config_value(&source, &item.path, value, item.is_custom))
                })
        })
        .with_description(item.description.clone())
        .with_popular_rank(item.popular_rank)
        .with_category_path(vec![category.title.clone()])
        .with_overrides(get_option_overrides(item, &field_config, props.data));

        category.add_item(descriptor);
    }

    index.into_categories()
}

fn add_nested_options(
    category: &mut OptionsPaneCategoryDescriptor,
    nested: &NestedPanelOptions,
    base_path: &str,
    options: &ConfigValue,
    props: &OptionPaneRenderProps<'_>,
) {
    let group_options = options.get_path(base_path).cloned().unwrap_or_else(ConfigValue::object);
    let context = OptionsSupplierContext {
        options: &group_options,
        data: props.data,
    };
    let parent_title = category.title.clone();

    for entry in nested.items(&context).entries() {
        match entry {
            OptionsEditorEntry::Item(item) => {
                if !item.is_shown(&group_options, props.data) {
                    continue;
                }
                let path = format!("{}.{}", base_path, item.path);
                match item.category.as_ref().and_then(|names| names.first()) {
                    Some(sub_title) => {
                        let id = format!("{}/{}", parent_title, sub_title);
                        let category_path = vec![parent_title.clone(), sub_title.clone()];
                        category
                            .get_or_add_category(&id, sub_title)
                            .add_item(panel_option_item(item, path, options, category_path, props));
                    }
                    None => {
                        let category_path = vec![parent_title.clone()];
                        category.add_item(panel_option_item(item, path, options, category_path, props));
                    }
                }
            }
            OptionsEditorEntry::Nested(inner) => {
                if !inner.show_if.as_ref().map_or(true, |show_if| show_if(&group_options, props.data)) {
                    continue;
                }
                let path = format!("{}.{}", base_path, inner.path);
                add_nested_options(category, inner, &path, options, props);
            }
        }
    }
}

/// Item editing the panel option at `path`
fn panel_option_item(
    item: &PanelOptionsEditorItem,
    path: String,
    options: &ConfigValue,
    category_path: Vec<String>,
    props: &OptionPaneRenderProps<'_>,
) -> OptionsPaneItemDescriptor {
    let editor = item.editor.clone();
    let settings = item.settings.clone();
    let value = options.get_path(&path).cloned().unwrap_or_default();
    let options = options.clone();
    let on_change: OnOptionsChangeFn = props.on_panel_options_changed.clone();
    let id = format!("options.{}", path);

    OptionsPaneItemDescriptor::new(id, &item.name, move || {
        let options = options.clone();
        let path = path.clone();
        let on_change = Arc::clone(&on_change);
        EditorElement::new(editor.clone(), value.clone())
            .with_settings(settings.clone())
            .on_change(move |value| on_change(set_immutably(&options, &path, value)))
    })
    .with_description(item.description.clone())
    .with_category_path(category_path)
}
