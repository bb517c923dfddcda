//! The "Panel options" category: title, description, links and repeat

use dv_core::ConfigValue;
use dv_fieldconfig::{EditorKind, SelectableValue};
use dv_panel::{PanelLink, PanelProperty, RepeatDirection};

use crate::descriptors::{EditorElement, OptionsPaneCategoryDescriptor, OptionsPaneItemDescriptor};
use crate::props::{OnPanelConfigChangeFn, OptionPaneRenderProps};

pub const PANEL_FRAME_CATEGORY: &str = "Panel options";

const MAX_PER_ROW_CHOICES: [u32; 6] = [2, 3, 4, 6, 8, 12];

fn property_item<P, F>(
    id: &str,
    title: &str,
    editor: EditorKind,
    value: ConfigValue,
    on_change: &OnPanelConfigChangeFn,
    parse: P,
    choices: F,
) -> OptionsPaneItemDescriptor
where
    P: Fn(&ConfigValue) -> Option<PanelProperty> + Send + Sync + Clone + 'static,
    F: Fn() -> Vec<SelectableValue> + Send + Sync + 'static,
{
    let on_change = on_change.clone();
    OptionsPaneItemDescriptor::new(id, title, move || {
        let on_change = on_change.clone();
        let parse = parse.clone();
        EditorElement::new(editor.clone(), value.clone())
            .with_choices(choices())
            .on_change(move |value| {
                if let Some(property) = parse(&value) {
                    on_change(property);
                }
            })
    })
}

fn no_choices() -> Vec<SelectableValue> {
    Vec::new()
}

fn non_empty(value: &ConfigValue) -> Option<String> {
    value.as_str().filter(|s| !s.is_empty()).map(str::to_string)
}

/// Category for panel-level properties
pub fn get_panel_frame_category(props: &OptionPaneRenderProps<'_>) -> OptionsPaneCategoryDescriptor {
    let panel = props.panel;
    let on_change = &props.on_panel_config_change;
    let path = vec![PANEL_FRAME_CATEGORY.to_string()];
    let mut category = OptionsPaneCategoryDescriptor::new(PANEL_FRAME_CATEGORY, PANEL_FRAME_CATEGORY);

    category
        .add_item(
            property_item(
                "panel.title",
                "Title",
                EditorKind::Text,
                panel.title().into(),
                on_change,
                |value: &ConfigValue| Some(PanelProperty::Title(value.as_str().unwrap_or_default().to_string())),
                no_choices,
            )
            .with_popular_rank(Some(1))
            .with_category_path(path.clone()),
        )
        .add_item(
            property_item(
                "panel.description",
                "Description",
                EditorKind::TextArea,
                panel.description().into(),
                on_change,
                |value: &ConfigValue| Some(PanelProperty::Description(non_empty(value))),
                no_choices,
            )
            .with_popular_rank(Some(2))
            .with_category_path(path.clone()),
        )
        .add_item(
            property_item(
                "panel.transparent",
                "Transparent background",
                EditorKind::Boolean,
                panel.transparent().into(),
                on_change,
                |value: &ConfigValue| value.as_bool().map(PanelProperty::Transparent),
                no_choices,
            )
            .with_popular_rank(Some(3))
            .with_category_path(path.clone()),
        );

    let mut links = OptionsPaneCategoryDescriptor::new("Panel links", "Panel links")
        .nested()
        .closed_by_default();
    links.items_count = Some(panel.links().len());
    links.add_item(
        property_item(
            "panel.links",
            "Panel links",
            EditorKind::DataLinks,
            links_value(panel.links()),
            on_change,
            |value: &ConfigValue| {
                serde_json::from_value::<Vec<PanelLink>>(value.to_json())
                    .ok()
                    .map(PanelProperty::Links)
            },
            no_choices,
        )
        .with_category_path(vec![PANEL_FRAME_CATEGORY.to_string(), "Panel links".to_string()]),
    );
    category.add_category(links);

    let repeat_path = vec![PANEL_FRAME_CATEGORY.to_string(), "Repeat options".to_string()];
    let mut repeat = OptionsPaneCategoryDescriptor::new("Repeat options", "Repeat options")
        .nested()
        .closed_by_default();
    repeat.add_item(
        property_item(
            "panel.repeat",
            "Repeat by variable",
            EditorKind::Text,
            panel.repeat().into(),
            on_change,
            |value: &ConfigValue| Some(PanelProperty::Repeat(non_empty(value))),
            no_choices,
        )
        .with_category_path(repeat_path.clone()),
    );

    if panel.repeat().is_some() {
        let direction = match panel.repeat_direction() {
            Some(RepeatDirection::Vertical) => "v",
            _ => "h",
        };
        repeat.add_item(
            property_item(
                "panel.repeatDirection",
                "Repeat direction",
                EditorKind::Radio,
                direction.into(),
                on_change,
                |value: &ConfigValue| {
                    let direction = match value.as_str() {
                        Some("h") => Some(RepeatDirection::Horizontal),
                        Some("v") => Some(RepeatDirection::Vertical),
                        _ => None,
                    };
                    Some(PanelProperty::RepeatDirection(direction))
                },
                || {
                    vec![
                        SelectableValue::new("Horizontal", "h"),
                        SelectableValue::new("Vertical", "v"),
                    ]
                },
            )
            .with_category_path(repeat_path.clone()),
        );

        if direction == "h" {
            repeat.add_item(
                property_item(
                    "panel.maxPerRow",
                    "Max per row",
                    EditorKind::Select,
                    panel.max_per_row().map(i64::from).into(),
                    on_change,
                    |value: &ConfigValue| {
                        let max = value.as_i64().and_then(|max| u32::try_from(max).ok());
                        Some(PanelProperty::MaxPerRow(max))
                    },
                    || {
                        MAX_PER_ROW_CHOICES
                            .iter()
                            .map(|n| SelectableValue::new(n.to_string(), n.to_string()))
                            .collect()
                    },
                )
                .with_category_path(repeat_path),
            );
        }
    }
    category.add_category(repeat);

    category
}

fn links_value(links: &[PanelLink]) -> ConfigValue {
    serde_json::to_value(links)
        .map(ConfigValue::from)
        .unwrap_or_else(|_| ConfigValue::array(Vec::new()))
}
