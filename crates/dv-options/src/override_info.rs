//! "Overridden elsewhere" indicators for field options

use dv_data::DataFrame;
use dv_fieldconfig::{FieldConfigPropertyItem, FieldConfigSource};

/// Where else an option is set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideInfoKind {
    /// A data field's own config sets it
    Data,
    /// An override rule sets it
    Rule,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptionPaneItemOverrideInfo {
    pub kind: OverrideInfoKind,
    pub description: String,
    pub tooltip: String,
}

/// Indicators for one field option.
///
/// Every field of every frame is scanned for its own value at the option's
/// path; one data indicator is emitted when any field sets it. One rule
/// indicator lists the override rules setting the option. Both can be
/// present at once.
pub fn get_option_overrides(
    item: &FieldConfigPropertyItem,
    source: &FieldConfigSource,
    data: &[DataFrame],
) -> Vec<OptionPaneItemOverrideInfo> {
    let mut infos = Vec::new();
    let path = item.config_path();

    let set_by_data = data.iter().any(|frame| {
        frame
            .fields
            .iter()
            .any(|field| field.config.get_path(&path).map_or(false, |value| !value.is_null()))
    });
    if set_by_data {
        infos.push(OptionPaneItemOverrideInfo {
            kind: OverrideInfoKind::Data,
            description: "Data contains this option".to_string(),
            tooltip: "Data contains this option".to_string(),
        });
    }

    let rules: Vec<String> = source
        .overrides
        .iter()
        .enumerate()
        .filter(|(_, rule)| rule.properties.iter().any(|property| property.id == item.id))
        .map(|(index, _)| format!("Override {}", index + 1))
        .collect();
    if !rules.is_empty() {
        infos.push(OptionPaneItemOverrideInfo {
            kind: OverrideInfoKind::Rule,
            description: "An override rule sets this option".to_string(),
            tooltip: rules.join(", "),
        });
    }

    infos
}
