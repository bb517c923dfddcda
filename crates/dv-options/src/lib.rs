//! Options pane composition for the panel editor
//!
//! Builds the categorized, searchable descriptor tree a front end renders
//! for one panel: panel-level properties, the plugin's panel options, field
//! config defaults and one category per override rule. Building is pure;
//! edits made through an item's editor are reported through the callbacks in
//! [`OptionPaneRenderProps`].

pub mod descriptors;
pub mod override_info;
pub mod overrides;
pub mod pane;
pub mod panel_frame;
pub mod props;
pub mod recent;
pub mod search;
pub mod visualization;

pub use descriptors::{
    tree_outline, CategoryHeader, EditorElement, OptionsPaneCategoryDescriptor, OptionsPaneItemDescriptor,
};
pub use override_info::{get_option_overrides, OptionPaneItemOverrideInfo, OverrideInfoKind};
pub use overrides::{get_field_override_categories, OverrideEditor};
pub use pane::{OptionFilter, OptionsPane, OptionsPaneView};
pub use panel_frame::get_panel_frame_category;
pub use props::OptionPaneRenderProps;
pub use recent::get_recent_options;
pub use search::{OptionSearchEngine, OptionSearchResult};
pub use visualization::get_visualization_options;
