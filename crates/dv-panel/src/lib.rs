//! Panels and panel plugins
//!
//! This crate provides the panel plugin model with its option builders, the
//! [`PanelModel`] that mediates between the persisted panel JSON and the
//! editor, the query-runner handle and the visualization picker.

pub mod events;
pub mod model;
pub mod plugin;
pub mod query_runner;
pub mod viz_picker;

use dv_fieldconfig::FieldConfigError;
use thiserror::Error;

pub use model::{PanelLink, PanelModel, PanelProperty, PanelSaveModel, RepeatDirection};
pub use plugin::{
    NestedPanelOptions, OptionsEditorEntry, OptionsSupplierContext, PanelOptionsEditorBuilder,
    PanelOptionsEditorItem, PanelOptionsSupplier, PanelPlugin, PanelPluginMeta, PluginState,
};
pub use query_runner::{PanelDataSubscriber, PanelQueryRunner};
pub use viz_picker::{filter_plugin_list, VisualizationRegistry};

/// Errors raised by panel operations
#[derive(Error, Debug)]
pub enum PanelError {
    #[error("Panel plugin not found: {0}")]
    PluginNotFound(String),

    #[error("Plugin '{actual}' loaded for a panel of type '{expected}'")]
    PluginMismatch { expected: String, actual: String },

    #[error("Field config error: {0}")]
    FieldConfig(#[from] FieldConfigError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
