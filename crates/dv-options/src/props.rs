//! Inputs shared by the category builders

use std::sync::Arc;

use dv_core::ConfigValue;
use dv_data::DataFrame;
use dv_fieldconfig::{standard_matchers, FieldConfigSource, MatcherRegistry};
use dv_panel::{PanelModel, PanelPlugin, PanelProperty};

/// Receives new panel options
pub type OnOptionsChangeFn = Arc<dyn Fn(ConfigValue) + Send + Sync>;

/// Receives a new field config
pub type OnFieldConfigChangeFn = Arc<dyn Fn(FieldConfigSource) + Send + Sync>;

/// Receives a changed panel-level property
pub type OnPanelConfigChangeFn = Arc<dyn Fn(PanelProperty) + Send + Sync>;

/// Everything the options pane is built from
#[derive(Clone)]
pub struct OptionPaneRenderProps<'a> {
    pub panel: &'a PanelModel,
    pub plugin: &'a PanelPlugin,
    /// Latest data delivered to the panel
    pub data: &'a [DataFrame],
    pub matchers: &'static MatcherRegistry,
    pub on_panel_options_changed: OnOptionsChangeFn,
    pub on_field_config_change: OnFieldConfigChangeFn,
    pub on_panel_config_change: OnPanelConfigChangeFn,
}

impl<'a> OptionPaneRenderProps<'a> {
    /// Props with the built-in matchers and callbacks that drop every change
    pub fn new(panel: &'a PanelModel, plugin: &'a PanelPlugin, data: &'a [DataFrame]) -> Self {
        Self {
            panel,
            plugin,
            data,
            matchers: standard_matchers(),
            on_panel_options_changed: Arc::new(|_: ConfigValue| {}),
            on_field_config_change: Arc::new(|_: FieldConfigSource| {}),
            on_panel_config_change: Arc::new(|_: PanelProperty| {}),
        }
    }

    pub fn on_panel_options_changed<F>(mut self, f: F) -> Self
    where
        F: Fn(ConfigValue) + Send + Sync + 'static,
    {
        self.on_panel_options_changed = Arc::new(f);
        self
    }

    pub fn on_field_config_change<F>(mut self, f: F) -> Self
    where
        F: Fn(FieldConfigSource) + Send + Sync + 'static,
    {
        self.on_field_config_change = Arc::new(f);
        self
    }

    pub fn on_panel_config_change<F>(mut self, f: F) -> Self
    where
        F: Fn(PanelProperty) + Send + Sync + 'static,
    {
        self.on_panel_config_change = Arc::new(f);
        self
    }

    pub fn options(&self) -> &ConfigValue {
        self.panel.options()
    }

    pub fn field_config(&self) -> &FieldConfigSource {
        self.panel.field_config()
    }
}
