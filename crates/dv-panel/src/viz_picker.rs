//! Visualization picker
//!
//! Lists the panel plugins a user can switch to and filters them by a
//! search query.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::plugin::{PanelPlugin, PanelPluginMeta, PluginState};
use crate::PanelError;

/// Id of the plugin surfaced by queries for the legacy graph panel
const TIMESERIES_PLUGIN_ID: &str = "timeseries";

/// Loaded panel plugins keyed by id
#[derive(Debug, Default, Clone)]
pub struct VisualizationRegistry {
    plugins: IndexMap<String, Arc<PanelPlugin>>,
}

impl VisualizationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin, replacing a previously loaded version
    pub fn register(&mut self, plugin: PanelPlugin) -> Arc<PanelPlugin> {
        let plugin = Arc::new(plugin);
        if self.plugins.insert(plugin.meta.id.clone(), plugin.clone()).is_some() {
            tracing::debug!("Replaced panel plugin '{}'", plugin.meta.id);
        }
        plugin
    }

    pub fn get(&self, id: &str) -> Result<Arc<PanelPlugin>, PanelError> {
        self.plugins
            .get(id)
            .cloned()
            .ok_or_else(|| PanelError::PluginNotFound(id.to_string()))
    }

    /// Plugins shown in the picker, ordered by sort then name
    pub fn list(&self) -> Vec<&PanelPluginMeta> {
        let mut metas: Vec<&PanelPluginMeta> = self
            .plugins
            .values()
            .map(|plugin| &plugin.meta)
            .filter(|meta| !meta.hide_from_list)
            .collect();
        metas.sort_by(|a, b| a.sort.cmp(&b.sort).then_with(|| a.name.cmp(&b.name)));
        metas
    }

    /// Filter the picker list.
    ///
    /// Name prefix matches come before other name matches. Deprecated
    /// plugins only show up when they are the current one.
    pub fn filter(&self, query: &str, current_id: &str) -> Vec<&PanelPluginMeta> {
        filter_plugin_list(self.list(), query, current_id)
    }
}

/// Filter an ordered plugin list by a search query
pub fn filter_plugin_list<'a>(
    plugins: Vec<&'a PanelPluginMeta>,
    query: &str,
    current_id: &str,
) -> Vec<&'a PanelPluginMeta> {
    let visible = plugins
        .into_iter()
        .filter(|meta| meta.state != PluginState::Deprecated || meta.id == current_id);

    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return visible.collect();
    }

    let is_graph_query = "graph".starts_with(&query);
    let mut first = Vec::new();
    let mut rest = Vec::new();

    for meta in visible {
        match meta.name.to_lowercase().find(&query) {
            Some(0) => first.push(meta),
            Some(_) => rest.push(meta),
            None if is_graph_query && meta.id == TIMESERIES_PLUGIN_ID => first.push(meta),
            None => {}
        }
    }

    first.extend(rest);
    first
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn registry() -> VisualizationRegistry {
        let mut registry = VisualizationRegistry::new();
        for meta in [
            PanelPluginMeta::new("timeseries", "Time series").with_sort(0),
            PanelPluginMeta::new("barchart", "Bar chart").with_sort(2),
            PanelPluginMeta::new("stat", "Stat").with_sort(1),
            PanelPluginMeta::new("bargauge", "Bar gauge").with_sort(2),
            PanelPluginMeta::new("gauge", "Gauge").with_sort(3),
            PanelPluginMeta::new("graph", "Graph (old)").with_state(PluginState::Deprecated),
            PanelPluginMeta::new("row", "Row").hidden(),
        ] {
            registry.register(PanelPlugin::new(meta));
        }
        registry
    }

    fn ids(metas: Vec<&PanelPluginMeta>) -> Vec<&str> {
        metas.into_iter().map(|meta| meta.id.as_str()).collect()
    }

    #[test]
    fn test_list_sorted_and_hidden_removed() {
        assert_eq!(
            ids(registry().list()),
            vec!["timeseries", "stat", "barchart", "bargauge", "gauge", "graph"]
        );
    }

    #[test]
    fn test_filter_prefix_first() {
        let registry = registry();
        assert_eq!(ids(registry.filter("gau", "stat")), vec!["gauge", "bargauge"]);
        assert_eq!(ids(registry.filter("", "stat")), vec!["timeseries", "stat", "barchart", "bargauge", "gauge"]);
    }

    #[test]
    fn test_deprecated_only_when_current() {
        let registry = registry();
        assert_eq!(ids(registry.filter("graph", "stat")), vec!["timeseries"]);
        assert_eq!(ids(registry.filter("graph", "graph")), vec!["timeseries", "graph"]);
    }

    #[test]
    fn test_get_unknown_plugin() {
        assert!(matches!(registry().get("nope"), Err(PanelError::PluginNotFound(_))));
        assert_eq!(registry().get("stat").unwrap().meta.name, "Stat");
    }
}
