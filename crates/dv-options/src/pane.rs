//! Options pane assembly
//!
//! Puts the panel frame, visualization and override categories together for
//! the selected list mode, or runs the search engine over them while a query
//! is active. Expanded and collapsed state is kept in the injected
//! [`KeyValueStore`].

use std::sync::Arc;

use dv_core::{EditorSettings, KeyValueStore};

use crate::descriptors::{OptionsPaneCategoryDescriptor, OptionsPaneItemDescriptor};
use crate::overrides::get_field_override_categories;
use crate::panel_frame::get_panel_frame_category;
use crate::props::OptionPaneRenderProps;
use crate::recent::get_recent_options;
use crate::search::OptionSearchEngine;
use crate::visualization::get_visualization_options;

pub const RECENT_OPTIONS_CATEGORY: &str = "Recent options";

/// Which categories the pane lists when not searching
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OptionFilter {
    #[default]
    All,
    Overrides,
    Recent,
}

/// What the pane shows
#[derive(Debug, Clone)]
pub enum OptionsPaneView {
    Categories(Vec<OptionsPaneCategoryDescriptor>),
    Search {
        option_hits: Vec<OptionsPaneItemDescriptor>,
        override_hits: Vec<OptionsPaneCategoryDescriptor>,
        matched: usize,
        total: usize,
    },
}

impl OptionsPaneView {
    /// "N/M options matched" while searching
    pub fn match_summary(&self) -> Option<String> {
        match self {
            OptionsPaneView::Search { matched, total, .. } => Some(format!("{}/{} options matched", matched, total)),
            OptionsPaneView::Categories(_) => None,
        }
    }
}

pub struct OptionsPane {
    settings: EditorSettings,
    store: Arc<dyn KeyValueStore>,
}

impl OptionsPane {
    pub fn new(settings: EditorSettings, store: Arc<dyn KeyValueStore>) -> Self {
        Self { settings, store }
    }

    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    /// Build the pane for a list mode and search query
    pub fn build(&self, props: &OptionPaneRenderProps<'_>, filter: OptionFilter, query: &str) -> OptionsPaneView {
        let query = query.trim();
        let searching = query.chars().count() >= self.settings.min_search_query_len;

        let mut categories = vec![get_panel_frame_category(props)];
        categories.extend(get_visualization_options(props));
        let overrides = get_field_override_categories(props, if searching { query } else { "" });

        if searching {
            let result = OptionSearchEngine::new(&categories, &overrides).search(query);
            tracing::debug!(
                "Search '{}' matched {}/{} options, {} override categories",
                query,
                result.matched_count(),
                result.total_count,
                result.override_hits.len()
            );
            return OptionsPaneView::Search {
                matched: result.matched_count(),
                total: result.total_count,
                option_hits: result.option_hits,
                override_hits: result.override_hits,
            };
        }

        match filter {
            OptionFilter::All => {
                categories.extend(overrides);
                OptionsPaneView::Categories(categories)
            }
            OptionFilter::Overrides => OptionsPaneView::Categories(overrides),
            OptionFilter::Recent => {
                let mut recent = OptionsPaneCategoryDescriptor::new(RECENT_OPTIONS_CATEGORY, RECENT_OPTIONS_CATEGORY);
                recent.force_open = true;
                for item in get_recent_options(&categories, self.settings.recent_options_limit) {
                    recent.add_item(item);
                }
                OptionsPaneView::Categories(vec![recent])
            }
        }
    }

    /// Forced open, then the stored state, then the category default
    pub fn is_category_open(&self, category: &OptionsPaneCategoryDescriptor) -> bool {
        if category.force_open {
            return true;
        }
        let key = self.settings.category_storage_key(&category.id);
        self.store
            .get_bool(&key)
            .unwrap_or(category.is_open_default && self.settings.categories_open_by_default)
    }

    pub fn set_category_open(&self, category_id: &str, open: bool) {
        let key = self.settings.category_storage_key(category_id);
        tracing::debug!("Storing {} = {}", key, open);
        self.store.set(&key, open.into());
    }
}
