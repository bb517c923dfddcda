//! Editor settings

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Tunables for the options pane
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    /// Maximum number of items in the "recent options" shortlist
    pub recent_options_limit: usize,

    /// Prefix for keys written to the UI state store
    pub storage_namespace: String,

    /// Whether categories without stored state start expanded
    pub categories_open_by_default: bool,

    /// Queries shorter than this show the regular tree instead of search hits
    pub min_search_query_len: usize,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            recent_options_limit: 5,
            storage_namespace: "dashboard.panel-edit".to_string(),
            categories_open_by_default: true,
            min_search_query_len: 1,
        }
    }
}

impl EditorSettings {
    /// Load settings from JSON, missing keys keep their defaults
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let settings: EditorSettings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check the settings for values the pane cannot work with
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.storage_namespace.trim().is_empty() {
            return Err(CoreError::InvalidSetting {
                name: "storage_namespace".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        if self.min_search_query_len == 0 {
            return Err(CoreError::InvalidSetting {
                name: "min_search_query_len".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Storage key for a category's expanded state
    pub fn category_storage_key(&self, category_id: &str) -> String {
        format!("{}.category-{}", self.storage_namespace, category_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let settings = EditorSettings::from_json(r#"{"recent_options_limit": 3}"#).unwrap();
        assert_eq!(settings.recent_options_limit, 3);
        assert_eq!(settings.storage_namespace, "dashboard.panel-edit");
        assert!(settings.categories_open_by_default);
    }

    #[test]
    fn test_invalid_settings() {
        assert!(matches!(
            EditorSettings::from_json(r#"{"storage_namespace": " "}"#),
            Err(CoreError::InvalidSetting { .. })
        ));
        assert!(matches!(
            EditorSettings::from_json("not json"),
            Err(CoreError::Json(_))
        ));
    }

    #[test]
    fn test_category_storage_key() {
        let settings = EditorSettings::default();
        assert_eq!(
            settings.category_storage_key("Axis"),
            "dashboard.panel-edit.category-Axis"
        );
    }
}
