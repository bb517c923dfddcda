//! Events published on a panel's event bus

use uuid::Uuid;

/// Panel options replaced
#[derive(Debug, Clone, PartialEq)]
pub struct PanelOptionsChanged {
    pub key: Uuid,
    pub config_rev: u64,
}

/// Field config replaced
#[derive(Debug, Clone, PartialEq)]
pub struct FieldConfigChanged {
    pub key: Uuid,
    pub config_rev: u64,
}

/// A panel-level property (title, links, repeat...) changed
#[derive(Debug, Clone, PartialEq)]
pub struct PanelPropertyChanged {
    pub key: Uuid,
    pub property: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PanelQueriesChanged {
    pub key: Uuid,
}

/// Visualization switched
#[derive(Debug, Clone, PartialEq)]
pub struct PanelPluginChanged {
    pub key: Uuid,
    pub previous: String,
    pub current: String,
}

/// Edits of an edit clone applied to the live panel
#[derive(Debug, Clone, PartialEq)]
pub struct PanelEditCommitted {
    pub key: Uuid,
    pub config_rev: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PanelDestroyed {
    pub key: Uuid,
}

dv_core::impl_event!(
    PanelOptionsChanged,
    FieldConfigChanged,
    PanelPropertyChanged,
    PanelQueriesChanged,
    PanelPluginChanged,
    PanelEditCommitted,
    PanelDestroyed,
);
