//! Core functionality for the panel editor
//!
//! This crate provides the shared value model, the event bus, the injected
//! UI-state store and editor settings used by the other crates.

pub mod events;
pub mod settings;
pub mod store;
pub mod value;

use thiserror::Error;

// Re-export commonly used types
pub use events::{EventBus, Event, EventHandler, SubscriptionId, handler_from_fn};
pub use settings::EditorSettings;
pub use store::{KeyValueStore, MemoryStore};
pub use value::{
    ConfigMap, ConfigValue, PathSegment, merge_defaults, parse_path, set_immutably, unset_immutably,
};

/// Errors raised by the core crate
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid setting '{name}': {reason}")]
    InvalidSetting { name: String, reason: String },
}
