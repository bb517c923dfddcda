//! Field config for panels
//!
//! This crate holds the registry of field-configurable properties, the
//! persisted [`FieldConfigSource`] with its override rules, the built-in
//! field matchers and the resolution of the effective per-field config.

pub mod defaults;
pub mod editor;
pub mod matchers;
pub mod overrides;
pub mod registry;
pub mod source;
pub mod standard;

use thiserror::Error;

pub use defaults::{apply_registry_defaults, update_default_field_config_value};
pub use editor::{EditorKind, SelectableValue};
pub use matchers::{standard_matchers, FieldMatcherInfo, MatcherRegistry};
pub use overrides::{apply_field_overrides, validate_field_config};
pub use registry::{FieldConfigEditorBuilder, FieldConfigPropertyItem, FieldConfigRegistry};
pub use source::{ConfigOverrideRule, DynamicConfigValue, FieldConfigSource, MatcherConfig};
pub use standard::{build_field_config_registry, StandardOptionsConfig};

/// Errors raised while building registries or loading field config
#[derive(Error, Debug)]
pub enum FieldConfigError {
    #[error("Property not found: {0}")]
    PropertyNotFound(String),

    #[error("Duplicate property id: {0}")]
    DuplicateProperty(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
