//! Data frames handed to the panel editor by the query subsystem
//!
//! The editor never runs queries; it only reads the latest result to show
//! "set by data" hints, evaluate `show_if` predicates and resolve per-field
//! configuration.

pub mod frame;

use thiserror::Error;

// Re-exports
pub use frame::{DataFrame, FieldType, FrameField, LoadingState, PanelData};

/// Errors that can occur in data operations
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Invalid field config for '{field}': {source}")]
    InvalidFieldConfig {
        field: String,
        #[source]
        source: serde_json::Error,
    },
}
