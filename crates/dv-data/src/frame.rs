//! Frames, fields and panel data

use std::fmt;

use arrow::array::ArrayRef;
use arrow::datatypes::{DataType, Field};
use arrow::record_batch::RecordBatch;
use dv_core::ConfigValue;
use serde::{Deserialize, Serialize};

use crate::DataError;

/// Arrow field metadata key holding a JSON field config set by the data source
pub const FIELD_CONFIG_METADATA_KEY: &str = "config";

/// Coarse field type used by matchers and `should_apply` predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Number,
    String,
    Time,
    Boolean,
    Other,
}

impl FieldType {
    /// Parse the persisted name (`"number"`, `"time"`, ...)
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "number" => Some(FieldType::Number),
            "string" => Some(FieldType::String),
            "time" => Some(FieldType::Time),
            "boolean" => Some(FieldType::Boolean),
            "other" => Some(FieldType::Other),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FieldType::Number => "number",
            FieldType::String => "string",
            FieldType::Time => "time",
            FieldType::Boolean => "boolean",
            FieldType::Other => "other",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<&DataType> for FieldType {
    fn from(data_type: &DataType) -> Self {
        match data_type {
            DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float16
            | DataType::Float32
            | DataType::Float64
            | DataType::Decimal128(_, _)
            | DataType::Decimal256(_, _) => FieldType::Number,
            DataType::Utf8 | DataType::LargeUtf8 => FieldType::String,
            DataType::Timestamp(_, _)
            | DataType::Date32
            | DataType::Date64
            | DataType::Time32(_)
            | DataType::Time64(_) => FieldType::Time,
            DataType::Boolean => FieldType::Boolean,
            _ => FieldType::Other,
        }
    }
}

/// One named column of a frame together with its field config
#[derive(Debug, Clone)]
pub struct FrameField {
    /// Column name
    pub name: String,

    /// Coarse type
    pub field_type: FieldType,

    /// Field config, either set by the data source or resolved by the editor
    pub config: ConfigValue,

    /// Column values, absent for schema-only frames
    pub values: Option<ArrayRef>,
}

impl FrameField {
    /// Create a field with an empty config and no values
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            config: ConfigValue::object(),
            values: None,
        }
    }

    /// Set the field config
    pub fn with_config(mut self, config: ConfigValue) -> Self {
        self.config = config;
        self
    }

    /// Name shown to users, `displayName` from the config when present
    pub fn display_name(&self) -> &str {
        self.config
            .get("displayName")
            .and_then(|v| v.as_str())
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.name)
    }

    /// Number of values
    pub fn len(&self) -> usize {
        self.values.as_ref().map(|v| v.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An ordered collection of fields returned by one query
#[derive(Debug, Clone, Default)]
pub struct DataFrame {
    /// Frame name
    pub name: Option<String>,

    /// Id of the query that produced the frame
    pub ref_id: Option<String>,

    /// Fields in column order
    pub fields: Vec<FrameField>,
}

impl DataFrame {
    /// Create a frame from fields
    pub fn new(fields: Vec<FrameField>) -> Self {
        Self {
            name: None,
            ref_id: None,
            fields,
        }
    }

    /// Set the producing query id
    pub fn with_ref_id(mut self, ref_id: impl Into<String>) -> Self {
        self.ref_id = Some(ref_id.into());
        self
    }

    /// Set the frame name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Build a frame from an arrow record batch.
    ///
    /// Field config set by the data source is read from the
    /// [`FIELD_CONFIG_METADATA_KEY`] metadata entry of each arrow field.
    pub fn from_record_batch(batch: &RecordBatch) -> Result<Self, DataError> {
        let schema = batch.schema();
        let mut fields = Vec::with_capacity(schema.fields().len());

        for (idx, field) in schema.fields().iter().enumerate() {
            let mut frame_field = FrameField::new(field.name().clone(), FieldType::from(field.data_type()));
            frame_field.config = field_config_from_metadata(field)?;
            frame_field.values = Some(batch.column(idx).clone());
            fields.push(frame_field);
        }

        tracing::debug!("Built frame with {} fields and {} rows", fields.len(), batch.num_rows());

        Ok(Self::new(fields))
    }

    /// Number of rows, the longest field's length
    pub fn len(&self) -> usize {
        self.fields.iter().map(|f| f.len()).max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn field_config_from_metadata(field: &Field) -> Result<ConfigValue, DataError> {
    match field.metadata().get(FIELD_CONFIG_METADATA_KEY) {
        None => Ok(ConfigValue::object()),
        Some(raw) => serde_json::from_str::<ConfigValue>(raw).map_err(|source| {
            DataError::InvalidFieldConfig {
                field: field.name().clone(),
                source,
            }
        }),
    }
}

/// Loading state of the latest query result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadingState {
    #[default]
    NotStarted,
    Loading,
    Done,
    Error,
}

/// The latest result delivered for a panel
#[derive(Debug, Clone, Default)]
pub struct PanelData {
    pub state: LoadingState,
    pub series: Vec<DataFrame>,
}

impl PanelData {
    /// A finished result
    pub fn done(series: Vec<DataFrame>) -> Self {
        Self {
            state: LoadingState::Done,
            series,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Float64Array, StringArray};
    use arrow::datatypes::Schema;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Arc;

    #[test]
    fn test_field_type_from_arrow() {
        assert_eq!(FieldType::from(&DataType::Float64), FieldType::Number);
        assert_eq!(FieldType::from(&DataType::Utf8), FieldType::String);
        assert_eq!(FieldType::from(&DataType::Date64), FieldType::Time);
        assert_eq!(FieldType::from(&DataType::Boolean), FieldType::Boolean);
        assert_eq!(FieldType::from(&DataType::Binary), FieldType::Other);
        assert_eq!(FieldType::from_name("time"), Some(FieldType::Time));
        assert_eq!(FieldType::from_name("bogus"), None);
    }

    #[test]
    fn test_from_record_batch_reads_config_metadata() {
        let mut metadata = HashMap::new();
        metadata.insert(FIELD_CONFIG_METADATA_KEY.to_string(), r#"{"unit":"ms"}"#.to_string());
        let schema = Schema::new(vec![
            Field::new("host", DataType::Utf8, false),
            Field::new("latency", DataType::Float64, true).with_metadata(metadata),
        ]);
        let batch = RecordBatch::try_new(
            Arc::new(schema),
            vec![
                Arc::new(StringArray::from(vec!["a", "b"])) as ArrayRef,
                Arc::new(Float64Array::from(vec![1.5, 2.5])) as ArrayRef,
            ],
        )
        .unwrap();

        let frame = DataFrame::from_record_batch(&batch).unwrap();
        assert_eq!(frame.fields.len(), 2);
        assert_eq!(frame.len(), 2);
        assert_eq!(frame.fields[0].field_type, FieldType::String);
        assert_eq!(frame.fields[0].config.to_json(), json!({}));
        assert_eq!(frame.fields[1].config.to_json(), json!({"unit": "ms"}));
    }

    #[test]
    fn test_invalid_metadata_config() {
        let mut metadata = HashMap::new();
        metadata.insert(FIELD_CONFIG_METADATA_KEY.to_string(), "{broken".to_string());
        let schema = Schema::new(vec![Field::new("v", DataType::Float64, true).with_metadata(metadata)]);
        let batch = RecordBatch::try_new(
            Arc::new(schema),
            vec![Arc::new(Float64Array::from(vec![1.0]))],
        )
        .unwrap();

        assert!(matches!(
            DataFrame::from_record_batch(&batch),
            Err(DataError::InvalidFieldConfig { .. })
        ));
    }

    #[test]
    fn test_display_name() {
        let field = FrameField::new("cpu", FieldType::Number);
        assert_eq!(field.display_name(), "cpu");

        let named = field.with_config(ConfigValue::from(json!({"displayName": "CPU %"})));
        assert_eq!(named.display_name(), "CPU %");
    }
}
