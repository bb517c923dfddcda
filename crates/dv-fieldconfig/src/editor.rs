//! Editor kinds shared by panel options and field config properties

use std::fmt;

/// Which editor the options pane shows for a value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EditorKind {
    Text,
    TextArea,
    Number,
    Slider,
    Boolean,
    Select,
    Radio,
    Color,
    Unit,
    Thresholds,
    ValueMappings,
    DataLinks,
    /// Field name picker used by matchers
    FieldName,
    /// Multi field name picker used by matchers
    FieldNames,
    /// Field type picker used by matchers
    FieldType,
    /// Query id picker used by matchers
    RefId,
    /// Picker listing choices such as matcher kinds or override properties
    ValuePicker,
    /// Plugin-provided editor identified by id
    Custom(String),
}

impl fmt::Display for EditorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditorKind::Custom(id) => write!(f, "custom:{}", id),
            other => write!(f, "{:?}", other),
        }
    }
}

/// A labelled choice offered by a picker
#[derive(Debug, Clone, PartialEq)]
pub struct SelectableValue {
    pub label: String,
    pub value: String,
    pub description: Option<String>,
}

impl SelectableValue {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }
}
