use crate::catalog::DataType;
use std::sync::Arc;

pub type ColumnRef = Arc<Column>;

/// One field of a schema. Names are optional and need not be unique;
/// lookups by name return the first match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: Option<String>,
    pub data_type: DataType,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: Some(name.into()),
            data_type,
        }
    }

    pub fn anonymous(data_type: DataType) -> Self {
        Self {
            name: None,
            data_type,
        }
    }
}
