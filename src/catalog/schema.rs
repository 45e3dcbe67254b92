use super::column::{Column, ColumnRef};
use crate::catalog::DataType;
use crate::error::MiniDBError;
use crate::error::MiniDBResult;
use std::sync::{Arc, LazyLock};

pub type SchemaRef = Arc<Schema>;

pub static EMPTY_SCHEMA_REF: LazyLock<SchemaRef> = LazyLock::new(|| Arc::new(Schema::empty()));

/// Row schema: an ordered sequence of typed, optionally named columns.
/// Two schemas are equal iff their type sequences are pointwise equal;
/// names are not compared.
#[derive(Debug, Clone)]
pub struct Schema {
    pub columns: Vec<ColumnRef>,
}

impl Schema {
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns: columns.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn from_types(types: Vec<DataType>) -> Self {
        Self::new(types.into_iter().map(Column::anonymous).collect())
    }

    pub fn empty() -> Self {
        Self { columns: vec![] }
    }

    /// Concatenate schemas into a new one of their combined columns.
    pub fn merge(schemas: impl IntoIterator<Item = Self>) -> Self {
        let mut columns = Vec::new();
        for schema in schemas {
            columns.extend(schema.columns);
        }
        Self { columns }
    }

    pub fn column_with_index(&self, index: usize) -> MiniDBResult<ColumnRef> {
        self.columns
            .get(index)
            .cloned()
            .ok_or_else(|| MiniDBError::NoSuchElement(format!("no such field at index {index}")))
    }

    pub fn data_type(&self, index: usize) -> MiniDBResult<DataType> {
        Ok(self.column_with_index(index)?.data_type)
    }

    pub fn field_name(&self, index: usize) -> MiniDBResult<Option<String>> {
        Ok(self.column_with_index(index)?.name.clone())
    }

    /// Find the index of the first column with exactly the given name.
    pub fn index_of(&self, name: &str) -> MiniDBResult<usize> {
        self.columns
            .iter()
            .position(|col| col.name.as_deref() == Some(name))
            .ok_or_else(|| MiniDBError::NoSuchElement(format!("no such field named \"{name}\"")))
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Total on-disk byte size of a tuple with this schema.
    pub fn tuple_len(&self) -> usize {
        self.columns.iter().map(|col| col.data_type.byte_len()).sum()
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.columns.len() == other.columns.len()
            && self
                .columns
                .iter()
                .zip(other.columns.iter())
                .all(|(l, r)| l.data_type == r.data_type)
    }
}

impl Eq for Schema {}

#[cfg(test)]
mod tests {
    use super::Schema;
    use crate::catalog::{Column, DataType};

    #[test]
    fn two_field_schema() {
        let schema = Schema::new(vec![
            Column::new("id", DataType::Int32),
            Column::new("name", DataType::Varchar(10)),
        ]);
        assert_eq!(schema.column_count(), 2);
        assert_eq!(schema.tuple_len(), 18);
        assert_eq!(schema.index_of("name").unwrap(), 1);
        assert!(schema.index_of("missing").is_err());
        assert_eq!(schema.data_type(0).unwrap(), DataType::Int32);
        assert!(schema.data_type(2).is_err());

        let merged = Schema::merge([schema.clone(), schema]);
        assert_eq!(merged.column_count(), 4);
        assert_eq!(merged.tuple_len(), 36);
    }

    #[test]
    fn equality_ignores_names() {
        let a = Schema::new(vec![
            Column::new("x", DataType::Int32),
            Column::anonymous(DataType::Varchar(8)),
        ]);
        let b = Schema::new(vec![
            Column::new("y", DataType::Int32),
            Column::new("z", DataType::Varchar(8)),
        ]);
        let c = Schema::new(vec![
            Column::new("x", DataType::Int32),
            Column::new("y", DataType::Varchar(9)),
        ]);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a, Schema::from_types(vec![DataType::Int32, DataType::Varchar(8)]));
    }

    #[test]
    fn duplicate_names_are_allowed() {
        let schema = Schema::new(vec![
            Column::new("v", DataType::Int32),
            Column::new("v", DataType::Int32),
        ]);
        assert_eq!(schema.index_of("v").unwrap(), 0);
    }
}
