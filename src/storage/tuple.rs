use crate::catalog::{Schema, SchemaRef};
use crate::error::{MiniDBError, MiniDBResult};
use crate::storage::page::RecordId;
use crate::utils::scalar::ScalarValue;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// A row: a schema, one value per column, and the record id assigned by
/// the page that stores it (cleared again on deletion).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tuple {
    pub schema: SchemaRef,
    pub data: Vec<ScalarValue>,
    pub rid: Option<RecordId>,
}

impl Tuple {
    pub fn new(schema: SchemaRef, data: Vec<ScalarValue>) -> Self {
        debug_assert_eq!(schema.column_count(), data.len());
        debug_assert!(schema
            .columns
            .iter()
            .zip(data.iter())
            .all(|(col, val)| val.is_null() || val.matches_type(&col.data_type)));
        Self {
            schema,
            data,
            rid: None,
        }
    }

    /// A tuple of unset placeholders for every column.
    pub fn empty(schema: SchemaRef) -> Self {
        let data = schema
            .columns
            .iter()
            .map(|col| ScalarValue::new_empty(col.data_type))
            .collect();
        Self::new(schema, data)
    }

    pub fn value(&self, index: usize) -> MiniDBResult<&ScalarValue> {
        self.data
            .get(index)
            .ok_or_else(|| MiniDBError::NoSuchElement(format!("no such field at index {index}")))
    }

    pub fn set_value(&mut self, index: usize, value: ScalarValue) -> MiniDBResult<()> {
        if index >= self.data.len() {
            return Err(MiniDBError::NoSuchElement(format!(
                "no such field at index {index}"
            )));
        }
        self.data[index] = value;
        Ok(())
    }

    /// The field values in declared order.
    pub fn values(&self) -> impl Iterator<Item = &ScalarValue> {
        self.data.iter()
    }

    /// Concatenate tuples into one over the merged schema. The result
    /// carries no record id.
    pub fn try_merge(tuples: impl IntoIterator<Item = Self>) -> MiniDBResult<Self> {
        let mut data = vec![];
        let mut merged_schema = Schema::empty();
        for tuple in tuples {
            data.extend(tuple.data);
            merged_schema = Schema::merge(vec![merged_schema, tuple.schema.as_ref().clone()]);
        }
        Ok(Self::new(Arc::new(merged_schema), data))
    }
}

impl Display for Tuple {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let values = self
            .data
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<String>>()
            .join(", ");
        write!(f, "({values})")
    }
}

#[cfg(test)]
mod tests {
    use super::Tuple;
    use crate::catalog::{Column, DataType, Schema, EMPTY_SCHEMA_REF};
    use std::sync::Arc;

    fn id_name_schema() -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Column::new("id", DataType::Int32),
            Column::new("name", DataType::Varchar(10)),
        ]))
    }

    #[test]
    fn get_and_set() {
        let schema = id_name_schema();
        let mut tuple = Tuple::new(schema.clone(), vec![1.into(), "alice".into()]);
        assert_eq!(*tuple.value(0).unwrap(), 1.into());
        tuple.set_value(0, 2.into()).unwrap();
        assert_eq!(*tuple.value(0).unwrap(), 2.into());
        assert!(tuple.value(2).is_err());
        assert!(tuple.set_value(2, 3.into()).is_err());
        assert_eq!(tuple.to_string(), "(2, alice)");
    }

    #[test]
    fn empty_tuple_is_all_null() {
        let tuple = Tuple::empty(id_name_schema());
        assert!(tuple.values().all(|v| v.is_null()));
    }

    #[test]
    fn merge_with_empty_clones() {
        let schema = id_name_schema();
        let tuple = Tuple::new(schema, vec![7.into(), "bob".into()]);
        let merged =
            Tuple::try_merge(vec![tuple.clone(), Tuple::empty(EMPTY_SCHEMA_REF.clone())]).unwrap();
        assert_eq!(merged.data, tuple.data);
        assert_eq!(merged.schema.column_count(), 2);
        assert!(merged.rid.is_none());
    }
}
