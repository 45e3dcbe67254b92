use std::collections::HashMap;
use std::sync::Arc;

use crate::catalog::{Column, DataType, Schema, SchemaRef};
use crate::error::{MiniDBError, MiniDBResult};
use crate::function::aggregate::{ungrouped_key, AggregateOp, AggregateResults, Aggregator};
use crate::storage::tuple::Tuple;
use crate::utils::scalar::ScalarValue;

/// Aggregates a Varchar field. Only COUNT is meaningful over strings;
/// any other operator is rejected at construction.
pub struct StringAggregator {
    group_by: Option<(usize, DataType)>,
    agg_field: usize,
    counts: HashMap<ScalarValue, i32>,
}

impl StringAggregator {
    pub fn try_new(
        group_by: Option<(usize, DataType)>,
        agg_field: usize,
        op: AggregateOp,
    ) -> MiniDBResult<Self> {
        if op != AggregateOp::Count {
            return Err(MiniDBError::DB(format!(
                "string aggregator only supports count, got {op}"
            )));
        }
        Ok(Self {
            group_by,
            agg_field,
            counts: HashMap::new(),
        })
    }
}

impl Aggregator for StringAggregator {
    fn merge(&mut self, tuple: &Tuple) -> MiniDBResult<()> {
        if !matches!(tuple.value(self.agg_field)?, ScalarValue::Varchar(_)) {
            return Err(MiniDBError::DB(format!(
                "string aggregator fed non-string value {}",
                tuple.value(self.agg_field)?
            )));
        }
        let key = match self.group_by {
            Some((field, _)) => tuple.value(field)?.clone(),
            None => ungrouped_key(),
        };
        *self.counts.entry(key).or_insert(0) += 1;
        Ok(())
    }

    fn iterator(&self) -> MiniDBResult<AggregateResults> {
        let schema = self.output_schema();
        let mut rows = Vec::with_capacity(self.counts.len());
        for (key, count) in self.counts.iter() {
            let data = match self.group_by {
                Some(_) => vec![key.clone(), (*count).into()],
                None => vec![(*count).into()],
            };
            rows.push(Tuple::new(schema.clone(), data));
        }
        Ok(AggregateResults::new(schema, rows))
    }

    fn output_schema(&self) -> SchemaRef {
        match self.group_by {
            Some((_, group_type)) => Arc::new(Schema::new(vec![
                Column::anonymous(group_type),
                Column::anonymous(DataType::Int32),
            ])),
            None => Arc::new(Schema::new(vec![Column::anonymous(DataType::Int32)])),
        }
    }
}
