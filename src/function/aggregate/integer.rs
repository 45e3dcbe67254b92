use std::collections::HashMap;
use std::sync::Arc;

use crate::catalog::{Column, DataType, Schema, SchemaRef};
use crate::error::{MiniDBError, MiniDBResult};
use crate::function::aggregate::{ungrouped_key, AggregateOp, AggregateResults, Aggregator};
use crate::storage::tuple::Tuple;
use crate::utils::scalar::ScalarValue;

/// Aggregates an Int32 field, optionally grouped by another field.
/// AVG keeps a running sum and count and finalizes with integer
/// division when the results are read out.
pub struct IntegerAggregator {
    group_by: Option<(usize, DataType)>,
    agg_field: usize,
    op: AggregateOp,
    values: HashMap<ScalarValue, i32>,
    counts: HashMap<ScalarValue, i32>,
}

impl IntegerAggregator {
    pub fn new(group_by: Option<(usize, DataType)>, agg_field: usize, op: AggregateOp) -> Self {
        Self {
            group_by,
            agg_field,
            op,
            values: HashMap::new(),
            counts: HashMap::new(),
        }
    }

    fn group_key(&self, tuple: &Tuple) -> MiniDBResult<ScalarValue> {
        match self.group_by {
            Some((field, _)) => Ok(tuple.value(field)?.clone()),
            None => Ok(ungrouped_key()),
        }
    }
}

impl Aggregator for IntegerAggregator {
    fn merge(&mut self, tuple: &Tuple) -> MiniDBResult<()> {
        let key = self.group_key(tuple)?;
        let value = match tuple.value(self.agg_field)? {
            ScalarValue::Int32(Some(v)) => *v,
            other => {
                return Err(MiniDBError::DB(format!(
                    "integer aggregator fed non-integer value {other}"
                )))
            }
        };
        match self.op {
            AggregateOp::Min => {
                let entry = self.values.entry(key).or_insert(i32::MAX);
                *entry = (*entry).min(value);
            }
            AggregateOp::Max => {
                let entry = self.values.entry(key).or_insert(i32::MIN);
                *entry = (*entry).max(value);
            }
            AggregateOp::Sum => {
                *self.values.entry(key).or_insert(0) += value;
            }
            AggregateOp::Avg => {
                *self.values.entry(key.clone()).or_insert(0) += value;
                *self.counts.entry(key).or_insert(0) += 1;
            }
            AggregateOp::Count => {
                *self.values.entry(key).or_insert(0) += 1;
            }
        }
        Ok(())
    }

    fn iterator(&self) -> MiniDBResult<AggregateResults> {
        let schema = self.output_schema();
        let mut rows = Vec::with_capacity(self.values.len());
        for (key, value) in self.values.iter() {
            let result = match self.op {
                AggregateOp::Avg => value / self.counts[key],
                _ => *value,
            };
            let data = match self.group_by {
                Some(_) => vec![key.clone(), result.into()],
                None => vec![result.into()],
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

#[cfg(test)]
mod tests {
    use super::IntegerAggregator;
    use crate::catalog::{Column, DataType, Schema};
    use crate::execution::TupleStream;
    use crate::function::aggregate::{AggregateOp, Aggregator};
    use crate::storage::tuple::Tuple;
    use crate::utils::scalar::ScalarValue;
    use std::sync::Arc;

    fn grp_val_schema() -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Column::new("grp", DataType::Int32),
            Column::new("val", DataType::Int32),
        ]))
    }

    fn merge_all(aggregator: &mut IntegerAggregator, rows: &[(i32, i32)]) {
        let schema = grp_val_schema();
        for (grp, val) in rows {
            let tuple = Tuple::new(schema.clone(), vec![(*grp).into(), (*val).into()]);
            aggregator.merge(&tuple).unwrap();
        }
    }

    fn drain_pairs(aggregator: &IntegerAggregator) -> Vec<(i32, i32)> {
        let mut results = aggregator.iterator().unwrap();
        results.open().unwrap();
        let mut pairs = vec![];
        while results.has_next().unwrap() {
            let row = results.next().unwrap();
            let grp = match row.value(0).unwrap() {
                ScalarValue::Int32(Some(v)) => *v,
                other => panic!("unexpected group {other}"),
            };
            let val = match row.value(1).unwrap() {
                ScalarValue::Int32(Some(v)) => *v,
                other => panic!("unexpected value {other}"),
            };
            pairs.push((grp, val));
        }
        pairs.sort_unstable();
        pairs
    }

    #[test]
    fn grouped_avg_uses_integer_division() {
        let mut aggregator =
            IntegerAggregator::new(Some((0, DataType::Int32)), 1, AggregateOp::Avg);
        merge_all(&mut aggregator, &[(1, 2), (1, 4), (2, 10), (1, 6), (2, 20)]);
        assert_eq!(drain_pairs(&aggregator), vec![(1, 4), (2, 15)]);
    }

    #[test]
    fn grouped_min_max_count() {
        let rows = [(1, 5), (1, -3), (2, 9)];

        let mut aggregator =
            IntegerAggregator::new(Some((0, DataType::Int32)), 1, AggregateOp::Min);
        merge_all(&mut aggregator, &rows);
        assert_eq!(drain_pairs(&aggregator), vec![(1, -3), (2, 9)]);

        let mut aggregator =
            IntegerAggregator::new(Some((0, DataType::Int32)), 1, AggregateOp::Max);
        merge_all(&mut aggregator, &rows);
        assert_eq!(drain_pairs(&aggregator), vec![(1, 5), (2, 9)]);

        let mut aggregator =
            IntegerAggregator::new(Some((0, DataType::Int32)), 1, AggregateOp::Count);
        merge_all(&mut aggregator, &rows);
        assert_eq!(drain_pairs(&aggregator), vec![(1, 2), (2, 1)]);
    }

    #[test]
    fn sum_is_merge_order_independent() {
        let rows = [(1, 2), (2, 7), (1, 4), (2, -1), (1, 6)];
        let mut forward =
            IntegerAggregator::new(Some((0, DataType::Int32)), 1, AggregateOp::Sum);
        merge_all(&mut forward, &rows);

        let mut reversed: Vec<_> = rows.to_vec();
        reversed.reverse();
        let mut backward =
            IntegerAggregator::new(Some((0, DataType::Int32)), 1, AggregateOp::Sum);
        merge_all(&mut backward, &reversed);

        assert_eq!(drain_pairs(&forward), drain_pairs(&backward));
        assert_eq!(drain_pairs(&forward), vec![(1, 12), (2, 6)]);
    }

    #[test]
    fn ungrouped_sum_yields_single_row() {
        let mut aggregator = IntegerAggregator::new(None, 1, AggregateOp::Sum);
        merge_all(&mut aggregator, &[(1, 2), (2, 3), (3, 4)]);

        let mut results = aggregator.iterator().unwrap();
        assert_eq!(results.schema().column_count(), 1);
        results.open().unwrap();
        let row = results.next().unwrap();
        assert_eq!(*row.value(0).unwrap(), 9.into());
        assert!(!results.has_next().unwrap());
    }

    #[test]
    fn non_integer_field_is_rejected() {
        let schema = Arc::new(Schema::new(vec![
            Column::new("grp", DataType::Int32),
            Column::new("name", DataType::Varchar(8)),
        ]));
        let tuple = Tuple::new(schema, vec![1.into(), "x".into()]);
        let mut aggregator = IntegerAggregator::new(None, 1, AggregateOp::Sum);
        assert!(aggregator.merge(&tuple).is_err());
    }
}
