use crate::catalog::{DataType, SchemaRef};
use crate::error::{MiniDBError, MiniDBResult};
use crate::execution::TupleStream;
use crate::function::aggregate::{
    AggregateOp, AggregateResults, Aggregator, IntegerAggregator, StringAggregator,
};

/// Aggregation operator. The first `open` drains the child exactly once
/// into the aggregator; after that the operator serves the materialized
/// group stream, and `rewind` replays it without re-running the child.
pub struct Aggregate {
    child: Box<dyn TupleStream>,
    aggregator: Box<dyn Aggregator>,
    op: AggregateOp,
    group_by: Option<usize>,
    agg_field: usize,
    results: Option<AggregateResults>,
}

impl Aggregate {
    /// The aggregate field's type picks the aggregator variant: Int32
    /// supports every operator, Varchar only COUNT.
    pub fn try_new(
        child: Box<dyn TupleStream>,
        agg_field: usize,
        group_by: Option<usize>,
        op: AggregateOp,
    ) -> MiniDBResult<Self> {
        let child_schema = child.schema();
        let group = match group_by {
            Some(field) => Some((field, child_schema.data_type(field)?)),
            None => None,
        };
        let aggregator: Box<dyn Aggregator> = match child_schema.data_type(agg_field)? {
            DataType::Int32 => Box::new(IntegerAggregator::new(group, agg_field, op)),
            DataType::Varchar(_) => Box::new(StringAggregator::try_new(group, agg_field, op)?),
        };
        Ok(Self {
            child,
            aggregator,
            op,
            group_by,
            agg_field,
            results: None,
        })
    }

    pub fn aggregate_op(&self) -> AggregateOp {
        self.op
    }

    pub fn group_by(&self) -> Option<usize> {
        self.group_by
    }

    pub fn aggregate_field(&self) -> usize {
        self.agg_field
    }

    /// Name of the aggregate field in the child's schema, if any.
    pub fn aggregate_field_name(&self) -> MiniDBResult<Option<String>> {
        self.child.schema().field_name(self.agg_field)
    }

    fn materialized(&mut self) -> MiniDBResult<&mut AggregateResults> {
        self.results
            .as_mut()
            .ok_or_else(|| MiniDBError::DB("aggregate is not open".to_string()))
    }
}

impl TupleStream for Aggregate {
    fn open(&mut self) -> MiniDBResult<()> {
        if self.results.is_none() {
            self.child.open()?;
            while self.child.has_next()? {
                let tuple = self.child.next()?;
                self.aggregator.merge(&tuple)?;
            }
            self.child.close();
            self.results = Some(self.aggregator.iterator()?);
        }
        self.materialized()?.open()
    }

    fn has_next(&mut self) -> MiniDBResult<bool> {
        match self.results.as_mut() {
            Some(results) => results.has_next(),
            None => Ok(false),
        }
    }

    fn next(&mut self) -> MiniDBResult<crate::storage::tuple::Tuple> {
        self.materialized()?.next()
    }

    fn rewind(&mut self) -> MiniDBResult<()> {
        self.materialized()?.rewind()
    }

    fn close(&mut self) {
        if let Some(results) = self.results.as_mut() {
            results.close();
        }
    }

    fn schema(&self) -> SchemaRef {
        self.aggregator.output_schema()
    }
}
