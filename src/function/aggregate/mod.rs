mod integer;
mod string;

pub use integer::IntegerAggregator;
pub use string::StringAggregator;

use crate::catalog::SchemaRef;
use crate::error::{MiniDBError, MiniDBResult};
use crate::execution::TupleStream;
use crate::storage::tuple::Tuple;
use crate::utils::scalar::ScalarValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateOp {
    Min,
    Max,
    Sum,
    Avg,
    Count,
}

impl std::fmt::Display for AggregateOp {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let name = match self {
            AggregateOp::Min => "min",
            AggregateOp::Max => "max",
            AggregateOp::Sum => "sum",
            AggregateOp::Avg => "avg",
            AggregateOp::Count => "count",
        };
        write!(f, "{name}")
    }
}

/// Sentinel key under which both aggregators accumulate ungrouped state.
pub(crate) fn ungrouped_key() -> ScalarValue {
    ScalarValue::Int32(None)
}

/// Online grouped aggregation: fold tuples in one at a time, then read
/// the per-group summaries back out as a tuple stream.
pub trait Aggregator {
    /// Fold one tuple into the running state of its group.
    fn merge(&mut self, tuple: &Tuple) -> MiniDBResult<()>;

    /// Materialize the current group summaries as a result stream.
    fn iterator(&self) -> MiniDBResult<AggregateResults>;

    /// One Int32 field when ungrouped; (group type, Int32) when grouped.
    fn output_schema(&self) -> SchemaRef;
}

/// Materialized aggregation output. Rewind replays the same rows; the
/// source state is not consulted again.
pub struct AggregateResults {
    schema: SchemaRef,
    rows: Vec<Tuple>,
    cursor: usize,
    opened: bool,
}

impl AggregateResults {
    pub(crate) fn new(schema: SchemaRef, rows: Vec<Tuple>) -> Self {
        Self {
            schema,
            rows,
            cursor: 0,
            opened: false,
        }
    }
}

impl TupleStream for AggregateResults {
    fn open(&mut self) -> MiniDBResult<()> {
        self.opened = true;
        self.cursor = 0;
        Ok(())
    }

    fn has_next(&mut self) -> MiniDBResult<bool> {
        Ok(self.opened && self.cursor < self.rows.len())
    }

    fn next(&mut self) -> MiniDBResult<Tuple> {
        if !self.opened {
            return Err(MiniDBError::DB("aggregate results are not open".to_string()));
        }
        let row = self
            .rows
            .get(self.cursor)
            .cloned()
            .ok_or_else(|| MiniDBError::NoSuchElement("aggregate results exhausted".to_string()))?;
        self.cursor += 1;
        Ok(row)
    }

    fn rewind(&mut self) -> MiniDBResult<()> {
        if !self.opened {
            return Err(MiniDBError::DB("aggregate results are not open".to_string()));
        }
        self.cursor = 0;
        Ok(())
    }

    fn close(&mut self) {
        self.opened = false;
        self.cursor = 0;
    }

    fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }
}
