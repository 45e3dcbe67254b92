pub mod aggregate;
pub mod seq_scan;

pub use aggregate::Aggregate;
pub use seq_scan::TableScan;

use crate::catalog::SchemaRef;
use crate::error::MiniDBResult;
use crate::storage::tuple::Tuple;

/// The contract every tuple producer honors:
/// - `open` readies the stream and may be called again after `close`;
/// - `next` past the last tuple (or on a closed stream) is an error, so
///   callers gate it with `has_next`;
/// - `rewind` restarts an open stream;
/// - `close` is idempotent.
///
/// No tuple is emitted before `open` or after `close`.
pub trait TupleStream {
    fn open(&mut self) -> MiniDBResult<()>;

    fn has_next(&mut self) -> MiniDBResult<bool>;

    fn next(&mut self) -> MiniDBResult<Tuple>;

    fn rewind(&mut self) -> MiniDBResult<()>;

    fn close(&mut self);

    fn schema(&self) -> SchemaRef;
}
