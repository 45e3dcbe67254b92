#[allow(clippy::module_inception)]
mod catalog;
mod column;
mod data_type;
mod schema;
mod stats;

pub use catalog::{Catalog, CatalogTable};
pub use column::{Column, ColumnRef};
pub use data_type::DataType;
pub use schema::{Schema, SchemaRef, EMPTY_SCHEMA_REF};
pub use stats::{IntHistogram, PredicateOp};
