pub mod codec;
pub mod heap_file;
pub mod page;
pub mod tuple;

pub use heap_file::HeapFile;
pub use page::{PageId, RecordId, TableId};
pub use tuple::Tuple;
