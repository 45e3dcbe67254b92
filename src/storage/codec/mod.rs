mod common;
mod heap_page;
mod tuple;

pub use common::CommonCodec;
pub use heap_page::HeapPageCodec;
pub use tuple::TupleCodec;

// data + consumed offset
pub type DecodedData<T> = (T, usize);
