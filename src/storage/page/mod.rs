mod heap_page;

pub use heap_page::HeapPage;

use std::fmt::{Display, Formatter};

pub type TableId = u32;

/// Stable identity of a page: the owning table plus its position in the
/// backing file. Doubles as the lock manager key.
#[derive(derive_new::new, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageId {
    pub table_id: TableId,
    pub page_no: u32,
}

impl Display for PageId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.table_id, self.page_no)
    }
}

/// Stable identity of a tuple: its page plus the slot it occupies.
#[derive(derive_new::new, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordId {
    pub page_id: PageId,
    pub slot_num: u32,
}

impl Display for RecordId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.page_id, self.slot_num)
    }
}
