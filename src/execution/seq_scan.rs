use std::collections::VecDeque;
use std::sync::Arc;

use crate::buffer::{BufferPool, Permission};
use crate::catalog::SchemaRef;
use crate::error::{MiniDBError, MiniDBResult};
use crate::execution::TupleStream;
use crate::storage::heap_file::HeapFile;
use crate::storage::page::PageId;
use crate::storage::tuple::Tuple;
use crate::transaction::TransactionId;

/// Sequential scan over one heap file. Pages fault in through the
/// buffer pool under ReadOnly permission, so the transaction keeps its
/// shared locks until it completes; `close` only drops the scan's own
/// buffered tuples.
pub struct TableScan {
    txn_id: TransactionId,
    file: Arc<HeapFile>,
    pool: Arc<BufferPool>,
    opened: bool,
    next_page_no: u32,
    buffered: VecDeque<Tuple>,
}

impl TableScan {
    pub fn new(txn_id: TransactionId, file: Arc<HeapFile>, pool: Arc<BufferPool>) -> Self {
        Self {
            txn_id,
            file,
            pool,
            opened: false,
            next_page_no: 0,
            buffered: VecDeque::new(),
        }
    }

    /// Pull pages until tuples are buffered or the file is exhausted.
    fn fill_buffer(&mut self) -> MiniDBResult<()> {
        while self.buffered.is_empty() && self.next_page_no < self.file.num_pages()? {
            let pid = PageId::new(self.file.table_id(), self.next_page_no);
            self.next_page_no += 1;
            let page = self.pool.get_page(self.txn_id, pid, Permission::ReadOnly)?;
            self.buffered.extend(page.read().iter().cloned());
        }
        Ok(())
    }
}

impl TupleStream for TableScan {
    fn open(&mut self) -> MiniDBResult<()> {
        self.opened = true;
        self.next_page_no = 0;
        self.buffered.clear();
        self.fill_buffer()
    }

    fn has_next(&mut self) -> MiniDBResult<bool> {
        if !self.opened {
            return Ok(false);
        }
        self.fill_buffer()?;
        Ok(!self.buffered.is_empty())
    }

    fn next(&mut self) -> MiniDBResult<Tuple> {
        if !self.opened {
            return Err(MiniDBError::DB("scan is not open".to_string()));
        }
        self.fill_buffer()?;
        self.buffered
            .pop_front()
            .ok_or_else(|| MiniDBError::NoSuchElement("scan is exhausted".to_string()))
    }

    fn rewind(&mut self) -> MiniDBResult<()> {
        if !self.opened {
            return Err(MiniDBError::DB("scan is not open".to_string()));
        }
        self.open()
    }

    fn close(&mut self) {
        self.opened = false;
        self.buffered.clear();
    }

    fn schema(&self) -> SchemaRef {
        self.file.schema()
    }
}
