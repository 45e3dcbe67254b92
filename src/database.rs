use log::debug;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::buffer::BufferPool;
use crate::catalog::{Catalog, SchemaRef};
use crate::config::{BufferPoolConfig, LockManagerConfig};
use crate::error::MiniDBResult;
use crate::storage::heap_file::HeapFile;
use crate::storage::page::TableId;
use crate::transaction::{LockManager, Transaction};

/// Top-level context object owning the catalog, the buffer pool and the
/// lock manager. There is nothing global: every collaborator reaches
/// the others through this value.
#[derive(Debug)]
pub struct Database {
    catalog: Arc<Catalog>,
    buffer_pool: Arc<BufferPool>,
    lock_manager: Arc<LockManager>,
    next_txn_id: AtomicU64,
}

impl Database {
    pub fn new() -> Self {
        Self::with_config(BufferPoolConfig::default(), LockManagerConfig::default())
    }

    pub fn with_config(pool_config: BufferPoolConfig, lock_config: LockManagerConfig) -> Self {
        let catalog = Arc::new(Catalog::new());
        let lock_manager = Arc::new(LockManager::new(lock_config));
        let buffer_pool = Arc::new(BufferPool::new(
            pool_config,
            catalog.clone(),
            lock_manager.clone(),
        ));
        Self {
            catalog,
            buffer_pool,
            lock_manager,
            next_txn_id: AtomicU64::new(1),
        }
    }

    /// Create (or reopen) a heap file at `path` and register it in the
    /// catalog under `name`.
    pub fn create_table(
        &self,
        name: impl Into<String>,
        path: impl AsRef<Path>,
        schema: SchemaRef,
    ) -> MiniDBResult<TableId> {
        let file = Arc::new(HeapFile::try_new(path, schema)?);
        let table_id = self.catalog.add_table(name, file);
        debug!("registered table {table_id}");
        Ok(table_id)
    }

    /// Hand out the next transaction id. Ids are monotonic and never
    /// reused within a database's lifetime.
    pub fn begin_transaction(&self) -> Transaction {
        Transaction::new(self.next_txn_id.fetch_add(1, Ordering::SeqCst))
    }

    /// Force the transaction's dirty pages to disk and release its locks.
    pub fn commit(&self, txn: Transaction) -> MiniDBResult<()> {
        self.buffer_pool.transaction_complete(txn.id(), true)
    }

    /// Discard the transaction's writes and release its locks.
    pub fn abort(&self, txn: Transaction) -> MiniDBResult<()> {
        self.buffer_pool.transaction_complete(txn.id(), false)
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn buffer_pool(&self) -> &Arc<BufferPool> {
        &self.buffer_pool
    }

    pub fn lock_manager(&self) -> &Arc<LockManager> {
        &self.lock_manager
    }
}

impl Default for Database {
    fn default() -> Self {
        Self::new()
    }
}
