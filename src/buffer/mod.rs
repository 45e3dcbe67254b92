use log::debug;
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use crate::catalog::Catalog;
use crate::error::{MiniDBError, MiniDBResult};
use crate::storage::page::{HeapPage, PageId, TableId};
use crate::storage::tuple::Tuple;
use crate::transaction::{LockManager, LockMode, TransactionId};

/// Size in bytes of every page, fixed for the life of the process.
pub const PAGE_SIZE: usize = 4096;

/// Default number of pages the pool caches.
pub const BUFFER_POOL_SIZE: usize = 50;

/// Access mode requested for a page. Upgrades happen inside the lock
/// manager when a transaction escalates ReadOnly to ReadWrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    ReadOnly,
    ReadWrite,
}

pub type PageRef = Arc<RwLock<HeapPage>>;

#[derive(Debug, Default)]
struct PoolState {
    pages: HashMap<PageId, PageRef>,
    /// Insertion order, the eviction scan order.
    order: VecDeque<PageId>,
}

/// Bounded page cache that mediates all page access. Every `get_page`
/// first acquires the page lock through the lock manager, so a returned
/// `PageRef` is already protected by two-phase locking. Dirty pages are
/// never evicted (NO-STEAL) and a committer's dirty pages reach disk
/// before the commit returns (FORCE).
#[derive(Debug)]
pub struct BufferPool {
    capacity: usize,
    catalog: Arc<Catalog>,
    lock_manager: Arc<LockManager>,
    state: Mutex<PoolState>,
}

impl BufferPool {
    pub fn new(
        config: crate::config::BufferPoolConfig,
        catalog: Arc<Catalog>,
        lock_manager: Arc<LockManager>,
    ) -> Self {
        Self {
            capacity: config.pool_size,
            catalog,
            lock_manager,
            state: Mutex::new(PoolState::default()),
        }
    }

    /// Fetch a page under the requested permission, faulting it in from
    /// the owning heap file on a miss. Blocks (up to the lock manager's
    /// randomized deadline) while another transaction holds the page in
    /// a conflicting mode.
    pub fn get_page(
        &self,
        txn_id: TransactionId,
        pid: PageId,
        perm: Permission,
    ) -> MiniDBResult<PageRef> {
        let mode = match perm {
            Permission::ReadOnly => LockMode::Shared,
            Permission::ReadWrite => LockMode::Exclusive,
        };
        self.lock_manager.acquire(txn_id, pid, mode)?;

        let mut state = self.state.lock();
        if let Some(page) = state.pages.get(&pid) {
            return Ok(page.clone());
        }
        if state.pages.len() >= self.capacity {
            Self::evict_clean_page(&mut state)?;
        }
        let file = self.catalog.table_file(pid.table_id)?;
        let page = file.read_page(pid)?.ok_or_else(|| {
            MiniDBError::Storage(format!("page {pid} is beyond the end of its file"))
        })?;
        debug!("buffer pool fault: page={pid}");
        let page = Arc::new(RwLock::new(page));
        state.pages.insert(pid, page.clone());
        state.order.push_back(pid);
        Ok(page)
    }

    /// Insert a tuple into `table_id`, leaving the touched page dirty in
    /// the pool.
    pub fn insert_tuple(
        &self,
        txn_id: TransactionId,
        table_id: TableId,
        tuple: &mut Tuple,
    ) -> MiniDBResult<()> {
        let file = self.catalog.table_file(table_id)?;
        let pid = file.insert_tuple(txn_id, tuple, self)?;
        self.mark_dirty(txn_id, pid)
    }

    /// Delete the tuple its record id names, leaving the page dirty in
    /// the pool.
    pub fn delete_tuple(&self, txn_id: TransactionId, tuple: &mut Tuple) -> MiniDBResult<()> {
        let rid = tuple
            .rid
            .ok_or_else(|| MiniDBError::DB("tuple has no record id".to_string()))?;
        let file = self.catalog.table_file(rid.page_id.table_id)?;
        let pid = file.delete_tuple(txn_id, tuple, self)?;
        self.mark_dirty(txn_id, pid)
    }

    /// Finish a transaction. On commit, force every page it dirtied to
    /// disk and clear the marks; on abort, throw the cached copies away
    /// and reread disk (sound because dirty pages of uncommitted
    /// transactions never reach disk). Either way all its locks drop.
    pub fn transaction_complete(&self, txn_id: TransactionId, commit: bool) -> MiniDBResult<()> {
        {
            let mut state = self.state.lock();
            let dirtied: Vec<PageId> = state
                .pages
                .iter()
                .filter(|(_, page)| page.read().is_dirty() == Some(txn_id))
                .map(|(pid, _)| *pid)
                .collect();
            for pid in dirtied {
                if commit {
                    self.flush_page_locked(&state, pid)?;
                } else {
                    self.reload_page_locked(&mut state, pid)?;
                }
            }
        }
        self.lock_manager.end_transaction(txn_id);
        Ok(())
    }

    /// Unconditionally write a cached page back if it is dirty.
    pub fn flush_page(&self, pid: PageId) -> MiniDBResult<()> {
        let state = self.state.lock();
        self.flush_page_locked(&state, pid)
    }

    /// Write every dirty cached page back to its file.
    pub fn flush_all_pages(&self) -> MiniDBResult<()> {
        let state = self.state.lock();
        let pids: Vec<PageId> = state.pages.keys().copied().collect();
        for pid in pids {
            self.flush_page_locked(&state, pid)?;
        }
        Ok(())
    }

    /// Give a page lock back before end of transaction. Breaks strict
    /// 2PL; only the full-page scan in `HeapFile::insert_tuple` should
    /// want this.
    pub fn release_page(&self, txn_id: TransactionId, pid: PageId) {
        self.lock_manager.release(txn_id, pid);
    }

    pub fn lock_manager(&self) -> &Arc<LockManager> {
        &self.lock_manager
    }

    fn mark_dirty(&self, txn_id: TransactionId, pid: PageId) -> MiniDBResult<()> {
        let state = self.state.lock();
        let page = state
            .pages
            .get(&pid)
            .ok_or_else(|| MiniDBError::DB(format!("page {pid} vanished from the pool")))?;
        page.write().mark_dirty(true, txn_id);
        Ok(())
    }

    fn flush_page_locked(&self, state: &PoolState, pid: PageId) -> MiniDBResult<()> {
        let Some(page) = state.pages.get(&pid) else {
            return Ok(());
        };
        let mut guard = page.write();
        let Some(dirtier) = guard.is_dirty() else {
            return Ok(());
        };
        let file = self.catalog.table_file(pid.table_id)?;
        file.write_page(&guard)?;
        guard.mark_dirty(false, dirtier);
        guard.set_before_image()?;
        debug!("buffer pool flush: page={pid}");
        Ok(())
    }

    fn reload_page_locked(&self, state: &mut PoolState, pid: PageId) -> MiniDBResult<()> {
        let file = self.catalog.table_file(pid.table_id)?;
        match file.read_page(pid)? {
            Some(fresh) => {
                if let Some(page) = state.pages.get(&pid) {
                    *page.write() = fresh;
                }
                debug!("buffer pool reload after abort: page={pid}");
            }
            None => {
                state.pages.remove(&pid);
                state.order.retain(|cached| cached != &pid);
            }
        }
        Ok(())
    }

    /// Evict the first clean page in insertion order. Clean pages need
    /// no flush; with every page dirty, NO-STEAL forbids eviction.
    fn evict_clean_page(state: &mut PoolState) -> MiniDBResult<()> {
        let victim = state.order.iter().position(|pid| {
            state
                .pages
                .get(pid)
                .is_some_and(|page| page.read().is_dirty().is_none())
        });
        match victim {
            Some(index) => {
                if let Some(pid) = state.order.remove(index) {
                    state.pages.remove(&pid);
                    debug!("buffer pool evict: page={pid}");
                }
                Ok(())
            }
            None => Err(MiniDBError::DB(
                "buffer pool exhausted: every cached page is dirty".to_string(),
            )),
        }
    }
}
