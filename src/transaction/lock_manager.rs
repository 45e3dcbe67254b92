use log::{trace, warn};
use parking_lot::{Condvar, Mutex, MutexGuard};
use rand::Rng;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::LockManagerConfig;
use crate::error::{MiniDBError, MiniDBResult};
use crate::storage::page::PageId;
use crate::transaction::TransactionId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    Shared,
    Exclusive,
}

/// Per-page lock record: current mode, the holder set, and the wait
/// cell incompatible requesters block on. Invariants: Exclusive implies
/// exactly one holder; an item with no holders leaves the registry.
#[derive(Debug)]
struct LockItem {
    mode: LockMode,
    holders: HashSet<TransactionId>,
    waiters: Arc<Condvar>,
}

impl LockItem {
    fn new(mode: LockMode, txn_id: TransactionId) -> Self {
        Self {
            mode,
            holders: HashSet::from([txn_id]),
            waiters: Arc::new(Condvar::new()),
        }
    }

    fn held_exclusively_by(&self, txn_id: TransactionId) -> bool {
        self.holders.len() == 1 && self.holders.contains(&txn_id)
    }
}

#[derive(Debug, Default)]
struct LockTable {
    locks: HashMap<PageId, LockItem>,
    txn_pages: HashMap<TransactionId, HashSet<PageId>>,
}

/// Page-granularity strict two-phase locking. All operations serialize
/// on one monitor; deadlocks are broken by a randomized acquisition
/// deadline rather than a wait-for graph, which also desynchronizes
/// retry storms among waiters.
#[derive(Debug)]
pub struct LockManager {
    state: Mutex<LockTable>,
    config: LockManagerConfig,
}

impl LockManager {
    pub fn new(config: LockManagerConfig) -> Self {
        Self {
            state: Mutex::new(LockTable::default()),
            config,
        }
    }

    /// Block until `txn_id` holds `pid` in at least `mode`, or fail with
    /// `TransactionAborted` once the randomized deadline elapses. A page
    /// already held at >= `mode` returns immediately.
    pub fn acquire(
        &self,
        txn_id: TransactionId,
        pid: PageId,
        mode: LockMode,
    ) -> MiniDBResult<()> {
        let mut table = self.state.lock();

        if let Some(item) = table.locks.get(&pid) {
            if item.holders.contains(&txn_id)
                && (mode == LockMode::Shared || item.mode == LockMode::Exclusive)
            {
                return Ok(());
            }
        }

        let deadline = Instant::now() + self.random_wait();
        loop {
            let waiters = match table.locks.get_mut(&pid) {
                None => {
                    table.locks.insert(pid, LockItem::new(mode, txn_id));
                    break;
                }
                Some(item) => {
                    let granted = match mode {
                        LockMode::Shared => {
                            if item.mode == LockMode::Shared {
                                item.holders.insert(txn_id);
                                true
                            } else {
                                // An exclusive holder reads its own page freely.
                                item.held_exclusively_by(txn_id)
                            }
                        }
                        LockMode::Exclusive => {
                            if item.holders.is_empty() || item.held_exclusively_by(txn_id) {
                                item.mode = LockMode::Exclusive;
                                item.holders.insert(txn_id);
                                true
                            } else {
                                false
                            }
                        }
                    };
                    if granted {
                        break;
                    }
                    item.waiters.clone()
                }
            };

            trace!("lock wait: txn={txn_id} page={pid} mode={mode:?}");
            if self.wait_timed_out(&waiters, &mut table, deadline) {
                warn!("lock wait timed out: txn={txn_id} page={pid} mode={mode:?}");
                return Err(MiniDBError::TransactionAborted);
            }
        }

        table.txn_pages.entry(txn_id).or_default().insert(pid);
        trace!("lock granted: txn={txn_id} page={pid} mode={mode:?}");
        Ok(())
    }

    /// Drop `txn_id`'s hold on `pid`. Returns whether it was a holder.
    pub fn release(&self, txn_id: TransactionId, pid: PageId) -> bool {
        let mut table = self.state.lock();
        Self::release_internal(&mut table, txn_id, pid)
    }

    /// Release every page `txn_id` still holds.
    pub fn end_transaction(&self, txn_id: TransactionId) {
        let mut table = self.state.lock();
        if let Some(pages) = table.txn_pages.remove(&txn_id) {
            for pid in pages {
                Self::release_internal(&mut table, txn_id, pid);
            }
        }
    }

    pub fn holds_lock(&self, txn_id: TransactionId, pid: PageId) -> bool {
        let table = self.state.lock();
        table
            .locks
            .get(&pid)
            .is_some_and(|item| item.holders.contains(&txn_id))
    }

    /// The pages `txn_id` currently holds a lock on.
    pub fn held_pages(&self, txn_id: TransactionId) -> HashSet<PageId> {
        let table = self.state.lock();
        table.txn_pages.get(&txn_id).cloned().unwrap_or_default()
    }

    fn release_internal(table: &mut LockTable, txn_id: TransactionId, pid: PageId) -> bool {
        let Some(item) = table.locks.get_mut(&pid) else {
            return false;
        };
        if !item.holders.remove(&txn_id) {
            return false;
        }
        item.waiters.notify_all();
        if item.holders.is_empty() {
            table.locks.remove(&pid);
        }
        if let Some(pages) = table.txn_pages.get_mut(&txn_id) {
            pages.remove(&pid);
            if pages.is_empty() {
                table.txn_pages.remove(&txn_id);
            }
        }
        trace!("lock released: txn={txn_id} page={pid}");
        true
    }

    fn wait_timed_out(
        &self,
        waiters: &Condvar,
        table: &mut MutexGuard<LockTable>,
        deadline: Instant,
    ) -> bool {
        if Instant::now() >= deadline {
            return true;
        }
        waiters.wait_until(table, deadline).timed_out()
    }

    fn random_wait(&self) -> Duration {
        let ms = rand::thread_rng().gen_range(self.config.min_wait_ms..=self.config.max_wait_ms);
        Duration::from_millis(ms)
    }
}

impl Default for LockManager {
    fn default() -> Self {
        Self::new(LockManagerConfig::default())
    }
}
