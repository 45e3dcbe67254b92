mod lock_manager;
#[allow(clippy::module_inception)]
mod transaction;

pub use lock_manager::{LockManager, LockMode};
pub use transaction::{Transaction, TransactionId};
