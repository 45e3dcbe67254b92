use thiserror::Error;

pub type MiniDBResult<T, E = MiniDBError> = Result<T, E>;

#[derive(Debug, Error)]
pub enum MiniDBError {
    #[error("No such element: {0}")]
    NoSuchElement(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("DB error: {0}")]
    DB(String),

    #[error("Transaction aborted")]
    TransactionAborted,
}
