use thiserror::Error;

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Every error here is recoverable at the call boundary: the failed
/// operation leaves the ledger and the pending pool exactly as they were.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Malformed or missing transaction fields.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Mining was requested but no submitted IDs resolved to pooled transactions.
    #[error("no valid transactions selected to mine")]
    NoSelection,

    /// Search was requested with a blank query string.
    #[error("search query must not be blank")]
    EmptyQuery,

    /// The nonce search exceeded its iteration or wall-clock budget.
    #[error("mining exceeded its configured budget")]
    MiningTimeout,

    /// The nonce search was cancelled before finding a valid hash.
    #[error("mining was cancelled")]
    MiningCancelled,

    /// The chain tip changed between snapshot and append. Unreachable while
    /// all mining is funnelled through the service's mine guard.
    #[error("chain tip moved while mining")]
    ChainTipMoved,
}
