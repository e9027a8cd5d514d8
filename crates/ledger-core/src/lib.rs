//! Core of a minimal append-only ledger: hash-linked blocks committing
//! transaction batches via a Merkle root, secured by a leading-zero
//! proof-of-work puzzle. Single process, single writer, in memory.
//!
//! [`LedgerService`] is the only entry point the transport layer needs; it
//! owns the chain and the pending pool behind one lock and keeps the
//! CPU-bound nonce search off that lock.

pub mod block;
pub mod chain;
pub mod error;
pub mod merkle;
pub mod pool;
pub mod pow;
pub mod service;
pub mod transaction;

pub use block::Block;
pub use chain::{Ledger, DEFAULT_DIFFICULTY, GENESIS_DIFFICULTY};
pub use error::{LedgerError, Result};
pub use merkle::merkle_root;
pub use pool::TransactionPool;
pub use pow::{mine_block, CancelToken, MineBudget};
pub use service::{AdmitOutcome, LedgerService, SearchOutcome, Status};
pub use transaction::{Transaction, TransactionDraft};
