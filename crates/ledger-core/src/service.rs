use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tracing::info;

use crate::error::{LedgerError, Result};
use crate::pow::{mine_block, CancelToken, MineBudget};
use crate::{Block, Ledger, Transaction, TransactionDraft, TransactionPool};

/// Response of [`LedgerService::admit_transactions`].
#[derive(Clone, Debug, Serialize)]
pub struct AdmitOutcome {
    pub pending_count: usize,
    pub pending_transactions: Vec<Transaction>,
}

/// Response of [`LedgerService::search_chain`].
#[derive(Clone, Debug, Serialize)]
pub struct SearchOutcome {
    pub query: String,
    pub results: Vec<Block>,
    pub count: usize,
}

/// Response of [`LedgerService::status`].
#[derive(Clone, Debug, Serialize)]
pub struct Status {
    pub block_count: usize,
    pub difficulty: u32,
    pub is_valid: bool,
    pub pending_count: usize,
}

struct State {
    ledger: Ledger,
    pool: TransactionPool,
}

/// The single owner of the chain and the pending pool. Handlers never touch
/// the raw containers; every operation goes through here and observes a
/// consistent snapshot.
///
/// One mutex guards both structures, so all mutations are serialized. The
/// nonce search must not run under that lock: `mine_selected` selects the
/// batch and snapshots the tip under the state lock, mines with the lock
/// released, then re-acquires it to commit. A second mutex serializes the
/// miners themselves, so the tip cannot move between snapshot and commit;
/// the commit-time linkage check backs that invariant.
pub struct LedgerService {
    state: Mutex<State>,
    mine_guard: Mutex<()>,
    budget: MineBudget,
    cancel: CancelToken,
}

impl LedgerService {
    /// Mines genesis and starts with an empty pool. Called once per process.
    pub fn new(difficulty: u32, budget: MineBudget) -> Result<Self> {
        let ledger = Ledger::new(difficulty)?;
        info!(
            difficulty,
            genesis_hash = %ledger.tip().hash,
            "ledger initialized"
        );
        Ok(Self {
            state: Mutex::new(State {
                ledger,
                pool: TransactionPool::new(),
            }),
            mine_guard: Mutex::new(()),
            budget,
            cancel: CancelToken::new(),
        })
    }

    /// Handle for aborting in-flight mining, e.g. on shutdown.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Full chain plus difficulty, cloned under the lock.
    pub fn chain_snapshot(&self) -> Ledger {
        self.lock().ledger.clone()
    }

    pub fn pending(&self) -> Vec<Transaction> {
        self.lock().pool.pending().to_vec()
    }

    /// Validates every draft before touching the pool, so a bad entry in
    /// the batch leaves the pool exactly as it was.
    pub fn admit_transactions(&self, drafts: Vec<TransactionDraft>) -> Result<AdmitOutcome> {
        for draft in &drafts {
            draft.validate()?;
        }
        let mut state = self.lock();
        let admitted = state.pool.admit(drafts);
        info!(admitted = admitted.len(), pending = state.pool.len(), "transactions admitted");
        Ok(AdmitOutcome {
            pending_count: state.pool.len(),
            pending_transactions: state.pool.pending().to_vec(),
        })
    }

    /// Pulls the identified transactions out of the pool, mines them into
    /// the next block and appends it. Fails with `NoSelection` (and removes
    /// nothing) when no ID resolves; on any mining failure the selected
    /// batch is restored to the pool unchanged.
    pub fn mine_selected(&self, ids: &[String]) -> Result<Block> {
        let _mining = self
            .mine_guard
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let (candidate, selected, difficulty) = {
            let mut state = self.lock();
            let selected = state.pool.select(ids);
            if selected.is_empty() {
                return Err(LedgerError::NoSelection);
            }
            let candidate = match state.ledger.candidate(selected.clone()) {
                Ok(candidate) => candidate,
                Err(err) => {
                    state.pool.restore(selected);
                    return Err(err);
                }
            };
            (candidate, selected, state.ledger.difficulty())
        };

        match mine_block(candidate, difficulty, &self.budget, &self.cancel) {
            Ok(mined) => {
                let mut state = self.lock();
                if let Err(err) = state.ledger.commit(mined) {
                    state.pool.restore(selected);
                    return Err(err);
                }
                Ok(state.ledger.tip().clone())
            }
            Err(err) => {
                self.lock().pool.restore(selected);
                Err(err)
            }
        }
    }

    /// Substring search over the chain; blank queries are refused.
    pub fn search_chain(&self, query: &str) -> Result<SearchOutcome> {
        if query.trim().is_empty() {
            return Err(LedgerError::EmptyQuery);
        }
        let results = self.lock().ledger.search(query);
        Ok(SearchOutcome {
            query: query.to_string(),
            count: results.len(),
            results,
        })
    }

    pub fn status(&self) -> Status {
        let state = self.lock();
        Status {
            block_count: state.ledger.blocks().len(),
            difficulty: state.ledger.difficulty(),
            is_valid: state.ledger.validate(),
            pending_count: state.pool.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(from: &str, data: &str) -> TransactionDraft {
        TransactionDraft {
            from: from.into(),
            to: "sink".into(),
            amount: "1".into(),
            data: data.into(),
            gas_fee: "0".into(),
        }
    }

    fn service() -> LedgerService {
        LedgerService::new(1, MineBudget::UNBOUNDED).unwrap()
    }

    #[test]
    fn admit_rejects_batch_with_blank_field_without_mutating() {
        let svc = service();
        let err = svc
            .admit_transactions(vec![draft("a", "ok"), draft("", "bad")])
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidInput(_)));
        assert!(svc.pending().is_empty());
    }

    #[test]
    fn mine_selected_with_no_resolved_ids_is_a_no_op() {
        let svc = service();
        svc.admit_transactions(vec![draft("a", "x")]).unwrap();

        assert_eq!(svc.mine_selected(&[]).unwrap_err(), LedgerError::NoSelection);
        assert_eq!(
            svc.mine_selected(&["tx_bogus".to_string()]).unwrap_err(),
            LedgerError::NoSelection
        );
        assert_eq!(svc.pending().len(), 1);
        assert_eq!(svc.status().block_count, 1);
    }

    #[test]
    fn mining_timeout_restores_the_pool() {
        let svc = LedgerService::new(64, MineBudget::iterations(4)).unwrap();
        let outcome = svc.admit_transactions(vec![draft("a", "x")]).unwrap();
        let id = outcome.pending_transactions[0].id.clone();

        assert_eq!(
            svc.mine_selected(&[id.clone()]).unwrap_err(),
            LedgerError::MiningTimeout
        );
        let pending = svc.pending();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, id);
        assert_eq!(svc.status().block_count, 1);
    }

    #[test]
    fn cancelled_service_restores_the_pool() {
        let svc = LedgerService::new(64, MineBudget::UNBOUNDED).unwrap();
        let outcome = svc.admit_transactions(vec![draft("a", "x")]).unwrap();
        let id = outcome.pending_transactions[0].id.clone();

        svc.cancel_token().cancel();
        assert_eq!(
            svc.mine_selected(&[id]).unwrap_err(),
            LedgerError::MiningCancelled
        );
        assert_eq!(svc.pending().len(), 1);
    }

    #[test]
    fn blank_search_query_is_refused() {
        let svc = service();
        assert_eq!(svc.search_chain("  ").unwrap_err(), LedgerError::EmptyQuery);
        assert_eq!(svc.search_chain("").unwrap_err(), LedgerError::EmptyQuery);
    }
}
