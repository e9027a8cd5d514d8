use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::{Transaction, TransactionDraft};

/// Holding area for admitted, not-yet-mined transactions, in submission
/// order. IDs come from a process-lifetime monotonic counter, so two
/// admissions can never collide no matter how close together they land.
#[derive(Debug, Default)]
pub struct TransactionPool {
    pending: Vec<Transaction>,
    next_id: AtomicU64,
}

impl TransactionPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> &[Transaction] {
        &self.pending
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Assigns each draft a fresh ID and appends it, preserving submission
    /// order. Returns the admitted transactions.
    pub fn admit(&mut self, drafts: Vec<TransactionDraft>) -> Vec<Transaction> {
        let admitted: Vec<Transaction> = drafts
            .into_iter()
            .map(|draft| {
                let seq = self.next_id.fetch_add(1, Ordering::Relaxed);
                draft.into_transaction(format!("tx_{seq}"))
            })
            .collect();
        self.pending.extend(admitted.iter().cloned());
        admitted
    }

    /// Removes and returns the pending transactions whose ID is in `ids`,
    /// in their original relative order; the remainder keeps its order too.
    /// IDs that match nothing are silently ignored, so an empty result
    /// means the caller selected nothing and the pool was left untouched.
    pub fn select(&mut self, ids: &[String]) -> Vec<Transaction> {
        let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
        let (selected, remaining): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|tx| wanted.contains(tx.id.as_str()));
        self.pending = remaining;
        selected
    }

    /// Puts a previously selected batch back at the front of the pool in
    /// its original relative order. Used when mining fails so the batch is
    /// not lost.
    pub fn restore(&mut self, transactions: Vec<Transaction>) {
        self.pending.splice(0..0, transactions);
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

    #[test]
    fn admit_assigns_distinct_ids_and_keeps_order() {
        let mut pool = TransactionPool::new();
        let admitted = pool.admit(vec![draft("a", "1"), draft("b", "2"), draft("c", "3")]);

        assert_eq!(pool.len(), 3);
        let ids: HashSet<&str> = admitted.iter().map(|tx| tx.id.as_str()).collect();
        assert_eq!(ids.len(), 3);
        let froms: Vec<&str> = pool.pending().iter().map(|tx| tx.from.as_str()).collect();
        assert_eq!(froms, ["a", "b", "c"]);

        // IDs stay unique across later admissions as well.
        let later = pool.admit(vec![draft("d", "4")]);
        assert!(!ids.contains(later[0].id.as_str()));
    }

    #[test]
    fn select_partitions_preserving_relative_order() {
        let mut pool = TransactionPool::new();
        let admitted = pool.admit(vec![
            draft("a", "1"),
            draft("b", "2"),
            draft("c", "3"),
            draft("d", "4"),
        ]);

        let picked = pool.select(&[admitted[3].id.clone(), admitted[1].id.clone()]);
        let picked_froms: Vec<&str> = picked.iter().map(|tx| tx.from.as_str()).collect();
        assert_eq!(picked_froms, ["b", "d"]);

        let remaining: Vec<&str> = pool.pending().iter().map(|tx| tx.from.as_str()).collect();
        assert_eq!(remaining, ["a", "c"]);
    }

    #[test]
    fn select_ignores_unknown_ids() {
        let mut pool = TransactionPool::new();
        let admitted = pool.admit(vec![draft("a", "1")]);

        let picked = pool.select(&["tx_bogus".to_string(), admitted[0].id.clone()]);
        assert_eq!(picked.len(), 1);
        assert!(pool.is_empty());

        // Re-issuing with nothing left to match is a no-op.
        assert!(pool.select(&[admitted[0].id.clone()]).is_empty());
        assert!(pool.is_empty());
    }

    #[test]
    fn select_with_no_matches_leaves_pool_untouched() {
        let mut pool = TransactionPool::new();
        pool.admit(vec![draft("a", "1"), draft("b", "2")]);

        assert!(pool.select(&["nope".to_string()]).is_empty());
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn restore_returns_batch_to_the_front_in_order() {
        let mut pool = TransactionPool::new();
        let admitted = pool.admit(vec![draft("a", "1"), draft("b", "2"), draft("c", "3")]);

        let picked = pool.select(&[admitted[0].id.clone(), admitted[2].id.clone()]);
        pool.restore(picked);

        let froms: Vec<&str> = pool.pending().iter().map(|tx| tx.from.as_str()).collect();
        assert_eq!(froms, ["a", "c", "b"]);
    }
}
