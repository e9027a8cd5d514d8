use serde::Serialize;
use tracing::debug;

use crate::error::{LedgerError, Result};
use crate::pow::{mine_block, CancelToken, MineBudget};
use crate::{Block, Transaction};

/// Default number of leading zero hex characters a block hash must carry.
pub const DEFAULT_DIFFICULTY: u32 = 4;
/// Genesis is mined at a reduced difficulty so startup stays fast.
pub const GENESIS_DIFFICULTY: u32 = 2;

const GENESIS_DATA: &str = "Genesis Block - Welcome to Muneeb's blockchain";

/// The append-only chain. Constructed once per process with a mined genesis
/// block; grows only through [`Ledger::commit`] (or the composed
/// [`Ledger::append`]) and is never truncated or rewritten.
#[derive(Clone, Debug, Serialize)]
pub struct Ledger {
    blocks: Vec<Block>,
    difficulty: u32,
}

impl Ledger {
    /// Builds the chain with a freshly mined genesis block. Genesis has
    /// `index = 0`, `prev_hash = "0"` and a single system transaction, and
    /// is mined at [`GENESIS_DIFFICULTY`] regardless of `difficulty`.
    pub fn new(difficulty: u32) -> Result<Self> {
        let genesis_tx = Transaction {
            id: "genesis".into(),
            from: "system".into(),
            to: "system".into(),
            amount: "0".into(),
            data: GENESIS_DATA.into(),
            gas_fee: "0".into(),
        };
        let candidate = Block::candidate(0, "0".into(), vec![genesis_tx]);
        let genesis = mine_block(
            candidate,
            GENESIS_DIFFICULTY,
            &MineBudget::UNBOUNDED,
            &CancelToken::new(),
        )?;
        Ok(Self {
            blocks: vec![genesis],
            difficulty,
        })
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    /// The most recently appended block. The chain is never empty.
    pub fn tip(&self) -> &Block {
        self.blocks.last().expect("chain always holds genesis")
    }

    /// Builds the unmined successor of the current tip for `transactions`.
    /// Empty batches are rejected; callers filter them out before mining.
    pub fn candidate(&self, transactions: Vec<Transaction>) -> Result<Block> {
        if transactions.is_empty() {
            return Err(LedgerError::InvalidInput(
                "a block must carry at least one transaction".into(),
            ));
        }
        let tip = self.tip();
        Ok(Block::candidate(
            tip.index + 1,
            tip.hash.clone(),
            transactions,
        ))
    }

    /// Appends a mined block after checking it still links to the tip. The
    /// linkage check is what makes optimistic mining safe: a block mined
    /// against a stale tip is refused instead of corrupting the chain.
    pub fn commit(&mut self, block: Block) -> Result<()> {
        let tip = self.tip();
        if block.prev_hash != tip.hash || block.index != tip.index + 1 {
            return Err(LedgerError::ChainTipMoved);
        }
        debug!(index = block.index, hash = %block.hash, "block appended");
        self.blocks.push(block);
        Ok(())
    }

    /// Mines and appends in one step, for callers that do not need to hold
    /// the chain snapshot across the search.
    pub fn append(
        &mut self,
        transactions: Vec<Transaction>,
        budget: &MineBudget,
        cancel: &CancelToken,
    ) -> Result<&Block> {
        let candidate = self.candidate(transactions)?;
        let mined = mine_block(candidate, self.difficulty, budget, cancel)?;
        self.commit(mined)?;
        Ok(self.tip())
    }

    /// Re-checks every chain link: for each block from index 1 on, the
    /// recomputed header digest must equal the stored `hash` and `prev_hash`
    /// must equal the previous block's stored `hash`. Short-circuits on the
    /// first failure. Genesis has no predecessor, but its own digest is
    /// still re-verified.
    pub fn validate(&self) -> bool {
        if self.blocks[0].hash != self.blocks[0].header_hash() {
            return false;
        }
        for window in self.blocks.windows(2) {
            let (prev, current) = (&window[0], &window[1]);
            if current.hash != current.header_hash() {
                return false;
            }
            if current.prev_hash != prev.hash {
                return false;
            }
        }
        true
    }

    /// Case-insensitive substring scan over the chain. A block matches when
    /// the query appears in any transaction's `data`, `from`, `to`, `amount`
    /// or `id`, or in the block's own `hash`; each block is returned at most
    /// once, in chain order.
    pub fn search(&self, query: &str) -> Vec<Block> {
        let needle = query.to_lowercase();
        self.blocks
            .iter()
            .filter(|block| block_matches(block, &needle))
            .cloned()
            .collect()
    }
}

fn block_matches(block: &Block, needle: &str) -> bool {
    block.transactions.iter().any(|tx| {
        [&tx.data, &tx.from, &tx.to, &tx.amount, &tx.id]
            .into_iter()
            .any(|field| field.to_lowercase().contains(needle))
    }) || block.hash.to_lowercase().contains(needle)
}
