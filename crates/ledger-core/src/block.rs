use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::{merkle_root, Transaction};

/// One link of the chain. Immutable once appended: `merkle_root` is computed
/// when the block is built and never recomputed, and `hash` is fixed by the
/// proof-of-work search.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    pub timestamp: u64,
    pub transactions: Vec<Transaction>,
    pub prev_hash: String,
    pub hash: String,
    pub nonce: u64,
    pub merkle_root: String,
}

impl Block {
    /// Builds an unmined candidate: header fields set, `nonce` zero and
    /// `hash` empty until the miner fills them in.
    pub fn candidate(index: u64, prev_hash: String, transactions: Vec<Transaction>) -> Self {
        let merkle_root = merkle_root(&transactions);
        Self {
            index,
            timestamp: unix_now(),
            transactions,
            prev_hash,
            hash: String::new(),
            nonce: 0,
            merkle_root,
        }
    }

    /// Recomputes the header digest from the stored fields: SHA-256 over the
    /// decimal renderings of `index`, `timestamp` and `nonce` concatenated
    /// with `prev_hash` and `merkle_root`, as lowercase hex. For an intact
    /// block this reproduces `hash` exactly.
    pub fn header_hash(&self) -> String {
        let preimage = format!(
            "{}{}{}{}{}",
            self.index, self.timestamp, self.prev_hash, self.merkle_root, self.nonce
        );
        hex::encode(Sha256::digest(preimage.as_bytes()))
    }
}

pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_secs()
}
