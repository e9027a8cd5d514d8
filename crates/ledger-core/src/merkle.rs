use sha2::{Digest, Sha256};

use crate::Transaction;

type LevelHash = [u8; 32];

/// Computes the Merkle commitment over an ordered transaction batch and
/// returns it as lowercase hex.
///
/// The commitment is order-sensitive: the same set of transactions in a
/// different order produces a different root. Leaves are SHA-256 over the
/// canonical JSON encoding of each transaction; parents are SHA-256 over the
/// left child's bytes followed by the right child's. A level with an odd
/// count pairs its last node with itself. The empty batch commits to
/// SHA-256 of the empty byte string.
pub fn merkle_root(txs: &[Transaction]) -> String {
    if txs.is_empty() {
        return hex::encode(Sha256::digest(b""));
    }

    let mut level: Vec<LevelHash> = txs
        .iter()
        .map(|tx| Sha256::digest(tx.canonical_bytes()).into())
        .collect();

    while level.len() > 1 {
        let mut next = Vec::with_capacity(level.len().div_ceil(2));
        for pair in level.chunks(2) {
            let (a, b) = if pair.len() == 2 {
                (pair[0], pair[1])
            } else {
                (pair[0], pair[0])
            };
            let mut hasher = Sha256::new();
            hasher.update(a);
            hasher.update(b);
            next.push(hasher.finalize().into());
        }
        level = next;
    }
    hex::encode(level[0])
}
