use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};

/// A committed value record. `amount` and `gas_fee` are opaque decimal-like
/// strings; the ledger never does arithmetic on them. The `id` is assigned by
/// the pending pool on admission, never by the client.
///
/// Field order matters: the canonical JSON encoding of this struct is the
/// Merkle leaf preimage, so reordering fields changes every Merkle root.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub from: String,
    pub to: String,
    pub amount: String,
    pub data: String,
    pub gas_fee: String,
}

impl Transaction {
    /// Canonical encoding used as the Merkle leaf preimage.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(self).expect("transaction JSON encoding cannot fail")
    }
}

/// A client-submitted transaction, before the pool assigns an `id`.
/// `gas_fee` is optional on the wire and defaults to `"0"`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransactionDraft {
    pub from: String,
    pub to: String,
    pub amount: String,
    pub data: String,
    #[serde(default = "default_gas_fee")]
    pub gas_fee: String,
}

fn default_gas_fee() -> String {
    "0".to_string()
}

impl TransactionDraft {
    /// Reject drafts with blank routing fields before they reach the pool.
    /// `data` may be empty; `amount` must be present but is not parsed.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("from", &self.from),
            ("to", &self.to),
            ("amount", &self.amount),
        ] {
            if value.trim().is_empty() {
                return Err(LedgerError::InvalidInput(format!(
                    "transaction field '{field}' must not be empty"
                )));
            }
        }
        Ok(())
    }

    pub fn into_transaction(self, id: String) -> Transaction {
        Transaction {
            id,
            from: self.from,
            to: self.to,
            amount: self.amount,
            data: self.data,
            gas_fee: self.gas_fee,
        }
    }
}
