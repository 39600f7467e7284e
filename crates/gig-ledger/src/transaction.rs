//! Ledger transaction records.

use crate::amount::Amount;
use crate::wallet::Address;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique transaction identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId(String);

impl TransactionId {
    /// Create a new random transaction ID.
    #[must_use]
    pub fn new() -> Self {
        Self(format!("tx-{}", Uuid::new_v4()))
    }

    /// Create from a string.
    #[must_use]
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the ID as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a ledger transaction did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// New value issued to an account.
    Mint,
    /// Value moved out of an account into a custodied balance.
    Withdraw,
    /// Custodied balance credited to an account.
    Transfer,
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mint => write!(f, "mint"),
            Self::Withdraw => write!(f, "withdraw"),
            Self::Transfer => write!(f, "transfer"),
        }
    }
}

/// A committed ledger transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerTransaction {
    /// Unique transaction ID.
    pub id: TransactionId,
    /// Transaction kind.
    pub kind: TransactionKind,
    /// Debited account, if any.
    pub from: Option<Address>,
    /// Credited account, if any.
    pub to: Option<Address>,
    /// Amount moved.
    pub amount: Amount,
    /// Commit timestamp.
    pub committed_at: DateTime<Utc>,
}

impl LedgerTransaction {
    /// Record issuance of new value.
    #[must_use]
    pub fn mint(to: Address, amount: Amount) -> Self {
        Self::new(TransactionKind::Mint, None, Some(to), amount)
    }

    /// Record a withdrawal from `from` into custody.
    #[must_use]
    pub fn withdraw(id: TransactionId, from: Address, amount: Amount) -> Self {
        Self {
            id,
            ..Self::new(TransactionKind::Withdraw, Some(from), None, amount)
        }
    }

    /// Record a transfer of custodied value to `to`.
    #[must_use]
    pub fn transfer(to: Address, amount: Amount) -> Self {
        Self::new(TransactionKind::Transfer, None, Some(to), amount)
    }

    fn new(kind: TransactionKind, from: Option<Address>, to: Option<Address>, amount: Amount) -> Self {
        Self {
            id: TransactionId::new(),
            kind,
            from,
            to,
            amount,
            committed_at: Utc::now(),
        }
    }
}
