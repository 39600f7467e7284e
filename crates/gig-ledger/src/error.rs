//! Error types for custody ledger operations.

use thiserror::Error;

use crate::amount::Amount;

/// Result type alias for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors that can occur during custody ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Invalid address format.
    #[error("invalid address: {message}")]
    InvalidAddress {
        /// Description of the address error.
        message: String,
    },

    /// Insufficient balance for operation.
    #[error("insufficient balance: have {have}, need {need}")]
    InsufficientBalance {
        /// Current balance.
        have: Amount,
        /// Required balance.
        need: Amount,
    },

    /// Invalid amount.
    #[error("invalid amount: {message}")]
    InvalidAmount {
        /// Description of the amount error.
        message: String,
    },

    /// Crediting an account or joining balances would overflow.
    #[error("balance overflow: {current} + {incoming} exceeds the maximum representable amount")]
    Overflow {
        /// Value already held.
        current: Amount,
        /// Value being added.
        incoming: Amount,
    },

    /// Request signature did not verify against the sender address.
    #[error("invalid signature from {sender}")]
    InvalidSignature {
        /// Claimed sender.
        sender: String,
    },

    /// Request nonce was not greater than the last accepted one.
    #[error("replayed nonce {nonce} from {sender} (last accepted {last})")]
    ReplayedNonce {
        /// Claimed sender.
        sender: String,
        /// Nonce carried by the request.
        nonce: u64,
        /// Highest nonce accepted so far for this sender.
        last: u64,
    },

    /// A balance or context issued by another ledger's authority.
    #[error("{what} was issued by a different ledger")]
    ForeignIssuer {
        /// What was presented.
        what: &'static str,
    },

    /// Wallet error.
    #[error("wallet error: {message}")]
    WalletError {
        /// Description of the wallet error.
        message: String,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LedgerError {
    /// Create an invalid address error.
    #[must_use]
    pub fn invalid_address(message: impl Into<String>) -> Self {
        Self::InvalidAddress {
            message: message.into(),
        }
    }

    /// Create an insufficient balance error.
    #[must_use]
    pub const fn insufficient_balance(have: Amount, need: Amount) -> Self {
        Self::InsufficientBalance { have, need }
    }

    /// Create an invalid amount error.
    #[must_use]
    pub fn invalid_amount(message: impl Into<String>) -> Self {
        Self::InvalidAmount {
            message: message.into(),
        }
    }

    /// Create a wallet error.
    #[must_use]
    pub fn wallet_error(message: impl Into<String>) -> Self {
        Self::WalletError {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_balance_display() {
        let err = LedgerError::insufficient_balance(Amount::from_units(5), Amount::from_units(10));
        let msg = err.to_string();
        assert!(msg.contains('5'));
        assert!(msg.contains("10"));
    }

    #[test]
    fn test_invalid_address_display() {
        let err = LedgerError::invalid_address("bad format");
        assert!(err.to_string().contains("bad format"));
    }

    #[test]
    fn test_replayed_nonce_display() {
        let err = LedgerError::ReplayedNonce {
            sender: "abc123".to_string(),
            nonce: 3,
            last: 7,
        };
        let msg = err.to_string();
        assert!(msg.contains("abc123"));
        assert!(msg.contains("last accepted 7"));
    }
}
