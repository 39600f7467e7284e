//! Issuance capability for custody ledgers.
//!
//! A [`LedgerAuthority`] is what lets a ledger create value and vouch for
//! senders. Each authority has its own identity, and every [`Balance`] and
//! [`TxContext`] it issues is tagged with it. A ledger keeps its authority
//! private and only accepts balances and contexts that carry its own tag, so
//! value minted by anyone else's authority is worthless to it.

use uuid::Uuid;

use crate::amount::Amount;
use crate::balance::Balance;
use crate::error::LedgerError;
use crate::request::TxContext;
use crate::wallet::Address;

/// Identity of the authority a balance or context was issued by.
pub(crate) type IssuerId = Uuid;

/// Capability to mint balances and authenticated contexts.
///
/// Construct one when the ledger is constructed and never hand it out.
#[derive(Debug)]
pub struct LedgerAuthority {
    id: IssuerId,
}

impl LedgerAuthority {
    /// Create an authority with a fresh identity.
    #[must_use]
    pub fn new() -> Self {
        Self { id: Uuid::new_v4() }
    }

    /// Put `amount` into custody. Call this only after debiting an account.
    pub fn issue(&self, amount: Amount) -> Balance {
        Balance::issued(self.id, amount)
    }

    /// Take a balance out of custody, returning the amount to credit.
    ///
    /// # Errors
    ///
    /// Hands the balance back with [`LedgerError::ForeignIssuer`] if another
    /// authority issued it.
    pub fn redeem(&self, balance: Balance) -> std::result::Result<Amount, (LedgerError, Balance)> {
        if !self.owns(&balance) {
            return Err((LedgerError::ForeignIssuer { what: "balance" }, balance));
        }
        Ok(balance.into_amount())
    }

    /// Vouch for `sender` as the author of a payload with this digest.
    /// Call this only after verifying the request signature and nonce.
    #[must_use]
    pub fn context(&self, sender: Address, digest: [u8; 32]) -> TxContext {
        TxContext::new(self.id, sender, digest)
    }

    /// Whether this authority can redeem `balance`. Empty balances belong to
    /// every authority.
    #[must_use]
    pub fn owns(&self, balance: &Balance) -> bool {
        balance.is_zero() || balance.issuer() == Some(self.id)
    }

    /// Check that `ctx` was vouched for by this authority.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::ForeignIssuer`] otherwise.
    pub fn verify(&self, ctx: &TxContext) -> crate::Result<()> {
        if ctx.issuer() == self.id {
            Ok(())
        } else {
            Err(LedgerError::ForeignIssuer { what: "transaction context" })
        }
    }
}

impl Default for LedgerAuthority {
    fn default() -> Self {
        Self::new()
    }
}
