//! Move-only custodied value.
//!
//! A [`Balance`] is the only type in this workspace that *holds* value. It has
//! no `Clone` or `Copy` implementation and no public constructor for a
//! non-zero amount: value is issued by a
//! [`LedgerAuthority`](crate::LedgerAuthority) when a ledger
//! withdraws it from an account, and redeemed by the same authority when the
//! ledger credits it. In between it can only be split, joined, or drained, so
//! the total is conserved by construction.

use std::fmt;

use tracing::warn;

use crate::amount::Amount;
use crate::authority::IssuerId;
use crate::error::{LedgerError, Result};

/// Custodied value that can be moved but never duplicated.
#[must_use = "dropping a non-zero Balance burns its value"]
pub struct Balance {
    value: u64,
    issuer: Option<IssuerId>,
}

impl Balance {
    /// An empty balance.
    pub const fn zero() -> Self {
        Self {
            value: 0,
            issuer: None,
        }
    }

    pub(crate) const fn issued(issuer: IssuerId, amount: Amount) -> Self {
        Self {
            value: amount.units(),
            issuer: Some(issuer),
        }
    }

    pub(crate) fn into_amount(mut self) -> Amount {
        Amount::from_units(std::mem::take(&mut self.value))
    }

    pub(crate) const fn issuer(&self) -> Option<IssuerId> {
        self.issuer
    }

    /// The amount currently held.
    #[must_use]
    pub const fn value(&self) -> Amount {
        Amount::from_units(self.value)
    }

    /// Whether nothing is held.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.value == 0
    }

    /// Merge `other` into this balance.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Overflow`] if the sum does not fit and
    /// [`LedgerError::ForeignIssuer`] if both balances hold value issued by
    /// different authorities. Nothing moves in either case and `other` is
    /// handed back alongside the error.
    pub fn join(&mut self, mut other: Self) -> std::result::Result<Amount, (LedgerError, Self)> {
        if !self.is_zero() && !other.is_zero() && self.issuer != other.issuer {
            return Err((LedgerError::ForeignIssuer { what: "balance" }, other));
        }
        match self.value.checked_add(other.value) {
            Some(sum) => {
                if self.is_zero() {
                    self.issuer = other.issuer;
                }
                other.value = 0;
                self.value = sum;
                Ok(self.value())
            }
            None => {
                let err = LedgerError::Overflow {
                    current: self.value(),
                    incoming: other.value(),
                };
                Err((err, other))
            }
        }
    }

    /// Split `amount` off into a new balance.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InsufficientBalance`] if less than `amount` is held.
    pub fn split(&mut self, amount: Amount) -> Result<Self> {
        let rest = self
            .value
            .checked_sub(amount.units())
            .ok_or_else(|| LedgerError::insufficient_balance(self.value(), amount))?;
        self.value = rest;
        Ok(Self {
            value: amount.units(),
            issuer: self.issuer,
        })
    }

    /// Take everything, leaving this balance at zero.
    pub fn drain(&mut self) -> Self {
        Self {
            value: std::mem::take(&mut self.value),
            issuer: self.issuer,
        }
    }

    /// Destroy an empty balance.
    ///
    /// # Errors
    ///
    /// Returns the balance back if it is not empty.
    pub fn destroy_zero(self) -> std::result::Result<(), Self> {
        if self.is_zero() { Ok(()) } else { Err(self) }
    }
}

impl Default for Balance {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Debug for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Balance").field("value", &self.value).finish()
    }
}

impl Drop for Balance {
    fn drop(&mut self) {
        if self.value != 0 {
            warn!(value = self.value, "non-zero balance dropped; value burned");
        }
    }
}
