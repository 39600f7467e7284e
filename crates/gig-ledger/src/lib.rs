//! # gig-ledger
//!
//! Custody primitives for the gig escrow engine.
//!
//! This crate provides:
//! - [`Amount`], a plain count of base units
//! - [`Balance`], move-only custodied value (no `Clone`, no `Copy`)
//! - [`Wallet`] / [`Address`], Ed25519 identities
//! - [`SignedRequest`] and the non-forgeable [`TxContext`]
//! - [`LedgerAuthority`], the capability a ledger issues balances and
//!   contexts with
//! - the [`CustodyLedger`] trait and the [`InMemoryLedger`] implementation
//!
//! ## Example
//!
//! ```rust
//! use gig_ledger::{Amount, CustodyLedger, InMemoryLedger, Wallet};
//!
//! # fn example() -> gig_ledger::Result<()> {
//! let ledger = InMemoryLedger::new();
//! let alice = Wallet::generate()?;
//! let bob = Wallet::generate()?;
//! ledger.mint(alice.address(), Amount::from_units(100))?;
//!
//! let ctx = ledger.authenticate(&alice.sign_request(b"pay bob".to_vec()))?;
//! let balance = ledger.withdraw(&ctx, Amount::from_units(40))?;
//! ledger
//!     .transfer(balance, bob.address())
//!     .map_err(|rejected| rejected.error)?;
//!
//! assert_eq!(ledger.balance_of(bob.address()), Amount::from_units(40));
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod amount;
pub mod authority;
pub mod balance;
pub mod error;
pub mod ledger;
pub mod request;
pub mod transaction;
pub mod wallet;

pub use amount::Amount;
pub use authority::LedgerAuthority;
pub use balance::Balance;
pub use error::{LedgerError, Result};
pub use ledger::{CustodyLedger, InMemoryLedger, ObjectId, TransferRejected};
pub use request::{SignedRequest, TxContext};
pub use transaction::{LedgerTransaction, TransactionId, TransactionKind};
pub use wallet::{Address, Wallet};

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn split_then_join_conserves_value(total in 0u64..1_000_000, cut in 0u64..1_000_000) {
            let ledger = InMemoryLedger::new();
            let wallet = Wallet::generate().expect("wallet");
            ledger.mint(wallet.address(), Amount::from_units(total)).expect("mint");
            let ctx = ledger.authenticate(&wallet.sign_request(b"op".to_vec())).expect("auth");

            let mut balance = ledger.withdraw(&ctx, Amount::from_units(total)).expect("withdraw");
            if let Ok(part) = balance.split(Amount::from_units(cut)) {
                prop_assert_eq!(part.value().units() + balance.value().units(), total);
                balance.join(part).map_err(|(e, _)| e).expect("join");
            }
            prop_assert_eq!(balance.value(), Amount::from_units(total));

            ledger.transfer(balance, wallet.address()).map_err(|r| r.error).expect("transfer");
            prop_assert_eq!(ledger.total_in_accounts(), ledger.total_supply());
        }
    }
}
