//! The custody ledger interface and an in-memory implementation.
//!
//! A ledger supplies four primitives to the escrow engine:
//! - sender authentication ([`CustodyLedger::authenticate`])
//! - unique object identity ([`CustodyLedger::new_object_id`])
//! - deposits into custody ([`CustodyLedger::withdraw`])
//! - atomic payouts out of custody ([`CustodyLedger::transfer`])
//!
//! Implementations outside this crate mint balances and contexts through
//! their own [`LedgerAuthority`].

use std::collections::HashMap;
use std::fmt;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::amount::Amount;
use crate::authority::LedgerAuthority;
use crate::balance::Balance;
use crate::error::{LedgerError, Result};
use crate::request::{SignedRequest, TxContext};
use crate::transaction::{LedgerTransaction, TransactionKind};
use crate::wallet::Address;

/// Globally unique identifier issued by a ledger for a new object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(Uuid);

impl ObjectId {
    /// Issue a fresh random ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A transfer the ledger refused. The balance is handed back untouched.
#[derive(Debug)]
pub struct TransferRejected {
    /// Why the transfer was refused.
    pub error: LedgerError,
    /// The balance that was to be transferred.
    pub balance: Balance,
}

impl fmt::Display for TransferRejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "transfer of {} rejected: {}", self.balance.value(), self.error)
    }
}

/// Host ledger primitives the escrow engine relies on.
///
/// Every method is all-or-nothing: on error, no account or balance changes.
/// An implementation owns one [`LedgerAuthority`], issues every [`Balance`]
/// and [`TxContext`] through it, and refuses balances and contexts that
/// another authority issued.
pub trait CustodyLedger: Send + Sync {
    /// Verify a signed request and produce the authenticated context for it.
    ///
    /// The context lets its holder withdraw from the sender's account, so it
    /// must only be requested by the component that interprets the payload.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidSignature`] for a bad signature and
    /// [`LedgerError::ReplayedNonce`] for a nonce that was already used.
    fn authenticate(&self, request: &SignedRequest) -> Result<TxContext>;

    /// Issue a unique identifier for an object created within `ctx`.
    fn new_object_id(&self, ctx: &TxContext) -> ObjectId;

    /// Move `amount` from the sender's account into a custodied balance.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InsufficientBalance`] if the account holds less
    /// and [`LedgerError::ForeignIssuer`] for a context this ledger did not
    /// issue.
    fn withdraw(&self, ctx: &TxContext, amount: Amount) -> Result<Balance>;

    /// Credit the whole of `balance` to `recipient`.
    ///
    /// # Errors
    ///
    /// Hands the balance back inside [`TransferRejected`] if the credit fails.
    fn transfer(
        &self,
        balance: Balance,
        recipient: &Address,
    ) -> std::result::Result<LedgerTransaction, TransferRejected>;

    /// Current account balance of `address`.
    fn balance_of(&self, address: &Address) -> Amount;
}

#[derive(Debug, Default)]
struct LedgerState {
    accounts: HashMap<Address, Amount>,
    nonces: HashMap<Address, u64>,
    transactions: Vec<LedgerTransaction>,
}

/// In-process ledger keeping account balances in memory.
///
/// Suitable for tests, demos and embedders without a real host ledger.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    authority: LedgerAuthority,
    state: RwLock<LedgerState>,
}

impl InMemoryLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue new value to `address`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Overflow`] if the account would exceed the maximum.
    pub fn mint(&self, address: &Address, amount: Amount) -> Result<LedgerTransaction> {
        let mut state = self.state.write();
        let current = state.accounts.get(address).copied().unwrap_or_default();
        let updated = current.checked_add(amount).ok_or(LedgerError::Overflow {
            current,
            incoming: amount,
        })?;
        state.accounts.insert(address.clone(), updated);

        let tx = LedgerTransaction::mint(address.clone(), amount);
        state.transactions.push(tx.clone());
        info!(address = %address, amount = %amount, "minted");
        Ok(tx)
    }

    /// All committed transactions, oldest first.
    #[must_use]
    pub fn transactions(&self) -> Vec<LedgerTransaction> {
        self.state.read().transactions.clone()
    }

    /// Sum of all account balances (excludes value held in custody).
    #[must_use]
    pub fn total_in_accounts(&self) -> Amount {
        self.state
            .read()
            .accounts
            .values()
            .fold(Amount::ZERO, |acc, v| acc.saturating_add(*v))
    }

    /// Total value ever minted.
    #[must_use]
    pub fn total_supply(&self) -> Amount {
        self.state
            .read()
            .transactions
            .iter()
            .filter(|tx| tx.kind == TransactionKind::Mint)
            .fold(Amount::ZERO, |acc, tx| acc.saturating_add(tx.amount))
    }
}

impl CustodyLedger for InMemoryLedger {
    fn authenticate(&self, request: &SignedRequest) -> Result<TxContext> {
        request.verify_signature()?;

        let mut state = self.state.write();
        let last = state.nonces.get(&request.sender).copied().unwrap_or(0);
        if request.nonce <= last {
            warn!(sender = %request.sender, nonce = request.nonce, last, "replayed request nonce");
            return Err(LedgerError::ReplayedNonce {
                sender: request.sender.to_string(),
                nonce: request.nonce,
                last,
            });
        }
        state.nonces.insert(request.sender.clone(), request.nonce);

        let ctx = self
            .authority
            .context(request.sender.clone(), request.payload_digest());
        debug!(sender = %request.sender, tx_id = %ctx.tx_id(), "request authenticated");
        Ok(ctx)
    }

    fn new_object_id(&self, ctx: &TxContext) -> ObjectId {
        let id = ObjectId::new();
        debug!(tx_id = %ctx.tx_id(), object_id = %id, "object id issued");
        id
    }

    fn withdraw(&self, ctx: &TxContext, amount: Amount) -> Result<Balance> {
        self.authority.verify(ctx)?;
        let mut state = self.state.write();
        let have = state.accounts.get(ctx.sender()).copied().unwrap_or_default();
        let rest = have
            .checked_sub(amount)
            .ok_or_else(|| LedgerError::insufficient_balance(have, amount))?;
        state.accounts.insert(ctx.sender().clone(), rest);
        state.transactions.push(LedgerTransaction::withdraw(
            ctx.tx_id().clone(),
            ctx.sender().clone(),
            amount,
        ));

        debug!(sender = %ctx.sender(), amount = %amount, "withdrawn into custody");
        Ok(self.authority.issue(amount))
    }

    fn transfer(
        &self,
        balance: Balance,
        recipient: &Address,
    ) -> std::result::Result<LedgerTransaction, TransferRejected> {
        let mut state = self.state.write();
        let incoming = balance.value();
        let current = state.accounts.get(recipient).copied().unwrap_or_default();
        let Some(updated) = current.checked_add(incoming) else {
            warn!(recipient = %recipient, amount = %incoming, "transfer rejected: overflow");
            return Err(TransferRejected {
                error: LedgerError::Overflow { current, incoming },
                balance,
            });
        };

        let amount = match self.authority.redeem(balance) {
            Ok(amount) => amount,
            Err((error, balance)) => {
                warn!(recipient = %recipient, amount = %incoming, "transfer rejected: foreign balance");
                return Err(TransferRejected { error, balance });
            }
        };
        state.accounts.insert(recipient.clone(), updated);
        let tx = LedgerTransaction::transfer(recipient.clone(), amount);
        state.transactions.push(tx.clone());

        info!(recipient = %recipient, amount = %amount, tx_id = %tx.id, "transfer committed");
        Ok(tx)
    }

    fn balance_of(&self, address: &Address) -> Amount {
        self.state
            .read()
            .accounts
            .get(address)
            .copied()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::Wallet;

    fn funded(ledger: &InMemoryLedger, units: u64) -> Wallet {
        let wallet = Wallet::generate().expect("wallet");
        ledger
            .mint(wallet.address(), Amount::from_units(units))
            .expect("mint");
        wallet
    }

    #[test]
    fn test_authenticate_valid_request() {
        let ledger = InMemoryLedger::new();
        let wallet = Wallet::generate().expect("wallet");
        let request = wallet.sign_request(b"op".to_vec());

        let ctx = ledger.authenticate(&request).expect("authenticate");
        assert_eq!(ctx.sender(), wallet.address());
        assert_eq!(ctx.digest(), &request.payload_digest());
    }

    #[test]
    fn test_authenticate_rejects_forged_sender() {
        let ledger = InMemoryLedger::new();
        let honest = Wallet::generate().expect("wallet");
        let forger = Wallet::generate().expect("wallet");

        let mut request = forger.sign_request(b"op".to_vec());
        request.sender = honest.address().clone();

        let result = ledger.authenticate(&request);
        assert!(matches!(result, Err(LedgerError::InvalidSignature { .. })));
    }

    #[test]
    fn test_authenticate_rejects_tampered_payload() {
        let ledger = InMemoryLedger::new();
        let wallet = Wallet::generate().expect("wallet");
        let mut request = wallet.sign_request(b"pay 1".to_vec());
        request.payload = b"pay 9".to_vec();

        assert!(matches!(
            ledger.authenticate(&request),
            Err(LedgerError::InvalidSignature { .. })
        ));
    }

    #[test]
    fn test_authenticate_rejects_replay() {
        let ledger = InMemoryLedger::new();
        let wallet = Wallet::generate().expect("wallet");
        let request = wallet.sign_request(b"op".to_vec());

        ledger.authenticate(&request).expect("first");
        let replay = ledger.authenticate(&request);
        assert!(matches!(replay, Err(LedgerError::ReplayedNonce { nonce: 1, last: 1, .. })));
    }

    #[test]
    fn test_authenticate_rejects_garbage_signature() {
        let ledger = InMemoryLedger::new();
        let wallet = Wallet::generate().expect("wallet");
        let mut request = wallet.sign_request(b"op".to_vec());
        request.signature = vec![1, 2, 3];

        assert!(ledger.authenticate(&request).is_err());
    }

    #[test]
    fn test_withdraw_and_transfer() {
        let ledger = InMemoryLedger::new();
        let payer = funded(&ledger, 100);
        let payee = Wallet::generate().expect("wallet");

        let ctx = ledger
            .authenticate(&payer.sign_request(b"op".to_vec()))
            .expect("authenticate");
        let balance = ledger.withdraw(&ctx, Amount::from_units(60)).expect("withdraw");
        assert_eq!(balance.value(), Amount::from_units(60));
        assert_eq!(ledger.balance_of(payer.address()), Amount::from_units(40));

        let tx = ledger.transfer(balance, payee.address()).expect("transfer");
        assert_eq!(tx.amount, Amount::from_units(60));
        assert_eq!(ledger.balance_of(payee.address()), Amount::from_units(60));
        assert_eq!(ledger.total_in_accounts(), ledger.total_supply());
    }

    #[test]
    fn test_withdraw_insufficient_leaves_account() {
        let ledger = InMemoryLedger::new();
        let payer = funded(&ledger, 10);
        let ctx = ledger
            .authenticate(&payer.sign_request(b"op".to_vec()))
            .expect("authenticate");

        let result = ledger.withdraw(&ctx, Amount::from_units(11));
        assert!(matches!(result, Err(LedgerError::InsufficientBalance { .. })));
        assert_eq!(ledger.balance_of(payer.address()), Amount::from_units(10));
    }

    #[test]
    fn test_transfer_overflow_hands_balance_back() {
        let ledger = InMemoryLedger::new();
        let rich = funded(&ledger, u64::MAX);
        let payer = funded(&ledger, 5);
        let ctx = ledger
            .authenticate(&payer.sign_request(b"op".to_vec()))
            .expect("authenticate");
        let balance = ledger.withdraw(&ctx, Amount::from_units(5)).expect("withdraw");

        let rejected = ledger
            .transfer(balance, rich.address())
            .expect_err("overflow");
        assert!(matches!(rejected.error, LedgerError::Overflow { .. }));
        assert_eq!(rejected.balance.value(), Amount::from_units(5));
        assert_eq!(ledger.balance_of(rich.address()), Amount::MAX);

        // hand it back to the payer so nothing is burned
        ledger
            .transfer(rejected.balance, payer.address())
            .expect("refund");
        assert_eq!(ledger.balance_of(payer.address()), Amount::from_units(5));
    }

    #[test]
    fn test_transactions_logged() {
        let ledger = InMemoryLedger::new();
        let payer = funded(&ledger, 3);
        let ctx = ledger
            .authenticate(&payer.sign_request(b"op".to_vec()))
            .expect("authenticate");
        let balance = ledger.withdraw(&ctx, Amount::from_units(3)).expect("withdraw");
        ledger.transfer(balance, payer.address()).expect("transfer");

        let kinds: Vec<_> = ledger.transactions().iter().map(|tx| tx.kind).collect();
        assert_eq!(
            kinds,
            vec![TransactionKind::Mint, TransactionKind::Withdraw, TransactionKind::Transfer]
        );
    }

    #[test]
    fn test_foreign_context_cannot_withdraw() {
        let ledger = InMemoryLedger::new();
        let victim = funded(&ledger, 50);
        let rogue = LedgerAuthority::new();
        let ctx = rogue.context(victim.address().clone(), [0u8; 32]);

        let result = ledger.withdraw(&ctx, Amount::from_units(50));
        assert!(matches!(result, Err(LedgerError::ForeignIssuer { .. })));
        assert_eq!(ledger.balance_of(victim.address()), Amount::from_units(50));
    }

    #[test]
    fn test_foreign_balance_is_not_credited() {
        let ledger = InMemoryLedger::new();
        let wallet = Wallet::generate().expect("wallet");
        let rogue = LedgerAuthority::new();

        let rejected = ledger
            .transfer(rogue.issue(Amount::from_units(1_000)), wallet.address())
            .expect_err("foreign");
        assert!(matches!(rejected.error, LedgerError::ForeignIssuer { .. }));
        assert_eq!(ledger.balance_of(wallet.address()), Amount::ZERO);
        assert_eq!(rogue.redeem(rejected.balance).map_err(|(e, _)| e).expect("redeem"), Amount::from_units(1_000));
    }

    #[test]
    fn test_object_ids_unique() {
        let ledger = InMemoryLedger::new();
        let wallet = Wallet::generate().expect("wallet");
        let ctx = ledger
            .authenticate(&wallet.sign_request(b"op".to_vec()))
            .expect("authenticate");
        assert_ne!(ledger.new_object_id(&ctx), ledger.new_object_id(&ctx));
    }
}
