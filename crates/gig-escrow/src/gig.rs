//! The gig record and its transition rules.
//!
//! [`Gig`] owns its escrow [`Balance`] and enforces every authorization and
//! state precondition. All checks run before anything is mutated, so a
//! failed call leaves the gig exactly as it was.

use chrono::{DateTime, Utc};
use gig_ledger::{Address, Amount, Balance, CustodyLedger, ObjectId};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::DescriptionPolicy;
use crate::error::{GigError, Result};
use crate::settlement::{Settlement, SettlementKind};
use crate::state::GigState;

/// Identifier of a gig, issued by the custody ledger at creation.
pub type GigId = ObjectId;

pub(crate) mod op {
    pub const FUND: &str = "fund";
    pub const BID: &str = "bid";
    pub const SUBMIT_WORK: &str = "submit work";
    pub const MARK_COMPLETE: &str = "mark complete";
    pub const RAISE_DISPUTE: &str = "raise dispute";
    pub const RESOLVE_DISPUTE: &str = "resolve dispute";
    pub const RELEASE_PAYMENT: &str = "release payment";
    pub const CANCEL: &str = "cancel";
    pub const REQUEST_REFUND: &str = "request refund";
    pub const UPDATE_DESCRIPTION: &str = "update description";
    pub const UPDATE_PRICE: &str = "update price";
}

/// Who gets the escrow and why, decided before any value moves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Payout {
    pub kind: SettlementKind,
    pub recipient: Address,
}

/// Read-only snapshot of a gig.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GigView {
    /// Gig identifier.
    pub id: GigId,
    /// Funding party.
    pub client: Address,
    /// Assigned freelancer, if any.
    pub freelancer: Option<Address>,
    /// Opaque job description.
    pub description: Vec<u8>,
    /// Advertised price (informational).
    pub price: Amount,
    /// Value currently held in escrow.
    pub escrow: Amount,
    /// Lifecycle state.
    pub state: GigState,
    /// Whether work has been delivered.
    pub work_submitted: bool,
    /// Whether a dispute is open.
    pub disputed: bool,
    /// Most recent settlement since the last bid.
    pub last_settlement: Option<Settlement>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last mutation time.
    pub updated_at: DateTime<Utc>,
}

/// A single escrow engagement between a client and at most one freelancer.
#[derive(Debug)]
pub struct Gig {
    id: GigId,
    client: Address,
    description: Vec<u8>,
    price: Amount,
    escrow: Balance,
    state: GigState,
    last_settlement: Option<Settlement>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Gig {
    /// Create an open, unfunded gig.
    pub(crate) fn new(id: GigId, client: Address, description: Vec<u8>, price: Amount) -> Self {
        let now = Utc::now();
        Self {
            id,
            client,
            description,
            price,
            escrow: Balance::zero(),
            state: GigState::Open,
            last_settlement: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Gig identifier.
    #[must_use]
    pub const fn id(&self) -> GigId {
        self.id
    }

    /// Funding party.
    #[must_use]
    pub const fn client(&self) -> &Address {
        &self.client
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &GigState {
        &self.state
    }

    /// Value held in escrow.
    #[must_use]
    pub const fn escrow_value(&self) -> Amount {
        self.escrow.value()
    }

    /// Snapshot for callers outside the engine.
    #[must_use]
    pub fn view(&self) -> GigView {
        GigView {
            id: self.id,
            client: self.client.clone(),
            freelancer: self.state.freelancer().cloned(),
            description: self.description.clone(),
            price: self.price,
            escrow: self.escrow.value(),
            state: self.state.clone(),
            work_submitted: self.state.work_submitted(),
            disputed: self.state.is_disputed(),
            last_settlement: self.last_settlement.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    fn ensure_client(&self, operation: &'static str, sender: &Address) -> Result<()> {
        if sender == &self.client {
            Ok(())
        } else {
            Err(GigError::unauthorized(operation, sender))
        }
    }

    /// The assigned freelancer, checked against `sender`.
    fn ensure_freelancer(&self, operation: &'static str, sender: &Address) -> Result<()> {
        let freelancer = self
            .state
            .freelancer()
            .ok_or(GigError::NoFreelancerAssigned(self.id))?;
        if sender == freelancer {
            Ok(())
        } else {
            Err(GigError::unauthorized(operation, sender))
        }
    }

    // ==================== Funding ====================

    /// Check that `sender` may add `amount` to the escrow.
    pub(crate) fn check_fund(&self, sender: &Address, amount: Amount) -> Result<()> {
        self.ensure_client(op::FUND, sender)?;
        let current = self.escrow.value();
        if current.checked_add(amount).is_none() {
            return Err(gig_ledger::LedgerError::Overflow {
                current,
                incoming: amount,
            }
            .into());
        }
        Ok(())
    }

    /// Merge a deposit into the escrow. On overflow the deposit is handed back.
    pub(crate) fn deposit(&mut self, deposit: Balance) -> std::result::Result<Amount, (GigError, Balance)> {
        match self.escrow.join(deposit) {
            Ok(total) => {
                self.touch();
                Ok(total)
            }
            Err((err, deposit)) => Err((err.into(), deposit)),
        }
    }

    // ==================== Assignment ====================

    /// Accept `sender` as the freelancer.
    pub(crate) fn bid(&mut self, sender: &Address) -> Result<()> {
        if !self.state.is_open() {
            return Err(GigError::invalid_state(op::BID, &self.state));
        }
        self.state = GigState::Assigned {
            freelancer: sender.clone(),
        };
        self.last_settlement = None;
        self.touch();
        Ok(())
    }

    /// Record delivery by the assigned freelancer. Only valid from `Assigned`.
    pub(crate) fn submit_work(&mut self, sender: &Address) -> Result<()> {
        self.ensure_freelancer(op::SUBMIT_WORK, sender)?;
        let GigState::Assigned { freelancer } = &self.state else {
            return Err(GigError::invalid_state(op::SUBMIT_WORK, &self.state));
        };
        self.state = GigState::Submitted {
            freelancer: freelancer.clone(),
        };
        self.touch();
        Ok(())
    }

    /// Record delivery by the assigned freelancer in any assigned state.
    ///
    /// Returns `true` if the flag changed.
    pub(crate) fn mark_complete(&mut self, sender: &Address) -> Result<bool> {
        self.ensure_freelancer(op::MARK_COMPLETE, sender)?;
        let next = match &self.state {
            GigState::Assigned { freelancer } => GigState::Submitted {
                freelancer: freelancer.clone(),
            },
            GigState::Disputed {
                freelancer,
                work_submitted: false,
            } => GigState::Disputed {
                freelancer: freelancer.clone(),
                work_submitted: true,
            },
            GigState::Submitted { .. } | GigState::Disputed { .. } | GigState::Open => {
                return Ok(false);
            }
        };
        self.state = next;
        self.touch();
        Ok(true)
    }

    /// Open a dispute.
    pub(crate) fn raise_dispute(&mut self, sender: &Address) -> Result<()> {
        self.ensure_client(op::RAISE_DISPUTE, sender)?;
        let next = match &self.state {
            GigState::Open => return Err(GigError::NoFreelancerAssigned(self.id)),
            GigState::Assigned { freelancer } => GigState::Disputed {
                freelancer: freelancer.clone(),
                work_submitted: false,
            },
            GigState::Submitted { freelancer } => GigState::Disputed {
                freelancer: freelancer.clone(),
                work_submitted: true,
            },
            GigState::Disputed { .. } => {
                return Err(GigError::invalid_state(op::RAISE_DISPUTE, &self.state));
            }
        };
        self.state = next;
        self.touch();
        Ok(())
    }

    // ==================== Disbursement checks ====================

    pub(crate) fn check_release(&self, sender: &Address) -> Result<Payout> {
        self.ensure_client(op::RELEASE_PAYMENT, sender)?;
        match &self.state {
            GigState::Submitted { freelancer } => Ok(Payout {
                kind: SettlementKind::Release,
                recipient: freelancer.clone(),
            }),
            other => Err(GigError::invalid_state(op::RELEASE_PAYMENT, other)),
        }
    }

    pub(crate) fn check_refund(&self, sender: &Address) -> Result<Payout> {
        self.ensure_client(op::REQUEST_REFUND, sender)?;
        match &self.state {
            GigState::Open | GigState::Assigned { .. } => Ok(Payout {
                kind: SettlementKind::Refund,
                recipient: self.client.clone(),
            }),
            other => Err(GigError::invalid_state(op::REQUEST_REFUND, other)),
        }
    }

    pub(crate) fn check_cancel(&self, sender: &Address) -> Result<Payout> {
        let is_client = sender == &self.client;
        let Some(freelancer) = self.state.freelancer() else {
            return Err(if is_client {
                GigError::NoFreelancerAssigned(self.id)
            } else {
                GigError::unauthorized(op::CANCEL, sender)
            });
        };
        if !is_client && sender != freelancer {
            return Err(GigError::unauthorized(op::CANCEL, sender));
        }
        match &self.state {
            GigState::Assigned { .. } => Ok(Payout {
                kind: SettlementKind::Cancel,
                recipient: self.client.clone(),
            }),
            other => Err(GigError::invalid_state(op::CANCEL, other)),
        }
    }

    pub(crate) fn check_resolve(&self, sender: &Address, resolved: bool) -> Result<Payout> {
        self.ensure_client(op::RESOLVE_DISPUTE, sender)?;
        match &self.state {
            GigState::Disputed { freelancer, .. } => Ok(Payout {
                kind: SettlementKind::DisputeResolution {
                    in_favor_of_freelancer: resolved,
                },
                recipient: if resolved {
                    freelancer.clone()
                } else {
                    self.client.clone()
                },
            }),
            GigState::Open
                if self
                    .last_settlement
                    .as_ref()
                    .is_some_and(|s| s.kind.is_dispute_resolution()) =>
            {
                Err(GigError::AlreadyResolved(self.id))
            }
            other => Err(GigError::invalid_state(op::RESOLVE_DISPUTE, other)),
        }
    }

    /// Pay the whole escrow out per `payout` and reset to `Open`.
    ///
    /// The state only changes once the ledger has accepted the transfer. If
    /// the ledger refuses, the balance is rejoined and the gig is untouched.
    pub(crate) fn disburse<L: CustodyLedger + ?Sized>(
        &mut self,
        ledger: &L,
        payout: Payout,
    ) -> Result<Settlement> {
        let balance = self.escrow.drain();
        let tx = match ledger.transfer(balance, &payout.recipient) {
            Ok(tx) => tx,
            Err(rejected) => {
                warn!(gig_id = %self.id, error = %rejected.error, "disbursement rejected by ledger");
                if let Err((_, balance)) = self.escrow.join(rejected.balance) {
                    // escrow was drained to zero above, so this cannot overflow
                    self.escrow = balance;
                }
                return Err(rejected.error.into());
            }
        };

        let settlement = Settlement {
            gig_id: self.id,
            kind: payout.kind,
            recipient: payout.recipient,
            amount: tx.amount,
            tx_id: tx.id,
            settled_at: tx.committed_at,
        };
        self.state = GigState::Open;
        self.last_settlement = Some(settlement.clone());
        self.touch();
        Ok(settlement)
    }

    // ==================== Metadata ====================

    pub(crate) fn update_description(
        &mut self,
        sender: &Address,
        description: Vec<u8>,
        policy: DescriptionPolicy,
        max_len: usize,
    ) -> Result<()> {
        self.ensure_client(op::UPDATE_DESCRIPTION, sender)?;
        if policy == DescriptionPolicy::OpenOnly && !self.state.is_open() {
            return Err(GigError::invalid_state(op::UPDATE_DESCRIPTION, &self.state));
        }
        if description.len() > max_len {
            return Err(GigError::DescriptionTooLong {
                len: description.len(),
                max: max_len,
            });
        }
        self.description = description;
        self.touch();
        Ok(())
    }

    pub(crate) fn update_price(&mut self, sender: &Address, price: Amount) -> Result<()> {
        self.ensure_client(op::UPDATE_PRICE, sender)?;
        self.price = price;
        self.touch();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use gig_ledger::{InMemoryLedger, Wallet};
    use test_case::test_case;

    struct Parties {
        ledger: InMemoryLedger,
        client: Wallet,
        freelancer: Wallet,
        stranger: Wallet,
    }

    fn parties() -> Parties {
        Parties {
            ledger: InMemoryLedger::new(),
            client: Wallet::generate().expect("client"),
            freelancer: Wallet::generate().expect("freelancer"),
            stranger: Wallet::generate().expect("stranger"),
        }
    }

    fn open_gig(p: &Parties) -> Gig {
        Gig::new(GigId::new(), p.client.address().clone(), b"logo".to_vec(), Amount::from_units(100))
    }

    fn funded_gig(p: &Parties, units: u64) -> Gig {
        let mut gig = open_gig(p);
        p.ledger
            .mint(p.client.address(), Amount::from_units(units))
            .expect("mint");
        let ctx = p
            .ledger
            .authenticate(&p.client.sign_request(b"fund".to_vec()))
            .expect("auth");
        gig.check_fund(p.client.address(), Amount::from_units(units))
            .expect("check fund");
        let deposit = p.ledger.withdraw(&ctx, Amount::from_units(units)).expect("withdraw");
        gig.deposit(deposit).map_err(|(e, _)| e).expect("deposit");
        gig
    }

    #[derive(Debug, Clone, Copy)]
    enum Stage {
        Open,
        Assigned,
        Submitted,
        DisputedBeforeWork,
        DisputedAfterWork,
    }

    fn gig_at(p: &Parties, stage: Stage) -> Gig {
        let mut gig = funded_gig(p, 50);
        let client = p.client.address();
        let freelancer = p.freelancer.address();
        match stage {
            Stage::Open => {}
            Stage::Assigned => gig.bid(freelancer).expect("bid"),
            Stage::Submitted => {
                gig.bid(freelancer).expect("bid");
                gig.submit_work(freelancer).expect("submit");
            }
            Stage::DisputedBeforeWork => {
                gig.bid(freelancer).expect("bid");
                gig.raise_dispute(client).expect("dispute");
            }
            Stage::DisputedAfterWork => {
                gig.bid(freelancer).expect("bid");
                gig.submit_work(freelancer).expect("submit");
                gig.raise_dispute(client).expect("dispute");
            }
        }
        gig
    }

    #[test]
    fn new_gig_is_open_and_empty() {
        let p = parties();
        let gig = open_gig(&p);
        let view = gig.view();
        assert_eq!(view.state, GigState::Open);
        assert_eq!(view.escrow, Amount::ZERO);
        assert_eq!(&view.client, p.client.address());
        assert!(view.freelancer.is_none());
        assert!(!view.work_submitted);
        assert!(!view.disputed);
    }

    #[test]
    fn fund_requires_client() {
        let p = parties();
        let gig = open_gig(&p);
        let err = gig
            .check_fund(p.stranger.address(), Amount::from_units(1))
            .expect_err("stranger");
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
    }

    #[test]
    fn bid_assigns_sender() {
        let p = parties();
        let mut gig = open_gig(&p);
        gig.bid(p.freelancer.address()).expect("bid");
        assert_eq!(gig.state().freelancer(), Some(p.freelancer.address()));
    }

    #[test_case(Stage::Assigned ; "assigned")]
    #[test_case(Stage::Submitted ; "submitted")]
    #[test_case(Stage::DisputedBeforeWork ; "disputed")]
    fn second_bid_is_invalid_state(stage: Stage) {
        let p = parties();
        let mut gig = gig_at(&p, stage);
        let before = gig.view();
        let err = gig.bid(p.stranger.address()).expect_err("taken");
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert_eq!(gig.view(), before);
    }

    #[test]
    fn submit_work_by_stranger_is_unauthorized() {
        let p = parties();
        let mut gig = gig_at(&p, Stage::Assigned);
        let before = gig.view();
        let err = gig.submit_work(p.stranger.address()).expect_err("stranger");
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        assert_eq!(gig.view(), before);
    }

    #[test]
    fn submit_work_without_freelancer() {
        let p = parties();
        let mut gig = open_gig(&p);
        let err = gig.submit_work(p.freelancer.address()).expect_err("open");
        assert_eq!(err.kind(), ErrorKind::NoFreelancerAssigned);
    }

    #[test]
    fn submit_work_twice_is_invalid_state() {
        let p = parties();
        let mut gig = gig_at(&p, Stage::Submitted);
        let err = gig.submit_work(p.freelancer.address()).expect_err("twice");
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }

    #[test]
    fn mark_complete_sets_flag_in_dispute() {
        let p = parties();
        let mut gig = gig_at(&p, Stage::DisputedBeforeWork);
        assert!(gig.mark_complete(p.freelancer.address()).expect("mark"));
        assert_eq!(
            gig.state(),
            &GigState::Disputed {
                freelancer: p.freelancer.address().clone(),
                work_submitted: true
            }
        );
        assert!(!gig.mark_complete(p.freelancer.address()).expect("again"));
    }

    #[test]
    fn mark_complete_from_assigned() {
        let p = parties();
        let mut gig = gig_at(&p, Stage::Assigned);
        assert!(gig.mark_complete(p.freelancer.address()).expect("mark"));
        assert!(matches!(gig.state(), GigState::Submitted { .. }));
    }

    #[test]
    fn mark_complete_by_client_is_unauthorized() {
        let p = parties();
        let mut gig = gig_at(&p, Stage::Assigned);
        let err = gig.mark_complete(p.client.address()).expect_err("client");
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
    }

    #[test_case(Stage::Open, ErrorKind::NoFreelancerAssigned ; "open")]
    #[test_case(Stage::DisputedBeforeWork, ErrorKind::InvalidState ; "already disputed")]
    fn raise_dispute_rejected(stage: Stage, expected: ErrorKind) {
        let p = parties();
        let mut gig = gig_at(&p, stage);
        let err = gig.raise_dispute(p.client.address()).expect_err("rejected");
        assert_eq!(err.kind(), expected);
    }

    #[derive(Debug, Clone, Copy)]
    enum Call {
        Fund(u64),
        RaiseDispute,
        Release,
        Refund,
        Resolve,
    }

    #[test_case(Stage::Open, Call::RaiseDispute ; "dispute with no freelancer")]
    #[test_case(Stage::Open, Call::Fund(0) ; "empty fund")]
    #[test_case(Stage::Open, Call::Release ; "release with no work")]
    #[test_case(Stage::Submitted, Call::Refund ; "refund after delivery")]
    #[test_case(Stage::Assigned, Call::Resolve ; "resolve with no dispute")]
    fn stranger_is_unauthorized_before_any_other_check(stage: Stage, call: Call) {
        let p = parties();
        let mut gig = gig_at(&p, stage);
        let before = gig.view();
        let stranger = p.stranger.address();

        let err = match call {
            Call::Fund(units) => gig.check_fund(stranger, Amount::from_units(units)),
            Call::RaiseDispute => gig.raise_dispute(stranger),
            Call::Release => gig.check_release(stranger).map(|_| ()),
            Call::Refund => gig.check_refund(stranger).map(|_| ()),
            Call::Resolve => gig.check_resolve(stranger, true).map(|_| ()),
        }
        .expect_err("stranger");

        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        assert_eq!(gig.view(), before);
    }

    #[test]
    fn stranger_resolving_after_resolution_is_unauthorized() {
        let p = parties();
        let mut gig = gig_at(&p, Stage::DisputedAfterWork);
        let payout = gig.check_resolve(p.client.address(), true).expect("resolve");
        gig.disburse(&p.ledger, payout).expect("disburse");

        let err = gig
            .check_resolve(p.stranger.address(), true)
            .expect_err("stranger");
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        let err = gig
            .check_resolve(p.client.address(), true)
            .expect_err("client");
        assert_eq!(err.kind(), ErrorKind::AlreadyResolved);
    }

    #[test]
    fn raise_dispute_by_freelancer_is_unauthorized() {
        let p = parties();
        let mut gig = gig_at(&p, Stage::Submitted);
        let err = gig.raise_dispute(p.freelancer.address()).expect_err("freelancer");
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
    }

    #[test]
    fn raise_dispute_remembers_delivery() {
        let p = parties();
        let gig = gig_at(&p, Stage::DisputedAfterWork);
        assert!(gig.state().work_submitted());
        assert!(gig.state().is_disputed());
    }

    #[test_case(Stage::Open ; "open")]
    #[test_case(Stage::Assigned ; "assigned")]
    #[test_case(Stage::DisputedAfterWork ; "disputed")]
    fn release_requires_submitted(stage: Stage) {
        let p = parties();
        let gig = gig_at(&p, stage);
        let err = gig.check_release(p.client.address()).expect_err("not submitted");
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }

    #[test]
    fn release_pays_freelancer_and_resets() {
        let p = parties();
        let mut gig = gig_at(&p, Stage::Submitted);
        let payout = gig.check_release(p.client.address()).expect("release");
        let settlement = gig.disburse(&p.ledger, payout).expect("disburse");

        assert_eq!(settlement.amount, Amount::from_units(50));
        assert_eq!(&settlement.recipient, p.freelancer.address());
        assert_eq!(gig.escrow_value(), Amount::ZERO);
        assert_eq!(gig.state(), &GigState::Open);
        assert_eq!(p.ledger.balance_of(p.freelancer.address()), Amount::from_units(50));
    }

    #[test_case(Stage::Open, true ; "open")]
    #[test_case(Stage::Assigned, true ; "assigned")]
    #[test_case(Stage::Submitted, false ; "submitted")]
    #[test_case(Stage::DisputedBeforeWork, false ; "disputed before work")]
    #[test_case(Stage::DisputedAfterWork, false ; "disputed after work")]
    fn refund_allowed(stage: Stage, allowed: bool) {
        let p = parties();
        let gig = gig_at(&p, stage);
        assert_eq!(gig.check_refund(p.client.address()).is_ok(), allowed);
    }

    #[test_case(Stage::Assigned, true ; "assigned")]
    #[test_case(Stage::Submitted, false ; "submitted")]
    #[test_case(Stage::DisputedBeforeWork, false ; "disputed")]
    fn cancel_allowed(stage: Stage, allowed: bool) {
        let p = parties();
        let gig = gig_at(&p, stage);
        assert_eq!(gig.check_cancel(p.client.address()).is_ok(), allowed);
        assert_eq!(gig.check_cancel(p.freelancer.address()).is_ok(), allowed);
    }

    #[test]
    fn cancel_by_stranger_is_unauthorized() {
        let p = parties();
        let gig = gig_at(&p, Stage::Assigned);
        let err = gig.check_cancel(p.stranger.address()).expect_err("stranger");
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
    }

    #[test]
    fn cancel_open_gig() {
        let p = parties();
        let gig = gig_at(&p, Stage::Open);
        assert_eq!(
            gig.check_cancel(p.client.address()).expect_err("open").kind(),
            ErrorKind::NoFreelancerAssigned
        );
        assert_eq!(
            gig.check_cancel(p.stranger.address()).expect_err("open").kind(),
            ErrorKind::Unauthorized
        );
    }

    #[test]
    fn cancel_pays_client() {
        let p = parties();
        let gig = gig_at(&p, Stage::Assigned);
        let payout = gig.check_cancel(p.freelancer.address()).expect("cancel");
        assert_eq!(&payout.recipient, p.client.address());
        assert_eq!(payout.kind, SettlementKind::Cancel);
    }

    #[test_case(true ; "for freelancer")]
    #[test_case(false ; "for client")]
    fn resolve_picks_recipient(resolved: bool) {
        let p = parties();
        let gig = gig_at(&p, Stage::DisputedBeforeWork);
        let payout = gig.check_resolve(p.client.address(), resolved).expect("resolve");
        let expected = if resolved { p.freelancer.address() } else { p.client.address() };
        assert_eq!(&payout.recipient, expected);
    }

    #[test]
    fn resolve_twice_is_already_resolved() {
        let p = parties();
        let mut gig = gig_at(&p, Stage::DisputedAfterWork);
        let payout = gig.check_resolve(p.client.address(), false).expect("resolve");
        gig.disburse(&p.ledger, payout).expect("disburse");

        let err = gig.check_resolve(p.client.address(), false).expect_err("twice");
        assert_eq!(err.kind(), ErrorKind::AlreadyResolved);
    }

    #[test]
    fn resolve_without_dispute_is_invalid_state() {
        let p = parties();
        let gig = gig_at(&p, Stage::Submitted);
        let err = gig.check_resolve(p.client.address(), true).expect_err("no dispute");
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }

    #[test]
    fn bid_after_resolution_clears_already_resolved() {
        let p = parties();
        let mut gig = gig_at(&p, Stage::DisputedBeforeWork);
        let payout = gig.check_resolve(p.client.address(), true).expect("resolve");
        gig.disburse(&p.ledger, payout).expect("disburse");
        gig.bid(p.stranger.address()).expect("rebid");

        let err = gig.check_resolve(p.client.address(), true).expect_err("no dispute");
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }

    #[test]
    fn description_policy_open_only() {
        let p = parties();
        let mut gig = gig_at(&p, Stage::Assigned);
        let err = gig
            .update_description(p.client.address(), b"new".to_vec(), DescriptionPolicy::OpenOnly, 64)
            .expect_err("in flight");
        assert_eq!(err.kind(), ErrorKind::InvalidState);

        gig.update_description(p.client.address(), b"new".to_vec(), DescriptionPolicy::Anytime, 64)
            .expect("anytime");
        assert_eq!(gig.view().description, b"new".to_vec());
    }

    #[test]
    fn description_too_long() {
        let p = parties();
        let mut gig = open_gig(&p);
        let err = gig
            .update_description(p.client.address(), vec![0; 65], DescriptionPolicy::Anytime, 64)
            .expect_err("too long");
        assert!(matches!(err, GigError::DescriptionTooLong { len: 65, max: 64 }));
    }

    #[test]
    fn price_update_any_state_client_only() {
        let p = parties();
        let mut gig = gig_at(&p, Stage::DisputedAfterWork);
        gig.update_price(p.client.address(), Amount::from_units(7)).expect("price");
        assert_eq!(gig.view().price, Amount::from_units(7));

        let err = gig
            .update_price(p.freelancer.address(), Amount::from_units(1))
            .expect_err("freelancer");
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
    }
}
