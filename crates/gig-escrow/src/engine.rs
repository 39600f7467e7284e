//! The gig escrow engine.
//!
//! [`GigEngine`] is a keyed store of gigs. Any caller who knows a [`GigId`]
//! may submit any operation on it; authorization happens inside each
//! operation against the authenticated sender of the [`TxContext`].
//!
//! Mutations enter only through [`GigEngine::execute`], which runs exactly
//! the command the sender signed. The per-operation methods here are
//! crate-private so a context authenticated for one command can never be
//! spent on another.

use std::collections::HashMap;
use std::sync::Arc;

use gig_ledger::{Address, Amount, Balance, CustodyLedger, LedgerError, SignedRequest, TxContext};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, error, info};

use crate::config::EngineConfig;
use crate::error::{GigError, Result};
use crate::event::{EventLog, GigEvent, GigEventKind};
use crate::gig::{Gig, GigId, GigView, Payout};
use crate::settlement::{Settlement, SettlementKind};

/// Escrow engine over a custody ledger.
///
/// Gigs live behind their own mutex; the map lock is only held to look a
/// gig up or insert one. Operations on different gigs never contend, and
/// operations on one gig run one at a time from check to commit.
#[derive(Debug)]
pub struct GigEngine<L: CustodyLedger> {
    ledger: Arc<L>,
    config: EngineConfig,
    gigs: RwLock<HashMap<GigId, Arc<Mutex<Gig>>>>,
    events: Mutex<EventLog>,
}

impl<L: CustodyLedger> GigEngine<L> {
    /// Create an engine with the default configuration.
    #[must_use]
    pub fn new(ledger: Arc<L>) -> Self {
        let config = EngineConfig::default();
        let events = Mutex::new(EventLog::with_capacity(config.event_log_capacity));
        Self {
            ledger,
            config,
            gigs: RwLock::new(HashMap::new()),
            events,
        }
    }

    /// Create an engine with a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`GigError::Config`] if the configuration is invalid.
    pub fn with_config(ledger: Arc<L>, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let events = Mutex::new(EventLog::with_capacity(config.event_log_capacity));
        Ok(Self {
            ledger,
            config,
            gigs: RwLock::new(HashMap::new()),
            events,
        })
    }

    /// The underlying custody ledger.
    pub fn ledger(&self) -> &Arc<L> {
        &self.ledger
    }

    /// Active configuration.
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Authenticate a signed request with the ledger.
    pub(crate) fn authenticate(&self, request: &SignedRequest) -> Result<TxContext> {
        Ok(self.ledger.authenticate(request)?)
    }

    fn gig(&self, id: GigId) -> Result<Arc<Mutex<Gig>>> {
        self.gigs
            .read()
            .get(&id)
            .cloned()
            .ok_or(GigError::GigNotFound(id))
    }

    fn emit(&self, gig_id: GigId, actor: &Address, kind: GigEventKind) {
        self.events
            .lock()
            .push(GigEvent::new(gig_id, actor.clone(), kind));
    }

    fn check_description(&self, description: &[u8]) -> Result<()> {
        if description.len() > self.config.max_description_len {
            return Err(GigError::DescriptionTooLong {
                len: description.len(),
                max: self.config.max_description_len,
            });
        }
        Ok(())
    }

    fn insert(&self, gig: Gig) {
        self.gigs.write().insert(gig.id(), Arc::new(Mutex::new(gig)));
    }

    // ==================== Creation and funding ====================

    /// Create an open, unfunded gig owned by the sender.
    ///
    /// # Errors
    ///
    /// Returns [`GigError::DescriptionTooLong`] if the description exceeds
    /// the configured maximum.
    pub(crate) fn create(
        &self,
        ctx: &TxContext,
        description: impl Into<Vec<u8>>,
        price: Amount,
    ) -> Result<GigId> {
        let description = description.into();
        self.check_description(&description)?;

        let id = self.ledger.new_object_id(ctx);
        let client = ctx.sender().clone();
        self.insert(Gig::new(id, client.clone(), description, price));
        self.emit(id, &client, GigEventKind::GigCreated { price });

        info!(gig_id = %id, client = %client, price = %price, "created gig");
        Ok(id)
    }

    /// Create a gig and fund it with `deposit` in one operation.
    ///
    /// # Errors
    ///
    /// Fails without creating anything if the description is too long or the
    /// sender cannot cover the deposit.
    pub(crate) fn create_funded(
        &self,
        ctx: &TxContext,
        description: impl Into<Vec<u8>>,
        price: Amount,
        deposit: Amount,
    ) -> Result<GigId> {
        let description = description.into();
        self.check_description(&description)?;
        ensure_positive(deposit)?;

        let funds = self.ledger.withdraw(ctx, deposit)?;
        let id = self.ledger.new_object_id(ctx);
        let client = ctx.sender().clone();
        let mut gig = Gig::new(id, client.clone(), description, price);
        let escrow = match gig.deposit(funds) {
            Ok(total) => total,
            Err((err, funds)) => {
                self.return_deposit(funds, &client);
                return Err(err);
            }
        };
        self.insert(gig);

        self.emit(id, &client, GigEventKind::GigCreated { price });
        self.emit(
            id,
            &client,
            GigEventKind::EscrowFunded {
                amount: deposit,
                escrow,
            },
        );

        info!(gig_id = %id, client = %client, price = %price, escrow = %escrow, "created funded gig");
        Ok(id)
    }

    /// Move `amount` from the client's account into the gig's escrow.
    ///
    /// # Errors
    ///
    /// Returns [`GigError::Unauthorized`] unless the sender is the client,
    /// and a ledger error if the account cannot cover the amount.
    pub(crate) fn fund(&self, ctx: &TxContext, id: GigId, amount: Amount) -> Result<GigView> {
        let gig = self.gig(id)?;
        let mut gig = gig.lock();
        let sender = ctx.sender();

        gig.check_fund(sender, amount)?;
        ensure_positive(amount)?;
        let funds = self.ledger.withdraw(ctx, amount)?;
        let escrow = match gig.deposit(funds) {
            Ok(total) => total,
            Err((err, funds)) => {
                self.return_deposit(funds, sender);
                return Err(err);
            }
        };

        self.emit(id, sender, GigEventKind::EscrowFunded { amount, escrow });
        info!(gig_id = %id, amount = %amount, escrow = %escrow, "funded escrow");
        Ok(gig.view())
    }

    /// Hand a deposit that could not be merged back to its owner.
    fn return_deposit(&self, funds: Balance, owner: &Address) {
        if let Err(rejected) = self.ledger.transfer(funds, owner) {
            error!(owner = %owner, error = %rejected.error, "could not return deposit");
        }
    }

    // ==================== Assignment ====================

    /// Assign the sender as the gig's freelancer.
    ///
    /// # Errors
    ///
    /// Returns [`GigError::InvalidState`] unless the gig is open.
    pub(crate) fn bid(&self, ctx: &TxContext, id: GigId) -> Result<GigView> {
        let gig = self.gig(id)?;
        let mut gig = gig.lock();
        let sender = ctx.sender();

        gig.bid(sender)?;

        self.emit(
            id,
            sender,
            GigEventKind::BidAccepted {
                freelancer: sender.clone(),
            },
        );
        info!(gig_id = %id, freelancer = %sender, "accepted bid");
        Ok(gig.view())
    }

    /// Record delivery of the work.
    ///
    /// # Errors
    ///
    /// Returns [`GigError::NoFreelancerAssigned`], [`GigError::Unauthorized`]
    /// for anyone but the freelancer, or [`GigError::InvalidState`] unless the
    /// gig is assigned.
    pub(crate) fn submit_work(&self, ctx: &TxContext, id: GigId) -> Result<GigView> {
        let gig = self.gig(id)?;
        let mut gig = gig.lock();
        let sender = ctx.sender();

        gig.submit_work(sender)?;

        self.emit(id, sender, GigEventKind::WorkSubmitted);
        info!(gig_id = %id, freelancer = %sender, "work submitted");
        Ok(gig.view())
    }

    /// Record delivery in any assigned state, including during a dispute.
    ///
    /// Marking an already delivered gig is a no-op and emits no event.
    ///
    /// # Errors
    ///
    /// Returns [`GigError::NoFreelancerAssigned`] or [`GigError::Unauthorized`].
    pub(crate) fn mark_complete(&self, ctx: &TxContext, id: GigId) -> Result<GigView> {
        let gig = self.gig(id)?;
        let mut gig = gig.lock();
        let sender = ctx.sender();

        if gig.mark_complete(sender)? {
            self.emit(id, sender, GigEventKind::WorkSubmitted);
            info!(gig_id = %id, freelancer = %sender, state = %gig.state(), "marked complete");
        } else {
            debug!(gig_id = %id, "already marked complete");
        }
        Ok(gig.view())
    }

    /// Open a dispute.
    ///
    /// # Errors
    ///
    /// Returns [`GigError::Unauthorized`] unless the sender is the client,
    /// [`GigError::NoFreelancerAssigned`] on an open gig, or
    /// [`GigError::InvalidState`] if a dispute is already open.
    pub(crate) fn raise_dispute(&self, ctx: &TxContext, id: GigId) -> Result<GigView> {
        let gig = self.gig(id)?;
        let mut gig = gig.lock();
        let sender = ctx.sender();

        gig.raise_dispute(sender)?;

        let work_submitted = gig.state().work_submitted();
        self.emit(id, sender, GigEventKind::DisputeRaised { work_submitted });
        info!(gig_id = %id, work_submitted, "dispute raised");
        Ok(gig.view())
    }

    // ==================== Disbursement ====================

    /// Settle a dispute: pay the freelancer if `resolved`, else refund the client.
    ///
    /// # Errors
    ///
    /// Returns [`GigError::AlreadyResolved`] right after a resolution and
    /// [`GigError::InvalidState`] when no dispute is open.
    pub(crate) fn resolve_dispute(&self, ctx: &TxContext, id: GigId, resolved: bool) -> Result<Settlement> {
        self.settle(ctx, id, |gig, sender| gig.check_resolve(sender, resolved))
    }

    /// Pay the freelancer for submitted work.
    ///
    /// # Errors
    ///
    /// Returns [`GigError::InvalidState`] unless work is submitted and undisputed.
    pub(crate) fn release_payment(&self, ctx: &TxContext, id: GigId) -> Result<Settlement> {
        self.settle(ctx, id, Gig::check_release)
    }

    /// Cancel the assignment and refund the client.
    ///
    /// Succeeds with a zero-value settlement if the escrow is empty.
    ///
    /// # Errors
    ///
    /// Returns [`GigError::InvalidState`] unless the gig is assigned with no
    /// work submitted and no dispute.
    pub(crate) fn cancel(&self, ctx: &TxContext, id: GigId) -> Result<Settlement> {
        self.settle(ctx, id, Gig::check_cancel)
    }

    /// Return the escrow to the client before any work is delivered.
    ///
    /// # Errors
    ///
    /// Returns [`GigError::InvalidState`] once work is submitted or disputed.
    pub(crate) fn request_refund(&self, ctx: &TxContext, id: GigId) -> Result<Settlement> {
        self.settle(ctx, id, Gig::check_refund)
    }

    fn settle(
        &self,
        ctx: &TxContext,
        id: GigId,
        check: impl FnOnce(&Gig, &Address) -> Result<Payout>,
    ) -> Result<Settlement> {
        let gig = self.gig(id)?;
        let mut gig = gig.lock();
        let sender = ctx.sender();

        let payout = check(&*gig, sender)?;
        let settlement = gig.disburse(self.ledger.as_ref(), payout)?;

        self.emit(id, sender, settlement_event(&settlement));
        info!(
            gig_id = %id,
            kind = %settlement.kind,
            recipient = %settlement.recipient,
            amount = %settlement.amount,
            tx_id = %settlement.tx_id,
            "escrow settled"
        );
        Ok(settlement)
    }

    // ==================== Metadata ====================

    /// Replace the description.
    ///
    /// # Errors
    ///
    /// Returns [`GigError::Unauthorized`] unless the sender is the client,
    /// [`GigError::InvalidState`] if the policy forbids changes in the current
    /// state, or [`GigError::DescriptionTooLong`].
    pub(crate) fn update_description(
        &self,
        ctx: &TxContext,
        id: GigId,
        description: impl Into<Vec<u8>>,
    ) -> Result<GigView> {
        let gig = self.gig(id)?;
        let mut gig = gig.lock();
        let sender = ctx.sender();
        let description = description.into();
        let len = description.len();

        gig.update_description(
            sender,
            description,
            self.config.description_policy,
            self.config.max_description_len,
        )?;

        self.emit(id, sender, GigEventKind::DescriptionUpdated { len });
        info!(gig_id = %id, len, "description updated");
        Ok(gig.view())
    }

    /// Replace the advertised price. Never touches the escrow.
    ///
    /// # Errors
    ///
    /// Returns [`GigError::Unauthorized`] unless the sender is the client.
    pub(crate) fn update_price(&self, ctx: &TxContext, id: GigId, price: Amount) -> Result<GigView> {
        let gig = self.gig(id)?;
        let mut gig = gig.lock();
        let sender = ctx.sender();
        let old = gig.view().price;

        gig.update_price(sender, price)?;

        self.emit(id, sender, GigEventKind::PriceUpdated { old, new: price });
        info!(gig_id = %id, old = %old, new = %price, "price updated");
        Ok(gig.view())
    }

    // ==================== Queries ====================

    /// Snapshot of one gig.
    ///
    /// # Errors
    ///
    /// Returns [`GigError::GigNotFound`] for an unknown id.
    pub fn get(&self, id: GigId) -> Result<GigView> {
        debug!(gig_id = %id, "get gig");
        Ok(self.gig(id)?.lock().view())
    }

    /// Value held in a gig's escrow.
    ///
    /// # Errors
    ///
    /// Returns [`GigError::GigNotFound`] for an unknown id.
    pub fn escrow_value(&self, id: GigId) -> Result<Amount> {
        Ok(self.gig(id)?.lock().escrow_value())
    }

    /// Snapshots of all gigs.
    pub fn list(&self) -> Vec<GigView> {
        self.filtered(|_| true)
    }

    /// Gigs owned by `client`.
    pub fn list_by_client(&self, client: &Address) -> Vec<GigView> {
        self.filtered(|gig| gig.client() == client)
    }

    /// Gigs currently assigned to `freelancer`.
    pub fn list_by_freelancer(&self, freelancer: &Address) -> Vec<GigView> {
        self.filtered(|gig| gig.state().freelancer() == Some(freelancer))
    }

    fn filtered(&self, keep: impl Fn(&Gig) -> bool) -> Vec<GigView> {
        let handles: Vec<_> = self.gigs.read().values().cloned().collect();
        let mut views: Vec<GigView> = handles
            .iter()
            .filter_map(|handle| {
                let gig = handle.lock();
                keep(&*gig).then(|| gig.view())
            })
            .collect();
        views.sort_by_key(|v| v.created_at);
        views
    }

    /// Sum of all escrow balances.
    pub fn total_escrow(&self) -> Amount {
        let handles: Vec<_> = self.gigs.read().values().cloned().collect();
        handles
            .iter()
            .fold(Amount::ZERO, |acc, h| acc.saturating_add(h.lock().escrow_value()))
    }

    /// All retained events, oldest first.
    pub fn events(&self) -> Vec<GigEvent> {
        self.events.lock().all()
    }

    /// Retained events for one gig, oldest first.
    pub fn events_for(&self, id: GigId) -> Vec<GigEvent> {
        self.events.lock().for_gig(id)
    }

    /// Number of gigs.
    pub fn len(&self) -> usize {
        self.gigs.read().len()
    }

    /// Whether no gig has been created.
    pub fn is_empty(&self) -> bool {
        self.gigs.read().is_empty()
    }
}

fn ensure_positive(amount: Amount) -> Result<()> {
    if amount.is_zero() {
        return Err(LedgerError::invalid_amount("deposit must be greater than zero").into());
    }
    Ok(())
}

fn settlement_event(settlement: &Settlement) -> GigEventKind {
    let recipient = settlement.recipient.clone();
    let amount = settlement.amount;
    let tx_id = settlement.tx_id.clone();
    match settlement.kind {
        SettlementKind::Release => GigEventKind::PaymentReleased {
            recipient,
            amount,
            tx_id,
        },
        SettlementKind::Refund => GigEventKind::RefundIssued {
            recipient,
            amount,
            tx_id,
        },
        SettlementKind::Cancel => GigEventKind::GigCancelled {
            recipient,
            amount,
            tx_id,
        },
        SettlementKind::DisputeResolution {
            in_favor_of_freelancer,
        } => GigEventKind::DisputeResolved {
            in_favor_of_freelancer,
            recipient,
            amount,
            tx_id,
        },
    }
}
