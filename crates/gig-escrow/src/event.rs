//! Gig event log.
//!
//! Every committed operation appends one [`GigEvent`]. Aborted operations
//! append nothing. The log is bounded; the oldest events are dropped first.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use gig_ledger::{Address, Amount, TransactionId};
use serde::{Deserialize, Serialize};

use crate::gig::GigId;

/// What happened to a gig.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GigEventKind {
    /// A gig was created.
    GigCreated {
        /// Advertised price at creation.
        price: Amount,
    },
    /// Value was added to the escrow.
    EscrowFunded {
        /// Amount deposited.
        amount: Amount,
        /// Escrow total after the deposit.
        escrow: Amount,
    },
    /// A freelancer was assigned.
    BidAccepted {
        /// The new freelancer.
        freelancer: Address,
    },
    /// The freelancer delivered.
    WorkSubmitted,
    /// The client opened a dispute.
    DisputeRaised {
        /// Whether work had been delivered.
        work_submitted: bool,
    },
    /// The client resolved a dispute.
    DisputeResolved {
        /// `true` if the freelancer was paid.
        in_favor_of_freelancer: bool,
        /// Who received the escrow.
        recipient: Address,
        /// Amount paid out.
        amount: Amount,
        /// Ledger transaction.
        tx_id: TransactionId,
    },
    /// The client paid the freelancer.
    PaymentReleased {
        /// The paid freelancer.
        recipient: Address,
        /// Amount paid out.
        amount: Amount,
        /// Ledger transaction.
        tx_id: TransactionId,
    },
    /// The assignment was cancelled and the client refunded.
    GigCancelled {
        /// The refunded client.
        recipient: Address,
        /// Amount returned.
        amount: Amount,
        /// Ledger transaction.
        tx_id: TransactionId,
    },
    /// The client took the escrow back.
    RefundIssued {
        /// The refunded client.
        recipient: Address,
        /// Amount returned.
        amount: Amount,
        /// Ledger transaction.
        tx_id: TransactionId,
    },
    /// The description changed.
    DescriptionUpdated {
        /// New description length in bytes.
        len: usize,
    },
    /// The price changed.
    PriceUpdated {
        /// Previous price.
        old: Amount,
        /// New price.
        new: Amount,
    },
}

impl GigEventKind {
    /// Short name of the event, as used in logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::GigCreated { .. } => "gig_created",
            Self::EscrowFunded { .. } => "escrow_funded",
            Self::BidAccepted { .. } => "bid_accepted",
            Self::WorkSubmitted => "work_submitted",
            Self::DisputeRaised { .. } => "dispute_raised",
            Self::DisputeResolved { .. } => "dispute_resolved",
            Self::PaymentReleased { .. } => "payment_released",
            Self::GigCancelled { .. } => "gig_cancelled",
            Self::RefundIssued { .. } => "refund_issued",
            Self::DescriptionUpdated { .. } => "description_updated",
            Self::PriceUpdated { .. } => "price_updated",
        }
    }
}

/// A committed operation on a gig.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GigEvent {
    /// The gig operated on.
    pub gig_id: GigId,
    /// Authenticated sender of the operation.
    pub actor: Address,
    /// Commit time.
    pub timestamp: DateTime<Utc>,
    /// What happened.
    #[serde(flatten)]
    pub kind: GigEventKind,
}

impl GigEvent {
    /// Create an event stamped with the current time.
    #[must_use]
    pub fn new(gig_id: GigId, actor: Address, kind: GigEventKind) -> Self {
        Self {
            gig_id,
            actor,
            timestamp: Utc::now(),
            kind,
        }
    }
}

/// Bounded in-memory event log.
#[derive(Debug)]
pub(crate) struct EventLog {
    events: VecDeque<GigEvent>,
    capacity: usize,
}

impl EventLog {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    pub(crate) fn push(&mut self, event: GigEvent) {
        if self.capacity == 0 {
            return;
        }
        while self.events.len() >= self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    pub(crate) fn all(&self) -> Vec<GigEvent> {
        self.events.iter().cloned().collect()
    }

    pub(crate) fn for_gig(&self, gig_id: GigId) -> Vec<GigEvent> {
        self.events
            .iter()
            .filter(|e| e.gig_id == gig_id)
            .cloned()
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.events.len()
    }
}
