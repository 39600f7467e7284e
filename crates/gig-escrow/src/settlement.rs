//! Settlement records.
//!
//! Every disbursing operation (release, refund, cancel, dispute resolution)
//! pays the *entire* escrow to exactly one recipient and leaves a
//! [`Settlement`] behind on the gig.

use chrono::{DateTime, Utc};
use gig_ledger::{Address, Amount, TransactionId};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::gig::GigId;

/// Which operation settled the escrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementKind {
    /// Client released payment for submitted work.
    Release,
    /// Client took the escrow back before work was submitted.
    Refund,
    /// Client or freelancer cancelled the assignment.
    Cancel,
    /// Client resolved a dispute.
    DisputeResolution {
        /// `true` pays the freelancer, `false` refunds the client.
        in_favor_of_freelancer: bool,
    },
}

impl SettlementKind {
    /// Whether this settlement closed a dispute.
    #[must_use]
    pub const fn is_dispute_resolution(&self) -> bool {
        matches!(self, Self::DisputeResolution { .. })
    }
}

impl fmt::Display for SettlementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Release => write!(f, "release"),
            Self::Refund => write!(f, "refund"),
            Self::Cancel => write!(f, "cancel"),
            Self::DisputeResolution {
                in_favor_of_freelancer: true,
            } => write!(f, "dispute resolved for freelancer"),
            Self::DisputeResolution {
                in_favor_of_freelancer: false,
            } => write!(f, "dispute resolved for client"),
        }
    }
}

/// The outcome of a disbursing operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    /// The settled gig.
    pub gig_id: GigId,
    /// What settled it.
    pub kind: SettlementKind,
    /// Who received the escrow.
    pub recipient: Address,
    /// How much was paid out (the full escrow).
    pub amount: Amount,
    /// Ledger transaction that moved the value.
    pub tx_id: TransactionId,
    /// When the settlement committed.
    pub settled_at: DateTime<Utc>,
}
