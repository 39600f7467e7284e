//! Gig lifecycle states.
//!
//! The freelancer assignment lives inside the state variants, so a dispute
//! without a freelancer, or submitted work without one, cannot be expressed.
//!
//! ```text
//!            bid                submit_work
//!   Open ─────────▶ Assigned ─────────────▶ Submitted
//!    ▲                 │                        │
//!    │                 └── raise_dispute ──┬────┘
//!    │                                     ▼
//!    │                                 Disputed
//!    │                                     │
//!    └──── release / refund / cancel / resolve_dispute
//! ```

use gig_ledger::Address;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a gig is in its lifecycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum GigState {
    /// Open for bidding; nobody assigned.
    #[default]
    Open,
    /// A freelancer has been assigned and has not delivered yet.
    Assigned {
        /// The assigned freelancer.
        freelancer: Address,
    },
    /// The freelancer has delivered; awaiting release.
    Submitted {
        /// The assigned freelancer.
        freelancer: Address,
    },
    /// The client has opened a dispute.
    Disputed {
        /// The assigned freelancer.
        freelancer: Address,
        /// Whether work had been delivered.
        work_submitted: bool,
    },
}

impl GigState {
    /// The assigned freelancer, if any.
    #[must_use]
    pub const fn freelancer(&self) -> Option<&Address> {
        match self {
            Self::Open => None,
            Self::Assigned { freelancer }
            | Self::Submitted { freelancer }
            | Self::Disputed { freelancer, .. } => Some(freelancer),
        }
    }

    /// Whether the freelancer has delivered.
    #[must_use]
    pub const fn work_submitted(&self) -> bool {
        match self {
            Self::Open | Self::Assigned { .. } => false,
            Self::Submitted { .. } => true,
            Self::Disputed { work_submitted, .. } => *work_submitted,
        }
    }

    /// Whether a dispute is open.
    #[must_use]
    pub const fn is_disputed(&self) -> bool {
        matches!(self, Self::Disputed { .. })
    }

    /// Whether the gig is open for bidding.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }

    /// Canonical lowercase name of the state.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Assigned { .. } => "assigned",
            Self::Submitted { .. } => "submitted",
            Self::Disputed { .. } => "disputed",
        }
    }
}

impl fmt::Display for GigState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
