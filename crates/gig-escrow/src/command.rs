//! Signed command dispatch.
//!
//! A [`GigCommand`] travels as the JSON payload of a [`SignedRequest`].
//! [`GigEngine::execute`] authenticates the request first, then decodes and
//! dispatches the command, so a malformed payload still consumes the nonce
//! but never touches a gig.

use gig_ledger::{Amount, CustodyLedger, SignedRequest, Wallet};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::GigEngine;
use crate::error::Result;
use crate::gig::{GigId, GigView};
use crate::settlement::Settlement;

/// A mutating gig operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum GigCommand {
    /// Create an unfunded gig.
    Create {
        /// Job description.
        description: Vec<u8>,
        /// Advertised price.
        price: Amount,
    },
    /// Create a gig and fund it in one step.
    CreateFunded {
        /// Job description.
        description: Vec<u8>,
        /// Advertised price.
        price: Amount,
        /// Initial escrow deposit.
        deposit: Amount,
    },
    /// Add value to the escrow.
    Fund {
        /// Target gig.
        gig_id: GigId,
        /// Amount to deposit.
        amount: Amount,
    },
    /// Take the freelancer slot.
    Bid {
        /// Target gig.
        gig_id: GigId,
    },
    /// Deliver the work.
    SubmitWork {
        /// Target gig.
        gig_id: GigId,
    },
    /// Mark the work delivered, also during a dispute.
    MarkComplete {
        /// Target gig.
        gig_id: GigId,
    },
    /// Open a dispute.
    RaiseDispute {
        /// Target gig.
        gig_id: GigId,
    },
    /// Settle a dispute.
    ResolveDispute {
        /// Target gig.
        gig_id: GigId,
        /// `true` pays the freelancer, `false` refunds the client.
        resolved: bool,
    },
    /// Pay the freelancer.
    ReleasePayment {
        /// Target gig.
        gig_id: GigId,
    },
    /// Cancel the assignment.
    Cancel {
        /// Target gig.
        gig_id: GigId,
    },
    /// Take the escrow back.
    RequestRefund {
        /// Target gig.
        gig_id: GigId,
    },
    /// Replace the description.
    UpdateDescription {
        /// Target gig.
        gig_id: GigId,
        /// New description.
        description: Vec<u8>,
    },
    /// Replace the price.
    UpdatePrice {
        /// Target gig.
        gig_id: GigId,
        /// New price.
        price: Amount,
    },
}

impl GigCommand {
    /// Encode as a request payload.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_payload(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decode from a request payload.
    ///
    /// # Errors
    ///
    /// Returns [`GigError::InvalidCommand`](crate::GigError::InvalidCommand)
    /// for malformed JSON or an unknown operation.
    pub fn from_payload(payload: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(payload)?)
    }

    /// Encode and sign with the wallet's next nonce.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn sign(&self, wallet: &Wallet) -> Result<SignedRequest> {
        Ok(wallet.sign_request(self.to_payload()?))
    }

    /// Operation name, as used in logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::CreateFunded { .. } => "create_funded",
            Self::Fund { .. } => "fund",
            Self::Bid { .. } => "bid",
            Self::SubmitWork { .. } => "submit_work",
            Self::MarkComplete { .. } => "mark_complete",
            Self::RaiseDispute { .. } => "raise_dispute",
            Self::ResolveDispute { .. } => "resolve_dispute",
            Self::ReleasePayment { .. } => "release_payment",
            Self::Cancel { .. } => "cancel",
            Self::RequestRefund { .. } => "request_refund",
            Self::UpdateDescription { .. } => "update_description",
            Self::UpdatePrice { .. } => "update_price",
        }
    }
}

/// Result of an executed command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "value", rename_all = "snake_case")]
pub enum CommandOutcome {
    /// A gig was created.
    Created(GigId),
    /// A gig changed without moving escrow out.
    Updated(GigView),
    /// The escrow was paid out.
    Settled(Settlement),
}

impl<L: CustodyLedger> GigEngine<L> {
    /// Authenticate, decode and run a signed command.
    ///
    /// This is the only way to change a gig. The authenticated context lives
    /// for this one call and is spent on the command decoded from the very
    /// payload it was authenticated for; there is no public method that
    /// accepts a context for some other operation:
    ///
    /// ```compile_fail
    /// use std::sync::Arc;
    /// use gig_escrow::{GigEngine, GigId};
    /// use gig_ledger::{CustodyLedger, InMemoryLedger, Wallet};
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let ledger = Arc::new(InMemoryLedger::new());
    /// let engine = GigEngine::new(Arc::clone(&ledger));
    /// let client = Wallet::generate()?;
    /// let ctx = ledger.authenticate(&client.sign_request(b"update price".to_vec()))?;
    /// engine.release_payment(&ctx, GigId::new())?;
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    ///
    /// Returns a ledger error if authentication fails,
    /// [`GigError::InvalidCommand`](crate::GigError::InvalidCommand) for an
    /// undecodable payload, or whatever the dispatched operation returns.
    pub fn execute(&self, request: &SignedRequest) -> Result<CommandOutcome> {
        let ctx = self.authenticate(request)?;
        let command = GigCommand::from_payload(&request.payload)?;
        debug!(sender = %ctx.sender(), tx_id = %ctx.tx_id(), op = command.name(), "executing command");

        let outcome = match command {
            GigCommand::Create { description, price } => {
                CommandOutcome::Created(self.create(&ctx, description, price)?)
            }
            GigCommand::CreateFunded {
                description,
                price,
                deposit,
            } => CommandOutcome::Created(self.create_funded(&ctx, description, price, deposit)?),
            GigCommand::Fund { gig_id, amount } => {
                CommandOutcome::Updated(self.fund(&ctx, gig_id, amount)?)
            }
            GigCommand::Bid { gig_id } => CommandOutcome::Updated(self.bid(&ctx, gig_id)?),
            GigCommand::SubmitWork { gig_id } => {
                CommandOutcome::Updated(self.submit_work(&ctx, gig_id)?)
            }
            GigCommand::MarkComplete { gig_id } => {
                CommandOutcome::Updated(self.mark_complete(&ctx, gig_id)?)
            }
            GigCommand::RaiseDispute { gig_id } => {
                CommandOutcome::Updated(self.raise_dispute(&ctx, gig_id)?)
            }
            GigCommand::ResolveDispute { gig_id, resolved } => {
                CommandOutcome::Settled(self.resolve_dispute(&ctx, gig_id, resolved)?)
            }
            GigCommand::ReleasePayment { gig_id } => {
                CommandOutcome::Settled(self.release_payment(&ctx, gig_id)?)
            }
            GigCommand::Cancel { gig_id } => CommandOutcome::Settled(self.cancel(&ctx, gig_id)?),
            GigCommand::RequestRefund { gig_id } => {
                CommandOutcome::Settled(self.request_refund(&ctx, gig_id)?)
            }
            GigCommand::UpdateDescription {
                gig_id,
                description,
            } => CommandOutcome::Updated(self.update_description(&ctx, gig_id, description)?),
            GigCommand::UpdatePrice { gig_id, price } => {
                CommandOutcome::Updated(self.update_price(&ctx, gig_id, price)?)
            }
        };
        Ok(outcome)
    }
}
