//! # gig-escrow
//!
//! Escrow between a client who funds a job and a freelancer who performs it.
//!
//! This crate provides:
//!
//! - [`GigEngine`], a keyed store of gigs driven by signed commands
//! - [`GigState`], the lifecycle as a tagged union (`Open`, `Assigned`,
//!   `Submitted`, `Disputed`)
//! - [`Settlement`] records for the four disbursing operations
//! - [`GigCommand`] dispatch of signed JSON requests
//! - a bounded [`GigEvent`] log
//! - [`EngineConfig`] loaded from TOML
//!
//! Value never leaves the custody ledger's control: escrow is a
//! [`gig_ledger::Balance`] that can only be joined, drained or handed to the
//! ledger.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use gig_escrow::{CommandOutcome, GigCommand, GigEngine, GigState};
//! use gig_ledger::{Amount, CustodyLedger, InMemoryLedger, Wallet};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = GigEngine::new(Arc::new(InMemoryLedger::new()));
//! let client = Wallet::generate()?;
//! let freelancer = Wallet::generate()?;
//! engine.ledger().mint(client.address(), Amount::from_units(100))?;
//!
//! let create = GigCommand::CreateFunded {
//!     description: b"logo".to_vec(),
//!     price: Amount::from_units(100),
//!     deposit: Amount::from_units(100),
//! };
//! let CommandOutcome::Created(id) = engine.execute(&create.sign(&client)?)? else {
//!     unreachable!()
//! };
//! engine.execute(&GigCommand::Bid { gig_id: id }.sign(&freelancer)?)?;
//! engine.execute(&GigCommand::SubmitWork { gig_id: id }.sign(&freelancer)?)?;
//! engine.execute(&GigCommand::ReleasePayment { gig_id: id }.sign(&client)?)?;
//!
//! assert_eq!(engine.ledger().balance_of(freelancer.address()), Amount::from_units(100));
//! assert_eq!(engine.get(id)?.state, GigState::Open);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod command;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod gig;
pub mod settlement;
pub mod state;

pub use command::{CommandOutcome, GigCommand};
pub use config::{DescriptionPolicy, EngineConfig};
pub use engine::GigEngine;
pub use error::{ErrorKind, GigError, Result};
pub use event::{GigEvent, GigEventKind};
pub use gig::{Gig, GigId, GigView};
pub use settlement::{Settlement, SettlementKind};
pub use state::GigState;
