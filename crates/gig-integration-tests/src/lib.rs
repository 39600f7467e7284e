//! Integration test crate for the gig escrow components.
//!
//! This crate exists solely to run integration tests that span the ledger and
//! the escrow engine. It has no public API - all functionality is in the test modules.

#![forbid(unsafe_code)]
