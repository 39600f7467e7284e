//! Signed requests and the authenticated transaction context.

use ed25519_dalek::Signature;
use serde::{Deserialize, Serialize};

use crate::authority::IssuerId;
use crate::error::{LedgerError, Result};
use crate::transaction::TransactionId;
use crate::wallet::Address;

/// Domain separator prepended to every signed message.
const SIGNING_DOMAIN: &[u8] = b"gig-ledger/request/v1";

/// A payload signed by a [`Wallet`](crate::Wallet).
///
/// The signature covers the sender address, the nonce and the payload, so
/// none of them can be swapped without invalidating it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedRequest {
    /// Claimed sender.
    pub sender: Address,
    /// Per-sender sequence number; must strictly increase.
    pub nonce: u64,
    /// Opaque operation payload.
    pub payload: Vec<u8>,
    /// Ed25519 signature bytes.
    pub signature: Vec<u8>,
}

impl SignedRequest {
    /// Bytes that are signed for a given sender, nonce and payload.
    #[must_use]
    pub fn signing_bytes(sender: &Address, nonce: u64, payload: &[u8]) -> Vec<u8> {
        let sender = sender.as_str().as_bytes();
        let mut message = Vec::with_capacity(SIGNING_DOMAIN.len() + sender.len() + 8 + payload.len());
        message.extend_from_slice(SIGNING_DOMAIN);
        message.extend_from_slice(sender);
        message.extend_from_slice(&nonce.to_le_bytes());
        message.extend_from_slice(payload);
        message
    }

    /// BLAKE3 digest of the payload.
    #[must_use]
    pub fn payload_digest(&self) -> [u8; 32] {
        *blake3::hash(&self.payload).as_bytes()
    }

    /// Check the signature against the sender's key. Says nothing about the
    /// nonce; replay protection is the ledger's job.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidAddress`] if the sender is not a key and
    /// [`LedgerError::InvalidSignature`] if the signature does not verify.
    pub fn verify_signature(&self) -> Result<()> {
        let invalid = || LedgerError::InvalidSignature {
            sender: self.sender.to_string(),
        };
        let key = self.sender.verifying_key()?;
        let signature = Signature::from_slice(&self.signature).map_err(|_| invalid())?;
        let message = Self::signing_bytes(&self.sender, self.nonce, &self.payload);
        key.verify_strict(&message, &signature).map_err(|_| invalid())
    }
}

/// Authenticated context for a single operation.
///
/// Only a [`LedgerAuthority`](crate::LedgerAuthority) can construct one, and a
/// ledger only accepts contexts from its own authority. Holding a `TxContext`
/// therefore proves who the sender is. It cannot be duplicated, so one
/// authenticated request yields exactly one context:
///
/// ```compile_fail
/// use gig_ledger::TxContext;
///
/// fn duplicate(ctx: TxContext) -> (TxContext, TxContext) {
///     (ctx.clone(), ctx)
/// }
/// ```
#[derive(Debug)]
pub struct TxContext {
    issuer: IssuerId,
    sender: Address,
    tx_id: TransactionId,
    digest: [u8; 32],
}

impl TxContext {
    pub(crate) fn new(issuer: IssuerId, sender: Address, digest: [u8; 32]) -> Self {
        Self {
            issuer,
            sender,
            tx_id: TransactionId::new(),
            digest,
        }
    }

    pub(crate) const fn issuer(&self) -> IssuerId {
        self.issuer
    }

    /// The authenticated sender.
    #[must_use]
    pub fn sender(&self) -> &Address {
        &self.sender
    }

    /// Identifier of the transaction this context belongs to.
    #[must_use]
    pub fn tx_id(&self) -> &TransactionId {
        &self.tx_id
    }

    /// BLAKE3 digest of the authenticated payload.
    #[must_use]
    pub fn digest(&self) -> &[u8; 32] {
        &self.digest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::Wallet;

    #[test]
    fn test_signing_bytes_bind_all_fields() {
        let wallet = Wallet::generate().expect("wallet");
        let other = Wallet::generate().expect("wallet");
        let base = SignedRequest::signing_bytes(wallet.address(), 1, b"payload");
        assert_ne!(base, SignedRequest::signing_bytes(wallet.address(), 2, b"payload"));
        assert_ne!(base, SignedRequest::signing_bytes(wallet.address(), 1, b"payloaD"));
        assert_ne!(base, SignedRequest::signing_bytes(other.address(), 1, b"payload"));
    }

    #[test]
    fn test_payload_digest_is_blake3() {
        let wallet = Wallet::generate().expect("wallet");
        let request = wallet.sign_request(b"hello".to_vec());
        assert_eq!(request.payload_digest(), *blake3::hash(b"hello").as_bytes());
    }

    #[test]
    fn test_verify_signature() {
        let wallet = Wallet::generate().expect("wallet");
        let mut request = wallet.sign_request(b"pay 1".to_vec());
        assert!(request.verify_signature().is_ok());

        request.nonce += 1;
        assert!(matches!(
            request.verify_signature(),
            Err(LedgerError::InvalidSignature { .. })
        ));
    }

    #[test]
    fn test_request_serialization() {
        let wallet = Wallet::generate().expect("wallet");
        let request = wallet.sign_request(b"{}".to_vec());
        let json = serde_json::to_string(&request).expect("serialize");
        let parsed: SignedRequest = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(request, parsed);
    }
}
