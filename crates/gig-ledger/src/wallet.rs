//! Identities and keypairs.
//!
//! An [`Address`] is the base58 encoding of an Ed25519 public key, so any
//! address can be turned back into the key that verifies its requests. A
//! [`Wallet`] holds the matching signing key plus a nonce counter and
//! produces [`SignedRequest`]s for a ledger to authenticate.

use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};
use crate::request::SignedRequest;

const KEY_LEN: usize = 32;

fn key_array(bytes: &[u8], what: &str) -> std::result::Result<[u8; KEY_LEN], String> {
    bytes
        .try_into()
        .map_err(|_| format!("{what} must be {KEY_LEN} bytes, got {}", bytes.len()))
}

/// A party identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address(String);

impl Address {
    /// Parse a base58 address.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidAddress`] unless `s` decodes to a valid
    /// Ed25519 public key.
    pub fn from_base58(s: &str) -> Result<Self> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| LedgerError::invalid_address(format!("invalid base58: {e}")))?;
        let address = Self::from_bytes(&bytes)?;
        address.verifying_key()?;
        Ok(address)
    }

    /// Encode raw public key bytes as an address.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidAddress`] for anything but 32 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        key_array(bytes, "address").map_err(LedgerError::invalid_address)?;
        Ok(Self(bs58::encode(bytes).into_string()))
    }

    /// Base58 text of the address.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Raw public key bytes.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        bs58::decode(&self.0).into_vec().unwrap_or_default()
    }

    /// The Ed25519 key that verifies this address's signatures.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidAddress`] if the bytes are not a curve point.
    pub fn verifying_key(&self) -> Result<VerifyingKey> {
        let bytes = key_array(&self.to_bytes(), "address").map_err(LedgerError::invalid_address)?;
        VerifyingKey::from_bytes(&bytes)
            .map_err(|e| LedgerError::invalid_address(format!("not an ed25519 key: {e}")))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// On-disk form of a wallet.
#[derive(Serialize, Deserialize)]
struct Keystore {
    address: Address,
    secret: String,
    next_nonce: u64,
}

/// An Ed25519 keypair with a request nonce counter.
pub struct Wallet {
    signing_key: SigningKey,
    address: Address,
    next_nonce: AtomicU64,
}

impl Wallet {
    /// Generate a fresh keypair from `OsRng`.
    ///
    /// # Errors
    ///
    /// Returns an error if the derived address is malformed.
    pub fn generate() -> Result<Self> {
        let mut secret = [0u8; KEY_LEN];
        OsRng.fill_bytes(&mut secret);
        Self::with_key(SigningKey::from_bytes(&secret), 1)
    }

    /// Rebuild a wallet from its 32-byte secret key.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::WalletError`] for a key of the wrong length.
    pub fn from_secret_key(secret: &[u8]) -> Result<Self> {
        let secret = key_array(secret, "secret key").map_err(LedgerError::wallet_error)?;
        Self::with_key(SigningKey::from_bytes(&secret), 1)
    }

    /// Rebuild a wallet from a base58 secret key.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::WalletError`] if the text is not a valid key.
    pub fn from_base58_secret(secret: &str) -> Result<Self> {
        let bytes = bs58::decode(secret)
            .into_vec()
            .map_err(|e| LedgerError::wallet_error(format!("invalid base58: {e}")))?;
        Self::from_secret_key(&bytes)
    }

    /// Load a keystore written by [`Wallet::save`].
    ///
    /// The nonce counter resumes where it was saved, so requests signed after
    /// a reload are not rejected as replays.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is unreadable, malformed, or its address
    /// does not match its secret.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let keystore: Keystore = serde_json::from_str(&contents)?;
        let wallet = Self::from_base58_secret(&keystore.secret)?;
        if wallet.address != keystore.address {
            return Err(LedgerError::wallet_error(format!(
                "keystore address {} does not match its secret",
                keystore.address
            )));
        }
        wallet.next_nonce.store(keystore.next_nonce.max(1), Ordering::Relaxed);
        Ok(wallet)
    }

    /// Write the keystore as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let keystore = Keystore {
            address: self.address.clone(),
            secret: self.secret_key_base58(),
            next_nonce: self.next_nonce.load(Ordering::Relaxed),
        };
        std::fs::write(path, serde_json::to_string_pretty(&keystore)?)?;
        Ok(())
    }

    fn with_key(signing_key: SigningKey, next_nonce: u64) -> Result<Self> {
        let address = Address::from_bytes(signing_key.verifying_key().as_bytes())?;
        Ok(Self {
            signing_key,
            address,
            next_nonce: AtomicU64::new(next_nonce),
        })
    }

    /// This wallet's address.
    #[must_use]
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Public half of the keypair.
    #[must_use]
    pub fn public_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// Secret key as base58. Handle with care.
    #[must_use]
    pub fn secret_key_base58(&self) -> String {
        bs58::encode(self.signing_key.as_bytes()).into_string()
    }

    /// Sign arbitrary bytes.
    #[must_use]
    pub fn sign(&self, message: &[u8]) -> Signature {
        self.signing_key.sign(message)
    }

    /// Sign `payload` as a request, using the next nonce of this wallet.
    #[must_use]
    pub fn sign_request(&self, payload: impl Into<Vec<u8>>) -> SignedRequest {
        let nonce = self.next_nonce.fetch_add(1, Ordering::Relaxed);
        self.sign_request_with_nonce(payload, nonce)
    }

    /// Sign `payload` as a request with an explicit nonce.
    #[must_use]
    pub fn sign_request_with_nonce(&self, payload: impl Into<Vec<u8>>, nonce: u64) -> SignedRequest {
        let payload = payload.into();
        let message = SignedRequest::signing_bytes(&self.address, nonce, &payload);
        SignedRequest {
            sender: self.address.clone(),
            nonce,
            signature: self.sign(&message).to_bytes().to_vec(),
            payload,
        }
    }
}

#[allow(clippy::missing_fields_in_debug)]
impl fmt::Debug for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address)
            .field("secret_key", &"[REDACTED]")
            .finish()
    }
}
