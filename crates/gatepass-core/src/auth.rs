//! # Hash Authenticator
//!
//! Binds token ids to a shared secret so scanned payloads can be checked for
//! tampering without a round trip to any server.
//!
//! ## Digest Construction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Token Digest                                      │
//! │                                                                         │
//! │   secret_key ──┐                                                        │
//! │                ├──► concat ──► SHA-256 ──► lowercase hex (64 chars)     │
//! │   token_id  ───┘                                                        │
//! │                                                                         │
//! │   "SECRET_KEY_123" + "TOKEN_0001"  ──►  "3f1c…"                         │
//! │                                                                         │
//! │  Only the token id participates. The event name and batch marker are   │
//! │  carried in the payload but are not part of the digest.                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Anyone holding the secret can mint tokens. The secret stays on the issuing
//! and scanning installations; there is no third-party verification.

use sha2::{Digest, Sha256};

use crate::types::PayloadClaim;

/// Computes and checks token digests for one installation.
///
/// The authenticator is keyed by the shared secret and also knows the event
/// name its tokens are issued for. A payload naming a different event is
/// rejected even though the event is not covered by the digest.
#[derive(Clone)]
pub struct HashAuthenticator {
    secret_key: String,
    event_name: String,
}

impl HashAuthenticator {
    /// Creates an authenticator for the given secret and event.
    pub fn new(secret_key: impl Into<String>, event_name: impl Into<String>) -> Self {
        HashAuthenticator {
            secret_key: secret_key.into(),
            event_name: event_name.into(),
        }
    }

    /// The event name written into issued payloads.
    pub fn event_name(&self) -> &str {
        &self.event_name
    }

    /// Returns `hex(SHA-256(secret_key + token_id))`.
    ///
    /// Deterministic: the same id always yields the same digest.
    pub fn digest(&self, token_id: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.secret_key.as_bytes());
        hasher.update(token_id.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Checks a scanned payload claim.
    ///
    /// Fails closed: a claim without a `token` or `hash` is rejected, as is a
    /// claim whose `event` names another event. Otherwise the claimed hash must
    /// match the recomputed digest exactly.
    pub fn verify(&self, claim: &PayloadClaim) -> bool {
        let (token, hash) = match (claim.token.as_deref(), claim.hash.as_deref()) {
            (Some(token), Some(hash)) if !token.is_empty() && !hash.is_empty() => (token, hash),
            _ => return false,
        };

        if let Some(event) = claim.event.as_deref() {
            if event != self.event_name {
                return false;
            }
        }

        self.digest(token) == hash
    }
}

// Keep the secret out of debug output.
impl std::fmt::Debug for HashAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HashAuthenticator")
            .field("secret_key", &"<redacted>")
            .field("event_name", &self.event_name)
            .finish()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
