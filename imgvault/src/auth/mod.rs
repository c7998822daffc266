//! Upload authorization.
//!
//! An upload is authorized by a BIP-340 Schnorr signature (secp256k1, x-only public keys) over
//! the SHA-256 digest of the uploaded content. Signing the digest binds the authorization to
//! exactly the bytes that get stored.
//!
//! Checks run in a fixed order, each failing with its own [`AuthError`] variant:
//!
//! 1. decode the hex public key (32 bytes)
//! 2. decode the hex signature (64 bytes)
//! 3. parse both into curve structures
//! 4. check the public key against the [`AllowList`], if one is configured
//! 5. verify the signature over the digest
//!
//! Failures in steps 1-3 are client input errors. Steps 4 and 5 are authorization failures and
//! share a single user-facing message so callers can't tell an unknown key from a bad signature.
//!
//! # Modules
//!
//! - [`allowlist`]: the optional set of approved public keys
//! - [`signature`]: hex decoding, key/signature parsing, and the [`Authorizer`]

pub mod allowlist;
pub mod signature;

pub use allowlist::AllowList;
pub use signature::Authorizer;

use crate::digest::ContentDigest;
use thiserror::Error;

/// Why an upload's credentials were rejected.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid pubkey encoding: {reason}")]
    InvalidKeyEncoding { reason: String },

    #[error("Invalid signature encoding: {reason}")]
    InvalidSignatureEncoding { reason: String },

    /// Decoded bytes are not an x-only secp256k1 point
    #[error("Malformed pubkey: {reason}")]
    MalformedKey { reason: String },

    /// Decoded bytes are not a valid (r, s) pair
    #[error("Malformed signature: {reason}")]
    MalformedSignature { reason: String },

    #[error("Pubkey {pubkey} is not approved for uploads")]
    UnapprovedKey { pubkey: String },

    #[error("Signature does not verify against digest {digest}")]
    VerificationFailed { digest: ContentDigest },
}

impl AuthError {
    /// True for failures that mean "well-formed credentials, not allowed", as opposed to
    /// credentials that couldn't be decoded at all.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, AuthError::UnapprovedKey { .. } | AuthError::VerificationFailed { .. })
    }
}
