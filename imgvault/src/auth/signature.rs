//! Schnorr signature checks over content digests.

use super::{AllowList, AuthError};
use crate::digest::ContentDigest;
use k256::schnorr::{Signature, VerifyingKey, signature::hazmat::PrehashVerifier};
use tracing::{debug, instrument};

/// Length of an x-only public key in bytes.
pub const PUBKEY_LEN: usize = 32;
/// Length of a Schnorr signature in bytes.
pub const SIGNATURE_LEN: usize = 64;

/// Decode a hex public key into its 32 raw bytes.
pub fn decode_pubkey(pubkey_hex: &str) -> Result<[u8; PUBKEY_LEN], AuthError> {
    decode_fixed(pubkey_hex).map_err(|reason| AuthError::InvalidKeyEncoding { reason })
}

/// Decode a hex signature into its 64 raw bytes.
pub fn decode_signature(signature_hex: &str) -> Result<[u8; SIGNATURE_LEN], AuthError> {
    decode_fixed(signature_hex).map_err(|reason| AuthError::InvalidSignatureEncoding { reason })
}

fn decode_fixed<const N: usize>(input: &str) -> Result<[u8; N], String> {
    if input.is_empty() {
        return Err("value is missing".to_string());
    }

    let mut bytes = [0u8; N];
    hex::decode_to_slice(input, &mut bytes).map_err(|e| match e {
        hex::FromHexError::InvalidStringLength | hex::FromHexError::OddLength => {
            format!("expected {} hex characters, got {}", N * 2, input.len())
        }
        other => other.to_string(),
    })?;

    Ok(bytes)
}

/// Checks upload credentials against a digest.
///
/// Holds the read-only allowlist and nothing else, so one instance is shared by every request.
#[derive(Debug, Clone, Default)]
pub struct Authorizer {
    allowlist: AllowList,
}

impl Authorizer {
    pub fn new(allowlist: AllowList) -> Self {
        Self { allowlist }
    }

    pub fn allowlist(&self) -> &AllowList {
        &self.allowlist
    }

    /// Authorize an upload whose content hashed to `digest`.
    ///
    /// Every step must pass. The allowlist is consulted after the credentials have been parsed
    /// but before the signature is verified.
    #[instrument(skip_all, fields(pubkey = %pubkey_hex, digest = %digest))]
    pub fn authorize(&self, pubkey_hex: &str, signature_hex: &str, digest: &ContentDigest) -> Result<(), AuthError> {
        let key_bytes = decode_pubkey(pubkey_hex)?;
        let signature_bytes = decode_signature(signature_hex)?;

        let verifying_key = VerifyingKey::from_bytes(&key_bytes).map_err(|e| AuthError::MalformedKey { reason: e.to_string() })?;
        let signature =
            Signature::try_from(signature_bytes.as_slice()).map_err(|e| AuthError::MalformedSignature { reason: e.to_string() })?;

        if !self.allowlist.permits(pubkey_hex) {
            return Err(AuthError::UnapprovedKey {
                pubkey: pubkey_hex.to_string(),
            });
        }

        debug!(signature = %signature_hex, "Checking signature");

        // The digest is the BIP-340 message; it is not hashed again
        verifying_key
            .verify_prehash(digest.as_bytes(), &signature)
            .map_err(|_| AuthError::VerificationFailed { digest: *digest })
    }
}
