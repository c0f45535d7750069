//! SSE-C key manager
//!
//! Holds the customer-supplied encryption key used to protect objects at rest.
//! The remote service performs the actual encryption; our side only carries the
//! base64 key and its MD5 digest on every read/write of an encrypted object.
//! The key is immutable once loaded and safe to share across request tasks.

use base64::{engine::general_purpose, Engine as _};
use rand::rngs::OsRng;
use rand::TryRngCore;

use crate::AppError;

/// Raw key length in bytes (256-bit key).
pub const CUSTOMER_KEY_LEN: usize = 32;

/// SSE-C key material: the transport-encoded key plus the digest the storage
/// service verifies on each request.
#[derive(Clone, Debug)]
pub struct CustomerKey {
    key_b64: String,
    key_md5_b64: String,
}

impl CustomerKey {
    /// Build key material from raw 32-byte key (e.g. for tests; avoids env mutation).
    pub fn from_key_bytes(raw: &[u8]) -> Result<Self, AppError> {
        if raw.len() != CUSTOMER_KEY_LEN {
            return Err(AppError::Configuration(format!(
                "Customer key must be {} bytes (256 bits), got {}",
                CUSTOMER_KEY_LEN,
                raw.len()
            )));
        }

        let digest = md5::compute(raw);
        Ok(Self {
            key_b64: general_purpose::STANDARD.encode(raw),
            key_md5_b64: general_purpose::STANDARD.encode(digest.0),
        })
    }

    /// Decode a configured base64 key and derive its digest. Used once at
    /// startup; an undecodable key aborts startup rather than degrading to
    /// unencrypted operation.
    pub fn from_base64(encoded: &str) -> Result<Self, AppError> {
        let raw = general_purpose::STANDARD.decode(encoded.trim()).map_err(|e| {
            AppError::Configuration(format!("Customer key is not valid base64: {}", e))
        })?;
        Self::from_key_bytes(&raw)
    }

    /// Generate fresh key material from the OS entropy source. Fails only on
    /// entropy-source exhaustion, which is not retryable.
    pub fn generate() -> Result<Self, AppError> {
        let mut raw = [0u8; CUSTOMER_KEY_LEN];
        OsRng
            .try_fill_bytes(&mut raw)
            .map_err(|e| AppError::Internal(format!("OS entropy source failed: {}", e)))?;
        Self::from_key_bytes(&raw)
    }

    /// Base64-encoded key, as sent in `x-amz-server-side-encryption-customer-key`.
    pub fn key_base64(&self) -> &str {
        &self.key_b64
    }

    /// Base64-encoded MD5 of the raw key, as sent in
    /// `x-amz-server-side-encryption-customer-key-MD5`.
    pub fn key_md5_base64(&self) -> &str {
        &self.key_md5_b64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_KEY: &[u8] = b"01234567890123456789012345678901";

    #[test]
    fn from_key_bytes_rejects_wrong_length() {
        assert!(CustomerKey::from_key_bytes(&[0u8; 16]).is_err());
        assert!(CustomerKey::from_key_bytes(&[0u8; 33]).is_err());
        assert!(CustomerKey::from_key_bytes(TEST_KEY).is_ok());
    }

    #[test]
    fn from_base64_round_trips_generated_key() {
        let generated = CustomerKey::generate().unwrap();
        let reloaded = CustomerKey::from_base64(generated.key_base64()).unwrap();
        assert_eq!(generated.key_base64(), reloaded.key_base64());
        assert_eq!(generated.key_md5_base64(), reloaded.key_md5_base64());
    }

    #[test]
    fn from_base64_rejects_garbage() {
        let err = CustomerKey::from_base64("not!!valid@@base64").unwrap_err();
        assert!(err.to_string().contains("base64"));
    }

    #[test]
    fn from_base64_rejects_short_key() {
        let short = general_purpose::STANDARD.encode(b"too-short");
        assert!(CustomerKey::from_base64(&short).is_err());
    }

    #[test]
    fn digest_is_sixteen_bytes_and_key_dependent() {
        let a = CustomerKey::from_key_bytes(TEST_KEY).unwrap();
        let raw_digest = general_purpose::STANDARD
            .decode(a.key_md5_base64())
            .unwrap();
        assert_eq!(raw_digest.len(), 16);

        let b = CustomerKey::from_key_bytes(b"abcdefghijklmnopqrstuvwxyz012345").unwrap();
        assert_ne!(a.key_md5_base64(), b.key_md5_base64());
    }

    #[test]
    fn generated_keys_are_distinct() {
        let a = CustomerKey::generate().unwrap();
        let b = CustomerKey::generate().unwrap();
        assert_ne!(a.key_base64(), b.key_base64());
    }
}
