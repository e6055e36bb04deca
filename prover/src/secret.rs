// Boundary parsing of the biometric-derived secret.
// The key arrives hex-encoded and is reduced into the BN254 scalar field.

use std::fmt;

use ark_bn254::Fr;
use ark_ff::PrimeField;

use crate::error::{Result, ZkError};

/// Longest accepted key, in significant bytes, before field reduction.
pub const MAX_KEY_BYTES: usize = 64;

/// A secret key as a scalar field element.
///
/// Never persisted and never printed; `Debug` is redacted.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct SecretKey(Fr);

impl SecretKey {
    /// Parse a hex string (optional `0x` prefix, odd length allowed) as a
    /// big-endian unsigned integer and reduce it modulo the field order.
    pub fn from_hex(input: &str) -> Result<Self> {
        let digits = input
            .strip_prefix("0x")
            .or_else(|| input.strip_prefix("0X"))
            .unwrap_or(input);
        if digits.is_empty() {
            return Err(ZkError::InvalidKeyEncoding("key is empty".into()));
        }

        let bytes = if digits.len() % 2 == 1 {
            hex::decode(format!("0{digits}"))
        } else {
            hex::decode(digits)
        }
        .map_err(|e| ZkError::InvalidKeyEncoding(e.to_string()))?;

        // Leading zero bytes do not change the integer and do not count
        // against the size limit.
        let start = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
        let significant = &bytes[start..];
        if significant.len() > MAX_KEY_BYTES {
            return Err(ZkError::KeyTooLarge {
                max: MAX_KEY_BYTES,
                actual: significant.len(),
            });
        }
        Ok(Self(Fr::from_be_bytes_mod_order(significant)))
    }

    pub fn from_u64(value: u64) -> Self {
        Self(Fr::from(value))
    }

    pub fn as_field(&self) -> Fr {
        self.0
    }
}

impl From<Fr> for SecretKey {
    fn from(value: Fr) -> Self {
        Self(value)
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(<redacted>)")
    }
}
