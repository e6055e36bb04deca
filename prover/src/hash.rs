// Poseidon hash commitment over the BN254 scalar field.
// The same parameters drive the native hash and the in-circuit gadget, so a
// verifier can recompute the public input without running the prover.

use std::fmt;

use ark_bn254::Fr;
use ark_crypto_primitives::crh::poseidon::CRH as PoseidonCRH;
use ark_crypto_primitives::crh::CRHScheme;
use ark_crypto_primitives::sponge::poseidon::{find_poseidon_ark_and_mds, PoseidonConfig};
use ark_ff::{BigInteger, PrimeField};

use crate::error::{Result, ZkError};
use crate::secret::SecretKey;

pub const FULL_ROUNDS: usize = 8;
pub const PARTIAL_ROUNDS: usize = 57;
pub const ALPHA: u64 = 5;
pub const RATE: usize = 2; // t = rate + capacity = 3
pub const CAPACITY: usize = 1;

/// Build the Poseidon configuration from the Grain LFSR constants.
pub fn poseidon_config() -> PoseidonConfig<Fr> {
    let (ark, mds) = find_poseidon_ark_and_mds::<Fr>(
        Fr::MODULUS_BIT_SIZE as u64,
        RATE,
        FULL_ROUNDS as u64,
        PARTIAL_ROUNDS as u64,
        0,
    );
    PoseidonConfig::new(FULL_ROUNDS, PARTIAL_ROUNDS, ALPHA, mds, ark, RATE, CAPACITY)
}

/// The public image of a secret key.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Commitment(Fr);

impl Commitment {
    pub fn as_field(&self) -> Fr {
        self.0
    }

    /// Big-endian, 32 bytes, lowercase hex.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0.into_bigint().to_bytes_be())
    }
}

impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Commitment({})", self.to_hex())
    }
}

#[derive(Clone)]
pub struct HashCommitment {
    params: PoseidonConfig<Fr>,
}

impl HashCommitment {
    pub fn new() -> Self {
        Self {
            params: poseidon_config(),
        }
    }

    pub fn params(&self) -> &PoseidonConfig<Fr> {
        &self.params
    }

    pub fn commit(&self, key: &SecretKey) -> Result<Commitment> {
        PoseidonCRH::<Fr>::evaluate(&self.params, [key.as_field()])
            .map(Commitment)
            .map_err(|e| ZkError::Commitment(e.to_string()))
    }
}

impl Default for HashCommitment {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commitment_is_deterministic() {
        let a = HashCommitment::new();
        let b = HashCommitment::new();
        let key = SecretKey::from_u64(42);
        assert_eq!(a.commit(&key).unwrap(), b.commit(&key).unwrap());
    }

    #[test]
    fn distinct_keys_have_distinct_commitments() {
        let hash = HashCommitment::new();
        let c42 = hash.commit(&SecretKey::from_u64(42)).unwrap();
        let c43 = hash.commit(&SecretKey::from_u64(43)).unwrap();
        assert_ne!(c42, c43);
    }

    #[test]
    fn commitment_is_not_the_identity() {
        let hash = HashCommitment::new();
        let key = SecretKey::from_u64(42);
        assert_ne!(hash.commit(&key).unwrap().as_field(), key.as_field());
    }

    #[test]
    fn hex_is_fixed_width() {
        let hash = HashCommitment::new();
        let hex = hash.commit(&SecretKey::from_u64(1)).unwrap().to_hex();
        assert_eq!(hex.len(), 64);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
