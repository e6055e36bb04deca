// Proof verification against a presented key.
// The public input is recomputed from the key; the secret itself never
// enters the public witness.

use ark_bn254::{Bn254, Fr};
use ark_groth16::{Groth16, PreparedVerifyingKey, Proof};
use ark_serialize::CanonicalDeserialize;
use tracing::debug;

use crate::error::{Result, ZkError};
use crate::hash::HashCommitment;
use crate::keys::KeyMaterial;
use crate::secret::SecretKey;

/// Mechanical result of a verification that ran to completion.
///
/// Infrastructure failures are `Err`, never `Rejected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    Verified,
    /// The proof does not hold for the commitment of the presented key.
    Rejected,
}

impl VerifyOutcome {
    pub fn is_verified(self) -> bool {
        matches!(self, Self::Verified)
    }
}

/// Decode a serialized proof, refusing trailing bytes.
pub fn decode_proof(bytes: &[u8]) -> Result<Proof<Bn254>> {
    let mut reader = bytes;
    let proof = Proof::<Bn254>::deserialize_compressed(&mut reader)
        .map_err(|e| ZkError::MalformedProof(e.to_string()))?;
    if !reader.is_empty() {
        return Err(ZkError::MalformedProof(format!(
            "{} trailing bytes after proof",
            reader.len()
        )));
    }
    Ok(proof)
}

pub struct ProofVerifier<'a> {
    hash: &'a HashCommitment,
    pvk: &'a PreparedVerifyingKey<Bn254>,
}

impl<'a> ProofVerifier<'a> {
    pub fn new(hash: &'a HashCommitment, pvk: &'a PreparedVerifyingKey<Bn254>) -> Self {
        Self { hash, pvk }
    }

    pub fn from_material(hash: &'a HashCommitment, keys: &'a KeyMaterial) -> Self {
        Self::new(hash, keys.prepared_verifying_key())
    }

    pub fn verify(&self, claimed_key: &SecretKey, stored_proof: &[u8]) -> Result<VerifyOutcome> {
        let commitment = self.hash.commit(claimed_key)?;
        let proof = decode_proof(stored_proof)?;
        let public_inputs: [Fr; 1] = [commitment.as_field()];

        let valid = Groth16::<Bn254>::verify_proof(self.pvk, &proof, &public_inputs)
            .map_err(|e| ZkError::VerificationFailed(e.to_string()))?;

        debug!(%commitment, valid, "groth16 verification finished");
        Ok(if valid {
            VerifyOutcome::Verified
        } else {
            VerifyOutcome::Rejected
        })
    }

    /// Verify with a hex-encoded key as received at the boundary.
    pub fn verify_hex(&self, claimed_key: &str, stored_proof: &[u8]) -> Result<VerifyOutcome> {
        let key = SecretKey::from_hex(claimed_key)?;
        self.verify(&key, stored_proof)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn empty_proof_is_malformed() {
        let err = decode_proof(&[]).unwrap_err();
        assert!(matches!(err, ZkError::MalformedProof(_)));
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[test]
    fn truncated_bytes_are_malformed() {
        assert!(decode_proof(&[0xAB; 100]).is_err());
    }

    #[test]
    fn outcome_flags() {
        assert!(VerifyOutcome::Verified.is_verified());
        assert!(!VerifyOutcome::Rejected.is_verified());
    }
}
