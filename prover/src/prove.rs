// Proof generation for enrollment.
// Computes the commitment, builds and checks the full witness, runs the
// Groth16 prover over the relation's precompiled matrices and serializes the
// proof in compressed canonical form.

use std::time::Instant;

use ark_bn254::{Bn254, Fr};
use ark_ff::UniformRand;
use ark_groth16::Groth16;
use ark_serialize::CanonicalSerialize;
use rand::{thread_rng, CryptoRng, RngCore};
use tracing::debug;

use crate::circuit::Relation;
use crate::error::{Result, ZkError};
use crate::hash::Commitment;
use crate::keys::KeyMaterial;
use crate::secret::SecretKey;

/// Output of [`ProofGenerator::generate`]. Identity and helper pass through
/// untouched; only `proof` and `commitment` are produced here.
#[derive(Debug, Clone)]
pub struct GeneratedProof {
    pub identity: String,
    pub proof: Vec<u8>,
    pub commitment: Commitment,
    pub helper: Vec<u8>,
}

pub struct ProofGenerator<'a> {
    relation: &'a Relation,
    keys: &'a KeyMaterial,
}

impl<'a> ProofGenerator<'a> {
    pub fn new(relation: &'a Relation, keys: &'a KeyMaterial) -> Self {
        Self { relation, keys }
    }

    pub fn generate(
        &self,
        identity: &str,
        key: &SecretKey,
        helper: Vec<u8>,
    ) -> Result<GeneratedProof> {
        self.generate_with_rng(identity, key, helper, &mut thread_rng())
    }

    pub fn generate_with_rng<R: RngCore + CryptoRng>(
        &self,
        identity: &str,
        key: &SecretKey,
        helper: Vec<u8>,
        rng: &mut R,
    ) -> Result<GeneratedProof> {
        let start = Instant::now();
        let (assignment, commitment) = self.relation.assign(key)?;

        let matrices = self.relation.matrices();
        let r = Fr::rand(rng);
        let s = Fr::rand(rng);
        let proof = Groth16::<Bn254>::create_proof_with_reduction_and_matrices(
            self.keys.proving_key(),
            r,
            s,
            matrices,
            matrices.num_instance_variables,
            matrices.num_constraints,
            &assignment,
        )
        .map_err(|e| ZkError::ProofGenerationFailed(e.to_string()))?;

        let mut bytes = Vec::with_capacity(proof.compressed_size());
        proof
            .serialize_compressed(&mut bytes)
            .map_err(|e| ZkError::SerializationError(e.to_string()))?;

        debug!(
            identity,
            %commitment,
            proof_len = bytes.len(),
            elapsed = ?start.elapsed(),
            "proof generated"
        );

        Ok(GeneratedProof {
            identity: identity.to_owned(),
            proof: bytes,
            commitment,
            helper,
        })
    }
}
