// Defines the zkSNARK constraint system for Proof = Poseidon(Key).
// `key` is a private witness, `commitment` the single public input.
// `Relation` compiles the circuit once and keeps its constraint matrices.
// Proving reuses them, so each proof only synthesizes the witness.

use std::sync::Arc;

use ark_bn254::{Bn254, Fr};
use ark_crypto_primitives::crh::poseidon::constraints::{CRHGadget, CRHParametersVar};
use ark_crypto_primitives::crh::CRHSchemeGadget;
use ark_crypto_primitives::sponge::poseidon::PoseidonConfig;
use ark_groth16::{ProvingKey, VerifyingKey};
use ark_r1cs_std::alloc::AllocVar;
use ark_r1cs_std::eq::EqGadget;
use ark_r1cs_std::fields::fp::FpVar;
use ark_relations::r1cs::{
    ConstraintMatrices, ConstraintSynthesizer, ConstraintSystem, ConstraintSystemRef,
    OptimizationGoal, SynthesisError, SynthesisMode,
};
use tracing::debug;

use crate::error::{self, ZkError};
use crate::hash::{Commitment, HashCommitment};
use crate::secret::SecretKey;

#[derive(Clone)]
pub struct KeyCommitmentCircuit {
    pub key: Option<Fr>,
    pub commitment: Option<Fr>,
    pub params: PoseidonConfig<Fr>,
}

impl ConstraintSynthesizer<Fr> for KeyCommitmentCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<Fr>) -> Result<(), SynthesisError> {
        let key = FpVar::new_witness(cs.clone(), || {
            self.key.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let commitment = FpVar::new_input(cs.clone(), || {
            self.commitment.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let params = CRHParametersVar::new_constant(cs.clone(), &self.params)?;

        let digest = CRHGadget::<Fr>::evaluate(&params, &[key])?;
        digest.enforce_equal(&commitment)?;

        Ok(())
    }
}

/// Size of the compiled constraint system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationShape {
    pub num_constraints: usize,
    /// Public inputs, excluding the constant `one` variable.
    pub num_public_inputs: usize,
    pub num_witnesses: usize,
}

/// The compiled key commitment relation.
///
/// Compilation is deterministic and uses the same optimization goal as the
/// Groth16 setup, so the stored matrices match any proving key produced for
/// this circuit.
#[derive(Clone)]
pub struct Relation {
    hash: HashCommitment,
    shape: RelationShape,
    matrices: Arc<ConstraintMatrices<Fr>>,
}

impl Relation {
    pub fn compile() -> error::Result<Self> {
        let hash = HashCommitment::new();

        let cs = ConstraintSystem::<Fr>::new_ref();
        cs.set_optimization_goal(OptimizationGoal::Constraints);
        cs.set_mode(SynthesisMode::Setup);
        let blank = KeyCommitmentCircuit {
            key: None,
            commitment: None,
            params: hash.params().clone(),
        };
        blank
            .generate_constraints(cs.clone())
            .map_err(|e| ZkError::RelationCompile(e.to_string()))?;
        cs.finalize();

        let matrices = cs
            .to_matrices()
            .ok_or_else(|| ZkError::RelationCompile("constraint matrices unavailable".into()))?;
        let shape = RelationShape {
            num_constraints: matrices.num_constraints,
            num_public_inputs: matrices.num_instance_variables - 1,
            num_witnesses: matrices.num_witness_variables,
        };
        if shape.num_public_inputs != 1 {
            return Err(ZkError::RelationCompile(format!(
                "expected exactly one public input, found {}",
                shape.num_public_inputs
            )));
        }
        debug!(?shape, "compiled key commitment relation");

        Ok(Self {
            hash,
            shape,
            matrices: Arc::new(matrices),
        })
    }

    pub fn hash(&self) -> &HashCommitment {
        &self.hash
    }

    pub fn shape(&self) -> RelationShape {
        self.shape
    }

    pub fn matrices(&self) -> &ConstraintMatrices<Fr> {
        &self.matrices
    }

    /// Circuit without assignments, used by the setup ceremony.
    pub fn blank_circuit(&self) -> KeyCommitmentCircuit {
        KeyCommitmentCircuit {
            key: None,
            commitment: None,
            params: self.hash.params().clone(),
        }
    }

    /// Build the full assignment `[1, Proof, Key, ..intermediates]` for
    /// `Proof = Hash(key)` and check it against the compiled matrices.
    pub fn assign(&self, key: &SecretKey) -> error::Result<(Vec<Fr>, Commitment)> {
        let commitment = self.hash.commit(key)?;
        let circuit = KeyCommitmentCircuit {
            key: Some(key.as_field()),
            commitment: Some(commitment.as_field()),
            params: self.hash.params().clone(),
        };

        let cs = ConstraintSystem::<Fr>::new_ref();
        cs.set_optimization_goal(OptimizationGoal::Constraints);
        cs.set_mode(SynthesisMode::Prove {
            construct_matrices: false,
        });
        circuit
            .generate_constraints(cs.clone())
            .map_err(|e| ZkError::Witness(e.to_string()))?;
        cs.finalize();

        let assignment = {
            let inner = cs
                .borrow()
                .ok_or_else(|| ZkError::Witness("constraint system has no assignment".into()))?;
            [
                inner.instance_assignment.as_slice(),
                inner.witness_assignment.as_slice(),
            ]
            .concat()
        };

        if let Some(row) = self.first_unsatisfied(&assignment)? {
            return Err(ZkError::Witness(format!("unsatisfied constraint {row}")));
        }

        Ok((assignment, commitment))
    }

    /// Index of the first constraint `<A,z> * <B,z> != <C,z>`, if any.
    fn first_unsatisfied(&self, z: &[Fr]) -> error::Result<Option<usize>> {
        let m = &self.matrices;
        let expected = m.num_instance_variables + m.num_witness_variables;
        if z.len() != expected {
            return Err(ZkError::Witness(format!(
                "assignment has {} variables, relation has {expected}",
                z.len()
            )));
        }

        fn dot(row: &[(Fr, usize)], z: &[Fr]) -> Fr {
            row.iter().map(|(coeff, i)| *coeff * z[*i]).sum()
        }
        Ok((0..m.num_constraints)
            .find(|&i| dot(&m.a[i], z) * dot(&m.b[i], z) != dot(&m.c[i], z)))
    }

    /// Reject a proving key built for a circuit with a different witness layout.
    pub fn check_proving_key(&self, pk: &ProvingKey<Bn254>) -> error::Result<()> {
        self.check_verifying_key(&pk.vk)?;
        if pk.l_query.len() != self.shape.num_witnesses {
            return Err(ZkError::IncompatibleKeys(format!(
                "proving key covers {} witnesses, relation has {}",
                pk.l_query.len(),
                self.shape.num_witnesses
            )));
        }
        Ok(())
    }

    /// Reject a verifying key whose public input count differs from ours.
    pub fn check_verifying_key(&self, vk: &VerifyingKey<Bn254>) -> error::Result<()> {
        let expected = self.shape.num_public_inputs + 1;
        if vk.gamma_abc_g1.len() != expected {
            return Err(ZkError::IncompatibleKeys(format!(
                "verifying key expects {} public inputs, relation has {}",
                vk.gamma_abc_g1.len().saturating_sub(1),
                self.shape.num_public_inputs
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_with_one_public_input() {
        let relation = Relation::compile().unwrap();
        let shape = relation.shape();
        assert_eq!(shape.num_public_inputs, 1);
        assert!(shape.num_constraints > 0);
        assert!(shape.num_witnesses > 0);
    }

    #[test]
    fn compilation_is_deterministic() {
        let a = Relation::compile().unwrap();
        let b = Relation::compile().unwrap();
        assert_eq!(a.shape(), b.shape());
    }

    #[test]
    fn honest_assignment_is_satisfied() {
        let relation = Relation::compile().unwrap();
        let (assignment, commitment) = relation.assign(&SecretKey::from_u64(42)).unwrap();
        let shape = relation.shape();
        assert_eq!(assignment.len(), 1 + shape.num_public_inputs + shape.num_witnesses);
        assert_eq!(assignment[0], Fr::from(1u64));
        assert_eq!(assignment[1], commitment.as_field());
    }

    #[test]
    fn tampered_assignment_is_caught_by_matrices() {
        let relation = Relation::compile().unwrap();
        let (mut assignment, _) = relation.assign(&SecretKey::from_u64(42)).unwrap();
        assert_eq!(relation.first_unsatisfied(&assignment).unwrap(), None);

        assignment[1] += Fr::from(1u64);
        assert!(relation.first_unsatisfied(&assignment).unwrap().is_some());

        assignment.pop();
        assert!(matches!(
            relation.first_unsatisfied(&assignment),
            Err(ZkError::Witness(_))
        ));
    }

    #[test]
    fn matrices_match_recorded_shape() {
        let relation = Relation::compile().unwrap();
        let m = relation.matrices();
        assert_eq!(m.num_constraints, relation.shape().num_constraints);
        assert_eq!(m.a.len(), m.num_constraints);
        assert_eq!(m.num_instance_variables, 2);
    }

    #[test]
    fn wrong_commitment_is_unsatisfied() {
        let relation = Relation::compile().unwrap();
        let wrong = relation.hash().commit(&SecretKey::from_u64(43)).unwrap();
        let circuit = KeyCommitmentCircuit {
            key: Some(Fr::from(42u64)),
            commitment: Some(wrong.as_field()),
            params: relation.hash().params().clone(),
        };

        let cs = ConstraintSystem::<Fr>::new_ref();
        circuit.generate_constraints(cs.clone()).unwrap();
        assert!(!cs.is_satisfied().unwrap());
    }
}
