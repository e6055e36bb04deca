// Core zkSNARK logic for the biometric key commitment protocol.
// Used by the HTTP server for enroll/verify and by the CLI for setup.

// Includes:
// - `Relation`: Proof = Poseidon(Key) compiled once over BN254
// - `KeyMaterial` / `KeyRing`: Groth16 setup, key files, shared read-only keys
// - `ProofGenerator`: proof bytes for a secret key
// - `ProofVerifier`: three-way verification of stored proof bytes

pub mod circuit;
pub mod error;
pub mod hash;
pub mod keys;
pub mod prove;
pub mod secret;
pub mod verify;

pub use circuit::{KeyCommitmentCircuit, Relation, RelationShape};
pub use error::{ErrorKind, Result, ZkError};
pub use hash::{Commitment, HashCommitment};
pub use keys::{KeyMaterial, KeyPaths, KeyRing};
pub use prove::{GeneratedProof, ProofGenerator};
pub use secret::SecretKey;
pub use verify::{ProofVerifier, VerifyOutcome};
