//! # Enrollment / Verification Orchestration
//!
//! Glues the proof generator, the verifier and the credential store into the
//! user-facing operations. Handlers stay thin and call into here.
//!
//! Ordering guarantees:
//! - Enroll saves only after a proof was generated; a failed generation
//!   leaves the store untouched.
//! - Verify keeps `Rejected` apart from every failure, so "access denied"
//!   and "system broken" never collapse into one answer.

use std::sync::Arc;

use ppba_prover::{
    ErrorKind, KeyRing, ProofGenerator, ProofVerifier, SecretKey, VerifyOutcome, ZkError,
};
use thiserror::Error;
use tracing::{debug, info};

use crate::store::{CredentialRecord, CredentialStore, StoreError};

/// Failure of an orchestrated operation, classified for response mapping.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Proof(#[from] ZkError),

    #[error("no credential enrolled for '{0}'")]
    NotFound(String),

    #[error("'{0}' is already enrolled")]
    AlreadyEnrolled(String),

    #[error("credential store: {0}")]
    Store(StoreError),

    #[error("proof worker failed: {0}")]
    Worker(String),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateIdentity(identity) => Self::AlreadyEnrolled(identity),
            other => Self::Store(other),
        }
    }
}

impl From<tokio::task::JoinError> for ServiceError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Worker(err.to_string())
    }
}

/// Coarse class of a [`ServiceError`], one per response class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceErrorKind {
    Input,
    NotFound,
    Conflict,
    Internal,
}

impl ServiceError {
    pub fn kind(&self) -> ServiceErrorKind {
        match self {
            Self::Proof(e) => match e.kind() {
                ErrorKind::Input => ServiceErrorKind::Input,
                ErrorKind::Configuration | ErrorKind::Internal => ServiceErrorKind::Internal,
            },
            Self::NotFound(_) => ServiceErrorKind::NotFound,
            Self::AlreadyEnrolled(_) => ServiceErrorKind::Conflict,
            Self::Store(_) | Self::Worker(_) => ServiceErrorKind::Internal,
        }
    }
}

pub struct CredentialService {
    keys: Arc<KeyRing>,
    store: Arc<dyn CredentialStore>,
}

impl CredentialService {
    pub fn new(keys: Arc<KeyRing>, store: Arc<dyn CredentialStore>) -> Self {
        Self { keys, store }
    }

    pub fn keys(&self) -> &Arc<KeyRing> {
        &self.keys
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    /// Parse the key, prove knowledge of it, then persist the credential.
    /// Returns the enrolled identity.
    pub async fn enroll(
        &self,
        identity: String,
        key_hex: &str,
        helper: Vec<u8>,
    ) -> Result<String, ServiceError> {
        let key = SecretKey::from_hex(key_hex)?;

        let relation = Arc::clone(self.keys.relation());
        let material = self.keys.current();
        let generated = tokio::task::spawn_blocking(move || {
            ProofGenerator::new(&relation, &material).generate(&identity, &key, helper)
        })
        .await??;

        let record = CredentialRecord {
            identity: generated.identity,
            proof: generated.proof,
            helper: generated.helper,
        };
        self.store.save(&record).await?;

        info!(
            identity = %record.identity,
            commitment = %generated.commitment,
            "credential enrolled"
        );
        Ok(record.identity)
    }

    /// Check a presented key against the stored proof for `identity`.
    pub async fn verify(
        &self,
        identity: &str,
        key_hex: &str,
    ) -> Result<VerifyOutcome, ServiceError> {
        let key = SecretKey::from_hex(key_hex)?;

        let record = self
            .store
            .fetch(identity)
            .await?
            .ok_or_else(|| ServiceError::NotFound(identity.to_string()))?;

        let relation = Arc::clone(self.keys.relation());
        let material = self.keys.current();
        let outcome = tokio::task::spawn_blocking(move || {
            ProofVerifier::from_material(relation.hash(), &material).verify(&key, &record.proof)
        })
        .await??;

        match outcome {
            VerifyOutcome::Verified => info!(identity, "verification succeeded"),
            VerifyOutcome::Rejected => info!(identity, "verification rejected"),
        }
        Ok(outcome)
    }

    /// Stored proof and helper for `identity`, as enrolled.
    pub async fn retrieve(&self, identity: &str) -> Result<CredentialRecord, ServiceError> {
        let record = self
            .store
            .fetch(identity)
            .await?
            .ok_or_else(|| ServiceError::NotFound(identity.to_string()))?;
        debug!(identity, proof_len = record.proof.len(), "credential retrieved");
        Ok(record)
    }
}
