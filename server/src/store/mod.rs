//! # Credential Record Store
//!
//! Persists `{identity, proof, helper}` per enrolled user. The store is
//! insert-only: a second enrollment for the same identity is refused with
//! [`StoreError::DuplicateIdentity`] rather than overwritten.
//!
//! Two backends:
//! - [`postgres::PgCredentialStore`]: production, one row per identity.
//! - [`memory::MemoryCredentialStore`]: tests and DSN-less development runs.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

pub use memory::MemoryCredentialStore;
pub use postgres::PgCredentialStore;

/// What is kept per identity. Proof and helper are opaque bytes here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    pub identity: String,
    pub proof: Vec<u8>,
    pub helper: Vec<u8>,
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("identity '{0}' is already enrolled")]
    DuplicateIdentity(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("database migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Insert a new record. Each call is a single atomic insert.
    async fn save(&self, record: &CredentialRecord) -> Result<(), StoreError>;

    /// Point lookup. `Ok(None)` when the identity was never enrolled.
    async fn fetch(&self, identity: &str) -> Result<Option<CredentialRecord>, StoreError>;

    /// Cheap liveness check for readiness probes.
    async fn ping(&self) -> Result<(), StoreError>;
}
