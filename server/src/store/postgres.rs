//! PostgreSQL credential store.
//!
//! All queries operate on the `credentials` table created by the embedded
//! migrations.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};

use super::{CredentialRecord, CredentialStore, StoreError};

#[derive(Debug, Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    /// Connect, verify the connection and apply migrations.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(1)
            .acquire_timeout(Duration::from_secs(5))
            .connect(url)
            .await?;
        tracing::info!("Connected to PostgreSQL");

        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");

        Ok(Self { pool })
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn save(&self, record: &CredentialRecord) -> Result<(), StoreError> {
        let result = sqlx::query(
            "INSERT INTO credentials (username, proof, helper_data) VALUES ($1, $2, $3)",
        )
        .bind(&record.identity)
        .bind(&record.proof)
        .bind(&record.helper)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(StoreError::DuplicateIdentity(record.identity.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn fetch(&self, identity: &str) -> Result<Option<CredentialRecord>, StoreError> {
        let row: Option<(Vec<u8>, Vec<u8>)> =
            sqlx::query_as("SELECT proof, helper_data FROM credentials WHERE username = $1")
                .bind(identity)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(proof, helper)| CredentialRecord {
            identity: identity.to_string(),
            proof,
            helper,
        }))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
