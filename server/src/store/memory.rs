//! In-memory credential store.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{CredentialRecord, CredentialStore, StoreError};

#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    records: RwLock<HashMap<String, CredentialRecord>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn save(&self, record: &CredentialRecord) -> Result<(), StoreError> {
        match self.records.write().entry(record.identity.clone()) {
            Entry::Occupied(_) => Err(StoreError::DuplicateIdentity(record.identity.clone())),
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
                Ok(())
            }
        }
    }

    async fn fetch(&self, identity: &str) -> Result<Option<CredentialRecord>, StoreError> {
        Ok(self.records.read().get(identity).cloned())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(identity: &str) -> CredentialRecord {
        CredentialRecord {
            identity: identity.to_string(),
            proof: vec![1, 2, 3],
            helper: b"[]".to_vec(),
        }
    }

    #[tokio::test]
    async fn save_then_fetch() {
        let store = MemoryCredentialStore::new();
        store.save(&record("alice")).await.unwrap();
        assert_eq!(store.fetch("alice").await.unwrap(), Some(record("alice")));
    }

    #[tokio::test]
    async fn unknown_identity_is_none() {
        let store = MemoryCredentialStore::new();
        assert_eq!(store.fetch("bob").await.unwrap(), None);
    }

    #[tokio::test]
    async fn duplicate_identity_is_refused_and_original_kept() {
        let store = MemoryCredentialStore::new();
        store.save(&record("alice")).await.unwrap();

        let mut second = record("alice");
        second.proof = vec![9, 9, 9];
        let err = store.save(&second).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateIdentity(ref id) if id == "alice"));
        assert_eq!(store.fetch("alice").await.unwrap().unwrap().proof, vec![1, 2, 3]);
        assert_eq!(store.len(), 1);
    }
}
