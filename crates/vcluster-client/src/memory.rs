//! In-memory store, for tests and local development.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use vcluster_model::Document;

use crate::error::{ClientError, Result};
use crate::store::InfoStore;

#[derive(Debug, Clone)]
struct PairingSlot {
    common_name: String,
    credentials: Option<(String, String)>,
}

/// A process-local [`InfoStore`] backed by hash maps.
///
/// Mirrors the remote store's observable behavior: whole-document category
/// granularity, delete-of-absent is an error, pairing codes are one-time.
#[derive(Default)]
pub struct MemoryInfoStore {
    categories: RwLock<HashMap<String, Document>>,
    pairings: RwLock<HashMap<String, PairingSlot>>,
    pairing_seq: AtomicU64,
}

impl MemoryInfoStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test hook: deposits credentials for an outstanding pairing code, the
    /// way the real service does once it has issued a certificate.
    pub fn satisfy_pairing(&self, code: &str, cert: &str, key: &str) -> bool {
        let mut pairings = self.pairings.write();
        match pairings.get_mut(code) {
            Some(slot) => {
                slot.credentials = Some((cert.to_string(), key.to_string()));
                true
            }
            None => false,
        }
    }

    /// Common name an outstanding pairing was requested for, if any.
    pub fn pairing_common_name(&self, code: &str) -> Option<String> {
        self.pairings
            .read()
            .get(code)
            .map(|slot| slot.common_name.clone())
    }
}

#[async_trait]
impl InfoStore for MemoryInfoStore {
    async fn get_all(&self, category: &str) -> Result<Document> {
        Ok(self
            .categories
            .read()
            .get(category)
            .cloned()
            .unwrap_or_default())
    }

    async fn replace_all(&self, category: &str, doc: Document) -> Result<()> {
        self.categories.write().insert(category.to_string(), doc);
        Ok(())
    }

    async fn get_one(&self, category: &str, name: &str) -> Result<Option<Document>> {
        let categories = self.categories.read();
        let Some(doc) = categories.get(category) else {
            return Ok(None);
        };
        Ok(doc.get(name).and_then(|value| value.as_object().cloned()))
    }

    async fn delete_one(&self, category: &str, name: &str) -> Result<()> {
        let mut categories = self.categories.write();
        let removed = categories
            .get_mut(category)
            .and_then(|doc| doc.remove(name));
        if removed.is_none() {
            return Err(ClientError::EntityMissing(name.to_string()));
        }
        Ok(())
    }

    async fn request_pairing(&self, common_name: &str) -> Result<String> {
        let seq = self.pairing_seq.fetch_add(1, Ordering::Relaxed);
        let code = format!("{common_name}-{seq:08x}");
        self.pairings.write().insert(
            code.clone(),
            PairingSlot {
                common_name: common_name.to_string(),
                credentials: None,
            },
        );
        Ok(code)
    }

    async fn get_pairing(&self, code: &str) -> Result<(String, String)> {
        let mut pairings = self.pairings.write();
        match pairings.get(code) {
            Some(slot) if slot.credentials.is_some() => {
                // One-time successful: the slot is consumed on delivery.
                let slot = pairings.remove(code);
                match slot.and_then(|s| s.credentials) {
                    Some(creds) => Ok(creds),
                    None => Err(ClientError::PairingNotReady(code.to_string())),
                }
            }
            Some(_) => Err(ClientError::PairingNotReady(code.to_string())),
            None => Err(ClientError::PairingNotReady(code.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn delete_of_absent_entity_fails() {
        let store = MemoryInfoStore::new();
        let err = store.delete_one("user", "ghost").await.unwrap_err();
        assert!(matches!(err, ClientError::EntityMissing(name) if name == "ghost"));
    }

    #[tokio::test]
    async fn unwritten_category_reads_empty() {
        let store = MemoryInfoStore::new();
        assert!(store.get_all("cluster").await.unwrap().is_empty());
        assert!(store.get_one("cluster", "c1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn pairing_is_one_time_successful() {
        let store = MemoryInfoStore::new();
        let code = store.request_pairing("factory.example.org").await.unwrap();

        // Unsatisfied retrieval is a retryable condition, repeatable safely.
        assert!(matches!(
            store.get_pairing(&code).await.unwrap_err(),
            ClientError::PairingNotReady(_)
        ));
        assert!(matches!(
            store.get_pairing(&code).await.unwrap_err(),
            ClientError::PairingNotReady(_)
        ));

        assert!(store.satisfy_pairing(&code, "CERT", "KEY"));
        let (cert, key) = store.get_pairing(&code).await.unwrap();
        assert_eq!((cert.as_str(), key.as_str()), ("CERT", "KEY"));

        // Consumed: a second successful retrieval is impossible.
        assert!(store.get_pairing(&code).await.is_err());
    }
}
