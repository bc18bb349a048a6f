//! In-process configuration store
//!
//! Keeps each record as the JSON document a database-backed store would
//! persist, so encoding problems surface here the same way.

use std::collections::BTreeMap;

use tokio::sync::RwLock;

use super::ConfigStore;
use crate::config::{SignerConfig, SignerId};
use crate::error::{Result, SignerError};

/// [`ConfigStore`] over a map of JSON documents
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    documents: RwLock<BTreeMap<SignerId, String>>,
}

impl MemoryConfigStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Store holding `configs`
    ///
    /// # Errors
    ///
    /// Returns [`SignerError::Conflict`] if two configs share an id.
    pub fn with_configs(configs: impl IntoIterator<Item = SignerConfig>) -> Result<Self> {
        let mut documents = BTreeMap::new();
        for config in configs {
            if documents.contains_key(&config.id) {
                return Err(SignerError::Conflict { id: config.id });
            }
            documents.insert(config.id, config.to_json()?);
        }
        Ok(Self {
            documents: RwLock::new(documents),
        })
    }

    /// Replace the raw document for `id`
    ///
    /// Bypasses encoding, for simulating records written by other tools.
    pub async fn put_raw(&self, id: SignerId, document: impl Into<String>) {
        self.documents.write().await.insert(id, document.into());
    }
}

impl ConfigStore for MemoryConfigStore {
    async fn load(&self, id: SignerId) -> Result<SignerConfig> {
        let documents = self.documents.read().await;
        let document = documents.get(&id).ok_or(SignerError::NotFound { id })?;
        SignerConfig::from_json(document)
    }

    async fn list(&self) -> Result<Vec<SignerConfig>> {
        let documents = self.documents.read().await;
        documents
            .values()
            .map(|document| SignerConfig::from_json(document))
            .collect()
    }

    async fn insert(&self, config: SignerConfig) -> Result<()> {
        let document = config.to_json()?;
        let mut documents = self.documents.write().await;
        if documents.contains_key(&config.id) {
            return Err(SignerError::Conflict { id: config.id });
        }
        documents.insert(config.id, document);
        Ok(())
    }

    async fn delete(&self, id: SignerId) -> Result<()> {
        match self.documents.write().await.remove(&id) {
            Some(_) => Ok(()),
            None => Err(SignerError::NotFound { id }),
        }
    }
}
