//! Service facade over the store, the factory and the registry
//!
//! This is the surface a transport layer calls. Nothing here checks
//! credentials; request authentication belongs to the transport. CPU-bound
//! work (key generation, signing) is moved onto tokio's blocking pool.

use std::sync::Arc;
use std::time::Duration;

use log::info;
use northfoot_common::LoggingTransformer;
use rustls_pki_types::CertificateDer;
use tokio::task;

use crate::backend::Signer;
use crate::certificate::IssuedCertificate;
use crate::config::{self, SignerConfig, SignerId};
use crate::csr::CertificateRequest;
use crate::error::{Result, SignerError};
use crate::factory;
use crate::registry::SignerRegistry;
use crate::store::ConfigStore;

/// Certificate issuance and signer management
#[derive(Debug)]
pub struct SignerService<S> {
    store: S,
    registry: SignerRegistry,
}

impl<S: ConfigStore> SignerService<S> {
    /// Service over `store` with an empty signer cache
    pub fn new(store: S) -> Self {
        Self {
            store,
            registry: SignerRegistry::new(),
        }
    }

    /// Count persisted signers and log start-up state
    ///
    /// Signers are not built here; each one materializes on first use.
    pub async fn init(&self) -> Result<usize> {
        let count = self.store.list().await?.len();
        LoggingTransformer::log_startup(count);
        Ok(count)
    }

    /// Issue a certificate for a PKCS#10 DER request
    ///
    /// An empty `csr_der` counts as a missing request. A zero
    /// `duration_hint` selects the backend default lifetime.
    ///
    /// # Errors
    ///
    /// [`SignerError::NotFound`] for an unknown signer, validation errors
    /// for a missing, malformed or badly signed request, internal errors for
    /// store, randomness or signing failures.
    pub async fn sign(
        &self,
        signer_id: SignerId,
        csr_der: &[u8],
        duration_hint: Duration,
    ) -> Result<CertificateDer<'static>> {
        let signer = self.signer(signer_id).await?;
        let csr_der = csr_der.to_vec();

        let issued = task::spawn_blocking(move || {
            let csr = CertificateRequest::from_der(&csr_der)?;
            signer.sign(&csr, duration_hint)
        })
        .await
        .map_err(|e| SignerError::internal(format!("signing task failed: {e}")))??;

        Ok(issued.into_der())
    }

    /// DER certificates that verify leaves issued by the signer
    pub async fn trust_bundle(&self, signer_id: SignerId) -> Result<Vec<CertificateDer<'static>>> {
        let signer = self.signer(signer_id).await?;
        Ok(signer
            .trust_bundle()
            .into_iter()
            .map(IssuedCertificate::into_der)
            .collect())
    }

    /// Evict a cached signer after its configuration changed or vanished
    pub fn invalidate(&self, signer_id: SignerId) -> bool {
        self.registry.invalidate(signer_id)
    }

    /// Persisted configuration of one signer
    pub async fn get_signer(&self, signer_id: SignerId) -> Result<SignerConfig> {
        self.store.load(signer_id).await
    }

    /// Every persisted configuration, ordered by id
    pub async fn list_signers(&self) -> Result<Vec<SignerConfig>> {
        let mut configs = self.store.list().await?;
        configs.sort_by_key(|config| config.id);
        Ok(configs)
    }

    /// Validate and persist a new signer
    ///
    /// The signer itself is built lazily on first use.
    pub async fn create_signer(&self, config: SignerConfig) -> Result<SignerConfig> {
        config::validate(&config)?;
        self.store.insert(config.clone()).await?;
        info!("Created signer {} ({})", config.id, config.name);
        Ok(config)
    }

    /// Remove a signer's configuration and evict it from the cache
    ///
    /// The cache entry is dropped even when the store reports the record as
    /// already gone. Calls already holding the signer run to completion.
    pub async fn delete_signer(&self, signer_id: SignerId) -> Result<()> {
        let deleted = self.store.delete(signer_id).await;
        self.invalidate(signer_id);
        deleted?;
        info!("Deleted signer {signer_id}");
        Ok(())
    }

    /// The signer cache
    pub fn registry(&self) -> &SignerRegistry {
        &self.registry
    }

    /// The configuration store
    pub fn store(&self) -> &S {
        &self.store
    }

    async fn signer(&self, signer_id: SignerId) -> Result<Arc<Signer>> {
        let store = &self.store;
        self.registry
            .get_or_load(signer_id, |id| async move {
                let config = store.load(id).await?;
                task::spawn_blocking(move || factory::build(&config))
                    .await
                    .map_err(|e| SignerError::internal(format!("signer build task failed: {e}")))?
            })
            .await
    }
}
