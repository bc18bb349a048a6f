//! Persisted signer configuration stores
//!
//! The engine only needs keyed access to [`SignerConfig`] records; storage
//! engines implement [`ConfigStore`] and own their query mechanics.

pub mod memory;

use std::future::Future;

pub use memory::MemoryConfigStore;

use crate::config::{SignerConfig, SignerId};
use crate::error::Result;

/// Durable home of signer configurations
///
/// Implementations return [`crate::SignerError::NotFound`] for unknown ids,
/// [`crate::SignerError::Conflict`] for duplicate inserts and
/// [`crate::SignerError::Storage`] for everything else.
pub trait ConfigStore: Send + Sync {
    /// Fetch one configuration
    fn load(&self, id: SignerId) -> impl Future<Output = Result<SignerConfig>> + Send;

    /// Every configuration, ordered by id
    fn list(&self) -> impl Future<Output = Result<Vec<SignerConfig>>> + Send;

    /// Persist a new configuration
    fn insert(&self, config: SignerConfig) -> impl Future<Output = Result<()>> + Send;

    /// Remove a configuration
    fn delete(&self, id: SignerId) -> impl Future<Output = Result<()>> + Send;
}
