//! Persisted signer configuration
//!
//! A [`SignerConfig`] is the durable description of a signer. It is stored as
//! JSON by the configuration store and is the only input the factory needs to
//! materialize a live signer. The record mirrors the management API shape, so
//! it may be incomplete or inconsistent until [`validate`] accepts it.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, SignerError};

/// Signer identifier; zero means "missing"
pub type SignerId = u64;

/// RSA modulus size used when the configuration does not name one
pub const DEFAULT_RSA_KEY_BITS: usize = 2048;

/// Smallest accepted RSA modulus size
pub const MIN_RSA_KEY_BITS: u32 = 2048;

/// Largest accepted RSA modulus size
pub const MAX_RSA_KEY_BITS: u32 = 8192;

/// Backend type discriminator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignerType {
    /// Not set
    #[default]
    #[serde(rename = "SIGNER_TYPE_UNSPECIFIED")]
    Unspecified,
    /// CA key material held in process memory
    #[serde(rename = "SIGNER_TYPE_INMEM")]
    InMemory,
    /// A type string this build does not know; the factory rejects it
    #[serde(rename = "SIGNER_TYPE_UNRECOGNIZED", other)]
    Unrecognized,
}

impl fmt::Display for SignerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unspecified => write!(f, "unspecified"),
            Self::InMemory => write!(f, "inmem"),
            Self::Unrecognized => write!(f, "unrecognized"),
        }
    }
}

/// Private key algorithm for backends that generate their own keys
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrivateKeyType {
    /// Not set
    #[default]
    #[serde(rename = "PRIVATE_KEY_TYPE_UNSPECIFIED")]
    Unspecified,
    /// RSA with PKCS#1 v1.5 SHA-256 signatures
    #[serde(rename = "PRIVATE_KEY_TYPE_RSA")]
    Rsa,
    /// ECDSA; declared in the schema, not implemented by the in-memory backend
    #[serde(rename = "PRIVATE_KEY_TYPE_ECDSA")]
    Ecdsa,
    /// A key type string this build does not know
    #[serde(rename = "PRIVATE_KEY_TYPE_UNRECOGNIZED", other)]
    Unrecognized,
}

impl fmt::Display for PrivateKeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unspecified => write!(f, "unspecified"),
            Self::Rsa => write!(f, "rsa"),
            Self::Ecdsa => write!(f, "ecdsa"),
            Self::Unrecognized => write!(f, "unrecognized"),
        }
    }
}

/// Parameters of the in-memory backend
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InMemoryConfig {
    /// Key algorithm of the generated CA key
    #[serde(default)]
    pub key: PrivateKeyType,
    /// Key size in bits; the backend default applies when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_size: Option<u32>,
}

/// Backend-specific parameters, tagged by backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackendConfig {
    /// In-memory backend parameters
    #[serde(rename = "inMem")]
    InMemory(InMemoryConfig),
}

/// Persisted signer record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignerConfig {
    /// Unique, non-zero identifier
    #[serde(default)]
    pub id: SignerId,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Free-form description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Backend discriminator
    #[serde(rename = "type", default)]
    pub signer_type: SignerType,
    /// Backend parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signer_config: Option<BackendConfig>,
}

impl SignerConfig {
    /// In-memory RSA signer with the backend's default key size
    pub fn in_memory_rsa(id: SignerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: None,
            signer_type: SignerType::InMemory,
            signer_config: Some(BackendConfig::InMemory(InMemoryConfig {
                key: PrivateKeyType::Rsa,
                key_size: None,
            })),
        }
    }

    /// Override the key size of an in-memory signer
    #[must_use]
    pub fn with_key_size(mut self, bits: u32) -> Self {
        if let Some(BackendConfig::InMemory(params)) = &mut self.signer_config {
            params.key_size = Some(bits);
        }
        self
    }

    /// Attach a description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Encode as the JSON document kept by the configuration store
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| SignerError::storage("encode signer", e))
    }

    /// Decode a JSON document produced by [`SignerConfig::to_json`]
    pub fn from_json(document: &str) -> Result<Self> {
        serde_json::from_str(document).map_err(|e| SignerError::storage("decode signer", e))
    }
}

/// Check that a configuration is acceptable for persistence
///
/// Every problem is reported at once, comma separated, so an operator can fix
/// a record in one pass.
///
/// # Errors
///
/// Returns [`SignerError::InvalidConfig`] if:
/// - the id is zero
/// - the backend type is unspecified
/// - the backend parameters are absent
/// - an in-memory RSA key size lies outside the supported range
pub fn validate(config: &SignerConfig) -> Result<()> {
    let mut problems = Vec::new();

    if config.id == 0 {
        problems.push("signer id is missing".to_string());
    }
    if config.signer_type == SignerType::Unspecified {
        problems.push("signer type is missing".to_string());
    }
    match &config.signer_config {
        None => problems.push("signer config is nil".to_string()),
        Some(BackendConfig::InMemory(params)) => {
            if let (PrivateKeyType::Rsa, Some(bits)) = (params.key, params.key_size) {
                if !(MIN_RSA_KEY_BITS..=MAX_RSA_KEY_BITS).contains(&bits) {
                    problems.push(format!(
                        "signer key size must be between {MIN_RSA_KEY_BITS} and {MAX_RSA_KEY_BITS} bits"
                    ));
                }
            }
        }
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(SignerError::InvalidConfig(problems.join(", ")))
    }
}
