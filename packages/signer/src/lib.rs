//! Certificate issuance engine
//!
//! This crate provides:
//! - Pluggable CA backends behind the [`Signer`] variant
//! - An in-memory RSA CA that bootstraps its own self-signed root
//! - Leaf signing from PKCS#10 requests with a fixed key-usage policy
//! - A copy-on-write [`Registry`] that builds signers lazily from persisted
//!   configuration
//! - The [`SignerService`] facade a transport layer calls

#![forbid(unsafe_code)]

pub mod backend;
pub mod certificate;
pub mod config;
pub mod csr;
mod error;
pub mod factory;
pub mod policy;
pub mod registry;
pub mod service;
pub mod store;
mod template;

pub use backend::{InMemoryRsaSigner, Signer};
pub use certificate::IssuedCertificate;
pub use config::{
    validate, BackendConfig, InMemoryConfig, PrivateKeyType, SignerConfig, SignerId, SignerType,
};
pub use csr::CertificateRequest;
pub use error::*;
pub use registry::{Registry, SignerRegistry, Snapshot};
pub use service::SignerService;
pub use store::{ConfigStore, MemoryConfigStore};

// DER newtypes used across the public API
pub use rustls_pki_types::{CertificateDer, CertificateSigningRequestDer};
