//! Signer backends
//!
//! [`Signer`] is a closed set of variants keyed by (backend, key algorithm).
//! A new backend adds a variant here and an arm in the factory; the registry
//! and the service only ever see [`Signer`].

pub mod in_memory;

use std::time::Duration;

pub use in_memory::InMemoryRsaSigner;

use crate::certificate::IssuedCertificate;
use crate::config::{PrivateKeyType, SignerType};
use crate::csr::CertificateRequest;
use crate::error::Result;

/// A live certificate authority
///
/// Immutable after construction and safe to share across threads.
#[derive(Debug)]
pub enum Signer {
    /// RSA CA held in process memory
    InMemoryRsa(InMemoryRsaSigner),
}

impl Signer {
    /// Issue a leaf certificate for `csr`; a zero `duration_hint` selects the
    /// backend default lifetime
    pub fn sign(
        &self,
        csr: &CertificateRequest,
        duration_hint: Duration,
    ) -> Result<IssuedCertificate> {
        match self {
            Self::InMemoryRsa(signer) => signer.sign(csr, duration_hint),
        }
    }

    /// Certificates a relying party needs to verify issued leaves, root last
    pub fn trust_bundle(&self) -> Vec<IssuedCertificate> {
        match self {
            Self::InMemoryRsa(signer) => signer.trust_bundle(),
        }
    }

    /// Backend discriminator of this variant
    pub fn backend(&self) -> SignerType {
        match self {
            Self::InMemoryRsa(_) => SignerType::InMemory,
        }
    }

    /// Key algorithm of this variant
    pub fn key_algorithm(&self) -> PrivateKeyType {
        match self {
            Self::InMemoryRsa(_) => PrivateKeyType::Rsa,
        }
    }
}

impl From<InMemoryRsaSigner> for Signer {
    fn from(signer: InMemoryRsaSigner) -> Self {
        Self::InMemoryRsa(signer)
    }
}
