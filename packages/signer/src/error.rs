//! Error types for the certificate issuance engine

use crate::config::SignerId;
use thiserror::Error;

/// Signer-specific errors
#[derive(Debug, Error)]
pub enum SignerError {
    /// Signer configuration failed validation
    #[error("signer validation failed: {0}")]
    InvalidConfig(String),

    /// Backend parameters are absent from the configuration
    #[error("signer config is nil")]
    MissingBackendConfig,

    /// Backend type is unspecified or has no implementation
    #[error("unsupported signer backend: {0}")]
    UnsupportedBackend(String),

    /// Key algorithm is unspecified or has no implementation for the backend
    #[error("unsupported key algorithm: {0}")]
    UnsupportedKeyAlgorithm(String),

    /// No CSR was supplied
    #[error("csr is missing")]
    MissingCsr,

    /// CSR bytes are not a PKCS#10 structure this engine understands
    #[error("malformed CSR: {0}")]
    MalformedCsr(String),

    /// CSR self-signature does not verify against its public key
    #[error("CSR has invalid signature: {0}")]
    CsrSignature(String),

    /// Requested certificate lifetime cannot be represented
    #[error("invalid duration hint: {0}")]
    InvalidDuration(String),

    /// No signer with the given id exists
    #[error("signer with id {id} not found")]
    NotFound {
        /// Signer identifier
        id: SignerId,
    },

    /// A signer with the given id already exists
    #[error("signer with id {id} already exists")]
    Conflict {
        /// Signer identifier
        id: SignerId,
    },

    /// Key generation error occurred
    #[error("Key generation error: {0}")]
    KeyGeneration(String),

    /// Building or signing a certificate failed
    #[error("Certificate construction failed: {0}")]
    CertificateConstruction(String),

    /// Parsing a freshly signed certificate failed
    #[error("Certificate parsing failed: {0}")]
    CertificateParsing(String),

    /// Random number generation failed
    #[error("Random number generation failed: {0}")]
    RandomGeneration(String),

    /// Configuration store operation failed
    #[error("Storage backend error: {operation} failed - {details}")]
    Storage {
        /// The storage operation that failed
        operation: String,
        /// Detailed error information
        details: String,
    },

    /// Internal error occurred
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Caller-visible error classes
///
/// The service boundary maps each class 1:1 onto a transport status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed input: configs, CSRs, unsupported backend or key types
    Validation,
    /// Unknown signer id
    NotFound,
    /// Duplicate signer id on insert
    Conflict,
    /// Cryptographic primitive, parsing, randomness or storage failure
    Internal,
}

impl ErrorKind {
    /// Status code string for the transport layer
    pub fn code(self) -> &'static str {
        match self {
            Self::Validation => "invalid_argument",
            Self::NotFound => "not_found",
            Self::Conflict => "already_exists",
            Self::Internal => "internal",
        }
    }
}

impl SignerError {
    /// Classify this error for the service boundary
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidConfig(_)
            | Self::MissingBackendConfig
            | Self::UnsupportedBackend(_)
            | Self::UnsupportedKeyAlgorithm(_)
            | Self::MissingCsr
            | Self::MalformedCsr(_)
            | Self::CsrSignature(_)
            | Self::InvalidDuration(_) => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::KeyGeneration(_)
            | Self::CertificateConstruction(_)
            | Self::CertificateParsing(_)
            | Self::RandomGeneration(_)
            | Self::Storage { .. }
            | Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Create a storage error for the named store operation
    pub fn storage(operation: impl Into<String>, details: impl std::fmt::Display) -> Self {
        Self::Storage {
            operation: operation.into(),
            details: details.to_string(),
        }
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

/// Result type for signer operations
pub type Result<T> = std::result::Result<T, SignerError>;
