//! Construction of live signers from persisted configuration

use northfoot_common::LoggingTransformer;

use crate::backend::{InMemoryRsaSigner, Signer};
use crate::config::{
    BackendConfig, InMemoryConfig, PrivateKeyType, SignerConfig, SignerId, SignerType,
    DEFAULT_RSA_KEY_BITS, MAX_RSA_KEY_BITS, MIN_RSA_KEY_BITS,
};
use crate::error::{Result, SignerError};

/// Build the signer a configuration describes
///
/// Dispatches on backend type, then on key algorithm. Construction generates
/// key material, so this is CPU-bound.
///
/// # Errors
///
/// Validation errors for an unspecified backend, absent backend parameters,
/// an unspecified or unimplemented key algorithm, or an out-of-range key
/// size. Internal errors if key generation or CA bootstrap fails.
pub fn build(config: &SignerConfig) -> Result<Signer> {
    match (config.signer_type, &config.signer_config) {
        (SignerType::Unspecified, _) => Err(SignerError::UnsupportedBackend(
            "signer type is unspecified".to_string(),
        )),
        (SignerType::Unrecognized, _) => Err(SignerError::UnsupportedBackend(
            "signer type is not recognized".to_string(),
        )),
        (_, None) => Err(SignerError::MissingBackendConfig),
        (SignerType::InMemory, Some(BackendConfig::InMemory(params))) => {
            build_in_memory(config.id, params)
        }
    }
}

fn build_in_memory(id: SignerId, params: &InMemoryConfig) -> Result<Signer> {
    match params.key {
        PrivateKeyType::Rsa => {
            let key_bits = match params.key_size {
                None => DEFAULT_RSA_KEY_BITS,
                Some(bits) if (MIN_RSA_KEY_BITS..=MAX_RSA_KEY_BITS).contains(&bits) => {
                    bits as usize
                }
                Some(bits) => {
                    return Err(SignerError::InvalidConfig(format!(
                        "signer key size {bits} is outside {MIN_RSA_KEY_BITS}..={MAX_RSA_KEY_BITS} bits"
                    )))
                }
            };

            let signer = InMemoryRsaSigner::new(key_bits)?;
            LoggingTransformer::log_signer_built(
                id,
                &SignerType::InMemory.to_string(),
                &PrivateKeyType::Rsa.to_string(),
                key_bits,
            );
            Ok(Signer::from(signer))
        }
        PrivateKeyType::Unspecified => Err(SignerError::UnsupportedKeyAlgorithm(
            "key algorithm is unspecified".to_string(),
        )),
        other => Err(SignerError::UnsupportedKeyAlgorithm(format!(
            "{other} is not implemented by the {} backend",
            SignerType::InMemory
        ))),
    }
}
