//! In-memory RSA signer
//!
//! Generates its own RSA key and self-signed CA root at construction. The key
//! lives only in this process; dropping the signer discards the CA.

use std::fmt;
use std::time::{Duration, SystemTime};

use northfoot_common::LoggingTransformer;
use rand::rng;
use rcgen::{Issuer, KeyPair, PKCS_RSA_SHA256};
use rsa::pkcs8::EncodePrivateKey;
use rsa::RsaPrivateKey;
use rustls_pki_types::{CertificateDer, PrivatePkcs8KeyDer};

use crate::certificate::IssuedCertificate;
use crate::csr::CertificateRequest;
use crate::error::{Result, SignerError};
use crate::policy;
use crate::template;

/// CA backed by an RSA key held in process memory
pub struct InMemoryRsaSigner {
    issuer: Issuer<'static, KeyPair>,
    ca: IssuedCertificate,
    key_bits: usize,
}

impl InMemoryRsaSigner {
    /// Generate a key of `key_bits` bits and bootstrap a CA root around it
    ///
    /// Key generation is CPU-bound and can take seconds at larger sizes; run
    /// it off the async executor.
    ///
    /// # Errors
    ///
    /// Returns [`SignerError::KeyGeneration`] if the key cannot be generated
    /// or loaded for signing, and [`SignerError::CertificateConstruction`] if
    /// the root cannot be self-signed.
    pub fn new(key_bits: usize) -> Result<Self> {
        let key_pair = generate_key_pair(key_bits)?;

        let serial = policy::random_serial()?;
        let params = policy::ca_params(&serial, SystemTime::now())?;
        let root = params.self_signed(&key_pair).map_err(|e| {
            LoggingTransformer::log_crypto_error("self-sign CA root", &e);
            SignerError::CertificateConstruction(format!("CA self-signing failed: {e}"))
        })?;
        let ca = IssuedCertificate::from_der(root.der().clone())?;

        Ok(Self {
            issuer: Issuer::new(params, key_pair),
            ca,
            key_bits,
        })
    }

    /// Issue a leaf certificate for a request
    ///
    /// The request's encoded subject and public key are copied byte for
    /// byte, and its DNS, email, IP and URI names become the SAN extension.
    /// Other requested extensions are ignored. The CA fixes serial,
    /// validity, key usages and basic constraints.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the request signature does not verify
    /// or the duration cannot be represented. Randomness and signing
    /// failures are internal errors.
    pub fn sign(
        &self,
        csr: &CertificateRequest,
        duration_hint: Duration,
    ) -> Result<IssuedCertificate> {
        csr.verify()?;

        let serial = policy::random_serial()?;
        let window = policy::validity_window(SystemTime::now(), duration_hint)?;

        let mut params = policy::leaf_template(csr)?;
        policy::apply_leaf_policy(&mut params, &serial, &window);

        // Rendered over the CA's own key, then rebound to the request's
        let rendered = params
            .signed_by(self.issuer.key(), &self.issuer)
            .map_err(|e| {
                LoggingTransformer::log_crypto_error("render leaf certificate", &e);
                SignerError::CertificateConstruction(format!("leaf rendering failed: {e}"))
            })?;
        let leaf = template::rebind(
            rendered.der().as_ref(),
            csr.subject_der(),
            csr.public_key_info(),
            self.issuer.key(),
        )?;
        let issued = IssuedCertificate::from_der(CertificateDer::from(leaf))?;

        LoggingTransformer::log_issuance(
            &issued.serial_hex(),
            issued.der().as_ref(),
            window.lifetime().as_secs(),
        );
        Ok(issued)
    }

    /// The self-signed root, alone
    pub fn trust_bundle(&self) -> Vec<IssuedCertificate> {
        vec![self.ca.clone()]
    }

    /// The self-signed root
    pub fn ca_certificate(&self) -> &IssuedCertificate {
        &self.ca
    }

    /// RSA modulus size
    pub fn key_bits(&self) -> usize {
        self.key_bits
    }
}

impl fmt::Debug for InMemoryRsaSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryRsaSigner")
            .field("key_bits", &self.key_bits)
            .field("ca_serial", &self.ca.serial_hex())
            .field("ca_subject", &self.ca.subject())
            .finish_non_exhaustive()
    }
}

fn generate_key_pair(key_bits: usize) -> Result<KeyPair> {
    let mut rng = rng();
    let private_key = RsaPrivateKey::new(&mut rng, key_bits)
        .map_err(|e| SignerError::KeyGeneration(format!("RSA key generation failed: {e}")))?;

    let pkcs8 = private_key
        .to_pkcs8_der()
        .map_err(|e| SignerError::KeyGeneration(format!("Private key encoding failed: {e}")))?;

    KeyPair::from_pkcs8_der_and_sign_algo(
        &PrivatePkcs8KeyDer::from(pkcs8.as_bytes()),
        &PKCS_RSA_SHA256,
    )
    .map_err(|e| SignerError::KeyGeneration(format!("RSA key rejected for signing: {e}")))
}
