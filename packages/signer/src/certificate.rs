//! Structured view of an X.509 certificate produced by a signer

use rustls_pki_types::CertificateDer;
use sha2::{Digest, Sha256};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::error::{Result, SignerError};

/// DER certificate plus the fields callers and logs care about
///
/// Instances are only created by parsing DER, so the summary fields always
/// agree with the encoded certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedCertificate {
    der: CertificateDer<'static>,
    serial: Vec<u8>,
    subject: String,
    issuer: String,
    not_before: SystemTime,
    not_after: SystemTime,
    is_ca: bool,
}

impl IssuedCertificate {
    /// Parse a DER certificate
    ///
    /// # Errors
    ///
    /// Returns [`SignerError::CertificateParsing`] if the bytes are not a
    /// single well-formed certificate or its validity window is empty.
    pub fn from_der(der: CertificateDer<'static>) -> Result<Self> {
        let (serial, subject, issuer, not_before, not_after, is_ca) = {
            let (rest, cert) = x509_parser::parse_x509_certificate(der.as_ref())
                .map_err(|e| SignerError::CertificateParsing(e.to_string()))?;
            if !rest.is_empty() {
                return Err(SignerError::CertificateParsing(format!(
                    "{} trailing bytes after certificate",
                    rest.len()
                )));
            }
            let validity = cert.validity();
            (
                cert.raw_serial().to_vec(),
                cert.subject().to_string(),
                cert.issuer().to_string(),
                unix_to_system_time(validity.not_before.timestamp())?,
                unix_to_system_time(validity.not_after.timestamp())?,
                cert.is_ca(),
            )
        };

        if not_after <= not_before {
            return Err(SignerError::CertificateParsing(
                "certificate NotAfter is not later than NotBefore".to_string(),
            ));
        }

        Ok(Self {
            der,
            serial,
            subject,
            issuer,
            not_before,
            not_after,
            is_ca,
        })
    }

    /// DER encoding
    pub fn der(&self) -> &CertificateDer<'static> {
        &self.der
    }

    /// Consume into the DER encoding
    pub fn into_der(self) -> CertificateDer<'static> {
        self.der
    }

    /// Serial number as encoded, big-endian
    pub fn serial(&self) -> &[u8] {
        &self.serial
    }

    /// Serial number as lowercase hex
    pub fn serial_hex(&self) -> String {
        hex::encode(&self.serial)
    }

    /// Subject distinguished name in RFC 4514 form
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Issuer distinguished name in RFC 4514 form
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Start of the validity window
    pub fn not_before(&self) -> SystemTime {
        self.not_before
    }

    /// End of the validity window
    pub fn not_after(&self) -> SystemTime {
        self.not_after
    }

    /// Length of the validity window
    pub fn lifetime(&self) -> Duration {
        self.not_after
            .duration_since(self.not_before)
            .unwrap_or(Duration::ZERO)
    }

    /// Whether BasicConstraints marks this certificate as a CA
    pub fn is_ca(&self) -> bool {
        self.is_ca
    }

    /// SHA-256 over the DER encoding, lowercase hex
    pub fn fingerprint(&self) -> String {
        hex::encode(Sha256::digest(self.der.as_ref()))
    }
}

fn unix_to_system_time(timestamp: i64) -> Result<SystemTime> {
    let secs = u64::try_from(timestamp).map_err(|_| {
        SignerError::CertificateParsing(format!("validity bound {timestamp} predates the epoch"))
    })?;
    Ok(UNIX_EPOCH + Duration::from_secs(secs))
}
