//! PKCS#10 certificate signing requests

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use rustls_pki_types::CertificateSigningRequestDer;
use x509_parser::certification_request::X509CertificationRequest;
use x509_parser::extensions::{GeneralName, ParsedExtension};
use x509_parser::prelude::FromDer;

use crate::error::{Result, SignerError};

/// A decoded CSR
///
/// Decoding checks structure only. Call [`CertificateRequest::verify`] before
/// trusting the public key; signers do this themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateRequest {
    der: Vec<u8>,
    subject: String,
    subject_der: Vec<u8>,
    common_name: Option<String>,
    public_key: Vec<u8>,
    dns_names: Vec<String>,
    ip_addresses: Vec<IpAddr>,
    email_addresses: Vec<String>,
    uris: Vec<String>,
}

impl CertificateRequest {
    /// Decode DER bytes
    ///
    /// # Errors
    ///
    /// Returns [`SignerError::MissingCsr`] for empty input and
    /// [`SignerError::MalformedCsr`] when the bytes are not a single PKCS#10
    /// structure.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        if der.is_empty() {
            return Err(SignerError::MissingCsr);
        }

        let request = parse(der)?;
        let info = &request.certification_request_info;

        let mut csr = Self {
            der: der.to_vec(),
            subject: info.subject.to_string(),
            subject_der: info.subject.as_raw().to_vec(),
            common_name: info
                .subject
                .iter_common_name()
                .next()
                .and_then(|cn| cn.as_str().ok())
                .map(str::to_string),
            public_key: info.subject_pki.raw.to_vec(),
            dns_names: Vec::new(),
            ip_addresses: Vec::new(),
            email_addresses: Vec::new(),
            uris: Vec::new(),
        };

        let Some(extensions) = request.requested_extensions() else {
            return Ok(csr);
        };
        for extension in extensions {
            let ParsedExtension::SubjectAlternativeName(san) = extension else {
                continue;
            };
            for name in &san.general_names {
                match name {
                    GeneralName::DNSName(dns) => csr.dns_names.push((*dns).to_string()),
                    GeneralName::RFC822Name(email) => {
                        csr.email_addresses.push((*email).to_string())
                    }
                    GeneralName::URI(uri) => csr.uris.push((*uri).to_string()),
                    GeneralName::IPAddress(octets) => {
                        csr.ip_addresses.push(ip_from_octets(octets)?)
                    }
                    _ => {}
                }
            }
        }

        Ok(csr)
    }

    /// Decode a typed DER request
    pub fn from_request_der(der: &CertificateSigningRequestDer<'_>) -> Result<Self> {
        Self::from_der(der.as_ref())
    }

    /// Check the self-signature against the embedded public key
    ///
    /// # Errors
    ///
    /// Returns [`SignerError::CsrSignature`] when verification fails.
    pub fn verify(&self) -> Result<()> {
        parse(&self.der)?
            .verify_signature()
            .map_err(|e| SignerError::CsrSignature(e.to_string()))
    }

    /// Original DER bytes
    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// Subject distinguished name in RFC 4514 form
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Subject Name exactly as encoded in the request
    pub fn subject_der(&self) -> &[u8] {
        &self.subject_der
    }

    /// Whether the subject Name holds no attributes
    pub fn has_empty_subject(&self) -> bool {
        // SEQUENCE with zero-length contents
        self.subject_der.len() == 2
    }

    /// First CN attribute of the subject, if any
    pub fn common_name(&self) -> Option<&str> {
        self.common_name.as_deref()
    }

    /// DER-encoded SubjectPublicKeyInfo
    pub fn public_key_info(&self) -> &[u8] {
        &self.public_key
    }

    /// Requested DNS names
    pub fn dns_names(&self) -> &[String] {
        &self.dns_names
    }

    /// Requested IP addresses
    pub fn ip_addresses(&self) -> &[IpAddr] {
        &self.ip_addresses
    }

    /// Requested email addresses
    pub fn email_addresses(&self) -> &[String] {
        &self.email_addresses
    }

    /// Requested URIs
    pub fn uris(&self) -> &[String] {
        &self.uris
    }
}

fn parse(der: &[u8]) -> Result<X509CertificationRequest<'_>> {
    let (rest, request) = X509CertificationRequest::from_der(der)
        .map_err(|e| SignerError::MalformedCsr(e.to_string()))?;
    if !rest.is_empty() {
        return Err(SignerError::MalformedCsr(format!(
            "{} trailing bytes after request",
            rest.len()
        )));
    }
    Ok(request)
}

fn ip_from_octets(octets: &[u8]) -> Result<IpAddr> {
    if let Ok(v4) = <[u8; 4]>::try_from(octets) {
        return Ok(IpAddr::V4(Ipv4Addr::from(v4)));
    }
    if let Ok(v6) = <[u8; 16]>::try_from(octets) {
        return Ok(IpAddr::V6(Ipv6Addr::from(v6)));
    }
    Err(SignerError::MalformedCsr(format!(
        "IP address SAN has {} octets",
        octets.len()
    )))
}
