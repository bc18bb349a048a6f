//! Issuance policy shared by signer backends
//!
//! Everything here is pure apart from [`random_serial`]: the functions fill
//! `rcgen` templates and compute validity windows, leaving key handling to
//! the backend.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rcgen::string::Ia5String;
use rcgen::{
    BasicConstraints, CertificateParams, DistinguishedName, DnType, DnValue,
    ExtendedKeyUsagePurpose, IsCa, KeyIdMethod, KeyUsagePurpose, SanType, SerialNumber,
};
use sha2::{Digest, Sha256};

use crate::csr::CertificateRequest;
use crate::error::{Result, SignerError};

/// Lifetime of a freshly bootstrapped CA root
pub const CA_LIFETIME: Duration = Duration::from_secs(3650 * 24 * 60 * 60);

/// Leaf lifetime applied when the caller passes a zero duration hint
pub const DEFAULT_LEAF_LIFETIME: Duration = Duration::from_secs(60 * 60);

/// Country of the CA subject
pub const CA_COUNTRY: &str = "GB";
/// Organization of the CA subject
pub const CA_ORGANIZATION: &str = "Northfoot";
/// Organizational unit of the CA subject
pub const CA_ORGANIZATIONAL_UNIT: &str = "Development self-signed CA";
/// Common name of the CA subject
pub const CA_COMMON_NAME: &str = "Northfoot Development Self-Signed CA";
/// SPIFFE identity carried in the CA's SAN extension
pub const CA_SPIFFE_ID: &str = "spiffe://northfoot/ca";

// id-at-serialNumber
const SERIAL_NUMBER_OID: [u64; 4] = [2, 5, 4, 5];

// 9999-12-31T23:59:59Z, the last instant GeneralizedTime can express
const MAX_X509_UNIX_TIME: u64 = 253_402_300_799;

/// Raw certificate serial, big-endian
pub type Serial = [u8; 16];

/// Validity bounds of a certificate, truncated to whole seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidityWindow {
    /// NotBefore
    pub not_before: SystemTime,
    /// NotAfter
    pub not_after: SystemTime,
}

impl ValidityWindow {
    /// NotAfter minus NotBefore
    pub fn lifetime(&self) -> Duration {
        self.not_after
            .duration_since(self.not_before)
            .unwrap_or(Duration::ZERO)
    }
}

/// Draw a 128-bit serial from the operating system's random source
///
/// # Errors
///
/// Returns [`SignerError::RandomGeneration`] if the source is unavailable.
pub fn random_serial() -> Result<Serial> {
    let mut serial = [0u8; 16];
    getrandom::fill(&mut serial).map_err(|e| SignerError::RandomGeneration(e.to_string()))?;
    Ok(serial)
}

/// Compute the window for a leaf certificate issued at `now`
///
/// A zero hint means [`DEFAULT_LEAF_LIFETIME`]. Sub-second hints are rounded
/// up to the next whole second.
///
/// # Errors
///
/// Returns [`SignerError::InvalidDuration`] when NotAfter would fall past the
/// end of year 9999, and [`SignerError::Internal`] when the clock reads
/// earlier than the Unix epoch.
pub fn validity_window(now: SystemTime, hint: Duration) -> Result<ValidityWindow> {
    let lifetime = if hint.is_zero() {
        DEFAULT_LEAF_LIFETIME
    } else {
        let secs = hint
            .as_secs()
            .checked_add(u64::from(hint.subsec_nanos() > 0))
            .ok_or_else(|| SignerError::InvalidDuration(format!("{hint:?} overflows")))?;
        Duration::from_secs(secs)
    };
    window_from(now, lifetime)
}

/// Template for a self-signed CA root with the given serial
///
/// # Errors
///
/// Returns [`SignerError::CertificateConstruction`] if a subject or SAN
/// value cannot be encoded.
pub fn ca_params(serial: &Serial, now: SystemTime) -> Result<CertificateParams> {
    let window = window_from(now, CA_LIFETIME)?;

    let mut dn = DistinguishedName::new();
    dn.push(DnType::CountryName, printable(CA_COUNTRY)?);
    dn.push(DnType::OrganizationName, CA_ORGANIZATION);
    dn.push(DnType::OrganizationalUnitName, CA_ORGANIZATIONAL_UNIT);
    dn.push(DnType::CommonName, CA_COMMON_NAME);
    dn.push(
        DnType::CustomDnType(SERIAL_NUMBER_OID.to_vec()),
        printable(&u128::from_be_bytes(*serial).to_string())?,
    );

    let mut params = CertificateParams::default();
    params.distinguished_name = dn;
    params.serial_number = Some(SerialNumber::from_slice(serial));
    params.not_before = window.not_before.into();
    params.not_after = window.not_after.into();
    params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    params.key_usages = vec![
        KeyUsagePurpose::KeyCertSign,
        KeyUsagePurpose::CrlSign,
        KeyUsagePurpose::DigitalSignature,
        KeyUsagePurpose::DataEncipherment,
    ];
    params.extended_key_usages = vec![
        ExtendedKeyUsagePurpose::ServerAuth,
        ExtendedKeyUsagePurpose::ClientAuth,
        ExtendedKeyUsagePurpose::CodeSigning,
        ExtendedKeyUsagePurpose::EmailProtection,
        ExtendedKeyUsagePurpose::OcspSigning,
    ];
    params.subject_alt_names = vec![
        SanType::IpAddress(IpAddr::V4(Ipv4Addr::LOCALHOST)),
        SanType::IpAddress(IpAddr::V6(Ipv6Addr::LOCALHOST)),
        SanType::DnsName(
            "localhost"
                .try_into()
                .map_err(|e: rcgen::Error| SignerError::CertificateConstruction(e.to_string()))?,
        ),
        SanType::URI(
            CA_SPIFFE_ID
                .try_into()
                .map_err(|e: rcgen::Error| SignerError::CertificateConstruction(e.to_string()))?,
        ),
    ];

    Ok(params)
}

/// Leaf template carrying the request's SANs
///
/// Only DNS, email, IP and URI names are taken from the request; every other
/// requested extension is ignored. The subject is a placeholder that the
/// backend later replaces with the request's own encoded Name. It is left
/// empty when the request's subject is empty, so the SAN
/// extension is marked critical exactly when the final subject is empty.
///
/// # Errors
///
/// Returns [`SignerError::MalformedCsr`] if a requested name is not an
/// IA5String.
pub fn leaf_template(csr: &CertificateRequest) -> Result<CertificateParams> {
    let mut params = CertificateParams::default();

    let mut dn = DistinguishedName::new();
    if !csr.has_empty_subject() {
        dn.push(DnType::CommonName, "subject");
    }
    params.distinguished_name = dn;

    let mut names = Vec::new();
    for name in csr.dns_names() {
        names.push(SanType::DnsName(ia5(name)?));
    }
    for address in csr.email_addresses() {
        names.push(SanType::Rfc822Name(ia5(address)?));
    }
    names.extend(csr.ip_addresses().iter().copied().map(SanType::IpAddress));
    for uri in csr.uris() {
        names.push(SanType::URI(ia5(uri)?));
    }
    params.subject_alt_names = names;

    params.key_identifier_method = KeyIdMethod::PreSpecified(key_identifier(csr.public_key_info()));
    Ok(params)
}

/// Subject key identifier: leading 160 bits of SHA-256 over the SPKI
pub fn key_identifier(public_key_info: &[u8]) -> Vec<u8> {
    Sha256::digest(public_key_info)[..20].to_vec()
}

/// Overwrite the CA-controlled fields of a leaf template
///
/// Subject, public key and SANs stay as the request supplied them.
pub fn apply_leaf_policy(params: &mut CertificateParams, serial: &Serial, window: &ValidityWindow) {
    params.is_ca = IsCa::ExplicitNoCa;
    params.serial_number = Some(SerialNumber::from_slice(serial));
    params.not_before = window.not_before.into();
    params.not_after = window.not_after.into();
    params.key_usages = vec![
        KeyUsagePurpose::DigitalSignature,
        KeyUsagePurpose::KeyEncipherment,
    ];
    params.extended_key_usages = vec![
        ExtendedKeyUsagePurpose::ServerAuth,
        ExtendedKeyUsagePurpose::ClientAuth,
    ];
    params.use_authority_key_identifier_extension = true;
}

fn window_from(now: SystemTime, lifetime: Duration) -> Result<ValidityWindow> {
    let since_epoch = now
        .duration_since(UNIX_EPOCH)
        .map_err(|e| SignerError::internal(format!("system clock before Unix epoch: {e}")))?;
    let not_before_secs = since_epoch.as_secs();
    let not_after_secs = not_before_secs
        .checked_add(lifetime.as_secs())
        .filter(|secs| *secs <= MAX_X509_UNIX_TIME)
        .ok_or_else(|| {
            SignerError::InvalidDuration(format!(
                "lifetime of {}s exceeds the X.509 time range",
                lifetime.as_secs()
            ))
        })?;

    Ok(ValidityWindow {
        not_before: UNIX_EPOCH + Duration::from_secs(not_before_secs),
        not_after: UNIX_EPOCH + Duration::from_secs(not_after_secs),
    })
}

fn ia5(value: &str) -> Result<Ia5String> {
    Ia5String::try_from(value).map_err(|e| SignerError::MalformedCsr(e.to_string()))
}

fn printable(value: &str) -> Result<DnValue> {
    Ok(DnValue::PrintableString(value.try_into().map_err(
        |e: rcgen::Error| SignerError::CertificateConstruction(e.to_string()),
    )?))
}
