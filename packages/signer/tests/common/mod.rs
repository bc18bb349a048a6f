//! Shared fixtures for signer integration tests

#![allow(dead_code)]

use der::asn1::{
    BitStringRef, Ia5StringRef, ObjectIdentifier, OctetStringRef, PrintableStringRef,
    Utf8StringRef,
};
use der::{Encode, Header, Tag, TagNumber};
use rcgen::{
    CertificateParams, DistinguishedName, DnType, KeyPair, PublicKeyData, SanType, SigningKey,
    PKCS_ECDSA_P256_SHA256,
};

/// id-at-commonName
pub const CN: &str = "2.5.4.3";
/// id-at-organizationName
pub const O: &str = "2.5.4.10";
/// id-at-organizationalUnitName
pub const OU: &str = "2.5.4.11";
/// id-at-countryName
pub const C: &str = "2.5.4.6";

/// DER CSR with the given common name and SANs, signed by a fresh P-256 key
pub fn csr_der(common_name: &str, subject_alt_names: Vec<SanType>) -> Vec<u8> {
    let mut params = CertificateParams::default();
    let mut dn = DistinguishedName::new();
    dn.push(DnType::CommonName, common_name);
    params.distinguished_name = dn;
    params.subject_alt_names = subject_alt_names;

    let key_pair = KeyPair::generate().expect("Failed to generate CSR key");
    params
        .serialize_request(&key_pair)
        .expect("Failed to serialize CSR")
        .der()
        .to_vec()
}

/// CSR with CN "test" and no SANs
pub fn simple_csr_der() -> Vec<u8> {
    csr_der("test", Vec::new())
}

/// Flip one bit of the signature so the request no longer verifies
pub fn tampered(mut der: Vec<u8>) -> Vec<u8> {
    let last = der.len() - 1;
    der[last] ^= 0x01;
    der
}

/// DNS SAN
pub fn dns(name: &str) -> SanType {
    SanType::DnsName(name.try_into().expect("valid DNS name"))
}

/// Email SAN
pub fn email(address: &str) -> SanType {
    SanType::Rfc822Name(address.try_into().expect("valid email"))
}

/// URI SAN
pub fn uri(value: &str) -> SanType {
    SanType::URI(value.try_into().expect("valid URI"))
}

/// IP SAN
pub fn ip(value: &str) -> SanType {
    SanType::IpAddress(value.parse().expect("valid IP address"))
}

fn tlv(tag: Tag, parts: &[&[u8]]) -> Vec<u8> {
    let content = parts.concat();
    let mut encoded = Vec::new();
    Header::new(tag, content.len())
        .expect("length fits")
        .encode_to_vec(&mut encoded)
        .expect("header encodes");
    encoded.extend_from_slice(&content);
    encoded
}

fn oid(dotted: &str) -> Vec<u8> {
    ObjectIdentifier::new_unwrap(dotted).to_der().expect("OID encodes")
}

/// UTF8String attribute value
pub fn utf8(value: &str) -> Vec<u8> {
    Utf8StringRef::new(value).expect("utf8").to_der().expect("encode")
}

/// PrintableString attribute value
pub fn printable(value: &str) -> Vec<u8> {
    PrintableStringRef::new(value)
        .expect("printable")
        .to_der()
        .expect("encode")
}

/// AttributeTypeAndValue
pub fn attribute(attr_type: &str, value: Vec<u8>) -> Vec<u8> {
    tlv(Tag::Sequence, &[&oid(attr_type), &value])
}

/// RelativeDistinguishedName; several attributes make it multi-valued
pub fn rdn(mut attributes: Vec<Vec<u8>>) -> Vec<u8> {
    // DER orders SET OF members by encoding
    attributes.sort();
    let parts: Vec<&[u8]> = attributes.iter().map(Vec::as_slice).collect();
    tlv(Tag::Set, &parts)
}

/// Name from RDNs in order
pub fn name(rdns: &[Vec<u8>]) -> Vec<u8> {
    let parts: Vec<&[u8]> = rdns.iter().map(Vec::as_slice).collect();
    tlv(Tag::Sequence, &parts)
}

/// Extension with the given DER value, non-critical
pub fn extension(ext_id: &str, value: &[u8]) -> Vec<u8> {
    let wrapped = OctetStringRef::new(value)
        .expect("octets")
        .to_der()
        .expect("encode");
    tlv(Tag::Sequence, &[&oid(ext_id), &wrapped])
}

/// subjectKeyIdentifier extension
pub fn subject_key_identifier_ext(identifier: &[u8]) -> Vec<u8> {
    let value = OctetStringRef::new(identifier)
        .expect("octets")
        .to_der()
        .expect("encode");
    extension("2.5.29.14", &value)
}

/// subjectAltName extension with DNS names only
pub fn dns_san_ext(names: &[&str]) -> Vec<u8> {
    let dns_tag = Tag::ContextSpecific {
        constructed: false,
        number: TagNumber::N2,
    };
    let entries: Vec<Vec<u8>> = names
        .iter()
        .map(|dns| {
            Ia5StringRef::new(dns).expect("ia5");
            tlv(dns_tag, &[dns.as_bytes()])
        })
        .collect();
    let parts: Vec<&[u8]> = entries.iter().map(Vec::as_slice).collect();
    extension("2.5.29.17", &tlv(Tag::Sequence, &parts))
}

/// extKeyUsage extension listing the given purpose OIDs
pub fn eku_ext(purposes: &[&str]) -> Vec<u8> {
    let encoded: Vec<Vec<u8>> = purposes.iter().map(|purpose| oid(purpose)).collect();
    let parts: Vec<&[u8]> = encoded.iter().map(Vec::as_slice).collect();
    extension("2.5.29.37", &tlv(Tag::Sequence, &parts))
}

/// DER CSR with a hand-encoded subject and extension request, signed by a
/// fresh P-256 key
pub fn raw_csr_der(subject: &[u8], extensions: &[Vec<u8>]) -> Vec<u8> {
    let key_pair = KeyPair::generate_for(&PKCS_ECDSA_P256_SHA256).expect("CSR key");

    let attributes_tag = Tag::ContextSpecific {
        constructed: true,
        number: TagNumber::N0,
    };
    let attributes = if extensions.is_empty() {
        tlv(attributes_tag, &[])
    } else {
        let parts: Vec<&[u8]> = extensions.iter().map(Vec::as_slice).collect();
        let requested = tlv(Tag::Sequence, &parts);
        // pkcs-9-at-extensionRequest
        let attribute = tlv(
            Tag::Sequence,
            &[&oid("1.2.840.113549.1.9.14"), &tlv(Tag::Set, &[&requested])],
        );
        tlv(attributes_tag, &[&attribute])
    };

    let version = 0u8.to_der().expect("version");
    let info = tlv(
        Tag::Sequence,
        &[
            &version,
            subject,
            &key_pair.subject_public_key_info(),
            &attributes,
        ],
    );

    let signature = key_pair.sign(&info).expect("sign request");
    let signature = BitStringRef::from_bytes(&signature)
        .expect("bits")
        .to_der()
        .expect("encode");
    // ecdsa-with-SHA256
    let algorithm = tlv(Tag::Sequence, &[&oid("1.2.840.10045.4.3.2")]);

    tlv(Tag::Sequence, &[&info, &algorithm, &signature])
}
