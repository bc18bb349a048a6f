//! Rebinding rendered leaf certificates to a request's own subject and key
//!
//! rcgen renders the leaf from a template it fully understands, with
//! placeholder subject and key fields. [`rebind`] then replaces those two
//! TBSCertificate fields with the request's raw Name and
//! SubjectPublicKeyInfo bytes and re-signs with the issuer key, so neither
//! is ever re-encoded.

use der::asn1::BitStringRef;
use der::{Encode, Header, Length, Reader, SliceReader, Tag};
use northfoot_common::LoggingTransformer;
use rcgen::SigningKey;

use crate::error::{Result, SignerError};

// TBSCertificate field order: version, serialNumber, signature, issuer,
// validity, subject, subjectPublicKeyInfo, extensions
const SUBJECT_FIELD: usize = 5;
const PUBLIC_KEY_FIELD: usize = 6;

/// Swap subject and public key into a rendered v3 certificate and re-sign it
///
/// `subject` and `public_key_info` are complete DER elements (tag, length
/// and contents). The signature algorithm of `rendered` is kept, so `key`
/// must be the key that produced it.
///
/// # Errors
///
/// Returns [`SignerError::CertificateConstruction`] if `rendered` is not a
/// v3 certificate or signing fails.
pub(crate) fn rebind(
    rendered: &[u8],
    subject: &[u8],
    public_key_info: &[u8],
    key: &impl SigningKey,
) -> Result<Vec<u8>> {
    let mut certificate = SliceReader::new(rendered).map_err(malformed)?;
    enter(&mut certificate, Tag::Sequence)?;
    let (_, tbs) = read_element(&mut certificate)?;
    let (_, signature_algorithm) = read_element(&mut certificate)?;

    let mut fields = SliceReader::new(tbs).map_err(malformed)?;
    enter(&mut fields, Tag::Sequence)?;

    let mut content = Vec::with_capacity(tbs.len() + subject.len() + public_key_info.len());
    let mut index = 0;
    while !fields.is_finished() {
        let (tag, field) = read_element(&mut fields)?;
        if index == 0 && !tag.is_context_specific() {
            return Err(SignerError::CertificateConstruction(
                "rendered certificate is not version 3".to_string(),
            ));
        }
        match index {
            SUBJECT_FIELD => content.extend_from_slice(subject),
            PUBLIC_KEY_FIELD => content.extend_from_slice(public_key_info),
            _ => content.extend_from_slice(field),
        }
        index += 1;
    }
    if index <= PUBLIC_KEY_FIELD {
        return Err(SignerError::CertificateConstruction(format!(
            "rendered TBSCertificate has only {index} fields"
        )));
    }

    let tbs = sequence(&[&content])?;
    let signature = key.sign(&tbs).map_err(|e| {
        LoggingTransformer::log_crypto_error("sign leaf certificate", &e);
        SignerError::CertificateConstruction(format!("leaf signing failed: {e}"))
    })?;
    let signature = BitStringRef::from_bytes(&signature)
        .and_then(|bits| bits.to_der())
        .map_err(malformed)?;

    sequence(&[&tbs, signature_algorithm, &signature])
}

/// Step past the header of a constructed element with the given tag
fn enter(reader: &mut SliceReader<'_>, tag: Tag) -> Result<()> {
    let header = reader.peek_header().map_err(malformed)?;
    if header.tag != tag {
        return Err(SignerError::CertificateConstruction(format!(
            "expected {tag}, found {}",
            header.tag
        )));
    }
    let header_len = header.encoded_len().map_err(malformed)?;
    reader.read_slice(header_len).map_err(malformed)?;
    Ok(())
}

/// Read one complete element, header included
fn read_element<'a>(reader: &mut SliceReader<'a>) -> Result<(Tag, &'a [u8])> {
    let header = reader.peek_header().map_err(malformed)?;
    let header_len: usize = header
        .encoded_len()
        .and_then(usize::try_from)
        .map_err(malformed)?;
    let content_len: usize = usize::try_from(header.length).map_err(malformed)?;
    let total = Length::try_from(header_len + content_len).map_err(malformed)?;
    let element = reader.read_slice(total).map_err(malformed)?;
    Ok((header.tag, element))
}

fn sequence(parts: &[&[u8]]) -> Result<Vec<u8>> {
    let content_len: usize = parts.iter().map(|part| part.len()).sum();
    let header = Header::new(Tag::Sequence, content_len).map_err(malformed)?;

    let mut encoded = Vec::with_capacity(content_len + 8);
    header.encode_to_vec(&mut encoded).map_err(malformed)?;
    for part in parts {
        encoded.extend_from_slice(part);
    }
    Ok(encoded)
}

fn malformed(e: der::Error) -> SignerError {
    SignerError::CertificateConstruction(format!("DER re-encoding failed: {e}"))
}
