//! PKCS#7 / CMS `SignedData` domain types and decoding.
//!
//! Decoding is structural only. Nothing here verifies a signature or builds a
//! chain; those belong to the trust engine.

use crate::domain::constants::MAX_SIGNER_INFO_SIZE;
use crate::domain::crypto::CertificateStore;
use crate::infra::error::{ValidationError, ValidationResult};
use cms::cert::CertificateChoices;
use cms::content_info::ContentInfo;
use cms::signed_data::{SignedData, SignerIdentifier, SignerInfo};
use const_oid::db::rfc6268::{ID_MESSAGE_DIGEST, ID_SIGNED_DATA};
use der::asn1::{AnyRef, ObjectIdentifier, OctetString};
use der::{Any, Decode, Encode, Reader, SliceReader, Tag, TagNumber, Tagged};
use std::fmt;
use x509_cert::name::Name;
use x509_cert::serial_number::SerialNumber;
use x509_cert::Certificate;

/// Raw signature bytes that followed the p7x header.
#[derive(Clone, PartialEq, Eq)]
pub struct SignatureBlob {
    der: Vec<u8>,
}

impl SignatureBlob {
    #[must_use]
    pub fn from_der(der: Vec<u8>) -> Self {
        Self { der }
    }
    #[must_use]
    pub fn as_der(&self) -> &[u8] {
        &self.der
    }
    #[must_use]
    pub fn len(&self) -> usize {
        self.der.len()
    }
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.der.is_empty()
    }
}

impl fmt::Debug for SignatureBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SignatureBlob(len={})", self.der.len())
    }
}

/// Content type reported when a blob is opened as "certificate or PKCS#7".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    /// A single DER-encoded X.509 certificate.
    Certificate,
    /// Signed-data carrying at least one `SignerInfo`.
    Pkcs7Signed,
    /// Signed-data without signers (a certificate bundle).
    Pkcs7Unsigned,
}

/// `(issuer, serialNumber)` of the first `SignerInfo`.
#[derive(Clone, PartialEq, Eq)]
pub struct SignerIdentity {
    issuer: Name,
    serial_number: SerialNumber,
}

impl SignerIdentity {
    #[must_use]
    pub fn new(issuer: Name, serial_number: SerialNumber) -> Self {
        Self {
            issuer,
            serial_number,
        }
    }
    #[must_use]
    pub fn issuer(&self) -> &Name {
        &self.issuer
    }
    #[must_use]
    pub fn serial_number(&self) -> &SerialNumber {
        &self.serial_number
    }
}

impl fmt::Debug for SignerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SignerIdentity(issuer={}, serial={})",
            self.issuer,
            hex::encode(self.serial_number.as_bytes())
        )
    }
}

/// Tag of the implicitly tagged `signedAttrs` field of a `SignerInfo`.
const SIGNED_ATTRIBUTES_TAG: Tag = Tag::ContextSpecific {
    constructed: true,
    number: TagNumber::N0,
};

/// A decoded signed-data message.
///
/// The first signer is taken in transmitted order, and its signed attributes
/// are kept as sent: decoding a `SET OF` sorts it, so re-encoding the decoded
/// attributes need not reproduce the bytes that were signed.
#[derive(Clone)]
pub struct SignedMessage {
    signed_data: SignedData,
    signer: Option<SignerInfo>,
    signed_attributes: Option<Vec<u8>>,
}

impl SignedMessage {
    fn from_content(content: &Any) -> ValidationResult<Self> {
        let signed_data = parse_signed_data(content)?;
        let (signer, signed_attributes) = match first_transmitted_signer(content.value())? {
            Some((info, attributes)) => (Some(info), attributes),
            None => (None, None),
        };
        Ok(Self {
            signed_data,
            signer,
            signed_attributes,
        })
    }

    #[must_use]
    pub fn content_type(&self) -> &ObjectIdentifier {
        &self.signed_data.encap_content_info.econtent_type
    }

    #[must_use]
    pub fn signer_count(&self) -> usize {
        self.signed_data.signer_infos.0.len()
    }

    /// The first `SignerInfo`, bounded in size.
    pub fn signer_info(&self) -> ValidationResult<&SignerInfo> {
        let info = self
            .signer
            .as_ref()
            .ok_or_else(|| ValidationError::signature_invalid("signed message has no signer info"))?;

        let size = u32::from(info.encoded_len()?);
        if size == 0 || size >= MAX_SIGNER_INFO_SIZE {
            return Err(ValidationError::signature_invalid(format!(
                "signer info size out of bounds: {size} bytes"
            )));
        }
        Ok(info)
    }

    /// Identity used to locate the signing certificate in the message store.
    pub fn signer_identity(&self) -> ValidationResult<SignerIdentity> {
        match &self.signer_info()?.sid {
            SignerIdentifier::IssuerAndSerialNumber(iasn) => Ok(SignerIdentity::new(
                iasn.issuer.clone(),
                iasn.serial_number.clone(),
            )),
            SignerIdentifier::SubjectKeyIdentifier(_) => Err(ValidationError::signature_invalid(
                "signer info identifies the signer by subject key identifier only",
            )),
        }
    }

    /// Contents octets of the encapsulated content, if present.
    #[must_use]
    pub fn encapsulated_content(&self) -> Option<&[u8]> {
        self.signed_data
            .encap_content_info
            .econtent
            .as_ref()
            .map(der::Any::value)
    }

    /// Signed attributes of the first signer as transmitted, retagged as
    /// `SET OF`. These are the bytes the signature covers.
    pub fn signed_attributes_der(&self) -> ValidationResult<Option<&[u8]>> {
        self.signer_info()?;
        Ok(self.signed_attributes.as_deref())
    }

    /// Value of the `messageDigest` signed attribute.
    pub fn message_digest(&self) -> ValidationResult<Option<Vec<u8>>> {
        let Some(attrs) = &self.signer_info()?.signed_attrs else {
            return Ok(None);
        };
        let Some(attr) = attrs.iter().find(|a| a.oid == ID_MESSAGE_DIGEST) else {
            return Ok(None);
        };
        let value = attr.values.iter().next().ok_or_else(|| {
            ValidationError::signature_invalid("messageDigest attribute has no value")
        })?;
        let digest = value.decode_as::<OctetString>()?;
        Ok(Some(digest.as_bytes().to_vec()))
    }

    /// Raw signature value of the first signer.
    pub fn signature(&self) -> ValidationResult<&[u8]> {
        Ok(self.signer_info()?.signature.as_bytes())
    }
}

impl fmt::Debug for SignedMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SignedMessage(content_type={}, signers={})",
            self.content_type(),
            self.signer_count()
        )
    }
}

/// Decode a `ContentInfo` that must carry signed-data and return its
/// content.
///
/// Trailing bytes after the outer DER object are ignored.
fn signed_data_content(blob: &[u8]) -> ValidationResult<Any> {
    let mut reader = SliceReader::new(blob)
        .map_err(|_| ValidationError::signature_invalid("signature blob is too large"))?;
    let content_info = ContentInfo::decode(&mut reader).map_err(|e| {
        ValidationError::signature_invalid(format!("signature blob is not a PKCS#7 content info: {e}"))
    })?;

    if content_info.content_type != ID_SIGNED_DATA {
        return Err(ValidationError::signature_invalid(format!(
            "unexpected PKCS#7 content type {}",
            content_info.content_type
        )));
    }
    Ok(content_info.content)
}

fn parse_signed_data(content: &Any) -> ValidationResult<SignedData> {
    content.decode_as::<SignedData>().map_err(|e| {
        ValidationError::signature_invalid(format!("malformed PKCS#7 signed data: {e}"))
    })
}

/// Split concatenated DER elements without decoding their values.
fn der_elements(contents: &[u8]) -> ValidationResult<Vec<AnyRef<'_>>> {
    let mut reader = SliceReader::new(contents)?;
    let mut elements = Vec::new();
    while !reader.is_finished() {
        elements.push(AnyRef::decode(&mut reader)?);
    }
    Ok(elements)
}

/// First `SignerInfo` in transmitted order, with its signed attributes.
///
/// `contents` are the value octets of the `SignedData` sequence, whose last
/// field is `signerInfos`. Within a `SignerInfo`, `signedAttrs` follows
/// `version`, `sid` and `digestAlgorithm`.
fn first_transmitted_signer(
    contents: &[u8],
) -> ValidationResult<Option<(SignerInfo, Option<Vec<u8>>)>> {
    let fields = der_elements(contents)?;
    let Some(signer_infos) = fields.last().filter(|field| field.tag() == Tag::Set) else {
        return Err(ValidationError::signature_invalid(
            "signed data does not end with signer infos",
        ));
    };
    let Some(first) = der_elements(signer_infos.value())?.into_iter().next() else {
        return Ok(None);
    };

    let info = first.decode_as::<SignerInfo>()?;
    let signed_attributes = match der_elements(first.value())?.get(3) {
        Some(field) if field.tag() == SIGNED_ATTRIBUTES_TAG => {
            Some(AnyRef::new(Tag::Set, field.value())?.to_der()?)
        }
        _ => None,
    };
    Ok(Some((info, signed_attributes)))
}

fn embedded_certificates(signed_data: &SignedData) -> Vec<Certificate> {
    signed_data
        .certificates
        .as_ref()
        .map(|set| {
            set.0
                .iter()
                .filter_map(|choice| match choice {
                    CertificateChoices::Certificate(cert) => Some(cert.clone()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Open a blob that must be PKCS#7 signed-data.
pub fn decode_signed_message(blob: &[u8]) -> ValidationResult<(CertificateStore, SignedMessage)> {
    let message = SignedMessage::from_content(&signed_data_content(blob)?)?;
    let store = CertificateStore::from_certificates(
        ContentType::Pkcs7Signed,
        embedded_certificates(&message.signed_data),
    )?;
    log::debug!("Decoded signed message with {} embedded certificate(s)", store.len());
    Ok((store, message))
}

/// Open a blob that is either a bare certificate or a PKCS#7 bundle.
pub fn decode_certificate_or_pkcs7(blob: &[u8]) -> ValidationResult<CertificateStore> {
    if let Ok(certificate) = Certificate::from_der(blob) {
        log::debug!("Signature blob is a bare certificate");
        return CertificateStore::from_certificates(ContentType::Certificate, vec![certificate]);
    }

    let signed_data = parse_signed_data(&signed_data_content(blob)?)?;
    let content_type = if signed_data.signer_infos.0.is_empty() {
        ContentType::Pkcs7Unsigned
    } else {
        ContentType::Pkcs7Signed
    };
    CertificateStore::from_certificates(content_type, embedded_certificates(&signed_data))
}
