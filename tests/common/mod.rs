//! Shared fixtures for integration tests.
//!
//! Generates P-256 keys, root / intermediate / leaf certificates with chosen
//! EKUs, PKCS#7 signed blobs and p7x containers with OpenSSL. Nothing touches
//! the network or the system certificate store.

#![allow(dead_code)]

use cms::cert::CertificateChoices;
use cms::content_info::{CmsVersion, ContentInfo};
use cms::signed_data::{CertificateSet, EncapsulatedContentInfo, SignedData, SignerInfos};
use const_oid::db::rfc5912::{ECDSA_WITH_SHA_256, ID_SHA_256};
use const_oid::db::rfc6268::{ID_CONTENT_TYPE, ID_DATA, ID_MESSAGE_DIGEST, ID_SIGNED_DATA};
use der::asn1::{AnyRef, ObjectIdentifier, SetOfVec};
use der::{Any, Decode, Encode};
use openssl::asn1::{Asn1Object, Asn1OctetString, Asn1Time};
use openssl::bn::BigNum;
use openssl::ec::{EcGroup, EcKey};
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkcs7::{Pkcs7, Pkcs7Flags};
use openssl::pkey::{PKey, Private};
use openssl::sign::Signer;
use openssl::stack::Stack;
use openssl::x509::extension::{
    AuthorityKeyIdentifier, BasicConstraints, ExtendedKeyUsage, KeyUsage, SubjectKeyIdentifier,
};
use openssl::x509::{X509Builder, X509Extension, X509NameBuilder, X509};
use p7x_validator::adapters::{OpenSslTrustEngine, TrustAnchors};
use p7x_validator::domain::constants::{CODE_SIGNING_EKU_OID, SPC_INDIRECT_DATA};
use p7x_validator::domain::pkcs7::SignerIdentity;
use p7x_validator::{AnchorClass, P7X_FILE_ID};
use std::io::Cursor;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Bytes signed by every fixture message.
pub const SIGNED_CONTENT: &[u8] = b"p7x fixture: package block map digest";

static NEXT_SERIAL: AtomicU32 = AtomicU32::new(1);

/// A certificate together with its private key.
pub struct Issued {
    pub cert: X509,
    pub key: PKey<Private>,
}

impl Issued {
    pub fn der(&self) -> Vec<u8> {
        self.cert.to_der().unwrap()
    }

    pub fn pem(&self) -> Vec<u8> {
        self.cert.to_pem().unwrap()
    }

    pub fn x509_cert(&self) -> x509_cert::Certificate {
        x509_cert::Certificate::from_der(&self.der()).unwrap()
    }

    pub fn identity(&self) -> SignerIdentity {
        let cert = self.x509_cert();
        SignerIdentity::new(
            cert.tbs_certificate.issuer.clone(),
            cert.tbs_certificate.serial_number.clone(),
        )
    }

    /// Lowercase hex SHA-256 of the DER encoding.
    pub fn thumbprint(&self) -> String {
        hex::encode(&*self.cert.digest(MessageDigest::sha256()).unwrap())
    }
}

/// EKU extension to put on a generated certificate.
#[derive(Clone, Copy)]
pub enum Eku<'a> {
    /// No EKU extension at all.
    Absent,
    /// An EKU extension with no identifiers.
    Empty,
    /// An EKU extension with these identifiers.
    Oids(&'a [&'a str]),
}

fn ec_key() -> PKey<Private> {
    let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();
    PKey::from_ec_key(EcKey::generate(&group).unwrap()).unwrap()
}

fn name(common_name: &str) -> openssl::x509::X509Name {
    let mut builder = X509NameBuilder::new().unwrap();
    builder.append_entry_by_text("O", "p7x fixtures").unwrap();
    builder.append_entry_by_text("CN", common_name).unwrap();
    builder.build()
}

fn eku_extension(eku: Eku<'_>) -> Option<X509Extension> {
    match eku {
        Eku::Absent => None,
        Eku::Empty => {
            let oid = Asn1Object::from_str("2.5.29.37").unwrap();
            let empty_sequence = Asn1OctetString::new_from_bytes(&[0x30, 0x00]).unwrap();
            Some(X509Extension::new_from_der(&oid, false, &empty_sequence).unwrap())
        }
        Eku::Oids(oids) => {
            let mut usage = ExtendedKeyUsage::new();
            for oid in oids {
                if *oid == CODE_SIGNING_EKU_OID {
                    usage.code_signing();
                } else {
                    usage.other(oid);
                }
            }
            Some(usage.build().unwrap())
        }
    }
}

fn issue(common_name: &str, issuer: Option<&Issued>, ca: bool, eku: Eku<'_>) -> Issued {
    let key = ec_key();
    let subject = name(common_name);

    let mut builder = X509Builder::new().unwrap();
    builder.set_version(2).unwrap();
    let serial = BigNum::from_u32(NEXT_SERIAL.fetch_add(1, Ordering::Relaxed))
        .unwrap()
        .to_asn1_integer()
        .unwrap();
    builder.set_serial_number(&serial).unwrap();
    builder.set_subject_name(&subject).unwrap();
    match issuer {
        Some(issuer) => builder.set_issuer_name(issuer.cert.subject_name()).unwrap(),
        None => builder.set_issuer_name(&subject).unwrap(),
    }
    builder.set_pubkey(&key).unwrap();

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64;
    builder
        .set_not_before(&Asn1Time::from_unix(now - 86_400).unwrap())
        .unwrap();
    builder
        .set_not_after(&Asn1Time::days_from_now(365).unwrap())
        .unwrap();

    if ca {
        builder
            .append_extension(BasicConstraints::new().critical().ca().build().unwrap())
            .unwrap();
        builder
            .append_extension(
                KeyUsage::new()
                    .critical()
                    .key_cert_sign()
                    .crl_sign()
                    .build()
                    .unwrap(),
            )
            .unwrap();
    } else {
        builder
            .append_extension(BasicConstraints::new().build().unwrap())
            .unwrap();
        builder
            .append_extension(
                KeyUsage::new()
                    .critical()
                    .digital_signature()
                    .build()
                    .unwrap(),
            )
            .unwrap();
    }

    let ski = SubjectKeyIdentifier::new()
        .build(&builder.x509v3_context(issuer.map(|i| i.cert.as_ref()), None))
        .unwrap();
    builder.append_extension(ski).unwrap();
    if let Some(issuer) = issuer {
        let aki = AuthorityKeyIdentifier::new()
            .keyid(false)
            .build(&builder.x509v3_context(Some(issuer.cert.as_ref()), None))
            .unwrap();
        builder.append_extension(aki).unwrap();
    }

    if let Some(extension) = eku_extension(eku) {
        builder.append_extension(extension).unwrap();
    }

    let signing_key = issuer.map_or(&key, |i| &i.key);
    builder.sign(signing_key, MessageDigest::sha256()).unwrap();

    Issued {
        cert: builder.build(),
        key,
    }
}

pub fn root(common_name: &str) -> Issued {
    issue(common_name, None, true, Eku::Absent)
}

pub fn intermediate(common_name: &str, issuer: &Issued) -> Issued {
    issue(common_name, Some(issuer), true, Eku::Absent)
}

pub fn leaf(common_name: &str, issuer: &Issued, eku: Eku<'_>) -> Issued {
    issue(common_name, Some(issuer), false, eku)
}

/// Self-signed end-entity certificate (not a CA).
pub fn self_signed_leaf(common_name: &str) -> Issued {
    issue(common_name, None, false, Eku::Absent)
}

/// Root, intermediate and leaf with the given leaf EKU.
pub struct Hierarchy {
    pub root: Issued,
    pub intermediate: Issued,
    pub leaf: Issued,
}

impl Hierarchy {
    pub fn new(leaf_eku: Eku<'_>) -> Self {
        let root = root("Fixture Root");
        let intermediate = intermediate("Fixture Intermediate", &root);
        let leaf = leaf("Fixture Signer", &intermediate, leaf_eku);
        Self {
            root,
            intermediate,
            leaf,
        }
    }

    /// Signed-data by the leaf, embedding the leaf and the intermediate.
    pub fn signed_blob(&self) -> Vec<u8> {
        sign(&self.leaf, &[&self.intermediate])
    }

    /// Signed-data by the leaf, embedding only the leaf.
    pub fn signed_blob_without_intermediate(&self) -> Vec<u8> {
        sign(&self.leaf, &[])
    }

    /// Hand-assembled signed-data by the leaf, embedding the intermediate.
    pub fn assembled(&self) -> AssembledMessage<'_> {
        AssembledMessage::new(&self.leaf, &[&self.intermediate])
    }

    /// Engine trusting this hierarchy's root under `class`.
    pub fn engine(&self, class: AnchorClass) -> OpenSslTrustEngine {
        engine_with_anchor(class, &self.root)
    }
}

/// PKCS#7 signed-data over [`SIGNED_CONTENT`] with signed attributes.
pub fn sign(signer: &Issued, extra: &[&Issued]) -> Vec<u8> {
    let mut certs = Stack::new().unwrap();
    for cert in extra {
        certs.push(cert.cert.clone()).unwrap();
    }
    Pkcs7::sign(
        &signer.cert,
        &signer.key,
        &certs,
        SIGNED_CONTENT,
        Pkcs7Flags::BINARY,
    )
    .unwrap()
    .to_der()
    .unwrap()
}

/// DER TLV with a single-octet tag.
pub fn der_tlv(tag: u8, value: &[u8]) -> Vec<u8> {
    let mut encoded = vec![tag];
    if value.len() < 0x80 {
        encoded.push(value.len() as u8);
    } else {
        let length = value.len().to_be_bytes();
        let skip = length.iter().take_while(|byte| **byte == 0).count();
        encoded.push(0x80 | (length.len() - skip) as u8);
        encoded.extend_from_slice(&length[skip..]);
    }
    encoded.extend_from_slice(value);
    encoded
}

fn oid_der(oid: ObjectIdentifier) -> Vec<u8> {
    oid.to_der().unwrap()
}

fn sha256_algorithm() -> Vec<u8> {
    der_tlv(0x30, &oid_der(ID_SHA_256))
}

pub fn sha256(bytes: &[u8]) -> Vec<u8> {
    openssl::hash::hash(MessageDigest::sha256(), bytes)
        .unwrap()
        .to_vec()
}

/// `SpcIndirectDataContent` naming a SIP-info subject and the SHA-256 of
/// [`SIGNED_CONTENT`].
pub fn spc_indirect_data_content() -> Vec<u8> {
    let sip_info = ObjectIdentifier::new_unwrap("1.3.6.1.4.1.311.2.1.30");
    let data = der_tlv(0x30, &oid_der(sip_info));
    let digest_info = der_tlv(
        0x30,
        &[sha256_algorithm(), der_tlv(0x04, &sha256(SIGNED_CONTENT))].concat(),
    );
    der_tlv(0x30, &[data, digest_info].concat())
}

/// Encapsulated content of a hand-assembled message.
#[derive(Clone, Copy)]
pub enum Content {
    /// `id-data` OCTET STRING holding [`SIGNED_CONTENT`].
    Data,
    /// Authenticode `SpcIndirectDataContent` SEQUENCE.
    SpcIndirectData,
}

impl Content {
    fn content_type(self) -> ObjectIdentifier {
        match self {
            Content::Data => ID_DATA,
            Content::SpcIndirectData => SPC_INDIRECT_DATA,
        }
    }

    /// Full `eContent` TLV.
    pub fn encoded(self) -> Vec<u8> {
        match self {
            Content::Data => der_tlv(0x04, SIGNED_CONTENT),
            Content::SpcIndirectData => spc_indirect_data_content(),
        }
    }
}

/// Order of the signed attributes as transmitted.
#[derive(Clone, Copy)]
pub enum AttributeOrder {
    /// DER order: `contentType` (shorter encoding) before `messageDigest`.
    Sorted,
    /// `messageDigest` first.
    Unsorted,
}

/// Signed-data assembled byte by byte, for shapes `Pkcs7::sign` never emits.
pub struct AssembledMessage<'a> {
    pub signer: &'a Issued,
    pub extra: Vec<&'a Issued>,
    pub content: Content,
    pub order: AttributeOrder,
    /// Replaces the `messageDigest` value computed over the content octets.
    pub message_digest: Option<Vec<u8>>,
}

impl<'a> AssembledMessage<'a> {
    pub fn new(signer: &'a Issued, extra: &[&'a Issued]) -> Self {
        Self {
            signer,
            extra: extra.to_vec(),
            content: Content::Data,
            order: AttributeOrder::Sorted,
            message_digest: None,
        }
    }

    pub fn content(mut self, content: Content) -> Self {
        self.content = content;
        self
    }

    pub fn order(mut self, order: AttributeOrder) -> Self {
        self.order = order;
        self
    }

    pub fn message_digest(mut self, digest: Vec<u8>) -> Self {
        self.message_digest = Some(digest);
        self
    }

    /// The signed attributes exactly as they appear inside `[0]`.
    pub fn signed_attributes(&self) -> Vec<u8> {
        let econtent = self.content.encoded();
        let digest = self.message_digest.clone().unwrap_or_else(|| {
            // The digest covers the contents octets only, not tag and length.
            sha256(AnyRef::from_der(&econtent).unwrap().value())
        });
        let content_type = der_tlv(
            0x30,
            &[
                oid_der(ID_CONTENT_TYPE),
                der_tlv(0x31, &oid_der(self.content.content_type())),
            ]
            .concat(),
        );
        let message_digest = der_tlv(
            0x30,
            &[
                oid_der(ID_MESSAGE_DIGEST),
                der_tlv(0x31, &der_tlv(0x04, &digest)),
            ]
            .concat(),
        );
        match self.order {
            AttributeOrder::Sorted => [content_type, message_digest].concat(),
            AttributeOrder::Unsorted => [message_digest, content_type].concat(),
        }
    }

    pub fn to_der(&self) -> Vec<u8> {
        let attributes = self.signed_attributes();
        let mut signer = Signer::new(MessageDigest::sha256(), &self.signer.key).unwrap();
        signer.update(&der_tlv(0x31, &attributes)).unwrap();
        let signature = signer.sign_to_vec().unwrap();

        let tbs = self.signer.x509_cert().tbs_certificate;
        let issuer_and_serial = der_tlv(
            0x30,
            &[tbs.issuer.to_der().unwrap(), tbs.serial_number.to_der().unwrap()].concat(),
        );
        let signer_info = der_tlv(
            0x30,
            &[
                vec![0x02, 0x01, 0x01],
                issuer_and_serial,
                sha256_algorithm(),
                der_tlv(0xa0, &attributes),
                der_tlv(0x30, &oid_der(ECDSA_WITH_SHA_256)),
                der_tlv(0x04, &signature),
            ]
            .concat(),
        );

        let mut certificates = std::iter::once(self.signer)
            .chain(self.extra.iter().copied())
            .map(Issued::der)
            .collect::<Vec<_>>();
        certificates.sort();

        let encap_content_info = der_tlv(
            0x30,
            &[
                oid_der(self.content.content_type()),
                der_tlv(0xa0, &self.content.encoded()),
            ]
            .concat(),
        );
        let signed_data = der_tlv(
            0x30,
            &[
                vec![0x02, 0x01, 0x01],
                der_tlv(0x31, &sha256_algorithm()),
                encap_content_info,
                der_tlv(0xa0, &certificates.concat()),
                der_tlv(0x31, &signer_info),
            ]
            .concat(),
        );
        der_tlv(
            0x30,
            &[oid_der(ID_SIGNED_DATA), der_tlv(0xa0, &signed_data)].concat(),
        )
    }
}

/// Signed-data without signers carrying `certs` (a certificate bundle).
pub fn certificate_bundle(certs: &[&Issued]) -> Vec<u8> {
    let choices = certs
        .iter()
        .map(|cert| CertificateChoices::Certificate(cert.x509_cert()))
        .collect::<Vec<_>>();
    let signed_data = SignedData {
        version: CmsVersion::V1,
        digest_algorithms: SetOfVec::new(),
        encap_content_info: EncapsulatedContentInfo {
            econtent_type: ID_DATA,
            econtent: None,
        },
        certificates: Some(CertificateSet(SetOfVec::try_from(choices).unwrap())),
        crls: None,
        signer_infos: SignerInfos(SetOfVec::new()),
    };
    ContentInfo {
        content_type: ID_SIGNED_DATA,
        content: Any::encode_from(&signed_data).unwrap(),
    }
    .to_der()
    .unwrap()
}

/// Wrap a blob in a p7x container.
pub fn p7x(blob: &[u8]) -> Vec<u8> {
    let mut bytes = P7X_FILE_ID.to_le_bytes().to_vec();
    bytes.extend_from_slice(blob);
    bytes
}

pub fn p7x_stream(blob: &[u8]) -> Cursor<Vec<u8>> {
    Cursor::new(p7x(blob))
}

/// Flip one byte of the signed content inside a DER blob.
pub fn tamper_content(blob: &[u8]) -> Vec<u8> {
    let position = blob
        .windows(SIGNED_CONTENT.len())
        .position(|window| window == SIGNED_CONTENT)
        .expect("signed content present in blob");
    let mut tampered = blob.to_vec();
    tampered[position] ^= 0x01;
    tampered
}

pub fn engine_with_anchor(class: AnchorClass, anchor: &Issued) -> OpenSslTrustEngine {
    let mut anchors = TrustAnchors::new();
    anchors.add(class, anchor.cert.clone()).unwrap();
    OpenSslTrustEngine::new(anchors)
}

pub fn engine_without_anchors() -> OpenSslTrustEngine {
    OpenSslTrustEngine::new(TrustAnchors::new())
}
