//! Certificate store, certificate references and built chains.
//!
//! A [`CertificateStore`] owns every certificate found in a signature blob.
//! [`CertificateRef`] is a cheap borrow into one entry; the lifetime ties it to
//! the store so it can never outlive the call that opened the store.

use crate::domain::pkcs7::{ContentType, SignerIdentity};
use crate::domain::policy::AnchorClass;
use crate::infra::error::ValidationResult;
use const_oid::db::rfc5280::ID_CE_BASIC_CONSTRAINTS;
use der::{Decode, Encode};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use x509_cert::ext::pkix::BasicConstraints;
use x509_cert::Certificate;

/// Store-level properties attached to a certificate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CertificateProperties {
    /// EKU property; consulted only when the certificate's extension is empty.
    pub enhanced_key_usage: Option<Vec<String>>,
}

/// Properties keyed by lowercase hex SHA-256 thumbprint.
#[derive(Debug, Clone, Default)]
pub struct CertificatePropertyTable {
    by_thumbprint: HashMap<String, CertificateProperties>,
}

impl CertificatePropertyTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, thumbprint: &str, properties: CertificateProperties) {
        self.by_thumbprint
            .insert(thumbprint.to_ascii_lowercase(), properties);
    }

    #[must_use]
    pub fn get(&self, thumbprint: &str) -> Option<&CertificateProperties> {
        self.by_thumbprint.get(thumbprint)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_thumbprint.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_thumbprint.is_empty()
    }
}

/// One certificate held by a [`CertificateStore`].
#[derive(Clone)]
pub struct StoreCertificate {
    der: Box<[u8]>,
    certificate: Certificate,
    properties: CertificateProperties,
}

impl StoreCertificate {
    pub fn new(certificate: Certificate) -> ValidationResult<Self> {
        let der = certificate.to_der()?;
        Ok(Self {
            der: der.into_boxed_slice(),
            certificate,
            properties: CertificateProperties::default(),
        })
    }
}

/// Certificates extracted from a signature blob, in enumeration order.
#[derive(Clone)]
pub struct CertificateStore {
    content_type: ContentType,
    entries: Vec<StoreCertificate>,
}

impl CertificateStore {
    #[must_use]
    pub fn new(content_type: ContentType, entries: Vec<StoreCertificate>) -> Self {
        Self {
            content_type,
            entries,
        }
    }

    pub fn from_certificates(
        content_type: ContentType,
        certificates: Vec<Certificate>,
    ) -> ValidationResult<Self> {
        let entries = certificates
            .into_iter()
            .map(StoreCertificate::new)
            .collect::<ValidationResult<Vec<_>>>()?;
        Ok(Self::new(content_type, entries))
    }

    #[must_use]
    pub fn content_type(&self) -> ContentType {
        self.content_type
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Attach store-level properties from `table` to matching certificates.
    pub fn apply_properties(&mut self, table: &CertificatePropertyTable) {
        if table.is_empty() {
            return;
        }
        let matched = self
            .iter()
            .filter_map(|cert| {
                let thumbprint = cert.thumbprint();
                let properties = table.get(&thumbprint)?.clone();
                log::debug!("Attaching store properties to certificate {thumbprint}");
                Some((cert.index, properties))
            })
            .collect::<Vec<_>>();
        for (index, properties) in matched {
            if let Some(entry) = self.entries.get_mut(index) {
                entry.properties = properties;
            }
        }
    }

    /// Forward enumeration cursor: `None` starts, `None` back means exhausted.
    #[must_use]
    pub fn enumerate<'s>(&'s self, previous: Option<CertificateRef<'s>>) -> Option<CertificateRef<'s>> {
        let index = previous.map_or(0, |prev| prev.index + 1);
        (index < self.entries.len()).then_some(CertificateRef { store: self, index })
    }

    pub fn iter(&self) -> impl Iterator<Item = CertificateRef<'_>> {
        (0..self.entries.len()).map(move |index| CertificateRef { store: self, index })
    }

    /// Exact `(issuer, serialNumber)` lookup.
    #[must_use]
    pub fn find_by_identity(&self, identity: &SignerIdentity) -> Option<CertificateRef<'_>> {
        self.iter().find(|cert| {
            let tbs = &cert.certificate().tbs_certificate;
            tbs.issuer == *identity.issuer() && tbs.serial_number == *identity.serial_number()
        })
    }
}

impl fmt::Debug for CertificateStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CertificateStore(content_type={:?}, certificates={})",
            self.content_type,
            self.entries.len()
        )
    }
}

/// Non-owning reference to a certificate inside a [`CertificateStore`].
#[derive(Clone, Copy)]
pub struct CertificateRef<'s> {
    store: &'s CertificateStore,
    index: usize,
}

impl<'s> CertificateRef<'s> {
    fn entry(&self) -> &'s StoreCertificate {
        &self.store.entries[self.index]
    }

    #[must_use]
    pub fn certificate(&self) -> &'s Certificate {
        &self.entry().certificate
    }

    #[must_use]
    pub fn as_der(&self) -> &'s [u8] {
        &self.entry().der
    }

    #[must_use]
    pub fn properties(&self) -> &'s CertificateProperties {
        &self.entry().properties
    }

    /// Lowercase hex SHA-256 over the DER encoding.
    #[must_use]
    pub fn thumbprint(&self) -> String {
        hex::encode(Sha256::digest(self.as_der()))
    }

    #[must_use]
    pub fn subject(&self) -> String {
        self.certificate().tbs_certificate.subject.to_string()
    }
}

impl PartialEq for CertificateRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.store, other.store) && self.index == other.index
    }
}

impl Eq for CertificateRef<'_> {}

impl fmt::Debug for CertificateRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CertificateRef(index={}, subject={})", self.index, self.subject())
    }
}

/// Whether the basic constraints extension marks the certificate as a CA.
///
/// A missing or undecodable extension counts as "not a CA".
#[must_use]
pub fn is_ca_certificate(certificate: &Certificate) -> bool {
    certificate
        .tbs_certificate
        .extensions
        .as_ref()
        .and_then(|extensions| {
            extensions
                .iter()
                .find(|ext| ext.extn_id == ID_CE_BASIC_CONSTRAINTS)
        })
        .and_then(|ext| BasicConstraints::from_der(ext.extn_value.as_bytes()).ok())
        .is_some_and(|constraints| constraints.ca)
}

/// Trust status recorded while building a chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainTrustStatus {
    Trusted,
    Untrusted { reason: String },
}

/// Signer certificate plus its resolved issuers, leaf first.
#[derive(Clone)]
pub struct CertificateChain {
    elements: Vec<Certificate>,
    status: ChainTrustStatus,
    anchor: Option<AnchorClass>,
}

impl CertificateChain {
    #[must_use]
    pub fn new(elements: Vec<Certificate>, status: ChainTrustStatus, anchor: Option<AnchorClass>) -> Self {
        Self {
            elements,
            status,
            anchor,
        }
    }

    #[must_use]
    pub fn elements(&self) -> &[Certificate] {
        &self.elements
    }

    #[must_use]
    pub fn leaf(&self) -> Option<&Certificate> {
        self.elements.first()
    }

    #[must_use]
    pub fn status(&self) -> &ChainTrustStatus {
        &self.status
    }

    #[must_use]
    pub fn is_trusted(&self) -> bool {
        self.status == ChainTrustStatus::Trusted
    }

    /// Class of the configured anchor the chain terminated in, if any.
    #[must_use]
    pub fn anchor(&self) -> Option<AnchorClass> {
        self.anchor
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl fmt::Debug for CertificateChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CertificateChain(len={}, status={:?}, anchor={:?})",
            self.elements.len(),
            self.status,
            self.anchor
        )
    }
}
