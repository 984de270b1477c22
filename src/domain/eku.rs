//! Enhanced Key Usage lists.
//!
//! A certificate's EKU comes from one of two places: the X.509 extension
//! embedded in the certificate, or a store-level property attached to the
//! certificate by the trust store. The extension wins whenever it carries at
//! least one identifier; a non-empty property list is the fallback. When
//! neither yields anything the list is empty, and callers must treat that as
//! "usage absent".

use crate::domain::constants::{ANY_EKU_OID, CODE_SIGNING_EKU_OID};
use crate::infra::error::{ValidationError, ValidationResult};
use const_oid::db::rfc5280::ID_CE_EXT_KEY_USAGE;
use der::Decode;
use x509_cert::ext::pkix::ExtendedKeyUsage;
use x509_cert::Certificate;

/// Where an [`EnhancedKeyUsageList`] was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EkuSource {
    Extension,
    Property,
    None,
}

/// Ordered usage identifiers (dotted OID strings).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnhancedKeyUsageList {
    source: EkuSource,
    identifiers: Vec<String>,
}

impl EnhancedKeyUsageList {
    #[must_use]
    pub fn empty() -> Self {
        Self {
            source: EkuSource::None,
            identifiers: Vec::new(),
        }
    }

    /// Combine extension- and property-level lists using extension precedence.
    #[must_use]
    pub fn resolve(extension: Option<Vec<String>>, property: Option<Vec<String>>) -> Self {
        match (extension, property) {
            (Some(identifiers), _) if !identifiers.is_empty() => Self {
                source: EkuSource::Extension,
                identifiers,
            },
            (_, Some(identifiers)) if !identifiers.is_empty() => Self {
                source: EkuSource::Property,
                identifiers,
            },
            _ => Self::empty(),
        }
    }

    #[must_use]
    pub fn source(&self) -> EkuSource {
        self.source
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.identifiers.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.identifiers.len()
    }

    /// Exact string comparison against each identifier.
    #[must_use]
    pub fn contains(&self, oid: &str) -> bool {
        self.identifiers.iter().any(|id| id == oid)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.identifiers.iter().map(String::as_str)
    }
}

/// Read the EKU extension of a certificate.
///
/// Returns `Ok(None)` when the certificate has no EKU extension and an error
/// when the extension is present but cannot be decoded.
pub fn extension_usages(certificate: &Certificate) -> ValidationResult<Option<Vec<String>>> {
    let Some(extensions) = certificate.tbs_certificate.extensions.as_ref() else {
        return Ok(None);
    };

    let Some(extension) = extensions
        .iter()
        .find(|ext| ext.extn_id == ID_CE_EXT_KEY_USAGE)
    else {
        return Ok(None);
    };

    let usage = ExtendedKeyUsage::from_der(extension.extn_value.as_bytes()).map_err(|e| {
        ValidationError::signature_invalid(format!("malformed enhanced key usage extension: {e}"))
    })?;

    Ok(Some(usage.0.iter().map(ToString::to_string).collect()))
}

/// Whether the certificate's own EKU extension permits code signing.
///
/// An absent extension places no restriction on usage.
#[must_use]
pub fn permits_code_signing(certificate: &Certificate) -> bool {
    match extension_usages(certificate) {
        Ok(None) => true,
        Ok(Some(usages)) => usages
            .iter()
            .any(|oid| oid == CODE_SIGNING_EKU_OID || oid == ANY_EKU_OID),
        Err(e) => {
            log::debug!("Treating certificate as unusable for code signing: {e}");
            false
        }
    }
}
