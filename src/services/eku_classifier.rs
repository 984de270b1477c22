//! Distribution-store EKU check.

use crate::adapters::trust_engine::TrustEngine;
use crate::domain::constants::WINDOWS_STORE_EKU_OID;
use crate::domain::crypto::CertificateRef;
use crate::infra::error::ValidationResult;

pub struct EkuClassifier<'e, E: TrustEngine + ?Sized> {
    engine: &'e E,
}

impl<'e, E: TrustEngine + ?Sized> EkuClassifier<'e, E> {
    #[must_use]
    pub fn new(engine: &'e E) -> Self {
        Self { engine }
    }

    /// Whether the certificate's EKU list carries the store marker.
    ///
    /// A missing certificate or an empty list is `false`.
    ///
    /// # Errors
    ///
    /// Returns `SignatureInvalid` when the EKU extension is malformed.
    pub fn has_store_usage(&self, certificate: Option<CertificateRef<'_>>) -> ValidationResult<bool> {
        let Some(certificate) = certificate else {
            return Ok(false);
        };
        let usages = self.engine.get_enhanced_key_usage(certificate)?;
        let found = usages.contains(WINDOWS_STORE_EKU_OID);
        log::debug!(
            "Store EKU {} on {} ({} usage(s) from {:?})",
            if found { "present" } else { "absent" },
            certificate.subject(),
            usages.len(),
            usages.source()
        );
        Ok(found)
    }
}
