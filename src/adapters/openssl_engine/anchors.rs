//! Trust anchors for offline chain building.

use crate::domain::policy::AnchorClass;
use crate::infra::error::{ValidationError, ValidationResult};
use openssl::error::ErrorStack;
use openssl::x509::store::{X509Store, X509StoreBuilder};
use openssl::x509::X509;
use std::fs;
use std::path::Path;

struct TrustAnchor {
    class: AnchorClass,
    certificate: X509,
    der: Vec<u8>,
}

/// Classified root certificates plus the optional platform default store.
#[derive(Default)]
pub struct TrustAnchors {
    anchors: Vec<TrustAnchor>,
    use_system_roots: bool,
}

impl TrustAnchors {
    /// Empty anchor set without system roots.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Also trust OpenSSL's default certificate locations. Chains ending in
    /// one of those roots are classified as code-signing roots.
    #[must_use]
    pub fn with_system_roots(mut self, enabled: bool) -> Self {
        self.use_system_roots = enabled;
        self
    }

    #[must_use]
    pub fn uses_system_roots(&self) -> bool {
        self.use_system_roots
    }

    pub fn add(&mut self, class: AnchorClass, certificate: X509) -> ValidationResult<()> {
        let der = certificate.to_der().map_err(|e| {
            ValidationError::ConfigurationError(format!("Failed to encode trust anchor: {e}"))
        })?;
        self.anchors.push(TrustAnchor {
            class,
            certificate,
            der,
        });
        Ok(())
    }

    /// Add every certificate found in PEM data. Returns how many were added.
    pub fn add_pem(&mut self, class: AnchorClass, pem: &[u8]) -> ValidationResult<usize> {
        let certificates = X509::stack_from_pem(pem).map_err(|e| {
            ValidationError::ConfigurationError(format!("Failed to parse trust anchor PEM: {e}"))
        })?;
        if certificates.is_empty() {
            return Err(ValidationError::ConfigurationError(
                "Trust anchor PEM contains no certificates".to_string(),
            ));
        }
        let count = certificates.len();
        for certificate in certificates {
            self.add(class, certificate)?;
        }
        Ok(count)
    }

    pub fn load_pem_file<P: AsRef<Path>>(
        &mut self,
        class: AnchorClass,
        path: P,
    ) -> ValidationResult<usize> {
        let path = path.as_ref();
        let pem = fs::read(path).map_err(|e| {
            ValidationError::ConfigurationError(format!(
                "Failed to read trust anchor file {}: {}",
                path.display(),
                e
            ))
        })?;
        let count = self.add_pem(class, &pem)?;
        log::debug!("Loaded {count} {class:?} anchor(s) from {}", path.display());
        Ok(count)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    /// Fresh OpenSSL store holding every anchor.
    pub(crate) fn build_store(&self) -> Result<X509Store, ErrorStack> {
        let mut builder = X509StoreBuilder::new()?;
        for anchor in &self.anchors {
            builder.add_cert(anchor.certificate.clone())?;
        }
        if self.use_system_roots {
            builder.set_default_paths()?;
        }
        Ok(builder.build())
    }

    /// Class of the anchor a verified chain ended in.
    ///
    /// A root configured under several classes takes the most privileged one.
    /// A root that is not configured can only have come from the system store.
    #[must_use]
    pub fn classify(&self, root_der: &[u8]) -> Option<AnchorClass> {
        self.anchors
            .iter()
            .filter(|anchor| anchor.der == root_der)
            .map(|anchor| anchor.class)
            .min()
            .or_else(|| self.use_system_roots.then_some(AnchorClass::CodeSigningRoot))
    }
}
