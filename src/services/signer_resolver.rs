//! Structural signer selection.
//!
//! Picks the certificate that stands for the signer without looking at the
//! `SignerInfo`: for a bare certificate it is that certificate, for a PKCS#7
//! bundle it is the first one that is neither self-signed nor a CA.
//!
//! This is a heuristic. Nothing binds the selected certificate to the
//! signature, and it can differ from the certificate the chain trust
//! evaluator locates by issuer and serial number.

use crate::adapters::trust_engine::TrustEngine;
use crate::domain::crypto::{CertificateRef, CertificateStore};
use crate::domain::pkcs7::{ContentType, SignatureBlob};
use crate::infra::error::ValidationResult;

pub struct SignerResolver<'e, E: TrustEngine + ?Sized> {
    engine: &'e E,
}

impl<'e, E: TrustEngine + ?Sized> SignerResolver<'e, E> {
    #[must_use]
    pub fn new(engine: &'e E) -> Self {
        Self { engine }
    }

    /// Open a blob as a certificate or PKCS#7 bundle.
    pub fn open(&self, blob: &SignatureBlob) -> ValidationResult<CertificateStore> {
        self.engine.query_certificate_or_pkcs7(blob)
    }

    /// Select the end-entity certificate from an opened store.
    #[must_use]
    pub fn resolve<'s>(&self, store: &'s CertificateStore) -> Option<CertificateRef<'s>> {
        let first = self.engine.enumerate_certificates(store, None);
        if store.content_type() == ContentType::Certificate {
            return first;
        }

        let signer = std::iter::successors(first, |previous| {
            self.engine.enumerate_certificates(store, Some(*previous))
        })
        .find(|candidate| {
            !(self.engine.is_self_signed(*candidate)
                || self.engine.is_certificate_authority(*candidate))
        });

        match signer {
            Some(signer) => log::debug!("Structural signer: {}", signer.subject()),
            None => log::debug!("No end-entity certificate among {} candidate(s)", store.len()),
        }
        signer
    }
}
