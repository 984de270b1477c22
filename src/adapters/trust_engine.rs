//! Trust-engine abstraction.
//!
//! The validation services never touch a cryptographic provider directly; they
//! talk to a [`TrustEngine`]. This module defines the narrow interface a
//! provider must offer:
//! - Decode a signature blob into a certificate store and signed message
//! - Enumerate store certificates and look one up by signer identity
//! - Verify the signer's signature over the signed content
//! - Build an offline chain and evaluate a named policy against it
//! - Answer certificate questions (EKU, CA, self-signed)
//!
//! Everything an engine hands back is an owned value or a borrow of one, so
//! resources are released when the value goes out of scope.

use crate::domain::crypto::{
    is_ca_certificate, CertificateChain, CertificateRef, CertificateStore,
};
use crate::domain::eku::{self, EnhancedKeyUsageList};
use crate::domain::pkcs7::{SignatureBlob, SignedMessage, SignerIdentity};
use crate::domain::policy::{ChainBuildFlags, TrustPolicy};
use crate::infra::error::ValidationResult;

/// Cryptographic provider used by the validation services.
///
/// Implementations must be shareable across threads; each call works only on
/// the values passed to it.
pub trait TrustEngine: Send + Sync {
    /// Open a blob that must be PKCS#7 signed-data.
    ///
    /// # Errors
    ///
    /// Returns `SignatureInvalid` when the blob is not a well-formed
    /// signed-data content info.
    fn query_pkcs7(&self, blob: &SignatureBlob)
        -> ValidationResult<(CertificateStore, SignedMessage)>;

    /// Open a blob that is either a bare certificate or a PKCS#7 bundle.
    ///
    /// # Errors
    ///
    /// Returns `SignatureInvalid` when the blob is neither.
    fn query_certificate_or_pkcs7(&self, blob: &SignatureBlob) -> ValidationResult<CertificateStore>;

    /// Check the first signer's signature over the signed content.
    ///
    /// # Errors
    ///
    /// Returns `SignatureInvalid` on a digest mismatch, a bad signature or an
    /// unsupported algorithm.
    fn verify_signer_signature(
        &self,
        message: &SignedMessage,
        signer: CertificateRef<'_>,
    ) -> ValidationResult<()>;

    /// Build a chain from `certificate` up to a trust anchor.
    ///
    /// Every certificate in `store` is available as an intermediate. A chain
    /// that does not reach a trusted anchor is returned untrusted.
    ///
    /// # Errors
    ///
    /// Returns `SignatureInvalid` only when the provider itself fails.
    fn build_chain(
        &self,
        store: &CertificateStore,
        certificate: CertificateRef<'_>,
        flags: ChainBuildFlags,
    ) -> ValidationResult<CertificateChain>;

    /// Evaluate a named policy against a built chain.
    fn verify_chain_policy(&self, chain: &CertificateChain, policy: TrustPolicy) -> bool;

    /// Issuer equals subject and the certificate's own key verifies it.
    fn is_self_signed(&self, certificate: CertificateRef<'_>) -> bool;

    /// Stateless forward cursor over a store.
    fn enumerate_certificates<'s>(
        &self,
        store: &'s CertificateStore,
        previous: Option<CertificateRef<'s>>,
    ) -> Option<CertificateRef<'s>> {
        store.enumerate(previous)
    }

    /// Identity of the first signer.
    ///
    /// # Errors
    ///
    /// Returns `SignatureInvalid` when there is no usable signer info.
    fn get_signer_info(&self, message: &SignedMessage) -> ValidationResult<SignerIdentity> {
        message.signer_identity()
    }

    /// Exact `(issuer, serialNumber)` lookup.
    fn find_certificate_by_identity<'s>(
        &self,
        store: &'s CertificateStore,
        identity: &SignerIdentity,
    ) -> Option<CertificateRef<'s>> {
        store.find_by_identity(identity)
    }

    /// EKU list using extension precedence over store properties.
    ///
    /// # Errors
    ///
    /// Returns `SignatureInvalid` when the EKU extension cannot be decoded.
    fn get_enhanced_key_usage(
        &self,
        certificate: CertificateRef<'_>,
    ) -> ValidationResult<EnhancedKeyUsageList> {
        let extension = eku::extension_usages(certificate.certificate())?;
        let property = certificate.properties().enhanced_key_usage.clone();
        Ok(EnhancedKeyUsageList::resolve(extension, property))
    }

    /// Basic constraints mark the certificate as a CA.
    fn is_certificate_authority(&self, certificate: CertificateRef<'_>) -> bool {
        is_ca_certificate(certificate.certificate())
    }
}
