//! OpenSSL-backed trust engine.
//!
//! Structural decoding uses the `cms` / `x509-cert` types from the domain
//! layer; OpenSSL handles the cryptography: signer signature checks,
//! self-signature checks and offline chain building against a per-call
//! `X509Store`.

mod anchors;

pub use anchors::TrustAnchors;

use crate::adapters::trust_engine::TrustEngine;
use crate::domain::constants::SPC_INDIRECT_DATA;
use crate::domain::crypto::{
    CertificateChain, CertificatePropertyTable, CertificateRef, CertificateStore,
    ChainTrustStatus, HashAlgorithm,
};
use crate::domain::pkcs7::{self, SignatureBlob, SignedMessage};
use crate::domain::policy::{ChainBuildFlags, TrustPolicy};
use crate::infra::config::ValidatorConfiguration;
use crate::infra::error::{ValidationError, ValidationResult};
use der::Decode;
use openssl::hash::MessageDigest;
use openssl::sign::Verifier;
use openssl::stack::Stack;
use openssl::x509::{X509StoreContext, X509};
use x509_cert::Certificate;

fn message_digest(algorithm: HashAlgorithm) -> MessageDigest {
    match algorithm {
        HashAlgorithm::Sha256 => MessageDigest::sha256(),
        HashAlgorithm::Sha384 => MessageDigest::sha384(),
        HashAlgorithm::Sha512 => MessageDigest::sha512(),
    }
}

/// Trust engine backed by OpenSSL.
pub struct OpenSslTrustEngine {
    anchors: TrustAnchors,
    properties: CertificatePropertyTable,
}

impl OpenSslTrustEngine {
    #[must_use]
    pub fn new(anchors: TrustAnchors) -> Self {
        Self {
            anchors,
            properties: CertificatePropertyTable::new(),
        }
    }

    /// Attach store-level certificate properties to every opened store.
    #[must_use]
    pub fn with_properties(mut self, properties: CertificatePropertyTable) -> Self {
        self.properties = properties;
        self
    }

    /// Build an engine from a loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` when an anchor file cannot be read or
    /// holds no certificate.
    pub fn from_config(config: &ValidatorConfiguration) -> ValidationResult<Self> {
        let mut anchors = TrustAnchors::new().with_system_roots(config.use_system_roots);
        for entry in &config.trust_anchors {
            anchors.load_pem_file(entry.class, &entry.path)?;
        }
        log::debug!(
            "Trust engine configured with {} anchor(s), system roots {}",
            anchors.len(),
            if anchors.uses_system_roots() { "enabled" } else { "disabled" }
        );
        Ok(Self::new(anchors).with_properties(config.to_property_table()))
    }

    #[must_use]
    pub fn anchors(&self) -> &TrustAnchors {
        &self.anchors
    }

    fn verify_with_key(
        signer: &X509,
        algorithm: HashAlgorithm,
        data: &[u8],
        signature: &[u8],
    ) -> ValidationResult<bool> {
        let key = signer.public_key()?;
        let mut verifier = Verifier::new(message_digest(algorithm), &key)?;
        verifier.update(data)?;
        // Malformed signature encodings surface as an error stack; they are
        // still just a failed verification.
        Ok(verifier.verify(signature).unwrap_or(false))
    }
}

impl TrustEngine for OpenSslTrustEngine {
    fn query_pkcs7(
        &self,
        blob: &SignatureBlob,
    ) -> ValidationResult<(CertificateStore, SignedMessage)> {
        let (mut store, message) = pkcs7::decode_signed_message(blob.as_der())?;
        if *message.content_type() == SPC_INDIRECT_DATA {
            log::debug!("Signed content is Authenticode indirect data");
        }
        store.apply_properties(&self.properties);
        Ok((store, message))
    }

    fn query_certificate_or_pkcs7(&self, blob: &SignatureBlob) -> ValidationResult<CertificateStore> {
        let mut store = pkcs7::decode_certificate_or_pkcs7(blob.as_der())?;
        store.apply_properties(&self.properties);
        Ok(store)
    }

    fn verify_signer_signature(
        &self,
        message: &SignedMessage,
        signer: CertificateRef<'_>,
    ) -> ValidationResult<()> {
        let info = message.signer_info()?;
        let algorithm = HashAlgorithm::from_oid(&info.digest_alg.oid).ok_or_else(|| {
            ValidationError::signature_invalid(format!(
                "unsupported signer digest algorithm {}",
                info.digest_alg.oid
            ))
        })?;
        let content = message.encapsulated_content().ok_or_else(|| {
            ValidationError::signature_invalid("signed message has no encapsulated content")
        })?;
        let x509 = X509::from_der(signer.as_der())?;
        let signature = message.signature()?;

        let verified = match message.signed_attributes_der()? {
            Some(signed_attributes) => {
                let expected = message.message_digest()?.ok_or_else(|| {
                    ValidationError::signature_invalid(
                        "signed attributes carry no messageDigest",
                    )
                })?;
                if expected.len() != algorithm.digest_size() {
                    return Err(ValidationError::signature_invalid(format!(
                        "messageDigest is {} bytes, expected {} for {algorithm}",
                        expected.len(),
                        algorithm.digest_size()
                    )));
                }
                if algorithm.digest(content) != expected {
                    return Err(ValidationError::signature_invalid(
                        "messageDigest does not match the signed content",
                    ));
                }
                Self::verify_with_key(&x509, algorithm, signed_attributes, signature)?
            }
            None => Self::verify_with_key(&x509, algorithm, content, signature)?,
        };

        if !verified {
            return Err(ValidationError::signature_invalid(format!(
                "signature by {} does not verify",
                signer.subject()
            )));
        }
        log::debug!("Signer signature verified ({algorithm})");
        Ok(())
    }

    fn build_chain(
        &self,
        store: &CertificateStore,
        certificate: CertificateRef<'_>,
        flags: ChainBuildFlags,
    ) -> ValidationResult<CertificateChain> {
        if !flags.cache_only_url_retrieval {
            log::debug!("URL retrieval is not supported; building chain offline");
        }

        let trusted = self.anchors.build_store()?;
        let leaf = X509::from_der(certificate.as_der())?;
        let mut untrusted = Stack::new()?;
        for intermediate in store.iter() {
            untrusted.push(X509::from_der(intermediate.as_der())?)?;
        }

        let mut context = X509StoreContext::new()?;
        let (verified, result, chain_der) =
            context.init(&trusted, &leaf, &untrusted, |ctx| {
                let verified = ctx.verify_cert()?;
                let result = ctx.error();
                let chain_der = match ctx.chain() {
                    Some(chain) => chain
                        .iter()
                        .map(|element| element.to_der())
                        .collect::<Result<Vec<_>, _>>()?,
                    None => Vec::new(),
                };
                Ok((verified, result, chain_der))
            })?;

        let elements = if chain_der.is_empty() {
            vec![certificate.certificate().clone()]
        } else {
            chain_der
                .iter()
                .map(|bytes| Certificate::from_der(bytes))
                .collect::<Result<Vec<_>, _>>()?
        };

        let chain = if verified {
            let anchor = chain_der.last().and_then(|root| self.anchors.classify(root));
            CertificateChain::new(elements, ChainTrustStatus::Trusted, anchor)
        } else {
            CertificateChain::new(
                elements,
                ChainTrustStatus::Untrusted {
                    reason: result.error_string().to_string(),
                },
                None,
            )
        };
        log::debug!("Built chain for {}: {chain:?}", certificate.subject());
        Ok(chain)
    }

    fn verify_chain_policy(&self, chain: &CertificateChain, policy: TrustPolicy) -> bool {
        policy.is_satisfied_by(chain)
    }

    fn is_self_signed(&self, certificate: CertificateRef<'_>) -> bool {
        let tbs = &certificate.certificate().tbs_certificate;
        if tbs.issuer != tbs.subject {
            return false;
        }
        let Ok(x509) = X509::from_der(certificate.as_der()) else {
            return false;
        };
        x509.public_key()
            .and_then(|key| x509.verify(&key))
            .unwrap_or(false)
    }
}
