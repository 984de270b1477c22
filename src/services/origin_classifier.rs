//! Signature origin classification.
//!
//! Two independent checks run in order and short-circuit:
//! 1. Store origin: the structural signer carries the store EKU and the chain
//!    satisfies the curated-root policy.
//! 2. Authenticode origin: the chain satisfies the generic code-signing policy.

use crate::adapters::trust_engine::TrustEngine;
use crate::domain::pkcs7::SignatureBlob;
use crate::domain::policy::TrustPolicy;
use crate::domain::verification::SignatureOrigin;
use crate::infra::error::ValidationResult;
use crate::services::chain_trust::ChainTrustEvaluator;
use crate::services::eku_classifier::EkuClassifier;
use crate::services::signer_resolver::SignerResolver;

pub struct OriginClassifier<'e, E: TrustEngine + ?Sized> {
    resolver: SignerResolver<'e, E>,
    eku: EkuClassifier<'e, E>,
    chain: ChainTrustEvaluator<'e, E>,
}

impl<'e, E: TrustEngine + ?Sized> OriginClassifier<'e, E> {
    #[must_use]
    pub fn new(engine: &'e E) -> Self {
        Self {
            resolver: SignerResolver::new(engine),
            eku: EkuClassifier::new(engine),
            chain: ChainTrustEvaluator::new(engine),
        }
    }

    pub fn is_store_origin(&self, blob: &SignatureBlob) -> ValidationResult<bool> {
        let has_store_usage = {
            let store = self.resolver.open(blob)?;
            self.eku.has_store_usage(self.resolver.resolve(&store))?
        };
        if !has_store_usage {
            return Ok(false);
        }
        self.chain.evaluate(blob, TrustPolicy::MicrosoftRoot)
    }

    pub fn is_authenticode_origin(&self, blob: &SignatureBlob) -> ValidationResult<bool> {
        self.chain.evaluate(blob, TrustPolicy::Authenticode)
    }

    /// Classify the blob. Errors from either check propagate unchanged.
    pub fn classify(&self, blob: &SignatureBlob) -> ValidationResult<SignatureOrigin> {
        if self.is_store_origin(blob)? {
            return Ok(SignatureOrigin::Store);
        }
        if self.is_authenticode_origin(blob)? {
            return Ok(SignatureOrigin::Authenticode);
        }
        Ok(SignatureOrigin::Unknown)
    }
}
