//! Chain trust evaluation.
//!
//! Locates the signer by the exact identity in its `SignerInfo`, checks the
//! signature, builds an offline chain and evaluates one named policy.

use crate::adapters::trust_engine::TrustEngine;
use crate::domain::pkcs7::SignatureBlob;
use crate::domain::policy::{ChainBuildFlags, TrustPolicy};
use crate::infra::error::{ValidationError, ValidationResult};

pub struct ChainTrustEvaluator<'e, E: TrustEngine + ?Sized> {
    engine: &'e E,
}

impl<'e, E: TrustEngine + ?Sized> ChainTrustEvaluator<'e, E> {
    #[must_use]
    pub fn new(engine: &'e E) -> Self {
        Self { engine }
    }

    /// Whether the signer's chain satisfies `policy`.
    ///
    /// # Errors
    ///
    /// Returns `SignatureInvalid` when the blob is not signed-data, the signer
    /// certificate is not in the message, the signature does not verify or the
    /// provider fails. A chain that simply does not satisfy the policy is
    /// `Ok(false)`.
    pub fn evaluate(&self, blob: &SignatureBlob, policy: TrustPolicy) -> ValidationResult<bool> {
        let (store, message) = self.engine.query_pkcs7(blob)?;
        let identity = self.engine.get_signer_info(&message)?;
        let signer = self
            .engine
            .find_certificate_by_identity(&store, &identity)
            .ok_or_else(|| {
                ValidationError::signature_invalid(format!(
                    "signer certificate {identity:?} is not present in the message"
                ))
            })?;

        self.engine.verify_signer_signature(&message, signer)?;

        let chain = self
            .engine
            .build_chain(&store, signer, ChainBuildFlags::offline())?;
        let satisfied = self.engine.verify_chain_policy(&chain, policy);
        log::debug!(
            "{policy} policy {} for {}",
            if satisfied { "satisfied" } else { "not satisfied" },
            signer.subject()
        );
        Ok(satisfied)
    }
}
