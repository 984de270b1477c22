//! `SignatureValidator`: high-level facade for validating a p7x signature.
//!
//! Applies the caller's options, reads the container and delegates the trust
//! decision to `OriginClassifier`.

use crate::adapters::trust_engine::TrustEngine;
use crate::domain::options::ValidationOptions;
use crate::domain::verification::{SignatureOrigin, ValidationOutcome};
use crate::infra::error::ValidationResult;
use crate::services::container::ContainerParser;
use crate::services::origin_classifier::OriginClassifier;
use std::io::{Read, Seek};

/// Validates p7x signature streams against one trust engine.
///
/// Holds no per-call state, so one validator can serve concurrent callers.
pub struct SignatureValidator<E: TrustEngine> {
    engine: E,
    parser: ContainerParser,
}

impl<E: TrustEngine> SignatureValidator<E> {
    #[must_use]
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            parser: ContainerParser::new(),
        }
    }

    #[must_use]
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Run the full validation and report how the signature was judged.
    ///
    /// With `SKIP_SIGNATURE` the stream is not touched and the outcome is
    /// `NotValidated`.
    ///
    /// # Errors
    ///
    /// Returns `SignatureInvalid` for any malformed input or provider failure.
    pub fn evaluate<R: Read + Seek>(
        &self,
        options: ValidationOptions,
        stream: &mut R,
    ) -> ValidationResult<ValidationOutcome> {
        if options.skips_signature() {
            log::info!("Signature validation skipped by caller");
            return Ok(ValidationOutcome::NotValidated);
        }

        let blob = self.parser.read_signature(stream)?;
        let origin = OriginClassifier::new(&self.engine).classify(&blob)?;

        let outcome = match origin {
            SignatureOrigin::Unknown if !options.allows_unknown_origin() => {
                log::warn!("Signature rejected: origin is neither store nor authenticode");
                ValidationOutcome::Rejected
            }
            origin => {
                log::info!("Signature accepted with {origin} origin");
                ValidationOutcome::Accepted(origin)
            }
        };
        Ok(outcome)
    }

    /// Accept/reject decision. `SKIP_SIGNATURE` yields `false`.
    ///
    /// # Errors
    ///
    /// Same as [`SignatureValidator::evaluate`].
    pub fn validate<R: Read + Seek>(
        &self,
        options: ValidationOptions,
        stream: &mut R,
    ) -> ValidationResult<bool> {
        Ok(self.evaluate(options, stream)?.is_accepted())
    }
}
