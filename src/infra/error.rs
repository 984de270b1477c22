//! Error types for signature validation.
//!
//! Every failure that stems from the signature blob itself (bad header, bad
//! size, unparsable PKCS#7, missing signer certificate, provider failure while
//! building a chain) surfaces as [`ValidationError::SignatureInvalid`]. The
//! message carries the internal reason for diagnostics only; callers are
//! expected to branch on the variant, not on the text.
//!
//! An untrusted but well-formed signature is *not* an error. It is reported as
//! a rejected outcome by the validation workflow.

use thiserror::Error;

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Error types surfaced by the validator
#[derive(Error, Debug, miette::Diagnostic)]
pub enum ValidationError {
    #[error("Signature invalid: {0}")]
    SignatureInvalid(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl ValidationError {
    /// Shorthand for building a [`ValidationError::SignatureInvalid`].
    pub fn signature_invalid(reason: impl Into<String>) -> Self {
        ValidationError::SignatureInvalid(reason.into())
    }

    #[must_use]
    pub fn is_signature_invalid(&self) -> bool {
        matches!(self, ValidationError::SignatureInvalid(_))
    }
}

impl From<der::Error> for ValidationError {
    fn from(error: der::Error) -> Self {
        ValidationError::SignatureInvalid(format!("ASN.1 decoding failed: {error}"))
    }
}

impl From<openssl::error::ErrorStack> for ValidationError {
    fn from(error: openssl::error::ErrorStack) -> Self {
        ValidationError::SignatureInvalid(format!("trust engine failure: {error}"))
    }
}

impl From<std::io::Error> for ValidationError {
    fn from(error: std::io::Error) -> Self {
        ValidationError::SignatureInvalid(format!("signature stream error: {error}"))
    }
}
