//! p7x Signature Validator Library
//!
//! Validates the PKCS#7 signature part of a signed application package (a
//! "p7x" file) and classifies its origin: a curated distribution store, a
//! generic Authenticode code-signing chain, or unknown.
//!
//! The crate is layered like this:
//! - `domain`: container constants, PKCS#7 and certificate types, policies
//! - `adapters`: the `TrustEngine` capability and its OpenSSL implementation
//! - `services`: container parsing, signer resolution, EKU and chain checks
//! - `pipelines`: the `SignatureValidator` facade applying caller options
//! - `infra`: errors and configuration

pub mod adapters;
pub mod domain;
pub mod infra;
pub mod pipelines;
pub mod services;

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

pub use adapters::{OpenSslTrustEngine, TrustAnchors, TrustEngine};
pub use domain::constants::{P7X_FILE_ID, WINDOWS_STORE_EKU_OID};
pub use domain::options::ValidationOptions;
pub use domain::policy::{AnchorClass, TrustPolicy};
pub use domain::verification::{SignatureOrigin, ValidationOutcome};
pub use infra::config::{ConfigManager, ValidatorConfiguration};
pub use infra::error::{ValidationError, ValidationResult};
pub use pipelines::SignatureValidator;

/// Validate a p7x file on disk with the given engine.
///
/// # Errors
///
/// Returns `SignatureInvalid` when the file cannot be read or the signature is
/// malformed. An untrusted signature is `Ok(false)`.
pub fn validate_p7x_file<P: AsRef<Path>, E: TrustEngine>(
    path: P,
    options: ValidationOptions,
    engine: E,
) -> ValidationResult<bool> {
    let path = path.as_ref();
    log::info!("Validating p7x signature: {}", path.display());

    let file = File::open(path).map_err(|e| {
        ValidationError::signature_invalid(format!("failed to open {}: {e}", path.display()))
    })?;
    SignatureValidator::new(engine).validate(options, &mut BufReader::new(file))
}
