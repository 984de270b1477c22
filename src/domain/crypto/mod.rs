//! Foundational cryptographic domain types.
//!
//! Provides strongly-typed wrappers for the artifacts a validation call works
//! with:
//! - Hash algorithms accepted in a `SignerInfo`
//! - The certificate store extracted from a signature blob and references into it
//! - Store-level certificate properties
//! - Built certificate chains and their trust status

mod cert;
mod hash;

pub use cert::{
    is_ca_certificate, CertificateChain, CertificateProperties, CertificatePropertyTable,
    CertificateRef, CertificateStore, ChainTrustStatus, StoreCertificate,
};
pub use hash::HashAlgorithm;
