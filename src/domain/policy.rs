//! Trust policies, anchor classes and chain-building flags.

use crate::domain::crypto::{CertificateChain, ChainTrustStatus};
use crate::domain::eku;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Named chain policy evaluated against a built certificate chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrustPolicy {
    /// Chain must terminate in a curated root. Used for store-origin signatures.
    MicrosoftRoot,
    /// Generic code-signing policy.
    Authenticode,
}

/// Flags a policy applies while being evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChainPolicyParameters {
    /// Restrict curated-root evaluation to application-root class anchors.
    pub check_application_root: bool,
}

impl TrustPolicy {
    #[must_use]
    pub fn parameters(self) -> ChainPolicyParameters {
        match self {
            TrustPolicy::MicrosoftRoot => ChainPolicyParameters {
                check_application_root: true,
            },
            TrustPolicy::Authenticode => ChainPolicyParameters::default(),
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TrustPolicy::MicrosoftRoot => "microsoft-root",
            TrustPolicy::Authenticode => "authenticode",
        }
    }

    /// Evaluate this policy against a built chain.
    ///
    /// Both policies need a trusted chain. The curated-root policy then looks
    /// at the anchor class; Authenticode looks at the leaf's own EKU.
    #[must_use]
    pub fn is_satisfied_by(self, chain: &CertificateChain) -> bool {
        if let ChainTrustStatus::Untrusted { reason } = chain.status() {
            log::debug!("{self} policy: chain is not trusted ({reason})");
            return false;
        }

        match self {
            TrustPolicy::MicrosoftRoot => {
                let parameters = self.parameters();
                match chain.anchor() {
                    Some(AnchorClass::ApplicationRoot) => true,
                    Some(class) if class.is_curated() => !parameters.check_application_root,
                    other => {
                        log::debug!("{self} policy: anchor {other:?} is not a curated root");
                        false
                    }
                }
            }
            TrustPolicy::Authenticode => chain.leaf().is_some_and(eku::permits_code_signing),
        }
    }
}

impl fmt::Display for TrustPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Class of a configured trust anchor.
///
/// Variants are ordered from most to least privileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnchorClass {
    /// Curated root for application (store) signing.
    ApplicationRoot,
    /// Curated root for product signing; not accepted by application-root checks.
    ProductRoot,
    /// Generic trusted code-signing root.
    CodeSigningRoot,
}

impl AnchorClass {
    #[must_use]
    pub fn is_curated(self) -> bool {
        matches!(self, AnchorClass::ApplicationRoot | AnchorClass::ProductRoot)
    }
}

/// Flags controlling how a chain is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainBuildFlags {
    /// Never go online for URL retrieval (AIA, CRL, OCSP).
    pub cache_only_url_retrieval: bool,
}

impl ChainBuildFlags {
    /// Offline chain building, the only mode the validator uses.
    #[must_use]
    pub const fn offline() -> Self {
        Self {
            cache_only_url_retrieval: true,
        }
    }
}

impl Default for ChainBuildFlags {
    fn default() -> Self {
        Self::offline()
    }
}
