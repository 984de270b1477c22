//! Validation outcome types.
//!
//! A malformed signature is an error; everything here describes a signature
//! that parsed. Callers that only need the accept/reject decision use
//! [`ValidationOutcome::is_accepted`].

use std::fmt;

/// Trust category a signature was classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignatureOrigin {
    /// Signer carries the store EKU and chains to a curated application root.
    Store,
    /// Signer chain satisfies the generic code-signing policy.
    Authenticode,
    /// Neither check succeeded.
    Unknown,
}

impl SignatureOrigin {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SignatureOrigin::Store => "store",
            SignatureOrigin::Authenticode => "authenticode",
            SignatureOrigin::Unknown => "unknown",
        }
    }

    #[must_use]
    pub fn is_known(self) -> bool {
        self != SignatureOrigin::Unknown
    }
}

impl fmt::Display for SignatureOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one validation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationOutcome {
    /// Validation was skipped at the caller's request; the blob was not read.
    NotValidated,
    /// Signature accepted under the given origin. `Unknown` only appears when
    /// the caller allowed unknown origins.
    Accepted(SignatureOrigin),
    /// Well-formed signature whose origin is not acceptable.
    Rejected,
}

impl ValidationOutcome {
    /// Overall decision. `NotValidated` is not an acceptance.
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        matches!(self, ValidationOutcome::Accepted(_))
    }

    #[must_use]
    pub fn origin(&self) -> Option<SignatureOrigin> {
        match self {
            ValidationOutcome::Accepted(origin) => Some(*origin),
            _ => None,
        }
    }
}

impl fmt::Display for ValidationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationOutcome::NotValidated => f.write_str("not validated"),
            ValidationOutcome::Accepted(origin) => write!(f, "accepted ({origin} origin)"),
            ValidationOutcome::Rejected => f.write_str("rejected (signature origin check failed)"),
        }
    }
}
