//! Caller-supplied validation options.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Flag set controlling how much of the signature pipeline runs and what it
/// accepts.
///
/// Unknown bits are retained (so a caller's value round-trips) but ignored.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ValidationOptions(u32);

impl ValidationOptions {
    /// Full validation, no relaxations.
    pub const FULL: Self = Self(0x0);
    /// Skip signature validation entirely; the blob is never inspected.
    pub const SKIP_SIGNATURE: Self = Self(0x1);
    /// Accept signatures whose origin is neither store nor Authenticode.
    pub const ALLOW_UNKNOWN_ORIGIN: Self = Self(0x2);

    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[must_use]
    pub const fn is_full(self) -> bool {
        self.0 == 0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    #[must_use]
    pub fn skips_signature(self) -> bool {
        self.contains(Self::SKIP_SIGNATURE)
    }

    #[must_use]
    pub fn allows_unknown_origin(self) -> bool {
        self.contains(Self::ALLOW_UNKNOWN_ORIGIN)
    }
}

impl BitOr for ValidationOptions {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for ValidationOptions {
    fn bitor_assign(&mut self, rhs: Self) {
        self.insert(rhs);
    }
}

impl fmt::Debug for ValidationOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = Vec::new();
        if self.skips_signature() {
            names.push("SKIP_SIGNATURE");
        }
        if self.allows_unknown_origin() {
            names.push("ALLOW_UNKNOWN_ORIGIN");
        }
        if names.is_empty() {
            names.push("FULL");
        }
        write!(f, "ValidationOptions({} = {:#x})", names.join(" | "), self.0)
    }
}
