//! Centralized constants for the p7x container and the trust decision.
//! Keep this intentionally small; only broadly reused literals should live here.

use const_oid::ObjectIdentifier;

// === P7X Container Constants ===

/// File identifier at offset 0 of a p7x signature part (`"PKCX"` read as a
/// little-endian `u32`).
pub const P7X_FILE_ID: u32 = 0x5843_4B50;

/// Size of the fixed p7x header (the file identifier).
pub const P7X_HEADER_SIZE: u64 = std::mem::size_of::<u32>() as u64;

/// Upper sanity bound for a p7x stream (2 MiB).
pub const MAX_P7X_STREAM_SIZE: u64 = 2 << 20;

// === PKCS#7 Constants ===

/// Upper bound for an encoded `SignerInfo` (maximum string length accepted for
/// the issuer field).
pub const MAX_SIGNER_INFO_SIZE: u32 = 2_147_483_647;

/// Authenticode `SpcIndirectDataContent` content type.
pub const SPC_INDIRECT_DATA: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.4.1.311.2.1.4");

// === Enhanced Key Usage OIDs ===

/// Distribution-store signing EKU.
pub const WINDOWS_STORE_EKU_OID: &str = "1.3.6.1.4.1.311.76.3.1";

/// Code signing EKU (id-kp-codeSigning).
pub const CODE_SIGNING_EKU_OID: &str = "1.3.6.1.5.5.7.3.3";

/// anyExtendedKeyUsage.
pub const ANY_EKU_OID: &str = "2.5.29.37.0";
