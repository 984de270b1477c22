pub mod constants;
pub mod crypto;
pub mod eku;
pub mod options;
pub mod pkcs7;
pub mod policy;
pub mod verification;
