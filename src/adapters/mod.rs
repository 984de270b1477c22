//! Adapter layer modules for external system integration.
//!
//! Provides:
//! - The `TrustEngine` interface the validation services depend on
//! - An OpenSSL implementation of it

pub mod openssl_engine;
pub mod trust_engine;

pub use openssl_engine::{OpenSslTrustEngine, TrustAnchors};
pub use trust_engine::TrustEngine;
