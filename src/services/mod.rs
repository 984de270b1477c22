//! Service layer module root.
//! Contains the stateless steps of signature validation.

pub mod chain_trust;
pub mod container;
pub mod eku_classifier;
pub mod origin_classifier;
pub mod signer_resolver;

pub use chain_trust::ChainTrustEvaluator;
pub use container::ContainerParser;
pub use eku_classifier::EkuClassifier;
pub use origin_classifier::OriginClassifier;
pub use signer_resolver::SignerResolver;
