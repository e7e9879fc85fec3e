//! Mantle Foundation
//!
//! Shared primitives for the mantle persistence stack. Provides the
//! element dtype register used by data carriers and generated kernels,
//! and stable content fingerprinting for envelope checksums and source
//! identity.

pub mod dtype;
pub mod fingerprint;

pub use dtype::DType;
pub use fingerprint::{fingerprint, fingerprint_str, Fingerprint, FINGERPRINT_SEED};
