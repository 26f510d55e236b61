//! # chat-gateway-shared
//!
//! Shared result types, error envelopes, and secret handling for the
//! chat-gateway workspace.
//!
//! - Result and error envelope types
//! - Secret wrappers that never print their contents
//!
//! ## Design Principles
//!
//! 1. **No workspace dependencies** - This crate only depends on external crates
//! 2. **Serde-compatible** - Public types serialize without leaking secrets

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod errors;
pub mod redaction;
pub mod result;

pub use errors::{CONFIG_NAMESPACE, ErrorClass, ErrorCode, ErrorEnvelope, ErrorKind, ErrorMetadata};
pub use redaction::{REDACTED, SecretString, is_secret_key};
pub use result::Result;

/// Returns the shared crate version.
#[must_use]
pub const fn shared_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

// =============================================================================
// TESTS
// =============================================================================
