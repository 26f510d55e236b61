//! Secret detection and redaction utilities.
//!
//! Secret-looking variable names are detected by substring, and secret values
//! travel inside [`SecretString`] so they never reach logs or rendered config.

use serde::{Serialize, Serializer};

/// Checks if a key/variable name likely refers to a secret.
///
/// Uses case-insensitive pattern matching to detect common secret-related
/// naming conventions.
///
/// # Examples
///
/// ```
/// use chat_gateway_shared::is_secret_key;
///
/// assert!(is_secret_key("OPENAI_API_KEY"));
/// assert!(is_secret_key("password"));
/// assert!(!is_secret_key("RAG_CHUNK_SIZE"));
/// ```
pub fn is_secret_key(key: &str) -> bool {
    let key = key.to_ascii_uppercase();
    key.contains("KEY")
        || key.contains("TOKEN")
        || key.contains("SECRET")
        || key.contains("PASSWORD")
        || key.contains("CREDENTIAL")
        || key.contains("AUTH")
}

/// The redacted placeholder string.
pub const REDACTED: &str = "[REDACTED]";

/// A secret string wrapper that redacts on Display/Debug/Serialize.
///
/// Use [`SecretString::expose`] at the point where the raw value is actually
/// needed (for example when building an upstream request header).
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct SecretString(Box<str>);

impl SecretString {
    /// Borrow the underlying secret.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Returns true when the wrapped secret is the empty string.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(REDACTED)
    }
}

impl std::fmt::Display for SecretString {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(REDACTED)
    }
}

impl Serialize for SecretString {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(REDACTED)
    }
}

impl From<&str> for SecretString {
    fn from(value: &str) -> Self {
        Self(value.into())
    }
}

impl From<String> for SecretString {
    fn from(value: String) -> Self {
        Self(value.into_boxed_str())
    }
}
