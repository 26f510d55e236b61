//! Access-code derivation.
//!
//! Access codes arrive as a comma-separated `CODE` variable and are kept only
//! as lowercase MD5 hex digests. The process-wide set is derived once and is
//! read-only afterwards.

use crate::env::{ENV_CODE, EnvSnapshot};
use chat_gateway_shared::{ErrorCode, ErrorEnvelope};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::{Arc, OnceLock};

static PROCESS_ACCESS_CODES: OnceLock<Arc<AccessCodeSet>> = OnceLock::new();

/// Deduplicated set of hashed access codes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AccessCodeSet(BTreeSet<String>);

impl AccessCodeSet {
    /// Number of distinct codes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no access code is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when the set contains the given digest.
    #[must_use]
    pub fn contains_hash(&self, digest: &str) -> bool {
        self.0.contains(digest)
    }

    /// Check a user-supplied plain-text code against the set.
    ///
    /// The input is trimmed before hashing, the same way configured entries are.
    #[must_use]
    pub fn verify(&self, plain: &str) -> bool {
        self.contains_hash(&hash_access_code(plain.trim()))
    }

    /// Iterate digests in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

/// Why the configured `CODE` value could not be read.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessCodeError {
    /// The variable is present but is not valid unicode.
    #[error("{var} is set but is not valid unicode")]
    NotUnicode {
        /// Env var name.
        var: &'static str,
    },
}

impl From<AccessCodeError> for ErrorEnvelope {
    fn from(error: AccessCodeError) -> Self {
        let message = error.to_string();
        match error {
            AccessCodeError::NotUnicode { var } => {
                Self::expected(ErrorCode::config("access_code_derivation"), message)
                    .with_metadata("env_var", var)
            },
        }
    }
}

/// Lowercase hex MD5 digest of an access code.
#[must_use]
pub fn hash_access_code(code: &str) -> String {
    let digest = md5::compute(code.as_bytes());
    format!("{digest:x}")
}

/// Derive the access-code set from a raw `CODE` value.
///
/// Empty split entries (for example from a trailing comma) are skipped; every
/// other entry is trimmed and hashed. A whitespace-only entry therefore hashes
/// the empty string.
#[must_use]
pub fn compute_access_codes(raw: Option<&str>) -> AccessCodeSet {
    let codes = raw
        .unwrap_or_default()
        .split(',')
        .filter(|entry| !entry.is_empty())
        .map(|entry| hash_access_code(entry.trim()))
        .collect();
    AccessCodeSet(codes)
}

/// Derive the access-code set from a snapshot, reporting an unreadable `CODE`.
pub fn try_compute_access_codes(env: &EnvSnapshot) -> Result<AccessCodeSet, AccessCodeError> {
    if env.is_non_unicode(ENV_CODE) {
        return Err(AccessCodeError::NotUnicode { var: ENV_CODE });
    }
    Ok(compute_access_codes(env.get(ENV_CODE)))
}

/// Derive the access-code set from a snapshot, failing open to an empty set.
///
/// An empty result means "no access code required". Derivation failures are
/// logged at `warn` because they silently disable the access check.
pub fn access_codes_from_snapshot(env: &EnvSnapshot) -> AccessCodeSet {
    match try_compute_access_codes(env) {
        Ok(codes) => codes,
        Err(error) => {
            tracing::warn!(%error, "access code derivation failed; access codes are disabled");
            AccessCodeSet::default()
        },
    }
}

/// Process-wide access codes, derived once from the `CODE` variable.
pub fn process_access_codes() -> Arc<AccessCodeSet> {
    Arc::clone(PROCESS_ACCESS_CODES.get_or_init(|| {
        let codes = EnvSnapshot::capture()
            .map(|env| access_codes_from_snapshot(&env))
            .unwrap_or_default();
        tracing::info!(count = codes.len(), "derived process access codes");
        Arc::new(codes)
    }))
}
