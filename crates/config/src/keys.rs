//! Provider key pools.
//!
//! A key pool is a comma-separated list of interchangeable credentials. One
//! entry is drawn uniformly per resolver call to spread load across keys.

use crate::env::{ENV_GOOGLE_API_KEY, ENV_OPENAI_API_KEY};
use chat_gateway_shared::SecretString;
use rand::Rng;
use std::fmt;

/// Credential pools the resolver draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyPool {
    /// `OPENAI_API_KEY`.
    OpenAi,
    /// `GOOGLE_API_KEY`.
    Google,
}

impl KeyPool {
    /// Env var holding the pool.
    #[must_use]
    pub const fn env_var(self) -> &'static str {
        match self {
            Self::OpenAi => ENV_OPENAI_API_KEY,
            Self::Google => ENV_GOOGLE_API_KEY,
        }
    }

    /// Label used in selection diagnostics.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::OpenAi => "api key",
            Self::Google => "Google api key",
        }
    }
}

impl fmt::Display for KeyPool {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.env_var())
    }
}

/// Key drawn from a pool, with its zero-based index and the pool size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySelection {
    /// Selected key (may be empty when the pool is unset).
    pub key: SecretString,
    /// Zero-based index of the selected entry.
    pub index: usize,
    /// Number of entries in the pool; always at least 1.
    pub total: usize,
}

impl KeySelection {
    /// One-based position of the selected entry.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.index + 1
    }
}

/// Draw one key from the pool using the thread-local RNG.
///
/// An absent pool behaves like `""`, which splits into a single empty entry:
/// the result then has `total == 1` and an empty key.
pub fn select_random_key(pool: KeyPool, raw: Option<&str>) -> KeySelection {
    select_key_with(pool, raw, &mut rand::rng())
}

/// Draw one key from the pool using the provided RNG.
pub fn select_key_with<R: Rng + ?Sized>(
    pool: KeyPool,
    raw: Option<&str>,
    rng: &mut R,
) -> KeySelection {
    let keys: Vec<&str> = raw.unwrap_or_default().split(',').map(str::trim).collect();
    let total = keys.len();
    let index = rng.random_range(0..total);
    let key = keys.get(index).copied().unwrap_or_default();

    tracing::info!(
        pool = pool.env_var(),
        "using {} of {} {}",
        index + 1,
        total,
        pool.label()
    );

    KeySelection {
        key: SecretString::from(key),
        index,
        total,
    }
}
