//! Environment snapshot capture and typed env parsing.
//!
//! This module keeps env handling:
//! - verbatim (values are stored exactly as the process exposes them)
//! - presence-based (a flag is on when its variable is present and non-empty)
//! - strict for numbers (invalid values fail fast with the variable named)
//! - safe (secret values are redacted in `Debug` output and error metadata)

use chat_gateway_shared::{ErrorCode, ErrorEnvelope, REDACTED, is_secret_key};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Env var: outbound proxy URL (docker deployments).
pub const ENV_PROXY_URL: &str = "PROXY_URL";
/// Env var: comma-separated `OpenAI` key pool (secret).
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
/// Env var: comma-separated access codes (secret).
pub const ENV_CODE: &str = "CODE";
/// Env var: `OpenAI` base URL override.
pub const ENV_BASE_URL: &str = "BASE_URL";
/// Env var: `OpenAI` organization id.
pub const ENV_OPENAI_ORG_ID: &str = "OPENAI_ORG_ID";
/// Env var: set when running on Vercel.
pub const ENV_VERCEL: &str = "VERCEL";
/// Env var: build mode (`standalone` or `export`).
pub const ENV_BUILD_MODE: &str = "BUILD_MODE";
/// Env var: set when building the desktop app.
pub const ENV_BUILD_APP: &str = "BUILD_APP";
/// Env var: hide the user API key input.
pub const ENV_HIDE_USER_API_KEY: &str = "HIDE_USER_API_KEY";
/// Env var: disable the GPT-4 model family.
pub const ENV_DISABLE_GPT4: &str = "DISABLE_GPT4";
/// Env var: allow users to query their balance.
pub const ENV_ENABLE_BALANCE_QUERY: &str = "ENABLE_BALANCE_QUERY";
/// Env var: disallow importing settings from URL parameters.
pub const ENV_DISABLE_FAST_LINK: &str = "DISABLE_FAST_LINK";
/// Env var: custom model rules (`+name`, `-name`, `name=Display`).
pub const ENV_CUSTOM_MODELS: &str = "CUSTOM_MODELS";
/// Env var: default model for new chat sessions.
pub const ENV_DEFAULT_MODEL: &str = "DEFAULT_MODEL";
/// Env var: Azure deployments URL.
pub const ENV_AZURE_URL: &str = "AZURE_URL";
/// Env var: Azure API key (secret).
pub const ENV_AZURE_API_KEY: &str = "AZURE_API_KEY";
/// Env var: Azure API version.
pub const ENV_AZURE_API_VERSION: &str = "AZURE_API_VERSION";
/// Env var: comma-separated Google key pool (secret).
pub const ENV_GOOGLE_API_KEY: &str = "GOOGLE_API_KEY";
/// Env var: Google endpoint URL.
pub const ENV_GOOGLE_URL: &str = "GOOGLE_URL";
/// Env var: Gemini base URL (takes precedence over `GOOGLE_URL`).
pub const ENV_GEMINI_BASE_URL: &str = "GEMINI_BASE_URL";
/// Env var: Anthropic API key (secret).
pub const ENV_ANTHROPIC_API_KEY: &str = "ANTHROPIC_API_KEY";
/// Env var: Anthropic API version.
pub const ENV_ANTHROPIC_API_VERSION: &str = "ANTHROPIC_API_VERSION";
/// Env var: Anthropic endpoint URL.
pub const ENV_ANTHROPIC_URL: &str = "ANTHROPIC_URL";
/// Env var: Google Tag Manager id.
pub const ENV_GTM_ID: &str = "GTM_ID";
/// Env var: comma-separated `WebDAV` endpoint allowlist.
pub const ENV_WHITE_WEBDEV_ENDPOINTS: &str = "WHITE_WEBDEV_ENDPOINTS";
/// Env var: enable the node.js plugin runtime.
pub const ENV_NEXT_PUBLIC_ENABLE_NODEJS_PLUGIN: &str = "NEXT_PUBLIC_ENABLE_NODEJS_PLUGIN";
/// Env var: Cloudflare R2 account id.
pub const ENV_R2_ACCOUNT_ID: &str = "R2_ACCOUNT_ID";
/// Env var: S3-compatible endpoint.
pub const ENV_S3_ENDPOINT: &str = "S3_ENDPOINT";
/// Env var: enable retrieval-augmented generation.
pub const ENV_ENABLE_RAG: &str = "ENABLE_RAG";
/// Env var: RAG embedding model name.
pub const ENV_RAG_EMBEDDING_MODEL: &str = "RAG_EMBEDDING_MODEL";
/// Env var: RAG chunk size in characters.
pub const ENV_RAG_CHUNK_SIZE: &str = "RAG_CHUNK_SIZE";
/// Env var: RAG chunk overlap in characters.
pub const ENV_RAG_CHUNK_OVERLAP: &str = "RAG_CHUNK_OVERLAP";
/// Env var: number of RAG chunks returned per query.
pub const ENV_RAG_RETURN_COUNT: &str = "RAG_RETURN_COUNT";

/// Every variable the resolver reads, in capture order.
pub const ENV_VARS: [&str; 33] = [
    ENV_PROXY_URL,
    ENV_OPENAI_API_KEY,
    ENV_CODE,
    ENV_BASE_URL,
    ENV_OPENAI_ORG_ID,
    ENV_VERCEL,
    ENV_BUILD_MODE,
    ENV_BUILD_APP,
    ENV_HIDE_USER_API_KEY,
    ENV_DISABLE_GPT4,
    ENV_ENABLE_BALANCE_QUERY,
    ENV_DISABLE_FAST_LINK,
    ENV_CUSTOM_MODELS,
    ENV_DEFAULT_MODEL,
    ENV_AZURE_URL,
    ENV_AZURE_API_KEY,
    ENV_AZURE_API_VERSION,
    ENV_GOOGLE_API_KEY,
    ENV_GOOGLE_URL,
    ENV_GEMINI_BASE_URL,
    ENV_ANTHROPIC_API_KEY,
    ENV_ANTHROPIC_API_VERSION,
    ENV_ANTHROPIC_URL,
    ENV_GTM_ID,
    ENV_WHITE_WEBDEV_ENDPOINTS,
    ENV_NEXT_PUBLIC_ENABLE_NODEJS_PLUGIN,
    ENV_R2_ACCOUNT_ID,
    ENV_S3_ENDPOINT,
    ENV_ENABLE_RAG,
    ENV_RAG_EMBEDDING_MODEL,
    ENV_RAG_CHUNK_SIZE,
    ENV_RAG_CHUNK_OVERLAP,
    ENV_RAG_RETURN_COUNT,
];

/// Returns true when the current target can read process environment variables.
///
/// `wasm32-unknown-unknown` has no environment; every other supported target does.
#[must_use]
pub const fn env_access_supported() -> bool {
    !cfg!(all(target_family = "wasm", target_os = "unknown"))
}

/// Returns true when the variable holds a secret (credentials or access codes).
#[must_use]
pub fn is_secret_var(var: &str) -> bool {
    var == ENV_CODE || is_secret_key(var)
}

/// Immutable snapshot of the environment variables relevant to the server config.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
    vars: BTreeMap<String, String>,
    non_unicode: BTreeSet<String>,
}

impl EnvSnapshot {
    /// Build a snapshot from a key/value map (useful for tests and fixtures).
    #[must_use]
    pub const fn from_map(vars: BTreeMap<String, String>) -> Self {
        Self {
            vars,
            non_unicode: BTreeSet::new(),
        }
    }

    /// Build a snapshot from `(name, value)` pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::from_map(
            pairs
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }

    /// Record a variable that is present but not valid unicode.
    ///
    /// Such a variable reads as absent through [`EnvSnapshot::get`].
    #[must_use]
    pub fn with_non_unicode(mut self, var: impl Into<String>) -> Self {
        let var = var.into();
        self.vars.remove(&var);
        self.non_unicode.insert(var);
        self
    }

    /// Capture every known variable from the current process environment.
    ///
    /// Returns `None` when the target has no environment access. Values that
    /// are not valid unicode are skipped with a warning and recorded, see
    /// [`EnvSnapshot::is_non_unicode`].
    pub fn capture() -> Option<Self> {
        if !env_access_supported() {
            return None;
        }

        let mut snapshot = Self::default();
        for name in ENV_VARS {
            match std::env::var(name) {
                Ok(value) => {
                    snapshot.vars.insert(name.to_string(), value);
                },
                Err(std::env::VarError::NotUnicode(_)) => {
                    tracing::warn!(env_var = name, "ignoring non-unicode env value");
                    snapshot.non_unicode.insert(name.to_string());
                },
                Err(std::env::VarError::NotPresent) => {},
            }
        }

        Some(snapshot)
    }

    /// True when the variable was present but held a non-unicode value.
    #[must_use]
    pub fn is_non_unicode(&self, var: &str) -> bool {
        self.non_unicode.contains(var)
    }

    /// Raw value of a variable, if present (possibly empty).
    #[must_use]
    pub fn get(&self, var: &str) -> Option<&str> {
        self.vars.get(var).map(String::as_str)
    }

    /// Owned raw value of a variable, if present.
    #[must_use]
    pub fn get_owned(&self, var: &str) -> Option<String> {
        self.vars.get(var).cloned()
    }

    /// Raw value of a variable, or `fallback` when it is absent.
    ///
    /// An empty value is returned as-is; only absence triggers the fallback.
    #[must_use]
    pub fn get_or<'a>(&'a self, var: &str, fallback: &'a str) -> &'a str {
        self.get(var).unwrap_or(fallback)
    }

    /// True when the variable is present and non-empty.
    #[must_use]
    pub fn is_set(&self, var: &str) -> bool {
        self.get(var).is_some_and(|value| !value.is_empty())
    }

    /// Parse an unsigned integer, falling back to `default` when absent.
    pub fn parse_u32_or(&self, var: &'static str, default: u32) -> Result<u32, EnvParseError> {
        let Some(raw) = self.get(var) else {
            return Ok(default);
        };
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(EnvParseError::EmptyValue { var });
        }

        trimmed
            .parse::<u32>()
            .map_err(|_| EnvParseError::InvalidInt {
                var,
                value: raw.to_string(),
            })
    }

    /// Number of captured variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// True when no variable was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl fmt::Debug for EnvSnapshot {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_map()
            .entries(
                self.vars
                    .iter()
                    .map(|(key, value)| (key, redact_value(key, value))),
            )
            .finish()
    }
}

/// Validation failures when parsing env variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvParseError {
    /// An env var was present but empty after trimming.
    EmptyValue {
        /// Env var name.
        var: &'static str,
    },
    /// Integer env var had an invalid value.
    InvalidInt {
        /// Env var name.
        var: &'static str,
        /// Raw input value.
        value: String,
    },
    /// Integer env var parsed but violates a range constraint.
    OutOfRange {
        /// Env var name.
        var: &'static str,
        /// Parsed value.
        value: u32,
        /// Constraint that was violated.
        constraint: &'static str,
    },
}

impl EnvParseError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::EmptyValue { .. } => ErrorCode::config("empty_env_var"),
            Self::InvalidInt { .. } => ErrorCode::config("invalid_env_int"),
            Self::OutOfRange { .. } => ErrorCode::config("env_out_of_range"),
        }
    }

    /// Name of the offending variable.
    #[must_use]
    pub const fn var(&self) -> &'static str {
        match self {
            Self::EmptyValue { var } | Self::InvalidInt { var, .. } | Self::OutOfRange { var, .. } => {
                *var
            },
        }
    }
}

impl fmt::Display for EnvParseError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyValue { var } => write!(formatter, "{var} must be non-empty"),
            Self::InvalidInt { var, .. } => {
                write!(formatter, "{var} must be a non-negative integer")
            },
            Self::OutOfRange {
                var,
                value,
                constraint,
            } => write!(formatter, "{var}={value} is out of range ({constraint})"),
        }
    }
}

impl std::error::Error for EnvParseError {}

impl From<EnvParseError> for ErrorEnvelope {
    fn from(error: EnvParseError) -> Self {
        let code = error.error_code();
        let message = error.to_string();
        let envelope = Self::expected(code, message);

        match error {
            EnvParseError::EmptyValue { var } => envelope.with_metadata("env_var", var),
            EnvParseError::InvalidInt { var, value } => envelope
                .with_metadata("env_var", var)
                .with_metadata("value", redact_value(var, &value)),
            EnvParseError::OutOfRange {
                var,
                value,
                constraint,
            } => envelope
                .with_metadata("env_var", var)
                .with_metadata("value", value.to_string())
                .with_metadata("constraint", constraint),
        }
    }
}

fn redact_value(var: &str, value: &str) -> String {
    if is_secret_var(var) {
        REDACTED.to_string()
    } else {
        value.to_string()
    }
}
