//! # chat-gateway-config
//!
//! Environment-driven server configuration for the chat gateway.
//! An env snapshot goes in; an immutable, typed `ServerConfig` comes out.
//! This crate depends on `shared` only.

/// Access-code hashing and one-time derivation.
pub mod access;
/// Environment snapshot and typed env parsing.
pub mod env;
/// Provider key pool selection.
pub mod keys;
/// Model catalog and custom model rules.
pub mod models;
/// JSON/TOML rendering helpers.
pub mod render;
/// Server config resolution.
pub mod resolver;
/// Build target detection.
pub mod target;

pub use access::{
    AccessCodeError, AccessCodeSet, access_codes_from_snapshot, compute_access_codes,
    hash_access_code, process_access_codes, try_compute_access_codes,
};
pub use env::{ENV_VARS, EnvParseError, EnvSnapshot, env_access_supported};
pub use keys::{KeyPool, KeySelection, select_key_with, select_random_key};
pub use models::{
    AvailableModel, CustomModelRules, DEFAULT_MODELS, GPT4_MODEL_PREFIX, ModelEntry,
    ModelOverrides, ModelProvider, ModelRule, derive_model_overrides,
};
pub use render::{ConfigReport, to_pretty_json, to_pretty_toml};
pub use resolver::{ConfigError, ConfigResolver, ServerConfig, server_config};
pub use target::{BuildMode, BuildTarget};

/// Returns the config crate version.
#[must_use]
pub const fn config_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
