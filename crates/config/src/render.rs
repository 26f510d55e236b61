//! Deterministic pretty rendering of resolved config values.

use crate::resolver::ServerConfig;
use chat_gateway_shared::{ErrorClass, ErrorCode, ErrorEnvelope};
use serde::Serialize;

/// Resolved config together with the models its custom rules leave available.
///
/// Renders as a single document so JSON output stays parseable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigReport<'a> {
    /// Names of the available models, catalog order first.
    pub available_models: Vec<String>,
    /// The resolved config.
    pub config: &'a ServerConfig,
}

impl<'a> ConfigReport<'a> {
    /// Build the report for a resolved config.
    #[must_use]
    pub fn new(config: &'a ServerConfig) -> Self {
        let available_models = config
            .available_models()
            .into_iter()
            .filter(|model| model.available)
            .map(|model| model.name)
            .collect();
        Self {
            available_models,
            config,
        }
    }
}

/// Serialize a value as pretty JSON (with trailing newline).
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> chat_gateway_shared::Result<String> {
    let mut output = serde_json::to_string_pretty(value).map_err(|error| {
        ErrorEnvelope::unexpected(
            ErrorCode::internal(),
            format!("failed to serialize config: {error}"),
            ErrorClass::NonRetriable,
        )
    })?;
    output.push('\n');
    Ok(output)
}

/// Serialize a value as pretty TOML (with trailing newline).
pub fn to_pretty_toml<T: Serialize + ?Sized>(value: &T) -> chat_gateway_shared::Result<String> {
    let mut output = toml::to_string_pretty(value).map_err(|error| {
        ErrorEnvelope::unexpected(
            ErrorCode::config("serialize_toml"),
            format!("failed to serialize config TOML: {error}"),
            ErrorClass::NonRetriable,
        )
    })?;
    if !output.ends_with('\n') {
        output.push('\n');
    }
    Ok(output)
}
