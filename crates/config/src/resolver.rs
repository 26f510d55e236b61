//! Server config resolution.
//!
//! `ConfigResolver` owns the one-time derived access-code set and assembles a
//! fresh [`ServerConfig`] from an env snapshot on every call. Key pools are
//! re-drawn per call, so consecutive configs may carry different keys.

use crate::access::{AccessCodeSet, access_codes_from_snapshot, process_access_codes};
use crate::env::{
    ENV_ANTHROPIC_API_KEY, ENV_ANTHROPIC_API_VERSION, ENV_ANTHROPIC_URL, ENV_AZURE_API_KEY,
    ENV_AZURE_API_VERSION, ENV_AZURE_URL, ENV_BASE_URL, ENV_CODE, ENV_CUSTOM_MODELS,
    ENV_DEFAULT_MODEL, ENV_DISABLE_FAST_LINK, ENV_DISABLE_GPT4, ENV_ENABLE_BALANCE_QUERY,
    ENV_ENABLE_RAG, ENV_GEMINI_BASE_URL, ENV_GOOGLE_API_KEY, ENV_GOOGLE_URL, ENV_GTM_ID,
    ENV_HIDE_USER_API_KEY, ENV_NEXT_PUBLIC_ENABLE_NODEJS_PLUGIN, ENV_OPENAI_API_KEY,
    ENV_OPENAI_ORG_ID, ENV_PROXY_URL, ENV_R2_ACCOUNT_ID, ENV_RAG_CHUNK_OVERLAP,
    ENV_RAG_CHUNK_SIZE, ENV_RAG_EMBEDDING_MODEL, ENV_RAG_RETURN_COUNT, ENV_S3_ENDPOINT,
    ENV_VERCEL, ENV_WHITE_WEBDEV_ENDPOINTS, EnvParseError, EnvSnapshot,
};
use crate::keys::{KeyPool, select_key_with};
use crate::models::{AvailableModel, CustomModelRules, DEFAULT_MODELS, derive_model_overrides};
use chat_gateway_shared::{ErrorCode, ErrorEnvelope, SecretString};
use rand::Rng;
use serde::Serialize;
use std::sync::{Arc, OnceLock};

/// Default RAG embedding model.
pub const DEFAULT_RAG_EMBEDDING_MODEL: &str = "text-embedding-3-large";
/// Default RAG chunk size in characters.
pub const DEFAULT_RAG_CHUNK_SIZE: u32 = 2000;
/// Default RAG chunk overlap in characters.
pub const DEFAULT_RAG_CHUNK_OVERLAP: u32 = 200;
/// Default number of RAG chunks returned per query.
pub const DEFAULT_RAG_RETURN_COUNT: u32 = 4;

static GLOBAL_RESOLVER: OnceLock<ConfigResolver> = OnceLock::new();

/// Errors surfaced while resolving the server config.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// No environment is available in the calling context.
    #[error("server config requires process environment access: {reason}")]
    PreconditionViolation {
        /// Why the environment is unavailable.
        reason: &'static str,
    },
    /// An env var holds a malformed or out-of-range value.
    #[error(transparent)]
    Env(#[from] EnvParseError),
}

impl From<ConfigError> for ErrorEnvelope {
    fn from(error: ConfigError) -> Self {
        match error {
            ConfigError::PreconditionViolation { reason } => Self::expected(
                ErrorCode::config("precondition_violation"),
                format!("server config requires process environment access: {reason}"),
            )
            .with_metadata("reason", reason),
            ConfigError::Env(error) => error.into(),
        }
    }
}

/// Resolved server configuration.
///
/// Optional fields are omitted from serialized output when unset. Credentials
/// serialize as a redaction placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// `OpenAI` base URL override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Key drawn from the `OpenAI` pool (empty when unset).
    pub api_key: SecretString,
    /// `OpenAI` organization id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openai_org_id: Option<String>,

    /// True when an Azure URL is configured.
    pub is_azure: bool,
    /// Azure deployments URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub azure_url: Option<String>,
    /// Azure API key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub azure_api_key: Option<SecretString>,
    /// Azure API version.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub azure_api_version: Option<String>,

    /// True when the Google pool has at least one entry; an unset pool still
    /// counts as one empty entry.
    pub is_google: bool,
    /// Key drawn from the Google pool (empty when unset).
    pub google_api_key: SecretString,
    /// Google endpoint (`GEMINI_BASE_URL`, else `GOOGLE_URL`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub google_url: Option<String>,

    /// True when an Anthropic key is configured.
    pub is_anthropic: bool,
    /// Anthropic API key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anthropic_api_key: Option<SecretString>,
    /// Anthropic API version.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anthropic_api_version: Option<String>,
    /// Anthropic endpoint URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anthropic_url: Option<String>,

    /// Google Tag Manager id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gtm_id: Option<String>,

    /// True when at least one access code is configured.
    pub need_code: bool,
    /// Raw `CODE` value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<SecretString>,
    /// Hashed access codes shared by every config from the same resolver.
    pub codes: Arc<AccessCodeSet>,

    /// Outbound proxy URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy_url: Option<String>,
    /// True when running on Vercel.
    pub is_vercel: bool,

    /// Hide the user API key input.
    pub hide_user_api_key: bool,
    /// GPT-4 family disabled.
    #[serde(rename = "disableGPT4")]
    pub disable_gpt4: bool,
    /// Hide the balance query (balance query not enabled).
    pub hide_balance_query: bool,
    /// Ignore settings passed through URL parameters.
    pub disable_fast_link: bool,
    /// Custom model rules, including GPT-4 exclusions when disabled.
    pub custom_models: String,
    /// Default model for new sessions (empty means none).
    pub default_model: String,
    /// `WebDAV` endpoint allowlist, split verbatim on `,`.
    pub white_web_dev_endpoints: Vec<String>,

    /// Store uploads on the local filesystem.
    pub is_store_file_to_local: bool,

    /// Retrieval-augmented generation enabled.
    #[serde(rename = "isEnableRAG")]
    pub is_enable_rag: bool,
    /// Embedding model used for RAG.
    pub rag_embedding_model: String,
    /// RAG chunk size in characters.
    pub rag_chunk_size: u32,
    /// RAG chunk overlap in characters.
    pub rag_chunk_overlap: u32,
    /// RAG chunks returned per query.
    pub rag_return_count: u32,
}

impl ServerConfig {
    /// Catalog models after applying the custom model rules.
    #[must_use]
    pub fn available_models(&self) -> Vec<AvailableModel> {
        CustomModelRules::parse(&self.custom_models).apply(DEFAULT_MODELS)
    }

    /// Check a user-supplied access code. Always true when no code is required.
    #[must_use]
    pub fn is_access_code_valid(&self, plain: &str) -> bool {
        !self.need_code || self.codes.verify(plain)
    }
}

/// Builds [`ServerConfig`] values around a one-time derived access-code set.
#[derive(Debug, Clone, Default)]
pub struct ConfigResolver {
    codes: Arc<AccessCodeSet>,
}

impl ConfigResolver {
    /// Resolver sharing the given access-code set.
    #[must_use]
    pub const fn new(codes: Arc<AccessCodeSet>) -> Self {
        Self { codes }
    }

    /// Resolver whose access codes are derived once from the snapshot's `CODE`.
    #[must_use]
    pub fn from_snapshot(env: &EnvSnapshot) -> Self {
        Self::new(Arc::new(access_codes_from_snapshot(env)))
    }

    /// Process-wide resolver backed by [`process_access_codes`].
    pub fn global() -> &'static Self {
        GLOBAL_RESOLVER.get_or_init(|| Self::new(process_access_codes()))
    }

    /// Access codes shared by every config this resolver builds.
    #[must_use]
    pub const fn codes(&self) -> &Arc<AccessCodeSet> {
        &self.codes
    }

    /// Resolve the config from a snapshot using the thread-local RNG.
    pub fn build_config(&self, env: Option<&EnvSnapshot>) -> Result<ServerConfig, ConfigError> {
        self.build_config_with(env, &mut rand::rng())
    }

    /// Resolve the config from the current process environment.
    pub fn build_config_from_std_env(&self) -> Result<ServerConfig, ConfigError> {
        self.build_config(EnvSnapshot::capture().as_ref())
    }

    /// Resolve the config drawing pool keys from the provided RNG.
    ///
    /// `None` means the calling context cannot read the environment; this
    /// fails before any field is computed.
    pub fn build_config_with<R: Rng + ?Sized>(
        &self,
        env: Option<&EnvSnapshot>,
        rng: &mut R,
    ) -> Result<ServerConfig, ConfigError> {
        let env = env.ok_or(ConfigError::PreconditionViolation {
            reason: "no environment snapshot is available in this context",
        })?;

        let is_enable_rag = env.is_set(ENV_ENABLE_RAG);
        let rag = RagSettings::from_snapshot(env, is_enable_rag)?;

        let disable_gpt4 = env.is_set(ENV_DISABLE_GPT4);
        let models = derive_model_overrides(
            disable_gpt4,
            env.get_or(ENV_CUSTOM_MODELS, ""),
            env.get_or(ENV_DEFAULT_MODEL, ""),
            DEFAULT_MODELS,
        );

        let openai = select_key_with(KeyPool::OpenAi, env.get(ENV_OPENAI_API_KEY), rng);
        let google = select_key_with(KeyPool::Google, env.get(ENV_GOOGLE_API_KEY), rng);

        let white_web_dev_endpoints = env
            .get_or(ENV_WHITE_WEBDEV_ENDPOINTS, "")
            .split(',')
            .map(str::to_string)
            .collect();

        let is_store_file_to_local = env.is_set(ENV_NEXT_PUBLIC_ENABLE_NODEJS_PLUGIN)
            && !env.is_set(ENV_R2_ACCOUNT_ID)
            && !env.is_set(ENV_S3_ENDPOINT);

        Ok(ServerConfig {
            base_url: env.get_owned(ENV_BASE_URL),
            api_key: openai.key,
            openai_org_id: env.get_owned(ENV_OPENAI_ORG_ID),

            is_azure: env.is_set(ENV_AZURE_URL),
            azure_url: env.get_owned(ENV_AZURE_URL),
            azure_api_key: secret(env, ENV_AZURE_API_KEY),
            azure_api_version: env.get_owned(ENV_AZURE_API_VERSION),

            is_google: google.total > 0,
            google_api_key: google.key,
            google_url: env
                .get_owned(ENV_GEMINI_BASE_URL)
                .or_else(|| env.get_owned(ENV_GOOGLE_URL)),

            is_anthropic: env.is_set(ENV_ANTHROPIC_API_KEY),
            anthropic_api_key: secret(env, ENV_ANTHROPIC_API_KEY),
            anthropic_api_version: env.get_owned(ENV_ANTHROPIC_API_VERSION),
            anthropic_url: env.get_owned(ENV_ANTHROPIC_URL),

            gtm_id: env.get_owned(ENV_GTM_ID),

            need_code: !self.codes.is_empty(),
            code: secret(env, ENV_CODE),
            codes: Arc::clone(&self.codes),

            proxy_url: env.get_owned(ENV_PROXY_URL),
            is_vercel: env.is_set(ENV_VERCEL),

            hide_user_api_key: env.is_set(ENV_HIDE_USER_API_KEY),
            disable_gpt4,
            hide_balance_query: !env.is_set(ENV_ENABLE_BALANCE_QUERY),
            disable_fast_link: env.is_set(ENV_DISABLE_FAST_LINK),
            custom_models: models.custom_models,
            default_model: models.default_model,
            white_web_dev_endpoints,

            is_store_file_to_local,

            is_enable_rag,
            rag_embedding_model: env
                .get_or(ENV_RAG_EMBEDDING_MODEL, DEFAULT_RAG_EMBEDDING_MODEL)
                .to_string(),
            rag_chunk_size: rag.chunk_size,
            rag_chunk_overlap: rag.chunk_overlap,
            rag_return_count: rag.return_count,
        })
    }
}

/// Resolve the config with the process-wide resolver and the process environment.
pub fn server_config() -> Result<ServerConfig, ConfigError> {
    ConfigResolver::global().build_config_from_std_env()
}

fn secret(env: &EnvSnapshot, var: &str) -> Option<SecretString> {
    env.get(var).map(SecretString::from)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RagSettings {
    chunk_size: u32,
    chunk_overlap: u32,
    return_count: u32,
}

impl RagSettings {
    /// Parse the RAG numbers. Malformed values always fail; range checks only
    /// apply when RAG is enabled, and the overlap is only compared against the
    /// chunk size when it is set explicitly.
    fn from_snapshot(env: &EnvSnapshot, enabled: bool) -> Result<Self, EnvParseError> {
        let settings = Self {
            chunk_size: env.parse_u32_or(ENV_RAG_CHUNK_SIZE, DEFAULT_RAG_CHUNK_SIZE)?,
            chunk_overlap: env.parse_u32_or(ENV_RAG_CHUNK_OVERLAP, DEFAULT_RAG_CHUNK_OVERLAP)?,
            return_count: env.parse_u32_or(ENV_RAG_RETURN_COUNT, DEFAULT_RAG_RETURN_COUNT)?,
        };
        if enabled {
            settings.validate(env.get(ENV_RAG_CHUNK_OVERLAP).is_some())?;
        }
        Ok(settings)
    }

    fn validate(self, explicit_overlap: bool) -> Result<(), EnvParseError> {
        if self.chunk_size == 0 {
            return Err(EnvParseError::OutOfRange {
                var: ENV_RAG_CHUNK_SIZE,
                value: self.chunk_size,
                constraint: "must be greater than 0",
            });
        }
        if self.return_count == 0 {
            return Err(EnvParseError::OutOfRange {
                var: ENV_RAG_RETURN_COUNT,
                value: self.return_count,
                constraint: "must be greater than 0",
            });
        }
        if explicit_overlap && self.chunk_overlap >= self.chunk_size {
            return Err(EnvParseError::OutOfRange {
                var: ENV_RAG_CHUNK_OVERLAP,
                value: self.chunk_overlap,
                constraint: "must be less than RAG_CHUNK_SIZE",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::hash_access_code;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::error::Error;

    fn resolve(pairs: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let env = EnvSnapshot::from_pairs(pairs.iter().copied());
        ConfigResolver::from_snapshot(&env).build_config(Some(&env))
    }

    #[test]
    fn missing_environment_fails_fast() {
        let error = ConfigResolver::default().build_config(None).err();
        assert!(matches!(
            error,
            Some(ConfigError::PreconditionViolation { .. })
        ));
    }

    #[test]
    fn precondition_maps_to_stable_code() {
        let envelope: ErrorEnvelope = ConfigError::PreconditionViolation { reason: "browser" }.into();
        assert_eq!(
            envelope.code,
            ErrorCode::config("precondition_violation")
        );
    }

    #[test]
    fn empty_environment_yields_defaults() -> Result<(), Box<dyn Error>> {
        let config = resolve(&[])?;

        assert!(!config.need_code);
        assert!(config.codes.is_empty());
        assert!(config.hide_balance_query);
        assert!(!config.disable_gpt4);
        assert!(config.is_google, "an unset pool still has one (empty) entry");
        assert!(!config.is_store_file_to_local);
        assert_eq!(config.custom_models, "");
        assert_eq!(config.default_model, "");
        assert_eq!(config.white_web_dev_endpoints, vec![String::new()]);
        assert!(config.api_key.is_empty());
        assert!(config.google_api_key.is_empty());
        assert_eq!(config.rag_embedding_model, DEFAULT_RAG_EMBEDDING_MODEL);
        assert_eq!(config.rag_chunk_size, 2000);
        assert_eq!(config.rag_chunk_overlap, 200);
        assert_eq!(config.rag_return_count, 4);
        Ok(())
    }

    #[test]
    fn codes_drive_need_code() -> Result<(), Box<dyn Error>> {
        let config = resolve(&[(ENV_CODE, "abc, def")])?;
        assert!(config.need_code);
        assert_eq!(config.codes.len(), 2);
        assert!(config.codes.contains_hash(&hash_access_code("def")));
        assert_eq!(config.code.as_ref().map(SecretString::expose), Some("abc, def"));
        assert!(config.is_access_code_valid("abc"));
        assert!(!config.is_access_code_valid("nope"));
        Ok(())
    }

    #[test]
    fn codes_come_from_the_resolver_not_the_snapshot() -> Result<(), Box<dyn Error>> {
        let resolver = ConfigResolver::from_snapshot(&EnvSnapshot::default());
        let env = EnvSnapshot::from_pairs([(ENV_CODE, "abc")]);
        let config = resolver.build_config(Some(&env))?;
        assert!(!config.need_code);
        assert!(config.is_access_code_valid("anything"));
        Ok(())
    }

    #[test]
    fn configs_share_one_code_set() -> Result<(), Box<dyn Error>> {
        let env = EnvSnapshot::from_pairs([(ENV_CODE, "abc")]);
        let resolver = ConfigResolver::from_snapshot(&env);
        let first = resolver.build_config(Some(&env))?;
        let second = resolver.build_config(Some(&env))?;
        assert!(Arc::ptr_eq(&first.codes, &second.codes));
        Ok(())
    }

    #[test]
    fn presence_flags_use_truthiness() -> Result<(), Box<dyn Error>> {
        let config = resolve(&[
            (ENV_VERCEL, "1"),
            (ENV_HIDE_USER_API_KEY, "false"),
            (ENV_DISABLE_FAST_LINK, ""),
            (ENV_ENABLE_BALANCE_QUERY, "1"),
            (ENV_AZURE_URL, "https://azure.example.com"),
            (ENV_ANTHROPIC_API_KEY, "ak"),
            (ENV_ENABLE_RAG, "yes"),
        ])?;

        assert!(config.is_vercel);
        assert!(config.hide_user_api_key, "any non-empty value is truthy");
        assert!(!config.disable_fast_link, "empty value is falsy");
        assert!(!config.hide_balance_query);
        assert!(config.is_azure);
        assert!(config.is_anthropic);
        assert!(config.is_enable_rag);
        Ok(())
    }

    #[test]
    fn gemini_url_takes_precedence() -> Result<(), Box<dyn Error>> {
        let config = resolve(&[(ENV_GOOGLE_URL, "g"), (ENV_GEMINI_BASE_URL, "gem")])?;
        assert_eq!(config.google_url.as_deref(), Some("gem"));

        let config = resolve(&[(ENV_GOOGLE_URL, "g")])?;
        assert_eq!(config.google_url.as_deref(), Some("g"));

        let config = resolve(&[(ENV_GOOGLE_URL, "g"), (ENV_GEMINI_BASE_URL, "")])?;
        assert_eq!(config.google_url.as_deref(), Some(""), "only absence falls back");
        Ok(())
    }

    #[test]
    fn local_file_storage_requires_no_remote_store() -> Result<(), Box<dyn Error>> {
        let plugin = (ENV_NEXT_PUBLIC_ENABLE_NODEJS_PLUGIN, "1");
        assert!(resolve(&[plugin])?.is_store_file_to_local);
        assert!(!resolve(&[plugin, (ENV_R2_ACCOUNT_ID, "r2")])?.is_store_file_to_local);
        assert!(!resolve(&[plugin, (ENV_S3_ENDPOINT, "s3")])?.is_store_file_to_local);
        assert!(resolve(&[plugin, (ENV_S3_ENDPOINT, "")])?.is_store_file_to_local);
        Ok(())
    }

    #[test]
    fn webdav_endpoints_split_verbatim() -> Result<(), Box<dyn Error>> {
        let config = resolve(&[(ENV_WHITE_WEBDEV_ENDPOINTS, "https://a, https://b,")])?;
        assert_eq!(
            config.white_web_dev_endpoints,
            vec!["https://a", " https://b", ""]
        );
        Ok(())
    }

    #[test]
    fn disable_gpt4_rewrites_models() -> Result<(), Box<dyn Error>> {
        let config = resolve(&[(ENV_DISABLE_GPT4, "1"), (ENV_DEFAULT_MODEL, "gpt-4o")])?;
        assert!(config.disable_gpt4);
        assert_eq!(config.default_model, "");
        assert!(config.custom_models.contains("-gpt-4o"));
        assert!(
            config
                .available_models()
                .iter()
                .filter(|model| model.available)
                .all(|model| !model.name.starts_with("gpt-4"))
        );
        Ok(())
    }

    #[test]
    fn key_pools_are_drawn_independently() -> Result<(), Box<dyn Error>> {
        let env = EnvSnapshot::from_pairs([
            (ENV_OPENAI_API_KEY, "k1, k2"),
            (ENV_GOOGLE_API_KEY, "g1,g2,g3"),
        ]);
        let resolver = ConfigResolver::from_snapshot(&env);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..32 {
            let config = resolver.build_config_with(Some(&env), &mut rng)?;
            assert!(matches!(config.api_key.expose(), "k1" | "k2"));
            assert!(matches!(config.google_api_key.expose(), "g1" | "g2" | "g3"));
            assert!(config.is_google);
        }
        Ok(())
    }

    #[test]
    fn malformed_rag_numbers_name_the_variable() {
        let error = resolve(&[(ENV_RAG_CHUNK_SIZE, "big")]).err();
        assert_eq!(
            error,
            Some(ConfigError::Env(EnvParseError::InvalidInt {
                var: ENV_RAG_CHUNK_SIZE,
                value: "big".to_string(),
            }))
        );
    }

    #[test]
    fn rag_ranges_are_enforced_when_enabled() {
        let rag = (ENV_ENABLE_RAG, "1");
        let error = resolve(&[rag, (ENV_RAG_CHUNK_SIZE, "0")]).err();
        assert!(matches!(
            error,
            Some(ConfigError::Env(EnvParseError::OutOfRange { var: ENV_RAG_CHUNK_SIZE, .. }))
        ));

        let error = resolve(&[rag, (ENV_RAG_RETURN_COUNT, "0")]).err();
        assert!(matches!(
            error,
            Some(ConfigError::Env(EnvParseError::OutOfRange { var: ENV_RAG_RETURN_COUNT, .. }))
        ));

        let error = resolve(&[
            rag,
            (ENV_RAG_CHUNK_SIZE, "100"),
            (ENV_RAG_CHUNK_OVERLAP, "100"),
        ])
        .err();
        assert!(matches!(
            error,
            Some(ConfigError::Env(EnvParseError::OutOfRange { var: ENV_RAG_CHUNK_OVERLAP, .. }))
        ));
    }

    #[test]
    fn rag_ranges_do_not_block_config_when_disabled() -> Result<(), Box<dyn Error>> {
        let config = resolve(&[(ENV_RAG_CHUNK_SIZE, "0"), (ENV_RAG_RETURN_COUNT, "0")])?;
        assert!(!config.is_enable_rag);
        assert_eq!(config.rag_chunk_size, 0);
        assert_eq!(config.rag_return_count, 0);
        Ok(())
    }

    #[test]
    fn small_chunk_size_keeps_default_overlap() -> Result<(), Box<dyn Error>> {
        let config = resolve(&[(ENV_RAG_CHUNK_SIZE, "150"), (ENV_CODE, "abc")])?;
        assert_eq!(config.rag_chunk_size, 150);
        assert_eq!(config.rag_chunk_overlap, DEFAULT_RAG_CHUNK_OVERLAP);
        assert!(config.need_code);

        let config = resolve(&[(ENV_ENABLE_RAG, "1"), (ENV_RAG_CHUNK_SIZE, "150")])?;
        assert!(config.is_enable_rag);
        assert_eq!(config.rag_chunk_size, 150);
        Ok(())
    }

    #[test]
    fn malformed_rag_numbers_fail_even_when_disabled() {
        let error = resolve(&[(ENV_RAG_RETURN_COUNT, "many")]).err();
        assert!(matches!(
            error,
            Some(ConfigError::Env(EnvParseError::InvalidInt { var: ENV_RAG_RETURN_COUNT, .. }))
        ));
    }

    #[test]
    fn whitespace_code_keeps_access_check_on() -> Result<(), Box<dyn Error>> {
        let config = resolve(&[(ENV_CODE, "  ")])?;
        assert!(config.need_code);
        assert_eq!(config.codes.len(), 1);
        assert!(!config.is_access_code_valid("guess"));
        Ok(())
    }

    #[test]
    fn unreadable_code_disables_access_check() -> Result<(), Box<dyn Error>> {
        let env = EnvSnapshot::default().with_non_unicode(ENV_CODE);
        let config = ConfigResolver::from_snapshot(&env).build_config(Some(&env))?;
        assert!(!config.need_code);
        assert!(config.code.is_none());
        Ok(())
    }

    #[test]
    fn google_flag_follows_pool_size() -> Result<(), Box<dyn Error>> {
        let config = resolve(&[])?;
        assert!(config.is_google);
        assert!(config.google_api_key.is_empty());

        let config = resolve(&[(ENV_GOOGLE_API_KEY, "g1")])?;
        assert!(config.is_google);
        assert_eq!(config.google_api_key.expose(), "g1");
        Ok(())
    }

    #[test]
    fn rag_values_are_parsed() -> Result<(), Box<dyn Error>> {
        let config = resolve(&[
            (ENV_RAG_EMBEDDING_MODEL, "text-embedding-3-small"),
            (ENV_RAG_CHUNK_SIZE, "1000"),
            (ENV_RAG_CHUNK_OVERLAP, "0"),
            (ENV_RAG_RETURN_COUNT, "8"),
        ])?;
        assert_eq!(config.rag_embedding_model, "text-embedding-3-small");
        assert_eq!(config.rag_chunk_size, 1000);
        assert_eq!(config.rag_chunk_overlap, 0);
        assert_eq!(config.rag_return_count, 8);
        Ok(())
    }

    #[test]
    fn serialized_config_redacts_credentials() -> Result<(), Box<dyn Error>> {
        let config = resolve(&[
            (ENV_OPENAI_API_KEY, "sk-live-1"),
            (ENV_AZURE_API_KEY, "az-live-1"),
            (ENV_CODE, "letmein"),
        ])?;
        let json = serde_json::to_string(&config)?;
        let debug = format!("{config:?}");

        for secret in ["sk-live-1", "az-live-1", "letmein"] {
            assert!(!json.contains(secret), "{secret} leaked into JSON");
            assert!(!debug.contains(secret), "{secret} leaked into Debug");
        }
        assert!(json.contains("\"disableGPT4\":false"));
        assert!(json.contains("\"isEnableRAG\":false"));
        assert!(!json.contains("baseUrl"), "unset optional fields are omitted");
        Ok(())
    }

    #[test]
    fn global_resolver_is_shared() {
        assert!(std::ptr::eq(ConfigResolver::global(), ConfigResolver::global()));
    }
}
