//! Built-in model catalog and custom model rules.
//!
//! The custom models string is a comma-separated rule list: `-all` and `+all`
//! toggle the whole catalog, `-name` hides a model, `+name` or `name` shows
//! (or adds) one, and `name=Display` also sets its display name.

use serde::Serialize;
use std::fmt;

/// Prefix of the model family hidden by `DISABLE_GPT4`.
pub const GPT4_MODEL_PREFIX: &str = "gpt-4";

/// Vendor serving a catalog model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelProvider {
    /// `OpenAI` (or Azure `OpenAI`).
    OpenAi,
    /// Google Gemini.
    Google,
    /// Anthropic Claude.
    Anthropic,
}

impl fmt::Display for ModelProvider {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OpenAi => formatter.write_str("openai"),
            Self::Google => formatter.write_str("google"),
            Self::Anthropic => formatter.write_str("anthropic"),
        }
    }
}

/// Named entry of the static model catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ModelEntry {
    /// Model identifier sent upstream.
    pub name: &'static str,
    /// Vendor serving the model.
    pub provider: ModelProvider,
}

impl ModelEntry {
    const fn openai(name: &'static str) -> Self {
        Self {
            name,
            provider: ModelProvider::OpenAi,
        }
    }

    const fn google(name: &'static str) -> Self {
        Self {
            name,
            provider: ModelProvider::Google,
        }
    }

    const fn anthropic(name: &'static str) -> Self {
        Self {
            name,
            provider: ModelProvider::Anthropic,
        }
    }
}

/// Built-in model catalog.
pub const DEFAULT_MODELS: &[ModelEntry] = &[
    ModelEntry::openai("gpt-4"),
    ModelEntry::openai("gpt-4-0613"),
    ModelEntry::openai("gpt-4-32k"),
    ModelEntry::openai("gpt-4-32k-0613"),
    ModelEntry::openai("gpt-4-turbo"),
    ModelEntry::openai("gpt-4-turbo-2024-04-09"),
    ModelEntry::openai("gpt-4-turbo-preview"),
    ModelEntry::openai("gpt-4-1106-preview"),
    ModelEntry::openai("gpt-4-0125-preview"),
    ModelEntry::openai("gpt-4-vision-preview"),
    ModelEntry::openai("gpt-4o"),
    ModelEntry::openai("gpt-4o-2024-05-13"),
    ModelEntry::openai("gpt-3.5-turbo"),
    ModelEntry::openai("gpt-3.5-turbo-0125"),
    ModelEntry::openai("gpt-3.5-turbo-1106"),
    ModelEntry::openai("gpt-3.5-turbo-16k"),
    ModelEntry::google("gemini-pro"),
    ModelEntry::google("gemini-pro-vision"),
    ModelEntry::google("gemini-1.5-pro-latest"),
    ModelEntry::anthropic("claude-instant-1.2"),
    ModelEntry::anthropic("claude-2.0"),
    ModelEntry::anthropic("claude-2.1"),
    ModelEntry::anthropic("claude-3-haiku-20240307"),
    ModelEntry::anthropic("claude-3-sonnet-20240229"),
    ModelEntry::anthropic("claude-3-opus-20240229"),
];

/// Custom models string and default model after applying `DISABLE_GPT4`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelOverrides {
    /// Comma-separated custom model rules.
    pub custom_models: String,
    /// Default model for new sessions (empty means "no preference").
    pub default_model: String,
}

/// Apply the GPT-4 kill switch to the custom models string and default model.
///
/// With the flag set, one `-<name>` rule is appended per catalog entry named
/// `gpt-4*` and a `gpt-4*` default model is cleared. Without it both inputs
/// pass through unchanged.
#[must_use]
pub fn derive_model_overrides(
    disable_gpt4: bool,
    custom_models: &str,
    default_model: &str,
    catalog: &[ModelEntry],
) -> ModelOverrides {
    let mut overrides = ModelOverrides {
        custom_models: custom_models.to_string(),
        default_model: default_model.to_string(),
    };
    if !disable_gpt4 {
        return overrides;
    }

    let exclusions: Vec<String> = catalog
        .iter()
        .filter(|entry| entry.name.starts_with(GPT4_MODEL_PREFIX))
        .map(|entry| format!("-{}", entry.name))
        .collect();

    if !overrides.custom_models.is_empty() {
        overrides.custom_models.push(',');
    }
    overrides.custom_models.push_str(&exclusions.join(","));

    if overrides.default_model.starts_with(GPT4_MODEL_PREFIX) {
        overrides.default_model.clear();
    }

    overrides
}

/// One parsed entry of the custom models string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelRule {
    /// `-all`: hide every model.
    HideAll,
    /// `+all`: show every model.
    ShowAll,
    /// `-name`: hide one model.
    Hide(String),
    /// `+name`, `name`, or `name=Display`: show (or add) one model.
    Show {
        /// Model identifier.
        name: String,
        /// Optional display name.
        display_name: Option<String>,
    },
}

/// Model after applying the custom rules to the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableModel {
    /// Model identifier.
    pub name: String,
    /// Name shown in the UI.
    pub display_name: String,
    /// Vendor, when the model comes from the catalog.
    pub provider: Option<ModelProvider>,
    /// Whether the model is offered to users.
    pub available: bool,
}

/// Parsed custom models string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomModelRules {
    rules: Vec<ModelRule>,
}

impl CustomModelRules {
    /// Parse a comma-separated rule list; blank entries are skipped.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let rules = raw
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .filter_map(parse_rule)
            .collect();
        Self { rules }
    }

    /// Rules in declaration order.
    #[must_use]
    pub fn rules(&self) -> &[ModelRule] {
        &self.rules
    }

    /// Apply the rules to the catalog, in order.
    ///
    /// Catalog entries come first (in catalog order) followed by custom
    /// additions in the order they were declared.
    #[must_use]
    pub fn apply(&self, catalog: &[ModelEntry]) -> Vec<AvailableModel> {
        let mut table: Vec<AvailableModel> = catalog
            .iter()
            .map(|entry| AvailableModel {
                name: entry.name.to_string(),
                display_name: entry.name.to_string(),
                provider: Some(entry.provider),
                available: true,
            })
            .collect();

        for rule in &self.rules {
            match rule {
                ModelRule::HideAll => table.iter_mut().for_each(|model| model.available = false),
                ModelRule::ShowAll => table.iter_mut().for_each(|model| model.available = true),
                ModelRule::Hide(name) => {
                    if let Some(model) = table.iter_mut().find(|model| &model.name == name) {
                        model.available = false;
                    }
                },
                ModelRule::Show { name, display_name } => {
                    let display = display_name.clone().unwrap_or_else(|| name.clone());
                    if let Some(model) = table.iter_mut().find(|model| &model.name == name) {
                        model.available = true;
                        if display_name.is_some() {
                            model.display_name = display;
                        }
                    } else {
                        table.push(AvailableModel {
                            name: name.clone(),
                            display_name: display,
                            provider: None,
                            available: true,
                        });
                    }
                },
            }
        }

        table
    }

    /// Names of the models left available after applying the rules.
    #[must_use]
    pub fn available_names(&self, catalog: &[ModelEntry]) -> Vec<String> {
        self.apply(catalog)
            .into_iter()
            .filter(|model| model.available)
            .map(|model| model.name)
            .collect()
    }
}

fn parse_rule(entry: &str) -> Option<ModelRule> {
    match entry {
        "-all" => return Some(ModelRule::HideAll),
        "+all" => return Some(ModelRule::ShowAll),
        _ => {},
    }

    if let Some(name) = entry.strip_prefix('-') {
        let name = name.trim();
        return (!name.is_empty()).then(|| ModelRule::Hide(name.to_string()));
    }

    let entry = entry.strip_prefix('+').unwrap_or(entry);
    let (name, display_name) = match entry.split_once('=') {
        Some((name, display)) => {
            let display = display.trim();
            (name.trim(), (!display.is_empty()).then(|| display.to_string()))
        },
        None => (entry.trim(), None),
    };
    (!name.is_empty()).then(|| ModelRule::Show {
        name: name.to_string(),
        display_name,
    })
}
