//! Configuration for the parse evaluator.
//!
//! Supports both environment variables and YAML config file.
//! Environment variables take precedence over config file values.

use crate::error::{ParseEvalError, Result};
use crate::persistence::{DEFAULT_GROUND_TRUTH_PATH, DEFAULT_RESULTS_PATH};
use crate::provider::Provider;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

/// Settings for one LLM provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL for the API (e.g., "https://api.openai.com/v1"). The
    /// version segment and, for Claude, the full messages URL are accepted.
    pub api_base: String,

    /// API key for authentication
    pub api_key: String,

    /// Model name (e.g., "gpt-5", "claude-sonnet-4-20250514")
    pub model: String,

    /// Response token cap; only the Messages API takes one
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Temperature for generation
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Per-request HTTP timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_temperature() -> f32 {
    0.0
}

fn default_timeout_secs() -> u64 {
    60
}

impl LlmConfig {
    /// Defaults for a provider's public endpoint, without a key.
    pub fn for_provider(provider: Provider) -> Self {
        let (api_base, model) = match provider {
            Provider::OpenAi => ("https://api.openai.com/v1", "gpt-5"),
            Provider::Claude => (
                "https://api.anthropic.com/v1/messages",
                "claude-sonnet-4-20250514",
            ),
        };
        Self {
            api_base: api_base.to_string(),
            api_key: String::new(),
            model: model.to_string(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Provider settings, one per known provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    pub openai: LlmConfig,
    pub claude: LlmConfig,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            openai: LlmConfig::for_provider(Provider::OpenAi),
            claude: LlmConfig::for_provider(Provider::Claude),
        }
    }
}

/// Where the run log and ground truth live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub results_path: PathBuf,
    pub ground_truth_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            results_path: PathBuf::from(DEFAULT_RESULTS_PATH),
            ground_truth_path: PathBuf::from(DEFAULT_GROUND_TRUTH_PATH),
        }
    }
}

/// Optional files that override or extend the built-in system prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptConfig {
    pub system_prompt_path: PathBuf,
    pub examples_path: PathBuf,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            system_prompt_path: PathBuf::from("prompt/system.txt"),
            examples_path: PathBuf::from("prompt/examples.json"),
        }
    }
}

/// Full application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub providers: ProvidersConfig,
    pub storage: StorageConfig,
    pub prompt: PromptConfig,
}

/// Configuration file structure (YAML format).
#[derive(Debug, Deserialize)]
struct ConfigFile {
    providers: Option<ProvidersFileSection>,
    storage: Option<StorageFileSection>,
    prompt: Option<PromptFileSection>,
}

#[derive(Debug, Deserialize)]
struct ProvidersFileSection {
    openai: Option<LlmFileSection>,
    claude: Option<LlmFileSection>,
}

#[derive(Debug, Deserialize)]
struct LlmFileSection {
    api_base: Option<String>,
    api_key: Option<String>,
    model: Option<String>,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct StorageFileSection {
    results_path: Option<PathBuf>,
    ground_truth_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct PromptFileSection {
    system_prompt_path: Option<PathBuf>,
    examples_path: Option<PathBuf>,
}

impl LlmFileSection {
    fn apply(self, llm: &mut LlmConfig) {
        if let Some(api_base) = self.api_base {
            llm.api_base = api_base;
        }
        if let Some(api_key) = self.api_key {
            llm.api_key = api_key;
        }
        if let Some(model) = self.model {
            llm.model = model;
        }
        if let Some(max_tokens) = self.max_tokens {
            llm.max_tokens = max_tokens;
        }
        if let Some(temperature) = self.temperature {
            llm.temperature = temperature;
        }
        if let Some(timeout_secs) = self.timeout_secs {
            llm.timeout_secs = timeout_secs;
        }
    }
}

impl Config {
    /// Load configuration from environment variables and optional config file.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (OPENAI_API_KEY, CLAUDE_API_KEY, PARSE_EVAL_RESULTS, ...)
    /// 2. Config file (~/.config/query-parse-eval/config.yaml)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        let mut config = Config::default();

        // Try to load from config file first
        if let Some(config_path) = Self::config_file_path() {
            if config_path.exists() {
                config = Self::load_from_file(&config_path)?;
            }
        }

        config.apply_env();
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ParseEvalError::io(path, e))?;
        Self::from_yaml(&content)
    }

    /// Parse a YAML document on top of the defaults.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let file_config: ConfigFile = serde_yaml::from_str(content)
            .map_err(|e| ParseEvalError::Config(format!("Failed to parse config file: {}", e)))?;

        let mut config = Config::default();

        if let Some(providers) = file_config.providers {
            if let Some(openai) = providers.openai {
                openai.apply(&mut config.providers.openai);
            }
            if let Some(claude) = providers.claude {
                claude.apply(&mut config.providers.claude);
            }
        }

        if let Some(storage) = file_config.storage {
            if let Some(results_path) = storage.results_path {
                config.storage.results_path = results_path;
            }
            if let Some(ground_truth_path) = storage.ground_truth_path {
                config.storage.ground_truth_path = ground_truth_path;
            }
        }

        if let Some(prompt) = file_config.prompt {
            if let Some(system_prompt_path) = prompt.system_prompt_path {
                config.prompt.system_prompt_path = system_prompt_path;
            }
            if let Some(examples_path) = prompt.examples_path {
                config.prompt.examples_path = examples_path;
            }
        }

        Ok(config)
    }

    /// Override values from environment variables.
    fn apply_env(&mut self) {
        for (provider, prefix) in [(Provider::OpenAi, "OPENAI"), (Provider::Claude, "CLAUDE")] {
            let llm = self.llm_mut(provider);
            if let Ok(api_key) = env::var(format!("{}_API_KEY", prefix)) {
                llm.api_key = api_key;
            }
            if let Ok(api_base) = env::var(format!("{}_BASE_URL", prefix)) {
                llm.api_base = api_base;
            }
            if let Ok(model) = env::var(format!("{}_MODEL", prefix)) {
                llm.model = model;
            }
        }

        if let Ok(results_path) = env::var("PARSE_EVAL_RESULTS") {
            self.storage.results_path = PathBuf::from(results_path);
        }
        if let Ok(ground_truth_path) = env::var("PARSE_EVAL_GROUND_TRUTH") {
            self.storage.ground_truth_path = PathBuf::from(ground_truth_path);
        }
    }

    /// Get the default config file path.
    pub fn config_file_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "query-parse-eval")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Settings for one provider.
    pub fn llm(&self, provider: Provider) -> &LlmConfig {
        match provider {
            Provider::OpenAi => &self.providers.openai,
            Provider::Claude => &self.providers.claude,
        }
    }

    fn llm_mut(&mut self, provider: Provider) -> &mut LlmConfig {
        match provider {
            Provider::OpenAi => &mut self.providers.openai,
            Provider::Claude => &mut self.providers.claude,
        }
    }

    /// Validate that a provider can be called.
    pub fn validate_provider(&self, provider: Provider) -> Result<()> {
        let llm = self.llm(provider);
        let prefix = provider.as_str().to_uppercase();

        if llm.api_key.is_empty() {
            return Err(ParseEvalError::Config(format!(
                "{} API key is required. Set {}_API_KEY environment variable or add to config file.",
                provider, prefix
            )));
        }

        if llm.api_base.is_empty() {
            return Err(ParseEvalError::Config(format!(
                "{} API base URL is required. Set {}_BASE_URL environment variable or add to config file.",
                provider, prefix
            )));
        }

        if llm.model.is_empty() {
            return Err(ParseEvalError::Config(format!(
                "{} model is required. Set {}_MODEL environment variable or add to config file.",
                provider, prefix
            )));
        }

        Ok(())
    }
}
