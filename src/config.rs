use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;

/// Top-level configuration for the intake pipeline
#[derive(Debug, Deserialize, Clone)]
pub struct IntakeConfig {
    /// Generative extraction provider to use
    #[serde(default = "default_provider")]
    pub default_provider: String,
    /// Map of provider name to provider configuration
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
    /// Request timeout in seconds for page and media fetches
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    /// Maximum number of HTML characters sent to the extraction service
    #[serde(default = "default_html_char_limit")]
    pub html_char_limit: usize,
    #[serde(default)]
    pub video: VideoServiceConfig,
    #[serde(default)]
    pub transcription: TranscriptionConfig,
    #[serde(default)]
    pub sink: SinkConfig,
}

/// Configuration for a specific generative extraction provider
#[derive(Debug, Deserialize, Clone)]
pub struct ProviderConfig {
    /// Whether this provider is enabled
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Model identifier (e.g., "gemini-2.0-flash", "gpt-4o")
    pub model: String,
    /// Temperature for generation (0.0-1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// API key for authentication (can also be set via environment variable)
    pub api_key: Option<String>,
    /// Base URL for API endpoint (for custom or proxy endpoints)
    pub base_url: Option<String>,
}

/// Video-platform download service
#[derive(Debug, Deserialize, Clone, Default)]
pub struct VideoServiceConfig {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
}

/// Speech-to-text service
#[derive(Debug, Deserialize, Clone)]
pub struct TranscriptionConfig {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    #[serde(default = "default_transcription_model")]
    pub model: String,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            model: default_transcription_model(),
        }
    }
}

/// Recipe manager that receives finished records
#[derive(Debug, Deserialize, Clone, Default)]
pub struct SinkConfig {
    pub base_url: Option<String>,
    pub api_token: Option<String>,
}

// Default value functions
fn default_provider() -> String {
    "google".to_string()
}

fn default_enabled() -> bool {
    true
}

fn default_temperature() -> f32 {
    0.2
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_timeout() -> u64 {
    30
}

fn default_html_char_limit() -> usize {
    crate::pipelines::DEFAULT_HTML_CHAR_LIMIT
}

fn default_transcription_model() -> String {
    "whisper-1".to_string()
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            default_provider: default_provider(),
            providers: HashMap::new(),
            timeout: default_timeout(),
            html_char_limit: default_html_char_limit(),
            video: VideoServiceConfig::default(),
            transcription: TranscriptionConfig::default(),
            sink: SinkConfig::default(),
        }
    }
}

impl IntakeConfig {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables with RECIPE_INTAKE__ prefix
    /// 2. recipe-intake.toml file in current directory
    /// 3. Default values
    ///
    /// Environment variable format: RECIPE_INTAKE__PROVIDERS__GOOGLE__API_KEY
    pub fn load() -> Result<Self, ConfigError> {
        load_config()
    }
}

/// Load configuration from file and environment variables
pub fn load_config() -> Result<IntakeConfig, ConfigError> {
    let settings = Config::builder()
        // Optional config file (can be missing)
        .add_source(File::with_name("recipe-intake").required(false))
        .add_source(environment())
        .build()?;

    settings.try_deserialize()
}

/// Double underscore for nesting: RECIPE_INTAKE__SINK__API_TOKEN
fn environment() -> Environment {
    Environment::with_prefix("RECIPE_INTAKE")
        .separator("__")
        .try_parsing(true)
}
