//! Configuration file handling for media-studio.
//!
//! Loads configuration from `~/.config/media-studio/config.toml` or a custom
//! path, then applies API keys from the environment on top.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable holding the stock-photo search access key.
pub const PHOTO_SEARCH_KEY_ENV: &str = "UNSPLASH_ACCESS_KEY";

/// Environment variable holding the premium voice-synthesis API key.
pub const VOICE_SYNTHESIS_KEY_ENV: &str = "ELEVEN_API_KEY";

/// Configuration file structure for media-studio.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub keys: KeysConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub endpoints: EndpointsConfig,
    #[serde(default)]
    pub voice: VoiceConfig,
    #[serde(default)]
    pub video: VideoConfig,
    #[serde(default)]
    pub network: NetworkConfig,
}

/// Provider credentials. Either may be absent; the generators degrade.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
pub struct KeysConfig {
    #[serde(default)]
    pub photo_search: Option<String>,
    #[serde(default)]
    pub voice_synthesis: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct PathsConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_fallback_image")]
    pub fallback_image: PathBuf,
    #[serde(default = "default_watermark_image")]
    pub watermark_image: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            fallback_image: default_fallback_image(),
            watermark_image: default_watermark_image(),
        }
    }
}

/// Base URLs of the upstream services. Overridable for self-hosted proxies and tests.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct EndpointsConfig {
    #[serde(default = "default_photo_search_url")]
    pub photo_search: String,
    #[serde(default = "default_premium_voice_url")]
    pub premium_voice: String,
    #[serde(default = "default_free_voice_url")]
    pub free_voice: String,
    #[serde(default = "default_translation_url")]
    pub translation: String,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            photo_search: default_photo_search_url(),
            premium_voice: default_premium_voice_url(),
            free_voice: default_free_voice_url(),
            translation: default_translation_url(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct VoiceConfig {
    #[serde(default = "default_voice_id")]
    pub voice_id: String,
    #[serde(default = "default_voice_model")]
    pub model_id: String,
    #[serde(default = "default_stability")]
    pub stability: f32,
    #[serde(default = "default_similarity_boost")]
    pub similarity_boost: f32,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            voice_id: default_voice_id(),
            model_id: default_voice_model(),
            stability: default_stability(),
            similarity_boost: default_similarity_boost(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct VideoConfig {
    #[serde(default = "default_video_height")]
    pub height: u32,
    #[serde(default = "default_fps")]
    pub fps: u32,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            height: default_video_height(),
            fps: default_fps(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct NetworkConfig {
    /// Per-request timeout for search, download and translation calls.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Retries for transient network errors and rate limits.
    #[serde(default = "default_retries")]
    pub retries: u32,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            retries: default_retries(),
        }
    }
}

impl NetworkConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("outputs")
}

fn default_fallback_image() -> PathBuf {
    PathBuf::from("assets/fallback.jpg")
}

fn default_watermark_image() -> PathBuf {
    PathBuf::from("assets/logo_watermark.png")
}

fn default_photo_search_url() -> String {
    "https://api.unsplash.com".to_string()
}

fn default_premium_voice_url() -> String {
    "https://api.elevenlabs.io".to_string()
}

fn default_free_voice_url() -> String {
    "https://translate.google.com".to_string()
}

fn default_translation_url() -> String {
    "https://translate.googleapis.com".to_string()
}

fn default_voice_id() -> String {
    // "Aria"
    "21m00Tcm4TlvDq8ikWAM".to_string()
}

fn default_voice_model() -> String {
    "eleven_monolingual_v1".to_string()
}

fn default_stability() -> f32 {
    0.5
}

fn default_similarity_boost() -> f32 {
    0.75
}

fn default_video_height() -> u32 {
    720
}

fn default_fps() -> u32 {
    24
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_retries() -> u32 {
    2
}

impl Config {
    /// Load configuration from a file path.
    /// Returns default config if the file doesn't exist.
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(PathBuf::from).unwrap_or_else(default_path);

        if path.exists() {
            Self::load_from_explicit(&path)
        } else {
            Ok(Config::default())
        }
    }

    /// Load configuration from a path the user named explicitly.
    /// Unlike [`Config::load`], a missing file is an error.
    pub fn load_from_explicit(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Apply API keys from the process environment, overriding the file.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|name| std::env::var(name).ok())
    }

    /// Apply API keys from an arbitrary lookup. Empty values are ignored.
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty(PHOTO_SEARCH_KEY_ENV) {
            self.keys.photo_search = Some(key);
        }
        if let Some(key) = non_empty(VOICE_SYNTHESIS_KEY_ENV) {
            self.keys.voice_synthesis = Some(key);
        }
        self
    }

    /// Render the effective configuration as TOML with keys masked.
    pub fn to_display_toml(&self) -> String {
        let mut shown = self.clone();
        shown.keys.photo_search = shown.keys.photo_search.as_deref().map(mask_secret);
        shown.keys.voice_synthesis = shown.keys.voice_synthesis.as_deref().map(mask_secret);
        toml::to_string_pretty(&shown).unwrap_or_else(|e| format!("# unable to render: {}", e))
    }
}

/// Mask a secret for logs: first four characters, then `...****`.
pub fn mask_secret(secret: &str) -> String {
    let prefix: String = secret.chars().take(4).collect();
    format!("{}...****", prefix)
}

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError { path, source } => {
                write!(
                    f,
                    "Failed to read config file '{}': {}",
                    path.display(),
                    source
                )
            }
            ConfigError::ParseError { path, source } => {
                write!(
                    f,
                    "Failed to parse config file '{}': {}",
                    path.display(),
                    source
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::IoError { source, .. } => Some(source),
            ConfigError::ParseError { source, .. } => Some(source),
        }
    }
}

/// Get the default config file path.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("media-studio").join("config.toml"))
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config/media-studio/config.toml")
        })
}

/// Commented default configuration written by `config init`.
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# media-studio configuration

[keys]
# Stock photo search access key (or set UNSPLASH_ACCESS_KEY)
# photo_search = "your-unsplash-access-key"
# Premium voice synthesis key (or set ELEVEN_API_KEY)
# voice_synthesis = "your-elevenlabs-key"

[paths]
output_dir = "outputs"
fallback_image = "assets/fallback.jpg"
watermark_image = "assets/logo_watermark.png"

[voice]
# Voice used for English premium synthesis
voice_id = "21m00Tcm4TlvDq8ikWAM"
model_id = "eleven_monolingual_v1"
stability = 0.5
similarity_boost = 0.75

[video]
# Output height in pixels; width follows the image aspect ratio
height = 720
fps = 24

[network]
timeout_secs = 10
retries = 2
"#;
