use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
///
/// Loaded from `config.toml` in the platform config directory. CLI flags
/// override whatever the file says; missing fields fall back to defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

impl Config {
    /// Load config from default location, or defaults if there is no file
    pub fn load() -> crate::Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from an explicit file
    pub fn load_from(path: &Path) -> crate::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)
            .map_err(|e| crate::Error::ConfigError(format!("Failed to parse config: {}", e)))?;
        config.search.validate()?;
        Ok(config)
    }

    /// Save config to the default location
    pub fn save(&self) -> crate::Result<PathBuf> {
        let config_path = Self::config_path()?;
        self.save_to(&config_path)?;
        Ok(config_path)
    }

    pub fn save_to(&self, path: &Path) -> crate::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| crate::Error::ConfigError(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, contents)?;
        Ok(())
    }

    /// XDG on Linux, Application Support on macOS, AppData on Windows
    pub fn config_path() -> crate::Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| crate::Error::ConfigError("Could not find config directory".into()))?
            .join("socialpedia");

        Ok(config_dir.join("config.toml"))
    }
}

/// How a record is turned into comparison text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProjectionMode {
    /// Event fields or user fields, picked by the kind discriminator
    #[default]
    Tagged,
    /// One field list for every record, no discriminator
    Flat,
}

/// Ranking options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default)]
    pub projection: ProjectionMode,

    /// Attribute holding the record kind
    #[serde(default = "default_kind_field")]
    pub kind_field: String,

    /// Discriminator value marking an event, compared case-insensitively
    #[serde(default = "default_event_kind")]
    pub event_kind: String,

    #[serde(default = "default_event_fields")]
    pub event_fields: Vec<String>,

    #[serde(default = "default_user_fields")]
    pub default_fields: Vec<String>,

    /// Fields used by the flat projection
    #[serde(default = "default_flat_fields")]
    pub flat_fields: Vec<String>,

    /// Minimum similarity for a record to be returned
    #[serde(default = "default_threshold")]
    pub threshold: f32,

    /// `true` keeps scores equal to the threshold, `false` drops them
    #[serde(default = "default_threshold_inclusive")]
    pub threshold_inclusive: bool,

    /// Embedding calls in flight at once
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Share of failed records above which a warning is attached
    #[serde(default = "default_max_failure_ratio")]
    pub max_failure_ratio: f32,

    /// Truncate the ranked list, applied after sorting
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_results: Option<usize>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            projection: ProjectionMode::default(),
            kind_field: default_kind_field(),
            event_kind: default_event_kind(),
            event_fields: default_event_fields(),
            default_fields: default_user_fields(),
            flat_fields: default_flat_fields(),
            threshold: default_threshold(),
            threshold_inclusive: default_threshold_inclusive(),
            concurrency: default_concurrency(),
            max_failure_ratio: default_max_failure_ratio(),
            max_results: None,
        }
    }
}

impl SearchConfig {
    pub fn validate(&self) -> crate::Result<()> {
        if !self.threshold.is_finite() {
            return Err(crate::Error::ConfigError(
                "search.threshold must be a finite number".into(),
            ));
        }

        if self.concurrency == 0 {
            return Err(crate::Error::ConfigError(
                "search.concurrency must be at least 1".into(),
            ));
        }

        if !(0.0..=1.0).contains(&self.max_failure_ratio) {
            return Err(crate::Error::ConfigError(
                "search.max_failure_ratio must be between 0 and 1".into(),
            ));
        }

        let field_lists = match self.projection {
            ProjectionMode::Tagged => vec![
                ("event_fields", &self.event_fields),
                ("default_fields", &self.default_fields),
            ],
            ProjectionMode::Flat => vec![("flat_fields", &self.flat_fields)],
        };

        for (name, fields) in field_lists {
            if fields.is_empty() {
                return Err(crate::Error::ConfigError(format!(
                    "search.{} must name at least one field",
                    name
                )));
            }
        }

        if self.projection == ProjectionMode::Tagged && self.kind_field.trim().is_empty() {
            return Err(crate::Error::ConfigError(
                "search.kind_field must not be empty".into(),
            ));
        }

        Ok(())
    }
}

fn default_kind_field() -> String {
    "type".to_string()
}

fn default_event_kind() -> String {
    "event".to_string()
}

fn default_event_fields() -> Vec<String> {
    vec!["description".into(), "about".into(), "whatYoullLearn".into()]
}

fn default_user_fields() -> Vec<String> {
    vec![
        "firstName".into(),
        "lastName".into(),
        "bio".into(),
        "occupation".into(),
    ]
}

fn default_flat_fields() -> Vec<String> {
    vec!["title".into(), "description".into(), "bio".into()]
}

fn default_threshold() -> f32 {
    0.2
}

fn default_threshold_inclusive() -> bool {
    true
}

fn default_concurrency() -> usize {
    4
}

fn default_max_failure_ratio() -> f32 {
    0.25
}

/// Where embeddings come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// Local ONNX model, downloaded on first use
    #[default]
    Local,
    /// OpenAI-compatible `/embeddings` endpoint
    Remote,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub backend: EmbeddingBackend,

    /// Local model name
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default = "default_api_model")]
    pub api_model: String,

    /// Prefer the SOCIALPEDIA_API_KEY env var over storing this on disk
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl EmbeddingConfig {
    /// Model name used as the embedding cache namespace
    pub fn active_model(&self) -> &str {
        match self.backend {
            EmbeddingBackend::Local => &self.model,
            EmbeddingBackend::Remote => &self.api_model,
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackend::default(),
            model: default_model(),
            api_url: default_api_url(),
            api_model: default_api_model(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_model() -> String {
    "sentence-transformers/all-MiniLM-L6-v2".to_string()
}

fn default_api_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_api_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory holding `posts.json(l)` and `users.json(l)`
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from(".data"))
        .join("socialpedia")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Cache embeddings across searches
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_cache_path")]
    pub path: PathBuf,

    /// Oldest entries are evicted past this count
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: default_cache_path(),
            max_entries: default_max_entries(),
        }
    }
}

fn default_cache_path() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".cache"))
        .join("socialpedia")
        .join("embeddings.db")
}

fn default_max_entries() -> usize {
    50_000
}
