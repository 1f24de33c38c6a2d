//! Configuration file management for platter.
//!
//! Provides a TOML-based config file at `~/.config/platter/config.toml` and
//! a resolution chain: CLI flag > env var > config file > default. Backend
//! selection lives here -- which adapter is active is configuration, never
//! core logic.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use platter_core::backend::{
    BackendRegistry, BuiltinBackend, ModelBackend, OllamaBackend, OpenAiBackend,
};
use platter_core::plan::PlannerConfig;
use platter_core::shopping::AggregateOptions;

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub backend: BackendSection,
    #[serde(default)]
    pub generation: GenerationSection,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BackendSection {
    /// Active backend: `builtin`, `openai`, or `ollama`.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Model name override, where the backend has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Base URL override (hosted API gateway or Ollama server).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Environment variable holding the hosted-API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

impl Default for BackendSection {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            base_url: None,
            api_key_env: default_api_key_env(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationSection {
    /// Additional full-plan attempts after the first.
    #[serde(default = "default_retry_limit")]
    pub retry_limit: u32,
    /// Per-backend-call timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_weekday_minutes")]
    pub weekday_minutes: u32,
    #[serde(default = "default_weekend_minutes")]
    pub weekend_minutes: u32,
    /// Let the backend canonicalize shopping-list names.
    #[serde(default = "default_true")]
    pub normalize_with_backend: bool,
    /// Drop pantry staples (salt, spices) from shopping lists.
    #[serde(default)]
    pub skip_pantry_staples: bool,
}

impl Default for GenerationSection {
    fn default() -> Self {
        Self {
            retry_limit: default_retry_limit(),
            request_timeout_secs: default_timeout_secs(),
            weekday_minutes: default_weekday_minutes(),
            weekend_minutes: default_weekend_minutes(),
            normalize_with_backend: true,
            skip_pantry_staples: false,
        }
    }
}

fn default_provider() -> String {
    "builtin".to_owned()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_owned()
}

fn default_retry_limit() -> u32 {
    2
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_weekday_minutes() -> u32 {
    30
}

fn default_weekend_minutes() -> u32 {
    60
}

fn default_true() -> bool {
    true
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the platter config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/platter` or `~/.config/platter`.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("platter");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("platter")
}

/// Return the path to the platter config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file. Returns an error if it does not exist.
pub fn load_config() -> Result<ConfigFile> {
    let path = config_path();
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents).context("failed to parse config file")?;
    Ok(config)
}

/// Serialize and write the config file, creating parent dirs as needed.
pub fn save_config(config: &ConfigFile) -> Result<()> {
    let path = config_path();
    let dir = config_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create config directory {}", dir.display()))?;

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(&path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;
    Ok(())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct PlatterConfig {
    pub provider: String,
    pub backend: BackendSection,
    pub generation: GenerationSection,
}

impl PlatterConfig {
    /// Resolve configuration using the chain:
    /// CLI flag > `PLATTER_BACKEND` env > config file > `builtin`.
    pub fn resolve(cli_backend: Option<&str>) -> Result<Self> {
        let file_config = load_config().unwrap_or_default();

        let provider = if let Some(name) = cli_backend {
            name.to_owned()
        } else if let Ok(name) = std::env::var("PLATTER_BACKEND") {
            name
        } else {
            file_config.backend.provider.clone()
        };

        Ok(Self {
            provider,
            backend: file_config.backend,
            generation: file_config.generation,
        })
    }

    /// Construct the active backend adapter.
    pub fn build_backend(&self) -> Result<Box<dyn ModelBackend>> {
        match self.provider.as_str() {
            "builtin" => Ok(Box::new(BuiltinBackend::new())),
            "ollama" => Ok(Box::new(OllamaBackend::new(
                self.backend.base_url.as_deref(),
                self.backend.model.as_deref(),
            ))),
            "openai" => {
                let api_key = std::env::var(&self.backend.api_key_env).with_context(|| {
                    format!(
                        "backend \"openai\" needs an API key in ${}",
                        self.backend.api_key_env
                    )
                })?;
                let mut backend = OpenAiBackend::new(api_key, self.backend.model.as_deref());
                if let Some(base_url) = &self.backend.base_url {
                    backend = backend.with_base_url(base_url);
                }
                Ok(Box::new(backend))
            }
            other => bail!("unknown backend {other:?} (expected builtin, openai, or ollama)"),
        }
    }

    /// Registry of every backend usable with the current configuration.
    ///
    /// The hosted backend is only registered when its API key is actually
    /// present, so `platter backends` shows what would really work.
    pub fn build_registry(&self) -> BackendRegistry {
        let mut registry = BackendRegistry::new();
        registry.register(BuiltinBackend::new());
        registry.register(OllamaBackend::new(
            self.backend.base_url.as_deref(),
            self.backend.model.as_deref(),
        ));
        if let Ok(api_key) = std::env::var(&self.backend.api_key_env) {
            registry.register(OpenAiBackend::new(api_key, self.backend.model.as_deref()));
        }
        registry
    }

    /// Planner tunables derived from the generation section.
    pub fn planner_config(&self) -> PlannerConfig {
        PlannerConfig {
            retry_limit: self.generation.retry_limit,
            request_timeout: Duration::from_secs(self.generation.request_timeout_secs),
            weekday_minutes: self.generation.weekday_minutes,
            weekend_minutes: self.generation.weekend_minutes,
            normalize_with_backend: self.generation.normalize_with_backend,
            aggregate: AggregateOptions {
                skip_pantry_staples: self.generation.skip_pantry_staples,
            },
            ..PlannerConfig::default()
        }
    }
}

/// Write a starter config file. `force` overwrites an existing one.
pub fn cmd_init(force: bool) -> Result<()> {
    let path = config_path();
    if path.exists() && !force {
        bail!(
            "config file already exists at {} (use --force to overwrite)",
            path.display()
        );
    }
    save_config(&ConfigFile::default())?;
    println!("wrote {}", path.display());
    Ok(())
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
