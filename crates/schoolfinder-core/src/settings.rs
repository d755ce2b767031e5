//! Layered configuration.
//!
//! Settings are resolved in three layers (later wins):
//! 1. **Compiled defaults** — [`Settings::default()`]
//! 2. **User file** — `~/.schoolfinder/settings.json`, deep-merged over defaults
//! 3. **Environment variables** — `SCHOOLFINDER_*` and `GOOGLE_PLACES_KEY`
//!
//! Settings are passed around explicitly; there is no process-wide copy.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::paging::DEFAULT_PAGE_SIZE;
use crate::security::ApiKey;

pub const PLACES_KEY_ENV: &str = "GOOGLE_PLACES_KEY";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub server: ServerSettings,
    pub catalog: CatalogSettings,
    pub places: PlacesSettings,
    pub logging: LoggingSettings,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    pub port: u16,
    /// Artificial delay before answering `/api/places`.
    pub simulated_latency_ms: u64,
    pub request_timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: 3000,
            simulated_latency_ms: 0,
            request_timeout_secs: 30,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CatalogSettings {
    pub db_path: PathBuf,
    pub page_size: usize,
    pub seed_count: usize,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            db_path: data_dir().join("database/catalog.db"),
            page_size: DEFAULT_PAGE_SIZE,
            seed_count: 100,
        }
    }
}

/// Which record source backs `/api/places`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Catalog,
    Places,
}

impl std::str::FromStr for Backend {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "catalog" | "mock" => Ok(Self::Catalog),
            "places" | "google" => Ok(Self::Places),
            other => Err(SettingsError::InvalidValue {
                key: "backend".into(),
                value: other.into(),
            }),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlacesSettings {
    pub backend: Backend,
    pub base_url: String,
    pub default_query: String,
    /// Fill price, curriculum and facilities with random values for
    /// third-party results that lack them.
    pub synthesize_missing: bool,
    /// Only ever read from the environment.
    #[serde(skip)]
    pub api_key: Option<ApiKey>,
}

impl Default for PlacesSettings {
    fn default() -> Self {
        Self {
            backend: Backend::Catalog,
            base_url: "https://maps.googleapis.com".into(),
            default_query: "schools in Lagos, Nigeria".into(),
            synthesize_missing: false,
            api_key: None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    pub level: String,
    pub log_to_sqlite: bool,
    pub log_db_path: PathBuf,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".into(),
            log_to_sqlite: true,
            log_db_path: data_dir().join("database/logs.db"),
        }
    }
}

/// `~/.schoolfinder`, or `/tmp/.schoolfinder` without a home directory.
pub fn data_dir() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
        .join(".schoolfinder")
}

pub fn settings_path() -> PathBuf {
    data_dir().join("settings.json")
}

/// Load from the default path with environment overrides.
pub fn load_settings() -> Result<Settings, SettingsError> {
    load_settings_from_path(&settings_path())
}

/// Load from `path` (missing file = defaults) with environment overrides.
pub fn load_settings_from_path(path: &Path) -> Result<Settings, SettingsError> {
    let defaults = serde_json::to_value(Settings::default())?;
    let merged = match std::fs::read_to_string(path) {
        Ok(raw) => {
            debug!(path = %path.display(), "loading settings file");
            let user: Value = serde_json::from_str(&raw)?;
            deep_merge(defaults, user)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => defaults,
        Err(source) => {
            return Err(SettingsError::Io {
                path: path.to_owned(),
                source,
            })
        }
    };

    let mut settings: Settings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings, |key| std::env::var(key).ok())?;
    Ok(settings)
}

/// Recursively merge `overlay` into `base`. Objects merge key by key;
/// anything else in `overlay` replaces the base value.
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                let merged = match base.remove(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value,
                };
                let _ = base.insert(key, merged);
            }
            Value::Object(base)
        }
        (_, overlay) => overlay,
    }
}

/// Apply `SCHOOLFINDER_*` overrides read through `lookup`.
pub fn apply_env_overrides<F>(settings: &mut Settings, lookup: F) -> Result<(), SettingsError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup("SCHOOLFINDER_PORT") {
        settings.server.port = parse_env("SCHOOLFINDER_PORT", &v)?;
    }
    if let Some(v) = lookup("SCHOOLFINDER_LATENCY_MS") {
        settings.server.simulated_latency_ms = parse_env("SCHOOLFINDER_LATENCY_MS", &v)?;
    }
    if let Some(v) = lookup("SCHOOLFINDER_PAGE_SIZE") {
        settings.catalog.page_size = parse_env("SCHOOLFINDER_PAGE_SIZE", &v)?;
    }
    if let Some(v) = lookup("SCHOOLFINDER_DB") {
        settings.catalog.db_path = PathBuf::from(v);
    }
    if let Some(v) = lookup("SCHOOLFINDER_BACKEND") {
        settings.places.backend = v.parse()?;
    }
    if let Some(v) = lookup(PLACES_KEY_ENV).filter(|v| !v.trim().is_empty()) {
        settings.places.api_key = Some(ApiKey::new(v));
    }
    Ok(())
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, SettingsError> {
    value.trim().parse().map_err(|_| SettingsError::InvalidValue {
        key: key.into(),
        value: value.into(),
    })
}
