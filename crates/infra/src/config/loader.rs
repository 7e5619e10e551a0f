//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. If `GARDENWISE_DB_PATH` is set, the configuration is built from
//!    defaults plus the environment variables below
//! 2. Otherwise a config file is probed for and parsed
//! 3. With no file either, defaults are used
//!
//! The recommendation API key is always taken from the environment when
//! present so that it never has to live in a config file.
//!
//! ## Environment Variables
//! - `GARDENWISE_DB_PATH`: Database file path
//! - `GARDENWISE_DB_POOL_SIZE`: Connection pool size
//! - `GARDENWISE_DISPATCH_WORKERS`: Number of dispatcher workers
//! - `GARDENWISE_DISPATCH_TICK_SECS`: Dispatcher tick interval in seconds
//! - `GARDENWISE_AI_ENABLED`: Whether recommendations are requested
//! - `GARDENWISE_AI_ENDPOINT`: Base URL of the chat-completions API
//! - `GARDENWISE_AI_MODEL`: Model name
//! - `GARDENWISE_AI_API_KEY`: API key for the recommendation provider
//! - `GARDENWISE_WEBHOOK_URL`: Webhook receiving reminder payloads
//!
//! ## File Locations
//! `config.toml`, `config.json`, `gardenwise.toml` and `gardenwise.json` are
//! looked for in the working directory, its two parents, and next to the
//! executable.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use gardenwise_domain::{GardenwiseConfig, GardenwiseError, Result};

const DB_PATH_VAR: &str = "GARDENWISE_DB_PATH";
const API_KEY_VAR: &str = "GARDENWISE_AI_API_KEY";

const CONFIG_FILE_NAMES: [&str; 4] =
    ["config.toml", "config.json", "gardenwise.toml", "gardenwise.json"];

/// Load configuration with automatic fallback strategy.
///
/// The returned configuration has been validated.
///
/// # Errors
/// Returns `GardenwiseError::Config` if an environment variable or the
/// config file is malformed, or if the result fails validation.
pub fn load() -> Result<GardenwiseConfig> {
    let mut config = if std::env::var_os(DB_PATH_VAR).is_some() {
        let config = load_from_env()?;
        tracing::info!("Configuration loaded from environment variables");
        config
    } else {
        match probe_config_paths() {
            Some(path) => load_from_file(Some(path))?,
            None => {
                tracing::warn!("No config file found; using defaults");
                GardenwiseConfig::default()
            }
        }
    };

    if let Some(api_key) = env_opt(API_KEY_VAR) {
        config.recommendation.api_key = Some(api_key);
    }

    config.validate()?;
    Ok(config)
}

/// Load configuration from environment variables on top of defaults.
///
/// # Errors
/// Returns `GardenwiseError::Config` if `GARDENWISE_DB_PATH` is missing or
/// a numeric variable cannot be parsed.
pub fn load_from_env() -> Result<GardenwiseConfig> {
    let mut config = GardenwiseConfig::default();

    config.database.path = env_var(DB_PATH_VAR)?;
    if let Some(pool_size) = env_parse("GARDENWISE_DB_POOL_SIZE")? {
        config.database.pool_size = pool_size;
    }

    if let Some(workers) = env_parse("GARDENWISE_DISPATCH_WORKERS")? {
        config.dispatcher.workers = workers;
    }
    if let Some(tick) = env_parse("GARDENWISE_DISPATCH_TICK_SECS")? {
        config.dispatcher.tick_interval_secs = tick;
    }

    config.recommendation.enabled =
        env_bool("GARDENWISE_AI_ENABLED", config.recommendation.enabled);
    if let Some(endpoint) = env_opt("GARDENWISE_AI_ENDPOINT") {
        config.recommendation.endpoint = endpoint;
    }
    if let Some(model) = env_opt("GARDENWISE_AI_MODEL") {
        config.recommendation.model = model;
    }
    config.recommendation.api_key = env_opt(API_KEY_VAR);

    config.notifications.webhook_url = env_opt("GARDENWISE_WEBHOOK_URL");

    Ok(config)
}

/// Load configuration from a file.
///
/// If `path` is `None`, probes the standard locations.
///
/// # Errors
/// Returns `GardenwiseError::Config` if the file is missing, unreadable or
/// malformed.
pub fn load_from_file(path: Option<PathBuf>) -> Result<GardenwiseConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(GardenwiseError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            GardenwiseError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| GardenwiseError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration by file extension (`.toml` or `.json`).
fn parse_config(contents: &str, path: &Path) -> Result<GardenwiseConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| GardenwiseError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| GardenwiseError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(GardenwiseError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Return the first config file found in the standard locations.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut roots = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        roots.extend(cwd.ancestors().take(3).map(Path::to_path_buf));
    }
    if let Some(exe_dir) =
        std::env::current_exe().ok().and_then(|p| p.parent().map(Path::to_path_buf))
    {
        roots.push(exe_dir);
    }

    probe_in(&roots)
}

fn probe_in(roots: &[PathBuf]) -> Option<PathBuf> {
    roots
        .iter()
        .flat_map(|root| CONFIG_FILE_NAMES.iter().map(move |name| root.join(name)))
        .find(|path| path.exists())
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        GardenwiseError::Config(format!("Missing required environment variable: {}", key))
    })
}

/// Non-empty variable value, if set.
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_opt(key)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|e| GardenwiseError::Config(format!("Invalid value for {}: {}", key, e)))
        })
        .transpose()
}

/// Accepts `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive).
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
