//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.termchat/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::inference::DEFAULT_OPENAI_BASE_URL;

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct TermchatConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub openai: OpenAiConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GeneralConfig {
    pub model: Option<String>,
    pub max_prev_msgs: Option<usize>,
    pub max_request_tokens: Option<u32>,
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    pub organization: Option<String>,
    pub base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct StorageConfig {
    pub dir: Option<PathBuf>,
}

/// Values given on the command line. `None` = not specified.
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub model: Option<String>,
    pub data_dir: Option<PathBuf>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub api_key: Option<String>,
    pub organization: Option<String>,
    pub base_url: String,
    pub model: String,
    /// `0` = send the whole conversation.
    pub max_prev_messages: usize,
    /// `0` = provider default.
    pub max_reply_tokens: u32,
    pub request_timeout: Duration,
    pub data_dir: PathBuf,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns `~/.termchat`, the home of config, logs and (by default) chats.
pub fn termchat_home() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".termchat"))
}

/// Returns the path to `~/.termchat/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    termchat_home().map(|d| d.join("config.toml"))
}

/// Load config from `~/.termchat/config.toml`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `TermchatConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config() -> Result<TermchatConfig, ConfigError> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            warn!("Could not determine home directory, using default config");
            return Ok(TermchatConfig::default());
        }
    };
    load_config_from(&path)
}

pub fn load_config_from(path: &Path) -> Result<TermchatConfig, ConfigError> {
    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(path);
        return Ok(TermchatConfig::default());
    }

    let contents = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: TermchatConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    // api_key deliberately not logged
    debug!(
        "Config: model={:?}, max_prev_msgs={:?}, max_request_tokens={:?}, storage={:?}",
        config.general.model,
        config.general.max_prev_msgs,
        config.general.max_request_tokens,
        config.storage.dir
    );
    Ok(config)
}

const DEFAULT_CONFIG_CONTENT: &str = r#"# termchat configuration
# All settings are optional. Defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [general]
# model = "gpt-3.5-turbo"            # Or OPEN_AI_MODEL / --model
# max_prev_msgs = 0                  # Messages sent per request, 0 = all (MAX_PREV_MSGS)
# max_request_tokens = 0             # Reply cap, 0 = provider default (MAX_REQUEST_TOKENS)
# request_timeout_secs = 120

# [openai]
# api_key = "sk-..."                 # Or set OPEN_AI_TOKEN env var
# organization = "org-..."           # Or set OPEN_AI_ORG env var
# base_url = "https://api.openai.com/v1"

# [storage]
# dir = "/home/me/.termchat/chats"   # Or TERMCHAT_DATA_DIR / --data-dir
"#;

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &Path) {
    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            warn!("Failed to create config directory: {}", e);
            return;
        }
    }
    if let Err(e) = fs::write(path, DEFAULT_CONFIG_CONTENT) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config from the process environment.
pub fn resolve(config: &TermchatConfig, cli: &CliOverrides) -> ResolvedConfig {
    resolve_with(config, cli, |key| std::env::var(key).ok())
}

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
///
/// `env` looks up one environment variable; tests pass a map instead of
/// mutating the process environment.
pub fn resolve_with<E>(config: &TermchatConfig, cli: &CliOverrides, env: E) -> ResolvedConfig
where
    E: Fn(&str) -> Option<String>,
{
    // API key / organization: env → config
    let api_key = env("OPEN_AI_TOKEN").or_else(|| config.openai.api_key.clone());
    let organization = env("OPEN_AI_ORG").or_else(|| config.openai.organization.clone());

    // Base URL: env → config → default
    let base_url = env("OPEN_AI_BASE_URL")
        .or_else(|| config.openai.base_url.clone())
        .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string());

    // Model: CLI → env → config → default
    let model = cli
        .model
        .clone()
        .or_else(|| env("OPEN_AI_MODEL"))
        .or_else(|| config.general.model.clone())
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());

    let max_prev_messages = env("MAX_PREV_MSGS")
        .map(|v| parse_int_or_zero("MAX_PREV_MSGS", &v))
        .or(config.general.max_prev_msgs)
        .unwrap_or(0);

    let max_reply_tokens = env("MAX_REQUEST_TOKENS")
        .map(|v| parse_int_or_zero("MAX_REQUEST_TOKENS", &v))
        .or(config.general.max_request_tokens)
        .unwrap_or(0);

    // Data dir: CLI → env → config → default
    let data_dir = cli
        .data_dir
        .clone()
        .or_else(|| env("TERMCHAT_DATA_DIR").map(PathBuf::from))
        .or_else(|| config.storage.dir.clone())
        .unwrap_or_else(default_data_dir);

    ResolvedConfig {
        api_key,
        organization,
        base_url,
        model,
        max_prev_messages,
        max_reply_tokens,
        request_timeout: Duration::from_secs(
            config
                .general
                .request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        ),
        data_dir,
    }
}

/// Integer env values that fail to parse count as `0`.
fn parse_int_or_zero<T: std::str::FromStr + Default>(key: &str, value: &str) -> T {
    value.trim().parse().unwrap_or_else(|_| {
        warn!("{} is not a valid number ({:?}), using 0", key, value);
        T::default()
    })
}

fn default_data_dir() -> PathBuf {
    termchat_home()
        .unwrap_or_else(|| PathBuf::from(".termchat"))
        .join("chats")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_resolve_uses_defaults_when_empty() {
        let resolved = resolve_with(&TermchatConfig::default(), &CliOverrides::default(), no_env);
        assert_eq!(resolved.model, DEFAULT_MODEL);
        assert_eq!(resolved.base_url, DEFAULT_OPENAI_BASE_URL);
        assert_eq!(resolved.max_prev_messages, 0);
        assert_eq!(resolved.max_reply_tokens, 0);
        assert_eq!(resolved.request_timeout, Duration::from_secs(120));
        assert!(resolved.api_key.is_none());
        assert!(resolved.data_dir.ends_with("chats"));
    }

    #[test]
    fn test_resolve_config_values_override_defaults() {
        let config = TermchatConfig {
            general: GeneralConfig {
                model: Some("gpt-4o".to_string()),
                max_prev_msgs: Some(6),
                max_request_tokens: Some(512),
                request_timeout_secs: Some(30),
            },
            openai: OpenAiConfig {
                api_key: Some("sk-file".to_string()),
                organization: Some("org-file".to_string()),
                base_url: None,
            },
            storage: StorageConfig {
                dir: Some(PathBuf::from("/tmp/chats")),
            },
        };
        let resolved = resolve_with(&config, &CliOverrides::default(), no_env);
        assert_eq!(resolved.model, "gpt-4o");
        assert_eq!(resolved.max_prev_messages, 6);
        assert_eq!(resolved.max_reply_tokens, 512);
        assert_eq!(resolved.request_timeout, Duration::from_secs(30));
        assert_eq!(resolved.api_key.as_deref(), Some("sk-file"));
        assert_eq!(resolved.organization.as_deref(), Some("org-file"));
        assert_eq!(resolved.data_dir, PathBuf::from("/tmp/chats"));
    }

    #[test]
    fn test_env_wins_over_file() {
        let config = TermchatConfig {
            general: GeneralConfig {
                max_prev_msgs: Some(6),
                ..Default::default()
            },
            openai: OpenAiConfig {
                api_key: Some("sk-file".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let env = env_of(&[
            ("OPEN_AI_TOKEN", "sk-env"),
            ("OPEN_AI_ORG", "org-env"),
            ("MAX_PREV_MSGS", "4"),
            ("MAX_REQUEST_TOKENS", "100"),
        ]);
        let resolved = resolve_with(&config, &CliOverrides::default(), env);
        assert_eq!(resolved.api_key.as_deref(), Some("sk-env"));
        assert_eq!(resolved.organization.as_deref(), Some("org-env"));
        assert_eq!(resolved.max_prev_messages, 4);
        assert_eq!(resolved.max_reply_tokens, 100);
    }

    #[test]
    fn test_bad_integer_env_falls_back_to_zero() {
        let config = TermchatConfig {
            general: GeneralConfig {
                max_prev_msgs: Some(6),
                ..Default::default()
            },
            ..Default::default()
        };
        let env = env_of(&[("MAX_PREV_MSGS", "lots"), ("MAX_REQUEST_TOKENS", "-3")]);
        let resolved = resolve_with(&config, &CliOverrides::default(), env);
        assert_eq!(resolved.max_prev_messages, 0);
        assert_eq!(resolved.max_reply_tokens, 0);
    }

    #[test]
    fn test_cli_wins_over_env() {
        let cli = CliOverrides {
            model: Some("cli-model".to_string()),
            data_dir: Some(PathBuf::from("/cli/dir")),
        };
        let env = env_of(&[("OPEN_AI_MODEL", "env-model"), ("TERMCHAT_DATA_DIR", "/env/dir")]);
        let resolved = resolve_with(&TermchatConfig::default(), &cli, env);
        assert_eq!(resolved.model, "cli-model");
        assert_eq!(resolved.data_dir, PathBuf::from("/cli/dir"));
    }

    #[test]
    fn test_sparse_toml_parses() {
        let toml_str = r#"
[general]
model = "my-model"
"#;
        let config: TermchatConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.model.as_deref(), Some("my-model"));
        assert!(config.general.max_prev_msgs.is_none());
        assert!(config.openai.api_key.is_none());
        assert!(config.storage.dir.is_none());
    }

    #[test]
    fn test_generated_default_parses_to_defaults() {
        let config: TermchatConfig = toml::from_str(DEFAULT_CONFIG_CONTENT).unwrap();
        assert!(config.general.model.is_none());
        assert!(config.openai.base_url.is_none());
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let dir = std::env::temp_dir().join(format!("termchat-config-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        fs::write(&path, "[general\nmodel = ").unwrap();

        let result = load_config_from(&path);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_missing_file_generates_default() {
        let dir = std::env::temp_dir().join(format!("termchat-gen-{}", std::process::id()));
        let path = dir.join("config.toml");
        let _ = fs::remove_dir_all(&dir);

        let config = load_config_from(&path).unwrap();
        assert!(config.general.model.is_none());
        assert!(path.exists());
        let _ = fs::remove_dir_all(&dir);
    }
}
