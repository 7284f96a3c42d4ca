use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::tabnews::{Strategy, DEFAULT_TIMEOUT, TABNEWS_API_BASE};

const DEFAULT_ENV_PREFIX: &str = "TABNEWS";
/// Plain token variable, usually provided through a local `.env` file.
pub const TOKEN_ENV: &str = "TABNEWS_TOKEN";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: String::new(),
            email: String::new(),
            password: String::new(),
            user_agent: default_user_agent(),
            timeout: default_timeout(),
        }
    }
}

fn default_base_url() -> String {
    TABNEWS_API_BASE.to_string()
}

fn default_user_agent() -> String {
    format!("tabnews-tui/{}", crate::VERSION)
}

fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeedConfig {
    #[serde(default)]
    pub strategy: Strategy,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    #[serde(default)]
    pub username: Option<String>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            per_page: default_per_page(),
            username: None,
        }
    }
}

fn default_per_page() -> u32 {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_file")]
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}

fn default_log_file() -> Option<PathBuf> {
    dirs::cache_dir().map(|dir| dir.join("tabnews-tui").join("tabnews-tui.log"))
}

#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    pub config_file: Option<PathBuf>,
    pub env_prefix: Option<String>,
}

pub fn load(options: LoadOptions) -> Result<Config> {
    let mut cfg = Config::default();

    let path = options.config_file.or_else(default_config_path);
    if let Some(path) = path {
        if path.exists() {
            let from_file = read_config_file(&path)?;
            cfg = merge_config(cfg, from_file);
        }
    }

    let prefix = options.env_prefix.as_deref().unwrap_or(DEFAULT_ENV_PREFIX);
    apply_env(&mut cfg, prefix);

    if cfg.api.token.is_empty() {
        if let Ok(token) = env::var(TOKEN_ENV) {
            cfg.api.token = token.trim().to_string();
        }
    }

    Ok(cfg)
}

fn read_config_file(path: &Path) -> Result<Config> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file at {}", path.display()))?;
    let config: Config = serde_yaml::from_str(&data)
        .with_context(|| format!("Failed to parse config file at {}", path.display()))?;
    Ok(config)
}

fn merge_config(mut base: Config, other: Config) -> Config {
    if !other.api.base_url.is_empty() {
        base.api.base_url = other.api.base_url;
    }
    if !other.api.token.is_empty() {
        base.api.token = other.api.token;
    }
    if !other.api.email.is_empty() {
        base.api.email = other.api.email;
    }
    if !other.api.password.is_empty() {
        base.api.password = other.api.password;
    }
    if !other.api.user_agent.is_empty() {
        base.api.user_agent = other.api.user_agent;
    }
    if !other.api.timeout.is_zero() {
        base.api.timeout = other.api.timeout;
    }

    base.feed.strategy = other.feed.strategy;
    if other.feed.per_page != 0 {
        base.feed.per_page = other.feed.per_page;
    }
    if other.feed.username.is_some() {
        base.feed.username = other.feed.username;
    }

    if !other.log.level.is_empty() {
        base.log.level = other.log.level;
    }
    if other.log.file.is_some() {
        base.log.file = other.log.file;
    }

    base
}

fn apply_env(cfg: &mut Config, prefix: &str) {
    let mut map: HashMap<String, String> = HashMap::new();
    let upper_prefix = format!("{}_", prefix.to_uppercase());

    for (key, value) in env::vars() {
        if let Some(stripped) = key.strip_prefix(&upper_prefix) {
            let normalized = stripped.to_ascii_lowercase().replace("__", ".");
            map.insert(normalized, value);
        }
    }

    for (key, value) in map {
        apply_env_value(cfg, &key, value);
    }
}

fn apply_env_value(cfg: &mut Config, key: &str, value: String) {
    match key {
        "api.base_url" => cfg.api.base_url = value,
        "api.token" => cfg.api.token = value,
        "api.email" => cfg.api.email = value,
        "api.password" => cfg.api.password = value,
        "api.user_agent" => cfg.api.user_agent = value,
        "api.timeout" => {
            if let Ok(duration) = humantime::parse_duration(&value) {
                cfg.api.timeout = duration;
            }
        }
        "feed.strategy" => {
            if let Some(strategy) = Strategy::parse(&value) {
                cfg.feed.strategy = strategy;
            }
        }
        "feed.per_page" => {
            if let Ok(parsed) = value.parse::<u32>() {
                if parsed > 0 {
                    cfg.feed.per_page = parsed;
                }
            }
        }
        "feed.username" => {
            let name = value.trim().trim_start_matches('@');
            cfg.feed.username = (!name.is_empty()).then(|| name.to_string());
        }
        "log.level" => cfg.log.level = value,
        "log.file" => cfg.log.file = Some(PathBuf::from(value)),
        _ => {}
    }
}

pub fn default_path() -> Option<PathBuf> {
    default_config_path()
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("tabnews-tui").join("config.yaml"))
}
