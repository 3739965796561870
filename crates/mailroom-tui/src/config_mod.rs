use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, warn};

use mailroom_api::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT, HttpConfig};

const BASE_URL_ENV: &str = "MAILROOM_BASE_URL";
const SESSION_ENV: &str = "MAILROOM_SESSION";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ServerConfig {
    pub(crate) base_url: String,
    pub(crate) session_id: Option<String>,
    pub(crate) timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            session_id: None,
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

impl ServerConfig {
    pub(crate) fn http_config(&self) -> HttpConfig {
        HttpConfig {
            base_url: self.base_url.clone(),
            session_id: self.session_id.clone(),
            timeout: Duration::from_secs(self.timeout_secs.max(1)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct UiConfig {
    pub(crate) theme: String,
    pub(crate) show_help: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            theme: "default".to_string(),
            show_help: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct AppConfig {
    pub(crate) server: ServerConfig,
    pub(crate) ui: UiConfig,
}

fn xdg_config_dir() -> PathBuf {
    std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
        .unwrap_or_else(|| PathBuf::from("/tmp"))
}

fn config_path_candidates() -> Vec<PathBuf> {
    vec![
        PathBuf::from("mailroom.toml"),
        xdg_config_dir().join("mailroom").join("mailroom.toml"),
    ]
}

fn load_config_text() -> Option<(PathBuf, String)> {
    for path in config_path_candidates() {
        if let Ok(content) = std::fs::read_to_string(&path) {
            return Some((path, content));
        }
    }
    None
}

/// File settings, then environment overrides. Never fails; problems are logged.
pub(crate) fn load_app_config() -> AppConfig {
    let mut config = match load_config_text() {
        Some((path, content)) => {
            debug!(path = %path.display(), "loading config");
            parse_app_config(&content)
        }
        None => {
            debug!("no config file found; using defaults");
            AppConfig::default()
        }
    };
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    config
}

pub(crate) fn parse_app_config(content: &str) -> AppConfig {
    let mut config = AppConfig::default();
    let value: toml::Value = match toml::from_str(content) {
        Ok(value) => value,
        Err(err) => {
            warn!(error = %err, "config parse failed; using defaults");
            return config;
        }
    };

    if let Some(server) = value.get("server") {
        if let Some(base_url) = server.get("base_url").and_then(|v| v.as_str()) {
            let trimmed = base_url.trim();
            if !trimmed.is_empty() {
                config.server.base_url = trimmed.to_string();
            }
        }
        config.server.session_id = server
            .get("session_id")
            .and_then(|v| v.as_str())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        if let Some(v) = server.get("timeout_secs") {
            match v.as_integer() {
                Some(secs) if secs > 0 => config.server.timeout_secs = secs as u64,
                _ => warn!(value = %v, "server.timeout_secs must be a positive integer"),
            }
        }
    }

    if let Some(ui) = value.get("ui") {
        if let Some(theme) = ui.get("theme").and_then(|v| v.as_str()) {
            config.ui.theme = theme.trim().to_ascii_lowercase();
        }
        config.ui.show_help = match ui.get("show_help") {
            Some(v) => v
                .as_bool()
                .or_else(|| {
                    v.as_str()
                        .map(|s| s == "1" || s.eq_ignore_ascii_case("true"))
                })
                .unwrap_or(true),
            None => true,
        };
    }
    config
}

pub(crate) fn apply_env_overrides(
    config: &mut AppConfig,
    lookup: impl Fn(&str) -> Option<String>,
) {
    if let Some(base_url) = lookup(BASE_URL_ENV).filter(|v| !v.trim().is_empty()) {
        debug!(base_url = %base_url, "base url from environment");
        config.server.base_url = base_url.trim().to_string();
    }
    if let Some(session) = lookup(SESSION_ENV).filter(|v| !v.trim().is_empty()) {
        config.server.session_id = Some(session.trim().to_string());
    }
}
