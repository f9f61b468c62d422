use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use engine_logging::{engine_warn, LogDestination};
use formchat_engine::ApiSettings;
use log::LevelFilter;
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "formchat.ron";
pub const CONFIG_ENV: &str = "FORMCHAT_CONFIG";
pub const TOKEN_ENV: &str = "FORMCHAT_TOKEN";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogTarget {
    #[default]
    File,
    Terminal,
    Both,
}

impl From<LogTarget> for LogDestination {
    fn from(target: LogTarget) -> Self {
        match target {
            LogTarget::File => LogDestination::File,
            LogTarget::Terminal => LogDestination::Terminal,
            LogTarget::Both => LogDestination::Both,
        }
    }
}

/// Contents of `formchat.ron`. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api_base_url: String,
    pub extract_path: String,
    pub socket_url: String,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub token: Option<String>,
    pub cache_dir: PathBuf,
    /// Mirror the chat log and forms list to `cache_dir` on every change.
    pub write_through: bool,
    pub log_level: String,
    pub log_target: LogTarget,
    pub log_file: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        let api = ApiSettings::default();
        Self {
            api_base_url: api.base_url,
            extract_path: api.extract_path,
            socket_url: "ws://127.0.0.1:8081".to_string(),
            connect_timeout_secs: api.connect_timeout.as_secs(),
            request_timeout_secs: api.request_timeout.as_secs(),
            token: None,
            cache_dir: PathBuf::from(".formchat"),
            write_through: true,
            log_level: "info".to_string(),
            log_target: LogTarget::File,
            log_file: PathBuf::from("formchat.log"),
        }
    }
}

impl AppConfig {
    /// Loads from `explicit`, else `$FORMCHAT_CONFIG`, else `./formchat.ron`.
    ///
    /// Only the implicit default file may be absent; then defaults apply.
    pub fn load(explicit: Option<PathBuf>) -> anyhow::Result<Self> {
        let chosen = explicit.or_else(|| env::var_os(CONFIG_ENV).map(PathBuf::from));
        let config = match chosen {
            Some(path) => Self::from_file(&path)?,
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Self::from_file(path)?
                } else {
                    Self::default()
                }
            }
        };
        Ok(config.with_token_override(env::var(TOKEN_ENV).ok()))
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> {
        Ok(ron::from_str(text)?)
    }

    /// A non-blank environment token wins over the file.
    pub fn with_token_override(mut self, token: Option<String>) -> Self {
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            self.token = Some(token);
        }
        self
    }

    pub fn level(&self) -> LevelFilter {
        engine_logging::parse_level(&self.log_level).unwrap_or_else(|| {
            engine_warn!("unknown log level {:?}, using info", self.log_level);
            LevelFilter::Info
        })
    }

    pub fn api_settings(&self) -> ApiSettings {
        ApiSettings {
            base_url: self.api_base_url.clone(),
            extract_path: self.extract_path.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn partial_file_keeps_defaults() {
        let config = AppConfig::parse(
            r#"(
                api_base_url: "https://api.example.test/prod",
                write_through: false,
                log_target: both,
            )"#,
        )
        .unwrap();

        assert_eq!(config.api_base_url, "https://api.example.test/prod");
        assert!(!config.write_through);
        assert_eq!(config.log_target, LogTarget::Both);
        assert_eq!(config.extract_path, "/extract");
        assert_eq!(config.token, None);
    }

    #[test]
    fn env_token_overrides_file_unless_blank() {
        let config = AppConfig::parse(r#"(token: Some("from-file"))"#).unwrap();

        let kept = config.clone().with_token_override(Some("  ".into()));
        assert_eq!(kept.token.as_deref(), Some("from-file"));

        let replaced = config.with_token_override(Some("from-env".into()));
        assert_eq!(replaced.token.as_deref(), Some("from-env"));
    }

    #[test]
    fn unknown_level_falls_back_to_info() {
        let config = AppConfig {
            log_level: "chatty".into(),
            ..AppConfig::default()
        };
        assert_eq!(config.level(), LevelFilter::Info);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(AppConfig::load(Some(dir.path().join("absent.ron"))).is_err());
    }
}
