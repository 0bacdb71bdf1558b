use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub fn default_config_path() -> PathBuf {
    if let Some(dir) = dirs::config_dir() {
        return dir.join("appforge").join("config.toml");
    }
    if let Some(home) = std::env::var_os("HOME") {
        return PathBuf::from(home)
            .join(".config")
            .join("appforge")
            .join("config.toml");
    }
    PathBuf::from("appforge/config.toml")
}

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub build_server: BuildServerConfig,
}

impl Config {
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let cfg: Self = toml::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(cfg)
    }

    /// Missing config file means defaults; a present but broken one is an
    /// error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load_from_path(path)
        } else {
            Ok(Self::default())
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("generated_apps")
}

#[derive(Debug, Deserialize)]
pub struct BuildServerConfig {
    #[serde(default = "default_build_url")]
    pub url: String,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_backoff_secs")]
    pub backoff_secs: u64,

    #[serde(default = "default_poll_secs")]
    pub poll_secs: u64,

    /// Upper bound on status polls before a stalled build is failed.
    #[serde(default = "default_max_polls")]
    pub max_polls: u32,
}

impl BuildServerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_secs(self.backoff_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_secs)
    }
}

impl Default for BuildServerConfig {
    fn default() -> Self {
        Self {
            url: default_build_url(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
            max_attempts: default_max_attempts(),
            backoff_secs: default_backoff_secs(),
            poll_secs: default_poll_secs(),
            max_polls: default_max_polls(),
        }
    }
}

fn default_build_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_secs() -> u64 {
    2
}

fn default_poll_secs() -> u64 {
    5
}

fn default_max_polls() -> u32 {
    120
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_sections() {
        let cfg: Config = toml::from_str("").unwrap();
        assert_eq!(cfg.output.dir, PathBuf::from("generated_apps"));
        assert_eq!(cfg.build_server.url, "http://localhost:8000");
        assert_eq!(cfg.build_server.max_attempts, 3);
        assert_eq!(cfg.build_server.poll_interval(), Duration::from_secs(5));
        assert_eq!(cfg.build_server.max_polls, 120);
    }

    #[test]
    fn file_values_override_defaults() {
        let cfg: Config = toml::from_str(
            r#"
            [output]
            dir = "out"

            [build_server]
            url = "https://builds.example.com/"
            api_key = "secret"
            max_attempts = 5
            "#,
        )
        .unwrap();
        assert_eq!(cfg.output.dir, PathBuf::from("out"));
        assert_eq!(cfg.build_server.url, "https://builds.example.com/");
        assert_eq!(cfg.build_server.api_key.as_deref(), Some("secret"));
        assert_eq!(cfg.build_server.max_attempts, 5);
    }

    #[test]
    fn missing_file_loads_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = Config::load_or_default(&tmp.path().join("nope.toml")).unwrap();
        assert_eq!(cfg.build_server.max_attempts, 3);
    }
}
