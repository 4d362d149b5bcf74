use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_ENV: &str = "FINAPP_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "finapp.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Server settings. Every key is optional in the TOML file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: PathBuf,
    pub attachments_dir: PathBuf,
    pub busy_timeout_ms: u64,
    pub max_connections: u32,
    /// HS256 signing secret. Empty means a random one per process.
    pub jwt_secret: String,
    pub token_ttl_secs: u64,
    /// Restrict listings to the user's account and sectors.
    pub enforce_scope: bool,
    pub feeds_enabled: bool,
    pub feed_timeout_ms: u64,
    pub index_symbols: Vec<String>,
    pub log_format: LogFormat,
    pub max_upload_bytes: usize,
    /// `["*"]` allows any origin.
    pub allowed_origins: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            database_path: PathBuf::from("finapp.db"),
            attachments_dir: PathBuf::from("attachments"),
            busy_timeout_ms: 4000,
            max_connections: 5,
            jwt_secret: String::new(),
            token_ttl_secs: 12 * 60 * 60,
            enforce_scope: false,
            feeds_enabled: true,
            feed_timeout_ms: 2500,
            index_symbols: vec!["^BVSP".to_string(), "^GSPC".to_string(), "^IXIC".to_string()],
            log_format: LogFormat::Pretty,
            max_upload_bytes: 10 * 1024 * 1024,
            allowed_origins: vec!["*".to_string()],
        }
    }
}

impl Config {
    /// Reads the file named by `FINAPP_CONFIG` (or `finapp.toml` when present),
    /// then applies `FINAPP_*` overrides from the environment.
    pub fn load() -> anyhow::Result<Self> {
        let explicit = std::env::var(CONFIG_ENV).ok();
        let path = PathBuf::from(explicit.as_deref().unwrap_or(DEFAULT_CONFIG_FILE));

        let mut config = if path.exists() {
            Self::from_file(&path)?
        } else if explicit.is_some() {
            anyhow::bail!("config file {} not found", path.display());
        } else {
            Self::default()
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml(&raw).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_toml(raw: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Environment overrides, taking the lookup as a parameter for tests.
    pub fn apply_env<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("FINAPP_HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("FINAPP_PORT") {
            self.port = port
                .trim()
                .parse()
                .with_context(|| format!("FINAPP_PORT is not a port: {port}"))?;
        }
        if let Some(db) = lookup("FINAPP_DATABASE") {
            self.database_path = PathBuf::from(db);
        }
        if let Some(dir) = lookup("FINAPP_ATTACHMENTS") {
            self.attachments_dir = PathBuf::from(dir);
        }
        if let Some(secret) = lookup("FINAPP_JWT_SECRET") {
            self.jwt_secret = secret;
        }
        Ok(())
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    pub fn feed_timeout(&self) -> Duration {
        Duration::from_millis(self.feed_timeout_ms)
    }

    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_secs)
    }
}
