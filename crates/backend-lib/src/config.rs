// ============================
// webpanel-backend-lib/src/config.rs
// ============================
//! Configuration management.
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use serde::{Deserialize, Serialize};
use figment::{Figment, providers::{Env, Format, Serialized, Toml}};
use anyhow::Result;

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Server bind address
    pub bind_addr: SocketAddr,
    /// Data directory path
    pub data_dir: PathBuf,
    /// Log level
    pub log_level: String,
    /// HMAC key for token signing. Must be configured explicitly: an
    /// ephemeral per-process key would invalidate every outstanding
    /// session on restart.
    pub jwt_secret: String,
    /// Access token lifetime in seconds
    pub access_token_ttl_secs: u64,
    /// Refresh token lifetime in seconds
    pub refresh_token_ttl_secs: u64,
    /// Login attempt throttling
    pub login_rate_limit: LoginRateLimitSettings,
}

/// Failed-login throttling knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRateLimitSettings {
    /// Failed attempts from one address before lockout
    pub max_failures: u32,
    /// Lockout duration in seconds
    pub lockout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".parse().unwrap(),
            data_dir: PathBuf::from("data"),
            log_level: "info".to_string(),
            jwt_secret: String::new(),
            access_token_ttl_secs: 30 * 60,
            refresh_token_ttl_secs: 60 * 60 * 24 * 7,
            login_rate_limit: LoginRateLimitSettings::default(),
        }
    }
}

impl Default for LoginRateLimitSettings {
    fn default() -> Self {
        Self {
            max_failures: 5,
            lockout_secs: 5 * 60,
        }
    }
}

impl Settings {
    /// Load settings from `config.toml` and the environment
    pub fn load() -> Result<Self> {
        Self::load_from("config.toml")
    }

    /// Load settings from an explicit config file, then the environment
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let settings: Settings = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("WEBPANEL_").split("__"))
            .extract()?;

        if settings.jwt_secret.is_empty() {
            anyhow::bail!(
                "jwt_secret is not configured; set it in config.toml or WEBPANEL_JWT_SECRET"
            );
        }

        Ok(settings)
    }

    /// Path of the SQLite database file inside the data directory
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("web_interface.db")
    }

    pub fn access_ttl(&self) -> Duration {
        Duration::from_secs(self.access_token_ttl_secs)
    }

    pub fn refresh_ttl(&self) -> Duration {
        Duration::from_secs(self.refresh_token_ttl_secs)
    }
}
