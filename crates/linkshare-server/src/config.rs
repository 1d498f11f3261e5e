//! Configuration file management.
//!
//! `config.toml` is looked up at `$LINKSHARE_CONFIG`, then
//! `$LINKSHARE_DATA_DIR/config.toml`, then the platform data directory.
//! Selected keys can be overridden from the environment.

use std::path::PathBuf;

use linkshare_accounts::AccountSettings;
use linkshare_crypto::argon2id::HashCost;
use linkshare_types::ACCESS_TOKEN_TTL_SECS;
use serde::{Deserialize, Serialize};

/// Complete server configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: HttpConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    #[serde(default)]
    pub mail: MailConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

/// Storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Data directory. Empty = platform default.
    #[serde(default)]
    pub data_dir: String,
    /// Database file name inside the data directory, or an absolute path.
    #[serde(default = "default_database_file")]
    pub database_file: String,
}

/// Bearer token configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Token signing secret. Empty = random per process.
    #[serde(default)]
    pub token_secret: String,
    #[serde(default = "default_access_token_ttl")]
    pub access_token_ttl_secs: u64,
}

/// Password hashing cost.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(default = "default_m_cost")]
    pub argon2_m_cost: u32,
    #[serde(default = "default_t_cost")]
    pub argon2_t_cost: u32,
    #[serde(default = "default_p_cost")]
    pub argon2_p_cost: u32,
}

/// Outbound notification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    /// Origin used to build password reset links.
    #[serde(default = "default_frontend_url")]
    pub frontend_url: String,
    #[serde(default = "default_sender")]
    pub default_sender: String,
    /// Send welcome and referral-success notifications on signup.
    #[serde(default)]
    pub signup_notifications: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// "trace" | "debug" | "info" | "warn" | "error".
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions

fn default_bind_addr() -> String {
    "127.0.0.1:5000".to_string()
}

fn default_database_file() -> String {
    "linkshare.db".to_string()
}

fn default_access_token_ttl() -> u64 {
    ACCESS_TOKEN_TTL_SECS
}

fn default_m_cost() -> u32 {
    linkshare_crypto::argon2id::DEFAULT_M_COST
}

fn default_t_cost() -> u32 {
    linkshare_crypto::argon2id::DEFAULT_T_COST
}

fn default_p_cost() -> u32 {
    linkshare_crypto::argon2id::DEFAULT_P_COST
}

fn default_frontend_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_sender() -> String {
    "test@example.com".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: String::new(),
            database_file: default_database_file(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_secret: String::new(),
            access_token_ttl_secs: default_access_token_ttl(),
        }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            argon2_m_cost: default_m_cost(),
            argon2_t_cost: default_t_cost(),
            argon2_p_cost: default_p_cost(),
        }
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            frontend_url: default_frontend_url(),
            default_sender: default_sender(),
            signup_notifications: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from the config file location and apply
    /// environment overrides.
    ///
    /// Falls back to defaults if the file does not exist.
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();
        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::from_toml_str(&content)?
        } else {
            Self::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply `LINKSHARE_*` overrides. Empty values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(secret) = get("LINKSHARE_TOKEN_SECRET") {
            self.auth.token_secret = secret;
        }
        if let Some(path) = get("LINKSHARE_DATABASE_PATH") {
            self.storage.database_file = path;
        }
        if let Some(addr) = get("LINKSHARE_BIND_ADDR") {
            self.server.bind_addr = addr;
        }
        if let Some(url) = get("LINKSHARE_FRONTEND_URL") {
            self.mail.frontend_url = url;
        }
    }

    /// Get the data directory path.
    pub fn data_dir(&self) -> PathBuf {
        if self.storage.data_dir.is_empty() {
            Self::default_data_dir()
        } else {
            PathBuf::from(&self.storage.data_dir)
        }
    }

    /// Database file path; relative names resolve inside the data directory.
    pub fn database_path(&self) -> PathBuf {
        let file = PathBuf::from(&self.storage.database_file);
        if file.is_absolute() {
            file
        } else {
            self.data_dir().join(file)
        }
    }

    pub fn password_cost(&self) -> HashCost {
        HashCost::new(
            self.security.argon2_m_cost,
            self.security.argon2_t_cost,
            self.security.argon2_p_cost,
        )
    }

    /// Account service settings derived from this configuration.
    pub fn account_settings(&self) -> AccountSettings {
        AccountSettings {
            password_cost: self.password_cost(),
            reset_url_base: self.mail.frontend_url.clone(),
            signup_notifications: self.mail.signup_notifications,
            ..AccountSettings::default()
        }
    }

    /// Get the config file path.
    fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("LINKSHARE_CONFIG") {
            return PathBuf::from(path);
        }
        Self::default_data_dir().join("config.toml")
    }

    /// Platform-specific default data directory.
    fn default_data_dir() -> PathBuf {
        if let Ok(dir) = std::env::var("LINKSHARE_DATA_DIR") {
            return PathBuf::from(dir);
        }
        #[cfg(target_os = "macos")]
        {
            dirs_fallback("Library/Application Support/LinkShare")
        }
        #[cfg(target_os = "windows")]
        {
            dirs_fallback("LinkShare")
        }
        #[cfg(not(any(target_os = "macos", target_os = "windows")))]
        {
            dirs_fallback(".linkshare")
        }
    }
}

/// Fallback home directory resolution.
fn dirs_fallback(subpath: &str) -> PathBuf {
    std::env::var("HOME")
        .map(|h| PathBuf::from(h).join(subpath))
        .unwrap_or_else(|_| PathBuf::from("/tmp/linkshare"))
}
