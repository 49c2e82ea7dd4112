use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub sp_api: SpApiConfig,
    #[serde(default)]
    pub report_polling: ReportPollingConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub oauth: OAuthConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Внешний адрес сервиса, из него строится redirect_uri для OAuth
    pub public_base_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            public_base_url: "http://localhost:3000".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SpApiConfig {
    /// Региональный endpoint SP-API (India обслуживается EU-регионом)
    pub endpoint: String,
    /// LWA token endpoint
    pub token_url: String,
    pub http_timeout_secs: u64,
}

impl Default for SpApiConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://sellingpartnerapi-eu.amazon.com".to_string(),
            token_url: "https://api.amazon.com/auth/o2/token".to_string(),
            http_timeout_secs: 60,
        }
    }
}

/// Политика опроса статуса отчёта
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ReportPollingConfig {
    pub initial_interval_secs: u64,
    pub max_interval_secs: u64,
    pub backoff_factor: f64,
    pub max_attempts: u32,
    pub timeout_secs: u64,
}

impl Default for ReportPollingConfig {
    fn default() -> Self {
        Self {
            initial_interval_secs: 5,
            max_interval_secs: 60,
            backoff_factor: 1.5,
            max_attempts: 120,
            timeout_secs: 30 * 60,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SchedulerConfig {
    pub enabled: bool,
    pub tick_seconds: u64,
    pub task_log_dir: String,
    /// Сколько задание может ждать Amazon, прежде чем получит TIMED_OUT
    pub report_job_max_age_minutes: i64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tick_seconds: 30,
            task_log_dir: "target/logs".to_string(),
            report_job_max_age_minutes: 240,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OAuthConfig {
    pub state_ttl_secs: u64,
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self { state_ttl_secs: 120 }
    }
}

impl Config {
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.sp_api.http_timeout_secs)
    }
}

/// Default configuration embedded in the binary
const DEFAULT_CONFIG: &str = r#"
[database]
path = "target/db/amazon_sp.db"

[server]
host = "0.0.0.0"
port = 3000
public_base_url = "http://localhost:3000"

[sp_api]
endpoint = "https://sellingpartnerapi-eu.amazon.com"
token_url = "https://api.amazon.com/auth/o2/token"
http_timeout_secs = 60

[report_polling]
initial_interval_secs = 5
max_interval_secs = 60
backoff_factor = 1.5
max_attempts = 120
timeout_secs = 1800

[scheduler]
enabled = true
tick_seconds = 30
task_log_dir = "target/logs"
report_job_max_age_minutes = 240

[oauth]
state_ttl_secs = 120
"#;

/// Load configuration from config.toml file
///
/// Search order:
/// 1. Next to the executable (for production)
/// 2. Falls back to embedded default config
pub fn load_config() -> anyhow::Result<Config> {
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            let config_path = exe_dir.join("config.toml");

            if config_path.exists() {
                tracing::info!("Loading config from: {}", config_path.display());
                let contents = std::fs::read_to_string(&config_path)?;
                let config: Config = toml::from_str(&contents)?;
                return Ok(config);
            } else {
                tracing::warn!("config.toml not found at: {}", config_path.display());
            }
        }
    }

    tracing::info!("Using default embedded configuration");
    let config: Config = toml::from_str(DEFAULT_CONFIG)?;
    Ok(config)
}

/// Resolve a relative path against the executable directory
pub fn resolve_path(path_str: &str) -> PathBuf {
    let path = Path::new(path_str);
    if path.is_absolute() {
        return path.to_path_buf();
    }
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            return exe_dir.join(path);
        }
    }
    PathBuf::from(path_str)
}

/// Get the database file path from configuration
pub fn get_database_path(config: &Config) -> PathBuf {
    resolve_path(&config.database.path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_loads() {
        let config: Config = toml::from_str(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.database.path, "target/db/amazon_sp.db");
        assert_eq!(config.report_polling.initial_interval_secs, 5);
        assert_eq!(config.oauth.state_ttl_secs, 120);
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn test_partial_config_uses_section_defaults() {
        let config: Config = toml::from_str(
            r#"
            [database]
            path = "/var/lib/amazon_sp.db"

            [report_polling]
            max_attempts = 10
            "#,
        )
        .unwrap();
        assert_eq!(config.report_polling.max_attempts, 10);
        assert_eq!(config.report_polling.initial_interval_secs, 5);
        assert_eq!(config.sp_api.token_url, "https://api.amazon.com/auth/o2/token");
        assert_eq!(
            get_database_path(&config),
            PathBuf::from("/var/lib/amazon_sp.db")
        );
    }
}
