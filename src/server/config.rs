use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

#[derive(Deserialize, Debug, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_listen_address")]
    pub listen_address: String,

    #[serde(default = "default_data_file")]
    pub data_file: String,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    #[serde(default = "default_timocom_base_url")]
    pub timocom_base_url: String,

    #[serde(default)]
    pub timocom_username: Option<String>,

    #[serde(default)]
    pub timocom_password: Option<String>,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_connection_test_timeout_secs")]
    pub connection_test_timeout_secs: u64,

    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

// Partial config for layering
#[derive(Deserialize, Default, Debug)]
struct PartialServerConfig {
    listen_address: Option<String>,
    data_file: Option<String>,
    log_dir: Option<String>,
    timocom_base_url: Option<String>,
    timocom_username: Option<String>,
    timocom_password: Option<String>,
    request_timeout_secs: Option<u64>,
    connection_test_timeout_secs: Option<u64>,
    history_limit: Option<usize>,
}

fn default_listen_address() -> String {
    "0.0.0.0:3001".to_string()
}

fn default_data_file() -> String {
    "data/db.json".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

fn default_timocom_base_url() -> String {
    "https://api.timocom.com/freight-exchange/3".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_connection_test_timeout_secs() -> u64 {
    15
}

fn default_history_limit() -> usize {
    20
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: default_listen_address(),
            data_file: default_data_file(),
            log_dir: default_log_dir(),
            timocom_base_url: default_timocom_base_url(),
            timocom_username: None,
            timocom_password: None,
            request_timeout_secs: default_request_timeout_secs(),
            connection_test_timeout_secs: default_connection_test_timeout_secs(),
            history_limit: default_history_limit(),
        }
    }
}

impl ServerConfig {
    pub fn load(config_path: Option<&str>) -> Result<Self, String> {
        dotenv::dotenv().ok();

        // 1. Load from file (optional)
        let file_config = match config_path {
            Some(path_str) => read_config_file(Path::new(path_str))?,
            None => PartialServerConfig::default(),
        };

        // 2. Load from environment variables
        let env_config: PartialServerConfig = envy::from_env::<PartialServerConfig>()
            .map_err(|e| format!("Failed to load config from environment: {e}"))?;

        // 3. Merge: environment overrides file
        Ok(Self::merge(env_config, file_config))
    }

    fn merge(env_config: PartialServerConfig, file_config: PartialServerConfig) -> Self {
        ServerConfig {
            listen_address: env_config.listen_address.or(file_config.listen_address)
                .unwrap_or_else(default_listen_address),
            data_file: env_config.data_file.or(file_config.data_file)
                .unwrap_or_else(default_data_file),
            log_dir: env_config.log_dir.or(file_config.log_dir)
                .unwrap_or_else(default_log_dir),
            timocom_base_url: env_config.timocom_base_url.or(file_config.timocom_base_url)
                .unwrap_or_else(default_timocom_base_url),
            timocom_username: env_config.timocom_username.or(file_config.timocom_username)
                .filter(|s| !s.is_empty()),
            timocom_password: env_config.timocom_password.or(file_config.timocom_password)
                .filter(|s| !s.is_empty()),
            request_timeout_secs: env_config.request_timeout_secs.or(file_config.request_timeout_secs)
                .unwrap_or_else(default_request_timeout_secs),
            connection_test_timeout_secs: env_config.connection_test_timeout_secs
                .or(file_config.connection_test_timeout_secs)
                .unwrap_or_else(default_connection_test_timeout_secs),
            history_limit: env_config.history_limit.or(file_config.history_limit)
                .unwrap_or_else(default_history_limit),
        }
    }

    /// Username/password pair for Basic-Auth, if both halves are configured.
    pub fn timocom_credentials(&self) -> Option<(String, String)> {
        match (&self.timocom_username, &self.timocom_password) {
            (Some(user), Some(pass)) => Some((user.clone(), pass.clone())),
            _ => None,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connection_test_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_test_timeout_secs)
    }

    /// Missing credentials do not block startup; outbound calls go out unauthenticated.
    pub fn warn_if_incomplete(&self) {
        if self.timocom_credentials().is_none() {
            warn!(
                base_url = %self.timocom_base_url,
                "TIMOCOM_USERNAME / TIMOCOM_PASSWORD not set. Freight-exchange requests will be sent without credentials."
            );
        }
    }
}

fn read_config_file(path: &Path) -> Result<PartialServerConfig, String> {
    if !path.exists() {
        return Ok(PartialServerConfig::default());
    }
    let contents = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config file at {path:?}: {e}"))?;
    toml::from_str(&contents)
        .map_err(|e| format!("Failed to parse TOML from config file at {path:?}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_overrides_file() {
        let file_config: PartialServerConfig = toml::from_str(
            r#"
            listen_address = "127.0.0.1:4000"
            timocom_username = "file-user"
            timocom_password = "file-pass"
            history_limit = 5
            "#,
        )
        .unwrap();
        let env_config = PartialServerConfig {
            timocom_username: Some("env-user".to_string()),
            ..Default::default()
        };

        let config = ServerConfig::merge(env_config, file_config);

        assert_eq!(config.listen_address, "127.0.0.1:4000");
        assert_eq!(config.history_limit, 5);
        assert_eq!(
            config.timocom_credentials(),
            Some(("env-user".to_string(), "file-pass".to_string()))
        );
        assert_eq!(config.data_file, "data/db.json");
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_empty_credentials_are_treated_as_missing() {
        let env_config = PartialServerConfig {
            timocom_username: Some(String::new()),
            timocom_password: Some("secret".to_string()),
            ..Default::default()
        };

        let config = ServerConfig::merge(env_config, PartialServerConfig::default());

        assert!(config.timocom_credentials().is_none());
    }

    #[test]
    fn test_missing_config_file_falls_back_to_defaults() {
        let partial = read_config_file(Path::new("/nonexistent/freight-broker.toml")).unwrap();
        let config = ServerConfig::merge(PartialServerConfig::default(), partial);

        assert_eq!(config.connection_test_timeout_secs, 15);
        assert_eq!(config.timocom_base_url, "https://api.timocom.com/freight-exchange/3");
    }
}
