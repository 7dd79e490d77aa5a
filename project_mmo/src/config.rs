use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use persistence::WorkerConfig;
use player_db::DatabaseConfig;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    pub path: String,
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            path: "data/players.db".to_string(),
            busy_timeout_ms: 5000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogoutSection {
    pub interval_ms: u64,
    pub slow_save_ms: u64,
}

impl Default for LogoutSection {
    fn default() -> Self {
        Self {
            interval_ms: 500,
            slow_save_ms: 2000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StatusSection {
    /// Seconds between status lines; 0 disables the report.
    pub interval_secs: u64,
}

impl Default for StatusSection {
    fn default() -> Self {
        Self { interval_secs: 60 }
    }
}

/// Top-level MMO server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub database: DatabaseSection,
    pub logout: LogoutSection,
    pub status: StatusSection,
}

impl ServerConfig {
    /// Load configuration from an optional TOML file path.
    pub fn load(config_path: Option<&str>) -> Result<Self, Box<dyn std::error::Error>> {
        let config = match config_path {
            Some(path) if Path::new(path).exists() => {
                let content = std::fs::read_to_string(path)?;
                toml::from_str(&content)?
            }
            _ => Self::default(),
        };
        Ok(config)
    }

    pub fn to_database_config(&self) -> DatabaseConfig {
        DatabaseConfig {
            path: self.database.path.clone(),
            busy_timeout: Duration::from_millis(self.database.busy_timeout_ms),
        }
    }

    pub fn to_worker_config(&self) -> WorkerConfig {
        WorkerConfig {
            interval: Duration::from_millis(self.logout.interval_ms),
            slow_save: Duration::from_millis(self.logout.slow_save_ms),
        }
    }
}

/// Parse CLI arguments and load config.
/// Supports: --config <path>
pub fn parse_cli_args() -> ServerConfig {
    let args: Vec<String> = std::env::args().collect();
    let mut config_path: Option<&str> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                if let Some(val) = args.get(i + 1) {
                    config_path = Some(val.as_str());
                    i += 2;
                } else {
                    eprintln!("--config requires a path argument");
                    std::process::exit(1);
                }
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                std::process::exit(1);
            }
        }
    }

    match ServerConfig::load(config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.database.path, "data/players.db");
        assert_eq!(config.database.busy_timeout_ms, 5000);
        assert_eq!(config.logout.interval_ms, 500);
        assert_eq!(config.status.interval_secs, 60);
    }

    #[test]
    fn to_worker_config() {
        let wc = ServerConfig::default().to_worker_config();
        assert_eq!(wc.interval, Duration::from_millis(500));
        assert_eq!(wc.slow_save, Duration::from_secs(2));
    }

    #[test]
    fn to_database_config() {
        let dc = ServerConfig::default().to_database_config();
        assert_eq!(dc.path, "data/players.db");
        assert_eq!(dc.busy_timeout, Duration::from_secs(5));
    }

    #[test]
    fn load_nonexistent_file_returns_defaults() {
        let config = ServerConfig::load(Some("/tmp/nonexistent_mmo_config_12345.toml")).unwrap();
        assert_eq!(config.logout.interval_ms, 500);
    }

    #[test]
    fn load_partial_toml() {
        let mut f = NamedTempFile::new().unwrap();
        write!(
            f,
            r#"
[database]
path = "/var/lib/mmo/players.db"

[logout]
interval_ms = 250
"#
        )
        .unwrap();

        let config = ServerConfig::load(Some(f.path().to_str().unwrap())).unwrap();
        assert_eq!(config.database.path, "/var/lib/mmo/players.db");
        assert_eq!(config.database.busy_timeout_ms, 5000);
        assert_eq!(config.logout.interval_ms, 250);
        assert_eq!(config.logout.slow_save_ms, 2000);
    }

    #[test]
    fn load_malformed_toml_fails() {
        let mut f = NamedTempFile::new().unwrap();
        write!(f, "[logout]\ninterval_ms = \"soon\"\n").unwrap();
        assert!(ServerConfig::load(Some(f.path().to_str().unwrap())).is_err());
    }
}
