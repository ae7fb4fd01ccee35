use std::path::PathBuf;
use std::time::Duration;
use serde::{Deserialize, Serialize};
use directories::ProjectDirs;
use clap::Parser;
use std::fs;
use tracing::{info, warn};

use crate::models::DEFAULT_CATEGORY;

/// Configuration for the wisdom21 server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// URL for the database connection
    pub database_url: String,
    /// Address the HTTP server listens on
    pub bind_address: String,
    /// Category given to wisdom created without one
    pub default_category: String,
    /// Seconds between checks whether the calendar day has changed
    pub rollover_check_seconds: u64,
    /// Activate the next queued wisdom of a category when one completes
    pub auto_advance: bool,
    /// Directory for JSON log files; console only if unset
    pub log_dir: Option<String>,
}

/// Update structure for Config with all fields optional
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ConfigUpdate {
    #[serde(default)]
    pub database_url: Option<String>,
    #[serde(default)]
    pub bind_address: Option<String>,
    #[serde(default)]
    pub default_category: Option<String>,
    #[serde(default)]
    pub rollover_check_seconds: Option<u64>,
    #[serde(default)]
    pub auto_advance: Option<bool>,
    #[serde(default)]
    pub log_dir: Option<String>,
    /// Server URL for the CLI client; ignored by the server
    #[serde(default)]
    pub server_url: Option<String>,
}

/// Command line arguments for the server
#[derive(Parser, Debug, Default)]
#[clap(name = "wisdom21", about = "Serves the 21/21 wisdom repetition schedule")]
pub struct CliArgs {
    /// Database URL
    #[clap(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Address to listen on, e.g. 127.0.0.1:3021
    #[clap(long, env = "WISDOM21_BIND")]
    pub bind_address: Option<String>,

    /// Category for wisdom created without one
    #[clap(long, env = "WISDOM21_DEFAULT_CATEGORY")]
    pub default_category: Option<String>,

    /// Seconds between day-change checks of the rollover worker
    #[clap(long, env = "WISDOM21_ROLLOVER_CHECK_SECONDS")]
    pub rollover_check_seconds: Option<u64>,

    /// Activate the next queued wisdom when one completes
    #[clap(long, env = "WISDOM21_AUTO_ADVANCE")]
    pub auto_advance: Option<bool>,

    /// Directory to write JSON logs to
    #[clap(long, env = "WISDOM21_LOG_DIR")]
    pub log_dir: Option<String>,

    /// Debug mode
    #[clap(long, env = "WISDOM21_DEBUG", default_value_t = false)]
    pub debug: bool,
}

impl Config {
    /// Applies a config update to the current configuration
    pub fn apply_update(self, update: ConfigUpdate) -> Self {
        Self {
            database_url: update.database_url.unwrap_or(self.database_url),
            bind_address: update.bind_address.unwrap_or(self.bind_address),
            default_category: update.default_category.unwrap_or(self.default_category),
            rollover_check_seconds: update.rollover_check_seconds.unwrap_or(self.rollover_check_seconds),
            auto_advance: update.auto_advance.unwrap_or(self.auto_advance),
            log_dir: update.log_dir.or(self.log_dir),
        }
    }

    /// Returns the rollover check interval as a Duration, never below one second
    pub fn rollover_check_interval(&self) -> Duration {
        Duration::from_secs(self.rollover_check_seconds.max(1))
    }
}

/// Returns the directory holding config.toml, if the platform has one
pub fn get_config_dir_path() -> Option<PathBuf> {
    match ProjectDirs::from("com", "wisdom21", "wisdom21") {
        Some(proj_dirs) => Some(proj_dirs.config_dir().to_path_buf()),
        None => {
            warn!("Could not determine XDG config directory, skipping config file");
            None
        }
    }
}

/// Returns the base (default) configuration
pub fn base_config(config_path: Option<PathBuf>) -> Config {
    let database_url = config_path.map_or("wisdom21.db".to_string(), |path| path.join("wisdom21.db").to_string_lossy().to_string());

    Config {
        database_url,
        bind_address: "127.0.0.1:3021".to_string(),
        default_category: DEFAULT_CATEGORY.to_string(),
        rollover_check_seconds: 60,
        auto_advance: false,
        log_dir: None,
    }
}

/// Loads configuration from a TOML file
pub fn config_from_file(config_path: Option<PathBuf>) -> Result<ConfigUpdate, String> {
    let Some(config_path) = config_path else {
        return Ok(ConfigUpdate::default());
    };

    if !config_path.exists() {
        info!("Config file not found at {:?}, using defaults", config_path);
        return Ok(ConfigUpdate::default());
    }

    match fs::read_to_string(&config_path) {
        Ok(content) => match toml::from_str::<ConfigUpdate>(&content) {
            Ok(config) => {
                info!("Loaded configuration from {:?}", config_path);
                Ok(config)
            },
            Err(e) => {
                warn!("Failed to parse config file: {}", e);
                Err(format!("Failed to parse config file: {}", e))
            }
        },
        Err(e) => {
            warn!("Failed to read config file: {}", e);
            Err(format!("Failed to read config file: {}", e))
        }
    }
}

/// Loads configuration from command line arguments
pub fn config_from_args(args: CliArgs) -> ConfigUpdate {
    ConfigUpdate {
        database_url: args.database_url,
        bind_address: args.bind_address,
        default_category: args.default_category,
        rollover_check_seconds: args.rollover_check_seconds,
        auto_advance: args.auto_advance,
        log_dir: args.log_dir,
        server_url: None,
    }
}

/// Gets the complete configuration by combining defaults with
/// values from config file, environment variables, and command line arguments
/// in order of increasing precedence
pub fn get_config(args: CliArgs) -> Config {
    let config_path = get_config_dir_path().and_then(|path| {
        if !path.exists() {
            info!("Config path not found at {:?}, using defaults", path);
            None
        } else {
            Some(path)
        }
    });

    let base = base_config(config_path.clone());
    let file_update = config_from_file(config_path.map(|dir| dir.join("config.toml"))).unwrap_or_default();

    // Apply updates in order of increasing precedence
    let config = base
        .apply_update(file_update)
        .apply_update(config_from_args(args));

    info!(
        "Final configuration: database_url={}, bind_address={}, default_category={}, auto_advance={}",
        config.database_url, config.bind_address, config.default_category, config.auto_advance
    );

    config
}
