//! Configuration loading and root folder resolution
//!
//! Priority for every setting that can come from several places:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing config file is not an error: a warning is logged and the
//! compiled defaults are used.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming the root folder
pub const ROOT_FOLDER_ENV: &str = "CCRM_ROOT_FOLDER";
/// Environment variable naming the config file
pub const CONFIG_FILE_ENV: &str = "CCRM_CONFIG";

/// Longest accepted follow-up delay, ten years
pub const MAX_DELAY_DAYS: i64 = 3650;
pub const MAX_DELAY_HOURS: i64 = MAX_DELAY_DAYS * 24;

/// Top-level TOML configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub root_folder: Option<PathBuf>,
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub logging: LoggingConfig,
    pub duplicates: DuplicatePolicy,
    pub scheduling: SchedulingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5780,
        }
    }
}

/// Which store instance to open
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Selects the database file `<root>/<project_id>.db`
    pub project_id: String,
    pub max_connections: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            project_id: "ccrm".to_string(),
            max_connections: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is unset
    pub level: String,
    /// Optional log file (appended, no ANSI colors)
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

/// Which fields make two call centers duplicates
///
/// Matching is exact after normalisation; no similarity threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DuplicatePolicy {
    /// Same name, country and city
    pub match_name_location: bool,
    /// Any phone number in common (compared by digits only)
    pub match_phones: bool,
    /// Compare names and locations case-sensitively
    pub case_sensitive: bool,
}

impl Default for DuplicatePolicy {
    fn default() -> Self {
        Self {
            match_name_location: true,
            match_phones: true,
            case_sensitive: false,
        }
    }
}

/// Follow-up delays and limits for schedule generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulingConfig {
    pub new_delay_hours: i64,
    pub contacted_delay_days: i64,
    pub interested_delay_days: i64,
    pub callback_delay_days: i64,
    pub max_tasks: usize,
    pub notify_within_hours: i64,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            new_delay_hours: 24,
            contacted_delay_days: 3,
            interested_delay_days: 2,
            callback_delay_days: 1,
            max_tasks: 50,
            notify_within_hours: 24,
        }
    }
}

impl TomlConfig {
    /// Parse TOML text and validate it
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: TomlConfig =
            toml::from_str(text).map_err(|e| Error::Config(format!("Invalid TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that cannot work
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(Error::Config("server.port must be greater than 0".to_string()));
        }
        let project = &self.store.project_id;
        let valid_project = !project.is_empty()
            && project
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid_project {
            return Err(Error::Config(format!(
                "store.project_id must be non-empty and contain only [A-Za-z0-9_-]: '{}'",
                project
            )));
        }
        if self.store.max_connections == 0 {
            return Err(Error::Config("store.max_connections must be greater than 0".to_string()));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(Error::Config(format!(
                "Invalid log level: {}. Must be one of: {:?}",
                self.logging.level, valid_levels
            )));
        }

        let s = &self.scheduling;
        let delays = [
            s.new_delay_hours,
            s.contacted_delay_days,
            s.interested_delay_days,
            s.callback_delay_days,
            s.notify_within_hours,
        ];
        if delays.iter().any(|d| *d < 0) {
            return Err(Error::Config("scheduling delays must not be negative".to_string()));
        }
        let day_delays = [s.contacted_delay_days, s.interested_delay_days, s.callback_delay_days];
        if day_delays.iter().any(|d| *d > MAX_DELAY_DAYS)
            || s.new_delay_hours > MAX_DELAY_HOURS
            || s.notify_within_hours > MAX_DELAY_HOURS
        {
            return Err(Error::Config(format!(
                "scheduling delays must not exceed {} days ({} hours)",
                MAX_DELAY_DAYS, MAX_DELAY_HOURS
            )));
        }
        if s.max_tasks == 0 {
            return Err(Error::Config("scheduling.max_tasks must be greater than 0".to_string()));
        }

        Ok(())
    }
}

/// Load configuration
///
/// An explicitly named file must exist. Otherwise `CCRM_CONFIG`, then the
/// platform config path are tried, and a missing file yields defaults.
pub fn load_toml_config(explicit: Option<&Path>) -> Result<TomlConfig> {
    if let Some(path) = explicit {
        return read_config_file(path);
    }

    if let Ok(path) = std::env::var(CONFIG_FILE_ENV) {
        return read_config_file(Path::new(&path));
    }

    match default_config_path() {
        Some(path) if path.exists() => read_config_file(&path),
        Some(path) => {
            warn!("No config file at {} - using defaults", path.display());
            Ok(TomlConfig::default())
        }
        None => {
            warn!("Could not determine config directory - using defaults");
            Ok(TomlConfig::default())
        }
    }
}

fn read_config_file(path: &Path) -> Result<TomlConfig> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Cannot read {}: {}", path.display(), e)))?;
    let config = TomlConfig::from_toml_str(&text)?;
    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// `~/.config/ccrm/config.toml` (platform equivalent elsewhere)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("ccrm").join("config.toml"))
}

/// OS-dependent compiled defaults
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub root_folder: PathBuf,
    pub log_level: String,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        let root_folder = dirs::data_local_dir()
            .map(|d| d.join("ccrm"))
            .unwrap_or_else(|| PathBuf::from("./ccrm_data"));

        Self {
            root_folder,
            log_level: "info".to_string(),
        }
    }
}

/// Resolves the root folder holding the store files
#[derive(Debug, Clone)]
pub struct RootFolderResolver {
    module_name: String,
    cli_arg: Option<PathBuf>,
    config_root: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new(module_name: &str) -> Self {
        Self {
            module_name: module_name.to_string(),
            cli_arg: None,
            config_root: None,
        }
    }

    pub fn with_cli_arg(mut self, cli_arg: Option<PathBuf>) -> Self {
        self.cli_arg = cli_arg;
        self
    }

    pub fn with_config(mut self, config: &TomlConfig) -> Self {
        self.config_root = config.root_folder.clone();
        self
    }

    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            info!("{}: root folder from command line: {}", self.module_name, path.display());
            return path.clone();
        }

        if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
            if !path.trim().is_empty() {
                info!("{}: root folder from {}: {}", self.module_name, ROOT_FOLDER_ENV, path);
                return PathBuf::from(path);
            }
        }

        if let Some(path) = &self.config_root {
            info!("{}: root folder from config file: {}", self.module_name, path.display());
            return path.clone();
        }

        let path = CompiledDefaults::for_current_platform().root_folder;
        info!("{}: root folder (default): {}", self.module_name, path.display());
        path
    }
}

/// Creates the root folder and derives file paths inside it
#[derive(Debug, Clone)]
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    pub fn ensure_directory_exists(&self) -> Result<()> {
        if !self.root_folder.exists() {
            std::fs::create_dir_all(&self.root_folder)?;
            info!("Created root folder: {}", self.root_folder.display());
        }
        Ok(())
    }

    /// Store file for a project: `<root>/<project_id>.db`
    pub fn database_path(&self, project_id: &str) -> PathBuf {
        self.root_folder.join(format!("{}.db", project_id))
    }

    pub fn root_folder(&self) -> &Path {
        &self.root_folder
    }
}
