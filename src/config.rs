//! # Configuration Management

//! This module handles the configuration loading and management for the door provider.
//! It leverages the `config` crate to provide a flexible and structured way to define and access configuration settings from various sources, including:

//! * YAML configuration files (default.yaml, development.yaml, production.yaml)
//! * Environment variables

//! The core of this module is the `Settings` struct. Every section carries defaults, so the provider
//! runs with no configuration files at all.

use serde::{Deserialize, Serialize};
use config::{Config, Environment, File};
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use tracing::debug;
use crate::errors::DoorBusError;

/// Represents the complete set of configuration settings for the door provider.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct Settings {
    /// Settings for application logging
    pub logging: LoggingSettings,
    /// Settings for the bus connection
    pub bus: BusSettings,
    /// Settings applied to every door created at startup
    pub doors: DoorSettings,
}

/// Holds the configuration settings for application logging
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LoggingSettings {
    /// The logging level (e.g., "info", "debug", "error")
    pub level: String,
    /// The directory path where log files will be stored (optional)
    pub path: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            path: None,
        }
    }
}

/// Holds the configuration settings for the bus the doors are published on.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct BusSettings {
    /// Number of outbound messages buffered for each traffic observer
    pub traffic_capacity: usize,
    /// Object paths the bus refuses to register
    pub denied_paths: Vec<String>,
}

impl Default for BusSettings {
    fn default() -> Self {
        Self {
            traffic_capacity: 256,
            denied_paths: Vec::new(),
        }
    }
}

/// Holds the settings used to construct doors.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct DoorSettings {
    /// Prefix of the derived object paths; the 1-based door position is appended
    pub path_root: String,
    /// Whether doors start open
    pub initially_open: bool,
    /// Operator-supplied object paths keyed by location
    pub paths: HashMap<String, String>,
}

impl Default for DoorSettings {
    fn default() -> Self {
        Self {
            path_root: "/Door/".to_string(),
            initially_open: false,
            paths: HashMap::new(),
        }
    }
}

impl DoorSettings {
    /// Returns the object path for the door at `position` (1-based) serving `location`.
    pub fn path_for(&self, location: &str, position: usize) -> String {
        self.paths
            .get(location)
            .cloned()
            .unwrap_or_else(|| format!("{}{}", self.path_root, position))
    }
}


/// # Settings Initialization
impl Settings {
    /// Loads and constructs the application settings from various configuration sources.
    ///
    /// This function reads configuration settings from the following sources, in order of precedence:
    ///
    /// 1. `default.yaml`: Contains default settings for the application (optional)
    /// 2. Environment-specific YAML file (e.g., `development.yaml` or `production.yaml`) based on the `RUN_MODE` environment variable
    /// 3. Environment variables prefixed with `DOORBUS` (e.g., `DOORBUS__LOGGING__LEVEL`)
    ///
    /// The `CONFIG_DIR` environment variable can be used to specify the directory where the YAML configuration files are located (defaults to "config").
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)`: If the settings were loaded and constructed successfully
    /// * `Err(DoorBusError)`: If there was an error during the loading or construction process
    pub fn new() -> Result<Self, DoorBusError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());
        let config_dir = env::var("CONFIG_DIR").unwrap_or_else(|_| "config".into());
        debug!("Run Mode: {:?}, Config Dir: {:?}", run_mode, config_dir);

        let s = Config::builder()
            .add_source(File::with_name(&format!("{}/default", config_dir)).required(false))
            .add_source(File::with_name(&format!("{}/{}", config_dir, run_mode)).required(false))
            .add_source(Environment::with_prefix("DOORBUS").separator("__"))
            .build()?;

        debug!("{:#?}", s);
        let mut s: Self = s.try_deserialize::<Settings>()
            .map_err(DoorBusError::from)?;

        if let Some(ref mut path) = s.logging.path {
            *path = env::current_dir()?.join(path.clone());
        }

        if !s.doors.path_root.starts_with('/') {
            return Err(DoorBusError::ConfigError(format!(
                "doors.path_root must start with '/', got {:?}",
                s.doors.path_root
            )));
        }

        Ok(s)
    }
}
