/// CLI configuration
use crate::error::{CliError, Result};
use cadence_playback::PlaybackConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CliConfig {
    #[serde(default)]
    pub playback: PlaybackConfig,

    #[serde(default)]
    pub library: LibrarySettings,

    #[serde(default)]
    pub simulation: SimulationSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LibrarySettings {
    /// TOML file listing the catalog
    #[serde(default = "default_library_path")]
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimulationSettings {
    /// Whether the simulated environment grants audio focus
    #[serde(default = "default_grant_focus")]
    pub grant_focus: bool,

    /// How often the simulated output checks for finished items
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

impl CliConfig {
    /// Default configuration file, used when no path is given
    pub const DEFAULT_FILE: &'static str = "cadence.toml";

    /// Load configuration from file and environment
    ///
    /// An explicit `path` must exist; the default file is optional.
    /// Environment variables prefixed with `CADENCE_` override file values,
    /// with `__` between section and key (`CADENCE_PLAYBACK__DUCK_VOLUME`).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path).required(true));
            }
            None => {
                let default_path = PathBuf::from(Self::DEFAULT_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        // Override with environment variables
        settings = settings.add_source(
            config::Environment::with_prefix("CADENCE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = settings
            .build()
            .map_err(|e| CliError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| CliError::Config(e.to_string()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.playback
            .validate()
            .map_err(|e| CliError::Config(e.to_string()))?;

        if self.simulation.tick_ms == 0 {
            return Err(CliError::Config(
                "simulation.tick_ms must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            path: default_library_path(),
        }
    }
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            grant_focus: default_grant_focus(),
            tick_ms: default_tick_ms(),
        }
    }
}

// Default values
fn default_library_path() -> PathBuf {
    PathBuf::from("library.toml")
}

fn default_grant_focus() -> bool {
    true
}

fn default_tick_ms() -> u64 {
    100
}
