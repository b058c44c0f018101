use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::app_dirs::AppDirs;
use crate::simulation::WalkSettings;

pub const DEFAULT_ROUTING_ENDPOINT: &str = "https://router.project-osrm.org";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum NarratorKind {
    #[default]
    Template,
    Http,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub pace_kmh: f64,
    pub tick_ms: u64,
    pub narration_secs: u64,
    pub turn_threshold_deg: f64,
    pub narrator: NarratorKind,
    pub narrator_endpoint: Option<String>,
    pub routing_endpoint: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pace_kmh: 5.0,
            tick_ms: 1000,
            narration_secs: 20,
            turn_threshold_deg: 30.0,
            narrator: NarratorKind::Template,
            narrator_endpoint: None,
            routing_endpoint: DEFAULT_ROUTING_ENDPOINT.to_string(),
        }
    }
}

impl From<&Config> for WalkSettings {
    fn from(cfg: &Config) -> Self {
        Self {
            pace_kmh: cfg.pace_kmh,
            tick_period: Duration::from_millis(cfg.tick_ms.max(1)),
            narration_period: Duration::from_secs(cfg.narration_secs),
            turn_threshold_deg: cfg.turn_threshold_deg,
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        let path = AppDirs::config_path().unwrap_or_else(|| PathBuf::from("stroll_config.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        let Ok(bytes) = fs::read(&self.path) else {
            debug!(path = %self.path.display(), "no config file, using defaults");
            return Config::default();
        };
        match serde_json::from_slice::<Config>(&bytes) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "unreadable config, using defaults");
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)?;
        debug!(path = %self.path.display(), "config saved");
        Ok(())
    }
}
