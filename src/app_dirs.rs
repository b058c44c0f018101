use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    fn project() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", "stroll")
    }

    pub fn config_path() -> Option<PathBuf> {
        Self::project().map(|pd| pd.config_dir().join("config.json"))
    }

    /// Log file in the state dir (`$XDG_STATE_HOME/stroll` on Linux); platforms
    /// without one use the local data dir.
    pub fn log_path() -> Option<PathBuf> {
        Self::project().map(|pd| {
            pd.state_dir()
                .unwrap_or_else(|| pd.data_local_dir())
                .join("stroll.log")
        })
    }
}
