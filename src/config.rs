//! Shell configuration

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Overrides the profile directory (tests, portable installs).
pub const DATA_DIR_ENV: &str = "MIX_BROWSER_DATA_DIR";

/// Static configuration of a shell instance. User preferences live in the
/// settings file instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShellConfig {
    /// Directory holding passwords.json, settings.json and stats.json
    pub data_dir: PathBuf,

    /// Where downloads are saved
    pub download_dir: PathBuf,

    /// User agent handed to content views
    pub user_agent: String,
}

impl Default for ShellConfig {
    fn default() -> Self {
        let data_dir = default_data_dir();
        Self {
            download_dir: default_download_dir(&data_dir),
            data_dir,
            user_agent: format!(
                "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 MixBrowser/{}",
                env!("CARGO_PKG_VERSION")
            ),
        }
    }
}

impl ShellConfig {
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            download_dir: default_download_dir(&data_dir),
            data_dir,
            ..Self::default()
        }
    }
}

fn default_data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mix-browser")
}

fn default_download_dir(data_dir: &std::path::Path) -> PathBuf {
    dirs::download_dir().unwrap_or_else(|| data_dir.join("downloads"))
}
