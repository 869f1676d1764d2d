// Persisted user preferences: color theme and last nickname.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum PrefsError {
    #[error("no home directory available for preferences")]
    NoConfigDir,

    #[error("failed to write preferences to {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to serialize preferences: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Theme {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub theme: Theme,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
}

impl Preferences {
    /// `<platform config dir>/prefs.toml`
    pub fn default_path() -> Result<PathBuf, PrefsError> {
        ProjectDirs::from("org", "facegomoku", "face-gomoku")
            .map(|dirs| dirs.config_dir().join("prefs.toml"))
            .ok_or(PrefsError::NoConfigDir)
    }

    /// Read preferences from `path`. A missing or unreadable file yields the
    /// defaults; preferences are never worth failing startup over.
    pub fn load_from(path: &Path) -> Preferences {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                debug!("no preferences at {}: {e}", path.display());
                return Preferences::default();
            }
        };
        toml::from_str(&text).unwrap_or_else(|e| {
            warn!("ignoring malformed preferences at {}: {e}", path.display());
            Preferences::default()
        })
    }

    pub fn save_to(&self, path: &Path) -> Result<(), PrefsError> {
        let text = toml::to_string(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| PrefsError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(path, text).map_err(|source| PrefsError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
