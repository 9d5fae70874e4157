//! Persisted user preferences
//!
//! A flat JSON object in `<data_dir>/preferences.json`. The only key written
//! today is the selected network.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;
use xhedge_core::constants::NETWORK_PREFERENCE_KEY;
use xhedge_core::Network;

const FILE_NAME: &str = "preferences.json";

#[derive(Debug, Error)]
pub enum PreferencesError {
    #[error("Preferences I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Preferences file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct Preferences {
    path: PathBuf,
}

impl Preferences {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<BTreeMap<String, Value>, PreferencesError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Last selected network; `None` when missing or unreadable
    pub fn load_network(&self) -> Option<Network> {
        let prefs = match self.read() {
            Ok(prefs) => prefs,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "Ignoring preferences: {}", e);
                return None;
            }
        };

        let raw = prefs.get(NETWORK_PREFERENCE_KEY)?.as_str()?;
        match raw.parse() {
            Ok(network) => Some(network),
            Err(e) => {
                tracing::warn!("Ignoring stored network preference: {}", e);
                None
            }
        }
    }

    /// Store the network, keeping any other keys in the file
    pub fn save_network(&self, network: Network) -> Result<(), PreferencesError> {
        // A corrupt file is replaced rather than blocking the change
        let mut prefs = self.read().unwrap_or_default();
        prefs.insert(
            NETWORK_PREFERENCE_KEY.to_string(),
            Value::String(network.as_str().to_string()),
        );

        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&prefs)?)?;
        Ok(())
    }
}
