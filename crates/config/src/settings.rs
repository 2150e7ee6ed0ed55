// Runtime settings
// Loaded from ~/.config/gridsync/settings.toml

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Per-sheet cell-edit count above which a transaction's edits to that
    /// sheet are consolidated into one sheet replacement.
    #[serde(rename = "compiler.threshold")]
    pub compiler_threshold: usize,

    /// Disable to send every operation through uncompiled.
    #[serde(rename = "compiler.enabled")]
    pub use_compiler: bool,

    /// Bounded depth of each client's outbound message queue.
    #[serde(rename = "transport.queueDepth")]
    pub queue_depth: usize,

    /// Locale stamped on full workbook projections.
    #[serde(rename = "workbook.locale")]
    pub locale: String,

    /// Refuse direct cell edits from the UI (review-only deployments).
    #[serde(rename = "sync.blockDirectEdits")]
    pub block_direct_edits: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            compiler_threshold: 20,
            use_compiler: true,
            queue_depth: 256,
            locale: "FR_FR".to_string(),
            block_direct_edits: false,
        }
    }
}

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gridsync");
        config_dir.join("settings.toml")
    }

    /// Load settings from disk, falling back to defaults
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(settings) => settings,
                Err(e) => {
                    eprintln!("Error parsing {}: {}", path.display(), e);
                    eprintln!("Using default settings");
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("Error reading {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Save current settings to disk
    pub fn save(&self) -> Result<(), String> {
        let path = Self::config_path();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }

        let contents = toml::to_string_pretty(self).map_err(|e| e.to_string())?;
        fs::write(&path, contents).map_err(|e| e.to_string())
    }
}
