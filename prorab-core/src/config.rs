//! Configuration management
//!
//! Settings live in `settings.json` inside the data directory:
//! ```json
//! {
//!   "app": { "demoMode": false },
//!   "storage": { "imagesDir": "media", "publicBaseUrl": null },
//!   "upload": { "maxBytes": 5242880 },
//!   "outbox": { "maxAttempts": 3, "initialDelayMs": 500 }
//! }
//! ```
//! Keys the application does not manage are preserved on save. Relay
//! credentials are read from the environment only.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "PRORAB_DIR";

/// Environment variable overriding demo mode (for CI/testing)
pub const DEMO_MODE_ENV: &str = "PRORAB_DEMO_MODE";

/// Largest accepted image upload (5 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    app: AppSettings,
    #[serde(default)]
    storage: StorageSettings,
    #[serde(default)]
    upload: UploadSettings,
    #[serde(default)]
    outbox: OutboxSettings,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppSettings {
    #[serde(default)]
    demo_mode: bool,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

/// Object storage settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageSettings {
    /// Directory of uploaded objects, relative to the data directory
    #[serde(default = "default_images_dir")]
    pub images_dir: String,
    /// Base URL of a static server in front of `images_dir`
    #[serde(default)]
    pub public_base_url: Option<String>,
}

fn default_images_dir() -> String {
    "media".to_string()
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            images_dir: default_images_dir(),
            public_base_url: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadSettings {
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,
}

fn default_max_bytes() -> u64 {
    DEFAULT_MAX_UPLOAD_BYTES
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

/// Retry policy of the push outbox
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboxSettings {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay before the first retry; doubles on every further retry
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay_ms() -> u64 {
    500
}

impl Default for OutboxSettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
        }
    }
}

impl OutboxSettings {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }
}

/// Application configuration (simplified view of settings)
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub demo_mode: bool,
    pub storage: StorageSettings,
    pub upload: UploadSettings,
    pub outbox: OutboxSettings,
    // Keep the raw settings for preservation when saving
    _raw_settings: SettingsFile,
}

impl Config {
    /// Load config from the data directory
    ///
    /// Demo mode can be enabled via:
    /// 1. Settings file (`prorab demo on`)
    /// 2. Environment variable PRORAB_DEMO_MODE (for CI/testing)
    pub fn load(data_dir: &Path) -> Result<Self> {
        let settings_path = data_dir.join("settings.json");

        let raw: SettingsFile = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str(&content).unwrap_or_default()
        } else {
            SettingsFile::default()
        };

        let demo_mode = match std::env::var(DEMO_MODE_ENV).ok().as_deref() {
            Some("true" | "1" | "yes" | "TRUE" | "YES") => true,
            Some("false" | "0" | "no" | "FALSE" | "NO") => false,
            _ => raw.app.demo_mode,
        };

        Ok(Self {
            demo_mode,
            storage: raw.storage.clone(),
            upload: raw.upload.clone(),
            outbox: raw.outbox.clone(),
            _raw_settings: raw,
        })
    }

    /// Save config, preserving settings this application doesn't manage
    pub fn save(&self, data_dir: &Path) -> Result<()> {
        let settings_path = data_dir.join("settings.json");

        let mut settings = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str::<SettingsFile>(&content).unwrap_or_default()
        } else {
            SettingsFile::default()
        };

        settings.app.demo_mode = self.demo_mode;
        settings.storage = self.storage.clone();
        settings.upload = self.upload.clone();
        settings.outbox = self.outbox.clone();

        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(&settings_path, content)?;
        Ok(())
    }

    pub fn enable_demo_mode(&mut self) {
        self.demo_mode = true;
    }

    pub fn disable_demo_mode(&mut self) {
        self.demo_mode = false;
    }

    /// Document database file name for the current mode
    pub fn db_filename(&self) -> &'static str {
        if self.demo_mode {
            "demo.duckdb"
        } else {
            "prorab.duckdb"
        }
    }

    /// Absolute directory of uploaded objects
    pub fn images_dir(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.storage.images_dir)
    }
}

/// Data directory from `PRORAB_DIR`, or `~/.prorab`
pub fn data_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|home| home.join(".prorab"))
        .ok_or_else(|| anyhow::anyhow!("Could not find home directory"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_without_settings_file() {
        let dir = tempdir().unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.upload.max_bytes, 5 * 1024 * 1024);
        assert_eq!(config.outbox.max_attempts, 3);
        assert_eq!(config.storage.images_dir, "media");
    }

    #[test]
    fn test_save_preserves_unknown_keys() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("settings.json"),
            r#"{"app": {"theme": "dark"}, "warehouse": {"defaultUnit": "шт"}, "outbox": {"maxAttempts": 5}}"#,
        )
        .unwrap();

        let mut config = Config::load(dir.path()).unwrap();
        assert_eq!(config.outbox.max_attempts, 5);
        assert_eq!(config.outbox.initial_delay_ms, 500);

        config.storage.public_base_url = Some("https://cdn.example.com".to_string());
        config.save(dir.path()).unwrap();

        let saved: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(dir.path().join("settings.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(saved["app"]["theme"], "dark");
        assert_eq!(saved["warehouse"]["defaultUnit"], "шт");
        assert_eq!(saved["storage"]["publicBaseUrl"], "https://cdn.example.com");
    }
}
