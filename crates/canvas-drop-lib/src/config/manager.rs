use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;

use super::settings::Settings;
use crate::errors::{CanvasDropError, Result};

type ChangeCallback = Box<dyn Fn(&Settings) + Send + Sync>;

/// Keys that may not be blank once set.
const CREDENTIAL_KEYS: [&str; 2] = ["apiToken", "canvasDomain"];

/// Thread-safe holder for `Settings` with file persistence and change callbacks.
///
/// Loads `settings.json` from the application directory, persists every
/// mutation, and notifies registered listeners on change.
pub struct SettingsManager {
    settings: Arc<RwLock<Settings>>,
    settings_path: PathBuf,
    on_change: Arc<RwLock<Vec<ChangeCallback>>>,
}

impl SettingsManager {
    /// Load settings from `<dir>/settings.json`.
    ///
    /// Creates the file with defaults when missing and falls back to defaults
    /// (with a warning) when it cannot be read or parsed.
    pub async fn initialize(dir: &Path) -> Result<Self> {
        let settings_path = dir.join("settings.json");
        let settings = Self::load_or_create(&settings_path).await;

        Ok(Self {
            settings: Arc::new(RwLock::new(settings)),
            settings_path,
            on_change: Arc::new(RwLock::new(Vec::new())),
        })
    }

    pub fn settings_path(&self) -> &Path {
        &self.settings_path
    }

    /// Return a clone of the current settings.
    pub async fn get_settings(&self) -> Settings {
        self.settings.read().await.clone()
    }

    /// Store the Canvas credential pair.
    ///
    /// Both values are trimmed and must be non-empty.
    pub async fn set_credentials(&self, domain: &str, token: &str) -> Result<()> {
        let domain = domain.trim();
        let token = token.trim();
        if domain.is_empty() || token.is_empty() {
            return Err(CanvasDropError::Config(
                "Please enter both API token and Canvas domain".into(),
            ));
        }

        let mut updates = serde_json::Map::new();
        updates.insert("canvasDomain".into(), Value::String(domain.to_string()));
        updates.insert("apiToken".into(), Value::String(token.to_string()));
        self.update_settings(updates).await
    }

    /// Apply a partial update from a JSON map of key-value pairs.
    ///
    /// Unknown keys are rejected, credential values are trimmed and must not
    /// be blank, and the result must pass `Settings::validate`. Memory is only
    /// updated after the file was written.
    pub async fn update_settings(&self, updates: serde_json::Map<String, Value>) -> Result<()> {
        let mut settings = self.settings.write().await;

        let mut current = serde_json::to_value(&*settings)
            .map_err(|e| CanvasDropError::Config(format!("Failed to serialize settings: {e}")))?;

        if let Some(obj) = current.as_object_mut() {
            for (key, value) in updates {
                if !obj.contains_key(&key) {
                    return Err(CanvasDropError::Config(format!("Unknown setting: {key}")));
                }
                let value = if CREDENTIAL_KEYS.contains(&key.as_str()) {
                    normalize_credential(&key, value)?
                } else {
                    value
                };
                obj.insert(key, value);
            }
        }

        let next: Settings = serde_json::from_value(current)
            .map_err(|e| CanvasDropError::Config(format!("Failed to apply settings: {e}")))?;
        next.validate()?;

        self.persist(&next).await?;
        *settings = next;
        self.notify_change(&settings).await;
        tracing::debug!(path = %self.settings_path.display(), "Settings updated");

        Ok(())
    }

    /// Reset all fields to defaults, persist, and notify.
    pub async fn reset_to_defaults(&self) -> Result<()> {
        let mut settings = self.settings.write().await;
        let defaults = Settings::default();

        self.persist(&defaults).await?;
        *settings = defaults;
        self.notify_change(&settings).await;

        Ok(())
    }

    /// Register a callback that fires on every settings change.
    pub async fn register_on_change(&self, callback: impl Fn(&Settings) + Send + Sync + 'static) {
        self.on_change.write().await.push(Box::new(callback));
    }

    // ── private helpers ──────────────────────────────────────────────

    async fn load_or_create(path: &Path) -> Settings {
        if path.exists() {
            match tokio::fs::read_to_string(path).await {
                Ok(contents) => match serde_json::from_str::<Settings>(&contents) {
                    Ok(settings) => return settings,
                    Err(e) => {
                        tracing::warn!(
                            "Failed to parse settings file {}: {}. Using defaults.",
                            path.display(),
                            e
                        );
                        // Leave the unreadable file in place for the user to fix.
                        return Settings::default();
                    }
                },
                Err(e) => {
                    tracing::warn!(
                        "Failed to read settings file {}: {}. Using defaults.",
                        path.display(),
                        e
                    );
                    return Settings::default();
                }
            }
        }

        let defaults = Settings::default();
        if let Err(e) = Self::write_settings(path, &defaults).await {
            tracing::warn!(
                "Failed to create default settings file {}: {}",
                path.display(),
                e
            );
        }
        defaults
    }

    async fn persist(&self, settings: &Settings) -> Result<()> {
        Self::write_settings(&self.settings_path, settings).await
    }

    async fn write_settings(path: &Path, settings: &Settings) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                CanvasDropError::Config(format!("Failed to create settings dir: {e}"))
            })?;
        }

        let json = serde_json::to_string_pretty(settings)
            .map_err(|e| CanvasDropError::Config(format!("Failed to serialize settings: {e}")))?;

        tokio::fs::write(path, json)
            .await
            .map_err(|e| CanvasDropError::Config(format!("Failed to write settings file: {e}")))?;

        Ok(())
    }

    async fn notify_change(&self, settings: &Settings) {
        let callbacks = self.on_change.read().await;
        for cb in callbacks.iter() {
            cb(settings);
        }
    }
}

fn normalize_credential(key: &str, value: Value) -> Result<Value> {
    match value.as_str().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(Value::String(v.to_string())),
        _ => Err(CanvasDropError::Config(format!("{key} cannot be empty"))),
    }
}
