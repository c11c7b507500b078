// ============================================================================
// CONFIGURATION — editor settings and AI model profiles
// ============================================================================
//
// Editor settings persist as a flat key=value file; model profiles (endpoint,
// credentials, generation defaults) live next to it as JSON. Corrupt or
// missing files fall back to defaults — configuration must never prevent the
// editor from starting.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no config directory available")]
    NoConfigDir,
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("profile store is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Per-OS config directory, resolved from the environment.
fn config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|d| PathBuf::from(d).join("Paintbox"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            return Some(PathBuf::from(xdg).join("paintbox"));
        }
        std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config").join("paintbox"))
    }
}

// ---------------------------------------------------------------------------
//  Editor settings (key=value)
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq)]
pub struct EditorSettings {
    /// Default canvas size for a new document.
    pub canvas_width: u32,
    pub canvas_height: u32,
    /// Transport timeout for AI generation, in seconds.
    pub generation_timeout_secs: u64,
    /// Ask before discarding unsaved changes on close.
    pub confirm_on_exit: bool,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            canvas_width: 800,
            canvas_height: 600,
            generation_timeout_secs: 60,
            confirm_on_exit: true,
        }
    }
}

impl EditorSettings {
    fn settings_path() -> Option<PathBuf> {
        let dir = config_dir()?;
        let _ = std::fs::create_dir_all(&dir);
        Some(dir.join("paintbox_settings.cfg"))
    }

    /// Load from disk; missing or corrupt entries keep their defaults.
    pub fn load() -> Self {
        let Some(path) = Self::settings_path() else {
            return Self::default();
        };
        let Ok(content) = std::fs::read_to_string(&path) else {
            return Self::default();
        };
        let mut s = Self::default();
        for line in content.lines() {
            let Some((key, val)) = line.split_once('=') else {
                continue;
            };
            let val = val.trim();
            match key.trim() {
                "canvas_width" => s.canvas_width = val.parse().unwrap_or(s.canvas_width),
                "canvas_height" => s.canvas_height = val.parse().unwrap_or(s.canvas_height),
                "generation_timeout_secs" => {
                    s.generation_timeout_secs = val.parse().unwrap_or(s.generation_timeout_secs)
                }
                "confirm_on_exit" => s.confirm_on_exit = val == "true",
                other => log::debug!("settings: ignoring unknown key {other:?}"),
            }
        }
        s
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::settings_path().ok_or(ConfigError::NoConfigDir)?;
        let content = format!(
            "canvas_width={}\n\
             canvas_height={}\n\
             generation_timeout_secs={}\n\
             confirm_on_exit={}\n",
            self.canvas_width, self.canvas_height, self.generation_timeout_secs, self.confirm_on_exit,
        );
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
//  Model profiles (JSON)
// ---------------------------------------------------------------------------

/// One named generation endpoint with its defaults. Only the generation
/// dialog reads these; canvas/tool logic never does.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelProfile {
    pub name: String,
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub quality: String,
    #[serde(default)]
    pub style: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileStore {
    pub profiles: Vec<ModelProfile>,
    /// Name of the globally selected profile.
    #[serde(default)]
    pub active: Option<String>,
}

impl ProfileStore {
    fn store_path() -> Option<PathBuf> {
        let dir = config_dir()?;
        let _ = std::fs::create_dir_all(&dir);
        Some(dir.join("model_profiles.json"))
    }

    pub fn load() -> Self {
        let Some(path) = Self::store_path() else {
            return Self::default();
        };
        let Ok(content) = std::fs::read_to_string(&path) else {
            return Self::default();
        };
        match serde_json::from_str(&content) {
            Ok(store) => store,
            Err(e) => {
                log::warn!("profile store corrupt ({e}), starting empty");
                Self::default()
            }
        }
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::store_path().ok_or(ConfigError::NoConfigDir)?;
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn active_profile(&self) -> Option<&ModelProfile> {
        let name = self.active.as_deref()?;
        self.profiles.iter().find(|p| p.name == name)
    }

    /// Insert or replace by name.
    pub fn upsert(&mut self, profile: ModelProfile) {
        match self.profiles.iter_mut().find(|p| p.name == profile.name) {
            Some(slot) => *slot = profile,
            None => self.profiles.push(profile),
        }
    }

    pub fn remove(&mut self, name: &str) {
        self.profiles.retain(|p| p.name != name);
        if self.active.as_deref() == Some(name) {
            self.active = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_store_round_trips_through_json() {
        let mut store = ProfileStore::default();
        store.upsert(ModelProfile {
            name: "default".into(),
            base_url: "https://example.invalid/v1".into(),
            model: "img-2".into(),
            ..Default::default()
        });
        store.active = Some("default".into());
        let json = serde_json::to_string(&store).unwrap();
        let back: ProfileStore = serde_json::from_str(&json).unwrap();
        assert_eq!(back, store);
        assert_eq!(back.active_profile().unwrap().model, "img-2");
    }

    #[test]
    fn removing_active_profile_clears_selection() {
        let mut store = ProfileStore::default();
        store.upsert(ModelProfile { name: "a".into(), ..Default::default() });
        store.active = Some("a".into());
        store.remove("a");
        assert!(store.active.is_none());
        assert!(store.profiles.is_empty());
    }
}
