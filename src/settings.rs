use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::RwLock};

use crate::throttle::{DEFAULT_COOLDOWN_SECS, DEFAULT_DEBOUNCE_MS, DEFAULT_SWEEP_THRESHOLD};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub database_file: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8787,
            database_file: "hubtrack.sqlite3".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingSettings {
    pub cooldown_secs: u64,
    pub debounce_ms: u64,
    pub sweep_threshold: usize,
}

impl Default for TrackingSettings {
    fn default() -> Self {
        Self {
            cooldown_secs: DEFAULT_COOLDOWN_SECS,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            sweep_threshold: DEFAULT_SWEEP_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct ServiceSettings {
    server: ServerSettings,
    tracking: TrackingSettings,
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<ServiceSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_default()
        } else {
            ServiceSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn server(&self) -> ServerSettings {
        self.data.read().unwrap().server.clone()
    }

    pub fn tracking(&self) -> TrackingSettings {
        self.data.read().unwrap().tracking.clone()
    }

    pub fn update_tracking(&self, settings: TrackingSettings) -> Result<()> {
        {
            let mut guard = self.data.write().unwrap();
            guard.tracking = settings;
            self.persist(&guard)?;
        }
        Ok(())
    }

    fn persist(&self, data: &ServiceSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}
