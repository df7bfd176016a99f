//! Per-profile CLI settings: which API a profile talks to and which trip it
//! is currently working on.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use trek_core::config::{normalize_text_option, ClientConfig};
use trek_core::models::TripId;

use crate::error::CliError;

const SETTINGS_FILE: &str = "profiles.json";
const PROFILE_ENV: &str = "TREK_PROFILE";
const DEFAULT_PROFILE: &str = "default";

/// Contents of `profiles.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<String>,
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base_url: Option<String>,
    /// Trip used when a command is not given one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_trip: Option<TripId>,
}

pub fn settings_path() -> Result<PathBuf, CliError> {
    dirs::config_dir()
        .map(|dir| dir.join("trek").join(SETTINGS_FILE))
        .ok_or_else(|| CliError::Config("no configuration directory for this user".to_string()))
}

impl ProfileSettings {
    pub fn load() -> Result<Self, CliError> {
        Self::read(&settings_path()?)
    }

    /// Read settings from `path`; a missing file means no profiles yet.
    pub fn read(path: &Path) -> Result<Self, CliError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(error) => return Err(error.into()),
        };
        let settings: Self = serde_json::from_str(&raw)
            .map_err(|error| CliError::Config(format!("{}: {error}", path.display())))?;
        Ok(settings.cleaned())
    }

    pub fn store(&self) -> Result<PathBuf, CliError> {
        let path = settings_path()?;
        self.write(&path)?;
        Ok(path)
    }

    pub fn write(&self, path: &Path) -> Result<(), CliError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let serialized = serde_json::to_string_pretty(&self.clone().cleaned())?;
        std::fs::write(path, serialized)?;
        Ok(())
    }

    /// Profile to use: `--profile`, then `TREK_PROFILE`, then the active one.
    pub fn profile_name(&self, explicit: Option<&str>) -> String {
        let from_env = std::env::var(PROFILE_ENV).ok();
        let name = [explicit, from_env.as_deref(), self.active.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|name| !name.is_empty())
            .unwrap_or(DEFAULT_PROFILE)
            .to_string();
        name
    }

    /// Settings of `name`, or empty ones when the profile does not exist.
    pub fn profile(&self, name: &str) -> Profile {
        self.profiles.get(name).cloned().unwrap_or_default()
    }

    pub fn edit(&mut self, name: &str) -> &mut Profile {
        self.profiles.entry(name.to_string()).or_default()
    }

    /// Clear `id` as the current trip of every profile; returns whether any changed.
    pub fn forget_trip(&mut self, id: &TripId) -> bool {
        let mut changed = false;
        for profile in self.profiles.values_mut() {
            if profile.current_trip.as_ref() == Some(id) {
                profile.current_trip = None;
                changed = true;
            }
        }
        changed
    }

    fn cleaned(mut self) -> Self {
        self.active = normalize_text_option(self.active);
        self.profiles.retain(|name, _| !name.trim().is_empty());
        for profile in self.profiles.values_mut() {
            profile.api_base_url = normalize_text_option(profile.api_base_url.take());
            profile.current_trip = profile
                .current_trip
                .take()
                .and_then(|id| normalize_text_option(Some(id.as_str().to_string())))
                .map(TripId::new);
        }
        self
    }
}

impl Profile {
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            api_base_url: self.api_base_url.clone(),
        }
    }
}
