//! Operator-tunable dashboard settings.
//!
//! Settings are persisted under [`keys::SYSTEM_SETTINGS`] as camelCase JSON.
//! Fields missing from the stored document take their default, so older
//! documents keep loading as fields are added.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};
use crate::storage::{keys, Storage};

/// Shortest allowed auto-refresh interval in milliseconds.
pub const MIN_REFRESH_INTERVAL_MS: u64 = 1000;

/// Dashboard-wide settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SystemSettings {
    /// Periodically reload data while the dashboard is visible.
    pub auto_refresh: bool,
    /// Reload period in milliseconds.
    pub refresh_interval: u64,
    /// Marker radius on the map.
    pub map_radius: f64,
    /// Show action notifications.
    pub notifications_enabled: bool,
    /// How long readings are kept, in days.
    pub data_retention_days: u32,
    /// Base URL of the remote API.
    pub api_endpoint: String,
}

impl Default for SystemSettings {
    fn default() -> Self {
        Self {
            auto_refresh: true,
            refresh_interval: 300_000,
            map_radius: 150.0,
            notifications_enabled: true,
            data_retention_days: 30,
            api_endpoint: "https://9l5vu3c1zl.execute-api.ap-southeast-1.amazonaws.com/prod"
                .to_string(),
        }
    }
}

/// A partial edit to [`SystemSettings`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SettingsUpdate {
    /// Replacement for `autoRefresh`.
    pub auto_refresh: Option<bool>,
    /// Replacement for `refreshInterval`.
    pub refresh_interval: Option<u64>,
    /// Replacement for `mapRadius`.
    pub map_radius: Option<f64>,
    /// Replacement for `notificationsEnabled`.
    pub notifications_enabled: Option<bool>,
    /// Replacement for `dataRetentionDays`.
    pub data_retention_days: Option<u32>,
    /// Replacement for `apiEndpoint`.
    pub api_endpoint: Option<String>,
}

impl SystemSettings {
    /// Load settings, merging stored values over defaults.
    ///
    /// An unreadable or invalid document is logged and replaced by the
    /// defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be queried.
    pub fn load(storage: &Storage) -> Result<Self> {
        match storage.get_json::<Self>(keys::SYSTEM_SETTINGS) {
            Ok(None) => Ok(Self::default()),
            Ok(Some(stored)) => match stored.validate() {
                Ok(()) => Ok(stored),
                Err(e) => {
                    warn!("Ignoring invalid system settings: {e}");
                    Ok(Self::default())
                }
            },
            Err(Error::Json(e)) => {
                warn!("Ignoring unreadable system settings: {e}");
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Persist these settings.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the store write fails.
    pub fn save(&self, storage: &Storage) -> Result<()> {
        storage.set_json(keys::SYSTEM_SETTINGS, self)
    }

    /// Check every field.
    ///
    /// # Errors
    ///
    /// Returns a validation error naming the first bad field.
    pub fn validate(&self) -> Result<()> {
        if self.refresh_interval < MIN_REFRESH_INTERVAL_MS {
            return Err(Error::validation(
                "refreshInterval",
                format!("Refresh interval must be at least {MIN_REFRESH_INTERVAL_MS} ms"),
            ));
        }
        if !(self.map_radius.is_finite() && self.map_radius > 0.0) {
            return Err(Error::validation(
                "mapRadius",
                "Map radius must be greater than 0",
            ));
        }
        if self.data_retention_days < 1 {
            return Err(Error::validation(
                "dataRetentionDays",
                "Data retention must be at least 1 day",
            ));
        }
        if self.api_endpoint.trim().is_empty() {
            return Err(Error::validation(
                "apiEndpoint",
                "API endpoint must not be empty",
            ));
        }
        Ok(())
    }

    /// Merge `update` into a copy of these settings and validate the result.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the merged settings are invalid.
    pub fn merged(&self, update: &SettingsUpdate) -> Result<Self> {
        let mut next = self.clone();
        if let Some(v) = update.auto_refresh {
            next.auto_refresh = v;
        }
        if let Some(v) = update.refresh_interval {
            next.refresh_interval = v;
        }
        if let Some(v) = update.map_radius {
            next.map_radius = v;
        }
        if let Some(v) = update.notifications_enabled {
            next.notifications_enabled = v;
        }
        if let Some(v) = update.data_retention_days {
            next.data_retention_days = v;
        }
        if let Some(v) = &update.api_endpoint {
            next.api_endpoint = v.trim().to_string();
        }
        next.validate()?;
        Ok(next)
    }

    /// The auto-refresh period.
    #[must_use]
    pub fn refresh_period(&self) -> Duration {
        Duration::from_millis(self.refresh_interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = SystemSettings::default();
        assert!(settings.auto_refresh);
        assert_eq!(settings.refresh_interval, 300_000);
        assert_eq!(settings.refresh_period(), Duration::from_secs(300));
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_load_absent_gives_defaults() {
        let storage = Storage::open_in_memory().unwrap();
        assert_eq!(SystemSettings::load(&storage).unwrap(), SystemSettings::default());
    }

    #[test]
    fn test_stored_values_merge_over_defaults() {
        let storage = Storage::open_in_memory().unwrap();
        storage
            .set(keys::SYSTEM_SETTINGS, r#"{"refreshInterval":60000,"mapRadius":200}"#)
            .unwrap();

        let settings = SystemSettings::load(&storage).unwrap();
        assert_eq!(settings.refresh_interval, 60_000);
        assert!((settings.map_radius - 200.0).abs() < f64::EPSILON);
        assert!(settings.notifications_enabled);
        assert_eq!(settings.data_retention_days, 30);
    }

    #[test]
    fn test_unreadable_settings_fall_back() {
        let storage = Storage::open_in_memory().unwrap();
        storage.set(keys::SYSTEM_SETTINGS, "nope").unwrap();
        assert_eq!(SystemSettings::load(&storage).unwrap(), SystemSettings::default());
    }

    #[test]
    fn test_invalid_stored_settings_fall_back() {
        let storage = Storage::open_in_memory().unwrap();
        storage
            .set(keys::SYSTEM_SETTINGS, r#"{"refreshInterval":0,"mapRadius":200}"#)
            .unwrap();
        assert_eq!(SystemSettings::load(&storage).unwrap(), SystemSettings::default());
    }

    #[test]
    fn test_save_uses_camel_case() {
        let storage = Storage::open_in_memory().unwrap();
        SystemSettings::default().save(&storage).unwrap();

        let raw = storage.get(keys::SYSTEM_SETTINGS).unwrap().unwrap();
        assert!(raw.contains("\"autoRefresh\":true"));
        assert!(raw.contains("\"dataRetentionDays\":30"));
    }

    #[test]
    fn test_merged_validates() {
        let settings = SystemSettings::default();

        let update = SettingsUpdate {
            refresh_interval: Some(500),
            ..Default::default()
        };
        assert_eq!(
            settings.merged(&update).unwrap_err().field(),
            Some("refreshInterval")
        );

        let update = SettingsUpdate {
            map_radius: Some(0.0),
            ..Default::default()
        };
        assert_eq!(settings.merged(&update).unwrap_err().field(), Some("mapRadius"));

        let update = SettingsUpdate {
            data_retention_days: Some(0),
            ..Default::default()
        };
        assert!(settings.merged(&update).is_err());

        let update = SettingsUpdate {
            api_endpoint: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(settings.merged(&update).is_err());
    }

    #[test]
    fn test_merged_applies_fields() {
        let update = SettingsUpdate {
            auto_refresh: Some(false),
            refresh_interval: Some(10_000),
            notifications_enabled: Some(false),
            ..Default::default()
        };
        let merged = SystemSettings::default().merged(&update).unwrap();
        assert!(!merged.auto_refresh);
        assert_eq!(merged.refresh_interval, 10_000);
        assert!(!merged.notifications_enabled);
        assert_eq!(merged.data_retention_days, 30);
    }
}
