//! Monitoring location records and the input checks applied to them.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::aqi::{AqiStatus, AQI_MAX};
use crate::error::{Error, Result};

/// A monitoring location and its latest reading.
///
/// Field names on the wire follow the format the remote API and the
/// persisted store already use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Unique identifier, `<Device>#<YYYY-MM-DD>` for derived ids.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
    /// Air quality index, `0..=500`.
    pub aqi: u16,
    /// Band for `aqi`. Always recomputed when `aqi` changes.
    pub status: AqiStatus,
    /// Creation or last update time.
    pub timestamp: DateTime<Utc>,
    /// Name of the dominant pollutant.
    #[serde(rename = "polutan_utama")]
    pub primary_pollutant: String,
    /// Formatted concentration of the dominant pollutant.
    #[serde(rename = "polutan_value")]
    pub pollutant_value: String,
    /// CO concentration in ppm.
    pub co_value: String,
    /// PM2.5 concentration in µg/m³.
    pub pm25_value: String,
    /// Whether an operator added this location.
    #[serde(rename = "isCustom", default)]
    pub is_custom: bool,
    /// Sensor device behind this location, if known.
    #[serde(rename = "DeviceID", default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
}

/// Input for creating a location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLocation {
    /// Display name; must not be blank.
    pub name: String,
    /// Latitude, `-90..=90`.
    pub lat: f64,
    /// Longitude, `-180..=180`.
    pub lon: f64,
    /// AQI as entered; checked against `0..=500`.
    pub aqi: i32,
}

/// A partial edit to an existing location.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationUpdate {
    /// Replacement name.
    pub name: Option<String>,
    /// Replacement latitude.
    pub lat: Option<f64>,
    /// Replacement longitude.
    pub lon: Option<f64>,
    /// Replacement AQI.
    pub aqi: Option<i32>,
    /// Replacement CO reading in ppm.
    pub co_value: Option<f64>,
    /// Replacement PM2.5 reading in µg/m³.
    pub pm25_value: Option<f64>,
}

impl LocationUpdate {
    /// Whether the update changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.lat.is_none()
            && self.lon.is_none()
            && self.aqi.is_none()
            && self.co_value.is_none()
            && self.pm25_value.is_none()
    }
}

/// Guess at the dominant pollutant for a bare AQI reading.
///
/// Readings above 100 are attributed to PM2.5, the rest to CO. This is a
/// placeholder until devices report their own breakdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollutantEstimate {
    /// Pollutant name, `PM2.5` or `CO`.
    pub name: &'static str,
    /// Formatted concentration with unit.
    pub value: String,
    /// Estimated CO concentration, no unit.
    pub co_value: String,
    /// Estimated PM2.5 concentration, no unit.
    pub pm25_value: String,
}

impl PollutantEstimate {
    /// Estimate from an AQI value.
    #[must_use]
    pub fn from_aqi(aqi: u16) -> Self {
        let aqi = f64::from(aqi);
        let pm25 = aqi * 0.2;
        let co = aqi * 0.03;
        if aqi > 100.0 {
            Self {
                name: "PM2.5",
                value: format!("{pm25:.1} µg/m³"),
                co_value: format!("{co:.2}"),
                pm25_value: format!("{pm25:.1}"),
            }
        } else {
            Self {
                name: "CO",
                value: format!("{co:.2} ppm"),
                co_value: format!("{co:.2}"),
                pm25_value: format!("{pm25:.1}"),
            }
        }
    }
}

/// Check a location name and return it trimmed.
///
/// # Errors
///
/// Returns a validation error if the name is blank.
pub fn validate_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::validation("name", "Nama lokasi harus diisi!"));
    }
    Ok(trimmed.to_string())
}

/// Check a latitude.
///
/// # Errors
///
/// Returns a validation error if `lat` is outside `-90..=90` or not a number.
pub fn validate_latitude(lat: f64) -> Result<f64> {
    if (-90.0..=90.0).contains(&lat) {
        Ok(lat)
    } else {
        Err(Error::validation(
            "latitude",
            "Latitude must be between -90 and 90",
        ))
    }
}

/// Check a longitude.
///
/// # Errors
///
/// Returns a validation error if `lon` is outside `-180..=180` or not a number.
pub fn validate_longitude(lon: f64) -> Result<f64> {
    if (-180.0..=180.0).contains(&lon) {
        Ok(lon)
    } else {
        Err(Error::validation(
            "longitude",
            "Longitude must be between -180 and 180",
        ))
    }
}

/// Check an AQI value and narrow it.
///
/// # Errors
///
/// Returns a validation error if `aqi` is outside `0..=500`.
pub fn validate_aqi(aqi: i32) -> Result<u16> {
    u16::try_from(aqi)
        .ok()
        .filter(|value| *value <= AQI_MAX)
        .ok_or_else(|| Error::validation("aqi", "AQI must be between 0 and 500"))
}

fn validate_concentration(field: &'static str, label: &str, value: f64) -> Result<f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(Error::validation(
            field,
            format!("{label} value cannot be negative"),
        ))
    }
}

/// Derive a location id from its name and the creation date.
///
/// Whitespace is stripped from the name so `"RSU 4"` becomes `RSU4#2025-10-25`.
#[must_use]
pub fn derive_id(name: &str, date: NaiveDate) -> String {
    let device: String = name.chars().filter(|c| !c.is_whitespace()).collect();
    format!("{device}#{}", date.format("%Y-%m-%d"))
}

impl NewLocation {
    /// Validate the input.
    ///
    /// Checks run in form order (name, latitude, longitude, AQI) and stop at
    /// the first failure.
    ///
    /// # Errors
    ///
    /// Returns the first validation error found.
    pub fn validate(&self) -> Result<(String, f64, f64, u16)> {
        let name = validate_name(&self.name)?;
        let lat = validate_latitude(self.lat)?;
        let lon = validate_longitude(self.lon)?;
        let aqi = validate_aqi(self.aqi)?;
        Ok((name, lat, lon, aqi))
    }

    /// Build a custom location record with the given id and timestamp.
    ///
    /// # Errors
    ///
    /// Returns a validation error if any field is out of range.
    pub fn into_location(self, id: String, now: DateTime<Utc>) -> Result<Location> {
        let (name, lat, lon, aqi) = self.validate()?;
        let estimate = PollutantEstimate::from_aqi(aqi);
        let device_id = id.split('#').next().map(str::to_string);
        Ok(Location {
            id,
            name,
            lat,
            lon,
            aqi,
            status: AqiStatus::classify(aqi),
            timestamp: now,
            primary_pollutant: estimate.name.to_string(),
            pollutant_value: estimate.value,
            co_value: estimate.co_value,
            pm25_value: estimate.pm25_value,
            is_custom: true,
            device_id,
        })
    }
}

impl Location {
    /// Merge `update` into a copy of this record.
    ///
    /// All merged fields are validated before anything is returned. The status
    /// is recomputed from the merged AQI and the timestamp set to `now`.
    ///
    /// # Errors
    ///
    /// Returns the first validation error found.
    pub fn merged(&self, update: &LocationUpdate, now: DateTime<Utc>) -> Result<Self> {
        let mut next = self.clone();

        if let Some(name) = &update.name {
            next.name = validate_name(name)?;
        }
        if let Some(lat) = update.lat {
            next.lat = validate_latitude(lat)?;
        }
        if let Some(lon) = update.lon {
            next.lon = validate_longitude(lon)?;
        }
        if let Some(aqi) = update.aqi {
            next.aqi = validate_aqi(aqi)?;
        }
        if let Some(co) = update.co_value {
            next.co_value = format!("{:.2}", validate_concentration("co_value", "CO", co)?);
        }
        if let Some(pm25) = update.pm25_value {
            next.pm25_value = format!(
                "{:.1}",
                validate_concentration("pm25_value", "PM2.5", pm25)?
            );
        }

        next.status = AqiStatus::classify(next.aqi);
        next.timestamp = now;
        Ok(next)
    }

    /// The date part of the id, when the id is a derived one.
    #[must_use]
    pub fn id_date(&self) -> Option<NaiveDate> {
        let (_, date) = self.id.split_once('#')?;
        NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
    }
}

/// The built-in monitoring locations.
#[must_use]
pub fn seed_locations(now: DateTime<Utc>) -> Vec<Location> {
    vec![
        Location {
            id: "RSU1#2025-10-25".to_string(),
            name: "RSU Denpasar".to_string(),
            lat: -8.6705,
            lon: 115.2126,
            aqi: 45,
            status: AqiStatus::Good,
            timestamp: now,
            primary_pollutant: "CO".to_string(),
            pollutant_value: "0.5".to_string(),
            co_value: "0.5".to_string(),
            pm25_value: "12.3".to_string(),
            is_custom: false,
            device_id: Some("RSU1".to_string()),
        },
        Location {
            id: "RSU2#2025-10-25".to_string(),
            name: "RSU Badung".to_string(),
            lat: -8.5925,
            lon: 115.1631,
            aqi: 78,
            status: AqiStatus::Moderate,
            timestamp: now,
            primary_pollutant: "PM2.5".to_string(),
            pollutant_value: "25.6".to_string(),
            co_value: "0.8".to_string(),
            pm25_value: "25.6".to_string(),
            is_custom: false,
            device_id: Some("RSU2".to_string()),
        },
    ]
}
