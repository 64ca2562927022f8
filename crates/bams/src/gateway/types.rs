//! Wire types and helpers for the remote data API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::aqi::AqiStatus;
use crate::location::LocationUpdate;

/// Body of a login request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Login name.
    pub username: String,
    /// Plain-text password.
    pub password: String,
}

/// Body of a login response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Server message.
    #[serde(default)]
    pub message: String,
    /// Session token on success.
    #[serde(default)]
    pub token: Option<String>,
    /// Canonical username, when the server reports one.
    #[serde(default)]
    pub username: Option<String>,
    /// Role label assigned by the server.
    #[serde(default)]
    pub role: Option<String>,
    /// Permission names granted by the server.
    #[serde(default)]
    pub permissions: Option<Vec<String>>,
}

/// Reading fields to change on the remote record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReadingUpdates {
    /// New AQI.
    #[serde(rename = "AQI", skip_serializing_if = "Option::is_none")]
    pub aqi: Option<u16>,
    /// New latitude.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    /// New longitude.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    /// New CO reading in ppm.
    #[serde(rename = "MQ7", skip_serializing_if = "Option::is_none")]
    pub mq7: Option<f64>,
    /// New PM2.5 reading in µg/m³.
    #[serde(rename = "GP2Y1010", skip_serializing_if = "Option::is_none")]
    pub gp2y1010: Option<f64>,
}

impl ReadingUpdates {
    /// Translate a validated location edit into remote reading fields.
    ///
    /// `aqi` must already have been range-checked; the name has no remote
    /// counterpart and is dropped.
    #[must_use]
    pub fn from_location_update(update: &LocationUpdate, aqi: Option<u16>) -> Self {
        Self {
            aqi,
            latitude: update.lat,
            longitude: update.lon,
            mq7: update.co_value,
            gp2y1010: update.pm25_value,
        }
    }
}

/// Body of an update request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateDataRequest {
    /// Always `"update"`.
    pub action: String,
    /// Session token.
    pub token: String,
    /// Record key, `<Device>#<YYYY-MM-DD>`.
    #[serde(rename = "DeviceID_Tanggal")]
    pub device_id_date: String,
    /// Reading time.
    #[serde(rename = "Timestamp")]
    pub timestamp: DateTime<Utc>,
    /// Fields to change.
    pub updates: ReadingUpdates,
}

impl UpdateDataRequest {
    /// Build an update request.
    #[must_use]
    pub fn new(
        token: impl Into<String>,
        device_id_date: impl Into<String>,
        timestamp: DateTime<Utc>,
        updates: ReadingUpdates,
    ) -> Self {
        Self {
            action: "update".to_string(),
            token: token.into(),
            device_id_date: device_id_date.into(),
            timestamp,
            updates,
        }
    }
}

/// Body of a delete request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteDataRequest {
    /// Always `"delete"`.
    pub action: String,
    /// Session token.
    pub token: String,
    /// Record key, `<Device>#<YYYY-MM-DD>`.
    #[serde(rename = "DeviceID_Tanggal")]
    pub device_id_date: String,
    /// Reading time of the record.
    #[serde(rename = "Timestamp")]
    pub timestamp: DateTime<Utc>,
}

impl DeleteDataRequest {
    /// Build a delete request.
    #[must_use]
    pub fn new(
        token: impl Into<String>,
        device_id_date: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            action: "delete".to_string(),
            token: token.into(),
            device_id_date: device_id_date.into(),
            timestamp,
        }
    }
}

/// Filter for the reading listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryQuery {
    /// Day to list, `YYYY-MM-DD`.
    pub date: Option<String>,
    /// Aggregation period such as `hour`, `day` or `week`.
    pub period: Option<String>,
    /// 1-based page number.
    pub page: Option<u32>,
}

impl HistoryQuery {
    /// Query parameters with empty values left out.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(date) = self.date.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            pairs.push(("date", date.to_string()));
        }
        if let Some(period) = self.period.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            pairs.push(("period", period.to_string()));
        }
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        pairs
    }
}

/// One sensor reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceReading {
    /// Device identifier.
    #[serde(rename = "DeviceID")]
    pub device_id: String,
    /// Record key, when the server reports it.
    #[serde(
        rename = "DeviceID_Tanggal",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub device_id_date: Option<String>,
    /// Reading time as sent by the server.
    #[serde(rename = "Timestamp", default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Air quality index.
    #[serde(rename = "AQI")]
    pub aqi: f64,
    /// CO concentration in ppm.
    #[serde(rename = "MQ7", default)]
    pub mq7: f64,
    /// PM2.5 concentration in µg/m³.
    #[serde(rename = "GP2Y1010", default)]
    pub gp2y1010: f64,
    /// Latitude.
    #[serde(default)]
    pub latitude: f64,
    /// Longitude.
    #[serde(default)]
    pub longitude: f64,
}

impl DeviceReading {
    /// The AQI rounded to an index value.
    ///
    /// Sensor readings are not range-checked, so values past the top of the
    /// scale are kept and saturate at `u16::MAX`. Negative or non-finite
    /// readings have no index.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn aqi_index(&self) -> Option<u16> {
        let rounded = self.aqi.round();
        if rounded.is_finite() && rounded >= 0.0 {
            Some(rounded.min(f64::from(u16::MAX)) as u16)
        } else {
            None
        }
    }

    /// The band of this reading.
    #[must_use]
    pub fn status(&self) -> Option<AqiStatus> {
        self.aqi_index().map(AqiStatus::classify)
    }
}

/// One page of readings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPage {
    /// Readings on this page.
    pub items: Vec<DeviceReading>,
    /// Total readings across all pages.
    pub total: usize,
    /// This page's number.
    pub page: u32,
    /// Whether another page follows.
    pub has_more: bool,
}

/// Interpret a response body: JSON when it parses, the raw text otherwise,
/// `null` when empty.
#[must_use]
pub fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

/// The message to surface for a failed response.
///
/// Uses the body's `message` field when present, `HTTP <status>` otherwise.
#[must_use]
pub fn error_message(status: u16, body: &Value) -> String {
    body.get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .map_or_else(|| format!("HTTP {status}"), str::to_string)
}

/// Append `pairs` to `url` as an encoded query string.
#[must_use]
pub fn with_query(url: &str, pairs: &[(&str, String)]) -> String {
    if pairs.is_empty() {
        return url.to_string();
    }
    let query = pairs
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}{query}")
}

/// Wrap `target` for the development proxy: `<proxy>/?url=<encoded target>`.
#[must_use]
pub fn proxied_url(proxy: &str, target: &str) -> String {
    format!(
        "{}/?url={}",
        proxy.trim_end_matches('/'),
        urlencoding::encode(target)
    )
}
