//! Reading history: chart labels and series.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, Timelike, TimeZone};
use serde::Serialize;

use crate::error::Error;
use crate::gateway::DeviceReading;

/// Aggregation period of a history view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Period {
    /// The last 24 hours, hourly.
    Hour,
    /// The last 7 days, daily.
    #[default]
    Day,
    /// The last 4 weeks, weekly.
    Week,
    /// Any other period: a fixed 24-slot clock face.
    Other,
}

impl Period {
    /// The wire name sent as the `period` query parameter.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Week => "week",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "hour" => Self::Hour,
            "day" => Self::Day,
            "week" => Self::Week,
            _ => Self::Other,
        })
    }
}

const WEEKDAYS_SHORT: [&str; 7] = ["Min", "Sen", "Sel", "Rab", "Kam", "Jum", "Sab"];

/// Chart x-axis labels for `period`, oldest first, ending at `now`.
#[must_use]
pub fn time_labels<Tz: TimeZone>(period: Period, now: &DateTime<Tz>) -> Vec<String> {
    match period {
        Period::Hour => (0..24)
            .rev()
            .map(|i| {
                let t = now.clone() - Duration::hours(i);
                format!("{:02}:00", t.hour())
            })
            .collect(),
        Period::Day => (0..7)
            .rev()
            .map(|i| {
                let t = now.clone() - Duration::days(i);
                let idx = t.weekday().num_days_from_sunday() as usize;
                WEEKDAYS_SHORT[idx].to_string()
            })
            .collect(),
        Period::Week => (1..=4).rev().map(|i| format!("Minggu {i}")).collect(),
        Period::Other => (0..24).rev().map(|i| format!("{i}:00")).collect(),
    }
}

/// Series for one device's chart.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartData {
    /// X-axis labels.
    pub labels: Vec<String>,
    /// PM2.5 concentrations in µg/m³.
    pub pm25: Vec<f64>,
    /// CO concentrations in ppm.
    pub co: Vec<f64>,
    /// Caption for the chart.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl ChartData {
    /// Build series from the readings of `device_id`, in the order given.
    ///
    /// Each reading is labelled with its time of day when the timestamp
    /// parses, or its raw timestamp otherwise.
    #[must_use]
    pub fn from_readings(device_id: &str, period: Period, readings: &[DeviceReading]) -> Self {
        let mut chart = Self {
            note: Some(format!("Data untuk perangkat {device_id} - {period}")),
            ..Self::default()
        };
        for reading in readings.iter().filter(|r| r.device_id == device_id) {
            let label = reading.timestamp.as_deref().map_or_else(String::new, |raw| {
                DateTime::parse_from_rfc3339(raw)
                    .map_or_else(|_| raw.to_string(), |t| t.format("%H:%M").to_string())
            });
            chart.labels.push(label);
            chart.pm25.push(reading.gp2y1010);
            chart.co.push(reading.mq7);
        }
        chart
    }

    /// Whether the chart has no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn at(rfc3339: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(rfc3339)
            .unwrap()
            .with_timezone(&Utc)
    }

    fn reading(device: &str, ts: &str, pm25: f64, co: f64) -> DeviceReading {
        DeviceReading {
            device_id: device.to_string(),
            device_id_date: None,
            timestamp: Some(ts.to_string()),
            aqi: 50.0,
            mq7: co,
            gp2y1010: pm25,
            latitude: 0.0,
            longitude: 0.0,
        }
    }

    #[test]
    fn test_hour_labels_end_now() {
        let labels = time_labels(Period::Hour, &at("2025-10-25T08:30:00Z"));
        assert_eq!(labels.len(), 24);
        assert_eq!(labels[0], "09:00");
        assert_eq!(labels[23], "08:00");
    }

    #[test]
    fn test_day_labels_end_today() {
        // 2025-10-25 is a Saturday.
        let labels = time_labels(Period::Day, &at("2025-10-25T08:30:00Z"));
        assert_eq!(labels, vec!["Min", "Sen", "Sel", "Rab", "Kam", "Jum", "Sab"]);
    }

    #[test]
    fn test_week_labels() {
        let labels = time_labels(Period::Week, &at("2025-10-25T08:30:00Z"));
        assert_eq!(labels, vec!["Minggu 4", "Minggu 3", "Minggu 2", "Minggu 1"]);
    }

    #[test]
    fn test_other_labels() {
        let labels = time_labels(Period::Other, &at("2025-10-25T08:30:00Z"));
        assert_eq!(labels.len(), 24);
        assert_eq!(labels[0], "23:00");
        assert_eq!(labels[23], "0:00");
    }

    #[test]
    fn test_period_parse() {
        assert_eq!("hour".parse::<Period>().unwrap(), Period::Hour);
        assert_eq!(" WEEK ".parse::<Period>().unwrap(), Period::Week);
        assert_eq!("month".parse::<Period>().unwrap(), Period::Other);
        assert_eq!(Period::default(), Period::Day);
    }

    #[test]
    fn test_chart_from_readings_filters_device() {
        let readings = vec![
            reading("RSU1", "2025-10-25T07:00:00Z", 12.3, 0.5),
            reading("RSU2", "2025-10-25T07:00:00Z", 25.6, 0.8),
            reading("RSU1", "2025-10-25T08:00:00Z", 14.0, 0.6),
        ];
        let chart = ChartData::from_readings("RSU1", Period::Hour, &readings);

        assert_eq!(chart.labels, vec!["07:00", "08:00"]);
        assert_eq!(chart.pm25, vec![12.3, 14.0]);
        assert_eq!(chart.co, vec![0.5, 0.6]);
        assert_eq!(chart.note.as_deref(), Some("Data untuk perangkat RSU1 - hour"));
    }

    #[test]
    fn test_chart_unparsable_timestamp_kept_raw() {
        let readings = vec![reading("RSU3", "kemarin", 1.0, 2.0)];
        let chart = ChartData::from_readings("RSU3", Period::Day, &readings);
        assert_eq!(chart.labels, vec!["kemarin"]);
    }

    #[test]
    fn test_chart_empty_for_unknown_device() {
        let chart = ChartData::from_readings("RSU9", Period::Day, &[]);
        assert!(chart.is_empty());
        assert!(chart.note.is_some());
    }
}
