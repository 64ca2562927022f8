//! Editable health recommendations.
//!
//! The book starts from the built-in band table in [`crate::aqi`]. Operators
//! may edit the texts and colors of a band. Moving a band's bound moves the
//! adjacent bound of its neighbour with it, and the edit is accepted only if
//! the six bands still partition `0..=500`.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::aqi::{AqiStatus, AQI_MAX, AQI_MIN};
use crate::error::{Error, Result};

/// Health recommendations attached to one AQI band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthRecommendation {
    /// Stable identifier (`"1"` through `"6"` for the built-in bands).
    pub id: String,
    /// The band these recommendations apply to.
    pub status: AqiStatus,
    /// Lowest AQI of the band, inclusive.
    pub aqi_min: u16,
    /// Highest AQI of the band, inclusive.
    pub aqi_max: u16,
    /// Recommendation texts in display order.
    pub recommendations: Vec<String>,
    /// Display color as `#RRGGBB`.
    pub color: String,
}

impl HealthRecommendation {
    /// The built-in entry for `status`.
    #[must_use]
    pub fn builtin(status: AqiStatus) -> Self {
        let id = AqiStatus::ALL
            .iter()
            .position(|s| *s == status)
            .map_or(0, |idx| idx + 1);
        let range = status.range();
        Self {
            id: id.to_string(),
            status,
            aqi_min: *range.start(),
            aqi_max: *range.end(),
            recommendations: status
                .default_recommendations()
                .iter()
                .map(|text| (*text).to_string())
                .collect(),
            color: status.color().to_string(),
        }
    }

    /// Check whether `aqi` falls within this entry's range.
    #[must_use]
    pub fn contains(&self, aqi: u16) -> bool {
        (self.aqi_min..=self.aqi_max).contains(&aqi)
    }

    /// The human description of this entry's band.
    #[must_use]
    pub fn description(&self) -> &'static str {
        self.status.description()
    }
}

/// A partial edit to a [`HealthRecommendation`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationUpdate {
    /// Replacement recommendation texts.
    pub recommendations: Option<Vec<String>>,
    /// Replacement color.
    pub color: Option<String>,
    /// Replacement lower bound.
    pub aqi_min: Option<u16>,
    /// Replacement upper bound.
    pub aqi_max: Option<u16>,
}

impl RecommendationUpdate {
    /// Whether the update changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.recommendations.is_none()
            && self.color.is_none()
            && self.aqi_min.is_none()
            && self.aqi_max.is_none()
    }
}

fn color_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("static regex is valid"))
}

/// Validate a `#RRGGBB` color string.
///
/// # Errors
///
/// Returns a validation error naming the `color` field.
pub fn validate_color(color: &str) -> Result<()> {
    if color_pattern().is_match(color) {
        Ok(())
    } else {
        Err(Error::validation(
            "color",
            format!("Color must be in #RRGGBB form, got '{color}'"),
        ))
    }
}

/// Check that `entries` partition `0..=500` contiguously, in order.
///
/// # Errors
///
/// Returns a validation error describing the first gap or overlap.
pub fn validate_partition(entries: &[HealthRecommendation]) -> Result<()> {
    let mut expected = AQI_MIN;
    for entry in entries {
        if entry.aqi_min > entry.aqi_max {
            return Err(Error::validation(
                "aqi_range",
                format!(
                    "'{}' has an empty range {}-{}",
                    entry.status, entry.aqi_min, entry.aqi_max
                ),
            ));
        }
        if entry.aqi_min != expected {
            return Err(Error::validation(
                "aqi_range",
                format!(
                    "'{}' must start at {expected}, not {}",
                    entry.status, entry.aqi_min
                ),
            ));
        }
        expected = entry.aqi_max.saturating_add(1);
    }
    if expected != AQI_MAX + 1 {
        return Err(Error::validation(
            "aqi_range",
            format!("bands must end at {AQI_MAX}"),
        ));
    }
    Ok(())
}

/// The table of recommendation bands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationBook {
    entries: Vec<HealthRecommendation>,
}

impl Default for RecommendationBook {
    fn default() -> Self {
        Self {
            entries: AqiStatus::ALL
                .into_iter()
                .map(HealthRecommendation::builtin)
                .collect(),
        }
    }
}

impl RecommendationBook {
    /// Build a book from stored entries, validating the partition.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the entries do not cover `0..=500`.
    pub fn from_entries(mut entries: Vec<HealthRecommendation>) -> Result<Self> {
        entries.sort_by_key(|entry| entry.aqi_min);
        validate_partition(&entries)?;
        Ok(Self { entries })
    }

    /// All entries, ordered by range.
    #[must_use]
    pub fn entries(&self) -> &[HealthRecommendation] {
        &self.entries
    }

    /// The entry whose range contains `aqi`.
    ///
    /// Values above [`AQI_MAX`] get the last entry.
    #[must_use]
    pub fn for_aqi(&self, aqi: u16) -> Option<&HealthRecommendation> {
        let aqi = aqi.min(AQI_MAX);
        self.entries.iter().find(|entry| entry.contains(aqi))
    }

    /// The entry for a band.
    #[must_use]
    pub fn for_status(&self, status: AqiStatus) -> Option<&HealthRecommendation> {
        self.entries.iter().find(|entry| entry.status == status)
    }

    /// The entry with the given id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&HealthRecommendation> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    /// Merge `update` into the entry with `id`.
    ///
    /// Returns `Ok(None)` when no entry has that id. A new `aqi_min` also
    /// becomes the previous entry's `aqi_max` plus one, and a new `aqi_max`
    /// the next entry's `aqi_min` minus one. The book is left untouched if
    /// the merged result fails validation.
    ///
    /// # Errors
    ///
    /// Returns a validation error for malformed colors, empty recommendation
    /// lists, or ranges that break the partition.
    pub fn update(
        &mut self,
        id: &str,
        update: &RecommendationUpdate,
    ) -> Result<Option<HealthRecommendation>> {
        let Some(index) = self.entries.iter().position(|entry| entry.id == id) else {
            return Ok(None);
        };

        let mut merged = self.entries[index].clone();
        if let Some(texts) = &update.recommendations {
            let texts: Vec<String> = texts
                .iter()
                .map(|text| text.trim().to_string())
                .filter(|text| !text.is_empty())
                .collect();
            if texts.is_empty() {
                return Err(Error::validation(
                    "recommendations",
                    "At least one recommendation is required",
                ));
            }
            merged.recommendations = texts;
        }
        if let Some(color) = &update.color {
            validate_color(color)?;
            merged.color = color.to_uppercase();
        }
        if let Some(min) = update.aqi_min {
            merged.aqi_min = min;
        }
        if let Some(max) = update.aqi_max {
            merged.aqi_max = max;
        }

        let mut candidate = self.entries.clone();
        if update.aqi_min.is_some() && index > 0 {
            let Some(previous_max) = merged.aqi_min.checked_sub(1) else {
                return Err(Error::validation(
                    "aqi_range",
                    format!("'{}' would leave no room below it", merged.status),
                ));
            };
            candidate[index - 1].aqi_max = previous_max;
        }
        if update.aqi_max.is_some() {
            if let Some(next) = candidate.get_mut(index + 1) {
                next.aqi_min = merged.aqi_max.saturating_add(1);
            }
        }
        candidate[index] = merged.clone();
        validate_partition(&candidate)?;

        self.entries = candidate;
        Ok(Some(merged))
    }
}
