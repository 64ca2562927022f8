//! Summary statistics over the location set.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::aqi::AqiStatus;
use crate::location::Location;
use crate::recommendations::RecommendationBook;

/// Number of tips shown in the daily health tips.
pub const TIPS_SHOWN: usize = 3;

/// How many locations fall into one band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusShare {
    /// The band.
    pub status: AqiStatus,
    /// Locations in the band.
    pub count: usize,
    /// Rounded share of all locations, in percent.
    pub percentage: u32,
}

/// AQI statistics for a set of locations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AqiStatistics {
    /// Rounded mean AQI, 0 for an empty set.
    pub average: u16,
    /// Lowest AQI, 0 for an empty set.
    pub min: u16,
    /// Highest AQI, 0 for an empty set.
    pub max: u16,
    /// Number of locations.
    pub total: usize,
    /// Bands present in the set, mildest first.
    pub distribution: Vec<StatusShare>,
}

/// Tips for the current average air quality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthTips {
    /// Band of the average AQI.
    pub status: AqiStatus,
    /// The average AQI the tips are for.
    pub average: u16,
    /// At most [`TIPS_SHOWN`] tips.
    pub tips: Vec<String>,
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn rounded_ratio(numerator: u64, denominator: u64) -> u64 {
    if denominator == 0 {
        return 0;
    }
    (numerator as f64 / denominator as f64).round() as u64
}

/// Compute statistics for `locations`.
pub fn statistics<'a>(locations: impl IntoIterator<Item = &'a Location>) -> AqiStatistics {
    let values: Vec<&Location> = locations.into_iter().collect();
    if values.is_empty() {
        return AqiStatistics::default();
    }

    let total = values.len();
    let sum: u64 = values.iter().map(|l| u64::from(l.aqi)).sum();
    let average = u16::try_from(rounded_ratio(sum, total as u64)).unwrap_or(u16::MAX);
    let min = values.iter().map(|l| l.aqi).min().unwrap_or(0);
    let max = values.iter().map(|l| l.aqi).max().unwrap_or(0);

    let mut counts: BTreeMap<AqiStatus, usize> = BTreeMap::new();
    for location in &values {
        *counts.entry(location.status).or_default() += 1;
    }
    let distribution = counts
        .into_iter()
        .map(|(status, count)| StatusShare {
            status,
            count,
            percentage: u32::try_from(rounded_ratio(count as u64 * 100, total as u64))
                .unwrap_or(100),
        })
        .collect();

    AqiStatistics {
        average,
        min,
        max,
        total,
        distribution,
    }
}

/// Pick tips for the average AQI of `locations` from `book`.
///
/// Falls back to the mildest band when no entry covers the average.
pub fn health_tips<'a>(
    locations: impl IntoIterator<Item = &'a Location>,
    book: &RecommendationBook,
) -> HealthTips {
    let average = statistics(locations).average;
    match book.for_aqi(average) {
        Some(entry) => HealthTips {
            status: entry.status,
            average,
            tips: entry.recommendations.iter().take(TIPS_SHOWN).cloned().collect(),
        },
        None => HealthTips {
            status: AqiStatus::Good,
            average,
            tips: Vec::new(),
        },
    }
}
