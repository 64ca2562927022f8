//! AQI status bands.
//!
//! Six named bands partition the index range `0..=500` with inclusive bounds
//! on both ends. Readings past the top of the scale stay in the most severe
//! band. Classification is a pure lookup; range checking of user input
//! happens at the input boundary, not here.

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Lowest valid AQI.
pub const AQI_MIN: u16 = 0;

/// Highest AQI accepted from operator input.
pub const AQI_MAX: u16 = 500;

/// An air-quality status band.
///
/// Serialized as its display label, which is also the form stored in
/// location records and sent by the remote API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AqiStatus {
    /// 0–50.
    #[serde(rename = "Baik")]
    Good,
    /// 51–100.
    #[serde(rename = "Sedang")]
    Moderate,
    /// 101–150.
    #[serde(rename = "Tidak Sehat bagi Kelompok Sensitif")]
    UnhealthyForSensitive,
    /// 151–200.
    #[serde(rename = "Tidak Sehat")]
    Unhealthy,
    /// 201–300.
    #[serde(rename = "Sangat Tidak Sehat")]
    VeryUnhealthy,
    /// 301–500.
    #[serde(rename = "Berbahaya")]
    Hazardous,
}

impl AqiStatus {
    /// All bands in ascending order of severity.
    pub const ALL: [Self; 6] = [
        Self::Good,
        Self::Moderate,
        Self::UnhealthyForSensitive,
        Self::Unhealthy,
        Self::VeryUnhealthy,
        Self::Hazardous,
    ];

    /// Classify an AQI value.
    ///
    /// Values above [`AQI_MAX`] are [`AqiStatus::Hazardous`].
    #[must_use]
    pub fn classify(aqi: u16) -> Self {
        Self::ALL
            .into_iter()
            .find(|status| status.range().contains(&aqi))
            .unwrap_or(Self::Hazardous)
    }

    /// The display label of this band.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Good => "Baik",
            Self::Moderate => "Sedang",
            Self::UnhealthyForSensitive => "Tidak Sehat bagi Kelompok Sensitif",
            Self::Unhealthy => "Tidak Sehat",
            Self::VeryUnhealthy => "Sangat Tidak Sehat",
            Self::Hazardous => "Berbahaya",
        }
    }

    /// The inclusive AQI range covered by this band.
    #[must_use]
    pub const fn range(self) -> RangeInclusive<u16> {
        match self {
            Self::Good => 0..=50,
            Self::Moderate => 51..=100,
            Self::UnhealthyForSensitive => 101..=150,
            Self::Unhealthy => 151..=200,
            Self::VeryUnhealthy => 201..=300,
            Self::Hazardous => 301..=AQI_MAX,
        }
    }

    /// The display color of this band as `#RRGGBB`.
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::Good => "#22C55E",
            Self::Moderate => "#FACC15",
            Self::UnhealthyForSensitive => "#FB923C",
            Self::Unhealthy => "#EF4444",
            Self::VeryUnhealthy => "#A855F7",
            Self::Hazardous => "#DC2626",
        }
    }

    /// A one-line human description of the band.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Good => "Kondisi udara sangat baik untuk semua aktivitas",
            Self::Moderate => "Kelompok sensitif mungkin mengalami iritasi ringan",
            Self::UnhealthyForSensitive => "Kelompok sensitif harus membatasi aktivitas luar",
            Self::Unhealthy => "Semua orang mungkin mengalami efek kesehatan",
            Self::VeryUnhealthy => "Peringatan kesehatan serius - hindari aktivitas luar",
            Self::Hazardous => "KRITIS: Kondisi darurat kesehatan masyarakat",
        }
    }

    /// The built-in recommendation texts for this band, in display order.
    #[must_use]
    pub const fn default_recommendations(self) -> &'static [&'static str] {
        match self {
            Self::Good => &[
                "Kondisi udara sangat baik untuk semua aktivitas luar",
                "Ideal untuk olahraga dan aktivitas outdoor",
                "Jendela dapat dibuka untuk ventilasi alami",
            ],
            Self::Moderate => &[
                "Kelompok sensitif mungkin mengalami iritasi ringan",
                "Tetap dapat beraktivitas normal",
                "Perhatikan gejala pernapasan pada kelompok sensitif",
            ],
            Self::UnhealthyForSensitive => &[
                "Kelompok sensitif harus membatasi aktivitas luar",
                "Anak-anak, lansia, dan penderita penyakit pernapasan harus berhati-hati",
                "Kurangi aktivitas fisik berat di luar ruangan",
            ],
            Self::Unhealthy => &[
                "Semua orang mungkin mengalami efek kesehatan",
                "Hindari aktivitas luar yang berlebihan",
                "Gunakan masker jika harus keluar ruangan",
            ],
            Self::VeryUnhealthy => &[
                "Peringatan kesehatan serius - hindari aktivitas luar",
                "Tetap di dalam ruangan dengan ventilasi yang baik",
                "Gunakan air purifier jika memungkinkan",
            ],
            Self::Hazardous => &[
                "KRITIS: Kondisi darurat kesehatan masyarakat",
                "Hindari semua aktivitas luar",
                "Gunakan masker N95 jika harus keluar",
                "Segera cari pertolongan medis jika mengalami sesak napas",
            ],
        }
    }
}

impl fmt::Display for AqiStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AqiStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.label().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| Error::validation("status", format!("unknown AQI status: {s}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_value_has_exactly_one_band() {
        for aqi in AQI_MIN..=AQI_MAX {
            let matching = AqiStatus::ALL
                .iter()
                .filter(|status| status.range().contains(&aqi))
                .count();
            assert_eq!(matching, 1, "AQI {aqi} matched {matching} bands");
            assert!(AqiStatus::classify(aqi).range().contains(&aqi));
        }
    }

    #[test]
    fn test_band_boundaries_inclusive() {
        assert_eq!(AqiStatus::classify(0), AqiStatus::Good);
        assert_eq!(AqiStatus::classify(50), AqiStatus::Good);
        assert_eq!(AqiStatus::classify(51), AqiStatus::Moderate);
        assert_eq!(AqiStatus::classify(100), AqiStatus::Moderate);
        assert_eq!(
            AqiStatus::classify(101),
            AqiStatus::UnhealthyForSensitive
        );
        assert_eq!(
            AqiStatus::classify(150),
            AqiStatus::UnhealthyForSensitive
        );
        assert_eq!(AqiStatus::classify(151), AqiStatus::Unhealthy);
        assert_eq!(AqiStatus::classify(200), AqiStatus::Unhealthy);
        assert_eq!(AqiStatus::classify(201), AqiStatus::VeryUnhealthy);
        assert_eq!(AqiStatus::classify(300), AqiStatus::VeryUnhealthy);
        assert_eq!(AqiStatus::classify(301), AqiStatus::Hazardous);
        assert_eq!(AqiStatus::classify(500), AqiStatus::Hazardous);
    }

    #[test]
    fn test_above_max_is_hazardous() {
        assert_eq!(AqiStatus::classify(501), AqiStatus::Hazardous);
        assert_eq!(AqiStatus::classify(u16::MAX), AqiStatus::Hazardous);
    }

    #[test]
    fn test_bands_are_contiguous() {
        let mut expected_start = AQI_MIN;
        for status in AqiStatus::ALL {
            let range = status.range();
            assert_eq!(*range.start(), expected_start, "gap before {status}");
            expected_start = range.end() + 1;
        }
        assert_eq!(expected_start, AQI_MAX + 1);
    }

    #[test]
    fn test_labels() {
        assert_eq!(AqiStatus::Good.to_string(), "Baik");
        assert_eq!(
            AqiStatus::UnhealthyForSensitive.to_string(),
            "Tidak Sehat bagi Kelompok Sensitif"
        );
        assert_eq!(AqiStatus::Hazardous.to_string(), "Berbahaya");
    }

    #[test]
    fn test_from_str() {
        assert_eq!("Sedang".parse::<AqiStatus>().unwrap(), AqiStatus::Moderate);
        assert_eq!(
            " tidak sehat ".parse::<AqiStatus>().unwrap(),
            AqiStatus::Unhealthy
        );
        assert!("Lumayan".parse::<AqiStatus>().is_err());
    }

    #[test]
    fn test_serde_uses_label() {
        let json = serde_json::to_string(&AqiStatus::VeryUnhealthy).unwrap();
        assert_eq!(json, "\"Sangat Tidak Sehat\"");

        let status: AqiStatus = serde_json::from_str("\"Baik\"").unwrap();
        assert_eq!(status, AqiStatus::Good);
    }

    #[test]
    fn test_colors_are_hex() {
        for status in AqiStatus::ALL {
            let color = status.color();
            assert_eq!(color.len(), 7);
            assert!(color.starts_with('#'));
            assert!(color[1..].chars().all(|c| c.is_ascii_hexdigit()));
        }
    }

    #[test]
    fn test_recommendations_not_empty() {
        for status in AqiStatus::ALL {
            assert!(!status.default_recommendations().is_empty());
            assert!(!status.description().is_empty());
        }
        assert_eq!(AqiStatus::Hazardous.default_recommendations().len(), 4);
    }

    #[test]
    fn test_ordering_follows_severity() {
        assert!(AqiStatus::Good < AqiStatus::Moderate);
        assert!(AqiStatus::VeryUnhealthy < AqiStatus::Hazardous);
    }
}
