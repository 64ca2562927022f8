//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::location::{LocationUpdate, NewLocation};
use crate::recommendations::RecommendationUpdate;
use crate::settings::SettingsUpdate;

/// Login command arguments.
#[derive(Debug, Args)]
pub struct LoginCommand {
    /// Operator login name
    pub username: String,

    /// Password (read from stdin when omitted)
    #[arg(short, long)]
    pub password: Option<String>,
}

/// Location commands.
#[derive(Debug, Subcommand)]
pub enum LocationsCommand {
    /// List every monitoring location
    List {
        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Show one location
    Show {
        /// Location id, e.g. `RSU1#2025-10-25`
        id: String,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Add a custom location
    Add(AddLocationArgs),

    /// Edit a custom location
    Update(UpdateLocationArgs),

    /// Delete a custom location
    Delete {
        /// Location id
        id: String,

        /// Confirm the deletion
        #[arg(short, long)]
        yes: bool,
    },
}

/// Arguments for `locations add`.
#[derive(Debug, Args)]
pub struct AddLocationArgs {
    /// Display name
    pub name: String,

    /// Latitude in degrees
    #[arg(long, allow_hyphen_values = true)]
    pub lat: f64,

    /// Longitude in degrees
    #[arg(long, allow_hyphen_values = true)]
    pub lon: f64,

    /// Current AQI reading
    #[arg(long, allow_hyphen_values = true)]
    pub aqi: i32,
}

impl From<AddLocationArgs> for NewLocation {
    fn from(args: AddLocationArgs) -> Self {
        Self {
            name: args.name,
            lat: args.lat,
            lon: args.lon,
            aqi: args.aqi,
        }
    }
}

/// Arguments for `locations update`.
#[derive(Debug, Args)]
pub struct UpdateLocationArgs {
    /// Location id
    pub id: String,

    /// New display name
    #[arg(long)]
    pub name: Option<String>,

    /// New latitude
    #[arg(long, allow_hyphen_values = true)]
    pub lat: Option<f64>,

    /// New longitude
    #[arg(long, allow_hyphen_values = true)]
    pub lon: Option<f64>,

    /// New AQI reading
    #[arg(long, allow_hyphen_values = true)]
    pub aqi: Option<i32>,

    /// Measured CO concentration in ppm
    #[arg(long, allow_hyphen_values = true)]
    pub co: Option<f64>,

    /// Measured PM2.5 concentration in µg/m³
    #[arg(long, allow_hyphen_values = true)]
    pub pm25: Option<f64>,
}

impl UpdateLocationArgs {
    /// The field changes requested on the command line.
    #[must_use]
    pub fn to_update(&self) -> LocationUpdate {
        LocationUpdate {
            name: self.name.clone(),
            lat: self.lat,
            lon: self.lon,
            aqi: self.aqi,
            co_value: self.co,
            pm25_value: self.pm25,
        }
    }
}

/// Recommendation commands.
#[derive(Debug, Subcommand)]
pub enum RecommendationsCommand {
    /// List all recommendation bands
    List {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the band for an id or an AQI value
    Show {
        /// Band id
        #[arg(conflicts_with = "aqi", required_unless_present = "aqi")]
        id: Option<String>,

        /// Show the band covering this AQI instead
        #[arg(long)]
        aqi: Option<u16>,
    },

    /// Edit a recommendation band
    Edit(EditRecommendationArgs),
}

/// Arguments for `recommendations edit`.
#[derive(Debug, Args)]
pub struct EditRecommendationArgs {
    /// Band id
    pub id: String,

    /// Replace the tips (repeat for each tip)
    #[arg(short, long = "tip")]
    pub tips: Vec<String>,

    /// New `#RRGGBB` color
    #[arg(long)]
    pub color: Option<String>,

    /// New lower AQI bound; the previous band ends just below it
    #[arg(long)]
    pub min: Option<u16>,

    /// New upper AQI bound; the next band starts just above it
    #[arg(long)]
    pub max: Option<u16>,
}

impl EditRecommendationArgs {
    /// The band changes requested on the command line.
    #[must_use]
    pub fn to_update(&self) -> RecommendationUpdate {
        RecommendationUpdate {
            recommendations: (!self.tips.is_empty()).then(|| self.tips.clone()),
            color: self.color.clone(),
            aqi_min: self.min,
            aqi_max: self.max,
        }
    }
}

/// System settings commands.
#[derive(Debug, Subcommand)]
pub enum SettingsCommand {
    /// Show the current settings
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Change one or more settings
    Set(SetSettingsArgs),

    /// Restore default settings
    Reset {
        /// Confirm the reset
        #[arg(short, long)]
        yes: bool,
    },
}

/// Arguments for `settings set`.
#[derive(Debug, Args)]
pub struct SetSettingsArgs {
    /// Enable or disable periodic refresh
    #[arg(long)]
    pub auto_refresh: Option<bool>,

    /// Refresh interval in milliseconds
    #[arg(long)]
    pub refresh_interval: Option<u64>,

    /// Map marker radius
    #[arg(long)]
    pub map_radius: Option<f64>,

    /// Enable or disable notifications
    #[arg(long)]
    pub notifications: Option<bool>,

    /// Days of history to keep
    #[arg(long)]
    pub retention_days: Option<u32>,

    /// Remote API base URL
    #[arg(long)]
    pub api_endpoint: Option<String>,
}

impl SetSettingsArgs {
    /// The setting changes requested on the command line.
    #[must_use]
    pub fn to_update(&self) -> SettingsUpdate {
        SettingsUpdate {
            auto_refresh: self.auto_refresh,
            refresh_interval: self.refresh_interval,
            map_radius: self.map_radius,
            notifications_enabled: self.notifications,
            data_retention_days: self.retention_days,
            api_endpoint: self.api_endpoint.clone(),
        }
    }
}

/// Admin account commands.
#[derive(Debug, Subcommand)]
pub enum AdminsCommand {
    /// List admin accounts
    List,

    /// Create an admin account
    Add {
        /// Login name
        username: String,

        /// Password
        #[arg(short, long)]
        password: String,

        /// Permission to grant (repeat for each; e.g. `view`, `manage_locations`)
        #[arg(long = "permission")]
        permissions: Vec<String>,
    },

    /// Delete a custom admin account
    Delete {
        /// Login name
        username: String,
    },
}

/// History command arguments.
#[derive(Debug, Args)]
pub struct HistoryCommand {
    /// Day to list, as `YYYY-MM-DD`
    #[arg(short, long)]
    pub date: Option<String>,

    /// Aggregation period: `hour`, `day` or `week`
    #[arg(short, long, default_value = "day")]
    pub period: String,

    /// Page number
    #[arg(long)]
    pub page: Option<u32>,

    /// Show chart series for one device instead of the raw listing
    #[arg(long)]
    pub device: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Output format for listing commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Aligned table
    #[default]
    Table,
    /// JSON output
    Json,
}
