//! `bams` - Core of the Bali air-quality monitoring dashboard
//!
//! This library provides AQI classification, the monitoring location
//! registry, health recommendations, operator sessions and the gateway to the
//! remote sensor-data API, all owned by a single [`Dashboard`] context.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod accounts;
pub mod aqi;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod events;
pub mod gateway;
pub mod history;
pub mod insights;
pub mod location;
pub mod logging;
pub mod notify;
pub mod recommendations;
pub mod refresh;
pub mod registry;
pub mod session;
pub mod settings;
pub mod storage;

pub use aqi::AqiStatus;
pub use config::Config;
pub use dashboard::Dashboard;
pub use error::{Error, Result};
pub use events::AppEvent;
pub use gateway::{DataGateway, HttpGateway, OfflineGateway};
pub use location::{Location, LocationUpdate, NewLocation};
pub use logging::init_logging;
pub use notify::NotificationKind;
pub use recommendations::{HealthRecommendation, RecommendationBook, RecommendationUpdate};
pub use session::{Admin, Permission, Session};
pub use settings::{SettingsUpdate, SystemSettings};
pub use storage::{Storage, StorageStats};
