//! Command-line interface for bams.
//!
//! This module provides the CLI structure for the `bams` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    AddLocationArgs, AdminsCommand, ConfigCommand, EditRecommendationArgs, HistoryCommand,
    LocationsCommand, LoginCommand, OutputFormat, RecommendationsCommand, SetSettingsArgs,
    SettingsCommand, StatusCommand, UpdateLocationArgs,
};

use crate::logging::Verbosity;

/// bams - Bali air-quality monitoring dashboard
///
/// Manage monitoring locations, health recommendations and dashboard
/// settings, and inspect readings from the monitoring devices.
#[derive(Debug, Parser)]
#[command(name = "bams")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in as an operator
    Login(LoginCommand),

    /// End the current session
    Logout,

    /// Show the logged-in operator
    Whoami {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Manage monitoring locations
    #[command(subcommand)]
    Locations(LocationsCommand),

    /// Manage health recommendations
    #[command(subcommand)]
    Recommendations(RecommendationsCommand),

    /// View or change system settings
    #[command(subcommand)]
    Settings(SettingsCommand),

    /// Manage admin accounts
    #[command(subcommand)]
    Admins(AdminsCommand),

    /// Show AQI statistics and health tips
    Insights {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// List device readings
    History(HistoryCommand),

    /// Refresh periodically and print statistics until interrupted
    Watch,

    /// Show local store status
    Status(StatusCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.verbose)
    }
}
