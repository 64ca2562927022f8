//! `bams` - CLI for the air-quality dashboard
//!
//! This binary is the operator surface over the dashboard core: session
//! management, location and recommendation editing, settings, and read-only
//! views of statistics and device history.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::io::{self, BufRead};

use anyhow::{bail, Context};
use clap::Parser;
use tokio::sync::mpsc::UnboundedReceiver;

use bams::accounts::NewAccount;
use bams::cli::{
    AdminsCommand, Cli, Command, ConfigCommand, HistoryCommand, LocationsCommand, LoginCommand,
    OutputFormat, RecommendationsCommand, SettingsCommand,
};
use bams::gateway::HistoryQuery;
use bams::history::Period;
use bams::{
    init_logging, AppEvent, Config, Dashboard, HealthRecommendation, Location, NotificationKind,
    Permission, Storage,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone())?;

    match cli.command {
        Command::Config(config_cmd) => handle_config(&config, config_cmd),
        Command::Status(status_cmd) => handle_status(&config, status_cmd.json),
        command => {
            let mut dashboard = Dashboard::open(&config).context("failed to open dashboard")?;
            let mut events = dashboard.subscribe();
            let result = run(&mut dashboard, command).await;
            print_notifications(&mut events);
            result
        }
    }
}

async fn run(dashboard: &mut Dashboard, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Login(cmd) => handle_login(dashboard, cmd).await,
        Command::Logout => {
            dashboard.logout()?;
            println!("Logged out.");
            Ok(())
        }
        Command::Whoami { json } => handle_whoami(dashboard, json),
        Command::Locations(cmd) => handle_locations(dashboard, cmd).await,
        Command::Recommendations(cmd) => handle_recommendations(dashboard, cmd),
        Command::Settings(cmd) => handle_settings(dashboard, cmd),
        Command::Admins(cmd) => handle_admins(dashboard, cmd),
        Command::Insights { json } => handle_insights(dashboard, json),
        Command::History(cmd) => handle_history(dashboard, cmd).await,
        Command::Watch => handle_watch(dashboard).await,
        Command::Status(_) | Command::Config(_) => unreachable!("handled before opening"),
    }
}

/// Print the non-error notifications raised by a command.
///
/// Failures reach the operator through the returned error instead.
fn print_notifications(events: &mut UnboundedReceiver<AppEvent>) {
    while let Ok(event) = events.try_recv() {
        if let AppEvent::ShowNotification { kind, .. } = &event {
            if *kind != NotificationKind::Error {
                println!("{event}");
            }
        }
    }
}

async fn handle_login(dashboard: &mut Dashboard, cmd: LoginCommand) -> anyhow::Result<()> {
    let password = match cmd.password {
        Some(password) => password,
        None => {
            let mut line = String::new();
            io::stdin()
                .lock()
                .read_line(&mut line)
                .context("failed to read password")?;
            line.trim_end_matches(['\r', '\n']).to_string()
        }
    };

    if !dashboard.login(&cmd.username, &password).await {
        bail!("login failed for {}", cmd.username);
    }
    println!("Logged in as {}.", cmd.username);
    Ok(())
}

fn handle_whoami(dashboard: &Dashboard, json: bool) -> anyhow::Result<()> {
    let Some(admin) = dashboard.session().current() else {
        println!("Not logged in.");
        return Ok(());
    };
    if json {
        let permissions = admin.permission_names();
        let out = serde_json::json!({
            "username": admin.username,
            "role": admin.role,
            "permissions": permissions,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("Username:    {}", admin.username);
        println!("Role:        {}", admin.role.as_deref().unwrap_or("-"));
        println!("Permissions: {}", admin.permission_names().join(", "));
    }
    Ok(())
}

fn print_location_table<'a>(locations: impl IntoIterator<Item = &'a Location>) {
    println!(
        "{:<28} {:<24} {:>4}  {:<36} {:<6} {:>10} {:>10}",
        "ID", "NAME", "AQI", "STATUS", "PRIM.", "LAT", "LON"
    );
    for l in locations {
        println!(
            "{:<28} {:<24} {:>4}  {:<36} {:<6} {:>10.4} {:>10.4}{}",
            l.id,
            l.name,
            l.aqi,
            l.status,
            l.primary_pollutant,
            l.lat,
            l.lon,
            if l.is_custom { "" } else { "  (built-in)" }
        );
    }
}

fn print_location(l: &Location) {
    println!("ID:         {}", l.id);
    println!("Name:       {}", l.name);
    println!("Position:   {}, {}", l.lat, l.lon);
    println!("AQI:        {} ({})", l.aqi, l.status);
    println!("Pollutant:  {} {}", l.primary_pollutant, l.pollutant_value);
    println!("CO:         {} ppm", l.co_value);
    println!("PM2.5:      {} µg/m³", l.pm25_value);
    println!("Updated:    {}", l.timestamp.to_rfc3339());
    if let Some(device) = &l.device_id {
        println!("Device:     {device}");
    }
}

async fn handle_locations(dashboard: &mut Dashboard, cmd: LocationsCommand) -> anyhow::Result<()> {
    match cmd {
        LocationsCommand::List { format } => match format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&dashboard.locations())?);
            }
            OutputFormat::Table => print_location_table(dashboard.locations()),
        },
        LocationsCommand::Show { id, json } => {
            let Some(location) = dashboard.location(&id) else {
                bail!("location {id} not found");
            };
            if json {
                println!("{}", serde_json::to_string_pretty(location)?);
            } else {
                print_location(location);
            }
        }
        LocationsCommand::Add(args) => {
            let location = dashboard.add_location(args.into()).await?;
            print_location(&location);
        }
        LocationsCommand::Update(args) => {
            let update = args.to_update();
            if update.is_empty() {
                bail!("nothing to update; pass at least one field");
            }
            match dashboard.update_location(&args.id, &update).await? {
                Some(location) => print_location(&location),
                None => bail!("location {} not found", args.id),
            }
        }
        LocationsCommand::Delete { id, yes } => {
            if dashboard.location(&id).is_none() {
                bail!("location {id} not found");
            }
            let deleted = dashboard
                .delete_location(&id, |location| {
                    if !yes {
                        println!("This will delete \"{}\" ({}).", location.name, location.id);
                        println!("Use --yes to confirm.");
                    }
                    yes
                })
                .await?;
            if !deleted && yes {
                bail!("location {id} was not deleted");
            }
        }
    }
    Ok(())
}

fn print_recommendation(entry: &HealthRecommendation) {
    println!(
        "[{}] {} (AQI {}-{}, {})",
        entry.id, entry.status, entry.aqi_min, entry.aqi_max, entry.color
    );
    for tip in &entry.recommendations {
        println!("  - {tip}");
    }
}

fn handle_recommendations(
    dashboard: &mut Dashboard,
    cmd: RecommendationsCommand,
) -> anyhow::Result<()> {
    match cmd {
        RecommendationsCommand::List { json } => {
            let entries = dashboard.recommendations().entries();
            if json {
                println!("{}", serde_json::to_string_pretty(entries)?);
            } else {
                for entry in entries {
                    print_recommendation(entry);
                }
            }
        }
        RecommendationsCommand::Show { id, aqi } => {
            let entry = match (id, aqi) {
                (_, Some(aqi)) => dashboard.recommendation_for(aqi),
                (Some(id), None) => dashboard.recommendations().get(&id),
                (None, None) => None,
            };
            match entry {
                Some(entry) => print_recommendation(entry),
                None => bail!("no matching recommendation band"),
            }
        }
        RecommendationsCommand::Edit(args) => {
            let update = args.to_update();
            if update.is_empty() {
                bail!("nothing to update; pass --tip, --color, --min or --max");
            }
            match dashboard.update_recommendation(&args.id, &update)? {
                Some(entry) => print_recommendation(&entry),
                None => bail!("recommendation {} not found", args.id),
            }
        }
    }
    Ok(())
}

fn handle_settings(dashboard: &mut Dashboard, cmd: SettingsCommand) -> anyhow::Result<()> {
    let settings = match cmd {
        SettingsCommand::Show { json } => {
            let settings = dashboard.settings();
            if json {
                println!("{}", serde_json::to_string_pretty(settings)?);
                return Ok(());
            }
            settings.clone()
        }
        SettingsCommand::Set(args) => dashboard.update_settings(&args.to_update())?,
        SettingsCommand::Reset { yes } => {
            if !yes {
                println!("This will reset all system settings to defaults.");
                println!("Use --yes to confirm.");
                return Ok(());
            }
            dashboard.reset_settings()?
        }
    };

    println!("Auto-refresh:        {}", settings.auto_refresh);
    println!("Refresh interval:    {} ms", settings.refresh_interval);
    println!("Map radius:          {}", settings.map_radius);
    println!("Notifications:       {}", settings.notifications_enabled);
    println!("Data retention:      {} days", settings.data_retention_days);
    println!("API endpoint:        {}", settings.api_endpoint);
    Ok(())
}

fn handle_admins(dashboard: &mut Dashboard, cmd: AdminsCommand) -> anyhow::Result<()> {
    match cmd {
        AdminsCommand::List => {
            for admin in dashboard.admins() {
                println!(
                    "{:<20} {}",
                    admin.username,
                    admin.role.as_deref().unwrap_or("-")
                );
            }
        }
        AdminsCommand::Add {
            username,
            password,
            permissions,
        } => {
            let permissions = if permissions.is_empty() {
                Permission::OPERATOR_DEFAULT.to_vec()
            } else {
                permissions
                    .iter()
                    .map(|p| p.parse::<Permission>())
                    .collect::<bams::Result<Vec<_>>>()?
            };
            let admin = dashboard.add_admin(NewAccount {
                username,
                password,
                permissions,
            })?;
            println!("Created {}.", admin.username);
        }
        AdminsCommand::Delete { username } => {
            if !dashboard.remove_admin(&username)? {
                bail!("admin {username} not found");
            }
        }
    }
    Ok(())
}

fn handle_insights(dashboard: &Dashboard, json: bool) -> anyhow::Result<()> {
    let stats = dashboard.statistics();
    let tips = dashboard.health_tips();
    if json {
        let out = serde_json::json!({ "statistics": stats, "tips": tips });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("Locations:  {}", stats.total);
    println!("Average:    {}", stats.average);
    println!("Range:      {} - {}", stats.min, stats.max);
    println!();
    for share in &stats.distribution {
        println!(
            "  {:<36} {:>3} ({}%)",
            share.status.label(),
            share.count,
            share.percentage
        );
    }
    println!();
    println!("Health tips ({}):", tips.status);
    for tip in &tips.tips {
        println!("  - {tip}");
    }
    Ok(())
}

async fn handle_history(dashboard: &mut Dashboard, cmd: HistoryCommand) -> anyhow::Result<()> {
    let period: Period = cmd.period.parse()?;

    if let Some(device) = cmd.device {
        let chart = dashboard.chart(&device, cmd.date, period).await?;
        match cmd.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&chart)?),
            OutputFormat::Table => {
                if let Some(note) = &chart.note {
                    println!("{note}");
                }
                println!("{:<8} {:>10} {:>10}", "TIME", "PM2.5", "CO");
                for ((label, pm25), co) in chart.labels.iter().zip(&chart.pm25).zip(&chart.co) {
                    println!("{label:<8} {pm25:>10.1} {co:>10.2}");
                }
            }
        }
        return Ok(());
    }

    let query = HistoryQuery {
        date: cmd.date,
        period: Some(period.to_string()),
        page: cmd.page,
    };
    let page = dashboard.history(&query).await?;
    match cmd.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&page)?),
        OutputFormat::Table => {
            println!(
                "{:<8} {:>5} {:>8} {:>8} {:>10} {:>10}  TIMESTAMP",
                "DEVICE", "AQI", "MQ7", "PM2.5", "LAT", "LON"
            );
            for r in &page.items {
                println!(
                    "{:<8} {:>5} {:>8.2} {:>8.1} {:>10.4} {:>10.4}  {}",
                    r.device_id,
                    r.aqi_index().map_or_else(|| "-".to_string(), |a| a.to_string()),
                    r.mq7,
                    r.gp2y1010,
                    r.latitude,
                    r.longitude,
                    r.timestamp.as_deref().unwrap_or("-")
                );
            }
            println!();
            println!(
                "Page {} ({} readings{})",
                page.page,
                page.total,
                if page.has_more { ", more available" } else { "" }
            );
        }
    }
    Ok(())
}

fn print_summary(dashboard: &Dashboard) {
    let stats = dashboard.statistics();
    let at = dashboard
        .last_updated()
        .map_or_else(|| "-".to_string(), |t| t.format("%H:%M:%S").to_string());
    println!(
        "[{at}] {} locations, average AQI {} (min {}, max {})",
        stats.total, stats.average, stats.min, stats.max
    );
}

async fn handle_watch(dashboard: &mut Dashboard) -> anyhow::Result<()> {
    if !dashboard.start_auto_refresh()? {
        println!("Auto-refresh is disabled. Enable it with `bams settings set --auto-refresh true`.");
        return Ok(());
    }
    print_summary(dashboard);

    loop {
        let tick = tokio::select! {
            tick = dashboard.next_refresh() => tick,
            _ = tokio::signal::ctrl_c() => None,
        };
        if tick.is_none() {
            break;
        }
        dashboard.refresh()?;
        print_summary(dashboard);
    }

    dashboard.stop_auto_refresh();
    Ok(())
}

fn handle_status(config: &Config, json: bool) -> anyhow::Result<()> {
    let storage = Storage::open(config.database_path())?;
    let stats = storage.stats()?;
    let keys = storage.keys()?;
    let last_modified = stats.last_modified.map(|t| t.to_rfc3339());

    if json {
        let status = serde_json::json!({
            "database_path": storage.path(),
            "total_entries": stats.total_entries,
            "last_modified": last_modified,
            "db_size_bytes": stats.db_size_bytes,
            "keys": keys,
            "offline": config.api.offline,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("bams status");
        println!("-----------");
        println!("Database:      {}", storage.path().display());
        println!("Entries:       {}", stats.total_entries);
        println!("Last modified: {}", last_modified.as_deref().unwrap_or("never"));
        println!("Size:          {} bytes", stats.db_size_bytes);
        println!(
            "Gateway:       {}",
            if config.api.offline { "offline" } else { "http" }
        );
        for key in keys {
            println!("  {key}");
        }
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:  {}", config.database_path().display());
                println!();
                println!("[API]");
                println!("  Offline:        {}", config.api.offline);
                println!("  Login:          {}", config.api.login_url);
                println!("  Update:         {}", config.api.update_url);
                println!("  Delete:         {}", config.api.delete_url);
                println!("  Data:           {}", config.api.data_url);
                println!(
                    "  Proxy:          {}",
                    match (&config.api.proxy_url, config.api.proxy_enabled) {
                        (Some(url), true) => url.as_str(),
                        _ => "disabled",
                    }
                );
                println!("  Timeout:        {}s", config.api.timeout_secs);
                println!();
                println!("[Devices]");
                println!("  IDs:            {}", config.devices.ids.join(", "));
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
