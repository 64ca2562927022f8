//! The dashboard context.
//!
//! [`Dashboard`] owns every piece of dashboard state: the local store, the
//! session, locations, recommendations, settings, notifications and the
//! event bus. Views drive it through its methods and observe it through
//! [`Dashboard::subscribe`].
//!
//! Mutations follow one shape. The operator's permission is checked, input
//! is validated, the remote gateway is called, and only then is local state
//! written. Any failure emits exactly one error notification and leaves local
//! state as it was. A local write failing after the remote call succeeded
//! leaves the two out of step; nothing reconciles them.

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::accounts::{AccountDirectory, NewAccount};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::events::{AppEvent, EventBus};
use crate::gateway::{
    self, DataGateway, DeleteDataRequest, HistoryPage, HistoryQuery, LoginRequest,
    ReadingUpdates, UpdateDataRequest,
};
use crate::history::{ChartData, Period};
use crate::insights::{self, AqiStatistics, HealthTips};
use crate::location::{Location, LocationUpdate, NewLocation};
use crate::notify::{Notification, NotificationCenter, NotificationKind};
use crate::recommendations::{HealthRecommendation, RecommendationBook, RecommendationUpdate};
use crate::refresh::{AutoRefresh, RefreshTick, Visibility};
use crate::registry::LocationRegistry;
use crate::session::{Admin, Permission, Session};
use crate::settings::{SettingsUpdate, SystemSettings};
use crate::storage::{keys, Storage};

/// Role given to remote operators whose login response names none.
const REMOTE_ROLE: &str = "admin";

/// Load the recommendation book, falling back to the built-in table when the
/// stored one is missing or invalid.
fn load_recommendations(storage: &Storage) -> Result<RecommendationBook> {
    let stored = match storage.get_json::<Vec<HealthRecommendation>>(keys::RECOMMENDATIONS) {
        Ok(stored) => stored,
        Err(Error::Json(e)) => {
            warn!("Ignoring unreadable recommendations: {e}");
            None
        }
        Err(e) => return Err(e),
    };
    match stored.map(RecommendationBook::from_entries) {
        Some(Ok(book)) => Ok(book),
        Some(Err(e)) => {
            warn!("Ignoring invalid stored recommendations: {e}");
            Ok(RecommendationBook::default())
        }
        None => Ok(RecommendationBook::default()),
    }
}

/// Dashboard state and the operations on it.
#[derive(Debug)]
pub struct Dashboard {
    storage: Storage,
    gateway: Box<dyn DataGateway>,
    session: Session,
    accounts: AccountDirectory,
    registry: LocationRegistry,
    recommendations: RecommendationBook,
    settings: SystemSettings,
    notifications: NotificationCenter,
    events: EventBus,
    refresh: AutoRefresh,
    refresh_rx: Option<mpsc::Receiver<RefreshTick>>,
    last_updated: Option<DateTime<Utc>>,
}

impl Dashboard {
    /// Open the dashboard described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be opened or the gateway cannot
    /// be built.
    pub fn open(config: &Config) -> Result<Self> {
        let storage = Storage::open(config.database_path())?;
        let gateway = gateway::from_config(&config.api)?;
        Self::new(storage, gateway)
    }

    /// Build a dashboard over an existing store and gateway.
    ///
    /// # Errors
    ///
    /// Returns an error if persisted state cannot be read.
    pub fn new(storage: Storage, gateway: Box<dyn DataGateway>) -> Result<Self> {
        let now = Utc::now();
        let session = Session::restore(&storage)?;
        let accounts = AccountDirectory::load(&storage)?;
        let registry = LocationRegistry::load(&storage, now)?;
        let recommendations = load_recommendations(&storage)?;
        let settings = SystemSettings::load(&storage)?;
        let notifications = NotificationCenter::new(settings.notifications_enabled);

        debug!(
            "Dashboard ready: {} locations, gateway {}",
            registry.len(),
            gateway.name()
        );

        Ok(Self {
            storage,
            gateway,
            session,
            accounts,
            registry,
            recommendations,
            settings,
            notifications,
            events: EventBus::new(),
            refresh: AutoRefresh::new(Visibility::default()),
            refresh_rx: None,
            last_updated: Some(now),
        })
    }

    // === Events & notifications ===

    /// Subscribe to dashboard events.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<AppEvent> {
        self.events.subscribe()
    }

    /// Currently visible notifications.
    pub fn notifications(&mut self, now: DateTime<Utc>) -> &[Notification] {
        self.notifications.active(now)
    }

    /// Hide a notification early.
    pub fn dismiss_notification(&mut self, id: u64) -> bool {
        self.notifications.dismiss(id)
    }

    fn notify(&mut self, message: impl Into<String>, kind: NotificationKind) {
        if let Some(shown) = self.notifications.show(message, kind, Utc::now()) {
            self.events.emit(AppEvent::ShowNotification {
                message: shown.message,
                kind: shown.kind,
            });
        }
    }

    /// Report a failed operation once and hand the error back.
    fn fail(&mut self, context: &str, err: Error) -> Error {
        let message = match &err {
            Error::Validation { message, .. } => message.clone(),
            other => format!("{context}: {other}"),
        };
        if err.is_gateway() {
            error!("{context}: {err}");
        } else {
            warn!("{context}: {err}");
        }
        self.notify(message, NotificationKind::Error);
        err
    }

    fn touch(&mut self) {
        self.last_updated = Some(Utc::now());
    }

    /// When dashboard data last changed.
    #[must_use]
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    // === Session ===

    /// The current session.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Log in with local accounts first, then the remote endpoint.
    ///
    /// Returns `false` on any failure; failures are logged, not raised.
    pub async fn login(&mut self, username: &str, password: &str) -> bool {
        let admin = match self.accounts.validate_login(username, password) {
            Some(admin) => Some(admin),
            None => self.remote_login(username, password).await,
        };
        let Some(admin) = admin else {
            return false;
        };

        if let Err(e) = self.session.start(&self.storage, admin) {
            warn!("Could not persist session: {e}");
            return false;
        }
        info!("Logged in as {username}");
        self.events.emit(AppEvent::SessionChanged);
        true
    }

    async fn remote_login(&self, username: &str, password: &str) -> Option<Admin> {
        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        match self.gateway.login(&request).await {
            Ok(response) => {
                let Some(token) = response.token else {
                    warn!("Login response for {username} carried no token");
                    return None;
                };
                let permissions = response.permissions.map(|names| {
                    names
                        .iter()
                        .filter_map(|name| match name.parse::<Permission>() {
                            Ok(permission) => Some(permission),
                            Err(_) => {
                                warn!("Ignoring unknown permission {name:?} for {username}");
                                None
                            }
                        })
                        .collect()
                });
                Some(Admin {
                    username: response.username.unwrap_or_else(|| username.to_string()),
                    token,
                    role: Some(response.role.unwrap_or_else(|| REMOTE_ROLE.to_string())),
                    permissions,
                })
            }
            Err(e) => {
                warn!("Login failed for {username}: {e}");
                None
            }
        }
    }

    /// Log out and clear the persisted session.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be updated.
    pub fn logout(&mut self) -> Result<()> {
        self.session.end(&self.storage)?;
        info!("Logged out");
        self.events.emit(AppEvent::SessionChanged);
        Ok(())
    }

    fn authorize(&mut self, permission: Permission, context: &str) -> Result<String> {
        match self.session.authorize(permission) {
            Ok(admin) => Ok(admin.token.clone()),
            Err(e) => Err(self.fail(context, e)),
        }
    }

    // === Locations ===

    /// Every location, seeds first.
    #[must_use]
    pub fn locations(&self) -> Vec<&Location> {
        self.registry.list().collect()
    }

    /// Operator-added locations.
    #[must_use]
    pub fn custom_locations(&self) -> &[Location] {
        self.registry.custom()
    }

    /// Look up a location.
    #[must_use]
    pub fn location(&self, id: &str) -> Option<&Location> {
        self.registry.get(id)
    }

    /// Add a monitoring location.
    ///
    /// # Errors
    ///
    /// Returns a validation error before any remote call, an authorization
    /// error, or the gateway or storage error that aborted the add.
    pub async fn add_location(&mut self, input: NewLocation) -> Result<Location> {
        const CONTEXT: &str = "Failed to add location";
        let token = self.authorize(Permission::ManageLocations, CONTEXT)?;

        let now = Utc::now();
        let location = match input.validate() {
            Ok((name, ..)) => {
                let id = self.registry.next_id(&name, now.date_naive());
                input.into_location(id, now)
            }
            Err(e) => Err(e),
        };
        let location = location.map_err(|e| self.fail(CONTEXT, e))?;

        let updates = ReadingUpdates {
            aqi: Some(location.aqi),
            latitude: Some(location.lat),
            longitude: Some(location.lon),
            ..ReadingUpdates::default()
        };
        let request = UpdateDataRequest::new(token, location.id.clone(), now, updates);
        if let Err(e) = self.gateway.update_data(&request).await {
            return Err(self.fail(CONTEXT, e));
        }

        if let Err(e) = self.registry.add(&self.storage, location.clone()) {
            return Err(self.fail(CONTEXT, e));
        }

        info!("Added location {} ({})", location.id, location.status);
        self.touch();
        self.events.emit(AppEvent::LocationsUpdated);
        self.notify(
            format!("Location \"{}\" added successfully", location.name),
            NotificationKind::Success,
        );
        Ok(location)
    }

    /// Edit a custom location.
    ///
    /// Returns `Ok(None)` when no location has `id`.
    ///
    /// # Errors
    ///
    /// Returns a validation error before any remote call, an authorization
    /// error, or the gateway or storage error that aborted the update.
    pub async fn update_location(
        &mut self,
        id: &str,
        update: &LocationUpdate,
    ) -> Result<Option<Location>> {
        const CONTEXT: &str = "Failed to update location";
        let token = self.authorize(Permission::Edit, CONTEXT)?;

        let now = Utc::now();
        let merged = match self.registry.editable(id) {
            Ok(Some(current)) => current.merged(update, now),
            Ok(None) => {
                self.notify("Location not found", NotificationKind::Error);
                return Ok(None);
            }
            Err(e) => Err(e),
        };
        let merged = merged.map_err(|e| self.fail(CONTEXT, e))?;

        let updates = ReadingUpdates::from_location_update(update, update.aqi.map(|_| merged.aqi));
        let request = UpdateDataRequest::new(token, id, now, updates);
        if let Err(e) = self.gateway.update_data(&request).await {
            return Err(self.fail(CONTEXT, e));
        }

        let updated = match self.registry.update(&self.storage, id, update, now) {
            Ok(Some(updated)) => updated,
            Ok(None) => return Ok(None),
            Err(e) => return Err(self.fail(CONTEXT, e)),
        };

        info!("Updated location {id}");
        self.touch();
        self.events.emit(AppEvent::LocationsUpdated);
        self.notify(
            format!("Location \"{}\" updated successfully", updated.name),
            NotificationKind::Success,
        );
        Ok(Some(updated))
    }

    /// Delete a custom location once `confirm` approves it.
    ///
    /// Returns `Ok(false)` when no location has `id` or the operator
    /// declined.
    ///
    /// # Errors
    ///
    /// Returns an authorization error, or the gateway or storage error that
    /// aborted the delete.
    pub async fn delete_location<F>(&mut self, id: &str, confirm: F) -> Result<bool>
    where
        F: FnOnce(&Location) -> bool,
    {
        const CONTEXT: &str = "Failed to delete location";
        let token = self.authorize(Permission::Delete, CONTEXT)?;

        let location = match self.registry.editable(id) {
            Ok(Some(location)) => location.clone(),
            Ok(None) => {
                self.notify("Location not found", NotificationKind::Error);
                return Ok(false);
            }
            Err(e) => return Err(self.fail(CONTEXT, e)),
        };

        if !confirm(&location) {
            debug!("Delete of {id} declined");
            return Ok(false);
        }

        let request = DeleteDataRequest::new(token, id, location.timestamp);
        if let Err(e) = self.gateway.delete_data(&request).await {
            return Err(self.fail(CONTEXT, e));
        }

        match self.registry.remove(&self.storage, id) {
            Ok(Some(_)) => {}
            Ok(None) => return Ok(false),
            Err(e) => return Err(self.fail(CONTEXT, e)),
        }

        info!("Deleted location {id}");
        self.touch();
        self.events.emit(AppEvent::LocationsUpdated);
        self.notify(
            format!("Location \"{}\" deleted successfully", location.name),
            NotificationKind::Success,
        );
        Ok(true)
    }

    // === Recommendations ===

    /// The recommendation table.
    #[must_use]
    pub fn recommendations(&self) -> &RecommendationBook {
        &self.recommendations
    }

    /// The recommendation band covering `aqi`.
    #[must_use]
    pub fn recommendation_for(&self, aqi: u16) -> Option<&HealthRecommendation> {
        self.recommendations.for_aqi(aqi)
    }

    /// Edit a recommendation band.
    ///
    /// Returns `Ok(None)` when no band has `id`.
    ///
    /// # Errors
    ///
    /// Returns an authorization or validation error, or a storage error if
    /// persisting fails.
    pub fn update_recommendation(
        &mut self,
        id: &str,
        update: &RecommendationUpdate,
    ) -> Result<Option<HealthRecommendation>> {
        const CONTEXT: &str = "Failed to update recommendations";
        self.authorize(Permission::ManageRecommendations, CONTEXT)?;

        let mut book = self.recommendations.clone();
        let updated = match book.update(id, update) {
            Ok(Some(updated)) => updated,
            Ok(None) => return Ok(None),
            Err(e) => return Err(self.fail(CONTEXT, e)),
        };
        if let Err(e) = self.storage.set_json(keys::RECOMMENDATIONS, book.entries()) {
            return Err(self.fail(CONTEXT, e));
        }
        self.recommendations = book;

        info!("Updated recommendations for {}", updated.status);
        self.touch();
        self.events.emit(AppEvent::RecommendationsUpdated);
        self.notify(
            format!("Recommendations for \"{}\" updated successfully", updated.status),
            NotificationKind::Success,
        );
        Ok(Some(updated))
    }

    // === Settings ===

    /// The current system settings.
    #[must_use]
    pub fn settings(&self) -> &SystemSettings {
        &self.settings
    }

    /// Merge, validate and persist a settings change.
    ///
    /// A running auto-refresh task is restarted with the new interval.
    ///
    /// # Errors
    ///
    /// Returns an authorization or validation error, or a storage error if
    /// persisting fails.
    pub fn update_settings(&mut self, update: &SettingsUpdate) -> Result<SystemSettings> {
        const CONTEXT: &str = "Failed to update system settings";
        self.authorize(Permission::Edit, CONTEXT)?;

        let next = self
            .settings
            .merged(update)
            .map_err(|e| self.fail(CONTEXT, e))?;
        self.apply_settings(next, CONTEXT)
    }

    /// Restore default settings.
    ///
    /// # Errors
    ///
    /// Returns an authorization error or a storage error if persisting fails.
    pub fn reset_settings(&mut self) -> Result<SystemSettings> {
        const CONTEXT: &str = "Failed to reset system settings";
        self.authorize(Permission::Edit, CONTEXT)?;
        self.apply_settings(SystemSettings::default(), CONTEXT)
    }

    fn apply_settings(&mut self, next: SystemSettings, context: &str) -> Result<SystemSettings> {
        if let Err(e) = next.save(&self.storage) {
            return Err(self.fail(context, e));
        }
        self.settings = next;
        self.notifications
            .set_enabled(self.settings.notifications_enabled);

        if self.refresh_rx.is_some() || self.refresh.is_running() {
            match self.refresh.configure(&self.settings) {
                Ok(rx) => self.refresh_rx = rx,
                Err(e) => warn!("Could not restart auto-refresh: {e}"),
            }
        }

        info!("System settings updated");
        self.touch();
        self.events.emit(AppEvent::SettingsUpdated);
        self.notify("System settings updated successfully", NotificationKind::Success);
        Ok(self.settings.clone())
    }

    // === Admin accounts ===

    /// Every known admin account.
    #[must_use]
    pub fn admins(&self) -> Vec<&Admin> {
        self.accounts.list().collect()
    }

    /// Create an admin account.
    ///
    /// # Errors
    ///
    /// Returns an authorization or account error, or a storage error if
    /// persisting fails.
    pub fn add_admin(&mut self, account: NewAccount) -> Result<Admin> {
        const CONTEXT: &str = "Failed to add admin";
        self.authorize(Permission::ManageAdmins, CONTEXT)?;

        let admin = match self.accounts.add(&self.storage, account, Utc::now()) {
            Ok(admin) => admin,
            Err(e) => return Err(self.fail(CONTEXT, e)),
        };
        info!("Added admin {}", admin.username);
        self.notify(
            format!("Admin \"{}\" added successfully", admin.username),
            NotificationKind::Success,
        );
        Ok(admin)
    }

    /// Delete a custom admin account. Returns `false` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an authorization error, an account error for built-in
    /// accounts, or a storage error if persisting fails.
    pub fn remove_admin(&mut self, username: &str) -> Result<bool> {
        const CONTEXT: &str = "Failed to delete admin";
        self.authorize(Permission::ManageAdmins, CONTEXT)?;

        match self.accounts.remove(&self.storage, username) {
            Ok(true) => {
                info!("Deleted admin {username}");
                self.notify(
                    format!("Admin \"{username}\" deleted successfully"),
                    NotificationKind::Success,
                );
                Ok(true)
            }
            Ok(false) => {
                self.notify("Admin not found", NotificationKind::Error);
                Ok(false)
            }
            Err(e) => Err(self.fail(CONTEXT, e)),
        }
    }

    // === Insights & history ===

    /// AQI statistics over all locations.
    #[must_use]
    pub fn statistics(&self) -> AqiStatistics {
        insights::statistics(self.registry.list())
    }

    /// Tips for the average AQI over all locations.
    #[must_use]
    pub fn health_tips(&self) -> HealthTips {
        insights::health_tips(self.registry.list(), &self.recommendations)
    }

    /// List readings through the gateway.
    ///
    /// # Errors
    ///
    /// Returns the gateway error after reporting it.
    pub async fn history(&mut self, query: &HistoryQuery) -> Result<HistoryPage> {
        match self.gateway.list_data(query).await {
            Ok(page) => Ok(page),
            Err(e) => Err(self.fail("Failed to load history", e)),
        }
    }

    /// Chart series for one device.
    ///
    /// # Errors
    ///
    /// Returns the gateway error after reporting it.
    pub async fn chart(
        &mut self,
        device_id: &str,
        date: Option<String>,
        period: Period,
    ) -> Result<ChartData> {
        let query = HistoryQuery {
            date,
            period: Some(period.to_string()),
            page: None,
        };
        let page = self.history(&query).await?;
        Ok(ChartData::from_readings(device_id, period, &page.items))
    }

    // === Refresh ===

    /// Reload persisted state from the store.
    ///
    /// # Errors
    ///
    /// Returns the storage error after reporting it.
    pub fn refresh(&mut self) -> Result<()> {
        let now = Utc::now();
        let loaded = LocationRegistry::load(&self.storage, now).and_then(|registry| {
            let book = load_recommendations(&self.storage)?;
            Ok((registry, book))
        });
        match loaded {
            Ok((registry, book)) => {
                self.registry = registry;
                self.recommendations = book;
                self.touch();
                self.events.emit(AppEvent::LocationsUpdated);
                self.notify("Data refreshed successfully", NotificationKind::Success);
                Ok(())
            }
            Err(e) => Err(self.fail("Failed to load admin data", e)),
        }
    }

    /// The shared visibility flag that gates auto-refresh.
    #[must_use]
    pub fn visibility(&self) -> Visibility {
        self.refresh.visibility().clone()
    }

    /// Start auto-refresh according to the current settings.
    ///
    /// # Errors
    ///
    /// Returns an error if called outside a tokio runtime.
    pub fn start_auto_refresh(&mut self) -> Result<bool> {
        self.refresh_rx = self.refresh.configure(&self.settings)?;
        Ok(self.refresh_rx.is_some())
    }

    /// Stop auto-refresh.
    pub fn stop_auto_refresh(&mut self) {
        self.refresh.cancel();
        self.refresh_rx = None;
    }

    /// Wait for the next auto-refresh tick.
    ///
    /// Returns `None` at once when auto-refresh is not running.
    pub async fn next_refresh(&mut self) -> Option<RefreshTick> {
        match self.refresh_rx.as_mut() {
            Some(rx) => rx.recv().await,
            None => None,
        }
    }

    // === Store ===

    /// The local store.
    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Name of the active gateway.
    #[must_use]
    pub fn gateway_name(&self) -> &'static str {
        self.gateway.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aqi::AqiStatus;
    use crate::gateway::OfflineGateway;

    fn dashboard() -> Dashboard {
        let storage = Storage::open_in_memory().unwrap();
        Dashboard::new(storage, Box::new(OfflineGateway::new())).unwrap()
    }

    async fn logged_in() -> Dashboard {
        let mut dash = dashboard();
        assert!(dash.login("admin", "password").await);
        dash
    }

    fn new_location(name: &str, lat: f64, aqi: i32) -> NewLocation {
        NewLocation {
            name: name.to_string(),
            lat,
            lon: 115.2,
            aqi,
        }
    }

    #[tokio::test]
    async fn test_add_location_classifies() {
        let mut dash = logged_in().await;
        let location = dash
            .add_location(new_location("Test", -8.5, 120))
            .await
            .unwrap();

        assert_eq!(location.status, AqiStatus::UnhealthyForSensitive);
        assert_eq!(location.primary_pollutant, "PM2.5");
        assert_eq!(dash.locations().len(), 3);
    }

    #[tokio::test]
    async fn test_add_requires_login() {
        let mut dash = dashboard();
        let err = dash
            .add_location(new_location("Test", -8.5, 120))
            .await
            .unwrap_err();
        assert!(err.is_unauthorized());
        assert_eq!(dash.locations().len(), 2);
    }

    #[tokio::test]
    async fn test_add_invalid_latitude_notifies_once() {
        let mut dash = logged_in().await;
        let mut events = dash.subscribe();

        let err = dash
            .add_location(new_location("Test", 91.0, 120))
            .await
            .unwrap_err();
        assert_eq!(err.field(), Some("latitude"));

        let event = events.try_recv().unwrap();
        assert_eq!(
            event,
            AppEvent::ShowNotification {
                message: "Latitude must be between -90 and 90".to_string(),
                kind: NotificationKind::Error,
            }
        );
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_delete_declined_keeps_location() {
        let mut dash = logged_in().await;
        let location = dash
            .add_location(new_location("Test", -8.5, 40))
            .await
            .unwrap();

        assert!(!dash.delete_location(&location.id, |_| false).await.unwrap());
        assert!(dash.location(&location.id).is_some());

        assert!(dash.delete_location(&location.id, |_| true).await.unwrap());
        assert!(dash.location(&location.id).is_none());
    }

    #[tokio::test]
    async fn test_update_recommendation_persists() {
        let mut dash = logged_in().await;
        let update = RecommendationUpdate {
            color: Some("#00AA00".to_string()),
            ..Default::default()
        };
        dash.update_recommendation("1", &update).unwrap().unwrap();

        let reloaded = load_recommendations(dash.storage()).unwrap();
        assert_eq!(reloaded.get("1").unwrap().color, "#00AA00");
    }

    #[tokio::test]
    async fn test_settings_disable_notifications() {
        let mut dash = logged_in().await;
        let update = SettingsUpdate {
            notifications_enabled: Some(false),
            ..Default::default()
        };
        dash.update_settings(&update).unwrap();

        let mut events = dash.subscribe();
        dash.refresh().unwrap();
        assert_eq!(events.try_recv().unwrap(), AppEvent::LocationsUpdated);
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_logout_emits_session_changed() {
        let mut dash = logged_in().await;
        let mut events = dash.subscribe();
        dash.logout().unwrap();
        assert_eq!(events.try_recv().unwrap(), AppEvent::SessionChanged);
        assert!(!dash.session().is_logged_in());
    }

    #[tokio::test]
    async fn test_wrong_password_fails_offline() {
        let mut dash = dashboard();
        assert!(!dash.login("admin", "nope").await);
        assert!(!dash.session().is_logged_in());
    }

    #[test]
    fn test_invalid_stored_recommendations_fall_back() {
        let storage = Storage::open_in_memory().unwrap();
        storage.set(keys::RECOMMENDATIONS, "[]").unwrap();
        assert_eq!(
            load_recommendations(&storage).unwrap(),
            RecommendationBook::default()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_stored_interval_still_ticks() {
        let storage = Storage::open_in_memory().unwrap();
        storage
            .set(keys::SYSTEM_SETTINGS, r#"{"autoRefresh":true,"refreshInterval":0}"#)
            .unwrap();
        let mut dash = Dashboard::new(storage, Box::new(OfflineGateway::new())).unwrap();
        assert_eq!(dash.settings().refresh_interval, 300_000);

        assert!(dash.start_auto_refresh().unwrap());
        let tick = tokio::time::timeout(
            std::time::Duration::from_secs(301),
            dash.next_refresh(),
        )
        .await;
        assert!(tick.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_next_refresh_without_auto_refresh() {
        let mut dash = dashboard();
        assert!(dash.next_refresh().await.is_none());
    }
}
