//! The set of monitoring locations shown on the dashboard.
//!
//! Built-in seed locations come first and are read-only. Operator-added
//! locations follow and are persisted under
//! [`keys::CUSTOM_LOCATIONS`](crate::storage::keys::CUSTOM_LOCATIONS).
//! Every mutation writes the store before touching memory, so a failed write
//! leaves the registry as it was.

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::location::{derive_id, seed_locations, Location, LocationUpdate};
use crate::storage::{keys, Storage};

/// Seed and custom monitoring locations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationRegistry {
    seeds: Vec<Location>,
    custom: Vec<Location>,
}

impl LocationRegistry {
    /// Create a registry from explicit seed and custom sets.
    #[must_use]
    pub fn new(seeds: Vec<Location>, custom: Vec<Location>) -> Self {
        Self { seeds, custom }
    }

    /// Load the registry: built-in seeds plus whatever custom records are
    /// stored.
    ///
    /// An unreadable custom list is logged and treated as empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be queried.
    pub fn load(storage: &Storage, now: DateTime<Utc>) -> Result<Self> {
        let custom = match storage.get_list::<Location>(keys::CUSTOM_LOCATIONS) {
            Ok(custom) => custom,
            Err(Error::Json(e)) => {
                warn!("Ignoring unreadable custom locations: {e}");
                Vec::new()
            }
            Err(e) => return Err(e),
        };
        debug!("Loaded {} custom locations", custom.len());
        Ok(Self::new(seed_locations(now), custom))
    }

    /// Every location, seeds first.
    pub fn list(&self) -> impl Iterator<Item = &Location> {
        self.seeds.iter().chain(self.custom.iter())
    }

    /// Number of locations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.seeds.len() + self.custom.len()
    }

    /// Whether there are no locations at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Operator-added locations only.
    #[must_use]
    pub fn custom(&self) -> &[Location] {
        &self.custom
    }

    /// Look up a location by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Location> {
        self.list().find(|location| location.id == id)
    }

    /// Whether `id` names a built-in location.
    #[must_use]
    pub fn is_seed(&self, id: &str) -> bool {
        self.seeds.iter().any(|location| location.id == id)
    }

    /// Pick an unused id for a location named `name` created on `date`.
    ///
    /// Falls back to `custom-<uuid>` when the derived id is taken.
    #[must_use]
    pub fn next_id(&self, name: &str, date: NaiveDate) -> String {
        let derived = derive_id(name, date);
        if self.get(&derived).is_none() {
            return derived;
        }
        let fallback = format!("custom-{}", Uuid::new_v4());
        debug!("Location id {derived} is taken, using {fallback}");
        fallback
    }

    /// Look up a custom location that may be changed.
    ///
    /// Returns `Ok(None)` when no location has this id.
    ///
    /// # Errors
    ///
    /// Returns a validation error when `id` names a built-in location.
    pub fn editable(&self, id: &str) -> Result<Option<&Location>> {
        if let Some(seed) = self.seeds.iter().find(|location| location.id == id) {
            return Err(Error::validation(
                "id",
                format!("Built-in location \"{}\" cannot be changed", seed.name),
            ));
        }
        Ok(self.custom.iter().find(|location| location.id == id))
    }

    /// Append a custom location.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the id is already used, or a storage
    /// error if persisting fails.
    pub fn add(&mut self, storage: &Storage, location: Location) -> Result<()> {
        if self.get(&location.id).is_some() {
            return Err(Error::validation(
                "id",
                format!("Location id {} already exists", location.id),
            ));
        }
        let mut custom = self.custom.clone();
        custom.push(location);
        self.commit(storage, custom)
    }

    /// Merge `update` into the custom location with `id`.
    ///
    /// Returns `Ok(None)` when no custom location has this id.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the merged record is invalid or `id`
    /// names a built-in location, or a storage error if persisting fails.
    pub fn update(
        &mut self,
        storage: &Storage,
        id: &str,
        update: &LocationUpdate,
        now: DateTime<Utc>,
    ) -> Result<Option<Location>> {
        let Some(current) = self.editable(id)? else {
            return Ok(None);
        };
        let merged = current.merged(update, now)?;

        let custom = self
            .custom
            .iter()
            .map(|location| {
                if location.id == id {
                    merged.clone()
                } else {
                    location.clone()
                }
            })
            .collect();
        self.commit(storage, custom)?;
        Ok(Some(merged))
    }

    /// Remove the custom location with `id`.
    ///
    /// Returns the removed record, or `Ok(None)` if nothing matched.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `id` names a built-in location, or a
    /// storage error if persisting fails.
    pub fn remove(&mut self, storage: &Storage, id: &str) -> Result<Option<Location>> {
        let Some(removed) = self.editable(id)?.cloned() else {
            return Ok(None);
        };
        let custom = self
            .custom
            .iter()
            .filter(|location| location.id != id)
            .cloned()
            .collect();
        self.commit(storage, custom)?;
        Ok(Some(removed))
    }

    fn commit(&mut self, storage: &Storage, custom: Vec<Location>) -> Result<()> {
        storage.set_json(keys::CUSTOM_LOCATIONS, &custom)?;
        self.custom = custom;
        Ok(())
    }
}
