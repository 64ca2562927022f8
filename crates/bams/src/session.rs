//! The logged-in operator.
//!
//! The session is a client-side convenience for hiding actions an operator
//! may not take. It is not a security boundary; the remote API checks the
//! token on every mutation.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::storage::{keys, Storage};

/// A capability an operator may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Read dashboard data.
    View,
    /// Edit readings.
    Edit,
    /// Delete readings.
    Delete,
    /// Add and remove admin accounts.
    ManageAdmins,
    /// Add, edit and remove monitoring locations.
    ManageLocations,
    /// Edit health recommendations.
    ManageRecommendations,
}

impl Permission {
    /// Every permission.
    pub const ALL: [Self; 6] = [
        Self::View,
        Self::Edit,
        Self::Delete,
        Self::ManageAdmins,
        Self::ManageLocations,
        Self::ManageRecommendations,
    ];

    /// Granted to operators whose profile lists no permissions, such as
    /// accounts authenticated by the remote login endpoint.
    pub const OPERATOR_DEFAULT: [Self; 4] = [
        Self::View,
        Self::Edit,
        Self::Delete,
        Self::ManageLocations,
    ];

    /// The wire name of this permission.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Edit => "edit",
            Self::Delete => "delete",
            Self::ManageAdmins => "manage_admins",
            Self::ManageLocations => "manage_locations",
            Self::ManageRecommendations => "manage_recommendations",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s.trim())
            .ok_or_else(|| Error::validation("permission", format!("unknown permission: {s}")))
    }
}

/// An authenticated operator profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Admin {
    /// Login name.
    pub username: String,
    /// Opaque token sent with every remote mutation.
    pub token: String,
    /// Free-form role label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Explicit capability list; `None` means [`Permission::OPERATOR_DEFAULT`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<Permission>>,
}

impl Admin {
    /// The permissions this operator effectively holds.
    #[must_use]
    pub fn effective_permissions(&self) -> BTreeSet<Permission> {
        match &self.permissions {
            Some(list) => list.iter().copied().collect(),
            None => Permission::OPERATOR_DEFAULT.into_iter().collect(),
        }
    }

    /// Wire names of the effective permissions, in sorted order.
    #[must_use]
    pub fn permission_names(&self) -> Vec<&'static str> {
        self.effective_permissions()
            .into_iter()
            .map(Permission::as_str)
            .collect()
    }

    /// Whether this operator holds `permission`.
    #[must_use]
    pub fn can(&self, permission: Permission) -> bool {
        self.effective_permissions().contains(&permission)
    }
}

/// The current login state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    admin: Option<Admin>,
}

impl Session {
    /// A session with nobody logged in.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Restore the session persisted in `storage`.
    ///
    /// A stored profile that cannot be parsed is discarded together with its
    /// token, leaving the operator logged out.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be queried.
    pub fn restore(storage: &Storage) -> Result<Self> {
        let Some(token) = storage.get(keys::ADMIN_TOKEN)? else {
            return Ok(Self::anonymous());
        };
        let Some(raw) = storage.get(keys::ADMIN_DATA)? else {
            debug!("Session token present without a profile");
            return Ok(Self::anonymous());
        };

        match serde_json::from_str::<Admin>(&raw) {
            Ok(mut admin) => {
                admin.token = token;
                debug!("Restored session for {}", admin.username);
                Ok(Self { admin: Some(admin) })
            }
            Err(e) => {
                warn!("Discarding unparsable session profile: {e}");
                storage.remove(keys::ADMIN_TOKEN)?;
                storage.remove(keys::ADMIN_DATA)?;
                Ok(Self::anonymous())
            }
        }
    }

    /// Log `admin` in and persist the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be persisted.
    pub fn start(&mut self, storage: &Storage, admin: Admin) -> Result<()> {
        storage.set(keys::ADMIN_TOKEN, &admin.token)?;
        storage.set_json(keys::ADMIN_DATA, &admin)?;
        self.admin = Some(admin);
        Ok(())
    }

    /// Log out and clear the persisted session.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be updated.
    pub fn end(&mut self, storage: &Storage) -> Result<()> {
        storage.remove(keys::ADMIN_TOKEN)?;
        storage.remove(keys::ADMIN_DATA)?;
        self.admin = None;
        Ok(())
    }

    /// The logged-in operator.
    #[must_use]
    pub fn current(&self) -> Option<&Admin> {
        self.admin.as_ref()
    }

    /// Whether anyone is logged in.
    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.admin.is_some()
    }

    /// The session token, if logged in.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.admin.as_ref().map(|a| a.token.as_str())
    }

    /// Check that the logged-in operator holds `permission`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotAuthenticated`] when nobody is logged in and
    /// [`Error::Unauthorized`] when the permission is missing.
    pub fn authorize(&self, permission: Permission) -> Result<&Admin> {
        let admin = self.admin.as_ref().ok_or(Error::NotAuthenticated)?;
        if admin.can(permission) {
            Ok(admin)
        } else {
            Err(Error::Unauthorized {
                username: admin.username.clone(),
                permission: permission.to_string(),
            })
        }
    }
}
