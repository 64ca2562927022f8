//! Locally known admin accounts.
//!
//! One built-in super-admin exists on every install. Operators holding
//! `manage_admins` may add further accounts; those are persisted under
//! [`keys::ADMIN_ACCOUNTS`] with their password stored as a BLAKE3 digest.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::session::{Admin, Permission};
use crate::storage::{keys, Storage};

/// Password accepted for built-in accounts.
pub const DEV_PASSWORD: &str = "password";

/// Role given to operator-added accounts.
pub const CUSTOM_ROLE: &str = "Admin";

/// A persisted admin account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    /// The profile handed to the session on login.
    #[serde(flatten)]
    pub admin: Admin,
    /// Hex BLAKE3 digest of the password; absent for records that predate
    /// hashing, which accept [`DEV_PASSWORD`].
    #[serde(rename = "passwordHash", default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
}

/// Input for a new admin account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    /// Login name, unique across built-in and custom accounts.
    pub username: String,
    /// Plain-text password.
    pub password: String,
    /// Capabilities to grant.
    pub permissions: Vec<Permission>,
}

fn hash_password(password: &str) -> String {
    blake3::hash(password.as_bytes()).to_hex().to_string()
}

/// The built-in accounts.
#[must_use]
pub fn builtin_accounts() -> Vec<Admin> {
    vec![Admin {
        username: "admin".to_string(),
        token: "mock-jwt-token-admin".to_string(),
        role: Some("super_admin".to_string()),
        permissions: Some(Permission::ALL.to_vec()),
    }]
}

/// Built-in plus operator-added admin accounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountDirectory {
    builtin: Vec<Admin>,
    custom: Vec<AccountRecord>,
}

impl AccountDirectory {
    /// Load the directory from `storage`.
    ///
    /// An unreadable account list is logged and treated as empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be queried.
    pub fn load(storage: &Storage) -> Result<Self> {
        let custom = match storage.get_list::<AccountRecord>(keys::ADMIN_ACCOUNTS) {
            Ok(custom) => custom,
            Err(Error::Json(e)) => {
                warn!("Ignoring unreadable admin accounts: {e}");
                Vec::new()
            }
            Err(e) => return Err(e),
        };
        Ok(Self {
            builtin: builtin_accounts(),
            custom,
        })
    }

    /// Every account profile, built-ins first.
    pub fn list(&self) -> impl Iterator<Item = &Admin> {
        self.builtin
            .iter()
            .chain(self.custom.iter().map(|record| &record.admin))
    }

    /// Whether `username` is a built-in account.
    #[must_use]
    pub fn is_builtin(&self, username: &str) -> bool {
        self.builtin.iter().any(|a| a.username == username)
    }

    /// Check credentials against local accounts.
    ///
    /// Returns the matching profile, or `None` if the username is unknown
    /// locally or the password does not match.
    #[must_use]
    pub fn validate_login(&self, username: &str, password: &str) -> Option<Admin> {
        if let Some(admin) = self.builtin.iter().find(|a| a.username == username) {
            return (password == DEV_PASSWORD).then(|| admin.clone());
        }

        let record = self.custom.iter().find(|r| r.admin.username == username)?;
        let matches = match &record.password_hash {
            Some(hash) => *hash == hash_password(password),
            None => password == DEV_PASSWORD,
        };
        matches.then(|| record.admin.clone())
    }

    /// Create a new account.
    ///
    /// # Errors
    ///
    /// Returns an account error if the username is blank or taken or the
    /// password is empty, or a storage error if persisting fails.
    pub fn add(&mut self, storage: &Storage, account: NewAccount, now: DateTime<Utc>) -> Result<Admin> {
        let username = account.username.trim();
        if username.is_empty() {
            return Err(Error::account("username must not be empty"));
        }
        if account.password.is_empty() {
            return Err(Error::account("password must not be empty"));
        }
        if self.list().any(|a| a.username == username) {
            return Err(Error::account(format!("username '{username}' already exists")));
        }

        let admin = Admin {
            username: username.to_string(),
            token: format!("mock-jwt-token-{}", now.timestamp_millis()),
            role: Some(CUSTOM_ROLE.to_string()),
            permissions: Some(account.permissions),
        };
        let mut custom = self.custom.clone();
        custom.push(AccountRecord {
            admin: admin.clone(),
            password_hash: Some(hash_password(&account.password)),
        });
        storage.set_json(keys::ADMIN_ACCOUNTS, &custom)?;
        self.custom = custom;

        debug!("Added admin account {}", admin.username);
        Ok(admin)
    }

    /// Delete a custom account. Returns `false` if no such account exists.
    ///
    /// # Errors
    ///
    /// Returns an account error for built-in accounts, or a storage error if
    /// persisting fails.
    pub fn remove(&mut self, storage: &Storage, username: &str) -> Result<bool> {
        if self.is_builtin(username) {
            return Err(Error::account(format!(
                "built-in account '{username}' cannot be deleted"
            )));
        }
        let custom: Vec<AccountRecord> = self
            .custom
            .iter()
            .filter(|r| r.admin.username != username)
            .cloned()
            .collect();
        if custom.len() == self.custom.len() {
            return Ok(false);
        }
        storage.set_json(keys::ADMIN_ACCOUNTS, &custom)?;
        self.custom = custom;
        Ok(true)
    }
}
