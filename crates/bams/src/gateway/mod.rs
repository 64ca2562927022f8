//! Remote data gateway.
//!
//! The dashboard talks to four endpoints: login, update, delete and the
//! reading listing. [`DataGateway`] abstracts over them so the dashboard can
//! run against the live API ([`HttpGateway`]) or entirely locally
//! ([`OfflineGateway`]).
//!
//! Failures surface as [`Error::Remote`](crate::Error::Remote) carrying the
//! server's `message` field or `HTTP <status>`. Nothing is retried.

mod http;
mod offline;
pub mod types;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::ApiConfig;
use crate::error::Result;

pub use http::HttpGateway;
pub use offline::OfflineGateway;
pub use types::{
    DeleteDataRequest, DeviceReading, HistoryPage, HistoryQuery, LoginRequest, LoginResponse,
    ReadingUpdates, UpdateDataRequest,
};

/// Operations offered by the remote data API.
#[async_trait]
pub trait DataGateway: Send + Sync + std::fmt::Debug {
    /// Authenticate an operator.
    ///
    /// # Errors
    ///
    /// Returns a gateway error if the credentials are rejected or the request
    /// fails.
    async fn login(&self, credentials: &LoginRequest) -> Result<LoginResponse>;

    /// Change fields of a remote reading record.
    ///
    /// # Errors
    ///
    /// Returns a gateway error if the server rejects the update or the
    /// request fails.
    async fn update_data(&self, request: &UpdateDataRequest) -> Result<Value>;

    /// Delete a remote reading record.
    ///
    /// # Errors
    ///
    /// Returns a gateway error if the server rejects the delete or the
    /// request fails.
    async fn delete_data(&self, request: &DeleteDataRequest) -> Result<Value>;

    /// List readings.
    ///
    /// # Errors
    ///
    /// Returns a gateway error if the request fails or the response cannot be
    /// interpreted as a page of readings.
    async fn list_data(&self, query: &HistoryQuery) -> Result<HistoryPage>;

    /// Short name for logs and status output.
    fn name(&self) -> &'static str;
}

/// Build the gateway selected by `config`.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be constructed.
pub fn from_config(config: &ApiConfig) -> Result<Box<dyn DataGateway>> {
    if config.offline {
        Ok(Box::new(OfflineGateway::new()))
    } else {
        Ok(Box::new(HttpGateway::new(config.clone())?))
    }
}
