//! Gateway backed by the live HTTP API.

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use tracing::{debug, warn};

use super::types::{
    error_message, parse_body, proxied_url, with_query, DeleteDataRequest, HistoryPage,
    HistoryQuery, LoginRequest, LoginResponse, UpdateDataRequest,
};
use super::DataGateway;
use crate::config::ApiConfig;
use crate::error::{Error, Result};

/// Calls the remote API over HTTP.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    config: ApiConfig,
}

impl HttpGateway {
    /// Create a gateway for the endpoints in `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: ApiConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self { client, config })
    }

    /// The URL actually requested for `target`, after proxy wrapping.
    #[must_use]
    pub fn resolve(&self, target: &str) -> String {
        match self.config.proxy_url.as_deref() {
            Some(proxy) if self.config.proxy_enabled && !proxy.is_empty() => {
                proxied_url(proxy, target)
            }
            _ => target.to_string(),
        }
    }

    async fn send(&self, endpoint: &'static str, request: RequestBuilder) -> Result<Value> {
        // `.json()` bodies already carry their content type.
        let response = request.header(ACCEPT, "application/json").send().await?;

        let status = response.status();
        let text = response.text().await?;
        let body = parse_body(&text);

        if !status.is_success() {
            let message = error_message(status.as_u16(), &body);
            warn!("{endpoint} failed with {status}: {message}");
            return Err(Error::remote(status.as_u16(), message));
        }

        debug!("{endpoint} succeeded with {status}");
        Ok(body)
    }
}

/// Interpret a listing body as a page of readings.
///
/// Accepts either a page object or a bare array of readings.
fn history_page(body: Value, page: u32) -> Result<HistoryPage> {
    let unexpected = |message: String| Error::UnexpectedResponse {
        endpoint: "list_data",
        message,
    };
    match body {
        Value::Array(_) => {
            let items: Vec<_> =
                serde_json::from_value(body).map_err(|e| unexpected(e.to_string()))?;
            Ok(HistoryPage {
                total: items.len(),
                items,
                page,
                has_more: false,
            })
        }
        Value::Object(_) => serde_json::from_value(body).map_err(|e| unexpected(e.to_string())),
        other => Err(unexpected(format!("expected a page of readings, got {other}"))),
    }
}

#[async_trait]
impl DataGateway for HttpGateway {
    async fn login(&self, credentials: &LoginRequest) -> Result<LoginResponse> {
        let url = self.resolve(&self.config.login_url);
        debug!("POST {url} for {}", credentials.username);
        let body = self
            .send("login", self.client.post(&url).json(credentials))
            .await?;
        serde_json::from_value(body).map_err(|e| Error::UnexpectedResponse {
            endpoint: "login",
            message: e.to_string(),
        })
    }

    async fn update_data(&self, request: &UpdateDataRequest) -> Result<Value> {
        let url = self.resolve(&self.config.update_url);
        debug!("POST {url} update {}", request.device_id_date);
        self.send("update_data", self.client.post(&url).json(request))
            .await
    }

    async fn delete_data(&self, request: &DeleteDataRequest) -> Result<Value> {
        let url = self.resolve(&self.config.delete_url);
        debug!("POST {url} delete {}", request.device_id_date);
        self.send("delete_data", self.client.post(&url).json(request))
            .await
    }

    async fn list_data(&self, query: &HistoryQuery) -> Result<HistoryPage> {
        let url = self.resolve(&with_query(&self.config.data_url, &query.to_pairs()));
        debug!("GET {url}");
        let body = self.send("list_data", self.client.get(&url)).await?;
        history_page(body, query.page.unwrap_or(1))
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
