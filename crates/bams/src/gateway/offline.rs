//! Gateway that never touches the network.
//!
//! Mutations are accepted as-is. Listings return a fixed set of readings for
//! the three known devices. Remote login is unavailable, so only local
//! accounts can sign in.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use tracing::debug;

use super::types::{
    DeleteDataRequest, DeviceReading, HistoryPage, HistoryQuery, LoginRequest, LoginResponse,
    UpdateDataRequest,
};
use super::DataGateway;
use crate::error::{Error, Result};

/// Local stand-in for the remote API.
#[derive(Debug, Clone, Default)]
pub struct OfflineGateway;

impl OfflineGateway {
    /// Create an offline gateway.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn readings() -> Vec<DeviceReading> {
        let now = Utc::now().to_rfc3339();
        let reading = |id: &str, aqi: f64, mq7: f64, pm25: f64, lat: f64, lon: f64| DeviceReading {
            device_id: id.to_string(),
            device_id_date: None,
            timestamp: Some(now.clone()),
            aqi,
            mq7,
            gp2y1010: pm25,
            latitude: lat,
            longitude: lon,
        };
        vec![
            reading("RSU1", 45.0, 0.5, 12.3, -8.6705, 115.2126),
            reading("RSU2", 78.0, 0.8, 25.6, -8.5925, 115.1631),
            reading("RSU3", 120.0, 1.2, 35.8, -8.795, 115.175),
        ]
    }
}

#[async_trait]
impl DataGateway for OfflineGateway {
    async fn login(&self, credentials: &LoginRequest) -> Result<LoginResponse> {
        debug!("Offline login refused for {}", credentials.username);
        Err(Error::remote(401, "Remote login is unavailable offline"))
    }

    async fn update_data(&self, request: &UpdateDataRequest) -> Result<Value> {
        debug!("Offline update accepted for {}", request.device_id_date);
        Ok(json!({"message": "Data updated successfully"}))
    }

    async fn delete_data(&self, request: &DeleteDataRequest) -> Result<Value> {
        debug!("Offline delete accepted for {}", request.device_id_date);
        Ok(json!({"message": "Data deleted successfully"}))
    }

    async fn list_data(&self, query: &HistoryQuery) -> Result<HistoryPage> {
        let items = Self::readings();
        Ok(HistoryPage {
            total: items.len(),
            items,
            page: query.page.unwrap_or(1),
            has_more: false,
        })
    }

    fn name(&self) -> &'static str {
        "offline"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aqi::AqiStatus;
    use crate::gateway::ReadingUpdates;

    #[tokio::test]
    async fn test_list_returns_three_devices() {
        let gateway = OfflineGateway::new();
        let page = gateway
            .list_data(&HistoryQuery {
                page: Some(2),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(page.total, 3);
        assert_eq!(page.page, 2);
        assert_eq!(page.items[2].device_id, "RSU3");
        assert_eq!(page.items[2].status(), Some(AqiStatus::UnhealthyForSensitive));
    }

    #[tokio::test]
    async fn test_mutations_accepted() {
        let gateway = OfflineGateway::new();
        let now = Utc::now();
        let update =
            UpdateDataRequest::new("tok", "RSU1#2025-10-25", now, ReadingUpdates::default());
        assert!(gateway.update_data(&update).await.is_ok());

        let delete = DeleteDataRequest::new("tok", "RSU1#2025-10-25", now);
        assert!(gateway.delete_data(&delete).await.is_ok());
    }

    #[tokio::test]
    async fn test_login_refused() {
        let gateway = OfflineGateway::new();
        let err = gateway
            .login(&LoginRequest {
                username: "x".to_string(),
                password: "y".to_string(),
            })
            .await
            .unwrap_err();
        assert!(err.is_gateway());
    }
}
