//! HTTP gateway against a mock API server.

use bams::config::ApiConfig;
use bams::gateway::{
    DataGateway, DeleteDataRequest, HistoryQuery, HttpGateway, LoginRequest, ReadingUpdates,
    UpdateDataRequest,
};
use bams::{Dashboard, Error, Permission, Storage};
use chrono::{DateTime, Utc};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn gateway(server: &MockServer) -> HttpGateway {
    HttpGateway::new(ApiConfig::with_base_url(&server.uri())).unwrap()
}

fn ts() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2025-10-25T08:30:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

fn remote_message(err: Error) -> (u16, String) {
    match err {
        Error::Remote { status, message } => (status, message),
        other => panic!("expected a remote error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_login_posts_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .and(header("content-type", "application/json"))
        .and(body_partial_json(json!({"username": "operator", "password": "s3cret"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Login successful",
            "token": "jwt-123",
            "username": "operator"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = gateway(&server)
        .login(&LoginRequest {
            username: "operator".to_string(),
            password: "s3cret".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(response.token.as_deref(), Some("jwt-123"));
    assert_eq!(response.username.as_deref(), Some("operator"));
}

#[tokio::test]
async fn test_error_uses_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/update-data"))
        .respond_with(
            ResponseTemplate::new(403).set_body_json(json!({"message": "Token expired"})),
        )
        .mount(&server)
        .await;

    let request = UpdateDataRequest::new("t", "RSU1#2025-10-25", ts(), ReadingUpdates::default());
    let err = gateway(&server).update_data(&request).await.unwrap_err();

    assert!(err.is_gateway());
    assert_eq!(err.to_string(), "Token expired");
    assert_eq!(remote_message(err), (403, "Token expired".to_string()));
}

#[tokio::test]
async fn test_error_without_message_uses_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/delete-data"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let request = DeleteDataRequest::new("t", "RSU1#2025-10-25", ts());
    let err = gateway(&server).delete_data(&request).await.unwrap_err();
    assert_eq!(remote_message(err), (500, "HTTP 500".to_string()));
}

#[tokio::test]
async fn test_error_with_text_body_uses_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/delete-data"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let request = DeleteDataRequest::new("t", "RSU1#2025-10-25", ts());
    let err = gateway(&server).delete_data(&request).await.unwrap_err();
    assert_eq!(remote_message(err), (502, "HTTP 502".to_string()));
}

#[tokio::test]
async fn test_update_body_uses_wire_names() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/update-data"))
        .and(body_partial_json(json!({
            "action": "update",
            "token": "jwt-123",
            "DeviceID_Tanggal": "Test#2025-10-25",
            "updates": {"AQI": 120, "latitude": -8.5, "longitude": 115.2}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "ok"})))
        .expect(1)
        .mount(&server)
        .await;

    let updates = ReadingUpdates {
        aqi: Some(120),
        latitude: Some(-8.5),
        longitude: Some(115.2),
        ..ReadingUpdates::default()
    };
    let request = UpdateDataRequest::new("jwt-123", "Test#2025-10-25", ts(), updates);
    let body = gateway(&server).update_data(&request).await.unwrap();
    assert_eq!(body["message"], "ok");
}

#[tokio::test]
async fn test_list_omits_empty_parameters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data"))
        .and(query_param("period", "day"))
        .and(query_param_is_missing("date"))
        .and(query_param_is_missing("page"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"DeviceID": "RSU1", "AQI": 45, "MQ7": 0.5, "GP2Y1010": 12.3},
            {"DeviceID": "RSU2", "AQI": 78, "MQ7": 0.8, "GP2Y1010": 25.6}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let query = HistoryQuery {
        date: Some("   ".to_string()),
        period: Some("day".to_string()),
        page: None,
    };
    let page = gateway(&server).list_data(&query).await.unwrap();

    assert_eq!(page.total, 2);
    assert_eq!(page.page, 1);
    assert_eq!(page.items[1].aqi_index(), Some(78));
}

#[tokio::test]
async fn test_list_accepts_page_object() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data"))
        .and(query_param("date", "2025-10-25"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"DeviceID": "RSU3", "AQI": 120}],
            "total": 11,
            "page": 2,
            "hasMore": true
        })))
        .mount(&server)
        .await;

    let query = HistoryQuery {
        date: Some("2025-10-25".to_string()),
        period: None,
        page: Some(2),
    };
    let page = gateway(&server).list_data(&query).await.unwrap();

    assert_eq!(page.total, 11);
    assert!(page.has_more);
    assert_eq!(page.items[0].device_id, "RSU3");
}

#[tokio::test]
async fn test_proxy_wraps_target_url() {
    let proxy = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/"))
        .and(query_param("url", "https://api.invalid/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "via-proxy"})))
        .expect(1)
        .mount(&proxy)
        .await;

    let config = ApiConfig {
        proxy_enabled: true,
        proxy_url: Some(proxy.uri()),
        ..ApiConfig::with_base_url("https://api.invalid")
    };
    let response = HttpGateway::new(config)
        .unwrap()
        .login(&LoginRequest {
            username: "admin".to_string(),
            password: "password".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(response.token.as_deref(), Some("via-proxy"));
}

#[tokio::test]
async fn test_remote_login_keeps_role_and_permissions() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Login successful",
            "token": "jwt-456",
            "username": "field-team",
            "role": "viewer",
            "permissions": ["view", "edit", "teleport"]
        })))
        .mount(&server)
        .await;

    let mut dash = Dashboard::new(Storage::open_in_memory().unwrap(), Box::new(gateway(&server)))
        .unwrap();
    assert!(dash.login("field-team", "pw").await);

    let admin = dash.session().current().unwrap();
    assert_eq!(admin.role.as_deref(), Some("viewer"));
    assert_eq!(
        admin.permissions,
        Some(vec![Permission::View, Permission::Edit])
    );
    assert!(!admin.can(Permission::ManageLocations));
}

#[tokio::test]
async fn test_remote_login_without_role_uses_defaults() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "jwt-789"})))
        .mount(&server)
        .await;

    let mut dash = Dashboard::new(Storage::open_in_memory().unwrap(), Box::new(gateway(&server)))
        .unwrap();
    assert!(dash.login("field-team", "pw").await);

    let admin = dash.session().current().unwrap();
    assert_eq!(admin.username, "field-team");
    assert_eq!(admin.role.as_deref(), Some("admin"));
    assert_eq!(admin.permissions, None);
    assert!(admin.can(Permission::ManageLocations));
}
