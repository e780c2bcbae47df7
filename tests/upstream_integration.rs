//! Integration tests for the BGRID client against a local fake upstream.

use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;

use areas_proxy::api::BgridApi;
use areas_proxy::{AreaService, AreasError, Config};
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tokio::net::TcpListener;

/// base64("user:secret")
const EXPECTED_AUTH: &str = "Basic dXNlcjpzZWNyZXQ=";

/// Status the fake upstream answers with; 200 serves the dataset.
#[derive(Clone)]
struct Upstream {
    status: Arc<AtomicU16>,
}

async fn actual_areas(State(upstream): State<Upstream>, headers: HeaderMap) -> Response {
    let authorized = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == EXPECTED_AUTH)
        .unwrap_or(false);
    if !authorized {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let status = upstream.status.load(Ordering::SeqCst);
    if status != 200 {
        return StatusCode::from_u16(status)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            .into_response();
    }

    Json(json!({
        "count": 2,
        "data": [
            {"area_id": 1, "area_name": "Reception", "occupancy": "available", "sensor": "pir-1"},
            {"area_id": 2, "area_name": "Server Room", "occupancy": "occupied", "sensor": "pir-2"}
        ]
    }))
    .into_response()
}

async fn start_upstream() -> (String, Arc<AtomicU16>) {
    let status = Arc::new(AtomicU16::new(200));
    let app = Router::new()
        .route("/v1/areas/actual", get(actual_areas))
        .with_state(Upstream {
            status: status.clone(),
        });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}/v1/", addr), status)
}

fn config(endpoint: &str, password: &str, ttl_secs: &str) -> Config {
    let endpoint = endpoint.to_string();
    let password = password.to_string();
    let ttl = ttl_secs.to_string();
    Config::from_lookup(move |key| match key {
        "BGRID_USERNAME" => Some("user".to_string()),
        "BGRID_PASSWORD" => Some(password.clone()),
        "BGRID_ENDPOINT" => Some(endpoint.clone()),
        "CACHE_TTL_SECS" => Some(ttl.clone()),
        "REQUEST_TIMEOUT_SECS" => Some("5".to_string()),
        _ => None,
    })
    .unwrap()
}

#[tokio::test]
async fn test_fetch_with_basic_auth() {
    let (endpoint, _) = start_upstream().await;
    let api = BgridApi::new(&config(&endpoint, "secret", "300")).unwrap();

    let dataset = api.fetch_actual_areas().await.unwrap();

    assert_eq!(dataset.len(), 2);
    assert_eq!(dataset.data[0].area_name, "Reception");
    assert_eq!(dataset.data[1].extra.get("sensor"), Some(&json!("pir-2")));
}

#[tokio::test]
async fn test_wrong_credentials_are_an_upstream_error() {
    let (endpoint, _) = start_upstream().await;
    let api = BgridApi::new(&config(&endpoint, "wrong", "300")).unwrap();

    let err = api.fetch_actual_areas().await.unwrap_err();

    assert!(matches!(err, AreasError::Upstream(401)));
}

#[tokio::test]
async fn test_server_error_is_an_upstream_error() {
    let (endpoint, status) = start_upstream().await;
    status.store(500, Ordering::SeqCst);
    let api = BgridApi::new(&config(&endpoint, "secret", "300")).unwrap();

    let err = api.fetch_actual_areas().await.unwrap_err();

    assert!(matches!(err, AreasError::Upstream(500)));
    assert_eq!(err.to_string(), "Failed to get data from external API (status 500)");
}

#[tokio::test]
async fn test_rate_limit_is_reported() {
    let (endpoint, status) = start_upstream().await;
    status.store(429, Ordering::SeqCst);
    let api = BgridApi::new(&config(&endpoint, "secret", "300")).unwrap();

    assert!(matches!(api.fetch_actual_areas().await, Err(AreasError::RateLimited)));
}

#[tokio::test]
async fn test_service_serves_stale_data_while_rate_limited() {
    let (endpoint, status) = start_upstream().await;
    let service = AreaService::from_config(&config(&endpoint, "secret", "0")).unwrap();

    service.warm_up().await.unwrap();
    status.store(429, Ordering::SeqCst);
    tokio::time::sleep(std::time::Duration::from_millis(2)).await;

    let names = service.available_area_names().await.unwrap();
    assert_eq!(names, vec!["Reception"]);

    status.store(502, Ordering::SeqCst);
    tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    assert!(matches!(
        service.available_area_names().await,
        Err(AreasError::Upstream(502))
    ));
}

#[tokio::test]
async fn test_unreachable_upstream_is_http_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let api = BgridApi::new(&config(&format!("http://{}/", addr), "secret", "300")).unwrap();
    let err = api.fetch_actual_areas().await.unwrap_err();

    assert!(matches!(err, AreasError::Http(_)));
    assert!(err.to_string().starts_with("Failed to get data from external API"));
}
