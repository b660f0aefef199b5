//! Nager.Date client and resilient fetcher against a mock HTTP server.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::*;
use holiday_sync::provider::ResilientFetcher;
use holiday_sync::{
    HolidayFilter, HolidayProvider, HolidaySyncEngine, MemoryStore, NagerDateClient, PageRequest,
    ProviderError,
};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> NagerDateClient {
    NagerDateClient::new(server.uri(), Duration::from_secs(2)).unwrap()
}

fn fetcher(server: &MockServer) -> ResilientFetcher {
    ResilientFetcher::new(Arc::new(client(server)), fast_config().upstream_retry())
}

fn korean_holidays() -> serde_json::Value {
    json!([
        {
            "date": "2024-01-01",
            "localName": "새해",
            "name": "New Year's Day",
            "countryCode": "KR",
            "fixed": true,
            "global": true,
            "counties": null,
            "launchYear": null,
            "types": ["Public"]
        },
        {
            "date": "2024-10-03",
            "localName": "개천절",
            "name": "National Foundation Day",
            "countryCode": "KR",
            "fixed": true,
            "global": true,
            "counties": null,
            "launchYear": 1949,
            "types": ["Public"]
        }
    ])
}

#[tokio::test]
async fn test_decodes_country_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/AvailableCountries"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"countryCode": "KR", "name": "South Korea"},
            {"countryCode": "US", "name": "United States"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let countries = client(&server).available_countries().await.unwrap();

    assert_eq!(countries.len(), 2);
    assert_eq!(countries[0].country_code, "KR");
    assert_eq!(countries[1].name, "United States");
}

#[tokio::test]
async fn test_decodes_holidays() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/PublicHolidays/2024/KR"))
        .respond_with(ResponseTemplate::new(200).set_body_json(korean_holidays()))
        .expect(1)
        .mount(&server)
        .await;

    let holidays = client(&server).public_holidays(2024, "KR").await.unwrap();

    assert_eq!(holidays.len(), 2);
    assert_eq!(holidays[1].date, date("2024-10-03"));
    assert_eq!(holidays[1].local_name.as_deref(), Some("개천절"));
    assert_eq!(holidays[1].launch_year, Some(1949));
    assert_eq!(holidays[0].launch_year, None);
}

#[tokio::test]
async fn test_error_status_is_transient() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/PublicHolidays/2024/KR"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = client(&server).public_holidays(2024, "KR").await.unwrap_err();

    assert!(matches!(err, ProviderError::Status { status: 503, .. }));
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_fetcher_retries_server_errors_then_degrades() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/PublicHolidays/2024/KR"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let holidays = fetcher(&server).fetch_holidays(2024, "KR").await.unwrap();

    assert!(holidays.is_empty());
}

#[tokio::test]
async fn test_fetcher_null_body_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/PublicHolidays/2024/XK"))
        .respond_with(ResponseTemplate::new(200).set_body_string("null"))
        .expect(1)
        .mount(&server)
        .await;

    let holidays = fetcher(&server).fetch_holidays(2024, "XK").await.unwrap();

    assert!(holidays.is_empty());
}

#[tokio::test]
async fn test_fetcher_malformed_body_is_empty_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/AvailableCountries"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let countries = fetcher(&server).fetch_countries().await.unwrap();

    assert!(countries.is_empty());
}

#[tokio::test]
async fn test_engine_end_to_end_over_http() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/AvailableCountries"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"countryCode": "KR", "name": "South Korea"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/PublicHolidays/2024/KR"))
        .respond_with(ResponseTemplate::new(200).set_body_json(korean_holidays()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/PublicHolidays/2025/KR"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let provider = Arc::new(client(&server));
    let engine = HolidaySyncEngine::new(fast_config(), provider, Arc::new(MemoryStore::new())).unwrap();

    let report = engine.initial_load().await;
    assert!(report.is_success());
    assert_eq!(report.written, 2);

    let page = engine
        .search(&HolidayFilter::new().country("KR").year(2024), &PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.total_elements, 2);
    assert_eq!(page.content[0].name, "New Year's Day");
    assert_eq!(page.content[0].country_name, "South Korea");
    assert!(page.content[1].fixed);
}
