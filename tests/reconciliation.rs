//! Reconciliation behavior through the public engine API, against the
//! in-memory store.

mod common;

use std::sync::Arc;

use common::*;
use holiday_sync::{
    HolidayFilter, HolidayStore, HolidaySyncEngine, MemoryStore, PageRequest, SyncError, UnitKey,
};

fn engine(provider: Arc<ScriptedProvider>, store: Arc<MemoryStore>) -> HolidaySyncEngine {
    init_tracing();
    HolidaySyncEngine::new(fast_config(), provider, store).unwrap()
}

fn korea_2024() -> Vec<holiday_sync::HolidayRecord> {
    vec![
        record("2024-01-01", "New Year's Day"),
        record("2024-03-01", "Independence Movement Day"),
        record("2024-05-05", "Children's Day"),
    ]
}

#[tokio::test]
async fn test_second_initial_load_writes_nothing() {
    let provider = Arc::new(ScriptedProvider::new().with_countries(&[("KR", "South Korea"), ("US", "United States")]));
    provider.set_holidays("KR", 2024, korea_2024());
    provider.set_holidays("US", 2025, vec![record("2025-07-04", "Independence Day")]);
    let store = Arc::new(MemoryStore::new());
    let engine = engine(provider, store.clone());

    let first = engine.initial_load().await;
    assert!(first.is_success());
    assert_eq!(first.units, 4); // 2 countries x 2 years
    assert_eq!(first.written, 4);

    let second = engine.initial_load().await;
    assert!(second.is_success());
    assert_eq!(second.written, 0);
    assert_eq!(store.holiday_count(), 4);
    assert_eq!(store.country_count(), 2);
}

#[tokio::test]
async fn test_three_way_diff_applied_to_store() {
    let provider = Arc::new(ScriptedProvider::new().with_countries(&[("KR", "South Korea")]));
    provider.set_holidays(
        "KR",
        2024,
        vec![record("2024-01-01", "A"), record("2024-02-01", "B"), record("2024-03-01", "C")],
    );
    let store = Arc::new(MemoryStore::new());
    let engine = engine(provider.clone(), store.clone());
    engine.initial_load().await;

    let unit = UnitKey::new("KR", 2024);
    let before = store.find_unit(&unit).await.unwrap();
    let id_of = |rows: &[holiday_sync::Holiday], d: &str| rows.iter().find(|h| h.date == date(d)).and_then(|h| h.id);

    provider.set_holidays(
        "KR",
        2024,
        vec![record("2024-02-01", "B renamed"), record("2024-03-01", "C"), record("2024-04-01", "D")],
    );
    let written = engine.refresh_unit(2024, "KR").await.unwrap();
    assert_eq!(written, 2); // B updated, D inserted; C unchanged

    let after = store.find_unit(&unit).await.unwrap();
    let dates: Vec<_> = after.iter().map(|h| h.date).collect();
    assert_eq!(dates, vec![date("2024-02-01"), date("2024-03-01"), date("2024-04-01")]);
    assert_eq!(after[0].name, "B renamed");
    assert_eq!(id_of(&after, "2024-02-01"), id_of(&before, "2024-02-01"));
    assert_eq!(id_of(&after, "2024-03-01"), id_of(&before, "2024-03-01"));
}

#[tokio::test]
async fn test_empty_upstream_leaves_unit_untouched() {
    let provider = Arc::new(ScriptedProvider::new().with_countries(&[("KR", "South Korea")]));
    provider.set_holidays("KR", 2024, korea_2024());
    let store = Arc::new(MemoryStore::new());
    let engine = engine(provider.clone(), store.clone());
    engine.initial_load().await;
    assert_eq!(store.unit_len(&UnitKey::new("KR", 2024)), 3);

    provider.set_holidays("KR", 2024, Vec::new());
    assert_eq!(engine.refresh_unit(2024, "KR").await.unwrap(), 0);
    assert_eq!(store.unit_len(&UnitKey::new("KR", 2024)), 3);
}

#[tokio::test]
async fn test_country_rename_updates_in_place() {
    let provider = Arc::new(ScriptedProvider::new().with_countries(&[("KR", "Korea"), ("US", "United States")]));
    let store = Arc::new(MemoryStore::new());
    let engine = engine(provider.clone(), store);
    engine.initial_load().await;

    let before = engine.countries().await.unwrap();
    assert_eq!(before.len(), 2);
    assert_eq!(before[0].name, "Korea");

    provider.set_countries(&[("KR", "South Korea"), ("US", "United States")]);
    engine.initial_load().await;

    let after = engine.countries().await.unwrap();
    assert_eq!(after.len(), 2);
    assert_eq!(after[0].code, "KR");
    assert_eq!(after[0].name, "South Korea");
    assert_eq!(after[0].id, before[0].id);
    assert_eq!(after[1], before[1]);
}

#[tokio::test]
async fn test_countries_missing_upstream_are_kept() {
    let provider = Arc::new(ScriptedProvider::new().with_countries(&[("KR", "South Korea"), ("US", "United States")]));
    let engine = engine(provider.clone(), Arc::new(MemoryStore::new()));
    engine.initial_load().await;

    provider.set_countries(&[("KR", "South Korea")]);
    engine.initial_load().await;

    let codes: Vec<String> = engine.countries().await.unwrap().into_iter().map(|c| c.code).collect();
    assert_eq!(codes, vec!["KR", "US"]);
}

#[tokio::test]
async fn test_refresh_unit_validates_and_requires_known_country() {
    let provider = Arc::new(ScriptedProvider::new().with_countries(&[("KR", "South Korea")]));
    let engine = engine(provider.clone(), Arc::new(MemoryStore::new()));
    engine.initial_load().await;

    assert!(matches!(
        engine.refresh_unit(2024, "ZZ").await,
        Err(SyncError::CountryNotFound { ref country_code }) if country_code == "ZZ"
    ));
    assert!(matches!(engine.refresh_unit(2024, "KOR").await, Err(SyncError::Validation(_))));
    assert!(matches!(engine.refresh_unit(1990, "KR").await, Err(SyncError::Validation(_))));

    // Lowercase input is normalized
    provider.set_holidays("KR", 2024, korea_2024());
    assert_eq!(engine.refresh_unit(2024, "kr").await.unwrap(), 3);
}

#[tokio::test]
async fn test_delete_unit() {
    let provider = Arc::new(ScriptedProvider::new().with_countries(&[("KR", "South Korea")]));
    provider.set_holidays("KR", 2024, korea_2024());
    provider.set_holidays("KR", 2025, vec![record("2025-01-01", "New Year's Day")]);
    let store = Arc::new(MemoryStore::new());
    let engine = engine(provider, store.clone());
    engine.initial_load().await;

    let err = engine.delete_unit(2024, "US").await.unwrap_err();
    assert!(err.is_client_error());
    assert_eq!(err.code(), "COUNTRY_001");

    assert_eq!(engine.delete_unit(2024, "KR").await.unwrap(), 3);
    assert_eq!(store.unit_len(&UnitKey::new("KR", 2024)), 0);
    assert_eq!(store.unit_len(&UnitKey::new("KR", 2025)), 1);

    // Deleting an empty unit of a known country is fine
    assert_eq!(engine.delete_unit(2024, "KR").await.unwrap(), 0);
}

#[tokio::test]
async fn test_upstream_defaults_are_stored() {
    let provider = Arc::new(ScriptedProvider::new().with_countries(&[("GB", "United Kingdom")]));
    // Only a date and a name
    let bare = holiday_sync::HolidayRecord::new(date("2024-12-25"), "Christmas Day");
    let mut bank = record("2024-08-26", "Summer Bank Holiday");
    bank.types = Some(vec!["Public".into(), "Bank".into()]);
    bank.launch_year = Some(1871);
    provider.set_holidays("GB", 2024, vec![bare, bank]);

    let engine = engine(provider, Arc::new(MemoryStore::new()));
    engine.initial_load().await;

    let page = engine
        .search(&HolidayFilter::new().country("GB"), &PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.total_elements, 2);

    let bank = &page.content[0];
    assert_eq!(bank.types, "Public,Bank");
    assert_eq!(bank.launch_year, Some(1871));
    assert!(bank.global);

    let christmas = &page.content[1];
    assert_eq!(christmas.types, "Public");
    assert!(!christmas.fixed);
    assert!(!christmas.global);
    assert_eq!(christmas.launch_year, None);
    assert_eq!(christmas.country_name, "United Kingdom");
}

#[tokio::test]
async fn test_duplicate_upstream_dates_collapse_to_last() {
    let provider = Arc::new(ScriptedProvider::new().with_countries(&[("KR", "South Korea")]));
    provider.set_holidays(
        "KR",
        2024,
        vec![record("2024-09-17", "Chuseok"), record("2024-09-17", "Chuseok (observed)")],
    );
    let store = Arc::new(MemoryStore::new());
    let engine = engine(provider, store.clone());
    let report = engine.initial_load().await;

    assert_eq!(report.written, 1);
    let stored = store.find_unit(&UnitKey::new("KR", 2024)).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].name, "Chuseok (observed)");
}
