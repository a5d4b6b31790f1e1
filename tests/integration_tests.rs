// Integration tests for Pump Select

use std::sync::Arc;

use pump_select::core::Selector;
use pump_select::models::{CatalogItem, RecommendationLevel, SelectionFilters, SelectionRequest};
use pump_select::services::{CurveStore, MemoryCurveStore, SelectionError, SelectionService};

fn create_test_item(id: &str, flow: f64, head: f64, power: f64, efficiency: f64) -> CatalogItem {
    CatalogItem::new(id, format!("Pump {}", id), flow, head, power)
        .unwrap()
        .with_efficiency(efficiency)
}

fn create_catalog() -> Vec<CatalogItem> {
    let mut catalog = vec![
        create_test_item("small", 10.0, 20.0, 1.5, 70.0),
        create_test_item("medium", 25.0, 32.0, 4.0, 78.0),
        create_test_item("large", 60.0, 45.0, 11.0, 82.0),
        create_test_item("booster", 8.0, 90.0, 4.5, 55.0),
    ];
    catalog[0].material = Some("cast iron".to_string());
    catalog[1].material = Some("stainless".to_string());
    catalog[1].max_temperature = Some(120.0);
    catalog[2].material = Some("stainless".to_string());
    catalog[2].max_temperature = Some(80.0);
    catalog[3].material = Some("cast iron".to_string());
    catalog
}

async fn create_service(catalog: &[CatalogItem]) -> SelectionService<MemoryCurveStore> {
    let store = Arc::new(MemoryCurveStore::new());
    let service = SelectionService::new(Arc::clone(&store), Selector::with_defaults())
        .with_candidate_limit(10_000);

    for item in catalog {
        store.upsert_item(item.clone()).await.unwrap();
        service.sync_curve(None, item).await.unwrap();
    }
    service
}

#[tokio::test]
async fn test_integration_end_to_end_selection() {
    let service = create_service(&create_catalog()).await;
    let request = SelectionRequest::new(9.0, 18.0);

    let ranked = service.select_items(&request).await.unwrap();

    // Every pump can reach 9 flow at 18 head
    assert_eq!(ranked.len(), 4);

    // One entry per pump, best first
    let mut ids: Vec<&str> = ranked.iter().map(|c| c.item_id.as_str()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), ranked.len());
    assert!(ranked.windows(2).all(|w| w[0].composite_score >= w[1].composite_score));

    for candidate in &ranked {
        assert!(candidate.operating_point.flow_rate >= request.required_flow);
        assert!(candidate.operating_point.head >= request.required_head);
        assert!(candidate.flow_margin >= 0.0);
        assert!(candidate.head_margin >= 0.0);
        assert!((0.0..=100.0).contains(&candidate.composite_score));
        assert_eq!(
            candidate.recommendation_level,
            RecommendationLevel::from_score(candidate.composite_score)
        );
    }

    // The small pump's rated point sits right on the duty point
    assert_eq!(ranked[0].item_id, "small");
}

#[tokio::test]
async fn test_integration_no_match() {
    let service = create_service(&create_catalog()).await;

    let ranked = service
        .select_items(&SelectionRequest::new(10_000.0, 20.0))
        .await
        .unwrap();

    assert!(ranked.is_empty());
}

#[tokio::test]
async fn test_integration_filters() {
    let service = create_service(&create_catalog()).await;

    let stainless = SelectionRequest::new(9.0, 18.0).with_filters(SelectionFilters {
        material: Some("stainless".to_string()),
        ..Default::default()
    });
    let ranked = service.select_items(&stainless).await.unwrap();
    let mut ids: Vec<&str> = ranked.iter().map(|c| c.item_id.as_str()).collect();
    ids.sort();
    assert_eq!(ids, vec!["large", "medium"]);

    let hot = SelectionRequest::new(9.0, 18.0).with_filters(SelectionFilters {
        material: Some("stainless".to_string()),
        fluid_temperature: Some(100.0),
        ..Default::default()
    });
    let ranked = service.select_items(&hot).await.unwrap();
    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].item_id, "medium");
}

#[tokio::test]
async fn test_integration_candidate_cap() {
    let catalog = create_catalog();
    let store = Arc::new(MemoryCurveStore::new());
    let service = SelectionService::new(Arc::clone(&store), Selector::with_defaults());
    for item in &catalog {
        store.upsert_item(item.clone()).await.unwrap();
        service.sync_curve(None, item).await.unwrap();
    }

    // Default cap of 100 rows is filled by the first pumps in id order
    let ranked = service.select_items(&SelectionRequest::new(1.0, 5.0)).await.unwrap();
    assert!(!ranked.is_empty());
    assert!(ranked.len() < catalog.len());
}

#[tokio::test]
async fn test_integration_rerating_regenerates_curve() {
    let catalog = create_catalog();
    let service = create_service(&catalog).await;

    let before = service.select_items(&SelectionRequest::new(14.0, 20.0)).await.unwrap();
    assert!(!before.iter().any(|c| c.item_id == "small"));

    let old = catalog[0].clone();
    let rerated = CatalogItem {
        rated_flow: 15.0,
        rated_head: 25.0,
        ..old.clone()
    };
    service.store().upsert_item(rerated.clone()).await.unwrap();
    let written = service.sync_curve(Some(&old), &rerated).await.unwrap();
    assert_eq!(written, Some(226));

    let after = service.select_items(&SelectionRequest::new(14.0, 20.0)).await.unwrap();
    assert!(after.iter().any(|c| c.item_id == "small"));
}

#[tokio::test]
async fn test_integration_invalid_request() {
    let service = create_service(&create_catalog()).await;

    for (flow, head) in [(0.0, 10.0), (10.0, 0.0), (-5.0, -5.0)] {
        let err = service
            .select_items(&SelectionRequest::new(flow, head))
            .await
            .unwrap_err();
        assert!(matches!(err, SelectionError::InvalidInput(_)));
    }
}

#[test]
fn test_integration_store_contract_blocking() {
    let store = MemoryCurveStore::new();
    let item = create_test_item("small", 10.0, 20.0, 1.5, 70.0);

    tokio_test::block_on(async {
        store.upsert_item(item.clone()).await.unwrap();
        store
            .replace_samples("small", pump_select::generate_curve(&item))
            .await
            .unwrap();

        let fetched = store.get_item("small").await.unwrap();
        assert_eq!(fetched, item);

        let rows = store
            .list_samples_satisfying(10.0, 18.0, &SelectionFilters::default(), 100)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].flow_rate, 10.0);
    });
}
