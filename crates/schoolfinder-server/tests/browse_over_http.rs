//! Full stack over a real socket: catalog store -> server -> HTTP client ->
//! directory state.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;

use schoolfinder_core::{Criterion, CriterionField};
use schoolfinder_directory::{DirectoryState, FetchOutcome};
use schoolfinder_places::HttpSource;
use schoolfinder_server::{start, ServerConfig, ServerHandle};
use schoolfinder_store::seed::generate_catalog;
use schoolfinder_store::{CatalogSource, Database, SchoolRepo};

async fn serve_catalog(count: usize) -> ServerHandle {
    let repo = SchoolRepo::new(Database::in_memory().unwrap());
    repo.replace_all(&generate_catalog(count, &mut StdRng::seed_from_u64(17)))
        .unwrap();
    let config = ServerConfig {
        port: 0,
        ..Default::default()
    };
    start(config, Arc::new(CatalogSource::new(repo.clone())), Some(repo))
        .await
        .unwrap()
}

#[tokio::test]
async fn accumulates_every_page_then_filters() {
    let handle = serve_catalog(35).await;
    let mut state = DirectoryState::new(Arc::new(HttpSource::new(handle.base_url())));

    state.fetch(false).await.unwrap();
    let mut previous = state.records().len();
    while state.has_more() {
        match state.fetch(true).await.unwrap() {
            FetchOutcome::Loaded { received, total, .. } => {
                assert_eq!(total, previous + received);
                previous = total;
            }
            FetchOutcome::Exhausted => unreachable!("cursor was present"),
        }
    }
    assert_eq!(state.records().len(), 35);
    assert!(!state.is_fetching());

    state
        .toggle_criterion_value(CriterionField::Locations, "Ikeja")
        .unwrap();
    state.set_criterion(Criterion::values(CriterionField::SchoolType, ["Boarding"]).unwrap());
    state.apply_filters();
    assert!(!state.filtered().is_empty());
    assert!(state.filtered().iter().all(|s| {
        s.address.lga == "Ikeja" && s.school_type.as_deref() == Some("Boarding")
    }));

    state.reset_filters();
    assert_eq!(state.filtered(), state.records());
}

#[tokio::test]
async fn query_narrows_server_side() {
    let handle = serve_catalog(20).await;
    let mut state = DirectoryState::new(Arc::new(HttpSource::new(handle.base_url())));
    state.set_query(Some("surulere".into()));
    state.fetch(false).await.unwrap();
    assert_eq!(state.records().len(), 5);
    assert!(state.records().iter().all(|s| s.address.lga == "Surulere"));
    assert!(!state.has_more());
}
